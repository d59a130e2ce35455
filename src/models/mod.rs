pub mod rolerequestmodel;
pub mod ticketmodel;
pub mod usermodel;
