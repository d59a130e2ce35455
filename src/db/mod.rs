pub mod db;
pub mod rolerequestdb;
pub mod ticketdb;
pub mod userdb;
