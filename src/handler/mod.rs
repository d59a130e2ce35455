pub mod auth;
pub mod role_request_handler;
pub mod ticket_handler;
pub mod users;
