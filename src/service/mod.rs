pub mod error;
pub mod role_request_service;
pub mod ticket_service;
