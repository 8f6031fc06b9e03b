pub mod chat;
pub mod me;
pub mod mechanics;
pub mod reviews;
pub mod service_requests;
pub mod workshops;
