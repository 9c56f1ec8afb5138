pub mod conversation_service;
pub mod inbox_service;
