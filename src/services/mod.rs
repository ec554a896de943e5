pub mod admin_service;
pub mod cart_service;
pub mod feedback_service;
pub mod order_service;
pub mod post_service;
pub mod user_service;
