pub mod cart;
pub mod feedback;
pub mod orders;
pub mod posts;
pub mod users;
