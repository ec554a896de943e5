pub mod cart_items;
pub mod feedbacks;
pub mod model_attachments;
pub mod notifications;
pub mod order_items;
pub mod orders;
pub mod posts;
pub mod product_models;
pub mod products;
pub mod user_roles;
pub mod users;

pub use cart_items::Entity as CartItems;
pub use feedbacks::Entity as Feedbacks;
pub use model_attachments::Entity as ModelAttachments;
pub use notifications::Entity as Notifications;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use posts::Entity as Posts;
pub use product_models::Entity as ProductModels;
pub use products::Entity as Products;
pub use user_roles::Entity as UserRoles;
pub use users::Entity as Users;
