pub use super::bootcamps::Entity as Bootcamps;
pub use super::users::Entity as Users;
