mod admin;
mod username;

pub use admin::cmd_create_admin;
pub use username::cmd_unique_username;
