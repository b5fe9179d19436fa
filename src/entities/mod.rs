pub mod prelude;

pub mod bootcamps;
pub mod users;
