pub mod credentials;
pub mod username;

pub mod identity_service;
pub mod identity_service_impl;
pub use identity_service::{
    IdentityError, IdentityFilter, IdentityService, NewIdentity, ProviderProfile,
};
pub use identity_service_impl::SeaOrmIdentityService;

pub mod bootcamp_service;
pub mod bootcamp_service_impl;
pub use bootcamp_service::{BootcampError, BootcampService, NewBootcamp};
pub use bootcamp_service_impl::SeaOrmBootcampService;
