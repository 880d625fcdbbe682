//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`*Service`, `*Command`, `*Query`) are called by inbound
//! adapters; driven ports (repositories, stores, hashers, notifiers) are
//! implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod image_store;
mod incident_command;
mod incident_notifier;
mod incident_query;
mod incident_repository;
mod login_service;
mod password_hasher;
mod registration_service;
mod token_service;
mod user_repository;
mod users_query;

pub use image_store::{ImageStore, ImageStoreError, StoredImage};
pub use incident_command::IncidentCommand;
pub use incident_notifier::{IncidentNotifier, NoOpIncidentNotifier};
pub use incident_query::IncidentQuery;
pub use incident_repository::{IncidentPersistenceError, IncidentRepository};
pub use login_service::LoginService;
pub use password_hasher::{PasswordHashError, PasswordHasher};
pub use registration_service::RegistrationService;
pub use token_service::{TokenError, TokenService};
pub use user_repository::{UserPersistenceError, UserRepository};
pub use users_query::UsersQuery;

#[cfg(test)]
pub use image_store::MockImageStore;
#[cfg(test)]
pub use incident_command::MockIncidentCommand;
#[cfg(test)]
pub use incident_notifier::MockIncidentNotifier;
#[cfg(test)]
pub use incident_query::MockIncidentQuery;
#[cfg(test)]
pub use incident_repository::MockIncidentRepository;
#[cfg(test)]
pub use login_service::MockLoginService;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
#[cfg(test)]
pub use registration_service::MockRegistrationService;
#[cfg(test)]
pub use token_service::MockTokenService;
#[cfg(test)]
pub use user_repository::MockUserRepository;
#[cfg(test)]
pub use users_query::MockUsersQuery;
