//! Filedock identity gateway
//!
//! Wraps an external [`IdentityProvider`] behind [`IdentityGateway`], which
//! turns every sign-in attempt into an [`AuthOutcome`] and publishes the
//! current [`Session`](filedock_core::Session) to observers.

pub mod credentials;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod provider;

pub use credentials::Credentials;
pub use error::AuthError;
pub use gateway::{AuthOutcome, IdentityGateway, SessionSubscription, SessionWatcher};
pub use memory::MemoryIdentityProvider;
pub use provider::IdentityProvider;
