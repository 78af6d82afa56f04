//! Credential models: consumer identity, token pairs, redacted secrets, and the credential source.

pub mod credentials;
pub mod secret;
pub mod token;

pub use credentials::*;
pub use secret::*;
pub use token::*;
