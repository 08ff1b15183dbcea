pub mod error;
pub mod issuer;
pub mod models;
pub mod store;
pub mod verifier;

pub use error::VerifyError;
pub use issuer::{CodeIssuer, IssuedCode, SessionPolicy};
pub use models::Session;
pub use store::{SessionStore, StoreError};
pub use verifier::Verifier;
