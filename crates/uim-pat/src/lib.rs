//! # uim-pat
//!
//! Authorization tokens ("PAT") for intent execution.
//!
//! A provider holds one Ed25519 [`KeyPair`]. After an agent's signed policy
//! has been verified, a [`TokenIssuer`] mints a Biscuit carrying the token
//! id, the agent identity, the validity window and the granted scope. The
//! [`TokenVerifier`] used by the execution gate is derived from the same key
//! pair, so the material that verifies a token is always the material that
//! signed it.
//!
//! ## Token facts
//!
//! ```datalog
//! token_id("7c1f...");
//! issued_to("ai-agent-1");
//! valid_from(1767225600);
//! valid_to(1798761600);
//! policy("http://localhost:4000/uim-policy");   // policy-scoped
//! intent("localhost:4000:SearchProperty:v1");   // or one per permitted intent
//! ```

pub mod claims;
pub mod error;
pub mod keys;
pub mod token;

pub use claims::{AuthorizationToken, GrantedScope};
pub use error::PatError;
pub use keys::KeyPair;
pub use token::{IssuedToken, TokenIssuer, TokenVerifier};
