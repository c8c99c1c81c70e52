//! # uim-agent
//!
//! The agent side of the UIM trust handshake.
//!
//! An [`Agent`] keeps one Ed25519 key pair per provider in a [`KeyStore`],
//! and walks an explicit [`HandshakeSession`] through
//! `Unauthenticated → PolicyFetched → PolicySigned → TokenIssued` using a
//! [`ProviderClient`]. The session is a plain value owned by the caller;
//! nothing about the handshake is kept in process-wide state.

pub mod agent;
pub mod client;
pub mod digest;
pub mod error;
pub mod keys;
pub mod session;

pub use agent::Agent;
pub use client::ProviderClient;
pub use digest::{IntentSummary, ManifestDigest};
pub use error::AgentError;
pub use keys::KeyStore;
pub use session::{HandshakeSession, HandshakeState, TokenGrant};
