//! # uim-policy
//!
//! Usage policies and the agent signature over them.
//!
//! A provider serves an ODRL-style [`Policy`] describing which intents may be
//! executed and under what limits. An agent accepts it by signing the
//! policy's canonical bytes with its own Ed25519 key ([`PolicySigner`]),
//! producing a [`SignedPolicy`]. The provider then checks that signature
//! against the policy it would have served ([`verify_signed_policy`]) before
//! any token is issued.
//!
//! ```text
//! provider                      agent
//!    │  GET /uim-policy.json      │
//!    │ ─────────────────────────► │  Policy
//!    │                            │  PolicySigner::sign
//!    │  POST /pat/issue           │
//!    │ ◄───────────────────────── │  SignedPolicy + agent key
//!    │  verify_signed_policy      │
//! ```

pub mod document;
pub mod encoding;
pub mod error;
pub mod signing;

pub use document::{Action, Asset, Duty, DutyAction, Party, Policy, Refinement, Rule, Targets};
pub use error::PolicyError;
pub use signing::{
    AgentKeyPair, PolicySigner, SignedPolicy, VerifiedPolicy, decode_public_key, encode_public_key,
    verify_signed_policy,
};
