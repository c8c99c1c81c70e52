//! # uim-provider
//!
//! The service side of the UIM trust handshake.
//!
//! A provider publishes its intents in `agents.json` and a usage policy in
//! `uim-policy.json`. An agent signs that policy and posts it to
//! `/pat/issue`; once the [`AuthorizationIssuer`] has verified the signature
//! against the policy actually served, it mints a PAT. Every call to
//! `/uim/execute` passes through the [`ExecutionGate`], which checks token
//! integrity, the validity window and scope before the [`IntentRegistry`]
//! dispatches to a handler.
//!
//! | Endpoint               | Purpose                         |
//! |------------------------|---------------------------------|
//! | `GET /agents.json`     | Manifest                        |
//! | `GET /uim-policy.json` | Usage policy                    |
//! | `POST /pat/issue`      | Signed policy → token           |
//! | `POST /uim/execute`    | Gated intent execution          |
//! | `GET /health`          | Liveness                        |

pub mod demo;
pub mod documents;
pub mod error;
pub mod gate;
pub mod issuer;
pub mod registry;
pub mod server;

pub use documents::{build_manifest, build_policy};
pub use error::ProviderError;
pub use gate::{ExecuteRequest, ExecutionGate, PAT_HEADER, extract_token};
pub use issuer::{AuthorizationIssuer, PatRequest, PatResponse};
pub use registry::{IntentHandler, IntentRegistry, RegisteredIntent};
pub use server::Provider;
