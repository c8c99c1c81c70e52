//! # uim-server
//!
//! HTTP discovery API over the intent catalog.
//!
//! | Endpoint                         | Purpose                                  |
//! |----------------------------------|------------------------------------------|
//! | `GET /api/intents/search`        | Filter by name, uid, description, tags   |
//! | `GET /api/search?query=...`      | Natural-language search                  |
//! | `GET /api/intents/{uid}`         | One intent                               |
//! | `GET /api/services`              | All services                             |
//! | `GET/DELETE /api/services/{name}`| One service with its intents / remove it |
//! | `GET /health`                    | Liveness                                 |
//!
//! An empty first page answers 404 ("No intents found."); paging past the
//! last match answers an empty list.

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{AppState, create_router};
pub use server::DiscoveryServer;
