//! `uim` subcommand implementations.

pub mod agent;
pub mod crawl;
pub mod keys;
pub mod provider;
pub mod serve;
