//! Roadwatch daemon: HTTP ingestion boundary plus the hazard
//! verification pipeline (image resolution, oracle invocation, judgment
//! validation, status transitions).

pub mod api;
pub mod config;
pub mod db;
pub mod oracle;
pub mod pipeline;
pub mod resolver;
pub mod watcher;
