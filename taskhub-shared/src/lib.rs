//! # TaskHub Shared Library
//!
//! This crate contains the domain model, persistence layer and business rules
//! shared by the TaskHub API server and the deadline worker.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their Postgres operations
//! - `store`: Per-aggregate store traits with Postgres and in-memory backends
//! - `services`: Business rules (projects, invitations, subscriptions, tasks)
//! - `auth`: JWT issuing, password hashing, invitation tokens, authorization
//! - `mailer`: Outbound email (SMTP via lettre, log-only, in-memory)
//! - `db`: Connection pool and migrations
//! - `clock`: Injectable time source
//! - `error`: Service error taxonomy

pub mod auth;
pub mod clock;
pub mod db;
pub mod error;
pub mod mailer;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the TaskHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
