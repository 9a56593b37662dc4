//! # TaskHub API Server Library
//!
//! HTTP surface of TaskHub: accounts, projects, invitations, subscriptions,
//! tasks and the manual deadline check.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
