//! # TaskHub Worker Library
//!
//! Background jobs that run outside the API process.
//!
//! ## Modules
//!
//! - `config`: Worker configuration from the environment
//! - `notifier`: Periodic deadline warnings
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskhub_shared::clock::SystemClock;
//! use taskhub_shared::mailer::LogMailer;
//! use taskhub_shared::services::NotificationService;
//! use taskhub_shared::store::MemoryStore;
//! use taskhub_worker::config::NotifierConfig;
//! use taskhub_worker::notifier::DeadlineNotifier;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let notifications = NotificationService::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(LogMailer),
//!     Arc::new(SystemClock),
//! );
//! let notifier = DeadlineNotifier::new(notifications, NotifierConfig::default());
//! notifier.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod notifier;
