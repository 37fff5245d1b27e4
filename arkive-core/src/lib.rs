//! # Arkive Core
//!
//! Core library for the Arkive web-archiving service's user subsystem:
//! registration and invite workflows, validation policy, the user and
//! invite record stores, mailing-list side effects, and the lifecycle
//! manager that ties them together.
//!
//! ## Architecture
//!
//! Components talk to each other through explicit seams:
//!
//! - [`store::RecordTable`] abstracts the key-value tables (Redis in
//!   production, in-memory in tests).
//! - [`auth::AuthStore`] abstracts the credential backend; password
//!   hashing is delegated to the Argon2 library inside the shipped
//!   implementation.
//! - [`invites::Mailer`] abstracts outbound email delivery.
//! - [`lifecycle::UserLifecycleManager`] orchestrates the above and is
//!   the entry point for both the web registration path and the admin
//!   CLI.
//!
//! ## Failure model
//!
//! Policy failures are [`error::ValidationError`] values whose messages
//! are shown to users verbatim. Mailing-list calls and invite archival
//! are best-effort: they log and swallow their own failures and can never
//! fail a registration or deletion.
//!
//! ## Concurrency
//!
//! Operations are invoked once per request or CLI invocation; the core
//! spawns nothing. Uniqueness checks are check-then-act over the shared
//! record space, since [`store::RecordTable`] does not promise a
//! conditional-write primitive.

pub mod auth;
pub mod config;
pub mod error;
pub mod invites;
pub mod lifecycle;
pub mod mailing_list;
pub mod store;
pub mod template;
pub mod users;
pub mod validation;

pub use config::AppConfig;
pub use error::{ArkiveError, Result, StoreError, ValidationError};
pub use lifecycle::{Session, UserLifecycleManager};
