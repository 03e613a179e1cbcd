//! Inkpost - Core
//!
//! Session, authorization and persistence core of the Inkpost blog front-end.
//!
//! # Overview
//!
//! An identity provider emits sign-in/sign-out events. Each emission triggers
//! a role lookup in the document store, and the result lands in a shared
//! session record. A navigation guard reads that record before every route
//! transition and allows it or redirects it. Navigation never decides on
//! stale roles: it waits, for a bounded time, until the pipeline settles.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use inkpost_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     init_logging(&LoggingConfig::default())?;
//!     let app = InkpostApp::builder().build()?;
//!
//!     app.provider().sign_in("ada@example.com", "secret-pw").await?;
//!     println!("{}", app.navigate("/dashboard").await);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`identity`] - Identity provider trait and the in-memory provider
//! - [`store`] - Document store trait and the in-memory store
//! - [`roles`] - Role sets and the role store
//! - [`session`] - Session state, its single writer and the pipeline task
//! - [`router`] - Route table and navigation guard
//! - [`blog`] - Users, categories and posts repositories
//! - [`app`] - Wiring of all of the above

pub mod app;
pub mod blog;
pub mod config; // TOML + env configuration
pub mod error;
pub mod identity;
pub mod logging;
pub mod prelude;
pub mod roles;
pub mod router;
pub mod session;
pub mod store;

pub use app::{InkpostApp, InkpostAppBuilder};
pub use config::InkpostConfig;
pub use error::{AuthError, BlogError, StoreError};
