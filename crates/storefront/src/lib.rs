//! Tajine House storefront library.
//!
//! The ordering API as a library, so the binary, the CLI and the
//! integration tests all assemble the same application.
//!
//! ```rust,ignore
//! let state = AppState::new(StorefrontConfig::from_env()?)?;
//! state.bootstrap().await?;
//! axum::serve(listener, routes::app(state)).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
