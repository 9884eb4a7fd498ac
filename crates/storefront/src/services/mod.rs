//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Admin authentication (password and SSO-provisioned users)
//! - `identity` - SSO identity providers (simulated and OAuth)
//! - `orders` - Order placement and status workflow

pub mod auth;
pub mod identity;
pub mod orders;
