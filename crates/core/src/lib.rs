//! Tajine House Core - Shared types and ordering rules.
//!
//! This crate provides the pieces shared by every Tajine House component:
//! - `storefront` - The HTTP server (public menu and ordering API, admin API)
//! - `cli` - The command-line client (cart, checkout, admin helpers)
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure computations - no
//! network access and no database. Cart persistence goes through the
//! [`cart::CartStorage`] trait so callers decide where the cart lives.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money helpers and status enums
//! - [`pricing`] - Delivery fee and minimum order policy
//! - [`cart`] - The cart engine
//! - [`checkout`] - Checkout validation and the create-order wire types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod pricing;
pub mod types;

pub use types::*;
