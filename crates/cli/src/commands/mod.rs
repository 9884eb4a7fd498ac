//! `th-cli` subcommands.
//!
//! Commands write their output to a caller-supplied writer so tests can
//! capture it.

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod menu;
pub mod order;

#[cfg(test)]
pub(crate) mod fake;
