//! CLI error type.

use thiserror::Error;

use tajine_house_core::cart::CartError;
use tajine_house_core::checkout::CheckoutError;
use tajine_house_core::{MenuItemId, OrderId};
use tajine_house_storefront::services::auth::AuthError;

/// Errors surfaced by `th-cli` commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Could not reach the ordering API.
    #[error("request to the ordering API failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status.
    #[error("the ordering API answered {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("menu item {0} not found")]
    MenuItemNotFound(MenuItemId),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("could not hash password: {0}")]
    PasswordHash(#[from] AuthError),

    /// Bad user input that clap cannot catch.
    #[error("{0}")]
    Input(String),
}
