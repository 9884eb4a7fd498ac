//! Checkout validation and the order-request wire types.
//!
//! [`prepare_checkout`] turns a cart and a [`CustomerForm`] into a priced
//! [`CheckoutSummary`], or explains why the order cannot be placed yet. The
//! same rules run on both sides of the wire: the client checks before it
//! shows the confirmation step, and the server re-checks (and re-prices) the
//! [`CreateOrderRequest`] it receives.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::pricing::{CartTotals, PricingPolicy, line_total};
use crate::types::{DeliveryOption, Email, MenuItemId, PaymentMethod};

/// Minimum length of a phone number.
pub const MIN_PHONE_LENGTH: usize = 10;

/// Minimum length of a zip code.
pub const MIN_ZIP_LENGTH: usize = 5;

/// Delivery time meaning "as soon as possible".
pub const DELIVERY_TIME_ASAP: &str = "asap";

/// Reasons an order cannot be placed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error("invalid item {id}: {reason}")]
    InvalidItem { id: MenuItemId, reason: String },

    #[error("minimum order is ${minimum}; add ${shortfall} more to check out")]
    BelowMinimum {
        subtotal: Decimal,
        minimum: Decimal,
        shortfall: Decimal,
    },
}

/// Customer and fulfillment details collected at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub delivery_option: DeliveryOption,
    /// `asap` or an `HH:MM` slot.
    pub delivery_time: String,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

impl CustomerForm {
    /// Check required fields and field formats.
    ///
    /// Missing fields are all reported at once; format problems are reported
    /// one at a time, in form order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingFields`] or
    /// [`CheckoutError::InvalidField`].
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let required = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("zipCode", &self.zip_code),
            ("deliveryTime", &self.delivery_time),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(CheckoutError::MissingFields(missing));
        }

        Email::parse(&self.email).map_err(|e| CheckoutError::InvalidField {
            field: "email",
            reason: e.to_string(),
        })?;

        if self.phone.trim().chars().count() < MIN_PHONE_LENGTH {
            return Err(CheckoutError::InvalidField {
                field: "phone",
                reason: format!("must be at least {MIN_PHONE_LENGTH} characters"),
            });
        }

        if self.zip_code.trim().chars().count() < MIN_ZIP_LENGTH {
            return Err(CheckoutError::InvalidField {
                field: "zipCode",
                reason: format!("must be at least {MIN_ZIP_LENGTH} characters"),
            });
        }

        if !is_valid_delivery_time(self.delivery_time.trim()) {
            return Err(CheckoutError::InvalidField {
                field: "deliveryTime",
                reason: "must be \"asap\" or a HH:MM time".to_owned(),
            });
        }

        Ok(())
    }

    /// Full customer name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    /// Where the order ends up, as shown on the confirmation step.
    #[must_use]
    pub fn delivery_address(&self) -> String {
        match self.delivery_option {
            DeliveryOption::Delivery => format!(
                "{}, {} {}",
                self.address.trim(),
                self.city.trim(),
                self.zip_code.trim()
            ),
            DeliveryOption::Pickup => "Pickup at the restaurant".to_owned(),
        }
    }
}

fn is_valid_delivery_time(value: &str) -> bool {
    if value == DELIVERY_TIME_ASAP {
        return true;
    }
    let Some((hours, minutes)) = value.split_once(':') else {
        return false;
    };
    if hours.len() != 2 || minutes.len() != 2 {
        return false;
    }
    matches!(
        (hours.parse::<u8>(), minutes.parse::<u8>()),
        (Ok(h), Ok(m)) if h < 24 && m < 60
    )
}

/// A cart line as sent with an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: MenuItemId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl OrderLine {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        line_total(self.price, self.quantity)
    }

    fn validate(&self) -> Result<(), CheckoutError> {
        let reason = if self.quantity == 0 {
            "quantity must be at least 1"
        } else if self.price.is_sign_negative() && !self.price.is_zero() {
            "price cannot be negative"
        } else if self.name.trim().is_empty() {
            "name cannot be empty"
        } else {
            return Ok(());
        };
        Err(CheckoutError::InvalidItem {
            id: self.id,
            reason: reason.to_owned(),
        })
    }
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id(),
            name: item.name().to_owned(),
            price: item.price(),
            quantity: item.quantity(),
        }
    }
}

/// The `order` half of a create-order request.
///
/// The amounts are what the client computed. The server recomputes them from
/// the items and only uses these for comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(flatten)]
    pub customer: CustomerForm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub order: OrderDetails,
    pub items: Vec<OrderLine>,
}

/// A validated, priced order awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub lines: Vec<OrderLine>,
    pub totals: CartTotals,
    pub customer: CustomerForm,
}

impl CheckoutSummary {
    /// Where the order ends up.
    #[must_use]
    pub fn delivery_address(&self) -> String {
        self.customer.delivery_address()
    }

    /// Package the summary as the request body sent to the server.
    #[must_use]
    pub fn into_request(self) -> CreateOrderRequest {
        CreateOrderRequest {
            order: OrderDetails {
                customer: self.customer,
                subtotal: Some(self.totals.subtotal),
                delivery_fee: Some(self.totals.delivery_fee),
                tax: Some(self.totals.tax),
                total: Some(self.totals.total),
            },
            items: self.lines,
        }
    }
}

/// Validate a cart and form and price the order.
///
/// Checks run in order: empty cart, form fields, minimum order.
///
/// # Errors
///
/// Returns the first [`CheckoutError`] encountered.
pub fn prepare_checkout(
    items: &[CartItem],
    customer: &CustomerForm,
    policy: &PricingPolicy,
) -> Result<CheckoutSummary, CheckoutError> {
    let lines = items.iter().map(OrderLine::from).collect();
    prepare_order(lines, customer.clone(), policy)
}

/// Validate and price order lines received from any source.
///
/// # Errors
///
/// Returns the first [`CheckoutError`] encountered.
pub fn prepare_order(
    lines: Vec<OrderLine>,
    customer: CustomerForm,
    policy: &PricingPolicy,
) -> Result<CheckoutSummary, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    customer.validate()?;
    for line in &lines {
        line.validate()?;
    }

    let subtotal: Decimal = lines.iter().map(OrderLine::line_total).sum();
    let totals = policy.totals(subtotal);
    if !totals.meets_minimum_order() {
        return Err(CheckoutError::BelowMinimum {
            subtotal: totals.subtotal,
            minimum: totals.minimum_order,
            shortfall: totals.shortfall,
        });
    }

    Ok(CheckoutSummary {
        lines,
        totals,
        customer,
    })
}
