//! Status enums for orders and fulfillment choices.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle of an order as the kitchen works through it.
///
/// ```text
/// pending -> confirmed -> preparing -> out_for_delivery -> delivered
///    \___________\____________\_______________\__________-> cancelled
/// ```
///
/// `delivered` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Submitted by the customer, not yet looked at.
    #[default]
    Pending,
    /// Accepted by the restaurant.
    Confirmed,
    /// In the kitchen.
    Preparing,
    /// Handed to the driver.
    OutForDelivery,
    /// Received by the customer.
    Delivered,
    /// Abandoned before delivery.
    Cancelled,
}

impl OrderStatus {
    /// Every status, in workflow order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Preparing,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// The wire name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transitions are permitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Position along the fulfillment path. `Cancelled` is off the path.
    const fn step(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::Preparing => Some(2),
            Self::OutForDelivery => Some(3),
            Self::Delivered => Some(4),
            Self::Cancelled => None,
        }
    }

    /// Whether an order in this status may move to `next`.
    ///
    /// - Re-writing the current status is always allowed.
    /// - A non-terminal order may move forward any number of steps, or be
    ///   cancelled.
    /// - Nothing moves backwards and nothing leaves a terminal status.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self.step(), next.step()) {
            (_, None) => true,
            (Some(current), Some(target)) => target > current,
            (None, Some(_)) => false,
        }
    }

    /// Statuses reachable from this one, excluding itself.
    #[must_use]
    pub fn next_statuses(self) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|&next| next != self && self.can_transition_to(next))
            .collect()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string names no known [`OrderStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct ParseOrderStatusError(pub String);

impl FromStr for OrderStatus {
    type Err = ParseOrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseOrderStatusError(s.to_owned()))
    }
}

/// Admin dashboard filter over order statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderStatusFilter {
    /// Every order.
    #[default]
    All,
    /// Orders that still need work (not delivered, not cancelled).
    Active,
    /// Orders in exactly this status.
    Only(OrderStatus),
}

impl OrderStatusFilter {
    /// Whether an order with `status` passes this filter.
    #[must_use]
    pub fn matches(self, status: OrderStatus) -> bool {
        match self {
            Self::All => true,
            Self::Active => !status.is_terminal(),
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl FromStr for OrderStatusFilter {
    type Err = ParseOrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            other => other.parse().map(Self::Only),
        }
    }
}

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOption {
    /// Driven to the customer's address.
    #[default]
    Delivery,
    /// Collected at the restaurant.
    Pickup,
}

impl fmt::Display for DeliveryOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivery => f.write_str("delivery"),
            Self::Pickup => f.write_str("pickup"),
        }
    }
}

/// How the customer pays on delivery or pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    Cash,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreditCard => f.write_str("credit-card"),
            Self::Cash => f.write_str("cash"),
        }
    }
}
