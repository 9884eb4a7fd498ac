//! `th-cli checkout`
//!
//! Validate the cart and the customer form, show the order summary, ask for
//! confirmation, then place the order. The cart is only cleared once the
//! server has accepted the order.

use std::io::{self, Write};

use tajine_house_core::cart::{Cart, CartStorage};
use tajine_house_core::checkout::{CheckoutSummary, CustomerForm, prepare_checkout};
use tajine_house_core::{OrderId, format_money};

use crate::api::OrderApi;
use crate::error::CliError;

/// How a checkout attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Placed(OrderId),
    /// The customer did not confirm.
    Declined,
    /// The server refused or could not be reached; the cart is untouched.
    Failed,
}

fn print_summary(summary: &CheckoutSummary, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Order summary")?;
    for line in &summary.lines {
        writeln!(
            out,
            "  {} x {:<28} {:>9}",
            line.quantity,
            line.name,
            format_money(line.line_total())
        )?;
    }
    writeln!(out, "Subtotal:     {:>9}", format_money(summary.totals.subtotal))?;
    writeln!(out, "Delivery fee: {:>9}", format_money(summary.totals.delivery_fee))?;
    writeln!(out, "Total:        {:>9}", format_money(summary.totals.total))?;
    writeln!(out)?;
    writeln!(
        out,
        "{} <{}> {}",
        summary.customer.full_name(),
        summary.customer.email.trim(),
        summary.customer.phone.trim()
    )?;
    writeln!(out, "{}", summary.delivery_address())?;
    writeln!(
        out,
        "Time: {}  Payment: {}",
        summary.customer.delivery_time.trim(),
        summary.customer.payment_method
    )?;
    if let Some(notes) = summary
        .customer
        .special_instructions
        .as_deref()
        .filter(|n| !n.trim().is_empty())
    {
        writeln!(out, "Notes: {notes}")?;
    }
    Ok(())
}

/// Run one checkout.
///
/// Validation problems (empty cart, missing fields, minimum order) are
/// returned as errors before anything is sent.
///
/// # Errors
///
/// Returns [`CliError::Checkout`] when the cart or form is not valid, and
/// [`CliError::Io`] / [`CliError::Cart`] for local failures.
pub async fn run<S: CartStorage>(
    api: &dyn OrderApi,
    cart: &mut Cart<S>,
    customer: CustomerForm,
    confirm: impl FnOnce() -> io::Result<bool>,
    out: &mut impl Write,
) -> Result<CheckoutOutcome, CliError> {
    let summary = prepare_checkout(cart.items(), &customer, cart.pricing())?;
    print_summary(&summary, out)?;

    if !confirm()? {
        writeln!(out, "Order not placed.")?;
        return Ok(CheckoutOutcome::Declined);
    }

    let request = summary.into_request();
    match api.place_order(&request).await {
        Ok(placed) => {
            cart.clear_cart()?;
            tracing::info!(order_id = %placed.order_id, "order placed");
            writeln!(out, "{} Your order number is #{}.", placed.message, placed.order_id)?;
            Ok(CheckoutOutcome::Placed(placed.order_id))
        }
        Err(e) => {
            tracing::warn!(error = %e, "placing order failed");
            writeln!(out, "Failed to place order. Please try again.")?;
            Ok(CheckoutOutcome::Failed)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tajine_house_core::cart::{CartItem, MemoryCartStorage};
    use tajine_house_core::checkout::CheckoutError;
    use tajine_house_core::{MenuItemId, PaymentMethod};

    use super::*;
    use crate::commands::fake::FakeApi;

    fn customer() -> CustomerForm {
        CustomerForm {
            first_name: "Amina".to_owned(),
            last_name: "Benali".to_owned(),
            email: "amina@example.com".to_owned(),
            phone: "0612345678".to_owned(),
            address: "12 Rue des Oliviers".to_owned(),
            city: "Lyon".to_owned(),
            zip_code: "69001".to_owned(),
            delivery_time: "asap".to_owned(),
            payment_method: PaymentMethod::Cash,
            ..CustomerForm::default()
        }
    }

    fn full_cart() -> Cart<MemoryCartStorage> {
        let mut cart = Cart::load(MemoryCartStorage::default());
        let item = CartItem::new(
            MenuItemId::new(2),
            "Tajine d'agneau",
            rust_decimal::Decimal::new(2450, 2),
            4,
            "",
        )
        .unwrap();
        cart.add_item(item).unwrap();
        cart
    }

    #[tokio::test]
    async fn test_confirmed_checkout_places_order_and_clears_cart() {
        let api = FakeApi::with_menu();
        let mut cart = full_cart();
        let mut out = Vec::new();

        let outcome = run(&api, &mut cart, customer(), || Ok(true), &mut out)
            .await
            .unwrap();

        assert_eq!(outcome, CheckoutOutcome::Placed(OrderId::new(1)));
        assert!(cart.is_empty());

        let placed = api.placed.lock().unwrap();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].items[0].quantity, 4);
        assert_eq!(placed[0].order.total, Some(rust_decimal::Decimal::new(10486, 2)));

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("12 Rue des Oliviers, Lyon 69001"));
        assert!(text.contains("Payment: cash"));
        assert!(text.contains("Your order number is #1."));
    }

    #[tokio::test]
    async fn test_declined_checkout_sends_nothing() {
        let api = FakeApi::with_menu();
        let mut cart = full_cart();

        let outcome = run(&api, &mut cart, customer(), || Ok(false), &mut Vec::new())
            .await
            .unwrap();

        assert_eq!(outcome, CheckoutOutcome::Declined);
        assert!(api.placed.lock().unwrap().is_empty());
        assert_eq!(cart.item_count(), 4);
    }

    #[tokio::test]
    async fn test_server_failure_keeps_cart() {
        let api = FakeApi {
            fail_orders: true,
            ..FakeApi::with_menu()
        };
        let mut cart = full_cart();
        let mut out = Vec::new();

        let outcome = run(&api, &mut cart, customer(), || Ok(true), &mut out)
            .await
            .unwrap();

        assert_eq!(outcome, CheckoutOutcome::Failed);
        assert_eq!(cart.item_count(), 4);
        assert!(String::from_utf8(out).unwrap().ends_with("Failed to place order. Please try again.\n"));
    }

    #[tokio::test]
    async fn test_validation_errors_stop_before_confirmation() {
        let api = FakeApi::with_menu();

        let mut empty = Cart::load(MemoryCartStorage::default());
        let err = run(&api, &mut empty, customer(), || panic!("asked"), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Checkout(CheckoutError::EmptyCart)));

        let mut cart = full_cart();
        let form = CustomerForm {
            phone: String::new(),
            ..customer()
        };
        let err = run(&api, &mut cart, form, || panic!("asked"), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CliError::Checkout(CheckoutError::MissingFields(ref fields)) if fields == &["phone"]
        ));
    }

    #[tokio::test]
    async fn test_below_minimum_is_refused() {
        let api = FakeApi::with_menu();
        let mut cart = Cart::load(MemoryCartStorage::default());
        let tea = CartItem::new(
            MenuItemId::new(6),
            "Moroccan Mint Tea",
            rust_decimal::Decimal::new(595, 2),
            2,
            "",
        )
        .unwrap();
        cart.add_item(tea).unwrap();

        let err = run(&api, &mut cart, customer(), || Ok(true), &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "minimum order is $80.00; add $68.10 more to check out"
        );
        assert!(api.placed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_uses_cart_pricing() {
        use tajine_house_core::pricing::PricingPolicy;

        let api = FakeApi::with_menu();
        let pricing = PricingPolicy::new(rust_decimal::Decimal::new(10, 2), rust_decimal::Decimal::TEN);
        let mut cart = Cart::load_with_pricing(MemoryCartStorage::default(), pricing);
        let tea = CartItem::new(
            MenuItemId::new(6),
            "Moroccan Mint Tea",
            rust_decimal::Decimal::new(595, 2),
            2,
            "",
        )
        .unwrap();
        cart.add_item(tea).unwrap();

        let outcome = run(&api, &mut cart, customer(), || Ok(true), &mut Vec::new())
            .await
            .unwrap();

        assert_eq!(outcome, CheckoutOutcome::Placed(OrderId::new(1)));
        let placed = api.placed.lock().unwrap();
        assert_eq!(placed[0].order.total, Some(rust_decimal::Decimal::new(1309, 2)));
    }
}
