//! `th-cli cart ...`

use std::io::Write;

use tajine_house_core::cart::{Cart, CartItem, CartStorage};
use tajine_house_core::{MenuItemId, format_money};

use crate::api::OrderApi;
use crate::error::CliError;

/// A cart change that needs no API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartEdit {
    Remove(MenuItemId),
    Update(MenuItemId, u32),
    Increment(MenuItemId),
    Decrement(MenuItemId),
    Clear,
}

/// Print the cart lines and totals.
pub fn show<S: CartStorage>(cart: &Cart<S>, out: &mut impl Write) -> Result<(), CliError> {
    if cart.is_empty() {
        writeln!(out, "Your cart is empty.")?;
        return Ok(());
    }

    for item in cart.items() {
        writeln!(
            out,
            "{:>4}  {:<28} {:>3} x {:>8} = {:>9}",
            item.id().to_string(),
            item.name(),
            item.quantity(),
            format_money(item.price()),
            format_money(item.line_total())
        )?;
    }

    let totals = cart.summary();
    writeln!(out, "Subtotal:     {:>9}", format_money(totals.subtotal))?;
    writeln!(out, "Delivery fee: {:>9}", format_money(totals.delivery_fee))?;
    writeln!(out, "Total:        {:>9}", format_money(totals.total))?;
    if !totals.meets_minimum_order() {
        writeln!(
            out,
            "Minimum order is {}; add {} more to check out.",
            format_money(totals.minimum_order),
            format_money(totals.shortfall)
        )?;
    }
    Ok(())
}

/// Look the dish up on the server and add it to the cart.
pub async fn add<S: CartStorage>(
    api: &dyn OrderApi,
    cart: &mut Cart<S>,
    id: MenuItemId,
    quantity: u32,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let dish = api
        .menu_item(id)
        .await?
        .ok_or(CliError::MenuItemNotFound(id))?;
    let item = CartItem::new(dish.id, dish.name, dish.price, quantity, dish.image)?;
    let name = item.name().to_owned();
    cart.add_item(item)?;

    writeln!(out, "Added {quantity} x {name}. Cart has {} item(s).", cart.item_count())?;
    Ok(())
}

/// Apply a local edit and report the new cart size.
pub fn edit<S: CartStorage>(
    cart: &mut Cart<S>,
    change: CartEdit,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match change {
        CartEdit::Remove(id) => cart.remove_item(id)?,
        CartEdit::Update(id, quantity) => cart.update_quantity(id, quantity)?,
        CartEdit::Increment(id) => cart.increment(id)?,
        CartEdit::Decrement(id) => cart.decrement(id)?,
        CartEdit::Clear => cart.clear_cart()?,
    }
    tracing::debug!(?change, "cart updated");

    writeln!(
        out,
        "Cart has {} item(s), subtotal {}.",
        cart.item_count(),
        format_money(cart.calculate_subtotal())
    )?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use tajine_house_core::cart::{CART_STORAGE_KEY, CartError, MemoryCartStorage};

    use super::*;
    use crate::commands::fake::FakeApi;

    #[tokio::test]
    async fn test_add_uses_server_price() {
        let api = FakeApi::with_menu();
        let storage = MemoryCartStorage::default();
        let mut cart = Cart::load(&storage);
        let mut out = Vec::new();

        add(&api, &mut cart, MenuItemId::new(2), 2, &mut out).await.unwrap();
        add(&api, &mut cart, MenuItemId::new(2), 1, &mut out).await.unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity(), 3);
        assert_eq!(cart.calculate_subtotal(), Decimal::new(7350, 2));
        assert!(storage.get(CART_STORAGE_KEY).unwrap().contains("Tajine d'agneau"));
        assert!(String::from_utf8(out).unwrap().ends_with("Cart has 3 item(s).\n"));
    }

    #[tokio::test]
    async fn test_add_unknown_dish() {
        let api = FakeApi::with_menu();
        let mut cart = Cart::load(MemoryCartStorage::default());
        let err = add(&api, &mut cart, MenuItemId::new(42), 1, &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::MenuItemNotFound(id) if id == MenuItemId::new(42)));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_edits() {
        let api = FakeApi::with_menu();
        let mut cart = Cart::load(MemoryCartStorage::default());
        let mut out = Vec::new();
        add(&api, &mut cart, MenuItemId::new(1), 1, &mut out).await.unwrap();
        add(&api, &mut cart, MenuItemId::new(6), 1, &mut out).await.unwrap();

        edit(&mut cart, CartEdit::Increment(MenuItemId::new(1)), &mut out).unwrap();
        edit(&mut cart, CartEdit::Update(MenuItemId::new(6), 4), &mut out).unwrap();
        edit(&mut cart, CartEdit::Decrement(MenuItemId::new(6)), &mut out).unwrap();
        assert_eq!(cart.item_count(), 5);

        edit(&mut cart, CartEdit::Remove(MenuItemId::new(1)), &mut out).unwrap();
        assert_eq!(cart.items().len(), 1);

        assert!(matches!(
            edit(&mut cart, CartEdit::Update(MenuItemId::new(6), 0), &mut out),
            Err(CliError::Cart(CartError::InvalidQuantity))
        ));

        edit(&mut cart, CartEdit::Clear, &mut out).unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_show_mentions_shortfall() {
        let api = FakeApi::with_menu();
        let mut cart = Cart::load(MemoryCartStorage::default());
        let mut out = Vec::new();
        show(&cart, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Your cart is empty.\n");

        add(&api, &mut cart, MenuItemId::new(6), 2, &mut Vec::new()).await.unwrap();
        let mut out = Vec::new();
        show(&cart, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Subtotal:        $11.90"));
        assert!(text.contains("Delivery fee:     $0.83"));
        assert!(text.contains("add $68.10 more"));
    }
}
