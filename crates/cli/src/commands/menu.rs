//! `th-cli menu`

use std::io::Write;

use tajine_house_core::{CategoryId, format_money};

use crate::api::OrderApi;
use crate::error::CliError;

/// Print the menu, optionally for one category. Featured dishes get a `*`.
pub async fn list(
    api: &dyn OrderApi,
    category: Option<CategoryId>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let items = api.menu_items(category).await?;
    if items.is_empty() {
        writeln!(out, "No dishes found.")?;
        return Ok(());
    }

    for item in &items {
        let featured = if item.featured { " *" } else { "" };
        writeln!(
            out,
            "{:>4}  {:<28} {:>9}{featured}",
            item.id.to_string(),
            item.name,
            format_money(item.price)
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::fake::FakeApi;

    #[tokio::test]
    async fn test_lists_dishes() {
        let api = FakeApi::with_menu();
        let mut out = Vec::new();
        list(&api, None, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("Couscous Royal"));
        assert!(text.contains("$22.95 *"));
    }

    #[tokio::test]
    async fn test_category_filter_and_empty() {
        let api = FakeApi::with_menu();
        let mut out = Vec::new();
        list(&api, Some(CategoryId::new(4)), &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Moroccan Mint Tea"));
        assert!(!text.contains("Couscous"));

        let mut out = Vec::new();
        list(&api, Some(CategoryId::new(9)), &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No dishes found.\n");
    }
}
