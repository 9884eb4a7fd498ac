//! Menu categories and dishes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tajine_house_core::{CategoryId, MenuItemId};

use super::ValidationError;

/// A menu section such as "Starters".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Unique, URL-safe identifier (`main-dishes`).
    pub slug: String,
}

/// Data for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
}

impl NewCategory {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an empty name or a malformed slug.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "cannot be empty"));
        }
        let slug_ok = !self.slug.is_empty()
            && !self.slug.starts_with('-')
            && !self.slug.ends_with('-')
            && self
                .slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !slug_ok {
            return Err(ValidationError::new(
                "slug",
                "must be lowercase letters, digits and inner dashes",
            ));
        }
        Ok(())
    }
}

/// A dish on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    /// Image URL.
    pub image: String,
    pub category_id: CategoryId,
    /// Highlighted on the home page. `0`/`1` on the wire.
    #[serde(with = "featured_flag")]
    pub featured: bool,
    pub tags: String,
}

/// Data for creating a menu item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItem {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: String,
    pub category_id: CategoryId,
    #[serde(default, deserialize_with = "featured_flag::deserialize")]
    pub featured: bool,
    #[serde(default)]
    pub tags: String,
}

impl NewMenuItem {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an empty name or a negative price.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        validate_price(self.price)
    }
}

/// Partial update of a menu item. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub category_id: Option<CategoryId>,
    #[serde(default, deserialize_with = "featured_flag::deserialize_option")]
    pub featured: Option<bool>,
    pub tags: Option<String>,
}

impl MenuItemUpdate {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an empty name or a negative price.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    /// Apply the present fields to `item`.
    pub fn apply_to(self, item: &mut MenuItem) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(description) = self.description {
            item.description = description;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(image) = self.image {
            item.image = image;
        }
        if let Some(category_id) = self.category_id {
            item.category_id = category_id;
        }
        if let Some(featured) = self.featured {
            item.featured = featured;
        }
        if let Some(tags) = self.tags {
            item.tags = tags;
        }
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("name", "cannot be empty"));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::new("price", "cannot be negative"));
    }
    Ok(())
}

/// `featured` is an integer flag on the wire; booleans are accepted too.
mod featured_flag {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    impl Flag {
        fn into_bool<E: Error>(self) -> Result<bool, E> {
            match self {
                Self::Bool(value) => Ok(value),
                Self::Int(0) => Ok(false),
                Self::Int(1) => Ok(true),
                Self::Int(other) => Err(E::custom(format!("featured must be 0 or 1, got {other}"))),
            }
        }
    }

    #[allow(clippy::trivially_copy_pass_by_ref)] // serde's `with` signature
    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Flag::deserialize(deserializer)?.into_bool()
    }

    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<bool>, D::Error> {
        Option::<Flag>::deserialize(deserializer)?
            .map(Flag::into_bool)
            .transpose()
    }
}
