//! Sample menu loaded into an empty store.

use rust_decimal::Decimal;

use super::{RepositoryError, Storage};
use crate::models::{NewCategory, NewMenuItem};

const CATEGORIES: &[(&str, &str)] = &[
    ("Main Dishes", "main-dishes"),
    ("Starters", "starters"),
    ("Desserts", "desserts"),
    ("Beverages", "beverages"),
];

struct SeedDish {
    name: &'static str,
    description: &'static str,
    /// Price in cents.
    cents: i64,
    image: &'static str,
    category: &'static str,
    featured: bool,
    tags: &'static str,
}

const DISHES: &[SeedDish] = &[
    SeedDish {
        name: "Couscous Royal",
        description: "Traditional couscous served with lamb, chicken, merguez sausage, and a medley of seasonal vegetables in a flavorful broth.",
        cents: 2295,
        image: "https://images.unsplash.com/photo-1617621101518-1ea1f52c0fb0?ixlib=rb-1.2.1&auto=format&fit=crop&w=500&q=80",
        category: "main-dishes",
        featured: true,
        tags: "spicy",
    },
    SeedDish {
        name: "Tajine d'agneau",
        description: "Tender lamb slowly simmered with prunes, almonds, and honey in our signature blend of Moroccan spices.",
        cents: 2450,
        image: "https://images.unsplash.com/photo-1569277388175-54a3ad2a1eed?ixlib=rb-1.2.1&auto=format&fit=crop&w=500&q=80",
        category: "main-dishes",
        featured: false,
        tags: "chef-special",
    },
    SeedDish {
        name: "Pastilla au poulet",
        description: "Sweet and savory filo pastry pie filled with chicken, eggs, almonds, and aromatic spices, dusted with cinnamon and powdered sugar.",
        cents: 1895,
        image: "https://images.unsplash.com/photo-1592070969746-2d6648709819?ixlib=rb-1.2.1&auto=format&fit=crop&w=500&q=80",
        category: "main-dishes",
        featured: false,
        tags: "traditional",
    },
    SeedDish {
        name: "Harira Soup",
        description: "Traditional Moroccan soup with tomatoes, lentils, chickpeas, and tender pieces of lamb, flavored with ginger, saffron and fresh herbs.",
        cents: 995,
        image: "https://images.unsplash.com/photo-1527626557203-4030a3cad8e4?ixlib=rb-1.2.1&auto=format&fit=crop&w=500&q=80",
        category: "starters",
        featured: false,
        tags: "vegetarian",
    },
    SeedDish {
        name: "Seafood Tagine",
        description: "Fresh fish, shrimp, and mussels cooked with bell peppers, potatoes and olives in a light chermoula sauce with aromatic herbs.",
        cents: 2650,
        image: "https://images.unsplash.com/photo-1601050690597-df0568f70950?ixlib=rb-1.2.1&auto=format&fit=crop&w=500&q=80",
        category: "main-dishes",
        featured: false,
        tags: "seafood",
    },
    SeedDish {
        name: "Moroccan Mint Tea",
        description: "Traditional green tea with fresh mint leaves and sugar, served in a decorative teapot with traditional pouring ceremony.",
        cents: 595,
        image: "https://images.unsplash.com/photo-1584269600464-37b1b58a9fe7?ixlib=rb-1.2.1&auto=format&fit=crop&w=500&q=80",
        category: "beverages",
        featured: false,
        tags: "beverage",
    },
];

/// Load the sample categories and dishes if the store has no categories yet.
///
/// Returns the number of dishes created (zero when the store was not empty).
///
/// # Errors
///
/// Returns the first [`RepositoryError`] raised by the store.
pub async fn seed_menu(storage: &dyn Storage) -> Result<usize, RepositoryError> {
    if !storage.list_categories().await?.is_empty() {
        tracing::debug!("menu already present, skipping seed");
        return Ok(0);
    }

    for (name, slug) in CATEGORIES {
        storage
            .create_category(NewCategory {
                name: (*name).to_owned(),
                slug: (*slug).to_owned(),
            })
            .await?;
    }

    for dish in DISHES {
        let category = storage
            .get_category_by_slug(dish.category)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        storage
            .create_menu_item(NewMenuItem {
                name: dish.name.to_owned(),
                description: dish.description.to_owned(),
                price: Decimal::new(dish.cents, 2),
                image: dish.image.to_owned(),
                category_id: category.id,
                featured: dish.featured,
                tags: dish.tags.to_owned(),
            })
            .await?;
    }

    tracing::info!(
        categories = CATEGORIES.len(),
        dishes = DISHES.len(),
        "seeded sample menu"
    );
    Ok(DISHES.len())
}
