//! In-process implementation of [`Storage`].
//!
//! Every table sits behind one `tokio::sync::RwLock`, so ID allocation and
//! the matching insert happen atomically even on the multi-threaded runtime.
//! IDs start at 1 and are never reused, deletes included.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use tajine_house_core::checkout::OrderLine;
use tajine_house_core::{CategoryId, MenuItemId, OrderId, OrderItemId, OrderStatus, UserId};

use super::{RepositoryError, Storage};
use crate::models::{
    Category, MenuItem, MenuItemUpdate, NewCategory, NewMenuItem, NewOrder, NewOrderItem, NewUser,
    Order, OrderItem, OrderWithItems, User,
};

/// Rows of one entity keyed by ID, with the next ID to hand out.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i32, T>,
    next_id: i32,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Clone> Table<T> {
    /// Allocate the next ID, build the row with it and store it.
    fn insert_with(&mut self, build: impl FnOnce(i32) -> T) -> Result<T, RepositoryError> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| RepositoryError::Conflict("id space exhausted".to_owned()))?;
        let row = build(id);
        self.rows.insert(id, row.clone());
        Ok(row)
    }

    fn get(&self, id: i32) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.rows.values().find(|row| predicate(row)).cloned()
    }

    fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.values().filter(|row| predicate(row)).cloned().collect()
    }

    fn all(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Table<User>,
    categories: Table<Category>,
    menu_items: Table<MenuItem>,
    orders: Table<Order>,
    order_items: Table<OrderItem>,
}

impl Tables {
    fn insert_order(&mut self, order: NewOrder) -> Result<Order, RepositoryError> {
        let created_at = Utc::now();
        self.orders.insert_with(|id| Order {
            id: OrderId::new(id),
            customer: order.customer,
            subtotal: order.subtotal,
            delivery_fee: order.delivery_fee,
            tax: order.tax,
            total: order.total,
            status: OrderStatus::Pending,
            created_at,
        })
    }

    fn insert_order_item(&mut self, item: NewOrderItem) -> Result<OrderItem, RepositoryError> {
        self.order_items.insert_with(|id| OrderItem {
            id: OrderItemId::new(id),
            order_id: item.order_id,
            menu_item_id: item.menu_item_id,
            name: item.name,
            price: item.price,
            quantity: item.quantity,
        })
    }
}

/// [`Storage`] backed by in-memory maps. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ping(&self) -> Result<(), RepositoryError> {
        let _tables = self.tables.read().await;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().await.users.get(id.as_i32()))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .find(|user| user.username == username))
    }

    async fn get_user_by_sso_subject(&self, subject: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .find(|user| user.sso_subject.as_deref() == Some(subject)))
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.find(|u| u.username == user.username).is_some() {
            return Err(RepositoryError::Conflict(format!(
                "username {} already exists",
                user.username
            )));
        }
        if let Some(subject) = user.sso_subject.as_deref()
            && tables.users.find(|u| u.sso_subject.as_deref() == Some(subject)).is_some()
        {
            return Err(RepositoryError::Conflict(format!(
                "SSO subject {subject} already bound"
            )));
        }
        tables.users.insert_with(|id| User {
            id: UserId::new(id),
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            sso_subject: user.sso_subject,
        })
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.tables.read().await.categories.get(id.as_i32()))
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .await
            .categories
            .find(|category| category.slug == slug))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.tables.read().await.categories.all())
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.categories.find(|c| c.slug == category.slug).is_some() {
            return Err(RepositoryError::Conflict(format!(
                "category slug {} already exists",
                category.slug
            )));
        }
        tables.categories.insert_with(|id| Category {
            id: CategoryId::new(id),
            name: category.name,
            slug: category.slug,
        })
    }

    async fn get_menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError> {
        Ok(self.tables.read().await.menu_items.get(id.as_i32()))
    }

    async fn list_menu_items(&self) -> Result<Vec<MenuItem>, RepositoryError> {
        Ok(self.tables.read().await.menu_items.all())
    }

    async fn list_menu_items_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .await
            .menu_items
            .filter(|item| item.category_id == category_id))
    }

    async fn create_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, RepositoryError> {
        self.tables.write().await.menu_items.insert_with(|id| MenuItem {
            id: MenuItemId::new(id),
            name: item.name,
            description: item.description,
            price: item.price,
            image: item.image,
            category_id: item.category_id,
            featured: item.featured,
            tags: item.tags,
        })
    }

    async fn update_menu_item(
        &self,
        id: MenuItemId,
        update: MenuItemUpdate,
    ) -> Result<MenuItem, RepositoryError> {
        let mut tables = self.tables.write().await;
        let item = tables
            .menu_items
            .rows
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        update.apply_to(item);
        Ok(item.clone())
    }

    async fn delete_menu_item(&self, id: MenuItemId) -> Result<bool, RepositoryError> {
        Ok(self
            .tables
            .write()
            .await
            .menu_items
            .rows
            .remove(&id.as_i32())
            .is_some())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.tables.read().await.orders.get(id.as_i32()))
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.tables.read().await.orders.all())
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        self.tables.write().await.insert_order(order)
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .rows
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        if !order.status.can_transition_to(status) {
            return Err(RepositoryError::InvalidTransition {
                from: order.status,
                to: status,
            });
        }
        order.status = status;
        Ok(order.clone())
    }

    async fn get_order_item(&self, id: OrderItemId) -> Result<Option<OrderItem>, RepositoryError> {
        Ok(self.tables.read().await.order_items.get(id.as_i32()))
    }

    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .await
            .order_items
            .filter(|item| item.order_id == order_id))
    }

    async fn add_order_item(&self, item: NewOrderItem) -> Result<OrderItem, RepositoryError> {
        self.tables.write().await.insert_order_item(item)
    }

    async fn create_order_with_items(
        &self,
        order: NewOrder,
        lines: Vec<OrderLine>,
    ) -> Result<OrderWithItems, RepositoryError> {
        let mut tables = self.tables.write().await;
        let order = tables.insert_order(order)?;
        let items = lines
            .into_iter()
            .map(|line| {
                tables.insert_order_item(NewOrderItem {
                    order_id: order.id,
                    menu_item_id: line.id,
                    name: line.name,
                    price: line.price,
                    quantity: line.quantity,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(OrderWithItems { order, items })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use tajine_house_core::checkout::CustomerForm;

    use super::*;

    fn new_order() -> NewOrder {
        NewOrder {
            customer: CustomerForm {
                first_name: "Amina".to_owned(),
                last_name: "Benali".to_owned(),
                ..CustomerForm::default()
            },
            subtotal: Decimal::new(8000, 2),
            delivery_fee: Decimal::new(560, 2),
            tax: Decimal::ZERO,
            total: Decimal::new(8560, 2),
        }
    }

    fn new_dish(name: &str, price: Decimal, category_id: CategoryId) -> NewMenuItem {
        NewMenuItem {
            name: name.to_owned(),
            description: String::new(),
            price,
            image: String::new(),
            category_id,
            featured: false,
            tags: String::new(),
        }
    }

    #[tokio::test]
    async fn test_ids_increment_and_are_not_reused() {
        let store = MemoryStorage::new();
        let cat = CategoryId::new(1);
        let first = store.create_menu_item(new_dish("Harira", Decimal::ONE, cat)).await.unwrap();
        let second = store.create_menu_item(new_dish("Pastilla", Decimal::ONE, cat)).await.unwrap();
        assert_eq!(first.id.as_i32(), 1);
        assert_eq!(second.id.as_i32(), 2);

        assert!(store.delete_menu_item(second.id).await.unwrap());
        assert!(!store.delete_menu_item(second.id).await.unwrap());
        let third = store.create_menu_item(new_dish("Tea", Decimal::ONE, cat)).await.unwrap();
        assert_eq!(third.id.as_i32(), 3);
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let store = MemoryStorage::new();
        let category = NewCategory {
            name: "Starters".to_owned(),
            slug: "starters".to_owned(),
        };
        store.create_category(category.clone()).await.unwrap();
        assert!(matches!(
            store.create_category(category).await,
            Err(RepositoryError::Conflict(_))
        ));

        let user = NewUser {
            username: "admin".to_owned(),
            password_hash: "x".to_owned(),
            email: None,
            sso_subject: None,
        };
        store.create_user(user.clone()).await.unwrap();
        assert!(matches!(
            store.create_user(user).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(store.get_user_by_username("admin").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_menu_items_by_category() {
        let store = MemoryStorage::new();
        let mains = CategoryId::new(1);
        let drinks = CategoryId::new(4);
        store.create_menu_item(new_dish("Couscous", Decimal::TEN, mains)).await.unwrap();
        store.create_menu_item(new_dish("Mint Tea", Decimal::ONE, drinks)).await.unwrap();
        store.create_menu_item(new_dish("Tajine", Decimal::TEN, mains)).await.unwrap();

        let names: Vec<String> = store
            .list_menu_items_by_category(mains)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, ["Couscous", "Tajine"]);
    }

    #[tokio::test]
    async fn test_update_unknown_menu_item() {
        let store = MemoryStorage::new();
        let result = store
            .update_menu_item(MenuItemId::new(42), MenuItemUpdate::default())
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_order_starts_pending_and_follows_workflow() {
        let store = MemoryStorage::new();
        let order = store.create_order(new_order()).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);

        let order = store
            .update_order_status(order.id, OrderStatus::Preparing)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Preparing);

        let err = store
            .update_order_status(order.id, OrderStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::InvalidTransition {
                from: OrderStatus::Preparing,
                to: OrderStatus::Confirmed
            }
        ));

        assert!(matches!(
            store.update_order_status(OrderId::new(99), OrderStatus::Cancelled).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_create_order_with_items() {
        let store = MemoryStorage::new();
        let lines = vec![
            OrderLine {
                id: MenuItemId::new(1),
                name: "Couscous Royal".to_owned(),
                price: Decimal::new(2295, 2),
                quantity: 2,
            },
            OrderLine {
                id: MenuItemId::new(5),
                name: "Seafood Tagine".to_owned(),
                price: Decimal::new(2650, 2),
                quantity: 1,
            },
        ];
        let created = store.create_order_with_items(new_order(), lines).await.unwrap();
        assert_eq!(created.items.len(), 2);
        assert!(created.items.iter().all(|item| item.order_id == created.order.id));

        let stored = store.list_order_items(created.order.id).await.unwrap();
        assert_eq!(stored, created.items);
        let item = store.get_order_item(stored[1].id).await.unwrap().unwrap();
        assert_eq!(item.menu_item_id, MenuItemId::new(5));
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_ids() {
        let store = Arc::new(MemoryStorage::new());
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.create_order(new_order()).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id.as_i32());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 32);
        assert_eq!(store.list_orders().await.unwrap().len(), 32);
    }
}
