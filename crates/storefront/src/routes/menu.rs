//! Menu and category routes.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use tracing::instrument;

use tajine_house_core::{CategoryId, MenuItemId};

use crate::db::Storage;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Category, MenuItem, MenuItemUpdate, NewCategory, NewMenuItem};
use crate::state::AppState;

async fn ensure_category(storage: &dyn Storage, id: CategoryId) -> Result<()> {
    if storage.get_category(id).await?.is_none() {
        return Err(AppError::BadRequest(format!("unknown category {id}")));
    }
    Ok(())
}

/// `GET /api/categories`
#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.storage().list_categories().await?))
}

/// `POST /api/categories` (admin)
#[instrument(skip(state, admin, body), fields(admin = %admin.username))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    body: std::result::Result<Json<NewCategory>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>)> {
    let Json(category) = body?;
    category.validate()?;
    let created = state.storage().create_category(category).await?;
    tracing::info!(category_id = %created.id, slug = %created.slug, "category created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/menu-items`
#[instrument(skip(state))]
pub async fn list_menu_items(State(state): State<AppState>) -> Result<Json<Vec<MenuItem>>> {
    Ok(Json(state.storage().list_menu_items().await?))
}

/// `GET /api/menu-items/{id}`
#[instrument(skip(state, id))]
pub async fn get_menu_item(
    State(state): State<AppState>,
    id: std::result::Result<Path<MenuItemId>, PathRejection>,
) -> Result<Json<MenuItem>> {
    let Path(id) = id.map_err(|_| AppError::BadRequest("Invalid menu item ID".to_string()))?;
    state
        .storage()
        .get_menu_item(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Menu item not found".to_string()))
}

/// `GET /api/menu-items/category/{categoryId}`
///
/// An unknown category yields an empty list.
#[instrument(skip(state, category_id))]
pub async fn list_menu_items_by_category(
    State(state): State<AppState>,
    category_id: std::result::Result<Path<CategoryId>, PathRejection>,
) -> Result<Json<Vec<MenuItem>>> {
    let Path(category_id) =
        category_id.map_err(|_| AppError::BadRequest("Invalid category ID".to_string()))?;
    Ok(Json(
        state
            .storage()
            .list_menu_items_by_category(category_id)
            .await?,
    ))
}

/// `POST /api/menu-items` (admin)
#[instrument(skip(state, admin, body), fields(admin = %admin.username))]
pub async fn create_menu_item(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    body: std::result::Result<Json<NewMenuItem>, JsonRejection>,
) -> Result<(StatusCode, Json<MenuItem>)> {
    let Json(item) = body?;
    item.validate()?;
    ensure_category(state.storage(), item.category_id).await?;

    let created = state.storage().create_menu_item(item).await?;
    tracing::info!(menu_item_id = %created.id, name = %created.name, "menu item created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /api/menu-items/{id}` (admin), partial update.
#[instrument(skip(state, admin, id, body), fields(admin = %admin.username))]
pub async fn update_menu_item(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    id: std::result::Result<Path<MenuItemId>, PathRejection>,
    body: std::result::Result<Json<MenuItemUpdate>, JsonRejection>,
) -> Result<Json<MenuItem>> {
    let Path(id) = id.map_err(|_| AppError::BadRequest("Invalid menu item ID".to_string()))?;
    let Json(update) = body?;
    update.validate()?;
    if let Some(category_id) = update.category_id {
        ensure_category(state.storage(), category_id).await?;
    }

    let updated = state.storage().update_menu_item(id, update).await?;
    tracing::info!(menu_item_id = %id, "menu item updated");
    Ok(Json(updated))
}

/// `DELETE /api/menu-items/{id}` (admin)
#[instrument(skip(state, admin, id), fields(admin = %admin.username))]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    id: std::result::Result<Path<MenuItemId>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = id.map_err(|_| AppError::BadRequest("Invalid menu item ID".to_string()))?;
    if state.storage().delete_menu_item(id).await? {
        tracing::info!(menu_item_id = %id, "menu item deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Menu item not found".to_string()))
    }
}
