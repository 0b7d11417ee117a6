use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bodega_catalog::models::{Category, Item, ItemPatch};
use bodega_catalog::store::{CatalogError, ItemUpdate};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddCategoryRequest {
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCategoryRequest {
    #[serde(default)]
    pub category_name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub stock_available: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub item_id: Option<Uuid>,
    #[serde(flatten)]
    pub patch: ItemPatch,
}

#[derive(Debug, Serialize)]
pub struct ItemEnvelope {
    pub message: String,
    pub item: Item,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryItems {
    pub category_name: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryItems>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/addcategory", post(add_category))
        .route("/deletecategory", delete(delete_category))
        .route("/additem", post(add_item))
        .route("/updateitem", put(update_item))
        .route("/deleteitem/{item_id}", delete(delete_item))
        .route("/getitems", get(get_items))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /addcategory
async fn add_category(
    State(state): State<AppState>,
    Json(req): Json<AddCategoryRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    if req.category_name.is_empty() {
        return Err(CatalogError::MissingField("Category name").into());
    }

    let category = Category::new(req.category_name.clone(), req.description);
    let inserted = state
        .catalog
        .insert_category(category)
        .await
        .map_err(CatalogError::storage)?;
    if !inserted {
        return Err(CatalogError::DuplicateCategory(req.category_name).into());
    }

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Category added successfully".to_string(),
        }),
    ))
}

/// DELETE /deletecategory
/// Removes the category and every item it owns.
async fn delete_category(
    State(state): State<AppState>,
    Json(req): Json<DeleteCategoryRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if req.category_name.is_empty() {
        return Err(CatalogError::MissingField("Category name").into());
    }

    let deleted = state
        .catalog
        .delete_category(&req.category_name)
        .await
        .map_err(CatalogError::storage)?;
    if !deleted {
        return Err(CatalogError::CategoryNotFound(req.category_name).into());
    }

    Ok(Json(MessageResponse {
        message: "Category deleted successfully".to_string(),
    }))
}

/// POST /additem
async fn add_item(
    State(state): State<AppState>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<ItemEnvelope>), AppError> {
    if req.category_name.is_empty() {
        return Err(CatalogError::MissingField("Category name").into());
    }
    if req.item_name.is_empty() {
        return Err(CatalogError::MissingField("Item name").into());
    }
    if req.stock_available < 0 {
        return Err(CatalogError::NegativeStock.into());
    }
    if req.price < Decimal::ZERO {
        return Err(AppError::ValidationError(
            "Price must be a non-negative number".to_string(),
        ));
    }

    let item = Item::new(
        req.item_name,
        req.description,
        req.quantity,
        req.price,
        req.stock_available,
    );
    let added = state
        .catalog
        .add_item(&req.category_name, item)
        .await
        .map_err(CatalogError::storage)?;

    match added {
        Some(item) => Ok((
            StatusCode::CREATED,
            Json(ItemEnvelope {
                message: "Item added successfully".to_string(),
                item,
            }),
        )),
        None => Err(CatalogError::CategoryNotFound(req.category_name).into()),
    }
}

/// PUT /updateitem
/// Only the provided fields change.
async fn update_item(
    State(state): State<AppState>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if req.category_name.is_empty() {
        return Err(CatalogError::MissingField("Category name").into());
    }
    let Some(item_id) = req.item_id else {
        return Err(CatalogError::MissingField("Item id").into());
    };
    if let Some(stock) = req.patch.stock_available {
        if stock < 0 {
            return Err(CatalogError::NegativeStock.into());
        }
    }

    let outcome = state
        .catalog
        .update_item(&req.category_name, item_id, req.patch)
        .await
        .map_err(CatalogError::storage)?;

    match outcome {
        ItemUpdate::Updated => Ok(Json(MessageResponse {
            message: "Item updated successfully".to_string(),
        })),
        ItemUpdate::CategoryMissing => Err(CatalogError::CategoryNotFound(req.category_name).into()),
        ItemUpdate::ItemMissing => Err(CatalogError::ItemNotFound(item_id.to_string()).into()),
        ItemUpdate::NothingToUpdate => Err(CatalogError::NothingToUpdate.into()),
    }
}

/// DELETE /deleteitem/{item_id}
async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let deleted = state
        .catalog
        .delete_item(item_id)
        .await
        .map_err(CatalogError::storage)?;
    if !deleted {
        return Err(CatalogError::ItemNotFound(item_id.to_string()).into());
    }

    Ok(Json(MessageResponse {
        message: "Item deleted successfully".to_string(),
    }))
}

/// GET /getitems
/// Items grouped by category.
async fn get_items(State(state): State<AppState>) -> Result<Json<CategoryListResponse>, AppError> {
    let categories = state
        .catalog
        .list_categories()
        .await
        .map_err(CatalogError::storage)?;

    let categories = categories
        .into_iter()
        .map(|c| CategoryItems {
            category_name: c.category_name,
            items: c.items,
        })
        .collect();

    Ok(Json(CategoryListResponse { categories }))
}
