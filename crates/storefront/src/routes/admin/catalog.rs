//! Product, category and series management.
//!
//! Deleting a category or series also deletes its products. Nothing else
//! checks references: products may point at categories that do not exist.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use hembit_core::{CategoryId, CurrencyCode, ProductId, SeriesId};

use super::MessageResponse;
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Category, Product, Series, catalog::DEFAULT_SIZES};
use crate::routes::all_present;
use crate::state::AppState;

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
}

#[instrument(skip(state, _admin))]
pub async fn list_products(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<ProductsResponse> {
    let response = state.store().read(|doc| ProductsResponse {
        products: doc.products.clone(),
        categories: doc.categories.clone(),
    });
    Json(response)
}

/// Product fields accepted on create and update.
///
/// On create, name, slug, category, series and a positive price are
/// required. On update every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub category_id: Option<String>,
    pub series_id: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<CurrencyCode>,
    pub description: Option<String>,
    pub details: Option<String>,
    pub images: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub stock: Option<i64>,
    pub featured: Option<bool>,
}

impl ProductInput {
    /// Apply every supplied field to `product`.
    fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(slug) = self.slug {
            product.slug = slug;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = CategoryId::new(category_id);
        }
        if let Some(series_id) = self.series_id {
            product.series_id = SeriesId::new(series_id);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(currency) = self.currency {
            product.currency = currency;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(details) = self.details {
            product.details = details;
        }
        if let Some(images) = self.images {
            product.images = images;
        }
        if let Some(sizes) = self.sizes {
            product.sizes = sizes;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(featured) = self.featured {
            product.featured = featured;
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: Product,
}

/// Create a product. New products are listed first.
#[instrument(skip(state, _admin, input))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let required =
        || AppError::bad_request("name, slug, categoryId, seriesId, and price are required");
    let [name, slug, category_id, series_id] = all_present([
        input.name.as_ref(),
        input.slug.as_ref(),
        input.category_id.as_ref(),
        input.series_id.as_ref(),
    ])
    .ok_or_else(required)?;
    let price = input
        .price
        .filter(|p| *p > Decimal::ZERO)
        .ok_or_else(required)?;

    let mut product = Product {
        id: ProductId::generate(),
        name: name.to_owned(),
        slug: slug.to_owned(),
        category_id: CategoryId::new(category_id),
        series_id: SeriesId::new(series_id),
        price,
        currency: CurrencyCode::default(),
        description: String::new(),
        details: String::new(),
        images: Vec::new(),
        sizes: DEFAULT_SIZES.map(str::to_owned).to_vec(),
        stock: 0,
        featured: false,
        created_at: Some(Utc::now()),
    };
    ProductInput {
        name: None,
        slug: None,
        category_id: None,
        series_id: None,
        price: None,
        ..input
    }
    .apply(&mut product);

    state
        .store()
        .write(|doc| doc.products.insert(0, product.clone()))?;
    tracing::info!(product_id = %product.id, slug = %product.slug, "product created");

    Ok((StatusCode::CREATED, Json(ProductResponse { product })))
}

/// Update any subset of a product's fields.
#[instrument(skip(state, _admin, input))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<ProductResponse>> {
    if input.price.is_some_and(|p| p <= Decimal::ZERO) {
        return Err(AppError::bad_request("price must be greater than zero"));
    }

    let product = state.store().try_write(|doc| {
        let product = doc
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::not_found("Product not found"))?;
        input.apply(product);
        Ok::<_, AppError>(product.clone())
    })?;

    Ok(Json(ProductResponse { product }))
}

/// Delete a product. Deleting an unknown ID is not an error.
#[instrument(skip(state, _admin))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<MessageResponse>> {
    state.store().write(|doc| doc.products.retain(|p| p.id != id))?;
    Ok(MessageResponse::new("Product deleted"))
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

#[instrument(skip(state, _admin))]
pub async fn list_categories(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<CategoriesResponse> {
    let categories = state.store().read(|doc| doc.categories.clone());
    Json(CategoriesResponse { categories })
}

/// Name and slug, for categories and series.
#[derive(Debug, Deserialize)]
pub struct NamedInput {
    pub name: Option<String>,
    pub slug: Option<String>,
}

impl NamedInput {
    fn required(&self) -> Result<[&str; 2]> {
        all_present([self.name.as_ref(), self.slug.as_ref()])
            .ok_or_else(|| AppError::bad_request("name and slug are required"))
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub category: Category,
}

/// Create an empty category at the end of the menu.
#[instrument(skip(state, _admin, input))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(input): ApiJson<NamedInput>,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    let [name, slug] = input.required()?;

    let category = state.store().write(|doc| {
        let category = Category {
            id: CategoryId::generate(),
            name: name.to_owned(),
            slug: slug.to_owned(),
            order: u32::try_from(doc.categories.len() + 1).unwrap_or(u32::MAX),
            series: Vec::new(),
        };
        doc.categories.push(category.clone());
        category
    })?;

    Ok((StatusCode::CREATED, Json(CategoryResponse { category })))
}

/// Rename a category or change its slug.
#[instrument(skip(state, _admin, input))]
pub async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<CategoryId>,
    ApiJson(input): ApiJson<NamedInput>,
) -> Result<Json<CategoryResponse>> {
    let category = state.store().try_write(|doc| {
        let category = doc
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::not_found("Category not found"))?;
        if let Some(name) = input.name {
            category.name = name;
        }
        if let Some(slug) = input.slug {
            category.slug = slug;
        }
        Ok::<_, AppError>(category.clone())
    })?;

    Ok(Json(CategoryResponse { category }))
}

/// Delete a category together with every product in it.
#[instrument(skip(state, _admin))]
pub async fn delete_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<Json<MessageResponse>> {
    let removed = state.store().write(|doc| {
        doc.categories.retain(|c| c.id != id);
        let before = doc.products.len();
        doc.products.retain(|p| p.category_id != id);
        before - doc.products.len()
    })?;
    tracing::info!(category_id = %id, products_removed = removed, "category deleted");

    Ok(MessageResponse::new("Category deleted"))
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub series: Series,
}

/// Add a series to a category.
#[instrument(skip(state, _admin, input))]
pub async fn add_series(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<CategoryId>,
    ApiJson(input): ApiJson<NamedInput>,
) -> Result<(StatusCode, Json<SeriesResponse>)> {
    let [name, slug] = input.required()?;
    let series = Series {
        id: SeriesId::generate(),
        name: name.to_owned(),
        slug: slug.to_owned(),
    };

    state.store().try_write(|doc| {
        let category = doc
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::not_found("Category not found"))?;
        category.series.push(series.clone());
        Ok::<_, AppError>(())
    })?;

    Ok((StatusCode::CREATED, Json(SeriesResponse { series })))
}

/// Delete a series and its products. Nothing happens if the category is
/// unknown.
#[instrument(skip(state, _admin))]
pub async fn delete_series(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((id, series_id)): Path<(CategoryId, SeriesId)>,
) -> Result<Json<MessageResponse>> {
    state.store().write(|doc| {
        if let Some(category) = doc.categories.iter_mut().find(|c| c.id == id) {
            category.series.retain(|s| s.id != series_id);
            doc.products.retain(|p| p.series_id != series_id);
        }
    })?;

    Ok(MessageResponse::new("Series deleted"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product() -> Product {
        serde_json::from_value(json!({
            "id": "prd_1",
            "name": "Indigo Kurta",
            "slug": "indigo-kurta",
            "categoryId": "cat_men",
            "seriesId": "ser_festive",
            "price": 2499,
            "sizes": ["M"]
        }))
        .unwrap()
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut product = product();
        let input: ProductInput = serde_json::from_value(json!({
            "price": "2999",
            "featured": true
        }))
        .unwrap();
        input.apply(&mut product);

        assert_eq!(product.price, Decimal::from(2999));
        assert!(product.featured);
        assert_eq!(product.name, "Indigo Kurta");
        assert_eq!(product.sizes, vec!["M"]);
    }

    #[test]
    fn test_unknown_currency_is_rejected() {
        let result = serde_json::from_value::<ProductInput>(json!({"currency": "JPY"}));
        assert!(result.is_err());
    }
}
