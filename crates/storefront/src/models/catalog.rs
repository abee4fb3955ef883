//! Catalog types: products, categories and their series.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hembit_core::{CategoryId, CurrencyCode, Price, ProductId, SeriesId};

use super::{Document, lenient};

/// Sizes offered when a product is created without an explicit list.
pub const DEFAULT_SIZES: [&str; 4] = ["S", "M", "L", "XL"];

/// A sellable product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub category_id: CategoryId,
    pub series_id: SeriesId,
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "lenient::decimal_or_zero"
    )]
    pub price: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub stock: i64,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// The product's price with its currency.
    #[must_use]
    pub const fn price_tag(&self) -> Price {
        Price::new(self.price, self.currency)
    }

    /// Case-insensitive substring match over name, description and details.
    ///
    /// `term` must already be lowercase.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        [&self.name, &self.description, &self.details]
            .iter()
            .any(|field| field.to_lowercase().contains(term))
    }
}

/// A top-level catalog category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    pub order: u32,
    #[serde(default)]
    pub series: Vec<Series>,
}

/// A product line within a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: SeriesId,
    pub name: String,
    pub slug: String,
}

/// A product with display fields resolved against the catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub display_price: String,
    pub category_name: String,
    pub series_name: String,
}

impl ProductView {
    /// Resolve category and series names, falling back to
    /// `Uncategorized` / `General` for dangling references.
    #[must_use]
    pub fn derive(doc: &Document, product: &Product) -> Self {
        let category = doc.find_category(&product.category_id);
        let series = category.and_then(|c| c.series.iter().find(|s| s.id == product.series_id));

        Self {
            display_price: product.price_tag().display(),
            category_name: category.map_or_else(|| "Uncategorized".to_owned(), |c| c.name.clone()),
            series_name: series.map_or_else(|| "General".to_owned(), |s| s.name.clone()),
            product: product.clone(),
        }
    }
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
            "description": "Hand-block printed",
            "details": "100% cotton"
        }))
        .unwrap()
    }

    #[test]
    fn test_price_is_a_json_number() {
        let value = serde_json::to_value(product()).unwrap();
        assert_eq!(value["price"], json!(2499.0));
        assert_eq!(value["currency"], "INR");
    }

    #[test]
    fn test_matches_search() {
        let p = product();
        assert!(p.matches_search("indigo"));
        assert!(p.matches_search("cotton"));
        assert!(p.matches_search("block"));
        assert!(!p.matches_search("silk"));
    }

    #[test]
    fn test_view_falls_back_for_dangling_references() {
        let doc = Document::default();
        let view = ProductView::derive(&doc, &product());
        assert_eq!(view.category_name, "Uncategorized");
        assert_eq!(view.series_name, "General");
        assert_eq!(view.display_price, "₹2,499");

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["slug"], "indigo-kurta");
        assert_eq!(value["displayPrice"], "₹2,499");
    }

    #[test]
    fn test_view_resolves_names() {
        let mut doc = Document::default();
        doc.categories.push(Category {
            id: CategoryId::new("cat_men"),
            name: "Men".into(),
            slug: "men".into(),
            order: 1,
            series: vec![Series {
                id: SeriesId::new("ser_festive"),
                name: "Festive".into(),
                slug: "festive".into(),
            }],
        });
        let view = ProductView::derive(&doc, &product());
        assert_eq!(view.category_name, "Men");
        assert_eq!(view.series_name, "Festive");
    }
}
