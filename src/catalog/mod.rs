//! Innermost-tier product catalog backed by a static JSON document.
//!
//! The document follows the merchandising feed layout: products live under
//! `data.gridWall.productList`, and each entry's price and color are buried
//! inside `childSkus` (`price.devicePaymentPrice[].originalPrice`,
//! `color.displayName`). The catalog flattens those at load time.
//!
//! An unloaded or empty catalog is a data-readiness problem
//! ([`Error::DataUnavailable`]); a per-item miss is [`Error::NotFound`]. The
//! distinction survives every hop of the aggregation chain.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One catalog product, flattened from the feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// In-memory catalog, loaded once at startup and read-only afterwards.
#[derive(Debug)]
pub struct ProductCatalog {
    products: Vec<Product>,
}

impl ProductCatalog {
    /// Parses the feed document and flattens each product entry.
    pub fn from_json(root: &serde_json::Value) -> Result<Self> {
        let list = root
            .pointer("/data/gridWall/productList")
            .and_then(|v| v.as_array())
            .ok_or_else(|| Error::DataUnavailable {
                detail: "'productList' missing or not an array".to_string(),
            })?;

        let mut products = Vec::with_capacity(list.len());
        for node in list {
            let mut product: Product =
                serde_json::from_value(node.clone()).map_err(|e| Error::DataUnavailable {
                    detail: format!("malformed product entry: {e}"),
                })?;

            let child_skus = node.get("childSkus");
            if product.price.is_none() {
                product.price = child_skus.and_then(extract_price);
                if product.price.is_none() {
                    warn!(product_id = product.product_id.as_str(), "no valid price in feed");
                }
            }
            if product.color.is_none() {
                product.color = child_skus.and_then(extract_color);
            }
            products.push(product);
        }

        info!(count = products.len(), "product catalog loaded");
        Ok(Self { products })
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let root: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| Error::DataUnavailable {
                detail: format!("unable to parse product feed: {e}"),
            })?;
        Self::from_json(&root)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// The whole collection. An empty catalog is never served as an empty
    /// success — it is a readiness failure.
    pub fn all(&self) -> Result<&[Product]> {
        if self.products.is_empty() {
            return Err(Error::DataUnavailable {
                detail: "product catalog is empty".to_string(),
            });
        }
        Ok(&self.products)
    }

    pub fn get(&self, id: &str) -> Result<&Product> {
        self.products
            .iter()
            .find(|p| p.product_id == id)
            .ok_or_else(|| Error::NotFound {
                subject: format!("product {id}"),
            })
    }

    pub fn price(&self, id: &str) -> Result<f64> {
        let product = self.get(id)?;
        product.price.ok_or_else(|| Error::DataUnavailable {
            detail: format!("no price recorded for product {id}"),
        })
    }
}

/// First `originalPrice` found under any sku's `price.devicePaymentPrice`.
fn extract_price(child_skus: &serde_json::Value) -> Option<f64> {
    for sku in child_skus.as_array()? {
        let Some(device_pay) = sku.pointer("/price/devicePaymentPrice").and_then(|v| v.as_array())
        else {
            continue;
        };
        for item in device_pay {
            if let Some(price) = item.get("originalPrice").and_then(|p| p.as_f64()) {
                return Some(price);
            }
        }
    }
    None
}

/// First non-blank `color.displayName` across the skus.
fn extract_color(child_skus: &serde_json::Value) -> Option<String> {
    for sku in child_skus.as_array()? {
        if let Some(name) = sku.pointer("/color/displayName").and_then(|v| v.as_str()) {
            if !name.trim().is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}
