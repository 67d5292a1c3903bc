//! Catalog store module
//!
//! Persists products as `name, price` lines in a single text file and provides
//! the list/add/delete operations the HTTP layer dispatches to.
//!
//! The file is the only source of truth: every operation re-reads it in full.
//! Storage goes through a [`CatalogBackend`] so the same logic runs against
//! the filesystem in production and an in-memory buffer in tests.

mod codec;
mod file;
#[cfg(test)]
pub mod memory;

use serde::{Serialize, Serializer};
use std::future::Future;
use std::io;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::logger;

pub use codec::{format_price, parse_price, Line};
pub use file::FileBackend;

/// A single catalog entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub name: String,
    #[serde(serialize_with = "serialize_price")]
    pub price: f64,
}

impl Product {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }

    /// Whether this product has the given normalized key
    #[allow(clippy::float_cmp)]
    pub fn matches(&self, key: &ProductKey) -> bool {
        self.name.trim().to_lowercase() == key.name && self.price == key.price
    }
}

/// Identity used for duplicate detection and deletion:
/// trimmed lower-cased name plus numeric price.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductKey {
    pub name: String,
    pub price: f64,
}

impl ProductKey {
    pub fn new(name: &str, price: f64) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            price,
        }
    }
}

/// Catalog operation errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid product: {0}")]
    Validation(String),

    #[error("product already exists: {name}, {price}")]
    Conflict { name: String, price: String },

    #[error("product not found: {name}, {price}")]
    NotFound { name: String, price: String },

    #[error("catalog storage error: {0}")]
    Storage(#[from] io::Error),
}

/// Storage medium holding the raw catalog text
pub trait CatalogBackend {
    /// Read the whole catalog. A missing catalog is an error.
    fn load(&self) -> impl Future<Output = io::Result<String>>;

    /// Append text to the end of the catalog
    fn append(&self, text: &str) -> impl Future<Output = io::Result<()>>;

    /// Replace the catalog contents
    fn replace(&self, contents: &str) -> impl Future<Output = io::Result<()>>;
}

/// Handle to the product catalog
///
/// Mutations are serialized by an internal lock so that two concurrent adds
/// of the same product cannot both pass the duplicate check. Reads take no lock.
pub struct Catalog<B> {
    backend: B,
    write_lock: Mutex<()>,
}

impl<B: CatalogBackend> Catalog<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    #[cfg(test)]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// List all well-formed products in file order
    pub async fn list(&self) -> Result<Vec<Product>, CatalogError> {
        let lines = self.read_lines().await?;
        Ok(lines
            .into_iter()
            .filter_map(|line| match line {
                Line::Product(product) => Some(product),
                Line::Malformed(raw) => {
                    logger::log_warning(&format!("[Catalog] Skipping malformed line: '{raw}'"));
                    None
                }
            })
            .collect())
    }

    /// Add a product, rejecting duplicates of its normalized key
    pub async fn add(&self, name: &str, price: &str) -> Result<Product, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::Validation("name is required".to_string()));
        }
        // The line format has no escaping
        if name.contains([',', '\n', '\r']) {
            return Err(CatalogError::Validation(
                "name must not contain commas or line breaks".to_string(),
            ));
        }
        let price = parse_price(price)
            .ok_or_else(|| CatalogError::Validation(format!("price '{price}' is not a number")))?;
        let key = ProductKey::new(name, price);

        let _guard = self.write_lock.lock().await;
        let existing = self.read_lines().await?;
        if existing.iter().any(|line| line.matches(&key)) {
            return Err(CatalogError::Conflict {
                name: name.to_string(),
                price: format_price(price),
            });
        }

        let product = Product::new(name, price);
        self.backend
            .append(&format!("{}\n", codec::render_product(&product)))
            .await?;
        logger::log_debug(&format!(
            "[Catalog] Added '{}' at {}",
            product.name,
            format_price(product.price)
        ));
        Ok(product)
    }

    /// Delete every product matching the normalized key, returning how many were removed
    pub async fn delete(&self, name: &str, price: &str) -> Result<usize, CatalogError> {
        if name.trim().is_empty() {
            return Err(CatalogError::Validation("name is required".to_string()));
        }
        let price = parse_price(price)
            .ok_or_else(|| CatalogError::Validation(format!("price '{price}' is not a number")))?;
        let key = ProductKey::new(name, price);

        let _guard = self.write_lock.lock().await;
        let lines = self.read_lines().await?;
        let before = lines.len();
        let remaining: Vec<Line> = lines.into_iter().filter(|line| !line.matches(&key)).collect();
        let removed = before - remaining.len();

        if removed == 0 {
            return Err(CatalogError::NotFound {
                name: name.trim().to_string(),
                price: format_price(price),
            });
        }

        self.backend.replace(&codec::render_lines(&remaining)).await?;
        logger::log_debug(&format!(
            "[Catalog] Removed {removed} line(s) for '{}' at {}",
            name.trim(),
            format_price(price)
        ));
        Ok(removed)
    }

    async fn read_lines(&self) -> Result<Vec<Line>, CatalogError> {
        let contents = self.backend.load().await?;
        Ok(codec::parse_lines(&contents))
    }
}

/// Integral prices serialize as JSON integers (`20`, not `20.0`)
#[allow(clippy::trivially_copy_pass_by_ref, clippy::cast_possible_truncation)]
fn serialize_price<S: Serializer>(price: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if price.fract() == 0.0 && price.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(*price as i64)
    } else {
        serializer.serialize_f64(*price)
    }
}
