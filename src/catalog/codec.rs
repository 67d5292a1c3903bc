//! Line format of the catalog file
//!
//! One product per line, `name, price`. The name is everything before the
//! first comma. Names containing commas therefore cannot round-trip.

use super::{Product, ProductKey};

/// A parsed, non-blank catalog line
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Product(Product),
    /// Kept verbatim (trimmed) so rewrites do not drop it
    Malformed(String),
}

impl Line {
    pub fn matches(&self, key: &ProductKey) -> bool {
        match self {
            Self::Product(product) => product.matches(key),
            Self::Malformed(_) => false,
        }
    }
}

/// Parse catalog text, ignoring blank lines
pub fn parse_lines(contents: &str) -> Vec<Line> {
    contents
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Line {
    let Some((name, price)) = line.split_once(',') else {
        return Line::Malformed(line.to_string());
    };
    let name = name.trim();
    match parse_price(price) {
        Some(price) if !name.is_empty() => Line::Product(Product::new(name, price)),
        _ => Line::Malformed(line.to_string()),
    }
}

/// Parse a price, accepting surrounding whitespace. Only finite numbers are prices.
pub fn parse_price(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
}

/// Shortest decimal form: `20`, `999.99`
pub fn format_price(price: f64) -> String {
    price.to_string()
}

pub fn render_product(product: &Product) -> String {
    format!("{}, {}", product.name, format_price(product.price))
}

/// Render lines back to file contents, with a trailing newline only when non-empty
pub fn render_lines(lines: &[Line]) -> String {
    let body = lines
        .iter()
        .map(|line| match line {
            Line::Product(product) => render_product(product),
            Line::Malformed(raw) => raw.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n");

    if body.is_empty() {
        body
    } else {
        body + "\n"
    }
}
