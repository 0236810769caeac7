//! Immutable in-memory stationery catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Stock status of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
}

/// A single stationery item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub sku: u32,

    /// Item variant within its category, e.g. "gel" or "microtip".
    #[serde(rename = "type")]
    pub kind: String,

    pub status: Availability,

    /// Unit price in cents.
    pub price: u32,
}

impl Item {
    fn new(sku: u32, kind: &str, status: Availability, price: u32) -> Self {
        Self {
            sku,
            kind: kind.to_string(),
            status,
            price,
        }
    }
}

/// Category to item-list lookup. Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct StationeryCatalog {
    items: BTreeMap<String, Vec<Item>>,
}

impl StationeryCatalog {
    /// The seeded production catalog: pens, pencil, and eraser stock.
    pub fn seeded() -> Self {
        let mut items = BTreeMap::new();
        items.insert(
            "pens".to_string(),
            vec![Item::new(1, "gel", Availability::Available, 83)],
        );
        items.insert(
            "pencil".to_string(),
            vec![Item::new(2, "microtip", Availability::Unavailable, 19)],
        );
        items.insert(
            "eraser".to_string(),
            vec![Item::new(3, "rubber", Availability::Available, 13)],
        );
        Self { items }
    }

    /// Look up the items in a category. Exact match, no normalization.
    pub fn lookup(&self, category: &str) -> Option<&[Item]> {
        self.items.get(category).map(Vec::as_slice)
    }

    /// Iterate the known category names.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }
}
