//! Reference data derived from the sales-history listing.
//!
//! The remote service exposes no dedicated lookup endpoints for this
//! client's selectors, so every selectable list (organizations, warehouses,
//! customers, price types, catalog items) is derived heuristically from the
//! documents returned by `GET /docs_sales/`. Derivation is pure: a slice of
//! [`SalesDocument`] in, deduplicated candidate lists out, no I/O.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Offset for synthesized catalog-item ids, chosen to stay clear of the
/// other synthetic id ranges (price types count from 1).
const CATALOG_ID_OFFSET: i64 = 45690;

/// Cap on the number of catalog items derived from one listing.
const CATALOG_ITEM_LIMIT: usize = 20;

// ---------------------------------------------------------------------------
// Wire and derived types
// ---------------------------------------------------------------------------

/// One historical sales document as returned by the listing endpoint.
///
/// Every field defaults when absent; the listing is the backend's own and
/// this client must not fall over on shape drift.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalesDocument {
    #[serde(default)]
    pub id: i64,
    /// Document number; the backend sends either a string or a number.
    #[serde(default)]
    pub number: Option<Value>,
    #[serde(default)]
    pub organization: Option<i64>,
    #[serde(default)]
    pub warehouse: Option<i64>,
    #[serde(default)]
    pub contragent: Option<i64>,
    #[serde(default)]
    pub contragent_name: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub sum: f64,
}

/// A selectable organization. The listing carries only the id, so the name
/// is a synthesized label, not one from the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
}

/// A selectable warehouse; same synthesized-label caveat as [`Organization`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warehouse {
    pub id: i64,
    pub name: String,
}

/// A selectable paybox. The sales listing carries no usable paybox field,
/// so derived paybox lists are always empty; the type exists because a
/// selected paybox ref still travels with the submitted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paybox {
    pub id: i64,
    pub name: String,
}

/// A price type, repurposed from the distinct `operation` labels seen in
/// the listing and numbered sequentially from 1 in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceType {
    pub id: i64,
    pub name: String,
}

/// A catalog item, repurposed from a positive-sum document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

/// A customer candidate. Derived candidates carry a synthetic placeholder
/// phone (see [`synthetic_phone`]); searched candidates carry whatever the
/// search endpoint returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: String,
}

/// The full set of derived selector lists for the order form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferenceData {
    pub organizations: Vec<Organization>,
    pub warehouses: Vec<Warehouse>,
    pub payboxes: Vec<Paybox>,
    pub price_types: Vec<PriceType>,
    pub nomenclatures: Vec<CatalogItem>,
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

impl SalesDocument {
    /// Label used when synthesizing a catalog-item name: the document
    /// number when it is a non-empty string or non-zero number, otherwise
    /// the document id.
    fn label(&self) -> String {
        match &self.number {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) if n.as_i64() != Some(0) => n.to_string(),
            _ => self.id.to_string(),
        }
    }
}

/// Non-zero id, or nothing. Zero ids are treated the same as absent ones
/// throughout derivation.
fn present(id: Option<i64>) -> Option<i64> {
    id.filter(|&v| v != 0)
}

/// Derive all selector lists from the listing in one pass per list.
///
/// Duplicate ids keep the first occurrence in document order; later
/// duplicates are dropped, not merged. Paybox candidates are always empty
/// (the listing has no source for them).
pub fn derive_reference_data(docs: &[SalesDocument]) -> ReferenceData {
    let mut organizations = Vec::new();
    let mut seen_orgs = HashSet::new();
    for id in docs.iter().filter_map(|d| present(d.organization)) {
        if seen_orgs.insert(id) {
            organizations.push(Organization {
                id,
                name: format!("Organization {id}"),
            });
        }
    }

    let mut warehouses = Vec::new();
    let mut seen_whs = HashSet::new();
    for id in docs.iter().filter_map(|d| present(d.warehouse)) {
        if seen_whs.insert(id) {
            warehouses.push(Warehouse {
                id,
                name: format!("Warehouse {id}"),
            });
        }
    }

    let mut price_types = Vec::new();
    let mut seen_ops = HashSet::new();
    for op in docs
        .iter()
        .filter_map(|d| d.operation.as_deref())
        .filter(|op| !op.is_empty())
    {
        if seen_ops.insert(op.to_string()) {
            price_types.push(PriceType {
                id: price_types.len() as i64 + 1,
                name: op.to_string(),
            });
        }
    }

    let nomenclatures = docs
        .iter()
        .filter(|d| d.sum > 0.0)
        .enumerate()
        .map(|(i, d)| CatalogItem {
            id: CATALOG_ID_OFFSET + i as i64,
            name: format!("Item from order #{}", d.label()),
            price: d.sum,
        })
        .take(CATALOG_ITEM_LIMIT)
        .collect();

    ReferenceData {
        organizations,
        warehouses,
        payboxes: Vec::new(),
        price_types,
        nomenclatures,
    }
}

/// Derive customer candidates: documents with both a contragent id and a
/// name, deduplicated first-seen by id, each with a synthetic placeholder
/// phone.
pub fn derive_customer_candidates(docs: &[SalesDocument]) -> Vec<Customer> {
    let mut customers = Vec::new();
    let mut seen = HashSet::new();
    for doc in docs {
        let Some(id) = present(doc.contragent) else {
            continue;
        };
        let Some(name) = doc.contragent_name.as_deref().filter(|n| !n.is_empty()) else {
            continue;
        };
        if seen.insert(id) {
            customers.push(Customer {
                id,
                name: name.to_string(),
                phone: synthetic_phone(),
            });
        }
    }
    customers
}

/// A placeholder `+7` phone number with ten random digits.
///
/// The listing does not expose customer phones, so derived candidates get
/// a stand-in for display only. It must never be persisted or submitted as
/// real contact data.
pub fn synthetic_phone() -> String {
    let digits: u64 = rand::thread_rng().gen_range(1_000_000_000..10_000_000_000);
    format!("+7{digits}")
}

// ===========================================================================
// Tests
// ===========================================================================
