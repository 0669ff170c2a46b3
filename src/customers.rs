//! Customer search by phone prefix.
//!
//! The dedicated `/contragents/` endpoint is the primary path. It is not
//! always deployed, so any failure falls back to deriving candidates from
//! the sales-history listing instead; the operator keeps a usable picker
//! either way. Search is gated on a minimum phone-prefix length to avoid
//! firing a request per keystroke.

use serde_json::Value;
use tracing::{info, warn};

use crate::api;
use crate::reference::{Customer, SalesDocument};
use crate::{value_i64, value_str};

/// Phone prefixes shorter than this perform no network call at all.
pub const MIN_SEARCH_PHONE_LEN: usize = 10;

/// Cap on candidates produced by the sales-listing fallback.
const FALLBACK_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Response extraction
// ---------------------------------------------------------------------------

/// Extract a customer from one loosely-shaped search response object.
/// Entries without an id are dropped; a missing name gets a generic label
/// and a missing phone stays empty.
fn customer_from_value(value: &Value) -> Option<Customer> {
    let id = value_i64(value, &["id", "contragent_id"])?;
    let name = value_str(value, &["name", "contragent_name"])
        .unwrap_or_else(|| format!("Customer {id}"));
    let phone = value_str(value, &["phone", "phone_number"]).unwrap_or_default();
    Some(Customer { id, name, phone })
}

/// Fallback candidates from the sales listing: documents with both a
/// contragent id and name, carrying the queried phone, first
/// [`FALLBACK_LIMIT`] in document order. Deliberately no deduplication —
/// this mirrors the raw listing the operator would otherwise scan by eye.
fn fallback_candidates(docs: &[SalesDocument], phone: &str) -> Vec<Customer> {
    docs.iter()
        .filter_map(|doc| {
            let id = doc.contragent.filter(|&v| v != 0)?;
            let name = doc.contragent_name.as_deref().filter(|n| !n.is_empty())?;
            Some(Customer {
                id,
                name: name.to_string(),
                phone: phone.to_string(),
            })
        })
        .take(FALLBACK_LIMIT)
        .collect()
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Search customers by phone prefix.
///
/// Returns `Some(results)` when either the search endpoint or the
/// sales-listing fallback produced an answer, and `None` when no answer
/// exists (prefix too short, or both paths failed) — in which case the
/// caller keeps whatever results it already shows.
pub async fn search_by_phone(base_url: &str, token: &str, phone: &str) -> Option<Vec<Customer>> {
    if phone.chars().count() < MIN_SEARCH_PHONE_LEN {
        return None;
    }

    match api::search_contragents(base_url, token, phone).await {
        Ok(values) => Some(values.iter().filter_map(customer_from_value).collect()),
        Err(e) => {
            info!(error = %e, "customer search unavailable, deriving from sales listing");
            match api::fetch_sales_documents(base_url, token).await {
                Ok(docs) => Some(fallback_candidates(&docs, phone)),
                Err(e) => {
                    warn!(error = %e, "sales-listing fallback failed, keeping prior results");
                    None
                }
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
