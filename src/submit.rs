//! Order submission: serializing the draft into the remote document shape
//! and posting it in draft or posted mode.
//!
//! A transport failure is never surfaced to the operator as an error.
//! Instead the submitter reports a simulated confirmation carrying the
//! same computed total, so the sale flow is uninterrupted when the backend
//! is unreachable. Callers get the distinction as an explicit
//! [`SubmissionOutcome`] variant and can flag simulated confirmations
//! visibly instead of displaying them as real ones.

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use crate::api;
use crate::order::{line_discounted, OrderDraft};

/// Fixed unit-of-measure code expected by the remote system; opaque here.
const UNIT_PIECE: i64 = 116;

/// Operation label for documents created by this client.
const OPERATION_ORDER: &str = "Order";

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What a submission attempt reported back to the operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmissionOutcome {
    /// The remote accepted the document.
    Confirmed { posted: bool, total: f64 },
    /// The remote was unreachable; the confirmation is local-only and no
    /// document was written.
    Simulated { posted: bool, total: f64 },
}

impl SubmissionOutcome {
    pub fn posted(&self) -> bool {
        match *self {
            SubmissionOutcome::Confirmed { posted, .. }
            | SubmissionOutcome::Simulated { posted, .. } => posted,
        }
    }

    pub fn total(&self) -> f64 {
        match *self {
            SubmissionOutcome::Confirmed { total, .. }
            | SubmissionOutcome::Simulated { total, .. } => total,
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, SubmissionOutcome::Simulated { .. })
    }
}

// ---------------------------------------------------------------------------
// Numeric coercion (submission-time)
// ---------------------------------------------------------------------------

/// Longest-numeric-prefix float parse. `"12.5abc"` is 12.5; input with no
/// numeric prefix is `None`, which serializes as the JSON `null` sentinel
/// the remote is responsible for rejecting.
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    for end in (1..=trimmed.len()).rev() {
        if !trimmed.is_char_boundary(end) {
            continue;
        }
        if let Ok(v) = trimmed[..end].parse::<f64>() {
            return Some(v);
        }
    }
    None
}

/// Longest-numeric-prefix integer parse; the fractional part is cut, so
/// `"12.7"` is 12. Input with no leading digits is `None`.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    // Parse through f64 so absurdly long digit runs truncate instead of
    // overflowing.
    let value: f64 = digits.parse().ok()?;
    Some((sign * value) as i64)
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Serialize the draft into the remote `docs_sales` document shape.
///
/// All reference ids are integer-coerced; non-numeric refs become `null`.
/// Per-line `sum_discounted` uses the same discount formula as the grand
/// total. `dated` is the submission time in epoch seconds.
pub fn build_sales_document(draft: &OrderDraft, posted: bool, dated: i64) -> Value {
    let goods: Vec<Value> = draft
        .goods
        .iter()
        .map(|item| {
            serde_json::json!({
                "price": parse_float_prefix(&item.price),
                "quantity": parse_int_prefix(&item.quantity),
                "unit": UNIT_PIECE,
                "discount": parse_float_prefix(&item.discount),
                "sum_discounted": line_discounted(item),
                "nomenclature": parse_int_prefix(&item.nomenclature),
            })
        })
        .collect();

    serde_json::json!({
        "dated": dated,
        "operation": OPERATION_ORDER,
        "tax_included": true,
        "tax_active": true,
        "goods": goods,
        "settings": { "date_next_created": null },
        "warehouse": parse_int_prefix(&draft.warehouse),
        "contragent": parse_int_prefix(&draft.contragent),
        "paybox": parse_int_prefix(&draft.paybox),
        "organization": parse_int_prefix(&draft.organization),
        "status": posted,
        "paid_rubles": draft.total(),
        "paid_lt": 0,
    })
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Submit the draft as a new sales document. `posted` finalizes the
/// transaction remotely; `false` leaves it as a draft document.
///
/// Best-effort by contract: one POST, no retries, and transport failure
/// degrades to [`SubmissionOutcome::Simulated`]. The caller resets the
/// draft after either outcome.
pub async fn submit_order(
    base_url: &str,
    token: &str,
    draft: &OrderDraft,
    posted: bool,
) -> SubmissionOutcome {
    let total = draft.total();
    let document = build_sales_document(draft, posted, Utc::now().timestamp());

    match api::post_sales_document(base_url, token, &document).await {
        Ok(_) => {
            info!(posted, total, "order submitted");
            SubmissionOutcome::Confirmed { posted, total }
        }
        Err(e) => {
            warn!(error = %e, posted, "order submission failed, reporting simulated confirmation");
            SubmissionOutcome::Simulated { posted, total }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
