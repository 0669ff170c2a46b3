//! The operator-facing application flow.
//!
//! Two screens: token entry while unauthenticated, order composition once
//! a token is accepted. [`CashierApp`] is the single logical writer — every
//! mutation happens inside one operator-triggered operation, run to
//! completion, so there is no locking and no transactional discipline.
//! Controls backed by not-yet-fetched reference data simply render empty
//! until the fetch resolves.

use tracing::{info, warn};

use crate::api::{self, DEFAULT_BASE_URL};
use crate::customers;
use crate::order::OrderDraft;
use crate::reference::{self, Customer, ReferenceData};
use crate::session::Session;
use crate::submit::{self, SubmissionOutcome};

/// Environment variable overriding the API base URL.
const BASE_URL_ENV: &str = "TABLECRM_BASE_URL";

/// How many derived customer candidates seed the picker after a
/// reference-data load.
const INITIAL_CANDIDATE_LIMIT: usize = 10;

/// Which of the two screens the operator is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    TokenEntry,
    OrderEntry,
}

/// Top-level application state: session context, derived selector options,
/// customer search results, and the in-progress draft.
#[derive(Debug, Default)]
pub struct CashierApp {
    base_url: String,
    pub session: Session,
    pub options: ReferenceData,
    pub search_results: Vec<Customer>,
    pub draft: OrderDraft,
}

impl CashierApp {
    /// Build against the hosted API, honoring the `TABLECRM_BASE_URL`
    /// override.
    pub fn new() -> Self {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(&base_url)
    }

    /// Build against an explicit API base URL.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    pub fn screen(&self) -> Screen {
        if self.session.is_authenticated() {
            Screen::OrderEntry
        } else {
            Screen::TokenEntry
        }
    }

    /// Application start: re-validate any stored token and, when it still
    /// holds, populate the selectors.
    pub async fn initialize(&mut self) {
        if self.session.initialize(&self.base_url).await {
            self.load_reference_data().await;
        }
    }

    /// Token-entry screen action. On acceptance the order screen unlocks
    /// and the selectors are populated in the same flow.
    pub async fn submit_token(&mut self, token: &str) -> bool {
        if self.session.submit_token(&self.base_url, token).await {
            self.load_reference_data().await;
            true
        } else {
            false
        }
    }

    /// Clear the credential and drop all order-screen state; the next
    /// login starts from a fresh form.
    pub fn logout(&mut self) {
        self.session.logout();
        self.options = ReferenceData::default();
        self.search_results = Vec::new();
        self.draft = OrderDraft::default();
    }

    /// (Re)derive every selector list from the sales-history listing.
    ///
    /// On fetch failure all derived lists reset to empty — no partial
    /// state — and the screen stays usable with empty selectors.
    pub async fn load_reference_data(&mut self) {
        match api::fetch_sales_documents(&self.base_url, self.session.token()).await {
            Ok(docs) => {
                self.options = reference::derive_reference_data(&docs);
                let mut candidates = reference::derive_customer_candidates(&docs);
                candidates.truncate(INITIAL_CANDIDATE_LIMIT);
                self.search_results = candidates;
                info!(
                    organizations = self.options.organizations.len(),
                    warehouses = self.options.warehouses.len(),
                    price_types = self.options.price_types.len(),
                    nomenclatures = self.options.nomenclatures.len(),
                    "reference data derived"
                );
            }
            Err(e) => {
                warn!(error = %e, "reference data load failed, selectors reset");
                self.options = ReferenceData::default();
                self.search_results = Vec::new();
            }
        }
    }

    /// Phone-input action: remember the prefix and refresh the candidate
    /// list when a search path produces an answer. No answer (short
    /// prefix, or search and fallback both down) keeps the current list.
    pub async fn search_customers(&mut self, phone: &str) {
        self.draft.phone = phone.to_string();
        if let Some(results) =
            customers::search_by_phone(&self.base_url, self.session.token(), phone).await
        {
            self.search_results = results;
        }
    }

    /// Current grand total of the draft.
    pub fn total(&self) -> f64 {
        self.draft.total()
    }

    /// Submit the draft (`posted` finalizes it remotely) and start a
    /// fresh empty draft for the next sale, whatever the outcome was.
    pub async fn submit_order(&mut self, posted: bool) -> SubmissionOutcome {
        let outcome =
            submit::submit_order(&self.base_url, self.session.token(), &self.draft, posted).await;
        self.draft = OrderDraft::default();
        outcome
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::LineField;
    use crate::reference::Organization;

    fn unroutable_app() -> CashierApp {
        // Port 9 is not listening locally, so every remote call fails
        // fast with a connection error.
        CashierApp::with_base_url("http://127.0.0.1:9")
    }

    #[test]
    fn starts_on_the_token_entry_screen() {
        let app = unroutable_app();
        assert_eq!(app.screen(), Screen::TokenEntry);
        assert!(app.options.organizations.is_empty());
        assert!(app.draft.goods.is_empty());
    }

    #[tokio::test]
    async fn rejected_token_keeps_the_entry_screen() {
        let mut app = unroutable_app();
        assert!(!app.submit_token("whatever").await);
        assert_eq!(app.screen(), Screen::TokenEntry);
    }

    #[tokio::test]
    async fn failed_reference_load_resets_all_selectors() {
        let mut app = unroutable_app();
        app.options.organizations.push(Organization {
            id: 5,
            name: "Organization 5".into(),
        });
        app.search_results.push(Customer {
            id: 31,
            name: "Ivanov".into(),
            phone: "+79990000000".into(),
        });

        app.load_reference_data().await;
        assert!(app.options.organizations.is_empty());
        assert!(app.options.warehouses.is_empty());
        assert!(app.options.price_types.is_empty());
        assert!(app.options.nomenclatures.is_empty());
        assert!(app.search_results.is_empty());
    }

    #[tokio::test]
    async fn short_phone_search_keeps_prior_results() {
        let mut app = unroutable_app();
        app.search_results.push(Customer {
            id: 31,
            name: "Ivanov".into(),
            phone: "+79990000000".into(),
        });

        app.search_customers("79991234").await;
        assert_eq!(app.draft.phone, "79991234");
        assert_eq!(app.search_results.len(), 1);
        assert_eq!(app.search_results[0].name, "Ivanov");
    }

    #[tokio::test]
    async fn submission_resets_the_draft_even_when_simulated() {
        let mut app = unroutable_app();
        app.draft.contragent = "31".into();
        app.draft.add_line_item();
        app.draft.update_line_item(0, LineField::Price, "100", &[]);
        app.draft.update_line_item(0, LineField::Quantity, "2", &[]);

        let outcome = app.submit_order(false).await;
        assert!(outcome.is_simulated());
        assert_eq!(outcome.total(), 200.0);
        assert_eq!(app.draft, OrderDraft::default());
    }

    #[tokio::test]
    async fn confirmation_carries_the_posted_flag() {
        let mut app = unroutable_app();
        app.draft.add_line_item();
        let outcome = app.submit_order(true).await;
        assert!(outcome.posted());
    }
}
