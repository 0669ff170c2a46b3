//! Order composition: the in-progress draft and its arithmetic.
//!
//! Line-item fields hold the operator's raw input as strings so that
//! half-typed or momentarily invalid values never throw; numbers are
//! coerced only when a total is computed or a document is submitted.
//! Validation beyond the arithmetic below is deliberately absent — the
//! remote service owns business rules.

use serde::Serialize;

use crate::reference::CatalogItem;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One product line of the in-progress order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    /// Selected catalog-item id, as the raw select value.
    pub nomenclature: String,
    pub price: String,
    pub quantity: String,
    pub discount: String,
}

impl Default for LineItem {
    fn default() -> Self {
        Self {
            nomenclature: String::new(),
            price: "0".to_string(),
            quantity: "1".to_string(),
            discount: "0".to_string(),
        }
    }
}

/// The editable field names of a [`LineItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineField {
    Nomenclature,
    Price,
    Quantity,
    Discount,
}

/// The single in-progress order. Selection refs are kept as the raw
/// select values (strings); integer coercion happens at submission time.
///
/// Created empty, mutated by operator actions, and replaced with a fresh
/// empty instance right after a submission attempt. There is no undo
/// history and no persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderDraft {
    /// Phone input driving customer search; not submitted.
    pub phone: String,
    pub contragent: String,
    pub organization: String,
    pub warehouse: String,
    pub paybox: String,
    pub price_type: String,
    pub goods: Vec<LineItem>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

impl OrderDraft {
    /// Append a fresh line item with defaults. There is no upper bound on
    /// the number of lines.
    pub fn add_line_item(&mut self) {
        self.goods.push(LineItem::default());
    }

    /// Replace one field of the line item at `index`; other lines and
    /// fields are untouched. Selecting a catalog item with a non-zero
    /// price also updates the line's price in the same call, so the
    /// operator sees both fields change at once. Out-of-range indices are
    /// ignored.
    pub fn update_line_item(
        &mut self,
        index: usize,
        field: LineField,
        value: &str,
        catalog: &[CatalogItem],
    ) {
        let Some(item) = self.goods.get_mut(index) else {
            return;
        };
        match field {
            LineField::Nomenclature => {
                item.nomenclature = value.to_string();
                let selected = catalog.iter().find(|c| c.id.to_string() == value);
                if let Some(selected) = selected {
                    if selected.price != 0.0 {
                        item.price = selected.price.to_string();
                    }
                }
            }
            LineField::Price => item.price = value.to_string(),
            LineField::Quantity => item.quantity = value.to_string(),
            LineField::Discount => item.discount = value.to_string(),
        }
    }

    /// Delete the line item at `index`; later lines shift down one
    /// position. Out-of-range indices are ignored.
    pub fn remove_line_item(&mut self, index: usize) {
        if index < self.goods.len() {
            self.goods.remove(index);
        }
    }

    /// Grand total over all lines. Exact floating-point arithmetic;
    /// rounding for display is the caller's concern.
    pub fn total(&self) -> f64 {
        self.goods.iter().map(line_discounted).sum()
    }
}

/// Coerce a free-form field to a number: empty or whitespace input counts
/// as zero, anything unparseable becomes NaN and propagates through the
/// arithmetic.
pub fn coerce_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// The discounted value of one line: `price * quantity`, minus
/// `discount` percent of it.
pub fn line_discounted(item: &LineItem) -> f64 {
    let sum = coerce_number(&item.price) * coerce_number(&item.quantity);
    sum - sum * coerce_number(&item.discount) / 100.0
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: &str, quantity: &str, discount: &str) -> LineItem {
        LineItem {
            nomenclature: String::new(),
            price: price.into(),
            quantity: quantity.into(),
            discount: discount.into(),
        }
    }

    fn draft_with(goods: Vec<LineItem>) -> OrderDraft {
        OrderDraft {
            goods,
            ..Default::default()
        }
    }

    #[test]
    fn new_line_items_get_defaults() {
        let mut draft = OrderDraft::default();
        draft.add_line_item();
        assert_eq!(draft.goods.len(), 1);
        assert_eq!(draft.goods[0], line("0", "1", "0"));
        assert_eq!(draft.goods[0].nomenclature, "");
    }

    #[test]
    fn empty_order_totals_zero() {
        assert_eq!(OrderDraft::default().total(), 0.0);
    }

    #[test]
    fn zero_discount_keeps_the_line_total() {
        assert_eq!(line_discounted(&line("50", "1", "0")), 50.0);
    }

    #[test]
    fn full_discount_zeroes_the_line() {
        assert_eq!(line_discounted(&line("100", "2", "100")), 0.0);
    }

    #[test]
    fn grand_total_sums_discounted_lines() {
        // 100*2 with 10% off = 180, plus 50*1 = 230
        let draft = draft_with(vec![line("100", "2", "10"), line("50", "1", "0")]);
        assert_eq!(draft.total(), 230.0);
    }

    #[test]
    fn negative_quantity_and_discount_pass_through() {
        // Rejecting these is not this layer's job.
        assert_eq!(line_discounted(&line("10", "-2", "0")), -20.0);
        assert_eq!(line_discounted(&line("100", "1", "-50")), 150.0);
    }

    #[test]
    fn half_typed_input_does_not_throw() {
        // "" coerces to 0, "12." parses as 12, "" discount as 0.
        let draft = draft_with(vec![line("", "1", "0"), line("12.", "2", "")]);
        assert_eq!(draft.total(), 24.0);
    }

    #[test]
    fn junk_input_poisons_the_total_with_nan() {
        let draft = draft_with(vec![line("abc", "2", "0")]);
        assert!(draft.total().is_nan());
    }

    #[test]
    fn update_replaces_only_the_named_field() {
        let mut draft = draft_with(vec![line("10", "1", "0"), line("20", "2", "5")]);
        draft.update_line_item(0, LineField::Quantity, "3", &[]);
        assert_eq!(draft.goods[0], line("10", "3", "0"));
        assert_eq!(draft.goods[1], line("20", "2", "5"));
    }

    #[test]
    fn update_out_of_range_is_ignored() {
        let mut draft = draft_with(vec![line("10", "1", "0")]);
        draft.update_line_item(5, LineField::Price, "99", &[]);
        assert_eq!(draft.goods[0], line("10", "1", "0"));
    }

    #[test]
    fn selecting_a_catalog_item_pulls_its_price() {
        let catalog = vec![CatalogItem {
            id: 45690,
            name: "Item from order #12".into(),
            price: 150.5,
        }];
        let mut draft = draft_with(vec![LineItem::default()]);
        draft.update_line_item(0, LineField::Nomenclature, "45690", &catalog);
        assert_eq!(draft.goods[0].nomenclature, "45690");
        assert_eq!(draft.goods[0].price, "150.5");
    }

    #[test]
    fn selecting_a_zero_price_item_keeps_the_typed_price() {
        let catalog = vec![CatalogItem {
            id: 45691,
            name: "Item from order #13".into(),
            price: 0.0,
        }];
        let mut draft = draft_with(vec![line("77", "1", "0")]);
        draft.update_line_item(0, LineField::Nomenclature, "45691", &catalog);
        assert_eq!(draft.goods[0].nomenclature, "45691");
        assert_eq!(draft.goods[0].price, "77");
    }

    #[test]
    fn removal_shifts_later_lines_down() {
        let mut draft = draft_with(vec![
            line("1", "1", "0"),
            line("2", "1", "0"),
            line("3", "1", "0"),
        ]);
        draft.remove_line_item(1);
        assert_eq!(draft.goods.len(), 2);
        assert_eq!(draft.goods[0].price, "1");
        assert_eq!(draft.goods[1].price, "3");

        // Removing past the end is a no-op.
        draft.remove_line_item(9);
        assert_eq!(draft.goods.len(), 2);
    }
}
