use crate::model::{Invoice, TaxType};

/// Derived money fields. Always produced together so no display can mix
/// values from two different recomputations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub subtotal_after_discount: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub balance_due: f64,
}

/// A numeric input that is not a finite number counts as 0.
fn numeric(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

pub fn item_amount(quantity: f64, rate: f64) -> f64 {
    numeric(quantity) * numeric(rate)
}

/// Compute every derived field from the current invoice state.
///
/// Discount is a flat amount and may push the discounted subtotal
/// negative; balance due may also go negative to signal overpayment.
/// Neither is clamped.
pub fn totals(invoice: &Invoice) -> Totals {
    let subtotal: f64 = invoice
        .items
        .iter()
        .map(|item| item_amount(item.quantity, item.rate))
        .sum();
    let subtotal_after_discount = subtotal - numeric(invoice.discount);
    let tax = numeric(invoice.tax);
    let tax_amount = match invoice.tax_type {
        TaxType::Percentage => subtotal_after_discount * tax / 100.0,
        TaxType::Fixed => tax,
    };
    let total = subtotal_after_discount + tax_amount + numeric(invoice.shipping);
    let balance_due = total - numeric(invoice.amount_paid);
    Totals {
        subtotal,
        subtotal_after_discount,
        tax_amount,
        total,
        balance_due,
    }
}

/// Lenient numeric entry: anything unparseable is 0, never an error.
pub fn parse_amount(input: &str) -> f64 {
    numeric(input.trim().parse().unwrap_or(0.0))
}

/// The one place money becomes text: absolute value, two decimals, the
/// active currency symbol in front. The sign is not shown; callers that
/// need it handle it themselves.
pub fn format_money(symbol: &str, amount: f64) -> String {
    format!("{}{:.2}", symbol, amount.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InvoiceField, ItemField};

    fn scenario_invoice() -> Invoice {
        // items 2 × 50 and 1 × 30, discount 10, tax 10%, shipping 5, paid 100
        let mut invoice = Invoice::new();
        let first = invoice.items[0].id;
        invoice.update_item(first, ItemField::Quantity(2.0));
        invoice.update_item(first, ItemField::Rate(50.0));
        let second = invoice.add_item();
        invoice.update_item(second, ItemField::Quantity(1.0));
        invoice.update_item(second, ItemField::Rate(30.0));
        invoice.apply(InvoiceField::Discount(10.0));
        invoice.apply(InvoiceField::Tax(10.0));
        invoice.apply(InvoiceField::Shipping(5.0));
        invoice.apply(InvoiceField::AmountPaid(100.0));
        invoice
    }

    #[test]
    fn percentage_tax_scenario() {
        let totals = totals(&scenario_invoice());
        assert_eq!(totals.subtotal, 130.0);
        assert_eq!(totals.subtotal_after_discount, 120.0);
        assert_eq!(totals.tax_amount, 12.0);
        assert_eq!(totals.total, 137.0);
        assert_eq!(totals.balance_due, 37.0);
    }

    #[test]
    fn fixed_tax_scenario() {
        let mut invoice = scenario_invoice();
        invoice.apply(InvoiceField::TaxKind(TaxType::Fixed));
        invoice.apply(InvoiceField::Tax(15.0));
        let totals = totals(&invoice);
        assert_eq!(totals.subtotal_after_discount, 120.0);
        assert_eq!(totals.tax_amount, 15.0);
        assert_eq!(totals.total, 140.0);
        assert_eq!(totals.balance_due, 40.0);
    }

    #[test]
    fn overpayment_yields_negative_balance() {
        let mut invoice = scenario_invoice();
        invoice.apply(InvoiceField::AmountPaid(200.0));
        assert_eq!(totals(&invoice).balance_due, -63.0);
    }

    #[test]
    fn discount_beyond_subtotal_is_not_clamped() {
        let mut invoice = scenario_invoice();
        invoice.apply(InvoiceField::Tax(0.0));
        invoice.apply(InvoiceField::Shipping(0.0));
        invoice.apply(InvoiceField::Discount(1000.0));
        let totals = totals(&invoice);
        assert_eq!(totals.subtotal_after_discount, -870.0);
        assert_eq!(totals.total, -870.0);
    }

    #[test]
    fn non_finite_inputs_count_as_zero() {
        let mut invoice = Invoice::new();
        let id = invoice.items[0].id;
        invoice.update_item(id, ItemField::Quantity(f64::NAN));
        invoice.update_item(id, ItemField::Rate(f64::INFINITY));
        let extra = invoice.add_item();
        invoice.update_item(extra, ItemField::Quantity(2.0));
        invoice.update_item(extra, ItemField::Rate(30.0));
        invoice.apply(InvoiceField::Discount(f64::NAN));
        assert_eq!(totals(&invoice).subtotal, 60.0);
        assert_eq!(totals(&invoice).total, 60.0);
    }

    #[test]
    fn parse_amount_is_lenient() {
        assert_eq!(parse_amount("42.5"), 42.5);
        assert_eq!(parse_amount("  1e3 "), 1000.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("12,50"), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
    }

    #[test]
    fn format_money_shows_absolute_value_with_two_decimals() {
        assert_eq!(format_money("US$", 137.0), "US$137.00");
        assert_eq!(format_money("€", -37.5), "€37.50");
        assert_eq!(format_money("£", 129.999), "£130.00");
        assert_eq!(format_money("£", 0.0), "£0.00");
    }
}
