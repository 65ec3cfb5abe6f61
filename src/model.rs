use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calc;
use crate::currency::{CurrencyCatalog, CurrencyRecord};
use crate::store::{DefaultsRecord, TemplateRecord};

/// Line item identity. Unique within a session and never reassigned on
/// edit, so a row keeps its identity across re-renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: ItemId,
    pub description: String,
    pub quantity: f64,
    pub rate: f64,
    pub amount: f64,
}

impl LineItem {
    fn new(id: ItemId) -> Self {
        LineItem {
            id,
            description: String::new(),
            quantity: 1.0,
            rate: 0.0,
            amount: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxType {
    #[default]
    Percentage,
    Fixed,
}

impl TaxType {
    pub fn toggled(self) -> TaxType {
        match self {
            TaxType::Percentage => TaxType::Fixed,
            TaxType::Fixed => TaxType::Percentage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Edit to a single line item. The variant carries the new value, so the
/// full set of possible edits is spelled out here and checked by the
/// compiler.
#[derive(Debug, Clone)]
pub enum ItemField {
    Description(String),
    Quantity(f64),
    Rate(f64),
}

/// Edit to an invoice-level field.
#[derive(Debug, Clone)]
pub enum InvoiceField {
    Number(String),
    Date(NaiveDate),
    PaymentTerms(String),
    DueDate(Option<NaiveDate>),
    PoNumber(String),
    From(String),
    BillTo(String),
    ShipTo(String),
    Notes(String),
    Terms(String),
    Discount(f64),
    Tax(f64),
    TaxKind(TaxType),
    Shipping(f64),
    AmountPaid(f64),
    Theme(Theme),
    Logo(Option<String>),
}

impl InvoiceField {
    /// Which edits touch the derived totals.
    fn affects_totals(&self) -> bool {
        matches!(
            self,
            InvoiceField::Discount(_)
                | InvoiceField::Tax(_)
                | InvoiceField::TaxKind(_)
                | InvoiceField::Shipping(_)
                | InvoiceField::AmountPaid(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveItem {
    Removed,
    /// Refused: an invoice keeps at least one line item.
    LastItem,
    NotFound,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub number: String,
    pub date: NaiveDate,
    pub payment_terms: String,
    pub due_date: Option<NaiveDate>,
    pub po_number: String,
    pub from: String,
    pub bill_to: String,
    pub ship_to: String,
    pub items: Vec<LineItem>,
    pub notes: String,
    pub terms: String,
    pub subtotal: f64,
    pub discount: f64,
    pub tax: f64,
    pub tax_type: TaxType,
    pub shipping: f64,
    pub total: f64,
    pub amount_paid: f64,
    pub balance_due: f64,
    pub currency: String,
    pub theme: Theme,
    pub logo: Option<String>,
    #[serde(skip)]
    next_id: u64,
}

impl Invoice {
    /// Fresh draft: one default line item, today's date, USD.
    pub fn new() -> Self {
        let mut invoice = Invoice {
            number: "1".to_string(),
            date: Local::now().date_naive(),
            payment_terms: String::new(),
            due_date: None,
            po_number: String::new(),
            from: String::new(),
            bill_to: String::new(),
            ship_to: String::new(),
            items: Vec::new(),
            notes: String::new(),
            terms: String::new(),
            subtotal: 0.0,
            discount: 0.0,
            tax: 0.0,
            tax_type: TaxType::default(),
            shipping: 0.0,
            total: 0.0,
            amount_paid: 0.0,
            balance_due: 0.0,
            currency: "USD".to_string(),
            theme: Theme::default(),
            logo: None,
            next_id: 1,
        };
        invoice.add_item();
        invoice
    }

    /// Append a line item with default values. Existing items keep their
    /// ids and order.
    pub fn add_item(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.items.push(LineItem::new(id));
        self.recalculate();
        id
    }

    /// Apply one edit to the item with the given id. Unknown ids are a
    /// silent no-op. Quantity and rate edits recompute the item amount.
    pub fn update_item(&mut self, id: ItemId, field: ItemField) {
        let Some(item) = self.items.iter_mut().find(|i| i.id == id) else {
            return;
        };
        match field {
            ItemField::Description(description) => item.description = description,
            ItemField::Quantity(quantity) => item.quantity = quantity,
            ItemField::Rate(rate) => item.rate = rate,
        }
        item.amount = calc::item_amount(item.quantity, item.rate);
        self.recalculate();
    }

    /// Remove the item with the given id. The last remaining item can
    /// never be removed.
    pub fn remove_item(&mut self, id: ItemId) -> RemoveItem {
        if !self.items.iter().any(|i| i.id == id) {
            return RemoveItem::NotFound;
        }
        if self.items.len() == 1 {
            return RemoveItem::LastItem;
        }
        self.items.retain(|i| i.id != id);
        self.recalculate();
        RemoveItem::Removed
    }

    /// Apply one invoice-level edit, recomputing totals when the field
    /// contributes to them.
    pub fn apply(&mut self, field: InvoiceField) {
        let recalc = field.affects_totals();
        match field {
            InvoiceField::Number(number) => self.number = number,
            InvoiceField::Date(date) => self.date = date,
            InvoiceField::PaymentTerms(payment_terms) => self.payment_terms = payment_terms,
            InvoiceField::DueDate(due_date) => self.due_date = due_date,
            InvoiceField::PoNumber(po_number) => self.po_number = po_number,
            InvoiceField::From(from) => self.from = from,
            InvoiceField::BillTo(bill_to) => self.bill_to = bill_to,
            InvoiceField::ShipTo(ship_to) => self.ship_to = ship_to,
            InvoiceField::Notes(notes) => self.notes = notes,
            InvoiceField::Terms(terms) => self.terms = terms,
            InvoiceField::Discount(discount) => self.discount = discount,
            InvoiceField::Tax(tax) => self.tax = tax,
            InvoiceField::TaxKind(tax_type) => self.tax_type = tax_type,
            InvoiceField::Shipping(shipping) => self.shipping = shipping,
            InvoiceField::AmountPaid(amount_paid) => self.amount_paid = amount_paid,
            InvoiceField::Theme(theme) => self.theme = theme,
            InvoiceField::Logo(logo) => self.logo = logo,
        }
        if recalc {
            self.recalculate();
        }
    }

    /// Recompute every derived field in one step. Subtotal, total and
    /// balance due always change together.
    pub fn recalculate(&mut self) {
        let totals = calc::totals(self);
        self.subtotal = totals.subtotal;
        self.total = totals.total;
        self.balance_due = totals.balance_due;
    }

    /// Repair a deserialized snapshot: reseed the id counter past every
    /// persisted id and restore the at-least-one-item invariant.
    pub fn normalize(&mut self) {
        self.next_id = self.items.iter().map(|i| i.id.0).max().unwrap_or(0) + 1;
        if self.items.is_empty() {
            self.add_item();
        }
        self.recalculate();
    }

    fn apply_defaults(&mut self, defaults: &DefaultsRecord) {
        if let Some(currency) = &defaults.currency {
            self.currency = currency.clone();
        }
        if let Some(theme) = defaults.theme {
            self.theme = theme;
        }
    }

    fn apply_template(&mut self, template: &TemplateRecord) {
        if let Some(from) = &template.from {
            self.from = from.clone();
        }
        if let Some(payment_terms) = &template.payment_terms {
            self.payment_terms = payment_terms.clone();
        }
        if let Some(notes) = &template.notes {
            self.notes = notes.clone();
        }
        if let Some(terms) = &template.terms {
            self.terms = terms.clone();
        }
        if let Some(tax) = template.tax {
            self.apply(InvoiceField::Tax(tax));
        }
    }
}

/// All mutable state for one run: the live draft and the active display
/// currency. Owned by main and passed down explicitly; wizard code never
/// reaches for globals.
pub struct Session {
    pub invoice: Invoice,
    pub currency: CurrencyRecord,
}

impl Session {
    /// Fresh draft with the saved preferences and boilerplate applied.
    pub fn start(
        catalog: &CurrencyCatalog,
        defaults: &DefaultsRecord,
        template: &TemplateRecord,
    ) -> Self {
        let mut invoice = Invoice::new();
        invoice.apply_defaults(defaults);
        invoice.apply_template(template);
        let currency = catalog.resolve(&invoice.currency).clone();
        invoice.currency = currency.code.clone();
        Session { invoice, currency }
    }

    /// Continue from a saved snapshot.
    pub fn resume(catalog: &CurrencyCatalog, mut invoice: Invoice) -> Self {
        invoice.normalize();
        let currency = catalog.resolve(&invoice.currency).clone();
        Session { invoice, currency }
    }

    /// Switch the active currency. Cosmetic only: the displayed symbol
    /// changes, no amount is ever converted. Unknown codes fall back to
    /// the catalog default.
    pub fn select_currency(&mut self, catalog: &CurrencyCatalog, code: &str) {
        let record = catalog.resolve(code);
        self.currency = record.clone();
        self.invoice.currency = record.code.clone();
    }

    pub fn fmt(&self, amount: f64) -> String {
        calc::format_money(&self.currency.symbol, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc;

    fn invoice_with_items(items: &[(f64, f64)]) -> Invoice {
        let mut invoice = Invoice::new();
        let first = invoice.items[0].id;
        for (row, (quantity, rate)) in items.iter().enumerate() {
            let id = if row == 0 { first } else { invoice.add_item() };
            invoice.update_item(id, ItemField::Quantity(*quantity));
            invoice.update_item(id, ItemField::Rate(*rate));
        }
        invoice
    }

    #[test]
    fn new_invoice_starts_with_one_default_item() {
        let invoice = Invoice::new();
        assert_eq!(invoice.number, "1");
        assert_eq!(invoice.items.len(), 1);
        let item = &invoice.items[0];
        assert_eq!(item.quantity, 1.0);
        assert_eq!(item.rate, 0.0);
        assert_eq!(item.amount, 0.0);
    }

    #[test]
    fn item_ids_are_unique_and_stable_across_edits() {
        let mut invoice = Invoice::new();
        let second = invoice.add_item();
        let third = invoice.add_item();
        let ids: Vec<ItemId> = invoice.items.iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|pair| pair[0] != pair[1]));

        invoice.update_item(second, ItemField::Rate(12.5));
        invoice.update_item(third, ItemField::Description("consulting".into()));
        let after: Vec<ItemId> = invoice.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, after);
    }

    #[test]
    fn updating_quantity_recomputes_amount_and_totals() {
        let mut invoice = Invoice::new();
        let id = invoice.items[0].id;
        invoice.update_item(id, ItemField::Rate(50.0));
        invoice.update_item(id, ItemField::Quantity(3.0));
        assert_eq!(invoice.items[0].amount, 150.0);
        assert_eq!(invoice.subtotal, 150.0);
        assert_eq!(invoice.total, 150.0);
        assert_eq!(invoice.balance_due, 150.0);
    }

    #[test]
    fn updating_unknown_item_is_a_noop() {
        let mut invoice = invoice_with_items(&[(2.0, 50.0)]);
        let before = invoice.clone();
        invoice.update_item(ItemId(999), ItemField::Rate(1_000_000.0));
        assert_eq!(invoice, before);
    }

    #[test]
    fn deleting_the_last_item_is_refused() {
        let mut invoice = Invoice::new();
        let id = invoice.items[0].id;
        assert_eq!(invoice.remove_item(id), RemoveItem::LastItem);
        assert_eq!(invoice.items.len(), 1);
    }

    #[test]
    fn deleting_unknown_item_reports_not_found() {
        let mut invoice = Invoice::new();
        invoice.add_item();
        assert_eq!(invoice.remove_item(ItemId(999)), RemoveItem::NotFound);
        assert_eq!(invoice.items.len(), 2);
    }

    #[test]
    fn add_then_delete_restores_prior_subtotal() {
        let mut invoice = invoice_with_items(&[(2.0, 50.0), (1.0, 30.0)]);
        assert_eq!(invoice.subtotal, 130.0);

        let extra = invoice.add_item();
        invoice.update_item(extra, ItemField::Quantity(3.0));
        invoice.update_item(extra, ItemField::Rate(9.99));
        assert!(invoice.subtotal > 130.0);

        assert_eq!(invoice.remove_item(extra), RemoveItem::Removed);
        assert_eq!(invoice.subtotal, 130.0);
    }

    #[test]
    fn text_edits_leave_totals_untouched() {
        let mut invoice = invoice_with_items(&[(2.0, 50.0)]);
        let before = calc::totals(&invoice);
        invoice.apply(InvoiceField::Number("INV-7".into()));
        invoice.apply(InvoiceField::BillTo("Acme Corp\n1 Main St".into()));
        invoice.apply(InvoiceField::Notes("thanks!".into()));
        assert_eq!(calc::totals(&invoice), before);
    }

    #[test]
    fn charge_edits_recompute_all_derived_fields_together() {
        let mut invoice = invoice_with_items(&[(2.0, 50.0), (1.0, 30.0)]);
        invoice.apply(InvoiceField::Discount(10.0));
        invoice.apply(InvoiceField::Tax(10.0));
        invoice.apply(InvoiceField::Shipping(5.0));
        invoice.apply(InvoiceField::AmountPaid(100.0));
        assert_eq!(invoice.subtotal, 130.0);
        assert_eq!(invoice.total, 137.0);
        assert_eq!(invoice.balance_due, 37.0);

        invoice.apply(InvoiceField::TaxKind(TaxType::Fixed));
        invoice.apply(InvoiceField::Tax(15.0));
        assert_eq!(invoice.total, 140.0);
        assert_eq!(invoice.balance_due, 40.0);
    }

    #[test]
    fn normalize_restores_invariants() {
        let mut invoice = invoice_with_items(&[(2.0, 50.0)]);
        invoice.items.clear();
        invoice.normalize();
        assert_eq!(invoice.items.len(), 1);

        let mut reloaded: Invoice =
            serde_json::from_str(&serde_json::to_string(&invoice).unwrap()).unwrap();
        reloaded.normalize();
        let fresh = reloaded.add_item();
        assert!(reloaded.items.iter().filter(|i| i.id == fresh).count() == 1);
        assert!(fresh > invoice.items[0].id);
    }

    #[test]
    fn snapshots_serialize_with_the_original_field_names() {
        let invoice = invoice_with_items(&[(2.0, 50.0)]);
        let json = serde_json::to_string(&invoice).unwrap();
        assert!(json.contains("\"billTo\""));
        assert!(json.contains("\"paymentTerms\""));
        assert!(json.contains("\"taxType\":\"percentage\""));
        assert!(json.contains("\"balanceDue\""));
    }

    #[test]
    fn currency_switch_is_cosmetic_only() {
        let catalog = CurrencyCatalog::fallback();
        let mut session = Session::start(
            &catalog,
            &DefaultsRecord::default(),
            &TemplateRecord::default(),
        );
        let id = session.invoice.items[0].id;
        session.invoice.update_item(id, ItemField::Quantity(2.0));
        session.invoice.update_item(id, ItemField::Rate(50.0));

        let before = calc::totals(&session.invoice);
        session.select_currency(&catalog, "EUR");
        assert_eq!(session.invoice.currency, "EUR");
        assert_eq!(session.currency.symbol, "€");
        assert_eq!(calc::totals(&session.invoice), before);
        assert_eq!(session.fmt(before.total), "€100.00");
    }

    #[test]
    fn unknown_currency_falls_back_to_usd() {
        let catalog = CurrencyCatalog::fallback();
        let mut session = Session::start(
            &catalog,
            &DefaultsRecord::default(),
            &TemplateRecord::default(),
        );
        session.select_currency(&catalog, "XXX");
        assert_eq!(session.invoice.currency, "USD");
    }

    #[test]
    fn startup_records_prefill_the_draft() {
        let catalog = CurrencyCatalog::fallback();
        let defaults = DefaultsRecord {
            currency: Some("GBP".into()),
            theme: Some(Theme::Dark),
        };
        let template = TemplateRecord {
            from: Some("Studio Nine\n9 Rain St".into()),
            payment_terms: Some("Net 30".into()),
            notes: None,
            terms: Some("Payable within 30 days.".into()),
            tax: Some(8.875),
        };
        let session = Session::start(&catalog, &defaults, &template);
        assert_eq!(session.currency.code, "GBP");
        assert_eq!(session.invoice.theme, Theme::Dark);
        assert_eq!(session.invoice.from, "Studio Nine\n9 Rain St");
        assert_eq!(session.invoice.payment_terms, "Net 30");
        assert_eq!(session.invoice.tax, 8.875);
        assert_eq!(session.invoice.notes, "");
    }
}
