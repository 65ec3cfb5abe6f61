mod calc;
mod currency;
mod export;
mod history;
mod model;
mod store;

use clap::{Parser, Subcommand};
use comfy_table::{Attribute, Cell, Color, Table};
use directories::{BaseDirs, ProjectDirs};
use inquire::{Confirm, DateSelect, Select, Text};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::calc::parse_amount;
use crate::currency::CurrencyCatalog;
use crate::history::HistoryStore;
use crate::model::{InvoiceField, ItemField, ItemId, RemoveItem, Session, TaxType};
use crate::store::{JsonFileStorage, Storage, TemplateRecord};

// ==========================================
// Constants
// ==========================================

const PAID_GREEN: Color = Color::Rgb { r: 4, g: 120, b: 87 };
const DUE_RED: Color = Color::Rgb { r: 185, g: 28, b: 28 };

const ACT_DETAILS: &str = "📋 Invoice details";
const ACT_ADD_ITEM: &str = "➕ Add line item";
const ACT_EDIT_ITEM: &str = "✏️ Edit line item";
const ACT_DELETE_ITEM: &str = "🗑 Delete line item";
const ACT_ADJUST: &str = "🧮 Discount / tax / shipping / payment";
const ACT_CURRENCY: &str = "💱 Currency";
const ACT_THEME: &str = "🌓 Toggle theme";
const ACT_LOGO: &str = "🖼 Attach logo";
const ACT_NOTES: &str = "📝 Notes & terms";
const ACT_SAVE: &str = "💾 Save to history";
const ACT_EXPORT: &str = "🖨 Save & export";
const ACT_DISCARD: &str = "❌ Discard";

// ==========================================
// Structs & Enums
// ==========================================

#[derive(Debug, Serialize, Deserialize)]
struct AppSettings {
    data_root: String,
}

#[derive(Parser)]
#[command(name = "invoice-draft")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Draft a new invoice
    New,
    /// Reopen a saved invoice from history
    Edit {
        /// Position in the history list (1 = newest)
        index: usize,
    },
    /// List saved invoices
    History,
    /// Print a saved invoice
    Show { index: usize },
    /// Delete a saved invoice
    Delete { index: usize },
    /// Re-export a saved invoice
    Export { index: usize },
    /// List supported currencies
    Currencies,
    /// Save reusable invoice boilerplate
    Template,
    /// Configure data directory
    Config,
}

// ==========================================
// Main Function
// ==========================================

fn main() {
    let cli = Cli::parse();

    let settings = load_settings().unwrap_or_else(setup_config_wizard);
    let root = PathBuf::from(expand_home_dir(&settings.data_root));
    if let Err(e) = fs::create_dir_all(root.join("data")) {
        eprintln!("❌ Error: Failed to create data directory: {}", e);
        return;
    }

    let catalog = CurrencyCatalog::load(&root);
    let mut storage = JsonFileStorage::new(root.join("data"));

    if cli.command.is_none() {
        use clap::CommandFactory;
        Cli::command().print_help().unwrap();
        return;
    }

    match cli.command.unwrap() {
        Commands::New => {
            let defaults = store::load_defaults(&storage);
            let template = store::load_template(&storage);
            let mut session = Session::start(&catalog, &defaults, &template);
            let mut history = HistoryStore::load(&storage);
            draft_wizard(&mut session, &mut history, &mut storage, &catalog, &root);
        }
        Commands::Edit { index } => {
            let mut history = HistoryStore::load(&storage);
            let invoice = to_position(index)
                .and_then(|i| history.load_snapshot(i))
                .map(|entry| entry.invoice.clone());
            match invoice {
                Some(invoice) => {
                    let mut session = Session::resume(&catalog, invoice);
                    draft_wizard(&mut session, &mut history, &mut storage, &catalog, &root);
                }
                None => println!("❌ No saved invoice at position {}.", index),
            }
        }
        Commands::History => {
            let history = HistoryStore::load(&storage);
            print_history(&history, &catalog);
        }
        Commands::Show { index } => {
            let history = HistoryStore::load(&storage);
            match to_position(index).and_then(|i| history.load_snapshot(i)) {
                Some(entry) => {
                    let session = Session::resume(&catalog, entry.invoice.clone());
                    print_invoice(&session);
                }
                None => println!("❌ No saved invoice at position {}.", index),
            }
        }
        Commands::Delete { index } => {
            delete_snapshot_wizard(&mut storage, index);
        }
        Commands::Export { index } => {
            let history = HistoryStore::load(&storage);
            match to_position(index).and_then(|i| history.load_snapshot(i)) {
                Some(entry) => {
                    let currency = catalog.resolve(&entry.invoice.currency);
                    export::export_invoice(&root, &entry.invoice, currency);
                }
                None => println!("❌ No saved invoice at position {}.", index),
            }
        }
        Commands::Currencies => print_currencies(&catalog),
        Commands::Template => template_wizard(&mut storage),
        Commands::Config => {
            setup_config_wizard();
        }
    }
}

// History positions are shown 1-based, newest first
fn to_position(index: usize) -> Option<usize> {
    index.checked_sub(1)
}

// ==========================================
// 1. Draft Wizard
// ==========================================

fn draft_wizard(
    session: &mut Session,
    history: &mut HistoryStore,
    storage: &mut dyn Storage,
    catalog: &CurrencyCatalog,
    root: &Path,
) {
    println!("\n--- Invoice Draft ---");
    println!("💡 Tip: Use '\\n' for new lines in address, notes and terms fields.");

    loop {
        print_invoice(session);

        let actions = vec![
            ACT_DETAILS.to_string(),
            ACT_ADD_ITEM.to_string(),
            ACT_EDIT_ITEM.to_string(),
            ACT_DELETE_ITEM.to_string(),
            ACT_ADJUST.to_string(),
            ACT_CURRENCY.to_string(),
            ACT_THEME.to_string(),
            ACT_LOGO.to_string(),
            ACT_NOTES.to_string(),
            ACT_SAVE.to_string(),
            ACT_EXPORT.to_string(),
            ACT_DISCARD.to_string(),
        ];
        let choice = match Select::new("Action:", actions).with_page_size(12).prompt() {
            Ok(choice) => choice,
            Err(_) => return,
        };

        match choice.as_str() {
            ACT_DETAILS => details_wizard(session),
            ACT_ADD_ITEM => add_item_wizard(session),
            ACT_EDIT_ITEM => edit_item_wizard(session),
            ACT_DELETE_ITEM => delete_item_wizard(session),
            ACT_ADJUST => adjustments_wizard(session),
            ACT_CURRENCY => currency_wizard(session, catalog, storage),
            ACT_THEME => toggle_theme(session, storage),
            ACT_LOGO => logo_wizard(session),
            ACT_NOTES => notes_wizard(session),
            ACT_SAVE => {
                save_draft(session, history, storage);
                return;
            }
            ACT_EXPORT => {
                save_draft(session, history, storage);
                export::export_invoice(root, &session.invoice, &session.currency);
                return;
            }
            ACT_DISCARD => {
                let confirmed = Confirm::new("Discard this draft? Unsaved changes will be lost.")
                    .with_default(false)
                    .prompt()
                    .unwrap_or(false);
                if confirmed {
                    return;
                }
            }
            _ => {}
        }
    }
}

fn details_wizard(session: &mut Session) {
    let current = session.invoice.clone();

    let Ok(number) = Text::new("Invoice #:").with_default(&current.number).prompt() else {
        return;
    };
    session.invoice.apply(InvoiceField::Number(number));

    let Ok(date) = DateSelect::new("Invoice Date:").with_default(current.date).prompt() else {
        return;
    };
    session.invoice.apply(InvoiceField::Date(date));

    let Ok(payment_terms) = Text::new("Payment Terms:")
        .with_default(&current.payment_terms)
        .prompt()
    else {
        return;
    };
    session
        .invoice
        .apply(InvoiceField::PaymentTerms(payment_terms));

    let Ok(set_due) = Confirm::new("Set a due date?")
        .with_default(current.due_date.is_some())
        .prompt()
    else {
        return;
    };
    if set_due {
        let Ok(due) = DateSelect::new("Due Date:")
            .with_default(current.due_date.unwrap_or(date))
            .prompt()
        else {
            return;
        };
        session.invoice.apply(InvoiceField::DueDate(Some(due)));
    } else {
        session.invoice.apply(InvoiceField::DueDate(None));
    }

    let Ok(po_number) = Text::new("PO Number:").with_default(&current.po_number).prompt() else {
        return;
    };
    session.invoice.apply(InvoiceField::PoNumber(po_number));

    let Ok(from) = Text::new("From (your address):")
        .with_default(&escape_newlines(&current.from))
        .prompt()
    else {
        return;
    };
    session
        .invoice
        .apply(InvoiceField::From(unescape_newlines(&from)));

    let Ok(bill_to) = Text::new("Bill To:")
        .with_default(&escape_newlines(&current.bill_to))
        .prompt()
    else {
        return;
    };
    session
        .invoice
        .apply(InvoiceField::BillTo(unescape_newlines(&bill_to)));

    let Ok(ship_to) = Text::new("Ship To:")
        .with_default(&escape_newlines(&current.ship_to))
        .prompt()
    else {
        return;
    };
    session
        .invoice
        .apply(InvoiceField::ShipTo(unescape_newlines(&ship_to)));
}

// ==========================================
// 2. Line Item Wizards
// ==========================================

fn add_item_wizard(session: &mut Session) {
    let id = session.invoice.add_item();

    let Ok(description) = Text::new("Description:").prompt() else {
        return;
    };
    session
        .invoice
        .update_item(id, ItemField::Description(description));

    let Ok(quantity) = Text::new("Quantity:").with_default("1").prompt() else {
        return;
    };
    session
        .invoice
        .update_item(id, ItemField::Quantity(parse_amount(&quantity)));

    let rate_prompt = format!("Rate ({}):", session.currency.symbol);
    let Ok(rate) = Text::new(&rate_prompt).with_default("0").prompt() else {
        return;
    };
    session
        .invoice
        .update_item(id, ItemField::Rate(parse_amount(&rate)));
}

fn pick_item(session: &Session, prompt: &str) -> Option<ItemId> {
    let options: Vec<String> = session
        .invoice
        .items
        .iter()
        .enumerate()
        .map(|(row, item)| {
            let label = if item.description.trim().is_empty() {
                "(no description)"
            } else {
                item.description.trim()
            };
            format!(
                "{} | {} | {} × {}",
                row + 1,
                label,
                item.quantity,
                session.fmt(item.rate)
            )
        })
        .collect();

    let choice = Select::new(prompt, options).with_page_size(10).prompt().ok()?;
    // row number sits before the first separator, safe whatever the description holds
    let row: usize = choice.split(" | ").next()?.parse().ok()?;
    Some(session.invoice.items.get(row - 1)?.id)
}

fn edit_item_wizard(session: &mut Session) {
    let Some(id) = pick_item(session, "Edit which item?") else {
        return;
    };
    let Some(item) = session.invoice.items.iter().find(|i| i.id == id) else {
        return;
    };
    let (description, quantity, rate) = (item.description.clone(), item.quantity, item.rate);

    let Ok(new_description) = Text::new("Description:").with_default(&description).prompt() else {
        return;
    };
    session
        .invoice
        .update_item(id, ItemField::Description(new_description));

    let Ok(new_quantity) = Text::new("Quantity:")
        .with_default(&quantity.to_string())
        .prompt()
    else {
        return;
    };
    session
        .invoice
        .update_item(id, ItemField::Quantity(parse_amount(&new_quantity)));

    let rate_prompt = format!("Rate ({}):", session.currency.symbol);
    let Ok(new_rate) = Text::new(&rate_prompt).with_default(&rate.to_string()).prompt() else {
        return;
    };
    session
        .invoice
        .update_item(id, ItemField::Rate(parse_amount(&new_rate)));
}

fn delete_item_wizard(session: &mut Session) {
    let Some(id) = pick_item(session, "Delete which item?") else {
        return;
    };
    match session.invoice.remove_item(id) {
        RemoveItem::Removed => println!("✅ Item removed."),
        RemoveItem::LastItem => println!("⚠️  Cannot delete the last line item."),
        RemoveItem::NotFound => {}
    }
}

// ==========================================
// 3. Adjustments, Currency, Theme, Logo
// ==========================================

fn adjustments_wizard(session: &mut Session) {
    let invoice = &session.invoice;
    let tax_mode = match invoice.tax_type {
        TaxType::Percentage => "%",
        TaxType::Fixed => "flat",
    };
    let options = vec![
        format!("Discount (now {})", session.fmt(invoice.discount)),
        format!("Tax (now {} {})", invoice.tax, tax_mode),
        "Switch tax between % and flat".to_string(),
        format!("Shipping (now {})", session.fmt(invoice.shipping)),
        format!("Amount Paid (now {})", session.fmt(invoice.amount_paid)),
    ];

    let Ok(choice) = Select::new("Adjust:", options.clone()).prompt() else {
        return;
    };
    let picked = options.iter().position(|o| *o == choice).unwrap_or(0);

    match picked {
        0 => {
            if let Some(value) = prompt_amount("Discount amount:", session.invoice.discount) {
                session.invoice.apply(InvoiceField::Discount(value));
            }
        }
        1 => {
            let prompt = match session.invoice.tax_type {
                TaxType::Percentage => "Tax rate (%):",
                TaxType::Fixed => "Tax amount (flat):",
            };
            if let Some(value) = prompt_amount(prompt, session.invoice.tax) {
                session.invoice.apply(InvoiceField::Tax(value));
            }
        }
        2 => {
            let toggled = session.invoice.tax_type.toggled();
            session.invoice.apply(InvoiceField::TaxKind(toggled));
            match toggled {
                TaxType::Percentage => println!("✅ Tax is now a percentage of the subtotal."),
                TaxType::Fixed => println!("✅ Tax is now a flat amount."),
            }
        }
        3 => {
            if let Some(value) = prompt_amount("Shipping amount:", session.invoice.shipping) {
                session.invoice.apply(InvoiceField::Shipping(value));
            }
        }
        4 => {
            if let Some(value) = prompt_amount("Amount paid:", session.invoice.amount_paid) {
                session.invoice.apply(InvoiceField::AmountPaid(value));
            }
        }
        _ => {}
    }
}

fn prompt_amount(prompt: &str, current: f64) -> Option<f64> {
    let text = Text::new(prompt)
        .with_default(&current.to_string())
        .prompt()
        .ok()?;
    Some(parse_amount(&text))
}

fn currency_wizard(session: &mut Session, catalog: &CurrencyCatalog, storage: &mut dyn Storage) {
    let options: Vec<String> = catalog
        .records()
        .iter()
        .map(|r| format!("{} | {} ({})", r.code, r.name, r.symbol))
        .collect();

    let Ok(choice) = Select::new("Currency (Type to Filter):", options)
        .with_page_size(10)
        .prompt()
    else {
        return;
    };
    let code = choice.split(" | ").next().unwrap_or("USD");
    session.select_currency(catalog, code);

    // last-used currency becomes the startup default
    let mut defaults = store::load_defaults(storage);
    defaults.currency = Some(session.currency.code.clone());
    store::save_defaults(storage, &defaults);

    println!(
        "✅ Currency set to {} — only the symbol changes, amounts are never converted.",
        session.currency.code
    );
}

fn toggle_theme(session: &mut Session, storage: &mut dyn Storage) {
    let theme = session.invoice.theme.toggled();
    session.invoice.apply(InvoiceField::Theme(theme));

    let mut defaults = store::load_defaults(storage);
    defaults.theme = Some(theme);
    store::save_defaults(storage, &defaults);

    println!("✅ Theme set to {}.", theme.name());
}

fn logo_wizard(session: &mut Session) {
    println!("📂 Opening file picker...");
    let picked = rfd::FileDialog::new()
        .set_title("Select Logo Image")
        .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp"])
        .pick_file();

    let path = match picked {
        Some(path) => path,
        None => {
            let Ok(text) = Text::new("Logo image path (leave empty to cancel):").prompt() else {
                return;
            };
            if text.trim().is_empty() {
                return;
            }
            PathBuf::from(expand_home_dir(text.trim()))
        }
    };

    match export::read_logo(&path) {
        Some(data) => {
            session.invoice.apply(InvoiceField::Logo(Some(data)));
            println!("✅ Logo attached.");
        }
        None => println!("⚠️  Please choose an image file."),
    }
}

fn notes_wizard(session: &mut Session) {
    let current = session.invoice.clone();

    let Ok(notes) = Text::new("Notes:")
        .with_default(&escape_newlines(&current.notes))
        .prompt()
    else {
        return;
    };
    session
        .invoice
        .apply(InvoiceField::Notes(unescape_newlines(&notes)));

    let Ok(terms) = Text::new("Terms:")
        .with_default(&escape_newlines(&current.terms))
        .prompt()
    else {
        return;
    };
    session
        .invoice
        .apply(InvoiceField::Terms(unescape_newlines(&terms)));
}

fn save_draft(session: &mut Session, history: &mut HistoryStore, storage: &mut dyn Storage) {
    // persist the derived fields fresh, never stale
    session.invoice.recalculate();
    history.save_snapshot(&session.invoice, storage);
    println!(
        "✅ Saved to history ({} of {} slots used).",
        history.len(),
        history::HISTORY_CAP
    );
}

// ==========================================
// 4. History & Catalog Views
// ==========================================

fn print_history(history: &HistoryStore, catalog: &CurrencyCatalog) {
    if history.is_empty() {
        println!("No invoices yet");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#"),
        Cell::new("Invoice"),
        Cell::new("Date"),
        Cell::new("Total"),
        Cell::new("Balance Due"),
        Cell::new("Saved"),
    ]);

    for (position, entry) in history.entries().iter().enumerate() {
        let symbol = &catalog.resolve(&entry.invoice.currency).symbol;
        let number = if entry.invoice.number.is_empty() {
            "N/A"
        } else {
            entry.invoice.number.as_str()
        };
        let balance = entry.invoice.balance_due;
        let balance_cell = Cell::new(calc::format_money(symbol, balance));
        let balance_cell = if balance > 0.0 {
            balance_cell.fg(DUE_RED)
        } else {
            balance_cell.fg(PAID_GREEN)
        };

        table.add_row(vec![
            Cell::new(position + 1),
            Cell::new(number),
            Cell::new(entry.invoice.date),
            Cell::new(calc::format_money(symbol, entry.invoice.total)),
            balance_cell,
            Cell::new(
                entry
                    .saved_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M"),
            ),
        ]);
    }

    println!("{table}");
}

fn print_currencies(catalog: &CurrencyCatalog) {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Code"),
        Cell::new("Symbol"),
        Cell::new("Name"),
    ]);
    for record in catalog.records() {
        table.add_row(vec![
            Cell::new(record.code.as_str()),
            Cell::new(record.symbol.as_str()),
            Cell::new(record.name.as_str()),
        ]);
    }
    println!("{table}");
}

fn delete_snapshot_wizard(storage: &mut JsonFileStorage, index: usize) {
    let mut history = HistoryStore::load(&*storage);
    let Some(position) = to_position(index) else {
        println!("❌ No saved invoice at position {}.", index);
        return;
    };
    let prompt = match history.load_snapshot(position) {
        Some(entry) => format!(
            "Delete invoice #{} saved {}?",
            entry.invoice.number,
            entry.saved_at.with_timezone(&chrono::Local).format("%Y-%m-%d")
        ),
        None => {
            println!("❌ No saved invoice at position {}.", index);
            return;
        }
    };

    let confirmed = Confirm::new(&prompt).with_default(false).prompt().unwrap_or(false);
    if confirmed && history.delete_snapshot(position, storage) {
        println!("✅ Invoice deleted.");
    }
}

// ==========================================
// 5. Invoice Rendering
// ==========================================

fn print_invoice(session: &Session) {
    let invoice = &session.invoice;
    let number = if invoice.number.is_empty() {
        "N/A"
    } else {
        invoice.number.as_str()
    };

    println!("\nInvoice #{} — {}", number, invoice.date);
    if let Some(due) = invoice.due_date {
        println!("Due: {}", due);
    }
    if !invoice.payment_terms.is_empty() {
        println!("Terms: {}", invoice.payment_terms);
    }
    if !invoice.po_number.is_empty() {
        println!("PO #: {}", invoice.po_number);
    }
    for (label, text) in [
        ("From", &invoice.from),
        ("Bill To", &invoice.bill_to),
        ("Ship To", &invoice.ship_to),
    ] {
        if !text.is_empty() {
            println!("{}:\n  {}", label, text.replace('\n', "\n  "));
        }
    }

    println!("{}", items_table(session));
    println!("{}", totals_table(session));

    if !invoice.notes.is_empty() {
        println!("Notes: {}", invoice.notes);
    }
    if !invoice.terms.is_empty() {
        println!("Terms: {}", invoice.terms);
    }
}

fn items_table(session: &Session) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#"),
        Cell::new("Item"),
        Cell::new("Quantity"),
        Cell::new("Rate"),
        Cell::new("Amount"),
    ]);
    for (row, item) in session.invoice.items.iter().enumerate() {
        table.add_row(vec![
            Cell::new(row + 1),
            Cell::new(item.description.as_str()),
            Cell::new(item.quantity),
            Cell::new(session.fmt(item.rate)),
            Cell::new(session.fmt(item.amount)),
        ]);
    }
    table
}

fn totals_table(session: &Session) -> Table {
    let totals = calc::totals(&session.invoice);
    let invoice = &session.invoice;
    let mut table = Table::new();

    table.add_row(vec![
        Cell::new("Subtotal"),
        Cell::new(session.fmt(totals.subtotal)),
    ]);
    if invoice.discount != 0.0 {
        table.add_row(vec![
            Cell::new("Discount"),
            Cell::new(format!("-{}", session.fmt(invoice.discount))),
        ]);
    }
    if invoice.tax != 0.0 {
        let label = match invoice.tax_type {
            TaxType::Percentage => format!("Tax ({}%)", invoice.tax),
            TaxType::Fixed => "Tax (flat)".to_string(),
        };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(session.fmt(totals.tax_amount)),
        ]);
    }
    if invoice.shipping != 0.0 {
        table.add_row(vec![
            Cell::new("Shipping"),
            Cell::new(session.fmt(invoice.shipping)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(session.fmt(totals.total)).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Amount Paid"),
        Cell::new(session.fmt(invoice.amount_paid)),
    ]);

    // the formatter hides the sign, so overpayment is called out here
    let balance_label = if totals.balance_due < 0.0 {
        "Balance Due (overpaid)"
    } else {
        "Balance Due"
    };
    let balance_cell = Cell::new(session.fmt(totals.balance_due)).add_attribute(Attribute::Bold);
    let balance_cell = if totals.balance_due > 0.0 {
        balance_cell.fg(DUE_RED)
    } else {
        balance_cell.fg(PAID_GREEN)
    };
    table.add_row(vec![
        Cell::new(balance_label).add_attribute(Attribute::Bold),
        balance_cell,
    ]);
    table
}

// ==========================================
// 6. Template Wizard
// ==========================================

fn template_wizard(storage: &mut JsonFileStorage) {
    println!("\n--- Invoice Template ---");
    println!("💡 Saved values prefill every new draft. Leave a field empty to skip it.");
    let current = store::load_template(&*storage);

    let Ok(from) = Text::new("From (your address):")
        .with_default(&escape_newlines(current.from.as_deref().unwrap_or("")))
        .prompt()
    else {
        return;
    };
    let Ok(payment_terms) = Text::new("Payment Terms:")
        .with_default(current.payment_terms.as_deref().unwrap_or(""))
        .prompt()
    else {
        return;
    };
    let Ok(notes) = Text::new("Notes:")
        .with_default(&escape_newlines(current.notes.as_deref().unwrap_or("")))
        .prompt()
    else {
        return;
    };
    let Ok(terms) = Text::new("Terms:")
        .with_default(&escape_newlines(current.terms.as_deref().unwrap_or("")))
        .prompt()
    else {
        return;
    };
    let tax_default = current.tax.map(|t| t.to_string()).unwrap_or_default();
    let Ok(tax) = Text::new("Default Tax:").with_default(&tax_default).prompt() else {
        return;
    };

    let record = TemplateRecord {
        from: non_empty(unescape_newlines(&from)),
        payment_terms: non_empty(payment_terms),
        notes: non_empty(unescape_newlines(&notes)),
        terms: non_empty(unescape_newlines(&terms)),
        tax: if tax.trim().is_empty() {
            None
        } else {
            Some(parse_amount(&tax))
        },
    };
    store::save_template(storage, &record);
    println!("✅ Template saved.");
}

// ==========================================
// 7. Config & Utilities
// ==========================================

fn get_config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "invoice-draft", "app") {
        let config_dir = proj_dirs.config_dir();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir).ok();
        }
        return config_dir.join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

fn load_settings() -> Option<AppSettings> {
    let path = get_config_path();
    if !path.exists() {
        return None;
    }
    let content = fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

fn setup_config_wizard() -> AppSettings {
    println!("\n⚙️  --- Configuration Setup ---");
    let current = load_settings();
    let default_val = current
        .map(|s| s.data_root)
        .unwrap_or_else(|| "~/Documents/Invoices".to_string());

    println!("📂 Opening folder picker...");
    let picked_path = rfd::FileDialog::new()
        .set_title("Select Invoice Data Directory")
        .pick_folder();

    let new_root = if let Some(path) = picked_path {
        path.to_string_lossy().to_string()
    } else {
        println!("❌ No folder selected. Falling back to manual input.");
        Text::new("Enter Invoice Data Directory:")
            .with_default(&default_val)
            .prompt()
            .unwrap_or(default_val)
    };

    let settings = AppSettings {
        data_root: new_root,
    };

    let path = get_config_path();
    match toml::to_string_pretty(&settings) {
        Ok(toml_str) => {
            if let Err(e) = fs::write(&path, toml_str) {
                eprintln!("⚠️  Failed to save settings: {}", e);
            } else {
                println!("✅ Settings saved.");
            }
        }
        Err(e) => eprintln!("⚠️  Failed to serialize settings: {}", e),
    }
    settings
}

fn expand_home_dir(path: &str) -> String {
    if path.starts_with("~") {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen("~", &home, 1);
        }
    }
    path.to_string()
}

// '\n' typed at a prompt becomes a real newline in the stored field
fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

fn escape_newlines(text: &str) -> String {
    text.replace('\n', "\\n")
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}
