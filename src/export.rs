use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use slug::slugify;
use tera::{Context, Tera};

use crate::calc;
use crate::currency::CurrencyRecord;
use crate::model::{Invoice, TaxType};

// Embedded so the pipeline works before the user ever customizes it
const DEFAULT_TEMPLATE: &str = include_str!("../templates/invoice.tera");

#[derive(Serialize)]
struct ItemContext {
    description: String,
    quantity: String,
    rate: String,
    amount: String,
}

#[derive(Serialize)]
struct ExportContext {
    number: String,
    date: String,
    due_date: Option<String>,
    payment_terms: String,
    po_number: String,
    from: String,
    bill_to: String,
    ship_to: String,
    items: Vec<ItemContext>,
    notes: String,
    terms: String,
    subtotal: String,
    has_discount: bool,
    discount: String,
    has_tax: bool,
    tax_label: String,
    tax_amount: String,
    has_shipping: bool,
    shipping: String,
    total: String,
    amount_paid: String,
    balance_due: String,
    logo_file: Option<String>,
}

fn build_context(
    invoice: &Invoice,
    currency: &CurrencyRecord,
    logo_file: Option<String>,
) -> ExportContext {
    let totals = calc::totals(invoice);
    let money = |amount: f64| calc::format_money(&currency.symbol, amount);
    let tax_label = match invoice.tax_type {
        TaxType::Percentage => format!(" ({}%)", invoice.tax),
        TaxType::Fixed => String::new(),
    };
    ExportContext {
        number: invoice.number.clone(),
        date: invoice.date.format("%m/%d/%Y").to_string(),
        due_date: invoice.due_date.map(|d| d.format("%m/%d/%Y").to_string()),
        payment_terms: invoice.payment_terms.clone(),
        po_number: invoice.po_number.clone(),
        from: invoice.from.clone(),
        bill_to: invoice.bill_to.clone(),
        ship_to: invoice.ship_to.clone(),
        items: invoice
            .items
            .iter()
            .map(|item| ItemContext {
                description: item.description.clone(),
                quantity: format!("{}", item.quantity),
                rate: money(item.rate),
                amount: money(item.amount),
            })
            .collect(),
        notes: invoice.notes.clone(),
        terms: invoice.terms.clone(),
        subtotal: money(totals.subtotal),
        has_discount: invoice.discount != 0.0,
        discount: money(invoice.discount),
        has_tax: invoice.tax != 0.0,
        tax_label,
        tax_amount: money(totals.tax_amount),
        has_shipping: invoice.shipping != 0.0,
        shipping: money(invoice.shipping),
        total: money(totals.total),
        amount_paid: money(invoice.amount_paid),
        balance_due: money(totals.balance_due),
        logo_file,
    }
}

fn export_stem(invoice: &Invoice) -> String {
    let number = slugify(&invoice.number);
    let number = if number.is_empty() {
        "draft".to_string()
    } else {
        number
    };
    format!("invoice-{}_{}", number, invoice.date.format("%Y%m%d"))
}

/// Read an image file into the embeddable data-URL form stored on the
/// invoice. Non-image files are rejected with `None`.
pub fn read_logo(path: &Path) -> Option<String> {
    let subtype = image_subtype(path)?;
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            println!("❌ Failed to read {}: {}", path.display(), e);
            return None;
        }
    };
    Some(logo_data_url(subtype, &bytes))
}

fn image_subtype(path: &Path) -> Option<&'static str> {
    match path
        .extension()?
        .to_string_lossy()
        .to_ascii_lowercase()
        .as_str()
    {
        "png" => Some("png"),
        "jpg" | "jpeg" => Some("jpeg"),
        "gif" => Some("gif"),
        "webp" => Some("webp"),
        _ => None,
    }
}

fn logo_data_url(subtype: &str, bytes: &[u8]) -> String {
    format!("data:image/{};base64,{}", subtype, BASE64.encode(bytes))
}

fn split_data_url(data: &str) -> Option<(&str, Vec<u8>)> {
    let rest = data.strip_prefix("data:image/")?;
    let (subtype, payload) = rest.split_once(";base64,")?;
    let extension = match subtype {
        "jpeg" => "jpg",
        other => other,
    };
    Some((extension, BASE64.decode(payload).ok()?))
}

// The template references the logo as a file next to the .typ source, so
// an embedded logo is decoded back out before rendering.
fn write_logo(output_dir: &Path, stem: &str, logo: Option<&str>) -> Option<String> {
    let (extension, bytes) = split_data_url(logo?)?;
    let file_name = format!("{}_logo.{}", stem, extension);
    match fs::write(output_dir.join(&file_name), bytes) {
        Ok(()) => Some(file_name),
        Err(e) => {
            println!("⚠️  Failed to write logo: {}", e);
            None
        }
    }
}

/// Render the invoice through the Tera template into
/// `output/<year>/<stem>.typ` and compile it with Typst when installed.
/// Returns the path of whatever was produced.
pub fn export_invoice(
    root: &Path,
    invoice: &Invoice,
    currency: &CurrencyRecord,
) -> Option<PathBuf> {
    let template_dir = root.join("templates");
    if !template_dir.exists() {
        if let Err(e) = fs::create_dir_all(&template_dir) {
            println!("❌ Failed to create template directory: {}", e);
            return None;
        }
    }
    let template_path = template_dir.join("invoice.tera");
    if !template_path.exists() {
        println!("✨ Initializing default template...");
        if let Err(e) = fs::write(&template_path, DEFAULT_TEMPLATE) {
            println!("❌ Failed to write default template: {}", e);
            return None;
        }
    }

    let glob = template_dir.join("*.tera");
    let tera = match Tera::new(&glob.to_string_lossy()) {
        Ok(t) => t,
        Err(e) => {
            println!("❌ Template Error: {}", e);
            return None;
        }
    };

    let output_dir = root
        .join("output")
        .join(invoice.date.format("%Y").to_string());
    if let Err(e) = fs::create_dir_all(&output_dir) {
        println!("❌ Failed to create output directory: {}", e);
        return None;
    }

    let stem = export_stem(invoice);
    let logo_file = write_logo(&output_dir, &stem, invoice.logo.as_deref());
    let context_data = build_context(invoice, currency, logo_file);
    let context = match Context::from_serialize(&context_data) {
        Ok(context) => context,
        Err(e) => {
            println!("❌ Template Error: {}", e);
            return None;
        }
    };
    let rendered = match tera.render("invoice.tera", &context) {
        Ok(rendered) => rendered,
        Err(e) => {
            println!("❌ Template Error: {}", e);
            return None;
        }
    };

    let typ_path = output_dir.join(format!("{}.typ", stem));
    if let Err(e) = fs::write(&typ_path, rendered) {
        println!("❌ Failed to write {}: {}", typ_path.display(), e);
        return None;
    }

    if Command::new("typst").arg("--version").output().is_err() {
        println!(
            "⚠️  'typst' is not installed; kept the source at {:?}. Install typst to produce PDFs.",
            typ_path
        );
        return Some(typ_path);
    }

    let pdf_path = output_dir.join(format!("{}.pdf", stem));
    println!("\n🔨 Compiling PDF...");
    match Command::new("typst")
        .arg("compile")
        .arg(&typ_path)
        .arg(&pdf_path)
        .status()
    {
        Ok(s) if s.success() => {
            println!("✅ PDF Generated: {:?}", pdf_path);
            open_and_reveal(&pdf_path);
            Some(pdf_path)
        }
        _ => {
            println!("❌ Compilation failed; source kept at {:?}.", typ_path);
            Some(typ_path)
        }
    }
}

// Helper: open the file with the platform default handler
fn open_and_reveal(path: &Path) {
    #[cfg(target_os = "macos")]
    {
        Command::new("open").arg("-R").arg(path).spawn().ok();
        Command::new("open").arg(path).spawn().ok();
    }

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(path).spawn().ok();

    #[cfg(target_os = "linux")]
    Command::new("xdg-open").arg(path).spawn().ok();
}
