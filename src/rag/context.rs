//! Rendering retrieved products into a prompt context block.

use crate::catalog::Specifications;
use crate::config::ContextFormat;
use crate::retrieval::ScoredMatch;
use serde::Serialize;
use serde_json::Value;

/// Render matches in the requested format. No matches render as an empty string.
pub fn render_context(matches: &[ScoredMatch], format: ContextFormat) -> String {
    match format {
        ContextFormat::Text => format_context(matches),
        ContextFormat::Json => format_context_json(matches),
    }
}

/// Format matches as numbered, labelled text sections.
///
/// ```text
/// --- محصول 1 ---
/// - نام: Galaxy A54
/// - قیمت: 12,000,000 تومان
/// - فروشگاه: TechShop
/// - مشخصات:
///   - RAM: 8GB
/// ```
pub fn format_context(matches: &[ScoredMatch]) -> String {
    matches
        .iter()
        .enumerate()
        .map(|(i, m)| format_section(i + 1, m))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_section(number: usize, m: &ScoredMatch) -> String {
    let record = &m.record;
    let mut section = format!("--- محصول {} ---\n", number);
    section.push_str(&format!("- نام: {}\n", record.name));
    section.push_str(&format!("- قیمت: {} تومان\n", format_price(record.price)));
    section.push_str(&format!("- فروشگاه: {}\n", record.store));

    if !record.specifications.is_empty() {
        section.push_str("- مشخصات:\n");
        for (key, value) in &record.specifications {
            section.push_str(&format!("  - {}: {}\n", key, format_spec_value(value)));
        }
    }

    section.trim_end().to_string()
}

/// Strings are shown without JSON quotes; everything else uses its JSON form.
fn format_spec_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Group the digits of a price by thousands, e.g. `12000000` -> `12,000,000`.
pub fn format_price(price: i64) -> String {
    let digits = price.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if price < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[derive(Serialize)]
struct ContextEntry<'a> {
    name: &'a str,
    price: i64,
    store: &'a str,
    specifications: &'a Specifications,
}

/// Format matches as a pretty-printed JSON array.
pub fn format_context_json(matches: &[ScoredMatch]) -> String {
    if matches.is_empty() {
        return String::new();
    }

    let entries: Vec<ContextEntry<'_>> = matches
        .iter()
        .map(|m| ContextEntry {
            name: &m.record.name,
            price: m.record.price,
            store: &m.record.store,
            specifications: &m.record.specifications,
        })
        .collect();

    serde_json::to_string_pretty(&entries).unwrap_or_default()
}
