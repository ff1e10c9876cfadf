// Turns the backend's column-oriented results into display-ready listings

use crate::models::{CarListing, RawPrice, RawResults};

pub const PRICE_NOT_AVAILABLE: &str = "Price Not Available";
pub const NAME_NOT_AVAILABLE: &str = "Car Name Not Available";
pub const LOCATION_NOT_AVAILABLE: &str = "Location Not Available";
pub const DATE_NOT_AVAILABLE: &str = "Date Not Available";

const PRICE_UNIT: &str = "Million";

/// Formats a raw price with its unit suffix, never appending the unit twice.
///
/// Numbers get `" Million"` appended. Strings that already mention the unit
/// (`"million"` or an `"m"` abbreviation, case-insensitive) pass through, as does
/// the placeholder itself. Absent or empty prices become the placeholder.
pub fn normalize_price(raw: Option<&RawPrice>) -> String {
    match raw {
        None => PRICE_NOT_AVAILABLE.to_string(),
        Some(RawPrice::Number(n)) => format!("{} {}", format_number(n), PRICE_UNIT),
        Some(RawPrice::Text(text)) => {
            if text.is_empty() {
                return PRICE_NOT_AVAILABLE.to_string();
            }
            let lower = text.to_lowercase();
            if text == PRICE_NOT_AVAILABLE || lower.contains("million") || lower.contains('m') {
                text.clone()
            } else {
                format!("{} {}", text, PRICE_UNIT)
            }
        }
    }
}

// Integers print without a fractional part; floats use their shortest form (300.0 -> "300")
fn format_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map_or_else(|| n.to_string(), |f| f.to_string())
    }
}

// Null and empty cells both count as absent; anything else passes through untouched
fn text_at(column: &[Option<String>], index: usize) -> Option<&str> {
    column
        .get(index)
        .and_then(|cell| cell.as_deref())
        .filter(|s| !s.is_empty())
}

fn optional_at(column: Option<&Vec<Option<String>>>, index: usize) -> Option<String> {
    column.and_then(|c| c.get(index)).and_then(|cell| cell.clone())
}

/// Number of listings a response yields: `count`, capped by the name column.
/// Shorter price, location or date columns leave placeholders, not gaps.
pub fn listing_count(raw: &RawResults, count: usize) -> usize {
    count.min(raw.name.len())
}

/// Builds the listing at `index`. Missing cells fall back to placeholders.
pub fn normalize_listing(raw: &RawResults, index: usize) -> CarListing {
    CarListing {
        name: text_at(&raw.name, index).unwrap_or(NAME_NOT_AVAILABLE).to_string(),
        price: normalize_price(raw.price.get(index).and_then(Option::as_ref)),
        location: text_at(&raw.location, index)
            .unwrap_or(LOCATION_NOT_AVAILABLE)
            .to_string(),
        date: text_at(&raw.date, index).unwrap_or(DATE_NOT_AVAILABLE).to_string(),
        image: optional_at(raw.image.as_ref(), index),
        url: optional_at(raw.url.as_ref(), index),
    }
}

/// Normalizes every listing of a response, in arrival order.
pub fn normalize_results(raw: &RawResults, count: usize) -> Vec<CarListing> {
    (0..listing_count(raw, count))
        .map(|index| normalize_listing(raw, index))
        .collect()
}
