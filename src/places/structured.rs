//! Listings declared as schema.org JSON-LD

use serde_json::Value;

use crate::assemble::Anchor;
use crate::document::Document;
use crate::error::Result;
use crate::fields::PartialFields;
use crate::markup;
use crate::records::{Coordinates, Hours};
use crate::strategy::Strategy;

/// schema.org types (or fragments of them) that describe a business
const BUSINESS_TYPES: &[&str] = &[
    "LocalBusiness",
    "Restaurant",
    "FoodEstablishment",
    "CafeOrCoffeeShop",
    "BarOrPub",
    "Bakery",
    "Store",
    "Shop",
    "Hotel",
    "Lodging",
    "Dentist",
    "Physician",
    "Service",
    "Business",
    "Attorney",
    "Place",
];

const DAY_CODES: [(&str, &str); 7] = [
    ("mo", "Monday"),
    ("tu", "Tuesday"),
    ("we", "Wednesday"),
    ("th", "Thursday"),
    ("fr", "Friday"),
    ("sa", "Saturday"),
    ("su", "Sunday"),
];

pub struct JsonLdListings;

impl Strategy for JsonLdListings {
    type Output = Anchor;

    fn name(&self) -> &'static str {
        "json_ld"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<Anchor>> {
        let mut anchors = Vec::new();
        let mut from = 0;

        for script in doc.select(r#"script[type="application/ld+json"]"#)? {
            let text: String = script.text().collect();
            let json = match serde_json::from_str::<Value>(&text) {
                Ok(json) => json,
                Err(e) => {
                    tracing::trace!(error = %e, "unparsable JSON-LD block");
                    continue;
                }
            };

            let script_offset = doc.raw()[from..].find(text.trim()).map(|pos| from + pos);
            // each item is anchored at its own name so siblings get separate windows
            let mut item_from = script_offset.unwrap_or(0);
            for item in flatten_jsonld(&json) {
                let Some(name) = item.get("name").and_then(text_value) else {
                    continue;
                };
                let offset = name_offset(doc.raw(), &name, item_from)
                    .or(script_offset)
                    .or_else(|| doc.locate(&name, 0))
                    .unwrap_or(0);
                item_from = offset + 1;
                anchors.push(Anchor::new(&name, offset, self.name()).with_partial(partial_fields(&item)));
            }
            if let Some(offset) = script_offset {
                from = offset + 1;
            }
        }
        Ok(anchors)
    }
}

/// Offset of `name` as a quoted JSON string at or after `from`
fn name_offset(raw: &str, name: &str, from: usize) -> Option<usize> {
    let quoted = serde_json::to_string(name).ok()?;
    let from = markup::ceil_char_boundary(raw, from);
    raw[from..].find(&quoted).map(|pos| from + pos + 1)
}

/// Business items from a JSON-LD value: `@graph`, arrays, and single objects
fn flatten_jsonld(json: &Value) -> Vec<Value> {
    let mut items = Vec::new();

    match json {
        Value::Object(map) => {
            if let Some(Value::Array(graph)) = map.get("@graph") {
                for item in graph {
                    items.extend(flatten_jsonld(item));
                }
            } else if is_business(json) {
                items.push(json.clone());
            } else if let Some(list) = map.get("itemListElement") {
                // ItemList of ListItems wrapping the businesses
                for entry in list.as_array().into_iter().flatten() {
                    items.extend(flatten_jsonld(entry.get("item").unwrap_or(entry)));
                }
            }
        }
        Value::Array(arr) => {
            for item in arr {
                items.extend(flatten_jsonld(item));
            }
        }
        _ => {}
    }

    items
}

fn is_business(json: &Value) -> bool {
    let matches = |type_str: &str| {
        let clean = type_str.rsplit_once(['/', ':']).map(|(_, t)| t).unwrap_or(type_str);
        BUSINESS_TYPES.iter().any(|t| clean.contains(t))
    };
    match json.get("@type") {
        Some(Value::String(s)) => matches(s),
        Some(Value::Array(arr)) => arr.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}

fn partial_fields(item: &Value) -> PartialFields {
    let rating = item.get("aggregateRating");
    PartialFields {
        address: item.get("address").and_then(address_value),
        phone: item.get("telephone").and_then(text_value),
        website: item.get("url").and_then(text_value),
        email: item
            .get("email")
            .and_then(text_value)
            .map(|e| e.trim_start_matches("mailto:").to_string()),
        hours: opening_hours(item),
        rating: rating
            .and_then(|r| r.get("ratingValue"))
            .and_then(number_value)
            .map(|r| r as f32),
        review_count: rating
            .and_then(|r| r.get("reviewCount").or_else(|| r.get("ratingCount")))
            .and_then(number_value)
            .filter(|n| *n >= 0.0 && *n <= u32::MAX as f64)
            .map(|n| n as u32),
        categories: string_list(item.get("servesCuisine")),
        coordinates: item.get("geo").and_then(|geo| {
            Some(Coordinates {
                latitude: number_value(geo.get("latitude")?)?,
                longitude: number_value(geo.get("longitude")?)?,
            })
        }),
        place_id: None,
        price_level: item
            .get("priceRange")
            .and_then(text_value)
            .filter(|p| !p.is_empty() && p.chars().count() <= 4 && p.chars().all(|c| "$€£¥₩".contains(c))),
        permanently_closed: false,
    }
}

/// A trimmed, non-empty string, or the `name` of a nested object
fn text_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Object(_) => value.get("name")?.as_str()?.trim().to_string(),
        Value::Array(arr) => return arr.first().and_then(text_value),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.trim().to_string()],
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .collect(),
        _ => Vec::new(),
    }
}

/// A `PostalAddress` object flattened to one line, or a plain string
fn address_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Object(_) => {
            let street = value.get("streetAddress").and_then(Value::as_str);
            let locality = value.get("addressLocality").and_then(Value::as_str);
            let region_zip = [
                value.get("addressRegion").and_then(Value::as_str),
                value.get("postalCode").and_then(Value::as_str),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

            let parts = [street, locality, Some(region_zip.as_str())]
                .into_iter()
                .flatten()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Array(arr) => arr.first().and_then(address_value),
        _ => None,
    }
}

/// `openingHoursSpecification` objects, falling back to `openingHours` strings
fn opening_hours(item: &Value) -> Option<Hours> {
    let mut hours = Hours::new();

    let specs = match item.get("openingHoursSpecification") {
        Some(Value::Array(arr)) => arr.iter().collect::<Vec<_>>(),
        Some(spec @ Value::Object(_)) => vec![spec],
        _ => Vec::new(),
    };
    for spec in specs {
        let (Some(opens), Some(closes)) = (
            spec.get("opens").and_then(Value::as_str),
            spec.get("closes").and_then(Value::as_str),
        ) else {
            continue;
        };
        let range = format!("{}–{}", short_time(opens), short_time(closes));
        for day in string_list(spec.get("dayOfWeek")) {
            let day = day.rsplit('/').next().unwrap_or(&day).to_string();
            if let Some(full) = day_from_code(&day) {
                hours.entry(full.to_string()).or_insert_with(|| range.clone());
            }
        }
    }

    for line in string_list(item.get("openingHours")) {
        let Some((days, range)) = line.split_once(' ') else {
            continue;
        };
        for day in expand_days(days) {
            hours.entry(day.to_string()).or_insert_with(|| range.trim().to_string());
        }
    }

    (!hours.is_empty()).then_some(hours)
}

/// `09:00:00` -> `09:00`
fn short_time(time: &str) -> &str {
    match time.match_indices(':').nth(1) {
        Some((second_colon, _)) => &time[..second_colon],
        None => time,
    }
}

fn day_from_code(day: &str) -> Option<&'static str> {
    let code = day.get(..2)?.to_ascii_lowercase();
    DAY_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, full)| *full)
}

/// `Mo-Fr`, `Sa,Su`, `Mo` -> full day names
fn expand_days(spec: &str) -> Vec<&'static str> {
    let mut days = Vec::new();
    for part in spec.split(',') {
        match part.split_once('-') {
            Some((start, end)) => {
                let index = |d: &str| {
                    let full = day_from_code(d.trim())?;
                    DAY_CODES.iter().position(|(_, f)| *f == full)
                };
                if let (Some(start), Some(end)) = (index(start), index(end)) {
                    if start <= end {
                        days.extend(DAY_CODES[start..=end].iter().map(|(_, f)| *f));
                    }
                }
            }
            None => days.extend(day_from_code(part.trim())),
        }
    }
    days
}
