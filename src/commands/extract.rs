//! Extraction commands: places, search, inspect

use colored::Colorize;
use serde::Serialize;
use std::io::{self, Read};

use glean::cli::FeatureArg;
use glean::config::Config;
use glean::document::{DocumentState, RawDocument};
use glean::error::Result;
use glean::markup::truncate_chars;
use glean::records::BusinessRecord;
use glean::serp::{SearchFeature, SearchRequest, SearchResults};
use glean::{extract_places, extract_search, Enrichment, Page, PlacesRequest};

/// Read a saved document from a path, or from stdin for `-`.
///
/// Saved pages are not always valid UTF-8; bad bytes become U+FFFD.
fn read_document(file: &str) -> Result<RawDocument> {
    let bytes = if file == "-" {
        let mut input = Vec::new();
        io::stdin().read_to_end(&mut input)?;
        input
    } else {
        std::fs::read(file)?
    };
    tracing::debug!(file, bytes = bytes.len(), "document loaded");
    Ok(RawDocument::new(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Disable colors when stdout is not a terminal
fn init_color() {
    if !atty::is(atty::Stream::Stdout) {
        colored::control::set_override(false);
    }
}

/// Extract business listings
pub fn cmd_places(
    file: &str,
    limit: Option<usize>,
    cursor: usize,
    enrich: Enrichment,
    json: bool,
) -> Result<()> {
    let config = Config::load()?;
    let raw = read_document(file)?;
    let request = PlacesRequest {
        limit: limit.unwrap_or(config.extraction.default_limit),
        cursor,
        enrich,
    };

    let page = extract_places(&raw, &request, &config.extraction)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        init_color();
        print_places(&page, cursor);
    }
    Ok(())
}

fn print_places(page: &Page<BusinessRecord>, cursor: usize) {
    if page.records.is_empty() {
        println!("No listings found.");
        return;
    }

    println!("\n{} listing(s):\n", page.total_found);
    for (i, record) in page.records.iter().enumerate() {
        let closed = if record.permanently_closed {
            format!(" {}", "(permanently closed)".red())
        } else {
            String::new()
        };
        println!("  {}. {}{}", cursor + i + 1, record.name.bold(), closed);

        let mut summary = Vec::new();
        if let Some(rating) = record.rating {
            let reviews = record
                .review_count
                .map(|n| format!(" ({})", n))
                .unwrap_or_default();
            summary.push(format!("{} {:.1}{}", "★".yellow(), rating, reviews));
        }
        if let Some(price) = &record.price_level {
            summary.push(price.green().to_string());
        }
        if !record.categories.is_empty() {
            summary.push(record.categories.join(", "));
        }
        if !summary.is_empty() {
            println!("     {}", summary.join(" · "));
        }

        for (label, value) in [
            ("Address", record.address.as_deref()),
            ("Phone", record.phone.as_deref()),
            ("Website", record.website.as_deref()),
            ("Email", record.email.as_deref()),
        ] {
            if let Some(value) = value {
                println!("     {:<8} {}", label.dimmed(), value);
            }
        }
        if let Some(hours) = &record.hours {
            let lines: Vec<String> = hours.iter().map(|(day, range)| format!("{} {}", day, range)).collect();
            println!("     {:<8} {}", "Hours".dimmed(), lines.join("; "));
        }
        if let Some(coords) = record.coordinates {
            println!(
                "     {:<8} {:.5}, {:.5}",
                "Location".dimmed(),
                coords.latitude,
                coords.longitude
            );
        }
        println!();
    }

    if let Some(next) = page.next_cursor {
        println!("Next cursor: {}", next);
    }
}

/// Extract organic results and search features
pub fn cmd_search(
    file: &str,
    only: Vec<FeatureArg>,
    limit: usize,
    cursor: usize,
    json: bool,
) -> Result<()> {
    let config = Config::load()?;
    let raw = read_document(file)?;
    let features = if only.is_empty() {
        SearchFeature::ALL.to_vec()
    } else {
        only.into_iter().map(SearchFeature::from).collect()
    };
    let request = SearchRequest {
        features,
        cursor,
        limit,
    };

    let results = extract_search(&raw, &request, &config.extraction)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        init_color();
        print_search(&results);
    }
    Ok(())
}

fn print_search(results: &SearchResults) {
    if let Some(panel) = &results.summary {
        println!("\n{}", "Summary".bold());
        println!("  {}", truncate_chars(&panel.text, 300));
        for source in &panel.sources {
            println!("    - {} {}", source.title, source.url.dimmed());
        }
    }

    if let Some(passage) = &results.featured {
        println!("\n{}", "Featured".bold());
        println!("  {}", truncate_chars(&passage.text, 300));
        if let Some(url) = &passage.url {
            println!("  {}", url.dimmed());
        }
    }

    if !results.ads.is_empty() {
        println!("\n{}", "Ads".bold());
        for ad in &results.ads {
            let slot = if ad.is_top { "top" } else { "bottom" };
            println!("  {}. {} [{}]", ad.position, ad.title, slot.dimmed());
            println!("     {}", ad.display_url.green());
        }
    }

    println!("\n{}", "Results".bold());
    if results.organic.is_empty() {
        println!("  No organic results found.");
    }
    for result in &results.organic {
        println!("  {}. {}", result.position, result.title.bold());
        println!("     {}", result.display_url.green());
        if !result.snippet.is_empty() {
            let date = result
                .date
                .as_deref()
                .map(|d| format!("{} - ", d.dimmed()))
                .unwrap_or_default();
            println!("     {}{}", date, truncate_chars(&result.snippet, 200));
        }
        if !result.sitelinks.is_empty() {
            let titles: Vec<&str> = result.sitelinks.iter().map(|s| s.title.as_str()).collect();
            println!("     {}", titles.join(" | ").dimmed());
        }
    }

    if !results.map_pack.is_empty() {
        println!("\n{}", "Places".bold());
        for entry in &results.map_pack {
            let rating = entry
                .rating
                .map(|r| format!(" {} {:.1}", "★".yellow(), r))
                .unwrap_or_default();
            println!("  - {}{}", entry.name, rating);
            if let Some(address) = &entry.address {
                println!("    {}", address.dimmed());
            }
        }
    }

    if let Some(panel) = &results.info_panel {
        println!("\n{}", panel.title.bold());
        if let Some(kind) = &panel.kind {
            println!("  {}", kind.dimmed());
        }
        if let Some(description) = &panel.description {
            println!("  {}", truncate_chars(description, 300));
        }
        for (key, value) in &panel.attributes {
            println!("  {}: {}", key.bold(), value);
        }
    }

    if !results.questions.is_empty() {
        println!("\n{}", "People also ask".bold());
        for qa in &results.questions {
            println!("  - {}", qa.question);
        }
    }

    if !results.related.is_empty() {
        println!("\n{}", "Related".bold());
        println!("  {}", results.related.join(" · "));
    }

    if let Some(next) = results.next_cursor {
        println!("\nNext cursor: {}", next);
    }
}

#[derive(Serialize)]
struct InspectReport {
    #[serde(flatten)]
    state: DocumentState,
    bytes: usize,
}

/// Classify a document without extracting from it
pub fn cmd_inspect(file: &str, json: bool) -> Result<()> {
    let config = Config::load()?;
    let raw = read_document(file)?;
    let report = InspectReport {
        state: raw.classify(&config.extraction),
        bytes: raw.text.len(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    init_color();
    match &report.state {
        DocumentState::Blocked { marker } => {
            println!("{} challenge page (marker: {})", "Blocked:".red().bold(), marker)
        }
        DocumentState::Empty => println!("{} no content", "Empty:".yellow().bold()),
        DocumentState::Parsed => println!("{} ready for extraction", "Parsed:".green().bold()),
    }
    println!("  {} bytes", report.bytes);
    Ok(())
}
