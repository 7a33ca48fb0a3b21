//! End-to-end tests for search results extraction

use pretty_assertions::assert_eq;

use glean::records::{OrganicResult, PassageShape};
use glean::{extract_search, ExtractionConfig, RawDocument, SearchFeature, SearchRequest};

// ============================================================================
// Fixtures
// ============================================================================

const CLASSIC_RESULT: &str = r#"<html><body><div class="g"><a href="/url?q=https://example.com/page">Example Title</a><span class="st">An example snippet.</span></div></body></html>"#;

const FULL_SERP: &str = r#"
<html><body>
<div id="tads">
  <div data-text-ad="1">
    <a href="/aclk?sa=l&amp;adurl=https://pizzadelivery.example/"><div role="heading">Fast Pizza Delivery</div></a>
    <span class="x2VHCd">pizzadelivery.example</span>
    <div class="MUxGbd">Hot pizza in 30 minutes.</div>
  </div>
</div>
<div data-subtree="aimc">
  <h2>AI Overview</h2>
  <div>Joe's Pizza is a classic New York slice shop in Greenwich Village.</div>
  <a href="https://slices.example/joes">Slice Guide</a>
</div>
<div class="xpdopen">
  <span class="hgKElc">Joe's Pizza has served thin crust slices on Carmine Street since 1975.</span>
  <a href="https://www.joespizzanyc.com/"><h3>Joe's Pizza | Greenwich Village</h3></a>
</div>
<div id="rso">
  <div class="g">
    <a href="https://www.joespizzanyc.com/"><h3>Joe's Pizza | Greenwich Village</h3></a>
    <div class="VwiC3b">The original Joe's Pizza.</div>
  </div>
  <div class="related-question-pair" data-q="Is Joe's Pizza cash only?">
    <div class="wDYxhc">Joe's Pizza accepts cards at every location.</div>
  </div>
  <div class="VkpGBb">
    <div class="dbg0pd">Joe's Pizza</div>
    <div class="rllt__details"><div>4.5 (1,234) · Pizza</div></div>
  </div>
  <div class="g">
    <a href="https://en.wikipedia.org/wiki/Joe%27s_Pizza"><h3>Joe's Pizza - Wikipedia</h3></a>
    <div class="VwiC3b">Joe's Pizza is a pizzeria in New York City.</div>
  </div>
</div>
<div id="rhs"><div class="kp-wholepage">
  <div data-attrid="title"><span>Joe's Pizza</span></div>
  <div data-attrid="subtitle"><span>Pizza restaurant</span></div>
</div></div>
<a class="k8XOCe" href="/search?q=joe%27s+pizza+menu"><div class="s75CSd">joe's pizza menu</div></a>
</body></html>
"#;

fn extract(html: &str, request: &SearchRequest) -> glean::SearchResults {
    let config = ExtractionConfig::default();
    extract_search(&RawDocument::new(html), request, &config).unwrap()
}

// ============================================================================
// Organic results
// ============================================================================

#[test]
fn test_classic_organic_result() {
    let results = extract(CLASSIC_RESULT, &SearchRequest::default());

    assert_eq!(
        results.organic,
        vec![OrganicResult {
            position: 1,
            title: "Example Title".into(),
            url: "https://example.com/page".into(),
            display_url: "example.com/page".into(),
            snippet: "An example snippet.".into(),
            sitelinks: vec![],
            date: None,
            cached: false,
        }]
    );
    assert_eq!(results.total_found, 1);
    assert_eq!(results.next_cursor, Some(1));
}

#[test]
fn test_organic_positions_are_contiguous() {
    let results = extract(FULL_SERP, &SearchRequest::default());

    let titles: Vec<_> = results.organic.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Joe's Pizza | Greenwich Village", "Joe's Pizza - Wikipedia"]
    );
    let positions: Vec<_> = results.organic.iter().map(|r| r.position).collect();
    assert_eq!(positions, vec![1, 2]);
    assert_eq!(results.organic[0].snippet, "The original Joe's Pizza.");
}

#[test]
fn test_organic_limit_and_cursor() {
    let request = SearchRequest {
        limit: 1,
        cursor: 10,
        ..Default::default()
    };
    let results = extract(FULL_SERP, &request);

    assert_eq!(results.organic.len(), 1);
    assert_eq!(results.total_found, 1);
    assert_eq!(results.next_cursor, Some(11));
}

// ============================================================================
// Optional features
// ============================================================================

#[test]
fn test_every_feature_from_one_document() {
    let results = extract(FULL_SERP, &SearchRequest::default());

    assert_eq!(results.ads.len(), 1);
    assert_eq!(results.ads[0].position, 1);
    assert_eq!(results.ads[0].title, "Fast Pizza Delivery");
    assert_eq!(results.ads[0].url, "https://pizzadelivery.example/");
    assert!(results.ads[0].is_top);

    let summary = results.summary.as_ref().unwrap();
    assert_eq!(summary.text, "Joe's Pizza is a classic New York slice shop in Greenwich Village.");
    assert_eq!(summary.sources[0].url, "https://slices.example/joes");

    let featured = results.featured.as_ref().unwrap();
    assert_eq!(featured.shape, PassageShape::Paragraph);
    assert_eq!(
        featured.text,
        "Joe's Pizza has served thin crust slices on Carmine Street since 1975."
    );
    assert_eq!(featured.url.as_deref(), Some("https://www.joespizzanyc.com/"));

    assert_eq!(results.questions.len(), 1);
    assert_eq!(results.questions[0].question, "Is Joe's Pizza cash only?");
    assert_eq!(
        results.questions[0].snippet.as_deref(),
        Some("Joe's Pizza accepts cards at every location.")
    );

    let names: Vec<_> = results.map_pack.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Joe's Pizza"]);

    let panel = results.info_panel.as_ref().unwrap();
    assert_eq!(panel.title, "Joe's Pizza");
    assert_eq!(panel.kind.as_deref(), Some("Pizza restaurant"));

    assert_eq!(results.related, vec!["joe's pizza menu".to_string()]);
}

#[test]
fn test_unrequested_features_stay_empty() {
    let results = extract(FULL_SERP, &SearchRequest::only(&[SearchFeature::Related]));

    assert_eq!(results.organic.len(), 2);
    assert!(results.ads.is_empty());
    assert!(results.questions.is_empty());
    assert!(results.map_pack.is_empty());
    assert_eq!(results.featured, None);
    assert_eq!(results.summary, None);
    assert_eq!(results.info_panel, None);
    assert_eq!(results.related.len(), 1);
}

#[test]
fn test_question_box_links_are_not_organic() {
    let html = r#"
        <div class="g"><a href="https://example.com/a"><h3>First Result</h3></a></div>
        <div class="related-question-pair" data-q="What is the first result?">
          <a href="https://answers.example/q"><h3>Answer Source</h3></a>
        </div>
    "#;
    let results = extract(html, &SearchRequest::only(&[]));
    let titles: Vec<_> = results.organic.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["First Result"]);
}

// ============================================================================
// Document states
// ============================================================================

#[test]
fn test_challenge_page_fails() {
    let html = r#"<html><body><form id="captcha-form"></form><div class="g"><a href="https://example.com/"><h3>Hidden</h3></a></div></body></html>"#;
    let config = ExtractionConfig::default();
    let err = extract_search(&RawDocument::new(html), &SearchRequest::default(), &config).unwrap_err();
    assert!(err.is_challenge());
}

#[test]
fn test_empty_document_gives_empty_results() {
    let results = extract("", &SearchRequest::default());
    assert_eq!(results, glean::SearchResults::default());
    assert_eq!(results.next_cursor, None);
}

#[test]
fn test_results_wire_format() {
    let results = extract(FULL_SERP, &SearchRequest::default());
    let json = serde_json::to_value(&results).unwrap();

    assert_eq!(json["totalFound"], 2);
    assert_eq!(json["nextCursor"], 2);
    assert_eq!(json["organic"][0]["displayUrl"], "joespizzanyc.com");
    assert!(json["mapPack"].is_array());
    assert_eq!(json["infoPanel"]["title"], "Joe's Pizza");
    assert_eq!(json["ads"][0]["isTop"], true);
}
