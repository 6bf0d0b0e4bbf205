//! Metrics exposed through `/metrics`.
//!
//! Kept in its own test binary with a single test so the process-wide
//! counters are not shared with concurrently running tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestFixture;

/// Value of an unlabelled sample in Prometheus text output.
fn sample(text: &str, name: &str) -> f64 {
    text.lines()
        .find_map(|line| line.strip_prefix(name)?.strip_prefix(' '))
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0.0)
}

async fn scrape(fixture: &TestFixture) -> String {
    let response = fixture.get("/metrics").await;
    assert_status!(response, StatusCode::OK);
    response
        .body
        .as_str()
        .expect("metrics are plain text")
        .to_string()
}

#[tokio::test]
async fn test_metrics_series_and_counters() {
    let fixture = TestFixture::new();

    // Unrouted paths collapse into a single series.
    for i in 0..20 {
        let response = fixture.get(&format!("/nope/x{}", i)).await;
        assert_status!(response, StatusCode::NOT_FOUND);
    }
    // Non-numeric ids still match the ticket route template.
    let response = fixture.get("/tickets/abc").await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);

    let text = scrape(&fixture).await;
    assert!(!text.contains("/nope/"), "raw path leaked into labels");
    assert!(!text.contains("/tickets/abc"), "raw path leaked into labels");
    assert!(text.contains(r#"path="unmatched""#));
    assert!(text.contains(r#"path="/tickets/{id}""#));

    // Empty patches write nothing and are not counted as updates.
    let created = fixture
        .create_ticket(json!({ "title": "Counter", "priority": 2 }))
        .await;
    let path = format!("/tickets/{}", created["id"]);

    for _ in 0..3 {
        let response = fixture.patch(&path, json!({})).await;
        assert_status!(response, StatusCode::OK);
    }
    let text = scrape(&fixture).await;
    assert_eq!(sample(&text, "helpdesk_tickets_created_total"), 1.0);
    assert_eq!(sample(&text, "helpdesk_tickets_updated_total"), 0.0);

    let response = fixture.patch(&path, json!({ "status": "closed" })).await;
    assert_status!(response, StatusCode::OK);

    let text = scrape(&fixture).await;
    assert_eq!(sample(&text, "helpdesk_tickets_updated_total"), 1.0);
    assert!(text.contains(r#"helpdesk_tickets_by_status{status="closed"} 1"#));
}
