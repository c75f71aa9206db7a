//! Integration tests for the leadhunt-vet HTTP surface
//!
//! Exercises the router end to end against an in-memory database and stubbed
//! collaborators: ingest, decision lookup, and the manual review lifecycle.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;

use leadhunt_common::events::EventBus;
use leadhunt_common::model::{CandidateDocument, Decision};
use leadhunt_vet::config::VetConfig;
use leadhunt_vet::services::{
    CheckableFacts, Collaborators, Corroboration, GenerativeModel, SearchService,
};
use leadhunt_vet::AppState;

/// Model stub returning a fixed, well-formed analysis
struct CannedModel(String);

#[async_trait::async_trait]
impl GenerativeModel for CannedModel {
    async fn generate(&self, _prompt: &str) -> leadhunt_common::Result<String> {
        Ok(self.0.clone())
    }
}

/// Search stub returning a fixed corroboration count
struct CannedSearch(i64);

#[async_trait::async_trait]
impl SearchService for CannedSearch {
    async fn corroborate(&self, _facts: &CheckableFacts) -> leadhunt_common::Result<Corroboration> {
        Ok(Corroboration {
            count: self.0,
            urls: vec!["https://corroborating.example.com/a".to_string()],
        })
    }
}

fn model_reply(source_url: &str) -> String {
    json!({
        "companyName": "Acme Corp",
        "industry": "Manufacturing",
        "region": "EMEA",
        "opportunityType": "Expansion",
        "summary": "Acme Corp announced a $40M expansion of its Frankfurt data center campus.",
        "potentialNeed": ["IT Infrastructure"],
        "opportunityScore": 9,
        "keyQuote": "We are doubling our footprint",
        "sourceURL": source_url
    })
    .to_string()
}

/// Build a test app over an in-memory database.
///
/// `corroborations` drives the confidence score: with the default policy an
/// unlisted domain scores 0.5*85 + 0.5*min(n,10)*10.
async fn create_test_app(corroborations: i64, source_url: &str) -> (axum::Router, AppState) {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    leadhunt_vet::db::init_tables(&pool)
        .await
        .expect("Failed to initialize schema");

    let collaborators = Collaborators {
        model: Arc::new(CannedModel(model_reply(source_url))),
        reputation: None,
        search: Some(Arc::new(CannedSearch(corroborations))),
        tone: None,
        alerts: None,
    };

    let state = AppState::new(pool, &VetConfig::default(), collaborators, EventBus::new(100));
    let app = leadhunt_vet::build_router(state.clone());
    (app, state)
}

fn sample_document(source_url: &str) -> CandidateDocument {
    CandidateDocument {
        text: "Acme Corp announced a $40M expansion of its Frankfurt campus.".to_string(),
        source_url: source_url.to_string(),
        source_domain: "news.example.com".to_string(),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (app, _state) = create_test_app(0, "https://news.example.com/acme").await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "leadhunt-vet");
    assert_eq!(json["pending_joins"], 0);
}

#[tokio::test]
async fn ingest_rejects_contract_violations_synchronously() {
    let (app, state) = create_test_app(0, "https://news.example.com/acme").await;

    let mut document = sample_document("https://news.example.com/acme");
    document.text = "   ".to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ingest")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&document).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "CONTRACT_VIOLATION");

    // Nothing entered the pipeline
    assert_eq!(state.pipeline.pending_joins().await.unwrap(), 0);
}

#[tokio::test]
async fn ingest_accepts_and_decides_a_candidate() {
    // 6 corroborations: confidence 0.5*85 + 0.5*60 = 72.5 -> 73, quality 100,
    // so the decision lands in manual review.
    let key = "https://news.example.com/acme-expansion";
    let (app, state) = create_test_app(6, key).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ingest")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&sample_document(key)).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    assert_eq!(json["identityKey"], key);

    // The pipeline runs in a background task; wait for the decision
    let mut decided = None;
    for _ in 0..100 {
        if let Some(record) = leadhunt_vet::db::decisions::load_final_record(&state.db, key)
            .await
            .unwrap()
        {
            decided = Some(record);
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    let record = decided.expect("pipeline decided the candidate");
    assert_eq!(record.decision, Decision::ManualReview);
    assert_eq!(record.enriched.verification.confidence_score, 73);

    // And the decision is visible over the lookup endpoint (URL-encoded key)
    let encoded = "/decisions/https%3A%2F%2Fnews.example.com%2Facme-expansion";
    let response = app
        .oneshot(Request::builder().uri(encoded).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["decision"], "Manual Review");
    assert_eq!(json["sourceURL"], key);
}

#[tokio::test]
async fn decision_lookup_for_unknown_key_is_404() {
    let (app, _state) = create_test_app(0, "https://news.example.com/acme").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/decisions/https%3A%2F%2Fnews.example.com%2Fmissing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn empty_review_queue_lists_empty_array() {
    let (app, _state) = create_test_app(0, "https://news.example.com/acme").await;

    let response = app
        .oneshot(Request::builder().uri("/review").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

/// Drive a candidate through the pipeline until it sits in the review queue
async fn queue_one_for_review(state: &AppState, key: &str) -> uuid::Uuid {
    state
        .pipeline
        .process_document(sample_document(key))
        .await
        .unwrap()
        .expect("single run dispatches");

    let entries = leadhunt_vet::db::review::list(&state.db).await.unwrap();
    assert_eq!(entries.len(), 1);
    entries[0].entry_id
}

#[tokio::test]
async fn correction_without_entry_id_mutates_nothing() {
    let key = "https://news.example.com/acme";
    let (app, state) = create_test_app(6, key).await;
    queue_one_for_review(&state, key).await;

    // A corrected analysis, but no entryId naming what it resolves
    let body: serde_json::Value = serde_json::from_str(&model_reply(key)).unwrap();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/review/correction")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "MISSING_IDENTIFIER");

    // Queue and corrections dataset are untouched
    assert_eq!(leadhunt_vet::db::review::list(&state.db).await.unwrap().len(), 1);
    assert_eq!(leadhunt_vet::db::corrections::count(&state.db).await.unwrap(), 0);
}

#[tokio::test]
async fn correction_for_unknown_entry_is_404() {
    let key = "https://news.example.com/acme";
    let (app, state) = create_test_app(6, key).await;
    queue_one_for_review(&state, key).await;

    let mut body: serde_json::Value = serde_json::from_str(&model_reply(key)).unwrap();
    body["entryId"] = json!(uuid::Uuid::new_v4().to_string());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/review/correction")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(leadhunt_vet::db::review::list(&state.db).await.unwrap().len(), 1);
    assert_eq!(leadhunt_vet::db::corrections::count(&state.db).await.unwrap(), 0);
}

#[tokio::test]
async fn valid_correction_resolves_the_entry() {
    let key = "https://news.example.com/acme";
    let (app, state) = create_test_app(6, key).await;
    let entry_id = queue_one_for_review(&state, key).await;

    let mut body: serde_json::Value = serde_json::from_str(&model_reply(key)).unwrap();
    body["entryId"] = json!(entry_id.to_string());
    body["companyName"] = json!("Acme Corporation GmbH");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/review/correction")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "recorded");
    assert_eq!(json["entryId"], entry_id.to_string());

    // Entry resolved, correction durably recorded
    assert!(leadhunt_vet::db::review::list(&state.db).await.unwrap().is_empty());
    let corrections = leadhunt_vet::db::corrections::list_for_entry(&state.db, entry_id)
        .await
        .unwrap();
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0].0.corrected.company_name, "Acme Corporation GmbH");
}
