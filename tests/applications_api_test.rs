use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use careers_backend::{
    config::{Config, StorageBackend},
    router,
    storage::memory::MemoryStore,
    AppState,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

const BOUNDARY: &str = "----careers-test-boundary";

fn test_app() -> Router {
    let config = Config {
        server_address: "127.0.0.1:0".to_string(),
        storage_backend: StorageBackend::Memory,
        database_url: None,
        imgbb_api_key: "test-key".to_string(),
        imgbb_endpoint: "https://api.imgbb.com/1/upload".to_string(),
        mail_relay_url: None,
        mail_from: None,
        hr_email: "hr@example.com".to_string(),
    };
    router(AppState::new(config, Arc::new(MemoryStore::new())))
}

fn multipart_body(fields: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    body
}

fn submission_fields<'a>(email: &'a str, position: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("firstName", "Sara"),
        ("lastName", "Ahmed"),
        ("email", email),
        ("phone", "+966500000000"),
        ("position", position),
        ("nationality", "Saudi"),
        ("nationalId", "1234567890"),
        ("workAuthorization", "citizen"),
        ("backgroundCheck", "true"),
        ("drugTest", "false"),
    ]
}

fn submit_request(fields: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/applications")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(fields)))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn submit(app: &Router, email: &str, position: &str) -> String {
    let resp = app
        .clone()
        .oneshot(submit_request(&submission_fields(email, position)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["success"], json!(true));
    body["applicationId"].as_str().expect("applicationId").to_string()
}

#[tokio::test]
async fn submit_then_duplicate_email_is_rejected() {
    let app = test_app();

    let mut fields = submission_fields("a@x.com", "Software Engineer");
    fields.push((
        "workExperience",
        r#"[{"company":"Acme","position":"Developer","startDate":"2019-02-01","current":true,"description":"Backend work"},{"company":"","position":"ignored"}]"#,
    ));
    fields.push((
        "education",
        r#"[{"institution":"KSU","degree":"BSc","field":"CS","graduationYear":"2018","gpa":4.5}]"#,
    ));
    fields.push(("skills", r#"["Rust","SQL","  "]"#));

    let resp = app.clone().oneshot(submit_request(&fields)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    let id = body["applicationId"].as_str().expect("applicationId");

    // Identical email again.
    let resp = app.clone().oneshot(submit_request(&fields)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["error"].is_string());

    // The stored record kept the cleaned-up nested collections.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/applications/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let application = &body["application"];
    assert_eq!(application["status"], json!("pending"));
    assert_eq!(application["createdAt"], application["updatedAt"]);
    assert_eq!(application["workExperience"].as_array().unwrap().len(), 1);
    assert_eq!(
        application["workExperience"][0]["company"],
        json!("Acme")
    );
    assert_eq!(application["education"][0]["graduationYear"], json!(2018));
    assert_eq!(
        application["skills"],
        json!(["Rust", "SQL"])
    );
}

#[tokio::test]
async fn missing_required_fields_are_rejected() {
    let app = test_app();

    let fields = vec![("firstName", "Sara"), ("email", "sara@example.com")];
    let resp = app.clone().oneshot(submit_request(&fields)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body_json(resp).await;
    assert_eq!(body["error"], json!("الحقول المطلوبة مفقودة"));
}

#[tokio::test]
async fn malformed_email_is_rejected() {
    let app = test_app();
    let resp = app
        .clone()
        .oneshot(submit_request(&submission_fields("not-an-email", "Engineer")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_transition_round_trip() {
    let app = test_app();
    let id = submit(&app, "sara@example.com", "Engineer").await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/applications/{}", id))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "status": "accepted" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], json!(true));

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/applications/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["application"]["status"], json!("accepted"));

    // Outside the enum: rejected, record untouched.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/applications/{}", id))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "status": "archived" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/applications/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["application"]["status"], json!("accepted"));
}

#[tokio::test]
async fn update_of_unknown_id_is_not_found() {
    let app = test_app();
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/applications/00000000-0000-0000-0000-000000000000")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "status": "reviewing" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn position_filter_pages_newest_first() {
    let app = test_app();
    for i in 0..12 {
        let email = format!("engineer_{}@example.com", i);
        submit(&app, &email, "Software Engineer").await;
    }
    for i in 0..3 {
        let email = format!("accountant_{}@example.com", i);
        submit(&app, &email, "Accountant").await;
    }

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/applications?position=engineer&limit=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 5);
    for item in items {
        assert!(item["position"].as_str().unwrap().contains("Engineer"));
    }
    // Newest first: the last engineer submitted leads the page.
    assert_eq!(items[0]["email"], json!("engineer_11@example.com"));
    assert_eq!(items[4]["email"], json!("engineer_7@example.com"));

    assert_eq!(body["pageInfo"]["hasMore"], json!(true));
    assert!(body["pageInfo"]["nextCursor"].is_string());
}

#[tokio::test]
async fn unknown_status_filter_is_rejected() {
    let app = test_app();
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/applications?status=bogus")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_then_fetch_is_not_found() {
    let app = test_app();
    let id = submit(&app, "sara@example.com", "Engineer").await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/applications/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/applications/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/applications/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_reflect_the_collection() {
    let app = test_app();
    let mut ids = Vec::new();
    for i in 0..7 {
        let email = format!("candidate_{}@example.com", i);
        ids.push(submit(&app, &email, "Engineer").await);
    }

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/applications/{}", ids[0]))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "status": "interview" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/applications/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;

    assert_eq!(body["total"], json!(7));
    let status_sum: i64 = body["countsByStatus"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["count"].as_i64().unwrap())
        .sum();
    assert_eq!(status_sum, 7);

    let recent = body["recentItems"].as_array().unwrap();
    assert_eq!(recent.len(), 5);
    assert_eq!(recent[0]["email"], json!("candidate_6@example.com"));
}

#[tokio::test]
async fn image_endpoint_rejects_missing_and_non_image_payloads() {
    let app = test_app();

    // No image part at all.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/images")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(&[("expiration", "600")])))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"], json!("لم يتم تحديد صورة"));

    // A text attachment masquerading as an image.
    let mut body_str = String::new();
    body_str.push_str(&format!(
        "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"notes.txt\"\r\nContent-Type: text/plain\r\n\r\nhello\r\n",
        BOUNDARY
    ));
    body_str.push_str(&format!("--{}--\r\n", BOUNDARY));

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/images")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body_str))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
