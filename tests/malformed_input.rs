mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};

use common::{Reply, TestApp};

fn assert_validation_envelope(reply: &Reply) {
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.header("content-type"), Some("application/json"));
    assert!(reply.json()["error"].is_string(), "unexpected body: {:?}", String::from_utf8_lossy(&reply.bytes));
}

async fn post_raw(app: &TestApp, uri: &str, token: &str, content_type: &str, body: &'static str) -> Result<Reply> {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", content_type)
        .body(Body::from(body))?;
    app.send(req).await
}

#[tokio::test]
async fn non_numeric_path_id_is_a_json_400() -> Result<()> {
    let app = TestApp::new().await?;
    let fixture = app.seed().await?;

    let reply = app.get("/api/students/abc", &fixture.admin).await?;
    assert_validation_envelope(&reply);

    let reply = app.get("/api/internships/first/files/evidences", &fixture.admin).await?;
    assert_validation_envelope(&reply);

    Ok(())
}

#[tokio::test]
async fn broken_or_mistyped_json_is_a_json_400() -> Result<()> {
    let app = TestApp::new().await?;
    let fixture = app.seed().await?;

    let reply = post_raw(&app, "/api/departments", &fixture.admin, "application/json", "{not json").await?;
    assert_validation_envelope(&reply);

    // a type mismatch would otherwise surface as 422
    let reply = post_raw(&app, "/api/departments", &fixture.admin, "application/json", r#"{"name": 5}"#).await?;
    assert_validation_envelope(&reply);

    let reply = post_raw(&app, "/api/departments", &fixture.admin, "text/plain", r#"{"name": "Physics"}"#).await?;
    assert_validation_envelope(&reply);

    Ok(())
}

#[tokio::test]
async fn bad_query_and_multipart_requests_are_json_400() -> Result<()> {
    let app = TestApp::new().await?;
    let fixture = app.seed().await?;

    let reply = app.get("/api/internships?batch_id=first", &fixture.admin).await?;
    assert_validation_envelope(&reply);

    let reply = post_raw(
        &app,
        "/api/internships",
        &fixture.students[0].token,
        "application/json",
        r#"{"organization": "Acme"}"#,
    )
    .await?;
    assert_validation_envelope(&reply);

    Ok(())
}
