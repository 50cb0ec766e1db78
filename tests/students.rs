mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{pdf, Part, TestApp, PASSWORD, PDF_BYTES};
use internship_portal::files::MAX_ATTACHMENT_BYTES;

async fn stored_hash(app: &TestApp, id: i64) -> Result<String> {
    Ok(sqlx::query_scalar("SELECT password_hash FROM students WHERE id = ?")
        .bind(id)
        .fetch_one(&app.pool)
        .await?)
}

#[tokio::test]
async fn duplicate_registration_number_conflicts_and_keeps_original() -> Result<()> {
    let app = TestApp::new().await?;
    let fixture = app.seed().await?;

    let before = app.get(&format!("/api/students/{}", fixture.students[0].id), &fixture.admin).await?.json();

    let reply = app
        .request(
            "POST",
            "/api/students",
            Some(&fixture.admin),
            Some(json!({
                "login_id": "newcomer",
                "password": PASSWORD,
                "name": "Newcomer",
                "registration_number": "REG/0",
                "batch_id": fixture.batches[0]
            })),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.json()["error"], "Registration number already exists");

    let after = app.get(&format!("/api/students/{}", fixture.students[0].id), &fixture.admin).await?.json();
    assert_eq!(before, after);

    // same through an update
    let reply = app
        .request(
            "PUT",
            &format!("/api/students/{}", fixture.students[1].id),
            Some(&fixture.admin),
            Some(json!({ "registration_number": "REG/0" })),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::CONFLICT);

    Ok(())
}

#[tokio::test]
async fn empty_password_keeps_hash_bit_identical() -> Result<()> {
    let app = TestApp::new().await?;
    let fixture = app.seed().await?;
    let id = fixture.students[0].id;
    let before = stored_hash(&app, id).await?;

    let reply = app
        .request("PUT", &format!("/api/students/{id}"), Some(&fixture.admin), Some(json!({ "password": "", "name": "Renamed" })))
        .await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["name"], "Renamed");
    assert_eq!(stored_hash(&app, id).await?, before);

    let reply = app
        .request("PUT", &format!("/api/students/{id}"), Some(&fixture.students[0].token), Some(json!({ "password": "brand-new-pass" })))
        .await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_ne!(stored_hash(&app, id).await?, before);

    Ok(())
}

#[tokio::test]
async fn student_may_only_touch_its_own_password() -> Result<()> {
    let app = TestApp::new().await?;
    let fixture = app.seed().await?;
    let me = &fixture.students[0];

    let reply = app
        .request("PUT", &format!("/api/students/{}", me.id), Some(&me.token), Some(json!({ "name": "Hacker" })))
        .await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    // identity fields are refused even alongside a password change
    let reply = app
        .request(
            "PUT",
            &format!("/api/students/{}", me.id),
            Some(&me.token),
            Some(json!({ "password": "brand-new-pass", "registration_number": "REG/99" })),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    let reply = app.get("/api/students/me", &me.token).await?;
    assert_eq!(reply.json()["registration_number"], "REG/0");

    let other = fixture.students[1].id;
    let reply = app.get(&format!("/api/students/{other}"), &me.token).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = app
        .request("PUT", &format!("/api/students/{other}"), Some(&me.token), Some(json!({ "password": "stolen-pass" })))
        .await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = app.request("DELETE", &format!("/api/students/{}", me.id), Some(&me.token), None).await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn rejected_cv_upload_keeps_previous_cv() -> Result<()> {
    let app = TestApp::new().await?;
    let fixture = app.seed().await?;
    let me = &fixture.students[0];
    let cv_uri = format!("/api/students/{}/cv", me.id);

    let reply = app.multipart("POST", &cv_uri, &me.token, &[pdf("cv", PDF_BYTES)]).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["has_cv"], true);

    let reply = app
        .multipart(
            "POST",
            &cv_uri,
            &me.token,
            &[Part::File {
                name: "cv",
                filename: "notes.txt",
                mime: "text/plain",
                bytes: b"plain text",
            }],
        )
        .await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = app.get(&format!("{cv_uri}/download"), &me.token).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.bytes, PDF_BYTES);

    // unknown field and missing file are both validation errors
    let reply = app.multipart("POST", &cv_uri, &me.token, &[pdf("resume", PDF_BYTES)]).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    let reply = app.multipart("POST", &cv_uri, &me.token, &[]).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn pdf_cv_opens_inline_and_downloads_as_attachment() -> Result<()> {
    let app = TestApp::new().await?;
    let fixture = app.seed().await?;
    let me = &fixture.students[0];
    let cv_uri = format!("/api/students/{}/cv", me.id);

    app.multipart("POST", &cv_uri, &me.token, &[pdf("cv", PDF_BYTES)]).await?;

    let reply = app.get(&format!("{cv_uri}/open"), &fixture.admin).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.bytes, PDF_BYTES);
    assert_eq!(reply.header("content-type"), Some("application/pdf"));
    assert!(reply.header("content-disposition").unwrap_or_default().starts_with("inline"));

    let reply = app.get(&format!("{cv_uri}/download"), &fixture.advisors[0].token).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.header("content-disposition"),
        Some("attachment; filename=\"document.pdf\"")
    );

    // advisor of another batch cannot see it
    let reply = app.get(&format!("{cv_uri}/open"), &fixture.advisors[1].token).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = app.request("DELETE", &cv_uri, Some(&me.token), None).await?;
    assert_eq!(reply.json()["has_cv"], false);
    let reply = app.get(&format!("{cv_uri}/open"), &me.token).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json()["error"], "CV not found for this student");

    Ok(())
}

#[tokio::test]
async fn admin_cannot_upload_a_cv() -> Result<()> {
    let app = TestApp::new().await?;
    let fixture = app.seed().await?;

    let reply = app
        .multipart("POST", &format!("/api/students/{}/cv", fixture.students[0].id), &fixture.admin, &[pdf("cv", PDF_BYTES)])
        .await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn deleting_a_student_removes_its_internships() -> Result<()> {
    let app = TestApp::new().await?;
    let fixture = app.seed().await?;
    let me = &fixture.students[0];
    app.create_internship(me, "Acme", "2024").await?;

    let reply = app.request("DELETE", &format!("/api/students/{}", me.id), Some(&fixture.admin), None).await?;
    assert_eq!(reply.status, StatusCode::OK);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM internships WHERE student_id = ?")
        .bind(me.id)
        .fetch_one(&app.pool)
        .await?;
    assert_eq!(count, 0);

    Ok(())
}

#[tokio::test]
async fn cv_size_ceiling_is_inclusive() -> Result<()> {
    let app = TestApp::new().await?;
    let fixture = app.seed().await?;
    let me = &fixture.students[0];
    let cv_uri = format!("/api/students/{}/cv", me.id);

    app.multipart("POST", &cv_uri, &me.token, &[pdf("cv", PDF_BYTES)]).await?;

    let oversized = vec![b'x'; MAX_ATTACHMENT_BYTES + 1];
    let reply = app.multipart("POST", &cv_uri, &me.token, &[pdf("cv", &oversized)]).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "File too large. Maximum size is 5 MB");

    let reply = app.get(&format!("{cv_uri}/download"), &me.token).await?;
    assert_eq!(reply.bytes, PDF_BYTES);

    let exact = vec![b'x'; MAX_ATTACHMENT_BYTES];
    let reply = app.multipart("POST", &cv_uri, &me.token, &[pdf("cv", &exact)]).await?;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.json());

    let reply = app.get(&format!("{cv_uri}/download"), &me.token).await?;
    assert_eq!(reply.bytes.len(), MAX_ATTACHMENT_BYTES);

    Ok(())
}
