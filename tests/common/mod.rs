#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt; // for `oneshot`

use internship_portal::create_app;

pub const PASSWORD: &str = "password123";
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\n%%EOF\n";
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const BOUNDARY: &str = "portal-test-boundary";

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    _dir: TempDir,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        mime: &'a str,
        bytes: &'a [u8],
    },
}

pub fn pdf<'a>(name: &'a str, bytes: &'a [u8]) -> Part<'a> {
    Part::File {
        name,
        filename: "document.pdf",
        mime: "application/pdf",
        bytes,
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes());
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                mime,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        // create temp dir and sqlite db
        let dir = tempdir().context("failed to create tempdir")?;
        let opts = SqliteConnectOptions::new()
            .filename(dir.path().join("test.db"))
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(opts).await?;

        // run migrations from crate migrations folder
        let migrator =
            sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
        migrator.run(&pool).await?;

        std::env::set_var("JWT_SECRET", "test-secret");
        let app = create_app(pool.clone()).await?;

        Ok(Self { app, pool, _dir: dir })
    }

    pub async fn send(&self, req: Request<Body>) -> Result<Reply> {
        let resp = self.app.clone().oneshot(req).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?.to_vec();
        Ok(Reply { status, headers, bytes })
    }

    pub async fn request(&self, method: &str, uri: &str, token: Option<&str>, payload: Option<Value>) -> Result<Reply> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match payload {
            Some(payload) => {
                builder = builder.header("content-type", "application/json");
                Body::from(payload.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body)?).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<Reply> {
        self.request("GET", uri, Some(token), None).await
    }

    pub async fn multipart(&self, method: &str, uri: &str, token: &str, parts: &[Part<'_>]) -> Result<Reply> {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(multipart_body(parts)))?;
        self.send(req).await
    }

    /// POST and insist on 201, returning the body.
    pub async fn create(&self, uri: &str, token: &str, payload: Value) -> Result<Value> {
        let reply = self.request("POST", uri, Some(token), Some(payload)).await?;
        if reply.status != StatusCode::CREATED {
            panic!("POST {uri} failed: {} - {}", reply.status, String::from_utf8_lossy(&reply.bytes));
        }
        Ok(reply.json())
    }

    pub async fn signup_admin(&self, login_id: &str) -> Result<String> {
        let reply = self
            .request(
                "POST",
                "/api/signup/admin",
                None,
                Some(json!({ "login_id": login_id, "password": PASSWORD })),
            )
            .await?;
        assert_eq!(reply.status, StatusCode::CREATED, "signup failed: {}", reply.json());
        reply.json()["token"].as_str().map(str::to_string).context("missing token")
    }

    pub async fn login(&self, path: &str, login_id: &str) -> Result<String> {
        let reply = self
            .request("POST", path, None, Some(json!({ "login_id": login_id, "password": PASSWORD })))
            .await?;
        assert_eq!(reply.status, StatusCode::OK, "login failed: {}", reply.json());
        reply.json()["token"].as_str().map(str::to_string).context("missing token")
    }

    /// One department, two batches, a student and an advisor in each batch.
    pub async fn seed(&self) -> Result<Fixture> {
        let admin = self.signup_admin("admin").await?;

        let department = self.create("/api/departments", &admin, json!({ "name": "Computer Science" })).await?;
        let department_id = department["id"].as_i64().context("department id")?;

        let mut batches = Vec::new();
        for (year, name) in [(2023, "MCS 2023"), (2024, "MCS 2024")] {
            let batch = self
                .create("/api/batches", &admin, json!({ "year": year, "name": name, "department_id": department_id }))
                .await?;
            batches.push(batch["id"].as_i64().context("batch id")?);
        }

        let mut students = Vec::new();
        for (i, batch_id) in batches.iter().enumerate() {
            let login_id = format!("student{i}");
            let student = self
                .create(
                    "/api/students",
                    &admin,
                    json!({
                        "login_id": login_id,
                        "password": PASSWORD,
                        "name": format!("Student {i}"),
                        "registration_number": format!("REG/{i}"),
                        "batch_id": batch_id
                    }),
                )
                .await?;
            let token = self.login("/api/student/login", &login_id).await?;
            students.push(Account {
                id: student["id"].as_i64().context("student id")?,
                token,
            });
        }

        let mut advisors = Vec::new();
        for (i, batch_id) in batches.iter().enumerate() {
            let login_id = format!("advisor{i}");
            let advisor = self
                .create(
                    "/api/course-advisors",
                    &admin,
                    json!({ "login_id": login_id, "password": PASSWORD, "name": format!("Advisor {i}"), "batch_id": batch_id }),
                )
                .await?;
            let token = self.login("/api/advisor/login", &login_id).await?;
            advisors.push(Account {
                id: advisor["id"].as_i64().context("advisor id")?,
                token,
            });
        }

        Ok(Fixture {
            admin,
            department_id,
            batches,
            students,
            advisors,
        })
    }

    /// Create an internship as `student` with the required fields.
    pub async fn create_internship(&self, student: &Account, organization: &str, year: &str) -> Result<Value> {
        let reply = self
            .multipart(
                "POST",
                "/api/internships",
                &student.token,
                &[
                    Part::Text("internship_type", "Industrial"),
                    Part::Text("organization", organization),
                    Part::Text("duration", "6 months"),
                    Part::Text("year_of_completion", year),
                ],
            )
            .await?;
        assert_eq!(reply.status, StatusCode::CREATED, "internship create failed: {}", reply.json());
        Ok(reply.json())
    }
}

pub struct Account {
    pub id: i64,
    pub token: String,
}

pub struct Fixture {
    pub admin: String,
    pub department_id: i64,
    pub batches: Vec<i64>,
    pub students: Vec<Account>,
    pub advisors: Vec<Account>,
}
