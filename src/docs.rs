use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::jwt::TOKEN_COOKIE;
use crate::{models, routes};

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::auth::signup_admin,
		routes::auth::admin_login,
		routes::auth::student_login,
		routes::auth::advisor_login,
		routes::auth::logout,
		routes::departments::list_departments,
		routes::departments::create_department,
		routes::departments::get_department,
		routes::departments::update_department,
		routes::departments::delete_department,
		routes::batches::list_batches,
		routes::batches::create_batch,
		routes::batches::get_batch,
		routes::batches::update_batch,
		routes::batches::delete_batch,
		routes::course_advisors::my_profile,
		routes::course_advisors::list_course_advisors,
		routes::course_advisors::create_course_advisor,
		routes::course_advisors::get_course_advisor,
		routes::course_advisors::update_course_advisor,
		routes::course_advisors::delete_course_advisor,
		routes::students::my_profile,
		routes::students::list_students,
		routes::students::create_student,
		routes::students::get_student,
		routes::students::update_student,
		routes::students::delete_student,
		routes::students::upload_cv,
		routes::students::delete_cv,
		routes::students::download_cv,
		routes::students::open_cv,
		routes::internships::list_internships,
		routes::internships::create_internship,
		routes::internships::students_without_internship,
		routes::internships::get_internship,
		routes::internships::update_internship,
		routes::internships::delete_internship,
		routes::internships::get_internship_file,
		routes::internships::delete_internship_file
	),
	components(
		schemas(
			crate::authz::Role,
			routes::health::HealthResponse,
			routes::auth::MessageResponse,
			models::admin::Admin,
			models::admin::LoginRequest,
			models::admin::AdminSignupRequest,
			models::admin::AuthResponse,
			models::admin::AdminSignupResponse,
			models::department::Department,
			models::department::DepartmentCreateRequest,
			models::department::DepartmentUpdateRequest,
			models::batch::Batch,
			models::batch::BatchCreateRequest,
			models::batch::BatchUpdateRequest,
			models::course_advisor::CourseAdvisor,
			models::course_advisor::CourseAdvisorCreateRequest,
			models::course_advisor::CourseAdvisorUpdateRequest,
			models::student::Student,
			models::student::StudentCreateRequest,
			models::student::StudentUpdateRequest,
			models::internship::Internship,
			models::internship::StudentWithoutInternship
		)
	),
	tags(
		(name = "Health", description = "Liveness and database reachability"),
		(name = "Auth", description = "Admin signup, per-role login and logout"),
		(name = "Departments", description = "Department management (admin)"),
		(name = "Batches", description = "Batch management (admin)"),
		(name = "Course advisors", description = "Course advisor accounts"),
		(name = "Students", description = "Student accounts and CVs"),
		(name = "Internships", description = "Internship records, attachments and coverage report")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	ensure_security_components(&mut doc)?;
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

/// Swagger UI at `/docs`, raw document at `/api-docs/openapi.json`.
pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = {
		let doc_json = Arc::clone(&doc_json);
		get(move || {
			let doc_json = Arc::clone(&doc_json);
			async move { Json((*doc_json).clone()) }
		})
	};

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn object_entry<'a>(parent: &'a mut Map<String, Value>, key: &str) -> anyhow::Result<&'a mut Map<String, Value>> {
	parent
		.entry(key.to_string())
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("OpenAPI `{key}` must be an object"))
}

/// The token is accepted either as a bearer header or as the session cookie.
fn ensure_security_components(doc: &mut Value) -> anyhow::Result<()> {
	let root = doc
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("OpenAPI root must be an object"))?;
	let components = object_entry(root, "components")?;
	let schemes = object_entry(components, "securitySchemes")?;

	schemes.insert(
		"bearerAuth".to_string(),
		json!({
			"type": "http",
			"scheme": "bearer",
			"bearerFormat": "JWT"
		}),
	);
	schemes.insert(
		"cookieAuth".to_string(),
		json!({
			"type": "apiKey",
			"in": "cookie",
			"name": TOKEN_COOKIE
		}),
	);

	Ok(())
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = format!("http://localhost:{}", port);

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}
