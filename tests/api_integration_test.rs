mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use common::{BrightnessBackend, FixedBackend, TestApp, gray_jpeg, gray_png, setup_test_app};
use http_body_util::BodyExt;
use mri_report_server::create_app;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "---------------------------mriboundary1234567890";

async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn multipart_body(filename: &str, image: &[u8], fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(image);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_post(body: Vec<u8>, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Signs up and logs in, returning the `Cookie` header value.
async fn login_cookie(app: &Router, username: &str, password: &str) -> String {
    let credentials = format!("username={}&password={}", username, password);

    let response = app
        .clone()
        .oneshot(form_post("/signup", &credentials))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = app
        .clone()
        .oneshot(form_post("/login", &credentials))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(set_cookie.starts_with("mri_session="));
    assert!(set_cookie.contains("HttpOnly"));
    set_cookie.split(';').next().unwrap().to_string()
}

fn app_for(test_app: &TestApp) -> Router {
    create_app(test_app.state.clone())
}

#[tokio::test]
async fn test_protected_page_redirects_to_login() {
    let test_app = setup_test_app(Arc::new(BrightnessBackend)).await;
    let app = app_for(&test_app);

    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = app
        .clone()
        .oneshot(get("/", Some("mri_session=forged.token.value")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = app
        .clone()
        .oneshot(multipart_post(
            multipart_body("scan.png", &gray_png(10, 8, 8), &[]),
            "mri_session=",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(std::fs::read_dir(&test_app.state.config.upload_dir).unwrap().next().is_none());
}

#[tokio::test]
async fn test_public_pages_render() {
    let test_app = setup_test_app(Arc::new(BrightnessBackend)).await;
    let app = app_for(&test_app);

    for uri in ["/login", "/signup"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        let html = body_string(response).await;
        assert!(html.contains("name=\"username\""));
        assert!(html.contains("name=\"password\""));
    }
}

#[tokio::test]
async fn test_login_then_upload_form() {
    let test_app = setup_test_app(Arc::new(BrightnessBackend)).await;
    let app = app_for(&test_app);
    let cookie = login_cookie(&app, "dr_roy", "s3cret").await;

    let response = app.clone().oneshot(get("/", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("enctype=\"multipart/form-data\""));
    assert!(!html.contains("class=\"result\""));
}

#[tokio::test]
async fn test_duplicate_signup_and_bad_login_show_inline_errors() {
    let test_app = setup_test_app(Arc::new(BrightnessBackend)).await;
    let app = app_for(&test_app);
    login_cookie(&app, "admin", "first").await;

    let response = app
        .clone()
        .oneshot(form_post("/signup", "username=admin&password=second"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Username already exists"));

    let response = app
        .clone()
        .oneshot(form_post("/login", "username=admin&password=second"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(body_string(response).await.contains("Invalid username or password"));

    let response = app
        .clone()
        .oneshot(form_post("/signup", "username=&password=x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Username must be 1-64 characters"));
}

#[tokio::test]
async fn test_upload_produces_prediction_and_report() {
    let test_app = setup_test_app(Arc::new(FixedBackend(vec![0.01, 0.03, 0.93, 0.03]))).await;
    let app = app_for(&test_app);
    let cookie = login_cookie(&app, "dr_roy", "s3cret").await;

    let scan = gray_png(128, 64, 64);
    let body = multipart_body(
        "brain scan.png",
        &scan,
        &[
            ("patient_name", "Jane Doe"),
            ("patient_age", "34"),
            ("patient_gender", "F"),
        ],
    );

    let response = app.clone().oneshot(multipart_post(body, &cookie)).await.unwrap();
    let status = response.status();
    let html = body_string(response).await;
    assert_eq!(status, StatusCode::OK, "{}", html);

    assert!(html.contains("No Tumor"));
    assert!(html.contains("93.00%"));
    assert!(html.contains("Jane Doe"));
    assert!(html.contains("/uploads/brain_scan.png"));

    let report_link = html
        .split("/static/reports/")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap()
        .to_string();
    assert!(report_link.starts_with("report_") && report_link.ends_with(".pdf"));

    // Stored upload is served back unchanged
    let response = app
        .clone()
        .oneshot(get("/uploads/brain_scan.png", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let served = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(served.as_ref(), scan.as_slice());

    // Report is downloadable and mentions the diagnosis
    let response = app
        .clone()
        .oneshot(get(&format!("/static/reports/{}", report_link), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    let pdf = response.into_body().collect().await.unwrap().to_bytes();
    let doc = lopdf::Document::load_mem(&pdf).unwrap();
    let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
    let content = String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned();
    assert!(content.contains("Prediction: No Tumor    Confidence: 93.00%"));
    assert!(content.contains("Name: Jane Doe    Age: 34    Gender: F"));
}

#[tokio::test]
async fn test_upload_without_patient_fields_uses_unknown() {
    let test_app = setup_test_app(Arc::new(BrightnessBackend)).await;
    let app = app_for(&test_app);
    let cookie = login_cookie(&app, "dr_roy", "s3cret").await;

    let body = multipart_body("scan.png", &gray_png(217, 32, 32), &[("patient_name", "  ")]);
    let response = app.clone().oneshot(multipart_post(body, &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("Tumor: meningioma"));
    assert!(html.contains("Patient: Unknown"));
}

#[tokio::test]
async fn test_post_without_file_rerenders_form() {
    let test_app = setup_test_app(Arc::new(BrightnessBackend)).await;
    let app = app_for(&test_app);
    let cookie = login_cookie(&app, "dr_roy", "s3cret").await;

    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"patient_name\"\r\n\r\nJane\r\n--{BOUNDARY}--\r\n"
    );
    let response = app
        .clone()
        .oneshot(multipart_post(body.into_bytes(), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("enctype=\"multipart/form-data\""));
    assert!(!html.contains("class=\"result\""));
}

#[tokio::test]
async fn test_truncated_metadata_field_is_rejected() {
    let test_app = setup_test_app(Arc::new(BrightnessBackend)).await;
    let app = app_for(&test_app);
    let cookie = login_cookie(&app, "dr_roy", "s3cret").await;

    // Body ends inside the field, without a closing boundary
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"patient_name\"\r\n\r\nJane"
    );
    let response = app
        .clone()
        .oneshot(multipart_post(body.into_bytes(), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(std::fs::read_dir(&test_app.state.config.report_dir).unwrap().next().is_none());
}

#[tokio::test]
async fn test_upload_without_extension_is_classified() {
    let test_app = setup_test_app(Arc::new(BrightnessBackend)).await;
    let app = app_for(&test_app);
    let cookie = login_cookie(&app, "dr_roy", "s3cret").await;

    let body = multipart_body("scan", &gray_jpeg(153, 32, 32), &[]);
    let response = app.clone().oneshot(multipart_post(body, &cookie)).await.unwrap();
    let status = response.status();
    let html = body_string(response).await;
    assert_eq!(status, StatusCode::OK, "{}", html);
    assert!(html.contains("No Tumor"));

    let response = app.clone().oneshot(get("/uploads/scan", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
}

#[tokio::test]
async fn test_non_image_upload_fails_without_report() {
    let test_app = setup_test_app(Arc::new(BrightnessBackend)).await;
    let app = app_for(&test_app);
    let cookie = login_cookie(&app, "dr_roy", "s3cret").await;

    let body = multipart_body("notes.png", b"plain text, not pixels", &[]);
    let response = app.clone().oneshot(multipart_post(body, &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let reports: Vec<_> = std::fs::read_dir(&test_app.state.config.report_dir)
        .unwrap()
        .collect();
    assert!(reports.is_empty());
}

#[tokio::test]
async fn test_logout_clears_session() {
    let test_app = setup_test_app(Arc::new(BrightnessBackend)).await;
    let app = app_for(&test_app);
    login_cookie(&app, "dr_roy", "s3cret").await;

    let response = app.clone().oneshot(get("/logout", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("mri_session=;"));
    assert!(set_cookie.contains("Max-Age=0"));

    // The browser now sends an empty cookie
    let response = app
        .clone()
        .oneshot(get("/", Some("mri_session=")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_missing_upload_is_not_found() {
    let test_app = setup_test_app(Arc::new(BrightnessBackend)).await;
    let app = app_for(&test_app);

    for uri in ["/uploads/nothing.png", "/uploads/..%2Fusers.db"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn test_report_scratch_files_are_not_served() {
    let test_app = setup_test_app(Arc::new(BrightnessBackend)).await;
    let app = app_for(&test_app);
    let report_dir = &test_app.state.config.report_dir;

    // What a render in progress leaves next to the finished reports
    std::fs::write(report_dir.join("qr_a1b2c3.png"), gray_png(0, 4, 4)).unwrap();
    std::fs::write(report_dir.join(".report_a1b2c3.tmp"), b"%PDF-partial").unwrap();
    std::fs::write(report_dir.join("report_20260314_093000_a1b2c3d4.pdf"), b"%PDF-1.5").unwrap();

    for uri in [
        "/static/reports/qr_a1b2c3.png",
        "/static/reports/.report_a1b2c3.tmp",
        "/static/reports/report_20260101_000000_ffffffff.pdf",
    ] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }

    let response = app
        .clone()
        .oneshot(get("/static/reports/report_20260314_093000_a1b2c3d4.pdf", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "%PDF-1.5");
}

#[tokio::test]
async fn test_health_check() {
    let test_app = setup_test_app(Arc::new(BrightnessBackend)).await;
    let app = app_for(&test_app);

    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "connected");
    assert_eq!(json["model_input_size"], common::INPUT_SIZE);
}
