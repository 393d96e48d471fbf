use super::create_route;
use crate::modules::context::AppContext;
use crate::modules::progress::ProgressLine;
use crate::modules::account::entity::Encryption;
use crate::modules::settings::cli::Settings;
use poem::http::StatusCode;
use poem::test::{TestClient, TestForm, TestFormField};
use rust_xlsxwriter::Workbook;
use serde_json::{json, Value};
use std::sync::Arc;

fn settings_in(dir: &std::path::Path) -> Settings {
    let mut settings = Settings::new_for_test();
    settings.bulkmailer_root_dir = dir.to_path_buf();
    settings.bulkmailer_accounts = Some(
        r#"[{"address":"first@example.com","secret":"one"},{"email":"second@example.com","pass":"two"}]"#
            .into(),
    );
    settings
}

fn context_in(dir: &std::path::Path) -> Arc<AppContext> {
    Arc::new(AppContext::new(settings_in(dir)).unwrap())
}

/// Both mail servers point at a closed local port, so every connection is refused at once.
fn offline_context_in(dir: &std::path::Path) -> Arc<AppContext> {
    // main() installs the provider at startup; tests bypass main. Ignore "already installed".
    let _ = crate::modules::utils::tls::install_crypto_provider();
    let mut settings = settings_in(dir);
    settings.bulkmailer_smtp_host = "127.0.0.1".into();
    settings.bulkmailer_smtp_port = 1;
    settings.bulkmailer_smtp_encryption = Encryption::None;
    settings.bulkmailer_imap_host = "127.0.0.1".into();
    settings.bulkmailer_imap_port = 1;
    settings.bulkmailer_imap_encryption = Encryption::None;
    Arc::new(AppContext::new(settings).unwrap())
}

fn recipients_workbook(addresses: &[&str]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "email").unwrap();
    for (row, address) in addresses.iter().enumerate() {
        worksheet.write_string(row as u32 + 1, 0, *address).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

fn send_form(names: [&str; 5], spreadsheet: Vec<u8>) -> TestForm {
    let [subject, body, file, address, secret] = names;
    TestForm::new()
        .field(TestFormField::text("Spring update").name(subject))
        .field(TestFormField::text("<p>Hello</p>").name(body))
        .field(
            TestFormField::bytes(spreadsheet)
                .name(file)
                .filename("recipients.xlsx"),
        )
        .field(TestFormField::text("me@example.com").name(address))
        .field(TestFormField::text("app-password").name(secret))
}

const FIELD_NAMES: [&str; 5] = [
    "subject",
    "htmlBody",
    "spreadsheetFile",
    "senderAddress",
    "senderSecret",
];
const LEGACY_FIELD_NAMES: [&str; 5] = ["subject", "body", "file", "senderEmail", "senderPassword"];

async fn body_json(response: poem::test::TestResponse) -> Value {
    let body = response.0.into_body().into_string().await.unwrap();
    serde_json::from_str(&body).unwrap()
}

#[tokio::test]
async fn status_reports_version() {
    let dir = tempfile::tempdir().unwrap();
    let cli = TestClient::new(create_route(context_in(dir.path())));
    let response = cli.get("/api/status").send().await;
    response.assert_status_is_ok();
    let value = body_json(response).await;
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
    assert!(value["uptime_ms"].as_i64().unwrap() >= 0);
}

#[tokio::test]
async fn accounts_are_listed_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let cli = TestClient::new(create_route(context_in(dir.path())));
    let response = cli.get("/api/accounts").send().await;
    response.assert_status_is_ok();
    let value = body_json(response).await;
    assert_eq!(value[0]["address"], "first@example.com");
    assert_eq!(value[1]["address"], "second@example.com");
}

#[tokio::test]
async fn check_bounce_requires_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let cli = TestClient::new(create_route(context_in(dir.path())));
    let response = cli
        .post("/api/check-bounce")
        .body_json(&json!({ "sender_address": "", "sender_secret": "" }))
        .send()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn log_is_not_found_before_first_send() {
    let dir = tempfile::tempdir().unwrap();
    let cli = TestClient::new(create_route(context_in(dir.path())));
    cli.get("/api/log")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn log_returns_appended_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let context = context_in(dir.path());
    context
        .send_log()
        .append(&ProgressLine::success("a@example.com"))
        .await
        .unwrap();
    let cli = TestClient::new(create_route(context));
    let response = cli.get("/api/log").send().await;
    response.assert_status_is_ok();
    let value = body_json(response).await;
    assert!(value["logs"]
        .as_str()
        .unwrap()
        .trim_end()
        .ends_with("[success] a@example.com"));
}

#[tokio::test]
async fn send_without_form_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cli = TestClient::new(create_route(context_in(dir.path())));
    let response = cli
        .post("/api/send-email")
        .content_type("text/plain")
        .body("hello")
        .send()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let cli = TestClient::new(create_route(context_in(dir.path())));
    cli.get("/api/nope")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_accounts_fail_only_the_listing() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings_in(dir.path());
    settings.bulkmailer_accounts = Some("[{broken".into());
    let cli = TestClient::new(create_route(Arc::new(AppContext::new(settings).unwrap())));

    cli.get("/api/accounts")
        .send()
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    cli.get("/api/status").send().await.assert_status_is_ok();
}

#[tokio::test]
async fn unreadable_spreadsheet_streams_single_error_line() {
    let dir = tempfile::tempdir().unwrap();
    let cli = TestClient::new(create_route(context_in(dir.path())));
    let response = cli
        .post("/api/send-email")
        .multipart(send_form(LEGACY_FIELD_NAMES, b"not a workbook".to_vec()))
        .send()
        .await;
    response.assert_status_is_ok();
    let body = response.0.into_body().into_string().await.unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 1, "{body}");
    assert!(lines[0].starts_with("[error] "));
    assert!(!dir.path().join("send-log.txt").exists());
}

#[tokio::test]
async fn missing_form_fields_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cli = TestClient::new(create_route(context_in(dir.path())));
    let form = TestForm::new().field(TestFormField::text("Spring update").name("subject"));
    cli.post("/api/send-email")
        .multipart(form)
        .send()
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_form_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings_in(dir.path());
    settings.bulkmailer_max_request_bytes = 16;
    let cli = TestClient::new(create_route(Arc::new(AppContext::new(settings).unwrap())));
    cli.post("/api/send-email")
        .multipart(send_form(FIELD_NAMES, recipients_workbook(&["a@example.com"])))
        .send()
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn send_streams_outcomes_then_bounce_check() {
    let dir = tempfile::tempdir().unwrap();
    let cli = TestClient::new(create_route(offline_context_in(dir.path())));
    let workbook = recipients_workbook(&["ann@example.com", "bob@example.com"]);
    let response = cli
        .post("/api/send-email")
        .multipart(send_form(FIELD_NAMES, workbook))
        .send()
        .await;
    response.assert_status_is_ok();
    assert_eq!(
        response.0.content_type(),
        Some("text/plain; charset=utf-8")
    );

    let body = response.0.into_body().into_string().await.unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert!(lines[0].starts_with("[failure] ann@example.com: "), "{body}");
    assert!(lines[1].starts_with("[failure] bob@example.com: "), "{body}");
    assert_eq!(lines[2], "[notice] checking for bounces, please wait");
    assert!(lines[3].starts_with("[error] "), "{body}");
    assert_eq!(lines[4], "[notice] all operations complete");
    assert_eq!(lines.len(), 5);

    let log = std::fs::read_to_string(dir.path().join("send-log.txt")).unwrap();
    assert_eq!(log.lines().count(), 2);
    assert!(log.contains("[failure] ann@example.com"));
}
