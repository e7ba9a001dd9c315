//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use roster_core::receipt::Institute;
use roster_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let institute = Institute { name: "Test Institute".into(), address: "Main Road".into() };
  api_router(Arc::new(store), institute)
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  headers: Vec<(header::HeaderName, &str)>,
  body: Option<Value>,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  for (k, v) in headers {
    builder = builder.header(k, v);
  }
  let req = match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  app.clone().oneshot(req).await.unwrap()
}

async fn read_json(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

async fn read_text(resp: Response) -> String {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  String::from_utf8(bytes.to_vec()).unwrap()
}

async fn create_student(app: &Router, name: &str, mobile: &str) -> String {
  let resp = send(
    app,
    "POST",
    "/students",
    vec![],
    Some(json!({
      "name": name,
      "className": "Junior",
      "timing": "6.30 am - 7.30 am",
      "machineNo": 2,
      "mobile": mobile,
      "dateOfJoining": "2024-01-15"
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  read_json(resp).await["id"].as_str().unwrap().to_owned()
}

async fn pay(app: &Router, student: &str, month: &str, amount: u64) -> Response {
  send(
    app,
    "POST",
    "/payments",
    vec![],
    Some(json!({
      "studentId": student,
      "throughMonth": month,
      "amount": amount,
      "paidDate": "2024-03-20",
      "mode": "UPI"
    })),
  )
  .await
}

// ── Students ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn student_crud() {
  let app = app().await;
  let id = create_student(&app, "Asha", "").await;

  let resp = send(&app, "GET", &format!("/students/{id}"), vec![], None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let student = read_json(resp).await;
  assert_eq!(student["monthlyFee"], 450);
  assert_eq!(student["active"], true);

  let resp = send(
    &app,
    "PUT",
    &format!("/students/{id}"),
    vec![],
    Some(json!({
      "name": "Asha K",
      "className": "Senior",
      "timing": "5.00 pm - 6.00 pm",
      "machineNo": 4,
      "dateOfJoining": "2024-01-15",
      "monthlyFee": 500
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let updated = read_json(resp).await;
  assert_eq!(updated["id"], id.as_str());
  assert_eq!(updated["className"], "Senior");

  let resp = send(&app, "GET", "/students?class=Senior", vec![], None).await;
  assert_eq!(read_json(resp).await.as_array().unwrap().len(), 1);
  let resp = send(&app, "GET", "/students?class=Junior", vec![], None).await;
  assert!(read_json(resp).await.as_array().unwrap().is_empty());

  let resp = send(&app, "DELETE", &format!("/students/{id}"), vec![], None).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  let resp = send(&app, "GET", &format!("/students/{id}"), vec![], None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_student_is_400_with_message() {
  let app = app().await;
  let resp = send(
    &app,
    "POST",
    "/students",
    vec![],
    Some(json!({
      "name": "Asha", "className": "Junior", "timing": "6.30 am - 7.30 am",
      "machineNo": 9, "dateOfJoining": "2024-01-15"
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = read_json(resp).await;
  assert_eq!(body["code"], "validation");
  assert_eq!(body["error"], "Machine number must be 1 to 5.");
}

#[tokio::test]
async fn dues_preview() {
  let app = app().await;
  let id = create_student(&app, "Asha", "").await;

  let resp = send(
    &app,
    "GET",
    &format!("/students/{id}/dues?through=2024-03&amount=900"),
    vec![],
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let dues = read_json(resp).await;
  assert_eq!(dues["unpaidMonths"], json!(["2024-01", "2024-02", "2024-03"]));
  assert_eq!(dues["dueAmount"], 1350);
  assert_eq!(dues["coveredMonths"], json!(["2024-01", "2024-02"]));
  assert_eq!(dues["hint"], "This payment covers: January 2024, February 2024");

  let resp = send(&app, "GET", &format!("/students/{id}/dues?through=March"), vec![], None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(read_json(resp).await["code"], "invalid_month");
}

// ── Payments ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn payment_flow_and_error_codes() {
  let app = app().await;
  let id = create_student(&app, "Asha", "9876543210").await;

  let resp = pay(&app, &id, "2024-03", 1350).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let receipt = read_json(resp).await;
  assert_eq!(receipt["totalAmount"], 1350);
  assert_eq!(receipt["monthsCovered"], json!(["2024-01", "2024-02", "2024-03"]));
  assert_eq!(receipt["mode"], "UPI");

  let resp = pay(&app, &id, "2024-03", 450).await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(read_json(resp).await["code"], "nothing_to_pay");

  let resp = pay(&app, &id, "2024-04", 100).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = pay(&app, "missing", "2024-04", 450).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = send(&app, "GET", "/payments?q=R-2024-000001", vec![], None).await;
  assert_eq!(read_json(resp).await.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn receipt_views() {
  let app = app().await;
  let id = create_student(&app, "Asha", "98765 43210").await;
  let payment = read_json(pay(&app, &id, "2024-02", 900).await).await;
  let pid = payment["id"].as_str().unwrap();

  let resp = send(&app, "GET", &format!("/receipts/{pid}"), vec![], None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let doc = read_json(resp).await;
  assert_eq!(doc["feesFor"], json!(["2024-01", "2024-02"]));
  assert_eq!(doc["institute"]["name"], "Test Institute");

  let resp = send(&app, "GET", &format!("/receipts/{pid}/text"), vec![], None).await;
  let text = read_text(resp).await;
  assert!(text.contains("R-2024-000001"));
  assert!(text.contains("Amount paid   ₹ 900"));

  let resp = send(&app, "GET", &format!("/receipts/{pid}/share"), vec![], None).await;
  let share = read_json(resp).await;
  assert!(share["url"].as_str().unwrap().starts_with("https://wa.me/919876543210?text="));

  let resp = send(&app, "GET", "/receipts/nope", vec![], None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(read_json(resp).await["code"], "payment_not_found");
}

// ── Attendance and reports ───────────────────────────────────────────────────

#[tokio::test]
async fn attendance_replace_and_read() {
  let app = app().await;
  let a = create_student(&app, "Asha", "").await;
  let b = create_student(&app, "Bala", "").await;

  let resp = send(
    &app,
    "PUT",
    "/attendance/2024-03-04",
    vec![],
    Some(json!({ a.clone(): "P", b.clone(): "A" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  send(&app, "PUT", "/attendance/2024-03-04", vec![], Some(json!({ b.clone(): "P" }))).await;
  let resp = send(&app, "GET", "/attendance/2024-03-04", vec![], None).await;
  assert_eq!(read_json(resp).await, json!({ b: "P" }));

  let resp = send(&app, "PUT", "/attendance/2024-03-04", vec![], Some(json!({ "ghost": "P" }))).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = send(&app, "GET", "/attendance/04-03-2024", vec![], None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn month_report() {
  let app = app().await;
  let a = create_student(&app, "Asha", "").await;
  create_student(&app, "Bala", "").await;
  pay(&app, &a, "2024-02", 900).await;

  let resp = send(&app, "GET", "/reports/2024-02", vec![], None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let report = read_json(resp).await;
  assert_eq!(report["totalCollected"], 450);
  assert_eq!(report["paidStudents"].as_array().unwrap().len(), 1);
  let dues = report["dues"].as_array().unwrap();
  assert_eq!(dues.len(), 1);
  assert_eq!(dues[0]["student"]["name"], "Bala");
  assert_eq!(dues[0]["dueAmount"], 900);
}

// ── Backup ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn backup_round_trip_with_if_match() {
  let app = app().await;
  create_student(&app, "Asha", "").await;

  let resp = send(&app, "GET", "/backup", vec![], None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let etag = resp.headers()[header::ETAG].to_str().unwrap().to_owned();
  let exported = read_text(resp).await;
  assert!(exported.contains("\n  \"students\""));

  // Matching tag: accepted.
  let resp = send(
    &app,
    "POST",
    "/backup",
    vec![(header::IF_MATCH, etag.as_str())],
    Some(serde_json::from_str(&exported).unwrap()),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers()[header::ETAG].to_str().unwrap(), etag);

  // Record changes; the old tag is now stale.
  create_student(&app, "Bala", "").await;
  let resp = send(
    &app,
    "POST",
    "/backup",
    vec![(header::IF_MATCH, etag.as_str())],
    Some(serde_json::from_str(&exported).unwrap()),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::PRECONDITION_FAILED);
  let resp = send(&app, "GET", "/students", vec![], None).await;
  assert_eq!(read_json(resp).await.as_array().unwrap().len(), 2);

  // No tag: unconditional replace.
  let resp = send(&app, "POST", "/backup", vec![], Some(serde_json::from_str(&exported).unwrap())).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let resp = send(&app, "GET", "/students", vec![], None).await;
  assert_eq!(read_json(resp).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn bad_backup_and_reset() {
  let app = app().await;
  create_student(&app, "Asha", "").await;

  let resp = send(&app, "POST", "/backup", vec![], Some(json!([1, 2]))).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(read_json(resp).await["code"], "invalid_backup");

  let resp = send(&app, "POST", "/reset", vec![], None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let record = read_json(resp).await;
  assert_eq!(record["students"], json!([]));
  assert_eq!(record["counters"]["nextReceiptNumber"], 1);
}

#[tokio::test]
async fn oversized_imported_amounts_stay_bounded() {
  let app = app().await;
  let backup = json!({
    "version": 2,
    "students": [
      {
        "id": "s1", "name": "Asha", "className": "Junior", "timing": "6.30 am - 7.30 am",
        "machineNo": 1, "dateOfJoining": "2024-01-15", "monthlyFee": 450
      },
      {
        "id": "s2", "name": "Bala", "className": "Junior", "timing": "6.30 am - 7.30 am",
        "machineNo": 2, "dateOfJoining": "2024-01-15", "monthlyFee": 1e19
      }
    ],
    "payments": [{
      "id": "p1", "studentId": "s1", "month": "2024-01", "amount": 1e15,
      "paidDateISO": "2024-01-20", "receiptNo": "R-2024-0001"
    }]
  });
  let resp = send(&app, "POST", "/backup", vec![], Some(backup)).await;
  assert_eq!(resp.status(), StatusCode::OK);

  // A legacy lump sum expands to at most a year of months.
  let resp = send(&app, "GET", "/receipts/p1", vec![], None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let fees_for = read_json(resp).await["feesFor"].clone();
  assert_eq!(fees_for.as_array().unwrap().len(), 12);
  assert_eq!(fees_for[11], "2024-12");

  // Fee times months saturates instead of overflowing.
  let resp = send(&app, "GET", "/students/s2/dues?through=2024-03", vec![], None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(read_json(resp).await["dueAmount"], json!(u64::MAX));

  let resp = send(&app, "GET", "/reports/2024-03", vec![], None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let report = read_json(resp).await;
  assert_eq!(report["dues"].as_array().unwrap().len(), 1);
  assert_eq!(report["dues"][0]["student"]["id"], "s2");
  assert_eq!(report["dues"][0]["dueAmount"], json!(u64::MAX));
}
