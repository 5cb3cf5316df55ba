use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use parish_core::{BackendError, Config, Context, Event, Method, Topic, Transport};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::{sync::Mutex, time::timeout};
use tower::ServiceExt as _;

#[derive(Default)]
struct MockBackend {
    fixtures: HashMap<String, Value>,
    fail: bool,
    sent: Mutex<Vec<(Method, String, Option<Value>)>>,
}

impl MockBackend {
    fn with(mut self, path: &str, body: Value) -> Self {
        self.fixtures.insert(path.to_owned(), body);
        self
    }
}

#[async_trait]
impl Transport for MockBackend {
    async fn get(&self, path: &str) -> Result<String> {
        if self.fail {
            anyhow::bail!("connection refused");
        }
        match self.fixtures.get(path) {
            Some(body) => Ok(body.to_string()),
            None => Err(BackendError::Status {
                path: path.to_owned(),
                status: 404,
            }
            .into()),
        }
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<String> {
        self.sent.lock().await.push((method, path.to_owned(), body));
        Ok(String::new())
    }
}

fn members(count: usize) -> Value {
    let members: Vec<Value> = (1..=count)
        .map(|i| {
            json!({
                "id": i,
                "first_name": format!("Member{i:02}"),
                "last_name": "Santos",
            })
        })
        .collect();
    json!({ "data": members })
}

fn payments() -> Value {
    json!([
        {"id": 1, "payer_name": "Maria Santos", "description": "Mass offering", "amount": 500, "status": "paid", "paid_on": "2025-07-06"},
        {"id": 2, "payer_name": "Jose Reyes", "description": "Baptism fee", "amount": 1250.5, "status": "pending"},
        {"id": 3, "payer_name": "Ana Cruz", "description": "Mass offering", "amount": 250, "status": "paid"},
    ])
}

fn default_backend() -> MockBackend {
    MockBackend::default()
        .with("members", members(23))
        .with("priests", json!([{"id": 1, "name": "Fr. Miguel Reyes", "position": "Parish Priest"}]))
        .with("payments", payments())
        .with(
            "payments/2",
            json!({"data": {"id": 2, "payer_name": "Jose Reyes", "description": "Baptism fee", "amount": 1250.5, "reference": "OR-00002", "status": "pending"}}),
        )
        .with(
            "baptisms",
            json!([{"id": 1, "child_name": "Carmen Lim", "baptism_date": "2025-07-06", "godparents": ["Rosa Cruz"]}]),
        )
}

fn setup(backend: MockBackend) -> (Router, Context, Arc<MockBackend>) {
    let backend = Arc::new(backend);
    let context = Context::new(Arc::new(Config::default()), backend.clone());
    (parish_web_askama::router(context.clone()), context, backend)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn post_form(app: &Router, uri: &str, form: &str) -> (StatusCode, Option<String>) {
    let response = app
        .clone()
        .oneshot(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_owned()))
                .unwrap(),
        )
        .await
        .unwrap();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_owned());
    (response.status(), location)
}

#[tokio::test]
async fn test_directory_first_page() {
    let (app, _, _) = setup(default_backend());
    let (status, body) = get(&app, "/directory").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Showing 1 to 10 of 23 entries"));
    assert!(body.contains("Showing 1 to 1 of 1 entries"));
    assert!(body.contains(r#"data-key="page-3""#));
    assert!(body.contains(r#"<span class="prev disabled">"#));
    assert!(body.contains("Member01 Santos"));
    assert!(!body.contains("Member11 Santos"));
}

#[tokio::test]
async fn test_directory_last_page() {
    let (app, _, _) = setup(default_backend());
    let (_, body) = get(&app, "/directory?page=3").await;
    assert!(body.contains("Showing 21 to 23 of 23 entries"));
    assert!(body.contains(r#"<span class="next disabled">"#));
}

#[tokio::test]
async fn test_directory_page_past_the_end_is_clamped() {
    let (app, _, _) = setup(default_backend());
    let (_, body) = get(&app, "/directory?page=9&per_page=25").await;
    assert!(body.contains("Showing 1 to 23 of 23 entries"));
}

#[tokio::test]
async fn test_directory_search_without_results() {
    let (app, _, _) = setup(default_backend());
    let (status, body) = get(&app, "/directory?q=nobody").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Showing 0 to 0 of 0 entries"));
    assert!(body.contains("No members found"));
}

#[tokio::test]
async fn test_payments_filter_and_total() {
    let (app, _, _) = setup(default_backend());
    let (status, body) = get(&app, "/payments?status=paid").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Showing 1 to 2 of 2 entries"));
    assert!(body.contains("₱750.00"));
    assert!(!body.contains("Jose Reyes"));
    assert!(body.contains(r#"<option value="paid" selected>Paid</option>"#));
}

#[tokio::test]
async fn test_payments_sorted_by_amount() {
    let (app, _, _) = setup(default_backend());
    let (_, body) = get(&app, "/payments?sort_by=amount&asc=true").await;
    let ana = body.find("Ana Cruz").unwrap();
    let maria = body.find("Maria Santos").unwrap();
    let jose = body.find("Jose Reyes").unwrap();
    assert!(ana < maria && maria < jose);
}

#[tokio::test]
async fn test_payment_detail_publishes_view() {
    let (app, context, _) = setup(default_backend());
    let mut events = context.events.subscribe(&[Topic::PaymentViewed]);
    let (status, body) = get(&app, "/payments/2").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("OR-00002"));
    assert!(body.contains("₱1,250.50"));

    let event = timeout(Duration::from_secs(1), events.recv()).await.unwrap();
    assert_eq!(event, Some(Event::PaymentViewed { id: "2".to_owned() }));
}

#[tokio::test]
async fn test_missing_payment_is_not_found() {
    let (app, _, _) = setup(default_backend());
    let (status, _) = get(&app, "/payments/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mark_paid_updates_and_redirects() {
    let (app, context, backend) = setup(default_backend());
    let mut events = context.events.subscribe(&[Topic::PaymentUpdated]);
    let (status, location) =
        post_form(&app, "/payments?status=pending", "action=mark-paid&id=2").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/payments?status=pending"));

    let sent = backend.sent.lock().await;
    assert_eq!(
        *sent,
        vec![(
            Method::Patch,
            "payments/2".to_owned(),
            Some(json!({"status": "paid"}))
        )]
    );

    let event = timeout(Duration::from_secs(1), events.recv()).await.unwrap();
    assert_eq!(
        event,
        Some(Event::PaymentUpdated {
            id: "2".to_owned(),
            status: "paid".to_owned(),
        })
    );
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let (app, _, backend) = setup(default_backend());
    let (status, _) = post_form(&app, "/appointments", "action=teleport&id=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(backend.sent.lock().await.is_empty());
}

#[tokio::test]
async fn test_delete_sacrament_records() {
    let (app, _, backend) = setup(default_backend());
    let (status, _) = post_form(&app, "/sacraments/baptisms", "action=delete&id=1").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        *backend.sent.lock().await,
        vec![(Method::Delete, "baptisms/1".to_owned(), None)]
    );
}

#[tokio::test]
async fn test_sacrament_kinds() {
    let (app, _, _) = setup(default_backend());
    let (status, body) = get(&app, "/sacraments/baptisms").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Carmen Lim"));
    assert!(body.contains("Rosa Cruz"));
    assert!(body.contains("July 6, 2025"));

    let (status, _) = get(&app, "/sacraments/funerals").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_member() {
    let (app, context, backend) = setup(default_backend());
    let mut events = context.events.subscribe(&[Topic::RecordCreated]);
    let (status, location) = post_form(
        &app,
        "/directory/members",
        "first_name=Ana&last_name=Lim&email=&phone=0917",
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/directory"));
    assert_eq!(
        *backend.sent.lock().await,
        vec![(
            Method::Post,
            "members".to_owned(),
            Some(json!({"first_name": "Ana", "last_name": "Lim", "phone": "0917"}))
        )]
    );
    let event = timeout(Duration::from_secs(1), events.recv()).await.unwrap();
    assert_eq!(event, Some(Event::RecordCreated { resource: "member" }));

    let (status, _) = post_form(&app, "/directory/members", "first_name=&last_name=Lim").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_backend_failure_is_bad_gateway() {
    let (app, _, _) = setup(MockBackend {
        fail: true,
        ..Default::default()
    });
    let (status, body) = get(&app, "/certificates").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("The parish records service is unavailable."));
    assert!(!body.contains("connection refused"));
}

#[tokio::test]
async fn test_index_lists_activity() {
    let (app, context, _) = setup(default_backend());
    let (_, body) = get(&app, "/").await;
    assert!(body.contains("Nothing has happened yet."));

    context
        .activity
        .push(Event::PaymentUpdated {
            id: "7".to_owned(),
            status: "refunded".to_owned(),
        })
        .await;
    let (_, body) = get(&app, "/").await;
    assert!(body.contains("Payment 7 marked refunded"));
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _, _) = setup(default_backend());
    let (status, body) = get(&app, "/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Page Not Found"));
}
