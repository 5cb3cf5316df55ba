//! In-memory stand-in for the parish REST API, for local runs and e2e tests.
//! Listens on port 8000 by default (override with MOCK_PORT env var) and
//! serves everything under `/api`.
use std::{collections::BTreeMap, sync::Arc};

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde_json::{Value, json};
use tokio::sync::Mutex;

type Store = Arc<Mutex<BTreeMap<String, Vec<Value>>>>;

const FIRST_NAMES: [&str; 8] = [
    "Maria", "Jose", "Ana", "Juan", "Rosa", "Pedro", "Carmen", "Miguel",
];
const LAST_NAMES: [&str; 6] = ["Santos", "Reyes", "Cruz", "Bautista", "Garcia", "Lim"];

fn fixtures() -> BTreeMap<String, Vec<Value>> {
    let mut store = BTreeMap::new();

    let members = (1..=23)
        .map(|i| {
            json!({
                "id": i,
                "first_name": FIRST_NAMES[i % FIRST_NAMES.len()],
                "last_name": LAST_NAMES[i % LAST_NAMES.len()],
                "email": format!("member{i}@parish.example"),
                "phone": format!("0917 555 {i:04}"),
                "joined_on": format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1),
            })
        })
        .collect();
    store.insert("members".to_owned(), members);

    store.insert(
        "priests".to_owned(),
        vec![
            json!({"id": 1, "name": "Fr. Miguel Reyes", "position": "Parish Priest", "ordained_on": "1998-06-20"}),
            json!({"id": 2, "name": "Fr. Antonio Cruz", "position": "Parochial Vicar"}),
            json!({"id": 3, "name": "Msgr. Luis Garcia", "position": "Priest Emeritus", "active": false}),
        ],
    );

    let baptisms = (1..=12)
        .map(|i| {
            json!({
                "id": i,
                "child_name": format!("{} {}", FIRST_NAMES[i % 8], LAST_NAMES[i % 6]),
                "baptism_date": format!("2025-{:02}-06", i % 12 + 1),
                "father_name": format!("{} {}", FIRST_NAMES[(i + 3) % 8], LAST_NAMES[i % 6]),
                "godparents": [format!("{} {}", FIRST_NAMES[(i + 1) % 8], LAST_NAMES[(i + 2) % 6])],
                "priest_name": "Fr. Miguel Reyes",
                "place": "Main Church",
            })
        })
        .collect();
    store.insert("baptisms".to_owned(), baptisms);

    store.insert(
        "marriages".to_owned(),
        vec![json!({
            "id": 1,
            "groom_name": "Juan Santos",
            "bride_name": "Ana Reyes",
            "marriage_date": "2023-02-14",
            "witnesses": ["Pedro Cruz", "Rosa Lim"],
            "priest_name": "Fr. Antonio Cruz",
        })],
    );
    store.insert(
        "confirmations".to_owned(),
        vec![json!({
            "id": 1,
            "candidate_name": "Carmen Bautista",
            "confirmation_date": "2024-11-30",
            "sponsor_name": "Maria Garcia",
        })],
    );

    let appointment_statuses = ["pending", "confirmed", "completed", "cancelled"];
    let appointments = (1..=9)
        .map(|i| {
            let title = if i % 2 == 0 {
                "Wedding interview"
            } else {
                "House blessing"
            };
            json!({
                "id": i,
                "title": title,
                "requested_by": format!("{} {}", FIRST_NAMES[i % 8], LAST_NAMES[i % 6]),
                "appointment_date": format!("2026-{:02}-{:02}", i % 12 + 1, i + 10),
                "time": format!("{:02}:00", 8 + i),
                "priest_name": "Fr. Antonio Cruz",
                "status": appointment_statuses[i % 4],
            })
        })
        .collect();
    store.insert("appointments".to_owned(), appointments);

    store.insert(
        "service-requests".to_owned(),
        vec![
            json!({"id": 1, "service_type": "Mass intention", "requested_by": "Rosa Lim", "preferred_date": "2026-01-04", "status": "pending"}),
            json!({"id": 2, "service_type": "Funeral Mass", "requested_by": "Pedro Cruz", "notes": "Family requests choir", "status": "approved"}),
        ],
    );

    let certificate_types = ["baptism", "marriage", "confirmation"];
    let certificate_statuses = ["pending", "approved", "rejected", "released"];
    let certificates = (1..=14)
        .map(|i| {
            json!({
                "id": i,
                "certificate_type": certificate_types[i % 3],
                "requested_by": format!("{} {}", FIRST_NAMES[i % 8], LAST_NAMES[i % 6]),
                "purpose": "School enrollment",
                "requested_on": format!("2025-{:02}-{:02}", i % 12 + 1, i + 1),
                "status": certificate_statuses[i % 4],
            })
        })
        .collect();
    store.insert("certificates".to_owned(), certificates);

    let payment_statuses = ["pending", "paid", "failed", "refunded"];
    let payments = (1..=57)
        .map(|i| {
            let description = if i % 3 == 0 {
                "Baptism fee"
            } else {
                "Mass offering"
            };
            let method = if i % 2 == 0 { "cash" } else { "gcash" };
            json!({
                "id": i,
                "payer_name": format!("{} {}", FIRST_NAMES[i % 8], LAST_NAMES[i % 6]),
                "description": description,
                "amount": 250.0 * (i % 5 + 1) as f64,
                "method": method,
                "reference": format!("OR-{i:05}"),
                "paid_on": format!("2025-{:02}-{:02}", i % 12 + 1, i % 28 + 1),
                "status": payment_statuses[i % 4],
            })
        })
        .collect();
    store.insert("payments".to_owned(), payments);

    store
}

fn id_of(record: &Value) -> String {
    match &record["id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn list(State(store): State<Store>, Path(resource): Path<String>) -> Response {
    match store.lock().await.get(&resource) {
        Some(records) => Json(json!({ "data": records })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create(
    State(store): State<Store>,
    Path(resource): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    let mut store = store.lock().await;
    let Some(records) = store.get_mut(&resource) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let next = records
        .iter()
        .filter_map(|r| id_of(r).parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        + 1;
    body["id"] = json!(next);
    records.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn show(State(store): State<Store>, Path((resource, id)): Path<(String, String)>) -> Response {
    let store = store.lock().await;
    match store
        .get(&resource)
        .and_then(|records| records.iter().find(|r| id_of(r) == id))
    {
        Some(record) => Json(json!({ "data": record })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn update(
    State(store): State<Store>,
    Path((resource, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut store = store.lock().await;
    let Some(record) = store
        .get_mut(&resource)
        .and_then(|records| records.iter_mut().find(|r| id_of(r) == id))
    else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let (Value::Object(record), Value::Object(changes)) = (record, body) {
        record.extend(changes);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn remove(
    State(store): State<Store>,
    Path((resource, id)): Path<(String, String)>,
) -> Response {
    let mut store = store.lock().await;
    let Some(records) = store.get_mut(&resource) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let before = records.len();
    records.retain(|r| id_of(r) != id);
    if records.len() == before {
        StatusCode::NOT_FOUND.into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

#[tokio::main]
async fn main() {
    let port: u16 = std::env::var("MOCK_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let store: Store = Arc::new(Mutex::new(fixtures()));
    let app = Router::new()
        .route("/api/{resource}", get(list).post(create))
        .route(
            "/api/{resource}/{id}",
            get(show).patch(update).delete(remove),
        )
        .with_state(store);

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    eprintln!("mock_backend listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
