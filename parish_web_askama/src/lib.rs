mod pages;
pub mod tables;

use askama::Template;
use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Request, StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use parish_core::{BackendError, Context};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tracing::{error, warn};

use crate::pages::{
    appointments::{appointments_page, appointments_page_post},
    certificates::{certificates_page, certificates_page_post},
    directory::{directory_page, directory_page_post, member_create_post},
    index::index_page,
    payments::{payment_page, payments_page, payments_page_post},
    sacraments::{sacraments_page, sacraments_page_post},
    service_requests::{service_requests_page, service_requests_page_post},
};

pub fn router(context: Context) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/directory", get(directory_page).post(directory_page_post))
        .route(
            "/directory/members",
            axum::routing::post(member_create_post),
        )
        .route(
            "/sacraments/{kind}",
            get(sacraments_page).post(sacraments_page_post),
        )
        .route(
            "/appointments",
            get(appointments_page).post(appointments_page_post),
        )
        .route(
            "/service-requests",
            get(service_requests_page).post(service_requests_page_post),
        )
        .route(
            "/certificates",
            get(certificates_page).post(certificates_page_post),
        )
        .route("/payments", get(payments_page).post(payments_page_post))
        .route("/payments/{id}", get(payment_page))
        .nest_service(
            "/assets",
            ServiceBuilder::new()
                .layer(middleware::from_fn(set_static_cache_control))
                .service(ServeDir::new("assets")),
        )
        .fallback(not_found)
        .with_state(context)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn set_static_cache_control(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("must-revalidate"),
    );
    response
}

/// Shared by every full page template.
pub trait Page {
    fn build_date(&self) -> &'static str {
        env!("DATE")
    }

    fn section(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Could not render template: {0}")]
    Render(#[from] askama::Error),
    #[error("Backend error: {0:#}")]
    Backend(anyhow::Error),
    #[error("{0}")]
    BadRequest(String),
    #[error("Page Not Found")]
    NotFound,
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        if BackendError::is_not_found(&err) {
            AppError::NotFound
        } else {
            AppError::Backend(err)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Debug, Template)]
        #[template(
            source = "<!doctype html><title>{{ status }}</title><h1>{{ status }}</h1><p>{{ message }}</p><p><a href=\"/\">Back to the parish office</a></p>",
            ext = "html"
        )]
        struct Tmpl {
            status: StatusCode,
            message: String,
        }

        let status = match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Backend(ref err) => {
                error!("{err:?}");
                StatusCode::BAD_GATEWAY
            }
            AppError::Render(ref err) => {
                error!("{err:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_client_error() {
            warn!("{status}: {self}");
        }

        let message = match self {
            AppError::Backend(_) => "The parish records service is unavailable.".to_owned(),
            err => err.to_string(),
        };
        let tmpl = Tmpl { status, message };
        if let Ok(body) = tmpl.render() {
            (status, Html(body)).into_response()
        } else {
            (status, "Something went wrong").into_response()
        }
    }
}
