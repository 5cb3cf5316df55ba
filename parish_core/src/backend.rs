use std::{sync::Arc, time::Duration};

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::records::Resource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Post,
    Patch,
    Delete,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{path} returned {status}")]
    Status { path: String, status: u16 },
    #[error("Invalid backend url {0:?}")]
    InvalidUrl(String),
}

impl BackendError {
    pub fn is_not_found(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<BackendError>(),
            Some(BackendError::Status { status: 404, .. })
        )
    }
}

/// Raw JSON transport to the parish REST API. Paths are relative to the API
/// root, e.g. `members` or `payments/12`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<String>;

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<String>;
}

pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(BackendError::InvalidUrl(base_url).into());
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(token) = token {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .context("backend_token")?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        Ok(Self {
            client: Client::builder()
                .default_headers(headers)
                .timeout(timeout)
                .build()?,
            base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read(path: &str, response: reqwest::Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                path: path.to_owned(),
                status: status.as_u16(),
            }
            .into());
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Transport for RestClient {
    #[instrument(skip(self))]
    async fn get(&self, path: &str) -> Result<String> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::read(path, response).await
    }

    #[instrument(skip(self, body))]
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<String> {
        let url = self.url(path);
        let mut req = match method {
            Method::Post => self.client.post(url),
            Method::Patch => self.client.patch(url),
            Method::Delete => self.client.delete(url),
        };
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        Self::read(path, response).await
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<R> {
    Bare(Vec<R>),
    Envelope { data: Vec<R> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Single<R> {
    Envelope { data: R },
    Bare(R),
}

/// Typed access to the record collections.
#[derive(Clone)]
pub struct Api {
    transport: Arc<dyn Transport>,
}

impl Api {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn list<R: Resource>(&self) -> Result<Vec<R>> {
        let body = self.transport.get(R::PATH).await?;
        let listing: Listing<R> = serde_json::from_str(&body)
            .with_context(|| format!("could not decode {} list", R::NAME))?;
        let records = match listing {
            Listing::Bare(records) => records,
            Listing::Envelope { data } => data,
        };
        debug!("fetched {} {} records", records.len(), R::NAME);
        Ok(records)
    }

    pub async fn get<R: Resource>(&self, id: &str) -> Result<R> {
        let body = self.transport.get(&format!("{}/{id}", R::PATH)).await?;
        let single: Single<R> = serde_json::from_str(&body)
            .with_context(|| format!("could not decode {} {id}", R::NAME))?;
        Ok(match single {
            Single::Envelope { data } => data,
            Single::Bare(record) => record,
        })
    }

    pub async fn create<R: Resource>(&self, body: &impl Serialize) -> Result<()> {
        let body = serde_json::to_value(body)?;
        self.transport
            .send(Method::Post, R::PATH, Some(body))
            .await
            .with_context(|| format!("create {}", R::NAME))?;
        Ok(())
    }

    pub async fn update_status<R: Resource>(&self, id: &str, status: &str) -> Result<()> {
        self.transport
            .send(
                Method::Patch,
                &format!("{}/{id}", R::PATH),
                Some(serde_json::json!({ "status": status })),
            )
            .await
            .with_context(|| format!("update {} {id}", R::NAME))?;
        Ok(())
    }

    pub async fn delete<R: Resource>(&self, id: &str) -> Result<()> {
        self.transport
            .send(Method::Delete, &format!("{}/{id}", R::PATH), None)
            .await
            .with_context(|| format!("delete {} {id}", R::NAME))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::records::{Member, Payment};

    #[derive(Default)]
    struct MockTransport {
        sent: Mutex<Vec<(Method, String, Option<Value>)>>,
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn get(&self, path: &str) -> Result<String> {
            match path {
                "members" => Ok(r#"[{"id": 1, "first_name": "Ana", "last_name": "Lim"}]"#.to_owned()),
                "payments" => Ok(
                    r#"{"data": [{"id": "p1", "payer_name": "Ben", "description": "Stipend", "amount": 1500.0, "status": "paid"}]}"#
                        .to_owned(),
                ),
                "payments/p1" => Ok(
                    r#"{"data": {"id": "p1", "payer_name": "Ben", "description": "Stipend", "amount": 1500.0}}"#
                        .to_owned(),
                ),
                _ => Err(BackendError::Status {
                    path: path.to_owned(),
                    status: 404,
                }
                .into()),
            }
        }

        async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<String> {
            self.sent
                .lock()
                .unwrap()
                .push((method, path.to_owned(), body));
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_list_bare_array() {
        let api = Api::new(Arc::new(MockTransport::default()));
        let members = api.list::<Member>().await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].full_name(), "Ana Lim");
    }

    #[tokio::test]
    async fn test_list_envelope() {
        let api = Api::new(Arc::new(MockTransport::default()));
        let payments = api.list::<Payment>().await.unwrap();
        assert_eq!(payments[0].id, "p1");
        let payment = api.get::<Payment>("p1").await.unwrap();
        assert_eq!(payment.amount, 1500.0);
    }

    #[tokio::test]
    async fn test_not_found() {
        let api = Api::new(Arc::new(MockTransport::default()));
        let err = api.get::<Payment>("missing").await.unwrap_err();
        assert!(BackendError::is_not_found(&err));
    }

    #[tokio::test]
    async fn test_mutations() {
        let transport = Arc::new(MockTransport::default());
        let api = Api::new(transport.clone());
        api.update_status::<Payment>("p1", "paid").await.unwrap();
        api.delete::<Member>("4").await.unwrap();
        let sent = transport.sent.lock().unwrap();
        assert_eq!(
            *sent,
            vec![
                (
                    Method::Patch,
                    "payments/p1".to_owned(),
                    Some(serde_json::json!({"status": "paid"}))
                ),
                (Method::Delete, "members/4".to_owned(), None),
            ]
        );
    }

    #[test]
    fn test_rest_client_rejects_bad_url() {
        assert!(RestClient::new("localhost:8000", None, Duration::from_secs(5)).is_err());
        assert!(RestClient::new("http://localhost:8000/api/", None, Duration::from_secs(5)).is_ok());
    }
}
