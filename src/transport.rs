use crate::controller::dto::MessageResponse;
use crate::error::{Error, Result};
use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request, StatusCode, Uri};

#[async_trait]
pub trait BrokerTransport: Send + Sync {
    /// Delivers one message; `Ok` only when the broker acknowledged it.
    async fn send(&self, endpoint: &str, message: &str) -> Result<()>;

    /// Asks for the head message; `Ok(None)` when the queue is empty.
    async fn receive(&self, endpoint: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client<HttpConnector>,
}

impl HttpTransport {
    pub fn new() -> Self {
        HttpTransport {
            client: Client::new(),
        }
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Uri> {
    endpoint
        .parse::<Uri>()
        .map_err(|e| Error::InvalidEndpoint(format!("{endpoint}: {e}")))
}

#[async_trait]
impl BrokerTransport for HttpTransport {
    async fn send(&self, endpoint: &str, message: &str) -> Result<()> {
        let payload = serde_json::to_string(message)?;

        let req = Request::builder()
            .method(Method::POST)
            .uri(parse_endpoint(endpoint)?)
            .header(hyper::header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload))
            .map_err(|e| Error::InvalidEndpoint(e.to_string()))?;

        let resp = self.client.request(req).await?;
        let status = resp.status();
        hyper::body::to_bytes(resp.into_body()).await?;

        if !status.is_success() {
            return Err(Error::Status(status));
        }

        Ok(())
    }

    async fn receive(&self, endpoint: &str) -> Result<Option<String>> {
        let resp = self.client.get(parse_endpoint(endpoint)?).await?;
        let status = resp.status();
        let body = hyper::body::to_bytes(resp.into_body()).await?;

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::Status(status));
        }

        let text = String::from_utf8_lossy(&body);
        if text.trim().is_empty() {
            return Ok(None);
        }

        let resp_body: MessageResponse = serde_json::from_str(&text)?;
        Ok(Some(resp_body.message))
    }
}
