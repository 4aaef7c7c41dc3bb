use anyhow::{anyhow, Context};
use reqwest::{Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Thin JSON client for the navdesk-api envelope format
pub struct ApiClient {
    base_url: url::Url,
    http: Client,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = url::Url::parse(base_url).with_context(|| format!("invalid server URL: {}", base_url))?;
        Ok(Self {
            base_url,
            http: Client::new(),
            token: std::env::var("NAVCTL_TOKEN").ok(),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        self.send::<(), T>(Method::GET, path, None).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> anyhow::Result<T> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> anyhow::Result<T> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> anyhow::Result<T> {
        let url = self.base_url.join(path).with_context(|| format!("invalid path: {}", path))?;
        tracing::debug!("{} {}", method, url);

        let mut request = self.http.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.context("request failed")?;
        unwrap_envelope(response).await
    }
}

/// Pull `data` out of a success envelope, or turn an error body into an error
async fn unwrap_envelope<T: DeserializeOwned>(response: Response) -> anyhow::Result<T> {
    let status = response.status();
    let body: Value = response.json().await.context("response was not JSON")?;

    if !status.is_success() {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request failed");
        let details = body
            .get("field_errors")
            .and_then(Value::as_object)
            .map(|fields| {
                fields
                    .iter()
                    .map(|(k, v)| format!("\n  {}: {}", k, v.as_str().unwrap_or_default()))
                    .collect::<String>()
            })
            .unwrap_or_default();
        return Err(anyhow!("{} ({}){}", message, status, details));
    }

    let data = body.get("data").cloned().unwrap_or(Value::Null);
    serde_json::from_value(data).context("unexpected response shape")
}
