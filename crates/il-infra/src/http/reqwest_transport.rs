use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use il_core::ports::{ByteStream, HttpResponse, HttpTransportPort};
use tokio_util::io::StreamReader;
use url::Url;

/// [`HttpTransportPort`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &Url) -> Result<HttpResponse> {
        let response = request
            .send()
            .await
            .with_context(|| format!("request failed: {url}"))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();

        tracing::debug!(%url, status, "HTTP response");

        let body: ByteStream = Box::pin(StreamReader::new(
            response.bytes_stream().map_err(std::io::Error::other),
        ));

        Ok(HttpResponse {
            status,
            headers,
            body: Some(body),
        })
    }
}

#[async_trait]
impl HttpTransportPort for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        self.send(self.client.get(url.clone()), url).await
    }

    async fn head(&self, url: &Url) -> Result<HttpResponse> {
        self.send(self.client.head(url.clone()), url).await
    }
}
