//! HTTP transport backed by reqwest

use super::{AUTH_HEADER, Endpoint, GalleryTransport, REQUEST_ID_HEADER};
use crate::{
    errors::{GalleryError, Result},
    options::GalleryOptions,
    types::{CommentRequest, LoginRequest, LoginResponse, Memory, ReactionRequest, SessionToken},
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

/// Talks to the remote store over HTTP
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport from the gallery options
    pub fn new(options: &GalleryOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| GalleryError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn send(&self, endpoint: Endpoint, request: RequestBuilder) -> Result<Response> {
        let request_id = Uuid::new_v4().to_string();
        debug!(%request_id, %endpoint, "Sending request");

        let response = request
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await
            .map_err(|e| GalleryError::Network(e.to_string()))?;

        let status = response.status();
        debug!(%request_id, %endpoint, status = status.as_u16(), "Received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GalleryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GalleryError::Network(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl GalleryTransport for HttpTransport {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let builder = self.client.post(self.url(Endpoint::Login)).json(request);
        let response = self.send(Endpoint::Login, builder).await?;
        Self::decode(response).await
    }

    async fn fetch_memories(&self, token: &SessionToken) -> Result<Vec<Memory>> {
        let builder = self
            .client
            .get(self.url(Endpoint::Memories))
            .header(AUTH_HEADER, token.as_str());
        let response = self.send(Endpoint::Memories, builder).await?;
        Self::decode(response).await
    }

    async fn post_reaction(&self, token: &SessionToken, request: &ReactionRequest) -> Result<()> {
        let builder = self
            .client
            .post(self.url(Endpoint::Reaction))
            .header(AUTH_HEADER, token.as_str())
            .json(request);
        self.send(Endpoint::Reaction, builder).await?;
        Ok(())
    }

    async fn post_comment(&self, token: &SessionToken, request: &CommentRequest) -> Result<()> {
        let builder = self
            .client
            .post(self.url(Endpoint::Comment))
            .header(AUTH_HEADER, token.as_str())
            .json(request);
        self.send(Endpoint::Comment, builder).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_join_base_and_path() {
        let options = GalleryOptions::builder()
            .base_url("http://127.0.0.1:9000/")
            .build();
        let transport = HttpTransport::new(&options).unwrap();

        assert_eq!(transport.base_url(), "http://127.0.0.1:9000");
        assert_eq!(
            transport.url(Endpoint::Reaction),
            "http://127.0.0.1:9000/api/memories/reaction"
        );
        assert_eq!(
            transport.url(Endpoint::Login),
            "http://127.0.0.1:9000/api/auth/login"
        );
    }
}
