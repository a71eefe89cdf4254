//! HTTP client for the image counter service.
//!
//! Thin `reqwest` wrapper implementing the engine's [`CounterService`]
//! seam against the service's REST surface, plus the votes-CSV
//! download passthrough. Any non-2xx response becomes a
//! [`ServiceError::Status`] carrying the status code and body text;
//! retries, caching, and timeouts are left to the caller and the
//! `reqwest` client it supplies.

use gallery_engine::{CounterService, CounterUpdate, ImageItem, RemoteOp, ServiceError};

pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Trailing slashes on the base URL are tolerated and stripped.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Use a preconfigured client (timeouts, proxies, headers).
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ServiceError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// `GET /images/export_votes_as_csv` — raw CSV bytes, handed
    /// through for the UI to save; formatting is the server's concern.
    pub async fn export_votes_csv(&self) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .client
            .get(self.url("/images/export_votes_as_csv"))
            .send()
            .await
            .map_err(transport)?;
        let response = Self::check(response).await?;
        let bytes = response.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }
}

fn transport(e: reqwest::Error) -> ServiceError {
    ServiceError::Transport(Box::new(e))
}

impl CounterService for ApiClient {
    async fn fetch_images(&self) -> Result<Vec<ImageItem>, ServiceError> {
        let response = self
            .client
            .get(self.url("/images"))
            .send()
            .await
            .map_err(transport)?;
        let response = Self::check(response).await?;
        response.json::<Vec<ImageItem>>().await.map_err(transport)
    }

    async fn fetch_counters(&self, ids: &[u64]) -> Result<Vec<CounterUpdate>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        // Repeated query params: ids=1&ids=2&…
        let query: Vec<(&str, u64)> = ids.iter().map(|id| ("ids", *id)).collect();
        let response = self
            .client
            .get(self.url("/images/counters"))
            .query(&query)
            .send()
            .await
            .map_err(transport)?;
        let response = Self::check(response).await?;
        response
            .json::<Vec<CounterUpdate>>()
            .await
            .map_err(transport)
    }

    async fn apply_op(&self, op: RemoteOp, image_id: u64) -> Result<(), ServiceError> {
        let url = format!("{}/images/{op}/{image_id}", self.base_url);
        log::debug!("POST {url}");
        let response = self.client.post(&url).send().await.map_err(transport)?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slashes_stripped() {
        let client = ApiClient::new("http://localhost:8000///");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/images"), "http://localhost:8000/images");
    }

    #[test]
    fn test_image_item_parses_server_shape() {
        // The server also sends per-session flags the engine does not
        // model; unknown fields must not break the parse.
        let body = r#"[{
            "image_id": 3,
            "source_url": "https://img.test/3.jpg",
            "likes": 12,
            "dislikes": 4,
            "is_liked": false,
            "is_disliked": true
        }]"#;
        let items: Vec<ImageItem> = serde_json::from_str(body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].image_id, 3);
        assert_eq!((items[0].likes, items[0].dislikes), (12, 4));
    }

    #[test]
    fn test_counter_update_parses() {
        let body = r#"[{"image_id": 1, "likes": 5, "dislikes": 0}]"#;
        let updates: Vec<CounterUpdate> = serde_json::from_str(body).unwrap();
        assert_eq!(updates[0].likes, 5);
    }

    #[test]
    fn test_op_paths() {
        for (op, path) in [
            (RemoteOp::Like, "like"),
            (RemoteOp::Unlike, "unlike"),
            (RemoteOp::Dislike, "dislike"),
            (RemoteOp::Undislike, "undislike"),
        ] {
            assert_eq!(op.to_string(), path);
        }
    }
}
