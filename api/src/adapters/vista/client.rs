//! Vista3 API client implementation

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::domain::entities::{MseInfoRequest, SemdInfo};
use crate::domain::ports::VistaClient;
use crate::error::VistaError;

/// Timeout for a single request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Timeout for each request of a chunked batch
const CHUNK_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

const SEMD_INFO_PATH: &str = "/semd_infoV2";
const MSE_PATH: &str = "/mse";

/// Limits for [`VistaClientImpl::send_requests_in_chunks`]
#[derive(Debug, Clone, Copy)]
pub struct ChunkOptions {
    pub max_concurrent: usize,
    pub max_retries: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            max_retries: 3,
        }
    }
}

/// Implementation of the Vista3 client
pub struct VistaClientImpl {
    http: Client,
    base_url: String,
    chunk_options: ChunkOptions,
}

impl VistaClientImpl {
    pub fn new(base_url: &str) -> Result<Self, VistaError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            chunk_options: ChunkOptions::default(),
        })
    }

    pub fn with_chunk_options(mut self, options: ChunkOptions) -> Self {
        self.chunk_options = options;
        self
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, VistaError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| VistaError::Deserialization(e.to_string()))
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(VistaError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Send one request per item with bounded concurrency
    ///
    /// Timeouts and connection failures are retried up to
    /// `options.max_retries` times. Results keep the order of `items`; an
    /// item that never produced a JSON answer is `None`.
    pub async fn send_requests_in_chunks<T: Serialize + Sync>(
        &self,
        path: &str,
        method: Method,
        items: &[T],
        options: ChunkOptions,
    ) -> Vec<Option<Value>> {
        let semaphore = Semaphore::new(options.max_concurrent.max(1));
        let url = self.api_url(path);

        let requests = items.iter().map(|item| {
            let semaphore = &semaphore;
            let url = &url;
            let method = method.clone();
            async move {
                let _permit = semaphore.acquire().await.ok()?;
                self.send_with_retries(url, method, item, options.max_retries)
                    .await
            }
        });

        join_all(requests).await
    }

    async fn send_with_retries<T: Serialize>(
        &self,
        url: &str,
        method: Method,
        item: &T,
        max_retries: usize,
    ) -> Option<Value> {
        let mut retry = 0;
        loop {
            let result = self
                .http
                .request(method.clone(), url)
                .timeout(CHUNK_REQUEST_TIMEOUT)
                .json(item)
                .send()
                .await;

            match result {
                Ok(response) => {
                    return match self.handle_response::<Value>(response).await {
                        Ok(value) => Some(value),
                        Err(e) => {
                            tracing::warn!(url, error = %e, "Chunked request rejected");
                            None
                        }
                    };
                }
                Err(e) if is_retryable(&e) && retry < max_retries => {
                    retry += 1;
                    tracing::info!(
                        error = %e,
                        "Request failed. Retrying... (retry {}/{})",
                        retry,
                        max_retries
                    );
                }
                Err(e) => {
                    tracing::warn!(url, error = %e, "Chunked request gave up");
                    return None;
                }
            }
        }
    }
}

fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

fn map_send_error(err: reqwest::Error) -> VistaError {
    if err.is_timeout() {
        VistaError::Timeout
    } else {
        VistaError::Request(err)
    }
}

#[async_trait]
impl VistaClient for VistaClientImpl {
    async fn get_semd_info(&self, semd: &SemdInfo) -> Result<SemdInfo, VistaError> {
        let response = self
            .http
            .post(self.api_url(SEMD_INFO_PATH))
            .json(semd)
            .send()
            .await
            .map_err(map_send_error)?;

        self.handle_response(response).await
    }

    async fn get_semd_info_batch(
        &self,
        semds: &[SemdInfo],
    ) -> Result<Vec<Option<SemdInfo>>, VistaError> {
        let responses = self
            .send_requests_in_chunks(SEMD_INFO_PATH, Method::POST, semds, self.chunk_options)
            .await;

        Ok(responses
            .into_iter()
            .map(|response| {
                response.and_then(|value| match serde_json::from_value(value) {
                    Ok(info) => Some(info),
                    Err(e) => {
                        tracing::warn!(error = %e, "Unexpected SEMD info payload");
                        None
                    }
                })
            })
            .collect())
    }

    async fn get_mse_info(&self, request: &MseInfoRequest) -> Result<Value, VistaError> {
        let response = self
            .http
            .get(self.api_url(MSE_PATH))
            .query(request)
            .send()
            .await
            .map_err(map_send_error)?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::Query,
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde::Deserialize;
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    #[derive(Deserialize)]
    struct MseQuery {
        id: i64,
    }

    async fn semd_info(Json(mut semd): Json<SemdInfo>) -> Result<Json<SemdInfo>, StatusCode> {
        if semd.event_id < 0 {
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        semd.error_description = Some(format!("checked {}", semd.event_id));
        Ok(Json(semd))
    }

    async fn mse(Query(query): Query<MseQuery>) -> Json<Value> {
        Json(json!({"id": query.id, "status": "done"}))
    }

    async fn spawn_stub() -> String {
        let app = Router::new()
            .route("/semd_infoV2", post(semd_info))
            .route("/mse", get(mse));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    fn semd(event_id: i64) -> SemdInfo {
        SemdInfo {
            event_id,
            client_id: 1,
            doc_oid: 2,
            template_id: 3,
            semd_name: "Protocol".to_string(),
            semd_code: "PROT".to_string(),
            date_start: "2024-03-15 09:30:00".to_string(),
            person_id: None,
            action_id: None,
            error_description: None,
        }
    }

    #[tokio::test]
    async fn get_semd_info_posts_and_parses() {
        let client = VistaClientImpl::new(&spawn_stub().await).unwrap();
        let info = client.get_semd_info(&semd(42)).await.unwrap();
        assert_eq!(info.event_id, 42);
        assert_eq!(info.error_description.as_deref(), Some("checked 42"));
    }

    #[tokio::test]
    async fn get_mse_info_passes_id_as_query() {
        let client = VistaClientImpl::new(&spawn_stub().await).unwrap();
        let value = client.get_mse_info(&MseInfoRequest { id: 9 }).await.unwrap();
        assert_eq!(value, json!({"id": 9, "status": "done"}));
    }

    #[tokio::test]
    async fn server_error_maps_to_api_error() {
        let client = VistaClientImpl::new(&spawn_stub().await).unwrap();
        let err = client.get_semd_info(&semd(-1)).await.unwrap_err();
        assert!(matches!(err, VistaError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn batch_keeps_order_and_marks_failures() {
        let client = VistaClientImpl::new(&spawn_stub().await)
            .unwrap()
            .with_chunk_options(ChunkOptions {
                max_concurrent: 2,
                max_retries: 1,
            });
        let batch = vec![semd(1), semd(-1), semd(3), semd(4)];

        let results = client.get_semd_info_batch(&batch).await.unwrap();

        let ids: Vec<Option<i64>> = results
            .iter()
            .map(|r| r.as_ref().map(|s| s.event_id))
            .collect();
        assert_eq!(ids, vec![Some(1), None, Some(3), Some(4)]);
    }

    #[tokio::test]
    async fn unreachable_host_gives_up_after_retries() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = VistaClientImpl::new(&format!("http://{}", addr)).unwrap();
        let results = client
            .send_requests_in_chunks(
                SEMD_INFO_PATH,
                Method::POST,
                &[semd(1)],
                ChunkOptions {
                    max_concurrent: 1,
                    max_retries: 2,
                },
            )
            .await;

        assert_eq!(results, vec![None]);
    }

    #[test]
    fn base_url_is_normalized() {
        let client = VistaClientImpl::new("http://vista:5050/").unwrap();
        assert_eq!(client.api_url("/mse"), "http://vista:5050/mse");
    }
}
