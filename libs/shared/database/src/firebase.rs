use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Method, Response,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;

use crate::sse::{SseEvent, SseParser};
use crate::store::{RealtimeStore, Snapshot, Subscription};
use crate::tree;
use crate::StoreError;

/// Client for the realtime database REST API (`{url}/{path}.json`).
#[derive(Clone)]
pub struct FirebaseClient {
    client: Client,
    base_url: String,
    auth_token: String,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StreamPayload {
    path: String,
    data: Value,
}

impl FirebaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.firebase_database_url.trim_end_matches('/').to_string(),
            auth_token: config.firebase_auth_token.clone(),
        }
    }

    fn url(&self, segments: &[String]) -> String {
        format!("{}/{}.json", self.base_url, tree::join_path(segments))
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn auth_query(&self) -> Vec<(&'static str, &str)> {
        if self.auth_token.is_empty() {
            Vec::new()
        } else {
            vec![("auth", self.auth_token.as_str())]
        }
    }

    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, StoreError> {
        let segments = tree::split_path(path)?;
        let url = self.url(&segments);
        debug!("Making {} request to {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.get_headers())
            .query(&self.auth_query());

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = check_status(req.send().await?).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&error_text)
        .ok()
        .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(error_text);
    error!("Realtime database error ({}): {}", status, message);

    Err(match status.as_u16() {
        401 | 403 => StoreError::PermissionDenied(message),
        code => StoreError::Api { status: code, message },
    })
}

#[async_trait]
impl RealtimeStore for FirebaseClient {
    async fn read(&self, path: &str) -> Result<Snapshot, StoreError> {
        let value = self.request(Method::GET, path, None).await?;
        Ok(match tree::prune(value) {
            Value::Null => None,
            value => Some(value),
        })
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.request(Method::PUT, path, Some(value)).await?;
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.request(Method::PATCH, path, Some(Value::Object(fields))).await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.request(Method::DELETE, path, None).await?;
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let response = self.request(Method::POST, path, Some(value)).await?;
        let pushed: PushResponse = serde_json::from_value(response)?;
        Ok(pushed.name)
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        let segments = tree::split_path(path)?;
        let url = self.url(&segments);
        info!("Opening realtime stream for {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .query(&self.auth_query())
            .send()
            .await?;
        let response = check_status(response).await?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let watched = tree::join_path(&segments);
        let stream_path = watched.clone();

        let task = tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut parser = SseParser::new();
            let mut mirror = Value::Null;
            let mut delivered: Option<Snapshot> = None;

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!("Realtime stream for {} failed: {}", stream_path, e);
                        let _ = sender.send(Err(StoreError::Stream(e.to_string())));
                        return;
                    }
                };

                for event in parser.feed(&chunk) {
                    match apply_stream_event(&mut mirror, &event) {
                        Ok(StreamControl::Changed) => {
                            let current = match &mirror {
                                Value::Null => None,
                                value => Some(value.clone()),
                            };
                            if delivered.as_ref() == Some(&current) {
                                continue;
                            }
                            if sender.send(Ok(current.clone())).is_err() {
                                return;
                            }
                            delivered = Some(current);
                        }
                        Ok(StreamControl::Idle) => {}
                        Err(e) => {
                            warn!("Realtime stream for {} ended: {}", stream_path, e);
                            let _ = sender.send(Err(e));
                            return;
                        }
                    }
                }
            }

            debug!("Realtime stream for {} closed by server", stream_path);
        });

        Ok(Subscription::new(watched, receiver, task))
    }
}

enum StreamControl {
    Changed,
    Idle,
}

/// Apply one streaming event to the local mirror of the watched node.
fn apply_stream_event(mirror: &mut Value, event: &SseEvent) -> Result<StreamControl, StoreError> {
    match event.event.as_str() {
        "put" => {
            let payload: StreamPayload = serde_json::from_str(&event.data)?;
            let segments = tree::split_path(&payload.path)?;
            tree::set(mirror, &segments, payload.data);
            Ok(StreamControl::Changed)
        }
        "patch" => {
            let payload: StreamPayload = serde_json::from_str(&event.data)?;
            let segments = tree::split_path(&payload.path)?;
            match payload.data {
                Value::Object(fields) => tree::merge(mirror, &segments, fields)?,
                other => tree::set(mirror, &segments, other),
            }
            Ok(StreamControl::Changed)
        }
        "keep-alive" => Ok(StreamControl::Idle),
        "cancel" => Err(StoreError::PermissionDenied(format!("stream cancelled: {}", event.data))),
        "auth_revoked" => Err(StoreError::PermissionDenied("credential expired or revoked".to_string())),
        other => {
            debug!("Ignoring stream event '{}'", other);
            Ok(StreamControl::Idle)
        }
    }
}
