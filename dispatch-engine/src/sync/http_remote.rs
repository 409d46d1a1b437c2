//! HttpRemoteStore - REST table client + realtime WebSocket
//!
//! REST (PostgREST-style):
//! - `GET  {rest}/{table}?select=*&order=createdAt.desc`
//! - `POST {rest}/{table}` with a JSON array
//! - `PATCH {rest}/{table}?id=eq.{id}` with an [`OrderPatch`]
//!
//! Realtime: one WebSocket per subscription; every text frame is a
//! [`RemoteEvent`] JSON object.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use reqwest::{Client, RequestBuilder, Response};
use shared::message::RemoteEvent;
use shared::order::{Order, OrderPatch};
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

use super::remote::{RemoteError, RemoteStore, Subscription};
use crate::core::RemoteConfig;

/// Buffered push events per subscription
const SUBSCRIPTION_BUFFER: usize = 256;
/// WebSocket keepalive ping interval
const WS_PING_INTERVAL_SECS: u64 = 30;
/// REST request timeout
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct HttpRemoteStore {
    client: Client,
    config: RemoteConfig,
}

impl HttpRemoteStore {
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| RemoteError::Unreachable(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn table_url(&self) -> String {
        format!("{}/{}", self.config.rest_url, self.config.table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    fn realtime_url(&self) -> Result<String, RemoteError> {
        let base = self
            .config
            .realtime_url
            .as_deref()
            .ok_or_else(|| RemoteError::Unreachable("realtime channel not configured".into()))?;
        let sep = if base.contains('?') { '&' } else { '?' };
        Ok(format!(
            "{base}{sep}apikey={}&table={}",
            self.config.api_key, self.config.table
        ))
    }
}

/// Non-2xx → [`RemoteError::Rejected`] carrying status and body
async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list(&self) -> Result<Vec<Order>, RemoteError> {
        let request = self
            .client
            .get(self.table_url())
            .query(&[("select", "*"), ("order", "createdAt.desc")]);
        let response = check_status(self.authorized(request).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn insert(&self, orders: &[Order]) -> Result<(), RemoteError> {
        if orders.is_empty() {
            return Ok(());
        }
        let request = self
            .client
            .post(self.table_url())
            .header("Prefer", "return=minimal")
            .json(orders);
        check_status(self.authorized(request).send().await?).await?;
        Ok(())
    }

    async fn update(&self, id: &str, patch: &OrderPatch) -> Result<(), RemoteError> {
        let request = self
            .client
            .patch(self.table_url())
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(patch);
        check_status(self.authorized(request).send().await?).await?;
        Ok(())
    }

    fn supports_push(&self) -> bool {
        self.config.realtime_url.is_some()
    }

    async fn subscribe(&self) -> Result<Subscription, RemoteError> {
        let url = self.realtime_url()?;
        let (ws, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| RemoteError::Unreachable(format!("WebSocket connection failed: {e}")))?;
        tracing::info!(table = %self.config.table, "Realtime channel connected");

        let (tx, cancel, subscription) = Subscription::channel(SUBSCRIPTION_BUFFER);
        let (mut ws_sink, mut ws_stream) = ws.split();

        tokio::spawn(async move {
            let mut ping_interval =
                tokio::time::interval(Duration::from_secs(WS_PING_INTERVAL_SECS));
            ping_interval.tick().await; // skip immediate tick

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        let _ = ws_sink.close().await;
                        break;
                    }

                    _ = ping_interval.tick() => {
                        if ws_sink.send(Message::Ping(vec![].into())).await.is_err() {
                            tracing::warn!("Realtime ping failed, closing channel");
                            break;
                        }
                    }

                    msg = ws_stream.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => match RemoteEvent::from_json(&text) {
                                Ok(event) => {
                                    if tx.send(event).await.is_err() {
                                        // subscriber gone
                                        break;
                                    }
                                }
                                Err(e) => tracing::warn!("Invalid realtime frame: {e}"),
                            },
                            Some(Ok(Message::Ping(data))) => {
                                let _ = ws_sink.send(Message::Pong(data)).await;
                            }
                            Some(Ok(Message::Close(_))) => {
                                tracing::info!("Realtime channel closed by server");
                                break;
                            }
                            Some(Err(e)) => {
                                tracing::warn!("Realtime channel error: {e}");
                                break;
                            }
                            None => {
                                tracing::info!("Realtime stream ended");
                                break;
                            }
                            _ => {} // Binary, Pong
                        }
                    }
                }
            }
        });

        Ok(subscription)
    }
}
