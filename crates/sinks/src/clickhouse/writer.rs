//! ClickHouse HTTP bulk writer
//!
//! One POST per bulk write: the body is the newline-joined `JSONEachRow`
//! rows, the statement and insert settings travel as query parameters.

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};

use super::config::ClickHouseConfig;
use crate::{BatchWriter, SinkError};

/// `BatchWriter` for one ClickHouse table
pub struct ClickHouseWriter {
    name: String,
    config: ClickHouseConfig,
    client: reqwest::Client,
}

impl ClickHouseWriter {
    /// Create a writer named after the storage it serves
    ///
    /// # Errors
    ///
    /// Fails if the table is missing or the HTTP client cannot be built.
    pub fn new(name: impl Into<String>, config: ClickHouseConfig) -> Result<Self, SinkError> {
        if config.table.is_empty() {
            return Err(SinkError::config("table is required"));
        }
        if config.retry_attempts == 0 {
            return Err(SinkError::config("retry_attempts must be at least 1"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.connection_timeout)
            .build()
            .map_err(|e| SinkError::init(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            config,
            client,
        })
    }

    /// Writer configuration
    #[inline]
    pub fn config(&self) -> &ClickHouseConfig {
        &self.config
    }

    /// Query parameters sent with every insert
    pub fn query_params(&self) -> Vec<(&str, &str)> {
        let mut params = Vec::with_capacity(self.config.settings.len() + 2);
        params.push(("database", self.config.database.as_str()));
        params.extend(
            self.config
                .settings
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        params
    }

    /// Join rows into one `JSONEachRow` body
    pub fn encode_body(rows: &[Bytes]) -> Bytes {
        let size = rows.iter().map(|r| r.len() + 1).sum();
        let mut body = BytesMut::with_capacity(size);
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                body.put_u8(b'\n');
            }
            body.put_slice(row);
        }
        body.freeze()
    }
}

#[async_trait]
impl BatchWriter for ClickHouseWriter {
    async fn write(&self, rows: Vec<Bytes>) -> Result<(), SinkError> {
        if rows.is_empty() {
            return Ok(());
        }

        let body = Self::encode_body(&rows);
        let query = self.config.insert_query();
        let params = self.query_params();

        let mut last_error = None;
        for attempt in 0..self.config.retry_attempts {
            let mut request = self
                .client
                .post(&self.config.url)
                .query(&params)
                .query(&[("query", query.as_str())]);

            if let Some(ref username) = self.config.username {
                request = request.basic_auth(username, self.config.password.as_ref());
            }

            let result = request
                .header("Content-Type", "application/x-ndjson")
                .body(body.clone())
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    let message = format!("HTTP {status}: {}", text.trim());

                    if status.is_client_error() {
                        return Err(SinkError::write(message));
                    }
                    tracing::warn!(
                        table = %self.config.table,
                        attempt,
                        error = %message,
                        "ClickHouse insert failed"
                    );
                    last_error = Some(message);
                }
                Err(e) => {
                    tracing::warn!(
                        table = %self.config.table,
                        attempt,
                        error = %e,
                        "ClickHouse request failed"
                    );
                    last_error = Some(e.to_string());
                }
            }

            if attempt + 1 < self.config.retry_attempts {
                tokio::time::sleep(self.config.backoff(attempt)).await;
            }
        }

        Err(SinkError::write(format!(
            "insert into {} failed after {} attempts: {}",
            self.config.table,
            self.config.retry_attempts,
            last_error.unwrap_or_else(|| "unknown error".to_string())
        )))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
