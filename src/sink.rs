//! Lead and transcript delivery
//!
//! Two outbound channels leave the engine: lead submissions (awaited, with a
//! visible success or failure reply) and transcript flushes (fire-and-forget
//! via `BestEffort`). Payload field names are camelCase on the wire to match
//! the booking backend.

use crate::error::{SinkError, SinkResult};
use crate::preferences::TravelerPreferences;
use crate::transcript::Turn;
use crate::visitor::Visitor;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A captured lead, shaped for the booking backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub package_name: String,
    pub package_type: String,
    pub duration: String,
    pub group_size: String,
    pub travel_date: String,
    pub budget: String,
    pub accommodation_level: String,
    pub special_requirements: String,
    /// Human-readable conversation summary for the sales team
    pub message: String,
}

/// Why a transcript flush was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushReason {
    LeadSubmitted,
    InactivityTimeout,
    Unload,
}

/// Host-environment details attached to a transcript flush
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMeta {
    /// URL of the page hosting the widget
    pub page: String,
    pub user_agent: String,
    /// Visitor timezone offset in minutes from UTC
    pub timezone_offset: i32,
    pub reason: FlushReason,
}

/// A full conversation record, shaped for the transcript backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptPayload {
    pub visitor: Option<Visitor>,
    pub session_start: DateTime<Utc>,
    pub session_end: DateTime<Utc>,
    pub history: Vec<Turn>,
    pub preferences: TravelerPreferences,
    pub meta: TranscriptMeta,
}

/// Destination for captured leads
#[async_trait]
pub trait LeadSink: Send + Sync {
    /// Deliver a lead. The engine awaits this and reports the outcome.
    async fn submit(&self, payload: &LeadPayload) -> SinkResult<()>;
}

/// Destination for conversation transcripts
#[async_trait]
pub trait TranscriptSink: Send + Sync {
    /// Deliver a transcript. Callers treat failure as non-fatal.
    async fn flush(&self, payload: &TranscriptPayload) -> SinkResult<()>;
}

/// Lead sink that POSTs JSON to a backend endpoint
pub struct HttpLeadSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpLeadSink {
    /// Create a sink posting to `endpoint`
    pub fn new(endpoint: impl Into<String>) -> SinkResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SinkError::Internal(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl LeadSink for HttpLeadSink {
    async fn submit(&self, payload: &LeadPayload) -> SinkResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| SinkError::Connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(endpoint = %self.endpoint, "lead submitted");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Transcript sink that POSTs JSON with an `X-API-Key` header
pub struct HttpTranscriptSink {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpTranscriptSink {
    /// Create a sink posting to `endpoint`, authenticated by `api_key`
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> SinkResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SinkError::Internal(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl TranscriptSink for HttpTranscriptSink {
    async fn flush(&self, payload: &TranscriptPayload) -> SinkResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-Key", &self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| SinkError::Connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(endpoint = %self.endpoint, reason = ?payload.meta.reason, "transcript flushed");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Fire-and-forget dispatch for transcript flushes.
///
/// Each flush runs on a spawned task with zero retries. A failure is logged
/// and dropped; nothing observable happens in the conversation. Duplicate
/// flushes for the same session are accepted, the backend gets no
/// idempotency key.
#[derive(Clone)]
pub struct BestEffort<S: ?Sized> {
    sink: Arc<S>,
}

impl<S: TranscriptSink + ?Sized + 'static> BestEffort<S> {
    /// Wrap a transcript sink
    pub fn new(sink: Arc<S>) -> Self {
        Self { sink }
    }

    /// Flush in the background and return immediately
    pub fn flush(&self, payload: TranscriptPayload) {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(err) = sink.flush(&payload).await {
                warn!(error = %err, reason = ?payload.meta.reason, "transcript flush dropped");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Turn;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_transcript_payload(reason: FlushReason) -> TranscriptPayload {
        TranscriptPayload {
            visitor: None,
            session_start: Utc::now(),
            session_end: Utc::now(),
            history: vec![Turn::user("hello")],
            preferences: TravelerPreferences::new(),
            meta: TranscriptMeta {
                page: "https://example.com/safaris".to_string(),
                user_agent: "test-agent".to_string(),
                timezone_offset: -180,
                reason,
            },
        }
    }

    #[test]
    fn test_lead_payload_wire_format_is_camel_case() {
        let payload = LeadPayload {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: String::new(),
            country: "Uganda".to_string(),
            package_name: "AI Guided Booking Lead".to_string(),
            package_type: "ai-bot".to_string(),
            duration: "5-7 days".to_string(),
            group_size: "2".to_string(),
            travel_date: String::new(),
            budget: "$700-$1000".to_string(),
            accommodation_level: String::new(),
            special_requirements: String::new(),
            message: "summary".to_string(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["firstName"], "Jane");
        assert_eq!(json["lastName"], "Doe");
        assert_eq!(json["packageName"], "AI Guided Booking Lead");
        assert_eq!(json["packageType"], "ai-bot");
        assert_eq!(json["groupSize"], "2");
        assert!(json.get("first_name").is_none());
    }

    #[test]
    fn test_flush_reason_wire_format() {
        assert_eq!(
            serde_json::to_string(&FlushReason::LeadSubmitted).unwrap(),
            "\"lead_submitted\""
        );
        assert_eq!(
            serde_json::to_string(&FlushReason::InactivityTimeout).unwrap(),
            "\"inactivity_timeout\""
        );
        assert_eq!(
            serde_json::to_string(&FlushReason::Unload).unwrap(),
            "\"unload\""
        );
    }

    #[test]
    fn test_transcript_payload_carries_meta() {
        let payload = sample_transcript_payload(FlushReason::InactivityTimeout);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["meta"]["reason"], "inactivity_timeout");
        assert_eq!(json["meta"]["timezoneOffset"], -180);
        assert_eq!(json["meta"]["userAgent"], "test-agent");
        assert_eq!(json["history"].as_array().unwrap().len(), 1);
    }

    struct RecordingSink {
        flushes: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TranscriptSink for RecordingSink {
        async fn flush(&self, _payload: &TranscriptPayload) -> SinkResult<()> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SinkError::Connection("refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_best_effort_delivers_in_background() {
        let sink = Arc::new(RecordingSink {
            flushes: AtomicUsize::new(0),
            fail: false,
        });
        let best_effort = BestEffort::new(Arc::clone(&sink));

        best_effort.flush(sample_transcript_payload(FlushReason::Unload));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(sink.flushes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failures() {
        let sink = Arc::new(RecordingSink {
            flushes: AtomicUsize::new(0),
            fail: true,
        });
        let best_effort = BestEffort::new(Arc::clone(&sink));

        // No panic, no observable error
        best_effort.flush(sample_transcript_payload(FlushReason::Unload));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(sink.flushes.load(Ordering::SeqCst), 1);
    }
}
