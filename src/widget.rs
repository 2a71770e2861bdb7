//! Widget mounting and the inactivity monitor
//!
//! `WidgetHost` owns at most one mounted `ChatWidget` at a time; mounting
//! while a widget is live hands back the existing instance instead of
//! stacking a second one. The widget wraps the engine in a mutex and runs a
//! background task that polls for the inactivity nudge.

use crate::engine::{ConversationEngine, EngineInput, EngineReply};
use crate::error::Result;
use crate::sink::FlushReason;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How often the monitor task checks the inactivity clock
const MONITOR_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// A mounted chat widget wrapping one conversation engine
pub struct ChatWidget {
    engine: Arc<Mutex<ConversationEngine>>,
    nudges: Mutex<Option<UnboundedReceiver<EngineReply>>>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl ChatWidget {
    fn spawn(engine: ConversationEngine) -> Arc<Self> {
        let engine = Arc::new(Mutex::new(engine));
        let (tx, rx) = mpsc::unbounded_channel();
        let monitor = tokio::spawn(monitor_loop(Arc::clone(&engine), tx));
        Arc::new(Self {
            engine,
            nudges: Mutex::new(Some(rx)),
            monitor: Mutex::new(Some(monitor)),
        })
    }

    /// Feed one host event to the engine
    pub async fn handle(&self, input: EngineInput) -> Result<EngineReply> {
        let mut engine = self.engine.lock().await;
        engine.handle(input).await
    }

    /// Take the stream of unsolicited replies (the inactivity nudge).
    ///
    /// Can be taken once; later calls return `None`.
    pub async fn nudges(&self) -> Option<UnboundedReceiver<EngineReply>> {
        self.nudges.lock().await.take()
    }

    /// Stop the monitor and fire the final best-effort transcript flush
    pub async fn shutdown(&self) {
        if let Some(handle) = self.monitor.lock().await.take() {
            handle.abort();
        }
        let engine = self.engine.lock().await;
        engine.flush_transcript(FlushReason::Unload);
    }
}

async fn monitor_loop(
    engine: Arc<Mutex<ConversationEngine>>,
    tx: UnboundedSender<EngineReply>,
) {
    let mut ticker = tokio::time::interval(MONITOR_POLL_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let nudge = {
            let mut engine = engine.lock().await;
            engine.check_inactivity(Utc::now())
        };
        if let Some(reply) = nudge {
            if tx.send(reply).is_err() {
                // Host dropped the receiver; the flag in the engine still
                // records that the nudge fired
                debug!("inactivity nudge dropped, no receiver");
            }
        }
    }
}

/// Mounts at most one widget at a time
pub struct WidgetHost {
    mounted: Mutex<Option<Arc<ChatWidget>>>,
}

impl WidgetHost {
    pub fn new() -> Self {
        Self {
            mounted: Mutex::new(None),
        }
    }

    /// Mount a widget around the given engine.
    ///
    /// If a widget is already mounted the engine is discarded and the
    /// existing widget is returned.
    pub async fn mount(&self, engine: ConversationEngine) -> Arc<ChatWidget> {
        let mut slot = self.mounted.lock().await;
        if let Some(existing) = slot.as_ref() {
            warn!("widget already mounted, returning existing instance");
            return Arc::clone(existing);
        }
        let widget = ChatWidget::spawn(engine);
        *slot = Some(Arc::clone(&widget));
        widget
    }

    /// Whether a widget is currently mounted
    pub async fn is_mounted(&self) -> bool {
        self.mounted.lock().await.is_some()
    }

    /// Unmount the current widget, if any, shutting it down
    pub async fn unmount(&self) {
        let widget = self.mounted.lock().await.take();
        if let Some(widget) = widget {
            widget.shutdown().await;
        }
    }
}

impl Default for WidgetHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{LeadPayload, LeadSink, TranscriptPayload, TranscriptSink};
    use crate::error::SinkResult;
    use async_trait::async_trait;

    struct NullLeadSink;

    #[async_trait]
    impl LeadSink for NullLeadSink {
        async fn submit(&self, _payload: &LeadPayload) -> SinkResult<()> {
            Ok(())
        }
    }

    struct NullTranscriptSink;

    #[async_trait]
    impl TranscriptSink for NullTranscriptSink {
        async fn flush(&self, _payload: &TranscriptPayload) -> SinkResult<()> {
            Ok(())
        }
    }

    fn engine() -> ConversationEngine {
        ConversationEngine::builder()
            .with_lead_sink(Arc::new(NullLeadSink))
            .with_transcript_sink(Arc::new(NullTranscriptSink))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_mount_returns_existing_widget() {
        let host = WidgetHost::new();
        let first = host.mount(engine()).await;
        let second = host.mount(engine()).await;
        assert!(Arc::ptr_eq(&first, &second));
        host.unmount().await;
    }

    #[tokio::test]
    async fn test_unmount_allows_fresh_mount() {
        let host = WidgetHost::new();
        let first = host.mount(engine()).await;
        host.unmount().await;
        assert!(!host.is_mounted().await);
        let second = host.mount(engine()).await;
        assert!(!Arc::ptr_eq(&first, &second));
        host.unmount().await;
    }

    #[tokio::test]
    async fn test_widget_delegates_to_engine() {
        let host = WidgetHost::new();
        let widget = host.mount(engine()).await;
        let reply = widget.handle(EngineInput::Open).await.unwrap();
        assert!(reply.gate_required);
        host.unmount().await;
    }

    #[tokio::test]
    async fn test_nudge_receiver_taken_once() {
        let host = WidgetHost::new();
        let widget = host.mount(engine()).await;
        assert!(widget.nudges().await.is_some());
        assert!(widget.nudges().await.is_none());
        host.unmount().await;
    }
}
