mod event;
mod sink;

use std::sync::Arc;

pub use event::*;
pub use sink::*;

/// Shared handle to an event sink.
pub type EventSinkHandle = Arc<dyn EventSink>;

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> SyncSummary {
        SyncSummary {
            inserted: 3,
            updated: 1,
            deleted: 2,
            skipped: 0,
            unchanged: 10,
        }
    }

    #[test]
    fn test_null_sink() {
        NullSink.emit(SyncEvent::Progress {
            repo: "core".to_string(),
            stage: SyncStage::Reading,
        });
    }

    #[test]
    fn test_channel_sink() {
        let (sink, rx) = ChannelSink::new();
        sink.emit(SyncEvent::Progress {
            repo: "core".to_string(),
            stage: SyncStage::Parsing { blocks: 12 },
        });
        sink.emit(SyncEvent::Progress {
            repo: "core".to_string(),
            stage: SyncStage::Complete(summary()),
        });

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            SyncEvent::Progress {
                stage: SyncStage::Parsing { blocks: 12 },
                ..
            }
        ));
        assert!(matches!(
            &events[1],
            SyncEvent::Progress {
                stage: SyncStage::Complete(SyncSummary { inserted: 3, .. }),
                ..
            }
        ));
    }

    #[test]
    fn test_channel_sink_receiver_dropped() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.emit(SyncEvent::Failed {
            repo: "core".to_string(),
            message: "orphaned".to_string(),
        });
    }

    #[test]
    fn test_collector_sink() {
        let collector = Arc::new(CollectorSink::default());
        let handle: EventSinkHandle = collector.clone();
        assert!(collector.is_empty());

        handle.emit(SyncEvent::Progress {
            repo: "extra".to_string(),
            stage: SyncStage::Reconciling { records: 40 },
        });
        assert_eq!(collector.len(), 1);
        assert_eq!(collector.events()[0].repo(), "extra");
    }

    #[test]
    fn test_summary_changes() {
        assert_eq!(summary().changes(), 6);
        assert!(!summary().is_noop());
        assert!(SyncSummary::default().is_noop());
    }

    #[test]
    fn test_event_sink_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NullSink>();
        assert_send_sync::<ChannelSink>();
        assert_send_sync::<CollectorSink>();
    }
}
