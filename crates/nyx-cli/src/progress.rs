use std::{sync::Arc, thread::JoinHandle};

use nu_ansi_term::Color::{Cyan, Green, Red};
use nyx_events::{ChannelSink, EventSinkHandle, SyncEvent, SyncStage};
use tracing::{debug, info};

use crate::utils::Colored;

/// Owns the thread draining sync events.
///
/// The [`Synchronizer`](nyx_core::Synchronizer) holding the sink must be
/// dropped before [`finish`](ProgressGuard::finish), otherwise the thread
/// keeps waiting for more events.
pub struct ProgressGuard {
    handle: Option<JoinHandle<()>>,
}

impl ProgressGuard {
    pub fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

pub fn spawn_event_handler() -> (EventSinkHandle, ProgressGuard) {
    let (sink, receiver) = ChannelSink::new();
    let handle = std::thread::spawn(move || {
        for event in receiver {
            handle_event(&event);
        }
    });

    (
        Arc::new(sink),
        ProgressGuard {
            handle: Some(handle),
        },
    )
}

fn handle_event(event: &SyncEvent) {
    let repo = Colored(Cyan, event.repo());
    match event {
        SyncEvent::Progress { stage, .. } => {
            match stage {
                SyncStage::Reading => debug!("[{repo}] Reading snapshot"),
                SyncStage::Parsing { .. } | SyncStage::Reconciling { .. } => {
                    if let Some(message) = describe(stage) {
                        info!("[{repo}] {message}");
                    }
                }
                SyncStage::Complete(summary) if summary.is_noop() => {
                    info!("[{repo}] {}", Colored(Green, "Already up to date"))
                }
                SyncStage::Complete(_) => {
                    if let Some(message) = describe(stage) {
                        info!("[{repo}] {}", Colored(Green, message));
                    }
                }
            }
        }
        SyncEvent::Failed { .. } => debug!("[{repo}] {}", Colored(Red, "Sync rolled back")),
    }
}

fn describe(stage: &SyncStage) -> Option<String> {
    match stage {
        SyncStage::Reading => None,
        SyncStage::Parsing { blocks } => Some(format!("Parsing {blocks} package entries")),
        SyncStage::Reconciling { records } => Some(format!("Reconciling {records} records")),
        SyncStage::Complete(summary) => {
            let mut message = format!(
                "{} added, {} updated, {} removed",
                summary.inserted, summary.updated, summary.deleted
            );
            if summary.skipped > 0 {
                message.push_str(&format!(", {} skipped", summary.skipped));
            }
            Some(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use nyx_events::SyncSummary;

    use super::*;

    #[test]
    fn test_describe_complete() {
        let summary = SyncSummary {
            inserted: 2,
            updated: 1,
            deleted: 0,
            skipped: 3,
            unchanged: 10,
        };
        assert_eq!(
            describe(&SyncStage::Complete(summary)).as_deref(),
            Some("2 added, 1 updated, 0 removed, 3 skipped")
        );

        let summary = SyncSummary {
            skipped: 0,
            ..summary
        };
        assert_eq!(
            describe(&SyncStage::Complete(summary)).as_deref(),
            Some("2 added, 1 updated, 0 removed")
        );
    }

    #[test]
    fn test_handler_drains_until_sink_is_dropped() {
        let (sink, guard) = spawn_event_handler();
        sink.emit(SyncEvent::Progress {
            repo: "core".into(),
            stage: SyncStage::Parsing { blocks: 4 },
        });
        drop(sink);
        guard.finish();
    }
}
