//! Progress handler trait and events

use std::time::Duration;

/// Events emitted while a directory pipeline runs
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A directory's pipeline started
    PipelineStarted { directory: String },

    /// A stage started
    StageStarted { stage: String },

    /// A stage finished and the chain continues
    StageComplete { stage: String, duration: Duration },

    /// A directory's pipeline produced its outcome
    PipelineComplete {
        directory: String,
        outcome: String,
        total_time: Duration,
    },

    /// The dispatcher finished every directory
    DispatchComplete {
        directories: usize,
        total_time: Duration,
    },
}

/// Trait for handling progress events during a run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {
        // Intentionally empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        let handler = NoOpHandler;
        handler.on_progress(&ProgressEvent::PipelineStarted {
            directory: "/test".to_string(),
        });
        // Should not panic or do anything
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::PipelineStarted {
            directory: "/test".to_string(),
        });
        handler.on_progress(&ProgressEvent::StageComplete {
            stage: "build".to_string(),
            duration: Duration::from_millis(50),
        });
        handler.on_progress(&ProgressEvent::DispatchComplete {
            directories: 3,
            total_time: Duration::from_secs(5),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_event_debug() {
        let event = ProgressEvent::StageStarted {
            stage: "link".to_string(),
        };
        let debug_str = format!("{:?}", event);
        assert!(debug_str.contains("StageStarted"));
        assert!(debug_str.contains("link"));
    }
}
