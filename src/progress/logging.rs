//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::PipelineStarted { directory } => {
                info!(dir = %directory, "Starting pipeline");
            }
            ProgressEvent::StageStarted { stage } => {
                debug!(stage = %stage, "Starting stage");
            }
            ProgressEvent::StageComplete { stage, duration } => {
                debug!(
                    stage = %stage,
                    duration_ms = duration.as_millis() as u64,
                    "Stage complete"
                );
            }
            ProgressEvent::PipelineComplete {
                directory,
                outcome,
                total_time,
            } => {
                info!(
                    dir = %directory,
                    outcome = %outcome,
                    total_time_ms = total_time.as_millis() as u64,
                    "Pipeline complete"
                );
            }
            ProgressEvent::DispatchComplete {
                directories,
                total_time,
            } => {
                info!(
                    directories,
                    total_time_ms = total_time.as_millis() as u64,
                    "Dispatch complete"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_logging_all_events() {
        let handler = LoggingHandler;

        // All event types must be loggable without panicking
        let events = vec![
            ProgressEvent::PipelineStarted {
                directory: "/test".to_string(),
            },
            ProgressEvent::StageStarted {
                stage: "build".to_string(),
            },
            ProgressEvent::StageComplete {
                stage: "build".to_string(),
                duration: Duration::from_millis(10),
            },
            ProgressEvent::PipelineComplete {
                directory: "/test".to_string(),
                outcome: "success".to_string(),
                total_time: Duration::from_secs(2),
            },
            ProgressEvent::DispatchComplete {
                directories: 4,
                total_time: Duration::from_secs(9),
            },
        ];

        for event in events {
            handler.on_progress(&event);
        }
    }
}
