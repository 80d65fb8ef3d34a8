//! Defines structures and types for progress reporting.

/// Represents a snapshot of the progress during a long-running operation.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// A description of the current stage (e.g., "Pass 1/3: Inserting Core Entities").
    pub stage_description: String,
    /// Number of items processed in the current stage.
    pub current_item: u64,
    /// Total number of items expected in the current stage (if calculable).
    pub total_items: Option<u64>,
    /// An optional message providing more context (e.g., "Lexicon: test").
    pub message: Option<String>,
}

/// Type alias for the progress callback function.
///
/// The callback receives a `ProgressUpdate` and returns `true` to continue.
/// Returning `false` is currently ignored by callers.
pub type ProgressCallback = Box<dyn FnMut(ProgressUpdate) -> bool + Send + Sync>;

impl ProgressUpdate {
    /// Creates a new progress update for the start of a stage.
    pub fn new_stage(description: String, total_items: Option<u64>) -> Self {
        ProgressUpdate {
            stage_description: description,
            current_item: 0,
            total_items,
            message: None,
        }
    }
}

/// Tracks the current stage and forwards updates to an optional callback.
pub(crate) struct ProgressReporter {
    callback: Option<ProgressCallback>,
    stage: String,
    total: Option<u64>,
    current: u64,
}

impl ProgressReporter {
    pub(crate) fn new(callback: Option<ProgressCallback>) -> Self {
        ProgressReporter {
            callback,
            stage: String::new(),
            total: None,
            current: 0,
        }
    }

    pub(crate) fn begin_stage(&mut self, description: &str, total: u64) {
        self.stage = description.to_string();
        self.total = Some(total);
        self.current = 0;
        if let Some(cb) = self.callback.as_mut() {
            let _ = cb(ProgressUpdate::new_stage(description.to_string(), Some(total)));
        }
    }

    /// Counts one item; the message is only built when someone is listening.
    pub(crate) fn advance(&mut self, message: impl FnOnce() -> String) {
        self.current += 1;
        if let Some(cb) = self.callback.as_mut() {
            let _ = cb(ProgressUpdate {
                stage_description: self.stage.clone(),
                current_item: self.current,
                total_items: self.total,
                message: Some(message()),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_reporter_forwards_updates() {
        let seen: Arc<Mutex<Vec<(String, u64)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressCallback = Box::new(move |update| {
            sink.lock()
                .unwrap()
                .push((update.stage_description, update.current_item));
            true
        });

        let mut reporter = ProgressReporter::new(Some(callback));
        reporter.begin_stage("Pass 1/1", 2);
        reporter.advance(|| "one".to_string());
        reporter.advance(|| "two".to_string());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], ("Pass 1/1".to_string(), 0));
        assert_eq!(seen[2], ("Pass 1/1".to_string(), 2));
    }

    #[test]
    fn test_reporter_without_callback() {
        let mut reporter = ProgressReporter::new(None);
        reporter.begin_stage("Pass", 1);
        reporter.advance(|| unreachable!());
        assert_eq!(reporter.current, 1);
    }
}
