//! The Notifier port for non-blocking observability.
//!
//! Background-style operations (generate, delete, rebill-copy) report
//! progress and failures through this port instead of propagating errors to
//! the caller that triggered them. Implementations must never be used for
//! control flow.

use serde_json::Value;

/// Observability port used by background operations.
pub trait Notifier: Send + Sync {
    /// Records an informational event.
    fn info(&self, message: &str, data: Value);

    /// Records a failure that should raise an alert.
    fn error_and_notify(&self, message: &str, data: Value);
}

/// Default Notifier backed by the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn info(&self, message: &str, data: Value) {
        tracing::info!(%data, "{message}");
    }

    fn error_and_notify(&self, message: &str, data: Value) {
        tracing::error!(%data, "{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Recording Notifier for assertions in tests.
    #[derive(Default)]
    struct RecordingNotifier {
        errors: Mutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn info(&self, _message: &str, _data: Value) {}

        fn error_and_notify(&self, message: &str, _data: Value) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn test_notifier_is_object_safe() {
        let recorder = RecordingNotifier::default();
        let notifier: &dyn Notifier = &recorder;
        notifier.error_and_notify("generate failed", json!({ "billRunId": "x" }));
        assert_eq!(recorder.errors.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_tracing_notifier_does_not_panic() {
        let notifier = TracingNotifier;
        notifier.info("bill run generated", json!({ "invoiceCount": 3 }));
        notifier.error_and_notify("delete failed", json!({}));
    }
}
