use docstamp_core::ports::FeedbackPort;

/// Feedback sink for headless shells: user-facing messages become log lines.
#[derive(Debug, Clone, Default)]
pub struct TracingFeedback;

impl FeedbackPort for TracingFeedback {
    fn notify_error(&self, message: &str) {
        tracing::error!(target: "docstamp::feedback", "{message}");
    }
}
