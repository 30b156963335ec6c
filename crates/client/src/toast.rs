//! Transient user feedback.

use ustaz_core::Locale;

/// Shows short-lived success / failure messages to the user.
pub trait Toaster: Send + Sync {
    fn success(&self, title: &str, message: &str);
    fn error(&self, message: &str);
}

/// Shown when the server reports an error without a message.
pub fn generic_error_message(locale: Locale) -> &'static str {
    match locale {
        Locale::Ar => "حدث خطأ ما، يرجى المحاولة مرة أخرى",
        Locale::En => "Something went wrong, please try again",
    }
}

/// Toaster for headless runs: every toast becomes a log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingToaster;

impl Toaster for TracingToaster {
    fn success(&self, title: &str, message: &str) {
        tracing::info!(%title, %message, "Notification");
    }

    fn error(&self, message: &str) {
        tracing::warn!(%message, "Notification error");
    }
}
