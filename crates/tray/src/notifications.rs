// Desktop notifications for tray failures

use notify_rust::{Notification, Timeout};
use tracing::warn;

/// Show a notification for a failed tray action
pub fn show_error_notification(summary: &str, error: &str) {
    if let Err(e) = Notification::new()
        .summary(summary)
        .body(error)
        .icon("dialog-error")
        .timeout(Timeout::Milliseconds(10000))
        .show()
    {
        warn!("Failed to show notification: {}", e);
    }
}

/// Show the router list summary on a tray click
pub fn show_status_notification(body: &str) {
    if let Err(e) = Notification::new()
        .summary("Router Tray")
        .body(body)
        .icon("network-wired")
        .timeout(Timeout::Milliseconds(3000))
        .show()
    {
        warn!("Failed to show notification: {}", e);
    }
}
