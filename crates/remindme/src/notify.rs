//! Desktop notifications for fired reminders.

use std::{process::Stdio, sync::Arc, time::Duration};

use async_trait::async_trait;
use remindme_core::config::{NotifyBackend, NotifyConfig};
use remindme_scheduler::{DeliverySink, LogSink, Reminder, Result, SchedulerError};
use tokio::process::Command;
use tracing::debug;

/// Pops a desktop notification through the platform's notifier binary:
/// `osascript` on macOS, `notify-send` elsewhere.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    title: String,
    timeout: Duration,
}

impl DesktopNotifier {
    pub fn new(title: impl Into<String>, timeout: Duration) -> Self {
        Self {
            title: title.into(),
            timeout,
        }
    }

    fn failure(&self, reason: String) -> SchedulerError {
        SchedulerError::Delivery {
            sink: self.name().to_string(),
            reason,
        }
    }
}

#[async_trait]
impl DeliverySink for DesktopNotifier {
    fn name(&self) -> &str {
        "desktop"
    }

    async fn deliver(&self, reminder: &Reminder) -> Result<()> {
        let mut cmd = platform_command(&self.title, &reminder.message);
        cmd.stdin(Stdio::null()).kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(self.failure(format!("spawn failed: {e}"))),
            Err(_) => {
                return Err(self.failure(format!(
                    "notifier timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!(
                "notifier exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        debug!(job_id = %reminder.job_id, "desktop notification shown");
        Ok(())
    }
}

#[cfg(target_os = "macos")]
fn platform_command(title: &str, body: &str) -> Command {
    osascript_command(title, body)
}

#[cfg(not(target_os = "macos"))]
fn platform_command(title: &str, body: &str) -> Command {
    notify_send_command(title, body)
}

pub fn notify_send_command(title: &str, body: &str) -> Command {
    let mut cmd = Command::new("notify-send");
    cmd.args(["--app-name", "remindme", "--", title, body]);
    cmd
}

pub fn osascript_command(title: &str, body: &str) -> Command {
    let script = format!(
        "display notification {} with title {}",
        applescript_string(body),
        applescript_string(title)
    );
    let mut cmd = Command::new("osascript");
    cmd.arg("-e").arg(script);
    cmd
}

/// Quote `s` as an AppleScript string literal.
pub fn applescript_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Build the delivery sink selected by `config.backend`.
pub fn sink_for(config: &NotifyConfig) -> Arc<dyn DeliverySink> {
    match config.backend {
        NotifyBackend::Desktop => Arc::new(DesktopNotifier::new(
            config.title.clone(),
            Duration::from_millis(config.timeout_ms),
        )),
        NotifyBackend::Log => Arc::new(LogSink),
    }
}
