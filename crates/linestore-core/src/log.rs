use std::env;
use std::fs;
use std::path::Path;
use std::process;

use chrono::Local;

const FALLBACK_NAME: &str = "linestore";

/// Who is writing the trace: host name plus a `name[pid]` tag, like `logger -t`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub host: String,
    pub tag: String,
}

impl Identity {
    pub fn new(host: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            tag: tag.into(),
        }
    }

    /// Identity of the running process, looked up once.
    pub fn detect() -> Self {
        let name = env::args()
            .next()
            .and_then(|arg0| {
                Path::new(&arg0)
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
            })
            .filter(|n| (3..=255).contains(&n.chars().count()))
            .unwrap_or_else(|| FALLBACK_NAME.to_string());
        Self::new(host_name(), format!("{name}[{}]", process::id()))
    }
}

fn host_name() -> String {
    env::var("HOSTNAME")
        .ok()
        .or_else(|| fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Append-only, in-memory trace of what a store did.
///
/// Entries are `<time> <host> <tag> <message>` lines. Nothing is ever evicted.
/// Every record is also forwarded to `tracing` at debug level, even when
/// accumulation is disabled.
#[derive(Debug, Clone)]
pub struct EventLog {
    identity: Identity,
    enabled: bool,
    trace: String,
}

impl EventLog {
    pub fn new(identity: Identity, enabled: bool) -> Self {
        Self {
            identity,
            enabled,
            trace: String::new(),
        }
    }

    pub fn record(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::debug!(target: "linestore::events", tag = %self.identity.tag, "{message}");
        if !self.enabled {
            return;
        }
        let now = Local::now().format("%c");
        self.trace.push_str(&format!(
            "{now} {} {} {message}\n",
            self.identity.host, self.identity.tag
        ));
    }

    /// The whole trace as one multi-line string.
    pub fn render(&self) -> &str {
        &self.trace
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(enabled: bool) -> EventLog {
        EventLog::new(Identity::new("box01", "tool[42]"), enabled)
    }

    #[test]
    fn records_are_tagged_lines() {
        let mut l = log(true);
        l.record("first");
        l.record("second");
        let lines: Vec<&str> = l.render().lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" box01 tool[42] first"));
        assert!(lines[1].ends_with(" box01 tool[42] second"));
        assert!(l.render().ends_with('\n'));
    }

    #[test]
    fn disabled_log_stays_empty() {
        let mut l = log(false);
        l.record("ignored");
        assert_eq!(l.render(), "");
        assert!(!l.is_enabled());
    }

    #[test]
    fn detected_tag_has_pid() {
        let id = Identity::detect();
        assert!(id.tag.ends_with(&format!("[{}]", process::id())));
        assert!(!id.host.is_empty());
    }
}
