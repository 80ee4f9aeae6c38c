//! Display surface for results and transient notices

use std::fmt;
use std::io::Write;
use tracing::warn;

/// Severity of a transient notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Short-lived, auto-dismissing message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoticeKind::Info => write!(f, "{}", self.message),
            NoticeKind::Error => write!(f, "error: {}", self.message),
        }
    }
}

/// Where the pipeline projects its results
pub trait DisplaySurface: Send + Sync {
    /// Render recognized text, replacing whatever was shown before
    fn show_text(&self, text: &str);

    /// Show a transient notice
    fn notify(&self, notice: Notice);
}

/// Prints results to stdout and notices to stderr
#[derive(Debug, Default)]
pub struct ConsoleDisplay;

impl DisplaySurface for ConsoleDisplay {
    fn show_text(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", text) {
            warn!("Failed to print recognized text: {}", e);
        }
    }

    fn notify(&self, notice: Notice) {
        eprintln!("{}", notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_display() {
        assert_eq!(Notice::error("Crop failed: decode error").to_string(), "error: Crop failed: decode error");
        assert_eq!(Notice::info("Nothing pending").to_string(), "Nothing pending");
    }
}
