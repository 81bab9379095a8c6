use serde::Serialize;

use crate::diagnostics::error::RuntimeError;

const RED: &str = "\x1b[31m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Host-facing form of a [`RuntimeError`]: stable code, title, and the
/// rendered message. Serializable so tooling can consume diagnostics as
/// JSON instead of scraping the text form.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub code: &'static str,
    pub title: &'static str,
    pub message: String,
}

impl ErrorReport {
    /// Renders the report as display text.
    ///
    /// Coloring is the caller's decision: the host derives the flag from
    /// its terminal and the `NO_COLOR` convention.
    pub fn rendered(&self, color: bool) -> String {
        let mut out = String::new();
        if color {
            out.push_str(RED);
            out.push_str(BOLD);
        }
        out.push_str(&format!("error[{}]: {}", self.code, self.title));
        if color {
            out.push_str(RESET);
        }
        for line in self.message.lines() {
            out.push('\n');
            out.push_str("  ");
            out.push_str(line);
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl RuntimeError {
    pub fn report(&self) -> ErrorReport {
        let code = self.code();
        ErrorReport {
            code: code.code,
            title: code.title,
            message: self.to_string(),
        }
    }
}

/// Whether rendered output should use ANSI colors by default.
///
/// Follows the `NO_COLOR` convention; hosts with their own policy can
/// ignore this and pass an explicit flag to [`ErrorReport::rendered`].
pub fn color_default() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}
