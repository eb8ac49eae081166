//! UI utilities for consistent terminal output formatting.
//!
//! Provides shared formatting functions for error messages and status output.

use crate::startup::{StartupError, StartupFailure};

/// Width of error box separators.
const ERROR_BOX_WIDTH: usize = 60;

/// Render an error box with a title, a body and optional hints.
///
/// ```text
/// ============================================================
/// Startup check failed: kvs
/// ============================================================
///
/// <body>
///
/// ============================================================
/// Common Issues:
/// ============================================================
///
/// 1. <hint>
/// ```
pub fn render_error_box(title: &str, body: &str, hints: &[&str]) -> String {
    let separator = "=".repeat(ERROR_BOX_WIDTH);
    let mut out = format!("\n{separator}\n{title}\n{separator}\n");

    if !body.is_empty() {
        out.push_str(&format!("\n{body}\n"));
    }

    if !hints.is_empty() {
        out.push_str(&format!("\n{separator}\nCommon Issues:\n{separator}\n"));
        for (i, hint) in hints.iter().enumerate() {
            out.push_str(&format!("\n{}. {hint}\n", i + 1));
        }
    }

    out
}

/// Print an error box to stderr.
pub fn print_error_box(title: &str, body: &str, hints: &[&str]) {
    eprint!("{}", render_error_box(title, body, hints));
    eprintln!();
}

/// Troubleshooting hints for a startup error.
pub fn startup_hints(error: &StartupError) -> Vec<&'static str> {
    match error {
        StartupError::MissingKvs { .. } | StartupError::UnknownKvsType { .. } => vec![
            "Add a [kvs] section with type = \"stub\" for a process-local store",
            "Use type = \"redis\" or \"redis_ephemeral\" with a [redis] url for a shared store",
        ],
        StartupError::MissingExpiry => {
            vec!["Set kvs.expiry to the entry lifetime in seconds, e.g. expiry = 3600"]
        },
        StartupError::ExpiryTooLong { .. } => vec![
            "Lower kvs.expiry to at most ten years (315360000 seconds)",
            "Use type = \"redis\" for entries that should not expire",
        ],
        StartupError::InvalidRedisUrl { .. } => {
            vec!["Redis URLs look like redis://host:6379/0 or rediss://host:6380/"]
        },
        _ => Vec::new(),
    }
}

/// Print a failed startup check with hints.
pub fn print_startup_failure(failure: &StartupFailure) {
    let title = format!("Startup check failed: {}", failure.check);
    print_error_box(
        &title,
        &failure.error.to_string(),
        &startup_hints(&failure.error),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_box_layout() {
        let rendered = render_error_box("Title", "body text", &[]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "=".repeat(ERROR_BOX_WIDTH));
        assert_eq!(lines[2], "Title");
        assert_eq!(lines[3], "=".repeat(ERROR_BOX_WIDTH));
        assert!(rendered.contains("body text"));
        assert!(!rendered.contains("Common Issues"));
    }

    #[test]
    fn test_render_error_box_numbers_hints() {
        let rendered = render_error_box("Title", "", &["first", "second"]);
        assert!(rendered.contains("Common Issues:"));
        assert!(rendered.contains("1. first"));
        assert!(rendered.contains("2. second"));
    }

    #[test]
    fn test_startup_hints() {
        assert_eq!(startup_hints(&StartupError::MissingExpiry).len(), 1);
        let too_long = StartupError::ExpiryTooLong {
            secs: u64::MAX,
            max_secs: 1,
        };
        assert_eq!(startup_hints(&too_long).len(), 2);
        assert!(startup_hints(&StartupError::KvsNotBound).is_empty());
        let unknown = StartupError::UnknownKvsType {
            found: "bogus".into(),
            valid: "stub".into(),
        };
        assert_eq!(startup_hints(&unknown).len(), 2);
    }
}
