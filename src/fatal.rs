//! Process-wide fatal boundary.
//!
//! Installed once at boot and never removed. When it fires, whatever the
//! command was printing is abandoned and a diagnostic panel goes to stderr.

use std::any::Any;
use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static INSTALL: Once = Once::new();
static TRIPPED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    /// A panic anywhere in the process.
    Critical,
    /// An error that escaped the async entry point.
    Async,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalPanel {
    pub kind: FatalKind,
    pub message: String,
    pub location: Option<String>,
    pub stack: String,
}

impl FatalPanel {
    pub fn from_error(err: &anyhow::Error) -> Self {
        let stack = err
            .chain()
            .skip(1)
            .map(|cause| format!("caused by: {cause}"))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            kind: FatalKind::Async,
            message: err.to_string(),
            location: None,
            stack,
        }
    }
}

impl fmt::Display for FatalPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self.kind {
            FatalKind::Critical => "CRITICAL ERROR",
            FatalKind::Async => "ASYNC ERROR",
        };
        writeln!(f, "{title}")?;
        writeln!(f, "{}", self.message)?;
        writeln!(f)?;
        if let Some(location) = &self.location {
            writeln!(f, "{location}")?;
        }
        if self.stack.trim().is_empty() {
            writeln!(f, "No stack trace")?;
        } else {
            writeln!(f, "{}", self.stack.trim_end())?;
        }
        writeln!(f)?;
        write!(f, "Reload: run the command again.")
    }
}

pub fn install() {
    INSTALL.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let panel = FatalPanel {
                kind: FatalKind::Critical,
                message: panic_message(info.payload()),
                location: info
                    .location()
                    .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column())),
                stack: std::backtrace::Backtrace::capture().to_string(),
            };
            show(&panel);
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

pub fn is_installed() -> bool {
    INSTALL.is_completed()
}

pub fn is_tripped() -> bool {
    TRIPPED.load(Ordering::SeqCst)
}

pub fn trap_rejection(err: &anyhow::Error) -> FatalPanel {
    let panel = FatalPanel::from_error(err);
    show(&panel);
    panel
}

fn show(panel: &FatalPanel) {
    TRIPPED.store(true, Ordering::SeqCst);
    tracing::error!(target: "fatal", kind = ?panel.kind, message = %panel.message, "fatal error");
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{panel}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn async_panel_carries_error_chain() {
        let err = Err::<(), _>(std::io::Error::other("connection refused"))
            .context("failed to load reports")
            .unwrap_err();
        let panel = FatalPanel::from_error(&err);
        assert_eq!(panel.kind, FatalKind::Async);
        assert_eq!(panel.message, "failed to load reports");
        assert_eq!(panel.stack, "caused by: connection refused");

        let text = panel.to_string();
        assert!(text.starts_with("ASYNC ERROR\nfailed to load reports"));
        assert!(text.ends_with("Reload: run the command again."));
    }

    #[test]
    fn empty_stack_renders_placeholder() {
        let panel = FatalPanel {
            kind: FatalKind::Critical,
            message: "index out of bounds".into(),
            location: Some("src/session.rs:10:5".into()),
            stack: String::new(),
        };
        let text = panel.to_string();
        assert!(text.starts_with("CRITICAL ERROR"));
        assert!(text.contains("src/session.rs:10:5"));
        assert!(text.contains("No stack trace"));
    }

    #[test]
    fn trapping_marks_boundary_tripped() {
        let err = anyhow::anyhow!("unexpected end of stream");
        let panel = trap_rejection(&err);
        assert_eq!(panel.message, "unexpected end of stream");
        assert!(is_tripped());
    }

    // The hook itself is process-wide and stays out of the test binary.
    #[test]
    fn panic_payloads_become_messages() {
        let borrowed: Box<dyn Any + Send> = Box::new("index out of bounds");
        let owned: Box<dyn Any + Send> = Box::new(String::from("draft missing"));
        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(borrowed.as_ref()), "index out of bounds");
        assert_eq!(panic_message(owned.as_ref()), "draft missing");
        assert_eq!(panic_message(other.as_ref()), "panic");
        assert!(!is_installed());
    }
}
