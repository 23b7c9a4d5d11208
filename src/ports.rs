//! Collaborator seams consumed by the dashboard model.
//!
//! Everything that leaves the process (persistence, sign-out, history and
//! versioning views) is an async trait; upward notifications, toasts and
//! navigation are plain fire-and-forget calls.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NoteKind, Report, VersionUpdate};

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_out(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist the full record. Any error is a failed save.
    async fn save_report(&self, report: &Report) -> Result<(), StoreError>;
}

/// Request to show the edit history of one note field.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    pub report_id: Uuid,
    pub kind: NoteKind,
    pub title: String,
    pub current_value: String,
}

#[async_trait]
pub trait NoteHistory: Send + Sync {
    async fn open(&self, request: HistoryRequest) -> Result<(), StoreError>;
}

/// Multi-field status update that bypasses the draft/save path.
#[async_trait]
pub trait VersioningFlow: Send + Sync {
    async fn submit(&self, report: &Report, update: VersionUpdate) -> Result<Report, StoreError>;
}

/// Upward propagation to whatever owns the list of reports.
pub trait ReportObserver: Send + Sync {
    fn report_updated(&self, report: &Report);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toast {
    Success(String),
    Error(String),
}

pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Collaborators an edit session needs to complete a save.
#[derive(Clone, Copy)]
pub struct SessionDeps<'a> {
    pub store: &'a dyn ReportStore,
    pub observer: &'a dyn ReportObserver,
    pub notifier: &'a dyn Notifier,
}

/// Prints toasts to stdout and mirrors them into the log.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, toast: Toast) {
        match toast {
            Toast::Success(message) => {
                tracing::info!(%message, "toast");
                println!("✓ {message}");
            }
            Toast::Error(message) => {
                tracing::warn!(%message, "toast");
                println!("✗ {message}");
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct LoggingObserver;

impl ReportObserver for LoggingObserver {
    fn report_updated(&self, report: &Report) {
        tracing::info!(
            report_id = %report.id,
            student = %report.student_name,
            updated_at = %report.updated_at,
            "report updated"
        );
    }
}
