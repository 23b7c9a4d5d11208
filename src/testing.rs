//! In-memory collaborators for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Report, StudyStatus, VersionUpdate};
use crate::ports::{
    AuthService, HistoryRequest, Navigator, NoteHistory, Notifier, ReportObserver, ReportStore,
    SessionDeps, Toast, VersioningFlow,
};

pub fn sample_report(name: &str) -> Report {
    Report {
        id: Uuid::new_v4(),
        student_name: name.to_string(),
        student_code: "PH12345".to_string(),
        class_name: "IT18301".to_string(),
        subject: "Lập trình Rust".to_string(),
        campus: Some("HN".to_string()),
        study_status: StudyStatus::Attending,
        warn_10: false,
        warn_15_17: false,
        warn_20: false,
        banned: false,
        status_detail: "Vắng 3 buổi".to_string(),
        teacher_note: String::new(),
        dvsv_note: "Đã liên hệ phụ huynh".to_string(),
        assessment_date: None,
        updated_at: Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap(),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub saved: Mutex<Vec<Report>>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl MemoryStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail.store(true, Ordering::SeqCst);
        store
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_saved(&self) -> Option<Report> {
        self.saved.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn save_report(&self, report: &Report) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("network down".into()));
        }
        self.saved.lock().unwrap().push(report.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub updates: Mutex<Vec<Report>>,
}

impl RecordingObserver {
    pub fn updates(&self) -> Vec<Report> {
        self.updates.lock().unwrap().clone()
    }
}

impl ReportObserver for RecordingObserver {
    fn report_updated(&self, report: &Report) {
        self.updates.lock().unwrap().push(report.clone());
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}

#[derive(Default)]
pub struct StubAuth {
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl AuthService for StubAuth {
    async fn sign_out(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(StoreError::Rejected("session expired".into()))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct RecordingHistory {
    pub requests: Mutex<Vec<HistoryRequest>>,
}

#[async_trait]
impl NoteHistory for RecordingHistory {
    async fn open(&self, request: HistoryRequest) -> Result<(), StoreError> {
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

#[derive(Default)]
pub struct StubVersioning {
    pub fail: bool,
}

#[async_trait]
impl VersioningFlow for StubVersioning {
    async fn submit(&self, report: &Report, update: VersionUpdate) -> Result<Report, StoreError> {
        if self.fail {
            return Err(StoreError::NotFound(report.id));
        }
        Ok(update.apply_to(report, report.updated_at + chrono::Duration::minutes(1)))
    }
}

/// Owns one of each save collaborator so tests can borrow a [`SessionDeps`].
#[derive(Default)]
pub struct Harness {
    pub store: MemoryStore,
    pub observer: RecordingObserver,
    pub notifier: RecordingNotifier,
}

impl Harness {
    pub fn failing() -> Self {
        Self {
            store: MemoryStore::failing(),
            ..Self::default()
        }
    }

    pub fn deps(&self) -> SessionDeps<'_> {
        SessionDeps {
            store: &self.store,
            observer: &self.observer,
            notifier: &self.notifier,
        }
    }
}
