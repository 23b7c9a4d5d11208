//! Report edit session: the state behind the report detail drawer.
//!
//! A session is `Closed`, `Clean` or `Dirty`. Opening always reseeds the
//! draft from the given report and discards whatever was there before,
//! including unsaved edits. Closing never persists and never asks.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Draft, DraftEdit, DraftFlag, NoteKind, Report, VersionUpdate};
use crate::ports::{HistoryRequest, NoteHistory, SessionDeps, Toast, VersioningFlow};

pub const SAVE_SUCCESS: &str = "Đã cập nhật!";
pub const SAVE_FAILURE: &str = "Lỗi khi lưu";
pub const VERSION_SUCCESS: &str = "Đã cập nhật trạng thái mới";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Clean,
    Dirty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteTab {
    #[default]
    Detail,
    Teacher,
    Dvsv,
}

#[derive(Debug)]
pub enum SaveOutcome {
    Closed,
    NotDirty,
    InFlight,
    Saved(Report),
    Failed(StoreError),
}

#[derive(Debug)]
struct OpenDrawer {
    report: Report,
    draft: Draft,
    dirty: bool,
    saving: bool,
}

#[derive(Debug, Default)]
pub struct ReportEditSession {
    current: Option<OpenDrawer>,
    active_tab: NoteTab,
}

impl ReportEditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, report: Report) {
        if let Some(previous) = &self.current {
            if previous.dirty {
                tracing::debug!(
                    discarded = %previous.report.id,
                    opened = %report.id,
                    "unsaved draft discarded on reopen"
                );
            }
        }
        self.current = Some(OpenDrawer {
            draft: Draft::seed(&report),
            report,
            dirty: false,
            saving: false,
        });
    }

    pub fn close(&mut self) {
        if let Some(drawer) = self.current.take() {
            if drawer.dirty {
                tracing::debug!(report_id = %drawer.report.id, "unsaved draft discarded on close");
            }
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.current {
            None => SessionState::Closed,
            Some(drawer) if drawer.dirty => SessionState::Dirty,
            Some(_) => SessionState::Clean,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.state() == SessionState::Dirty
    }

    pub fn is_saving(&self) -> bool {
        self.current.as_ref().is_some_and(|d| d.saving)
    }

    /// Whether the save control is enabled.
    pub fn can_save(&self) -> bool {
        self.current.as_ref().is_some_and(|d| d.dirty && !d.saving)
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.current.as_ref().map(|d| &d.draft)
    }

    pub fn report(&self) -> Option<&Report> {
        self.current.as_ref().map(|d| &d.report)
    }

    pub fn active_tab(&self) -> NoteTab {
        self.active_tab
    }

    pub fn select_tab(&mut self, tab: NoteTab) {
        self.active_tab = tab;
    }

    /// Applies one edit and marks the session dirty. Returns `false` when closed.
    pub fn set_field(&mut self, edit: DraftEdit) -> bool {
        match self.current.as_mut() {
            Some(drawer) => {
                drawer.draft.apply(edit);
                drawer.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn toggle(&mut self, flag: DraftFlag) -> bool {
        let Some(value) = self.draft().map(|d| !d.flag(flag)) else {
            return false;
        };
        self.set_field(DraftEdit::Flag(flag, value))
    }

    /// Starts a save: returns the candidate record and raises the in-flight
    /// guard, or `None` when there is nothing to save or a save is pending.
    pub fn begin_save(&mut self, now: DateTime<Utc>) -> Option<Report> {
        let drawer = self.current.as_mut()?;
        if !drawer.dirty || drawer.saving {
            return None;
        }
        drawer.saving = true;
        Some(drawer.draft.merge_into(&drawer.report, now))
    }

    pub fn finish_save(
        &mut self,
        candidate: Report,
        result: Result<(), StoreError>,
        deps: SessionDeps<'_>,
    ) -> SaveOutcome {
        // Only the drawer the candidate was taken from is updated.
        let owns_drawer = self.owned_drawer(candidate.id).is_some();
        if let Some(drawer) = self.owned_drawer(candidate.id) {
            drawer.saving = false;
        }
        match result {
            Ok(()) => {
                deps.notifier.notify(Toast::Success(SAVE_SUCCESS.to_string()));
                deps.observer.report_updated(&candidate);
                if owns_drawer {
                    self.current = None;
                }
                tracing::info!(report_id = %candidate.id, "report saved");
                SaveOutcome::Saved(candidate)
            }
            Err(err) => {
                tracing::warn!(report_id = %candidate.id, error = %err, "report save failed");
                deps.notifier.notify(Toast::Error(SAVE_FAILURE.to_string()));
                SaveOutcome::Failed(err)
            }
        }
    }

    fn owned_drawer(&mut self, report_id: Uuid) -> Option<&mut OpenDrawer> {
        self.current.as_mut().filter(|d| d.report.id == report_id)
    }

    pub async fn save(&mut self, deps: SessionDeps<'_>) -> SaveOutcome {
        self.save_at(Utc::now(), deps).await
    }

    pub async fn save_at(&mut self, now: DateTime<Utc>, deps: SessionDeps<'_>) -> SaveOutcome {
        let Some(drawer) = self.current.as_ref() else {
            return SaveOutcome::Closed;
        };
        if drawer.saving {
            return SaveOutcome::InFlight;
        }
        let Some(candidate) = self.begin_save(now) else {
            return SaveOutcome::NotDirty;
        };
        let result = deps.store.save_report(&candidate).await;
        self.finish_save(candidate, result, deps)
    }

    /// Takes a snapshot produced outside the save path. The snapshot is
    /// already persisted, so the draft is reseeded from it and the session
    /// becomes clean.
    pub fn apply_versioned(&mut self, updated: Report, deps: SessionDeps<'_>) {
        if let Some(drawer) = self.current.as_mut() {
            drawer.draft = Draft::seed(&updated);
            drawer.report = updated.clone();
            drawer.dirty = false;
        }
        deps.observer.report_updated(&updated);
        deps.notifier.notify(Toast::Success(VERSION_SUCCESS.to_string()));
    }

    pub async fn run_versioning(
        &mut self,
        update: VersionUpdate,
        flow: &dyn VersioningFlow,
        deps: SessionDeps<'_>,
    ) -> Result<(), StoreError> {
        let Some(report) = self.report().cloned() else {
            return Ok(());
        };
        match flow.submit(&report, update).await {
            Ok(updated) => {
                self.apply_versioned(updated, deps);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(report_id = %report.id, error = %err, "versioning failed");
                deps.notifier.notify(Toast::Error(SAVE_FAILURE.to_string()));
                Err(err)
            }
        }
    }

    pub fn history_request(&self, kind: NoteKind) -> Option<HistoryRequest> {
        let drawer = self.current.as_ref()?;
        let current_value = match kind {
            NoteKind::StatusDetail => drawer.draft.status_detail.clone(),
            NoteKind::TeacherNote => drawer.draft.teacher_note.clone(),
            NoteKind::DvsvNote => drawer.report.dvsv_note.clone(),
        };
        Some(HistoryRequest {
            report_id: drawer.report.id,
            kind,
            title: kind.history_title().to_string(),
            current_value,
        })
    }

    pub async fn open_history(
        &self,
        kind: NoteKind,
        viewer: &dyn NoteHistory,
    ) -> Result<(), StoreError> {
        match self.history_request(kind) {
            Some(request) => viewer.open(request).await,
            None => Ok(()),
        }
    }
}
