use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ATTENDING_LITERAL: &str = "Học đi";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StudyStatus {
    #[default]
    Attending,
    Other(String),
}

impl StudyStatus {
    pub fn as_str(&self) -> &str {
        match self {
            StudyStatus::Attending => ATTENDING_LITERAL,
            StudyStatus::Other(value) => value,
        }
    }

    pub fn is_attending(&self) -> bool {
        matches!(self, StudyStatus::Attending)
    }
}

impl From<String> for StudyStatus {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == ATTENDING_LITERAL {
            StudyStatus::Attending
        } else {
            StudyStatus::Other(trimmed.to_string())
        }
    }
}

impl From<&str> for StudyStatus {
    fn from(value: &str) -> Self {
        StudyStatus::from(value.to_string())
    }
}

impl From<StudyStatus> for String {
    fn from(value: StudyStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for StudyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single student's attendance/warning record for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub student_name: String,
    pub student_code: String,
    pub class_name: String,
    pub subject: String,
    pub campus: Option<String>,
    #[serde(default)]
    pub study_status: StudyStatus,
    pub warn_10: bool,
    pub warn_15_17: bool,
    pub warn_20: bool,
    pub banned: bool,
    #[serde(default)]
    pub status_detail: String,
    #[serde(default)]
    pub teacher_note: String,
    #[serde(default)]
    pub dvsv_note: String,
    pub assessment_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    pub fn flag(&self, flag: DraftFlag) -> bool {
        match flag {
            DraftFlag::Warn10 => self.warn_10,
            DraftFlag::Warn15To17 => self.warn_15_17,
            DraftFlag::Warn20 => self.warn_20,
            DraftFlag::Banned => self.banned,
        }
    }
}

/// The mutable subset of a [`Report`] owned by an edit session.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub warn_10: bool,
    pub warn_15_17: bool,
    pub warn_20: bool,
    pub banned: bool,
    pub status_detail: String,
    pub teacher_note: String,
    pub study_status: StudyStatus,
    pub assessment_date: Option<NaiveDate>,
}

impl Draft {
    pub fn seed(report: &Report) -> Self {
        Self {
            warn_10: report.warn_10,
            warn_15_17: report.warn_15_17,
            warn_20: report.warn_20,
            banned: report.banned,
            status_detail: report.status_detail.clone(),
            teacher_note: report.teacher_note.clone(),
            study_status: report.study_status.clone(),
            assessment_date: report.assessment_date,
        }
    }

    /// Shallow merge of the draft over `original`, stamped with `now`.
    pub fn merge_into(&self, original: &Report, now: DateTime<Utc>) -> Report {
        Report {
            warn_10: self.warn_10,
            warn_15_17: self.warn_15_17,
            warn_20: self.warn_20,
            banned: self.banned,
            status_detail: self.status_detail.clone(),
            teacher_note: self.teacher_note.clone(),
            study_status: self.study_status.clone(),
            assessment_date: self.assessment_date,
            updated_at: now,
            ..original.clone()
        }
    }

    pub fn apply(&mut self, edit: DraftEdit) {
        match edit {
            DraftEdit::Flag(flag, value) => *self.flag_mut(flag) = value,
            DraftEdit::StatusDetail(value) => self.status_detail = value,
            DraftEdit::TeacherNote(value) => self.teacher_note = value,
            DraftEdit::StudyStatus(value) => self.study_status = value,
            DraftEdit::AssessmentDate(value) => self.assessment_date = value,
        }
    }

    pub fn flag(&self, flag: DraftFlag) -> bool {
        match flag {
            DraftFlag::Warn10 => self.warn_10,
            DraftFlag::Warn15To17 => self.warn_15_17,
            DraftFlag::Warn20 => self.warn_20,
            DraftFlag::Banned => self.banned,
        }
    }

    fn flag_mut(&mut self, flag: DraftFlag) -> &mut bool {
        match flag {
            DraftFlag::Warn10 => &mut self.warn_10,
            DraftFlag::Warn15To17 => &mut self.warn_15_17,
            DraftFlag::Warn20 => &mut self.warn_20,
            DraftFlag::Banned => &mut self.banned,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftFlag {
    Warn10,
    Warn15To17,
    Warn20,
    Banned,
}

impl DraftFlag {
    pub const ALL: [DraftFlag; 4] = [
        DraftFlag::Warn10,
        DraftFlag::Warn15To17,
        DraftFlag::Warn20,
        DraftFlag::Banned,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DraftFlag::Warn10 => "Vắng 10%",
            DraftFlag::Warn15To17 => "Vắng 15-17%",
            DraftFlag::Warn20 => "Vắng 20%",
            DraftFlag::Banned => "Cấm thi",
        }
    }
}

/// One `setField(key, value)` against a draft.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEdit {
    Flag(DraftFlag, bool),
    StatusDetail(String),
    TeacherNote(String),
    StudyStatus(StudyStatus),
    AssessmentDate(Option<NaiveDate>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Gv,
    Cnbm,
    TruongNganh,
}

impl Role {
    pub fn display_name(self) -> &'static str {
        match self {
            Role::Gv => "Giảng viên",
            Role::Cnbm => "Chủ nhiệm bộ môn",
            Role::TruongNganh => "Trưởng ngành",
        }
    }

    pub fn is_department(self) -> bool {
        matches!(self, Role::Cnbm | Role::TruongNganh)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "gv" => Ok(Role::Gv),
            "cnbm" => Ok(Role::Cnbm),
            "truong_nganh" => Ok(Role::TruongNganh),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub campus: Option<String>,
}

impl Profile {
    pub fn role(profile: Option<&Profile>) -> Option<Role> {
        profile.and_then(|p| p.role)
    }

    /// Avatar letter: first character of the name, `'U'` when unknown.
    pub fn initial(profile: Option<&Profile>) -> char {
        profile
            .and_then(|p| p.full_name.as_deref())
            .and_then(|name| name.chars().next())
            .unwrap_or('U')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    StatusDetail,
    TeacherNote,
    DvsvNote,
}

impl NoteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoteKind::StatusDetail => "status_detail",
            NoteKind::TeacherNote => "teacher_note",
            NoteKind::DvsvNote => "dvsv_note",
        }
    }

    pub fn history_title(self) -> &'static str {
        match self {
            NoteKind::StatusDetail => "Lịch sử tình trạng",
            NoteKind::TeacherNote => "Lịch sử ghi chú",
            NoteKind::DvsvNote => "Lịch sử phản hồi",
        }
    }
}

impl FromStr for NoteKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "status_detail" => Ok(NoteKind::StatusDetail),
            "teacher_note" => Ok(NoteKind::TeacherNote),
            "dvsv_note" => Ok(NoteKind::DvsvNote),
            other => Err(format!("unknown note type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteHistoryEntry {
    pub report_id: Uuid,
    pub kind: NoteKind,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// Input of the versioning flow: a new status snapshot for one report.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionUpdate {
    pub study_status: StudyStatus,
    pub assessment_date: Option<NaiveDate>,
    pub warn_10: bool,
    pub warn_15_17: bool,
    pub warn_20: bool,
    pub banned: bool,
    pub status_detail: Option<String>,
    pub teacher_note: Option<String>,
}

impl VersionUpdate {
    /// Starts from the current values of `report`.
    pub fn from_report(report: &Report) -> Self {
        Self {
            study_status: report.study_status.clone(),
            assessment_date: report.assessment_date,
            warn_10: report.warn_10,
            warn_15_17: report.warn_15_17,
            warn_20: report.warn_20,
            banned: report.banned,
            status_detail: None,
            teacher_note: None,
        }
    }

    pub fn apply_to(&self, report: &Report, now: DateTime<Utc>) -> Report {
        Report {
            study_status: self.study_status.clone(),
            assessment_date: self.assessment_date,
            warn_10: self.warn_10,
            warn_15_17: self.warn_15_17,
            warn_20: self.warn_20,
            banned: self.banned,
            status_detail: self
                .status_detail
                .clone()
                .unwrap_or_else(|| report.status_detail.clone()),
            teacher_note: self
                .teacher_note
                .clone()
                .unwrap_or_else(|| report.teacher_note.clone()),
            updated_at: now,
            ..report.clone()
        }
    }
}
