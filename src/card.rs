use std::fmt;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::Report;

pub const DEFAULT_CAMPUS: &str = "HN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Attending,
    Alert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardBadge {
    Banned,
    Warn20,
}

impl CardBadge {
    pub fn label(self) -> &'static str {
        match self {
            CardBadge::Banned => "Cấm thi",
            CardBadge::Warn20 => "20%",
        }
    }
}

/// List-view summary of one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportCard {
    pub report_id: Uuid,
    pub student_name: String,
    pub status_label: String,
    pub tone: StatusTone,
    pub campus: String,
    pub student_code: String,
    pub class_name: String,
    pub subject: String,
    pub badges: Vec<CardBadge>,
    pub assessment_date: Option<NaiveDate>,
}

impl From<&Report> for ReportCard {
    fn from(report: &Report) -> Self {
        let mut badges = Vec::new();
        if report.banned {
            badges.push(CardBadge::Banned);
        } else if report.warn_20 {
            badges.push(CardBadge::Warn20);
        }

        Self {
            report_id: report.id,
            student_name: report.student_name.clone(),
            status_label: report.study_status.to_string(),
            tone: if report.study_status.is_attending() {
                StatusTone::Attending
            } else {
                StatusTone::Alert
            },
            campus: report
                .campus
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CAMPUS.to_string()),
            student_code: report.student_code.clone(),
            class_name: report.class_name.clone(),
            subject: report.subject.clone(),
            badges,
            assessment_date: report.assessment_date,
        }
    }
}

impl fmt::Display for ReportCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tone = match self.tone {
            StatusTone::Attending => "",
            StatusTone::Alert => "!",
        };
        write!(
            f,
            "{} [{}{}] ({}) {} | {} · {}",
            self.student_name,
            tone,
            self.status_label,
            self.campus,
            self.student_code,
            self.class_name,
            self.subject
        )?;
        for badge in &self.badges {
            write!(f, " [{}]", badge.label())?;
        }
        if let Some(date) = self.assessment_date {
            write!(f, " @ {date}")?;
        }
        Ok(())
    }
}
