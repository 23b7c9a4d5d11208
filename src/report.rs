use std::fmt::Write;

use chrono::NaiveDate;

use crate::card::ReportCard;
use crate::models::{NoteHistoryEntry, Report};
use crate::ports::HistoryRequest;
use crate::warning::{self, WarningLevel};

pub fn build_digest(campus: Option<&str>, generated_on: NaiveDate, reports: &[Report]) -> String {
    let summaries = warning::summarize_flags(reports);
    let mut flagged: Vec<Report> = reports
        .iter()
        .filter(|r| WarningLevel::of(r) != WarningLevel::None)
        .cloned()
        .collect();
    warning::sort_by_severity(&mut flagged);

    let mut output = String::new();
    let campus_label = campus.unwrap_or("all campuses");

    let _ = writeln!(output, "# Academic Alert Digest");
    let _ = writeln!(
        output,
        "Generated for {} on {} ({} reports)",
        campus_label,
        generated_on,
        reports.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Warning Flags");

    if reports.is_empty() {
        let _ = writeln!(output, "No reports recorded.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(output, "- {}: {}", summary.flag.label(), summary.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Severe");

    if flagged.is_empty() {
        let _ = writeln!(output, "No students with raised flags.");
    } else {
        for report in flagged.iter().take(10) {
            let _ = writeln!(
                output,
                "- {}: {}",
                WarningLevel::of(report).label(),
                ReportCard::from(report)
            );
        }
    }

    let mut recent: Vec<&Report> = reports
        .iter()
        .filter(|r| !r.teacher_note.is_empty() || !r.dvsv_note.is_empty())
        .collect();
    recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Notes");

    if recent.is_empty() {
        let _ = writeln!(output, "No notes recorded.");
    } else {
        for report in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}) on {}: GV: {} / DVSV: {}",
                report.student_name,
                report.subject,
                report.updated_at.date_naive(),
                or_dash(&report.teacher_note),
                or_dash(&report.dvsv_note)
            );
        }
    }

    output
}

pub fn render_history(request: &HistoryRequest, entries: &[NoteHistoryEntry]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## {}", request.title);
    let _ = writeln!(output, "Hiện tại: {}", or_dash(&request.current_value));
    let _ = writeln!(output);

    if entries.is_empty() {
        let _ = writeln!(output, "No history recorded.");
    } else {
        for entry in entries {
            let _ = writeln!(
                output,
                "- {} {}: {}",
                entry.created_at.format("%Y-%m-%d %H:%M"),
                entry.author,
                entry.content
            );
        }
    }

    output
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteKind;
    use crate::testing::sample_report;
    use chrono::{TimeZone, Utc};

    #[test]
    fn empty_digest_says_so() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let digest = build_digest(Some("HN"), date, &[]);
        assert!(digest.contains("Generated for HN on 2026-02-02 (0 reports)"));
        assert!(digest.contains("No reports recorded."));
        assert!(digest.contains("No students with raised flags."));
        assert!(digest.contains("No notes recorded."));
    }

    #[test]
    fn lists_flagged_students_by_severity() {
        let mut warned = sample_report("Avery Lee");
        warned.warn_10 = true;
        let mut banned = sample_report("Kiara Patel");
        banned.banned = true;
        let calm = sample_report("Jules Moreno");

        let date = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let digest = build_digest(None, date, &[warned, calm, banned]);

        assert!(digest.contains("- Cấm thi: 1"));
        assert!(digest.contains("- Vắng 10%: 1"));
        let kiara = digest.find("- Cấm thi: Kiara Patel").unwrap();
        let avery = digest.find("- Vắng 10%: Avery Lee").unwrap();
        assert!(kiara < avery);
        assert!(!digest.contains(": Jules Moreno"));
    }

    #[test]
    fn history_lists_entries_under_current_value() {
        let report = sample_report("Avery Lee");
        let request = HistoryRequest {
            report_id: report.id,
            kind: NoteKind::DvsvNote,
            title: NoteKind::DvsvNote.history_title().to_string(),
            current_value: String::new(),
        };
        let entries = vec![NoteHistoryEntry {
            report_id: report.id,
            kind: NoteKind::DvsvNote,
            content: "Đã gọi phụ huynh".into(),
            author: "dvsv@fpt.edu.vn".into(),
            created_at: Utc.with_ymd_and_hms(2026, 2, 3, 9, 30, 0).unwrap(),
        }];

        let text = render_history(&request, &entries);
        assert!(text.starts_with("## Lịch sử phản hồi\nHiện tại: -\n"));
        assert!(text.contains("- 2026-02-03 09:30 dvsv@fpt.edu.vn: Đã gọi phụ huynh"));
        assert!(render_history(&request, &[]).contains("No history recorded."));
    }
}
