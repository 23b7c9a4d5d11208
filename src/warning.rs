use crate::models::{DraftFlag, Report};

/// Most severe flag raised on a report. Flags stay independent; this is
/// only a reading of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WarningLevel {
    None,
    Warn10,
    Warn15To17,
    Warn20,
    Banned,
}

impl WarningLevel {
    pub fn of(report: &Report) -> Self {
        if report.banned {
            WarningLevel::Banned
        } else if report.warn_20 {
            WarningLevel::Warn20
        } else if report.warn_15_17 {
            WarningLevel::Warn15To17
        } else if report.warn_10 {
            WarningLevel::Warn10
        } else {
            WarningLevel::None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WarningLevel::None => "Bình thường",
            WarningLevel::Warn10 => DraftFlag::Warn10.label(),
            WarningLevel::Warn15To17 => DraftFlag::Warn15To17.label(),
            WarningLevel::Warn20 => DraftFlag::Warn20.label(),
            WarningLevel::Banned => DraftFlag::Banned.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSummary {
    pub flag: DraftFlag,
    pub count: usize,
}

/// Counts every flag on its own, so one report can appear in several rows.
pub fn summarize_flags(reports: &[Report]) -> Vec<FlagSummary> {
    DraftFlag::ALL
        .iter()
        .map(|&flag| FlagSummary {
            flag,
            count: reports.iter().filter(|r| r.flag(flag)).count(),
        })
        .collect()
}

/// Most severe first, then most recently updated.
pub fn sort_by_severity(reports: &mut [Report]) {
    reports.sort_by(|a, b| {
        WarningLevel::of(b)
            .cmp(&WarningLevel::of(a))
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_report;
    use chrono::Duration;

    #[test]
    fn level_follows_most_severe_flag() {
        let mut report = sample_report("Avery Lee");
        assert_eq!(WarningLevel::of(&report), WarningLevel::None);
        report.warn_10 = true;
        assert_eq!(WarningLevel::of(&report), WarningLevel::Warn10);
        report.warn_20 = true;
        assert_eq!(WarningLevel::of(&report), WarningLevel::Warn20);
        report.banned = true;
        assert_eq!(WarningLevel::of(&report), WarningLevel::Banned);
    }

    #[test]
    fn banned_without_warnings_is_still_banned() {
        let mut report = sample_report("Avery Lee");
        report.banned = true;
        assert_eq!(WarningLevel::of(&report), WarningLevel::Banned);
        assert!(!report.warn_20);
    }

    #[test]
    fn summary_counts_flags_independently() {
        let mut a = sample_report("Avery Lee");
        a.warn_10 = true;
        a.warn_20 = true;
        let mut b = sample_report("Kiara Patel");
        b.warn_20 = true;
        b.banned = true;

        let summary = summarize_flags(&[a, b]);
        let counts: Vec<usize> = summary.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![1, 0, 2, 1]);
    }

    #[test]
    fn sorts_most_severe_first() {
        let calm = sample_report("Jules Moreno");
        let mut warned = sample_report("Avery Lee");
        warned.warn_15_17 = true;
        let mut newer_warned = warned.clone();
        newer_warned.student_name = "Kiara Patel".into();
        newer_warned.updated_at += Duration::days(1);
        let mut banned = sample_report("Minh Anh");
        banned.banned = true;

        let mut reports = vec![calm, warned, banned, newer_warned];
        sort_by_severity(&mut reports);
        let names: Vec<&str> = reports.iter().map(|r| r.student_name.as_str()).collect();
        assert_eq!(names, vec!["Minh Anh", "Kiara Patel", "Avery Lee", "Jules Moreno"]);
    }
}
