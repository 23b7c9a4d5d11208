use anyhow::Context;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NoteHistoryEntry, NoteKind, Report, StudyStatus, VersionUpdate};
use crate::ports::{HistoryRequest, NoteHistory, ReportStore, VersioningFlow};
use crate::report;

const REPORT_COLUMNS: &str = "id, student_name, student_code, class_name, subject, campus, \
     study_status, warn_10, warn_15_17, warn_20, banned, status_detail, teacher_note, \
     dvsv_note, assessment_date, updated_at";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let reports = vec![
        (
            "seed-001",
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?,
            ("Nguyễn Văn An", "PH30112", "IT18301", "Lập trình Java 1", "HN"),
            (true, false, false, false),
            "Vắng 2/10 buổi",
            None,
        ),
        (
            "seed-002",
            Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?,
            ("Trần Thị Bình", "PH29874", "MOB1042", "Cơ sở dữ liệu", "HN"),
            (true, true, true, false),
            "Vắng 4/10 buổi, không liên lạc được",
            Some(NaiveDate::from_ymd_opt(2026, 1, 28).context("invalid date")?),
        ),
        (
            "seed-003",
            Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?,
            ("Lê Minh Châu", "PH31005", "WEB2041", "Thiết kế web", "HCM"),
            (true, true, true, true),
            "Vượt quá số buổi vắng cho phép",
            Some(NaiveDate::from_ymd_opt(2026, 2, 2).context("invalid date")?),
        ),
    ];

    for (source_key, id, (name, code, class, subject, campus), flags, detail, assessed) in reports
    {
        sqlx::query(
            r#"
            INSERT INTO academic_alert.reports
            (id, student_name, student_code, class_name, subject, campus,
             warn_10, warn_15_17, warn_20, banned, status_detail, assessment_date, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(code)
        .bind(class)
        .bind(subject)
        .bind(campus)
        .bind(flags.0)
        .bind(flags.1)
        .bind(flags.2)
        .bind(flags.3)
        .bind(detail)
        .bind(assessed)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        student_name: String,
        student_code: String,
        class_name: String,
        subject: String,
        campus: Option<String>,
        study_status: Option<String>,
        warn_10: Option<bool>,
        warn_15_17: Option<bool>,
        warn_20: Option<bool>,
        banned: Option<bool>,
        status_detail: Option<String>,
        teacher_note: Option<String>,
        assessment_date: Option<NaiveDate>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));
        let study_status = StudyStatus::from(row.study_status.unwrap_or_default());

        let result = sqlx::query(
            r#"
            INSERT INTO academic_alert.reports
            (id, student_name, student_code, class_name, subject, campus, study_status,
             warn_10, warn_15_17, warn_20, banned, status_detail, teacher_note,
             assessment_date, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.student_name)
        .bind(&row.student_code)
        .bind(&row.class_name)
        .bind(&row.subject)
        .bind(row.campus.filter(|c| !c.is_empty()))
        .bind(study_status.as_str())
        .bind(row.warn_10.unwrap_or(false))
        .bind(row.warn_15_17.unwrap_or(false))
        .bind(row.warn_20.unwrap_or(false))
        .bind(row.banned.unwrap_or(false))
        .bind(row.status_detail.unwrap_or_default())
        .bind(row.teacher_note.unwrap_or_default())
        .bind(row.assessment_date)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

fn report_from_row(row: &PgRow) -> Report {
    let study_status: String = row.get("study_status");
    Report {
        id: row.get("id"),
        student_name: row.get("student_name"),
        student_code: row.get("student_code"),
        class_name: row.get("class_name"),
        subject: row.get("subject"),
        campus: row.get("campus"),
        study_status: StudyStatus::from(study_status),
        warn_10: row.get("warn_10"),
        warn_15_17: row.get("warn_15_17"),
        warn_20: row.get("warn_20"),
        banned: row.get("banned"),
        status_detail: row.get("status_detail"),
        teacher_note: row.get("teacher_note"),
        dvsv_note: row.get("dvsv_note"),
        assessment_date: row.get("assessment_date"),
        updated_at: row.get("updated_at"),
    }
}

pub async fn fetch_reports(
    pool: &PgPool,
    campus: Option<&str>,
    flagged_only: bool,
) -> anyhow::Result<Vec<Report>> {
    let mut query = format!("SELECT {REPORT_COLUMNS} FROM academic_alert.reports WHERE TRUE");

    if campus.is_some() {
        query.push_str(" AND campus = $1");
    }
    if flagged_only {
        query.push_str(" AND (warn_10 OR warn_15_17 OR warn_20 OR banned)");
    }
    query.push_str(" ORDER BY updated_at DESC");

    let mut rows = sqlx::query(&query);
    if let Some(value) = campus {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    Ok(records.iter().map(report_from_row).collect())
}

pub async fn fetch_report(pool: &PgPool, id: Uuid) -> Result<Report, StoreError> {
    let query = format!("SELECT {REPORT_COLUMNS} FROM academic_alert.reports WHERE id = $1");
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound(id))?;
    Ok(report_from_row(&row))
}

pub async fn fetch_note_history(
    pool: &PgPool,
    report_id: Uuid,
    kind: NoteKind,
) -> Result<Vec<NoteHistoryEntry>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT content, author, created_at
        FROM academic_alert.note_history
        WHERE report_id = $1 AND note_type = $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(report_id)
    .bind(kind.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| NoteHistoryEntry {
            report_id,
            kind,
            content: row.get("content"),
            author: row.get("author"),
            created_at: row.get("created_at"),
        })
        .collect())
}

/// Records a history entry and makes it the field's current value.
pub async fn append_note(
    pool: &PgPool,
    report_id: Uuid,
    kind: NoteKind,
    content: &str,
    author: &str,
) -> Result<NoteHistoryEntry, StoreError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let update = format!(
        "UPDATE academic_alert.reports SET {} = $1, updated_at = $2 WHERE id = $3",
        kind.as_str()
    );
    let result = sqlx::query(&update)
        .bind(content)
        .bind(now)
        .bind(report_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(report_id));
    }

    sqlx::query(
        r#"
        INSERT INTO academic_alert.note_history
        (id, report_id, note_type, content, author, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(report_id)
    .bind(kind.as_str())
    .bind(content)
    .bind(author)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(%report_id, note_type = kind.as_str(), "note appended");

    Ok(NoteHistoryEntry {
        report_id,
        kind,
        content: content.to_string(),
        author: author.to_string(),
        created_at: now,
    })
}

pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn save_report(&self, report: &Report) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE academic_alert.reports
            SET warn_10 = $2, warn_15_17 = $3, warn_20 = $4, banned = $5,
                status_detail = $6, teacher_note = $7, study_status = $8,
                assessment_date = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(report.id)
        .bind(report.warn_10)
        .bind(report.warn_15_17)
        .bind(report.warn_20)
        .bind(report.banned)
        .bind(&report.status_detail)
        .bind(&report.teacher_note)
        .bind(report.study_status.as_str())
        .bind(report.assessment_date)
        .bind(report.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(report.id));
        }
        Ok(())
    }
}

#[async_trait]
impl NoteHistory for PgReportStore {
    async fn open(&self, request: HistoryRequest) -> Result<(), StoreError> {
        let entries = fetch_note_history(&self.pool, request.report_id, request.kind).await?;
        print!("{}", report::render_history(&request, &entries));
        Ok(())
    }
}

#[async_trait]
impl VersioningFlow for PgReportStore {
    async fn submit(&self, current: &Report, update: VersionUpdate) -> Result<Report, StoreError> {
        let next = update.apply_to(current, Utc::now());
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO academic_alert.report_versions
            (id, report_id, study_status, assessment_date, warn_10, warn_15_17, warn_20, banned, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(next.id)
        .bind(next.study_status.as_str())
        .bind(next.assessment_date)
        .bind(next.warn_10)
        .bind(next.warn_15_17)
        .bind(next.warn_20)
        .bind(next.banned)
        .bind(next.updated_at)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            UPDATE academic_alert.reports
            SET study_status = $2, assessment_date = $3, warn_10 = $4, warn_15_17 = $5,
                warn_20 = $6, banned = $7, status_detail = $8, teacher_note = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(next.id)
        .bind(next.study_status.as_str())
        .bind(next.assessment_date)
        .bind(next.warn_10)
        .bind(next.warn_15_17)
        .bind(next.warn_20)
        .bind(next.banned)
        .bind(&next.status_detail)
        .bind(&next.teacher_note)
        .bind(next.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(next.id));
        }

        tx.commit().await?;
        Ok(next)
    }
}
