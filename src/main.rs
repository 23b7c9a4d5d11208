use std::path::PathBuf;
use std::process::ExitCode;

use academic_alert::card::ReportCard;
use academic_alert::config::AppConfig;
use academic_alert::db::{self, PgReportStore};
use academic_alert::models::{DraftEdit, DraftFlag, NoteKind, Profile, Role, StudyStatus, VersionUpdate};
use academic_alert::nav::DashboardShell;
use academic_alert::ports::{ConsoleNotifier, LoggingObserver, SessionDeps};
use academic_alert::session::{ReportEditSession, SaveOutcome};
use academic_alert::{fatal, logging, report, warning};
use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "academic-alert")]
#[command(about = "Attendance warning reports for teachers and department heads", long_about = None)]
struct Cli {
    /// Debug-level logging
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the navigation a user would see
    Nav(NavArgs),
    #[command(flatten)]
    Store(StoreCommand),
}

#[derive(Args)]
struct NavArgs {
    /// gv, cnbm or truong_nganh
    #[arg(long)]
    role: Option<Role>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    campus: Option<String>,
    #[arg(long, default_value = "/")]
    path: String,
    /// Show the mobile overlay menu as open
    #[arg(long)]
    menu: bool,
}

/// Commands that need the Postgres store.
#[derive(Subcommand)]
enum StoreCommand {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import reports from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print report cards, most severe first
    List {
        #[arg(long)]
        campus: Option<String>,
        /// Only reports with at least one raised flag
        #[arg(long)]
        flagged: bool,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown digest
    Digest {
        #[arg(long)]
        campus: Option<String>,
        #[arg(long, default_value = "digest.md")]
        out: PathBuf,
    },
    /// Edit a report and save it
    Edit {
        #[arg(long)]
        id: Uuid,
        #[command(flatten)]
        fields: EditFields,
    },
    /// Show the history of one note field
    History {
        #[arg(long)]
        id: Uuid,
        /// status_detail, teacher_note or dvsv_note
        #[arg(long)]
        note: NoteKind,
    },
    /// Add a note entry and make it the current value
    Note {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        note: NoteKind,
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "staff")]
        author: String,
    },
    /// Record a new status version (status, assessment date, flags)
    Version {
        #[arg(long)]
        id: Uuid,
        #[command(flatten)]
        fields: EditFields,
    },
}

#[derive(Args)]
struct EditFields {
    #[arg(long)]
    warn_10: Option<bool>,
    #[arg(long)]
    warn_15_17: Option<bool>,
    #[arg(long)]
    warn_20: Option<bool>,
    #[arg(long)]
    banned: Option<bool>,
    #[arg(long)]
    status_detail: Option<String>,
    #[arg(long)]
    teacher_note: Option<String>,
    #[arg(long)]
    study_status: Option<String>,
    #[arg(long, conflicts_with = "clear_assessment_date")]
    assessment_date: Option<NaiveDate>,
    #[arg(long)]
    clear_assessment_date: bool,
}

impl EditFields {
    fn into_edits(self) -> Vec<DraftEdit> {
        let mut edits = Vec::new();
        let flags = [
            (DraftFlag::Warn10, self.warn_10),
            (DraftFlag::Warn15To17, self.warn_15_17),
            (DraftFlag::Warn20, self.warn_20),
            (DraftFlag::Banned, self.banned),
        ];
        for (flag, value) in flags {
            if let Some(value) = value {
                edits.push(DraftEdit::Flag(flag, value));
            }
        }
        if let Some(text) = self.status_detail {
            edits.push(DraftEdit::StatusDetail(text));
        }
        if let Some(text) = self.teacher_note {
            edits.push(DraftEdit::TeacherNote(text));
        }
        if let Some(status) = self.study_status {
            edits.push(DraftEdit::StudyStatus(StudyStatus::from(status)));
        }
        if self.clear_assessment_date {
            edits.push(DraftEdit::AssessmentDate(None));
        } else if let Some(date) = self.assessment_date {
            edits.push(DraftEdit::AssessmentDate(Some(date)));
        }
        edits
    }

    fn into_version(self, base: VersionUpdate) -> VersionUpdate {
        let mut update = base;
        for edit in self.into_edits() {
            match edit {
                DraftEdit::Flag(DraftFlag::Warn10, v) => update.warn_10 = v,
                DraftEdit::Flag(DraftFlag::Warn15To17, v) => update.warn_15_17 = v,
                DraftEdit::Flag(DraftFlag::Warn20, v) => update.warn_20 = v,
                DraftEdit::Flag(DraftFlag::Banned, v) => update.banned = v,
                DraftEdit::StatusDetail(text) => update.status_detail = Some(text),
                DraftEdit::TeacherNote(text) => update.teacher_note = Some(text),
                DraftEdit::StudyStatus(status) => update.study_status = status,
                DraftEdit::AssessmentDate(date) => update.assessment_date = date,
            }
        }
        update
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    fatal::install();
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(cli.command).await {
        Ok(code) => code,
        Err(err) => {
            fatal::trap_rejection(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Nav(args) => {
            print!("{}", render_nav(args));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Store(command) => run_store(command).await,
    }
}

fn render_nav(args: NavArgs) -> String {
    let profile = Profile {
        full_name: args.name,
        role: args.role,
        campus: args.campus,
    };
    let mut shell = DashboardShell::at(args.path);
    if args.menu {
        shell.open_mobile_menu();
    }
    shell.render(Some(&profile))
}

async fn run_store(command: StoreCommand) -> anyhow::Result<ExitCode> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;
    tracing::debug!(max_connections = config.max_connections, "connected to Postgres");
    let store = PgReportStore::new(pool);

    match command {
        StoreCommand::InitDb => {
            db::init_db(store.pool()).await?;
            println!("Schema ready.");
        }
        StoreCommand::Seed => {
            db::seed(store.pool()).await?;
            println!("Seed data inserted.");
        }
        StoreCommand::Import { csv } => {
            let inserted = db::import_csv(store.pool(), &csv).await?;
            println!("Inserted {inserted} reports from {}.", csv.display());
        }
        StoreCommand::List {
            campus,
            flagged,
            limit,
            json,
        } => {
            let mut reports = db::fetch_reports(store.pool(), campus.as_deref(), flagged).await?;
            warning::sort_by_severity(&mut reports);
            reports.truncate(limit);

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else if reports.is_empty() {
                println!("No reports found.");
            } else {
                for report in reports.iter() {
                    println!("{} {}", report.id, ReportCard::from(report));
                }
            }
        }
        StoreCommand::Digest { campus, out } => {
            let reports = db::fetch_reports(store.pool(), campus.as_deref(), false).await?;
            let digest = report::build_digest(campus.as_deref(), Utc::now().date_naive(), &reports);
            std::fs::write(&out, digest)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Digest written to {}.", out.display());
        }
        StoreCommand::Edit { id, fields } => {
            let current = db::fetch_report(store.pool(), id)
                .await
                .with_context(|| format!("failed to load report {id}"))?;
            let mut session = ReportEditSession::new();
            session.open(current);
            for edit in fields.into_edits() {
                session.set_field(edit);
            }

            let deps = SessionDeps {
                store: &store,
                observer: &LoggingObserver,
                notifier: &ConsoleNotifier,
            };
            match session.save(deps).await {
                SaveOutcome::Saved(saved) => println!("{}", ReportCard::from(&saved)),
                SaveOutcome::NotDirty => println!("No changes to save."),
                SaveOutcome::Failed(err) => {
                    eprintln!("{err}. Nothing was changed; run the command again to retry.");
                    return Ok(ExitCode::FAILURE);
                }
                SaveOutcome::Closed | SaveOutcome::InFlight => {}
            }
        }
        StoreCommand::History { id, note } => {
            let current = db::fetch_report(store.pool(), id)
                .await
                .with_context(|| format!("failed to load report {id}"))?;
            let mut session = ReportEditSession::new();
            session.open(current);
            session
                .open_history(note, &store)
                .await
                .context("failed to load note history")?;
        }
        StoreCommand::Note {
            id,
            note,
            text,
            author,
        } => {
            let entry = db::append_note(store.pool(), id, note, &text, &author)
                .await
                .context("failed to add note")?;
            println!(
                "{} note added by {} at {}.",
                entry.kind.as_str(),
                entry.author,
                entry.created_at
            );
        }
        StoreCommand::Version { id, fields } => {
            let current = db::fetch_report(store.pool(), id)
                .await
                .with_context(|| format!("failed to load report {id}"))?;
            let update = fields.into_version(VersionUpdate::from_report(&current));
            let mut session = ReportEditSession::new();
            session.open(current);

            let deps = SessionDeps {
                store: &store,
                observer: &LoggingObserver,
                notifier: &ConsoleNotifier,
            };
            if let Err(err) = session.run_versioning(update, &store, deps).await {
                eprintln!("{err}");
                return Ok(ExitCode::FAILURE);
            }
            if let Some(updated) = session.report() {
                println!("{}", ReportCard::from(updated));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nav_runs_without_the_store() {
        let cli = Cli::try_parse_from([
            "academic-alert",
            "nav",
            "--role",
            "gv",
            "--name",
            "Trần Bình",
            "--path",
            "/my-reports/42",
        ])
        .unwrap();
        let Commands::Nav(args) = cli.command else {
            panic!("expected nav command");
        };
        let text = render_nav(args);
        assert!(text.contains("> Báo cáo của tôi"));
        assert!(!text.contains("Duyệt báo cáo"));
    }

    #[test]
    fn store_commands_parse_under_the_same_binary() {
        let cli = Cli::try_parse_from(["academic-alert", "list", "--flagged", "--limit", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Store(StoreCommand::List { flagged: true, limit: 5, .. })
        ));
    }
}
