//! Cycle CLI - Command-line interface for Cycle Intel
//!
//! Commands:
//! - log: Save one day's log and run a full pass
//! - analyze: Print cycle analysis, predictions and patterns
//! - reconcile: Run a full pass and reschedule reminders
//! - reminders: Show the reminders a pass would schedule (dry run)
//! - report: Render the text report or JSON export
//! - permission: Grant or revoke notification permission for the outbox
//! - doctor: Diagnose data directory and configuration

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cycle_intel::notify::{Clock, FileOutbox, FixedClock, Notifier, SystemClock};
use cycle_intel::pipeline::{CycleEngine, PassOutcome, ReminderStatus};
use cycle_intel::report::{export_json, render_text};
use cycle_intel::store::{default_data_dir, JsonFileLogStore, LogStore};
use cycle_intel::types::{
    parse_date, EnergyLevel, FlowIntensity, FocusLevel, LifestyleFactor, LogEntry, Mood,
    PhysicalSymptom, SleepQuality,
};
use cycle_intel::{EngineConfig, EngineError, ENGINE_VERSION, PRODUCER_NAME};

/// File name of the optional config inside the data directory
const CONFIG_FILE_NAME: &str = "config.json";

/// Environment variable holding the tracing filter
const LOG_ENV: &str = "CYCLE_LOG";

/// Cycle - On-device cycle intelligence
#[derive(Parser)]
#[command(name = "cycle")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Track daily logs, predict cycles and schedule reminders", long_about = None)]
struct Cli {
    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Engine config JSON (defaults to config.json in the data dir, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pin the current date (YYYY-MM-DD, midnight local time)
    #[arg(long, global = true)]
    today: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save one day's log (replacing any existing entry) and run a full pass
    Log {
        /// Date of the log (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Start from a JSON log entry (file path, or - for stdin)
        #[arg(long)]
        entry: Option<PathBuf>,

        /// Flow intensity
        #[arg(long)]
        flow: Option<FlowIntensity>,

        /// Physical symptom (repeatable)
        #[arg(long = "symptom")]
        symptoms: Vec<PhysicalSymptom>,

        /// Mood (repeatable)
        #[arg(long = "mood")]
        moods: Vec<Mood>,

        /// Energy level
        #[arg(long)]
        energy: Option<EnergyLevel>,

        /// Sleep quality
        #[arg(long)]
        sleep: Option<SleepQuality>,

        /// Focus level
        #[arg(long)]
        focus: Option<FocusLevel>,

        /// Lifestyle factor (repeatable)
        #[arg(long = "lifestyle")]
        lifestyle: Vec<LifestyleFactor>,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,

        /// Output format (defaults to pretty JSON on a terminal)
        #[arg(long)]
        output_format: Option<OutputFormat>,
    },

    /// Print cycle analysis, predictions and patterns
    Analyze {
        #[arg(long)]
        output_format: Option<OutputFormat>,
    },

    /// Run a full pass and reschedule reminders into the outbox
    Reconcile {
        #[arg(long)]
        output_format: Option<OutputFormat>,
    },

    /// Show the reminders a pass would schedule, without scheduling them
    Reminders {
        #[arg(long)]
        output_format: Option<OutputFormat>,
    },

    /// Render the report
    Report {
        /// Report format
        #[arg(long, default_value = "text")]
        format: ReportFormat,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Grant or revoke notification permission for the outbox
    Permission {
        #[arg(value_enum)]
        state: PermissionState,
    },

    /// Diagnose data directory and configuration
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    /// Plain-text report
    Text,
    /// JSON export of logs and analysis
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum PermissionState {
    Grant,
    Deny,
}

/// Wall clock for the CLI: the host clock, or a pinned date
enum CliClock {
    System(SystemClock),
    Fixed(FixedClock),
}

impl Clock for CliClock {
    fn now(&self) -> chrono::DateTime<chrono::FixedOffset> {
        match self {
            CliClock::System(clock) => clock.now(),
            CliClock::Fixed(clock) => clock.now(),
        }
    }

    fn local_timestamp(&self, local: chrono::NaiveDateTime) -> Option<i64> {
        match self {
            CliClock::System(clock) => clock.local_timestamp(local),
            CliClock::Fixed(clock) => clock.local_timestamp(local),
        }
    }
}

/// Resolved global options
struct Context {
    data_dir: PathBuf,
    config: EngineConfig,
    clock: CliClock,
}

impl Context {
    fn resolve(cli: &Cli) -> Result<Self, CycleCliError> {
        let data_dir = match &cli.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };

        let config = match &cli.config {
            Some(path) => EngineConfig::load(path)?,
            None => {
                let default_path = data_dir.join(CONFIG_FILE_NAME);
                if default_path.exists() {
                    EngineConfig::load(&default_path)?
                } else {
                    EngineConfig::default()
                }
            }
        };

        let clock = match &cli.today {
            Some(today) => {
                let date = parse_date(today)?;
                let offset = Local::now().offset().local_minus_utc();
                CliClock::Fixed(FixedClock::at(date, 0, 0, offset)?)
            }
            None => CliClock::System(SystemClock),
        };

        Ok(Self {
            data_dir,
            config,
            clock,
        })
    }

    fn engine(self) -> Result<CycleEngine<JsonFileLogStore, FileOutbox, CliClock>, CycleCliError> {
        let store = JsonFileLogStore::in_dir(&self.data_dir);
        let outbox = FileOutbox::in_dir(&self.data_dir, self.clock.now().timestamp());
        Ok(CycleEngine::new(store, outbox, self.clock).with_config(self.config)?)
    }
}

static TRACING: Once = Once::new();

/// Install the stderr subscriber.
///
/// Reads `CYCLE_LOG` (e.g. `CYCLE_LOG=cycle_intel=debug`); falls back to
/// `cycle_intel=info` when unset or invalid.
fn init_tracing() {
    TRACING.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("cycle_intel=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CycleCliError> {
    let ctx = Context::resolve(&cli)?;

    match cli.command {
        Commands::Log {
            date,
            entry,
            flow,
            symptoms,
            moods,
            energy,
            sleep,
            focus,
            lifestyle,
            notes,
            output_format,
        } => {
            let mut log = match entry {
                Some(path) => read_entry(&path)?,
                None => LogEntry::default(),
            };
            if let Some(flow) = flow {
                log.flow = flow;
            }
            log.physical_symptoms.extend(symptoms);
            log.moods.extend(moods);
            log.lifestyle.extend(lifestyle);
            log.energy = energy.or(log.energy);
            log.sleep = sleep.or(log.sleep);
            log.focus = focus.or(log.focus);
            if let Some(notes) = notes {
                log.notes = notes;
            }
            cmd_log(ctx, date.as_deref(), log, output_format)
        }

        Commands::Analyze { output_format } => cmd_analyze(ctx, output_format),

        Commands::Reconcile { output_format } => cmd_reconcile(ctx, output_format),

        Commands::Reminders { output_format } => cmd_reminders(ctx, output_format),

        Commands::Report { format, output } => cmd_report(ctx, format, &output),

        Commands::Permission { state } => cmd_permission(ctx, state),

        Commands::Doctor { json } => cmd_doctor(ctx, json),
    }
}

fn cmd_log(
    ctx: Context,
    date: Option<&str>,
    entry: LogEntry,
    output_format: Option<OutputFormat>,
) -> Result<(), CycleCliError> {
    let date: NaiveDate = match date {
        Some(d) => parse_date(d)?,
        None => ctx.clock.today(),
    };

    let mut engine = ctx.engine()?;
    let outcome = engine.save_log(date, entry)?;

    // The log is saved even when reminders could not be updated.
    println!("{}", format_output(&outcome, output_format)?);
    Ok(())
}

#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    analysis: &'a cycle_intel::Analysis,
    insights: Vec<String>,
}

fn cmd_analyze(ctx: Context, output_format: Option<OutputFormat>) -> Result<(), CycleCliError> {
    let engine = ctx.engine()?;
    let analysis = engine.recompute()?;
    let output = AnalyzeOutput {
        insights: analysis.patterns.insights(),
        analysis: &analysis,
    };
    println!("{}", format_output(&output, output_format)?);
    Ok(())
}

fn cmd_reconcile(ctx: Context, output_format: Option<OutputFormat>) -> Result<(), CycleCliError> {
    let mut engine = ctx.engine()?;
    let outcome: PassOutcome = engine.run_pass()?;
    println!("{}", format_output(&outcome, output_format)?);

    match outcome.reminders {
        ReminderStatus::Scheduled(_) => Ok(()),
        ReminderStatus::PermissionDenied => Err(CycleCliError::PermissionDenied),
        ReminderStatus::Failed { message } => Err(CycleCliError::ReminderFailed(message)),
    }
}

fn cmd_reminders(ctx: Context, output_format: Option<OutputFormat>) -> Result<(), CycleCliError> {
    let engine = ctx.engine()?;
    let analysis = engine.recompute()?;
    let plan = engine.plan_reminders(&analysis);
    println!("{}", format_output(&plan, output_format)?);
    Ok(())
}

fn cmd_report(ctx: Context, format: ReportFormat, output: &Path) -> Result<(), CycleCliError> {
    let engine = ctx.engine()?;
    let logs = engine.store().get_all()?;
    let analysis = engine.recompute()?;

    let rendered = match format {
        ReportFormat::Text => render_text(&logs, &analysis),
        ReportFormat::Json => export_json(&logs, &analysis)? + "\n",
    };

    if output.to_string_lossy() == "-" {
        print!("{}", rendered);
    } else {
        fs::write(output, rendered)?;
    }
    Ok(())
}

fn cmd_permission(ctx: Context, state: PermissionState) -> Result<(), CycleCliError> {
    let mut outbox = FileOutbox::in_dir(&ctx.data_dir, ctx.clock.now().timestamp());
    let granted = matches!(state, PermissionState::Grant);
    outbox.set_permission(granted)?;
    println!(
        "Notification permission {} ({})",
        if granted { "granted" } else { "revoked" },
        outbox.path().display()
    );
    Ok(())
}

fn cmd_doctor(ctx: Context, json: bool) -> Result<(), CycleCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Cycle Intel version {}", ENGINE_VERSION),
    });

    checks.push(match ctx.config.validate() {
        Ok(()) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "Cycle range {}-{} days, reminders at {:02}:00",
                ctx.config.min_cycle_days, ctx.config.max_cycle_days, ctx.config.reminder_hour
            ),
        },
        Err(e) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    checks.push(if ctx.data_dir.is_dir() {
        DoctorCheck {
            name: "data_dir".to_string(),
            status: CheckStatus::Ok,
            message: format!("{}", ctx.data_dir.display()),
        }
    } else {
        DoctorCheck {
            name: "data_dir".to_string(),
            status: CheckStatus::Warning,
            message: format!("{} does not exist yet", ctx.data_dir.display()),
        }
    });

    let store = JsonFileLogStore::in_dir(&ctx.data_dir);
    checks.push(match store.get_all() {
        Ok(logs) if store.exists() => DoctorCheck {
            name: "logs".to_string(),
            status: CheckStatus::Ok,
            message: format!("{} days logged", logs.len()),
        },
        Ok(_) => DoctorCheck {
            name: "logs".to_string(),
            status: CheckStatus::Warning,
            message: "No logs file yet".to_string(),
        },
        Err(e) => DoctorCheck {
            name: "logs".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    let mut outbox = FileOutbox::in_dir(&ctx.data_dir, ctx.clock.now().timestamp());
    let permission = outbox.request_permission();
    checks.push(match (permission, outbox.pending()) {
        (Ok(true), Ok(pending)) => DoctorCheck {
            name: "outbox".to_string(),
            status: CheckStatus::Ok,
            message: format!("Permission granted, {} reminders pending", pending.len()),
        },
        (Ok(false), Ok(_)) => DoctorCheck {
            name: "outbox".to_string(),
            status: CheckStatus::Warning,
            message: "Notification permission revoked; reminders are not scheduled".to_string(),
        },
        (Err(e), _) | (_, Err(e)) => DoctorCheck {
            name: "outbox".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    checks.push(DoctorCheck {
        name: "stdout".to_string(),
        status: CheckStatus::Ok,
        message: if atty::is(atty::Stream::Stdout) {
            "stdout is a TTY (pretty JSON by default)".to_string()
        } else {
            "stdout is a pipe (compact JSON by default)".to_string()
        },
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Cycle Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(CycleCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_entry(path: &Path) -> Result<LogEntry, CycleCliError> {
    let raw = if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&raw)?)
}

fn format_output<T: Serialize>(value: &T, format: Option<OutputFormat>) -> Result<String, CycleCliError> {
    let format = format.unwrap_or(if atty::is(atty::Stream::Stdout) {
        OutputFormat::JsonPretty
    } else {
        OutputFormat::Json
    });

    match format {
        OutputFormat::Json => Ok(serde_json::to_string(value)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
    }
}

// Error types

#[derive(Debug)]
enum CycleCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    PermissionDenied,
    ReminderFailed(String),
    DoctorFailed,
}

impl From<io::Error> for CycleCliError {
    fn from(e: io::Error) -> Self {
        CycleCliError::Io(e)
    }
}

impl From<EngineError> for CycleCliError {
    fn from(e: EngineError) -> Self {
        CycleCliError::Engine(e)
    }
}

impl From<serde_json::Error> for CycleCliError {
    fn from(e: serde_json::Error) -> Self {
        CycleCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CycleCliError> for CliError {
    fn from(e: CycleCliError) -> Self {
        match e {
            CycleCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CycleCliError::Engine(e) => {
                let (code, hint) = match &e {
                    EngineError::PersistenceRead(_) => {
                        ("PERSISTENCE_READ", "Check the logs file in the data directory")
                    }
                    EngineError::PersistenceWrite(_) => {
                        ("PERSISTENCE_WRITE", "Check that the data directory is writable")
                    }
                    EngineError::NotificationPermissionDenied => {
                        ("PERMISSION_DENIED", "Run 'cycle permission grant'")
                    }
                    EngineError::NotificationSchedule(_) => {
                        ("SCHEDULE_ERROR", "Run 'cycle doctor' to inspect the outbox")
                    }
                    EngineError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                    EngineError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Fix the config file or remove it to use defaults")
                    }
                    EngineError::DateParseError(_) => ("DATE_PARSE_ERROR", "Use YYYY-MM-DD dates"),
                    EngineError::DateOutOfRange(_) => {
                        ("DATE_OUT_OF_RANGE", "Check the logs file for implausible dates")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            CycleCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CycleCliError::PermissionDenied => CliError {
                code: "PERMISSION_DENIED".to_string(),
                message: "Notification permission not granted; reminders unchanged".to_string(),
                hint: Some("Run 'cycle permission grant'".to_string()),
            },
            CycleCliError::ReminderFailed(msg) => CliError {
                code: "RECONCILE_FAILED".to_string(),
                message: msg,
                hint: Some("Logs are saved; rerun 'cycle reconcile' to retry".to_string()),
            },
            CycleCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
