use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::analytics::{AnalyticsBackend, AnalyticsEventKind, EventCounts, StoreBackend};
use crate::classify::{classify, Classified};
use crate::config::{resolve_config_path, ConfigError, ConsoleConfig};
use crate::models::{InterruptConfig, Snapshot};
use crate::projector::{presented_status, project, render_path};
use crate::storage::{LocalStore, SqliteStore, StorageError, KEY_API_CREDENTIAL};
use crate::viewstate::InboxFilter;

#[derive(Debug, Parser)]
#[command(name = "triage", version, about = "Review console for interrupted agent tasks")]
pub struct Cli {
    /// Optional config file override (TOML).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level directive, overriding the configured one.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Project snapshot files the way the inbox renders them
    Inbox {
        #[command(subcommand)]
        action: InboxAction,
    },
    /// Classify task payloads
    Payload {
        #[command(subcommand)]
        action: PayloadAction,
    },
    /// Decision history kept in the local store
    Analytics {
        #[command(subcommand)]
        action: AnalyticsAction,
    },
    /// API credential kept in the local store
    Credential {
        #[command(subcommand)]
        action: CredentialAction,
    },
    /// Configuration inspection
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum InboxAction {
    /// Print one row per task: id, presented status, render path
    List {
        /// JSON snapshot file
        #[arg(long)]
        snapshot: PathBuf,

        /// Status filter (all, interrupted, idle, busy, error)
        #[arg(long)]
        filter: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum PayloadAction {
    /// Report whether a payload takes the structured decision path
    Classify {
        /// JSON payload file
        file: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum AnalyticsAction {
    /// Print per-kind event counts
    Show,
    /// Delete the whole event history
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum CredentialAction {
    /// Store the API credential
    Set {
        /// Credential value
        value: String,
    },
    /// Print the stored credential in redacted form
    Show,
    /// Remove the stored credential
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Load, validate, and echo the resolved configuration
    Check,
}

/// Rendering switch shared by every subcommand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// CLI failure split by exit code: usage and configuration problems exit
/// with 2, operational failures with 1.
#[derive(Debug)]
pub enum CliError {
    Usage(String),
    Config(ConfigError),
    Storage(StorageError),
    File { path: PathBuf, message: String },
    Encode(serde_json::Error),
}

impl CliError {
    fn file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CliError::File {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) | CliError::Config(_) => 2,
            CliError::Storage(_) | CliError::File { .. } | CliError::Encode(_) => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Usage(message) => write!(f, "{message}"),
            CliError::Config(err) => write!(f, "{err}"),
            CliError::Storage(err) => write!(f, "{err}"),
            CliError::File { path, message } => write!(f, "{}: {message}", path.display()),
            CliError::Encode(err) => write!(f, "unable to encode output: {err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(err) => Some(err),
            CliError::Storage(err) => Some(err),
            CliError::Encode(err) => Some(err),
            CliError::Usage(_) | CliError::File { .. } => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config(err)
    }
}

impl From<StorageError> for CliError {
    fn from(err: StorageError) -> Self {
        CliError::Storage(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Encode(err)
    }
}

/// Dispatch one parsed invocation. The configuration is loaded by the
/// binary before logging starts, so it arrives here ready to use.
pub fn run(cli: Cli, config: &ConsoleConfig) -> Result<(), CliError> {
    let format = cli.format;
    match cli.command {
        Command::Inbox { action } => match action {
            InboxAction::List { snapshot, filter } => {
                cmd_inbox_list(&snapshot, filter.as_deref(), format)
            }
        },
        Command::Payload { action } => match action {
            PayloadAction::Classify { file } => cmd_payload_classify(&file, format),
        },
        Command::Analytics { action } => match action {
            AnalyticsAction::Show => cmd_analytics_show(config, format),
            AnalyticsAction::Clear => cmd_analytics_clear(config, format),
        },
        Command::Credential { action } => match action {
            CredentialAction::Set { value } => cmd_credential_set(config, &value, format),
            CredentialAction::Show => cmd_credential_show(config, format),
            CredentialAction::Clear => cmd_credential_clear(config, format),
        },
        Command::Config { action } => match action {
            ConfigAction::Check => cmd_config_check(cli.config, config, format),
        },
    }
}

pub fn cmd_inbox_list(
    snapshot_path: &Path,
    filter: Option<&str>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let filter = parse_filter(filter)?;
    let snapshot: Snapshot = read_json_file(snapshot_path)?;
    let rendered = render_inbox_list(&snapshot, filter, format)?;
    println!("{rendered}");
    Ok(())
}

pub fn cmd_payload_classify(payload_path: &Path, format: OutputFormat) -> Result<(), CliError> {
    let payload: Value = read_json_file(payload_path)?;
    let result = classify(payload);
    let rendered = render_classification(&result, format)?;
    println!("{rendered}");
    Ok(())
}

/// Unlike the session ledger, explicit queries surface storage failures.
pub fn cmd_analytics_show(config: &ConsoleConfig, format: OutputFormat) -> Result<(), CliError> {
    let backend = StoreBackend::new(open_store(config)?);
    let events = backend.load_events()?;
    let counts = EventCounts::from_events(&events);
    let rendered = render_counts(&counts, format)?;
    println!("{rendered}");
    Ok(())
}

pub fn cmd_analytics_clear(config: &ConsoleConfig, format: OutputFormat) -> Result<(), CliError> {
    let mut backend = StoreBackend::new(open_store(config)?);
    backend.clear_events()?;
    let rendered = render_ack("analytics history cleared", json!({"cleared": true}), format)?;
    println!("{rendered}");
    Ok(())
}

pub fn cmd_credential_set(
    config: &ConsoleConfig,
    value: &str,
    format: OutputFormat,
) -> Result<(), CliError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CliError::Usage("credential value is empty".to_string()));
    }
    let mut store = open_store(config)?;
    store.set(KEY_API_CREDENTIAL, trimmed)?;
    let redacted = redact_credential(trimmed);
    let rendered = render_ack(
        &format!("credential stored ({redacted})"),
        json!({"stored": true, "credential": redacted}),
        format,
    )?;
    println!("{rendered}");
    Ok(())
}

pub fn cmd_credential_show(config: &ConsoleConfig, format: OutputFormat) -> Result<(), CliError> {
    let store = open_store(config)?;
    let value = store.get(KEY_API_CREDENTIAL)?;
    let rendered = render_credential(value.as_deref(), format)?;
    println!("{rendered}");
    Ok(())
}

pub fn cmd_credential_clear(config: &ConsoleConfig, format: OutputFormat) -> Result<(), CliError> {
    let mut store = open_store(config)?;
    store.remove(KEY_API_CREDENTIAL)?;
    let rendered = render_ack("credential cleared", json!({"cleared": true}), format)?;
    println!("{rendered}");
    Ok(())
}

pub fn cmd_config_check(
    config_override: Option<PathBuf>,
    config: &ConsoleConfig,
    format: OutputFormat,
) -> Result<(), CliError> {
    let source = resolve_config_path(config_override);
    let rendered = render_config_check(source.as_deref(), config, format)?;
    println!("{rendered}");
    Ok(())
}

/// Redacted rendering for the stored credential: the first and last two
/// characters around a fixed mask, or only the mask for short values.
pub fn redact_credential(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}****{tail}")
}

fn parse_filter(raw: Option<&str>) -> Result<InboxFilter, CliError> {
    match raw {
        None => Ok(InboxFilter::All),
        Some(raw) => InboxFilter::parse(raw).ok_or_else(|| {
            CliError::Usage(format!(
                "unknown filter '{raw}' (expected one of: all, interrupted, idle, busy, error)"
            ))
        }),
    }
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = fs::read_to_string(path)
        .map_err(|err| CliError::file(path, format!("unable to read: {err}")))?;
    serde_json::from_str(&raw).map_err(|err| CliError::file(path, format!("invalid JSON: {err}")))
}

fn open_store(config: &ConsoleConfig) -> Result<SqliteStore, CliError> {
    let data_dir = config.data_dir();
    fs::create_dir_all(&data_dir).map_err(|err| {
        CliError::file(&data_dir, format!("unable to create data directory: {err}"))
    })?;
    Ok(SqliteStore::open(config.store_path())?)
}

fn render_inbox_list(
    snapshot: &Snapshot,
    filter: InboxFilter,
    format: OutputFormat,
) -> Result<String, CliError> {
    let total = snapshot.records.len();
    let projected = project(&snapshot.records, filter);
    match format {
        OutputFormat::Text => {
            let mut lines: Vec<String> = projected
                .iter()
                .map(|record| {
                    format!(
                        "{:<28} {:<14} {}",
                        record.id(),
                        presented_status(record).label(),
                        render_path(record).as_str()
                    )
                })
                .collect();
            lines.push(format!("{} of {} tasks", projected.len(), total));
            Ok(lines.join("\n"))
        }
        OutputFormat::Json => {
            let tasks: Vec<Value> = projected
                .iter()
                .map(|record| {
                    json!({
                        "id": record.id(),
                        "status": presented_status(record).as_str(),
                        "renderPath": render_path(record).as_str(),
                    })
                })
                .collect();
            let body = json!({
                "filter": filter.as_str(),
                "count": tasks.len(),
                "tasks": tasks,
            });
            Ok(serde_json::to_string_pretty(&body)?)
        }
    }
}

fn render_classification(result: &Classified, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Text => match result {
            Classified::Structured(interrupts) => {
                let mut lines = vec![format!("structured ({} interrupts)", interrupts.len())];
                for interrupt in interrupts {
                    lines.push(format!(
                        "  {:<24} [{}]",
                        display_action(&interrupt.action_request.action),
                        capability_list(&interrupt.config)
                    ));
                }
                Ok(lines.join("\n"))
            }
            Classified::Raw(_) => Ok("raw".to_string()),
        },
        OutputFormat::Json => {
            let body = match result {
                Classified::Structured(interrupts) => json!({
                    "classification": "structured",
                    "count": interrupts.len(),
                    "interrupts": interrupts,
                }),
                Classified::Raw(payload) => json!({
                    "classification": "raw",
                    "payload": payload,
                }),
            };
            Ok(serde_json::to_string_pretty(&body)?)
        }
    }
}

fn render_counts(counts: &EventCounts, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Text => {
            let mut lines: Vec<String> = AnalyticsEventKind::ALL
                .iter()
                .map(|kind| format!("{:<10} {}", kind.as_str(), counts.get(*kind)))
                .collect();
            lines.push(format!("{:<10} {}", "total", counts.total()));
            Ok(lines.join("\n"))
        }
        OutputFormat::Json => {
            let body = json!({
                "accept": counts.accept,
                "edit": counts.edit,
                "response": counts.response,
                "ignore": counts.ignore,
                "resolve": counts.resolve,
                "total": counts.total(),
            });
            Ok(serde_json::to_string_pretty(&body)?)
        }
    }
}

fn render_credential(value: Option<&str>, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Text => Ok(match value {
            Some(value) => redact_credential(value),
            None => "no credential stored".to_string(),
        }),
        OutputFormat::Json => {
            let body = json!({"credential": value.map(redact_credential)});
            Ok(serde_json::to_string_pretty(&body)?)
        }
    }
}

fn render_ack(text: &str, body: Value, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Text => Ok(text.to_string()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&body)?),
    }
}

fn render_config_check(
    source: Option<&Path>,
    config: &ConsoleConfig,
    format: OutputFormat,
) -> Result<String, CliError> {
    let source_text = source.map(|path| path.display().to_string());
    let data_dir = config.data_dir();
    let store_path = config.store_path();
    let log_file = config
        .logging
        .file
        .as_ref()
        .map(|path| path.display().to_string());
    match format {
        OutputFormat::Text => {
            let lines = vec![
                format!(
                    "{:<13} {}",
                    "config file",
                    source_text.as_deref().unwrap_or("<defaults>")
                ),
                format!("{:<13} {}", "data dir", data_dir.display()),
                format!("{:<13} {}", "store path", store_path.display()),
                format!("{:<13} {}", "log level", config.logging.level),
                format!("{:<13} {}", "log file", log_file.as_deref().unwrap_or("<stderr>")),
                format!(
                    "{:<13} {}",
                    "console url",
                    config.links.console_base_url.as_deref().unwrap_or("<unset>")
                ),
            ];
            Ok(lines.join("\n"))
        }
        OutputFormat::Json => {
            let body = json!({
                "configFile": source_text,
                "dataDir": data_dir.display().to_string(),
                "storePath": store_path.display().to_string(),
                "logLevel": config.logging.level,
                "logFile": log_file,
                "consoleUrl": config.links.console_base_url,
            });
            Ok(serde_json::to_string_pretty(&body)?)
        }
    }
}

fn display_action(action: &str) -> &str {
    if action.is_empty() {
        "(no action)"
    } else {
        action
    }
}

fn capability_list(config: &InterruptConfig) -> String {
    let mut caps = Vec::new();
    if config.allow_accept {
        caps.push("accept");
    }
    if config.allow_edit {
        caps.push("edit");
    }
    if config.allow_respond {
        caps.push("respond");
    }
    if config.allow_ignore {
        caps.push("ignore");
    }
    if caps.is_empty() {
        "none".to_string()
    } else {
        caps.join(", ")
    }
}
