//! Command-line front end for the ability engine.
//!
//! Loads a JSON [`Snapshot`], compiles it and answers queries against the
//! result. Every command renders pretty JSON so the output can be piped.

pub mod snapshot;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value, json};

use courseware_ability::{
    AbilityConfig, Action, SubjectInstance, SubjectType, compile, compile_detailed,
};
use courseware_observability::LogFormat;

pub use snapshot::{Snapshot, flatten_resource_ids};

#[derive(Parser, Debug)]
#[command(name = "courseware-ability", about = "Inspect compiled content-access abilities")]
pub struct Cli {
    /// Log line format on stderr.
    #[arg(long, value_enum, default_value_t = LogStyle::Compact, global = true)]
    pub log_format: LogStyle,

    /// JSON file with an `AbilityConfig`; the environment is used when omitted.
    #[arg(long, global = true, env = "COURSEWARE_ABILITY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every compiled rule.
    Rules(SnapshotArgs),
    /// Print what each resolver concluded alongside the rules.
    Summary(SnapshotArgs),
    /// Answer a single query with true or false.
    Can(QueryArgs),
    /// Explain which rule decided a query.
    Explain(QueryArgs),
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Snapshot JSON file.
    pub snapshot: PathBuf,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Snapshot JSON file.
    pub snapshot: PathBuf,
    /// Action to check, e.g. `read`.
    pub action: String,
    /// Subject type, e.g. `Content`.
    pub subject: String,
    /// Instance field as `key=value`; values parse as JSON, else as a string.
    /// Without any field the query is type-only.
    #[arg(long = "field", short = 'f', value_name = "KEY=VALUE")]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogStyle {
    Compact,
    Json,
}

impl From<LogStyle> for LogFormat {
    fn from(style: LogStyle) -> Self {
        match style {
            LogStyle::Compact => LogFormat::Compact,
            LogStyle::Json => LogFormat::Json,
        }
    }
}

/// Resolve the engine config from `--config` or the environment.
pub fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AbilityConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))
        }
        None => AbilityConfig::from_env().context("invalid ability configuration in environment"),
    }
}

/// Run one command and return its rendered output.
pub fn run(cli: &Cli) -> anyhow::Result<String> {
    let config = load_config(cli.config.as_ref())?;

    let value = match &cli.command {
        Command::Rules(args) => {
            let snapshot = Snapshot::load(&args.snapshot)?;
            let ability = compile(&snapshot.input(), &config);
            serde_json::to_value(&ability)?
        }
        Command::Summary(args) => {
            let snapshot = Snapshot::load(&args.snapshot)?;
            serde_json::to_value(compile_detailed(&snapshot.input(), &config))?
        }
        Command::Can(query) => {
            let snapshot = Snapshot::load(&query.snapshot)?;
            let ability = compile(&snapshot.input(), &config);
            let (action, kind, fields) = parse_query(query)?;
            let granted = match fields {
                Some(fields) => ability.can(action, &instance(kind, fields)),
                None => ability.can(action, kind),
            };
            tracing::info!(%action, subject = %kind, granted, "query evaluated");
            json!({ "action": action, "subject": kind, "granted": granted })
        }
        Command::Explain(query) => {
            let snapshot = Snapshot::load(&query.snapshot)?;
            let ability = compile(&snapshot.input(), &config);
            let (action, kind, fields) = parse_query(query)?;
            let explanation = match fields {
                Some(fields) => ability.explain(action, &instance(kind, fields)),
                None => ability.explain(action, kind),
            };
            serde_json::to_value(explanation)?
        }
    };

    Ok(serde_json::to_string_pretty(&value)?)
}

fn instance(kind: SubjectType, fields: Map<String, Value>) -> SubjectInstance {
    SubjectInstance { kind, fields }
}

type ParsedQuery = (Action, SubjectType, Option<Map<String, Value>>);

fn parse_query(query: &QueryArgs) -> anyhow::Result<ParsedQuery> {
    let action: Action = query.action.parse()?;
    let kind: SubjectType = query.subject.parse()?;

    if query.fields.is_empty() {
        return Ok((action, kind, None));
    }

    let mut fields = Map::new();
    for raw in &query.fields {
        let (key, value) = parse_field(raw)?;
        fields.insert(key, value);
    }
    Ok((action, kind, Some(fields)))
}

/// Split `key=value`; the value is JSON when it parses, a plain string otherwise.
pub fn parse_field(raw: &str) -> anyhow::Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("field '{raw}' is not in KEY=VALUE form"))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("field '{raw}' has an empty key");
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.to_owned(), value))
}
