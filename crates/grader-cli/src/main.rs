//! Essay Grader CLI
//!
//! The `essay-grader` command grades dissertative-argumentative essays
//! against heuristic rules.
//!
//! ## Commands
//!
//! - `init`: prepare the store and seed the canonical rules
//! - `check`: grade a text with the default rules, nothing stored
//! - `grade`: grade a submission against a model and file a new version
//! - `rules`: inspect and tune stored rules
//! - `models`: manage grading models
//! - `versions`: list the stored versions of an essay

use std::io::{self, BufRead, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use grader_core::{
    default_report_file_name, evaluate_default, grade_submission, render_header, render_report,
    seed_rules, word_count, write_report_json, write_report_text, FeedbackReport, ReportHeader,
    SubmissionRequest,
};
use grader_state::{
    EssayId, EssayStore, ModelId, ModelStore, ParameterBag, RuleId, RulePatch, RuleStore,
    StoreConfig, SurrealStore,
};
use serde_json::Value;
use tracing::{debug, info, Level};

/// Line that ends interactive input on stdin.
const END_OF_INPUT: &str = "FIM";

#[derive(Parser)]
#[command(name = "essay-grader")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Heuristic grader for dissertative-argumentative essays", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Store endpoint (mem://, surrealkv://<path>, ws://host:port)
    #[arg(long, global = true, env = "GRADER_DB_URL")]
    db: Option<String>,

    /// Store namespace
    #[arg(long, global = true, env = "GRADER_DB_NAMESPACE")]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialise the store and seed the canonical rules
    Init,

    /// Grade a text with the default rules without storing anything
    Check {
        /// Essay file, or `-` for stdin
        input: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Exit with status 1 when any rule is not satisfied
        #[arg(long)]
        strict: bool,
    },

    /// Grade a submission and file it as a new essay version
    Grade {
        /// Student name
        #[arg(short, long)]
        student: String,

        /// Essay title
        #[arg(short, long)]
        title: String,

        /// Grading model id
        #[arg(short, long)]
        model: u64,

        /// Essay file, or `-` for stdin
        input: PathBuf,

        /// Score the stored rules (10 points each) instead of comments only
        #[arg(long)]
        scored: bool,

        /// Write the report to this path (default: essay_report_<id>_v<n>.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write and print the report as JSON
        #[arg(long)]
        json: bool,

        /// Do not write a report file
        #[arg(long, conflicts_with = "output")]
        no_file: bool,

        /// Exit with status 1 when any rule is not satisfied
        #[arg(long)]
        strict: bool,
    },

    /// Inspect and tune stored rules
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Manage grading models
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },

    /// List the stored versions of an essay
    Versions {
        /// Essay id
        essay_id: u64,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// List stored rules
    List,

    /// Show one rule and its parameters
    Show {
        /// Rule id
        id: u64,
    },

    /// Set one parameter of a rule (value parsed as JSON, else taken as a string)
    SetParam {
        /// Rule id
        id: u64,
        /// Parameter name
        key: String,
        /// Parameter value
        value: String,
    },

    /// Delete every stored rule and seed the canonical set again
    Reset,
}

#[derive(Subcommand)]
enum ModelsAction {
    /// List models
    List,

    /// Create a model
    Create {
        /// Model name
        #[arg(short, long)]
        name: String,

        /// Model description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Per-kind overrides as a JSON object, e.g. '{"minimum_length": {"min_words": 200}}'
        #[arg(long)]
        params: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    grader_core::telemetry::init_tracing(cli.json_logs, level);

    dispatch(cli).await
}

/// Run `check` directly; connect to the store for every other command.
async fn dispatch(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        // `check` never touches the store
        Commands::Check {
            input,
            json,
            strict,
        } => {
            let all_ok = cmd_check(&input, json)?;
            Ok(exit_code(strict, all_ok))
        }
        command => {
            let config = store_config(cli.db.as_deref(), cli.namespace.as_deref())?;
            let store = SurrealStore::connect(&config)
                .await
                .with_context(|| format!("Failed to connect to store at {}", config.endpoint))?;
            run(command, &store).await
        }
    }
}

async fn run(command: Commands, store: &SurrealStore) -> Result<ExitCode> {
    match command {
        Commands::Init => cmd_init(store).await?,
        Commands::Check { .. } => unreachable!("`check` runs without a store"),
        Commands::Grade {
            student,
            title,
            model,
            input,
            scored,
            output,
            json,
            no_file,
            strict,
        } => {
            let text = read_essay(&input)?;
            let options = GradeOptions {
                scored,
                json,
                output: if no_file {
                    ReportOutput::None
                } else {
                    output.map_or(ReportOutput::Default, ReportOutput::Path)
                },
            };
            let all_ok = cmd_grade(store, &student, &title, ModelId(model), text, &options).await?;
            return Ok(exit_code(strict, all_ok));
        }
        Commands::Rules { action } => match action {
            RulesAction::List => cmd_rules_list(store).await?,
            RulesAction::Show { id } => cmd_rules_show(store, RuleId(id)).await?,
            RulesAction::SetParam { id, key, value } => {
                cmd_rules_set_param(store, RuleId(id), &key, &value).await?;
            }
            RulesAction::Reset => cmd_rules_reset(store).await?,
        },
        Commands::Models { action } => match action {
            ModelsAction::List => cmd_models_list(store).await?,
            ModelsAction::Create {
                name,
                description,
                params,
            } => {
                cmd_models_create(store, &name, &description, params.as_deref()).await?;
            }
        },
        Commands::Versions { essay_id } => cmd_versions(store, EssayId(essay_id)).await?,
    }

    Ok(ExitCode::SUCCESS)
}

fn exit_code(strict: bool, all_ok: bool) -> ExitCode {
    if strict && !all_ok {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Environment config with command-line overrides applied.
fn store_config(db: Option<&str>, namespace: Option<&str>) -> Result<StoreConfig> {
    let mut config = StoreConfig::from_env().context("Invalid store configuration")?;
    if let Some(endpoint) = db {
        config.endpoint = endpoint.to_string();
    }
    if let Some(ns) = namespace {
        config = config.with_namespace(ns);
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Read lines until EOF or a line reading `FIM`.
fn read_until_sentinel<R: BufRead>(reader: R) -> io::Result<String> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim() == END_OF_INPUT {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

/// Essay text from a file, or from stdin when `input` is `-`.
fn read_essay(input: &Path) -> Result<String> {
    let text = if input == Path::new("-") {
        eprintln!("Type or paste the essay. End with a line reading '{END_OF_INPUT}' or EOF.");
        read_until_sentinel(io::stdin().lock()).context("Failed to read essay from stdin")?
    } else {
        let mut text = String::new();
        std::fs::File::open(input)
            .and_then(|mut f| f.read_to_string(&mut text))
            .with_context(|| format!("Failed to read essay from {:?}", input))?;
        text
    };

    if text.trim().is_empty() {
        bail!("Essay text is empty");
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Initialise the store and seed the canonical rules
async fn cmd_init(store: &SurrealStore) -> Result<()> {
    let inserted = seed_rules(store).await.context("Failed to seed rules")?;
    let total = store.count_rules().await?;

    if inserted == 0 {
        println!("Store already initialised ({total} rules).");
    } else {
        println!("Initialised store with {inserted} canonical rules.");
    }
    Ok(())
}

/// Grade with the default rules; returns whether every rule passed
fn cmd_check(input: &Path, json: bool) -> Result<bool> {
    let text = read_essay(input)?;
    let report = FeedbackReport::from(evaluate_default(&text));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report, true));
    }
    Ok(report.all_ok())
}

enum ReportOutput {
    None,
    Default,
    Path(PathBuf),
}

struct GradeOptions {
    scored: bool,
    json: bool,
    output: ReportOutput,
}

/// Grade and file a submission; returns whether every rule passed
async fn cmd_grade(
    store: &SurrealStore,
    student: &str,
    title: &str,
    model_id: ModelId,
    text: String,
    options: &GradeOptions,
) -> Result<bool> {
    info!(student, title, model = %model_id, "grading submission");

    let request = SubmissionRequest {
        student: student.to_string(),
        title: title.to_string(),
        model_id,
        text,
        scored: options.scored,
    };
    let result = grade_submission(store, request)
        .await
        .context("Failed to grade submission")?;

    let header = ReportHeader {
        student: student.to_string(),
        title: title.to_string(),
        essay_id: result.essay_id,
        version: result.version,
        generated_at: chrono::Utc::now(),
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_header(&header));
        print!("{}", render_report(&result.report, true));
    }

    let path = match &options.output {
        ReportOutput::None => None,
        ReportOutput::Default => {
            let mut name = default_report_file_name(result.essay_id, result.version);
            if options.json {
                name = name.replace(".txt", ".json");
            }
            Some(PathBuf::from(name))
        }
        ReportOutput::Path(path) => Some(path.clone()),
    };

    if let Some(path) = path {
        if options.json {
            write_report_json(&path, &result.report)
        } else {
            write_report_text(&path, &result.report, Some(&header))
        }
        .with_context(|| format!("Failed to write report to {:?}", path))?;
        eprintln!("Report written to {}", path.display());
    }

    Ok(result.report.all_ok())
}

/// List stored rules
async fn cmd_rules_list(store: &SurrealStore) -> Result<()> {
    let rules = store.fetch_rules().await?;

    if rules.is_empty() {
        println!("No rules stored. Run 'essay-grader init' first.");
        return Ok(());
    }

    for rule in rules {
        println!(
            "{:>3}  {:<24} {} ({} params)",
            rule.id,
            rule.kind,
            rule.name,
            rule.parameters.len()
        );
    }
    Ok(())
}

/// Show one rule and its parameters
async fn cmd_rules_show(store: &SurrealStore, id: RuleId) -> Result<()> {
    let rule = store
        .fetch_rule(id)
        .await
        .with_context(|| format!("Rule {id} not found"))?;

    println!("rule {}", rule.id);
    println!("Name:        {}", rule.name);
    println!("Kind:        {}", rule.kind);
    println!("Description: {}", rule.description);
    println!(
        "Created:     {}",
        rule.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();
    println!("{}", serde_json::to_string_pretty(&rule.parameters)?);
    Ok(())
}

/// Parse a command-line parameter value: JSON when it parses, else a string.
fn parse_param_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Set one parameter of a rule
async fn cmd_rules_set_param(
    store: &SurrealStore,
    id: RuleId,
    key: &str,
    raw: &str,
) -> Result<ParameterBag> {
    let rule = store
        .fetch_rule(id)
        .await
        .with_context(|| format!("Rule {id} not found"))?;

    let value = parse_param_value(raw);
    debug!(rule = %id, key, %value, "setting parameter");
    let parameters = rule.parameters.with(key, value);

    let updated = store
        .update_rule(
            id,
            RulePatch {
                parameters: Some(parameters),
                ..Default::default()
            },
        )
        .await
        .with_context(|| format!("Failed to update rule {id}"))?;

    println!("Updated '{}': {} = {}", updated.name, key, raw);
    Ok(updated.parameters)
}

/// Delete every stored rule and seed the canonical set again
async fn cmd_rules_reset(store: &SurrealStore) -> Result<()> {
    let rules = store.fetch_rules().await?;
    let removed = rules.len();
    for rule in rules {
        store.delete_rule(rule.id).await?;
    }
    let inserted = seed_rules(store).await?;

    println!("Removed {removed} rules, seeded {inserted} canonical rules.");
    Ok(())
}

/// List models
async fn cmd_models_list(store: &SurrealStore) -> Result<()> {
    let models = store.list_models().await?;

    if models.is_empty() {
        println!("No models found. Create one with 'essay-grader models create'.");
        return Ok(());
    }

    for model in models {
        println!("{:>3}  {}", model.id, model.name);
        if !model.description.is_empty() {
            println!("     {}", model.description);
        }
        if !model.parameters.is_empty() {
            println!("     overrides: {}", model.parameters.into_value());
        }
    }
    Ok(())
}

/// Create a model
async fn cmd_models_create(
    store: &SurrealStore,
    name: &str,
    description: &str,
    params: Option<&str>,
) -> Result<ModelId> {
    let parameters = match params {
        Some(raw) => {
            let value: Value =
                serde_json::from_str(raw).context("Model parameters must be valid JSON")?;
            ParameterBag::try_from(value).context("Model parameters must be a JSON object")?
        }
        None => ParameterBag::new(),
    };

    let id = store.create_model(name, description, parameters).await?;
    println!("Created model {id}: {name}");
    Ok(id)
}

/// List the stored versions of an essay
async fn cmd_versions(store: &SurrealStore, essay_id: EssayId) -> Result<()> {
    let essay = store
        .get_essay(essay_id)
        .await
        .with_context(|| format!("Essay {essay_id} not found"))?;
    let versions = store.list_versions(essay_id).await?;

    println!(
        "essay {} \"{}\" by {} (model {})",
        essay.id, essay.title, essay.student, essay.model_id
    );
    for version in versions {
        println!(
            "  v{:<3} {}  {}  {} words",
            version.version,
            version.text_digest.short(),
            version.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            word_count(&version.text)
        );
    }
    Ok(())
}
