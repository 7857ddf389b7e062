mod config;
mod estimator;
mod session;

use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use nits_core::catalog::standard_content;
use nits_core::{CaseReport, Content, Question};
use nits_storage::{JsonFileStore, StorageError};
use nits_tutor::{Selection, Tutor, TutorError, MASTERY_THRESHOLD};
use serde_json::json;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, EstimatorKind};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Negligence intelligent tutoring system.
#[derive(Parser)]
#[command(name = "nits", version, about = "Negligence intelligent tutoring system")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log debug events to stderr
    #[arg(long, global = true)]
    verbose: bool,

    /// Configuration file (default: ~/.config/nits/nits.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Answer history file
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Seed for tie-breaks and sub-question picks
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Skill estimator to use
    #[arg(long, global = true, value_enum)]
    estimator: Option<EstimatorKind>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive tutoring session
    Run {
        /// Do not write the answer history on exit
        #[arg(long)]
        no_save: bool,
        /// Ask this question first
        #[arg(long)]
        first: Option<String>,
    },

    /// Validate the built-in content
    Check,

    /// Analyze a case question (default: every case)
    Case {
        /// Short name of the case question
        name: Option<String>,
    },

    /// Fit the skill model to the stored history and show concept scores
    Scores,

    /// Show the question the tutor would ask next and the ranked candidates
    Select,

    /// Show stored answers and question status
    History {
        /// Clear the stored history
        #[arg(long)]
        reset: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    let content = match standard_content() {
        Ok(content) => Arc::new(content),
        Err(e) => {
            report_error(&format!("invalid content: {}", e), cli.output, cli.quiet);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Run { no_save, first } => {
            cmd_run(&config, content, no_save, first.as_deref(), cli.output, cli.quiet);
        }
        Commands::Check => cmd_check(&content, cli.output),
        Commands::Case { name } => cmd_case(&content, name.as_deref(), cli.output, cli.quiet),
        Commands::Scores => cmd_scores(&config, content, cli.output, cli.quiet),
        Commands::Select => cmd_select(&config, content, cli.output, cli.quiet),
        Commands::History { reset } => cmd_history(&config, content, reset, cli.output, cli.quiet),
    }
}

/// `NITS_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("NITS_LOG")
                .or_else(|_| EnvFilter::try_new(level))
                .unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .try_init();
}

/// The configuration file with command-line overrides applied.
fn load_config(cli: &Cli) -> Result<Config, String> {
    let mut config = Config::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    if let Some(data) = &cli.data {
        config.session.data_file = Some(data.clone());
    }
    if let Some(seed) = cli.seed {
        config.session.seed = Some(seed);
    }
    if let Some(kind) = cli.estimator {
        config.estimator.kind = kind;
    }
    Ok(config)
}

fn runtime(output: OutputFormat, quiet: bool) -> Runtime {
    match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("failed to start runtime: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

fn store(config: &Config, output: OutputFormat, quiet: bool) -> JsonFileStore {
    match config.data_path() {
        Some(path) => JsonFileStore::new(path),
        None => {
            report_error(
                "cannot locate the home directory; pass --data",
                output,
                quiet,
            );
            process::exit(1);
        }
    }
}

fn build_tutor(config: &Config, content: Arc<Content>) -> Tutor {
    let tutor = Tutor::new(content, estimator::build(&config.estimator));
    match config.session.seed {
        Some(seed) => tutor.with_seed(seed),
        None => tutor,
    }
}

/// A tutor with the stored history loaded. Malformed history is
/// reported and the session starts empty.
fn restore_tutor(
    config: &Config,
    content: Arc<Content>,
    rt: &Runtime,
    store: &JsonFileStore,
    output: OutputFormat,
    quiet: bool,
) -> Tutor {
    let mut tutor = build_tutor(config, content);
    match rt.block_on(tutor.load(store)) {
        Ok(restored) => {
            tracing::info!(
                answers = restored.answers,
                dropped = restored.dropped,
                "restored history"
            );
        }
        Err(TutorError::Storage(e @ StorageError::Malformed { .. })) => {
            tracing::warn!(error = %e, "ignoring stored history");
            if !quiet {
                eprintln!("warning: {}; starting with an empty history", e);
            }
        }
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }
    tutor
}

// ── run ──────────────────────────────────────────────────────────────

fn cmd_run(
    config: &Config,
    content: Arc<Content>,
    no_save: bool,
    first: Option<&str>,
    output: OutputFormat,
    quiet: bool,
) {
    let rt = runtime(output, quiet);
    let store = store(config, output, quiet);
    let mut tutor = restore_tutor(config, content, &rt, &store, output, quiet);

    if let Some(first) = first {
        if let Err(e) = tutor.stage_next(first) {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }

    let stdin = io::stdin();
    let mut console = session::Console::new(stdin.lock(), io::stdout());
    let result = session::run(&mut tutor, &rt, &mut console);

    if !no_save {
        if let Err(e) = rt.block_on(tutor.save(&store)) {
            report_error(&format!("failed to save history: {}", e), output, quiet);
            process::exit(1);
        }
        tracing::debug!(location = %store.path().display(), "saved history");
    }
    if let Err(e) = result {
        report_error(&e.to_string(), output, quiet);
        process::exit(1);
    }
}

// ── check ────────────────────────────────────────────────────────────

fn cmd_check(content: &Content, output: OutputFormat) {
    let count = |pred: fn(&Question) -> bool| content.questions().iter().filter(|q| pred(q)).count();
    let multiple_choice = count(|q| matches!(q, Question::MultipleChoice(_)));
    let props = count(|q| matches!(q, Question::Props(_)));
    let cases = count(|q| matches!(q, Question::Case(_)));
    let sub_questions = content.sub_question_kinds().count();

    match output {
        OutputFormat::Json => {
            let value = json!({
                "concepts": content.concepts().len(),
                "questions": {
                    "multiple_choice": multiple_choice,
                    "props": props,
                    "case": cases,
                },
                "sub_questions": sub_questions,
            });
            print_json(&value);
        }
        OutputFormat::Text => {
            println!("Content OK");
            println!("  Concepts: {}", content.concepts().len());
            println!(
                "  Questions: {} ({} multiple choice, {} propositions, {} cases)",
                content.questions().len(),
                multiple_choice,
                props,
                cases
            );
            println!("  Sub-question types: {}", sub_questions);
        }
    }
}

// ── case ─────────────────────────────────────────────────────────────

fn cmd_case(content: &Content, name: Option<&str>, output: OutputFormat, quiet: bool) {
    let cases: Vec<_> = match name {
        Some(name) => match content.find_question(name) {
            Some(Question::Case(case)) => vec![case],
            Some(_) => {
                report_error(&format!("'{}' is not a case question", name), output, quiet);
                process::exit(1);
            }
            None => {
                report_error(&format!("unknown question '{}'", name), output, quiet);
                process::exit(1);
            }
        },
        None => content.questions().iter().filter_map(Question::as_case).collect(),
    };
    let reports: Vec<CaseReport> = cases.into_iter().map(CaseReport::build).collect();

    match output {
        OutputFormat::Json => print_json(&reports),
        OutputFormat::Text => {
            for report in &reports {
                print!("{}", report);
            }
        }
    }
}

// ── scores ───────────────────────────────────────────────────────────

fn cmd_scores(config: &Config, content: Arc<Content>, output: OutputFormat, quiet: bool) {
    let rt = runtime(output, quiet);
    let store = store(config, output, quiet);
    let mut tutor = restore_tutor(config, content, &rt, &store, output, quiet);

    if !tutor.state().answers().is_empty() {
        if let Err(e) = rt.block_on(tutor.refresh_scores()) {
            report_error(
                &format!("{} estimator failed: {}", tutor.estimator_name(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    }

    let state = tutor.state();
    match output {
        OutputFormat::Json => {
            let scores: Vec<_> = state
                .scores()
                .iter()
                .map(|(concept, score)| {
                    json!({
                        "concept": concept.as_str(),
                        "score": score,
                        "mastered": state.is_mastered(concept),
                    })
                })
                .collect();
            print_json(&scores);
        }
        OutputFormat::Text => {
            if state.scores().is_empty() {
                println!("No scores yet.");
                return;
            }
            for (concept, score) in state.scores() {
                let name = tutor
                    .content()
                    .concept(concept)
                    .map_or(concept.as_str(), |c| c.name.as_str());
                let marker = if state.is_mastered(concept) { "  (mastered)" } else { "" };
                println!("  {:.3}  {}{}", score, name, marker);
            }
            println!("Mastery threshold: {}", MASTERY_THRESHOLD);
        }
    }
}

// ── select ───────────────────────────────────────────────────────────

fn cmd_select(config: &Config, content: Arc<Content>, output: OutputFormat, quiet: bool) {
    let rt = runtime(output, quiet);
    let store = store(config, output, quiet);
    let mut tutor = restore_tutor(config, content, &rt, &store, output, quiet);

    let selection = rt.block_on(tutor.select());
    let ranked = rt.block_on(tutor.ranked_candidates());

    let (how, reason) = match &selection {
        Selection::Override(_) => ("override", None),
        Selection::Adaptive(_) => ("adaptive", None),
        Selection::Fallback { reason, .. } => ("fallback", Some(reason.to_string())),
        Selection::Exhausted => ("exhausted", None),
    };

    match output {
        OutputFormat::Json => {
            let candidates: Vec<_> = ranked
                .iter()
                .map(|c| json!({ "question": c.short_name, "average": c.average }))
                .collect();
            print_json(&json!({
                "selection": how,
                "question": selection.question(),
                "reason": reason,
                "candidates": candidates,
            }));
        }
        OutputFormat::Text => {
            match selection.question() {
                Some(question) => println!("Next question: {} ({})", question, how),
                None => println!("Nothing left to ask."),
            }
            if let Some(reason) = reason {
                println!("  Estimator failed: {}", reason);
            }
            for candidate in &ranked {
                println!("  {:.3}  {}", candidate.average, candidate.short_name);
            }
        }
    }
}

// ── history ──────────────────────────────────────────────────────────

fn cmd_history(
    config: &Config,
    content: Arc<Content>,
    reset: bool,
    output: OutputFormat,
    quiet: bool,
) {
    let rt = runtime(output, quiet);
    let store = store(config, output, quiet);
    let mut tutor = restore_tutor(config, content, &rt, &store, output, quiet);

    if reset {
        tutor.reset();
        if let Err(e) = rt.block_on(tutor.save(&store)) {
            report_error(&format!("failed to save history: {}", e), output, quiet);
            process::exit(1);
        }
        if !quiet {
            println!("History cleared: {}", store.path().display());
        }
        return;
    }

    let state = tutor.state();
    match output {
        OutputFormat::Json => {
            let answers: Vec<_> = state
                .answers()
                .iter()
                .map(|a| {
                    json!({
                        "question": a.question,
                        "sub_question": a.sub_question.map(|k| k.tag()),
                        "correct": a.correct,
                    })
                })
                .collect();
            let questions: Vec<_> = tutor
                .content()
                .questions()
                .iter()
                .map(|q| {
                    json!({
                        "question": q.short_name(),
                        "kind": q.kind_name(),
                        "burnt": state.is_burnt(q.short_name()),
                    })
                })
                .collect();
            print_json(&json!({ "answers": answers, "questions": questions }));
        }
        OutputFormat::Text => {
            println!("Answers:");
            if state.answers().is_empty() {
                println!("  (none)");
            }
            for answer in state.answers() {
                let sub = answer
                    .sub_question
                    .map(|k| format!(" / {}", k))
                    .unwrap_or_default();
                let mark = if answer.correct { "right" } else { "wrong" };
                println!("  {}{}: {}", answer.question, sub, mark);
            }
            println!("Questions:");
            for question in tutor.content().questions() {
                let marker = if state.is_burnt(question.short_name()) { "*" } else { " " };
                println!(
                    "  {} {} ({})",
                    marker,
                    question.short_name(),
                    question.kind_name()
                );
            }
        }
    }
}

// ── helpers ──────────────────────────────────────────────────────────

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    let pretty = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("serialization error: {}", e));
    println!("{}", pretty);
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            eprintln!("{}", json!({ "error": msg }));
        }
    }
}
