//! assessd - assessment runner daemon and CLI
//!
//! ## Commands
//!
//! - `serve` (default): answer line-delimited JSON requests on stdin/stdout
//! - `run`: run one assessment and print its result
//! - `list`: print catalogued scripts

use anyhow::{Context, Result};
use assess_core::{init_tracing, Catalog, ParamValue, ParameterSet};
use assess_exec::{AssessmentRunner, ExecutorConfig, Interpreter};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

use assessd::{serve, Dispatcher, DEFAULT_ASSESSMENT_TYPE};

#[derive(Parser)]
#[command(name = "assessd")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Priority-staged parallel assessment runner", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines (on stderr)
    #[arg(long, global = true)]
    json: bool,

    /// TOML catalog file (default: built-in catalog)
    #[arg(long, env = "ASSESS_CATALOG", global = true)]
    catalog: Option<PathBuf>,

    /// Directory that relative script paths resolve against
    #[arg(long, env = "ASSESS_SCRIPTS_DIR", default_value = ".", global = true)]
    scripts_dir: PathBuf,

    /// Maximum concurrent units per stage
    #[arg(long, env = "ASSESS_MAX_WORKERS", default_value_t = 4, global = true)]
    max_workers: usize,

    /// Program that hosts each script
    #[arg(long, env = "ASSESS_INTERPRETER", default_value = "pwsh", global = true)]
    interpreter: String,

    /// Argument placed before the script path (repeatable)
    #[arg(long = "interpreter-arg", allow_hyphen_values = true, global = true)]
    interpreter_args: Vec<String>,

    /// Execute script paths directly instead of through an interpreter
    #[arg(long, global = true)]
    no_interpreter: bool,

    /// Kill units running longer than this many seconds
    #[arg(long, env = "ASSESS_UNIT_TIMEOUT_SECS", global = true)]
    unit_timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve line-delimited JSON requests on stdin/stdout
    Serve,

    /// Run one assessment and print the run result as JSON
    Run {
        /// Assessment type
        #[arg(short = 't', long = "type", default_value = DEFAULT_ASSESSMENT_TYPE)]
        assessment_type: String,

        /// Parameter as KEY=VALUE (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, ParamValue)>,
    },

    /// List catalogued scripts
    List {
        /// Assessment type (default: all types)
        #[arg(short = 't', long = "type")]
        assessment_type: Option<String>,
    },
}

/// Parse `KEY=VALUE`; the value is a bool, then a number, else text.
fn parse_param(s: &str) -> Result<(String, ParamValue), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in '{}'", s));
    }

    let value = match raw {
        "true" => ParamValue::Bool(true),
        "false" => ParamValue::Bool(false),
        _ => match serde_json::from_str::<serde_json::Number>(raw) {
            Ok(n) => ParamValue::Number(n),
            Err(_) => ParamValue::Text(raw.to_string()),
        },
    };
    Ok((key.to_string(), value))
}

impl Cli {
    fn executor_config(&self) -> ExecutorConfig {
        let interpreter = if self.no_interpreter {
            None
        } else if self.interpreter_args.is_empty() && self.interpreter == "pwsh" {
            Some(Interpreter::powershell())
        } else {
            Some(Interpreter::new(self.interpreter.clone(), self.interpreter_args.clone()))
        };

        ExecutorConfig::default()
            .with_max_workers(self.max_workers)
            .with_interpreter(interpreter)
            .with_unit_timeout(self.unit_timeout_secs.map(Duration::from_secs))
    }

    fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog {
            Some(path) => Catalog::load(path, &self.scripts_dir)
                .with_context(|| format!("Failed to load catalog {:?}", path)),
            None => Ok(Catalog::builtin(&self.scripts_dir)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let config = cli.executor_config();
    config.validate().context("Invalid executor configuration")?;

    let catalog = Arc::new(cli.load_catalog()?);
    let runner = AssessmentRunner::from_config(catalog, &config);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => cmd_serve(runner, &config).await,
        Commands::Run {
            assessment_type,
            params,
        } => cmd_run(&runner, &assessment_type, params.into_iter().collect()).await,
        Commands::List { assessment_type } => cmd_list(&runner, assessment_type.as_deref()),
    }
}

/// Answer requests on stdin/stdout until stdin closes
async fn cmd_serve(runner: AssessmentRunner, config: &ExecutorConfig) -> Result<()> {
    info!(
        max_workers = config.max_workers,
        interpreter = ?config.interpreter.as_ref().map(|i| &i.program),
        "starting request loop"
    );

    let dispatcher = Dispatcher::new(runner);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    serve(&dispatcher, stdin, stdout)
        .await
        .context("Request stream failed")?;
    Ok(())
}

/// Run one assessment and print the result
async fn cmd_run(runner: &AssessmentRunner, assessment_type: &str, parameters: ParameterSet) -> Result<()> {
    let run = runner.run(assessment_type, parameters).await;
    println!("{}", serde_json::to_string_pretty(&run)?);

    if run.success {
        Ok(())
    } else {
        anyhow::bail!(
            "Assessment '{}' failed: {}/{} scripts failed",
            assessment_type,
            run.failed_count(),
            run.total_scripts
        )
    }
}

/// Print catalogued scripts for one type, or for all types
fn cmd_list(runner: &AssessmentRunner, assessment_type: Option<&str>) -> Result<()> {
    let catalog = runner.catalog();
    let types: Vec<&str> = match assessment_type {
        Some(t) => vec![t],
        None => catalog.assessment_types().collect(),
    };

    for t in types {
        println!("{}:", t);
        let scripts = catalog.scripts(t);
        if scripts.is_empty() {
            println!("  (no scripts)");
        }
        for entry in scripts {
            println!("  [{}] {}", entry.priority, entry.path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param_types() {
        assert_eq!(parse_param("Detailed=true").unwrap().1, ParamValue::Bool(true));
        assert_eq!(parse_param("Days=30").unwrap().1, ParamValue::from(30_i64));
        assert_eq!(
            parse_param("Tenant=Contoso Ltd").unwrap(),
            ("Tenant".to_string(), ParamValue::from("Contoso Ltd"))
        );
        assert_eq!(parse_param("Expr=a=b").unwrap().1, ParamValue::from("a=b"));
    }

    #[test]
    fn test_parse_param_rejects_bad_input() {
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["assessd"]).unwrap();
        assert!(cli.command.is_none());

        let config = cli.executor_config();
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.interpreter, Some(Interpreter::powershell()));
        assert!(config.unit_timeout.is_none());
    }

    #[test]
    fn test_cli_custom_interpreter() {
        let cli = Cli::try_parse_from([
            "assessd",
            "--interpreter",
            "bash",
            "--interpreter-arg",
            "-e",
            "--unit-timeout-secs",
            "90",
            "list",
        ])
        .unwrap();

        let config = cli.executor_config();
        assert_eq!(config.interpreter, Some(Interpreter::new("bash", vec!["-e".to_string()])));
        assert_eq!(config.unit_timeout, Some(Duration::from_secs(90)));
        assert!(matches!(cli.command, Some(Commands::List { .. })));
    }

    #[test]
    fn test_cli_no_interpreter() {
        let cli = Cli::try_parse_from(["assessd", "--no-interpreter", "run", "-t", "quick", "-p", "X=1"]).unwrap();
        assert!(cli.executor_config().interpreter.is_none());

        match cli.command {
            Some(Commands::Run {
                assessment_type,
                params,
            }) => {
                assert_eq!(assessment_type, "quick");
                assert_eq!(params, vec![("X".to_string(), ParamValue::from(1_i64))]);
            }
            _ => panic!("expected run command"),
        }
    }
}
