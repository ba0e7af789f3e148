use clap::{Parser, Subcommand};
use colored::Colorize;
use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sqlpeek_core::{AnalysisResult, Config, RenderResult};
use sqlpeek_jinja::{DemoContext, TemplateAnalyzer};

type Overrides = BTreeMap<String, serde_json::Value>;

/// sqlpeek - Inspect Jinja SQL templates and preview them as plain SQL
#[derive(Parser)]
#[command(name = "sqlpeek")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: sqlpeek.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover variables and build a demo SQL preview
    Analyze {
        /// Template text, or a path with --file (reads a JSON envelope from stdin if omitted)
        template: Option<String>,

        /// Treat TEMPLATE as a file path
        #[arg(short, long)]
        file: bool,

        /// Print the result as JSON
        #[arg(short, long)]
        json: bool,

        /// JSON file with override values by variable name
        #[arg(short, long)]
        vars: Option<PathBuf>,

        /// Write the demo SQL to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a template exactly with the values from a JSON envelope on stdin
    Render {
        /// Print the result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Write a config file with the default demo values
    Init {
        /// Where to write the config
        #[arg(default_value = "sqlpeek.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Stdin payload: `{ "template": ..., "variables": {...} }`
#[derive(Debug, Deserialize)]
struct Envelope {
    template: String,

    #[serde(default)]
    variables: Overrides,
}

impl Envelope {
    fn parse(input: &str) -> Result<Self, String> {
        serde_json::from_str(input).map_err(|e| format!("Invalid JSON input: {}", e))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("sqlpeek.toml").exists() {
        Config::from_file(Path::new("sqlpeek.toml"))?
    } else {
        tracing::debug!("no config file found, using defaults");
        Config::default()
    };

    match cli.command {
        Commands::Analyze { template, file, json, vars, output } => analyze_command(
            &config,
            template.as_deref(),
            file,
            json,
            vars.as_deref(),
            output.as_deref(),
        ),
        Commands::Render { json } => render_command(&config, json),
        Commands::Init { path, force } => init_command(&path, force),
    }
}

/// Analyze command - variables, flags and demo SQL for one template
fn analyze_command(
    config: &Config,
    template: Option<&str>,
    file: bool,
    json: bool,
    vars: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let mut overrides = config.variables.clone();
    if let Some(vars_path) = vars {
        overrides.extend(load_overrides(vars_path)?);
    }

    let result = match load_template(template, file) {
        Ok((text, envelope_vars)) => {
            overrides.extend(envelope_vars);
            TemplateAnalyzer::from_config(config).analyze(&text, Some(&overrides))
        }
        Err(message) => AnalysisResult::failure(message),
    };

    if json {
        println!("{}", result.to_json()?);
    } else {
        print_analysis(&result);
    }

    if let (Some(path), Some(sql)) = (output, &result.demo_sql) {
        std::fs::write(path, sql)?;
        eprintln!("{} {}", "Demo SQL saved to:".green(), path.display());
    }

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}

/// Render command - exact render of an envelope from stdin
fn render_command(config: &Config, json: bool) -> Result<()> {
    let input = std::io::read_to_string(std::io::stdin())?;

    let result = match Envelope::parse(&input) {
        Ok(envelope) => {
            let mut values = config.variables.clone();
            values.extend(envelope.variables);
            let values = DemoContext::from_json(&serde_json::to_value(values)?);

            TemplateAnalyzer::from_config(config).render(&envelope.template, &values)
        }
        Err(message) => RenderResult::failure(message),
    };

    if json {
        println!("{}", result.to_json()?);
    } else if result.success {
        println!("{}", result.sql);
    } else {
        eprintln!("{} {}", "✗".red(), result.error.red());
    }

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}

/// Init command - write the default config
fn init_command(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        ));
    }

    Config::default().save_to_file(path)?;
    eprintln!("{} {}", "Config written to:".green(), path.display());

    Ok(())
}

/// Resolve the template text and any envelope overrides
///
/// Failures here are reported as an unsuccessful analysis, not a CLI error.
fn load_template(template: Option<&str>, file: bool) -> Result<(String, Overrides), String> {
    match template {
        Some(path) if file => std::fs::read_to_string(path)
            .map(|text| (text, Overrides::new()))
            .map_err(|e| format!("File error: {}", e)),
        Some(text) => Ok((text.to_string(), Overrides::new())),
        None => {
            let input = std::io::read_to_string(std::io::stdin())
                .map_err(|e| format!("File error: {}", e))?;
            let envelope = Envelope::parse(&input)?;
            Ok((envelope.template, envelope.variables))
        }
    }
}

fn load_overrides(path: &Path) -> Result<Overrides> {
    let contents = std::fs::read_to_string(path)?;
    let overrides = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Invalid variables file {}: {}", path.display(), e))?;
    Ok(overrides)
}

fn print_analysis(result: &AnalysisResult) {
    if !result.success {
        eprintln!(
            "{} {}",
            "✗".red(),
            result.error.as_deref().unwrap_or("analysis failed").red()
        );
        return;
    }

    println!("{}", format!("Variables ({})", result.variables.len()).bold());
    if result.variables.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for var in &result.variables {
        println!(
            "  {} ({}): {}",
            var.name.green(),
            var.var_type.as_str().cyan(),
            display_value(&var.default_value)
        );
    }
    println!();

    println!("{} {}", "Has conditionals:".bold(), yes_no(result.has_conditionals));
    println!("{} {}", "Has loops:".bold(), yes_no(result.has_loops));
    println!();

    println!("{}", "Demo SQL:".bold().bright_blue());
    println!("{}", result.demo_sql.as_deref().unwrap_or_default());
}

/// Strings print bare so quoted literals read as they appear in SQL
fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
