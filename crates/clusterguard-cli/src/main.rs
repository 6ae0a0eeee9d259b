#![forbid(unsafe_code)]

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use clusterguard_app::{
    CheckInput, PoliciesInput, format_policies, parse_report_json, render_annotations,
    render_markdown, run_check, run_policies, serialize_report, to_renderable, verdict_exit_code,
};
use clusterguard_settings::{LogLevel, Overrides};
use clusterguard_types::ClusterguardReport;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "clusterguard",
    version,
    about = "Cluster configuration compliance checks driven by Rego policies"
)]
struct Cli {
    /// Path to clusterguard config file.
    #[arg(long, default_value = "clusterguard.toml", global = true)]
    config: Utf8PathBuf,

    /// Policy directory; repeatable. Replaces the directories from the config file.
    #[arg(long = "policy-dir", global = true)]
    policy_dirs: Vec<String>,

    /// Package prefix of policy modules (overrides config).
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// When to fail the check: `violation` or `warning` (overrides config).
    #[arg(long, global = true)]
    fail_on: Option<String>,

    /// Log level when RUST_LOG is unset (overrides config).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate policies against an input document and emit a JSON report.
    Check {
        /// Input document (JSON, or YAML by `.yaml`/`.yml` extension).
        #[arg(long)]
        input: Utf8PathBuf,

        /// Where to write the JSON report.
        #[arg(long, default_value = "artifacts/clusterguard/report.json")]
        report_out: Utf8PathBuf,

        /// Also write a Markdown rendering of the report.
        #[arg(long)]
        write_markdown: bool,

        /// Where to write the Markdown report (with --write-markdown).
        #[arg(long, default_value = "artifacts/clusterguard/comment.md")]
        markdown_out: Utf8PathBuf,
    },

    /// Compile policies and list the ones that would be evaluated.
    Policies,

    /// Render markdown from an existing JSON report.
    Md {
        #[arg(long)]
        report: Utf8PathBuf,

        /// Write to file instead of stdout.
        #[arg(long, short = 'o')]
        output: Option<Utf8PathBuf>,
    },

    /// Render GitHub Actions annotations from an existing JSON report.
    Annotations {
        #[arg(long)]
        report: Utf8PathBuf,

        /// Maximum number of annotations to emit.
        #[arg(long, default_value_t = 10)]
        max: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("clusterguard error: {err:#}");
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config_text = read_config(&cli.config)?;
    let overrides = Overrides {
        namespace: cli.namespace.clone(),
        fail_on: cli.fail_on.clone(),
        log_level: cli.log_level.clone(),
        policy_dirs: cli.policy_dirs.clone(),
    };
    init_tracing(log_level(&config_text, &overrides)?);
    debug!(config = %cli.config, "starting clusterguard");

    match cli.cmd {
        Commands::Check {
            input,
            report_out,
            write_markdown,
            markdown_out,
        } => cmd_check(
            &config_text,
            overrides,
            &input,
            &report_out,
            write_markdown.then_some(markdown_out.as_path()),
        ),
        Commands::Policies => cmd_policies(&config_text, overrides),
        Commands::Md { report, output } => cmd_md(&report, output.as_deref()),
        Commands::Annotations { report, max } => cmd_annotations(&report, max),
    }
}

fn read_config(path: &Utf8Path) -> anyhow::Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }
    std::fs::read_to_string(path).with_context(|| format!("read config: {path}"))
}

/// `--log-level` wins over the config file. A config that fails to parse contributes
/// no level here; the command reports the parse error itself.
fn log_level(config_text: &str, overrides: &Overrides) -> anyhow::Result<LogLevel> {
    let cfg = clusterguard_settings::parse_config_toml(config_text).unwrap_or_default();
    clusterguard_settings::resolve_log_level(&cfg, overrides)
}

fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_check(
    config_text: &str,
    overrides: Overrides,
    input: &Utf8Path,
    report_out: &Utf8Path,
    markdown_out: Option<&Utf8Path>,
) -> anyhow::Result<i32> {
    let cwd = Utf8PathBuf::from(".");
    let output = run_check(CheckInput {
        base_dir: &cwd,
        config_text,
        overrides,
        input_path: input,
    })?;

    let bytes = serialize_report(&output.report)?;
    write_file(report_out, &bytes)?;

    if let Some(md_path) = markdown_out {
        let md = render_markdown(&to_renderable(&output.report));
        write_file(md_path, md.as_bytes())?;
    }

    Ok(verdict_exit_code(
        output.report.verdict,
        output.resolved_config.fail_on,
    ))
}

fn cmd_policies(config_text: &str, overrides: Overrides) -> anyhow::Result<i32> {
    let cwd = Utf8PathBuf::from(".");
    let output = run_policies(PoliciesInput {
        base_dir: &cwd,
        config_text,
        overrides,
    })?;
    print!("{}", format_policies(&output));
    Ok(0)
}

fn cmd_md(report_path: &Utf8Path, output: Option<&Utf8Path>) -> anyhow::Result<i32> {
    let report = read_report(report_path)?;
    let md = render_markdown(&to_renderable(&report));

    match output {
        Some(path) => write_file(path, md.as_bytes())?,
        None => print!("{md}"),
    }
    Ok(0)
}

fn cmd_annotations(report_path: &Utf8Path, max: usize) -> anyhow::Result<i32> {
    let report = read_report(report_path)?;
    for line in render_annotations(&to_renderable(&report), max) {
        println!("{line}");
    }
    Ok(0)
}

fn read_report(path: &Utf8Path) -> anyhow::Result<ClusterguardReport> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read report: {path}"))?;
    parse_report_json(&text)
}

fn write_file(path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    std::fs::write(path, contents).with_context(|| format!("write {path}"))?;
    Ok(())
}
