//! CLI binary for docsift.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, runs one flow (or the HTTP server) and prints results.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use docsift::{
    AnalysisConfig, AnalysisResult, AnalysisStatus, Analyzer, DocumentInfo, DocumentUpload,
    ScrapeOutput,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the HTTP service
  docsift serve --bind 0.0.0.0:8080

  # Scrape a page (no API key needed)
  docsift scrape https://example.com

  # Analyse text from an argument or from stdin
  docsift analyze-text "Explain the CAP theorem in two sentences"
  cat notes.txt | docsift analyze-text -

  # Summarise a PDF, JSON output
  docsift --json analyze-pdf report.pdf > report.json

  # Inspect a PDF (no API key needed)
  docsift inspect report.pdf

HTTP ROUTES (serve):
  POST /api/scrape          {"url": "..."}
  POST /api/analyze/text    {"text": "..."}
  POST /api/analyze/pdf     multipart/form-data, field "file"
  GET  /health

ENVIRONMENT VARIABLES:
  GROQ_API_KEY            Completion provider API key
  DOCSIFT_API_URL         Chat-completions endpoint
  DOCSIFT_MODEL           Model ID
  DOCSIFT_BIND            Server bind address
  RUST_LOG                Override log filter (e.g. docsift=debug)
"#;

/// Scrape web pages and summarise PDFs with a chat-completion model.
#[derive(Parser, Debug)]
#[command(
    name = "docsift",
    version,
    about = "Scrape web pages and summarise PDFs with a chat-completion model",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    settings: SettingsArgs,

    /// Output structured JSON instead of human-readable text.
    #[arg(long, global = true, env = "DOCSIFT_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCSIFT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "DOCSIFT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "DOCSIFT_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
    /// Fetch a web page and print its title and text.
    Scrape {
        /// Absolute http(s) URL.
        url: String,
    },
    /// Send text to the model verbatim.
    AnalyzeText {
        /// Text to analyse, or `-` to read stdin.
        text: String,
    },
    /// Extract a PDF's text and ask the model to summarise it.
    AnalyzePdf {
        /// Path to a PDF file.
        file: PathBuf,
    },
    /// Print page count, version and encryption state of a PDF.
    Inspect {
        /// Path to a PDF file.
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SettingsArgs {
    /// Provider API key.
    #[arg(long, global = true, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chat-completions endpoint URL.
    #[arg(long, global = true, env = "DOCSIFT_API_URL")]
    api_url: Option<String>,

    /// Model ID.
    #[arg(long, global = true, env = "DOCSIFT_MODEL")]
    model: Option<String>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, global = true, env = "DOCSIFT_TEMPERATURE", default_value_t = 1.0)]
    temperature: f32,

    /// Max tokens the model may generate.
    #[arg(long, global = true, env = "DOCSIFT_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// Nucleus sampling mass (0.0–1.0).
    #[arg(long, global = true, env = "DOCSIFT_TOP_P", default_value_t = 1.0)]
    top_p: f32,

    /// Max characters of document text sent to the model.
    #[arg(long, global = true, env = "DOCSIFT_TRUNCATION_BUDGET", default_value_t = 8000)]
    truncation_budget: usize,

    /// Instruction prepended to document text.
    #[arg(long, global = true, env = "DOCSIFT_SUMMARY_PREFIX")]
    summary_prefix: Option<String>,

    /// Web page fetch timeout in seconds.
    #[arg(long, global = true, env = "DOCSIFT_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,

    /// Completion call timeout in seconds.
    #[arg(long, global = true, env = "DOCSIFT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Largest accepted upload in bytes (serve only).
    #[arg(long, global = true, env = "DOCSIFT_MAX_UPLOAD_BYTES", default_value_t = 20 * 1024 * 1024)]
    max_upload_bytes: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives the feedback that matters for one-shot commands, so
    // INFO-level library logs are hidden unless asked for.
    let serving = matches!(cli.command, Command::Serve { .. });
    let show_spinner = !serving && !cli.quiet && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_spinner {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli.settings)?;
    let analyzer = Analyzer::from_config(&config).context("Failed to initialise analyzer")?;

    match &cli.command {
        Command::Serve { bind } => {
            if !cli.quiet {
                eprintln!(
                    "{} {} {}",
                    green("◆"),
                    bold("docsift listening on"),
                    bold(&format!("http://{bind}"))
                );
                eprintln!("   {}", dim(&format!("model {}", config.model)));
            }
            docsift::serve(*bind, analyzer, &config)
                .await
                .context("Server failed")?;
        }
        Command::Scrape { url } => {
            let spinner = spinner(show_spinner, "Fetching page…");
            let output = analyzer.scrape(url).await;
            finish(spinner);
            print_scrape(&output, cli.json)?;
            if !output.is_success() {
                std::process::exit(1);
            }
        }
        Command::AnalyzeText { text } => {
            let text = read_text_arg(text)?;
            let spinner = spinner(show_spinner, "Waiting for the model…");
            let result = analyzer.analyze_text(&text).await;
            finish(spinner);
            let result = result.context("Nothing to analyse")?;
            print_analysis(&result, cli.json, false)?;
            exit_for(&result);
        }
        Command::AnalyzePdf { file } => {
            let upload = read_upload(file).await?;
            let spinner = spinner(show_spinner, "Extracting and summarising…");
            let result = analyzer.analyze_document(upload).await;
            finish(spinner);
            print_analysis(&result, cli.json, cli.verbose)?;
            exit_for(&result);
        }
        Command::Inspect { file } => {
            let bytes = tokio::fs::read(file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let info = analyzer
                .inspect_document(bytes)
                .await
                .context("Failed to inspect PDF")?;
            print_info(file, &info, cli.json)?;
        }
    }

    Ok(())
}

/// Map CLI args to `AnalysisConfig`.
fn build_config(args: &SettingsArgs) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .top_p(args.top_p)
        .truncation_budget(args.truncation_budget)
        .fetch_timeout_secs(args.fetch_timeout)
        .api_timeout_secs(args.api_timeout)
        .max_upload_bytes(args.max_upload_bytes);

    if let Some(ref key) = args.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref url) = args.api_url {
        builder = builder.api_url(url.clone());
    }
    if let Some(ref model) = args.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref prefix) = args.summary_prefix {
        builder = builder.summary_prefix(prefix.clone());
    }

    builder.build().context("Invalid configuration")
}

fn read_text_arg(arg: &str) -> Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read text from stdin")?;
    Ok(buf)
}

async fn read_upload(path: &Path) -> Result<DocumentUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", path.display());
    }
    let mut upload = DocumentUpload::new(bytes);
    if let Some(name) = path.file_name() {
        upload = upload.with_filename(name.to_string_lossy());
    }
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    {
        upload = upload.with_content_type("application/pdf");
    }
    Ok(upload)
}

fn spinner(enabled: bool, message: &'static str) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

fn finish(spinner: Option<ProgressBar>) {
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
}

fn exit_for(result: &AnalysisResult) {
    if result.status == AnalysisStatus::Error {
        std::process::exit(1);
    }
}

// ── Output ───────────────────────────────────────────────────────────────────

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}

fn print_scrape(output: &ScrapeOutput, json: bool) -> Result<()> {
    if json {
        return print_json(output);
    }
    match output {
        ScrapeOutput::Success { title, content } => {
            if !title.is_empty() {
                println!("{}\n", bold(title));
            }
            println!("{content}");
        }
        ScrapeOutput::Error { message } => {
            eprintln!("{} {}", red("✘"), red(message));
        }
    }
    Ok(())
}

fn print_analysis(result: &AnalysisResult, json: bool, show_text: bool) -> Result<()> {
    if json {
        return print_json(result);
    }

    match result.status {
        AnalysisStatus::Success => {
            if let Some(ref completion) = result.completion {
                println!("{completion}");
            }
        }
        AnalysisStatus::Partial => {
            if let Some(ref warning) = result.warning {
                eprintln!("{} {}", yellow("⚠"), yellow(warning));
            }
            if let Some(ref error) = result.error {
                eprintln!("   {}", red(error));
            }
            if result.error_kind.as_deref() == Some("configuration") {
                eprintln!("   {}", dim("Set GROQ_API_KEY or pass --api-key."));
            }
            if let Some(ref text) = result.extracted_text {
                println!("{text}");
            }
        }
        AnalysisStatus::Error => {
            if let Some(ref error) = result.error {
                eprintln!("{} {}", red("✘"), red(error));
            }
            if let Some(ref d) = result.diagnostics {
                eprintln!(
                    "   {}",
                    dim(&format!(
                        "file {}  {} bytes  {}",
                        d.filename.as_deref().unwrap_or("<unnamed>"),
                        d.size,
                        d.content_type.as_deref().unwrap_or("<no content type>"),
                    ))
                );
            }
        }
    }

    if show_text && result.status == AnalysisStatus::Success {
        if let Some(ref text) = result.extracted_text {
            eprintln!("\n{}\n{text}", dim("── extracted text ──"));
        }
    }
    if let Some(pages) = result.page_count {
        eprintln!("{}", dim(&format!("{pages} pages")));
    }
    Ok(())
}

fn print_info(file: &Path, info: &DocumentInfo, json: bool) -> Result<()> {
    if json {
        return print_json(info);
    }
    println!("File:         {}", file.display());
    println!("Pages:        {}", info.page_count);
    println!("PDF Version:  {}", info.pdf_version);
    println!("Encrypted:    {}", info.encrypted);
    println!("Size:         {} bytes", info.size);
    Ok(())
}
