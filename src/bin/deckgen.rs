//! CLI binary for deckgen.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig` and prints results.

use anyhow::Result;
use clap::{Parser, Subcommand};
use deckgen::{
    evaluate, notes, present, PipelineConfig, PipelineProgressCallback, ProgressCallback,
    run_evaluation, run_notes, run_presentation,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a per-slide bar for the image-fetch phase
/// plus log lines for the deck and upload milestones.
struct CliProgressCallback {
    bar: ProgressBar,
    failures: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_slides_parsed

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Generating");
        bar.set_message("Waiting for the model…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            failures: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>2}/{len} slides  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Fetching images");
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_slides_parsed(&self, total_slides: usize) {
        self.activate_bar(total_slides);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Model produced {total_slides} slides"))
        ));
    }

    fn on_image_start(&self, slide: usize, query: &str) {
        self.bar.set_message(format!("slide {slide}: '{query}'"));
    }

    fn on_image_fetched(&self, slide: usize) {
        self.bar
            .println(format!("  {} Slide {:>2}  image saved", green("✓"), slide));
        self.bar.inc(1);
    }

    fn on_image_failed(&self, slide: usize, error: &str) {
        self.failures.fetch_add(1, Ordering::SeqCst);

        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Slide {:>2}  {}  {}",
            red("✗"),
            slide,
            red(&msg),
            dim("(slide keeps going without a picture)"),
        ));
        self.bar.inc(1);
    }

    fn on_deck_built(&self, slide_count: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Deck written ({slide_count} slides)"))
        ));
        self.bar.set_prefix("Uploading");
        self.bar.set_message("");
    }

    fn on_uploaded(&self, _url: &str) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate and host a deck
  deckgen present "Photosynthesis"

  # Keep the hosted file for 30 minutes instead of 5
  deckgen present --ttl 1800 "Photosynthesis"

  # Evaluate an exam paper and store the result
  deckgen evaluate answers.pdf

  # Bullet-point notes, machine-readable output
  deckgen notes --json "Rust ownership"

SUPPORTED PROVIDERS:
  Provider     Example model          Detected via
  ─────────    ─────────────────────  ───────────────────
  gemini       gemini-2.0-flash       GEMINI_API_KEY (default)
  openai       gpt-4.1-nano           OPENAI_API_KEY
  anthropic    claude-haiku-4-20250514  ANTHROPIC_API_KEY
  ollama       llama3.2               local daemon

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY            Google Gemini API key (default provider)
  OPENAI_API_KEY            OpenAI API key
  ANTHROPIC_API_KEY         Anthropic API key
  DECKGEN_LLM_PROVIDER      Override provider (gemini, openai, anthropic, ollama)
  DECKGEN_MODEL             Override model ID
  CLOUDINARY_CLOUD_NAME     File host account for `present`
  CLOUDINARY_UPLOAD_PRESET  Unsigned upload preset for `present`

SETUP:
  1. Set API keys:   export GEMINI_API_KEY=...
                     export CLOUDINARY_CLOUD_NAME=... CLOUDINARY_UPLOAD_PRESET=...
  2. Generate:       deckgen present "My Topic"
"#;

/// Generate hosted slide decks and evaluate exam documents with LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "deckgen",
    version,
    about = "Generate hosted slide decks from a topic and evaluate exam documents with LLMs",
    after_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Emit the result as a uniform JSON record instead of text
    #[arg(long, global = true)]
    json: bool,

    /// LLM model ID (default: gemini-2.0-flash)
    #[arg(long, global = true)]
    model: Option<String>,

    /// LLM provider name (gemini, openai, anthropic, ollama)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// SQLite database file for evaluation/notes results
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a slide deck for a topic, upload it, print the URL
    Present {
        /// Topic to present
        topic: String,

        /// Directory for the local .pptx before upload
        #[arg(short, long, default_value = "/tmp")]
        output_dir: PathBuf,

        /// Seconds until the hosted file is deleted remotely
        #[arg(long, default_value_t = 300)]
        ttl: u64,

        /// Block until the scheduled remote deletion has run
        #[arg(long)]
        wait_for_deletion: bool,
    },

    /// Evaluate a PDF or DOCX exam document and store the result
    Evaluate {
        /// Path to the exam file
        file: PathBuf,
    },

    /// Generate ten bullet-point notes for a topic and store them
    Notes {
        /// Topic to summarise
        topic: String,
    },
}

fn build_config(cli: &Cli, extra: impl FnOnce(deckgen::PipelineConfigBuilder) -> deckgen::PipelineConfigBuilder) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder();
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref db) = cli.db {
        builder = builder.database_path(db.clone());
    }
    builder = extra(builder);
    Ok(builder.build()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Present {
            ref topic,
            ref output_dir,
            ttl,
            wait_for_deletion,
        } => {
            let progress: Option<ProgressCallback> = if cli.json {
                None
            } else {
                Some(CliProgressCallback::new() as ProgressCallback)
            };
            let output_dir = output_dir.clone();
            let config = build_config(&cli, move |mut b| {
                b = b.output_dir(output_dir).auto_delete_delay_secs(ttl);
                if let Some(cb) = progress {
                    b = b.progress_callback(cb);
                }
                b
            })?;

            if cli.json {
                let report = run_presentation(topic, &config).await;
                println!("{}", serde_json::to_string_pretty(&report)?);
                if !report.is_success() {
                    std::process::exit(1);
                }
                return Ok(());
            }

            match present(topic, &config).await {
                Ok(mut output) => {
                    eprintln!(
                        "{} {} slides, {}/{} images, {:.1}s",
                        green("✔"),
                        bold(&output.stats.slide_count.to_string()),
                        output.stats.images_fetched,
                        output.stats.slide_count,
                        output.stats.total_duration_ms as f64 / 1000.0,
                    );
                    eprintln!("{}", dim(&format!("local copy: {}", output.local_path.display())));
                    eprintln!(
                        "{}",
                        dim(&format!("hosted for {}s as {}", ttl, output.public_id))
                    );
                    println!("{}", output.presentation_url);

                    if wait_for_deletion {
                        if let Some(handle) = output.deletion.take() {
                            eprintln!("{}", dim("waiting for scheduled deletion…"));
                            match handle.await {
                                Ok(true) => eprintln!("{} remote copy deleted", green("✔")),
                                _ => eprintln!("{} remote deletion failed", red("✘")),
                            }
                        }
                    }
                }
                Err(e) => {
                    eprintln!("{} {}", red("✘"), e);
                    std::process::exit(1);
                }
            }
        }

        Command::Evaluate { ref file } => {
            let config = build_config(&cli, |b| b)?;

            if cli.json {
                let report = run_evaluation(file, &config).await;
                println!("{}", serde_json::to_string_pretty(&report)?);
                if !report.is_success() {
                    std::process::exit(1);
                }
                return Ok(());
            }

            match evaluate(file, &config).await {
                Ok(output) => {
                    eprintln!(
                        "{} {} evaluated ({} chars extracted)",
                        green("✔"),
                        file.display(),
                        output.extracted_chars
                    );
                    println!("{}", bold(&format!("Score: {}/100", output.score)));
                    println!("{}", output.evaluation);
                }
                Err(e) => {
                    eprintln!("{} {}", red("✘"), e);
                    std::process::exit(1);
                }
            }
        }

        Command::Notes { ref topic } => {
            let config = build_config(&cli, |b| b)?;

            if cli.json {
                let report = run_notes(topic, &config).await;
                println!("{}", serde_json::to_string_pretty(&report)?);
                if !report.is_success() {
                    std::process::exit(1);
                }
                return Ok(());
            }

            match notes(topic, &config).await {
                Ok(output) => {
                    eprintln!(
                        "{} {} bullets stored for '{}'",
                        green("✔"),
                        output.points.len(),
                        topic
                    );
                    for point in &output.points {
                        println!("  • {point}");
                    }
                }
                Err(e) => {
                    eprintln!("{} {}", red("✘"), e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
