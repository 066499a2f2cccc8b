//! CLI binary for filekit.
//!
//! A thin shim over the library crate: each subcommand maps its flags to a
//! library call, then writes the result to a file or prints it.

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use filekit::audio::{self, TranscriptBatch};
use filekit::document;
use filekit::imaging::{ResizeDownload, ResizeMode};
use filekit::library::analysis;
use filekit::library::query::{distinct_categories, year_bounds};
use filekit::library::score::CATEGORY_WEIGHTS;
use filekit::library::{
    build_mural, library_stats, suggest_book_details, timeline, Book, BookFilter, CoverIndex,
    Granularity, Library, ReadingStatus, StatusUpdate, TimelineGroup, BOOKS_CSV_ENV,
};
use filekit::{
    list_files, pdf, render_tree_text, AiConfig, BatchProgressCallback, DocxConfig,
    MarkdownFlavor, PageSelection, PdfInput, ProgressCallback, RasterConfig, RasterFormat,
    RasterOutput, TreeOptions,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
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

const SPINNER_TICKS: [&str; 11] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a bar at the bottom of the terminal plus one
/// log line per finished item.
struct CliProgressCallback {
    bar: ProgressBar,
    /// What the items are called in the bar ("pages", "images", "files").
    unit: &'static str,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` reports the item count.
    fn new(verb: &'static str, unit: &'static str) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&SPINNER_TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix(verb);
        bar.set_message("Preparing…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar, unit })
    }

    fn activate_bar(&self, total: usize) {
        let template = format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  \
             [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {}  \
             ⏱ {{elapsed_precise}}  ETA {{eta_precise}}",
            self.unit
        );
        let progress_style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&SPINNER_TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.reset_eta();
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.activate_bar(total);
    }

    fn on_item_start(&self, _index: usize, _total: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_item_complete(&self, index: usize, total: usize, name: &str) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            green("✓"),
            index,
            total,
            dim(name),
        ));
        self.bar.inc(1);
    }

    fn on_item_error(&self, index: usize, total: usize, error: &str) {
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let failed = total.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} {} processed",
                green("✔"),
                bold(&success_count.to_string()),
                self.unit
            );
        } else {
            eprintln!(
                "{} {}/{} {} processed  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                self.unit,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Draw a folder tree, three levels deep, with icons
  filekit tree ~/projects --max-depth 3 --icons

  # Merge PDFs in the given order
  filekit pdf merge a.pdf b.pdf c.pdf -o merged.pdf

  # Pull pages 1, 3 to 5 and 8 out of a report
  filekit pdf extract report.pdf --pages "1, 3-5, 8"

  # Render every page as JPEG at 200 DPI (ZIP when there are several pages)
  filekit pdf to-images slides.pdf --format jpeg --dpi 200

  # Halve a batch of photos
  filekit resize *.jpg --percent 50

  # Transcribe two recordings and summarise them
  filekit transcribe standup.m4a retro.mp3 --summary -o notes.md

  # DOCX to GitHub-Flavored Markdown
  filekit docx2md proposal.docx --flavor gfm -o proposal.md

  # Reading list
  filekit books list --status to-read
  filekit books add "Dune" --suggest
  filekit books update "Dune" --status read --rating 5 --read-date 2025/03
  filekit books timeline --by year --group kind

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          API key for transcription and the default chat provider
  FILEKIT_AI_PROVIDER     Chat provider (openai, anthropic, gemini, ollama, …)
  FILEKIT_AI_MODEL        Chat model ID
  FILEKIT_BOOKS_CSV       Reading list CSV (default: books.csv)
  PDFIUM_LIB_PATH         Path to libpdfium (default: ./ then system library)
  PANDOC_PATH             pandoc executable (default: pandoc on PATH)
  RUST_LOG                Overrides the log filter

A .env file in the working directory is loaded at start-up.
"#;

/// Everyday file utilities and a CSV reading tracker.
#[derive(Parser, Debug)]
#[command(
    name = "filekit",
    version,
    about = "Everyday file utilities and a CSV reading tracker",
    long_about = "Folder trees, file listings, PDF merge/split/extract/render, batch image \
resizing, audio transcription with AI summaries, DOCX to Markdown through pandoc, and a \
CSV reading list with an importance score.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "FILEKIT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "FILEKIT_QUIET")]
    quiet: bool,

    /// Disable progress bars.
    #[arg(long, global = true, env = "FILEKIT_NO_PROGRESS")]
    no_progress: bool,

    /// Print results as JSON where the command supports it.
    #[arg(long, global = true, env = "FILEKIT_JSON")]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Draw the folder tree under a directory.
    Tree(TreeArgs),
    /// List the files directly inside a directory.
    Ls(LsArgs),
    /// PDF tools.
    #[command(subcommand)]
    Pdf(PdfCommand),
    /// Resize images by percentage, width or height.
    Resize(ResizeArgs),
    /// Transcribe audio files, optionally with an AI summary.
    Transcribe(TranscribeArgs),
    /// Convert a Word document to Markdown with pandoc.
    Docx2md(DocxArgs),
    /// Reading list.
    Books(BooksArgs),
}

#[derive(Args, Debug)]
struct TreeArgs {
    /// Directory to draw.
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Directories at this depth are shown but not expanded.
    #[arg(long, env = "FILEKIT_TREE_MAX_DEPTH", default_value_t = 5,
          value_parser = clap::value_parser!(u32).range(1..=20))]
    max_depth: u32,

    /// Children shown per directory before truncating.
    #[arg(long, env = "FILEKIT_TREE_MAX_ITEMS", default_value_t = 50,
          value_parser = clap::value_parser!(u32).range(10..=500))]
    max_items: u32,

    /// Prefix entries with an icon instead of a trailing `/` on folders.
    #[arg(long)]
    icons: bool,

    /// Save the tree to this file instead of printing it.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LsArgs {
    /// Directory to list.
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Save the report to this file instead of printing it.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum PdfCommand {
    /// Concatenate PDFs in the given order.
    Merge {
        /// PDFs to merge, first to last.
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Output file.
        #[arg(short, long, default_value = "merged.pdf")]
        output: PathBuf,
    },
    /// Split a PDF into one file per page, bundled as a ZIP.
    Split {
        input: PathBuf,

        /// Name prefix of the per-page files. Default: the input's stem.
        #[arg(long)]
        prefix: Option<String>,

        /// Output ZIP. Default: `<stem>_pages.zip`.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        password: PasswordArg,
    },
    /// Copy selected pages into a new PDF.
    Extract {
        input: PathBuf,

        /// Page selection: all, 5, 3-15, or 1, 3-5, 8.
        #[arg(long, env = "FILEKIT_PAGES")]
        pages: PageSelection,

        /// Output file. Default: `<stem>_extracted.pdf`.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        password: PasswordArg,
    },
    /// Render every page to PNG or JPEG.
    ToImages {
        input: PathBuf,

        /// Rendering DPI (72–300).
        #[arg(long, env = "FILEKIT_DPI", default_value_t = 150,
              value_parser = clap::value_parser!(u32).range(72..=300))]
        dpi: u32,

        /// Image format.
        #[arg(long, value_enum, default_value = "png")]
        format: RasterFormatArg,

        /// Output file. Default: `<stem>.<ext>` for one page, `<stem>_images.zip` otherwise.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        password: PasswordArg,
    },
    /// Print document metadata.
    Inspect {
        input: PathBuf,

        #[command(flatten)]
        password: PasswordArg,
    },
}

#[derive(Args, Debug)]
struct PasswordArg {
    /// PDF user password for encrypted documents.
    #[arg(long, env = "FILEKIT_PDF_PASSWORD")]
    password: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RasterFormatArg {
    Png,
    Jpeg,
}

impl From<RasterFormatArg> for RasterFormat {
    fn from(v: RasterFormatArg) -> Self {
        match v {
            RasterFormatArg::Png => RasterFormat::Png,
            RasterFormatArg::Jpeg => RasterFormat::Jpeg,
        }
    }
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("mode").required(true).args(["percent", "width", "height"])))]
struct ResizeArgs {
    /// Images to resize (PNG, JPEG, WebP).
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Scale both sides to this percentage (1–200).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=200))]
    percent: Option<u32>,

    /// Target width in pixels; height keeps the aspect ratio.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    width: Option<u32>,

    /// Target height in pixels; width keeps the aspect ratio.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    height: Option<u32>,

    /// Output file. Default: `resized_<name>` for one image, `resized_images.zip` otherwise.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl ResizeArgs {
    fn mode(&self) -> Result<ResizeMode> {
        match (self.percent, self.width, self.height) {
            (Some(p), _, _) => Ok(ResizeMode::Percent(p)),
            (_, Some(w), _) => Ok(ResizeMode::Width(w)),
            (_, _, Some(h)) => Ok(ResizeMode::Height(h)),
            _ => bail!("one of --percent, --width or --height is required"),
        }
    }
}

#[derive(Args, Debug)]
struct AiArgs {
    /// OpenAI API key (transcription and the default chat provider).
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chat provider: openai, anthropic, gemini, ollama, …
    #[arg(long, env = "FILEKIT_AI_PROVIDER")]
    provider: Option<String>,

    /// Chat model ID.
    #[arg(long, env = "FILEKIT_AI_MODEL")]
    model: Option<String>,

    /// Retries per chat call on failure.
    #[arg(long, env = "FILEKIT_AI_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,
}

impl AiArgs {
    fn to_config(&self) -> Result<AiConfig> {
        let mut builder = AiConfig::builder().max_retries(self.max_retries);
        if let Some(ref key) = self.api_key {
            builder = builder.api_key(key.clone());
        }
        if let Some(ref provider) = self.provider {
            builder = builder.provider_name(provider.clone());
        }
        if let Some(ref model) = self.model {
            builder = builder.model(model.clone());
        }
        builder.build().context("Invalid AI configuration")
    }
}

#[derive(Args, Debug)]
struct TranscribeArgs {
    /// Audio files (mp3, wav, m4a, ogg, flac, mp4, webm).
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Also produce a structured summary of the transcripts.
    #[arg(long)]
    summary: bool,

    /// Speech-to-text model.
    #[arg(long, env = "FILEKIT_TRANSCRIPTION_MODEL", default_value = "whisper-1")]
    transcription_model: String,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, env = "FILEKIT_API_BASE_URL", default_value = "https://api.openai.com/v1")]
    api_base_url: String,

    /// Save the transcript (and summary) to this file instead of printing it.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    ai: AiArgs,
}

#[derive(Args, Debug)]
struct DocxArgs {
    /// Word document (.docx).
    input: PathBuf,

    /// Output file. Prints to stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Markdown dialect.
    #[arg(long, value_enum, default_value = "pandoc")]
    flavor: FlavorArg,

    /// Keep pandoc's output as is.
    #[arg(long)]
    no_clean: bool,

    /// pandoc executable.
    #[arg(long, env = "PANDOC_PATH", default_value = "pandoc")]
    pandoc: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FlavorArg {
    Pandoc,
    Gfm,
    Commonmark,
}

impl From<FlavorArg> for MarkdownFlavor {
    fn from(v: FlavorArg) -> Self {
        match v {
            FlavorArg::Pandoc => MarkdownFlavor::Pandoc,
            FlavorArg::Gfm => MarkdownFlavor::Gfm,
            FlavorArg::Commonmark => MarkdownFlavor::CommonMark,
        }
    }
}

#[derive(Args, Debug)]
struct BooksArgs {
    /// Reading list CSV.
    #[arg(long, env = BOOKS_CSV_ENV, default_value = "books.csv", global = true)]
    csv: PathBuf,

    #[command(subcommand)]
    command: BooksCommand,
}

#[derive(Subcommand, Debug)]
enum BooksCommand {
    /// Show the table, filtered and ordered.
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Show at most this many rows.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show every field of one book.
    Show { title: String },
    /// Add a book.
    Add(AddArgs),
    /// Change a book's status.
    Update {
        title: String,

        /// New status: read, to-read, reading.
        #[arg(long)]
        status: ReadingStatus,

        /// Rating 1–5, kept when the status is read.
        #[arg(long)]
        rating: Option<u8>,

        /// Month finished as YYYY/MM, kept when the status is read.
        #[arg(long)]
        read_date: Option<String>,

        /// Where the book is, kept when the status is reading.
        #[arg(long)]
        availability: Option<String>,
    },
    /// Remove every book with exactly this title.
    Delete { title: String },
    /// Status counts, rating and score summaries, frequencies.
    Stats,
    /// Books finished per month or year.
    Timeline {
        #[arg(long, value_enum, default_value = "month")]
        by: GranularityArg,

        #[arg(long, value_enum, default_value = "overall")]
        group: GroupArg,
    },
    /// Category weights used by the importance score.
    Categories,
    /// Values offered for availability and category.
    Options,
    /// Match books to cover images in a directory.
    Mural {
        /// Cover image directory.
        #[arg(long, env = "FILEKIT_COVERS_DIR", default_value = "capas")]
        covers: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Ask the AI for a book's details without saving them.
    Suggest {
        title: String,

        #[command(flatten)]
        ai: AiArgs,
    },
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Text to look for in title or author.
    #[arg(long)]
    search: Option<String>,

    /// Keep these categories (repeatable).
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Keep these statuses (repeatable): read, to-read, reading.
    #[arg(long = "status")]
    statuses: Vec<ReadingStatus>,

    /// Keep these priorities (repeatable).
    #[arg(long = "priority")]
    priorities: Vec<String>,

    /// Earliest publication year.
    #[arg(long)]
    year_from: Option<i32>,

    /// Latest publication year.
    #[arg(long)]
    year_to: Option<i32>,
}

impl FilterArgs {
    fn to_filter(&self, books: &[Book]) -> BookFilter {
        let year_range = match (self.year_from, self.year_to) {
            (None, None) => None,
            (from, to) => {
                let (lo, hi) = year_bounds(books).unwrap_or((i32::MIN, i32::MAX));
                Some((from.unwrap_or(lo), to.unwrap_or(hi)))
            }
        };
        BookFilter {
            search: self.search.clone(),
            categories: self.categories.clone(),
            statuses: self.statuses.clone(),
            priorities: self.priorities.clone(),
            year_range,
        }
    }
}

#[derive(Args, Debug)]
struct AddArgs {
    title: String,

    #[arg(long)]
    author: Option<String>,

    /// Publication year.
    #[arg(long)]
    year: Option<i32>,

    /// Técnico or Não Técnico.
    #[arg(long)]
    kind: Option<String>,

    /// e.g. "3 - Média-Alta".
    #[arg(long, default_value = "2 - Média")]
    priority: String,

    #[arg(long, default_value = "to-read")]
    status: ReadingStatus,

    #[arg(long, default_value = "Estante")]
    availability: String,

    #[arg(long)]
    category: Option<String>,

    /// Planned reading order.
    #[arg(long)]
    order: Option<u32>,

    /// Rating 1–5 (read books only).
    #[arg(long)]
    rating: Option<u8>,

    /// Month finished as YYYY/MM (read books only).
    #[arg(long)]
    read_date: Option<String>,

    #[arg(long)]
    motivation: Option<String>,

    /// Fill missing author, year, type, category and motivation with AI.
    #[arg(long)]
    suggest: bool,

    #[command(flatten)]
    ai: AiArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GranularityArg {
    Month,
    Year,
}

impl From<GranularityArg> for Granularity {
    fn from(v: GranularityArg) -> Self {
        match v {
            GranularityArg::Month => Granularity::Month,
            GranularityArg::Year => Granularity::Year,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GroupArg {
    Overall,
    Kind,
    Category,
}

impl From<GroupArg> for TimelineGroup {
    fn from(v: GroupArg) -> Self {
        match v {
            GroupArg::Overall => TimelineGroup::Overall,
            GroupArg::Kind => TimelineGroup::Kind,
            GroupArg::Category => TimelineGroup::Category,
        }
    }
}

/// Output switches shared by every command.
#[derive(Debug, Clone, Copy)]
struct Ui {
    quiet: bool,
    json: bool,
    progress: bool,
}

impl Ui {
    fn progress(&self, verb: &'static str, unit: &'static str) -> Option<ProgressCallback> {
        self.progress
            .then(|| CliProgressCallback::new(verb, unit) as Arc<dyn BatchProgressCallback>)
    }

    fn saved(&self, path: &Path, detail: &str) {
        if !self.quiet {
            eprintln!(
                "{}  {}  {}",
                green("✔"),
                bold(&path.display().to_string()),
                dim(detail)
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar gives the feedback that matters, so INFO-level
    // library logs are suppressed while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    let ui = Ui {
        quiet: cli.quiet,
        json: cli.json,
        progress: show_progress,
    };

    match cli.command {
        Command::Tree(args) => run_tree(args, ui),
        Command::Ls(args) => run_ls(args, ui),
        Command::Pdf(cmd) => run_pdf(cmd, ui).await,
        Command::Resize(args) => run_resize(args, ui).await,
        Command::Transcribe(args) => run_transcribe(args, ui).await,
        Command::Docx2md(args) => run_docx(args, ui).await,
        Command::Books(args) => run_books(args, ui).await,
    }
}

// ── Files ────────────────────────────────────────────────────────────────────

fn run_tree(args: TreeArgs, ui: Ui) -> Result<()> {
    if !args.path.is_dir() {
        bail!("'{}' is not an existing directory", args.path.display());
    }
    let options = TreeOptions {
        max_depth: args.max_depth as usize,
        max_items: args.max_items as usize,
        use_icons: args.icons,
    };
    let text = render_tree_text(&args.path, &options)
        .with_context(|| format!("Failed to draw tree for {}", args.path.display()))?;

    match args.output {
        Some(ref path) => {
            write_output(path, text.as_bytes())?;
            ui.saved(path, &format!("{} lines", text.lines().count()));
        }
        None => print_text(&text)?,
    }
    Ok(())
}

fn run_ls(args: LsArgs, ui: Ui) -> Result<()> {
    let listing = list_files(&args.path)
        .with_context(|| format!("Failed to list {}", args.path.display()))?;

    if ui.json {
        return print_json(&listing);
    }
    let report = listing.report();
    match args.output {
        Some(ref path) => {
            write_output(path, report.as_bytes())?;
            ui.saved(path, &format!("{} files", listing.files.len()));
        }
        None => print_text(&report)?,
    }
    Ok(())
}

// ── PDF ──────────────────────────────────────────────────────────────────────

async fn run_pdf(cmd: PdfCommand, ui: Ui) -> Result<()> {
    match cmd {
        PdfCommand::Merge { inputs, output } => {
            let mut pdfs = Vec::with_capacity(inputs.len());
            for path in &inputs {
                pdfs.push(read_pdf(path, None).await?);
            }
            let count = pdfs.len();
            let bytes = pdf::merge_pdfs(pdfs).await.context("Merge failed")?;
            write_output(&output, &bytes)?;
            ui.saved(&output, &format!("{count} files merged"));
        }
        PdfCommand::Split {
            input,
            prefix,
            output,
            password,
        } => {
            let pdf = read_pdf(&input, password.password).await?;
            let prefix = prefix.unwrap_or_else(|| pdf.stem().to_string());
            let output =
                output.unwrap_or_else(|| PathBuf::from(format!("{}_pages.zip", pdf.stem())));
            let bytes = pdf::split_pdf(pdf, prefix).await.context("Split failed")?;
            write_output(&output, &bytes)?;
            ui.saved(&output, "one PDF per page");
        }
        PdfCommand::Extract {
            input,
            pages,
            output,
            password,
        } => {
            let pdf = read_pdf(&input, password.password).await?;
            let output =
                output.unwrap_or_else(|| PathBuf::from(format!("{}_extracted.pdf", pdf.stem())));
            let bytes = pdf::extract_pages(pdf, pages)
                .await
                .context("Page extraction failed")?;
            write_output(&output, &bytes)?;
            ui.saved(&output, "selected pages");
        }
        PdfCommand::ToImages {
            input,
            dpi,
            format,
            output,
            password,
        } => {
            let pdf = read_pdf(&input, password.password).await?;
            let stem = pdf.stem().to_string();

            let mut builder = RasterConfig::builder().dpi(dpi).format(format.into());
            if let Some(cb) = ui.progress("Rendering", "pages") {
                builder = builder.progress_callback(cb);
            }
            let config = builder.build().context("Invalid render configuration")?;

            let rendered = pdf::pdf_to_images(pdf, config)
                .await
                .context("Rendering failed")?;
            let output = output.unwrap_or_else(|| PathBuf::from(rendered.file_name(&stem)));
            write_output(&output, rendered.bytes())?;
            let detail = match rendered {
                RasterOutput::Single { .. } => "1 page".to_string(),
                RasterOutput::Archive { pages, .. } => format!("{pages} pages"),
            };
            ui.saved(&output, &detail);
        }
        PdfCommand::Inspect { input, password } => {
            let pdf = read_pdf(&input, password.password).await?;
            let meta = pdf::inspect(pdf).await.context("Failed to inspect PDF")?;

            if ui.json {
                return print_json(&meta);
            }
            println!("File:         {}", input.display());
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
            if let Some(ref d) = meta.creation_date {
                println!("Created:      {}", d);
            }
            if let Some(ref d) = meta.modification_date {
                println!("Modified:     {}", d);
            }
        }
    }
    Ok(())
}

async fn read_pdf(path: &Path, password: Option<String>) -> Result<PdfInput> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let input = PdfInput::new(display_name(path), bytes);
    Ok(match password {
        Some(p) => input.with_password(p),
        None => input,
    })
}

// ── Images ───────────────────────────────────────────────────────────────────

async fn run_resize(args: ResizeArgs, ui: Ui) -> Result<()> {
    let mode = args.mode()?;
    let mut inputs = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        inputs.push((display_name(path), bytes));
    }

    let progress = ui.progress("Resizing", "images");
    let batch = tokio::task::spawn_blocking(move || filekit::resize_batch(inputs, mode, progress))
        .await
        .context("Resize task panicked")?;

    if !ui.quiet {
        for err in &batch.errors {
            eprintln!("  {} {}", red("✗"), err);
        }
        for img in &batch.images {
            eprintln!(
                "  {} {}  {}",
                green("✓"),
                img.name,
                dim(&img.dimensions_label())
            );
        }
    }

    let failed = batch.errors.len();
    let resized = batch.images.len();
    match batch.into_archive().context("Failed to bundle images")? {
        None => bail!("No image could be resized ({failed} failed)"),
        Some(ResizeDownload::Single(img)) => {
            let output = args
                .output
                .unwrap_or_else(|| PathBuf::from(format!("resized_{}", img.name)));
            write_output(&output, &img.bytes)?;
            ui.saved(&output, &img.dimensions_label());
        }
        Some(ResizeDownload::Archive { name, bytes }) => {
            let output = args.output.unwrap_or_else(|| PathBuf::from(name));
            write_output(&output, &bytes)?;
            ui.saved(&output, &format!("{resized} images, {failed} failed"));
        }
    }
    Ok(())
}

// ── Audio ────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct TranscriptionReport<'a> {
    #[serde(flatten)]
    batch: &'a TranscriptBatch,
    summary: Option<&'a str>,
}

async fn run_transcribe(args: TranscribeArgs, ui: Ui) -> Result<()> {
    let mut config = args.ai.to_config()?;
    config.transcription_model = args.transcription_model.clone();
    config.api_base_url = args.api_base_url.trim_end_matches('/').to_string();

    let mut inputs = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        inputs.push((display_name(path), bytes));
    }

    let batch = audio::transcribe_batch(inputs, &config, ui.progress("Transcribing", "files"))
        .await;
    if batch.transcripts.is_empty() {
        let reasons: Vec<String> = batch.errors.iter().map(|e| e.to_string()).collect();
        bail!("No file could be transcribed:\n  {}", reasons.join("\n  "));
    }
    if !ui.quiet {
        for err in &batch.errors {
            eprintln!("  {} {}", red("✗"), err);
        }
    }

    let text = batch.combined_text();
    let summary = if args.summary {
        Some(
            audio::summarize(&text, &config)
                .await
                .context("Summary failed")?,
        )
    } else {
        None
    };

    if ui.json {
        return print_json(&TranscriptionReport {
            batch: &batch,
            summary: summary.as_deref(),
        });
    }

    let mut document = format!("# Transcript\n\n{text}\n");
    if let Some(ref s) = summary {
        document.push_str(&format!("\n# Summary\n\n{s}\n"));
    }
    match args.output {
        Some(ref path) => {
            write_output(path, document.as_bytes())?;
            ui.saved(
                path,
                &format!("{} transcripts", batch.transcripts.len()),
            );
        }
        None => print_text(&document)?,
    }
    Ok(())
}

// ── Documents ────────────────────────────────────────────────────────────────

async fn run_docx(args: DocxArgs, ui: Ui) -> Result<()> {
    let config = DocxConfig {
        pandoc_binary: args.pandoc.clone(),
        flavor: args.flavor.into(),
        clean_output: !args.no_clean,
    };
    let markdown = document::docx_to_markdown(&args.input, &config)
        .await
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;

    match args.output {
        Some(ref path) => {
            write_output(path, markdown.as_bytes())?;
            ui.saved(path, &format!("{} characters", markdown.chars().count()));
        }
        None => print_text(&markdown)?,
    }
    Ok(())
}

// ── Reading list ─────────────────────────────────────────────────────────────

async fn run_books(args: BooksArgs, ui: Ui) -> Result<()> {
    let csv = args.csv;
    let load = || {
        Library::load(&csv).with_context(|| format!("Failed to load reading list {}", csv.display()))
    };

    match args.command {
        BooksCommand::List { filter, limit } => {
            let library = load()?;
            let filter = filter.to_filter(library.books());
            let mut rows = filter.apply(library.books());
            if let Some(n) = limit {
                rows.truncate(n);
            }
            if ui.json {
                return print_json(&rows);
            }
            print_book_table(&rows, filter.is_reading_queue());
            if !ui.quiet {
                eprintln!(
                    "{}",
                    dim(&format!("{} of {} books", rows.len(), library.len()))
                );
            }
        }
        BooksCommand::Show { title } => {
            let library = load()?;
            let book = library
                .find(&title)
                .with_context(|| format!("Book not found: '{title}'"))?;
            if ui.json {
                return print_json(book);
            }
            print_book(book);
        }
        BooksCommand::Add(add) => {
            let mut library = load()?;
            let mut book = Book {
                title: add.title.clone(),
                author: add.author.clone().unwrap_or_default(),
                year: add.year,
                kind: add.kind.clone().unwrap_or_default(),
                priority: add.priority.clone(),
                status: add.status,
                availability: add.availability.clone(),
                category: add.category.clone().unwrap_or_default(),
                order: add.order,
                rating: add.rating,
                read_date: add.read_date.clone(),
                motivation: add.motivation.clone(),
                ..Book::default()
            };
            if add.suggest {
                let config = add.ai.to_config()?;
                let suggestion = suggest_book_details(&add.title, &config)
                    .await
                    .context("AI suggestion failed")?;
                suggestion.fill(&mut book);
            }
            let added = library.add_book(book).context("Could not add book")?;
            let detail = format!("score {}", added.score);
            let title = added.title.clone();
            library.save().context("Failed to save reading list")?;
            ui.saved(&csv, &format!("added '{title}', {detail}"));
        }
        BooksCommand::Update {
            title,
            status,
            rating,
            read_date,
            availability,
        } => {
            let mut library = load()?;
            let update = StatusUpdate {
                status,
                rating,
                read_date,
                availability,
            };
            let book = library
                .update_status(&title, update)
                .context("Could not update book")?;
            let detail = format!("'{}' → {}", book.title, book.status);
            library.save().context("Failed to save reading list")?;
            ui.saved(&csv, &detail);
        }
        BooksCommand::Delete { title } => {
            let mut library = load()?;
            let removed = library
                .delete_book(&title)
                .context("Could not delete book")?;
            library.save().context("Failed to save reading list")?;
            ui.saved(&csv, &format!("removed {removed} × '{title}'"));
        }
        BooksCommand::Stats => {
            let library = load()?;
            let stats = library_stats(library.books());
            if ui.json {
                return print_json(&stats);
            }
            print_stats(&stats);
        }
        BooksCommand::Timeline { by, group } => {
            let library = load()?;
            let points = timeline(library.books(), by.into(), group.into());
            if ui.json {
                return print_json(&points);
            }
            if points.is_empty() {
                println!("No finished books with a read date yet.");
            }
            for p in &points {
                let bar = "█".repeat(p.count);
                match p.group {
                    Some(ref g) => println!("{:<8} {:<40} {:>3} {}", p.period, g, p.count, bar),
                    None => println!("{:<8} {:>3} {}", p.period, p.count, bar),
                }
            }
        }
        BooksCommand::Categories => {
            if ui.json {
                return print_json(&CATEGORY_WEIGHTS.to_vec());
            }
            for (name, weight) in CATEGORY_WEIGHTS {
                println!("{weight:>3}  {name}");
            }
        }
        BooksCommand::Options => {
            let library = load()?;
            let availability = library.availability_options();
            let categories = library.category_options();
            if ui.json {
                return print_json(&serde_json::json!({
                    "availability": availability,
                    "categories": categories,
                    "in_use": distinct_categories(library.books()),
                }));
            }
            println!("{}", bold("Availability"));
            for a in &availability {
                println!("  {a}");
            }
            println!("{}", bold("Categories"));
            for c in &categories {
                println!("  {c}");
            }
        }
        BooksCommand::Mural { covers, filter } => {
            let library = load()?;
            let index = CoverIndex::scan(&covers)
                .with_context(|| format!("Failed to scan covers in {}", covers.display()))?;
            let filter = filter.to_filter(library.books());
            let mural = build_mural(library.books(), &index, &filter);
            if ui.json {
                return print_json(&mural);
            }
            for card in &mural.cards {
                let rating = card
                    .book
                    .rating
                    .map(|r| "★".repeat(r as usize))
                    .unwrap_or_default();
                let cover = match card.cover {
                    Some(ref p) => p.display().to_string(),
                    None => dim("no cover"),
                };
                println!("{:<5} {:<45} {}", rating, card.book.title, cover);
            }
            if !ui.quiet {
                eprintln!(
                    "{}",
                    dim(&format!(
                        "{} books, {} covers found in {}",
                        mural.cards.len(),
                        mural.covers_found,
                        covers.display()
                    ))
                );
            }
        }
        BooksCommand::Suggest { title, ai } => {
            let config = ai.to_config()?;
            let suggestion = suggest_book_details(&title, &config)
                .await
                .context("AI suggestion failed")?;
            print_json(&suggestion)?;
        }
    }
    Ok(())
}

fn print_book_table(rows: &[&Book], queue: bool) {
    println!(
        "{}",
        bold(&format!(
            "{:>4}  {:<40} {:<25} {:>5}  {:<8} {:>5}",
            if queue { "#" } else { "Nota" },
            "Título",
            "Autor",
            "Ano",
            "Status",
            "Score"
        ))
    );
    for b in rows {
        let lead = if queue {
            b.order.map(|o| o.to_string())
        } else {
            b.rating.map(|r| r.to_string())
        };
        println!(
            "{:>4}  {:<40} {:<25} {:>5}  {:<8} {:>5}",
            lead.unwrap_or_default(),
            clip(&b.title, 40),
            clip(&b.author, 25),
            b.year.map(|y| y.to_string()).unwrap_or_default(),
            b.status.label(),
            b.score
        );
    }
}

fn print_book(b: &Book) {
    let opt = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    println!("{}", bold(&b.title));
    println!("Author:        {}", b.author);
    println!("Year:          {}", opt(b.year.map(|y| y.to_string())));
    println!("Type:          {}", b.kind);
    println!("Category:      {}", b.category);
    println!("Priority:      {}", b.priority);
    println!("Status:        {}", b.status);
    println!("Availability:  {}", b.availability);
    println!("Order:         {}", opt(b.order.map(|o| o.to_string())));
    println!("Rating:        {}", opt(b.rating.map(|r| r.to_string())));
    println!("Read:          {}", opt(b.read_date.clone()));
    println!("Score:         {}", b.score);
    if let Some(ref m) = b.motivation {
        println!("Motivation:    {}", m);
    }
}

fn print_stats(stats: &analysis::LibraryStats) {
    let o = &stats.overview;
    println!(
        "{} read  ·  {} to read  ·  {} reading  ·  {} categories",
        bold(&o.read.to_string()),
        bold(&o.to_read.to_string()),
        bold(&o.reading.to_string()),
        bold(&o.categories.to_string()),
    );
    for (label, summary) in [("Rating", stats.ratings), ("Score", stats.scores)] {
        if let Some(s) = summary {
            println!(
                "{label:<7} min {:.1}  mean {:.2}  max {:.1}  {}",
                s.min,
                s.mean,
                s.max,
                dim(&format!("({} books)", s.count))
            );
        }
    }
    let tables = [
        ("Read by category", &stats.read_by_category),
        ("All by category", &stats.all_by_category),
        ("Read by type", &stats.read_by_kind),
        ("All by type", &stats.all_by_kind),
    ];
    for (title, rows) in tables {
        println!("\n{}", cyan(title));
        for (name, count) in rows.iter() {
            println!("  {count:>4}  {name}");
        }
    }
}

// ── Output helpers ───────────────────────────────────────────────────────────

fn clip(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

fn print_text(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}
