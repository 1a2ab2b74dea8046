//! CLI binary for edgequake-page2pdf.
//!
//! A thin shim over the library crate: every input image becomes one page,
//! CLI flags map onto `PdfConfig`, and the result is printed.

use anyhow::{bail, Context, Result};
use clap::Parser;
use edgequake_page2pdf::{
    generate_pdf, inspect, share_pdf, GenerationProgressCallback, HostConfig, HostContext,
    PageContent, PageSize, PdfConfig, PdfError, ProgressCallback, RenderError, RenderTarget,
    RenderedPage, SystemViewer,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per embedded page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-page wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_generation_start` reports the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Collecting pages…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Embedding");
        self.bar.reset_eta();
    }

    fn elapsed_ms(&self, page_num: usize) -> u128 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0)
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Composing {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, encoded_bytes: usize) {
        let elapsed_ms = self.elapsed_ms(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{:>7.1} KiB", encoded_bytes as f64 / 1024.0)),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_generation_complete(&self, page_count: usize, _file_size: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages embedded",
            green("✔"),
            bold(&page_count.to_string())
        );
    }

    fn on_generation_failed(&self, error: &PdfError) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), red(&error.to_string()));
    }
}

// ── Image files as page content ──────────────────────────────────────────────

/// Decodes an image file when its page is rendered, so only one decoded
/// image is held at a time.
struct ImageFilePage {
    path: PathBuf,
}

impl PageContent for ImageFilePage {
    fn render(&self, target: RenderTarget) -> BoxFuture<'_, Result<RenderedPage, RenderError>> {
        let path = self.path.clone();
        async move {
            let image = tokio::task::spawn_blocking(move || {
                image::open(&path)
                    .map(|img| img.to_rgba8())
                    .map_err(|e| RenderError::failed(format!("{}: {e}", path.display())))
            })
            .await
            .map_err(|e| RenderError::failed(format!("decode task panicked: {e}")))??;
            Ok(RenderedPage::for_target(image, &target))
        }
        .boxed()
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Scans to a single A4 document in the default output directory
  page2pdf scan-*.png

  # Explicit output file, US Letter, landscape
  page2pdf -o deck.pdf --page-size letter --landscape slide1.png slide2.png

  # Custom page size in points and a document title
  page2pdf -o poster.pdf --page-size 1000x1400 --title "Poster" poster.jpg

  # Print the result as JSON and open it in the system viewer
  page2pdf --json --open page.png

  # Summarise an existing PDF
  page2pdf --inspect document.pdf

PAGE SIZES:
  Name      Points         Millimetres
  ────────  ─────────────  ───────────
  a3        842 × 1191     297 × 420
  a4        595 × 842      210 × 297   (default)
  a5        420 × 595      148 × 210
  letter    612 × 792      216 × 279
  legal     612 × 1008     216 × 356
  tabloid   792 × 1224     279 × 432
  WxH       custom, in points (1/72 inch)

ENVIRONMENT VARIABLES:
  PAGE2PDF_OUTPUT_DIR     Default output directory (else ~/Documents/pdfs)
  PAGE2PDF_OUTPUT         Output file path (bare names go to the current directory)
  PAGE2PDF_PAGE_SIZE      Page size name or WxH
  PAGE2PDF_SCALE          Pixels per point of the input images
  RUST_LOG                Override the log filter
"#;

/// Compose image files into a paginated PDF document.
#[derive(Parser, Debug)]
#[command(
    name = "page2pdf",
    version,
    about = "Compose image files into a paginated PDF document",
    long_about = "Compose image files into a paginated PDF document. Every image becomes one \
page; images are placed at the top-left corner and scaled down to fit when larger than the \
page, never cropped and never split across pages.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image files, one per page, in page order.
    #[arg(required_unless_present = "inspect")]
    images: Vec<PathBuf>,

    /// Output PDF path; a bare file name is written to the current directory.
    /// Without -o: document.pdf in PAGE2PDF_OUTPUT_DIR (else ~/Documents/pdfs).
    #[arg(short, long, env = "PAGE2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Page size: a3, a4, a5, letter, legal, tabloid, or WxH in points.
    #[arg(long, env = "PAGE2PDF_PAGE_SIZE", default_value = "a4", value_parser = parse_page_size)]
    page_size: PageSize,

    /// Rotate the page size to landscape.
    #[arg(long, env = "PAGE2PDF_LANDSCAPE")]
    landscape: bool,

    /// Pixels per point of the input images (0.5–8).
    #[arg(long, env = "PAGE2PDF_SCALE", default_value_t = 2.0)]
    scale: f32,

    /// Document title written to the PDF metadata.
    #[arg(long, env = "PAGE2PDF_TITLE")]
    title: Option<String>,

    /// Flate compression level for page images (0–9).
    #[arg(long, env = "PAGE2PDF_COMPRESSION", default_value_t = 6,
          value_parser = clap::value_parser!(u32).range(0..=9))]
    compression: u32,

    /// Keep oversized images at full resolution instead of resampling.
    #[arg(long, env = "PAGE2PDF_NO_DOWNSAMPLE")]
    no_downsample: bool,

    /// Print the result as JSON.
    #[arg(long, env = "PAGE2PDF_JSON")]
    json: bool,

    /// Summarise an existing PDF instead of generating one.
    #[arg(long, value_name = "FILE", conflicts_with = "images")]
    inspect: Option<PathBuf>,

    /// Open the generated document in the system viewer.
    #[arg(long)]
    open: bool,

    /// Disable progress bar.
    #[arg(long, env = "PAGE2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAGE2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAGE2PDF_QUIET")]
    quiet: bool,
}

fn parse_page_size(s: &str) -> Result<PageSize, String> {
    if let Some(size) = PageSize::from_name(s) {
        return Ok(size);
    }
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("unknown page size '{s}' (try a4, letter or 595x842)"))?;
    let w: f32 = w.trim().parse().map_err(|_| format!("bad width in '{s}'"))?;
    let h: f32 = h.trim().parse().map_err(|_| format!("bad height in '{s}'"))?;
    PageSize::new(w, h).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs when it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.inspect.is_none();
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

    // ── Inspect mode ─────────────────────────────────────────────────────
    if let Some(ref path) = cli.inspect {
        let summary = inspect(path).context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
            );
        } else {
            println!("File:         {}", path.display());
            if let Some(ref t) = summary.title {
                println!("Title:        {}", t);
            }
            println!("Pages:        {}", summary.page_count);
            println!("PDF Version:  {}", summary.version);
            if let Some(first) = summary.page_sizes.first() {
                let uniform = summary.page_sizes.iter().all(|s| s == first);
                println!(
                    "Page size:    {}{}",
                    first,
                    if uniform { "" } else { " (mixed)" }
                );
            }
            if let Some(ref p) = summary.producer {
                println!("Producer:     {}", p);
            }
        }
        return Ok(());
    }

    for image in &cli.images {
        if !image.is_file() {
            bail!("Input image not found: {}", image.display());
        }
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    let host = HostContext::init(HostConfig::default()).context("Failed to initialise host")?;

    // ── Generate ─────────────────────────────────────────────────────────
    let images = cli.images.clone();
    let pdf = generate_pdf(&host.handle(), &config, move |p| {
        for path in images {
            p.page(ImageFilePage { path });
        }
    })
    .await
    .context("PDF generation failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&pdf).context("Failed to serialise result")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} pages  {}  →  {}",
            green("✔"),
            pdf.page_count,
            dim(&format!("{} bytes", pdf.file_size)),
            bold(&pdf.uri().to_string()),
        );
    }

    if cli.open {
        share_pdf(&SystemViewer, &pdf, config.title.as_deref())
            .context("Failed to open the document")?;
    }

    Ok(())
}

/// Map CLI args to `PdfConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PdfConfig> {
    let page_size = if cli.landscape {
        cli.page_size.landscape()
    } else {
        cli.page_size
    };

    let mut builder = PdfConfig::builder()
        .page_size(page_size)
        .render_scale(cli.scale)
        .compression_level(cli.compression)
        .downsample_overflow(!cli.no_downsample);

    if let Some(ref output) = cli.output {
        let (dir, name) = split_output(output)?;
        builder = builder.file_name(name).output_directory(dir);
    }
    if let Some(ref title) = cli.title {
        builder = builder.title(title.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `-o dir/name.pdf` → (dir, "name.pdf"); a bare name resolves against the working directory.
fn split_output(output: &Path) -> Result<(PathBuf, String)> {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Output path has no file name: {}", output.display()))?;
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((dir, name))
}
