//! `folio` command-line tool: inspect and render CBZ, EPUB, XPS and office
//! documents.

use anyhow::{bail, Context as _, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use folio::{Context, DocumentFormat, OpenOptions};
use folio_core::{IRect, Matrix};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "folio",
    about = "Inspect and render archive-based documents",
    long_about = "Inspect and render archive-based documents.\n\
                  \n\
                  Supports comic archives (CBZ, CBT, CB7), EPUB, XPS/OpenXPS and\n\
                  office documents (DOCX, XLSX, PPTX, ODT, ODS, ODP).",
    version
)]
struct Args {
    /// Show more log output (repeat for more detail)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show format, metadata and page sizes
    Info {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Treat the input as this format instead of detecting it
        #[arg(long, value_name = "FORMAT", value_parser = parse_format)]
        format: Option<DocumentFormat>,
    },

    /// Print the table of contents or outline
    Toc {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Render one page, with its annotations, to SVG or a command trace
    Render {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Output file (stdout if omitted)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Output device
        #[arg(short, long, value_enum, default_value = "svg")]
        device: DeviceKind,

        /// Comma-separated device options, e.g. `text=text,reuse-images=no`
        #[arg(long, value_name = "OPTIONS", default_value = "")]
        options: String,

        /// Zoom factor applied to the page
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DeviceKind {
    /// SVG document
    Svg,
    /// JSON lines of the commands a draw device received
    Trace,
}

/// One command seen by the draw device.
#[derive(Serialize)]
struct TraceLine<'a> {
    command: &'a str,
    bbox: [f32; 4],
}

fn parse_format(s: &str) -> Result<DocumentFormat, String> {
    DocumentFormat::from_extension(s).ok_or_else(|| format!("unknown format '{s}'"))
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match args.command {
        Commands::Info {
            input,
            json,
            format,
        } => info_command(&input, json, format),
        Commands::Toc { input, json } => toc_command(&input, json),
        Commands::Render {
            input,
            page,
            output,
            device,
            options,
            scale,
        } => render_command(&input, page, output.as_deref(), device, &options, scale),
    }
}

fn open(ctx: &mut Context, input: &Path, options: &OpenOptions) -> Result<folio::DocumentHandle> {
    if !input.exists() {
        bail!("File not found: {}", input.display());
    }
    ctx.open_document(input, options)
        .with_context(|| format!("Failed to open {}", input.display()))
}

fn info_command(input: &Path, json: bool, format: Option<DocumentFormat>) -> Result<()> {
    let mut ctx = Context::new();
    let options = match format {
        Some(format) => OpenOptions::default().with_format(format),
        None => OpenOptions::default(),
    };
    let doc = open(&mut ctx, input, &options)?;
    let info = ctx.document(doc)?.info()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File:    {}", input.display());
    println!("Format:  {}", info.format);
    if let Some(title) = &info.title {
        println!("Title:   {title}");
    }
    if let Some(creator) = &info.creator {
        println!("Creator: {creator}");
    }
    println!("Pages:   {}", info.page_count);
    for page in &info.pages {
        println!("  {:>4}  {} x {}", page.index + 1, page.width, page.height);
    }
    Ok(())
}

fn toc_command(input: &Path, json: bool) -> Result<()> {
    let mut ctx = Context::new();
    let doc = open(&mut ctx, input, &OpenOptions::default())?;
    let outline = ctx.document(doc)?.outline();

    if json {
        println!("{}", serde_json::to_string_pretty(&outline)?);
        return Ok(());
    }
    if outline.is_empty() {
        eprintln!("No outline");
        return Ok(());
    }
    for entry in &outline {
        let indent = "  ".repeat(usize::from(entry.level.saturating_sub(1)));
        match entry.page {
            Some(page) => println!("{indent}{}  (page {})", entry.title, page + 1),
            None => println!("{indent}{}", entry.title),
        }
    }
    Ok(())
}

fn render_command(
    input: &Path,
    page: usize,
    output: Option<&Path>,
    device: DeviceKind,
    options: &str,
    scale: f32,
) -> Result<()> {
    if page == 0 {
        bail!("Page numbers start at 1");
    }
    if !scale.is_finite() || scale <= 0.0 {
        bail!("Scale must be a positive number, got {scale}");
    }

    let mut ctx = Context::new();
    let doc = open(&mut ctx, input, &OpenOptions::default())?;
    let page_handle = ctx.load_page(doc, page - 1)?;
    ctx.update_page(page_handle)?;
    let ctm = Matrix::scale(scale, scale);
    let cookie = ctx.new_cookie();

    let bytes = match device {
        DeviceKind::Svg => {
            let dev = ctx
                .new_svg_device(options)
                .with_context(|| format!("Invalid SVG options '{options}'"))?;
            ctx.run_page(page_handle, dev, &ctm, Some(cookie))?;
            ctx.close_device(dev)?;
            ctx.take_svg_output(dev)?
        }
        DeviceKind::Trace => {
            if !options.is_empty() {
                bail!("The trace device takes no options");
            }
            let bbox = IRect::round_out(&ctx.page_bounds(page_handle)?.transform(&ctm));
            let dev = ctx.new_draw_device(bbox)?;
            ctx.run_page(page_handle, dev, &ctm, Some(cookie))?;
            ctx.close_device(dev)?;
            let mut out = Vec::new();
            for op in ctx.draw_trace(dev)? {
                let line = TraceLine {
                    command: op.command.name(),
                    bbox: [op.bbox.x0, op.bbox.y0, op.bbox.x1, op.bbox.y1],
                };
                serde_json::to_writer(&mut out, &line)?;
                out.push(b'\n');
            }
            out
        }
    };

    let progress = ctx.cookie(cookie)?.progress();
    log::info!(
        "Rendered page {page}: {} commands, {} errors",
        progress.progress,
        progress.errors
    );

    match output {
        Some(path) => fs::write(path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => std::io::stdout().lock().write_all(&bytes)?,
    }
    Ok(())
}
