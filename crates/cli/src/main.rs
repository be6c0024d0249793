//! CLI tool for turning documents into PowerPoint slide decks.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use deck_app::{Dispatch, GeminiController, Status};
use deck_core::{Audience, DetailLevel, Template};
use deck_generate::ServiceSettings;
use deck_ingest::DocumentKind;
use deck_pptx::{DeckOutline, PptxReader};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Generate presentation decks from PDF or text documents.
#[derive(Parser, Debug)]
#[command(name = "deckgen")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a .pptx deck from a document
    Generate(GenerateArgs),
    /// Print the slide outline of a .pptx file
    Inspect(InspectArgs),
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// Input document (.pdf or .txt), or '-' to read text from stdin
    input: PathBuf,

    /// Output file or directory (default: next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Approximate number of content slides
    #[arg(short = 'n', long, default_value = "5")]
    slides: u32,

    /// Amount of detail per slide
    #[arg(long, value_enum, default_value_t = DetailArg::Detailed)]
    detail: DetailArg,

    /// Intended audience
    #[arg(long, value_enum, default_value_t = AudienceArg::General)]
    audience: AudienceArg,

    /// Visual template: classic, modern, dark or corporate
    #[arg(short, long, default_value = "classic")]
    template: String,

    /// Image for the title slide
    #[arg(long)]
    title_image: Option<PathBuf>,

    /// Image for a content slide, as NUMBER=PATH (slides count from 1)
    #[arg(long = "slide-image", value_parser = parse_slide_image)]
    slide_images: Vec<(usize, PathBuf)>,

    /// Print the generated presentation as JSON
    #[arg(long)]
    print_json: bool,
}

#[derive(clap::Args, Debug)]
struct InspectArgs {
    /// PowerPoint file to read
    input: PathBuf,

    /// Print the outline as JSON
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DetailArg {
    Brief,
    Detailed,
}

impl From<DetailArg> for DetailLevel {
    fn from(detail: DetailArg) -> Self {
        match detail {
            DetailArg::Brief => DetailLevel::Brief,
            DetailArg::Detailed => DetailLevel::Detailed,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AudienceArg {
    Academic,
    General,
    Executive,
}

impl From<AudienceArg> for Audience {
    fn from(audience: AudienceArg) -> Self {
        match audience {
            AudienceArg::Academic => Audience::Academic,
            AudienceArg::General => Audience::General,
            AudienceArg::Executive => Audience::Executive,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match args.command {
        Command::Generate(generate) => run_generate(generate, args.verbose).await,
        Command::Inspect(inspect) => run_inspect(inspect),
    }
}

async fn run_generate(args: GenerateArgs, verbose: bool) -> Result<()> {
    // A missing .env file is fine; the variables may come from the shell
    if let Err(e) = dotenvy::dotenv() {
        log::debug!("No .env loaded: {}", e);
    }
    let settings = ServiceSettings::from_env().context("Cannot reach the generation service")?;
    log::debug!("Using model {}", settings.model());

    let controller = GeminiController::with_gemini(settings);

    let title_image = args.title_image.as_deref().map(read_file).transpose()?;
    controller.configure(|config| {
        config.num_slides = args.slides;
        config.detail_level = args.detail.into();
        config.audience = args.audience.into();
        config.template = Template::parse(&args.template);
        match &title_image {
            Some(bytes) => config.attach_title_image(bytes),
            None => Ok(()),
        }
    })?;

    let (bytes, content_type) = read_input(&args.input)?;
    if verbose {
        eprintln!("Reading {} ({})", args.input.display(), content_type);
    }
    controller.ingest(bytes, content_type).await;
    settled_or_bail(&controller, "Failed to read the document")?;

    if verbose {
        eprintln!(
            "Extracted {} characters, generating slides...",
            controller.snapshot().input_text.chars().count()
        );
    }
    controller.generate().await;
    settled_or_bail(&controller, "Failed to generate slides")?;

    for (number, path) in &args.slide_images {
        let bytes = read_file(path)?;
        controller
            .attach_slide_image(number - 1, &bytes)
            .with_context(|| format!("Cannot attach {} to slide {}", path.display(), number))?;
    }

    let presentation = controller
        .snapshot()
        .presentation
        .context("No presentation was generated")?;

    if verbose {
        eprintln!(
            "Generated '{}' with {} content slides",
            presentation.title,
            presentation.slides.len()
        );
    }
    if args.print_json {
        println!("{}", serde_json::to_string_pretty(&presentation)?);
    }

    let file = match controller.export().await {
        Dispatch::Settled(result) => result.context("Failed to export the presentation")?,
        Dispatch::Ignored => bail!("Export did not run (status: {})", controller.status()),
    };

    let output_path = get_output_path(&args.input, args.output.as_deref(), &file.file_name)?;
    std::fs::write(&output_path, &file.bytes)
        .with_context(|| format!("Failed to write to {}", output_path.display()))?;

    eprintln!("Written to: {}", output_path.display());
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let outline = PptxReader::new()
        .read(BufReader::new(file))
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outline)?);
    } else {
        print!("{}", format_outline(&outline));
    }
    Ok(())
}

/// Turn a failed pipeline step into an error carrying the recorded cause.
fn settled_or_bail(controller: &GeminiController, what: &str) -> Result<()> {
    let state = controller.snapshot();
    match (state.status, state.error) {
        (Status::Error, Some(e)) => Err(e).context(what.to_string()),
        (Status::Error, None) => bail!("{}", what),
        _ => Ok(()),
    }
}

/// Read the input document and pick its content type.
fn read_input(path: &Path) -> Result<(Vec<u8>, &'static str)> {
    if path.as_os_str() == "-" {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read stdin")?;
        return Ok((bytes, DocumentKind::PlainText.content_type()));
    }

    let bytes = read_file(path)?;
    let content_type = DocumentKind::from_magic(&bytes)
        .or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(DocumentKind::from_extension)
        })
        .map(|kind| kind.content_type())
        .unwrap_or("application/octet-stream");

    Ok((bytes, content_type))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to open {}", path.display()))
}

/// Parse a `NUMBER=PATH` slide image argument.
fn parse_slide_image(value: &str) -> std::result::Result<(usize, PathBuf), String> {
    let (number, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NUMBER=PATH, got '{}'", value))?;
    let number: usize = number
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a slide number", number))?;
    if number == 0 {
        return Err("slide numbers start at 1".to_string());
    }
    if path.is_empty() {
        return Err("missing image path".to_string());
    }
    Ok((number, PathBuf::from(path)))
}

/// Determine where to write the exported deck.
fn get_output_path(input_path: &Path, output: Option<&Path>, file_name: &str) -> Result<PathBuf> {
    let output_path = match output {
        Some(path) if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("pptx")) => {
            path.to_path_buf()
        }
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(file_name)
        }
        None if input_path.as_os_str() == "-" => PathBuf::from(file_name),
        None => match input_path.parent() {
            Some(parent) => parent.join(file_name),
            None => PathBuf::from(file_name),
        },
    };

    Ok(output_path)
}

fn format_outline(outline: &DeckOutline) -> String {
    let mut out = String::new();
    for slide in &outline.slides {
        out.push_str(&format!(
            "Slide {}: {}\n",
            slide.number,
            slide.title().unwrap_or("(untitled)")
        ));
        for text in slide.texts.iter().skip(1) {
            for line in text.lines() {
                out.push_str(&format!("  - {}\n", line));
            }
        }
        if slide.picture_count > 0 {
            out.push_str(&format!("  [{} picture(s)]\n", slide.picture_count));
        }
        if let Some(notes) = &slide.notes {
            out.push_str(&format!("  Notes: {}\n", notes.replace('\n', " ")));
        }
    }
    out
}
