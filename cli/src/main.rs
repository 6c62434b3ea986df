//! rationpdf CLI - ration card classification and re-composition tool

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use rationpdf::background::DEFAULT_STATIC_DIR;
use rationpdf::classify::PREVIEW_CHARS;
use rationpdf::extract::preview;
use rationpdf::{
    normalize_text, BackgroundConfig, BackgroundResolver, Category, ComposeOptions, Pipeline,
    PipelineConfig, PipelineResult, TextExtractor,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "rationpdf")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Classify ration card PDFs and redraw them over a category background", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output PDF file
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    backgrounds: BackgroundArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a PDF and write the composed card
    Process {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output PDF file (default: <name>_card.pdf)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        backgrounds: BackgroundArgs,

        /// Stretch the background instead of keeping its aspect ratio
        #[arg(long)]
        stretch: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the category of a PDF without writing anything
    Classify {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create missing background images
    Init {
        #[command(flatten)]
        backgrounds: BackgroundArgs,
    },

    /// Process several PDFs in parallel
    Batch {
        /// Input PDF files
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        #[command(flatten)]
        backgrounds: BackgroundArgs,

        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(Args, Clone)]
struct BackgroundArgs {
    /// Directory holding the default background images
    #[arg(long, value_name = "DIR", default_value = DEFAULT_STATIC_DIR, env = "RATIONPDF_STATIC_DIR")]
    static_dir: PathBuf,

    /// Background for AAY cards
    #[arg(long, value_name = "IMAGE")]
    aay: Option<PathBuf>,

    /// Background for APL cards
    #[arg(long, value_name = "IMAGE")]
    apl: Option<PathBuf>,

    /// Background for BPL cards
    #[arg(long, value_name = "IMAGE")]
    bpl: Option<PathBuf>,

    /// Background for unclassified documents
    #[arg(long = "default-bg", value_name = "IMAGE")]
    default_bg: Option<PathBuf>,
}

impl BackgroundArgs {
    fn config(&self) -> BackgroundConfig {
        let overrides = [
            (Category::Aay, &self.aay),
            (Category::Apl, &self.apl),
            (Category::Bpl, &self.bpl),
            (Category::Default, &self.default_bg),
        ];

        overrides.into_iter().fold(
            BackgroundConfig::new().with_static_dir(&self.static_dir),
            |config, (category, path)| match path {
                Some(path) => config.with_path(category, path),
                None => config,
            },
        )
    }
}

impl Default for BackgroundArgs {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            aay: None,
            apl: None,
            bpl: None,
            default_bg: None,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Process {
            input,
            output,
            backgrounds,
            stretch,
            json,
        }) => cmd_process(&input, output.as_deref(), &backgrounds, stretch, json),
        Some(Commands::Classify { input, json }) => cmd_classify(&input, json),
        Some(Commands::Init { backgrounds }) => cmd_init(&backgrounds),
        Some(Commands::Batch {
            inputs,
            output,
            backgrounds,
            json,
        }) => cmd_batch(&inputs, &output, &backgrounds, json),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: process if input is provided
            if let Some(input) = cli.input {
                cmd_process(&input, cli.output.as_deref(), &cli.backgrounds, false, false)
            } else {
                println!("{}", "Usage: rationpdf <FILE> [OUTPUT]".yellow());
                println!("       rationpdf --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn default_output(input: &Path, dir: Option<&Path>) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let name = format!("{}_card.pdf", stem);
    match dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

/// Output paths for a batch, one per input, all distinct.
///
/// Inputs sharing a file stem get `_1`, `_2`, … appended in input order.
fn batch_outputs(inputs: &[PathBuf], dir: &Path) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let mut output = default_output(input, Some(dir));
            let mut n = 0;
            while !taken.insert(output.clone()) {
                n += 1;
                let stem = input.file_stem().unwrap_or_default().to_string_lossy();
                output = dir.join(format!("{}_card_{}.pdf", stem, n));
            }
            output
        })
        .collect()
}

fn build_pipeline(backgrounds: &BackgroundArgs, stretch: bool) -> CliResult<Pipeline> {
    let mut compose = ComposeOptions::new();
    if stretch {
        compose = compose.stretch_background();
    }
    let config = PipelineConfig::new()
        .with_background(backgrounds.config())
        .with_compose_options(compose);
    Ok(Pipeline::new(config)?)
}

fn cmd_process(
    input: &Path,
    output: Option<&Path>,
    backgrounds: &BackgroundArgs,
    stretch: bool,
    json: bool,
) -> CliResult<()> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(input, None));

    let pipeline = build_pipeline(backgrounds, stretch)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Processing {}...", input.display()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = pipeline.run(input, &output);
    pb.finish_and_clear();
    let result = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &PipelineResult) {
    println!("{}: {}", "Category".bold(), result.category.to_string().cyan().bold());
    match result.rule {
        Some(ref rule) => println!("{}: '{}'", "Matched".bold(), rule),
        None => println!("{}: {}", "Matched".bold(), "no rule".dimmed()),
    }
    println!("{}: {}", "Background".bold(), result.background.display());
    if !result.report.stripped_images.is_empty() {
        println!(
            "{}: {}",
            "Removed images".bold(),
            result.report.stripped_images.join(", ")
        );
    }
    for warning in &result.report.warnings {
        println!("{} {}", "Warning:".yellow(), warning);
    }
    println!("{} {}", "Saved to".green(), result.output.display());
}

fn cmd_classify(input: &Path, json: bool) -> CliResult<()> {
    let text = normalize_text(&TextExtractor::new().extract_file(input)?);
    let classification = rationpdf::CategoryClassifier::default().evaluate(&text);

    if json {
        let value = serde_json::json!({
            "file": input,
            "category": classification.category,
            "rule": classification.rule,
            "text": preview(&text, PREVIEW_CHARS),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Classification".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Category".bold(), classification.category);
    println!(
        "{}: {}",
        "Rule".bold(),
        classification.rule.as_deref().unwrap_or("-")
    );
    println!("{}: {} characters", "Text".bold(), text.chars().count());
    if !text.is_empty() {
        println!();
        println!("{}", preview(&text, 200).dimmed());
    }
    Ok(())
}

fn cmd_init(backgrounds: &BackgroundArgs) -> CliResult<()> {
    let resolver = BackgroundResolver::new(backgrounds.config());
    let missing: Vec<Category> = resolver
        .iter()
        .filter(|(_, path)| !path.exists())
        .map(|(category, _)| category)
        .collect();

    resolver.initialize()?;

    for (category, path) in resolver.iter() {
        let status = if missing.contains(&category) {
            "created".green()
        } else {
            "exists".dimmed()
        };
        println!("  {} {:<8} {}", status, category.to_string(), path.display());
    }
    Ok(())
}

fn cmd_batch(
    inputs: &[PathBuf],
    output_dir: &Path,
    backgrounds: &BackgroundArgs,
    json: bool,
) -> CliResult<()> {
    std::fs::create_dir_all(output_dir)?;
    let pipeline = build_pipeline(backgrounds, false)?;
    log::debug!(
        "Processing {} files on {} threads",
        inputs.len(),
        rayon::current_num_threads()
    );

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let outputs = batch_outputs(inputs, output_dir);
    let results: Vec<(PathBuf, rationpdf::Result<PipelineResult>)> = inputs
        .par_iter()
        .zip(outputs.par_iter())
        .map(|(input, output)| {
            let result = pipeline.run(input, output);
            pb.inc(1);
            (input.clone(), result)
        })
        .collect();
    pb.finish_and_clear();

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();

    if json {
        let entries: Vec<serde_json::Value> = results
            .iter()
            .map(|(input, result)| match result {
                Ok(r) => serde_json::json!({ "file": input, "result": r }),
                Err(e) => serde_json::json!({ "file": input, "error": e.to_string() }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for (input, result) in &results {
            match result {
                Ok(r) => println!(
                    "{} {} {} {}",
                    "✓".green(),
                    input.display(),
                    r.category.to_string().cyan(),
                    r.output.display().to_string().dimmed()
                ),
                Err(e) => println!("{} {} {}", "✗".red(), input.display(), e),
            }
        }
        println!(
            "\n{} {} processed, {} failed",
            "Done!".green().bold(),
            results.len() - failed,
            failed
        );
    }

    if failed > 0 {
        return Err(format!("{} of {} files failed", failed, results.len()).into());
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "rationpdf".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Ration card classification and re-composition tool");
    println!("Library: rationpdf {}", rationpdf::version());
    println!();
    println!("License: MIT");
}
