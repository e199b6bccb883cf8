//! retro-chip-renderer: chip package layout and rendering from the command line
//!
//! Renders chip definitions to PNG/SVG, prints pin layouts and package
//! topologies as JSON, checks stored pin positions, and pre-renders whole
//! catalogues of chip definitions.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use retro_chip_renderer::catalog::{self, CatalogOptions};
use retro_chip_renderer::chip::alignment::AlignmentChecker;
use retro_chip_renderer::chip::color::{classify_name, PinClass};
use retro_chip_renderer::chip::layout::{side_counts, Side};
use retro_chip_renderer::chip::package::canvas::preferred_canvas;
use retro_chip_renderer::chip::{resolve, ComponentDescriptor, PositionedPin, Renderer};
use retro_chip_renderer::config::{self, Config};

/// Chip package layout and rendering for retro-computer chip definitions.
///
/// Chip definitions are JSON files with a name, a category and an ordered
/// pin list; the package is given as a token such as DIP-40 or PLCC-84.
#[derive(Parser, Debug)]
#[command(name = "retro-chip-renderer")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a chip definition to PNG
    Render {
        /// Chip definition file
        descriptor: PathBuf,
        /// Package token (defaults to the definition's own)
        #[arg(short, long)]
        package: Option<String>,
        /// Image width in pixels
        #[arg(long)]
        width: Option<u32>,
        /// Image height in pixels
        #[arg(long)]
        height: Option<u32>,
        /// PNG output file
        #[arg(short, long)]
        output: PathBuf,
        /// Also write the SVG source here
        #[arg(long, value_name = "SVG_FILE")]
        svg: Option<PathBuf>,
    },

    /// Print the pin layout of a chip definition as JSON
    Layout {
        /// Chip definition file
        descriptor: PathBuf,
        /// Package token (defaults to the definition's own)
        #[arg(short, long)]
        package: Option<String>,
        /// Canvas width (defaults to the package's preferred canvas)
        #[arg(long)]
        width: Option<f64>,
        /// Canvas height (defaults to the package's preferred canvas)
        #[arg(long)]
        height: Option<f64>,
    },

    /// Print the topology of a package token as JSON
    Resolve {
        /// Package token, e.g. DIP-40 or "Card Edge"
        token: String,
    },

    /// Print the semantic class and colour of pin names
    Classify {
        /// Pin names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Check stored pin positions of a chip definition
    Check {
        /// Chip definition file
        descriptor: PathBuf,
        /// Package token (defaults to the definition's own)
        #[arg(short, long)]
        package: Option<String>,
        /// Canvas width (defaults to the definition's own)
        #[arg(long)]
        width: Option<u32>,
        /// Canvas height (defaults to the definition's own)
        #[arg(long)]
        height: Option<u32>,
        /// Write a corrected chip definition here
        #[arg(long, value_name = "OUT_FILE")]
        fix: Option<PathBuf>,
    },

    /// Render every chip definition in a directory
    Catalog {
        /// Directory of chip definitions
        dir: PathBuf,
        /// Output directory for PNG files
        #[arg(short, long)]
        output: PathBuf,
        /// File name pattern (defaults to catalog.pattern)
        #[arg(long)]
        pattern: Option<String>,
        /// Write a CSV report here
        #[arg(long, value_name = "CSV_FILE")]
        report: Option<PathBuf>,
        /// Concurrent renders (defaults to catalog.jobs)
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Package token overriding every definition's own
        #[arg(short, long)]
        package: Option<String>,
        /// Image width overriding every definition's own
        #[arg(long, requires = "height")]
        width: Option<u32>,
        /// Image height overriding every definition's own
        #[arg(long, requires = "width")]
        height: Option<u32>,
    },
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

type CliResult = Result<ExitCode, Box<dyn Error>>;

/// Entry point for the retro-chip-renderer CLI.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", chain(&e));
            if config_path.is_none() {
                if let Some(default_path) = config::default_config_path() {
                    eprintln!("\nDefault config at: {}", default_path.display());
                    eprintln!("Compare it with config/example-config.json");
                }
            }
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "retro-chip-renderer");

    match run(args.command, &cfg) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", chain(e.as_ref()));
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, cfg: &Config) -> CliResult {
    match command {
        Command::Render {
            descriptor,
            package,
            width,
            height,
            output,
            svg,
        } => render(cfg, &descriptor, package, (width, height), &output, svg.as_deref()),
        Command::Layout {
            descriptor,
            package,
            width,
            height,
        } => layout(cfg, &descriptor, package, width, height),
        Command::Resolve { token } => resolve_token(cfg, &token),
        Command::Classify { names } => classify(cfg, &names),
        Command::Check {
            descriptor,
            package,
            width,
            height,
            fix,
        } => check(cfg, &descriptor, package, (width, height), fix.as_deref()),
        Command::Catalog {
            dir,
            output,
            pattern,
            report,
            jobs,
            package,
            width,
            height,
        } => {
            let options = CatalogOptions {
                input_dir: dir,
                output_dir: output,
                pattern: pattern.unwrap_or_else(|| cfg.catalog.pattern.clone()),
                jobs: jobs.unwrap_or(cfg.catalog.jobs),
                size: width.zip(height),
                package,
            };
            run_catalog(cfg, &options, report.as_deref())
        }
    }
}

/// Picks the package token: the flag, then the definition's own.
fn package_token(descriptor: &ComponentDescriptor, flag: Option<String>) -> String {
    flag.or_else(|| descriptor.package_type.clone())
        .unwrap_or_default()
}

/// Picks the image size per axis: the flag, then the definition, then config.
fn image_size(
    cfg: &Config,
    descriptor: &ComponentDescriptor,
    (width, height): (Option<u32>, Option<u32>),
) -> (u32, u32) {
    (
        width
            .or(descriptor.width)
            .unwrap_or(cfg.render.default_width),
        height
            .or(descriptor.height)
            .unwrap_or(cfg.render.default_height),
    )
}

fn render(
    cfg: &Config,
    path: &Path,
    package: Option<String>,
    size: (Option<u32>, Option<u32>),
    output: &Path,
    svg: Option<&Path>,
) -> CliResult {
    let descriptor = ComponentDescriptor::load(path)?;
    let package = package_token(&descriptor, package);
    let size = image_size(cfg, &descriptor, size);

    let renderer = Renderer::new(cfg);
    let image = renderer.render(&descriptor, &package, size)?;
    image.save_png(output)?;
    if let Some(svg) = svg {
        image.save_svg(svg)?;
    }

    info!(
        chip = %descriptor.name,
        package = %package,
        output = %output.display(),
        fallback = image.fallback,
        "rendered chip"
    );
    if image.fallback {
        eprintln!(
            "warning: '{package}' could not be drawn as requested, wrote a generic image instead"
        );
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct LayoutOutput<'a> {
    package: String,
    topology: retro_chip_renderer::chip::PackageTopology,
    width: f64,
    height: f64,
    grid_size: f64,
    sides: indexmap::IndexMap<Side, usize>,
    pins: &'a [PositionedPin],
}

fn layout(
    cfg: &Config,
    path: &Path,
    package: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
) -> CliResult {
    let descriptor = ComponentDescriptor::load(path)?;
    let token = package_token(&descriptor, package);
    let topology = resolve(&token)?;
    let engine = retro_chip_renderer::chip::LayoutEngine::from(&cfg.layout);

    let (pref_w, pref_h) = preferred_canvas(
        &topology,
        descriptor.pins.len(),
        engine.grid_size,
        engine.margin,
    )?;
    let (width, height) = (width.unwrap_or(pref_w), height.unwrap_or(pref_h));
    let pins = engine.layout(&topology, &descriptor.pins, width, height)?;

    let out = LayoutOutput {
        package: topology.label(),
        topology,
        width,
        height,
        grid_size: engine.grid_size,
        sides: side_counts(&pins),
        pins: &pins,
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct ResolveOutput {
    token: String,
    package: String,
    topology: retro_chip_renderer::chip::PackageTopology,
    preferred_canvas: Option<(f64, f64)>,
}

fn resolve_token(cfg: &Config, token: &str) -> CliResult {
    let topology = resolve(token)?;
    let preferred = topology
        .pin_count
        .map(|n| preferred_canvas(&topology, n, cfg.layout.grid_size, cfg.layout.margin))
        .transpose()?;
    let out = ResolveOutput {
        token: token.to_string(),
        package: topology.label(),
        topology,
        preferred_canvas: preferred,
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(ExitCode::SUCCESS)
}

fn classify(cfg: &Config, names: &[String]) -> CliResult {
    for name in names {
        let class: PinClass = classify_name(name);
        println!(
            "{name}\t{class}\t{}",
            cfg.palette.color_for(class).to_hex()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn check(
    cfg: &Config,
    path: &Path,
    package: Option<String>,
    size: (Option<u32>, Option<u32>),
    fix: Option<&Path>,
) -> CliResult {
    let descriptor = ComponentDescriptor::load(path)?;
    let token = package_token(&descriptor, package);
    let topology = resolve(&token)?;
    let (width, height) = image_size(cfg, &descriptor, size);
    let (width, height) = (f64::from(width), f64::from(height));

    let checker = AlignmentChecker::new((&cfg.layout).into());
    let report = checker.analyze(&descriptor, &topology, width, height);
    println!("{}", serde_json::to_string_pretty(&report)?);

    let Some(out) = fix else {
        return Ok(if report.is_clean() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    };

    let correction = checker.correct(&descriptor, &topology, width, height)?;
    std::fs::write(out, correction.descriptor.to_json_pretty()?)?;
    eprintln!(
        "moved {} pins, added {}, wrote {}",
        correction.moves.len(),
        correction.added,
        out.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_catalog(cfg: &Config, options: &CatalogOptions, report: Option<&Path>) -> CliResult {
    let renderer = Arc::new(Renderer::new(cfg));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let entries = runtime.block_on(catalog::render_catalog(renderer, options))?;

    if let Some(report) = report {
        catalog::write_report(report, &entries)?;
    }

    let rendered = entries.iter().filter(|e| e.is_rendered()).count();
    let fallbacks = entries.iter().filter(|e| e.fallback).count();
    eprintln!(
        "rendered {rendered} of {} chips ({fallbacks} generic)",
        entries.len()
    );
    for entry in entries.iter().filter(|e| !e.is_rendered()) {
        eprintln!(
            "  {}: {}",
            entry.source,
            entry.error.as_deref().unwrap_or("not rendered")
        );
    }

    Ok(if rendered == entries.len() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Formats an error with its chain of causes.
fn chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut cause = error.source();
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn log_level_precedence() {
        assert_eq!(get_log_level(0, true, "trace"), Level::ERROR);
        assert_eq!(get_log_level(2, false, "warn"), Level::DEBUG);
        assert_eq!(get_log_level(0, false, "INFO"), Level::INFO);
        assert_eq!(get_log_level(0, false, "loud"), Level::WARN);
    }

    use retro_chip_renderer::chip::descriptor::Category;

    #[test]
    fn size_flags_override_per_axis() {
        let cfg = Config::default();
        let mut d = ComponentDescriptor::new("ULA", Category::Video);
        d.height = Some(300);
        assert_eq!(image_size(&cfg, &d, (None, None)), (400, 300));
        assert_eq!(image_size(&cfg, &d, (Some(240), None)), (240, 300));
        assert_eq!(image_size(&cfg, &d, (Some(240), Some(260))), (240, 260));
    }

    #[test]
    fn parses_catalog_command() {
        let args = Args::try_parse_from([
            "retro-chip-renderer",
            "catalog",
            "chips",
            "-o",
            "out",
            "--jobs",
            "2",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.verbose, 1);
        let Command::Catalog { dir, jobs, .. } = args.command else {
            panic!("expected catalog");
        };
        assert_eq!(dir, PathBuf::from("chips"));
        assert_eq!(jobs, Some(2));
    }
}
