//! Catalogue batch rendering.
//!
//! Renders every chip definition in a directory to PNG. Files are discovered
//! with a glob pattern, read and written with Tokio's async file API, and
//! rendered on the blocking pool through one shared [`Renderer`], so its
//! cache is shared by the whole run. A semaphore bounds how many renders run
//! at once.
//!
//! A bad chip definition never aborts the run: it is recorded in the
//! catalogue report with its error and the remaining files are rendered.

use std::collections::HashSet;
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::chip::descriptor::ComponentDescriptor;
use crate::chip::renderer::Renderer;
use crate::error::CatalogError;

/// What to render and where.
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// Directory searched for chip definitions.
    pub input_dir: PathBuf,
    /// Directory receiving `<id>.png` files.
    pub output_dir: PathBuf,
    /// File name pattern, relative to `input_dir`.
    pub pattern: String,
    /// Renders in flight at once.
    pub jobs: usize,
    /// Image size overriding each definition's own.
    pub size: Option<(u32, u32)>,
    /// Package token overriding each definition's own.
    pub package: Option<String>,
}

/// One row of the catalogue report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Chip definition file.
    pub source: String,
    /// PNG written, if any.
    pub output: Option<String>,
    /// Chip name, if the definition could be read.
    pub name: Option<String>,
    /// Package token rendered.
    pub package: Option<String>,
    /// Pins drawn.
    pub pins: usize,
    /// Whether the fallback image was used.
    pub fallback: bool,
    /// Why the chip could not be rendered.
    pub error: Option<String>,
}

impl CatalogEntry {
    fn failed(source: &Path, error: String) -> Self {
        Self {
            source: source.display().to_string(),
            output: None,
            name: None,
            package: None,
            pins: 0,
            fallback: false,
            error: Some(error),
        }
    }

    /// Returns `true` if a PNG was written.
    #[must_use]
    pub const fn is_rendered(&self) -> bool {
        self.output.is_some()
    }
}

/// Finds the chip definitions matching `pattern` inside `dir`, sorted.
///
/// # Errors
///
/// Returns [`CatalogError::Pattern`] if the pattern is not a valid glob.
pub fn discover(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, CatalogError> {
    let full = format!(
        "{}/{pattern}",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let paths = glob::glob(&full).map_err(|source| CatalogError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut found: Vec<PathBuf> = paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "skipping unreadable catalogue entry");
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    found.sort();
    Ok(found)
}

/// Renders every matching chip definition to PNG.
///
/// Entries come back in discovery order whatever order the renders finish
/// in. Definitions sharing an id are written to distinct files: the first
/// in discovery order gets `<id>.png`, later ones `<id>_2.png`, `<id>_3.png`
/// and so on.
///
/// # Errors
///
/// Returns an error if the pattern is invalid or the output directory cannot
/// be created. Per-chip failures are reported in the entries instead.
pub async fn render_catalog(
    renderer: Arc<Renderer>,
    options: &CatalogOptions,
) -> Result<Vec<CatalogEntry>, CatalogError> {
    let sources = discover(&options.input_dir, &options.pattern)?;
    tokio::fs::create_dir_all(&options.output_dir)
        .await
        .map_err(|source| CatalogError::OutputDir {
            path: options.output_dir.clone(),
            source,
        })?;

    info!(
        chips = sources.len(),
        jobs = options.jobs,
        input = %options.input_dir.display(),
        "rendering catalogue"
    );

    let mut loaded = Vec::with_capacity(sources.len());
    for source in sources {
        let descriptor = load(&source).await;
        loaded.push((source, descriptor));
    }
    let mut stems = OutputStems::default();

    let permits = Arc::new(Semaphore::new(options.jobs.max(1)));
    let mut tasks = JoinSet::new();
    let mut entries = Vec::with_capacity(loaded.len());
    for (index, (source, descriptor)) in loaded.into_iter().enumerate() {
        let descriptor = match descriptor {
            Ok(d) => d,
            Err(message) => {
                entries.push((index, CatalogEntry::failed(&source, message)));
                continue;
            }
        };
        let stem = stems.claim(&descriptor.id);
        if stem != descriptor.id {
            warn!(
                source = %source.display(),
                id = %descriptor.id,
                output = %stem,
                "duplicate chip id, writing under a suffixed name"
            );
        }

        let permits = Arc::clone(&permits);
        let renderer = Arc::clone(&renderer);
        let job = Job {
            source,
            descriptor,
            output: options.output_dir.join(format!("{stem}.png")),
            size: options.size,
            package: options.package.clone(),
        };
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            (index, job.run(renderer).await)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(done) => entries.push(done),
            Err(e) => error!(error = %e, "catalogue task failed"),
        }
    }
    entries.sort_by_key(|(index, _)| *index);
    let entries: Vec<CatalogEntry> = entries.into_iter().map(|(_, entry)| entry).collect();

    let rendered = entries.iter().filter(|e| e.is_rendered()).count();
    info!(
        rendered,
        failed = entries.len() - rendered,
        "catalogue finished"
    );
    Ok(entries)
}

async fn load(source: &Path) -> Result<ComponentDescriptor, String> {
    let text = tokio::fs::read_to_string(source)
        .await
        .map_err(|e| e.to_string())?;
    ComponentDescriptor::from_json(&text).map_err(|e| describe(&e))
}

/// Output file stems already handed out in this run.
#[derive(Debug, Default)]
struct OutputStems {
    taken: HashSet<String>,
}

impl OutputStems {
    fn claim(&mut self, id: &str) -> String {
        let mut stem = id.to_string();
        let mut n = 1;
        while !self.taken.insert(stem.clone()) {
            n += 1;
            stem = format!("{id}_{n}");
        }
        stem
    }
}

/// Writes the catalogue report as CSV.
///
/// # Errors
///
/// Returns [`CatalogError::Report`] if the file cannot be written.
pub fn write_report(path: &Path, entries: &[CatalogEntry]) -> Result<(), CatalogError> {
    let report_error = |source| CatalogError::Report {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(report_error)?;
    for entry in entries {
        writer.serialize(entry).map_err(report_error)?;
    }
    writer
        .flush()
        .map_err(|e| report_error(csv::Error::from(e)))
}

struct Job {
    source: PathBuf,
    descriptor: ComponentDescriptor,
    output: PathBuf,
    size: Option<(u32, u32)>,
    package: Option<String>,
}

impl Job {
    async fn run(self, renderer: Arc<Renderer>) -> CatalogEntry {
        let Self {
            source,
            descriptor,
            output,
            size,
            package,
        } = self;
        let package = package
            .or_else(|| descriptor.package_type.clone())
            .unwrap_or_default();
        let size = renderer.target_size(&descriptor, size);

        let render = {
            let descriptor = descriptor.clone();
            let package = package.clone();
            tokio::task::spawn_blocking(move || {
                let image = renderer.render(&descriptor, &package, size)?;
                let png = image.to_png()?;
                Ok::<_, crate::chip::RenderError>((image, png))
            })
        };

        let mut entry = CatalogEntry {
            source: source.display().to_string(),
            output: None,
            name: Some(descriptor.name.clone()),
            package: Some(package),
            pins: 0,
            fallback: false,
            error: None,
        };
        let (image, png) = match render.await {
            Ok(Ok(done)) => done,
            Ok(Err(e)) => {
                entry.error = Some(describe(&e));
                return entry;
            }
            Err(e) => {
                entry.error = Some(format!("render task failed: {e}"));
                return entry;
            }
        };

        if let Err(e) = tokio::fs::write(&output, png).await {
            entry.error = Some(format!("failed to write {}: {e}", output.display()));
            return entry;
        }

        info!(
            chip = %descriptor.name,
            output = %output.display(),
            fallback = image.fallback,
            "rendered chip"
        );
        entry.output = Some(output.display().to_string());
        entry.pins = image.pins.len();
        entry.fallback = image.fallback;
        entry
    }
}

/// Formats an error with its chain of causes.
fn describe(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut cause = error.source();
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}
