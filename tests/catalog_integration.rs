//! Catalogue runs over a directory of chip definitions.

use std::path::Path;
use std::sync::Arc;

use retro_chip_renderer::catalog::{discover, render_catalog, write_report, CatalogOptions};
use retro_chip_renderer::chip::Renderer;
use retro_chip_renderer::config::Config;
use retro_chip_renderer::error::CatalogError;

fn renderer() -> Arc<Renderer> {
    let mut config = Config::default();
    config.render.load_system_fonts = false;
    Arc::new(Renderer::new(&config))
}

fn write(dir: &Path, file: &str, contents: &str) {
    std::fs::write(dir.join(file), contents).expect("writes definition");
}

fn populate(dir: &Path) {
    write(
        dir,
        "a_sid.json",
        r#"{"name": "SID 6581", "category": "Audio", "package_type": "DIP-28",
            "pins": ["CAP1A","CAP1B","CAP2A","CAP2B","RES","PHI2","R/W","CS",
                     "A0","A1","A2","A3","A4","GND","D0","D1","D2","D3","D4","D5",
                     "D6","D7","POTY","POTX","VCC","EXTIN","AUDIO","VDD"]}"#,
    );
    write(dir, "b_broken.json", r#"{"name": "Broken", "pins": ["#);
    write(
        dir,
        "c_mystery.json",
        r#"{"name": "Mystery Chip", "package_type": "XYZ-99", "pins": ["IN", "OUT", "VCC", "GND"]}"#,
    );
    write(dir, "notes.txt", "not a chip");
}

fn options(input: &Path, output: &Path) -> CatalogOptions {
    CatalogOptions {
        input_dir: input.to_path_buf(),
        output_dir: output.to_path_buf(),
        pattern: "*.json".to_string(),
        jobs: 2,
        size: Some((200, 300)),
        package: None,
    }
}

// =============================================================================
// Rendering Runs
// =============================================================================

#[tokio::test]
async fn test_catalog_renders_and_reports_in_order() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    populate(input.path());

    let out_dir = output.path().join("png");
    let entries = render_catalog(renderer(), &options(input.path(), &out_dir))
        .await
        .expect("catalogue runs");

    assert_eq!(entries.len(), 3);
    assert!(entries[0].source.ends_with("a_sid.json"));
    assert!(entries[1].source.ends_with("b_broken.json"));
    assert!(entries[2].source.ends_with("c_mystery.json"));

    let sid = &entries[0];
    assert!(sid.is_rendered());
    assert_eq!(sid.name.as_deref(), Some("SID 6581"));
    assert_eq!(sid.package.as_deref(), Some("DIP-28"));
    assert_eq!(sid.pins, 28);
    assert!(!sid.fallback);
    assert!(sid.error.is_none());

    let broken = &entries[1];
    assert!(!broken.is_rendered());
    assert!(broken.error.is_some());

    let mystery = &entries[2];
    assert!(mystery.is_rendered());
    assert!(mystery.fallback);
    assert_eq!(mystery.pins, 4);

    let png = image::open(out_dir.join("sid_6581.png")).expect("SID png written");
    assert_eq!((png.width(), png.height()), (200, 300));
    assert!(out_dir.join("mystery_chip.png").is_file());
}

#[tokio::test]
async fn test_catalog_package_override() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    write(
        input.path(),
        "pla.json",
        r#"{"name": "PLA", "package_type": "DIP-28", "pins": ["I0", "I1", "I2", "I3"]}"#,
    );

    let mut opts = options(input.path(), output.path());
    opts.package = Some("SIP-4".to_string());
    let entries = render_catalog(renderer(), &opts).await.expect("runs");

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].package.as_deref(), Some("SIP-4"));
    assert!(!entries[0].fallback);
}

#[tokio::test]
async fn test_catalog_same_name_writes_separate_files() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    let forty: Vec<String> = (1..=40).map(|i| format!("\"P{i}\"")).collect();
    let twenty_eight: Vec<String> = (1..=28).map(|i| format!("\"Q{i}\"")).collect();
    write(
        input.path(),
        "a_ula.json",
        &format!(r#"{{"name": "ULA", "package_type": "DIP-40", "pins": [{}]}}"#, forty.join(",")),
    );
    write(
        input.path(),
        "b_ula.json",
        &format!(
            r#"{{"name": "ULA", "package_type": "DIP-28", "pins": [{}]}}"#,
            twenty_eight.join(",")
        ),
    );

    let entries = render_catalog(renderer(), &options(input.path(), output.path()))
        .await
        .expect("runs");

    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.is_rendered()));
    assert_eq!(entries[0].pins, 40);
    assert_eq!(entries[1].pins, 28);

    let first = entries[0].output.as_deref().expect("first output");
    let second = entries[1].output.as_deref().expect("second output");
    assert_ne!(first, second);
    assert!(first.ends_with("ula.png"));
    assert!(second.ends_with("ula_2.png"));
    assert!(output.path().join("ula.png").is_file());
    assert!(output.path().join("ula_2.png").is_file());
}

#[tokio::test]
async fn test_catalog_of_empty_directory() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    let entries = render_catalog(renderer(), &options(input.path(), output.path()))
        .await
        .expect("runs");
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_catalog_rejects_bad_pattern() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    let mut opts = options(input.path(), output.path());
    opts.pattern = "[*.json".to_string();
    assert!(matches!(
        render_catalog(renderer(), &opts).await,
        Err(CatalogError::Pattern { .. })
    ));
}

// =============================================================================
// Discovery and Report
// =============================================================================

#[test]
fn test_discover_matches_only_definitions() {
    let input = tempfile::tempdir().expect("input dir");
    populate(input.path());
    let found = discover(input.path(), "*.json").expect("discovers");
    assert_eq!(found.len(), 3);
}

#[tokio::test]
async fn test_report_lists_every_entry() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    populate(input.path());

    let entries = render_catalog(renderer(), &options(input.path(), output.path()))
        .await
        .expect("runs");
    let report = output.path().join("report.csv");
    write_report(&report, &entries).expect("report written");

    let mut reader = csv::Reader::from_path(&report).expect("report opens");
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(&headers[0], "source");
    assert_eq!(&headers[6], "error");

    let rows: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .expect("rows parse");
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][4], "28");
    assert_eq!(&rows[2][5], "true");
    assert!(!rows[1][6].is_empty());
}
