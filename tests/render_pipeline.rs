//! End-to-end rendering through the public facade.
//!
//! Covers the primary path, fallback degradation, image encoding and file
//! output, the alignment checker and configuration loading.

use std::sync::Arc;

use retro_chip_renderer::chip::alignment::{AlignmentChecker, AlignmentIssues};
use retro_chip_renderer::chip::descriptor::Category;
use retro_chip_renderer::chip::rendered::LabelRole;
use retro_chip_renderer::chip::{
    resolve, ComponentDescriptor, LayoutEngine, RenderError, Renderer, Side, TopologyKind,
};
use retro_chip_renderer::config::{load_config, Config};
use retro_chip_renderer::error::ConfigError;

fn config() -> Config {
    let mut config = Config::default();
    config.render.load_system_fonts = false;
    config
}

fn z80() -> ComponentDescriptor {
    ComponentDescriptor::from_json(
        r#"{
            "name": "Z80 CPU",
            "category": "Processor",
            "package_type": "DIP-40",
            "year": 1976,
            "speed": "4MHz",
            "manufacturer": "Zilog",
            "pins": [
                "A11", "A12", "A13", "A14", "A15", "CLK", "D4", "D3", "D5", "D6",
                "VCC", "D2", "D7", "D0", "D1", "INT", "NMI", "HALT", "MREQ", "IORQ",
                "RD", "WR", "BUSACK", "WAIT", "BUSREQ", "RESET", "M1", "RFSH", "GND", "A0",
                "A1", "A2", "A3", "A4", "A5", "A6", "A7", "A8", "A9", "A10"
            ]
        }"#,
    )
    .expect("Z80 definition parses")
}

fn numbered(name: &str, pins: u32) -> ComponentDescriptor {
    ComponentDescriptor::new(name, Category::Custom)
        .with_pin_names((1..=pins).map(|i| format!("P{i}")))
}

// =============================================================================
// Primary Path
// =============================================================================

#[test]
fn test_render_z80_dip40() {
    let renderer = Renderer::new(&config());
    let image = renderer
        .render(&z80(), "DIP-40", (240, 260))
        .expect("Z80 renders");

    assert!(!image.fallback);
    assert_eq!(image.package_type, "DIP-40");
    assert_eq!(image.pixels.dimensions(), (240, 260));
    assert_eq!(image.pins.len(), 40);
    assert_eq!(
        image.topology.map(|t| t.kind),
        Some(TopologyKind::DualInLine)
    );
    assert!(image.marker.is_some(), "pin-1 marker drawn");

    let name = image.label(LabelRole::Name).expect("name label");
    assert_eq!(name.text, "Z80 CPU");
    assert!(image.label(LabelRole::Package).is_some());
    assert!(image.label(LabelRole::Speed).is_some());

    assert!(image.svg.starts_with("<svg"));
}

#[test]
fn test_render_default_uses_definition_package() {
    let renderer = Renderer::new(&config());
    let image = renderer.render_default(&z80()).expect("renders");
    assert!(!image.fallback);
    assert_eq!(image.package_type, "DIP-40");
    assert_eq!(image.pixels.dimensions(), (400, 400));
}

#[test]
fn test_render_every_family() {
    let renderer = Renderer::new(&config());
    for (token, pins) in [
        ("QFP-64", 64),
        ("PLCC-84", 84),
        ("BGA-49", 49),
        ("SIP-9", 9),
        ("Card Edge", 44),
        ("Module", 12),
        ("HC-49U", 2),
        ("SOIC-16", 16),
    ] {
        let image = renderer
            .render(&numbered(token, pins), token, (480, 480))
            .unwrap_or_else(|e| panic!("{token}: {e}"));
        assert!(!image.fallback, "{token} used the fallback");
        assert_eq!(image.pins.len() as u32, pins, "{token}");
    }
}

// =============================================================================
// Fallback
// =============================================================================

#[test]
fn test_unknown_package_falls_back_with_every_pin() {
    let renderer = Renderer::new(&config());
    let image = renderer
        .render(&numbered("Mystery", 12), "XYZ-99", (400, 400))
        .expect("fallback renders");

    assert!(image.fallback);
    assert_eq!(image.package_type, "XYZ-99");
    assert!(image.topology.is_none());
    assert_eq!(image.pins.len(), 12);
    assert!(image.pins.iter().all(|p| p.side == Side::Left));
}

#[test]
fn test_overfull_canvas_falls_back() {
    let renderer = Renderer::new(&config());
    let image = renderer
        .render(&numbered("Crowded", 64), "DIP-64", (100, 100))
        .expect("fallback renders");
    assert!(image.fallback);
    assert_eq!(image.pins.len(), 64);
    assert!(image.pins.windows(2).all(|w| w[0].y < w[1].y));
}

#[test]
fn test_primary_error_is_visible_without_fallback() {
    let renderer = Renderer::new(&config());
    let err = renderer
        .render_primary(&numbered("Mystery", 4), "XYZ-99", (200, 200))
        .expect_err("unknown package");
    assert!(matches!(err, RenderError::UnknownPackageKind { .. }));
}

#[test]
fn test_zero_surface_reports_both_failures() {
    let renderer = Renderer::new(&config());
    let err = renderer
        .render(&numbered("Nothing", 0), "DIP-4", (0, 0))
        .expect_err("no surface");
    assert!(matches!(err, RenderError::FallbackFailed { .. }));
}

// =============================================================================
// Caching
// =============================================================================

#[test]
fn test_cache_shared_across_threads() {
    let renderer = Arc::new(Renderer::new(&config()));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let renderer = Arc::clone(&renderer);
            std::thread::spawn(move || {
                renderer
                    .render(&z80(), "DIP-40", (240, 260))
                    .expect("renders")
            })
        })
        .collect();
    let images: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();

    assert!(images.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(renderer.cached(), 1);

    renderer
        .render(&z80(), " DIP-40 ", (240, 260))
        .expect("renders");
    assert_eq!(renderer.cached(), 1, "package token is trimmed for the key");

    renderer
        .render(&z80(), "DIP-40", (300, 300))
        .expect("renders");
    assert_eq!(renderer.cached(), 2);
}

// =============================================================================
// Output
// =============================================================================

#[test]
fn test_png_decodes_to_requested_size() {
    let renderer = Renderer::new(&config());
    let image = renderer
        .render(&z80(), "DIP-40", (240, 260))
        .expect("renders");
    let png = image.to_png().expect("encodes");
    assert_eq!(&png[1..4], b"PNG");

    let decoded = image::load_from_memory(&png).expect("decodes");
    assert_eq!((decoded.width(), decoded.height()), (240, 260));
}

#[test]
fn test_save_png_and_svg() {
    let dir = tempfile::tempdir().expect("tempdir");
    let renderer = Renderer::new(&config());
    let image = renderer
        .render(&z80(), "DIP-40", (240, 260))
        .expect("renders");

    let png_path = dir.path().join("z80.png");
    let svg_path = dir.path().join("z80.svg");
    image.save_png(&png_path).expect("saves png");
    image.save_svg(&svg_path).expect("saves svg");

    let decoded = image::open(&png_path).expect("opens png");
    assert_eq!((decoded.width(), decoded.height()), (240, 260));
    let svg = std::fs::read_to_string(&svg_path).expect("reads svg");
    assert!(svg.contains("Z80 CPU"));
}

#[test]
fn test_save_png_into_missing_directory_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let renderer = Renderer::new(&config());
    let image = renderer
        .render(&z80(), "DIP-40", (240, 260))
        .expect("renders");
    let path = dir.path().join("missing").join("z80.png");
    assert!(image.save_png(&path).is_err());
}

// =============================================================================
// Alignment
// =============================================================================

#[test]
fn test_alignment_check_and_correct() {
    let mut descriptor = numbered("Misplaced", 8);
    for (i, pin) in descriptor.pins.iter_mut().enumerate() {
        pin.position = Some(retro_chip_renderer::chip::geometry::Point::new(
            3.0,
            7.0 + i as f64,
        ));
    }
    let topology = resolve("DIP-8").expect("DIP-8");
    let checker = AlignmentChecker::new(LayoutEngine::default());

    let report = checker.analyze(&descriptor, &topology, 80.0, 100.0);
    assert!(report.issues.contains(AlignmentIssues::OFF_GRID));
    assert!(report.issues.contains(AlignmentIssues::OVERLAPPING));
    assert!(!report.issues.contains(AlignmentIssues::COUNT_MISMATCH));

    let correction = checker
        .correct(&descriptor, &topology, 80.0, 100.0)
        .expect("corrects");
    assert_eq!(correction.moves.len(), 8);
    assert_eq!(correction.added, 0);

    let recheck = checker.analyze(&correction.descriptor, &topology, 80.0, 100.0);
    assert!(recheck.is_clean(), "{:?}", recheck.notes);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_file_drives_renderer() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "render": {"default_width": 320, "default_height": 200, "load_system_fonts": false, "cache": false}
        }"#,
    )
    .expect("writes config");

    let config = load_config(Some(&path)).expect("loads");
    let renderer = Renderer::new(&config);
    let descriptor = numbered("Sized", 4);
    assert_eq!(renderer.target_size(&descriptor, None), (320, 200));

    let a = renderer.render(&descriptor, "DIP-4", (320, 200)).expect("renders");
    let b = renderer.render(&descriptor, "DIP-4", (320, 200)).expect("renders");
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(renderer.cached(), 0);
}

#[test]
fn test_example_config_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("config")
        .join("example-config.json");
    let config = load_config(Some(&path)).expect("example config loads");
    assert!((config.layout.grid_size - 10.0).abs() < f64::EPSILON);
    assert_eq!(config.catalog.pattern, "*.json");
    assert_eq!(config.palette.power.to_hex(), "#ff6464");
}

#[test]
fn test_config_rejects_bad_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");

    std::fs::write(&path, r#"{"layout": {"grid_size": 0}}"#).expect("writes config");
    assert!(matches!(
        load_config(Some(&path)),
        Err(ConfigError::ValidationError { .. })
    ));

    std::fs::write(&path, r#"{"layout": {"grid": 10}}"#).expect("writes config");
    assert!(matches!(
        load_config(Some(&path)),
        Err(ConfigError::ParseError { .. })
    ));
}
