//! Pin alignment checking and correction.
//!
//! Older chip definitions carry hand-placed pin coordinates. The checker
//! compares them with what the layout engine would produce: every pin present,
//! on the grid, inside the canvas, and not on top of another pin. The
//! corrector replaces stored positions with a fresh layout.

use bitflags::bitflags;
use serde::Serialize;
use tracing::debug;

use crate::chip::descriptor::{ComponentDescriptor, PinSpec};
use crate::chip::error::RenderResult;
use crate::chip::geometry::{is_multiple_of, Point, Rect};
use crate::chip::layout::LayoutEngine;
use crate::chip::package::PackageTopology;

/// Name given to pins added to reach the declared package count.
pub const PADDING_PIN_NAME: &str = "NC";

bitflags! {
    /// Problems found in stored pin positions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    #[serde(transparent)]
    pub struct AlignmentIssues: u8 {
        /// The package declares a different number of pins.
        const COUNT_MISMATCH = 1;
        /// Some pins have no stored position.
        const MISSING_POSITIONS = 1 << 1;
        /// Some positions are not grid multiples.
        const OFF_GRID = 1 << 2;
        /// Some positions lie outside the canvas.
        const OUT_OF_BOUNDS = 1 << 3;
        /// Two pins are less than one grid unit apart on both axes.
        const OVERLAPPING = 1 << 4;
    }
}

/// Result of checking one chip definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentReport {
    /// Problems found.
    pub issues: AlignmentIssues,
    /// Human-readable detail, one line per problem.
    pub notes: Vec<String>,
    /// Pin count declared by the package token.
    pub declared_pins: Option<usize>,
    /// Pins in the chip definition.
    pub pin_count: usize,
}

impl AlignmentReport {
    /// Returns `true` when no problem was found.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Names of the problems found, in flag order.
    #[must_use]
    pub fn issue_names(&self) -> Vec<&'static str> {
        self.issues.iter_names().map(|(name, _)| name).collect()
    }
}

/// A pin whose stored position changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PinMove {
    /// Declared pin number.
    pub number: u32,
    /// Pin name.
    pub name: String,
    /// Stored position before correction.
    pub from: Option<Point>,
    /// Position after correction.
    pub to: Point,
}

/// A corrected chip definition.
#[derive(Debug, Clone)]
pub struct Correction {
    /// The definition with every pin positioned by the layout engine.
    pub descriptor: ComponentDescriptor,
    /// Pins that moved (or gained a position).
    pub moves: Vec<PinMove>,
    /// Pins appended to reach the declared package count.
    pub added: usize,
}

/// Checks and corrects stored pin positions against a layout engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlignmentChecker {
    engine: LayoutEngine,
}

impl AlignmentChecker {
    /// Creates a checker using `engine`'s grid.
    #[must_use]
    pub const fn new(engine: LayoutEngine) -> Self {
        Self { engine }
    }

    /// Checks the stored pin positions of `descriptor`.
    #[must_use]
    pub fn analyze(
        &self,
        descriptor: &ComponentDescriptor,
        topology: &PackageTopology,
        width: f64,
        height: f64,
    ) -> AlignmentReport {
        let grid = self.engine.grid_size;
        let pins = &descriptor.pins;
        let mut issues = AlignmentIssues::empty();
        let mut notes = Vec::new();

        if let Some(declared) = topology.pin_count {
            if declared != pins.len() {
                issues |= AlignmentIssues::COUNT_MISMATCH;
                notes.push(format!(
                    "package declares {declared} pins, definition has {}",
                    pins.len()
                ));
            }
        }

        let placed: Vec<(&PinSpec, Point)> = pins
            .iter()
            .filter_map(|p| p.position.map(|pos| (p, pos)))
            .collect();
        let missing = pins.len() - placed.len();
        if missing > 0 {
            issues |= AlignmentIssues::MISSING_POSITIONS;
            notes.push(format!("{missing} pins have no stored position"));
        }

        let off_grid: Vec<u32> = placed
            .iter()
            .filter(|(_, pos)| !is_multiple_of(pos.x, grid) || !is_multiple_of(pos.y, grid))
            .map(|(pin, _)| pin.number)
            .collect();
        if !off_grid.is_empty() {
            issues |= AlignmentIssues::OFF_GRID;
            notes.push(format!(
                "pins off the {grid} grid: {}",
                join_numbers(&off_grid)
            ));
        }

        let canvas = Rect::canvas(width, height);
        let outside: Vec<u32> = placed
            .iter()
            .filter(|(_, pos)| !canvas.contains(*pos, 1e-9))
            .map(|(pin, _)| pin.number)
            .collect();
        if !outside.is_empty() {
            issues |= AlignmentIssues::OUT_OF_BOUNDS;
            notes.push(format!(
                "pins outside the {width}x{height} canvas: {}",
                join_numbers(&outside)
            ));
        }

        let too_close = grid - 1e-9;
        let mut overlaps = Vec::new();
        for (i, (a, pa)) in placed.iter().enumerate() {
            for (b, pb) in &placed[i + 1..] {
                if (pa.x - pb.x).abs() < too_close && (pa.y - pb.y).abs() < too_close {
                    overlaps.push(format!("{}/{}", a.number, b.number));
                }
            }
        }
        if !overlaps.is_empty() {
            issues |= AlignmentIssues::OVERLAPPING;
            notes.push(format!("overlapping pins: {}", overlaps.join(", ")));
        }

        debug!(chip = %descriptor.name, issues = ?issues, "checked pin alignment");

        AlignmentReport {
            issues,
            notes,
            declared_pins: topology.pin_count,
            pin_count: pins.len(),
        }
    }

    /// Repositions every pin of `descriptor` with the layout engine.
    ///
    /// When the package declares more pins than the definition has, `NC`
    /// pins are appended first. Surplus pins are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the pins cannot be laid out on the canvas.
    pub fn correct(
        &self,
        descriptor: &ComponentDescriptor,
        topology: &PackageTopology,
        width: f64,
        height: f64,
    ) -> RenderResult<Correction> {
        let mut fixed = descriptor.clone();
        let mut added = 0;
        if let Some(declared) = topology.pin_count {
            let mut number = fixed.pins.iter().map(|p| p.number).max().unwrap_or(0);
            while fixed.pins.len() < declared {
                number += 1;
                fixed.pins.push(PinSpec::new(number, PADDING_PIN_NAME));
                added += 1;
            }
        }

        let placed = self.engine.layout(topology, &fixed.pins, width, height)?;
        let mut moves = Vec::new();
        for (pin, target) in fixed.pins.iter_mut().zip(&placed) {
            let to = target.point();
            let moved = pin.position.is_none_or(|from| from.distance_to(to) > 1e-9);
            if moved {
                moves.push(PinMove {
                    number: pin.number,
                    name: pin.name.clone(),
                    from: pin.position,
                    to,
                });
            }
            pin.position = Some(to);
        }

        debug!(
            chip = %descriptor.name,
            moved = moves.len(),
            added,
            "corrected pin positions"
        );

        Ok(Correction {
            descriptor: fixed,
            moves,
            added,
        })
    }
}

fn join_numbers(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
