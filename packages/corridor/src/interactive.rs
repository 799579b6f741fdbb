//! Terminal capture of a corridor line.
//!
//! Prompts the operator for `lon,lat` vertex pairs using `dialoguer`. The
//! prompt shows where the context markers (usually bank locations) lie so
//! the operator can place the corridor relative to them.

use dialoguer::Input;
use geo::{BoundingRect as _, Coord, MultiPoint, Point};

use crate::{CorridorError, CorridorLine, LineSource};

/// Collects a corridor line from the terminal.
pub struct InteractiveSource {
    markers: Vec<Point<f64>>,
}

impl InteractiveSource {
    /// Creates a source with context markers to summarize before drawing.
    #[must_use]
    pub const fn new(markers: Vec<Point<f64>>) -> Self {
        Self { markers }
    }

    fn describe_markers(&self) {
        let points = MultiPoint(self.markers.clone());
        let Some(rect) = points.bounding_rect() else {
            println!("No context markers available.");
            return;
        };

        println!(
            "{} markers between lon {:.5}..{:.5}, lat {:.5}..{:.5}",
            self.markers.len(),
            rect.min().x,
            rect.max().x,
            rect.min().y,
            rect.max().y,
        );
    }
}

impl LineSource for InteractiveSource {
    fn name(&self) -> &str {
        "interactive capture"
    }

    fn load(&self) -> Result<CorridorLine, CorridorError> {
        self.describe_markers();
        println!("Enter corridor vertices as `lon,lat`, one per line. Empty line finishes.");

        let mut vertices: Vec<Coord<f64>> = Vec::new();

        loop {
            let captured = vertices.len();
            let raw: String = Input::new()
                .with_prompt(format!("Vertex {}", captured + 1))
                .allow_empty(true)
                .validate_with(|s: &String| validate_entry(s, captured))
                .interact_text()?;

            // Only a valid vertex or a permitted finish gets past the prompt.
            let Ok(Some(coord)) = parse_vertex(&raw) else {
                break;
            };
            vertices.push(coord);
        }

        let line = CorridorLine::new(vertices)?;
        log::info!("Captured {}-vertex corridor", line.vertex_count());
        Ok(line)
    }
}

/// Checks an entry given `captured` vertices so far.
///
/// An empty entry is accepted only once the line has two vertices.
///
/// # Errors
///
/// Returns the message to show the operator before re-prompting.
pub fn validate_entry(raw: &str, captured: usize) -> Result<(), String> {
    match parse_vertex(raw)? {
        None if captured < 2 => Err("A corridor needs at least 2 vertices.".to_string()),
        _ => Ok(()),
    }
}

/// Parses one `lon,lat` entry.
///
/// Returns `Ok(None)` for an empty entry, which ends capture.
///
/// # Errors
///
/// Returns a message describing why the entry is not a valid vertex.
pub fn parse_vertex(raw: &str) -> Result<Option<Coord<f64>>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let mut parts = raw.split(',').map(str::trim);
    let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("Expected `lon,lat`, got '{raw}'"));
    };

    let x: f64 = lon
        .parse()
        .map_err(|_| format!("Invalid longitude '{lon}'"))?;
    let y: f64 = lat
        .parse()
        .map_err(|_| format!("Invalid latitude '{lat}'"))?;

    if !x.is_finite() || x.abs() > 180.0 {
        return Err(format!("Longitude {x} is outside [-180, 180]"));
    }
    if !y.is_finite() || y.abs() > 90.0 {
        return Err(format!("Latitude {y} is outside [-90, 90]"));
    }

    Ok(Some(Coord { x, y }))
}
