//! Multi-point pattern layout.
//!
//! Expands one text box into several pixel anchors (top-left corner of the
//! box) across the canvas. Pure geometry: nothing here touches pixels.
//!
//! # Patterns
//!
//! - **Diagonal**: 5 points from bottom-left to top-right
//! - **Grid**: 3×3 points at quarter fractions of the canvas
//! - **Random**: up to 7 points, kept apart by 1.5× the larger box edge

use crate::error::CompositorError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DIAGONAL_POINTS: u32 = 5;
const GRID_CELLS: u32 = 3;
const RANDOM_POINTS: usize = 7;
const RANDOM_ATTEMPTS: usize = 50;
const RANDOM_SPACING: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    #[default]
    Diagonal,
    Grid,
    Random,
}

impl Pattern {
    pub const VALID: &'static [&'static str] = &["diagonal", "grid", "random"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Diagonal => "diagonal",
            Pattern::Grid => "grid",
            Pattern::Random => "random",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pattern {
    type Err = CompositorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diagonal" => Ok(Pattern::Diagonal),
            "grid" => Ok(Pattern::Grid),
            "random" => Ok(Pattern::Random),
            other => Err(CompositorError::UnsupportedOption {
                option: "pattern",
                value: other.to_string(),
                valid: Self::VALID,
            }),
        }
    }
}

/// Size of the rendered text box in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBox {
    pub width: u32,
    pub height: u32,
}

/// Size of the target image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

/// Top-left corner of a text box. May be negative when the box overhangs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PixelAnchor {
    pub x: i32,
    pub y: i32,
}

impl PixelAnchor {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &PixelAnchor) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Five points from the bottom-left to the top-right corner.
pub fn diagonal(text: TextBox, canvas: Canvas) -> Vec<PixelAnchor> {
    let span_x = canvas.width as f32 - text.width as f32;
    let span_y = canvas.height as f32 - text.height as f32;

    (0..DIAGONAL_POINTS)
        .map(|i| {
            let progress = i as f32 / (DIAGONAL_POINTS - 1) as f32;
            PixelAnchor::new(
                (progress * span_x) as i32,
                ((1.0 - progress) * span_y) as i32,
            )
        })
        .collect()
}

/// 3×3 grid centred on the quarter lines, row-major.
pub fn grid(text: TextBox, canvas: Canvas) -> Vec<PixelAnchor> {
    let spacing_x = canvas.width as f32 / (GRID_CELLS + 1) as f32;
    let spacing_y = canvas.height as f32 / (GRID_CELLS + 1) as f32;
    let half_w = text.width as f32 / 2.0;
    let half_h = text.height as f32 / 2.0;

    let mut anchors = Vec::with_capacity((GRID_CELLS * GRID_CELLS) as usize);
    for row in 1..=GRID_CELLS {
        for col in 1..=GRID_CELLS {
            anchors.push(PixelAnchor::new(
                (col as f32 * spacing_x - half_w) as i32,
                (row as f32 * spacing_y - half_h) as i32,
            ));
        }
    }
    anchors
}

/// Up to seven uniformly sampled points that keep their distance.
///
/// Each point gets a bounded number of attempts; a point that cannot be
/// placed is omitted, so fewer than seven is a normal outcome on small
/// canvases.
pub fn random_scatter<R: Rng + ?Sized>(text: TextBox, canvas: Canvas, rng: &mut R) -> Vec<PixelAnchor> {
    let range_x = (canvas.width as i64 - text.width as i64).max(1);
    let range_y = (canvas.height as i64 - text.height as i64).max(1);
    let min_distance = text.width.max(text.height) as f64 * RANDOM_SPACING;

    let mut anchors: Vec<PixelAnchor> = Vec::with_capacity(RANDOM_POINTS);
    for _ in 0..RANDOM_POINTS {
        for _ in 0..RANDOM_ATTEMPTS {
            let candidate = PixelAnchor::new(
                rng.gen_range(0..range_x) as i32,
                rng.gen_range(0..range_y) as i32,
            );
            if anchors
                .iter()
                .all(|placed| placed.distance(&candidate) >= min_distance)
            {
                anchors.push(candidate);
                break;
            }
        }
    }
    anchors
}

/// Anchors for `pattern`. The RNG is only consulted by [`Pattern::Random`].
pub fn layout<R: Rng + ?Sized>(
    pattern: Pattern,
    text: TextBox,
    canvas: Canvas,
    rng: &mut R,
) -> Vec<PixelAnchor> {
    match pattern {
        Pattern::Diagonal => diagonal(text, canvas),
        Pattern::Grid => grid(text, canvas),
        Pattern::Random => random_scatter(text, canvas, rng),
    }
}
