//! Simulation data types.

use serde::{Deserialize, Serialize};

/// Identifier of a bacterium, unique within a population snapshot.
pub type BacteriumId = u64;

/// Ordered collection of bacteria making up one snapshot.
pub type Population = Vec<Bacterium>;

/// Display color of a bacterium.
///
/// Purely cosmetic: the model never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    Green,
    Red,
}

impl Color {
    /// Color used for a bacterium with the given resistance.
    pub fn for_resistance(is_resistant: bool) -> Self {
        if is_resistant { Color::Red } else { Color::Green }
    }

    pub fn hex(self) -> &'static str {
        match self {
            Color::Green => "#44ff44",
            Color::Red => "#ff4444",
        }
    }
}

/// Point in dish coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Bacterium of the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bacterium {
    pub id: BacteriumId,
    pub position: Position,
    pub is_resistant: bool,
    /// Always in `[0, 1]`.
    pub fitness: f64,
    /// Number of steps survived.
    pub age: u32,
    /// Lineage depth from the founders.
    pub generation: u32,
    /// Lineage back-reference; never followed by the engine.
    pub parent_id: Option<BacteriumId>,
    pub color: Color,
    /// Always in `[1, 10]`.
    pub size: f64,
}

pub const FITNESS_MIN: f64 = 0.0;
pub const FITNESS_MAX: f64 = 1.0;
pub const SIZE_MIN: f64 = 1.0;
pub const SIZE_MAX: f64 = 10.0;

/// Add `delta` to a fitness value keeping it in range.
pub fn shift_fitness(fitness: f64, delta: f64) -> f64 {
    (fitness + delta).clamp(FITNESS_MIN, FITNESS_MAX)
}

/// Add `delta` to a size value keeping it in range.
pub fn shift_size(size: f64, delta: f64) -> f64 {
    (size + delta).clamp(SIZE_MIN, SIZE_MAX)
}
