//! Random room generation and dirt respawn.
//!
//! A generated room is a rectangle fenced by boundary walls, with a share of
//! the interior turned into furniture, one charger, one bin and a share of
//! the interior covered in dirt. The agent always starts on the charger.

use crate::error::{Error, Result};
use crate::grid::{GridMap, Tile};
use crate::types::Cell;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Parameters of a generated room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub rows: usize,
    pub cols: usize,
    /// Fraction of the interior filled with furniture.
    pub obstacle_ratio: f64,
    /// Fraction of the interior covered in dirt.
    pub dirt_ratio: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rows: 20,
            cols: 20,
            obstacle_ratio: 0.10,
            dirt_ratio: 0.15,
        }
    }
}

impl LayoutConfig {
    /// A square room of `size` cells per side with the default ratios.
    pub fn square(size: usize) -> Self {
        Self {
            rows: size,
            cols: size,
            ..Default::default()
        }
    }

    fn interior_area(&self) -> usize {
        self.rows.saturating_sub(2) * self.cols.saturating_sub(2)
    }
}

/// A freshly built room and the agent's starting cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub grid: GridMap,
    pub start: Cell,
}

/// Where an episode's map comes from.
#[derive(Debug, Clone)]
pub enum MapSource {
    /// A new random room every episode.
    Generated(LayoutConfig),
    /// The same room every episode.
    Fixed(Room),
    /// One random room generated up front and kept across episodes. Only the
    /// agent is reset, so cleaned tiles and respawned dirt carry over.
    Persistent(LayoutConfig),
}

impl MapSource {
    /// Produces a room. For a persistent source this is only called once.
    pub fn build<R: Rng>(&self, rng: &mut R) -> Result<Room> {
        match self {
            MapSource::Generated(layout) | MapSource::Persistent(layout) => generate(layout, rng),
            MapSource::Fixed(room) => Ok(room.clone()),
        }
    }

    /// Returns `true` if the map outlives a single episode.
    pub fn is_persistent(&self) -> bool {
        matches!(self, MapSource::Persistent(_))
    }
}

impl Default for MapSource {
    fn default() -> Self {
        MapSource::Generated(LayoutConfig::default())
    }
}

/// Builds a random room.
///
/// Fails if the interior cannot hold at least a charger and a bin.
pub fn generate<R: Rng>(layout: &LayoutConfig, rng: &mut R) -> Result<Room> {
    let (rows, cols) = (layout.rows, layout.cols);
    if rows < 3 || cols < 3 || layout.interior_area() < 2 {
        return Err(Error::Grid(format!(
            "a {}x{} room has no space for a charger and a bin",
            rows, cols
        )));
    }

    let mut grid = GridMap::new(rows, cols);
    build_boundary(&mut grid);

    let inner = layout.interior_area();
    let num_obstacles = (inner as f64 * layout.obstacle_ratio) as usize;
    let num_dirt = (inner as f64 * layout.dirt_ratio) as usize;

    let mut free: Vec<Cell> = (1..rows - 1)
        .flat_map(|row| (1..cols - 1).map(move |col| Cell::new(row, col)))
        .collect();
    free.shuffle(rng);
    let mut free = free.into_iter();

    // Keep two cells back for the charger and the bin.
    for cell in free.by_ref().take(num_obstacles.min(inner - 2)) {
        let furniture = Tile::FURNITURE[rng.random_range(0..Tile::FURNITURE.len())];
        grid.set_tile(cell, furniture);
    }

    let charger = free
        .next()
        .ok_or_else(|| Error::Internal("no free cell for the charger".to_string()))?;
    grid.set_tile(charger, Tile::Charger);
    let bin = free
        .next()
        .ok_or_else(|| Error::Internal("no free cell for the bin".to_string()))?;
    grid.set_tile(bin, Tile::Bin);

    for cell in free.take(num_dirt) {
        grid.set_tile(cell, Tile::Dirt);
    }

    log::trace!(
        "Generated {}x{} room: {} obstacles, {} dirt",
        rows,
        cols,
        num_obstacles,
        grid.dirt_count()
    );

    Ok(Room {
        grid,
        start: charger,
    })
}

/// Fences the grid: horizontal runs on the top and bottom rows, vertical runs
/// on the side columns, corners at the four corners.
fn build_boundary(grid: &mut GridMap) {
    let (rows, cols) = grid.dimensions();
    for col in 0..cols {
        grid.set_tile(Cell::new(0, col), Tile::WallHorizontal);
        grid.set_tile(Cell::new(rows - 1, col), Tile::WallHorizontal);
    }
    for row in 0..rows {
        grid.set_tile(Cell::new(row, 0), Tile::WallVertical);
        grid.set_tile(Cell::new(row, cols - 1), Tile::WallVertical);
    }
    for (row, col) in [(0, 0), (0, cols - 1), (rows - 1, 0), (rows - 1, cols - 1)] {
        grid.set_tile(Cell::new(row, col), Tile::WallCorner);
    }
}

/// With probability `chance`, drops dirt on one random cell.
///
/// Only an `Empty` cell can receive dirt; if the sampled cell holds anything
/// else nothing happens. Returns the cell that became dirty.
pub fn spawn_dirt<R: Rng>(grid: &mut GridMap, chance: f64, rng: &mut R) -> Option<Cell> {
    if chance <= 0.0 || rng.random::<f64>() >= chance {
        return None;
    }
    let (rows, cols) = grid.dimensions();
    if rows == 0 || cols == 0 {
        return None;
    }
    let cell = Cell::new(rng.random_range(0..rows), rng.random_range(0..cols));
    if grid.tile(cell) != Tile::Empty {
        return None;
    }
    grid.set_tile(cell, Tile::Dirt);
    Some(cell)
}
