//! The tile grid the agent lives on.
//!
//! The grid is a plain row-major array of [`Tile`]s plus cached lists of the
//! charger and bin positions. Every coordinate query is total: anything off
//! the grid reads as [`Tile::Wall`], so callers near the border never need a
//! bounds check of their own.

use crate::error::{Error, Result};
use crate::types::{Cell, Direction};
use serde::{Deserialize, Serialize};

/// What occupies a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Tile {
    #[default]
    Empty,
    Dirt,
    Wall,
    WallHorizontal,
    WallVertical,
    WallCorner,
    Charger,
    Bin,
    Sofa,
    Chair,
    Table,
    Bed,
}

impl Tile {
    /// Decorative furniture variants, all obstacle-equivalent.
    pub const FURNITURE: [Tile; 4] = [Tile::Sofa, Tile::Chair, Tile::Table, Tile::Bed];

    /// Returns `true` for every tile that blocks movement and path search.
    pub fn is_obstacle(self) -> bool {
        matches!(
            self,
            Tile::Wall
                | Tile::WallHorizontal
                | Tile::WallVertical
                | Tile::WallCorner
                | Tile::Sofa
                | Tile::Chair
                | Tile::Table
                | Tile::Bed
        )
    }

    /// The tile as reported to the agent's sensors.
    ///
    /// Every obstacle variant collapses to `Wall`, so the sensor state space
    /// does not grow with the furniture catalogue.
    pub fn sensed(self) -> Tile {
        if self.is_obstacle() {
            Tile::Wall
        } else {
            self
        }
    }

    /// Single-character layout glyph.
    pub fn glyph(self) -> char {
        match self {
            Tile::Empty => '.',
            Tile::Dirt => 'd',
            Tile::Wall => '#',
            Tile::WallHorizontal => '-',
            Tile::WallVertical => '|',
            Tile::WallCorner => '+',
            Tile::Charger => 'C',
            Tile::Bin => 'B',
            Tile::Sofa => 's',
            Tile::Chair => 'c',
            Tile::Table => 't',
            Tile::Bed => 'b',
        }
    }

    /// Parses a layout glyph.
    pub fn from_glyph(glyph: char) -> Option<Tile> {
        let tile = match glyph {
            '.' => Tile::Empty,
            'd' => Tile::Dirt,
            '#' => Tile::Wall,
            '-' => Tile::WallHorizontal,
            '|' => Tile::WallVertical,
            '+' => Tile::WallCorner,
            'C' => Tile::Charger,
            'B' => Tile::Bin,
            's' => Tile::Sofa,
            'c' => Tile::Chair,
            't' => Tile::Table,
            'b' => Tile::Bed,
            _ => return None,
        };
        Some(tile)
    }
}

/// A fixed-size 2D grid of tiles with charger and bin lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "GridSnapshot", try_from = "GridSnapshot")]
pub struct GridMap {
    rows: usize,
    cols: usize,
    tiles: Vec<Tile>,
    chargers: Vec<Cell>,
    bins: Vec<Cell>,
}

impl GridMap {
    /// Creates an all-empty grid.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            tiles: vec![Tile::Empty; rows * cols],
            chargers: Vec::new(),
            bins: Vec::new(),
        }
    }

    /// Builds a grid from an ASCII layout, one line per row.
    ///
    /// Leading and trailing blank lines and surrounding whitespace on each
    /// line are ignored. See [`Tile::glyph`] for the alphabet.
    pub fn parse(layout: &str) -> Result<Self> {
        let lines: Vec<&str> = layout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let Some(first) = lines.first() else {
            return Err(Error::Grid("layout is empty".to_string()));
        };
        let cols = first.chars().count();
        let mut grid = GridMap::new(lines.len(), cols);

        for (row, line) in lines.iter().enumerate() {
            let width = line.chars().count();
            if width != cols {
                return Err(Error::Grid(format!(
                    "row {} has {} columns, expected {}",
                    row, width, cols
                )));
            }
            for (col, glyph) in line.chars().enumerate() {
                let tile = Tile::from_glyph(glyph).ok_or_else(|| {
                    Error::Grid(format!("unknown glyph {:?} at ({}, {})", glyph, row, col))
                })?;
                grid.set_tile(Cell::new(row, col), tile);
            }
        }

        Ok(grid)
    }

    /// Renders the grid back to its ASCII layout.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.rows * (self.cols + 1));
        for row in 0..self.rows {
            for col in 0..self.cols {
                out.push(self.tiles[row * self.cols + col].glyph());
            }
            out.push('\n');
        }
        out
    }

    /// Returns `(rows, cols)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns `true` if `cell` lies inside the grid.
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    /// Tile at signed coordinates; anything off the grid is `Wall`.
    pub fn tile_at(&self, row: isize, col: isize) -> Tile {
        if row < 0 || col < 0 {
            return Tile::Wall;
        }
        self.tile(Cell::new(row as usize, col as usize))
    }

    /// Tile at `cell`; anything off the grid is `Wall`.
    pub fn tile(&self, cell: Cell) -> Tile {
        if self.in_bounds(cell) {
            self.tiles[cell.row * self.cols + cell.col]
        } else {
            Tile::Wall
        }
    }

    /// Returns `true` if `cell` is in bounds and not an obstacle.
    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && !self.tile(cell).is_obstacle()
    }

    /// Overwrites a tile, keeping the charger and bin lists in sync.
    ///
    /// Writes outside the grid are ignored.
    pub fn set_tile(&mut self, cell: Cell, tile: Tile) {
        if !self.in_bounds(cell) {
            return;
        }
        let idx = cell.row * self.cols + cell.col;
        let old = self.tiles[idx];
        if old == tile {
            return;
        }
        self.tiles[idx] = tile;

        match old {
            Tile::Charger => self.chargers.retain(|c| *c != cell),
            Tile::Bin => self.bins.retain(|c| *c != cell),
            _ => {}
        }
        match tile {
            Tile::Charger => self.chargers.push(cell),
            Tile::Bin => self.bins.push(cell),
            _ => {}
        }
    }

    /// Resets every tile to `Empty`.
    pub fn clear(&mut self) {
        self.tiles.fill(Tile::Empty);
        self.chargers.clear();
        self.bins.clear();
    }

    /// Charger positions, in placement order.
    pub fn charger_targets(&self) -> &[Cell] {
        &self.chargers
    }

    /// Bin positions, in placement order.
    pub fn bin_targets(&self) -> &[Cell] {
        &self.bins
    }

    /// All dirt positions, in row-major order. Full scan.
    pub fn dirt_targets(&self) -> Vec<Cell> {
        self.cells_matching(Tile::Dirt)
    }

    /// Number of dirt tiles left. Full scan.
    pub fn dirt_count(&self) -> usize {
        self.tiles.iter().filter(|t| **t == Tile::Dirt).count()
    }

    /// All cells holding exactly `tile`, in row-major order.
    pub fn cells_matching(&self, tile: Tile) -> Vec<Cell> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == tile)
            .map(|(idx, _)| Cell::new(idx / self.cols, idx % self.cols))
            .collect()
    }

    /// Sensor readings around `cell`: north, south, east, west, current.
    ///
    /// Off-grid neighbours and every obstacle variant read as `Wall`.
    pub fn local_sensors(&self, cell: Cell) -> [Tile; 5] {
        let probe = |direction: Direction| {
            let (row, col) = cell.offset(direction);
            self.tile_at(row, col).sensed()
        };
        [
            probe(Direction::Up),
            probe(Direction::Down),
            probe(Direction::Right),
            probe(Direction::Left),
            self.tile(cell).sensed(),
        ]
    }
}

/// Serialized shape of a [`GridMap`].
///
/// Only the tiles travel; the charger and bin lists are rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub rows: usize,
    pub cols: usize,
    pub tiles: Vec<Tile>,
}

impl From<GridMap> for GridSnapshot {
    fn from(grid: GridMap) -> Self {
        Self {
            rows: grid.rows,
            cols: grid.cols,
            tiles: grid.tiles,
        }
    }
}

impl TryFrom<GridSnapshot> for GridMap {
    type Error = String;

    fn try_from(snapshot: GridSnapshot) -> std::result::Result<Self, Self::Error> {
        let expected = snapshot.rows.checked_mul(snapshot.cols);
        if expected != Some(snapshot.tiles.len()) {
            return Err(format!(
                "{} tiles do not fill a {}x{} grid",
                snapshot.tiles.len(),
                snapshot.rows,
                snapshot.cols
            ));
        }

        let mut grid = GridMap::new(snapshot.rows, snapshot.cols);
        for (idx, tile) in snapshot.tiles.into_iter().enumerate() {
            grid.set_tile(Cell::new(idx / snapshot.cols, idx % snapshot.cols), tile);
        }
        Ok(grid)
    }
}
