use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

use smallvec::{smallvec, SmallVec};
use thiserror::Error;

use crate::word_list::WordList;
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given slot, based on its index in the GridConfig's `slot_configs` field.
pub type SlotId = usize;

/// Zero-indexed row and column for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Across,
    Down,
}

/// The geometry of a single slot. Two slots are the same slot if they start in the same cell and
/// run in the same direction; the length follows from those.
#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.start_cell == other.start_cell && self.direction == other.direction
    }
}

impl Eq for Slot {}

impl Hash for Slot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start_cell.hash(state);
        self.direction.hash(state);
    }
}

impl Slot {
    /// Generate the coords for each cell of this slot.
    pub fn cell_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.length).map(move |cell_idx| {
            let (row, col) = self.start_cell;
            match self.direction {
                Direction::Across => (row, col + cell_idx),
                Direction::Down => (row + cell_idx, col),
            }
        })
    }
}

/// The shared cell between two slots, as an index into each slot's word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub offset_a: usize,
    pub offset_b: usize,
}

impl Overlap {
    pub fn swapped(self) -> Overlap {
        Overlap {
            offset_a: self.offset_b,
            offset_b: self.offset_a,
        }
    }
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing the aspects of a slot in the grid that are static during filling.
#[derive(Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub slot: Slot,

    /// Letters given in the template for each cell, if any.
    pub prefilled: SmallVec<[Option<char>; MAX_SLOT_LENGTH]>,

    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,

    /// Every slot sharing a cell with this one, in cell order.
    pub neighbors: SmallVec<[SlotId; MAX_SLOT_LENGTH]>,
}

impl Debug for SlotConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotConfig")
            .field("id", &self.id)
            .field("start_cell", &self.slot.start_cell)
            .field("direction", &self.slot.direction)
            .field("length", &self.slot.length)
            .field("crossings", &self.crossings)
            .finish()
    }
}

/// A single cell of the grid template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Blocked,
    Open(Option<char>),
}

impl Cell {
    pub fn is_open(self) -> bool {
        matches!(self, Cell::Open(_))
    }
}

#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid template has no rows")]
    Empty,

    #[error("unexpected character {found:?} at row {row}, column {col}")]
    InvalidCell { row: usize, col: usize, found: char },

    #[error("failed to read grid structure {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A struct representing the aspects of a grid that are static during filling: the cell layout,
/// the slots and how they cross, and the vocabulary.
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
    cells: Vec<Vec<Cell>>,
    pub slot_configs: Vec<SlotConfig>,

    /// Dense `slot_count * slot_count` table, indexed by `a * slot_count + b`.
    overlaps: Vec<Option<Overlap>>,

    pub word_list: WordList,
}

impl Debug for GridConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridConfig")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("slot_configs", &self.slot_configs)
            .field("words", &format!("({} entries)", self.word_list.len()))
            .finish()
    }
}

fn parse_cell(row: usize, col: usize, found: char) -> Result<Cell, GridError> {
    match found {
        '#' | '█' => Ok(Cell::Blocked),
        '_' | '.' => Ok(Cell::Open(None)),
        c if c.is_alphanumeric() => {
            let mut upper = c.to_uppercase();
            let glyph = match (upper.next(), upper.next()) {
                (Some(u), None) => u,
                _ => c,
            };
            Ok(Cell::Open(Some(glyph)))
        }
        _ => Err(GridError::InvalidCell { row, col, found }),
    }
}

/// Find every maximal run of at least two open cells along rows (across) or columns (down).
fn find_runs(cells: &[Vec<Cell>], width: usize, height: usize, direction: Direction) -> Vec<Slot> {
    let (outer, inner) = match direction {
        Direction::Across => (height, width),
        Direction::Down => (width, height),
    };
    let coord = |major: usize, minor: usize| match direction {
        Direction::Across => (major, minor),
        Direction::Down => (minor, major),
    };

    let mut result = vec![];
    for major in 0..outer {
        let mut minor = 0;
        while minor < inner {
            let (row, col) = coord(major, minor);
            if !cells[row][col].is_open() {
                minor += 1;
                continue;
            }

            let start = minor;
            while minor < inner && {
                let (row, col) = coord(major, minor);
                cells[row][col].is_open()
            } {
                minor += 1;
            }

            if minor - start > 1 {
                result.push(Slot {
                    start_cell: coord(major, start),
                    direction,
                    length: minor - start,
                });
            }
        }
    }

    result
}

impl GridConfig {
    /// Generate a GridConfig from a string template, with `_` or `.` representing empty cells, `#`
    /// representing blocks, and letters representing themselves. Trailing whitespace on each line
    /// is ignored, blank lines are skipped, and short rows are padded with blocks. Leading
    /// whitespace is a cell like any other, so it's rejected.
    pub fn from_template(template: &str, word_list: WordList) -> Result<GridConfig, GridError> {
        let lines: Vec<&str> = template
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();

        if lines.is_empty() {
            return Err(GridError::Empty);
        }

        let height = lines.len();
        let width = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0);

        let mut cells: Vec<Vec<Cell>> = Vec::with_capacity(height);
        for (row, line) in lines.iter().enumerate() {
            let mut row_cells = line
                .chars()
                .enumerate()
                .map(|(col, c)| parse_cell(row, col, c))
                .collect::<Result<Vec<Cell>, GridError>>()?;
            row_cells.resize(width, Cell::Blocked);
            cells.push(row_cells);
        }

        let slots: Vec<Slot> = find_runs(&cells, width, height, Direction::Across)
            .into_iter()
            .chain(find_runs(&cells, width, height, Direction::Down))
            .collect();

        // Build a map from cell location to slots involved, which we can then use to calculate
        // crossings.
        let mut slots_by_loc: HashMap<GridCoord, SmallVec<[(SlotId, usize); 2]>> = HashMap::new();
        for (slot_id, slot) in slots.iter().enumerate() {
            for (cell_idx, loc) in slot.cell_coords().enumerate() {
                slots_by_loc.entry(loc).or_default().push((slot_id, cell_idx));
            }
        }

        let slot_count = slots.len();
        let mut overlaps: Vec<Option<Overlap>> = vec![None; slot_count * slot_count];
        let mut slot_configs: Vec<SlotConfig> = Vec::with_capacity(slot_count);

        for (slot_id, slot) in slots.iter().enumerate() {
            // A cell is shared by at most one across and one down slot.
            let crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]> = slot
                .cell_coords()
                .map(|loc| {
                    slots_by_loc[&loc]
                        .iter()
                        .find(|&&(other_slot_id, _)| other_slot_id != slot_id)
                        .map(|&(other_slot_id, other_slot_cell)| Crossing {
                            other_slot_id,
                            other_slot_cell,
                        })
                })
                .collect();

            let mut neighbors: SmallVec<[SlotId; MAX_SLOT_LENGTH]> = smallvec![];
            for (cell_idx, crossing) in crossings.iter().enumerate() {
                if let Some(crossing) = crossing {
                    overlaps[slot_id * slot_count + crossing.other_slot_id] = Some(Overlap {
                        offset_a: cell_idx,
                        offset_b: crossing.other_slot_cell,
                    });
                    neighbors.push(crossing.other_slot_id);
                }
            }

            let prefilled = slot
                .cell_coords()
                .map(|(row, col)| match cells[row][col] {
                    Cell::Open(glyph) => glyph,
                    Cell::Blocked => None,
                })
                .collect();

            slot_configs.push(SlotConfig {
                id: slot_id,
                slot: *slot,
                prefilled,
                crossings,
                neighbors,
            });
        }

        Ok(GridConfig {
            width,
            height,
            cells,
            slot_configs,
            overlaps,
            word_list,
        })
    }

    /// Generate a GridConfig representing an open square grid.
    pub fn square(square_size: usize, word_list: WordList) -> Result<GridConfig, GridError> {
        let row = "_".repeat(square_size);
        let template = vec![row; square_size].join("\n");

        GridConfig::from_template(&template, word_list)
    }

    /// Read a structure file from disk.
    pub fn load<P: AsRef<Path>>(path: P, word_list: WordList) -> Result<GridConfig, GridError> {
        let path = path.as_ref();
        let template = fs::read_to_string(path).map_err(|source| GridError::Io {
            path: path.display().to_string(),
            source,
        })?;

        GridConfig::from_template(&template, word_list)
    }

    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    pub fn slot_ids(&self) -> std::ops::Range<SlotId> {
        0..self.slot_configs.len()
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> + '_ {
        self.slot_configs.iter().map(|slot_config| &slot_config.slot)
    }

    pub fn slot(&self, slot_id: SlotId) -> &Slot {
        &self.slot_configs[slot_id].slot
    }

    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        &self.slot_configs[slot_id].neighbors
    }

    /// Where do the two slots cross, if anywhere? `overlap(b, a)` is `overlap(a, b)` swapped.
    pub fn overlap(&self, slot_a: SlotId, slot_b: SlotId) -> Option<Overlap> {
        let slot_count = self.slot_count();
        debug_assert!(
            slot_a < slot_count && slot_b < slot_count,
            "overlap({}, {}) out of range for {} slots",
            slot_a,
            slot_b,
            slot_count
        );
        self.overlaps[slot_a * slot_count + slot_b]
    }

    pub fn vocabulary(&self) -> &WordList {
        &self.word_list
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }
}
