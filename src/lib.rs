pub mod arc_consistency;
pub mod assignment;
pub mod backtracking_search;
pub mod domains;
pub mod grid_config;
pub mod render;
pub mod word_list;

pub use assignment::Assignment;
pub use backtracking_search::{find_fill, solve, FillFailure, FillOptions, FillSuccess, Statistics};
pub use grid_config::{Direction, GridConfig, GridError, Overlap, Slot, SlotId};
pub use render::{render_grid, render_image, write_output, OutputFormat, RenderError};
pub use word_list::{WordId, WordList, WordListError};

/// Should we run extra checks to validate that propagation never leaves the domains in an invalid
/// state? This can be enabled with `--features check_invariants` when debugging.
pub const CHECK_INVARIANTS: bool = cfg!(feature = "check_invariants");

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;
