//! Randomized backtracking maze generation on a wall-carving grid.

pub mod config;
pub mod error;
pub mod field;
pub mod render;
pub mod traverse;

pub use error::MazeError;
pub use field::{Dir, Field, Pos, Tile};
pub use traverse::{Session, Stats, Step};

use log::info;
use rand::Rng;

/// Builds a `rows` x `cols` maze: carves the solution path, then grows
/// branches off it until every cell is reachable.
pub fn generate(rows: usize, cols: usize, rng: &mut impl Rng) -> Result<Field, MazeError> {
    let mut session = Session::new(Field::new(rows, cols)?);
    session.solve(rng);
    session.grow_branches(rng);
    let stats = session.stats();
    info!(
        "generated {}x{} maze ({} advances, {} retreats, {} branch cells)",
        rows, cols, stats.advances, stats.retreats, stats.branch_cells
    );
    Ok(session.into_field())
}
