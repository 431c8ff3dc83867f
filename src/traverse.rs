//! Randomized depth-first carving over a [`Field`].
//!
//! A [`Session`] owns the field and the single traverser cursor. The primary
//! solve walks from the start cell, carving two cells at a time, and backs up
//! along its own trail whenever it gets stuck. Cells it backs over are
//! re-tagged [`Tile::Branch`], so once the exit is reached the remaining
//! [`Tile::Solution`] cells form a simple path. Branch growth then re-seeds
//! the traverser at every carved cell and carves greedily without backing up.

use crate::field::{Dir, Field, Pos, Tile};
use log::{debug, trace};
use rand::Rng;

/// Outcome of a single primary-solve step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Advanced(Dir),
    Retreated(Dir),
    Arrived,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub advances: usize,
    pub retreats: usize,
    pub branch_seeds: usize,
    pub branch_cells: usize,
    pub branch_passes: usize,
}

/// Random probe order: a uniform start direction, then the remaining three
/// clockwise or counterclockwise with equal probability.
pub fn rotation_order(rng: &mut impl Rng) -> [Dir; 4] {
    let start = Dir::ALL[rng.gen_range(0..Dir::ALL.len())];
    let sign: isize = if rng.gen_bool(0.5) { 1 } else { -1 };
    let mut order = [start; 4];
    for (i, dir) in order.iter_mut().enumerate() {
        *dir = start.rotated(i as isize * sign);
    }
    order
}

pub struct Session {
    field: Field,
    traverser: Option<Pos>,
    stats: Stats,
}

impl Session {
    pub fn new(field: Field) -> Self {
        Self {
            field,
            traverser: None,
            stats: Stats::default(),
        }
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn into_field(self) -> Field {
        self.field
    }

    pub fn traverser(&self) -> Option<Pos> {
        self.traverser
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Puts the traverser on `at` and tags that cell with `trail` unless it
    /// is already carved.
    pub fn place_traverser(&mut self, at: Pos, trail: Tile) {
        if self.field.get(at) == Some(Tile::Unpathed) {
            self.field.set(at, trail);
        }
        self.traverser = Some(at);
    }

    pub fn remove_traverser(&mut self) {
        self.traverser = None;
    }

    /// Both the corridor and the cell behind it must still be unpathed.
    pub fn can_move_twice(&self, from: Pos, dir: Dir) -> bool {
        let Some(one) = self.field.step(from, dir, 1) else {
            return false;
        };
        let Some(two) = self.field.step(from, dir, 2) else {
            return false;
        };
        self.field.get(one) == Some(Tile::Unpathed) && self.field.get(two) == Some(Tile::Unpathed)
    }

    /// Carves two cells in the first eligible direction and moves the
    /// traverser onto the far one. Returns `None` when blocked.
    pub fn advance(&mut self, rng: &mut impl Rng, trail: Tile) -> Option<Dir> {
        let at = self.traverser?;
        let dir = rotation_order(rng)
            .into_iter()
            .find(|&dir| self.can_move_twice(at, dir))?;
        let one = self.field.step(at, dir, 1)?;
        let two = self.field.step(at, dir, 2)?;
        self.field.set(one, trail);
        self.field.set(two, trail);
        self.traverser = Some(two);
        self.stats.advances += 1;
        Some(dir)
    }

    /// Backs up two cells along the solution trail, demoting the cell being
    /// left and its corridor to [`Tile::Branch`].
    pub fn retreat(&mut self) -> Option<Dir> {
        let at = self.traverser?;
        let (dir, one, two) = Dir::ALL.into_iter().find_map(|dir| {
            let one = self.field.step(at, dir, 1)?;
            let two = self.field.step(at, dir, 2)?;
            let on_trail = self.field.get(one) == Some(Tile::Solution)
                && self.field.is_cell_center(two)
                && self.field.get(two) == Some(Tile::Solution);
            on_trail.then_some((dir, one, two))
        })?;
        self.field.set(at, Tile::Branch);
        self.field.set(one, Tile::Branch);
        self.traverser = Some(two);
        self.stats.retreats += 1;
        trace!("retreat {:?} from ({}, {})", dir, at.x, at.y);
        Some(dir)
    }

    /// One step of the primary solve.
    ///
    /// # Panics
    ///
    /// Panics if the traverser is stuck with no trail left to back up along.
    /// On a field built by [`Field::new`] every cell centre is connected, so
    /// this means the field was tampered with.
    pub fn step(&mut self, rng: &mut impl Rng) -> Step {
        let at = self
            .traverser
            .unwrap_or_else(|| panic!("solve step without an active traverser"));
        if at == self.field.exit_cell() {
            return Step::Arrived;
        }
        if let Some(dir) = self.advance(rng, Tile::Solution) {
            return Step::Advanced(dir);
        }
        match self.retreat() {
            Some(dir) => Step::Retreated(dir),
            None => panic!(
                "traversal exhausted at ({}, {}) without reaching the exit",
                at.x, at.y
            ),
        }
    }

    /// Carves the solution path from the start cell to the exit cell.
    pub fn solve(&mut self, rng: &mut impl Rng) {
        self.solve_with(rng, |_, _| {});
    }

    /// Like [`Session::solve`], calling `observe` after every step.
    ///
    /// # Panics
    ///
    /// Panics if the start cell is already carved. Backing up from a carved
    /// start would walk the existing solution and demote it.
    pub fn solve_with<R, F>(&mut self, rng: &mut R, mut observe: F)
    where
        R: Rng,
        F: FnMut(&Field, Option<Pos>),
    {
        let start = self.field.start_cell();
        if self.field.get(start) != Some(Tile::Unpathed) {
            panic!(
                "solve on a carved field: start ({}, {}) is {:?}",
                start.x,
                start.y,
                self.field.get(start)
            );
        }
        self.place_traverser(start, Tile::Solution);
        observe(&self.field, self.traverser);
        while self.step(rng) != Step::Arrived {
            observe(&self.field, self.traverser);
        }
        self.remove_traverser();
        debug!(
            "solved {}x{}: {} advances, {} retreats",
            self.field.rows(),
            self.field.cols(),
            self.stats.advances,
            self.stats.retreats
        );
    }

    /// Grows dead-end corridors from every carved cell centre. Returns the
    /// number of cells carved.
    pub fn grow_branches(&mut self, rng: &mut impl Rng) -> usize {
        self.grow_branches_with(rng, |_, _| {})
    }

    /// Like [`Session::grow_branches`], calling `observe` after every advance.
    ///
    /// Seeds are visited in raster order. Passes repeat until one carves
    /// nothing, since a corridor may grow back past seeds already visited.
    pub fn grow_branches_with<R, F>(&mut self, rng: &mut R, mut observe: F) -> usize
    where
        R: Rng,
        F: FnMut(&Field, Option<Pos>),
    {
        let seeds: Vec<Pos> = self.field.cell_centers().collect();
        let mut carved = 0;
        loop {
            let mut pass_carved = 0;
            for &seed in &seeds {
                if !matches!(self.field.get(seed), Some(Tile::Solution | Tile::Branch)) {
                    continue;
                }
                self.place_traverser(seed, Tile::Branch);
                self.stats.branch_seeds += 1;
                while self.advance(rng, Tile::Branch).is_some() {
                    pass_carved += 2;
                    observe(&self.field, self.traverser);
                }
                self.remove_traverser();
            }
            self.stats.branch_passes += 1;
            carved += pass_carved;
            if pass_carved == 0 {
                break;
            }
        }
        self.stats.branch_cells += carved;
        debug!(
            "branch growth carved {} cells from {} seeds over {} passes",
            carved, self.stats.branch_seeds, self.stats.branch_passes
        );
        carved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn solution_neighbours(field: &Field, pos: Pos) -> usize {
        Dir::ALL
            .into_iter()
            .filter_map(|dir| field.step(pos, dir, 1))
            .filter(|&p| field.get(p) == Some(Tile::Solution))
            .count()
    }

    #[test]
    fn rotation_order_is_a_rotation() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let order = rotation_order(&mut rng);
            let step = if order[1] == order[0].rotated(1) { 1 } else { -1 };
            for i in 0..4 {
                assert_eq!(order[i], order[0].rotated(i as isize * step));
            }
        }
    }

    #[test]
    fn rotation_order_covers_starts_and_signs() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut starts = [0usize; 4];
        let mut clockwise = 0;
        let draws = 4000;
        for _ in 0..draws {
            let order = rotation_order(&mut rng);
            starts[order[0] as usize] += 1;
            if order[1] == order[0].rotated(1) {
                clockwise += 1;
            }
        }
        for count in starts {
            assert!(count > draws / 8, "start counts {:?}", starts);
        }
        assert!(clockwise > draws / 4 && clockwise < draws * 3 / 4);
    }

    #[test]
    fn advance_carves_two_cells() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = Session::new(Field::new(1, 2).unwrap());
        session.place_traverser(Pos::new(1, 1), Tile::Solution);
        assert_eq!(session.advance(&mut rng, Tile::Solution), Some(Dir::Right));
        assert_eq!(session.traverser(), Some(Pos::new(3, 1)));
        assert_eq!(session.field().get(Pos::new(2, 1)), Some(Tile::Solution));
        assert_eq!(session.field().get(Pos::new(3, 1)), Some(Tile::Solution));
        assert_eq!(session.advance(&mut rng, Tile::Solution), None);
        assert_eq!(session.traverser(), Some(Pos::new(3, 1)));
    }

    #[test]
    fn advance_never_moves_into_openings() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = Session::new(Field::new(1, 1).unwrap());
        session.place_traverser(Pos::new(1, 1), Tile::Solution);
        for _ in 0..20 {
            assert_eq!(session.advance(&mut rng, Tile::Solution), None);
        }
    }

    #[test]
    fn retreat_demotes_the_dead_end() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = Session::new(Field::new(1, 3).unwrap());
        session.place_traverser(Pos::new(3, 1), Tile::Solution);
        session.advance(&mut rng, Tile::Solution).unwrap();
        let tip = session.traverser().unwrap();
        let dir = session.retreat().unwrap();
        assert_eq!(session.traverser(), Some(Pos::new(3, 1)));
        assert_eq!(session.field().get(tip), Some(Tile::Branch));
        let corridor = session.field().step(Pos::new(3, 1), dir.rotated(2), 1).unwrap();
        assert_eq!(session.field().get(corridor), Some(Tile::Branch));
        assert_eq!(session.field().get(Pos::new(3, 1)), Some(Tile::Solution));
    }

    #[test]
    fn retreat_ignores_the_entrance() {
        let mut session = Session::new(Field::new(2, 2).unwrap());
        session.place_traverser(Pos::new(1, 1), Tile::Solution);
        assert_eq!(session.retreat(), None);
        assert_eq!(session.traverser(), Some(Pos::new(1, 1)));
    }

    #[test]
    fn solve_reaches_the_exit_along_a_simple_path() {
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut session = Session::new(Field::new(6, 9).unwrap());
            session.solve(&mut rng);
            assert_eq!(session.traverser(), None);
            let field = session.field();
            assert_eq!(field.get(field.exit_cell()), Some(Tile::Solution));
            for y in 0..field.height() {
                for x in 0..field.width() {
                    let pos = Pos::new(x, y);
                    if field.get(pos) != Some(Tile::Solution) {
                        continue;
                    }
                    let expected = if pos == field.entrance() || pos == field.exit_opening() {
                        1
                    } else {
                        2
                    };
                    assert_eq!(
                        solution_neighbours(field, pos),
                        expected,
                        "seed {} at {:?}",
                        seed,
                        pos
                    );
                }
            }
        }
    }

    #[test]
    fn solve_steps_report_progress() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut session = Session::new(Field::new(4, 4).unwrap());
        let mut frames = 0;
        session.solve_with(&mut rng, |_, cursor| {
            assert!(cursor.is_some());
            frames += 1;
        });
        let stats = session.stats();
        assert_eq!(frames, 1 + stats.advances + stats.retreats);
        assert!(stats.advances >= 3);
    }

    #[test]
    fn branch_growth_carves_every_cell_and_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut session = Session::new(Field::new(7, 5).unwrap());
        session.solve(&mut rng);
        let solved = session.field().clone();
        let carved = session.grow_branches(&mut rng);
        let field = session.field().clone();
        assert_eq!(
            carved,
            field.count(Tile::Branch) + field.count(Tile::Solution)
                - solved.count(Tile::Branch)
                - solved.count(Tile::Solution)
        );
        assert!(field
            .cell_centers()
            .all(|p| matches!(field.get(p), Some(Tile::Solution | Tile::Branch))));
        for y in 0..field.height() {
            for x in 0..field.width() {
                let pos = Pos::new(x, y);
                if solved.get(pos) == Some(Tile::Solution) {
                    assert_eq!(field.get(pos), Some(Tile::Solution));
                }
            }
        }

        assert_eq!(session.grow_branches(&mut rng), 0);
        assert_eq!(session.field(), &field);
    }

    #[test]
    #[should_panic(expected = "solve on a carved field")]
    fn solving_twice_is_an_invariant_violation() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut session = Session::new(Field::new(4, 4).unwrap());
        session.solve(&mut rng);
        session.solve(&mut rng);
    }

    #[test]
    fn solved_field_keeps_its_path_when_rewrapped() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut session = Session::new(Field::new(4, 4).unwrap());
        session.solve(&mut rng);
        let solved = session.into_field();
        let mut again = Session::new(solved.clone());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            again.solve(&mut rng);
        }));
        assert!(result.is_err());
        assert_eq!(again.field(), &solved);
    }

    #[test]
    #[should_panic(expected = "traversal exhausted")]
    fn walled_off_exit_is_an_invariant_violation() {
        let mut field = Field::new(2, 2).unwrap();
        let exit = field.exit_cell();
        field.set(Pos::new(exit.x - 1, exit.y), Tile::Wall);
        field.set(Pos::new(exit.x, exit.y - 1), Tile::Wall);
        let mut rng = StdRng::seed_from_u64(0);
        Session::new(field).solve(&mut rng);
    }
}
