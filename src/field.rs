use crate::error::MazeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Unpathed,
    Solution,
    Branch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Cardinal directions, declared in clockwise rotation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Right,
    Down,
    Left,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Right, Dir::Down, Dir::Left];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (0, -1),
            Dir::Right => (1, 0),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
        }
    }

    /// Turns `quarter_turns` steps clockwise (negative turns counterclockwise).
    pub fn rotated(self, quarter_turns: isize) -> Dir {
        let idx = (self as isize + quarter_turns).rem_euclid(4);
        Dir::ALL[idx as usize]
    }
}

/// Wall-carving maze grid.
///
/// Cell centres sit on odd/odd coordinates, pillars on even/even coordinates,
/// and the remaining interior cells are the corridors between two centres.
/// Storage is a single row-major buffer indexed by `y * width + x`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Field {
    /// Builds a `rows` x `cols` field with the entrance and exit already cut.
    pub fn new(rows: usize, cols: usize) -> Result<Self, MazeError> {
        if rows == 0 || cols == 0 {
            return Err(MazeError::InvalidDimensions { rows, cols });
        }
        let exhausted = MazeError::ResourceExhausted { rows, cols };
        let width = cols
            .checked_mul(2)
            .and_then(|w| w.checked_add(1))
            .ok_or_else(|| exhausted.clone())?;
        let height = rows
            .checked_mul(2)
            .and_then(|h| h.checked_add(1))
            .ok_or_else(|| exhausted.clone())?;
        let len = width.checked_mul(height).ok_or_else(|| exhausted.clone())?;

        let mut tiles = Vec::new();
        tiles.try_reserve_exact(len).map_err(|_| exhausted)?;
        for y in 0..height {
            for x in 0..width {
                let border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                let pillar = x % 2 == 0 && y % 2 == 0;
                tiles.push(if border || pillar {
                    Tile::Wall
                } else {
                    Tile::Unpathed
                });
            }
        }

        let mut field = Field {
            width,
            height,
            tiles,
        };
        field.set(field.entrance(), Tile::Solution);
        field.set(field.exit_opening(), Tile::Solution);
        Ok(field)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cell rows the field was built with.
    pub fn rows(&self) -> usize {
        (self.height - 1) / 2
    }

    /// Number of cell columns the field was built with.
    pub fn cols(&self) -> usize {
        (self.width - 1) / 2
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        if pos.x < self.width && pos.y < self.height {
            Some(pos.y * self.width + pos.x)
        } else {
            None
        }
    }

    pub fn get(&self, pos: Pos) -> Option<Tile> {
        self.index(pos).map(|idx| self.tiles[idx])
    }

    /// Overwrites the tile at `pos`. Out-of-bounds positions are ignored.
    pub fn set(&mut self, pos: Pos, tile: Tile) {
        if let Some(idx) = self.index(pos) {
            self.tiles[idx] = tile;
        }
    }

    /// Moves `distance` cells from `pos`, or `None` when that leaves the field.
    pub fn step(&self, pos: Pos, dir: Dir, distance: usize) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        let distance = distance as isize;
        let nx = pos.x as isize + dx * distance;
        let ny = pos.y as isize + dy * distance;
        if nx < 0 || ny < 0 {
            return None;
        }
        let next = Pos::new(nx as usize, ny as usize);
        self.index(next).map(|_| next)
    }

    /// Opening in the top border.
    pub fn entrance(&self) -> Pos {
        Pos::new(1, 0)
    }

    /// Opening in the bottom border, below the exit cell.
    pub fn exit_opening(&self) -> Pos {
        Pos::new(self.width - 2, self.height - 1)
    }

    /// Cell centre the solve starts from.
    pub fn start_cell(&self) -> Pos {
        Pos::new(1, 1)
    }

    /// Cell centre the solve has to reach.
    pub fn exit_cell(&self) -> Pos {
        Pos::new(self.width - 2, self.height - 2)
    }

    pub fn is_pillar(&self, pos: Pos) -> bool {
        pos.x % 2 == 0 && pos.y % 2 == 0
    }

    /// True for odd/odd coordinates strictly inside the border.
    pub fn is_cell_center(&self, pos: Pos) -> bool {
        pos.x % 2 == 1 && pos.y % 2 == 1 && pos.x < self.width - 1 && pos.y < self.height - 1
    }

    /// Cell centres in raster order.
    pub fn cell_centers(&self) -> impl Iterator<Item = Pos> {
        let (width, height) = (self.width, self.height);
        (1..height - 1)
            .step_by(2)
            .flat_map(move |y| (1..width - 1).step_by(2).map(move |x| Pos::new(x, y)))
    }

    pub fn tile_rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.tiles.chunks(self.width)
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_are_odd() {
        let field = Field::new(3, 5).unwrap();
        assert_eq!(field.width(), 11);
        assert_eq!(field.height(), 7);
        assert_eq!(field.rows(), 3);
        assert_eq!(field.cols(), 5);
        assert_eq!(field.tile_rows().count(), 7);
        assert!(field.tile_rows().all(|row| row.len() == 11));
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert_eq!(
            Field::new(0, 4),
            Err(MazeError::InvalidDimensions { rows: 0, cols: 4 })
        );
        assert_eq!(
            Field::new(4, 0),
            Err(MazeError::InvalidDimensions { rows: 4, cols: 0 })
        );
    }

    #[test]
    fn border_pillars_and_openings() {
        let field = Field::new(4, 6).unwrap();
        for y in 0..field.height() {
            for x in 0..field.width() {
                let pos = Pos::new(x, y);
                let border = x == 0 || y == 0 || x == field.width() - 1 || y == field.height() - 1;
                let expected = if pos == field.entrance() || pos == field.exit_opening() {
                    Tile::Solution
                } else if border || field.is_pillar(pos) {
                    Tile::Wall
                } else {
                    Tile::Unpathed
                };
                assert_eq!(field.get(pos), Some(expected), "at {:?}", pos);
            }
        }
    }

    #[test]
    fn overflowing_dimensions_report_exhaustion() {
        let huge = usize::MAX / 2;
        assert_eq!(
            Field::new(huge, 1),
            Err(MazeError::ResourceExhausted { rows: huge, cols: 1 })
        );
        assert_eq!(
            Field::new(1 << 40, 1 << 40),
            Err(MazeError::ResourceExhausted {
                rows: 1 << 40,
                cols: 1 << 40
            })
        );
    }

    #[test]
    fn failed_allocation_reports_exhaustion() {
        // Fits in usize but no allocator can hand out ~4 EiB.
        let rows = 1 << 30;
        let cols = 1 << 30;
        assert_eq!(
            Field::new(rows, cols),
            Err(MazeError::ResourceExhausted { rows, cols })
        );
    }

    #[test]
    fn step_stays_in_bounds() {
        let field = Field::new(2, 2).unwrap();
        let origin = Pos::new(1, 1);
        assert_eq!(field.step(origin, Dir::Up, 1), Some(Pos::new(1, 0)));
        assert_eq!(field.step(origin, Dir::Up, 2), None);
        assert_eq!(field.step(origin, Dir::Right, 2), Some(Pos::new(3, 1)));
        assert_eq!(field.step(origin, Dir::Right, 4), None);
        assert_eq!(field.step(origin, Dir::Left, 2), None);
        assert_eq!(field.step(origin, Dir::Down, 3), Some(Pos::new(1, 4)));
    }

    #[test]
    fn rotation_wraps_both_ways() {
        assert_eq!(Dir::Up.rotated(1), Dir::Right);
        assert_eq!(Dir::Up.rotated(-1), Dir::Left);
        assert_eq!(Dir::Left.rotated(1), Dir::Up);
        assert_eq!(Dir::Down.rotated(-3), Dir::Left);
        assert_eq!(Dir::Right.rotated(4), Dir::Right);
    }

    #[test]
    fn cell_centers_are_raster_ordered() {
        let field = Field::new(2, 3).unwrap();
        let centers: Vec<Pos> = field.cell_centers().collect();
        assert_eq!(
            centers,
            vec![
                Pos::new(1, 1),
                Pos::new(3, 1),
                Pos::new(5, 1),
                Pos::new(1, 3),
                Pos::new(3, 3),
                Pos::new(5, 3),
            ]
        );
        assert!(centers.iter().all(|&p| field.is_cell_center(p)));
        assert!(!field.is_cell_center(Pos::new(2, 1)));
        assert!(!field.is_cell_center(Pos::new(7, 1)));
    }

    #[test]
    fn set_ignores_out_of_bounds() {
        let mut field = Field::new(1, 1).unwrap();
        let before = field.clone();
        field.set(Pos::new(10, 10), Tile::Branch);
        assert_eq!(field, before);
    }
}
