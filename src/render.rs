use crate::field::{Field, Pos, Tile};
use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::QueueableCommand;
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;

/// Terminal columns per maze cell.
pub const CELL_W: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Glyph {
    Wall,
    Solution,
    Blank,
    Traverser,
}

impl Glyph {
    pub fn text(self) -> &'static str {
        match self {
            Glyph::Wall => "██",
            Glyph::Solution => "░░",
            Glyph::Blank => "  ",
            Glyph::Traverser => "◆",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub glyph: Glyph,
    pub color: Color,
}

/// Display cell for a tile. Solution tiles only stand out when asked to.
pub fn cell_for(tile: Tile, show_solution: bool) -> Cell {
    match tile {
        Tile::Wall | Tile::Unpathed => Cell {
            glyph: Glyph::Wall,
            color: Color::White,
        },
        Tile::Solution if show_solution => Cell {
            glyph: Glyph::Solution,
            color: Color::Green,
        },
        Tile::Solution | Tile::Branch => Cell {
            glyph: Glyph::Blank,
            color: Color::Reset,
        },
    }
}

/// Glyph text padded to exactly [`CELL_W`] columns.
fn padded(glyph: Glyph) -> String {
    let text = glyph.text();
    let w = UnicodeWidthStr::width(text);
    let mut out = String::from(text);
    for _ in w..CELL_W {
        out.push(' ');
    }
    out
}

/// Renders the field as plain text, one line per row.
pub fn render_text(field: &Field, show_solution: bool) -> String {
    field
        .tile_rows()
        .map(|row| {
            row.iter()
                .map(|&tile| padded(cell_for(tile, show_solution).glyph))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes the field with terminal colours, one line per row.
pub fn draw<W: Write>(out: &mut W, field: &Field, show_solution: bool) -> io::Result<()> {
    for row in field.tile_rows() {
        for &tile in row {
            let cell = cell_for(tile, show_solution);
            out.queue(SetForegroundColor(cell.color))?;
            out.queue(Print(padded(cell.glyph)))?;
        }
        out.queue(ResetColor)?;
        out.queue(Print("\n"))?;
    }
    out.flush()
}

/// Top-left corner that centres `field` below a status line in a terminal of
/// `term` (columns, rows), or `None` when it does not fit.
pub fn layout(field: &Field, term: (u16, u16)) -> Option<(u16, u16)> {
    let (term_w, term_h) = term;
    let needed_w = field
        .width()
        .checked_mul(CELL_W)
        .and_then(|w| u16::try_from(w).ok())?;
    let needed_h = field
        .height()
        .checked_add(2)
        .and_then(|h| u16::try_from(h).ok())?;
    if term_w < needed_w || term_h < needed_h {
        return None;
    }
    Some(((term_w - needed_w) / 2, (term_h - needed_h) / 2 + 1))
}

/// Incremental renderer for watching a field being carved.
///
/// Only cells that changed since the previous frame are redrawn. The field
/// is centred in the terminal below a one-line status bar.
pub struct Renderer {
    last: Vec<Cell>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
    show_solution: bool,
}

impl Renderer {
    pub fn new(width: usize, height: usize, show_solution: bool) -> Self {
        Self {
            last: vec![
                Cell {
                    glyph: Glyph::Blank,
                    color: Color::Reset,
                };
                width * height
            ],
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
            show_solution,
        }
    }

    fn cell_at(&self, field: &Field, traverser: Option<Pos>, pos: Pos) -> Cell {
        if traverser == Some(pos) {
            return Cell {
                glyph: Glyph::Traverser,
                color: Color::Yellow,
            };
        }
        cell_for(field.get(pos).unwrap_or(Tile::Wall), self.show_solution)
    }

    /// Draws a frame sized to the current terminal.
    pub fn frame<W: Write>(
        &mut self,
        out: &mut W,
        field: &Field,
        traverser: Option<Pos>,
        hud: &str,
    ) -> io::Result<()> {
        let term = terminal::size()?;
        self.frame_in(out, term, field, traverser, hud)
    }

    /// Draws a frame into a terminal of `term` (columns, rows).
    pub fn frame_in<W: Write>(
        &mut self,
        out: &mut W,
        term: (u16, u16),
        field: &Field,
        traverser: Option<Pos>,
        hud: &str,
    ) -> io::Result<()> {
        let (term_w, term_h) = term;

        out.queue(MoveTo(0, 0))?;

        let Some((origin_x, origin_y)) = layout(field, term) else {
            out.queue(Clear(ClearType::All))?;
            let msg = format!(
                "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
                field.width().saturating_mul(CELL_W),
                field.height().saturating_add(2),
                term_w,
                term_h
            );
            out.queue(Print(msg))?;
            out.flush()?;
            self.needs_full = true;
            return Ok(());
        };

        if origin_x != self.origin_x || origin_y != self.origin_y {
            self.origin_x = origin_x;
            self.origin_y = origin_y;
            self.needs_full = true;
            out.queue(Clear(ClearType::All))?;
        }

        if self.needs_full || hud != self.last_hud {
            out.queue(MoveTo(self.origin_x, self.origin_y - 1))?;
            out.queue(SetForegroundColor(Color::White))?;
            out.queue(Clear(ClearType::CurrentLine))?;
            out.queue(Print(hud))?;
            out.queue(ResetColor)?;
            self.last_hud = hud.to_string();
        }

        for y in 0..field.height() {
            for x in 0..field.width() {
                let cell = self.cell_at(field, traverser, Pos::new(x, y));
                let idx = y * field.width() + x;
                if self.needs_full || cell != self.last[idx] {
                    self.last[idx] = cell;
                    self.draw_cell(out, x, y, cell)?;
                }
            }
        }
        self.needs_full = false;

        out.flush()
    }

    fn draw_cell<W: Write>(&self, out: &mut W, x: usize, y: usize, cell: Cell) -> io::Result<()> {
        // Only reached after `layout` checked the whole field fits on screen.
        let x_pos = self.origin_x + (x * CELL_W) as u16;
        let y_pos = self.origin_y + y as u16;
        out.queue(MoveTo(x_pos, y_pos))?;
        out.queue(SetForegroundColor(cell.color))?;
        out.queue(Print(padded(cell.glyph)))?;
        out.queue(ResetColor)?;
        Ok(())
    }

    /// Row just below the field, for trailing messages. `None` when that row
    /// is off the addressable screen.
    pub fn footer_row(&self, field: &Field) -> Option<u16> {
        u16::try_from(field.height())
            .ok()
            .and_then(|h| self.origin_y.checked_add(h))
    }

    pub fn origin_x(&self) -> u16 {
        self.origin_x
    }
}
