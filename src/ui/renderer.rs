/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the dashboard and track grid into the `front` buffer
///   2. Compare each cell with the `back` buffer (last flushed frame)
///   3. Queue terminal commands only for cells that changed
///   4. Flush once at the end, then swap front/back
///
/// Nothing reaches the terminal until step 4, so an interrupted or failed
/// compose leaves the last complete frame on screen.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::DisplayGrid;
use crate::domain::snapshot::{Player, Snapshot};
use crate::ui::palette::{Palette, Tint};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
    bold: bool,
}

impl Cell {
    /// Explicit background for every cell. Using the same value for
    /// `Clear(ClearType::All)` keeps untouched areas visually identical.
    const BASE_BG: Color = Color::Black;

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::Reset,
        bg: Cell::BASE_BG,
        bold: false,
    };

    /// Sentinel used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
        bold: false,
    };
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write `s` at (x, y), one column per char, clipped at the right edge.
    /// Returns the column after the last char written.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bold: bool) -> usize {
        let mut cx = x;
        for ch in s.chars() {
            self.set(cx, y, Cell { ch, fg, bg: Cell::BASE_BG, bold });
            cx += 1;
        }
        cx
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect::<String>().trim_end().to_string()
    }
}

// ── Dashboard: header + footer data for one frame ──

pub struct Dashboard<'a> {
    pub time_left: Option<i64>,
    pub players: &'a [Player],
    pub frames: u64,
    pub skipped: u64,
    pub last_error: Option<&'a str>,
}

impl<'a> Dashboard<'a> {
    pub fn for_snapshot(snap: &'a Snapshot) -> Self {
        Dashboard {
            time_left: snap.time_left,
            players: &snap.players,
            frames: 0,
            skipped: 0,
            last_error: None,
        }
    }
}

/// Cell geometry of the track view.
#[derive(Clone, Copy, Debug)]
pub struct Layout {
    /// Terminal columns per grid cell.
    pub cell_width: usize,
    /// First column of the right-hand half.
    pub split: usize,
}

// ── Renderer ──

const BORDER: &str = " | ";
const BORDER_FG: Color = Color::DarkGrey;
const TEXT_FG: Color = Color::White;
const DIM_FG: Color = Color::DarkGrey;
const ERROR_FG: Color = Color::Red;
const FALLBACK_SIZE: (u16, u16) = (80, 24);

pub struct Renderer<'p, W: Write> {
    writer: W,
    palette: &'p Palette,
    layout: Layout,
    front: FrameBuffer,
    back: FrameBuffer,
    /// Pinned size instead of querying the terminal (tests, dumb outputs).
    fixed_size: Option<(usize, usize)>,
    needs_clear: bool,
}

impl<'p> Renderer<'p, BufWriter<io::Stdout>> {
    pub fn stdout(palette: &'p Palette, layout: Layout) -> Self {
        Renderer::new(BufWriter::with_capacity(16384, io::stdout()), palette, layout)
    }
}

impl<'p, W: Write> Renderer<'p, W> {
    pub fn new(writer: W, palette: &'p Palette, layout: Layout) -> Self {
        Renderer {
            writer,
            palette,
            layout,
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            fixed_size: None,
            needs_clear: true,
        }
    }

    #[cfg(test)]
    fn with_size(writer: W, palette: &'p Palette, layout: Layout, w: usize, h: usize) -> Self {
        let mut r = Renderer::new(writer, palette, layout);
        r.fixed_size = Some((w, h));
        r
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.invalidate();
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            SetAttribute(Attribute::Reset),
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Force a full repaint on the next frame (e.g. after something else
    /// wrote to the terminal).
    pub fn invalidate(&mut self) {
        self.back.cells.fill(Cell::INVALID);
        self.needs_clear = true;
    }

    /// Single-message screen, used before the first snapshot arrives.
    pub fn status(&mut self, text: &str) -> io::Result<()> {
        self.begin_frame()?;
        self.front.put_str(0, 0, text, TEXT_FG, true);
        self.end_frame()
    }

    pub fn render(&mut self, grid: &DisplayGrid, dash: &Dashboard<'_>) -> io::Result<()> {
        self.begin_frame()?;
        self.compose(grid, dash);
        self.end_frame()
    }

    fn begin_frame(&mut self) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = self.size();
        if tw != self.front.width || th != self.front.height {
            self.front.resize(tw, th);
            self.back.resize(tw, th);
            self.invalidate();
        }
        if self.needs_clear {
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.needs_clear = false;
        }
        self.front.clear();
        Ok(())
    }

    fn end_frame(&mut self) -> io::Result<()> {
        self.flush_diff()?;
        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn size(&self) -> (usize, usize) {
        if let Some(size) = self.fixed_size {
            return size;
        }
        let (tw, th) = terminal::size().unwrap_or(FALLBACK_SIZE);
        (tw as usize, th as usize)
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::Reset;
        let mut last_bold = false;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        queue!(
            self.writer,
            SetAttribute(Attribute::NormalIntensity),
            SetForegroundColor(Color::Reset),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bold != last_bold {
                    let attr = if cell.bold { Attribute::Bold } else { Attribute::NormalIntensity };
                    queue!(self.writer, SetAttribute(attr))?;
                    // NormalIntensity can reset colors on some terminals
                    if !cell.bold {
                        queue!(self.writer, SetForegroundColor(cell.fg))?;
                    }
                    last_bold = cell.bold;
                }

                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, grid: &DisplayGrid, dash: &Dashboard<'_>) {
        let mut row = 0;

        // ── Dashboard ──
        let time_left = dash
            .time_left
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        self.front.put_str(0, row, &format!("Time Left: {time_left}"), TEXT_FG, true);
        row += 1;

        for player in dash.players {
            self.compose_player(player, row);
            row += 1;
        }
        row += 1;

        // ── Track ──
        // A split at either edge would only draw a doubled border.
        let split = Some(self.layout.split).filter(|&s| s > 0 && s < grid.width());
        for (gy, cells) in grid.rows().enumerate() {
            let y = row + gy;
            let mut x = self.front.put_str(0, y, BORDER, BORDER_FG, false);
            for (col, cell) in cells.iter().enumerate() {
                if Some(col) == split {
                    x = self.front.put_str(x, y, BORDER, BORDER_FG, false);
                }
                let Tint { fg, bold } = if cell.is_blank() {
                    Tint::NEUTRAL
                } else {
                    self.palette.resolve(cell.label())
                };
                x = self.front.put_str(x, y, &cell.padded(self.layout.cell_width), fg, bold);
                x = self.front.put_str(x, y, BORDER, BORDER_FG, false);
            }
        }
        row += grid.height() + 1;

        // ── Footer ──
        let stats = format!(" frames: {}  skipped: {}", dash.frames, dash.skipped);
        let x = self.front.put_str(0, row, &stats, DIM_FG, false);
        if let Some(err) = dash.last_error {
            self.front.put_str(x, row, &format!("  last error: {err}"), ERROR_FG, false);
        }
        row += 1;
        self.front.put_str(0, row, " q/Esc: quit", DIM_FG, false);
    }

    fn compose_player(&mut self, p: &Player, row: usize) {
        let token = p.car_token();
        let tint = self.palette.resolve(&token);
        let name = p.name.as_deref().unwrap_or("-");
        let score = p.score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());

        let x = self.front.put_str(0, row, &token, tint.fg, tint.bold);
        self.front.put_str(x, row, &format!(": {name}, Score: {score}"), TEXT_FG, false);
    }
}
