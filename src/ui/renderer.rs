/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Rasterize the world into a pixel canvas (1 column × ½ row per pixel)
///   2. Fold pixel pairs into `front` cells as upper-half blocks (fg = top, bg = bottom)
///   3. Draw HUD and text overlays on top
///   4. Compare each cell with `back` buffer (previous frame) and only emit
///      terminal commands for cells that changed, batched with `queue!`
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::geometry::{Aabb, BORDER, PADDLE_CORNER_WIDTH, WORLD_SIZE};
use crate::sim::world::{Outcome, Phase, WorldState};
use glam::Vec2;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// inter-row gap color on VTE terminals matches the cells.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
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

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Viewport: world ↔ terminal mapping
// ══════════════════════════════════════════════════════════════

const HUD_ROW: usize = 0;
const FIELD_ROW: usize = 1;
/// HUD on top, help line at the bottom.
const RESERVED_ROWS: usize = 2;

/// Where the playfield sits on the terminal. One pixel is one column wide
/// and half a row tall, which is close to square on common fonts.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Viewport {
    /// Terminal column of the field's left edge.
    pub col: usize,
    /// Terminal row of the field's top edge.
    pub row: usize,
    /// Field width in pixels (= terminal columns).
    pub width: usize,
    /// Field height in terminal rows (= pixels / 2).
    pub rows: usize,
}

impl Viewport {
    /// Largest field with the world's aspect that fits the terminal, centered.
    pub fn fit(term_w: usize, term_h: usize) -> Self {
        let avail_rows = term_h.saturating_sub(RESERVED_ROWS).max(1);
        let aspect = WORLD_SIZE.x / WORLD_SIZE.y;
        let width = ((avail_rows * 2) as f32 * aspect).floor() as usize;
        let width = width.min(term_w).max(1);
        let px_h = (width as f32 / aspect).ceil() as usize;
        let rows = ((px_h + 1) / 2).clamp(1, avail_rows);
        Viewport {
            col: term_w.saturating_sub(width) / 2,
            row: FIELD_ROW,
            width,
            rows,
        }
    }

    pub fn pixel_height(&self) -> usize {
        self.rows * 2
    }

    /// Pixels per world unit on each axis.
    pub fn scale(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 / WORLD_SIZE.x,
            self.pixel_height() as f32 / WORLD_SIZE.y,
        )
    }

    /// World x under a terminal column (pixel center). Columns outside the
    /// field map past the borders; the paddle clamps anyway.
    pub fn pointer_to_world(&self, column: u16) -> f32 {
        (column as f32 - self.col as f32 + 0.5) / self.scale().x
    }

    /// World x → terminal column.
    pub fn world_to_column(&self, x: f32) -> usize {
        let px = (x * self.scale().x).floor().max(0.0) as usize;
        self.col + px.min(self.width.saturating_sub(1))
    }
}

// ══════════════════════════════════════════════════════════════
// Colors
// ══════════════════════════════════════════════════════════════

type Rgb = (u8, u8, u8);

/// Resolve a texture / background reference: a color name or `#rrggbb`.
pub fn parse_color(name: &str) -> Option<Rgb> {
    let name = name.trim();
    if let Some(hex) = name.strip_prefix('#') {
        if hex.len() != 6 { return None; }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        return Some((channel(0)?, channel(2)?, channel(4)?));
    }
    let rgb = match name.to_lowercase().as_str() {
        "black" => (0, 0, 0),
        "white" => (235, 235, 235),
        "red" => (220, 50, 50),
        "green" => (60, 200, 80),
        "blue" => (60, 90, 230),
        "yellow" => (235, 210, 60),
        "cyan" => (60, 210, 220),
        "magenta" => (210, 70, 210),
        "orange" => (245, 140, 30),
        "purple" => (140, 70, 200),
        "pink" => (245, 130, 180),
        "brown" => (150, 90, 40),
        "navy" => (20, 30, 90),
        "grey" | "gray" => (140, 140, 150),
        "silver" => (190, 190, 200),
        "gold" => (230, 190, 50),
        _ => return None,
    };
    Some(rgb)
}

fn shade(rgb: Rgb, factor: f32) -> Color {
    let f = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
    Color::Rgb { r: f(rgb.0), g: f(rgb.1), b: f(rgb.2) }
}

/// Brightness for a brick with `hp` hit points left; worn bricks fade.
fn hit_point_shade(hp: Option<u32>) -> f32 {
    match hp {
        Some(hp) => (0.55 + 0.15 * hp as f32).min(1.0),
        None => 1.0,
    }
}

const BORDER_COLOR: Rgb = (90, 90, 110);
const DEFAULT_BG: Rgb = (10, 10, 20);
const DEFAULT_BRICK: Rgb = (235, 235, 235);
const PADDLE_COLOR: Rgb = (200, 200, 220);
const PADDLE_CORNER_COLOR: Rgb = (240, 160, 60);
const BALL_COLOR: Rgb = (255, 255, 255);
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const BANNER_BG: Color = Color::Rgb { r: 40, g: 40, b: 70 };

// ══════════════════════════════════════════════════════════════
// Canvas: pixel grid for the playfield
// ══════════════════════════════════════════════════════════════

struct Canvas {
    width: usize,
    height: usize,
    scale: Vec2,
    px: Vec<Color>,
}

/// Half-open pixel rectangle.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct PixelRect {
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
}

impl Canvas {
    fn new(vp: &Viewport, fill: Color) -> Self {
        let (width, height) = (vp.width, vp.pixel_height());
        Canvas { width, height, scale: vp.scale(), px: vec![fill; width * height] }
    }

    /// Pixel footprint of a world box; never empty, so tiny objects stay visible.
    fn rect_of(&self, b: &Aabb) -> PixelRect {
        let to_px = |v: f32, s: f32, max: usize| ((v * s).round().max(0.0) as usize).min(max);
        let x0 = to_px(b.min.x, self.scale.x, self.width.saturating_sub(1));
        let y0 = to_px(b.min.y, self.scale.y, self.height.saturating_sub(1));
        let x1 = to_px(b.max.x, self.scale.x, self.width).max(x0 + 1);
        let y1 = to_px(b.max.y, self.scale.y, self.height).max(y0 + 1);
        PixelRect { x0, x1, y0, y1 }
    }

    fn fill(&mut self, r: PixelRect, color: Color) {
        for y in r.y0..r.y1.min(self.height) {
            for x in r.x0..r.x1.min(self.width) {
                self.px[y * self.width + x] = color;
            }
        }
    }

    fn fill_box(&mut self, b: &Aabb, color: Color) -> PixelRect {
        let r = self.rect_of(b);
        self.fill(r, color);
        r
    }

    fn get(&self, x: usize, y: usize) -> Color {
        self.px[y * self.width + x]
    }
}

fn rasterize(world: &WorldState, vp: &Viewport) -> Canvas {
    let bg = parse_color(&world.background).unwrap_or(DEFAULT_BG);
    let mut canvas = Canvas::new(vp, shade(bg, 1.0));

    // ── Borders (left, right, top) ──
    let border = shade(BORDER_COLOR, 1.0);
    let (w, h) = (WORLD_SIZE.x, WORLD_SIZE.y);
    canvas.fill_box(&Aabb::new(Vec2::ZERO, Vec2::new(BORDER, h)), border);
    canvas.fill_box(&Aabb::new(Vec2::new(w - BORDER, 0.0), Vec2::new(w, h)), border);
    canvas.fill_box(&Aabb::new(Vec2::ZERO, Vec2::new(w, BORDER)), border);

    // ── Bricks ──
    for brick in &world.bricks {
        let rgb = parse_color(&brick.texture).unwrap_or(DEFAULT_BRICK);
        let factor = hit_point_shade(brick.hit_points());
        let r = canvas.fill_box(&brick.bounds, shade(rgb, factor));
        // Darker right edge keeps neighbours apart at low resolution.
        if r.x1 - r.x0 >= 3 {
            canvas.fill(PixelRect { x0: r.x1 - 1, ..r }, shade(rgb, factor * 0.6));
        }
    }

    // ── Paddle with its deflection corners ──
    let paddle = world.paddle.bounds();
    canvas.fill_box(&paddle, shade(PADDLE_COLOR, 1.0));
    let corner = Vec2::new(PADDLE_CORNER_WIDTH, 0.0);
    let left = Aabb::new(paddle.min, Vec2::new(paddle.min.x, paddle.max.y) + corner);
    let right = Aabb::new(Vec2::new(paddle.max.x, paddle.min.y) - corner, paddle.max);
    canvas.fill_box(&left, shade(PADDLE_CORNER_COLOR, 1.0));
    canvas.fill_box(&right, shade(PADDLE_CORNER_COLOR, 1.0));

    // ── Ball ──
    if world.ball.bounds().min.y < h {
        canvas.fill_box(&world.ball.bounds(), shade(BALL_COLOR, 1.0));
    }

    canvas
}

// ══════════════════════════════════════════════════════════════
// Renderer
// ══════════════════════════════════════════════════════════════

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    viewport: Viewport,
    last_phase: Option<Phase>,
    /// Terminal reports key Release events (kitty keyboard protocol).
    key_release: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            viewport: Viewport::fit(80, 24),
            last_phase: None,
            key_release: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        self.key_release = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.key_release {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                )
            )?;
        }
        log::info!("key release events: {}", self.key_release);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Whether held keys can be released explicitly instead of by timeout.
    pub fn reports_key_release(&self) -> bool {
        self.key_release
    }

    /// Current world ↔ terminal mapping, for mouse input.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, tw: usize, th: usize) {
        self.term_w = tw;
        self.term_h = th;
        self.front.resize(tw, th);
        self.back.resize(tw, th);
        self.viewport = Viewport::fit(tw, th);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Detect phase change → clear for clean transition
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        // Build front buffer
        self.front.clear();
        self.compose_hud(world);
        match world.phase {
            Phase::GameOver(outcome) => self.compose_end_screen(world, outcome),
            _ => {
                self.compose_field(world);
                match world.phase {
                    Phase::AwaitingLaunch => self.compose_launch_prompt(world),
                    Phase::LevelTransition => self.compose_level_banner(world),
                    _ => {}
                }
            }
        }
        self.compose_help();

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the
        // terminal's own default and leave line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
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

                // Set colors only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, w: &WorldState) {
        let p = &w.progress;
        let secs = p.seconds_elapsed as u64;
        let hud = format!(
            " Level {}/{} {}  │  ♥×{}  │  Score {}/{}  │  {:02}:{:02} ",
            p.level_index + 1,
            w.level_count(),
            w.level_name,
            p.lives,
            p.score,
            p.max_score_so_far,
            secs / 60,
            secs % 60,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_field(&mut self, w: &WorldState) {
        let vp = self.viewport;
        let canvas = rasterize(w, &vp);
        for r in 0..vp.rows {
            for x in 0..vp.width {
                let top = canvas.get(x, r * 2);
                let bottom = canvas.get(x, r * 2 + 1);
                self.front.set(vp.col + x, vp.row + r, Cell::new('▀', top, bottom));
            }
        }
    }

    /// Text centered on the playfield at a fraction of its height.
    fn put_centered(&mut self, at: f32, text: &str, fg: Color, bg: Color) {
        let vp = self.viewport;
        let len = text.chars().count();
        let col = vp.col + vp.width.saturating_sub(len) / 2;
        let row = vp.row + ((vp.rows as f32 * at) as usize).min(vp.rows.saturating_sub(1));
        self.front.put_str(col, row, text, fg, bg);
    }

    fn compose_launch_prompt(&mut self, w: &WorldState) {
        let text = if w.progress.lives == w.rules.lives && w.progress.score == 0 {
            " SPACE / click to launch "
        } else {
            " SPACE / click to serve "
        };
        self.put_centered(0.7, text, Color::Rgb { r: 255, g: 220, b: 50 }, BANNER_BG);
    }

    fn compose_level_banner(&mut self, w: &WorldState) {
        let title = format!("  Level {}: {}  ", w.progress.level_index + 1, w.level_name);
        let pad = " ".repeat(title.chars().count());
        let step = self.row_step();
        self.put_centered(0.45, &pad, Color::White, BANNER_BG);
        self.put_centered(0.45 + step, &title, Color::White, BANNER_BG);
        self.put_centered(0.45 + 2.0 * step, &pad, Color::White, BANNER_BG);
    }

    fn compose_end_screen(&mut self, w: &WorldState, outcome: Outcome) {
        let (headline, color) = match outcome {
            Outcome::Win => ("You WIN! Press Enter to start again!", Color::Rgb { r: 255, g: 220, b: 50 }),
            Outcome::Loss => ("GameOver! Press Enter to start again!", Color::Rgb { r: 255, g: 60, b: 60 }),
        };
        let inner = headline.chars().count() + 4;
        let top = format!("╔{}╗", "═".repeat(inner));
        let mid = format!("║  {headline}  ║");
        let bottom = format!("╚{}╝", "═".repeat(inner));
        self.put_centered(0.3, &top, color, Cell::BASE_BG);
        self.put_centered(0.3 + self.row_step(), &mid, color, Cell::BASE_BG);
        self.put_centered(0.3 + 2.0 * self.row_step(), &bottom, color, Cell::BASE_BG);

        let secs = w.progress.seconds_elapsed as u64;
        let score = format!("Final Score: {}   Time: {:02}:{:02}", w.progress.score, secs / 60, secs % 60);
        self.put_centered(0.3 + 4.0 * self.row_step(), &score, Color::White, Cell::BASE_BG);
    }

    /// Fraction of the field height taken by one terminal row.
    fn row_step(&self) -> f32 {
        1.0 / self.viewport.rows.max(1) as f32
    }

    fn compose_help(&mut self) {
        if self.term_h < 2 { return; }
        let help = " Mouse/←→/A-D: move  Space/click: launch  Enter: restart  Esc/Q: quit";
        self.front.put_str(0, self.term_h - 1, help, Color::DarkGrey, Cell::BASE_BG);
    }
}
