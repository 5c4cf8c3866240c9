//! Terminal presentation.
//!
//! The world is drawn into a [`PixelBuf`] whose pixels are half a terminal
//! cell tall, then flushed with `▀` characters: foreground colour for the top
//! pixel, background for the bottom one. World units map to pixels with
//! independent x and y scale factors, so the whole playfield always fits.

use crate::bird::BIRD_SIZE;
use crate::engine::Game;
use crate::pipe::{PIPE_WIDTH, Pipe};
use crossterm::{cursor, queue, style::{self, Color as CColor}};
use rand::Rng;
use std::io::{self, Write};
use std::time::{Duration, Instant};

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    const fn lerp(a: Rgb, b: Rgb, t_256: u16) -> Rgb {
        let t = t_256 as i32;
        Rgb(
            (a.0 as i32 + (b.0 as i32 - a.0 as i32) * t / 256) as u8,
            (a.1 as i32 + (b.1 as i32 - a.1 as i32) * t / 256) as u8,
            (a.2 as i32 + (b.2 as i32 - a.2 as i32) * t / 256) as u8,
        )
    }

    const fn dim(self) -> Rgb {
        Rgb(self.0 / 2, self.1 / 2, self.2 / 2)
    }

    fn term(self) -> CColor {
        CColor::Rgb {
            r: self.0,
            g: self.1,
            b: self.2,
        }
    }
}

pub const SKY_TOP: Rgb = Rgb(70, 180, 200);
pub const SKY_BOT: Rgb = Rgb(190, 232, 245);
const PIPE_L: Rgb = Rgb(74, 122, 26);
const PIPE_M: Rgb = Rgb(100, 170, 40);
const PIPE_R: Rgb = Rgb(115, 191, 46);
const PIPE_HI: Rgb = Rgb(145, 215, 62);
const CAP_DARK: Rgb = Rgb(60, 100, 20);
pub const BIRD_Y: Rgb = Rgb(245, 200, 66);
const BIRD_HI: Rgb = Rgb(255, 225, 100);
const BIRD_WING: Rgb = Rgb(215, 165, 35);
const BIRD_EYE: Rgb = Rgb(255, 255, 255);
const BIRD_PUPIL: Rgb = Rgb(20, 20, 20);
const BIRD_BEAK: Rgb = Rgb(225, 75, 35);
const PANEL: Rgb = Rgb(210, 185, 110);
const PANEL_HI: Rgb = Rgb(220, 195, 120);
const GAME_OVER_RED: Rgb = Rgb(230, 40, 40);
const WHITE: Rgb = Rgb(255, 255, 255);
const SHADOW: Rgb = Rgb(30, 30, 30);

// ── Pixel buffer with half-block rendering ──────────────────────────────────

pub struct PixelBuf {
    w: usize,
    h: usize, // pixel height = terminal rows * 2
    px: Vec<Rgb>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![SKY_TOP; w * h],
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.resize(w * h, SKY_TOP);
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x + dx, y + dy, c);
            }
        }
    }

    /// Write the buffer to `out`, starting at the top-left cell.
    pub fn present(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        let mut prev_fg = Rgb(0, 0, 0);
        let mut prev_bg = Rgb(0, 0, 0);
        let mut need_fg = true;
        let mut need_bg = true;

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);

                if top == bot {
                    if need_bg || prev_bg != top {
                        queue!(out, style::SetBackgroundColor(top.term()))?;
                        prev_bg = top;
                        need_bg = false;
                    }
                    queue!(out, style::Print(' '))?;
                } else {
                    if need_fg || prev_fg != top {
                        queue!(out, style::SetForegroundColor(top.term()))?;
                        prev_fg = top;
                        need_fg = false;
                    }
                    if need_bg || prev_bg != bot {
                        queue!(out, style::SetBackgroundColor(bot.term()))?;
                        prev_bg = bot;
                        need_bg = false;
                    }
                    queue!(out, style::Print('\u{2580}'))?; // ▀
                }
            }
            if row + 1 < rows {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                need_fg = true;
                need_bg = true;
            }
        }
        queue!(out, style::ResetColor)?;
        out.flush()
    }
}

// ── 3x5 bitmap glyphs ──────────────────────────────────────────────────────

#[rustfmt::skip]
const DIGITS: [[u8; 15]; 10] = [
    [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // 0
    [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1], // 1
    [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1], // 2
    [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1], // 3
    [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1], // 4
    [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1], // 5
    [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1], // 6
    [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0], // 7
    [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1], // 8
    [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1], // 9
];

#[rustfmt::skip]
const LETTERS: [(char, [u8; 15]); 8] = [
    ('A', [0,1,0, 1,0,1, 1,1,1, 1,0,1, 1,0,1]),
    ('E', [1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,1,1]),
    ('G', [0,1,1, 1,0,0, 1,0,1, 1,0,1, 0,1,1]),
    ('M', [1,0,1, 1,1,1, 1,1,1, 1,0,1, 1,0,1]),
    ('O', [0,1,0, 1,0,1, 1,0,1, 1,0,1, 0,1,0]),
    ('R', [1,1,0, 1,0,1, 1,1,0, 1,0,1, 1,0,1]),
    ('V', [1,0,1, 1,0,1, 1,0,1, 1,0,1, 0,1,0]),
    (' ', [0; 15]),
];

fn draw_glyph(buf: &mut PixelBuf, x: i32, y: i32, glyph: &[u8; 15], fg: Rgb) {
    for row in 0..5 {
        for col in 0..3 {
            if glyph[row * 3 + col] == 1 {
                let px = x + col as i32;
                let py = y + row as i32;
                buf.set(px + 1, py + 1, SHADOW);
                buf.set(px, py, fg);
            }
        }
    }
}

fn draw_number(buf: &mut PixelBuf, cx: i32, y: i32, n: u32, fg: Rgb) {
    let s = n.to_string();
    let total_w = s.len() as i32 * 4 - 1; // 3px per digit + 1px spacing
    let start_x = cx - total_w / 2;
    for (i, ch) in s.bytes().enumerate() {
        let d = (ch - b'0') as usize;
        draw_glyph(buf, start_x + i as i32 * 4, y, &DIGITS[d], fg);
    }
}

fn draw_text(buf: &mut PixelBuf, cx: i32, y: i32, text: &str, fg: Rgb) {
    let total_w = text.len() as i32 * 4 - 1;
    let start_x = cx - total_w / 2;
    for (i, ch) in text.chars().enumerate() {
        if let Some((_, glyph)) = LETTERS.iter().find(|(c, _)| *c == ch) {
            draw_glyph(buf, start_x + i as i32 * 4, y, glyph, fg);
        }
    }
}

fn pipe_shade(x: i32, total_w: i32) -> Rgb {
    if total_w <= 1 {
        return PIPE_M;
    }
    let t = (x as f64 / (total_w - 1) as f64 * 256.0) as u16;
    if t < 64 {
        Rgb::lerp(PIPE_L, PIPE_M, (t * 4).min(256))
    } else if t < 100 {
        Rgb::lerp(PIPE_M, PIPE_HI, ((t - 64) * 7).min(256))
    } else if t < 160 {
        Rgb::lerp(PIPE_HI, PIPE_R, ((t - 100) * 4).min(256))
    } else {
        Rgb::lerp(PIPE_R, PIPE_L, ((t - 160) * 3).min(256))
    }
}

// ── Renderer ────────────────────────────────────────────────────────────────

/// World-to-pixel mapping for one frame.
#[derive(Debug, Clone, Copy)]
struct View {
    sx: f64,
    sy: f64,
}

impl View {
    fn x(&self, wx: f64) -> i32 {
        (wx * self.sx).floor() as i32
    }

    fn y(&self, wy: f64) -> i32 {
        (wy * self.sy).floor() as i32
    }

    fn w(&self, ww: f64) -> i32 {
        ((ww * self.sx).round() as i32).max(1)
    }

    fn h(&self, wh: f64) -> i32 {
        ((wh * self.sy).round() as i32).max(1)
    }
}

/// Draws a [`Game`] to a terminal and paces frames to the tick rate.
///
/// Rendering only ever borrows the game immutably.
pub struct Renderer<W: Write> {
    out: W,
    buf: PixelBuf,
    frame_dur: Option<Duration>,
    last_frame: Option<Instant>,
    frame: u64,
    best: u32,
}

impl<W: Write> Renderer<W> {
    /// Renderer for a `cols`×`rows` terminal, paced at `tick_rate` frames per second.
    pub fn new(out: W, cols: u16, rows: u16, tick_rate: u32) -> Self {
        let mut r = Self::unpaced(out, cols, rows);
        r.frame_dur = Some(Duration::from_secs_f64(1.0 / f64::from(tick_rate.max(1))));
        r
    }

    /// Renderer that never sleeps.
    pub fn unpaced(out: W, cols: u16, rows: u16) -> Self {
        Self {
            out,
            buf: PixelBuf::new(cols as usize, rows as usize * 2),
            frame_dur: None,
            last_frame: None,
            frame: 0,
            best: 0,
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.buf.resize(cols as usize, rows as usize * 2);
    }

    pub fn buffer(&self) -> &PixelBuf {
        &self.buf
    }

    /// Best score seen across every frame drawn so far.
    pub fn best(&self) -> u32 {
        self.best
    }

    /// Draw, flush and wait out the rest of the frame.
    pub fn render<R: Rng>(&mut self, game: &Game<R>, show_game_over: bool) -> io::Result<()> {
        self.draw(game, show_game_over);
        self.buf.present(&mut self.out)?;
        self.pace();
        Ok(())
    }

    /// Draw the frame into the pixel buffer without touching the terminal.
    pub fn draw<R: Rng>(&mut self, game: &Game<R>, show_game_over: bool) {
        self.frame += 1;
        self.best = self.best.max(game.score());
        if self.buf.w == 0 || self.buf.h == 0 {
            return;
        }

        let config = game.config();
        let view = View {
            sx: self.buf.w as f64 / config.screen_width,
            sy: self.buf.h as f64 / config.screen_height,
        };

        self.draw_sky();
        for pipe in game.pipes() {
            self.draw_pipe(view, pipe);
        }
        self.draw_bird(view, game);
        let cx = self.buf.w as i32 / 2;
        draw_number(&mut self.buf, cx, 2, game.score(), WHITE);

        if show_game_over {
            self.draw_game_over(game.score());
        }
    }

    fn pace(&mut self) {
        let Some(frame_dur) = self.frame_dur else {
            return;
        };
        if let Some(last) = self.last_frame {
            let elapsed = last.elapsed();
            if elapsed < frame_dur {
                std::thread::sleep(frame_dur - elapsed);
            }
        }
        self.last_frame = Some(Instant::now());
    }

    fn draw_sky(&mut self) {
        let h = self.buf.h;
        for y in 0..h {
            let t = ((y * 256) / h.max(1)) as u16;
            let c = Rgb::lerp(SKY_TOP, SKY_BOT, t);
            for x in 0..self.buf.w {
                self.buf.set(x as i32, y as i32, c);
            }
        }
    }

    fn draw_pipe(&mut self, view: View, pipe: &Pipe) {
        let px = view.x(pipe.x);
        let pw = view.w(PIPE_WIDTH);
        let gap_top = view.y(pipe.top_height);
        let gap_bot = view.y(pipe.gap_bottom());
        let floor = self.buf.h as i32;
        let cap_h = view.h(12.0).min(3);

        for x in 0..pw {
            let c = pipe_shade(x, pw);
            for y in 0..gap_top {
                self.buf.set(px + x, y, c);
            }
            for y in gap_bot..floor {
                self.buf.set(px + x, y, c);
            }
        }
        // Caps stay inside the collision box.
        for x in 0..pw {
            let c = Rgb::lerp(pipe_shade(x, pw), PIPE_HI, 96);
            for y in (gap_top - cap_h)..gap_top {
                self.buf.set(px + x, y, c);
            }
            for y in gap_bot..(gap_bot + cap_h) {
                self.buf.set(px + x, y, c);
            }
            self.buf.set(px + x, gap_top - 1, CAP_DARK);
            self.buf.set(px + x, gap_bot, CAP_DARK);
        }
    }

    fn draw_bird<R: Rng>(&mut self, view: View, game: &Game<R>) {
        let bird = game.bird();
        let half = BIRD_SIZE / 2.0;
        let left = view.x(bird.x - half);
        let top = view.y(bird.y - half);
        let bw = view.w(BIRD_SIZE);
        let bh = view.h(BIRD_SIZE);
        let buf = &mut self.buf;

        // Body fills the collision box exactly.
        buf.fill_rect(left, top, bw, bh, BIRD_Y);
        buf.fill_rect(left + 1, top, (bw - 2).max(1), 1, BIRD_HI);

        // Wing flaps while rising
        let wing_up = bird.velocity < 0.0 && self.frame % 8 < 4;
        let wing_y = top + bh / 2 + if wing_up { -1 } else { 0 };
        buf.fill_rect(left, wing_y, (bw / 3).max(1), 1, BIRD_WING);

        // Eye
        let ex = left + bw - 1 - (bw / 4).max(1);
        let ey = top + (bh / 4).min(bh - 1);
        buf.set(ex, ey, BIRD_EYE);
        buf.set(ex + 1, ey, BIRD_PUPIL);

        // Beak
        let tilt = if bird.velocity > 4.0 { 1 } else { 0 };
        buf.fill_rect(left + bw, top + bh / 2 + tilt, (bw / 4).max(1), 1, BIRD_BEAK);
    }

    fn draw_game_over(&mut self, score: u32) {
        let (w, h) = (self.buf.w, self.buf.h);

        // Dark overlay
        for y in 0..h {
            for x in 0..w {
                let c = self.buf.get(x, y).dim();
                self.buf.set(x as i32, y as i32, c);
            }
        }

        let cx = w as i32 / 2;
        let cy = h as i32 / 2;
        let panel_w = ((w as f64 * 0.6) as i32).max(38);
        let panel_h = 26;
        let px = cx - panel_w / 2;
        let py = cy - panel_h / 2;
        self.buf.fill_rect(px - 1, py - 1, panel_w + 2, panel_h + 2, SHADOW);
        self.buf.fill_rect(px, py, panel_w, panel_h, PANEL);
        self.buf
            .fill_rect(px + 1, py + 1, panel_w - 2, panel_h - 2, PANEL_HI);

        draw_text(&mut self.buf, cx, py + 3, "GAME OVER", GAME_OVER_RED);
        draw_number(&mut self.buf, cx, py + 11, score, WHITE);
        draw_number(&mut self.buf, cx, py + 18, self.best, BIRD_Y);
    }
}
