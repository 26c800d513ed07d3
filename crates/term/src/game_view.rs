//! GameView: maps a `core::GameSnapshot` into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.

use crate::core::{GameSnapshot, TileSnapshot};
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::types::{Phase, TerminalState, GRID_SIZE};

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Bridge status shown in the side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterStatusView {
    pub client_count: u16,
    pub controller_id: Option<usize>,
}

/// Per-frame extras that are not part of the game state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewContext<'a> {
    /// The previous move is still animating: new and merged tiles are highlighted.
    pub settling: bool,
    pub adapter: Option<&'a AdapterStatusView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorY {
    Center,
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Highlight {
    None,
    Spawned,
    Merged,
}

const BOARD_BG: Rgb = Rgb::new(187, 173, 160);
const EMPTY_BG: Rgb = Rgb::new(205, 193, 180);
const DARK_TEXT: Rgb = Rgb::new(119, 110, 101);
const LIGHT_TEXT: Rgb = Rgb::new(249, 246, 242);

/// A lightweight terminal renderer for the 2048 board.
pub struct GameView {
    /// Tile width in terminal columns.
    cell_w: u16,
    /// Tile height in terminal rows.
    cell_h: u16,
    /// Gap between tiles (columns; rows use half, at least 1 when non-zero).
    gap: u16,
    anchor_y: AnchorY,
}

impl Default for GameView {
    fn default() -> Self {
        // 7x3 keeps tiles roughly square with a centred label row.
        Self {
            cell_w: 7,
            cell_h: 3,
            gap: 1,
            anchor_y: AnchorY::Center,
        }
    }
}

impl GameView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w: cell_w.max(1),
            cell_h: cell_h.max(1),
            ..Self::default()
        }
    }

    pub fn with_anchor_y(mut self, anchor_y: AnchorY) -> Self {
        self.anchor_y = anchor_y;
        self
    }

    pub fn with_gap(mut self, gap: u16) -> Self {
        self.gap = gap;
        self
    }

    /// Board size including the border, in terminal cells.
    pub fn frame_size(&self) -> (u16, u16) {
        let n = GRID_SIZE as u16;
        let inner_w = n * self.cell_w + (n + 1) * self.gap;
        let inner_h = n * self.cell_h + (n + 1) * self.gap_y();
        (inner_w + 2, inner_h + 2)
    }

    /// Render the current game state into an existing framebuffer.
    ///
    /// This is the allocation-free hot path. Callers can reuse a framebuffer
    /// across frames and only resize when the terminal size changes.
    pub fn render_into(&self, snap: &GameSnapshot, viewport: Viewport, fb: &mut FrameBuffer) {
        self.render_into_with(snap, &ViewContext::default(), viewport, fb);
    }

    pub fn render_into_with(
        &self,
        snap: &GameSnapshot,
        ctx: &ViewContext<'_>,
        viewport: Viewport,
        fb: &mut FrameBuffer,
    ) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().cell(' '));

        let (frame_w, frame_h) = self.frame_size();
        let start_x = viewport.width.saturating_sub(frame_w) / 2;
        let start_y = match self.anchor_y {
            AnchorY::Center => viewport.height.saturating_sub(frame_h) / 2,
            AnchorY::Top => 0,
        };

        let board = CellStyle::new(BOARD_BG, BOARD_BG);
        let border = CellStyle::new(Rgb::new(200, 200, 200), Rgb::new(0, 0, 0));
        fb.fill_rect(start_x + 1, start_y + 1, frame_w - 2, frame_h - 2, ' ', board);
        fb.draw_box(start_x, start_y, frame_w, frame_h, border);

        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                let (x, y) = self.tile_origin(start_x, start_y, row, col);
                match snap.tile_at(row, col) {
                    Some(tile) => {
                        let highlight = highlight_for(tile, ctx.settling);
                        self.draw_tile(fb, x, y, tile.value, highlight);
                    }
                    None => self.draw_empty(fb, x, y),
                }
            }
        }

        self.draw_side_panel(fb, snap, ctx, viewport, start_x, start_y, frame_w, frame_h);

        match snap.terminal {
            TerminalState::Won => self.draw_overlay(
                fb,
                start_x,
                start_y,
                frame_w,
                frame_h,
                "YOU WIN!",
                "c keep playing  n new game",
            ),
            TerminalState::GameOver => self.draw_overlay(
                fb,
                start_x,
                start_y,
                frame_w,
                frame_h,
                "GAME OVER",
                "n new game",
            ),
            TerminalState::None => {}
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(&self, snap: &GameSnapshot, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, viewport, &mut fb);
        fb
    }

    pub fn render_with(
        &self,
        snap: &GameSnapshot,
        ctx: &ViewContext<'_>,
        viewport: Viewport,
    ) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into_with(snap, ctx, viewport, &mut fb);
        fb
    }

    /// Top-left terminal cell of the tile at (row, col).
    pub fn tile_origin(&self, start_x: u16, start_y: u16, row: usize, col: usize) -> (u16, u16) {
        let x = start_x + 1 + self.gap + (col as u16) * (self.cell_w + self.gap);
        let y = start_y + 1 + self.gap_y() + (row as u16) * (self.cell_h + self.gap_y());
        (x, y)
    }

    fn gap_y(&self) -> u16 {
        if self.gap == 0 {
            0
        } else {
            (self.gap / 2).max(1)
        }
    }

    fn draw_empty(&self, fb: &mut FrameBuffer, x: u16, y: u16) {
        let style = CellStyle::new(EMPTY_BG, EMPTY_BG);
        fb.fill_rect(x, y, self.cell_w, self.cell_h, ' ', style);
    }

    fn draw_tile(&self, fb: &mut FrameBuffer, x: u16, y: u16, value: u32, highlight: Highlight) {
        let (mut bg, fg) = tile_colors(value);
        let mut label = CellStyle::new(fg, bg);
        match highlight {
            Highlight::None => {}
            Highlight::Spawned => label = label.bold(),
            Highlight::Merged => {
                bg = bg.lighten(24);
                label = CellStyle::new(fg, bg).bold();
            }
        }

        fb.fill_rect(x, y, self.cell_w, self.cell_h, ' ', CellStyle::new(fg, bg));

        let mut digits = [0u8; 10];
        let text = crate::fb::format_u32(value, &mut digits);
        fb.put_str_centered(x, y + self.cell_h / 2, self.cell_w, text, label);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_side_panel(
        &self,
        fb: &mut FrameBuffer,
        snap: &GameSnapshot,
        ctx: &ViewContext<'_>,
        viewport: Viewport,
        start_x: u16,
        start_y: u16,
        frame_w: u16,
        frame_h: u16,
    ) {
        let panel_x = start_x.saturating_add(frame_w).saturating_add(2);
        if panel_x >= viewport.width {
            return;
        }
        let panel_w = viewport.width - panel_x;
        if panel_w < 10 {
            return;
        }

        let label = CellStyle::default().bold();
        let value = CellStyle::new(Rgb::new(200, 200, 200), Rgb::new(0, 0, 0));
        let dim = value.dim();

        let mut y = start_y;
        fb.put_str(panel_x, y, "SCORE", label);
        y = y.saturating_add(1);
        fb.put_u32(panel_x, y, snap.score, value);
        y = y.saturating_add(2);

        fb.put_str(panel_x, y, "MOVES", label);
        y = y.saturating_add(1);
        fb.put_u32(panel_x, y, snap.move_count, value);
        y = y.saturating_add(2);

        fb.put_str(panel_x, y, "BEST TILE", label);
        y = y.saturating_add(1);
        fb.put_u32(panel_x, y, snap.max_tile(), value);
        y = y.saturating_add(2);

        fb.put_str(panel_x, y, "STATUS", label);
        y = y.saturating_add(1);
        fb.put_str(panel_x, y, status_text(snap), value);
        y = y.saturating_add(2);

        if let Some(st) = ctx.adapter {
            fb.put_str(panel_x, y, "BRIDGE", label);
            y = y.saturating_add(1);
            fb.put_str(panel_x, y, "clients", dim);
            fb.put_u32(panel_x + 8, y, st.client_count as u32, value);
            y = y.saturating_add(1);
            fb.put_str(panel_x, y, "ctrl", dim);
            match st.controller_id {
                Some(id) => fb.put_u32(panel_x + 8, y, id as u32, value),
                None => fb.put_str(panel_x + 8, y, "-", value),
            }
        }

        // Key help along the bottom of the board when there is room.
        let help_y = start_y.saturating_add(frame_h).saturating_sub(1);
        if help_y > y && help_y < viewport.height && panel_w >= 18 {
            fb.put_str(panel_x, help_y, "arrows move  q quit", dim);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_overlay(
        &self,
        fb: &mut FrameBuffer,
        start_x: u16,
        start_y: u16,
        frame_w: u16,
        frame_h: u16,
        title: &str,
        hint: &str,
    ) {
        let box_w = frame_w.saturating_sub(4).max(hint.chars().count() as u16 + 2);
        let box_h = 5u16;
        let box_x = start_x + frame_w.saturating_sub(box_w) / 2;
        let box_y = start_y + frame_h.saturating_sub(box_h) / 2;

        let panel = CellStyle::new(LIGHT_TEXT, Rgb::new(40, 36, 32));
        fb.fill_rect(box_x, box_y, box_w, box_h, ' ', panel);
        fb.draw_box(box_x, box_y, box_w, box_h, panel);
        fb.put_str_centered(box_x, box_y + 1, box_w, title, panel.bold());
        fb.put_str_centered(box_x, box_y + 3, box_w, hint, panel.dim());
    }
}

fn highlight_for(tile: &TileSnapshot, settling: bool) -> Highlight {
    if !settling {
        Highlight::None
    } else if tile.is_merge_result {
        Highlight::Merged
    } else if tile.is_new {
        Highlight::Spawned
    } else {
        Highlight::None
    }
}

fn status_text(snap: &GameSnapshot) -> &'static str {
    match snap.phase {
        Phase::Idle => "IDLE",
        Phase::Won => "WON",
        Phase::GameOver => "GAME OVER",
        Phase::Playing if snap.won => "PLAYING ON",
        Phase::Playing => "PLAYING",
    }
}

/// Tile background and label colour by value.
pub fn tile_colors(value: u32) -> (Rgb, Rgb) {
    match value {
        2 => (Rgb::new(238, 228, 218), DARK_TEXT),
        4 => (Rgb::new(237, 224, 200), DARK_TEXT),
        8 => (Rgb::new(242, 177, 121), LIGHT_TEXT),
        16 => (Rgb::new(245, 149, 99), LIGHT_TEXT),
        32 => (Rgb::new(246, 124, 95), LIGHT_TEXT),
        64 => (Rgb::new(246, 94, 59), LIGHT_TEXT),
        128 => (Rgb::new(237, 207, 114), LIGHT_TEXT),
        256 => (Rgb::new(237, 204, 97), LIGHT_TEXT),
        512 => (Rgb::new(237, 200, 80), LIGHT_TEXT),
        1024 => (Rgb::new(237, 197, 63), LIGHT_TEXT),
        2048 => (Rgb::new(237, 194, 46), LIGHT_TEXT),
        _ => (Rgb::new(60, 58, 50), LIGHT_TEXT),
    }
}
