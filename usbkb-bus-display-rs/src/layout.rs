//! Logical-to-native pixel layout.
//!
//! A refresh starts from a logical [`Area`] (what the application drew, in
//! rotated coordinates) and ends as a series of controller windows holding
//! packed bytes. This module does the geometry in between:
//!
//! 1. [`native_area()`] rotates the area into panel coordinates and widens it
//!    to whole controller cells.
//! 2. [`tiles()`] splits it into bands that fit one window write.
//! 3. [`window_for()`] and [`pack_tile()`] produce the address window and the
//!    payload for each band.

use crate::area::{Area, Window};
use crate::config::{DisplayCommands, DisplayGeometry, Rotation};

/// Largest pixel payload sent in a single window write.
pub const MAX_WINDOW_BYTES: usize = 512;

/// Rows per SH1107 page.
pub const PAGE_HEIGHT: u16 = 8;

/// Anything that can answer "what value does logical pixel (x, y) have".
///
/// Values are raw pixel words in the panel's colour depth; bits above the
/// depth are ignored.
pub trait PixelSource {
    /// Logical `(width, height)` the source covers.
    fn size(&self) -> (u16, u16);

    /// Pixel value at logical `(x, y)`. Only called inside [`size()`](Self::size).
    fn pixel(&self, x: u16, y: u16) -> u16;
}

// ── Rotation ─────────────────────────────────────────────────────────────

/// Map a logical area (already clipped to the geometry) into native panel
/// coordinates.
pub fn rotate_area(geometry: &DisplayGeometry, area: &Area) -> Area {
    let (nw, nh) = geometry.native_size();
    match geometry.rotation {
        Rotation::Rotate0 => *area,
        Rotation::Rotate90 => Area::new(nw - area.y2, area.x1, nw - area.y1, area.x2),
        Rotation::Rotate180 => Area::new(nw - area.x2, nh - area.y2, nw - area.x1, nh - area.y1),
        Rotation::Rotate270 => Area::new(area.y1, nh - area.x2, area.y2, nh - area.x1),
    }
}

/// Logical coordinates of native pixel `(px, py)`, `None` outside the panel.
pub fn native_to_logical(geometry: &DisplayGeometry, px: u16, py: u16) -> Option<(u16, u16)> {
    let (nw, nh) = geometry.native_size();
    if px >= nw || py >= nh {
        return None;
    }
    Some(match geometry.rotation {
        Rotation::Rotate0 => (px, py),
        Rotation::Rotate90 => (py, nw - 1 - px),
        Rotation::Rotate180 => (nw - 1 - px, nh - 1 - py),
        Rotation::Rotate270 => (nh - 1 - py, px),
    })
}

// ── Cells ────────────────────────────────────────────────────────────────

/// Native pixels per addressable unit along `(x, y)`.
fn cell_units(geometry: &DisplayGeometry, commands: &DisplayCommands) -> (u16, u16) {
    let cell = geometry.pixels_per_cell();
    let (x_unit, y_unit) = match (geometry.is_packed(), geometry.pixels_in_byte_share_row) {
        (true, true) => (cell, 1),
        (true, false) => (1, cell),
        (false, _) => (1, 1),
    };
    if commands.sh1107_addressing {
        (x_unit, y_unit.max(PAGE_HEIGHT))
    } else {
        (x_unit, y_unit)
    }
}

/// Rotate a clipped logical area into native coordinates and widen it to
/// whole controller cells (pages for SH1107 addressing).
pub fn native_area(
    geometry: &DisplayGeometry,
    commands: &DisplayCommands,
    logical: &Area,
) -> Area {
    let native = rotate_area(geometry, logical);
    let (x_unit, y_unit) = cell_units(geometry, commands);
    Area {
        x1: native.x1 / x_unit * x_unit,
        y1: native.y1 / y_unit * y_unit,
        x2: native.x2.div_ceil(x_unit) * x_unit,
        y2: native.y2.div_ceil(y_unit) * y_unit,
    }
}

/// Bytes needed for a `width` × `height` native tile.
pub fn packed_len(geometry: &DisplayGeometry, width: u16, height: u16) -> usize {
    let bits = width as usize * height as usize * geometry.color_depth as usize;
    bits.div_ceil(8)
}

// ── Tiling ───────────────────────────────────────────────────────────────

/// Iterator over the window-sized bands of a native area, row-major.
#[derive(Debug, Clone)]
pub struct Tiles {
    area: Area,
    tile_width: u16,
    tile_height: u16,
    x: u16,
    y: u16,
}

impl Iterator for Tiles {
    type Item = Area;

    fn next(&mut self) -> Option<Area> {
        if self.area.is_empty() || self.y >= self.area.y2 {
            return None;
        }
        let tile = Area::new(
            self.x,
            self.y,
            self.x.saturating_add(self.tile_width).min(self.area.x2),
            self.y.saturating_add(self.tile_height).min(self.area.y2),
        );
        self.x = tile.x2;
        if self.x >= self.area.x2 {
            self.x = self.area.x1;
            self.y = tile.y2;
        }
        Some(tile)
    }
}

/// Split a cell-aligned native area into tiles of at most
/// [`MAX_WINDOW_BYTES`] each.
///
/// With SH1107 addressing every tile is exactly one page tall, since the
/// controller only auto-increments within a page. Otherwise tiles span the
/// full area width and as many cell rows as fit, falling back to narrower
/// tiles when a single cell row is already too large.
pub fn tiles(geometry: &DisplayGeometry, commands: &DisplayCommands, native: Area) -> Tiles {
    let (x_unit, y_unit) = cell_units(geometry, commands);
    let (x_unit, y_unit) = (x_unit as usize, y_unit as usize);
    let depth = geometry.color_depth as usize;
    let max_bits = MAX_WINDOW_BYTES * 8;

    let width = native.width() as usize;
    let tile_width = if width * y_unit * depth <= max_bits {
        width
    } else {
        (max_bits / (y_unit * depth)) / x_unit * x_unit
    }
    .max(x_unit);

    let tile_height = if commands.sh1107_addressing {
        y_unit
    } else {
        (max_bits / (tile_width * depth)) / y_unit * y_unit
    }
    .max(y_unit);

    Tiles {
        area: native,
        tile_width: tile_width as u16,
        tile_height: tile_height as u16,
        x: native.x1,
        y: native.y1,
    }
}

// ── Windows and packing ──────────────────────────────────────────────────

/// Controller address window for a native tile.
///
/// Offsets are added first, then the packed axis collapses to cell units,
/// then the end bound becomes inclusive.
pub fn window_for(geometry: &DisplayGeometry, tile: &Area) -> Window {
    let mut x1 = tile.x1 + geometry.colstart;
    let mut x2 = tile.x2 + geometry.colstart;
    let mut y1 = tile.y1 + geometry.rowstart;
    let mut y2 = tile.y2 + geometry.rowstart;

    if geometry.is_packed() {
        let cell = geometry.pixels_per_cell();
        if geometry.pixels_in_byte_share_row {
            x1 /= cell;
            x2 /= cell;
        } else {
            y1 /= cell;
            y2 /= cell;
        }
    }

    Window {
        x1,
        x2: x2.saturating_sub(1),
        y1,
        y2: y2.saturating_sub(1),
    }
}

/// Pack the pixels of a native tile into `buf` in the controller's byte
/// layout. Returns the number of bytes written.
///
/// Native pixels with no logical counterpart in `source` are sent as 0.
/// `buf` must hold at least [`packed_len()`] bytes for the tile; tiles from
/// [`tiles()`] always fit in [`MAX_WINDOW_BYTES`].
pub fn pack_tile<S>(geometry: &DisplayGeometry, source: &S, tile: &Area, buf: &mut [u8]) -> usize
where
    S: PixelSource + ?Sized,
{
    let len = packed_len(geometry, tile.width(), tile.height());
    let out = &mut buf[..len];
    out.fill(0);

    let (source_width, source_height) = source.size();
    let depth = geometry.color_depth as u16;
    let width = tile.width() as usize;

    for py in tile.y1..tile.y2 {
        for px in tile.x1..tile.x2 {
            let value = match native_to_logical(geometry, px, py) {
                Some((lx, ly)) if lx < source_width && ly < source_height => source.pixel(lx, ly),
                _ => 0,
            };
            let col = (px - tile.x1) as usize;
            let row = (py - tile.y1) as usize;

            match geometry.color_depth {
                16 => {
                    let index = (row * width + col) * 2;
                    let bytes = if geometry.reverse_pixels_in_word {
                        value.to_be_bytes()
                    } else {
                        value.to_le_bytes()
                    };
                    out[index..index + 2].copy_from_slice(&bytes);
                }
                8 => out[row * width + col] = value as u8,
                _ => {
                    if value == 0 {
                        continue;
                    }
                    let per_byte = geometry.pixels_per_byte() as usize;
                    // Vertical bytes fill page by page, each page spanning the tile width.
                    let offset = if geometry.pixels_in_byte_share_row {
                        row * width + col
                    } else {
                        (row / per_byte) * width * per_byte + col * per_byte + row % per_byte
                    };
                    let mut shift = (offset % per_byte) as u16 * depth;
                    if geometry.reverse_pixels_in_byte {
                        shift = 8 - depth - shift;
                    }
                    let mask = (1u16 << depth) - 1;
                    out[offset / per_byte] |= ((value & mask) << shift) as u8;
                }
            }
        }
    }
    len
}
