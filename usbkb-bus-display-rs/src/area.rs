//! Pixel rectangles and controller address windows.

/// Half-open pixel rectangle: `x1..x2` × `y1..y2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Area {
    pub x1: u16,
    pub y1: u16,
    pub x2: u16,
    pub y2: u16,
}

impl Area {
    pub const fn new(x1: u16, y1: u16, x2: u16, y2: u16) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Rectangle of `width` × `height` pixels with its top-left at `(x, y)`.
    pub const fn from_size(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self::new(x, y, x.saturating_add(width), y.saturating_add(height))
    }

    pub fn width(&self) -> u16 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u16 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        (self.x1..self.x2).contains(&x) && (self.y1..self.y2).contains(&y)
    }

    /// Smallest rectangle covering both areas. Empty areas are ignored.
    pub fn union(&self, other: &Area) -> Area {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Area {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Overlap of two areas, `None` when they do not overlap.
    pub fn intersection(&self, other: &Area) -> Option<Area> {
        let area = Area {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        (!area.is_empty()).then_some(area)
    }
}

/// Controller address window with **inclusive** bounds, in the units the
/// controller addresses (bytes, cells or pages once packing is applied).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Window {
    pub x1: u16,
    pub x2: u16,
    pub y1: u16,
    pub y2: u16,
}
