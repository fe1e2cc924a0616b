//! 1 bpp frame buffer with dirty-area tracking.

use core::convert::Infallible;

use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::{DrawTarget, OriginDimensions, Pixel, Size},
};

use crate::area::Area;
use crate::error::ConfigError;
use crate::layout::PixelSource;

/// Monochrome frame buffer in logical coordinates, `N` bytes of storage.
///
/// Pixels are stored row-major, one bit each. Every write grows the dirty
/// area, which [`take_dirty()`](Self::take_dirty) hands to the next refresh.
///
/// Implements [`DrawTarget`] so anything from `embedded-graphics` can be
/// drawn into it, and [`PixelSource`] so it can be refreshed directly.
#[derive(Debug, Clone)]
pub struct MonoFrameBuffer<const N: usize> {
    buffer: [u8; N],
    width: u16,
    height: u16,
    dirty: Area,
}

impl<const N: usize> MonoFrameBuffer<N> {
    /// Blank buffer of `width` × `height` pixels, fully dirty.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidGeometry`] for a zero dimension or when `N`
    /// bytes cannot hold the pixels.
    pub fn new(width: u16, height: u16) -> Result<Self, ConfigError> {
        let bytes = (width as usize * height as usize).div_ceil(8);
        if width == 0 || height == 0 || bytes > N {
            return Err(ConfigError::InvalidGeometry);
        }
        Ok(Self {
            buffer: [0; N],
            width,
            height,
            dirty: Area::from_size(0, 0, width, height),
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn bounds(&self) -> Area {
        Area::from_size(0, 0, self.width, self.height)
    }

    /// Set one pixel. Out-of-bounds coordinates are ignored.
    pub fn set_pixel(&mut self, x: u16, y: u16, on: bool) {
        let Some((index, mask)) = self.bit(x, y) else {
            return;
        };
        let byte = &mut self.buffer[index];
        let was_on = *byte & mask != 0;
        if was_on == on {
            return;
        }
        if on {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
        self.dirty = self.dirty.union(&Area::from_size(x, y, 1, 1));
    }

    /// `true` if the pixel is lit. Out-of-bounds pixels are off.
    pub fn pixel(&self, x: u16, y: u16) -> bool {
        self.bit(x, y)
            .is_some_and(|(index, mask)| self.buffer[index] & mask != 0)
    }

    /// Set every pixel and mark the whole buffer dirty.
    pub fn fill(&mut self, on: bool) {
        self.buffer.fill(if on { 0xFF } else { 0x00 });
        self.mark_all_dirty();
    }

    /// Add `area`, clipped to the buffer, to the dirty area.
    pub fn mark_dirty(&mut self, area: Area) {
        if let Some(area) = area.intersection(&self.bounds()) {
            self.dirty = self.dirty.union(&area);
        }
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty = self.bounds();
    }

    /// Area changed since the last call, `None` if nothing changed.
    pub fn take_dirty(&mut self) -> Option<Area> {
        let dirty = core::mem::take(&mut self.dirty);
        (!dirty.is_empty()).then_some(dirty)
    }

    fn bit(&self, x: u16, y: u16) -> Option<(usize, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bit = y as usize * self.width as usize + x as usize;
        Some((bit / 8, 1 << (bit % 8)))
    }
}

impl<const N: usize> PixelSource for MonoFrameBuffer<N> {
    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn pixel(&self, x: u16, y: u16) -> u16 {
        MonoFrameBuffer::pixel(self, x, y) as u16
    }
}

impl<const N: usize> OriginDimensions for MonoFrameBuffer<N> {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl<const N: usize> DrawTarget for MonoFrameBuffer<N> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u16::try_from(point.x), u16::try_from(point.y)) {
                self.set_pixel(x, y, color.is_on());
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color.is_on());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::{
        prelude::*,
        primitives::{PrimitiveStyle, Rectangle},
    };

    type Buffer = MonoFrameBuffer<512>;

    #[test]
    fn rejects_geometry_that_does_not_fit() {
        assert!(Buffer::new(128, 32).is_ok());
        assert_eq!(Buffer::new(128, 33).unwrap_err(), ConfigError::InvalidGeometry);
        assert_eq!(Buffer::new(0, 8).unwrap_err(), ConfigError::InvalidGeometry);
    }

    #[test]
    fn starts_blank_and_fully_dirty() {
        let mut fb = Buffer::new(128, 32).unwrap();
        assert!(!fb.pixel(0, 0));
        assert_eq!(fb.take_dirty(), Some(Area::new(0, 0, 128, 32)));
        assert_eq!(fb.take_dirty(), None);
    }

    #[test]
    fn set_pixel_grows_dirty_area() {
        let mut fb = Buffer::new(128, 32).unwrap();
        fb.take_dirty();

        fb.set_pixel(5, 2, true);
        fb.set_pixel(9, 20, true);
        assert!(fb.pixel(5, 2));
        assert_eq!(PixelSource::pixel(&fb, 9, 20), 1);
        assert_eq!(fb.take_dirty(), Some(Area::new(5, 2, 10, 21)));

        // Writing the same value is not a change.
        fb.set_pixel(5, 2, true);
        assert_eq!(fb.take_dirty(), None);

        fb.set_pixel(5, 2, false);
        assert!(!fb.pixel(5, 2));
        assert_eq!(fb.take_dirty(), Some(Area::new(5, 2, 6, 3)));
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut fb = Buffer::new(16, 8).unwrap();
        fb.take_dirty();
        fb.set_pixel(16, 0, true);
        Pixel(Point::new(-1, 0), BinaryColor::On).draw(&mut fb).unwrap();
        assert!(!fb.pixel(16, 0));
        assert_eq!(fb.take_dirty(), None);
    }

    #[test]
    fn draws_with_embedded_graphics() {
        let mut fb = Buffer::new(128, 32).unwrap();
        fb.take_dirty();

        Rectangle::new(Point::new(2, 3), Size::new(4, 2))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut fb)
            .unwrap();

        assert!(fb.pixel(2, 3));
        assert!(fb.pixel(5, 4));
        assert!(!fb.pixel(6, 4));
        assert_eq!(fb.take_dirty(), Some(Area::new(2, 3, 6, 5)));
        assert_eq!(PixelSource::size(&fb), (128, 32));
        assert_eq!(OriginDimensions::size(&fb), Size::new(128, 32));
    }

    #[test]
    fn mark_dirty_is_clipped() {
        let mut fb = Buffer::new(16, 8).unwrap();
        fb.take_dirty();
        fb.mark_dirty(Area::new(12, 4, 40, 40));
        fb.mark_dirty(Area::new(20, 0, 30, 2));
        assert_eq!(fb.take_dirty(), Some(Area::new(12, 4, 16, 8)));
    }

    #[test]
    fn clear_fills_and_marks_everything() {
        let mut fb = Buffer::new(16, 8).unwrap();
        fb.take_dirty();
        fb.clear(BinaryColor::On).unwrap();
        assert!(fb.pixel(15, 7));
        assert_eq!(fb.take_dirty(), Some(fb.bounds()));
    }
}
