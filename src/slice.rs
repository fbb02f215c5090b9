//! Rectangular windows into a buffer or locked view, without copying.
//!
//! The area is validated once, when the slice is made. After that, the
//! checked accessors test coordinates against the area and the `unsafe`
//! `*_unchecked` accessors skip the test in release builds.
//!
//! ```rust
//! use pinpix::{PixelBuffer, Rect};
//! use rgb::Gray;
//!
//! let mut img = PixelBuffer::<Gray<u8>>::new(10, 10).unwrap();
//! let mut win = img.slice_mut(Rect::new(2, 3, 4, 2)).unwrap();
//! win.set(1, 3, Gray::new(9)).unwrap();
//! assert_eq!(img.get(4, 5).unwrap(), Gray::new(9));
//! ```

#![allow(unsafe_code)]

use core::fmt;

use crate::buffer::{PixelBuffer, PixelSource, PixelSourceMut};
use crate::color::Color;
use crate::error::{PixelError, Result};
use crate::geometry::Rect;

fn check_area(area: Rect, width: usize, height: usize) -> Result<()> {
    if area.fits_within(width, height) {
        Ok(())
    } else {
        Err(PixelError::InvalidArgument(format!(
            "area {}x{} at ({}, {}) exceeds {width}x{height} parent",
            area.width, area.height, area.x, area.y
        )))
    }
}

fn out_of_area(area: Rect, y: usize, x: usize) -> PixelError {
    PixelError::IndexOutOfRange {
        y,
        x,
        width: area.width,
        height: area.height,
    }
}

/// Shared window into packed pixels.
///
/// Two slices are equal when they view the same storage, with the same
/// length and row stride, through the same area; pixel values are not
/// compared. Zero-sized storage has no address of its own, so slices over
/// two distinct empty buffers of the same shape compare equal.
#[derive(Clone, Copy)]
pub struct Slice<'a, C: Color> {
    pixels: &'a [C],
    stride: usize,
    area: Rect,
}

impl<'a, C: Color> Slice<'a, C> {
    /// Window `area` of `parent`. Fails if the area leaves the parent.
    pub fn new<S>(parent: &'a S, area: Rect) -> Result<Self>
    where
        S: PixelSource<Pixel = C> + ?Sized,
    {
        check_area(area, parent.width(), parent.height())?;
        Ok(Self {
            pixels: parent.pixels(),
            stride: parent.width(),
            area,
        })
    }

    /// Window over storage whose rows are `stride` pixels apart.
    ///
    /// The caller has checked that every row of `area` lies inside `pixels`.
    pub(crate) fn from_parts(pixels: &'a [C], stride: usize, area: Rect) -> Self {
        debug_assert!(area.is_empty() || (area.y + area.height - 1) * stride + area.x + area.width <= pixels.len());
        Self {
            pixels,
            stride,
            area,
        }
    }

    /// Area in the parent's coordinates.
    #[inline]
    pub fn area(&self) -> Rect {
        self.area
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.area.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.area.height
    }

    /// Distance between row starts in the parent, in pixels.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    fn parent_index(&self, y: usize, x: usize) -> usize {
        (self.area.y + y) * self.stride + self.area.x + x
    }

    /// Pixel at slice-local `(y, x)`, checked against the area.
    pub fn get(&self, y: usize, x: usize) -> Result<C> {
        if y < self.area.height && x < self.area.width {
            Ok(self.pixels[self.parent_index(y, x)])
        } else {
            Err(out_of_area(self.area, y, x))
        }
    }

    /// Pixel at slice-local `(y, x)` with no area check in release builds.
    ///
    /// # Safety
    /// `y < height()` and `x < width()` must hold.
    #[inline]
    pub unsafe fn get_unchecked(&self, y: usize, x: usize) -> C {
        debug_assert!(y < self.area.height && x < self.area.width);
        // SAFETY: inside the area means inside the parent, checked at construction.
        unsafe { *self.pixels.get_unchecked(self.parent_index(y, x)) }
    }

    /// Row `y` of the window. Panics if `y >= height()`.
    pub fn row(&self, y: usize) -> &'a [C] {
        assert!(y < self.area.height, "row {y} outside {}-row slice", self.area.height);
        let start = self.parent_index(y, 0);
        &self.pixels[start..start + self.area.width]
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &'a [C]> + '_ {
        (0..self.area.height).map(move |y| self.row(y))
    }

    /// Parent storage from the window's top-left pixel to the end.
    #[cfg_attr(not(feature = "imgref"), allow(dead_code))]
    pub(crate) fn from_origin(&self) -> &'a [C] {
        &self.pixels[self.parent_index(0, 0)..]
    }

    /// Narrower window; `area` is relative to this slice.
    pub fn sub_slice(&self, area: Rect) -> Result<Slice<'a, C>> {
        check_area(area, self.area.width, self.area.height)?;
        Ok(Self {
            pixels: self.pixels,
            stride: self.stride,
            area: Rect::new(self.area.x + area.x, self.area.y + area.y, area.width, area.height),
        })
    }

    /// Copy the window into a new buffer.
    pub fn to_buffer(&self) -> Result<PixelBuffer<C>> {
        let mut out = Vec::with_capacity(self.area.width * self.area.height);
        for row in self.rows() {
            out.extend_from_slice(row);
        }
        PixelBuffer::from_vec(self.area.width, self.area.height, out)
    }
}

impl<C: Color> PartialEq for Slice<'_, C> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.pixels.as_ptr(), other.pixels.as_ptr())
            && self.pixels.len() == other.pixels.len()
            && self.stride == other.stride
            && self.area == other.area
    }
}

impl<C: Color> Eq for Slice<'_, C> {}

impl<C: Color> fmt::Debug for Slice<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slice")
            .field("storage", &self.pixels.as_ptr())
            .field("area", &self.area)
            .finish()
    }
}

/// Exclusive window into packed pixels. Writes land in the parent.
pub struct SliceMut<'a, C: Color> {
    pixels: &'a mut [C],
    stride: usize,
    area: Rect,
}

impl<'a, C: Color> SliceMut<'a, C> {
    /// Window `area` of `parent`. Fails if the area leaves the parent.
    pub fn new<S>(parent: &'a mut S, area: Rect) -> Result<Self>
    where
        S: PixelSourceMut<Pixel = C> + ?Sized,
    {
        check_area(area, parent.width(), parent.height())?;
        let stride = parent.width();
        Ok(Self {
            pixels: parent.pixels_mut(),
            stride,
            area,
        })
    }

    #[inline]
    pub fn area(&self) -> Rect {
        self.area
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.area.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.area.height
    }

    #[inline]
    fn parent_index(&self, y: usize, x: usize) -> usize {
        (self.area.y + y) * self.stride + self.area.x + x
    }

    /// Shared view of the same window.
    pub fn as_slice(&self) -> Slice<'_, C> {
        Slice {
            pixels: &*self.pixels,
            stride: self.stride,
            area: self.area,
        }
    }

    pub fn get(&self, y: usize, x: usize) -> Result<C> {
        self.as_slice().get(y, x)
    }

    /// Write slice-local `(y, x)`, checked against the area.
    pub fn set(&mut self, y: usize, x: usize, value: C) -> Result<()> {
        if y < self.area.height && x < self.area.width {
            let i = self.parent_index(y, x);
            self.pixels[i] = value;
            Ok(())
        } else {
            Err(out_of_area(self.area, y, x))
        }
    }

    /// # Safety
    /// `y < height()` and `x < width()` must hold.
    #[inline]
    pub unsafe fn get_unchecked(&self, y: usize, x: usize) -> C {
        debug_assert!(y < self.area.height && x < self.area.width);
        // SAFETY: inside the area means inside the parent.
        unsafe { *self.pixels.get_unchecked(self.parent_index(y, x)) }
    }

    /// Write slice-local `(y, x)` with no area check in release builds.
    ///
    /// # Safety
    /// `y < height()` and `x < width()` must hold.
    #[inline]
    pub unsafe fn set_unchecked(&mut self, y: usize, x: usize, value: C) {
        debug_assert!(y < self.area.height && x < self.area.width);
        let i = self.parent_index(y, x);
        // SAFETY: inside the area means inside the parent.
        unsafe { *self.pixels.get_unchecked_mut(i) = value }
    }

    /// Mutable row `y` of the window. Panics if `y >= height()`.
    pub fn row_mut(&mut self, y: usize) -> &mut [C] {
        assert!(y < self.area.height, "row {y} outside {}-row slice", self.area.height);
        let start = self.parent_index(y, 0);
        let w = self.area.width;
        &mut self.pixels[start..start + w]
    }

    pub fn fill(&mut self, value: C) {
        for y in 0..self.area.height {
            self.row_mut(y).fill(value);
        }
    }
}

impl<C: Color> PartialEq for SliceMut<'_, C> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<C: Color> fmt::Debug for SliceMut<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceMut")
            .field("storage", &self.pixels.as_ptr())
            .field("area", &self.area)
            .finish()
    }
}

impl<C: Color> PixelBuffer<C> {
    /// Shared window over `area`.
    pub fn slice(&self, area: Rect) -> Result<Slice<'_, C>> {
        Slice::new(self, area)
    }

    /// Exclusive window over `area`.
    pub fn slice_mut(&mut self, area: Rect) -> Result<SliceMut<'_, C>> {
        SliceMut::new(self, area)
    }
}
