//! Owned, packed, row-major pixel storage.

#![allow(unsafe_code)]

use core::fmt;
use core::ops::{Index, IndexMut};

use crate::color::{Color, ColorDescriptor};
use crate::error::{PixelError, Result};
use crate::locked::LockedView;

/// Read access to packed row-major pixels (row stride equals width).
///
/// Implemented by [`PixelBuffer`] and [`LockedView`] so slice views can
/// window either.
pub trait PixelSource {
    type Pixel: Color;

    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// All `width × height` pixels, row after row.
    fn pixels(&self) -> &[Self::Pixel];
}

/// Write access to packed row-major pixels.
pub trait PixelSourceMut: PixelSource {
    fn pixels_mut(&mut self) -> &mut [Self::Pixel];
}

/// A `width × height` image of `C`, exclusively owning its storage.
///
/// Rows are packed: pixel `(y, x)` lives at index `y * width + x`.
/// Dimensions are fixed at construction.
pub struct PixelBuffer<C: Color> {
    width: usize,
    height: usize,
    descriptor: ColorDescriptor,
    data: Vec<C>,
    locked: bool,
}

fn checked_len<C: Color>(width: usize, height: usize) -> Result<usize> {
    let too_big = || {
        PixelError::InvalidArgument(format!(
            "{width}x{height} image of {} bytes per pixel overflows the address space",
            core::mem::size_of::<C>()
        ))
    };
    let len = width.checked_mul(height).ok_or_else(too_big)?;
    let bytes = len.checked_mul(core::mem::size_of::<C>()).ok_or_else(too_big)?;
    if bytes > isize::MAX as usize {
        return Err(too_big());
    }
    Ok(len)
}

impl<C: Color> PixelBuffer<C> {
    /// Allocate a zero-filled `width × height` buffer.
    ///
    /// Fails with [`PixelError::TypeError`] if `C` has an invalid layout and
    /// [`PixelError::InvalidArgument`] if the byte size overflows.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::with_descriptor(width, height, C::descriptor()?)
    }

    /// Zero-filled buffer whose descriptor was already looked up, so no
    /// registry is consulted.
    pub(crate) fn with_descriptor(
        width: usize,
        height: usize,
        descriptor: ColorDescriptor,
    ) -> Result<Self> {
        debug_assert_eq!(descriptor.size, core::mem::size_of::<C>());
        let len = checked_len::<C>(width, height)?;
        Ok(Self {
            width,
            height,
            descriptor,
            data: bytemuck::zeroed_vec(len),
            locked: false,
        })
    }

    /// Take ownership of existing pixels laid out row-major.
    pub fn from_vec(width: usize, height: usize, data: Vec<C>) -> Result<Self> {
        let descriptor = C::descriptor()?;
        let len = checked_len::<C>(width, height)?;
        if data.len() != len {
            return Err(PixelError::InvalidArgument(format!(
                "{width}x{height} image needs {len} pixels, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            descriptor,
            data,
            locked: false,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn descriptor(&self) -> ColorDescriptor {
        self.descriptor
    }

    /// Bytes between the starts of consecutive rows. Always packed.
    #[inline]
    pub fn stride_bytes(&self) -> usize {
        self.width * self.descriptor.size
    }

    #[inline]
    pub fn pixels(&self) -> &[C] {
        &self.data
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [C] {
        &mut self.data
    }

    /// Raw bytes of the whole image.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn into_vec(self) -> Vec<C> {
        self.data
    }

    /// Row `y`. Panics if `y >= height`.
    pub fn row(&self, y: usize) -> &[C] {
        assert!(y < self.height, "row {y} outside {}-row image", self.height);
        &self.data[y * self.width..][..self.width]
    }

    /// Mutable row `y`. Panics if `y >= height`.
    pub fn row_mut(&mut self, y: usize) -> &mut [C] {
        assert!(y < self.height, "row {y} outside {}-row image", self.height);
        let w = self.width;
        &mut self.data[y * w..][..w]
    }

    /// Iterate all `height` rows top to bottom. Rows of a zero-width image
    /// are empty.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[C]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }

    #[inline]
    fn index_of(&self, y: usize, x: usize) -> Result<usize> {
        if y < self.height && x < self.width {
            Ok(y * self.width + x)
        } else {
            Err(PixelError::IndexOutOfRange {
                y,
                x,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Checked read of pixel `(y, x)`.
    pub fn get(&self, y: usize, x: usize) -> Result<C> {
        Ok(self.data[self.index_of(y, x)?])
    }

    /// Checked write of pixel `(y, x)`.
    pub fn set(&mut self, y: usize, x: usize, value: C) -> Result<()> {
        let i = self.index_of(y, x)?;
        self.data[i] = value;
        Ok(())
    }

    /// Read pixel `(y, x)` without bounds checks in release builds.
    ///
    /// # Safety
    /// `y < height` and `x < width` must hold.
    #[inline]
    pub unsafe fn get_unchecked(&self, y: usize, x: usize) -> C {
        debug_assert!(y < self.height && x < self.width, "({y}, {x}) out of range");
        // SAFETY: caller guarantees the coordinate is inside the image.
        unsafe { *self.data.get_unchecked(y * self.width + x) }
    }

    /// Write pixel `(y, x)` without bounds checks in release builds.
    ///
    /// # Safety
    /// `y < height` and `x < width` must hold.
    #[inline]
    pub unsafe fn set_unchecked(&mut self, y: usize, x: usize, value: C) {
        debug_assert!(y < self.height && x < self.width, "({y}, {x}) out of range");
        let i = y * self.width + x;
        // SAFETY: caller guarantees the coordinate is inside the image.
        unsafe { *self.data.get_unchecked_mut(i) = value }
    }

    pub fn fill(&mut self, value: C) {
        self.data.fill(value);
    }

    /// Pin the storage and expose it to native code until the view drops.
    ///
    /// The returned guard mutably borrows `self`, so the buffer cannot be
    /// moved, dropped, read or locked again while it lives.
    pub fn lock(&mut self) -> LockedView<'_, C> {
        log::trace!("lock {}x{} buffer", self.width, self.height);
        self.locked = true;
        LockedView::new(self)
    }

    /// Run `f` with the buffer locked; it is unlocked on every exit path,
    /// including early returns and unwinding panics.
    pub fn with_lock<R>(&mut self, f: impl FnOnce(&mut LockedView<'_, C>) -> R) -> R {
        let mut view = self.lock();
        f(&mut view)
    }

    /// Whether a [`LockedView`] taken from this buffer is alive or was leaked
    /// with `mem::forget`.
    ///
    /// A leaked guard keeps this `true`, but its borrow has ended, so
    /// [`lock`](Self::lock) still succeeds.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub(crate) fn set_unlocked(&mut self) {
        self.locked = false;
    }
}

impl<C: Color> Clone for PixelBuffer<C> {
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            descriptor: self.descriptor,
            data: self.data.clone(),
            locked: false,
        }
    }
}

impl<C: Color> fmt::Debug for PixelBuffer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("color", &core::any::type_name::<C>())
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}

impl<C: Color + PartialEq> PartialEq for PixelBuffer<C> {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.data == other.data
    }
}

/// Panicking `(y, x)` indexing.
impl<C: Color> Index<(usize, usize)> for PixelBuffer<C> {
    type Output = C;

    fn index(&self, (y, x): (usize, usize)) -> &C {
        match self.index_of(y, x) {
            Ok(i) => &self.data[i],
            Err(e) => panic!("{e}"),
        }
    }
}

impl<C: Color> IndexMut<(usize, usize)> for PixelBuffer<C> {
    fn index_mut(&mut self, (y, x): (usize, usize)) -> &mut C {
        match self.index_of(y, x) {
            Ok(i) => &mut self.data[i],
            Err(e) => panic!("{e}"),
        }
    }
}

impl<C: Color> PixelSource for PixelBuffer<C> {
    type Pixel = C;

    fn width(&self) -> usize {
        self.width
    }
    fn height(&self) -> usize {
        self.height
    }
    fn pixels(&self) -> &[C] {
        &self.data
    }
}

impl<C: Color> PixelSourceMut for PixelBuffer<C> {
    fn pixels_mut(&mut self) -> &mut [C] {
        &mut self.data
    }
}
