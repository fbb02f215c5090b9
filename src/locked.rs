//! Scoped exposure of a buffer's memory to native code.
//!
//! ```rust
//! use pinpix::PixelBuffer;
//! use rgb::Rgb;
//!
//! let mut img = PixelBuffer::<Rgb<u8>>::new(4, 2).unwrap();
//! {
//!     let mut view = img.lock();
//!     let raw = view.as_raw();
//!     assert_eq!(raw.stride, 12);
//!     view.as_bytes_mut()[0] = 200;
//! } // unlocked here
//! assert!(!img.is_locked());
//! assert_eq!(img.get(0, 0).unwrap().r, 200);
//! ```

use core::fmt;
use core::marker::PhantomData;

use crate::buffer::{PixelBuffer, PixelSource, PixelSourceMut};
use crate::color::{Color, ColorDescriptor};

/// The `(base address, width, height, stride)` tuple handed to native routines.
///
/// Only valid while the [`LockedView`] it came from is alive. A native
/// routine must not touch more than `height × stride` bytes from `data`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawImage<'a> {
    pub data: *mut u8,
    pub width: usize,
    pub height: usize,
    /// Bytes between row starts.
    pub stride: usize,
    _borrow: PhantomData<&'a mut [u8]>,
}

impl RawImage<'_> {
    /// Total addressable bytes, `height × stride`.
    pub fn byte_len(&self) -> usize {
        self.height * self.stride
    }
}

/// A pinned buffer. Unlocks when dropped.
///
/// Holds the buffer's `&mut` borrow, so the storage cannot be reallocated,
/// moved or freed while native code holds the address.
pub struct LockedView<'a, C: Color> {
    buffer: &'a mut PixelBuffer<C>,
}

impl<'a, C: Color> LockedView<'a, C> {
    pub(crate) fn new(buffer: &'a mut PixelBuffer<C>) -> Self {
        Self { buffer }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.buffer.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.buffer.height()
    }

    /// Bytes between row starts; rows are packed.
    #[inline]
    pub fn stride_bytes(&self) -> usize {
        self.buffer.stride_bytes()
    }

    #[inline]
    pub fn descriptor(&self) -> ColorDescriptor {
        self.buffer.descriptor()
    }

    /// Address of pixel `(0, 0)`.
    pub fn base_address(&mut self) -> *mut u8 {
        self.buffer.pixels_mut().as_mut_ptr().cast()
    }

    /// The native handoff tuple. Its borrow ends with this view's.
    pub fn as_raw(&mut self) -> RawImage<'_> {
        RawImage {
            data: self.base_address(),
            width: self.width(),
            height: self.height(),
            stride: self.stride_bytes(),
            _borrow: PhantomData,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(self.buffer.pixels_mut())
    }

    pub fn pixels(&self) -> &[C] {
        self.buffer.pixels()
    }

    pub fn pixels_mut(&mut self) -> &mut [C] {
        self.buffer.pixels_mut()
    }
}

impl<C: Color> Drop for LockedView<'_, C> {
    fn drop(&mut self) {
        log::trace!("unlock {}x{} buffer", self.buffer.width(), self.buffer.height());
        self.buffer.set_unlocked();
    }
}

impl<C: Color> fmt::Debug for LockedView<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockedView")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("stride_bytes", &self.stride_bytes())
            .finish()
    }
}

impl<C: Color> PixelSource for LockedView<'_, C> {
    type Pixel = C;

    fn width(&self) -> usize {
        self.buffer.width()
    }
    fn height(&self) -> usize {
        self.buffer.height()
    }
    fn pixels(&self) -> &[C] {
        self.buffer.pixels()
    }
}

impl<C: Color> PixelSourceMut for LockedView<'_, C> {
    fn pixels_mut(&mut self) -> &mut [C] {
        self.buffer.pixels_mut()
    }
}
