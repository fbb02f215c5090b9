//! Conversions to and from [`imgref`] image types.
//!
//! Buffers and slices view as `ImgRef` without copying. Converting from an
//! `ImgRef` copies row by row, dropping any stride padding.
//!
//! ```rust
//! use imgref::ImgVec;
//! use pinpix::PixelBuffer;
//! use rgb::Rgb;
//!
//! let src = ImgVec::new_stride(vec![Rgb::new(1u8, 2, 3); 6], 2, 2, 3);
//! let buf = PixelBuffer::from_imgref(src.as_ref()).unwrap();
//! assert_eq!(buf.len(), 4);
//!
//! let back: ImgVec<Rgb<u8>> = buf.try_into().unwrap();
//! assert_eq!(back.stride(), 2);
//! ```

use imgref::{ImgRef, ImgRefMut, ImgVec};

use crate::buffer::PixelBuffer;
use crate::color::Color;
use crate::error::{PixelError, Result};
use crate::slice::Slice;

// imgref requires a nonzero stride and cannot describe empty images.
fn check_nonempty(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(PixelError::InvalidArgument(format!(
            "{width}x{height} image has no imgref representation"
        )));
    }
    Ok(())
}

impl<C: Color> PixelBuffer<C> {
    /// Borrow the buffer as an `ImgRef`.
    pub fn as_imgref(&self) -> Result<ImgRef<'_, C>> {
        check_nonempty(self.width(), self.height())?;
        Ok(ImgRef::new(self.pixels(), self.width(), self.height()))
    }

    /// Borrow the buffer as an `ImgRefMut`.
    pub fn as_imgref_mut(&mut self) -> Result<ImgRefMut<'_, C>> {
        check_nonempty(self.width(), self.height())?;
        let (w, h) = (self.width(), self.height());
        Ok(ImgRefMut::new(self.pixels_mut(), w, h))
    }

    /// Copy an image of any stride into a new packed buffer.
    pub fn from_imgref(img: ImgRef<'_, C>) -> Result<Self> {
        let mut buf = Self::new(img.width(), img.height())?;
        for (y, src) in img.rows().enumerate() {
            buf.row_mut(y).copy_from_slice(src);
        }
        Ok(buf)
    }
}

impl<C: Color> TryFrom<PixelBuffer<C>> for ImgVec<C> {
    type Error = PixelError;

    fn try_from(buf: PixelBuffer<C>) -> Result<Self> {
        check_nonempty(buf.width(), buf.height())?;
        let (w, h) = (buf.width(), buf.height());
        Ok(ImgVec::new(buf.into_vec(), w, h))
    }
}

impl<'a, C: Color> Slice<'a, C> {
    /// View the sliced area as an `ImgRef` sharing the parent's storage.
    pub fn as_imgref(&self) -> Result<ImgRef<'a, C>> {
        let area = self.area();
        check_nonempty(area.width, area.height)?;
        Ok(ImgRef::new_stride(
            self.from_origin(),
            area.width,
            area.height,
            self.stride(),
        ))
    }
}
