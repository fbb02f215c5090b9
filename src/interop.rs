//! Conversions between [`PixelBuffer`]s and platform bitmaps.
//!
//! A platform bitmap is described by a `(format, width, height, stride,
//! bytes)` tuple. Its stride may include row padding; a `PixelBuffer` is
//! always packed. Every conversion validates the format against the color
//! type's descriptor before any byte is copied, then copies row by row.
//!
//! ```rust
//! use pinpix::{BitmapAdapter, DescriptorRegistry, ExternalBitmap, PixelFormat};
//! use rgb::Rgb;
//!
//! let registry = DescriptorRegistry::new();
//! let adapter = BitmapAdapter::new(&registry);
//!
//! // 2x2 RGB bitmap with 2 bytes of padding per row.
//! let bytes = [1, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12, 0, 0];
//! let bmp = ExternalBitmap::new(PixelFormat::Rgb24, 2, 2, 8, &bytes).unwrap();
//!
//! let img = adapter.from_external::<Rgb<u8>>(&bmp).unwrap();
//! assert_eq!(img.get(1, 0).unwrap(), Rgb::new(7, 8, 9));
//!
//! let back = adapter.to_external_aligned(&img, 4).unwrap();
//! assert_eq!(back.bytes(), &bytes);
//! ```

use core::any::type_name;

use crate::buffer::PixelBuffer;
use crate::color::{ChannelOrder, ChannelType, Color, ColorDescriptor};
use crate::error::{PixelError, Result};
use crate::geometry::Rect;
use crate::registry::DescriptorRegistry;
use crate::slice::Slice;
use crate::swizzle;

// ---------------------------------------------------------------------------
// Platform pixel formats
// ---------------------------------------------------------------------------

/// Pixel format identifiers exchanged with platform bitmap APIs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    Gray8,
    Gray16,
    GrayF32,
    GrayAlpha8,
    GrayAlpha16,
    Rgb24,
    Bgr24,
    Rgba32,
    Bgra32,
    Rgb48,
    Rgba64,
    RgbF32,
    RgbaF32,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 13] = [
        Self::Gray8,
        Self::Gray16,
        Self::GrayF32,
        Self::GrayAlpha8,
        Self::GrayAlpha16,
        Self::Rgb24,
        Self::Bgr24,
        Self::Rgba32,
        Self::Bgra32,
        Self::Rgb48,
        Self::Rgba64,
        Self::RgbF32,
        Self::RgbaF32,
    ];

    /// The color descriptor this format stores.
    pub const fn to_descriptor(self) -> ColorDescriptor {
        use ChannelOrder as O;
        use ChannelType as T;
        let (t, o) = match self {
            Self::Gray8 => (T::U8, O::Gray),
            Self::Gray16 => (T::U16, O::Gray),
            Self::GrayF32 => (T::F32, O::Gray),
            Self::GrayAlpha8 => (T::U8, O::GrayAlpha),
            Self::GrayAlpha16 => (T::U16, O::GrayAlpha),
            Self::Rgb24 => (T::U8, O::Rgb),
            Self::Bgr24 => (T::U8, O::Bgr),
            Self::Rgba32 => (T::U8, O::Rgba),
            Self::Bgra32 => (T::U8, O::Bgra),
            Self::Rgb48 => (T::U16, O::Rgb),
            Self::Rgba64 => (T::U16, O::Rgba),
            Self::RgbF32 => (T::F32, O::Rgb),
            Self::RgbaF32 => (T::F32, O::Rgba),
        };
        ColorDescriptor::new(t, o)
    }

    /// The format storing exactly `descriptor`, if the platform has one.
    pub fn from_descriptor(descriptor: ColorDescriptor) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.to_descriptor() == descriptor)
    }

    /// The format storing `C`, looked up through the global registry.
    pub fn for_color<C: Color>() -> Option<Self> {
        C::descriptor().ok().and_then(Self::from_descriptor)
    }

    #[inline]
    pub const fn bits_per_pixel(self) -> usize {
        self.to_descriptor().bits_per_pixel()
    }

    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        self.to_descriptor().size
    }

    /// Same layout with red and blue exchanged (8-bit RGB/BGR formats only).
    pub const fn swapped(self) -> Option<Self> {
        match self {
            Self::Rgb24 => Some(Self::Bgr24),
            Self::Bgr24 => Some(Self::Rgb24),
            Self::Rgba32 => Some(Self::Bgra32),
            Self::Bgra32 => Some(Self::Rgba32),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Bitmap descriptions
// ---------------------------------------------------------------------------

/// Validates a strided layout and returns the bytes in one row of pixels.
fn check_layout(
    format: PixelFormat,
    width: usize,
    height: usize,
    stride: usize,
    len: usize,
) -> Result<usize> {
    let bad = |why: &str| {
        PixelError::InvalidArgument(format!(
            "{format:?} bitmap {width}x{height} with stride {stride} over {len} bytes: {why}"
        ))
    };
    let row_bytes = width
        .checked_mul(format.bytes_per_pixel())
        .ok_or_else(|| bad("row size overflows"))?;
    if row_bytes > stride {
        return Err(bad("stride is shorter than a row"));
    }
    if height > 0 {
        let needed = (height - 1)
            .checked_mul(stride)
            .and_then(|n| n.checked_add(row_bytes))
            .ok_or_else(|| bad("size overflows"))?;
        if len < needed {
            return Err(bad(&format!("needs at least {needed} bytes")));
        }
    }
    Ok(row_bytes)
}

/// Bytes actually covered by rows, excluding any trailing slack.
fn covered_len(height: usize, stride: usize, row_bytes: usize) -> usize {
    if height == 0 { 0 } else { (height - 1) * stride + row_bytes }
}

/// Copy `height` rows of `row_bytes` bytes between two strided byte buffers.
fn copy_rows(
    src: &[u8],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    row_bytes: usize,
    height: usize,
) {
    if src_stride == row_bytes && dst_stride == row_bytes {
        let n = row_bytes * height;
        dst[..n].copy_from_slice(&src[..n]);
        return;
    }
    for y in 0..height {
        dst[y * dst_stride..][..row_bytes].copy_from_slice(&src[y * src_stride..][..row_bytes]);
    }
}

/// Borrowed, read-only platform bitmap memory.
#[derive(Clone, Copy, Debug)]
pub struct ExternalBitmap<'a> {
    format: PixelFormat,
    width: usize,
    height: usize,
    stride: usize,
    data: &'a [u8],
}

impl<'a> ExternalBitmap<'a> {
    /// Describe existing bitmap memory. `stride` is bytes between row starts.
    pub fn new(
        format: PixelFormat,
        width: usize,
        height: usize,
        stride: usize,
        data: &'a [u8],
    ) -> Result<Self> {
        check_layout(format, width, height, stride, data.len())?;
        Ok(Self {
            format,
            width,
            height,
            stride,
            data,
        })
    }

    /// Bitmap whose rows are packed with no padding.
    pub fn packed(format: PixelFormat, width: usize, height: usize, data: &'a [u8]) -> Result<Self> {
        let stride = width.saturating_mul(format.bytes_per_pixel());
        Self::new(format, width, height, stride, data)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }
    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn stride(&self) -> usize {
        self.stride
    }
    pub fn bits_per_pixel(&self) -> usize {
        self.format.bits_per_pixel()
    }
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    fn row_bytes(&self) -> usize {
        self.width * self.format.bytes_per_pixel()
    }

    /// Pixel bytes of row `y`, without padding. Panics if `y >= height`.
    pub fn row(&self, y: usize) -> &'a [u8] {
        assert!(y < self.height, "row {y} outside {}-row bitmap", self.height);
        &self.data[y * self.stride..][..self.row_bytes()]
    }
}

/// Borrowed, writable platform bitmap memory.
#[derive(Debug)]
pub struct ExternalBitmapMut<'a> {
    format: PixelFormat,
    width: usize,
    height: usize,
    stride: usize,
    data: &'a mut [u8],
}

impl<'a> ExternalBitmapMut<'a> {
    pub fn new(
        format: PixelFormat,
        width: usize,
        height: usize,
        stride: usize,
        data: &'a mut [u8],
    ) -> Result<Self> {
        check_layout(format, width, height, stride, data.len())?;
        Ok(Self {
            format,
            width,
            height,
            stride,
            data,
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }
    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn as_external(&self) -> ExternalBitmap<'_> {
        ExternalBitmap {
            format: self.format,
            width: self.width,
            height: self.height,
            stride: self.stride,
            data: self.data,
        }
    }
}

/// Owned bitmap bytes produced by [`BitmapAdapter::to_external`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedBitmap {
    format: PixelFormat,
    width: usize,
    height: usize,
    stride: usize,
    data: Vec<u8>,
}

impl OwnedBitmap {
    /// Zeroed bitmap whose stride is the row size rounded up to `row_align` bytes.
    pub fn new(format: PixelFormat, width: usize, height: usize, row_align: usize) -> Result<Self> {
        if row_align == 0 {
            return Err(PixelError::InvalidArgument("row alignment must be at least 1".into()));
        }
        let overflow = || {
            PixelError::InvalidArgument(format!("{format:?} bitmap {width}x{height} overflows"))
        };
        let row_bytes = width.checked_mul(format.bytes_per_pixel()).ok_or_else(overflow)?;
        let stride = row_bytes
            .checked_next_multiple_of(row_align)
            .ok_or_else(overflow)?;
        let len = stride.checked_mul(height).ok_or_else(overflow)?;
        Ok(Self {
            format,
            width,
            height,
            stride,
            data: vec![0; len],
        })
    }

    /// Take ownership of bitmap bytes, validating the layout.
    pub fn from_bytes(
        format: PixelFormat,
        width: usize,
        height: usize,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        check_layout(format, width, height, stride, data.len())?;
        Ok(Self {
            format,
            width,
            height,
            stride,
            data,
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }
    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn stride(&self) -> usize {
        self.stride
    }
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn as_external(&self) -> ExternalBitmap<'_> {
        ExternalBitmap {
            format: self.format,
            width: self.width,
            height: self.height,
            stride: self.stride,
            data: &self.data,
        }
    }

    pub fn as_external_mut(&mut self) -> ExternalBitmapMut<'_> {
        ExternalBitmapMut {
            format: self.format,
            width: self.width,
            height: self.height,
            stride: self.stride,
            data: &mut self.data,
        }
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// How an external format relates to a color type's layout.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Match {
    Exact,
    Swapped,
}

/// Moves pixels between [`PixelBuffer`]s and platform bitmaps.
///
/// Descriptor lookups go through the registry it was created with.
#[derive(Clone, Copy, Debug)]
pub struct BitmapAdapter<'r> {
    registry: &'r DescriptorRegistry,
}

impl Default for BitmapAdapter<'static> {
    fn default() -> Self {
        Self::new(DescriptorRegistry::global())
    }
}

impl<'r> BitmapAdapter<'r> {
    pub fn new(registry: &'r DescriptorRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r DescriptorRegistry {
        self.registry
    }

    fn mismatch<C: Color>(expected: ColorDescriptor, actual: PixelFormat) -> PixelError {
        PixelError::FormatMismatch {
            color: type_name::<C>(),
            expected: expected.to_string(),
            expected_bits: expected.bits_per_pixel(),
            actual: format!("{actual:?}"),
            actual_bits: actual.bits_per_pixel(),
        }
    }

    /// Check `format` against `C`: bit depth first, then channel layout.
    fn classify<C: Color>(
        &self,
        format: PixelFormat,
        allow_swap: bool,
    ) -> Result<(ColorDescriptor, Match)> {
        let desc = self.registry.describe::<C>()?;
        if format.bits_per_pixel() != desc.bits_per_pixel() {
            return Err(Self::mismatch::<C>(desc, format));
        }
        let ext = format.to_descriptor();
        if ext == desc {
            return Ok((desc, Match::Exact));
        }
        if allow_swap && desc.channel_type == ChannelType::U8 && desc.order.swapped() == Some(ext.order) {
            return Ok((desc, Match::Swapped));
        }
        Err(Self::mismatch::<C>(desc, format))
    }

    /// Platform format whose layout is exactly `C`.
    pub fn format_for<C: Color>(&self) -> Result<PixelFormat> {
        let desc = self.registry.describe::<C>()?;
        PixelFormat::from_descriptor(desc).ok_or_else(|| PixelError::FormatMismatch {
            color: type_name::<C>(),
            expected: desc.to_string(),
            expected_bits: desc.bits_per_pixel(),
            actual: "no platform format".into(),
            actual_bits: 0,
        })
    }

    fn import<C: Color>(
        &self,
        bmp: &ExternalBitmap<'_>,
        (desc, how): (ColorDescriptor, Match),
    ) -> Result<PixelBuffer<C>> {
        let mut buffer = PixelBuffer::<C>::with_descriptor(bmp.width, bmp.height, desc)?;
        let row_bytes = bmp.row_bytes();
        buffer.with_lock(|view| {
            let dst_stride = view.stride_bytes();
            let dst = view.as_bytes_mut();
            match how {
                Match::Exact => {
                    copy_rows(bmp.data, bmp.stride, dst, dst_stride, row_bytes, bmp.height)
                }
                Match::Swapped => swizzle::copy_swap_br_strided(
                    bmp.data,
                    dst,
                    bmp.format.bytes_per_pixel(),
                    row_bytes,
                    bmp.height,
                    bmp.stride,
                    dst_stride,
                ),
            }
        });
        log::debug!(
            "imported {:?} {}x{} (stride {}) as {}",
            bmp.format,
            bmp.width,
            bmp.height,
            bmp.stride,
            type_name::<C>()
        );
        Ok(buffer)
    }

    /// Copy a bitmap into a new buffer of `C`.
    ///
    /// Fails with [`PixelError::FormatMismatch`] unless the bitmap's format
    /// has exactly `C`'s layout.
    pub fn from_external<C: Color>(&self, bmp: &ExternalBitmap<'_>) -> Result<PixelBuffer<C>> {
        let found = self.classify::<C>(bmp.format, false)?;
        self.import(bmp, found)
    }

    /// Like [`from_external`](Self::from_external), but also accepts the
    /// red/blue-swapped format (e.g. `Bgra32` into `Rgba<u8>`) and reorders
    /// channels while copying.
    pub fn from_external_swapped<C: Color>(&self, bmp: &ExternalBitmap<'_>) -> Result<PixelBuffer<C>> {
        let found = self.classify::<C>(bmp.format, true)?;
        self.import(bmp, found)
    }

    /// Borrow a bitmap as pixels of `C` without copying.
    ///
    /// Needs the exact format, a stride that is a whole number of pixels and
    /// bytes aligned for `C`; otherwise fails and [`from_external`](Self::from_external)
    /// must be used instead.
    pub fn wrap_external<'a, C: Color>(&self, bmp: &ExternalBitmap<'a>) -> Result<Slice<'a, C>> {
        self.classify::<C>(bmp.format, false)?;
        let size = core::mem::size_of::<C>();
        if bmp.stride % size != 0 {
            return Err(PixelError::InvalidArgument(format!(
                "stride {} is not a multiple of the {size}-byte pixel",
                bmp.stride
            )));
        }
        let covered = covered_len(bmp.height, bmp.stride, bmp.row_bytes());
        let pixels: &'a [C] = bytemuck::try_cast_slice(&bmp.data[..covered]).map_err(|e| {
            PixelError::InvalidArgument(format!("bitmap bytes cannot be viewed as pixels: {e}"))
        })?;
        Ok(Slice::from_parts(
            pixels,
            bmp.stride / size,
            Rect::from_size(bmp.width, bmp.height),
        ))
    }

    /// Copy a buffer into a new packed bitmap of its own format.
    pub fn to_external<C: Color>(&self, buffer: &PixelBuffer<C>) -> Result<OwnedBitmap> {
        self.to_external_aligned(buffer, 1)
    }

    /// Copy a buffer into a new bitmap whose rows are padded to `row_align` bytes.
    pub fn to_external_aligned<C: Color>(
        &self,
        buffer: &PixelBuffer<C>,
        row_align: usize,
    ) -> Result<OwnedBitmap> {
        let format = self.format_for::<C>()?;
        let mut out = OwnedBitmap::new(format, buffer.width(), buffer.height(), row_align)?;
        self.export(buffer, &mut out.as_external_mut(), Match::Exact);
        Ok(out)
    }

    /// Copy a buffer into a new packed bitmap with red and blue exchanged
    /// (e.g. `Rgba<u8>` into `Bgra32`).
    pub fn to_external_swapped<C: Color>(&self, buffer: &PixelBuffer<C>) -> Result<OwnedBitmap> {
        let own = self.format_for::<C>()?;
        let desc = own.to_descriptor();
        let format = own.swapped().ok_or_else(|| PixelError::FormatMismatch {
            color: type_name::<C>(),
            expected: desc.to_string(),
            expected_bits: desc.bits_per_pixel(),
            actual: "no red/blue-swapped platform format".into(),
            actual_bits: 0,
        })?;
        let mut out = OwnedBitmap::new(format, buffer.width(), buffer.height(), 1)?;
        self.export(buffer, &mut out.as_external_mut(), Match::Swapped);
        Ok(out)
    }

    /// Copy a buffer into caller-owned bitmap memory of the same size.
    pub fn copy_to_external<C: Color>(
        &self,
        buffer: &PixelBuffer<C>,
        dst: &mut ExternalBitmapMut<'_>,
    ) -> Result<()> {
        let (_, how) = self.classify::<C>(dst.format, true)?;
        if (dst.width, dst.height) != (buffer.width(), buffer.height()) {
            return Err(PixelError::InvalidArgument(format!(
                "{}x{} buffer does not fit {}x{} bitmap",
                buffer.width(),
                buffer.height(),
                dst.width,
                dst.height
            )));
        }
        self.export(buffer, dst, how);
        Ok(())
    }

    fn export<C: Color>(&self, buffer: &PixelBuffer<C>, dst: &mut ExternalBitmapMut<'_>, how: Match) {
        let row_bytes = buffer.stride_bytes();
        let src = buffer.as_bytes();
        match how {
            Match::Exact => copy_rows(src, row_bytes, dst.data, dst.stride, row_bytes, dst.height),
            Match::Swapped => swizzle::copy_swap_br_strided(
                src,
                dst.data,
                dst.format.bytes_per_pixel(),
                row_bytes,
                dst.height,
                row_bytes,
                dst.stride,
            ),
        }
        log::debug!(
            "exported {} {}x{} as {:?} (stride {})",
            type_name::<C>(),
            dst.width,
            dst.height,
            dst.format,
            dst.stride
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgb::{Bgra, Gray, Rgb, Rgba};

    fn adapter() -> BitmapAdapter<'static> {
        BitmapAdapter::default()
    }

    #[test]
    fn formats_map_one_to_one() {
        for f in PixelFormat::ALL {
            assert_eq!(PixelFormat::from_descriptor(f.to_descriptor()), Some(f));
        }
        assert_eq!(PixelFormat::Rgb24.bits_per_pixel(), 24);
        assert_eq!(PixelFormat::RgbaF32.bits_per_pixel(), 128);
        assert_eq!(PixelFormat::Bgra32.swapped(), Some(PixelFormat::Rgba32));
        assert_eq!(PixelFormat::Rgb48.swapped(), None);
        assert_eq!(PixelFormat::for_color::<Bgra<u8>>(), Some(PixelFormat::Bgra32));
        assert_eq!(PixelFormat::for_color::<rgb::Bgr<f32>>(), None);
    }

    #[test]
    fn layout_validation() {
        let bytes = [0u8; 20];
        assert!(ExternalBitmap::new(PixelFormat::Rgb24, 3, 2, 10, &bytes).is_ok());
        // (2 - 1) * 10 + 9 = 19 bytes needed, padding on the last row optional.
        assert!(ExternalBitmap::new(PixelFormat::Rgb24, 3, 2, 10, &bytes[..19]).is_ok());
        assert!(ExternalBitmap::new(PixelFormat::Rgb24, 3, 2, 10, &bytes[..18]).is_err());
        assert!(ExternalBitmap::new(PixelFormat::Rgb24, 4, 1, 10, &bytes).is_err());
        assert!(ExternalBitmap::new(PixelFormat::Rgb24, 0, 0, 0, &[]).is_ok());
    }

    #[test]
    fn gray_into_rgb_is_rejected_before_copying() {
        let bytes = [7u8; 16];
        let bmp = ExternalBitmap::packed(PixelFormat::Gray8, 4, 4, &bytes).unwrap();
        let err = adapter().from_external::<Rgb<u8>>(&bmp).unwrap_err();
        match &err {
            PixelError::FormatMismatch {
                expected_bits,
                actual_bits,
                ..
            } => assert_eq!((*expected_bits, *actual_bits), (24, 8)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().contains("Gray8"), "{err}");
    }

    #[test]
    fn same_depth_different_layout_is_rejected() {
        let bytes = [0u8; 8];
        let bmp = ExternalBitmap::packed(PixelFormat::Bgra32, 2, 1, &bytes).unwrap();
        assert!(matches!(
            adapter().from_external::<Rgba<u8>>(&bmp),
            Err(PixelError::FormatMismatch { .. })
        ));
        // 32 bits, but one f32 channel rather than four u8 channels.
        let gray = ExternalBitmap::packed(PixelFormat::GrayF32, 2, 1, &bytes).unwrap();
        assert!(adapter().from_external::<Rgba<u8>>(&gray).is_err());
    }

    #[test]
    fn packed_round_trip_is_byte_exact() {
        let bytes: Vec<u8> = (0..5 * 3 * 4).map(|i| (i * 7 % 256) as u8).collect();
        let bmp = ExternalBitmap::packed(PixelFormat::Rgba32, 5, 3, &bytes).unwrap();
        let img = adapter().from_external::<Rgba<u8>>(&bmp).unwrap();
        let back = adapter().to_external(&img).unwrap();
        assert_eq!(back.format(), PixelFormat::Rgba32);
        assert_eq!(back.stride(), 20);
        assert_eq!(back.bytes(), &bytes[..]);
    }

    #[test]
    fn padded_stride_is_removed_then_restored() {
        let (w, h, stride) = (3, 4, 12);
        let mut bytes = vec![0u8; stride * h];
        for y in 0..h {
            for i in 0..w * 3 {
                bytes[y * stride + i] = (y * 10 + i) as u8;
            }
        }
        let bmp = ExternalBitmap::new(PixelFormat::Rgb24, w, h, stride, &bytes).unwrap();
        let img = adapter().from_external::<Rgb<u8>>(&bmp).unwrap();
        assert_eq!(img.stride_bytes(), 9);
        assert_eq!(img.get(2, 1).unwrap(), Rgb::new(23, 24, 25));

        let back = adapter().to_external_aligned(&img, 4).unwrap();
        assert_eq!(back.stride(), 12);
        assert_eq!(back.bytes(), &bytes[..]);
    }

    #[test]
    fn wide_channels_copy_through() {
        let px: Vec<u16> = vec![1, 2, 3, 65535, 40000, 6];
        let bytes: &[u8] = bytemuck::cast_slice(&px);
        let bmp = ExternalBitmap::packed(PixelFormat::Rgb48, 2, 1, bytes).unwrap();
        let img = adapter().from_external::<Rgb<u16>>(&bmp).unwrap();
        assert_eq!(img.get(0, 1).unwrap(), Rgb::new(65535, 40000, 6));
    }

    #[test]
    fn swapped_import_reorders_channels() {
        let bytes = [10u8, 20, 30, 40, 50, 60, 70, 80];
        let bmp = ExternalBitmap::packed(PixelFormat::Bgra32, 2, 1, &bytes).unwrap();
        let img = adapter().from_external_swapped::<Rgba<u8>>(&bmp).unwrap();
        assert_eq!(img.get(0, 0).unwrap(), Rgba::new(30, 20, 10, 40));

        // The exact format still works through the swapping entry point.
        let same = adapter().from_external_swapped::<Bgra<u8>>(&bmp).unwrap();
        assert_eq!(same.as_bytes(), &bytes);

        let back = adapter().to_external_swapped(&img).unwrap();
        assert_eq!(back.format(), PixelFormat::Bgra32);
        assert_eq!(back.bytes(), &bytes);
    }

    #[test]
    fn swapped_never_crosses_depths() {
        let bytes = [0u8; 6];
        let bmp = ExternalBitmap::packed(PixelFormat::Bgr24, 2, 1, &bytes).unwrap();
        assert!(adapter().from_external_swapped::<Rgba<u8>>(&bmp).is_err());
        let gray = PixelBuffer::<Gray<u8>>::new(2, 2).unwrap();
        assert!(matches!(
            adapter().to_external_swapped(&gray),
            Err(PixelError::FormatMismatch { .. })
        ));
    }

    #[test]
    fn copy_into_platform_memory() {
        let img = PixelBuffer::from_vec(2, 2, vec![Gray::new(1u8), Gray::new(2), Gray::new(3), Gray::new(4)])
            .unwrap();
        let mut mem = vec![0xEEu8; 8];
        let mut dst = ExternalBitmapMut::new(PixelFormat::Gray8, 2, 2, 4, &mut mem).unwrap();
        adapter().copy_to_external(&img, &mut dst).unwrap();
        assert_eq!(mem, [1, 2, 0xEE, 0xEE, 3, 4, 0xEE, 0xEE]);

        let mut small = vec![0u8; 1];
        let mut dst = ExternalBitmapMut::new(PixelFormat::Gray8, 1, 1, 1, &mut small).unwrap();
        assert!(matches!(
            adapter().copy_to_external(&img, &mut dst),
            Err(PixelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn wrap_is_zero_copy() {
        let bytes = [1u8, 2, 3, 0, 4, 5, 6, 0];
        let bmp = ExternalBitmap::new(PixelFormat::Gray8, 3, 2, 4, &bytes).unwrap();
        let view = adapter().wrap_external::<Gray<u8>>(&bmp).unwrap();
        assert_eq!(view.stride(), 4);
        assert_eq!(view.get(1, 2).unwrap(), Gray::new(6));
        assert!(view.get(0, 3).is_err());
        assert_eq!(view.row(1).as_ptr() as *const u8, bytes[4..].as_ptr());
    }

    #[test]
    fn wrap_rejects_partial_pixel_strides() {
        let bytes = [0u8; 14];
        let bmp = ExternalBitmap::new(PixelFormat::Rgb24, 2, 2, 7, &bytes).unwrap();
        assert!(matches!(
            adapter().wrap_external::<Rgb<u8>>(&bmp),
            Err(PixelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn injected_registry_is_used() {
        let registry = DescriptorRegistry::new();
        let adapter = BitmapAdapter::new(&registry);
        let img = PixelBuffer::<Rgb<f32>>::new(1, 1).unwrap();
        adapter.to_external(&img).unwrap();
        assert_eq!(registry.len(), 1);

        // No other test in this binary touches GrayAlpha<u16> through the
        // global registry.
        let key = core::any::TypeId::of::<rgb::GrayAlpha<u16>>();
        let bytes = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let bmp = ExternalBitmap::packed(PixelFormat::GrayAlpha16, 2, 1, &bytes).unwrap();
        let img = adapter.from_external::<rgb::GrayAlpha<u16>>(&bmp).unwrap();
        assert_eq!(img.as_bytes(), &bytes);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(key).is_some());
        assert!(DescriptorRegistry::global().get(key).is_none());
    }

    #[test]
    fn unmapped_color_has_no_format() {
        let img = PixelBuffer::<rgb::Bgr<u16>>::new(1, 1).unwrap();
        let err = adapter().to_external(&img).unwrap_err();
        assert!(err.to_string().contains("no platform format"), "{err}");
    }
}
