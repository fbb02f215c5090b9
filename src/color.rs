//! Pixel color model.
//!
//! A [`Color`] is a plain-old-data pixel struct made of identical channels.
//! Its [`ColorDescriptor`] is the layout contract that makes it safe to
//! reinterpret a buffer of colors as raw bytes for native code and platform
//! bitmaps.
//!
//! ```rust
//! use pinpix::{describe, ChannelOrder, ChannelType};
//! use rgb::Rgb;
//!
//! let d = describe::<Rgb<u8>>().unwrap();
//! assert_eq!(d.channel_count, 3);
//! assert_eq!(d.channel_type, ChannelType::U8);
//! assert_eq!(d.order, ChannelOrder::Rgb);
//! assert_eq!(d.size, 3);
//! ```

use core::any::type_name;
use core::fmt;
use core::mem::size_of;

use rgb::{Bgr, Bgra, Gray, GrayAlpha, Rgb, Rgba};

use crate::error::{PixelError, Result};
use crate::registry::DescriptorRegistry;

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Channel storage type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChannelType {
    /// 8-bit unsigned integer.
    U8 = 1,
    /// 16-bit unsigned integer.
    U16 = 2,
    /// 32-bit float.
    F32 = 4,
}

impl ChannelType {
    /// Byte size of one channel value.
    #[inline]
    pub const fn byte_size(self) -> usize {
        self as usize
    }
}

/// A scalar usable as a color channel.
pub trait Channel: bytemuck::Pod + Send + Sync + 'static {
    const TYPE: ChannelType;
}

impl Channel for u8 {
    const TYPE: ChannelType = ChannelType::U8;
}

impl Channel for u16 {
    const TYPE: ChannelType = ChannelType::U16;
}

impl Channel for f32 {
    const TYPE: ChannelType = ChannelType::F32;
}

/// Meaning and memory order of a color's channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelOrder {
    Gray,
    GrayAlpha,
    Rgb,
    Bgr,
    Rgba,
    Bgra,
}

impl ChannelOrder {
    /// Number of channels this order names.
    pub const fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::GrayAlpha => 2,
            Self::Rgb | Self::Bgr => 3,
            Self::Rgba | Self::Bgra => 4,
        }
    }

    /// The order with red and blue exchanged, if there is one.
    pub const fn swapped(self) -> Option<Self> {
        match self {
            Self::Rgb => Some(Self::Bgr),
            Self::Bgr => Some(Self::Rgb),
            Self::Rgba => Some(Self::Bgra),
            Self::Bgra => Some(Self::Rgba),
            Self::Gray | Self::GrayAlpha => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Color trait
// ---------------------------------------------------------------------------

/// A pixel color type.
///
/// The `bytemuck::Pod` bound guarantees the type has no padding and no
/// invalid bit patterns. The associated items describe how the bytes split
/// into channels; [`describe`] verifies they agree with the actual size.
pub trait Color: bytemuck::Pod + Send + Sync + 'static {
    type Channel: Channel;
    const CHANNELS: usize;
    const ORDER: ChannelOrder;

    /// Descriptor for this type from the process-wide registry.
    fn descriptor() -> Result<ColorDescriptor> {
        describe::<Self>()
    }
}

macro_rules! impl_color {
    ($wrap:ident, $order:ident, $chans:literal) => {
        impl_color!(@one $wrap, $order, $chans, u8);
        impl_color!(@one $wrap, $order, $chans, u16);
        impl_color!(@one $wrap, $order, $chans, f32);
    };
    (@one $wrap:ident, $order:ident, $chans:literal, $ch:ty) => {
        impl Color for $wrap<$ch> {
            type Channel = $ch;
            const CHANNELS: usize = $chans;
            const ORDER: ChannelOrder = ChannelOrder::$order;
        }
    };
}

impl_color!(Gray, Gray, 1);
impl_color!(GrayAlpha, GrayAlpha, 2);
impl_color!(Rgb, Rgb, 3);
impl_color!(Bgr, Bgr, 3);
impl_color!(Rgba, Rgba, 4);
impl_color!(Bgra, Bgra, 4);

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Size and layout facts about a [`Color`] type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorDescriptor {
    /// Number of channels (≥ 1).
    pub channel_count: usize,
    /// Bytes per channel: 1, 2 or 4.
    pub channel_width: usize,
    /// Bytes per pixel, `channel_count × channel_width`.
    pub size: usize,
    pub channel_type: ChannelType,
    pub order: ChannelOrder,
}

impl ColorDescriptor {
    /// Bits per pixel, as platform bitmap APIs report it.
    #[inline]
    pub const fn bits_per_pixel(&self) -> usize {
        self.size * 8
    }

    /// Build a descriptor from its parts.
    pub const fn new(channel_type: ChannelType, order: ChannelOrder) -> Self {
        let channel_count = order.channels();
        let channel_width = channel_type.byte_size();
        Self {
            channel_count,
            channel_width,
            size: channel_count * channel_width,
            channel_type,
            order,
        }
    }

    /// Compute and validate the descriptor of `C` without consulting any cache.
    pub(crate) fn compute<C: Color>() -> Result<Self> {
        let type_name = type_name::<C>();
        let fail = |reason: String| PixelError::TypeError { type_name, reason };

        if C::CHANNELS == 0 {
            return Err(fail("declares zero channels".into()));
        }
        if C::CHANNELS != C::ORDER.channels() {
            return Err(fail(format!(
                "declares {} channels but order {:?} has {}",
                C::CHANNELS,
                C::ORDER,
                C::ORDER.channels()
            )));
        }
        let channel_width = size_of::<C::Channel>();
        if !matches!(channel_width, 1 | 2 | 4) || channel_width != C::Channel::TYPE.byte_size() {
            return Err(fail(format!("channel width {channel_width} is not 1, 2 or 4 bytes")));
        }
        let expected = C::CHANNELS * channel_width;
        if expected != size_of::<C>() {
            return Err(fail(format!(
                "{} channels × {} bytes = {} but the type is {} bytes",
                C::CHANNELS,
                channel_width,
                expected,
                size_of::<C>()
            )));
        }
        Ok(Self::new(C::Channel::TYPE, C::ORDER))
    }
}

impl fmt::Display for ColorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}<{:?}>", self.order, self.channel_type)
    }
}

/// Descriptor of `C`, memoized in [`DescriptorRegistry::global`].
pub fn describe<C: Color>() -> Result<ColorDescriptor> {
    DescriptorRegistry::global().describe::<C>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(C)]
    struct Lying {
        v: [u8; 4],
    }

    impl Color for Lying {
        type Channel = u8;
        const CHANNELS: usize = 3;
        const ORDER: ChannelOrder = ChannelOrder::Rgb;
    }

    #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(C)]
    struct WideChannel {
        v: [u64; 1],
    }

    #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(transparent)]
    struct Wide(u64);

    impl Channel for Wide {
        const TYPE: ChannelType = ChannelType::F32;
    }

    impl Color for WideChannel {
        type Channel = Wide;
        const CHANNELS: usize = 1;
        const ORDER: ChannelOrder = ChannelOrder::Gray;
    }

    #[test]
    fn describes_builtin_colors() {
        let d = ColorDescriptor::compute::<Rgba<u16>>().unwrap();
        assert_eq!(d.channel_count, 4);
        assert_eq!(d.channel_width, 2);
        assert_eq!(d.size, 8);
        assert_eq!(d.bits_per_pixel(), 64);

        let d = ColorDescriptor::compute::<Gray<f32>>().unwrap();
        assert_eq!((d.channel_count, d.channel_width, d.size), (1, 4, 4));

        let d = ColorDescriptor::compute::<Bgr<u8>>().unwrap();
        assert_eq!(d.order, ChannelOrder::Bgr);
        assert_eq!(d.size, core::mem::size_of::<Bgr<u8>>());
    }

    #[test]
    fn size_disagreement_is_type_error() {
        let err = ColorDescriptor::compute::<Lying>().unwrap_err();
        assert!(matches!(err, PixelError::TypeError { .. }));
        assert!(err.to_string().contains("4 bytes"), "{err}");
    }

    #[test]
    fn wide_channel_is_type_error() {
        let err = ColorDescriptor::compute::<WideChannel>().unwrap_err();
        assert!(err.to_string().contains("channel width 8"), "{err}");
    }

    #[test]
    fn display_names_order_and_channel() {
        let d = ColorDescriptor::new(ChannelType::U16, ChannelOrder::Bgra);
        assert_eq!(d.to_string(), "Bgra<U16>");
    }

    #[test]
    fn swapped_orders() {
        assert_eq!(ChannelOrder::Rgba.swapped(), Some(ChannelOrder::Bgra));
        assert_eq!(ChannelOrder::Bgr.swapped(), Some(ChannelOrder::Rgb));
        assert_eq!(ChannelOrder::Gray.swapped(), None);
    }
}
