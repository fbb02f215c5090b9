//! # pinpix
//!
//! *Pin your pixels down.*
//!
//! Generic 2D pixel buffers that can be handed to native imaging routines
//! and platform bitmap APIs without copying, and processed in parallel.
//!
//! - [`PixelBuffer<C>`] owns packed pixels of any [`Color`] type from the
//!   [`rgb`] crate (`Gray`, `GrayAlpha`, `Rgb`, `Bgr`, `Rgba`, `Bgra` over
//!   `u8`, `u16` or `f32`).
//! - [`PixelBuffer::lock`] pins the storage and yields a [`LockedView`] whose
//!   [`RawImage`] is the `(address, width, height, stride)` tuple native code
//!   expects. The buffer unlocks when the view is dropped.
//! - [`Slice`] and [`SliceMut`] are rectangular windows with checked and
//!   `unsafe` unchecked accessors.
//! - [`kernel`] runs a closure over every cell of a grid, rows in parallel.
//! - [`BitmapAdapter`] copies between buffers and platform bitmaps after
//!   validating the pixel format.
//!
//! ```rust
//! use pinpix::{describe, ChannelOrder, ChannelType, PixelBuffer, Rect};
//! use rgb::Bgra;
//!
//! let d = describe::<Bgra<u16>>().unwrap();
//! assert_eq!((d.channel_count, d.size), (4, 8));
//! assert_eq!((d.channel_type, d.order), (ChannelType::U16, ChannelOrder::Bgra));
//!
//! let mut img = PixelBuffer::<Bgra<u8>>::new(8, 8).unwrap();
//! pinpix::kernel::launch_pixels(&mut img, |t, px| px.g = (t.x + t.y) as u8).unwrap();
//!
//! let win = img.slice(Rect::new(2, 2, 3, 3)).unwrap();
//! assert_eq!(win.get(1, 1).unwrap().g, 6);
//! ```
//!
//! ## Feature flags
//!
//! - **`imgref`** (default): zero-copy conversions to [`imgref`] types.

#![deny(unsafe_code)]

mod buffer;
mod color;
mod error;
mod geometry;
mod interop;
mod locked;
mod registry;
mod slice;
mod swizzle;

pub mod kernel;

#[cfg(feature = "imgref")]
pub mod img;

pub use buffer::{PixelBuffer, PixelSource, PixelSourceMut};
pub use color::{Channel, ChannelOrder, ChannelType, Color, ColorDescriptor, describe};
pub use error::{KernelFault, PixelError, Result};
pub use geometry::{Rect, RectF};
pub use interop::{BitmapAdapter, ExternalBitmap, ExternalBitmapMut, OwnedBitmap, PixelFormat};
pub use kernel::{KernelThread, Launcher, LauncherBuilder};
pub use locked::{LockedView, RawImage};
pub use registry::DescriptorRegistry;
pub use slice::{Slice, SliceMut};

pub use rgb;
