//! Memoized color descriptors keyed by type.
//!
//! The registry is an explicit object so it can be handed to the interop
//! adapters. [`DescriptorRegistry::global`] is the lazily created shared
//! instance behind [`describe`](crate::describe).

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::color::{Color, ColorDescriptor};
use crate::error::Result;

/// Thread-safe cache of [`ColorDescriptor`]s.
///
/// Entries are inserted once and never changed. Concurrent first lookups of
/// the same type may each compute the descriptor, but only the first insert
/// is kept and every caller gets that stored value back.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    entries: RwLock<HashMap<TypeId, ColorDescriptor>>,
}

impl DescriptorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> &'static DescriptorRegistry {
        static GLOBAL: OnceLock<DescriptorRegistry> = OnceLock::new();
        GLOBAL.get_or_init(DescriptorRegistry::new)
    }

    /// Look up or compute the descriptor of `C`.
    ///
    /// Types that fail validation return [`PixelError::TypeError`](crate::PixelError::TypeError)
    /// every time and are never cached.
    pub fn describe<C: Color>(&self) -> Result<ColorDescriptor> {
        let key = TypeId::of::<C>();
        if let Some(d) = self.get(key) {
            return Ok(d);
        }

        let computed = ColorDescriptor::compute::<C>()?;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let stored = *entries.entry(key).or_insert_with(|| {
            log::debug!("registered color {} as {:?}", type_name::<C>(), computed);
            computed
        });
        Ok(stored)
    }

    /// Cached descriptor for a type id, if present.
    pub fn get(&self, key: TypeId) -> Option<ColorDescriptor> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .copied()
    }

    /// Number of cached descriptors.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ChannelOrder;
    use crate::error::PixelError;
    use rgb::{Bgra, Gray, Rgb};

    #[test]
    fn describe_is_idempotent() {
        let reg = DescriptorRegistry::new();
        let a = reg.describe::<Rgb<u8>>().unwrap();
        let b = reg.describe::<Rgb<u8>>().unwrap();
        assert_eq!(a, b);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(TypeId::of::<Rgb<u8>>()), Some(a));
    }

    #[test]
    fn concurrent_first_calls_converge() {
        let reg = DescriptorRegistry::new();
        let results: Vec<ColorDescriptor> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| s.spawn(|| reg.describe::<Bgra<u16>>().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(results[0].order, ChannelOrder::Bgra);
        assert_eq!(results[0].size, 8);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn distinct_types_get_distinct_entries() {
        let reg = DescriptorRegistry::new();
        reg.describe::<Gray<u8>>().unwrap();
        reg.describe::<Gray<f32>>().unwrap();
        assert_eq!(reg.len(), 2);
    }

    #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(C)]
    struct TwoBytesClaimingRgb([u8; 2]);

    impl Color for TwoBytesClaimingRgb {
        type Channel = u8;
        const CHANNELS: usize = 3;
        const ORDER: ChannelOrder = ChannelOrder::Rgb;
    }

    #[test]
    fn invalid_types_are_not_cached() {
        let reg = DescriptorRegistry::new();
        assert!(matches!(
            reg.describe::<TwoBytesClaimingRgb>(),
            Err(PixelError::TypeError { .. })
        ));
        assert!(reg.is_empty());
    }

    #[test]
    fn global_registry_is_shared() {
        let a = DescriptorRegistry::global() as *const _;
        let b = DescriptorRegistry::global() as *const _;
        assert_eq!(a, b);
        assert!(crate::describe::<Rgb<f32>>().is_ok());
        assert!(DescriptorRegistry::global().get(TypeId::of::<Rgb<f32>>()).is_some());
    }
}
