// ---------------------------------------------------------------------------
// Red/blue channel exchange for 8-bit 3bpp and 4bpp rows.
//
// Used by the interop adapters when a platform bitmap stores BGR(A) and the
// buffer stores RGB(A) or the other way around. The 4bpp path dispatches to
// AVX2 via incant!; the 3bpp path is scalar.
// ---------------------------------------------------------------------------

use archmage::incant;
use archmage::prelude::*;
#[cfg(target_arch = "x86_64")]
use safe_unaligned_simd::x86_64::{_mm256_loadu_si256, _mm256_storeu_si256};

// ===========================================================================
// Scalar
// ===========================================================================

fn swap4_pixels(src: &[u8], dst: &mut [u8]) {
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        d.copy_from_slice(&[s[2], s[1], s[0], s[3]]);
    }
}

fn swap3_pixels(src: &[u8], dst: &mut [u8]) {
    for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(3)) {
        d.copy_from_slice(&[s[2], s[1], s[0]]);
    }
}

fn copy_swap4_strided_scalar(
    _token: ScalarToken,
    src: &[u8],
    dst: &mut [u8],
    row_bytes: usize,
    height: usize,
    src_stride: usize,
    dst_stride: usize,
) {
    for y in 0..height {
        swap4_pixels(
            &src[y * src_stride..][..row_bytes],
            &mut dst[y * dst_stride..][..row_bytes],
        );
    }
}

// ===========================================================================
// x86-64 AVX2
// ===========================================================================

/// `vpshufb` indices exchanging bytes 0 and 2 of every 4-byte pixel. The
/// shuffle works within each 128-bit lane, so indices are lane-relative.
#[cfg(target_arch = "x86_64")]
const fn br_lane_shuffle() -> [i8; 32] {
    let mut mask = [0i8; 32];
    let mut i = 0;
    while i < 32 {
        let b = (i % 16) as i8;
        mask[i] = match b % 4 {
            0 => b + 2,
            2 => b - 2,
            _ => b,
        };
        i += 1;
    }
    mask
}

#[cfg(target_arch = "x86_64")]
const BR_LANE_SHUFFLE: [i8; 32] = br_lane_shuffle();

#[cfg(target_arch = "x86_64")]
#[rite]
fn swap4_row_v3(_token: X64V3Token, src: &[u8], dst: &mut [u8]) {
    let mask = _mm256_loadu_si256(&BR_LANE_SHUFFLE);
    let (src_blocks, src_tail) = src.as_chunks::<32>();
    let (dst_blocks, dst_tail) = dst.as_chunks_mut::<32>();
    for (s, d) in src_blocks.iter().zip(dst_blocks.iter_mut()) {
        _mm256_storeu_si256(d, _mm256_shuffle_epi8(_mm256_loadu_si256(s), mask));
    }
    swap4_pixels(src_tail, dst_tail);
}

#[cfg(target_arch = "x86_64")]
#[arcane]
fn copy_swap4_strided_v3(
    t: X64V3Token,
    src: &[u8],
    dst: &mut [u8],
    row_bytes: usize,
    height: usize,
    src_stride: usize,
    dst_stride: usize,
) {
    for y in 0..height {
        swap4_row_v3(
            t,
            &src[y * src_stride..][..row_bytes],
            &mut dst[y * dst_stride..][..row_bytes],
        );
    }
}

// ===========================================================================
// Public (crate) API
// ===========================================================================

/// Copy `height` rows of `row_bytes` bytes, exchanging bytes 0 and 2 of each
/// `bpp`-byte pixel. `bpp` must be 3 or 4; callers have validated strides.
pub(crate) fn copy_swap_br_strided(
    src: &[u8],
    dst: &mut [u8],
    bpp: usize,
    row_bytes: usize,
    height: usize,
    src_stride: usize,
    dst_stride: usize,
) {
    debug_assert!(bpp == 3 || bpp == 4);
    debug_assert!(row_bytes % bpp == 0);
    if bpp == 4 {
        incant!(
            copy_swap4_strided(src, dst, row_bytes, height, src_stride, dst_stride),
            [v3, scalar]
        );
    } else {
        for y in 0..height {
            swap3_pixels(
                &src[y * src_stride..][..row_bytes],
                &mut dst[y * dst_stride..][..row_bytes],
            );
        }
    }
}
