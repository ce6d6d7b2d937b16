// SIMD kernels for coordinate-wise distances over f64 feature vectors
// Hierarchy: AVX2 on x86_64, NEON on aarch64, scalar fallback with two accumulators

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

// Below this length the scalar loop wins
#[cfg(target_arch = "x86_64")]
const MIN_DIM_SIZE_AVX: usize = 16;

#[cfg(target_arch = "aarch64")]
const MIN_DIM_SIZE_SIMD: usize = 8;

/// SIMD-optimized Manhattan (L1) distance
///
/// Returns `f64::INFINITY` on a length mismatch.
#[inline]
pub fn manhattan_distance_simd(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") && a.len() >= MIN_DIM_SIZE_AVX {
            return unsafe { manhattan_distance_avx2(a, b) };
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if std::arch::is_aarch64_feature_detected!("neon") && a.len() >= MIN_DIM_SIZE_SIMD {
            return unsafe { manhattan_distance_neon(a, b) };
        }
    }

    manhattan_distance_scalar(a, b)
}

/// AVX2 Manhattan distance (8 doubles per iteration across two registers)
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn manhattan_distance_avx2(a: &[f64], b: &[f64]) -> f64 {
    let dim = a.len();
    let mut i = 0;

    // Clearing the sign bit gives |x|
    let sign_mask = _mm256_set1_pd(-0.0);
    let mut sum1 = _mm256_setzero_pd();
    let mut sum2 = _mm256_setzero_pd();

    while i + 7 < dim {
        let va1 = _mm256_loadu_pd(a.as_ptr().add(i));
        let vb1 = _mm256_loadu_pd(b.as_ptr().add(i));
        let va2 = _mm256_loadu_pd(a.as_ptr().add(i + 4));
        let vb2 = _mm256_loadu_pd(b.as_ptr().add(i + 4));

        let diff1 = _mm256_andnot_pd(sign_mask, _mm256_sub_pd(va1, vb1));
        let diff2 = _mm256_andnot_pd(sign_mask, _mm256_sub_pd(va2, vb2));

        sum1 = _mm256_add_pd(sum1, diff1);
        sum2 = _mm256_add_pd(sum2, diff2);

        i += 8;
    }

    let combined = _mm256_add_pd(sum1, sum2);
    let mut lanes = [0.0f64; 4];
    _mm256_storeu_pd(lanes.as_mut_ptr(), combined);
    let mut total = (lanes[0] + lanes[1]) + (lanes[2] + lanes[3]);

    while i < dim {
        total += (a[i] - b[i]).abs();
        i += 1;
    }

    total
}

/// NEON Manhattan distance for ARM/Apple Silicon
#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
#[inline]
unsafe fn manhattan_distance_neon(a: &[f64], b: &[f64]) -> f64 {
    let dim = a.len();
    let mut i = 0;

    let mut sum1 = vdupq_n_f64(0.0);
    let mut sum2 = vdupq_n_f64(0.0);

    while i + 3 < dim {
        let va1 = vld1q_f64(a.as_ptr().add(i));
        let vb1 = vld1q_f64(b.as_ptr().add(i));
        let va2 = vld1q_f64(a.as_ptr().add(i + 2));
        let vb2 = vld1q_f64(b.as_ptr().add(i + 2));

        sum1 = vaddq_f64(sum1, vabsq_f64(vsubq_f64(va1, vb1)));
        sum2 = vaddq_f64(sum2, vabsq_f64(vsubq_f64(va2, vb2)));

        i += 4;
    }

    let mut total = vaddvq_f64(vaddq_f64(sum1, sum2));

    while i < dim {
        total += (a[i] - b[i]).abs();
        i += 1;
    }

    total
}

/// Scalar Manhattan distance (two accumulators for better pipelining)
#[inline]
fn manhattan_distance_scalar(a: &[f64], b: &[f64]) -> f64 {
    let mut sum0 = 0.0f64;
    let mut sum1 = 0.0f64;

    let chunks = a.chunks_exact(4);
    let remainder = chunks.remainder();
    let b_chunks = b.chunks_exact(4);

    for (a_chunk, b_chunk) in chunks.zip(b_chunks) {
        sum0 += (a_chunk[0] - b_chunk[0]).abs() + (a_chunk[1] - b_chunk[1]).abs();
        sum1 += (a_chunk[2] - b_chunk[2]).abs() + (a_chunk[3] - b_chunk[3]).abs();
    }

    for i in (a.len() - remainder.len())..a.len() {
        sum0 += (a[i] - b[i]).abs();
    }

    sum0 + sum1
}

/// SIMD-optimized L2 distance (Euclidean)
#[inline]
pub fn l2_distance_simd(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") && a.len() >= MIN_DIM_SIZE_AVX {
            return unsafe { l2_distance_avx2(a, b) };
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if std::arch::is_aarch64_feature_detected!("neon") && a.len() >= MIN_DIM_SIZE_SIMD {
            return unsafe { l2_distance_neon(a, b) };
        }
    }

    l2_distance_scalar(a, b)
}

/// AVX2 L2 distance
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn l2_distance_avx2(a: &[f64], b: &[f64]) -> f64 {
    let dim = a.len();
    let mut i = 0;

    let mut sum1 = _mm256_setzero_pd();
    let mut sum2 = _mm256_setzero_pd();

    while i + 7 < dim {
        let diff1 = _mm256_sub_pd(
            _mm256_loadu_pd(a.as_ptr().add(i)),
            _mm256_loadu_pd(b.as_ptr().add(i)),
        );
        let diff2 = _mm256_sub_pd(
            _mm256_loadu_pd(a.as_ptr().add(i + 4)),
            _mm256_loadu_pd(b.as_ptr().add(i + 4)),
        );

        sum1 = _mm256_add_pd(sum1, _mm256_mul_pd(diff1, diff1));
        sum2 = _mm256_add_pd(sum2, _mm256_mul_pd(diff2, diff2));

        i += 8;
    }

    let combined = _mm256_add_pd(sum1, sum2);
    let mut lanes = [0.0f64; 4];
    _mm256_storeu_pd(lanes.as_mut_ptr(), combined);
    let mut sum_sq = (lanes[0] + lanes[1]) + (lanes[2] + lanes[3]);

    while i < dim {
        let diff = a[i] - b[i];
        sum_sq += diff * diff;
        i += 1;
    }

    sum_sq.sqrt()
}

/// NEON L2 distance
#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
#[inline]
unsafe fn l2_distance_neon(a: &[f64], b: &[f64]) -> f64 {
    let dim = a.len();
    let mut i = 0;

    let mut sum1 = vdupq_n_f64(0.0);
    let mut sum2 = vdupq_n_f64(0.0);

    while i + 3 < dim {
        let diff1 = vsubq_f64(vld1q_f64(a.as_ptr().add(i)), vld1q_f64(b.as_ptr().add(i)));
        let diff2 = vsubq_f64(vld1q_f64(a.as_ptr().add(i + 2)), vld1q_f64(b.as_ptr().add(i + 2)));

        sum1 = vfmaq_f64(sum1, diff1, diff1);
        sum2 = vfmaq_f64(sum2, diff2, diff2);

        i += 4;
    }

    let mut sum_sq = vaddvq_f64(vaddq_f64(sum1, sum2));

    while i < dim {
        let diff = a[i] - b[i];
        sum_sq += diff * diff;
        i += 1;
    }

    sum_sq.sqrt()
}

/// Scalar L2 distance (two accumulators for better pipelining)
#[inline]
fn l2_distance_scalar(a: &[f64], b: &[f64]) -> f64 {
    let mut sum0 = 0.0f64;
    let mut sum1 = 0.0f64;

    let chunks = a.chunks_exact(4);
    let remainder = chunks.remainder();
    let b_chunks = b.chunks_exact(4);

    for (a_chunk, b_chunk) in chunks.zip(b_chunks) {
        let d0 = a_chunk[0] - b_chunk[0];
        let d1 = a_chunk[1] - b_chunk[1];
        let d2 = a_chunk[2] - b_chunk[2];
        let d3 = a_chunk[3] - b_chunk[3];

        sum0 += d0 * d0 + d1 * d1;
        sum1 += d2 * d2 + d3 * d3;
    }

    for i in (a.len() - remainder.len())..a.len() {
        let diff = a[i] - b[i];
        sum0 += diff * diff;
    }

    (sum0 + sum1).sqrt()
}
