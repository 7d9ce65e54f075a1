//! Direction-preserving saturation.
//!
//! A vector whose infinity norm exceeds `limit` is scaled as a whole by
//! `limit / norm`. Componentwise clipping would rotate the force direction.

use nalgebra::SVector;

/// Scale `v` so that `max|v_i| <= limit`, keeping its direction.
#[inline]
pub fn saturate_direction_preserving<const D: usize>(
    v: SVector<f32, D>,
    limit: f32,
) -> SVector<f32, D> {
    let norm = v.amax();
    if norm > limit {
        v * (limit / norm)
    } else {
        v
    }
}
