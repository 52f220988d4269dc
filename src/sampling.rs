//! Sampling: deterministic thread-local PRNG and hemisphere sampling.
//!
//! Draws from the PRNG are plain floats, never tracked scalars — gradients
//! do not flow through random choices. The generator is thread-local so a
//! parallel renderer can keep per-thread streams without reseeding at every
//! call site; reseed at frame start for reproducible renders.

use std::cell::RefCell;
use std::f64::consts::PI;

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::autograd::Direction;

/// Seed used for the thread-local generator until [`reseed`] is called.
pub const DEFAULT_SEED: u64 = 5489;

thread_local! {
    static RNG: RefCell<StdRng> = RefCell::new(StdRng::seed_from_u64(DEFAULT_SEED));
}

/// Reseeds the calling thread's generator. For a given thread and seed the
/// subsequent draw sequence is reproducible; cross-thread ordering is not
/// defined.
pub fn reseed(seed: u64) {
    RNG.with(|rng| *rng.borrow_mut() = StdRng::seed_from_u64(seed));
}

/// Uniform draw in `[lo, hi)`.
#[must_use]
pub fn uniform(lo: f64, hi: f64) -> f64 {
    RNG.with(|rng| rng.borrow_mut().random_range(lo..hi))
}

/// Cosine-weighted hemisphere sample around the unit normal `n`.
///
/// Draws `ξ₁, ξ₂`, sets `θ = arccos(√(1−ξ₁))`, `φ = 2πξ₂`, and maps through
/// an orthonormal basis around `n`. The tangent is built from whichever
/// fallback axis has the smaller normal component, which keeps it away from
/// degeneracy. The basis itself is non-differentiable; gradients reach the
/// result only through `n`.
#[must_use]
pub fn cosine_hemisphere(n: &Direction) -> Direction {
    let theta = (1.0 - uniform(0.0, 1.0)).sqrt().acos();
    let phi = 2.0 * PI * uniform(0.0, 1.0);

    let [nx, ny, nz] = n.value();
    let x = if nx.abs() > ny.abs() {
        let inv_len = 1.0 / (nx * nx + nz * nz).sqrt();
        Direction::new(-nz * inv_len, 0.0, nx * inv_len)
    } else {
        let inv_len = 1.0 / (ny * ny + nz * nz).sqrt();
        Direction::new(0.0, nz * inv_len, -ny * inv_len)
    };
    let z = n.clone();
    let y = z.cross(&x);

    &(&(&x * (theta.sin() * phi.cos())) + &(&y * (theta.sin() * phi.sin()))) + &(&z * theta.cos())
}
