//! BSDF lobes: diffuse, perfect mirror, and refractive scattering.
//!
//! The lobe set is closed, so dispatch goes through the [`LobeRef`] sum type
//! instead of a trait object. Every lobe exposes `evaluate`, `sample`,
//! `pdf`, and `cos_theta_i`; the integrator uses the product
//! `evaluate * cos_theta_i / pdf`. Lobes that cancel terms analytically
//! (cosine sampling for the diffuse lobe, Dirac directions for the mirror
//! and refractive lobes) bake the cancellation in and report
//! `pdf = cos_theta_i = 1`; the integrator compensates with a factor of π.

use std::f64::consts::FRAC_1_PI;

use crate::autograd::{Direction, Vec3};
use crate::sampling;

/// Mirror reflection of `d` about the unit normal `n`.
#[must_use]
pub fn reflect(d: &Direction, n: &Direction) -> Direction {
    d - &(n * &(2.0 * &n.dot(d)))
}

/// Snell refraction of `d` across an interface with refractive indices
/// `n1` (outside) and `n2` (inside), without a Fresnel split. Total internal
/// reflection falls back to [`reflect`].
#[must_use]
pub fn refract(d: &Direction, n: &Direction, n1: f64, n2: f64) -> Direction {
    let eta = n1 / n2;
    let cos_i = n.dot(d);
    let sin2_t = &(1.0 - &(&cos_i * &cos_i)) * (eta * eta);

    if sin2_t.value() > 1.0 {
        return reflect(d, n);
    }

    let cos_t = (1.0 - &sin2_t).sqrt();
    &(d * eta) + &(n * &(&(&cos_i * eta) - &cos_t))
}

/// Lambertian lobe with albedo `k`.
pub struct DiffuseLobe {
    pub k: Vec3,
}

/// Perfect-mirror lobe with tint `k`.
pub struct SpecularLobe {
    pub k: Vec3,
}

/// Refractive lobe with tint `k` and the refractive indices of the two
/// media.
pub struct RefractiveLobe {
    pub k: Vec3,
    pub n1: f64,
    pub n2: f64,
}

/// A borrowed lobe selected for one scattering event.
#[derive(Clone, Copy)]
pub enum LobeRef<'a> {
    Diffuse(&'a DiffuseLobe),
    Specular(&'a SpecularLobe),
    Refractive(&'a RefractiveLobe),
}

impl LobeRef<'_> {
    /// BSDF value for the pair of directions `wo`, `wi` at normal `n`.
    ///
    /// The Dirac lobes return their tint when `wi` is the lobe's unique
    /// scatter direction and zero otherwise.
    #[must_use]
    pub fn evaluate(&self, wo: &Direction, wi: &Direction, n: &Direction) -> Vec3 {
        match self {
            LobeRef::Diffuse(lobe) => &lobe.k * FRAC_1_PI,
            LobeRef::Specular(lobe) => {
                if *wi == reflect(&-wo, n) {
                    lobe.k.clone()
                } else {
                    Vec3::zero()
                }
            }
            LobeRef::Refractive(lobe) => {
                if *wi == refract(&-wo, n, lobe.n1, lobe.n2) {
                    lobe.k.clone()
                } else {
                    Vec3::zero()
                }
            }
        }
    }

    /// Draws an incoming direction for the outgoing direction `wo`.
    #[must_use]
    pub fn sample(&self, wo: &Direction, n: &Direction) -> Direction {
        match self {
            LobeRef::Diffuse(_) => sampling::cosine_hemisphere(n),
            LobeRef::Specular(_) => reflect(&-wo, n),
            LobeRef::Refractive(lobe) => refract(&-wo, n, lobe.n1, lobe.n2),
        }
    }

    /// Sampling density for `wi`. Cancelled analytically for every lobe.
    #[must_use]
    pub fn pdf(&self, _wo: &Direction, _wi: &Direction, _n: &Direction) -> f64 {
        match self {
            // Cosine sampling cancels cos(theta)/pdf.
            LobeRef::Diffuse(_) => 1.0,
            // Dirac lobes cancel against their own delta.
            LobeRef::Specular(_) | LobeRef::Refractive(_) => 1.0,
        }
    }

    /// Cosine of the incident angle. Cancelled analytically for every lobe;
    /// see [`LobeRef::pdf`].
    #[must_use]
    pub fn cos_theta_i(&self, _wi: &Direction, _n: &Direction) -> f64 {
        1.0
    }
}
