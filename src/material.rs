//! Materials: an emissive term plus one lobe of each kind, selected per
//! scattering event by Russian roulette.

use crate::autograd::Vec3;
use crate::bsdf::{DiffuseLobe, LobeRef, RefractiveLobe, SpecularLobe};
use crate::sampling;

/// Surface material: emission plus diffuse, specular, and refractive lobes
/// owned by value.
///
/// The roulette weight of each lobe is the maximum channel of its albedo,
/// fixed at construction. Materials are shared across primitives through
/// `Rc`; training a shared material's albedo moves every sharer at once.
pub struct Material {
    pub emission: Vec3,
    pub diffuse: DiffuseLobe,
    pub specular: SpecularLobe,
    pub refractive: RefractiveLobe,
    prob_d: f64,
    prob_s: f64,
    prob_r: f64,
}

impl Material {
    /// Builds a material with the default air/glass refractive indices
    /// (1.0 / 1.5).
    #[must_use]
    pub fn new(emission: Vec3, kd: Vec3, ks: Vec3, kr: Vec3) -> Self {
        Material::with_ior(emission, kd, ks, kr, 1.0, 1.5)
    }

    /// Builds a material with explicit refractive indices for the
    /// refractive lobe.
    ///
    /// When the roulette weights sum past 1 the weights and albedos are
    /// rescaled by the total, which preserves the unbiasedness of the
    /// estimator.
    #[must_use]
    pub fn with_ior(emission: Vec3, kd: Vec3, ks: Vec3, kr: Vec3, n1: f64, n2: f64) -> Self {
        let mut prob_d = kd.max_channel().value();
        let mut prob_s = ks.max_channel().value();
        let mut prob_r = kr.max_channel().value();

        let total = prob_d + prob_s + prob_r;
        let (kd, ks, kr) = if total > 1.0 {
            log::warn!("lobe weights sum to {total:.4} > 1; renormalizing albedos");
            prob_d /= total;
            prob_s /= total;
            prob_r /= total;
            (&kd / total, &ks / total, &kr / total)
        } else {
            (kd, ks, kr)
        };

        Material {
            emission,
            diffuse: DiffuseLobe { k: kd },
            specular: SpecularLobe { k: ks },
            refractive: RefractiveLobe { k: kr, n1, n2 },
            prob_d,
            prob_s,
            prob_r,
        }
    }

    /// Roulette weights `(diffuse, specular, refractive)`.
    #[must_use]
    pub fn lobe_weights(&self) -> (f64, f64, f64) {
        (self.prob_d, self.prob_s, self.prob_r)
    }

    /// Selects a lobe by Russian roulette on one uniform draw.
    ///
    /// Returns the selected lobe and its selection probability, or `None`
    /// when the path is absorbed.
    #[must_use]
    pub fn roulette(&self) -> Option<(LobeRef<'_>, f64)> {
        let p = sampling::uniform(0.0, 1.0);

        if p < self.prob_d {
            Some((LobeRef::Diffuse(&self.diffuse), self.prob_d))
        } else if p < self.prob_d + self.prob_s {
            Some((LobeRef::Specular(&self.specular), self.prob_s))
        } else if p < self.prob_d + self.prob_s + self.prob_r {
            Some((LobeRef::Refractive(&self.refractive), self.prob_r))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diffuse_only(kd: Vec3) -> Material {
        Material::new(Vec3::zero(), kd, Vec3::zero(), Vec3::zero())
    }

    #[test]
    fn weights_come_from_max_albedo_channels() {
        let m = Material::new(
            Vec3::zero(),
            Vec3::new(0.2, 0.5, 0.1),
            Vec3::new(0.3, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 0.1),
        );
        assert_eq!(m.lobe_weights(), (0.5, 0.3, 0.1));
    }

    #[test]
    fn full_weight_always_selects_the_diffuse_lobe() {
        sampling::reseed(11);
        let m = diffuse_only(Vec3::new(1.0, 0.4, 0.4));
        for _ in 0..100 {
            let (lobe, prob) = m.roulette().expect("weight 1 cannot absorb");
            assert!(matches!(lobe, LobeRef::Diffuse(_)));
            assert_eq!(prob, 1.0);
        }
    }

    #[test]
    fn zero_albedos_always_absorb() {
        sampling::reseed(12);
        let m = diffuse_only(Vec3::zero());
        for _ in 0..100 {
            assert!(m.roulette().is_none());
        }
    }

    #[test]
    fn overflowing_weights_are_renormalized() {
        let m = Material::new(
            Vec3::zero(),
            Vec3::new(0.9, 0.9, 0.9),
            Vec3::new(0.6, 0.6, 0.6),
            Vec3::new(0.5, 0.5, 0.5),
        );
        let (pd, ps, pr) = m.lobe_weights();
        assert!((pd + ps + pr - 1.0).abs() < 1e-12);
        assert!((pd - 0.45).abs() < 1e-12);
        // Albedos are rescaled by the same factor.
        assert!((m.diffuse.k.x.value() - 0.45).abs() < 1e-12);
        assert!((m.specular.k.x.value() - 0.3).abs() < 1e-12);
        assert!((m.refractive.k.x.value() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn selection_frequencies_track_the_weights() {
        sampling::reseed(13);
        let m = Material::new(
            Vec3::zero(),
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(0.3, 0.0, 0.0),
            Vec3::zero(),
        );
        let mut counts = [0usize; 3];
        let trials = 20_000;
        for _ in 0..trials {
            match m.roulette() {
                Some((LobeRef::Diffuse(_), _)) => counts[0] += 1,
                Some((LobeRef::Specular(_), _)) => counts[1] += 1,
                Some((LobeRef::Refractive(_), _)) => counts[2] += 1,
                None => {}
            }
        }
        let freq_d = counts[0] as f64 / trials as f64;
        let freq_s = counts[1] as f64 / trials as f64;
        assert!((freq_d - 0.5).abs() < 0.02);
        assert!((freq_s - 0.3).abs() < 0.02);
        assert_eq!(counts[2], 0);
    }
}
