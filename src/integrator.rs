//! Path-traced radiance estimation, the frame renderer, and the image loss.
//!
//! The whole frame is rendered in tracked scalars, so the tape spans every
//! pixel and the MSE loss can push gradients back through the light
//! transport into the scene parameters.

use std::f64::consts::PI;

use crate::autograd::{Direction, Point, Var, Vec3};
use crate::sampling;
use crate::scene::{Ray, Scene};

/// Offset applied along the normal when spawning secondary rays, to escape
/// self-intersection.
const OFFSET_EPS: f64 = 1e-4;

/// Render dimensions and sampling effort.
pub struct RenderSettings {
    pub width: usize,
    pub height: usize,
    /// Samples per pixel.
    pub spp: usize,
    /// Maximum path depth.
    pub depth: u32,
}

/// Recursive radiance estimate along `ray`.
///
/// Emissive surfaces terminate the path: their emission is returned without
/// a BSDF interaction. Misses, roulette absorption, and exhausted depth all
/// contribute zero; none of these is an error.
#[must_use]
pub fn radiance(scene: &Scene, ray: &Ray, depth: u32) -> Vec3 {
    if depth == 0 {
        return Vec3::zero();
    }

    let Some(hit) = scene.intersect(ray) else {
        return Vec3::zero();
    };
    let material = &hit.material;

    if material.emission.max_channel().value() > 0.0 {
        return material.emission.clone();
    }

    let Some((lobe, prob)) = material.roulette() else {
        return Vec3::zero();
    };

    let wi = lobe.sample(&hit.wo, &hit.n);
    let fr = &lobe.evaluate(&hit.wo, &wi, &hit.n) / prob;
    let cos_theta_i = lobe.cos_theta_i(&wi, &hit.n);
    let pdf = lobe.pdf(&hit.wo, &wi, &hit.n);

    let origin = &hit.p + &(&hit.n * OFFSET_EPS);

    // The leading pi compensates for the diffuse lobe folding 1/pi into its
    // throughput while reporting pdf = cosThetaI = 1.
    let bounce = radiance(scene, &Ray::new(origin.clone(), wi), depth - 1);
    let mut total = &(&bounce * &fr) * (PI * cos_theta_i / pdf);

    // Next-event estimation toward every point light. The solid-angle
    // geometry of the 1/r^2 falloff already stands in for cos/pdf, so no
    // further factor is applied here.
    for light in scene.lights() {
        if scene.occluded(&origin, &light.position) {
            continue;
        }
        let to_light = &light.position - &hit.p;
        let direct = &(&light.power * &fr) / &to_light.norm_squared();
        total = &total + &direct;
    }

    total
}

/// Renders one frame into a row-major, top-to-bottom pixel buffer of
/// differentiable 3-vectors.
///
/// The camera is a fixed pinhole at (0, 0, -3) looking toward +z, with the
/// image plane spanning [-1, 1]^2 at z = 0. Each of the `spp` samples per
/// pixel is jittered inside the pixel footprint.
#[must_use]
pub fn render(scene: &Scene, settings: &RenderSettings) -> Vec<Vec3> {
    let eye = Point::new(0.0, 0.0, -3.0);
    let forward = Direction::new(0.0, 0.0, 3.0);
    let up = Direction::new(0.0, 1.0, 0.0);
    let left = Direction::new(-1.0, 0.0, 0.0);

    let delta_u = 2.0 / settings.width as f64;
    let delta_v = 2.0 / settings.height as f64;

    let mut pixels = Vec::with_capacity(settings.width * settings.height);
    for y in 0..settings.height {
        for x in 0..settings.width {
            let mut acc = Vec3::zero();
            for _ in 0..settings.spp {
                let u = x as f64 / settings.width as f64 + sampling::uniform(0.0, delta_u);
                let v = y as f64 / settings.height as f64 + sampling::uniform(0.0, delta_v);

                let d = &(&forward + &(&left * (1.0 - 2.0 * u))) + &(&up * (1.0 - 2.0 * v));
                acc = &acc + &radiance(scene, &Ray::new(eye.clone(), d), settings.depth);
            }
            pixels.push(&acc / settings.spp as f64);
        }
    }
    pixels
}

/// Mean squared error between two pixel buffers, as one tracked scalar.
///
/// # Panics
///
/// Panics when the buffers differ in length.
#[must_use]
pub fn mse_loss(prediction: &[Vec3], target: &[Vec3]) -> Var {
    assert_eq!(
        prediction.len(),
        target.len(),
        "mse_loss: buffer sizes differ"
    );
    let mut sum = Var::new(0.0);
    for (predicted, wanted) in prediction.iter().zip(target) {
        sum = &sum + &(predicted - wanted).norm_squared();
    }
    &sum / prediction.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::material::Material;
    use crate::scene::{PointLight, Sphere};

    fn settings(width: usize, height: usize, spp: usize, depth: u32) -> RenderSettings {
        RenderSettings {
            width,
            height,
            spp,
            depth,
        }
    }

    #[test]
    fn scene_without_emitters_renders_black() {
        sampling::reseed(3);
        let mut scene = Scene::new();
        scene.add_sphere(Sphere::new(
            Point::new(0.0, 0.0, 0.5),
            0.4,
            Rc::new(Material::new(
                Vec3::zero(),
                Vec3::new(0.9, 0.9, 0.9),
                Vec3::zero(),
                Vec3::zero(),
            )),
        ));
        let pixels = render(&scene, &settings(4, 4, 4, 8));
        for px in &pixels {
            assert_eq!(px.value(), [0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn zero_depth_contributes_nothing() {
        let cornell = crate::scene::cornell::cornell_box();
        let ray = Ray::new(Point::new(0.0, 0.0, -3.0), Direction::new(0.0, 0.0, 1.0));
        let out = radiance(&cornell.scene, &ray, 0);
        assert_eq!(out.value(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn emissive_surface_terminates_the_path() {
        let mut scene = Scene::new();
        scene.add_sphere(Sphere::new(
            Point::new(0.0, 0.0, 0.5),
            0.4,
            Rc::new(Material::new(
                Vec3::new(2.0, 1.0, 0.5),
                Vec3::new(0.9, 0.9, 0.9),
                Vec3::zero(),
                Vec3::zero(),
            )),
        ));
        let ray = Ray::new(Point::new(0.0, 0.0, -3.0), Direction::new(0.0, 0.0, 1.0));
        let out = radiance(&scene, &ray, 4);
        assert_eq!(out.value(), [2.0, 1.0, 0.5]);
    }

    #[test]
    fn point_light_adds_direct_radiance_to_a_diffuse_surface() {
        sampling::reseed(5);
        let mut scene = Scene::new();
        // A diffuse sphere facing the camera, lit from the camera side.
        scene.add_sphere(Sphere::new(
            Point::new(0.0, 0.0, 0.5),
            0.4,
            Rc::new(Material::new(
                Vec3::zero(),
                Vec3::new(0.9, 0.9, 0.9),
                Vec3::zero(),
                Vec3::zero(),
            )),
        ));
        scene.add_light(PointLight {
            position: Point::new(0.0, 0.0, -1.0),
            power: Vec3::new(1.0, 1.0, 1.0),
        });

        let ray = Ray::new(Point::new(0.0, 0.0, -3.0), Direction::new(0.0, 0.0, 1.0));
        let mut lit = 0usize;
        for _ in 0..50 {
            let out = radiance(&scene, &ray, 2);
            assert!(!out.is_nan());
            if out.value()[0] > 0.0 {
                lit += 1;
            }
        }
        // The roulette keeps 90% of the paths; every survivor sees the light.
        assert!(lit > 30, "only {lit} of 50 paths saw the light");
    }

    #[test]
    fn occluded_light_contributes_nothing_directly() {
        sampling::reseed(6);
        let mut scene = Scene::new();
        let black = Rc::new(Material::new(
            Vec3::zero(),
            Vec3::zero(),
            Vec3::zero(),
            Vec3::zero(),
        ));
        // Target surface behind an absorbing blocker, light behind the
        // blocker as well.
        scene.add_sphere(Sphere::new(Point::new(0.0, 0.0, 2.0), 0.4, black.clone()));
        scene.add_sphere(Sphere::new(
            Point::new(0.0, 0.0, 0.5),
            0.2,
            Rc::new(Material::new(
                Vec3::zero(),
                Vec3::new(0.9, 0.9, 0.9),
                Vec3::zero(),
                Vec3::zero(),
            )),
        ));
        scene.add_light(PointLight {
            position: Point::new(0.0, 0.0, 2.0),
            power: Vec3::new(5.0, 5.0, 5.0),
        });

        // The diffuse sphere's camera-facing point cannot see the light
        // through itself or the blocker.
        let ray = Ray::new(Point::new(0.0, 0.0, -3.0), Direction::new(0.0, 0.0, 1.0));
        for _ in 0..20 {
            let out = radiance(&scene, &ray, 1);
            assert_eq!(out.value(), [0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn mse_of_identical_buffers_is_zero() {
        let buffer = vec![Vec3::new(0.1, 0.2, 0.3), Vec3::new(0.4, 0.5, 0.6)];
        let loss = mse_loss(&buffer, &buffer);
        assert_eq!(loss.value(), 0.0);
    }

    #[test]
    fn mse_matches_a_hand_computed_value() {
        let a = vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0)];
        let b = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0)];
        // (1 + 4) / 2
        let loss = mse_loss(&a, &b);
        assert!((loss.value() - 2.5).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "buffer sizes differ")]
    fn mse_rejects_mismatched_buffers() {
        let a = vec![Vec3::zero()];
        let b = vec![Vec3::zero(), Vec3::zero()];
        let _ = mse_loss(&a, &b);
    }

    #[test]
    fn fixed_seed_renders_are_identical() {
        let cornell = crate::scene::cornell::cornell_box();
        let settings = settings(4, 4, 2, 3);

        sampling::reseed(99);
        let first = render(&cornell.scene, &settings);
        sampling::reseed(99);
        let second = render(&cornell.scene, &settings);

        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.value(), b.value());
        }
    }

    #[test]
    fn gradients_reach_a_wall_albedo_through_the_frame() {
        let cornell = crate::scene::cornell::cornell_box();
        cornell.right_wall.diffuse.k.requires_grad(true);

        sampling::reseed(17);
        let target = render(&cornell.scene, &settings(4, 4, 4, 4));
        let prediction: Vec<Vec3> = target
            .iter()
            .map(|px| {
                let [x, y, z] = px.value();
                Vec3::new(x + 0.25, y, z)
            })
            .collect();

        let loss = mse_loss(&target, &prediction);
        loss.backward();
        let grad = cornell.right_wall.diffuse.k.grad();
        assert!(
            grad.iter().any(|g| *g != 0.0),
            "no gradient reached the wall albedo"
        );
    }
}
