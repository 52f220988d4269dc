//! # difftrace
//!
//! Differentiable Monte Carlo path tracer. A frame is rendered entirely in
//! tracked scalars, so an image-space loss can backpropagate through the
//! light transport into scene parameters, and an optimizer can train them —
//! render, loss, backward, step.

pub mod autograd;
pub mod bsdf;
pub mod config;
pub mod integrator;
pub mod material;
pub mod optim;
pub mod ppm;
pub mod sampling;
pub mod scene;

#[cfg(test)]
mod training_tests {
    //! End-to-end loop: perturb a wall albedo and train it back.

    use crate::autograd::Vec3;
    use crate::integrator::{mse_loss, render, RenderSettings};
    use crate::optim::{Adam, Optimizer};
    use crate::sampling;
    use crate::scene::cornell::cornell_box;

    fn distance_to(albedo: &Vec3, goal: [f64; 3]) -> f64 {
        let [x, y, z] = albedo.value();
        ((x - goal[0]).powi(2) + (y - goal[1]).powi(2) + (z - goal[2]).powi(2)).sqrt()
    }

    #[test]
    fn training_moves_a_perturbed_wall_albedo_back() {
        let cornell = cornell_box();
        let settings = RenderSettings {
            width: 8,
            height: 8,
            spp: 4,
            depth: 4,
        };

        sampling::reseed(5489);
        let target = render(&cornell.scene, &settings);

        // Perturb the green wall to blue, then train it back.
        let albedo = &cornell.right_wall.diffuse.k;
        albedo.x.update(0.0);
        albedo.y.update(0.0);
        albedo.z.update(0.9);
        albedo.requires_grad(true);

        let mut optimizer = Adam::new(0.1, 0.01);
        optimizer.add_vec3(albedo);

        let goal = [0.0, 0.9, 0.0];
        let start_distance = distance_to(albedo, goal);

        let mut first_loss = f64::NAN;
        let mut last_loss = f64::NAN;
        for iteration in 0..10 {
            optimizer.zero_grad();

            // Same seed per iteration: the path geometry is fixed, so the
            // loss reflects only the albedo change.
            sampling::reseed(5489);
            let prediction = render(&cornell.scene, &settings);
            let loss = mse_loss(&prediction, &target);
            loss.backward();
            optimizer.step();

            if iteration == 0 {
                first_loss = loss.value();
            }
            last_loss = loss.value();
        }

        assert!(
            last_loss < first_loss,
            "loss did not decrease: {first_loss} -> {last_loss}"
        );
        assert!(
            distance_to(albedo, goal) < start_distance,
            "albedo did not move toward the target"
        );
    }
}
