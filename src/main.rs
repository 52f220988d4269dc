//! Binary entrypoint: renders a ground-truth Cornell box, perturbs the
//! right-wall albedo, and trains it back with Adam.

use difftrace::config;
use difftrace::integrator::{mse_loss, render, RenderSettings};
use difftrace::optim::{Adam, Optimizer};
use difftrace::ppm;
use difftrace::sampling;
use difftrace::scene::cornell::cornell_box;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cfg = config::from_env()?;
    cfg.validate()?;
    std::fs::create_dir_all(&cfg.output_dir)?;

    let cornell = cornell_box();
    let settings = RenderSettings {
        width: cfg.width,
        height: cfg.height,
        spp: cfg.spp,
        depth: cfg.depth,
    };

    // Ground truth, rendered with gradients disabled.
    sampling::reseed(cfg.seed);
    let target = render(&cornell.scene, &settings);
    ppm::write_ppm(
        &cfg.output_dir.join("target.ppm"),
        &target,
        cfg.width,
        cfg.height,
    )?;

    // Perturb the green wall to blue and learn the color back.
    let albedo = &cornell.right_wall.diffuse.k;
    albedo.x.update(0.0);
    albedo.y.update(0.0);
    albedo.z.update(0.9);
    albedo.requires_grad(true);

    let mut optimizer = Adam::new(cfg.learning_rate, cfg.weight_decay);
    optimizer.add_vec3(albedo);

    for iteration in 1..=cfg.iterations {
        optimizer.zero_grad();

        // Reseeding at frame start keeps the path geometry fixed across
        // iterations, so the loss tracks the parameter change alone.
        sampling::reseed(cfg.seed);
        let prediction = render(&cornell.scene, &settings);
        let loss = mse_loss(&prediction, &target);
        loss.backward();
        optimizer.step();

        if iteration == 1 || iteration % cfg.loss_log_every == 0 {
            let [r, g, b] = albedo.value();
            println!(
                "[{iteration:4}/{:4}] loss {:.6} | albedo [{r:.3}, {g:.3}, {b:.3}]",
                cfg.iterations,
                loss.value()
            );
        }
        if iteration % cfg.snapshot_every == 0 {
            let path = cfg.output_dir.join(format!("iteration_{iteration}.ppm"));
            ppm::write_ppm(&path, &prediction, cfg.width, cfg.height)?;
        }
    }

    Ok(())
}
