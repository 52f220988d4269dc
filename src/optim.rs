//! Optimizers: SGD with momentum and Adam, driven by the gradient tape.
//!
//! Parameters are registered in insertion order; auxiliary state (momentum,
//! Adam moments) lives in plain float arrays indexed the same way and never
//! enters the tape. Adding a parameter after the first `step` is undefined.

use crate::autograd::{Var, Vec3};

/// Default Adam exponential decay rate for the first moment.
pub const ADAM_BETA1: f64 = 0.9;
/// Default Adam exponential decay rate for the second moment.
pub const ADAM_BETA2: f64 = 0.999;
/// Default Adam denominator offset.
pub const ADAM_EPSILON: f64 = 1e-8;

/// Common optimizer surface: parameter registration, gradient reset, and
/// the update step.
pub trait Optimizer {
    /// Registers a leaf scalar that accumulates gradients.
    ///
    /// # Panics
    ///
    /// Panics when the scalar is derived or has gradient tracking disabled;
    /// callers flip `requires_grad` before registering.
    fn add_param(&mut self, param: &Var);

    /// Registers the three components of a vector, in x, y, z order.
    fn add_vec3(&mut self, v: &Vec3) {
        self.add_param(&v.x);
        self.add_param(&v.y);
        self.add_param(&v.z);
    }

    /// Zeroes the gradient of every registered parameter.
    fn zero_grad(&self);

    /// Applies one update to every registered parameter from its
    /// accumulated gradient.
    fn step(&mut self);
}

fn check_registrable(param: &Var) {
    assert!(
        param.is_leaf() && param.accumulates_grad(),
        "optimizer parameters must be accumulating leaves; call requires_grad(true) first"
    );
}

/// Gradient with the L2 term folded in.
fn regularized_grad(param: &Var, weight_decay: f64) -> f64 {
    let mut grad = param.grad();
    if weight_decay > 0.0 {
        grad += weight_decay * param.value();
    }
    grad
}

/// Stochastic gradient descent with optional momentum and L2 weight decay.
pub struct Sgd {
    params: Vec<Var>,
    velocity: Vec<f64>,
    lr: f64,
    weight_decay: f64,
    momentum: f64,
}

impl Sgd {
    /// Plain SGD.
    #[must_use]
    pub fn new(lr: f64) -> Self {
        Sgd::with_momentum(lr, 0.0, 0.0)
    }

    /// SGD with momentum `mu` and L2 coefficient `weight_decay`; both may
    /// be zero.
    #[must_use]
    pub fn with_momentum(lr: f64, weight_decay: f64, momentum: f64) -> Self {
        Sgd {
            params: Vec::new(),
            velocity: Vec::new(),
            lr,
            weight_decay,
            momentum,
        }
    }
}

impl Optimizer for Sgd {
    fn add_param(&mut self, param: &Var) {
        check_registrable(param);
        self.params.push(param.clone());
        self.velocity.push(0.0);
    }

    fn zero_grad(&self) {
        for param in &self.params {
            param.zero_grad();
        }
    }

    fn step(&mut self) {
        for (param, velocity) in self.params.iter().zip(self.velocity.iter_mut()) {
            let grad = regularized_grad(param, self.weight_decay);
            if self.momentum > 0.0 {
                *velocity = self.momentum * *velocity - self.lr * grad;
                param.update(param.value() + *velocity);
            } else {
                param.update(param.value() - self.lr * grad);
            }
        }
    }
}

/// Adam with bias-corrected first and second moments and L2 weight decay.
pub struct Adam {
    params: Vec<Var>,
    m: Vec<f64>,
    v: Vec<f64>,
    t: i32,
    lr: f64,
    weight_decay: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
}

impl Adam {
    /// Adam with the default betas and epsilon.
    #[must_use]
    pub fn new(lr: f64, weight_decay: f64) -> Self {
        Adam::with_hyperparams(lr, weight_decay, ADAM_BETA1, ADAM_BETA2, ADAM_EPSILON)
    }

    #[must_use]
    pub fn with_hyperparams(
        lr: f64,
        weight_decay: f64,
        beta1: f64,
        beta2: f64,
        epsilon: f64,
    ) -> Self {
        Adam {
            params: Vec::new(),
            m: Vec::new(),
            v: Vec::new(),
            t: 0,
            lr,
            weight_decay,
            beta1,
            beta2,
            epsilon,
        }
    }
}

impl Optimizer for Adam {
    fn add_param(&mut self, param: &Var) {
        check_registrable(param);
        self.params.push(param.clone());
        self.m.push(0.0);
        self.v.push(0.0);
    }

    fn zero_grad(&self) {
        for param in &self.params {
            param.zero_grad();
        }
    }

    fn step(&mut self) {
        self.t += 1;
        for (i, param) in self.params.iter().enumerate() {
            let grad = regularized_grad(param, self.weight_decay);

            self.m[i] = self.beta1 * self.m[i] + (1.0 - self.beta1) * grad;
            self.v[i] = self.beta2 * self.v[i] + (1.0 - self.beta2) * grad * grad;

            let m_hat = self.m[i] / (1.0 - self.beta1.powi(self.t));
            let v_hat = self.v[i] / (1.0 - self.beta2.powi(self.t));

            param.update(param.value() - self.lr * m_hat / (v_hat.sqrt() + self.epsilon));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds loss = p^2, runs backward, leaving grad = 2p on the leaf.
    fn backward_square(param: &Var) {
        let loss = param * param;
        loss.backward();
    }

    #[test]
    fn plain_sgd_step() {
        let a = Var::param(5.0);
        let mut optimizer = Sgd::new(0.1);
        optimizer.add_param(&a);

        backward_square(&a);
        optimizer.step();
        assert!((a.value() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn sgd_momentum_accumulates_velocity() {
        let a = Var::param(5.0);
        let mut optimizer = Sgd::with_momentum(0.1, 0.0, 0.9);
        optimizer.add_param(&a);

        backward_square(&a);
        optimizer.step();
        assert!((a.value() - 4.0).abs() < 1e-12);

        optimizer.zero_grad();
        backward_square(&a);
        optimizer.step();
        // v2 = 0.9 * (-1) - 0.1 * 8 = -1.7
        assert!((a.value() - 2.3).abs() < 1e-12);
    }

    #[test]
    fn sgd_weight_decay_pulls_toward_zero() {
        let a = Var::param(5.0);
        let mut optimizer = Sgd::with_momentum(0.1, 1.0, 0.0);
        optimizer.add_param(&a);

        // No backward: the raw gradient is zero, only the L2 term acts.
        optimizer.step();
        assert!((a.value() - 4.5).abs() < 1e-12);
    }

    #[test]
    fn adam_first_step_moves_by_roughly_lr() {
        let a = Var::param(5.0);
        let mut optimizer = Adam::new(0.1, 0.0);
        optimizer.add_param(&a);

        backward_square(&a);
        optimizer.step();
        // m_hat = 10, v_hat = 100, delta = 0.1 * 10 / (10 + eps)
        assert!((a.value() - 4.9).abs() < 1e-6);
    }

    #[test]
    fn adam_converges_on_a_quadratic() {
        let a = Var::param(5.0);
        let mut optimizer = Adam::new(0.1, 0.0);
        optimizer.add_param(&a);

        for _ in 0..400 {
            optimizer.zero_grad();
            backward_square(&a);
            optimizer.step();
        }
        assert!(a.value().abs() < 0.5, "a = {}", a.value());
    }

    #[test]
    fn zero_grad_clears_every_registered_parameter() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        v.requires_grad(true);
        let mut optimizer = Sgd::new(0.1);
        optimizer.add_vec3(&v);

        let loss = v.norm_squared();
        loss.backward();
        assert_ne!(v.grad(), [0.0, 0.0, 0.0]);
        optimizer.zero_grad();
        assert_eq!(v.grad(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn vector_registration_updates_all_components() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        v.requires_grad(true);
        let mut optimizer = Sgd::new(0.5);
        optimizer.add_vec3(&v);

        let loss = v.norm_squared();
        loss.backward();
        optimizer.step();
        // Each component moves by -0.5 * 2c.
        assert_eq!(v.value(), [0.0, 0.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "accumulating leaves")]
    fn registering_an_inert_leaf_is_a_programming_error() {
        let a = Var::new(1.0);
        let mut optimizer = Sgd::new(0.1);
        optimizer.add_param(&a);
    }

    #[test]
    #[should_panic(expected = "accumulating leaves")]
    fn registering_a_derived_scalar_is_a_programming_error() {
        let a = Var::param(1.0);
        let b = &a + &a;
        let mut optimizer = Adam::new(0.1, 0.0);
        optimizer.add_param(&b);
    }
}
