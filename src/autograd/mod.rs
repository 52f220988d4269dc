//! Autograd: scalar computation tape with reverse-mode differentiation.
//!
//! The tape is built implicitly as arithmetic runs: every derived [`Var`]
//! carries a backward descriptor holding shared references to its parents.
//! [`Var::backward`] propagates a gradient from a loss node down the tape,
//! accumulating into the leaves that have gradient tracking enabled.
//! [`Vec3`] layers a differentiable 3-vector on top; all vector operations
//! lower to scalar operations on the three components.

pub mod impls;

pub use impls::scalar::Var;
pub use impls::vector::{Direction, Point, Vec3};
