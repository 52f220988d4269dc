//! Scalar autograd: tracked scalars whose arithmetic builds the tape.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Backward descriptor of a tape node, tagged by the operation that produced
/// it. Each variant holds exactly the parents and captured constants its
/// local derivative needs.
enum BackwardFn {
    /// Leaf constant; drops the incoming gradient.
    Inert,
    /// Leaf parameter; accumulates the incoming gradient into its own slot.
    Acc,
    Add(Var, Var),
    Sub(Var, Var),
    Mul(Var, Var),
    Div(Var, Var),
    Neg(Var),
    Pow { base: Var, exponent: f64 },
    Sin(Var),
    Cos(Var),
}

/// Shared state of a tracked scalar: forward value, accumulated gradient,
/// and the backward descriptor linking it to its parents.
struct Slot {
    value: Cell<f64>,
    grad: Cell<f64>,
    backward: RefCell<BackwardFn>,
}

/// A tracked scalar in the autograd tape.
///
/// Wraps its state in an `Rc` so that identity persists under cloning: every
/// handle to the same scalar shares one value and one gradient slot, and a
/// derived scalar keeps its parents alive for as long as any downstream
/// result (typically the loss) is alive.
///
/// A `Var` is either a *leaf* (constructed directly, inert or accumulating)
/// or *derived* (the output of an arithmetic operation). The kind is fixed at
/// construction; only leaves may flip gradient tracking with
/// [`Var::requires_grad`].
#[derive(Clone)]
pub struct Var(Rc<Slot>);

impl Var {
    /// Creates an inert leaf (a constant that does not collect gradients).
    #[must_use]
    pub fn new(value: f64) -> Self {
        Var::with_backward(value, BackwardFn::Inert)
    }

    /// Creates an accumulating leaf (a parameter).
    #[must_use]
    pub fn param(value: f64) -> Self {
        Var::with_backward(value, BackwardFn::Acc)
    }

    fn with_backward(value: f64, backward: BackwardFn) -> Self {
        Var(Rc::new(Slot {
            value: Cell::new(value),
            grad: Cell::new(0.0),
            backward: RefCell::new(backward),
        }))
    }

    /// Forward value.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0.value.get()
    }

    /// Accumulated gradient (meaningful on accumulating leaves, after
    /// [`Var::backward`]).
    #[must_use]
    pub fn grad(&self) -> f64 {
        self.0.grad.get()
    }

    /// Overwrites the forward value, leaving the gradient slot untouched.
    /// This is how an optimizer moves a parameter between iterations.
    pub fn update(&self, value: f64) {
        self.0.value.set(value);
    }

    /// Resets the accumulated gradient of an accumulating leaf to zero.
    /// On any other node this is a warning and a no-op.
    pub fn zero_grad(&self) {
        if !self.accumulates_grad() {
            log::warn!("zero_grad called on a non-accumulating scalar; ignored");
            return;
        }
        self.0.grad.set(0.0);
    }

    /// Enables or disables gradient accumulation on a leaf.
    ///
    /// # Panics
    ///
    /// Panics when called on a derived scalar: the leaf/derived kind is
    /// decided at construction and must not be rewritten afterwards.
    pub fn requires_grad(&self, enabled: bool) {
        let mut backward = self.0.backward.borrow_mut();
        if !matches!(*backward, BackwardFn::Inert | BackwardFn::Acc) {
            panic!("requires_grad called on a derived scalar");
        }
        *backward = if enabled {
            BackwardFn::Acc
        } else {
            BackwardFn::Inert
        };
    }

    /// Returns true for leaves (inert or accumulating), false for derived
    /// scalars.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(
            *self.0.backward.borrow(),
            BackwardFn::Inert | BackwardFn::Acc
        )
    }

    /// Returns true when this scalar accumulates gradients (a parameter).
    #[must_use]
    pub fn accumulates_grad(&self) -> bool {
        matches!(*self.0.backward.borrow(), BackwardFn::Acc)
    }

    fn is_inert(&self) -> bool {
        matches!(*self.0.backward.borrow(), BackwardFn::Inert)
    }

    /// True when the forward value is NaN.
    #[must_use]
    pub fn is_value_nan(&self) -> bool {
        self.value().is_nan()
    }

    /// True when the accumulated gradient is NaN.
    #[must_use]
    pub fn is_grad_nan(&self) -> bool {
        self.grad().is_nan()
    }

    /// Runs reverse accumulation from this node with seed gradient 1.
    ///
    /// Gradients are *added* to the accumulating leaves reachable from this
    /// node; callers zero them explicitly between iterations. The traversal
    /// is a naive walk of the tape DAG: a node reached through k paths is
    /// visited k times, so the cost is O(edges), not O(nodes). Nodes carry no
    /// visited state, which keeps repeated `backward` calls over overlapping
    /// tapes correct.
    pub fn backward(&self) {
        self.backward_seeded(1.0);
    }

    /// Runs reverse accumulation from this node with an explicit seed.
    pub fn backward_seeded(&self, grad: f64) {
        let backward = self.0.backward.borrow();
        match &*backward {
            BackwardFn::Inert => {}
            BackwardFn::Acc => self.0.grad.set(self.0.grad.get() + grad),
            BackwardFn::Add(a, b) => {
                a.backward_seeded(grad);
                b.backward_seeded(grad);
            }
            BackwardFn::Sub(a, b) => {
                a.backward_seeded(grad);
                b.backward_seeded(-grad);
            }
            BackwardFn::Mul(a, b) => {
                a.backward_seeded(grad * b.value());
                b.backward_seeded(grad * a.value());
            }
            BackwardFn::Div(a, b) => {
                let denom = b.value();
                if denom == 0.0 {
                    panic!("division by zero in backward pass");
                }
                a.backward_seeded(grad / denom);
                b.backward_seeded(-grad * a.value() / (denom * denom));
            }
            BackwardFn::Neg(a) => a.backward_seeded(-grad),
            BackwardFn::Pow { base, exponent } => {
                base.backward_seeded(grad * exponent * base.value().powf(exponent - 1.0));
            }
            BackwardFn::Sin(a) => a.backward_seeded(grad * a.value().cos()),
            BackwardFn::Cos(a) => a.backward_seeded(grad * -a.value().sin()),
        }
    }

    /// Builds a derived node, short-circuiting to an inert leaf when no
    /// parent can route a gradient anywhere.
    fn derived(value: f64, backward: BackwardFn) -> Var {
        let inert = match &backward {
            BackwardFn::Add(a, b)
            | BackwardFn::Sub(a, b)
            | BackwardFn::Mul(a, b)
            | BackwardFn::Div(a, b) => a.is_inert() && b.is_inert(),
            BackwardFn::Neg(a) | BackwardFn::Sin(a) | BackwardFn::Cos(a) => a.is_inert(),
            BackwardFn::Pow { base, .. } => base.is_inert(),
            BackwardFn::Inert | BackwardFn::Acc => true,
        };
        if inert {
            Var::new(value)
        } else {
            Var::with_backward(value, backward)
        }
    }

    /// Power with a constant (non-differentiated) exponent.
    /// Local derivative: `k * self^(k-1)`.
    #[must_use]
    pub fn pow(&self, exponent: f64) -> Var {
        Var::derived(
            self.value().powf(exponent),
            BackwardFn::Pow {
                base: self.clone(),
                exponent,
            },
        )
    }

    /// Square root, as `pow(0.5)`. A negative input produces NaN, which
    /// propagates.
    #[must_use]
    pub fn sqrt(&self) -> Var {
        self.pow(0.5)
    }

    /// Sine. Local derivative: `cos(self)`.
    #[must_use]
    pub fn sin(&self) -> Var {
        Var::derived(self.value().sin(), BackwardFn::Sin(self.clone()))
    }

    /// Cosine. Local derivative: `-sin(self)`.
    #[must_use]
    pub fn cos(&self) -> Var {
        Var::derived(self.value().cos(), BackwardFn::Cos(self.clone()))
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Var")
            .field("value", &self.value())
            .field("grad", &self.grad())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// std::ops — algebra: a + b, a - b, a * b, a / b, -a (plus f64 mixed forms)
// -----------------------------------------------------------------------------

impl std::ops::Add for &Var {
    type Output = Var;

    fn add(self, rhs: Self) -> Var {
        Var::derived(
            self.value() + rhs.value(),
            BackwardFn::Add(self.clone(), rhs.clone()),
        )
    }
}

impl std::ops::Sub for &Var {
    type Output = Var;

    fn sub(self, rhs: Self) -> Var {
        Var::derived(
            self.value() - rhs.value(),
            BackwardFn::Sub(self.clone(), rhs.clone()),
        )
    }
}

impl std::ops::Mul for &Var {
    type Output = Var;

    fn mul(self, rhs: Self) -> Var {
        Var::derived(
            self.value() * rhs.value(),
            BackwardFn::Mul(self.clone(), rhs.clone()),
        )
    }
}

impl std::ops::Div for &Var {
    type Output = Var;

    /// # Panics
    ///
    /// Panics when the divisor's value is zero; a zero denominator signals a
    /// broken scene or integrator.
    fn div(self, rhs: Self) -> Var {
        if rhs.value() == 0.0 {
            panic!("division by zero");
        }
        Var::derived(
            self.value() / rhs.value(),
            BackwardFn::Div(self.clone(), rhs.clone()),
        )
    }
}

impl std::ops::Neg for &Var {
    type Output = Var;

    fn neg(self) -> Var {
        Var::derived(-self.value(), BackwardFn::Neg(self.clone()))
    }
}

impl std::ops::Add<f64> for &Var {
    type Output = Var;

    fn add(self, rhs: f64) -> Var {
        self + &Var::new(rhs)
    }
}

impl std::ops::Add<&Var> for f64 {
    type Output = Var;

    fn add(self, rhs: &Var) -> Var {
        &Var::new(self) + rhs
    }
}

impl std::ops::Sub<f64> for &Var {
    type Output = Var;

    fn sub(self, rhs: f64) -> Var {
        self - &Var::new(rhs)
    }
}

impl std::ops::Sub<&Var> for f64 {
    type Output = Var;

    fn sub(self, rhs: &Var) -> Var {
        &Var::new(self) - rhs
    }
}

impl std::ops::Mul<f64> for &Var {
    type Output = Var;

    fn mul(self, rhs: f64) -> Var {
        self * &Var::new(rhs)
    }
}

impl std::ops::Mul<&Var> for f64 {
    type Output = Var;

    fn mul(self, rhs: &Var) -> Var {
        &Var::new(self) * rhs
    }
}

impl std::ops::Div<f64> for &Var {
    type Output = Var;

    fn div(self, rhs: f64) -> Var {
        self / &Var::new(rhs)
    }
}

impl std::ops::Div<&Var> for f64 {
    type Output = Var;

    fn div(self, rhs: &Var) -> Var {
        &Var::new(self) / rhs
    }
}
