//! Gradients of parameterized quantum circuit expectation values
//!
//! This crate computes E(θ) = ⟨ψ₀|U(θ)† O U(θ)|ψ₀⟩ and its gradient with
//! respect to every circuit parameter on an exact statevector. Gradients come
//! from analytic derivative rules for the rotation gates, evaluated either by a
//! reference engine that rebuilds each derivative circuit from scratch or by an
//! iterative engine that backpropagates two states through the circuit in
//! linear time.
//!
//! ```no_run
//! use qgrad::prelude::*;
//!
//! let theta = Parameter::vector("θ", 2);
//! let mut builder = CircuitBuilder::new(1);
//! builder.ry(0, &theta[0])?.rz(0, &theta[1])?;
//!
//! let engine = StateGradient::new(Observable::from_label("X")?, builder.build())?;
//! let result = engine.evaluate(&ParameterBinding::from_values(&theta, &[0.3, 0.7])?)?;
//! println!("E = {}, ∇E = {:?}", result.expectation_value, result.gradient);
//! # Ok::<(), qgrad::error::GradientError>(())
//! ```

pub mod error;
pub mod quantum;
pub mod gradients;

// Create a prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{GradientError, Result};
    pub use crate::quantum::prelude::*;
    pub use crate::gradients::prelude::*;
}

// Version and crate information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
