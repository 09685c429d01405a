// src/gradients/mod.rs
//! Analytic gradients of expectation values
//!
//! The pipeline: [`split`] cuts the ansatz into blocks that each end on one
//! differentiated gate, [`expander`] turns each block into derivative terms
//! using the rules in [`lookup`], one of the two engines ([`iterative`] or
//! [`reference`]) evaluates the terms against a bound sample, and
//! [`accumulate`] sums block derivatives into per-parameter gradients.
//! [`engine::StateGradient`] drives all of it; [`batch`] fans samples out
//! over threads.
//!
//! Blocks are cut either at gates carrying a target parameter or, through
//! [`split_gates`], at every rotation so that bound angles are differentiated
//! as well.

pub mod lookup;
pub mod split;
pub mod expander;
pub mod reference;
pub mod iterative;
pub mod accumulate;
pub mod batch;
pub mod engine;

pub use lookup::{angle_derivative, derivative, DerivativeTerm};
pub use split::{split, split_gates, UnitaryBlock};
pub use expander::{analytic_gradient, gate_gradient};
pub use accumulate::accumulate;
pub use batch::dispatch;
pub use engine::{BatchResult, GradientConfig, GradientMethod, GradientResult, StateGradient};

/// Re-export commonly used types
pub mod prelude {
    pub use super::{BatchResult, GradientConfig, GradientMethod, GradientResult, StateGradient};
    pub use super::{DerivativeTerm, UnitaryBlock};
}
