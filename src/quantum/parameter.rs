// src/quantum/parameter.rs
//! Symbolic circuit parameters and their numeric bindings
//!
//! A [`Parameter`] is an opaque handle: gates share it by cloning, and two
//! parameters are the same only if one was cloned from the other. Gate angles
//! refer to parameters through a [`ParameterExpression`], an affine map whose
//! slope is the chain-rule factor of the analytic derivative.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::Rng;

use crate::error::{GradientError, Result};

static NEXT_PARAMETER_ID: AtomicU64 = AtomicU64::new(0);

/// A free circuit parameter
#[derive(Clone, Debug)]
pub struct Parameter {
    id: u64,
    name: Arc<str>,
}

impl Parameter {
    /// Create a fresh parameter, distinct from every other parameter
    pub fn new(name: &str) -> Self {
        Parameter {
            id: NEXT_PARAMETER_ID.fetch_add(1, Ordering::Relaxed),
            name: Arc::from(name),
        }
    }

    /// Create `count` fresh parameters named `prefix[0]`, `prefix[1]`, ...
    pub fn vector(prefix: &str, count: usize) -> Vec<Parameter> {
        (0..count)
            .map(|i| Parameter::new(&format!("{}[{}]", prefix, i)))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Parameter {}

impl Hash for Parameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An affine expression `scale * parameter + offset`
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterExpression {
    parameter: Parameter,
    scale: f64,
    offset: f64,
}

impl ParameterExpression {
    pub fn new(parameter: Parameter, scale: f64, offset: f64) -> Self {
        ParameterExpression { parameter, scale, offset }
    }

    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    /// Derivative of the expression with respect to its parameter
    pub fn gradient(&self) -> f64 {
        self.scale
    }

    /// Evaluate the expression under a binding
    pub fn evaluate(&self, binding: &ParameterBinding) -> Result<f64> {
        Ok(self.scale * binding.get(&self.parameter)? + self.offset)
    }
}

impl From<Parameter> for ParameterExpression {
    fn from(parameter: Parameter) -> Self {
        ParameterExpression::new(parameter, 1.0, 0.0)
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 1.0 {
            write!(f, "{}", self.parameter)?;
        } else {
            write!(f, "{}*{}", self.scale, self.parameter)?;
        }
        if self.offset != 0.0 {
            write!(f, "{:+}", self.offset)?;
        }
        Ok(())
    }
}

impl Mul<f64> for ParameterExpression {
    type Output = ParameterExpression;

    fn mul(self, rhs: f64) -> Self::Output {
        ParameterExpression::new(self.parameter, self.scale * rhs, self.offset * rhs)
    }
}

impl Add<f64> for ParameterExpression {
    type Output = ParameterExpression;

    fn add(self, rhs: f64) -> Self::Output {
        ParameterExpression::new(self.parameter, self.scale, self.offset + rhs)
    }
}

impl Sub<f64> for ParameterExpression {
    type Output = ParameterExpression;

    fn sub(self, rhs: f64) -> Self::Output {
        self + (-rhs)
    }
}

impl Neg for ParameterExpression {
    type Output = ParameterExpression;

    fn neg(self) -> Self::Output {
        ParameterExpression::new(self.parameter, -self.scale, -self.offset)
    }
}

impl Mul<f64> for Parameter {
    type Output = ParameterExpression;

    fn mul(self, rhs: f64) -> Self::Output {
        ParameterExpression::from(self) * rhs
    }
}

impl Add<f64> for Parameter {
    type Output = ParameterExpression;

    fn add(self, rhs: f64) -> Self::Output {
        ParameterExpression::from(self) + rhs
    }
}

impl Sub<f64> for Parameter {
    type Output = ParameterExpression;

    fn sub(self, rhs: f64) -> Self::Output {
        ParameterExpression::from(self) - rhs
    }
}

/// Concrete values for a set of parameters
#[derive(Clone, Debug, Default)]
pub struct ParameterBinding {
    values: HashMap<Parameter, f64>,
}

impl ParameterBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `parameters[i]` to `values[i]`
    pub fn from_values(parameters: &[Parameter], values: &[f64]) -> Result<Self> {
        if parameters.len() != values.len() {
            return Err(GradientError::DimensionMismatch {
                expected: parameters.len(),
                actual: values.len(),
            });
        }

        Ok(ParameterBinding {
            values: parameters.iter().cloned().zip(values.iter().copied()).collect(),
        })
    }

    /// Bind every parameter to a uniformly random angle in [0, 2π)
    pub fn random<R: Rng>(parameters: &[Parameter], rng: &mut R) -> Self {
        ParameterBinding {
            values: parameters
                .iter()
                .map(|p| (p.clone(), rng.gen_range(0.0..2.0 * PI)))
                .collect(),
        }
    }

    /// Set a value, returning the previous one if the parameter was already bound
    pub fn insert(&mut self, parameter: Parameter, value: f64) -> Option<f64> {
        self.values.insert(parameter, value)
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, parameter: &Parameter, value: f64) -> Self {
        self.values.insert(parameter.clone(), value);
        self
    }

    pub fn get(&self, parameter: &Parameter) -> Result<f64> {
        self.values
            .get(parameter)
            .copied()
            .ok_or_else(|| GradientError::MissingBinding {
                parameter: parameter.name().to_string(),
            })
    }

    pub fn contains(&self, parameter: &Parameter) -> bool {
        self.values.contains_key(parameter)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(Parameter, f64)> for ParameterBinding {
    fn from_iter<T: IntoIterator<Item = (Parameter, f64)>>(iter: T) -> Self {
        ParameterBinding {
            values: iter.into_iter().collect(),
        }
    }
}
