// src/gradients/accumulate.rs
//! Summing per-block derivatives into per-parameter gradients

use std::collections::HashMap;

use crate::error::{GradientError, Result};
use crate::quantum::parameter::Parameter;

/// Fold block derivatives into one value per driving parameter
///
/// `derivatives[j]` is added to the first entry of `parameter_lists[j]`.
/// Parameters come out in the order they are first seen; blocks with an
/// empty list are skipped.
pub fn accumulate(
    derivatives: &[f64],
    parameter_lists: &[Vec<Parameter>],
) -> Result<(Vec<f64>, Vec<Parameter>)> {
    if derivatives.len() != parameter_lists.len() {
        return Err(GradientError::DimensionMismatch {
            expected: parameter_lists.len(),
            actual: derivatives.len(),
        });
    }

    let mut index: HashMap<&Parameter, usize> = HashMap::new();
    let mut values = Vec::new();
    let mut order = Vec::new();

    for (derivative, parameters) in derivatives.iter().zip(parameter_lists) {
        let parameter = match parameters.first() {
            Some(parameter) => parameter,
            None => continue,
        };

        let slot = *index.entry(parameter).or_insert_with(|| {
            values.push(0.0);
            order.push(parameter.clone());
            values.len() - 1
        });
        values[slot] += derivative;
    }

    Ok((values, order))
}

/// Rearrange `values` (keyed by `order`) into `canonical` order
///
/// Parameters that received no contribution get a zero gradient.
pub fn reindex(values: &[f64], order: &[Parameter], canonical: &[Parameter]) -> Vec<f64> {
    let lookup: HashMap<&Parameter, f64> = order.iter().zip(values.iter().copied()).collect();
    canonical
        .iter()
        .map(|p| lookup.get(p).copied().unwrap_or(0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_sums_shared_parameters() {
        let p = Parameter::vector("p", 2);
        let lists = vec![
            vec![p[1].clone()],
            vec![p[0].clone()],
            vec![],
            vec![p[1].clone()],
        ];
        let (values, order) = accumulate(&[0.5, 2.0, 100.0, -0.25], &lists).unwrap();
        assert_eq!(order, vec![p[1].clone(), p[0].clone()]);
        assert_eq!(values, vec![0.25, 2.0]);
    }

    #[test]
    fn test_accumulate_length_mismatch() {
        let p = Parameter::new("p");
        assert!(matches!(
            accumulate(&[1.0, 2.0], &[vec![p]]),
            Err(GradientError::DimensionMismatch { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn test_accumulate_empty() {
        let (values, order) = accumulate(&[], &[]).unwrap();
        assert!(values.is_empty());
        assert!(order.is_empty());
    }

    #[test]
    fn test_reindex() {
        let p = Parameter::vector("p", 3);
        let reordered = reindex(&[1.0, 2.0], &[p[2].clone(), p[0].clone()], &p);
        assert_eq!(reordered, vec![2.0, 0.0, 1.0]);
    }
}
