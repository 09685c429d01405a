// src/gradients/batch.rs
//! Whole-sample batch dispatch
//!
//! Small batches run serially in the calling thread. Large ones fan out over a
//! rayon pool, one task per sample; each task gets its own `Result` so a bad
//! sample never takes down its neighbours. Output order always matches input
//! order.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::debug;

use crate::error::Result;
use crate::gradients::engine::GradientConfig;

/// Run `task` over every item according to `config`
///
/// The outer `Result` only fails if a dedicated worker pool cannot be built.
pub fn dispatch<I, T, F>(items: &[I], config: &GradientConfig, task: F) -> Result<Vec<Result<T>>>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> Result<T> + Send + Sync,
{
    if items.len() < config.parallel_threshold {
        debug!(samples = items.len(), "evaluating batch serially");
        return Ok(items.iter().map(&task).collect());
    }

    match config.num_workers {
        Some(workers) => {
            debug!(samples = items.len(), workers, "evaluating batch on dedicated pool");
            let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
            Ok(pool.install(|| items.par_iter().map(&task).collect()))
        }
        None => {
            debug!(
                samples = items.len(),
                workers = rayon::current_num_threads(),
                "evaluating batch on global pool"
            );
            Ok(items.par_iter().map(&task).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GradientError;
    use std::thread;

    fn square_or_fail(x: &i64) -> Result<i64> {
        if *x < 0 {
            Err(GradientError::DimensionMismatch { expected: 0, actual: x.unsigned_abs() as usize })
        } else {
            Ok(x * x)
        }
    }

    #[test]
    fn test_serial_below_threshold() {
        let items: Vec<i64> = (0..10).collect();
        let config = GradientConfig::default();
        let caller = thread::current().id();

        let threads = dispatch(&items, &config, |_| Ok(thread::current().id())).unwrap();
        assert!(threads.iter().all(|t| matches!(t, Ok(id) if *id == caller)));
    }

    #[test]
    fn test_parallel_preserves_order() {
        let items: Vec<i64> = (0..500).collect();
        for workers in [None, Some(3)] {
            let config = GradientConfig::default()
                .with_parallel_threshold(50)
                .with_num_workers(workers);
            let results = dispatch(&items, &config, square_or_fail).unwrap();
            assert_eq!(results.len(), items.len());
            for (x, result) in items.iter().zip(results) {
                assert_eq!(result.unwrap(), x * x);
            }
        }
    }

    #[test]
    fn test_failures_stay_per_item() {
        let items = vec![1i64, -2, 3, -4];
        let config = GradientConfig::default().with_parallel_threshold(0);
        let results = dispatch(&items, &config, square_or_fail).unwrap();

        assert_eq!(results[0].as_ref().ok(), Some(&1));
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().ok(), Some(&9));
        assert!(results[3].is_err());
    }
}
