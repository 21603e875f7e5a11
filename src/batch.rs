/// Parallel analysis of every well in the registry.
///
/// Each well is an independent job on a `threadpool::ThreadPool`: its own
/// series, its own peak set, its own running drawdown total. Nothing is
/// shared between jobs except the read-only registry and a cancellation
/// flag, which the segmenter checks between cycles.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use threadpool::ThreadPool;
use tracing::{debug, info, warn};

use crate::config::WellRegistry;
use crate::error::{AnalysisError, WellError};
use crate::pipeline::{WellAnalysis, analyze_registered_well};

/// Outcome for one registry well.
#[derive(Debug)]
pub struct WellOutcome {
    pub well_id: String,
    pub result: Result<WellAnalysis, WellError>,
}

/// Batch runner with a shareable cancellation handle.
pub struct BatchRunner {
    workers: usize,
    cancel: Arc<AtomicBool>,
}

impl BatchRunner {
    /// `workers` is clamped to at least 1.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops in-flight and pending wells when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Analyses every well, returning outcomes in registry order.
    pub fn run(&self, registry: &WellRegistry) -> Vec<WellOutcome> {
        let registry = Arc::new(registry.clone());
        let pool = ThreadPool::new(self.workers.min(registry.wells.len().max(1)));
        let (tx, rx) = mpsc::channel();

        info!(
            wells = registry.wells.len(),
            workers = pool.max_count(),
            "starting batch analysis"
        );

        for (position, well) in registry.wells.iter().enumerate() {
            let tx = tx.clone();
            let registry = Arc::clone(&registry);
            let cancel = Arc::clone(&self.cancel);
            let well_id = well.well_id.clone();

            pool.execute(move || {
                let result = if cancel.load(Ordering::Relaxed) {
                    Err(WellError::Analysis(AnalysisError::Cancelled))
                } else {
                    analyze_registered_well(&registry, &well_id, Some(&cancel))
                };
                debug!(well = %well_id, ok = result.is_ok(), "well job finished");
                // Receiver outlives the pool; a send failure means the batch was dropped.
                let _ = tx.send((position, WellOutcome { well_id, result }));
            });
        }
        drop(tx);

        let mut outcomes: Vec<(usize, WellOutcome)> = rx.iter().collect();
        outcomes.sort_by_key(|(position, _)| *position);

        let failed = outcomes.iter().filter(|(_, o)| o.result.is_err()).count();
        if failed > 0 {
            warn!(failed, "some wells could not be analysed");
        }

        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

/// Convenience wrapper: analyse every registry well on `workers` threads.
pub fn analyze_wells(registry: &WellRegistry, workers: usize) -> Vec<WellOutcome> {
    BatchRunner::new(workers).run(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_CONFIG_PATH, WellConfig, load_config};

    #[test]
    fn test_bundled_registry_in_order() {
        let registry = load_config(DEFAULT_CONFIG_PATH).unwrap();
        let outcomes = analyze_wells(&registry, 4);

        assert_eq!(outcomes.len(), registry.wells.len());
        for (outcome, well) in outcomes.iter().zip(&registry.wells) {
            assert_eq!(outcome.well_id, well.well_id);
        }

        let bh01 = outcomes[0].result.as_ref().expect("BH-01 should analyse");
        assert_eq!(bh01.report.len(), 2);
        let bh02 = outcomes[1].result.as_ref().expect("BH-02 should analyse");
        assert!(bh02.report.is_empty());
    }

    #[test]
    fn test_running_totals_are_per_well() {
        let mut registry = load_config(DEFAULT_CONFIG_PATH).unwrap();
        let mut copy = registry.wells[0].clone();
        copy.well_id = "BH-01-copy".to_string();
        registry.wells.push(copy);

        let outcomes = analyze_wells(&registry, 3);
        let first = outcomes[0].result.as_ref().unwrap();
        let copy = outcomes[2].result.as_ref().unwrap();
        assert_eq!(first.report.total_drawdown_m(), 16.0);
        assert_eq!(copy.report.total_drawdown_m(), 16.0);
    }

    #[test]
    fn test_missing_file_fails_only_that_well() {
        let mut registry = load_config(DEFAULT_CONFIG_PATH).unwrap();
        registry.wells.insert(
            0,
            WellConfig {
                well_id: "GHOST".to_string(),
                name: "Missing export".to_string(),
                description: None,
                data_file: "data/does_not_exist.csv".into(),
            },
        );

        let outcomes = analyze_wells(&registry, 2);
        assert!(matches!(outcomes[0].result, Err(WellError::Io(_))));
        assert!(outcomes[1].result.is_ok());
    }

    #[test]
    fn test_cancelled_batch() {
        let registry = load_config(DEFAULT_CONFIG_PATH).unwrap();
        let runner = BatchRunner::new(2);
        runner.cancel();
        let outcomes = runner.run(&registry);
        assert_eq!(outcomes.len(), registry.wells.len());
        assert!(outcomes.iter().all(|o| matches!(
            o.result,
            Err(WellError::Analysis(AnalysisError::Cancelled))
        )));
    }

    #[test]
    fn test_empty_registry() {
        assert!(analyze_wells(&WellRegistry::default(), 4).is_empty());
    }
}
