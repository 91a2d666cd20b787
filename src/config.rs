//! Configuration of a set of objectives evaluated together.

use crate::data::CoreHunterData;
use crate::error::{CoreError, Result};
use crate::objectives::{check_threshold, Evaluation, Objective};
use crate::Ids;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Which objectives to evaluate and how many threads batch evaluation uses.
///
/// ```json
/// {
///   "objectives": [
///     {"type": "shannons_diversity"},
///     {"type": "average_distance", "source": "precomputed"}
///   ],
///   "threads": 4
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluatorConfig {
    pub objectives: Vec<Objective>,
    /// Defaults to one thread per core.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl EvaluatorConfig {
    pub fn new(objectives: Vec<Objective>) -> Self {
        Self {
            objectives,
            threads: None,
        }
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.objectives.is_empty() {
            return Err(CoreError::configuration("At least one objective is required"));
        }
        if self.threads == Some(0) {
            return Err(CoreError::configuration("Number of threads must be positive"));
        }
        for objective in &self.objectives {
            if let Objective::ProportionNonInformativeAlleles { threshold } = *objective {
                check_threshold(threshold)?;
            }
        }
        Ok(())
    }
}

/// Evaluates a fixed list of objectives, in parallel across candidates.
#[derive(Debug)]
pub struct Evaluator {
    objectives: Vec<Objective>,
    pool: rayon::ThreadPool,
}

impl Evaluator {
    pub fn new(config: EvaluatorConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = config.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| CoreError::configuration(format!("Cannot start thread pool: {}", e)))?;
        info!(
            objectives = config.objectives.len(),
            threads = pool.current_num_threads(),
            "Evaluator ready"
        );
        Ok(Self {
            objectives: config.objectives,
            pool,
        })
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// Evaluates every objective on one selection, in configuration order.
    pub fn evaluate(&self, selected: &Ids, data: &CoreHunterData) -> Result<Vec<Evaluation>> {
        self.objectives
            .iter()
            .map(|objective| objective.evaluate(selected, data))
            .collect()
    }

    /// Evaluates every candidate on the evaluator's thread pool.
    pub fn evaluate_batch(
        &self,
        candidates: &[Ids],
        data: &CoreHunterData,
    ) -> Vec<Result<Vec<Evaluation>>> {
        self.pool.install(|| {
            candidates
                .par_iter()
                .map(|selected| self.evaluate(selected, data))
                .collect()
        })
    }
}
