#![crate_name = "corehunter"]
//! Genetic diversity metrics and distance matrices for core subset selection.
//!
//! A [`CoreHunterData`] merges genotypes, phenotypic traits and a precomputed
//! distance matrix over the same `n` items. [`Objective`]s score a set of
//! selected item ids against that dataset; the search that proposes the
//! subsets lives outside this crate.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub mod prelude;

pub mod config;
pub mod data;
pub mod distance;
pub mod error;
pub mod genetic_distance;
pub mod genetics;
pub mod gower;
pub mod objectives;
pub mod phenotype;
pub mod range;

#[cfg(test)]
mod test_data;

pub use config::{Evaluator, EvaluatorConfig};
pub use data::CoreHunterData;
pub use distance::{DistanceMatrixData, DistanceMetric};
pub use error::{CoreError, Result};
pub use genetic_distance::{GenotypeDistance, GenotypeVariantDistanceMetric};
pub use genetics::{
    BiAllelicGenotypeVariantData, GenotypeVariantData, Genotypes, MultiAllelicGenotypeVariantData,
};
pub use gower::GowersDistanceMatrixGenerator;
pub use objectives::{evaluate_batch, DistanceSource, Evaluation, Objective};
pub use phenotype::{DataType, Feature, FeatureData, Scale, ScaleType, Value};
pub use range::Range;

/// A set of item ids, each in `0..n`.
pub type Ids = BTreeSet<usize>;
/// Optional per-item headers, indexed by item id.
pub type Headers = Vec<Option<Header>>;
pub type AlleleScore = u8;
pub type AlleleCount = u32;
pub type AlleleFrequency = f64;

/// Identifies an item across data sources.
///
/// Headers with the same unique identifier describe the same item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Header {
    unique_identifier: String,
    name: Option<String>,
}

impl Header {
    pub fn new(unique_identifier: &str, name: Option<&str>) -> Self {
        Self {
            unique_identifier: unique_identifier.into(),
            name: name.map(Into::into),
        }
    }

    /// A header whose unique identifier is its name.
    pub fn named(name: &str) -> Self {
        Self::new(name, Some(name))
    }

    /// The header generated for item `index` when no source supplies one.
    pub fn synthetic(index: usize) -> Self {
        Self {
            unique_identifier: index.to_string(),
            name: None,
        }
    }

    pub fn unique_identifier(&self) -> &str {
        &self.unique_identifier
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Anything that holds data for a fixed number of identified items.
pub trait ItemData {
    /// Number of items `n`; ids run over `0..n`.
    fn size(&self) -> usize;

    fn header(&self, id: usize) -> Option<&Header>;
}

pub(crate) fn headers_from_names<S: AsRef<str>>(names: &[S]) -> Headers {
    names
        .iter()
        .map(|name| Some(Header::named(name.as_ref())))
        .collect()
}
