//! Gower's distance over mixed-type phenotypic features.

use crate::distance::DistanceMatrixData;
use crate::error::{CoreError, Result};
use crate::phenotype::{DataType, FeatureData, ScaleType, Value};
use crate::ItemData;
use ndarray::Array2;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

/// How a feature contributes to Gower's coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeatureKind {
    /// Boolean nominal; only shared `true` values count as a match.
    Binary,
    /// Matches on equality.
    Discrete,
    /// Scored by the difference relative to the feature range.
    Ranged,
}

/// Turns phenotypic feature data into a `[0, 1]` distance matrix.
///
/// Every feature yields a similarity score `s` and a weight `w` per item
/// pair; the distance is `1 - Σ s·w / Σ w`.
#[derive(Debug)]
pub struct GowersDistanceMatrixGenerator<'a> {
    data: &'a FeatureData,
    kinds: Vec<FeatureKind>,
    ranges: Vec<f64>,
}

impl<'a> GowersDistanceMatrixGenerator<'a> {
    /// Classifies the features of `data`.
    ///
    /// Fails with a configuration error for a feature without scale type or
    /// for an ordered scale over non-numeric data.
    #[instrument(skip_all, fields(features = data.number_of_features()))]
    pub fn new(data: &'a FeatureData) -> Result<Self> {
        let mut kinds = Vec::with_capacity(data.number_of_features());
        let mut ranges = Vec::with_capacity(data.number_of_features());

        for (index, feature) in data.features().iter().enumerate() {
            let scale = feature.scale();
            let (kind, range) = match scale.scale_type() {
                ScaleType::Nominal => match scale.data_type() {
                    DataType::Boolean => (FeatureKind::Binary, 0.0),
                    _ => (FeatureKind::Discrete, 0.0),
                },
                ScaleType::Ordinal | ScaleType::Interval | ScaleType::Ratio => {
                    if !scale.data_type().is_numeric() {
                        return Err(CoreError::configuration(format!(
                            "Illegal scale type {:?} for data type {:?} of feature {}",
                            scale.scale_type(),
                            scale.data_type(),
                            feature.name()
                        )));
                    }
                    let range = match scale.bounds() {
                        Some(bounds) => bounds.length(),
                        None => observed_range(data, index),
                    };
                    if range > 0.0 {
                        (FeatureKind::Ranged, range)
                    } else {
                        (FeatureKind::Discrete, range)
                    }
                }
                ScaleType::None => {
                    return Err(CoreError::configuration(format!(
                        "Illegal scale type {:?} of feature {}",
                        scale.scale_type(),
                        feature.name()
                    )));
                }
            };
            debug!(feature = feature.name(), ?kind, range, "Classified feature");
            kinds.push(kind);
            ranges.push(range);
        }

        Ok(Self {
            data,
            kinds,
            ranges,
        })
    }

    /// Computes the distance matrix; the diagonal is zero.
    ///
    /// Fails with a domain error if two items have no feature with a
    /// non-zero weight in common.
    #[instrument(skip_all, fields(items = self.data.size()))]
    pub fn generate(&self) -> Result<DistanceMatrixData> {
        let size = self.data.size();
        let upper = (0..size)
            .into_par_iter()
            .map(|i| {
                ((i + 1)..size)
                    .map(|j| self.pair_distance(i, j))
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let mut matrix = Array2::zeros((size, size));
        for (i, row) in upper.into_iter().enumerate() {
            for (offset, d) in row.into_iter().enumerate() {
                let j = i + 1 + offset;
                matrix[[i, j]] = d;
                matrix[[j, i]] = d;
            }
        }

        info!("Generated Gower distance matrix");
        DistanceMatrixData::new(self.data.headers().to_vec(), matrix)
    }

    fn pair_distance(&self, i: usize, j: usize) -> Result<f64> {
        let (score, weight) = self
            .kinds
            .iter()
            .zip(self.ranges.iter())
            .enumerate()
            .map(|(k, (&kind, &range))| {
                let (s, w) = similarity(kind, range, self.data.value(i, k), self.data.value(j, k));
                (s * w, w)
            })
            .fold((0.0, 0.0), |(score, weight), (s, w)| (score + s, weight + w));

        if weight == 0.0 {
            return Err(CoreError::domain(format!(
                "Items {} and {} have no weighted feature in common",
                i, j
            )));
        }
        Ok(1.0 - score / weight)
    }
}

/// Similarity score and weight of one feature for a pair of values.
fn similarity(kind: FeatureKind, range: f64, a: Option<&Value>, b: Option<&Value>) -> (f64, f64) {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        _ => return (0.0, 0.0),
    };
    match kind {
        FeatureKind::Binary => {
            let (a, b) = (a.as_bool() == Some(true), b.as_bool() == Some(true));
            let score = if a && b { 1.0 } else { 0.0 };
            let weight = if a || b { 1.0 } else { 0.0 };
            (score, weight)
        }
        FeatureKind::Discrete => {
            let same = match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => a == b,
            };
            (if same { 1.0 } else { 0.0 }, 1.0)
        }
        FeatureKind::Ranged => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => ((1.0 - (a - b).abs() / range).max(0.0).min(1.0), 1.0),
            _ => (0.0, 0.0),
        },
    }
}

/// `max - min` over the non-missing values of a feature, 0 without values.
fn observed_range(data: &FeatureData, feature: usize) -> f64 {
    let (min, max) = data
        .column(feature)
        .filter_map(|value| value.and_then(Value::as_f64))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
            (min.min(v), max.max(v))
        });
    if max >= min {
        max - min
    } else {
        0.0
    }
}
