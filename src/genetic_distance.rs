//! Distances between items derived from their allele frequencies.

use crate::distance::{DistanceMatrixData, DistanceMetric};
use crate::error::{check_id, CoreError, Result};
use crate::genetics::GenotypeVariantData;
use crate::Ids;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Population genetic distances over allele frequency vectors.
///
/// Both are normalised by `2M`, `M` being the number of markers scored in
/// both items, so they fall in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenotypeDistance {
    /// `sqrt( Σ_m Σ_a (p_xma - p_yma)² / 2M )`
    ModifiedRogers,
    /// `sqrt( Σ_m Σ_a (√p_xma - √p_yma)² / 2M )`
    CavalliSforzaEdwards,
}

impl GenotypeDistance {
    /// Distance between items `x` and `y` of `data`.
    ///
    /// Markers missing in either item are skipped; items sharing no scored
    /// marker cannot be compared.
    pub fn distance<G>(&self, data: &G, x: usize, y: usize) -> Result<f64>
    where
        G: GenotypeVariantData + ?Sized,
    {
        check_id(x, data.size())?;
        check_id(y, data.size())?;
        if x == y {
            return Ok(0.0);
        }

        let mut squares = 0.0;
        let mut markers = 0usize;
        for marker in 0..data.number_of_markers() {
            if data.is_missing(x, marker) || data.is_missing(y, marker) {
                continue;
            }
            markers += 1;
            for allele in 0..data.number_of_alleles(marker) {
                let px = data.allele_frequency(x, marker, allele).unwrap_or(0.0);
                let py = data.allele_frequency(y, marker, allele).unwrap_or(0.0);
                let diff = match self {
                    GenotypeDistance::ModifiedRogers => px - py,
                    GenotypeDistance::CavalliSforzaEdwards => px.sqrt() - py.sqrt(),
                };
                squares += diff * diff;
            }
        }

        if markers == 0 {
            return Err(CoreError::domain(format!(
                "Items {} and {} have no scored marker in common",
                x, y
            )));
        }
        Ok((squares / (2.0 * markers as f64)).sqrt())
    }
}

/// Serves a [`GenotypeDistance`] over a genotype dataset through the
/// [`DistanceMetric`] interface.
#[derive(Debug, Clone)]
pub struct GenotypeVariantDistanceMetric<'a, G: ?Sized> {
    data: &'a G,
    kind: GenotypeDistance,
}

impl<'a, G: GenotypeVariantData + ?Sized> GenotypeVariantDistanceMetric<'a, G> {
    pub fn new(data: &'a G, kind: GenotypeDistance) -> Self {
        Self { data, kind }
    }

    pub fn kind(&self) -> GenotypeDistance {
        self.kind
    }

    /// Computes the full distance matrix, carrying over the item headers.
    #[instrument(skip_all, fields(kind = ?self.kind, items = self.data.size()))]
    pub fn precompute(&self) -> Result<DistanceMatrixData> {
        let size = self.data.size();
        let upper = (0..size)
            .into_par_iter()
            .map(|x| {
                ((x + 1)..size)
                    .map(|y| self.kind.distance(self.data, x, y))
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let mut matrix = Array2::zeros((size, size));
        for (x, row) in upper.into_iter().enumerate() {
            for (offset, d) in row.into_iter().enumerate() {
                let y = x + 1 + offset;
                matrix[[x, y]] = d;
                matrix[[y, x]] = d;
            }
        }
        let headers = (0..size).map(|id| self.data.header(id).cloned()).collect();

        info!("Precomputed genotype distance matrix");
        DistanceMatrixData::new(headers, matrix)
    }
}

impl<'a, G: GenotypeVariantData + ?Sized> DistanceMetric for GenotypeVariantDistanceMetric<'a, G> {
    type Data = G;

    fn distance(&self, x: usize, y: usize) -> Result<f64> {
        self.kind.distance(self.data, x, y)
    }

    fn ids(&self) -> Ids {
        (0..self.data.size()).collect()
    }

    fn data(&self) -> &G {
        self.data
    }
}
