use crate::distance::DistanceMatrixData;
use crate::error::{CoreError, Result};
use crate::genetics::Genotypes;
use crate::phenotype::FeatureData;
use crate::{Header, Headers, Ids, ItemData};
use tracing::{debug, info, instrument};

const NAME: &str = "Core Hunter data";

/// Genotypes, phenotypic traits and/or a precomputed distance matrix over the
/// same `n` items.
///
/// Item ids are `0..n` in every source. Headers given by several sources must
/// agree; the merged dataset keeps one header per item.
#[derive(Debug, Clone)]
pub struct CoreHunterData {
    headers: Headers,
    genotypes: Option<Genotypes>,
    phenotypes: Option<FeatureData>,
    distances: Option<DistanceMatrixData>,
}

impl CoreHunterData {
    /// Merges the given sources, at least one of which must be present.
    ///
    /// Fails with a configuration error if no source is given and with an
    /// inconsistent data error if the sources differ in size or carry
    /// conflicting headers.
    #[instrument(skip_all)]
    pub fn new(
        genotypes: Option<Genotypes>,
        phenotypes: Option<FeatureData>,
        distances: Option<DistanceMatrixData>,
    ) -> Result<Self> {
        let sources: Vec<(&str, &dyn ItemData)> = vec![
            genotypes.as_ref().map(|g| ("genotypes", g as &dyn ItemData)),
            phenotypes.as_ref().map(|p| ("phenotypes", p as &dyn ItemData)),
            distances.as_ref().map(|d| ("distances", d as &dyn ItemData)),
        ]
        .into_iter()
        .flatten()
        .collect();

        let size = infer_size(&sources)?;
        let headers = merge_headers(&sources, size)?;
        info!(
            size,
            sources = sources.len(),
            genotypes = genotypes.is_some(),
            phenotypes = phenotypes.is_some(),
            distances = distances.is_some(),
            "Merged {}",
            NAME
        );
        Ok(Self {
            headers,
            genotypes,
            phenotypes,
            distances,
        })
    }

    pub fn with_genotypes(genotypes: impl Into<Genotypes>) -> Result<Self> {
        Self::new(Some(genotypes.into()), None, None)
    }

    pub fn with_phenotypes(phenotypes: FeatureData) -> Result<Self> {
        Self::new(None, Some(phenotypes), None)
    }

    pub fn with_distances(distances: DistanceMatrixData) -> Result<Self> {
        Self::new(None, None, Some(distances))
    }

    pub fn name(&self) -> &str {
        NAME
    }

    pub fn ids(&self) -> Ids {
        (0..self.size()).collect()
    }

    pub fn headers(&self) -> &[Option<Header>] {
        &self.headers
    }

    pub fn genotypic_data(&self) -> Option<&Genotypes> {
        self.genotypes.as_ref()
    }

    pub fn phenotypic_data(&self) -> Option<&FeatureData> {
        self.phenotypes.as_ref()
    }

    pub fn distances(&self) -> Option<&DistanceMatrixData> {
        self.distances.as_ref()
    }
}

impl ItemData for CoreHunterData {
    fn size(&self) -> usize {
        self.headers.len()
    }

    fn header(&self, id: usize) -> Option<&Header> {
        self.headers.get(id).and_then(Option::as_ref)
    }
}

fn infer_size(sources: &[(&str, &dyn ItemData)]) -> Result<usize> {
    let (_, first) = sources.first().ok_or_else(|| {
        CoreError::configuration(
            "No data provided: at least one of genotypes, phenotypes or distances is required",
        )
    })?;
    let size = first.size();
    if sources.iter().any(|(_, data)| data.size() != size) {
        let sizes = sources
            .iter()
            .map(|(kind, data)| format!("{} {}", kind, data.size()))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(CoreError::inconsistent(format!(
            "Provided datasets have different sizes: {}",
            sizes
        )));
    }
    Ok(size)
}

/// Folds the headers of all sources into one header per item.
fn merge_headers(sources: &[(&str, &dyn ItemData)], size: usize) -> Result<Headers> {
    let merged = sources
        .iter()
        .try_fold(vec![None; size], |merged: Headers, (kind, data)| {
            debug!(source = *kind, "Merging headers");
            merged
                .into_iter()
                .enumerate()
                .map(|(id, current)| merge_header(id, current, data.header(id).cloned()))
                .collect::<Result<Headers>>()
        })?;

    if merged.iter().all(Option::is_none) {
        debug!(size, "No headers provided, generating them");
        return Ok((0..size).map(|id| Some(Header::synthetic(id))).collect());
    }
    Ok(merged)
}

fn merge_header(id: usize, current: Option<Header>, other: Option<Header>) -> Result<Option<Header>> {
    match (current, other) {
        (None, header) | (header, None) => Ok(header),
        (Some(current), Some(other)) => {
            if current.unique_identifier() != other.unique_identifier() {
                return Err(CoreError::inconsistent(format!(
                    "Headers do not match for item {}. Got different ids {} and {}.",
                    id,
                    current.unique_identifier(),
                    other.unique_identifier()
                )));
            }
            match (current.name(), other.name()) {
                (Some(a), Some(b)) if a != b => Err(CoreError::inconsistent(format!(
                    "Headers do not match for item {}. Got same id {} but different names {} and {}.",
                    id,
                    current.unique_identifier(),
                    a,
                    b
                ))),
                (Some(_), _) => Ok(Some(current)),
                (None, _) => Ok(Some(other)),
            }
        }
    }
}
