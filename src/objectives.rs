//! Objectives that score a selection of items.
//!
//! Every objective is a pure function of the selected ids and the dataset.
//! The free functions work against the capability traits
//! ([`GenotypeVariantData`], [`DistanceMetric`]); [`Objective`] picks one of
//! them for a [`CoreHunterData`].
//!
//! Numeric degeneracy (an empty selection, a selection in which no marker is
//! scored, a zero denominator) is always reported as [`CoreError::Domain`].
//! Items missing a marker are left out of that marker's statistics.

use crate::data::CoreHunterData;
use crate::distance::{DistanceMatrixData, DistanceMetric};
use crate::error::{CoreError, Result};
use crate::genetic_distance::{GenotypeDistance, GenotypeVariantDistanceMetric};
use crate::genetics::{check_selection, GenotypeVariantData, Genotypes};
use crate::Ids;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// The score of a selection and whether lower scores are better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub value: f64,
    pub minimizing: bool,
}

/// Where distance based objectives take their distances from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceSource {
    /// The precomputed distance matrix of the dataset
    Precomputed,
    /// Modified Rogers distance between genotypes
    ModifiedRogers,
    /// Cavalli-Sforza and Edwards distance between genotypes
    CavalliSforzaEdwards,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Objective {
    ShannonsDiversity,
    NumberOfEffectiveAlleles,
    Coverage,
    AlleleCoverage,
    HeterozygousLociDiversity,
    ProportionNonInformativeAlleles {
        #[serde(default)]
        threshold: f64,
    },
    AverageDistance {
        source: DistanceSource,
    },
    EntryToNearestEntry {
        source: DistanceSource,
    },
}

impl Objective {
    pub fn is_minimizing(&self) -> bool {
        matches!(self, Objective::ProportionNonInformativeAlleles { .. })
    }

    /// Scores `selected` against `data`.
    ///
    /// Fails with a configuration error if `data` lacks the source the
    /// objective needs.
    pub fn evaluate(&self, selected: &Ids, data: &CoreHunterData) -> Result<Evaluation> {
        let value = match *self {
            Objective::ShannonsDiversity => shannons_diversity(selected, genotypes(data)?)?,
            Objective::NumberOfEffectiveAlleles => {
                number_of_effective_alleles(selected, genotypes(data)?)?
            }
            Objective::Coverage => coverage(selected, genotypes(data)?)?,
            Objective::AlleleCoverage => allele_coverage(selected, genotypes(data)?)?,
            Objective::HeterozygousLociDiversity => {
                heterozygous_loci_diversity(selected, genotypes(data)?)?
            }
            Objective::ProportionNonInformativeAlleles { threshold } => {
                proportion_non_informative_alleles(selected, genotypes(data)?, threshold)?
            }
            Objective::AverageDistance { source } => match source {
                DistanceSource::Precomputed => average_distance(selected, precomputed(data)?)?,
                DistanceSource::ModifiedRogers => {
                    average_distance(selected, &genotype_metric(data, GenotypeDistance::ModifiedRogers)?)?
                }
                DistanceSource::CavalliSforzaEdwards => average_distance(
                    selected,
                    &genotype_metric(data, GenotypeDistance::CavalliSforzaEdwards)?,
                )?,
            },
            Objective::EntryToNearestEntry { source } => match source {
                DistanceSource::Precomputed => entry_to_nearest_entry(selected, precomputed(data)?)?,
                DistanceSource::ModifiedRogers => entry_to_nearest_entry(
                    selected,
                    &genotype_metric(data, GenotypeDistance::ModifiedRogers)?,
                )?,
                DistanceSource::CavalliSforzaEdwards => entry_to_nearest_entry(
                    selected,
                    &genotype_metric(data, GenotypeDistance::CavalliSforzaEdwards)?,
                )?,
            },
        };
        trace!(objective = ?self, items = selected.len(), value, "Evaluated selection");
        Ok(Evaluation {
            value,
            minimizing: self.is_minimizing(),
        })
    }
}

/// Evaluates many candidate selections in parallel, one result per candidate.
pub fn evaluate_batch(
    objective: &Objective,
    candidates: &[Ids],
    data: &CoreHunterData,
) -> Vec<Result<Evaluation>> {
    candidates
        .par_iter()
        .map(|selected| objective.evaluate(selected, data))
        .collect()
}

fn genotypes(data: &CoreHunterData) -> Result<&Genotypes> {
    data.genotypic_data()
        .ok_or_else(|| CoreError::configuration("Objective requires genotypic data"))
}

fn precomputed(data: &CoreHunterData) -> Result<&DistanceMatrixData> {
    data.distances()
        .ok_or_else(|| CoreError::configuration("Objective requires a precomputed distance matrix"))
}

fn genotype_metric(
    data: &CoreHunterData,
    kind: GenotypeDistance,
) -> Result<GenotypeVariantDistanceMetric<'_, Genotypes>> {
    Ok(GenotypeVariantDistanceMetric::new(genotypes(data)?, kind))
}

/// Calls `f` with the average allele frequencies of every marker scored in
/// the selection and returns how many markers that was.
fn for_each_scored_marker<G, F>(selected: &Ids, data: &G, mut f: F) -> Result<usize>
where
    G: GenotypeVariantData + ?Sized,
    F: FnMut(usize, &[f64]) -> Result<()>,
{
    check_selection(selected, data.size())?;
    let mut scored = 0;
    for marker in 0..data.number_of_markers() {
        if let Some(frequencies) = data.average_marker_frequencies(selected, marker)? {
            scored += 1;
            f(marker, &frequencies)?;
        }
    }
    if scored == 0 {
        return Err(CoreError::domain("No marker is scored in the selection"));
    }
    Ok(scored)
}

/// Shannon's diversity: `-(1/M) Σ_m Σ_a f ln f`, with `0 ln 0 = 0`.
pub fn shannons_diversity<G>(selected: &Ids, data: &G) -> Result<f64>
where
    G: GenotypeVariantData + ?Sized,
{
    let mut summed = 0.0;
    let markers = for_each_scored_marker(selected, data, |_, frequencies| {
        summed += frequencies
            .iter()
            .filter(|&&f| f > 0.0)
            .map(|&f| f * f.ln())
            .sum::<f64>();
        Ok(())
    })?;
    Ok(-summed / markers as f64)
}

/// Number of effective alleles: `(1/M) Σ_m 1 / Σ_a f²`.
pub fn number_of_effective_alleles<G>(selected: &Ids, data: &G) -> Result<f64>
where
    G: GenotypeVariantData + ?Sized,
{
    let mut total = 0.0;
    let markers = for_each_scored_marker(selected, data, |marker, frequencies| {
        let squared: f64 = frequencies.iter().map(|f| f * f).sum();
        if squared == 0.0 {
            return Err(CoreError::domain(format!(
                "All allele frequencies at marker {} are zero",
                data.marker_name(marker)
            )));
        }
        total += 1.0 / squared;
        Ok(())
    })?;
    Ok(total / markers as f64)
}

/// Share of the markers scored for at least one selected item.
pub fn coverage<G>(selected: &Ids, data: &G) -> Result<f64>
where
    G: GenotypeVariantData + ?Sized,
{
    check_selection(selected, data.size())?;
    let markers = data.number_of_markers();
    if markers == 0 {
        return Err(CoreError::domain("Dataset has no markers"));
    }
    let observed = (0..markers)
        .filter(|&marker| selected.iter().any(|&id| !data.is_missing(id, marker)))
        .count();
    Ok(observed as f64 / markers as f64)
}

/// Share of the alleles present in the whole collection that are also
/// present in the selection.
pub fn allele_coverage<G>(selected: &Ids, data: &G) -> Result<f64>
where
    G: GenotypeVariantData + ?Sized,
{
    check_selection(selected, data.size())?;
    let everyone: Ids = (0..data.size()).collect();
    let mut present = 0usize;
    let mut covered = 0usize;
    for marker in 0..data.number_of_markers() {
        let all = match data.average_marker_frequencies(&everyone, marker)? {
            Some(frequencies) => frequencies,
            None => continue,
        };
        let chosen = data.average_marker_frequencies(selected, marker)?;
        for (allele, &f) in all.iter().enumerate() {
            if f > 0.0 {
                present += 1;
                if chosen.as_ref().map_or(false, |c| c[allele] > 0.0) {
                    covered += 1;
                }
            }
        }
    }
    if present == 0 {
        return Err(CoreError::domain("No allele is present in the collection"));
    }
    Ok(covered as f64 / present as f64)
}

/// Share of the scored (item, marker) calls in the selection that carry two
/// or more alleles.
pub fn heterozygous_loci_diversity<G>(selected: &Ids, data: &G) -> Result<f64>
where
    G: GenotypeVariantData + ?Sized,
{
    check_selection(selected, data.size())?;
    let mut calls = 0usize;
    let mut heterozygous = 0usize;
    for &id in selected {
        for marker in (0..data.number_of_markers()).filter(|&m| !data.is_missing(id, m)) {
            calls += 1;
            let carried = (0..data.number_of_alleles(marker))
                .filter(|&allele| data.allele_frequency(id, marker, allele).unwrap_or(0.0) > 0.0)
                .count();
            if carried >= 2 {
                heterozygous += 1;
            }
        }
    }
    if calls == 0 {
        return Err(CoreError::domain("No marker is scored in the selection"));
    }
    Ok(heterozygous as f64 / calls as f64)
}

/// Share of the alleles of scored markers whose average frequency in the
/// selection is at most `threshold`, which must lie in `[0, 1]`.
pub fn proportion_non_informative_alleles<G>(selected: &Ids, data: &G, threshold: f64) -> Result<f64>
where
    G: GenotypeVariantData + ?Sized,
{
    check_threshold(threshold)?;
    let mut alleles = 0usize;
    let mut non_informative = 0usize;
    for_each_scored_marker(selected, data, |_, frequencies| {
        alleles += frequencies.len();
        non_informative += frequencies.iter().filter(|&&f| f <= threshold).count();
        Ok(())
    })?;
    Ok(non_informative as f64 / alleles as f64)
}

pub(crate) fn check_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(CoreError::configuration(format!(
            "Informativeness threshold {} is not in [0, 1]",
            threshold
        )));
    }
    Ok(())
}

fn check_pairs(selected: &Ids) -> Result<()> {
    if selected.len() < 2 {
        return Err(CoreError::domain(format!(
            "Distance objectives need at least two items, got {}",
            selected.len()
        )));
    }
    Ok(())
}

/// Mean distance over all pairs of selected items.
pub fn average_distance<M>(selected: &Ids, metric: &M) -> Result<f64>
where
    M: DistanceMetric + ?Sized,
{
    check_pairs(selected)?;
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, &x) in selected.iter().enumerate() {
        for &y in selected.iter().skip(i + 1) {
            total += metric.distance(x, y)?;
            pairs += 1;
        }
    }
    Ok(total / pairs as f64)
}

/// Mean distance from each selected item to the closest other selected item.
pub fn entry_to_nearest_entry<M>(selected: &Ids, metric: &M) -> Result<f64>
where
    M: DistanceMetric + ?Sized,
{
    check_pairs(selected)?;
    let mut total = 0.0;
    for &x in selected {
        let mut nearest = f64::INFINITY;
        for &y in selected.iter().filter(|&&y| y != x) {
            nearest = nearest.min(metric.distance(x, y)?);
        }
        total += nearest;
    }
    Ok(total / selected.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::*;
    use crate::BiAllelicGenotypeVariantData;
    use std::error::Error;
    use std::result::Result;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < PRECISION,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    fn varied() -> CoreHunterData {
        CoreHunterData::new(Some(varied_multi_allelic().into()), None, Some(distances())).unwrap()
    }

    #[test]
    fn test_shannons_diversity_of_identical_items_is_zero() -> Result<(), Box<dyn Error>> {
        let data = monomorphic_multi_allelic();
        assert_eq!(shannons_diversity(&full_set(), &data)?, 0.0);
        assert_eq!(shannons_diversity(&subset(), &data)?, 0.0);
        Ok(())
    }

    #[test]
    fn test_shannons_diversity() -> Result<(), Box<dyn Error>> {
        assert_close(shannons_diversity(&full_set(), &uniform_multi_allelic())?, 0.7096772455417959);
        let data = varied_multi_allelic();
        assert_close(shannons_diversity(&full_set(), &data)?, 0.9141280662413165);
        assert_close(shannons_diversity(&subset(), &data)?, 0.7492026628087477);
        assert_close(shannons_diversity(&full_set(), &bi_allelic())?, 0.5126703283936235);
        Ok(())
    }

    #[test]
    fn test_number_of_effective_alleles_of_monomorphic_collection() -> Result<(), Box<dyn Error>> {
        let data = CoreHunterData::with_genotypes(monomorphic_multi_allelic())?;
        let evaluation = Objective::NumberOfEffectiveAlleles.evaluate(&full_set(), &data)?;
        assert_close(evaluation.value, 1.0);
        assert!(!evaluation.minimizing);
        Ok(())
    }

    #[test]
    fn test_number_of_effective_alleles() -> Result<(), Box<dyn Error>> {
        assert_close(
            number_of_effective_alleles(&full_set(), &uniform_multi_allelic())?,
            2.303117757663212,
        );
        let data = varied_multi_allelic();
        assert_close(number_of_effective_alleles(&full_set(), &data)?, 2.4808646543637884);
        assert_close(number_of_effective_alleles(&subset(), &data)?, 2.020946633933647);
        assert_close(number_of_effective_alleles(&full_set(), &bi_allelic())?, 1.6160756079620173);
        Ok(())
    }

    #[test]
    fn test_number_of_effective_alleles_rejects_all_zero_marker() -> Result<(), Box<dyn Error>> {
        let data = crate::MultiAllelicGenotypeVariantData::new(
            "zeros",
            &["a"],
            &["m1"],
            vec![vec!["x".to_string(), "y".to_string()]],
            vec![vec![Some(vec![0.0, 0.0])]],
        )?;
        let err = number_of_effective_alleles(&full_selection(1), &data).unwrap_err();
        assert!(matches!(err, CoreError::Domain { .. }));
        Ok(())
    }

    fn full_selection(size: usize) -> Ids {
        (0..size).collect()
    }

    #[test]
    fn test_coverage() -> Result<(), Box<dyn Error>> {
        let data = varied_multi_allelic();
        assert_close(coverage(&full_set(), &data)?, 1.0);
        assert_close(coverage(&subset(), &data)?, 1.0);
        let without_mk5: Ids = vec![3].into_iter().collect();
        assert_close(coverage(&without_mk5, &data)?, 6.0 / 7.0);
        Ok(())
    }

    #[test]
    fn test_allele_coverage() -> Result<(), Box<dyn Error>> {
        let data = varied_multi_allelic();
        assert_close(allele_coverage(&full_set(), &data)?, 1.0);
        assert_close(allele_coverage(&subset(), &data)?, 0.8947368421052632);
        Ok(())
    }

    #[test]
    fn test_heterozygous_loci_diversity() -> Result<(), Box<dyn Error>> {
        let data = varied_multi_allelic();
        assert_close(heterozygous_loci_diversity(&full_set(), &data)?, 0.4411764705882353);
        assert_close(heterozygous_loci_diversity(&subset(), &data)?, 0.38461538461538464);
        assert_close(heterozygous_loci_diversity(&full_set(), &bi_allelic())?, 0.42857142857142855);
        Ok(())
    }

    #[test]
    fn test_proportion_non_informative_alleles() -> Result<(), Box<dyn Error>> {
        let data = varied_multi_allelic();
        assert_close(proportion_non_informative_alleles(&full_set(), &data, 0.0)?, 0.0);
        assert_close(proportion_non_informative_alleles(&subset(), &data, 0.0)?, 0.10526315789473684);
        assert_close(proportion_non_informative_alleles(&subset(), &data, 0.2)?, 0.2631578947368421);
        Ok(())
    }

    #[test]
    fn test_threshold_outside_unit_interval_is_rejected() {
        let data = varied();
        for &threshold in [-0.1, 1.5, f64::NAN].iter() {
            let objective = Objective::ProportionNonInformativeAlleles { threshold };
            assert!(matches!(
                objective.evaluate(&full_set(), &data).unwrap_err(),
                CoreError::Configuration { .. }
            ));
        }
    }

    #[test]
    fn test_distance_objectives_on_precomputed_matrix() -> Result<(), Box<dyn Error>> {
        let data = varied();
        let average = Objective::AverageDistance {
            source: DistanceSource::Precomputed,
        };
        assert_close(average.evaluate(&full_set(), &data)?.value, 0.61);
        assert_close(average.evaluate(&subset(), &data)?.value, 0.9);
        let nearest = Objective::EntryToNearestEntry {
            source: DistanceSource::Precomputed,
        };
        assert_close(nearest.evaluate(&full_set(), &data)?.value, 0.36);
        Ok(())
    }

    #[test]
    fn test_distance_objectives_on_genotype_distances() -> Result<(), Box<dyn Error>> {
        let data = varied();
        let average = Objective::AverageDistance {
            source: DistanceSource::ModifiedRogers,
        };
        assert_close(average.evaluate(&full_set(), &data)?.value, 0.6214458762025753);
        let nearest = Objective::EntryToNearestEntry {
            source: DistanceSource::CavalliSforzaEdwards,
        };
        assert_close(nearest.evaluate(&full_set(), &data)?.value, 0.5232744227215933);
        Ok(())
    }

    #[test]
    fn test_distance_objectives_need_two_items() {
        let data = distances();
        let single: Ids = vec![1].into_iter().collect();
        assert!(matches!(
            average_distance(&single, &data).unwrap_err(),
            CoreError::Domain { .. }
        ));
        assert!(matches!(
            entry_to_nearest_entry(&single, &data).unwrap_err(),
            CoreError::Domain { .. }
        ));
    }

    #[test]
    fn test_empty_selection_is_a_domain_error() {
        let data = varied();
        for objective in [
            Objective::ShannonsDiversity,
            Objective::NumberOfEffectiveAlleles,
            Objective::Coverage,
            Objective::AlleleCoverage,
            Objective::HeterozygousLociDiversity,
            Objective::ProportionNonInformativeAlleles { threshold: 0.0 },
        ]
        .iter()
        {
            let err = objective.evaluate(&Ids::new(), &data).unwrap_err();
            assert!(matches!(err, CoreError::Domain { .. }), "{:?}", objective);
        }
    }

    #[test]
    fn test_unknown_ids_fail_fast() {
        let data = varied();
        let selected: Ids = vec![0, 5].into_iter().collect();
        assert_eq!(
            Objective::ShannonsDiversity.evaluate(&selected, &data),
            Err(CoreError::UnknownId { id: 5, size: 5 })
        );
        let average = Objective::AverageDistance {
            source: DistanceSource::Precomputed,
        };
        assert_eq!(
            average.evaluate(&selected, &data),
            Err(CoreError::UnknownId { id: 5, size: 5 })
        );
    }

    #[test]
    fn test_selection_without_scored_markers_is_a_domain_error() -> Result<(), Box<dyn Error>> {
        let data = BiAllelicGenotypeVariantData::new(
            "gaps",
            &["a", "b"],
            &["m1"],
            vec![vec![Some(1)], vec![None]],
        )?;
        let only_missing: Ids = vec![1].into_iter().collect();
        let err = shannons_diversity(&only_missing, &data).unwrap_err();
        assert!(matches!(err, CoreError::Domain { .. }));
        Ok(())
    }

    #[test]
    fn test_missing_source_is_a_configuration_error() {
        let data = CoreHunterData::with_distances(distances()).unwrap();
        let err = Objective::Coverage.evaluate(&full_set(), &data).unwrap_err();
        assert!(matches!(err, CoreError::Configuration { .. }));

        let data = CoreHunterData::with_genotypes(bi_allelic()).unwrap();
        let nearest = Objective::EntryToNearestEntry {
            source: DistanceSource::Precomputed,
        };
        assert!(matches!(
            nearest.evaluate(&full_set(), &data).unwrap_err(),
            CoreError::Configuration { .. }
        ));
    }

    #[test]
    fn test_directions() {
        assert!(Objective::ProportionNonInformativeAlleles { threshold: 0.0 }.is_minimizing());
        assert!(!Objective::Coverage.is_minimizing());
        assert!(!Objective::AverageDistance {
            source: DistanceSource::Precomputed
        }
        .is_minimizing());
    }

    #[test]
    fn test_batch_matches_single_evaluations() -> Result<(), Box<dyn Error>> {
        let data = varied();
        let candidates = vec![full_set(), subset(), Ids::new()];
        let results = evaluate_batch(&Objective::ShannonsDiversity, &candidates, &data);
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0],
            Objective::ShannonsDiversity.evaluate(&full_set(), &data)
        );
        assert_close(results[1].clone()?.value, 0.7492026628087477);
        assert!(results[2].is_err());
        Ok(())
    }

    #[test]
    fn test_objective_configuration_format() -> Result<(), Box<dyn Error>> {
        let objective: Objective =
            serde_json::from_str(r#"{"type": "entry_to_nearest_entry", "source": "modified_rogers"}"#)?;
        assert_eq!(
            objective,
            Objective::EntryToNearestEntry {
                source: DistanceSource::ModifiedRogers
            }
        );
        let objective: Objective =
            serde_json::from_str(r#"{"type": "proportion_non_informative_alleles"}"#)?;
        assert_eq!(
            objective,
            Objective::ProportionNonInformativeAlleles { threshold: 0.0 }
        );
        Ok(())
    }
}
