use crate::error::{check_id, CoreError, Result};
use crate::{
    headers_from_names, AlleleCount, AlleleFrequency, AlleleScore, Header, Headers, Ids, ItemData,
};
use ndarray::{s, Array2, Zip};
use tracing::debug;

/// Slack allowed when checking that allele frequencies at a marker sum to at most one.
const FREQUENCY_TOLERANCE: f64 = 1e-6;

/// Allele frequency queries over markers and items.
///
/// Frequencies of an item at a marker are either all present or all missing.
pub trait GenotypeVariantData: ItemData + Sync {
    fn number_of_markers(&self) -> usize;

    fn number_of_alleles(&self, marker: usize) -> usize;

    fn marker_name(&self, marker: usize) -> &str;

    fn allele_name(&self, marker: usize, allele: usize) -> Option<&str>;

    /// True if item `id` has no data at `marker`.
    ///
    /// # Panics
    ///
    /// If `id` or `marker` is out of range.
    fn is_missing(&self, id: usize, marker: usize) -> bool;

    /// Frequency of `allele` at `marker` for item `id`, `None` if missing.
    ///
    /// # Panics
    ///
    /// If `id`, `marker` or `allele` is out of range.
    fn allele_frequency(&self, id: usize, marker: usize, allele: usize) -> Option<AlleleFrequency>;

    /// Mean frequency of `allele` at `marker` over the selected items.
    ///
    /// Items missing the marker are left out of the mean. Returns `Ok(None)`
    /// when every selected item is missing it. An empty selection is a
    /// domain error and an unknown marker or allele a dimension error.
    fn average_allele_frequency(
        &self,
        selected: &Ids,
        marker: usize,
        allele: usize,
    ) -> Result<Option<AlleleFrequency>> {
        check_selection(selected, self.size())?;
        check_allele(self.number_of_markers(), marker, |m| self.number_of_alleles(m), allele)?;
        let (sum, observed) = selected
            .iter()
            .filter_map(|&id| self.allele_frequency(id, marker, allele))
            .fold((0.0, 0usize), |(sum, observed), f| (sum + f, observed + 1));
        Ok(mean(sum, observed))
    }

    /// Mean frequencies of every allele at `marker`, with the same missing
    /// data rules as [`Self::average_allele_frequency`].
    fn average_marker_frequencies(
        &self,
        selected: &Ids,
        marker: usize,
    ) -> Result<Option<Vec<AlleleFrequency>>> {
        check_selection(selected, self.size())?;
        check_marker(self.number_of_markers(), marker)?;
        let mut sums = vec![0.0; self.number_of_alleles(marker)];
        let mut observed = 0usize;
        for &id in selected.iter().filter(|&&id| !self.is_missing(id, marker)) {
            observed += 1;
            for (allele, sum) in sums.iter_mut().enumerate() {
                *sum += self.allele_frequency(id, marker, allele).unwrap_or(0.0);
            }
        }
        if observed == 0 {
            return Ok(None);
        }
        Ok(Some(
            sums.into_iter().map(|sum| sum / observed as f64).collect(),
        ))
    }
}

fn mean(sum: f64, observed: usize) -> Option<f64> {
    if observed == 0 {
        None
    } else {
        Some(sum / observed as f64)
    }
}

fn check_marker(markers: usize, marker: usize) -> Result<()> {
    if marker >= markers {
        return Err(CoreError::dimension(format!(
            "Marker index {} out of range ({} markers)",
            marker, markers
        )));
    }
    Ok(())
}

fn check_allele<F>(markers: usize, marker: usize, alleles: F, allele: usize) -> Result<()>
where
    F: Fn(usize) -> usize,
{
    check_marker(markers, marker)?;
    let alleles = alleles(marker);
    if allele >= alleles {
        return Err(CoreError::dimension(format!(
            "Allele index {} out of range for marker {} ({} alleles)",
            allele, marker, alleles
        )));
    }
    Ok(())
}

/// Fails unless `selected` is non-empty and only holds ids in `0..size`.
pub(crate) fn check_selection(selected: &Ids, size: usize) -> Result<()> {
    if selected.is_empty() {
        return Err(CoreError::domain("Selection of items is empty"));
    }
    // ids are sorted, the largest one decides
    match selected.iter().next_back() {
        Some(&id) => check_id(id, size),
        None => Ok(()),
    }
}

/// Diploid dosage scores (0, 1 or 2 copies of the reference allele) per item and marker.
#[derive(Debug, Clone, PartialEq)]
pub struct BiAllelicGenotypeVariantData {
    name: String,
    headers: Headers,
    marker_names: Vec<String>,
    scores: Array2<Option<AlleleScore>>,
}

impl BiAllelicGenotypeVariantData {
    pub const MAX_SCORE: AlleleScore = 2;

    /// One row of scores per item, one column per marker; `None` marks missing data.
    pub fn new<S: AsRef<str>, T: AsRef<str>>(
        name: &str,
        item_names: &[S],
        marker_names: &[T],
        allele_scores: Vec<Vec<Option<AlleleScore>>>,
    ) -> Result<Self> {
        if item_names.len() != allele_scores.len() {
            return Err(CoreError::dimension(format!(
                "Got {} item names but {} rows of allele scores",
                item_names.len(),
                allele_scores.len()
            )));
        }
        let markers = marker_names.len();
        for (id, row) in allele_scores.iter().enumerate() {
            if row.len() != markers {
                return Err(CoreError::dimension(format!(
                    "Item {} has {} allele scores but there are {} marker names",
                    id,
                    row.len(),
                    markers
                )));
            }
            if let Some((marker, score)) = row
                .iter()
                .enumerate()
                .find_map(|(m, score)| score.filter(|&s| s > Self::MAX_SCORE).map(|s| (m, s)))
            {
                return Err(CoreError::invalid_data(format!(
                    "Allele score {} of item {} at marker {} is not 0, 1 or 2",
                    score, id, marker
                )));
            }
        }

        let items = allele_scores.len();
        let scores = Array2::from_shape_vec(
            (items, markers),
            allele_scores.into_iter().flatten().collect(),
        )
        .map_err(|e| CoreError::dimension(e.to_string()))?;

        debug!(name, items, markers, "Loaded bi-allelic genotypes");
        Ok(Self {
            name: name.into(),
            headers: headers_from_names(item_names),
            marker_names: marker_names.iter().map(|m| m.as_ref().into()).collect(),
            scores,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dosage score of item `id` at `marker`, `None` if missing.
    pub fn allele_score(&self, id: usize, marker: usize) -> Result<Option<AlleleScore>> {
        check_id(id, self.size())?;
        check_marker(self.number_of_markers(), marker)?;
        Ok(self.scores[[id, marker]])
    }
}

impl ItemData for BiAllelicGenotypeVariantData {
    fn size(&self) -> usize {
        self.scores.nrows()
    }

    fn header(&self, id: usize) -> Option<&Header> {
        self.headers.get(id).and_then(Option::as_ref)
    }
}

impl GenotypeVariantData for BiAllelicGenotypeVariantData {
    fn number_of_markers(&self) -> usize {
        self.marker_names.len()
    }

    fn number_of_alleles(&self, _marker: usize) -> usize {
        2
    }

    fn marker_name(&self, marker: usize) -> &str {
        &self.marker_names[marker]
    }

    fn allele_name(&self, _marker: usize, _allele: usize) -> Option<&str> {
        None
    }

    fn is_missing(&self, id: usize, marker: usize) -> bool {
        self.scores[[id, marker]].is_none()
    }

    /// Allele 0 is the reference allele with frequency `score / 2`; allele 1
    /// is its complement.
    fn allele_frequency(&self, id: usize, marker: usize, allele: usize) -> Option<AlleleFrequency> {
        let reference = self.scores[[id, marker]]? as f64 / Self::MAX_SCORE as f64;
        match allele {
            0 => Some(reference),
            1 => Some(1.0 - reference),
            _ => panic!("Allele index {} out of range for a bi-allelic marker", allele),
        }
    }
}

/// Per item allele frequencies at markers with any number of alleles.
///
/// All frequencies live in one `items x alleles` matrix; `loci` holds the
/// column range of each marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiAllelicGenotypeVariantData {
    name: String,
    headers: Headers,
    marker_names: Vec<String>,
    allele_names: Vec<Vec<String>>,
    loci: Vec<(usize, usize)>,
    frequencies: Array2<AlleleFrequency>,
    missing: Array2<bool>,
}

impl MultiAllelicGenotypeVariantData {
    /// `frequencies[item][marker]` holds one frequency per allele of the
    /// marker, or `None` if the item was not scored there.
    pub fn new<S: AsRef<str>, T: AsRef<str>>(
        name: &str,
        item_names: &[S],
        marker_names: &[T],
        allele_names: Vec<Vec<String>>,
        frequencies: Vec<Vec<Option<Vec<AlleleFrequency>>>>,
    ) -> Result<Self> {
        let loci = loci(marker_names.len(), &allele_names)?;
        check_rows(item_names.len(), frequencies.len())?;
        let width = loci.last().map_or(0, |&(_, end)| end);

        let mut matrix = Array2::zeros((frequencies.len(), width));
        let mut missing = Array2::from_elem((frequencies.len(), loci.len()), false);
        for (id, row) in frequencies.iter().enumerate() {
            check_markers(id, row.len(), loci.len())?;
            for (marker, (cell, &(start, end))) in row.iter().zip(loci.iter()).enumerate() {
                let values = match cell {
                    Some(values) => values,
                    None => {
                        missing[[id, marker]] = true;
                        continue;
                    }
                };
                if values.len() != end - start {
                    return Err(CoreError::dimension(format!(
                        "Item {} has {} allele frequencies at marker {}, expected {}",
                        id,
                        values.len(),
                        marker,
                        end - start
                    )));
                }
                if let Some(f) = values.iter().find(|f| !(0.0..=1.0).contains(*f)) {
                    return Err(CoreError::invalid_data(format!(
                        "Allele frequency {} of item {} at marker {} is not in [0, 1]",
                        f, id, marker
                    )));
                }
                let total: f64 = values.iter().sum();
                if total > 1.0 + FREQUENCY_TOLERANCE {
                    return Err(CoreError::invalid_data(format!(
                        "Allele frequencies of item {} at marker {} sum to {}",
                        id, marker, total
                    )));
                }
                for (allele, &f) in values.iter().enumerate() {
                    matrix[[id, start + allele]] = f;
                }
            }
        }

        Ok(Self::from_parts(
            name,
            item_names,
            marker_names,
            allele_names,
            loci,
            matrix,
            missing,
        ))
    }

    /// Builds frequencies from observed allele counts.
    ///
    /// Counts are normalised per item and marker; an item whose counts at a
    /// marker are all zero is missing there.
    pub fn from_counts<S: AsRef<str>, T: AsRef<str>>(
        name: &str,
        item_names: &[S],
        marker_names: &[T],
        allele_names: Vec<Vec<String>>,
        counts: Vec<Vec<Vec<AlleleCount>>>,
    ) -> Result<Self> {
        let loci = loci(marker_names.len(), &allele_names)?;
        check_rows(item_names.len(), counts.len())?;
        let width = loci.last().map_or(0, |&(_, end)| end);

        let mut data = Vec::with_capacity(counts.len() * width);
        for (id, row) in counts.into_iter().enumerate() {
            check_markers(id, row.len(), loci.len())?;
            for (marker, (alleles, &(start, end))) in row.into_iter().zip(loci.iter()).enumerate() {
                if alleles.len() != end - start {
                    return Err(CoreError::dimension(format!(
                        "Item {} has {} allele counts at marker {}, expected {}",
                        id,
                        alleles.len(),
                        marker,
                        end - start
                    )));
                }
                data.extend(alleles);
            }
        }
        let items = item_names.len();
        let counts = Array2::from_shape_vec((items, width), data)
            .map_err(|e| CoreError::dimension(e.to_string()))?;

        let mut frequencies = Array2::<AlleleFrequency>::zeros(counts.dim());
        let mut missing = Array2::from_elem((items, loci.len()), false);
        Zip::from(frequencies.rows_mut())
            .and(counts.rows())
            .and(missing.rows_mut())
            .for_each(|mut freqs, row, mut missing| {
                for (marker, &(start, end)) in loci.iter().enumerate() {
                    let locus_sum = row.slice(s![start..end]).sum();
                    if locus_sum == 0 {
                        missing[marker] = true;
                        continue;
                    }
                    freqs
                        .slice_mut(s![start..end])
                        .assign(&row.slice(s![start..end]).mapv(|x| x as f64 / locus_sum as f64));
                }
            });

        Ok(Self::from_parts(
            name,
            item_names,
            marker_names,
            allele_names,
            loci,
            frequencies,
            missing,
        ))
    }

    fn from_parts<S: AsRef<str>, T: AsRef<str>>(
        name: &str,
        item_names: &[S],
        marker_names: &[T],
        allele_names: Vec<Vec<String>>,
        loci: Vec<(usize, usize)>,
        frequencies: Array2<AlleleFrequency>,
        missing: Array2<bool>,
    ) -> Self {
        debug!(
            name,
            items = frequencies.nrows(),
            markers = loci.len(),
            alleles = frequencies.ncols(),
            missing = missing.iter().filter(|&&m| m).count(),
            "Loaded multi-allelic genotypes"
        );
        Self {
            name: name.into(),
            headers: headers_from_names(item_names),
            marker_names: marker_names.iter().map(|m| m.as_ref().into()).collect(),
            allele_names,
            loci,
            frequencies,
            missing,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total number of alleles over all markers.
    pub fn total_number_of_alleles(&self) -> usize {
        self.frequencies.ncols()
    }
}

/// Column ranges of each marker's alleles in the flattened frequency matrix.
fn loci(markers: usize, allele_names: &[Vec<String>]) -> Result<Vec<(usize, usize)>> {
    if allele_names.len() != markers {
        return Err(CoreError::dimension(format!(
            "Got {} marker names but allele names for {} markers",
            markers,
            allele_names.len()
        )));
    }
    let mut start = 0;
    allele_names
        .iter()
        .enumerate()
        .map(|(marker, alleles)| {
            if alleles.is_empty() {
                return Err(CoreError::invalid_data(format!(
                    "Marker {} has no alleles",
                    marker
                )));
            }
            let locus = (start, start + alleles.len());
            start = locus.1;
            Ok(locus)
        })
        .collect()
}

fn check_rows(items: usize, rows: usize) -> Result<()> {
    if items != rows {
        return Err(CoreError::dimension(format!(
            "Got {} item names but data for {} items",
            items, rows
        )));
    }
    Ok(())
}

fn check_markers(id: usize, found: usize, markers: usize) -> Result<()> {
    if found != markers {
        return Err(CoreError::dimension(format!(
            "Item {} has data for {} markers but there are {} marker names",
            id, found, markers
        )));
    }
    Ok(())
}

impl ItemData for MultiAllelicGenotypeVariantData {
    fn size(&self) -> usize {
        self.frequencies.nrows()
    }

    fn header(&self, id: usize) -> Option<&Header> {
        self.headers.get(id).and_then(Option::as_ref)
    }
}

impl GenotypeVariantData for MultiAllelicGenotypeVariantData {
    fn number_of_markers(&self) -> usize {
        self.loci.len()
    }

    fn number_of_alleles(&self, marker: usize) -> usize {
        let (start, end) = self.loci[marker];
        end - start
    }

    fn marker_name(&self, marker: usize) -> &str {
        &self.marker_names[marker]
    }

    fn allele_name(&self, marker: usize, allele: usize) -> Option<&str> {
        self.allele_names[marker].get(allele).map(String::as_str)
    }

    fn is_missing(&self, id: usize, marker: usize) -> bool {
        self.missing[[id, marker]]
    }

    fn allele_frequency(&self, id: usize, marker: usize, allele: usize) -> Option<AlleleFrequency> {
        let (start, end) = self.loci[marker];
        assert!(
            allele < end - start,
            "Allele index {} out of range for marker {}",
            allele,
            marker
        );
        if self.missing[[id, marker]] {
            None
        } else {
            Some(self.frequencies[[id, start + allele]])
        }
    }
}

/// Either kind of genotype data, as held by a merged dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Genotypes {
    BiAllelic(BiAllelicGenotypeVariantData),
    MultiAllelic(MultiAllelicGenotypeVariantData),
}

impl From<BiAllelicGenotypeVariantData> for Genotypes {
    fn from(data: BiAllelicGenotypeVariantData) -> Self {
        Genotypes::BiAllelic(data)
    }
}

impl From<MultiAllelicGenotypeVariantData> for Genotypes {
    fn from(data: MultiAllelicGenotypeVariantData) -> Self {
        Genotypes::MultiAllelic(data)
    }
}

impl Genotypes {
    pub fn name(&self) -> &str {
        match self {
            Genotypes::BiAllelic(data) => data.name(),
            Genotypes::MultiAllelic(data) => data.name(),
        }
    }
}

impl ItemData for Genotypes {
    fn size(&self) -> usize {
        match self {
            Genotypes::BiAllelic(data) => data.size(),
            Genotypes::MultiAllelic(data) => data.size(),
        }
    }

    fn header(&self, id: usize) -> Option<&Header> {
        match self {
            Genotypes::BiAllelic(data) => data.header(id),
            Genotypes::MultiAllelic(data) => data.header(id),
        }
    }
}

impl GenotypeVariantData for Genotypes {
    fn number_of_markers(&self) -> usize {
        match self {
            Genotypes::BiAllelic(data) => data.number_of_markers(),
            Genotypes::MultiAllelic(data) => data.number_of_markers(),
        }
    }

    fn number_of_alleles(&self, marker: usize) -> usize {
        match self {
            Genotypes::BiAllelic(data) => data.number_of_alleles(marker),
            Genotypes::MultiAllelic(data) => data.number_of_alleles(marker),
        }
    }

    fn marker_name(&self, marker: usize) -> &str {
        match self {
            Genotypes::BiAllelic(data) => data.marker_name(marker),
            Genotypes::MultiAllelic(data) => data.marker_name(marker),
        }
    }

    fn allele_name(&self, marker: usize, allele: usize) -> Option<&str> {
        match self {
            Genotypes::BiAllelic(data) => data.allele_name(marker, allele),
            Genotypes::MultiAllelic(data) => data.allele_name(marker, allele),
        }
    }

    fn is_missing(&self, id: usize, marker: usize) -> bool {
        match self {
            Genotypes::BiAllelic(data) => data.is_missing(id, marker),
            Genotypes::MultiAllelic(data) => data.is_missing(id, marker),
        }
    }

    fn allele_frequency(&self, id: usize, marker: usize, allele: usize) -> Option<AlleleFrequency> {
        match self {
            Genotypes::BiAllelic(data) => data.allele_frequency(id, marker, allele),
            Genotypes::MultiAllelic(data) => data.allele_frequency(id, marker, allele),
        }
    }
}
