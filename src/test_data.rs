//! Shared fixtures for unit tests: five accessions scored on seven markers.

use crate::{
    BiAllelicGenotypeVariantData, DistanceMatrixData, Ids, MultiAllelicGenotypeVariantData,
};

pub const PRECISION: f64 = 1e-9;

pub const NAMES: [&str; 5] = ["Name1", "Name2", "Name3", "Name4", "Name5"];

pub const DISTANCES: [[f64; 5]; 5] = [
    [0.0, 0.8, 0.6, 0.4, 0.2],
    [0.8, 0.0, 0.8, 0.6, 0.4],
    [0.6, 0.8, 0.0, 0.9, 0.6],
    [0.4, 0.6, 0.9, 0.0, 0.8],
    [0.2, 0.4, 0.6, 0.8, 0.0],
];

pub const MARKER_NAMES: [&str; 7] = ["mk1", "mk2", "mk3", "mk4", "mk5", "mk6", "mk7"];

pub const ALLELE_SCORES: [[u8; 7]; 5] = [
    [1, 0, 2, 1, 1, 0, 0],
    [2, 0, 2, 0, 1, 2, 1],
    [1, 0, 1, 0, 1, 1, 0],
    [1, 0, 1, 1, 1, 2, 2],
    [1, 0, 2, 0, 1, 2, 0],
];

pub fn full_set() -> Ids {
    (0..5).collect()
}

pub fn subset() -> Ids {
    vec![2, 3].into_iter().collect()
}

pub fn distance_rows() -> Vec<Vec<f64>> {
    DISTANCES.iter().map(|row| row.to_vec()).collect()
}

pub fn distances() -> DistanceMatrixData {
    DistanceMatrixData::from_names(&NAMES, distance_rows()).unwrap()
}

pub fn bi_allelic() -> BiAllelicGenotypeVariantData {
    let scores = ALLELE_SCORES
        .iter()
        .map(|row| row.iter().map(|&score| Some(score)).collect())
        .collect();
    BiAllelicGenotypeVariantData::new("bi-allelic", &NAMES, &MARKER_NAMES, scores).unwrap()
}

pub fn allele_names() -> Vec<Vec<String>> {
    [3, 2, 3, 4, 3, 2, 2]
        .iter()
        .zip(MARKER_NAMES.iter())
        .map(|(&n, marker)| (1..=n).map(|a| format!("{}-{}", marker, a)).collect())
        .collect()
}

fn row(frequencies: &[&[f64]]) -> Vec<Option<Vec<f64>>> {
    frequencies.iter().map(|f| Some(f.to_vec())).collect()
}

const THIRDS: [f64; 3] = [0.33, 0.33, 0.33];
const QUARTERS: [f64; 4] = [0.25, 0.25, 0.25, 0.25];

fn polymorphic_row() -> Vec<Option<Vec<f64>>> {
    row(&[
        &THIRDS,
        &[0.5, 0.5],
        &[0.0, 0.5, 0.5],
        &QUARTERS,
        &THIRDS,
        &[0.0, 1.0],
        &[1.0, 0.0],
    ])
}

/// Every accession carries the same allele frequencies.
pub fn uniform_multi_allelic() -> MultiAllelicGenotypeVariantData {
    let frequencies = (0..5).map(|_| polymorphic_row()).collect();
    MultiAllelicGenotypeVariantData::new(
        "uniform",
        &NAMES,
        &MARKER_NAMES,
        allele_names(),
        frequencies,
    )
    .unwrap()
}

/// Every accession is homozygous for the first allele of every marker.
pub fn monomorphic_multi_allelic() -> MultiAllelicGenotypeVariantData {
    let frequencies = (0..5)
        .map(|_| {
            allele_names()
                .iter()
                .map(|alleles| {
                    let mut f = vec![0.0; alleles.len()];
                    f[0] = 1.0;
                    Some(f)
                })
                .collect()
        })
        .collect();
    MultiAllelicGenotypeVariantData::new(
        "monomorphic",
        &NAMES,
        &MARKER_NAMES,
        allele_names(),
        frequencies,
    )
    .unwrap()
}

/// Distinct accessions; "Name4" has no data for "mk5".
pub fn varied_multi_allelic() -> MultiAllelicGenotypeVariantData {
    let mut item3 = row(&[
        &[0.0, 0.0, 1.0],
        &[0.0, 1.0],
        &[1.0, 0.0, 0.0],
        &QUARTERS,
        &[],
        &[0.0, 1.0],
        &[0.5, 0.5],
    ]);
    item3[4] = None;
    let frequencies = vec![
        polymorphic_row(),
        row(&[
            &[1.0, 0.0, 0.0],
            &[0.5, 0.5],
            &[0.0, 0.0, 1.0],
            &[0.5, 0.5, 0.0, 0.0],
            &[0.0, 1.0, 0.0],
            &[1.0, 0.0],
            &[1.0, 0.0],
        ]),
        row(&[
            &[0.0, 1.0, 0.0],
            &[1.0, 0.0],
            &[0.5, 0.5, 0.0],
            &[0.0, 0.0, 0.0, 1.0],
            &THIRDS,
            &[0.5, 0.5],
            &[0.0, 1.0],
        ]),
        item3,
        row(&[
            &[0.5, 0.5, 0.0],
            &[0.5, 0.5],
            &[0.0, 0.5, 0.5],
            &[1.0, 0.0, 0.0, 0.0],
            &[0.0, 0.0, 1.0],
            &[0.0, 1.0],
            &[1.0, 0.0],
        ]),
    ];
    MultiAllelicGenotypeVariantData::new("varied", &NAMES, &MARKER_NAMES, allele_names(), frequencies)
        .unwrap()
}
