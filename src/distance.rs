use crate::error::{check_id, CoreError, Result};
use crate::{headers_from_names, Header, Headers, Ids, ItemData};
use ndarray::Array2;
use tracing::debug;

/// Largest tolerated deviation from symmetry or from a zero diagonal.
const TOLERANCE: f64 = 1e-9;

/// Pairwise distances over a fixed set of item ids.
///
/// Implemented both by precomputed matrices and by metrics derived from
/// genotypes, so distance based objectives accept either.
pub trait DistanceMetric: Sync {
    type Data: ?Sized;

    /// Distance between items `x` and `y`; fails for ids outside [`Self::ids`].
    fn distance(&self, x: usize, y: usize) -> Result<f64>;

    fn ids(&self) -> Ids;

    /// The dataset the distances are computed from.
    fn data(&self) -> &Self::Data;
}

/// A symmetric, non-negative distance matrix with a zero diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrixData {
    headers: Headers,
    matrix: Array2<f64>,
}

impl DistanceMatrixData {
    /// Wraps `matrix`, one header slot per row.
    pub fn new(headers: Headers, matrix: Array2<f64>) -> Result<Self> {
        let (rows, columns) = matrix.dim();
        if rows != columns {
            return Err(CoreError::invalid_data(format!(
                "Distance matrix is not square: {} rows and {} columns",
                rows, columns
            )));
        }
        if headers.len() != rows {
            return Err(CoreError::invalid_data(format!(
                "Distance matrix has {} rows but {} headers were given",
                rows,
                headers.len()
            )));
        }

        for ((i, j), &value) in matrix.indexed_iter() {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::invalid_data(format!(
                    "Distance [{}][{}] = {} is not a finite non-negative number",
                    i, j, value
                )));
            }
            if i == j && value.abs() > TOLERANCE {
                return Err(CoreError::invalid_data(format!(
                    "Distance of item {} to itself is {}, expected 0",
                    i, value
                )));
            }
            if j > i && (value - matrix[[j, i]]).abs() > TOLERANCE {
                return Err(CoreError::invalid_data(format!(
                    "Distance matrix is not symmetric at [{}][{}]",
                    i, j
                )));
            }
        }

        debug!(size = rows, "Loaded distance matrix");
        Ok(Self { headers, matrix })
    }

    /// Builds a matrix without headers from row vectors.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let size = rows.len();
        Self::new(vec![None; size], square(rows)?)
    }

    /// Builds a matrix whose items are identified by `names`.
    pub fn from_names<S: AsRef<str>>(names: &[S], rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::new(headers_from_names(names), square(rows)?)
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.header(id).and_then(Header::name)
    }

    pub fn headers(&self) -> &[Option<Header>] {
        &self.headers
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }
}

fn square(rows: Vec<Vec<f64>>) -> Result<Array2<f64>> {
    let size = rows.len();
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != size) {
        return Err(CoreError::invalid_data(format!(
            "Distance matrix is not square: row {} has {} values, expected {}",
            i,
            row.len(),
            size
        )));
    }
    let values = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((size, size), values).map_err(|e| CoreError::invalid_data(e.to_string()))
}

impl ItemData for DistanceMatrixData {
    fn size(&self) -> usize {
        self.matrix.nrows()
    }

    fn header(&self, id: usize) -> Option<&Header> {
        self.headers.get(id).and_then(Option::as_ref)
    }
}

impl DistanceMetric for DistanceMatrixData {
    type Data = DistanceMatrixData;

    fn distance(&self, x: usize, y: usize) -> Result<f64> {
        check_id(x, self.size())?;
        check_id(y, self.size())?;
        Ok(self.matrix[[x, y]])
    }

    fn ids(&self) -> Ids {
        (0..self.size()).collect()
    }

    fn data(&self) -> &DistanceMatrixData {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::*;
    use proptest::prelude::*;
    use std::error::Error;
    use std::result::Result;

    #[test]
    fn test_named_matrix_serves_values_and_names() -> Result<(), Box<dyn Error>> {
        let data = distances();
        assert_eq!(data.ids(), full_set());
        for i in 0..5 {
            assert_eq!(data.name(i), Some(NAMES[i]));
            for j in 0..5 {
                assert!((data.distance(i, j)? - DISTANCES[i][j]).abs() < PRECISION);
            }
        }
        Ok(())
    }

    #[test]
    fn test_distance_is_symmetric() -> Result<(), Box<dyn Error>> {
        let data = distances();
        assert_eq!(data.distance(0, 1)?, 0.8);
        assert_eq!(data.distance(1, 0)?, 0.8);
        Ok(())
    }

    #[test]
    fn test_unnamed_matrix_has_no_headers() -> Result<(), Box<dyn Error>> {
        let data = DistanceMatrixData::from_rows(distance_rows())?;
        assert_eq!(data.size(), 5);
        assert!(data.header(2).is_none());
        Ok(())
    }

    #[test]
    fn test_non_square_matrix_is_rejected() {
        let mut rows = distance_rows();
        rows[3].pop();
        let err = DistanceMatrixData::from_names(&NAMES, rows).unwrap_err();
        assert!(matches!(err, CoreError::InvalidData { .. }));
    }

    #[test]
    fn test_name_count_must_match_dimension() {
        let err = DistanceMatrixData::from_names(&NAMES[..4], distance_rows()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidData { .. }));
    }

    #[test]
    fn test_asymmetric_matrix_is_rejected() {
        let mut rows = distance_rows();
        rows[1][3] = 0.5;
        assert!(DistanceMatrixData::from_rows(rows).is_err());
    }

    #[test]
    fn test_non_zero_diagonal_is_rejected() {
        let mut rows = distance_rows();
        rows[2][2] = 1.0;
        assert!(DistanceMatrixData::from_rows(rows).is_err());
    }

    #[test]
    fn test_unknown_id_fails_fast() {
        let data = distances();
        assert_eq!(
            data.distance(0, 5),
            Err(CoreError::UnknownId { id: 5, size: 5 })
        );
    }

    fn symmetric_rows() -> impl Strategy<Value = Vec<Vec<f64>>> {
        (1usize..8).prop_flat_map(|n| {
            proptest::collection::vec(0.0f64..10.0, n * n).prop_map(move |values| {
                let mut rows = vec![vec![0.0; n]; n];
                for i in 0..n {
                    for j in (i + 1)..n {
                        rows[i][j] = values[i * n + j];
                        rows[j][i] = values[i * n + j];
                    }
                }
                rows
            })
        })
    }

    proptest! {
        #[test]
        fn prop_valid_matrices_are_symmetric_with_zero_diagonal(rows in symmetric_rows()) {
            let data = DistanceMatrixData::from_rows(rows).unwrap();
            for i in data.ids() {
                prop_assert_eq!(data.distance(i, i).unwrap(), 0.0);
                for j in data.ids() {
                    prop_assert_eq!(data.distance(i, j).unwrap(), data.distance(j, i).unwrap());
                }
            }
        }
    }
}
