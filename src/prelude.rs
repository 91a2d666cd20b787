pub use crate::config::{Evaluator, EvaluatorConfig};
pub use crate::data::CoreHunterData;
pub use crate::distance::{DistanceMatrixData, DistanceMetric};
pub use crate::error::{CoreError, Result};
pub use crate::genetic_distance::{GenotypeDistance, GenotypeVariantDistanceMetric};
pub use crate::genetics::{
    BiAllelicGenotypeVariantData, GenotypeVariantData, Genotypes, MultiAllelicGenotypeVariantData,
};
pub use crate::gower::GowersDistanceMatrixGenerator;
pub use crate::objectives::{evaluate_batch, DistanceSource, Evaluation, Objective};
pub use crate::phenotype::{DataType, Feature, FeatureData, Scale, ScaleType, Value};
pub use crate::range::Range;
pub use crate::{Header, Headers, Ids, ItemData};
