//! Phenotypic trait data: typed features measured on each item.

use crate::error::{CoreError, Result};
use crate::range::Range;
use crate::{headers_from_names, Header, Headers, ItemData};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleType {
    Nominal,
    Ordinal,
    Interval,
    Ratio,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Short,
    Integer,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
    String,
    Date,
    Lsid,
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        match self {
            DataType::Short
            | DataType::Integer
            | DataType::Long
            | DataType::BigInteger
            | DataType::Float
            | DataType::Double
            | DataType::BigDecimal => true,
            DataType::Boolean | DataType::String | DataType::Date | DataType::Lsid => false,
        }
    }

    /// True if `value` can be stored in a feature of this data type.
    fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (DataType::Boolean, Value::Boolean(_)) => true,
            (DataType::Short, Value::Integer(_))
            | (DataType::Integer, Value::Integer(_))
            | (DataType::Long, Value::Integer(_))
            | (DataType::BigInteger, Value::Integer(_)) => true,
            (DataType::Float, Value::Integer(_))
            | (DataType::Float, Value::Double(_))
            | (DataType::Double, Value::Integer(_))
            | (DataType::Double, Value::Double(_))
            | (DataType::BigDecimal, Value::Integer(_))
            | (DataType::BigDecimal, Value::Double(_)) => true,
            (DataType::String, Value::Text(_))
            | (DataType::Date, Value::Text(_))
            | (DataType::Lsid, Value::Text(_)) => true,
            _ => false,
        }
    }
}

/// How a feature is measured. Continuous scales may declare their bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    scale_type: ScaleType,
    data_type: DataType,
    bounds: Option<Range<f64>>,
}

impl Scale {
    pub fn new(scale_type: ScaleType, data_type: DataType) -> Self {
        Self {
            scale_type,
            data_type,
            bounds: None,
        }
    }

    pub fn continuous(scale_type: ScaleType, data_type: DataType, bounds: Range<f64>) -> Self {
        Self {
            scale_type,
            data_type,
            bounds: Some(bounds),
        }
    }

    pub fn scale_type(&self) -> ScaleType {
        self.scale_type
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn bounds(&self) -> Option<&Range<f64>> {
        self.bounds.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    name: String,
    scale: Scale,
}

impl Feature {
    pub fn new(name: &str, scale: Scale) -> Self {
        Self {
            name: name.into(),
            scale,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }
}

/// A single observed trait value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            Value::Boolean(_) | Value::Text(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

/// A table of feature values, one row per item; `None` cells are missing.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureData {
    name: String,
    headers: Headers,
    features: Vec<Feature>,
    values: Vec<Vec<Option<Value>>>,
}

impl FeatureData {
    pub fn new(
        name: &str,
        headers: Headers,
        features: Vec<Feature>,
        values: Vec<Vec<Option<Value>>>,
    ) -> Result<Self> {
        if headers.len() != values.len() {
            return Err(CoreError::dimension(format!(
                "Got {} headers but {} rows of feature values",
                headers.len(),
                values.len()
            )));
        }
        for (id, row) in values.iter().enumerate() {
            if row.len() != features.len() {
                return Err(CoreError::dimension(format!(
                    "Item {} has {} values but there are {} features",
                    id,
                    row.len(),
                    features.len()
                )));
            }
            for (feature, value) in features.iter().zip(row.iter()) {
                if let Some(value) = value {
                    if !feature.scale.data_type.accepts(value) {
                        return Err(CoreError::invalid_data(format!(
                            "Value {:?} of item {} does not fit feature {} of type {:?}",
                            value, id, feature.name, feature.scale.data_type
                        )));
                    }
                }
            }
        }

        debug!(
            name,
            items = values.len(),
            features = features.len(),
            "Loaded phenotypic data"
        );
        Ok(Self {
            name: name.into(),
            headers,
            features,
            values,
        })
    }

    /// Feature data whose items are identified by `item_names`.
    pub fn from_names<S: AsRef<str>>(
        name: &str,
        item_names: &[S],
        features: Vec<Feature>,
        values: Vec<Vec<Option<Value>>>,
    ) -> Result<Self> {
        Self::new(name, headers_from_names(item_names), features, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn number_of_features(&self) -> usize {
        self.features.len()
    }

    pub fn headers(&self) -> &[Option<Header>] {
        &self.headers
    }

    /// Value of `feature` for item `id`; `None` if missing or out of range.
    pub fn value(&self, id: usize, feature: usize) -> Option<&Value> {
        self.values.get(id)?.get(feature)?.as_ref()
    }

    /// All values of one feature, in item order.
    pub fn column(&self, feature: usize) -> impl Iterator<Item = Option<&Value>> + '_ {
        self.values.iter().map(move |row| row[feature].as_ref())
    }
}

impl ItemData for FeatureData {
    fn size(&self) -> usize {
        self.values.len()
    }

    fn header(&self, id: usize) -> Option<&Header> {
        self.headers.get(id).and_then(Option::as_ref)
    }
}
