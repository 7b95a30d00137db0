use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::DataType as ArrowType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int64,
    Float64,
    Bool,
    String,
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }

    /// Whether values of `self` may be implicitly widened to `target` by the binder.
    pub fn can_widen_to(&self, target: &DataType) -> bool {
        self == target || (*self == DataType::Int64 && *target == DataType::Float64)
    }

    /// Whether an explicit cast from `self` to `target` is allowed at all. Individual
    /// values may still fail to convert at run time.
    pub fn can_cast_to(&self, target: &DataType) -> bool {
        use DataType::*;
        match (self, target) {
            (a, b) if a == b => true,
            (_, String) => true,
            (Int64, Float64) | (Float64, Int64) | (Bool, Int64) => true,
            (String, Int64) | (String, Float64) | (String, Bool) => true,
            _ => false,
        }
    }
}

impl DataType {
    pub fn to_arrow(&self) -> ArrowType {
        match self {
            DataType::Int64 => ArrowType::Int64,
            DataType::Float64 => ArrowType::Float64,
            DataType::Bool => ArrowType::Boolean,
            DataType::String => ArrowType::Utf8,
        }
    }

    /// The SQL type stored as `arrow`, if it is one of ours.
    pub fn from_arrow(arrow: &ArrowType) -> Option<Self> {
        match arrow {
            ArrowType::Int64 => Some(DataType::Int64),
            ArrowType::Float64 => Some(DataType::Float64),
            ArrowType::Boolean => Some(DataType::Bool),
            ArrowType::Utf8 => Some(DataType::String),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int64 => write!(f, "INT64"),
            DataType::Float64 => write!(f, "FLOAT64"),
            DataType::Bool => write!(f, "BOOL"),
            DataType::String => write!(f, "STRING"),
        }
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "int64" | "bigint" | "integer" => Ok(DataType::Int64),
            "float" | "float64" | "double" | "real" => Ok(DataType::Float64),
            "bool" | "boolean" => Ok(DataType::Bool),
            "string" | "text" | "varchar" => Ok(DataType::String),
            other => Err(format!("unknown data type: {}", other)),
        }
    }
}

/// A single typed value. Nulls keep their type so constants are typed even when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    Int64(Option<i64>),
    Float64(Option<f64>),
    Bool(Option<bool>),
    String(Option<String>),
}

impl ScalarValue {
    pub fn null(data_type: DataType) -> Self {
        match data_type {
            DataType::Int64 => ScalarValue::Int64(None),
            DataType::Float64 => ScalarValue::Float64(None),
            DataType::Bool => ScalarValue::Bool(None),
            DataType::String => ScalarValue::String(None),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ScalarValue::Int64(_) => DataType::Int64,
            ScalarValue::Float64(_) => DataType::Float64,
            ScalarValue::Bool(_) => DataType::Bool,
            ScalarValue::String(_) => DataType::String,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            ScalarValue::Int64(v) => v.is_none(),
            ScalarValue::Float64(v) => v.is_none(),
            ScalarValue::Bool(v) => v.is_none(),
            ScalarValue::String(v) => v.is_none(),
        }
    }

    /// An array of `len` copies of this value.
    pub fn to_array(&self, len: usize) -> ArrayRef {
        match self {
            ScalarValue::Int64(v) => Arc::new(Int64Array::from(vec![*v; len])),
            ScalarValue::Float64(v) => Arc::new(Float64Array::from(vec![*v; len])),
            ScalarValue::Bool(v) => Arc::new(BooleanArray::from(vec![*v; len])),
            ScalarValue::String(v) => Arc::new(StringArray::from(vec![v.as_deref(); len])),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int64(Some(v)) => write!(f, "{}", v),
            ScalarValue::Float64(Some(v)) => write!(f, "{}", v),
            ScalarValue::Bool(Some(v)) => write!(f, "{}", v),
            ScalarValue::String(Some(v)) => write!(f, "'{}'", v),
            _ => write!(f, "NULL"),
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Int64(Some(v))
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::Float64(Some(v))
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        ScalarValue::Bool(Some(v))
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        ScalarValue::String(Some(v.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_parse() {
        assert_eq!("int".parse::<DataType>(), Ok(DataType::Int64));
        assert_eq!("BIGINT".parse::<DataType>(), Ok(DataType::Int64));
        assert_eq!("double".parse::<DataType>(), Ok(DataType::Float64));
        assert_eq!("text".parse::<DataType>(), Ok(DataType::String));
        assert!("blob".parse::<DataType>().is_err());
    }

    #[test]
    fn test_cast_policy() {
        assert!(DataType::Int64.can_cast_to(&DataType::Float64));
        assert!(DataType::Bool.can_cast_to(&DataType::String));
        assert!(!DataType::Float64.can_cast_to(&DataType::Bool));
        assert!(!DataType::Int64.can_cast_to(&DataType::Bool));
        assert!(DataType::Int64.can_widen_to(&DataType::Float64));
        assert!(!DataType::Float64.can_widen_to(&DataType::Int64));
    }

    #[test]
    fn test_arrow_mapping() {
        for t in [DataType::Int64, DataType::Float64, DataType::Bool, DataType::String] {
            assert_eq!(DataType::from_arrow(&t.to_arrow()), Some(t));
        }
        assert_eq!(DataType::from_arrow(&ArrowType::Int32), None);
    }

    #[test]
    fn test_scalar_to_array() {
        use arrow::array::{Array, AsArray};
        use arrow::datatypes::Int64Type;

        let array = ScalarValue::from(7).to_array(3);
        assert_eq!(array.as_primitive::<Int64Type>(), &Int64Array::from(vec![7, 7, 7]));

        let nulls = ScalarValue::null(DataType::String).to_array(2);
        assert_eq!(nulls.data_type(), &ArrowType::Utf8);
        assert_eq!(nulls.null_count(), 2);
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(ScalarValue::from(42).to_string(), "42");
        assert_eq!(ScalarValue::from("x").to_string(), "'x'");
        assert_eq!(ScalarValue::null(DataType::Bool).to_string(), "NULL");
    }
}
