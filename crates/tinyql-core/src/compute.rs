//! Elementwise kernels, thin wrappers over the arrow compute kernels.
//!
//! Nulls propagate: any null operand produces a null result, including for `AND`/`OR`.
//! Integer arithmetic is checked; overflow and division by zero are errors.

use crate::types::DataType;
use arrow::array::{Array, ArrayRef, AsArray, BooleanArray};
use arrow::compute::kernels::{boolean, cmp, numeric};
use arrow::compute::{cast_with_options, filter_record_batch, CastOptions};
use arrow::datatypes::{DataType as ArrowType, Float64Type};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputeError {
    #[error("type mismatch: {left} {op} {right}")]
    TypeMismatch {
        op: BinaryOperator,
        left: ArrowType,
        right: ArrowType,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in '{0}'")]
    Overflow(BinaryOperator),

    #[error("cannot cast {from} to {to}: {reason}")]
    Cast {
        from: ArrowType,
        to: DataType,
        reason: String,
    },

    #[error("operand length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("invalid selection mask: {0}")]
    InvalidMask(String),

    #[error("invalid record batch: {0}")]
    InvalidBatch(String),

    #[error("kernel error: {0}")]
    Kernel(String),
}

impl From<ArrowError> for ComputeError {
    fn from(e: ArrowError) -> Self {
        match e {
            ArrowError::DivideByZero => ComputeError::DivisionByZero,
            ArrowError::InvalidArgumentError(msg) => ComputeError::InvalidBatch(msg),
            other => ComputeError::Kernel(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_arithmetic(&self) -> bool {
        use BinaryOperator::*;
        matches!(self, Plus | Minus | Multiply | Divide)
    }

    pub fn is_comparison(&self) -> bool {
        use BinaryOperator::*;
        matches!(self, Eq | NotEq | Lt | LtEq | Gt | GtEq)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    /// Result type of applying this operator to operands of the given types,
    /// or `None` if the combination is not supported.
    pub fn result_type(&self, left: DataType, right: DataType) -> Option<DataType> {
        if left != right {
            return None;
        }
        if self.is_arithmetic() {
            left.is_numeric().then_some(left)
        } else if self.is_comparison() {
            Some(DataType::Bool)
        } else {
            (left == DataType::Bool).then_some(DataType::Bool)
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        };
        write!(f, "{}", s)
    }
}

fn arithmetic_error(op: BinaryOperator, e: ArrowError) -> ComputeError {
    match e {
        ArrowError::DivideByZero => ComputeError::DivisionByZero,
        // Checked integer kernels report overflow as a compute error.
        other if other.to_string().to_ascii_lowercase().contains("overflow") => {
            ComputeError::Overflow(op)
        }
        other => ComputeError::Kernel(other.to_string()),
    }
}

/// Apply `op` elementwise to two equally long arrays of the same type.
pub fn binary_op(
    left: &ArrayRef,
    right: &ArrayRef,
    op: BinaryOperator,
) -> Result<ArrayRef, ComputeError> {
    if left.len() != right.len() {
        return Err(ComputeError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    let mismatch = || ComputeError::TypeMismatch {
        op,
        left: left.data_type().clone(),
        right: right.data_type().clone(),
    };
    let supported = match (
        DataType::from_arrow(left.data_type()),
        DataType::from_arrow(right.data_type()),
    ) {
        (Some(l), Some(r)) => op.result_type(l, r).is_some(),
        _ => false,
    };
    if !supported {
        return Err(mismatch());
    }

    use BinaryOperator::*;
    let result: ArrayRef = match op {
        Plus => numeric::add(left, right).map_err(|e| arithmetic_error(op, e))?,
        Minus => numeric::sub(left, right).map_err(|e| arithmetic_error(op, e))?,
        Multiply => numeric::mul(left, right).map_err(|e| arithmetic_error(op, e))?,
        Divide => numeric::div(left, right).map_err(|e| arithmetic_error(op, e))?,
        Eq => Arc::new(cmp::eq(left, right)?),
        NotEq => Arc::new(cmp::neq(left, right)?),
        Lt => Arc::new(cmp::lt(left, right)?),
        LtEq => Arc::new(cmp::lt_eq(left, right)?),
        Gt => Arc::new(cmp::gt(left, right)?),
        GtEq => Arc::new(cmp::gt_eq(left, right)?),
        And | Or => {
            let (l, r) = match (left.as_boolean_opt(), right.as_boolean_opt()) {
                (Some(l), Some(r)) => (l, r),
                _ => return Err(mismatch()),
            };
            // The non-Kleene kernels: a null on either side gives null.
            let out = if op == And {
                boolean::and(l, r)?
            } else {
                boolean::or(l, r)?
            };
            Arc::new(out)
        }
    };
    Ok(result)
}

/// Keep the rows of `batch` whose mask entry is true. Null entries count as false.
pub fn apply_mask(batch: &RecordBatch, mask: &ArrayRef) -> Result<RecordBatch, ComputeError> {
    let mask: &BooleanArray = mask.as_boolean_opt().ok_or_else(|| {
        ComputeError::InvalidMask(format!("expected BOOL mask, got {}", mask.data_type()))
    })?;
    if mask.len() != batch.num_rows() {
        return Err(ComputeError::InvalidMask(format!(
            "mask has {} entries but batch has {} rows",
            mask.len(),
            batch.num_rows()
        )));
    }
    if mask.true_count() == batch.num_rows() {
        return Ok(batch.clone());
    }
    Ok(filter_record_batch(batch, mask)?)
}

/// Convert `array` to `to`, failing on unsupported pairs and on lossy values.
///
/// Float to integer casts only accept values with no fractional part.
pub fn cast(array: &ArrayRef, to: DataType) -> Result<ArrayRef, ComputeError> {
    let from = array.data_type().clone();
    let target = to.to_arrow();
    if from == target {
        return Ok(array.clone());
    }
    let fail = |reason: String| ComputeError::Cast {
        from: from.clone(),
        to,
        reason,
    };

    let source = DataType::from_arrow(&from);
    if !source.map_or(false, |s| s.can_cast_to(&to)) {
        return Err(fail("unsupported conversion".to_string()));
    }
    if source == Some(DataType::Float64) && to == DataType::Int64 {
        let inexact = array
            .as_primitive::<Float64Type>()
            .iter()
            .flatten()
            .find(|f| f.fract() != 0.0);
        if let Some(f) = inexact {
            return Err(fail(format!("{} is not an exact integer", f)));
        }
    }

    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    cast_with_options(array, &target, &options).map_err(|e| fail(e.to_string()))
}
