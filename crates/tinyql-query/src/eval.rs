//! Evaluates resolved expressions against a record batch.

use crate::executor::{ExecutorError, ExecutorResult};
use crate::expr::BoundExpr;
use tinyql_core::compute::{binary_op, cast};
use tinyql_core::{Array, ArrayRef, Field, RecordBatch};

/// Evaluate `expr` over every row of `batch`, returning the column and its schema entry.
///
/// An input reference keeps the name of the column it reads; any other expression is
/// named by its text.
pub fn eval(expr: &BoundExpr, batch: &RecordBatch) -> ExecutorResult<(ArrayRef, Field)> {
    let array = eval_array(expr, batch)?;
    let name = match expr {
        BoundExpr::InputRef(input) => batch
            .schema()
            .fields()
            .get(input.index)
            .map(|f| f.name().clone())
            .unwrap_or_else(|| expr.to_string()),
        _ => expr.to_string(),
    };
    let field = Field::new(name, array.data_type().clone(), true);
    Ok((array, field))
}

pub fn eval_array(expr: &BoundExpr, batch: &RecordBatch) -> ExecutorResult<ArrayRef> {
    match expr {
        BoundExpr::Constant(value) => Ok(value.to_array(batch.num_rows())),
        BoundExpr::InputRef(input) => batch.columns().get(input.index).cloned().ok_or_else(|| {
            ExecutorError::Internal(format!(
                "input #{} out of range for a batch of {} columns",
                input.index,
                batch.num_columns()
            ))
        }),
        BoundExpr::ColumnRef(column) => Err(ExecutorError::Internal(format!(
            "unresolved column {} reached evaluation",
            column.qualified_name()
        ))),
        BoundExpr::BinaryOp(b) => {
            let left = eval_array(&b.left, batch)?;
            let right = eval_array(&b.right, batch)?;
            Ok(binary_op(&left, &right, b.op)?)
        }
        BoundExpr::TypeCast(c) => {
            let inner = eval_array(&c.inner, batch)?;
            Ok(cast(&inner, c.target)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{AsArray, BooleanArray, Float64Array, Int64Array};
    use arrow::datatypes::{Float64Type, Int64Type};
    use std::sync::Arc;
    use tinyql_core::{new_field, new_schema, BinaryOperator, ComputeError, DataType};

    fn batch() -> RecordBatch {
        let schema = Arc::new(new_schema([("t.c1", DataType::Int64), ("t.c2", DataType::Int64)]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(Int64Array::from(vec![Some(10), None, Some(0)])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_input_ref_and_constant() {
        let (array, field) = eval(&BoundExpr::input_ref(1, DataType::Int64), &batch()).unwrap();
        assert_eq!(
            array.as_primitive::<Int64Type>(),
            &Int64Array::from(vec![Some(10), None, Some(0)])
        );
        assert_eq!(field, new_field("t.c2", DataType::Int64));

        let (array, field) = eval(&BoundExpr::constant(7), &batch()).unwrap();
        assert_eq!(array.as_primitive::<Int64Type>(), &Int64Array::from(vec![7, 7, 7]));
        assert_eq!(field.name(), "7");
    }

    #[test]
    fn test_binary_and_cast() {
        let expr = BoundExpr::binary(
            BinaryOperator::Eq,
            BoundExpr::input_ref(1, DataType::Int64),
            BoundExpr::constant(10),
            DataType::Bool,
        );
        let (mask, field) = eval(&expr, &batch()).unwrap();
        assert_eq!(mask.as_boolean(), &BooleanArray::from(vec![Some(true), None, Some(false)]));
        assert_eq!(field, new_field("(#1 = 10)", DataType::Bool));

        let cast_expr =
            BoundExpr::cast(DataType::Float64, BoundExpr::input_ref(0, DataType::Int64));
        let (array, _) = eval(&cast_expr, &batch()).unwrap();
        assert_eq!(
            array.as_primitive::<Float64Type>(),
            &Float64Array::from(vec![1.0, 2.0, 3.0])
        );
    }

    #[test]
    fn test_division_by_zero() {
        let expr = BoundExpr::binary(
            BinaryOperator::Divide,
            BoundExpr::input_ref(0, DataType::Int64),
            BoundExpr::input_ref(1, DataType::Int64),
            DataType::Int64,
        );
        assert!(matches!(
            eval(&expr, &batch()),
            Err(ExecutorError::Compute(ComputeError::DivisionByZero))
        ));
    }

    #[test]
    fn test_invariant_violations_are_internal() {
        assert!(matches!(
            eval(&BoundExpr::input_ref(5, DataType::Int64), &batch()),
            Err(ExecutorError::Internal(_))
        ));
        assert!(matches!(
            eval(&BoundExpr::column("t", "c1", DataType::Int64), &batch()),
            Err(ExecutorError::Internal(_))
        ));
    }
}
