use super::{BoxedExecutor, Executor, ExecutorResult};
use crate::eval::eval_array;
use crate::expr::BoundExpr;
use tinyql_core::compute::apply_mask;
use tinyql_core::RecordBatch;
use tracing::trace;

/// Keeps the rows whose predicate is true. Never emits an empty batch.
pub struct FilterExecutor {
    child: BoxedExecutor,
    predicate: BoundExpr,
}

impl FilterExecutor {
    pub fn new(child: BoxedExecutor, predicate: BoundExpr) -> Self {
        FilterExecutor { child, predicate }
    }
}

impl Executor for FilterExecutor {
    fn next_batch(&mut self) -> ExecutorResult<Option<RecordBatch>> {
        loop {
            let batch = match self.child.next_batch()? {
                Some(batch) => batch,
                None => return Ok(None),
            };
            let mask = eval_array(&self.predicate, &batch)?;
            let filtered = apply_mask(&batch, &mask)?;
            if filtered.num_rows() > 0 {
                return Ok(Some(filtered));
            }
            trace!(rows = batch.num_rows(), "filtered out whole batch");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::tests::{int_batch, ScriptedExecutor};
    use crate::executor::ExecutorError;
    use arrow::array::{AsArray, Int64Array};
    use arrow::datatypes::Int64Type;
    use tinyql_core::{BinaryOperator, DataType};

    fn greater_than(n: i64) -> BoundExpr {
        BoundExpr::binary(
            BinaryOperator::Gt,
            BoundExpr::input_ref(0, DataType::Int64),
            BoundExpr::constant(n),
            DataType::Bool,
        )
    }

    #[test]
    fn test_skips_batches_that_filter_to_nothing() {
        let child = ScriptedExecutor::new(vec![
            Ok(Some(int_batch("a", vec![1, 2]))),
            Ok(Some(int_batch("a", vec![3]))),
            Ok(Some(int_batch("a", vec![4, 9, 5]))),
            Ok(Some(int_batch("a", vec![0]))),
        ]);
        let calls = child.calls.clone();
        let mut filter = FilterExecutor::new(Box::new(child), greater_than(3));

        let batch = filter.next_batch().unwrap().unwrap();
        assert_eq!(batch.column(0).as_primitive::<Int64Type>(), &Int64Array::from(vec![4, 9, 5]));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 3);

        assert!(filter.next_batch().unwrap().is_none());
    }

    #[test]
    fn test_null_predicate_drops_row() {
        let child = ScriptedExecutor::new(vec![Ok(Some(int_batch("a", vec![5, 6])))]);
        let predicate = BoundExpr::binary(
            BinaryOperator::Gt,
            BoundExpr::input_ref(0, DataType::Int64),
            BoundExpr::Constant(tinyql_core::ScalarValue::Int64(None)),
            DataType::Bool,
        );
        let mut filter = FilterExecutor::new(Box::new(child), predicate);
        assert!(filter.next_batch().unwrap().is_none());
    }

    #[test]
    fn test_child_error_passes_through() {
        let child = ScriptedExecutor::new(vec![Err(ExecutorError::Internal("x".to_string()))]);
        let mut filter = FilterExecutor::new(Box::new(child), greater_than(0));
        assert!(matches!(filter.next_batch(), Err(ExecutorError::Internal(_))));
    }
}
