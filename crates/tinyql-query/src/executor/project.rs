use super::{BoxedExecutor, Executor, ExecutorResult};
use crate::eval::eval;
use crate::expr::OutputExpr;
use arrow::record_batch::RecordBatchOptions;
use std::sync::Arc;
use tinyql_core::{ComputeError, RecordBatch, Schema};

/// Computes one output column per item of the select list.
pub struct ProjectExecutor {
    child: BoxedExecutor,
    exprs: Vec<OutputExpr>,
}

impl ProjectExecutor {
    pub fn new(child: BoxedExecutor, exprs: Vec<OutputExpr>) -> Self {
        ProjectExecutor { child, exprs }
    }
}

impl Executor for ProjectExecutor {
    fn next_batch(&mut self) -> ExecutorResult<Option<RecordBatch>> {
        let batch = match self.child.next_batch()? {
            Some(batch) => batch,
            None => return Ok(None),
        };

        let mut fields = Vec::with_capacity(self.exprs.len());
        let mut columns = Vec::with_capacity(self.exprs.len());
        for output in &self.exprs {
            let (column, field) = eval(&output.expr, &batch)?;
            fields.push(field.with_name(output.name.clone()));
            columns.push(column);
        }

        let schema = Arc::new(Schema::new(fields));
        let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
        let projected = RecordBatch::try_new_with_options(schema, columns, &options)
            .map_err(ComputeError::from)?;
        Ok(Some(projected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::tests::{int_batch, ScriptedExecutor};
    use crate::expr::BoundExpr;
    use arrow::array::{AsArray, BooleanArray, Int64Array};
    use arrow::datatypes::Int64Type;
    use tinyql_core::{BinaryOperator, DataType, SchemaExt};

    #[test]
    fn test_project_names_and_values() {
        let child = ScriptedExecutor::new(vec![Ok(Some(int_batch("t.a", vec![1, 2])))]);
        let exprs = vec![
            OutputExpr::new(BoundExpr::input_ref(0, DataType::Int64), "a"),
            OutputExpr::new(
                BoundExpr::binary(
                    BinaryOperator::Multiply,
                    BoundExpr::input_ref(0, DataType::Int64),
                    BoundExpr::constant(10),
                    DataType::Int64,
                ),
                "tens",
            ),
        ];
        let mut project = ProjectExecutor::new(Box::new(child), exprs);

        let batch = project.next_batch().unwrap().unwrap();
        assert_eq!(batch.schema().names(), vec!["a", "tens"]);
        assert_eq!(batch.column(1).as_primitive::<Int64Type>(), &Int64Array::from(vec![10, 20]));
        assert!(project.next_batch().unwrap().is_none());
    }

    #[test]
    fn test_constant_only_projection_keeps_row_count() {
        let child = ScriptedExecutor::new(vec![Ok(Some(int_batch("t.a", vec![1, 2, 3])))]);
        let outputs = vec![OutputExpr::new(BoundExpr::constant(true), "k")];
        let mut project = ProjectExecutor::new(Box::new(child), outputs);
        let batch = project.next_batch().unwrap().unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.column(0).as_boolean(), &BooleanArray::from(vec![true, true, true]));
    }
}
