use super::{Executor, ExecutorResult};
use arrow::record_batch::RecordBatchOptions;
use tinyql_core::{ComputeError, RecordBatch, SchemaRef, Transaction};

/// Forwards the batches of one read transaction, relabelled with the scan's
/// qualified column names.
pub struct TableScanExecutor {
    transaction: Box<dyn Transaction>,
    schema: SchemaRef,
}

impl TableScanExecutor {
    pub fn new(transaction: Box<dyn Transaction>, schema: SchemaRef) -> Self {
        TableScanExecutor { transaction, schema }
    }
}

impl Executor for TableScanExecutor {
    fn next_batch(&mut self) -> ExecutorResult<Option<RecordBatch>> {
        match self.transaction.next_batch()? {
            Some(batch) => {
                let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
                let relabelled = RecordBatch::try_new_with_options(
                    self.schema.clone(),
                    batch.columns().to_vec(),
                    &options,
                )
                .map_err(ComputeError::from)?;
                Ok(Some(relabelled))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutorError;
    use std::sync::Arc;
    use arrow::array::Int64Array;
    use tinyql_core::{new_schema, DataType, StorageError, StorageResult};

    struct FailingTransaction {
        remaining: usize,
    }

    impl Transaction for FailingTransaction {
        fn next_batch(&mut self) -> StorageResult<Option<RecordBatch>> {
            if self.remaining == 0 {
                return Err(StorageError::Csv("disk on fire".to_string()));
            }
            self.remaining -= 1;
            let schema = Arc::new(new_schema([("a", DataType::Int64)]));
            let batch = RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1]))]);
            Ok(Some(batch.unwrap()))
        }
    }

    #[test]
    fn test_scan_relabels_and_forwards_errors() {
        let schema = Arc::new(new_schema([("t.a", DataType::Int64)]));
        let transaction = Box::new(FailingTransaction { remaining: 1 });
        let mut scan = TableScanExecutor::new(transaction, schema.clone());

        let batch = scan.next_batch().unwrap().unwrap();
        assert_eq!(batch.schema(), schema);
        assert!(matches!(
            scan.next_batch(),
            Err(ExecutorError::Storage(StorageError::Csv(_)))
        ));
    }
}
