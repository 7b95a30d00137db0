use super::{Storage, StorageError, StorageResult, Table, Transaction};
use crate::catalog::{TableDescriptor, TableId};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Tables held entirely in memory as lists of batches.
#[derive(Default)]
pub struct MemStorage {
    tables: RwLock<HashMap<TableId, Arc<MemTable>>>,
}

impl MemStorage {
    pub fn new() -> Self {
        MemStorage {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Create an empty table for `descriptor`, replacing any previous one with that id.
    pub fn create_table(&self, descriptor: &TableDescriptor) -> Arc<MemTable> {
        let table = Arc::new(MemTable {
            id: descriptor.id,
            schema: Arc::new(descriptor.schema()),
            batches: RwLock::new(Vec::new()),
        });
        self.tables.write().insert(descriptor.id, table.clone());
        table
    }

    pub fn append(&self, id: TableId, batch: RecordBatch) -> StorageResult<()> {
        let table = self
            .tables
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::TableNotFound(id.to_string()))?;
        table.append(batch)
    }
}

impl Storage for MemStorage {
    fn open_table(&self, id: TableId) -> StorageResult<Arc<dyn Table>> {
        let table = self
            .tables
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::TableNotFound(id.to_string()))?;
        Ok(table)
    }
}

pub struct MemTable {
    id: TableId,
    schema: SchemaRef,
    batches: RwLock<Vec<RecordBatch>>,
}

impl MemTable {
    /// Append a batch whose column types match the table. Columns are relabelled
    /// with the table's column names.
    pub fn append(&self, batch: RecordBatch) -> StorageResult<()> {
        let batch = RecordBatch::try_new(self.schema.clone(), batch.columns().to_vec())
            .map_err(|e| StorageError::Schema(e.to_string()))?;
        self.batches.write().push(batch);
        Ok(())
    }

    pub fn num_batches(&self) -> usize {
        self.batches.read().len()
    }
}

impl Table for MemTable {
    fn id(&self) -> TableId {
        self.id
    }

    fn read(&self) -> StorageResult<Box<dyn Transaction>> {
        let snapshot = self.batches.read().clone();
        debug!(table = %self.id, batches = snapshot.len(), "opened in-memory read");
        Ok(Box::new(MemTransaction {
            batches: snapshot.into_iter(),
        }))
    }
}

/// Cursor over a snapshot taken when the read began.
pub struct MemTransaction {
    batches: std::vec::IntoIter<RecordBatch>,
}

impl Transaction for MemTransaction {
    fn next_batch(&mut self) -> StorageResult<Option<RecordBatch>> {
        Ok(self.batches.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TableDescriptorBuilder;
    use crate::schema::new_schema;
    use crate::types::DataType;
    use arrow::array::{Int64Array, StringArray};

    fn descriptor() -> TableDescriptor {
        TableDescriptorBuilder::new(TableId(0), "t")
            .column("c1", DataType::Int64)
            .build()
    }

    fn batch(values: Vec<i64>) -> RecordBatch {
        let schema = Arc::new(new_schema([("x", DataType::Int64)]));
        RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(values))]).unwrap()
    }

    #[test]
    fn test_read_in_order() {
        let storage = MemStorage::new();
        let desc = descriptor();
        storage.create_table(&desc);
        storage.append(desc.id, batch(vec![1, 2])).unwrap();
        storage.append(desc.id, batch(vec![3])).unwrap();

        let table = storage.open_table(desc.id).unwrap();
        let mut txn = table.read().unwrap();

        let first = txn.next_batch().unwrap().unwrap();
        assert_eq!(first.schema().field(0).name(), "c1");
        assert_eq!(first.num_rows(), 2);
        assert_eq!(txn.next_batch().unwrap().unwrap().num_rows(), 1);
        assert!(txn.next_batch().unwrap().is_none());
        assert!(txn.next_batch().unwrap().is_none());
    }

    #[test]
    fn test_snapshot_isolation() {
        let storage = MemStorage::new();
        let desc = descriptor();
        let table = storage.create_table(&desc);
        table.append(batch(vec![1])).unwrap();

        let mut txn = table.read().unwrap();
        table.append(batch(vec![2])).unwrap();

        assert!(txn.next_batch().unwrap().is_some());
        assert!(txn.next_batch().unwrap().is_none());
        assert_eq!(table.num_batches(), 2);
    }

    #[test]
    fn test_table_not_found() {
        let storage = MemStorage::new();
        assert!(matches!(
            storage.open_table(TableId(3)),
            Err(StorageError::TableNotFound(_))
        ));
        assert!(matches!(
            storage.append(TableId(3), batch(vec![1])),
            Err(StorageError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_append_rejects_wrong_types() {
        let storage = MemStorage::new();
        let table = storage.create_table(&descriptor());
        let schema = Arc::new(new_schema([("x", DataType::String)]));
        let bad =
            RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(vec!["a"]))]).unwrap();
        assert!(matches!(table.append(bad), Err(StorageError::Schema(_))));
    }
}
