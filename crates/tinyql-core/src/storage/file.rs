use super::{Storage, StorageError, StorageResult, Table, Transaction};
use crate::catalog::{Catalog, CatalogRef, TableDescriptor, TableId};
use crate::config::Config;
use crate::types::DataType;
use crate::Error;
use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use csv::{Reader, ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Tables backed by one CSV file each.
pub struct CsvStorage {
    config: Config,
    tables: HashMap<TableId, Arc<CsvTable>>,
}

impl CsvStorage {
    pub fn new(config: Config) -> crate::Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        Ok(CsvStorage {
            config,
            tables: HashMap::new(),
        })
    }

    /// Scan `config.data_dir` for `*.csv` files and build a catalog from their headers.
    ///
    /// The table is named after the file stem. Header cells are `name` or `name:type`;
    /// untyped columns are strings.
    pub fn discover(config: Config) -> crate::Result<(CatalogRef, Self)> {
        if !config.csv_has_header {
            return Err(Error::InvalidConfig(
                "table discovery needs CSV headers".to_string(),
            ));
        }
        let mut storage = CsvStorage::new(config)?;

        let mut paths: Vec<PathBuf> = fs::read_dir(&storage.config.data_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "csv"))
            .collect();
        paths.sort();

        let mut builder = Catalog::builder();
        for path in paths {
            let name = match path.file_stem().and_then(|s| s.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            let mut table = builder.table(name);
            for (column, data_type) in storage.read_header(&path)? {
                table = table.column(column, data_type);
            }
            let descriptor = table.build();
            debug!(
                table = %descriptor.name,
                path = %path.display(),
                columns = descriptor.column_count(),
                "discovered CSV table"
            );
            storage.register(&descriptor, path);
            builder.register_table(descriptor)?;
        }

        Ok((builder.build(), storage))
    }

    fn read_header(&self, path: &Path) -> StorageResult<Vec<(String, DataType)>> {
        let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
        let mut reader = ReaderBuilder::new()
            .delimiter(self.config.csv_delimiter)
            .has_headers(true)
            .from_reader(file);
        let headers = reader
            .headers()
            .map_err(|e| StorageError::Csv(e.to_string()))?;

        headers
            .iter()
            .map(|cell| match cell.rsplit_once(':') {
                Some((name, ty)) => ty
                    .parse::<DataType>()
                    .map(|t| (name.trim().to_string(), t))
                    .map_err(|e| StorageError::Schema(format!("{}: {}", path.display(), e))),
                None => Ok((cell.trim().to_string(), DataType::String)),
            })
            .collect()
    }

    /// Back the table described by `descriptor` with the file at `path`.
    pub fn register(&mut self, descriptor: &TableDescriptor, path: impl Into<PathBuf>) {
        let table = CsvTable {
            id: descriptor.id,
            path: path.into(),
            schema: Arc::new(descriptor.schema()),
            batch_size: self.config.batch_size,
            delimiter: self.config.csv_delimiter,
            has_header: self.config.csv_has_header,
        };
        self.tables.insert(descriptor.id, Arc::new(table));
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Storage for CsvStorage {
    fn open_table(&self, id: TableId) -> StorageResult<Arc<dyn Table>> {
        let table = self
            .tables
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::TableNotFound(id.to_string()))?;
        Ok(table)
    }
}

pub struct CsvTable {
    id: TableId,
    path: PathBuf,
    schema: SchemaRef,
    batch_size: usize,
    delimiter: u8,
    has_header: bool,
}

impl Table for CsvTable {
    fn id(&self) -> TableId {
        self.id
    }

    fn read(&self) -> StorageResult<Box<dyn Transaction>> {
        let file = File::open(&self.path).map_err(|e| StorageError::io(&self.path, e))?;
        let reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_header)
            .from_reader(file);
        debug!(table = %self.id, path = %self.path.display(), "opened CSV read");

        Ok(Box::new(CsvTransaction {
            reader,
            schema: self.schema.clone(),
            batch_size: self.batch_size,
            record: StringRecord::new(),
            finished: false,
        }))
    }
}

pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => None,
    }
}

/// Typed arrow builder for one CSV column.
enum ColumnBuilder {
    Int64(Int64Builder),
    Float64(Float64Builder),
    Bool(BooleanBuilder),
    String(StringBuilder),
}

impl ColumnBuilder {
    fn new(data_type: DataType, capacity: usize) -> Self {
        match data_type {
            DataType::Int64 => ColumnBuilder::Int64(Int64Builder::with_capacity(capacity)),
            DataType::Float64 => ColumnBuilder::Float64(Float64Builder::with_capacity(capacity)),
            DataType::Bool => ColumnBuilder::Bool(BooleanBuilder::with_capacity(capacity)),
            DataType::String => ColumnBuilder::String(StringBuilder::new()),
        }
    }

    /// Append one cell. An empty cell is null; anything else must parse as the column type.
    fn append(&mut self, cell: &str) -> Result<(), String> {
        if cell.is_empty() {
            match self {
                ColumnBuilder::Int64(b) => b.append_null(),
                ColumnBuilder::Float64(b) => b.append_null(),
                ColumnBuilder::Bool(b) => b.append_null(),
                ColumnBuilder::String(b) => b.append_null(),
            }
            return Ok(());
        }
        match self {
            ColumnBuilder::Int64(b) => {
                b.append_value(cell.trim().parse().map_err(|e| format!("'{}': {}", cell, e))?)
            }
            ColumnBuilder::Float64(b) => {
                b.append_value(cell.trim().parse().map_err(|e| format!("'{}': {}", cell, e))?)
            }
            ColumnBuilder::Bool(b) => b.append_value(
                parse_bool(cell).ok_or_else(|| format!("'{}' is not a boolean", cell))?,
            ),
            ColumnBuilder::String(b) => b.append_value(cell),
        }
        Ok(())
    }

    fn finish(&mut self) -> ArrayRef {
        match self {
            ColumnBuilder::Int64(b) => Arc::new(b.finish()),
            ColumnBuilder::Float64(b) => Arc::new(b.finish()),
            ColumnBuilder::Bool(b) => Arc::new(b.finish()),
            ColumnBuilder::String(b) => Arc::new(b.finish()),
        }
    }
}

/// Streams a CSV file in batches. The file is closed when the transaction is dropped.
pub struct CsvTransaction {
    reader: Reader<File>,
    schema: SchemaRef,
    batch_size: usize,
    record: StringRecord,
    finished: bool,
}

impl Transaction for CsvTransaction {
    fn next_batch(&mut self) -> StorageResult<Option<RecordBatch>> {
        if self.finished {
            return Ok(None);
        }

        let mut builders = self
            .schema
            .fields()
            .iter()
            .map(|f| {
                DataType::from_arrow(f.data_type())
                    .map(|t| ColumnBuilder::new(t, self.batch_size))
                    .ok_or_else(|| {
                        StorageError::Schema(format!("unsupported column type {}", f.data_type()))
                    })
            })
            .collect::<StorageResult<Vec<_>>>()?;
        let mut rows = 0;

        while rows < self.batch_size {
            let more = self
                .reader
                .read_record(&mut self.record)
                .map_err(|e| StorageError::Csv(e.to_string()))?;
            if !more {
                self.finished = true;
                break;
            }
            if self.record.len() != builders.len() {
                return Err(StorageError::Schema(format!(
                    "record has {} fields, table has {} columns",
                    self.record.len(),
                    builders.len()
                )));
            }
            for (i, builder) in builders.iter_mut().enumerate() {
                builder
                    .append(&self.record[i])
                    .map_err(|message| StorageError::Parse {
                        line: self.record.position().map_or(0, |p| p.line()),
                        column: self.schema.field(i).name().clone(),
                        message,
                    })?;
            }
            rows += 1;
        }

        if rows == 0 {
            return Ok(None);
        }
        let columns = builders.iter_mut().map(ColumnBuilder::finish).collect();
        let options = RecordBatchOptions::new().with_row_count(Some(rows));
        let batch = RecordBatch::try_new_with_options(self.schema.clone(), columns, &options)
            .map_err(|e| StorageError::Schema(e.to_string()))?;
        trace!(rows, "read CSV batch");
        Ok(Some(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{AsArray, BooleanArray, Int64Array};
    use arrow::datatypes::{DataType as ArrowType, Int64Type};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_discover_and_read() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "t.csv", "c1:int,c2:int\n1,10\n2,20\n3,10\n");
        write_file(dir.path(), "notes.txt", "ignored");

        let config = Config::new(dir.path()).with_batch_size(2);
        let (catalog, storage) = CsvStorage::discover(config).unwrap();

        assert_eq!(catalog.list_tables(), vec!["t"]);
        let desc = catalog.table_by_name("t").unwrap();
        assert_eq!(desc.column_names(), vec!["c1", "c2"]);

        let mut txn = storage.open_table(desc.id).unwrap().read().unwrap();
        let first = txn.next_batch().unwrap().unwrap();
        assert_eq!(first.num_rows(), 2);
        assert_eq!(first.column(0).as_primitive::<Int64Type>(), &Int64Array::from(vec![1, 2]));
        let second = txn.next_batch().unwrap().unwrap();
        assert_eq!(second.column(1).as_primitive::<Int64Type>(), &Int64Array::from(vec![10]));
        assert!(txn.next_batch().unwrap().is_none());
        assert!(txn.next_batch().unwrap().is_none());
    }

    #[test]
    fn test_untyped_header_and_nulls() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "people.csv", "name,age:int,active:bool\nann,,true\nbob,40,\n");

        let (catalog, storage) = CsvStorage::discover(Config::new(dir.path())).unwrap();
        let desc = catalog.table_by_name("people").unwrap();
        let batch = storage
            .open_table(desc.id)
            .unwrap()
            .read()
            .unwrap()
            .next_batch()
            .unwrap()
            .unwrap();

        assert_eq!(batch.schema().field(0).data_type(), &ArrowType::Utf8);
        assert_eq!(
            batch.column(1).as_primitive::<Int64Type>(),
            &Int64Array::from(vec![None, Some(40)])
        );
        assert_eq!(batch.column(2).as_boolean(), &BooleanArray::from(vec![Some(true), None]));
    }

    #[test]
    fn test_empty_table() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "empty.csv", "a:int\n");

        let (catalog, storage) = CsvStorage::discover(Config::new(dir.path())).unwrap();
        let desc = catalog.table_by_name("empty").unwrap();
        let mut txn = storage.open_table(desc.id).unwrap().read().unwrap();
        assert!(txn.next_batch().unwrap().is_none());
    }

    #[test]
    fn test_bad_cell_reports_line() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "t.csv", "a:int\n1\nx\n");

        let (catalog, storage) = CsvStorage::discover(Config::new(dir.path())).unwrap();
        let desc = catalog.table_by_name("t").unwrap();
        let mut txn = storage.open_table(desc.id).unwrap().read().unwrap();
        match txn.next_batch() {
            Err(StorageError::Parse { line, column, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "a");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_header_type() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "t.csv", "a:blob\n");
        assert!(matches!(
            CsvStorage::discover(Config::new(dir.path())),
            Err(Error::Storage(StorageError::Schema(_)))
        ));
    }

    #[test]
    fn test_missing_file_fails_at_open() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "t.csv", "a:int\n1\n");
        let (catalog, storage) = CsvStorage::discover(Config::new(dir.path())).unwrap();
        fs::remove_file(path).unwrap();

        let table = storage.open_table(catalog.table_by_name("t").unwrap().id).unwrap();
        assert!(matches!(table.read(), Err(StorageError::Io { .. })));
    }
}
