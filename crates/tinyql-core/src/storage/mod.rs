//! Read access to table data.
//!
//! Three narrow capabilities: a [`Storage`] opens a [`Table`] by id, a table opens a
//! read [`Transaction`], and a transaction yields record batches until exhausted.
//! A transaction belongs to exactly one consumer and releases whatever it holds
//! (file handles, snapshots) when dropped.

pub mod file;
pub mod mem;

pub use file::{CsvStorage, CsvTable};
pub use mem::{MemStorage, MemTable};

use crate::catalog::TableId;
use arrow::record_batch::RecordBatch;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("parse error at line {line}, column '{column}': {message}")]
    Parse {
        line: u64,
        column: String,
        message: String,
    },

    #[error("schema error: {0}")]
    Schema(String),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

pub trait Storage: Send + Sync {
    fn open_table(&self, id: TableId) -> StorageResult<Arc<dyn Table>>;
}

pub trait Table: Send + Sync {
    fn id(&self) -> TableId;

    /// Begin a read. Each call yields an independent cursor from the first batch.
    fn read(&self) -> StorageResult<Box<dyn Transaction>>;
}

pub trait Transaction: Send {
    /// The next batch, or `None` once the table is exhausted.
    fn next_batch(&mut self) -> StorageResult<Option<RecordBatch>>;
}

pub type StorageRef = Arc<dyn Storage>;
