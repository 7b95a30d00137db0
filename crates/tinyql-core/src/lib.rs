pub mod error;
pub mod types;
pub mod config;

pub mod schema;
pub mod compute;

pub mod catalog;
pub mod storage;

pub use error::{Error, Result};
pub use config::Config;
pub use types::{DataType, ScalarValue};
pub use schema::{new_field, new_schema, SchemaExt};
pub use compute::{BinaryOperator, ComputeError};
pub use catalog::{
    Catalog, CatalogBuilder, CatalogError, CatalogRef, CatalogResult, ColumnDescriptor, ColumnId,
    TableDescriptor, TableDescriptorBuilder, TableId,
};
pub use storage::{
    CsvStorage, MemStorage, Storage, StorageError, StorageRef, StorageResult, Table, Transaction,
};

pub use arrow::array::{Array, ArrayRef};
pub use arrow::datatypes::{Field, Schema, SchemaRef};
pub use arrow::record_batch::RecordBatch;
