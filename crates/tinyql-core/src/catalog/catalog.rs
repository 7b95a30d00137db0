use super::descriptor::{TableDescriptor, TableDescriptorBuilder, TableId};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("column '{column}' not found in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("table already exists: {0}")]
    DuplicateTable(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Shared, read-only handle to a catalog.
pub type CatalogRef = Arc<Catalog>;

/// Table metadata, immutable once built.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: HashMap<TableId, TableDescriptor>,
    names: HashMap<String, TableId>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    pub fn table(&self, id: TableId) -> CatalogResult<&TableDescriptor> {
        self.tables
            .get(&id)
            .ok_or_else(|| CatalogError::UnknownTable(id.to_string()))
    }

    pub fn table_by_name(&self, name: &str) -> CatalogResult<&TableDescriptor> {
        self.names
            .get(name)
            .and_then(|id| self.tables.get(id))
            .ok_or_else(|| CatalogError::UnknownTable(name.to_string()))
    }

    pub fn list_tables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

pub struct CatalogBuilder {
    catalog: Catalog,
    next_table_id: u32,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        CatalogBuilder {
            catalog: Catalog::default(),
            next_table_id: 0,
        }
    }

    /// Hand out a fresh table id for use with [`TableDescriptorBuilder`].
    pub fn next_table_id(&mut self) -> TableId {
        let id = TableId(self.next_table_id);
        self.next_table_id += 1;
        id
    }

    /// Start describing a new table with a freshly allocated id.
    pub fn table(&mut self, name: impl Into<String>) -> TableDescriptorBuilder {
        let id = self.next_table_id();
        TableDescriptorBuilder::new(id, name)
    }

    pub fn register_table(&mut self, table: TableDescriptor) -> CatalogResult<TableId> {
        if self.catalog.names.contains_key(&table.name)
            || self.catalog.tables.contains_key(&table.id)
        {
            return Err(CatalogError::DuplicateTable(table.name.clone()));
        }
        let id = table.id;
        self.next_table_id = self.next_table_id.max(id.0 + 1);
        self.catalog.names.insert(table.name.clone(), id);
        self.catalog.tables.insert(id, table);
        Ok(id)
    }

    pub fn build(self) -> CatalogRef {
        Arc::new(self.catalog)
    }
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}
