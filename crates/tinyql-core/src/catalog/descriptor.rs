use super::catalog::{CatalogError, CatalogResult};
use crate::schema::new_field;
use crate::types::DataType;
use arrow::datatypes::Schema;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        ColumnDescriptor {
            name: name.into(),
            data_type,
        }
    }
}

/// Schema of one table. `column_ids` fixes the default column order.
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    pub id: TableId,
    pub name: String,
    column_ids: Vec<ColumnId>,
    columns: HashMap<ColumnId, ColumnDescriptor>,
}

impl TableDescriptor {
    pub fn column_ids(&self) -> &[ColumnId] {
        &self.column_ids
    }

    pub fn column_count(&self) -> usize {
        self.column_ids.len()
    }

    pub fn column(&self, id: ColumnId) -> CatalogResult<&ColumnDescriptor> {
        self.columns.get(&id).ok_or_else(|| CatalogError::UnknownColumn {
            table: self.name.clone(),
            column: id.to_string(),
        })
    }

    /// Columns in declared order.
    pub fn columns(&self) -> impl Iterator<Item = (ColumnId, &ColumnDescriptor)> + '_ {
        self.column_ids
            .iter()
            .filter_map(move |id| self.columns.get(id).map(|c| (*id, c)))
    }

    /// Every column named `name`. More than one match means the name is ambiguous.
    pub fn find_columns(&self, name: &str) -> Vec<(ColumnId, &ColumnDescriptor)> {
        self.columns().filter(|(_, c)| c.name == name).collect()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns().map(|(_, c)| c.name.as_str()).collect()
    }

    /// The table's columns as an unqualified schema, in declared order.
    pub fn schema(&self) -> Schema {
        Schema::new(
            self.columns()
                .map(|(_, c)| new_field(c.name.clone(), c.data_type))
                .collect::<Vec<_>>(),
        )
    }
}

pub struct TableDescriptorBuilder {
    id: TableId,
    name: String,
    columns: Vec<ColumnDescriptor>,
}

impl TableDescriptorBuilder {
    pub fn new(id: TableId, name: impl Into<String>) -> Self {
        TableDescriptorBuilder {
            id,
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.columns.push(ColumnDescriptor::new(name, data_type));
        self
    }

    pub fn build(self) -> TableDescriptor {
        let column_ids: Vec<ColumnId> = (0..self.columns.len() as u32).map(ColumnId).collect();
        let columns = column_ids.iter().copied().zip(self.columns).collect();
        TableDescriptor {
            id: self.id,
            name: self.name,
            column_ids,
            columns,
        }
    }
}
