mod descriptor;
mod catalog;

pub use descriptor::{ColumnDescriptor, ColumnId, TableDescriptor, TableDescriptorBuilder, TableId};
pub use catalog::{Catalog, CatalogBuilder, CatalogError, CatalogRef, CatalogResult};
