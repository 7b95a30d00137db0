//! Helpers over arrow schemas carrying SQL column types.

use crate::types::DataType;
use arrow::datatypes::{Field, Schema};

/// A nullable arrow field for a column of `data_type`.
pub fn new_field(name: impl Into<String>, data_type: DataType) -> Field {
    Field::new(name, data_type.to_arrow(), true)
}

pub fn new_schema<N: Into<String>>(columns: impl IntoIterator<Item = (N, DataType)>) -> Schema {
    Schema::new(
        columns
            .into_iter()
            .map(|(name, data_type)| new_field(name, data_type))
            .collect::<Vec<_>>(),
    )
}

pub trait SchemaExt {
    fn names(&self) -> Vec<&str>;

    /// Position and SQL type of the first field named exactly `name`.
    fn lookup(&self, name: &str) -> Option<(usize, DataType)>;

    /// `name:TYPE` pairs, for logs and plan text.
    fn describe(&self) -> String;
}

impl SchemaExt for Schema {
    fn names(&self) -> Vec<&str> {
        self.fields().iter().map(|f| f.name().as_str()).collect()
    }

    fn lookup(&self, name: &str) -> Option<(usize, DataType)> {
        let (index, field) = self.column_with_name(name)?;
        DataType::from_arrow(field.data_type()).map(|t| (index, t))
    }

    fn describe(&self) -> String {
        let fields: Vec<String> = self
            .fields()
            .iter()
            .map(|f| match DataType::from_arrow(f.data_type()) {
                Some(t) => format!("{}:{}", f.name(), t),
                None => format!("{}:{}", f.name(), f.data_type()),
            })
            .collect();
        format!("[{}]", fields.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_describe() {
        let schema = new_schema([("id", DataType::Int64), ("name", DataType::String)]);
        assert_eq!(schema.lookup("name"), Some((1, DataType::String)));
        assert_eq!(schema.lookup("missing"), None);
        assert_eq!(schema.names(), vec!["id", "name"]);
        assert_eq!(schema.describe(), "[id:INT64, name:STRING]");
        assert!(schema.field(0).is_nullable());
    }

    #[test]
    fn test_lookup_takes_first_duplicate() {
        let schema = new_schema([("a", DataType::Int64), ("a", DataType::Bool)]);
        assert_eq!(schema.lookup("a"), Some((0, DataType::Int64)));
    }
}
