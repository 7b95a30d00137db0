use arrow::error::ArrowError;
use arrow::util::display::FormatOptions;
use arrow::util::pretty::pretty_format_batches_with_options;
use std::sync::Arc;
use tinyql_core::{RecordBatch, Schema};

/// Render batches as an aligned text table followed by a row count.
pub fn format_batches(schema: &Schema, batches: &[RecordBatch]) -> Result<String, ArrowError> {
    let rows: usize = batches.iter().map(RecordBatch::num_rows).sum();
    // An empty result still prints its header.
    let empty;
    let batches = if batches.is_empty() {
        empty = [RecordBatch::new_empty(Arc::new(schema.clone()))];
        &empty[..]
    } else {
        batches
    };

    let options = FormatOptions::default().with_null("NULL");
    let table = pretty_format_batches_with_options(batches, &options)?;
    Ok(format!(
        "{}\n({} row{})\n",
        table,
        rows,
        if rows == 1 { "" } else { "s" }
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use tinyql_core::{new_schema, DataType};

    #[test]
    fn test_format_batches() {
        let schema = Arc::new(new_schema([("id", DataType::Int64), ("name", DataType::String)]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![Some(1), None])),
                Arc::new(StringArray::from(vec!["alice", "bo"])),
            ],
        )
        .unwrap();

        let text = format_batches(&schema, &[batch]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines[1].contains("id") && lines[1].contains("name"));
        assert!(lines[3].contains('1') && lines[3].contains("alice"));
        assert!(lines[4].contains("NULL") && lines[4].contains("bo"));
        assert_eq!(lines[6], "(2 rows)");
    }

    #[test]
    fn test_format_empty_result() {
        let schema = new_schema([("c1", DataType::Int64)]);
        let text = format_batches(&schema, &[]).unwrap();
        assert!(text.contains("c1"));
        assert!(text.ends_with("(0 rows)\n"));
    }
}
