use arrow::array::{Int64Array, StringArray};
use arrow::util::pretty::print_batches;
use std::sync::Arc;
use tinyql_core::{Catalog, Config, DataType, MemStorage, RecordBatch};
use tinyql_query::Engine;

fn main() {
    println!("TinyQL Query Demo\n");

    let mut builder = Catalog::builder();
    let users = builder
        .table("users")
        .column("id", DataType::Int64)
        .column("name", DataType::String)
        .column("age", DataType::Int64)
        .build();
    builder.register_table(users.clone()).expect("Failed to register table");
    let catalog = builder.build();

    let storage = MemStorage::new();
    let table = storage.create_table(&users);
    let batch = RecordBatch::try_new(
        Arc::new(users.schema()),
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3])),
            Arc::new(StringArray::from(vec!["Alice", "Bob", "Charlie"])),
            Arc::new(Int64Array::from(vec![30, 25, 35])),
        ],
    )
    .expect("Failed to build batch");
    table.append(batch).expect("Failed to append batch");

    let engine = Engine::new(catalog, Arc::new(storage), Config::default())
        .expect("Failed to create engine");

    let sql = "SELECT name, age + 1 AS next_age FROM users WHERE age > 26";
    println!("{}\n", sql);
    println!("{}", engine.explain(sql).expect("Failed to explain"));

    let batches = engine.run_sql(sql).expect("Query failed");
    print_batches(&batches).expect("Failed to print results");
}
