//! Entry point tying parsing, binding, planning and execution together.

use crate::ast::SelectStatement;
use crate::binder::{Binder, BoundSelect};
use crate::executor::{BatchStream, ExecutorBuilder, ExecutorError};
use crate::plan::PhysicalPlan;
use crate::planner::{PlanError, Planner};
use crate::sql::{parse_command, Command};
use crate::{BindError, Result};
use arrow::array::StringArray;
use std::sync::Arc;
use tinyql_core::{
    new_schema, CatalogRef, ComputeError, Config, CsvStorage, DataType, RecordBatch, StorageRef,
};
use tracing::{debug, info};

pub struct Engine {
    catalog: CatalogRef,
    storage: StorageRef,
    config: Config,
    planner: Planner,
}

impl Engine {
    pub fn new(catalog: CatalogRef, storage: StorageRef, config: Config) -> Result<Self> {
        config.validate().map_err(tinyql_core::Error::InvalidConfig)?;
        Ok(Engine {
            catalog,
            storage,
            config,
            planner: Planner::new(),
        })
    }

    /// Open every `*.csv` file under `config.data_dir` as a table.
    pub fn open_csv(config: Config) -> Result<Self> {
        let (catalog, storage) = CsvStorage::discover(config.clone())?;
        info!(
            data_dir = %config.data_dir.display(),
            tables = catalog.table_count(),
            "opened CSV engine"
        );
        Engine::new(catalog, Arc::new(storage), config)
    }

    pub fn catalog(&self) -> &CatalogRef {
        &self.catalog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn bind(&self, stmt: &SelectStatement) -> std::result::Result<BoundSelect, BindError> {
        Binder::new(&self.catalog).bind_select(stmt)
    }

    pub fn compile(&self, bound: BoundSelect) -> std::result::Result<PhysicalPlan, PlanError> {
        self.planner.compile(bound)
    }

    /// Start executing `plan`. Each call opens fresh read transactions.
    pub fn execute(&self, plan: PhysicalPlan) -> BatchStream {
        let schema = Arc::new(plan.schema());
        let root = ExecutorBuilder::new(self.storage.clone()).build(plan);
        BatchStream::new(schema, root)
    }

    /// Parse, bind and compile a `SELECT`.
    pub fn prepare(&self, sql: &str) -> Result<PhysicalPlan> {
        let stmt = crate::sql::parse(sql)?;
        let bound = self.bind(&stmt)?;
        Ok(self.compile(bound)?)
    }

    /// Logical and physical plan text for a `SELECT`, with or without a leading `EXPLAIN`.
    pub fn explain(&self, sql: &str) -> Result<String> {
        let stmt = match parse_command(sql)? {
            Command::Select(stmt) | Command::Explain(stmt) => stmt,
        };
        let logical = self.planner.plan(self.bind(&stmt)?)?;
        let text = format!("Logical plan:\n{}", logical);
        let physical = self.planner.to_physical(logical)?;
        Ok(format!("{}Physical plan:\n{}", text, physical))
    }

    /// Run one statement to completion. `EXPLAIN` returns the plan as a one-column result.
    pub fn run_sql(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        match parse_command(sql)? {
            Command::Select(stmt) => {
                let plan = self.compile(self.bind(&stmt)?)?;
                let batches = self.execute(plan).collect_batches()?;
                debug!(batches = batches.len(), "query finished");
                Ok(batches)
            }
            Command::Explain(_) => {
                let text = self.explain(sql)?;
                let lines = StringArray::from_iter_values(text.lines().collect::<Vec<_>>());
                let schema = Arc::new(new_schema([("plan", DataType::String)]));
                let batch = RecordBatch::try_new(schema, vec![Arc::new(lines)])
                    .map_err(|e| ExecutorError::from(ComputeError::from(e)))?;
                Ok(vec![batch])
            }
        }
    }
}
