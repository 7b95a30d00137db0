//! Pull-based (Volcano) execution of physical plans.
//!
//! Every executor answers one call, [`Executor::next_batch`]: a batch, end of stream
//! (`Ok(None)`) or an error. The builder wraps each executor in a [`GuardedExecutor`],
//! which makes end of stream and failure terminal.

mod filter;
mod project;
mod scan;

pub use filter::FilterExecutor;
pub use project::ProjectExecutor;
pub use scan::TableScanExecutor;

use crate::plan::{PhysicalPlan, PlanNode};
use std::sync::Arc;
use thiserror::Error;
use tinyql_core::{ComputeError, RecordBatch, SchemaRef, StorageError, StorageRef};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Compute(#[from] ComputeError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;

pub trait Executor: Send {
    fn next_batch(&mut self) -> ExecutorResult<Option<RecordBatch>>;
}

pub type BoxedExecutor = Box<dyn Executor>;

enum State {
    Ready(BoxedExecutor),
    Exhausted,
    Failed(ExecutorError),
}

/// Terminal-state guard around an executor.
///
/// Once the inner executor reports end of stream or an error it is dropped, releasing
/// whatever it holds, and every later call returns the same terminal result.
pub struct GuardedExecutor {
    name: &'static str,
    state: State,
}

impl GuardedExecutor {
    pub fn new(name: &'static str, inner: BoxedExecutor) -> Self {
        GuardedExecutor {
            name,
            state: State::Ready(inner),
        }
    }

    /// An executor that never produced anything, e.g. because its table could not be opened.
    pub fn failed(name: &'static str, error: ExecutorError) -> Self {
        GuardedExecutor {
            name,
            state: State::Failed(error),
        }
    }

    pub fn is_terminated(&self) -> bool {
        !matches!(self.state, State::Ready(_))
    }
}

impl Executor for GuardedExecutor {
    fn next_batch(&mut self) -> ExecutorResult<Option<RecordBatch>> {
        let inner = match &mut self.state {
            State::Ready(inner) => inner,
            State::Exhausted => return Ok(None),
            State::Failed(error) => return Err(error.clone()),
        };

        match inner.next_batch() {
            Ok(Some(batch)) => {
                trace!(executor = self.name, rows = batch.num_rows(), "produced batch");
                Ok(Some(batch))
            }
            Ok(None) => {
                debug!(executor = self.name, "exhausted");
                self.state = State::Exhausted;
                Ok(None)
            }
            Err(error) => {
                warn!(executor = self.name, %error, "execution failed");
                self.state = State::Failed(error.clone());
                Err(error)
            }
        }
    }
}

/// Builds the executor tree mirroring a physical plan.
pub struct ExecutorBuilder {
    storage: StorageRef,
}

impl ExecutorBuilder {
    pub fn new(storage: StorageRef) -> Self {
        ExecutorBuilder { storage }
    }

    pub fn build(&self, plan: PhysicalPlan) -> BoxedExecutor {
        self.build_node(plan.into_root())
    }

    fn build_node(&self, node: PlanNode) -> BoxedExecutor {
        let name = node.kind().name();
        match self.try_build(node) {
            Ok(executor) => Box::new(GuardedExecutor::new(name, executor)),
            Err(error) => {
                warn!(executor = name, %error, "could not open executor");
                Box::new(GuardedExecutor::failed(name, error))
            }
        }
    }

    fn try_build(&self, node: PlanNode) -> ExecutorResult<BoxedExecutor> {
        let schema: SchemaRef = Arc::new(node.schema());
        match node {
            PlanNode::PhysicalTableScan(scan) => {
                let table = self.storage.open_table(scan.table_id)?;
                let transaction = table.read()?;
                debug!(table = %scan.table_name, "opened scan");
                Ok(Box::new(TableScanExecutor::new(transaction, schema)))
            }
            PlanNode::PhysicalFilter(filter) => {
                let child = self.build_node(*filter.child);
                Ok(Box::new(FilterExecutor::new(child, filter.predicate)))
            }
            PlanNode::PhysicalProject(project) => {
                let child = self.build_node(*project.child);
                Ok(Box::new(ProjectExecutor::new(child, project.exprs)))
            }
            logical @ (PlanNode::LogicalTableScan(_)
            | PlanNode::LogicalFilter(_)
            | PlanNode::LogicalProject(_)) => Err(ExecutorError::Internal(format!(
                "cannot execute logical node {}",
                logical.kind().name()
            ))),
        }
    }
}

/// The batches of one execution, in order. Ends after the first error.
pub struct BatchStream {
    schema: SchemaRef,
    root: BoxedExecutor,
    done: bool,
}

impl BatchStream {
    pub fn new(schema: SchemaRef, root: BoxedExecutor) -> Self {
        BatchStream {
            schema,
            root,
            done: false,
        }
    }

    /// Output schema of the plan being executed.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Pull directly from the root executor. Unlike the iterator, this keeps returning the
    /// terminal result after the stream has ended or failed.
    pub fn next_batch(&mut self) -> ExecutorResult<Option<RecordBatch>> {
        self.root.next_batch()
    }

    pub fn collect_batches(self) -> ExecutorResult<Vec<RecordBatch>> {
        self.collect()
    }
}

impl Iterator for BatchStream {
    type Item = ExecutorResult<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.root.next_batch() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}
