use crate::binder::BoundSelect;
use crate::plan::{FilterNode, PhysicalPlan, PlanNode, ProjectNode, TableScanNode};
use crate::rewrite::{lower, resolve_input_refs};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("column '{0}' is not produced by the node's input")]
    InputResolution(String),

    #[error("query has no source table")]
    NoSourceTable,

    #[error("logical node {0} in physical plan")]
    NotPhysical(String),

    #[error("unresolved column reference {0} in physical plan")]
    Unresolved(String),
}

/// Turns bound statements into plans. Non-optimizing: the logical shape is fixed.
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Planner
    }

    /// `Project(select list, [Filter(predicate,] TableScan(table)))`.
    pub fn plan(&self, select: BoundSelect) -> Result<PlanNode, PlanError> {
        let table = select.from.ok_or(PlanError::NoSourceTable)?;

        let mut node = PlanNode::LogicalTableScan(TableScanNode {
            table_id: table.table_id,
            table_name: table.name,
            columns: table.columns,
        });
        if let Some(predicate) = select.filter {
            node = PlanNode::LogicalFilter(FilterNode {
                predicate,
                child: Box::new(node),
            });
        }
        Ok(PlanNode::LogicalProject(ProjectNode {
            exprs: select.select_list,
            child: Box::new(node),
        }))
    }

    /// Lower to physical nodes, then resolve column names to input positions.
    pub fn to_physical(&self, logical: PlanNode) -> Result<PhysicalPlan, PlanError> {
        let lowered = lower(logical)?;
        let resolved = resolve_input_refs(lowered)?;
        debug!(plan = %resolved, "compiled physical plan");
        PhysicalPlan::try_new(resolved)
    }

    pub fn compile(&self, select: BoundSelect) -> Result<PhysicalPlan, PlanError> {
        let logical = self.plan(select)?;
        debug!(plan = %logical, "built logical plan");
        self.to_physical(logical)
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}
