//! Replace named column references with positions in the immediate child's output.

use super::{Rewritable, Rewriter};
use crate::expr::{BoundExpr, ExprKind};
use crate::plan::{PlanKind, PlanNode};
use crate::planner::PlanError;
use tinyql_core::{Schema, SchemaExt};
use tracing::trace;

/// Expression rewriter resolving `ColumnRef`s against `schema` by exact name.
pub fn expr_resolver(schema: Schema) -> Rewriter<BoundExpr, Schema> {
    Rewriter::new(schema).with_handler(ExprKind::ColumnRef, resolve_column)
}

/// Plan rewriter that resolves the expressions of every filter and projection, bottom-up.
pub fn input_ref_rewriter() -> Rewriter<PlanNode, ()> {
    [
        PlanKind::LogicalFilter,
        PlanKind::LogicalProject,
        PlanKind::PhysicalFilter,
        PlanKind::PhysicalProject,
    ]
    .into_iter()
    .fold(Rewriter::new(()), |rw, kind| rw.with_handler(kind, resolve_node))
}

pub fn resolve_input_refs(plan: PlanNode) -> Result<PlanNode, PlanError> {
    input_ref_rewriter().rewrite(plan)
}

fn resolve_node(rw: &mut Rewriter<PlanNode, ()>, node: PlanNode) -> Result<PlanNode, PlanError> {
    let node = node.rewrite_children(rw)?;
    let input = node.input_schema();
    trace!(node = node.kind().name(), input = %input.describe(), "resolving input refs");
    let mut exprs = expr_resolver(input);
    node.map_exprs(&mut |expr| exprs.rewrite(expr))
}

fn resolve_column(
    rw: &mut Rewriter<BoundExpr, Schema>,
    expr: BoundExpr,
) -> Result<BoundExpr, PlanError> {
    let column = match expr {
        BoundExpr::ColumnRef(column) => column,
        other => return Ok(other),
    };
    let name = column.qualified_name();
    match rw.state().lookup(&name) {
        Some((index, data_type)) => Ok(BoundExpr::input_ref(index, data_type)),
        None => Err(PlanError::InputResolution(name)),
    }
}
