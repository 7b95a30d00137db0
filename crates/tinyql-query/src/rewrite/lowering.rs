use super::{Rewritable, Rewriter};
use crate::plan::{PlanFlavor, PlanKind, PlanNode};
use crate::planner::PlanError;
use tracing::trace;

/// Rewriter that turns every logical node into its physical counterpart.
pub fn lowering_rewriter() -> Rewriter<PlanNode, ()> {
    PlanKind::ALL
        .iter()
        .filter(|kind| kind.flavor() == PlanFlavor::Logical)
        .fold(Rewriter::new(()), |rw, kind| rw.with_handler(*kind, lower_node))
}

pub fn lower(plan: PlanNode) -> Result<PlanNode, PlanError> {
    lowering_rewriter().rewrite(plan)
}

fn lower_node(rw: &mut Rewriter<PlanNode, ()>, node: PlanNode) -> Result<PlanNode, PlanError> {
    let node = node.rewrite_children(rw)?;
    let from = node.kind();
    let lowered = match node {
        PlanNode::LogicalTableScan(scan) => PlanNode::PhysicalTableScan(scan),
        PlanNode::LogicalFilter(filter) => PlanNode::PhysicalFilter(filter),
        PlanNode::LogicalProject(project) => PlanNode::PhysicalProject(project),
        physical @ (PlanNode::PhysicalTableScan(_)
        | PlanNode::PhysicalFilter(_)
        | PlanNode::PhysicalProject(_)) => physical,
    };
    trace!(from = from.name(), to = lowered.kind().name(), "lowered plan node");
    Ok(lowered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BoundExpr, OutputExpr};
    use crate::plan::{FilterNode, ProjectNode, TableScanNode};
    use tinyql_core::{ColumnDescriptor, DataType, TableId};

    fn logical_tree() -> PlanNode {
        let scan = PlanNode::LogicalTableScan(TableScanNode {
            table_id: TableId(1),
            table_name: "t".to_string(),
            columns: vec![ColumnDescriptor::new("c1", DataType::Bool)],
        });
        let filter = PlanNode::LogicalFilter(FilterNode {
            predicate: BoundExpr::column("t", "c1", DataType::Bool),
            child: Box::new(scan),
        });
        PlanNode::LogicalProject(ProjectNode {
            exprs: vec![OutputExpr::new(BoundExpr::column("t", "c1", DataType::Bool), "c1")],
            child: Box::new(filter),
        })
    }

    fn kinds(node: &PlanNode) -> Vec<PlanKind> {
        let mut out = vec![];
        node.walk(&mut |n| out.push(n.kind()));
        out
    }

    #[test]
    fn test_lowering_substitutes_every_kind() {
        let lowered = lower(logical_tree()).unwrap();
        assert_eq!(
            kinds(&lowered),
            vec![PlanKind::PhysicalProject, PlanKind::PhysicalFilter, PlanKind::PhysicalTableScan]
        );
        // Payloads survive untouched.
        assert_eq!(lowered.exprs(), logical_tree().exprs());
        assert_eq!(lowered.schema(), logical_tree().schema());
    }

    #[test]
    fn test_lowering_physical_tree_is_harmless() {
        let once = lower(logical_tree()).unwrap();
        let twice = lower(once.clone()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(PlanNode::KIND_COUNT, PlanKind::ALL.len());
    }
}
