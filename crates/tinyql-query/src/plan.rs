//! Logical and physical plan nodes.
//!
//! Both flavors share payload types; only the enum variant tells them apart. A plan is
//! a tree: each node owns its children.

use crate::expr::{BoundExpr, ExprKind, OutputExpr};
use crate::planner::PlanError;
use std::fmt;
use tinyql_core::{new_field, new_schema, ColumnDescriptor, Schema, TableId};

pub type ChildMapper<'a> = dyn FnMut(PlanNode) -> Result<PlanNode, PlanError> + 'a;
pub type ExprMapper<'a> = dyn FnMut(BoundExpr) -> Result<BoundExpr, PlanError> + 'a;

/// Shape shared by the logical and physical flavor of one node kind.
pub trait PlanPayload: Sized {
    fn children(&self) -> Vec<&PlanNode>;

    fn exprs(&self) -> Vec<&BoundExpr>;

    /// Rebuild with every child replaced by `f(child)`.
    fn map_children(self, f: &mut ChildMapper<'_>) -> Result<Self, PlanError>;

    /// Rebuild with every owned expression replaced by `f(expr)`.
    fn map_exprs(self, f: &mut ExprMapper<'_>) -> Result<Self, PlanError>;

    fn schema(&self) -> Schema;

    /// One-line description used by `EXPLAIN`.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableScanNode {
    pub table_id: TableId,
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl PlanPayload for TableScanNode {
    fn children(&self) -> Vec<&PlanNode> {
        vec![]
    }

    fn exprs(&self) -> Vec<&BoundExpr> {
        vec![]
    }

    fn map_children(self, _f: &mut ChildMapper<'_>) -> Result<Self, PlanError> {
        Ok(self)
    }

    fn map_exprs(self, _f: &mut ExprMapper<'_>) -> Result<Self, PlanError> {
        Ok(self)
    }

    fn schema(&self) -> Schema {
        new_schema(
            self.columns
                .iter()
                .map(|c| (format!("{}.{}", self.table_name, c.name), c.data_type)),
        )
    }

    fn describe(&self) -> String {
        let columns: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        format!("{} [{}]", self.table_name, columns.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterNode {
    pub predicate: BoundExpr,
    pub child: Box<PlanNode>,
}

impl PlanPayload for FilterNode {
    fn children(&self) -> Vec<&PlanNode> {
        vec![self.child.as_ref()]
    }

    fn exprs(&self) -> Vec<&BoundExpr> {
        vec![&self.predicate]
    }

    fn map_children(self, f: &mut ChildMapper<'_>) -> Result<Self, PlanError> {
        Ok(FilterNode {
            predicate: self.predicate,
            child: Box::new(f(*self.child)?),
        })
    }

    fn map_exprs(self, f: &mut ExprMapper<'_>) -> Result<Self, PlanError> {
        Ok(FilterNode {
            predicate: f(self.predicate)?,
            child: self.child,
        })
    }

    fn schema(&self) -> Schema {
        self.child.schema()
    }

    fn describe(&self) -> String {
        self.predicate.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectNode {
    pub exprs: Vec<OutputExpr>,
    pub child: Box<PlanNode>,
}

impl PlanPayload for ProjectNode {
    fn children(&self) -> Vec<&PlanNode> {
        vec![self.child.as_ref()]
    }

    fn exprs(&self) -> Vec<&BoundExpr> {
        self.exprs.iter().map(|e| &e.expr).collect()
    }

    fn map_children(self, f: &mut ChildMapper<'_>) -> Result<Self, PlanError> {
        Ok(ProjectNode {
            exprs: self.exprs,
            child: Box::new(f(*self.child)?),
        })
    }

    fn map_exprs(self, f: &mut ExprMapper<'_>) -> Result<Self, PlanError> {
        let exprs = self
            .exprs
            .into_iter()
            .map(|e| Ok(OutputExpr::new(f(e.expr)?, e.name)))
            .collect::<Result<Vec<_>, PlanError>>()?;
        Ok(ProjectNode {
            exprs,
            child: self.child,
        })
    }

    fn schema(&self) -> Schema {
        Schema::new(
            self.exprs
                .iter()
                .map(|e| new_field(e.name.clone(), e.expr.return_type()))
                .collect::<Vec<_>>(),
        )
    }

    fn describe(&self) -> String {
        let items: Vec<String> = self
            .exprs
            .iter()
            .map(|e| format!("{} := {}", e.name, e.expr))
            .collect();
        format!("[{}]", items.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanFlavor {
    Logical,
    Physical,
}

/// Lists every plan node kind once. Generates [`PlanNode`], [`PlanKind`], the per-kind
/// accessors and the dispatch over payloads.
macro_rules! for_all_plan_nodes {
    ($macro:ident) => {
        $macro! {
            LogicalTableScan(TableScanNode) => as_logical_table_scan, Logical;
            LogicalFilter(FilterNode) => as_logical_filter, Logical;
            LogicalProject(ProjectNode) => as_logical_project, Logical;
            PhysicalTableScan(TableScanNode) => as_physical_table_scan, Physical;
            PhysicalFilter(FilterNode) => as_physical_filter, Physical;
            PhysicalProject(ProjectNode) => as_physical_project, Physical;
        }
    };
}

macro_rules! define_plan_node {
    ($($kind:ident($payload:ty) => $accessor:ident, $flavor:ident;)*) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum PlanNode {
            $($kind($payload),)*
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum PlanKind {
            $($kind,)*
        }

        impl PlanKind {
            pub const ALL: &'static [PlanKind] = &[$(PlanKind::$kind,)*];
            pub const COUNT: usize = Self::ALL.len();

            pub fn index(self) -> usize {
                self as usize
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(PlanKind::$kind => stringify!($kind),)*
                }
            }

            pub fn flavor(self) -> PlanFlavor {
                match self {
                    $(PlanKind::$kind => PlanFlavor::$flavor,)*
                }
            }
        }

        impl PlanNode {
            pub fn kind(&self) -> PlanKind {
                match self {
                    $(PlanNode::$kind(_) => PlanKind::$kind,)*
                }
            }

            $(
                pub fn $accessor(&self) -> Option<&$payload> {
                    match self {
                        PlanNode::$kind(inner) => Some(inner),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }
            )*

            pub fn children(&self) -> Vec<&PlanNode> {
                match self {
                    $(PlanNode::$kind(inner) => inner.children(),)*
                }
            }

            pub fn exprs(&self) -> Vec<&BoundExpr> {
                match self {
                    $(PlanNode::$kind(inner) => inner.exprs(),)*
                }
            }

            /// Replace every child, keeping this node's kind and payload.
            pub fn map_children(self, f: &mut ChildMapper<'_>) -> Result<PlanNode, PlanError> {
                Ok(match self {
                    $(PlanNode::$kind(inner) => PlanNode::$kind(inner.map_children(f)?),)*
                })
            }

            /// Replace every expression owned by this node, keeping its kind and children.
            pub fn map_exprs(self, f: &mut ExprMapper<'_>) -> Result<PlanNode, PlanError> {
                Ok(match self {
                    $(PlanNode::$kind(inner) => PlanNode::$kind(inner.map_exprs(f)?),)*
                })
            }

            /// Output columns of this node, derived from its payload.
            pub fn schema(&self) -> Schema {
                match self {
                    $(PlanNode::$kind(inner) => inner.schema(),)*
                }
            }

            fn describe(&self) -> String {
                match self {
                    $(PlanNode::$kind(inner) => inner.describe(),)*
                }
            }
        }
    };
}

for_all_plan_nodes!(define_plan_node);

impl PlanNode {
    pub fn flavor(&self) -> PlanFlavor {
        self.kind().flavor()
    }

    /// Schema of the single input this node reads, or empty for leaves.
    pub fn input_schema(&self) -> Schema {
        self.children()
            .first()
            .map(|child| child.schema())
            .unwrap_or_else(Schema::empty)
    }

    /// Visit this node and every descendant, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a PlanNode)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = depth * 2;
        writeln!(f, "{:indent$}{} {}", "", self.kind().name(), self.describe())?;
        for child in self.children() {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

/// A plan tree containing only physical nodes whose expressions address inputs by position.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalPlan {
    root: PlanNode,
}

impl PhysicalPlan {
    pub fn try_new(root: PlanNode) -> Result<Self, PlanError> {
        let mut violation = None;
        root.walk(&mut |node| {
            if violation.is_some() {
                return;
            }
            if node.flavor() != PlanFlavor::Physical {
                violation = Some(PlanError::NotPhysical(node.kind().name().to_string()));
                return;
            }
            let unresolved = node.exprs().into_iter().find(|e| e.contains(ExprKind::ColumnRef));
            if let Some(expr) = unresolved {
                violation = Some(PlanError::Unresolved(expr.to_string()));
            }
        });
        match violation {
            Some(err) => Err(err),
            None => Ok(PhysicalPlan { root }),
        }
    }

    pub fn root(&self) -> &PlanNode {
        &self.root
    }

    pub fn into_root(self) -> PlanNode {
        self.root
    }

    pub fn schema(&self) -> Schema {
        self.root.schema()
    }
}

impl fmt::Display for PhysicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinyql_core::{BinaryOperator, DataType, SchemaExt};

    fn scan() -> TableScanNode {
        TableScanNode {
            table_id: TableId(0),
            table_name: "t".to_string(),
            columns: vec![
                ColumnDescriptor::new("c1", DataType::Int64),
                ColumnDescriptor::new("c2", DataType::Int64),
            ],
        }
    }

    fn physical_tree() -> PlanNode {
        PlanNode::PhysicalProject(ProjectNode {
            exprs: vec![OutputExpr::new(BoundExpr::input_ref(0, DataType::Int64), "c1")],
            child: Box::new(PlanNode::PhysicalFilter(FilterNode {
                predicate: BoundExpr::binary(
                    BinaryOperator::Eq,
                    BoundExpr::input_ref(1, DataType::Int64),
                    BoundExpr::constant(10),
                    DataType::Bool,
                ),
                child: Box::new(PlanNode::PhysicalTableScan(scan())),
            })),
        })
    }

    #[test]
    fn test_kind_table() {
        assert_eq!(PlanKind::COUNT, 6);
        for (i, kind) in PlanKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        assert_eq!(PlanKind::LogicalFilter.flavor(), PlanFlavor::Logical);
        assert_eq!(PlanKind::PhysicalProject.flavor(), PlanFlavor::Physical);
    }

    #[test]
    fn test_accessors() {
        let node = PlanNode::LogicalTableScan(scan());
        assert_eq!(node.kind(), PlanKind::LogicalTableScan);
        assert!(node.as_logical_table_scan().is_some());
        assert!(node.as_physical_table_scan().is_none());
    }

    #[test]
    fn test_schema_derivation() {
        let tree = physical_tree();
        let scan_schema = PlanNode::PhysicalTableScan(scan()).schema();
        assert_eq!(scan_schema.names(), vec!["t.c1", "t.c2"]);

        let filter = &tree.children()[0];
        assert_eq!(filter.schema(), scan_schema);
        assert_eq!(tree.schema(), new_schema([("c1", DataType::Int64)]));
        assert_eq!(tree.input_schema(), scan_schema);
    }

    #[test]
    fn test_physical_plan_validation() {
        assert!(PhysicalPlan::try_new(physical_tree()).is_ok());

        let logical = PlanNode::LogicalTableScan(scan());
        assert_eq!(
            PhysicalPlan::try_new(logical),
            Err(PlanError::NotPhysical("LogicalTableScan".to_string()))
        );

        let unresolved = PlanNode::PhysicalFilter(FilterNode {
            predicate: BoundExpr::column("t", "c1", DataType::Bool),
            child: Box::new(PlanNode::PhysicalTableScan(scan())),
        });
        assert_eq!(
            PhysicalPlan::try_new(unresolved),
            Err(PlanError::Unresolved("t.c1".to_string()))
        );
    }

    #[test]
    fn test_explain_format() {
        let text = physical_tree().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "PhysicalProject [c1 := #0]",
                "  PhysicalFilter (#1 = 10)",
                "    PhysicalTableScan t [c1, c2]",
            ]
        );
    }
}
