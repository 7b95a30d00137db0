//! Typed expressions produced by the binder and consumed by planning and evaluation.

use std::fmt;
use tinyql_core::{BinaryOperator, DataType, ScalarValue};

/// A column resolved against the catalog, still addressed by name.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
    pub data_type: DataType,
}

impl ColumnRef {
    /// `table.column`, the name a table scan gives this column in its output.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }
}

/// A column addressed by its position in the input batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRef {
    pub index: usize,
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOpExpr {
    pub op: BinaryOperator,
    pub left: Box<BoundExpr>,
    pub right: Box<BoundExpr>,
    pub return_type: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeCastExpr {
    pub target: DataType,
    pub inner: Box<BoundExpr>,
}

/// Lists every expression kind once. Generates [`BoundExpr`], [`ExprKind`] and the
/// per-kind accessors.
macro_rules! for_all_expr_kinds {
    ($macro:ident) => {
        $macro! {
            Constant(ScalarValue) => as_constant,
            ColumnRef(ColumnRef) => as_column_ref,
            InputRef(InputRef) => as_input_ref,
            BinaryOp(BinaryOpExpr) => as_binary_op,
            TypeCast(TypeCastExpr) => as_type_cast,
        }
    };
}

macro_rules! define_bound_expr {
    ($($kind:ident($payload:ty) => $accessor:ident,)*) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum BoundExpr {
            $($kind($payload),)*
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ExprKind {
            $($kind,)*
        }

        impl ExprKind {
            pub const ALL: &'static [ExprKind] = &[$(ExprKind::$kind,)*];
            pub const COUNT: usize = Self::ALL.len();

            pub fn index(self) -> usize {
                self as usize
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(ExprKind::$kind => stringify!($kind),)*
                }
            }
        }

        impl BoundExpr {
            pub fn kind(&self) -> ExprKind {
                match self {
                    $(BoundExpr::$kind(_) => ExprKind::$kind,)*
                }
            }

            $(
                pub fn $accessor(&self) -> Option<&$payload> {
                    match self {
                        BoundExpr::$kind(inner) => Some(inner),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }
            )*
        }
    };
}

for_all_expr_kinds!(define_bound_expr);

impl BoundExpr {
    pub fn constant(value: impl Into<ScalarValue>) -> Self {
        BoundExpr::Constant(value.into())
    }

    pub fn column(table: &str, column: &str, data_type: DataType) -> Self {
        BoundExpr::ColumnRef(ColumnRef {
            table: table.to_string(),
            column: column.to_string(),
            data_type,
        })
    }

    pub fn input_ref(index: usize, data_type: DataType) -> Self {
        BoundExpr::InputRef(InputRef { index, data_type })
    }

    pub fn binary(
        op: BinaryOperator,
        left: BoundExpr,
        right: BoundExpr,
        return_type: DataType,
    ) -> Self {
        BoundExpr::BinaryOp(BinaryOpExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            return_type,
        })
    }

    pub fn cast(target: DataType, inner: BoundExpr) -> Self {
        BoundExpr::TypeCast(TypeCastExpr {
            target,
            inner: Box::new(inner),
        })
    }

    pub fn return_type(&self) -> DataType {
        match self {
            BoundExpr::Constant(v) => v.data_type(),
            BoundExpr::ColumnRef(c) => c.data_type,
            BoundExpr::InputRef(i) => i.data_type,
            BoundExpr::BinaryOp(b) => b.return_type,
            BoundExpr::TypeCast(c) => c.target,
        }
    }

    /// Direct sub-expressions, left to right.
    pub fn children(&self) -> Vec<&BoundExpr> {
        match self {
            BoundExpr::Constant(_) | BoundExpr::ColumnRef(_) | BoundExpr::InputRef(_) => vec![],
            BoundExpr::BinaryOp(b) => vec![b.left.as_ref(), b.right.as_ref()],
            BoundExpr::TypeCast(c) => vec![c.inner.as_ref()],
        }
    }

    /// Whether any node of this tree has kind `kind`.
    pub fn contains(&self, kind: ExprKind) -> bool {
        self.kind() == kind || self.children().into_iter().any(|c| c.contains(kind))
    }
}

impl fmt::Display for BoundExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundExpr::Constant(v) => write!(f, "{}", v),
            BoundExpr::ColumnRef(c) => write!(f, "{}", c.qualified_name()),
            BoundExpr::InputRef(i) => write!(f, "#{}", i.index),
            BoundExpr::BinaryOp(b) => write!(f, "({} {} {})", b.left, b.op, b.right),
            BoundExpr::TypeCast(c) => write!(f, "CAST({} AS {})", c.inner, c.target),
        }
    }
}

/// An output column: an expression and the name it is published under.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputExpr {
    pub expr: BoundExpr,
    pub name: String,
}

impl OutputExpr {
    pub fn new(expr: BoundExpr, name: impl Into<String>) -> Self {
        OutputExpr {
            expr,
            name: name.into(),
        }
    }
}
