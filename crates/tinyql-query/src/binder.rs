//! Resolves names in a [`SelectStatement`] against the catalog and types every expression.

use crate::ast::{Expr, Literal, SelectItem, SelectStatement};
use crate::expr::{BoundExpr, OutputExpr};
use thiserror::Error;
use tinyql_core::{
    BinaryOperator, Catalog, CatalogError, ColumnDescriptor, DataType, ScalarValue, TableId,
};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("unresolved column: {0}")]
    UnresolvedColumn(String),

    #[error("ambiguous column: {0}")]
    AmbiguousColumn(String),

    #[error("cannot cast {from} to {to}")]
    Cast { from: DataType, to: DataType },

    #[error("type mismatch: {left} {op} {right}")]
    TypeMismatch {
        op: BinaryOperator,
        left: DataType,
        right: DataType,
    },

    #[error("WHERE predicate must be BOOL, got {0}")]
    NonBooleanPredicate(DataType),

    #[error("SELECT * needs a FROM clause")]
    NoTableForWildcard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundTableRef {
    pub table_id: TableId,
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundSelect {
    pub select_list: Vec<OutputExpr>,
    pub from: Option<BoundTableRef>,
    pub filter: Option<BoundExpr>,
}

pub struct Binder<'a> {
    catalog: &'a Catalog,
}

impl<'a> Binder<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Binder { catalog }
    }

    pub fn bind_select(&self, stmt: &SelectStatement) -> Result<BoundSelect, BindError> {
        let from = stmt
            .from
            .as_deref()
            .map(|name| self.bind_table(name))
            .transpose()?;

        let mut select_list = Vec::with_capacity(stmt.projection.len());
        for item in &stmt.projection {
            match item {
                SelectItem::Wildcard => {
                    let table = from.as_ref().ok_or(BindError::NoTableForWildcard)?;
                    select_list.extend(table.columns.iter().map(|c| {
                        let column = BoundExpr::column(&table.name, &c.name, c.data_type);
                        OutputExpr::new(column, c.name.clone())
                    }));
                }
                SelectItem::Expr { expr, alias } => {
                    let bound = self.bind_expr(expr, from.as_ref())?;
                    select_list.push(OutputExpr::new(bound, output_name(expr, alias.as_deref())));
                }
            }
        }

        let filter = match &stmt.selection {
            Some(expr) => {
                let bound = self.bind_expr(expr, from.as_ref())?;
                match bound.return_type() {
                    DataType::Bool => Some(bound),
                    other => return Err(BindError::NonBooleanPredicate(other)),
                }
            }
            None => None,
        };

        debug!(
            table = ?from.as_ref().map(|t| &t.name),
            columns = select_list.len(),
            "bound select"
        );
        Ok(BoundSelect {
            select_list,
            from,
            filter,
        })
    }

    fn bind_table(&self, name: &str) -> Result<BoundTableRef, BindError> {
        let table = self.catalog.table_by_name(name)?;
        Ok(BoundTableRef {
            table_id: table.id,
            name: table.name.clone(),
            columns: table.columns().map(|(_, c)| c.clone()).collect(),
        })
    }

    fn bind_column(
        &self,
        table: Option<&BoundTableRef>,
        name: &str,
        display: String,
    ) -> Result<BoundExpr, BindError> {
        let table = table.ok_or_else(|| BindError::UnresolvedColumn(display.clone()))?;
        let descriptor = self.catalog.table(table.table_id)?;
        match descriptor.find_columns(name).as_slice() {
            [] => Err(BindError::UnresolvedColumn(display)),
            [(_, column)] => Ok(BoundExpr::column(&table.name, &column.name, column.data_type)),
            _ => Err(BindError::AmbiguousColumn(display)),
        }
    }

    pub fn bind_expr(
        &self,
        expr: &Expr,
        table: Option<&BoundTableRef>,
    ) -> Result<BoundExpr, BindError> {
        match expr {
            Expr::Identifier(name) => self.bind_column(table, name, name.clone()),
            Expr::QualifiedIdentifier { table: qualifier, column } => {
                let display = format!("{}.{}", qualifier, column);
                match table {
                    Some(t) if t.name == *qualifier => self.bind_column(table, column, display),
                    _ => Err(BindError::UnresolvedColumn(display)),
                }
            }
            Expr::Literal(literal) => Ok(BoundExpr::Constant(bind_literal(literal))),
            Expr::BinaryOp { op, left, right } => {
                let left = self.bind_expr(left, table)?;
                let right = self.bind_expr(right, table)?;
                bind_binary(*op, left, right)
            }
            Expr::Cast { expr, data_type } => {
                let inner = self.bind_expr(expr, table)?;
                bind_cast(inner, *data_type)
            }
        }
    }
}

fn output_name(expr: &Expr, alias: Option<&str>) -> String {
    match (alias, expr) {
        (Some(alias), _) => alias.to_string(),
        (None, Expr::Identifier(name)) => name.clone(),
        (None, Expr::QualifiedIdentifier { column, .. }) => column.clone(),
        (None, other) => other.to_string(),
    }
}

fn bind_literal(literal: &Literal) -> ScalarValue {
    match literal {
        Literal::Int(v) => ScalarValue::Int64(Some(*v)),
        Literal::Float(v) => ScalarValue::Float64(Some(*v)),
        Literal::String(s) => ScalarValue::String(Some(s.clone())),
        Literal::Bool(b) => ScalarValue::Bool(Some(*b)),
        // Untyped until it meets an operand or a cast.
        Literal::Null => ScalarValue::String(None),
    }
}

fn is_null_constant(expr: &BoundExpr) -> bool {
    expr.as_constant().map_or(false, ScalarValue::is_null)
}

/// Operand type given to two bare nulls that the operator cannot take as they are.
fn null_operand_type(op: BinaryOperator) -> DataType {
    if op.is_logical() {
        DataType::Bool
    } else {
        DataType::Int64
    }
}

fn bind_binary(
    op: BinaryOperator,
    mut left: BoundExpr,
    mut right: BoundExpr,
) -> Result<BoundExpr, BindError> {
    if is_null_constant(&left) && is_null_constant(&right) {
        if op.result_type(left.return_type(), right.return_type()).is_none() {
            let operand = null_operand_type(op);
            left = BoundExpr::Constant(ScalarValue::null(operand));
            right = BoundExpr::Constant(ScalarValue::null(operand));
        }
    } else if is_null_constant(&left) {
        left = BoundExpr::Constant(ScalarValue::null(right.return_type()));
    } else if is_null_constant(&right) {
        right = BoundExpr::Constant(ScalarValue::null(left.return_type()));
    }

    let (lt, rt) = (left.return_type(), right.return_type());
    if lt != rt {
        if lt.can_widen_to(&rt) {
            left = BoundExpr::cast(rt, left);
        } else if rt.can_widen_to(&lt) {
            right = BoundExpr::cast(lt, right);
        }
    }

    let return_type = op
        .result_type(left.return_type(), right.return_type())
        .ok_or(BindError::TypeMismatch {
            op,
            left: lt,
            right: rt,
        })?;
    Ok(BoundExpr::binary(op, left, right, return_type))
}

fn bind_cast(inner: BoundExpr, target: DataType) -> Result<BoundExpr, BindError> {
    let from = inner.return_type();
    if is_null_constant(&inner) {
        return Ok(BoundExpr::Constant(ScalarValue::null(target)));
    }
    if from == target {
        return Ok(inner);
    }
    if !from.can_cast_to(&target) {
        return Err(BindError::Cast { from, to: target });
    }
    Ok(BoundExpr::cast(target, inner))
}
