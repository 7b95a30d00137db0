//! SQL text to [`SelectStatement`], via `sqlparser`.

use crate::ast::{Expr, Literal, SelectItem, SelectStatement};
use sqlparser::ast as sql;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use thiserror::Error;
use tinyql_core::{BinaryOperator, DataType};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("expected exactly one statement, got {0}")]
    StatementCount(usize),
}

/// A top-level command understood by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Select(SelectStatement),
    Explain(SelectStatement),
}

/// Parse a single `SELECT` statement.
pub fn parse(input: &str) -> Result<SelectStatement, ParseError> {
    match parse_command(input)? {
        Command::Select(select) => Ok(select),
        Command::Explain(_) => Err(ParseError::Unsupported("EXPLAIN in this position".to_string())),
    }
}

/// Parse a `SELECT` or `EXPLAIN SELECT` statement.
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let mut statements = Parser::parse_sql(&GenericDialect {}, input)
        .map_err(|e| ParseError::Syntax(e.to_string()))?;
    if statements.len() != 1 {
        return Err(ParseError::StatementCount(statements.len()));
    }

    match statements.remove(0) {
        sql::Statement::Query(query) => convert_query(*query).map(Command::Select),
        sql::Statement::Explain { statement, .. } => match *statement {
            sql::Statement::Query(query) => convert_query(*query).map(Command::Explain),
            other => Err(ParseError::Unsupported(format!("EXPLAIN {}", other))),
        },
        other => Err(ParseError::Unsupported(format!("statement: {}", other))),
    }
}

fn convert_query(query: sql::Query) -> Result<SelectStatement, ParseError> {
    if query.with.is_some() {
        return Err(ParseError::Unsupported("WITH".to_string()));
    }
    if !query.order_by.is_empty() {
        return Err(ParseError::Unsupported("ORDER BY".to_string()));
    }
    if query.limit.is_some() || query.offset.is_some() {
        return Err(ParseError::Unsupported("LIMIT/OFFSET".to_string()));
    }

    match *query.body {
        sql::SetExpr::Select(select) => convert_select(*select),
        other => Err(ParseError::Unsupported(format!("query body: {}", other))),
    }
}

fn convert_select(select: sql::Select) -> Result<SelectStatement, ParseError> {
    if select.distinct.is_some() {
        return Err(ParseError::Unsupported("DISTINCT".to_string()));
    }
    if select.having.is_some() {
        return Err(ParseError::Unsupported("HAVING".to_string()));
    }
    match &select.group_by {
        sql::GroupByExpr::Expressions(exprs) if exprs.is_empty() => {}
        _ => return Err(ParseError::Unsupported("GROUP BY".to_string())),
    }

    let from = match select.from.len() {
        0 => None,
        1 => {
            let mut from = select.from;
            let table = from.remove(0);
            if !table.joins.is_empty() {
                return Err(ParseError::Unsupported("JOIN".to_string()));
            }
            match table.relation {
                sql::TableFactor::Table { name, alias, .. } => {
                    if alias.is_some() {
                        return Err(ParseError::Unsupported("table alias".to_string()));
                    }
                    Some(object_name(name))
                }
                other => return Err(ParseError::Unsupported(format!("FROM {}", other))),
            }
        }
        n => return Err(ParseError::Unsupported(format!("{} tables in FROM", n))),
    };

    let projection = select
        .projection
        .into_iter()
        .map(|item| match item {
            sql::SelectItem::UnnamedExpr(expr) => Ok(SelectItem::unnamed(convert_expr(expr)?)),
            sql::SelectItem::ExprWithAlias { expr, alias } => {
                Ok(SelectItem::aliased(convert_expr(expr)?, alias.value))
            }
            sql::SelectItem::Wildcard(_) => Ok(SelectItem::Wildcard),
            other => Err(ParseError::Unsupported(format!("select item: {}", other))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let selection = select.selection.map(convert_expr).transpose()?;

    Ok(SelectStatement {
        projection,
        from,
        selection,
    })
}

fn object_name(name: sql::ObjectName) -> String {
    name.0
        .into_iter()
        .map(|ident| ident.value)
        .collect::<Vec<_>>()
        .join(".")
}

fn convert_expr(expr: sql::Expr) -> Result<Expr, ParseError> {
    match expr {
        sql::Expr::Identifier(ident) => Ok(Expr::Identifier(ident.value)),
        sql::Expr::CompoundIdentifier(idents) if idents.len() == 2 => {
            let mut idents = idents.into_iter().map(|i| i.value);
            match (idents.next(), idents.next()) {
                (Some(table), Some(column)) => Ok(Expr::qualified(table, column)),
                _ => Err(ParseError::Unsupported("compound identifier".to_string())),
            }
        }
        sql::Expr::Value(value) => convert_value(value).map(Expr::Literal),
        sql::Expr::Nested(inner) => convert_expr(*inner),
        sql::Expr::BinaryOp { left, op, right } => Ok(Expr::binary(
            convert_op(op)?,
            convert_expr(*left)?,
            convert_expr(*right)?,
        )),
        sql::Expr::UnaryOp {
            op: sql::UnaryOperator::Minus,
            expr,
        } => match *expr {
            // Parse the sign with the digits so i64::MIN is representable.
            sql::Expr::Value(sql::Value::Number(text, long)) => {
                convert_value(sql::Value::Number(format!("-{}", text), long)).map(Expr::Literal)
            }
            inner => match convert_expr(inner)? {
                Expr::Literal(Literal::Int(v)) => v
                    .checked_neg()
                    .map(Expr::int)
                    .ok_or_else(|| ParseError::InvalidNumber(format!("-({})", v))),
                Expr::Literal(Literal::Float(v)) => Ok(Expr::Literal(Literal::Float(-v))),
                other => Ok(Expr::binary(BinaryOperator::Minus, Expr::int(0), other)),
            },
        },
        sql::Expr::UnaryOp {
            op: sql::UnaryOperator::Plus,
            expr,
        } => convert_expr(*expr),
        sql::Expr::Cast {
            expr, data_type, ..
        } => Ok(Expr::cast(convert_expr(*expr)?, convert_type(&data_type)?)),
        other => Err(ParseError::Unsupported(format!("expression: {}", other))),
    }
}

fn convert_value(value: sql::Value) -> Result<Literal, ParseError> {
    match value {
        sql::Value::Number(text, _) => {
            if text.contains(['.', 'e', 'E']) {
                text.parse()
                    .map(Literal::Float)
                    .map_err(|_| ParseError::InvalidNumber(text))
            } else {
                text.parse()
                    .map(Literal::Int)
                    .map_err(|_| ParseError::InvalidNumber(text))
            }
        }
        sql::Value::SingleQuotedString(s) => Ok(Literal::String(s)),
        sql::Value::Boolean(b) => Ok(Literal::Bool(b)),
        sql::Value::Null => Ok(Literal::Null),
        other => Err(ParseError::Unsupported(format!("literal: {}", other))),
    }
}

fn convert_type(data_type: &sql::DataType) -> Result<DataType, ParseError> {
    let text = data_type.to_string();
    let base = text.split('(').next().unwrap_or_default();
    base.parse().map_err(ParseError::Unsupported)
}

fn convert_op(op: sql::BinaryOperator) -> Result<BinaryOperator, ParseError> {
    Ok(match op {
        sql::BinaryOperator::Plus => BinaryOperator::Plus,
        sql::BinaryOperator::Minus => BinaryOperator::Minus,
        sql::BinaryOperator::Multiply => BinaryOperator::Multiply,
        sql::BinaryOperator::Divide => BinaryOperator::Divide,
        sql::BinaryOperator::Eq => BinaryOperator::Eq,
        sql::BinaryOperator::NotEq => BinaryOperator::NotEq,
        sql::BinaryOperator::Lt => BinaryOperator::Lt,
        sql::BinaryOperator::LtEq => BinaryOperator::LtEq,
        sql::BinaryOperator::Gt => BinaryOperator::Gt,
        sql::BinaryOperator::GtEq => BinaryOperator::GtEq,
        sql::BinaryOperator::And => BinaryOperator::And,
        sql::BinaryOperator::Or => BinaryOperator::Or,
        other => return Err(ParseError::Unsupported(format!("operator: {}", other))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_select() {
        let stmt = parse("select c1 from t where c2 = 10").unwrap();
        assert_eq!(stmt.from.as_deref(), Some("t"));
        assert_eq!(stmt.projection, vec![SelectItem::unnamed(Expr::column("c1"))]);
        assert_eq!(
            stmt.selection,
            Some(Expr::binary(BinaryOperator::Eq, Expr::column("c2"), Expr::int(10)))
        );
    }

    #[test]
    fn test_parse_wildcard_alias_and_literals() {
        let stmt = parse("SELECT *, t.c1 + 1.5 AS x, 'a', -3, NULL FROM t").unwrap();
        assert_eq!(stmt.projection[0], SelectItem::Wildcard);
        assert_eq!(
            stmt.projection[1],
            SelectItem::aliased(
                Expr::binary(
                    BinaryOperator::Plus,
                    Expr::qualified("t", "c1"),
                    Expr::Literal(Literal::Float(1.5))
                ),
                "x"
            )
        );
        assert_eq!(
            stmt.projection[2],
            SelectItem::unnamed(Expr::Literal(Literal::String("a".into())))
        );
        assert_eq!(stmt.projection[3], SelectItem::unnamed(Expr::int(-3)));
        assert_eq!(stmt.projection[4], SelectItem::unnamed(Expr::Literal(Literal::Null)));
    }

    #[test]
    fn test_parse_negative_literals() {
        let stmt = parse("select -9223372036854775808, -(-2), -2.5, -c1 from t").unwrap();
        assert_eq!(stmt.projection[0], SelectItem::unnamed(Expr::int(i64::MIN)));
        assert_eq!(stmt.projection[1], SelectItem::unnamed(Expr::int(2)));
        assert_eq!(
            stmt.projection[2],
            SelectItem::unnamed(Expr::Literal(Literal::Float(-2.5)))
        );
        assert_eq!(
            stmt.projection[3],
            SelectItem::unnamed(Expr::binary(
                BinaryOperator::Minus,
                Expr::int(0),
                Expr::column("c1")
            ))
        );
        assert!(matches!(
            parse("select 9223372036854775808 from t"),
            Err(ParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse("select -(-9223372036854775808) from t"),
            Err(ParseError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_parse_cast() {
        let stmt = parse("select cast(c1 as double) from t").unwrap();
        assert_eq!(
            stmt.projection[0],
            SelectItem::unnamed(Expr::cast(Expr::column("c1"), DataType::Float64))
        );
    }

    #[test]
    fn test_parse_without_from() {
        let stmt = parse("select 1").unwrap();
        assert!(stmt.from.is_none());
    }

    #[test]
    fn test_parse_explain() {
        let command = parse_command("explain select c1 from t").unwrap();
        assert!(matches!(command, Command::Explain(_)));
    }

    #[test]
    fn test_unsupported_constructs() {
        for sql in [
            "select a from t join u on t.a = u.a",
            "select a from t order by a",
            "select distinct a from t",
            "select a from t group by a",
            "select a from t where a = (select 1)",
            "select a from t, u",
            "insert into t values (1)",
        ] {
            assert!(
                matches!(parse(sql), Err(ParseError::Unsupported(_))),
                "{} should be unsupported",
                sql
            );
        }
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(parse("selec c1 from t"), Err(ParseError::Syntax(_))));
        assert!(matches!(
            parse("select 1; select 2"),
            Err(ParseError::StatementCount(2))
        ));
    }
}
