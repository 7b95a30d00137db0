pub mod ast;
pub mod sql;

pub mod binder;
pub mod expr;

pub mod plan;
pub mod planner;
pub mod rewrite;

pub mod eval;
pub mod executor;

pub mod engine;
pub mod error;


pub use ast::{SelectItem, SelectStatement};
pub use binder::{BindError, Binder, BoundSelect, BoundTableRef};
pub use engine::Engine;
pub use error::{Error, Result};
pub use executor::{BatchStream, Executor, ExecutorBuilder, ExecutorError, GuardedExecutor};
pub use expr::{BoundExpr, ExprKind, OutputExpr};
pub use plan::{PhysicalPlan, PlanKind, PlanNode};
pub use planner::{PlanError, Planner};
pub use rewrite::{Rewritable, Rewriter};
pub use sql::{parse, parse_command, Command, ParseError};
