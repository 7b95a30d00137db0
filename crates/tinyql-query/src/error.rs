use crate::binder::BindError;
use crate::executor::ExecutorError;
use crate::planner::PlanError;
use crate::sql::ParseError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("bind error: {0}")]
    Bind(#[from] BindError),

    #[error("plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("execution error: {0}")]
    Execute(#[from] ExecutorError),

    #[error(transparent)]
    Core(#[from] tinyql_core::Error),
}
