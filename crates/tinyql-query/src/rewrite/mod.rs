//! Per-kind rewrite dispatch over plan nodes and bound expressions.
//!
//! A [`Rewriter`] holds one handler per node kind, every slot starting out as the shared
//! default (rewrite the children, rebuild the node unchanged). Passes replace only the
//! slots they care about.

pub mod input_ref;
pub mod lowering;

pub use input_ref::{expr_resolver, input_ref_rewriter, resolve_input_refs};
pub use lowering::{lower, lowering_rewriter};

use crate::expr::{BinaryOpExpr, BoundExpr, ExprKind, TypeCastExpr};
use crate::plan::{PlanKind, PlanNode};
use crate::planner::PlanError;

pub type Handler<T, S> = fn(&mut Rewriter<T, S>, T) -> Result<T, PlanError>;

/// A tree whose nodes come from a closed set of kinds.
pub trait Rewritable: Sized {
    type Kind: Copy;

    const KIND_COUNT: usize;

    fn kind(&self) -> Self::Kind;

    fn kind_index(kind: Self::Kind) -> usize;

    /// Rewrite every direct child through `rewriter` and rebuild this node around the results.
    fn rewrite_children<S>(self, rewriter: &mut Rewriter<Self, S>) -> Result<Self, PlanError>;
}

pub struct Rewriter<T: Rewritable, S> {
    handlers: Vec<Handler<T, S>>,
    state: S,
}

impl<T: Rewritable, S> Rewriter<T, S> {
    pub fn new(state: S) -> Self {
        Rewriter {
            handlers: vec![Self::default_handler as Handler<T, S>; T::KIND_COUNT],
            state,
        }
    }

    /// Install `handler` for `kind`, replacing the default.
    pub fn with_handler(mut self, kind: T::Kind, handler: Handler<T, S>) -> Self {
        self.handlers[T::kind_index(kind)] = handler;
        self
    }

    pub fn rewrite(&mut self, node: T) -> Result<T, PlanError> {
        let handler = self.handlers[T::kind_index(node.kind())];
        handler(self, node)
    }

    pub fn default_handler(rewriter: &mut Rewriter<T, S>, node: T) -> Result<T, PlanError> {
        node.rewrite_children(rewriter)
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }
}

impl Rewritable for PlanNode {
    type Kind = PlanKind;

    const KIND_COUNT: usize = PlanKind::COUNT;

    fn kind(&self) -> PlanKind {
        PlanNode::kind(self)
    }

    fn kind_index(kind: PlanKind) -> usize {
        kind.index()
    }

    fn rewrite_children<S>(self, rewriter: &mut Rewriter<Self, S>) -> Result<Self, PlanError> {
        self.map_children(&mut |child| rewriter.rewrite(child))
    }
}

impl Rewritable for BoundExpr {
    type Kind = ExprKind;

    const KIND_COUNT: usize = ExprKind::COUNT;

    fn kind(&self) -> ExprKind {
        BoundExpr::kind(self)
    }

    fn kind_index(kind: ExprKind) -> usize {
        kind.index()
    }

    fn rewrite_children<S>(self, rewriter: &mut Rewriter<Self, S>) -> Result<Self, PlanError> {
        Ok(match self {
            BoundExpr::Constant(_) | BoundExpr::ColumnRef(_) | BoundExpr::InputRef(_) => self,
            BoundExpr::BinaryOp(b) => BoundExpr::BinaryOp(BinaryOpExpr {
                op: b.op,
                left: Box::new(rewriter.rewrite(*b.left)?),
                right: Box::new(rewriter.rewrite(*b.right)?),
                return_type: b.return_type,
            }),
            BoundExpr::TypeCast(c) => BoundExpr::TypeCast(TypeCastExpr {
                target: c.target,
                inner: Box::new(rewriter.rewrite(*c.inner)?),
            }),
        })
    }
}
