use reef_types::Span;

use crate::types::TypeName;

/// A lambda parameter. Simple lambdas (`t => ...`) carry no declared type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeName>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lambda {
    pub params: Vec<Param>,
    pub body: Box<Expr>,
    pub span: Span,
}

/// A query comprehension (`from t in source ... select ...`). Clauses after
/// the initial from-clause are lowered generically into `body`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryExpr {
    pub range_var: String,
    pub range_var_span: Span,
    pub source: Box<Expr>,
    pub body: Vec<Expr>,
    pub span: Span,
}

/// A local variable declaration inside a method body, kept for
/// declaring-assignment tracing. `var` declarations have `declared_ty: None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalDecl {
    pub name: String,
    pub declared_ty: Option<TypeName>,
    pub init: Option<Expr>,
    pub span: Span,
}

/// The lowered expression IR.
///
/// Only the node kinds the classifier dispatches on get their own variant;
/// everything else becomes `Other` and still exposes its lowered children
/// so descendant walks see the full expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Identifier {
        name: String,
        span: Span,
    },
    MemberAccess {
        receiver: Box<Expr>,
        name: String,
        name_span: Span,
        span: Span,
    },
    Invocation {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    Lambda(Lambda),
    InterpolatedString {
        children: Vec<Expr>,
        span: Span,
    },
    ObjectCreation {
        ty: TypeName,
        ty_span: Span,
        args: Vec<Expr>,
        initializer: Vec<Expr>,
        span: Span,
    },
    Query(Box<QueryExpr>),
    Other {
        children: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Identifier { span, .. }
            | Expr::MemberAccess { span, .. }
            | Expr::Invocation { span, .. }
            | Expr::InterpolatedString { span, .. }
            | Expr::ObjectCreation { span, .. }
            | Expr::Other { span, .. } => *span,
            Expr::Lambda(lambda) => lambda.span,
            Expr::Query(query) => query.span,
        }
    }

    /// Pre-order walk over this node and every descendant, lambda bodies
    /// and query clauses included.
    pub fn walk(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        match self {
            Expr::Identifier { .. } => {}
            Expr::MemberAccess { receiver, .. } => receiver.walk(f),
            Expr::Invocation { callee, args, .. } => {
                callee.walk(f);
                for arg in args {
                    arg.walk(f);
                }
            }
            Expr::Lambda(lambda) => lambda.body.walk(f),
            Expr::InterpolatedString { children, .. } => {
                for child in children {
                    child.walk(f);
                }
            }
            Expr::ObjectCreation {
                args, initializer, ..
            } => {
                for arg in args {
                    arg.walk(f);
                }
                for item in initializer {
                    item.walk(f);
                }
            }
            Expr::Query(query) => {
                query.source.walk(f);
                for clause in &query.body {
                    clause.walk(f);
                }
            }
            Expr::Other { children, .. } => {
                for child in children {
                    child.walk(f);
                }
            }
        }
    }

    /// The identifier name, when this node is a bare identifier.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expr::Identifier { name, .. } => Some(name),
            _ => None,
        }
    }
}
