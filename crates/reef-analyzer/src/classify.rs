//! Expression classification and diagnostic emission.
//!
//! Walks every node of a query body once, dispatches exhaustively on the
//! node kind, and appends diagnostics. Deduplication across overlapping
//! triggers is the host's concern, not ours.

use reef_registry::Registry;
use reef_syntax::{Expr, Span};
use reef_types::{Confidence, Diagnostic};

use crate::codes;
use crate::model::{EntityClass, UsageContext};
use crate::params::{ParameterMap, ParameterRole};
use crate::root::{delegate_entity, Scope};
use crate::semantics::SymbolResolver;

/// The no-op call that re-enters queryable space. Exempt by name.
const AS_QUERYABLE: &str = "AsQueryable";

pub struct Classifier<'a> {
    pub root: &'a EntityClass,
    pub confidence: Confidence,
    pub ctx: &'a UsageContext,
    pub resolver: &'a dyn SymbolResolver,
    pub scope: &'a Scope<'a>,
    pub params: &'a ParameterMap,
}

impl<'a> Classifier<'a> {
    /// Classifies one body expression tree.
    pub fn classify(&self, body: &Expr, out: &mut Vec<Diagnostic>) {
        body.walk(&mut |node| self.check_node(node, out));
    }

    /// Classifies a list of clause trees (query comprehension bodies).
    pub fn classify_all(&self, nodes: &[Expr], out: &mut Vec<Diagnostic>) {
        for node in nodes {
            self.classify(node, out);
        }
    }

    fn check_node(&self, node: &Expr, out: &mut Vec<Diagnostic>) {
        match node {
            Expr::InterpolatedString { span, .. } => {
                out.push(self.paired(
                    codes::INTERPOLATED_STRING,
                    codes::INTERPOLATED_STRING_POTENTIAL,
                    "Interpolated strings cannot be used in a LINQ to Entities expression"
                        .to_string(),
                    *span,
                ));
            }

            Expr::MemberAccess {
                receiver,
                name,
                name_span,
                ..
            } => self.check_member_access(receiver, name, *name_span, out),

            Expr::Invocation { callee, args, span } => {
                self.check_invocation(callee, args, *span, out)
            }

            Expr::ObjectCreation { ty, ty_span, .. } => {
                if let Some(entity) = self.ctx.entity(ty.simple_name()) {
                    out.push(self.paired(
                        codes::ENTITY_NEW,
                        codes::ENTITY_NEW_POTENTIAL,
                        format!(
                            "Entity class '{}' constructed inside a LINQ to Entities expression",
                            entity.name
                        ),
                        *ty_span,
                    ));
                }
            }

            // Structure-only nodes: their children are validated as the
            // walk reaches them.
            Expr::Identifier { .. }
            | Expr::Lambda(_)
            | Expr::Query(_)
            | Expr::Other { .. } => {}
        }
    }

    fn check_member_access(
        &self,
        receiver: &Expr,
        name: &str,
        name_span: Span,
        out: &mut Vec<Diagnostic>,
    ) {
        let Some(ident) = receiver.as_identifier() else {
            return;
        };
        if !self.params.contains_key(ident) {
            return;
        }

        // Read-only and unmapped are independent facts; both may fire for
        // the same access.
        if self.root.is_read_only(name) {
            out.push(self.paired(
                codes::READONLY_USED,
                codes::READONLY_USED_POTENTIAL,
                format!(
                    "Read-only property '{}' of entity class '{}' used in a LINQ to Entities expression",
                    name, self.root.name
                ),
                name_span,
            ));
        }
        if self.root.is_unmapped(name) {
            out.push(self.paired(
                codes::UNMAPPED_USED,
                codes::UNMAPPED_USED_POTENTIAL,
                format!(
                    "Property '{}' of entity class '{}' is not mapped and cannot be used in a LINQ to Entities expression",
                    name, self.root.name
                ),
                name_span,
            ));
        }
    }

    fn check_invocation(
        &self,
        callee: &Expr,
        args: &[Expr],
        span: Span,
        out: &mut Vec<Diagnostic>,
    ) {
        match callee {
            Expr::MemberAccess { receiver, name, .. } => {
                if Registry::global().is_query_operator(name) {
                    self.check_operator_on_member(receiver, args, out);
                    return;
                }

                // TODO: check what precedes AsQueryable() in the chain
                // instead of exempting every call by that name.
                if name == AS_QUERYABLE {
                    return;
                }

                let host_call = receiver
                    .as_identifier()
                    .is_some_and(|r| Registry::global().is_host_type(r));
                let supported = host_call
                    || Registry::global().is_known_instance_call(name)
                    || self.has_server_function_marker(name);
                if !supported {
                    out.push(self.paired(
                        codes::INSTANCE_CALL,
                        codes::INSTANCE_CALL_POTENTIAL,
                        format!("Method '{name}' cannot be translated to a store expression"),
                        span,
                    ));
                }
            }

            Expr::Identifier { name, .. } => {
                let supported = Registry::global().is_known_static_call(name)
                    || self.has_server_function_marker(name);
                if !supported {
                    out.push(self.paired(
                        codes::STATIC_CALL,
                        codes::STATIC_CALL_POTENTIAL,
                        format!(
                            "Static method '{name}' cannot be translated to a store expression"
                        ),
                        span,
                    ));
                }
            }

            _ => {}
        }
    }

    /// A query operator invoked on a member access: validate navigation
    /// property usage.
    fn check_operator_on_member(
        &self,
        operator_receiver: &Expr,
        args: &[Expr],
        out: &mut Vec<Diagnostic>,
    ) {
        let Expr::MemberAccess {
            receiver: inner,
            name: member,
            name_span,
            ..
        } = operator_receiver
        else {
            return;
        };

        let owners = self.ctx.property_owners(member);

        // The receiver's static type breaks ties before ambiguity is
        // declared: a bound parameter of a class that declares the member
        // pins the owner.
        let bound = inner
            .as_identifier()
            .and_then(|id| self.params.get(id))
            .and_then(|param| match &param.role {
                ParameterRole::BoundEntity(entity)
                | ParameterRole::QueryableFacade(entity) => self.ctx.entity(entity),
                ParameterRole::Unknown => None,
            })
            .filter(|entity| entity.has_property(member));

        let resolved = bound.or_else(|| match owners {
            [single] => self.ctx.entity(single),
            _ => None,
        });

        let Some(cls) = resolved else {
            if owners.len() > 1 {
                // Ambiguity is inherently uncertain, so this is always a
                // warning regardless of confidence.
                out.push(Diagnostic::warning(
                    codes::NAV_AMBIGUOUS,
                    format!(
                        "Property '{member}' matches more than one known entity class; the query target cannot be determined"
                    ),
                    Some(*name_span),
                ));
            }
            return;
        };

        if !cls.is_collection_navigation(member) {
            return;
        }

        // An inline predicate is directly translatable; only a separately
        // declared delegate variable defeats translation.
        let [Expr::Identifier { name: arg_name, .. }] = args else {
            return;
        };
        let Some(local) = self.scope.local(arg_name) else {
            return;
        };
        let Some(ty) = &local.declared_ty else {
            return;
        };
        if delegate_entity(ty, self.ctx).is_some() {
            out.push(self.paired(
                codes::NAV_NOT_QUERYABLE,
                codes::NAV_NOT_QUERYABLE_POTENTIAL,
                format!(
                    "Collection navigation property '{}' of entity class '{}' is queried through a delegate and cannot be translated",
                    member, cls.name
                ),
                *name_span,
            ));
        }
    }

    fn has_server_function_marker(&self, name: &str) -> bool {
        self.resolver.methods_named(name).iter().any(|method| {
            method
                .attributes
                .iter()
                .any(|attr| Registry::is_server_function_attribute(attr))
        })
    }

    fn paired(
        &self,
        definite: &'static str,
        potential: &'static str,
        message: String,
        span: Span,
    ) -> Diagnostic {
        match self.confidence {
            Confidence::Definite => Diagnostic::error(definite, message, Some(span)),
            Confidence::Potential => Diagnostic::warning(potential, message, Some(span)),
        }
    }
}
