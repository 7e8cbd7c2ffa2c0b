//! Contextual parameter binding.
//!
//! Free identifiers inside an analyzed body get a role before
//! classification: the range variable or lambda parameter bound to the
//! resolved root entity, a parameter whose declared type names a known
//! entity, or an identifier the resolver cannot vouch for. Presence in the
//! map at all is what authorizes member-access validation against the root
//! class; the role records how the binding was established.

use std::collections::HashMap;

use reef_syntax::{Expr, Lambda, QueryExpr};

use crate::model::{EntityClass, UsageContext};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParameterRole {
    Unknown,
    /// Bound range variable or parameter of a known entity class.
    BoundEntity(String),
    /// Traceable to a queryable over a known entity class.
    QueryableFacade(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextualParameter {
    pub name: String,
    pub role: ParameterRole,
}

pub type ParameterMap = HashMap<String, ContextualParameter>;

/// Binds the parameters of a trigger lambda, nested lambda parameters
/// included.
pub fn bind_lambda(lambda: &Lambda, root: &EntityClass, ctx: &UsageContext) -> ParameterMap {
    let mut params = ParameterMap::new();

    for (idx, param) in lambda.params.iter().enumerate() {
        let role = if idx == 0 {
            ParameterRole::BoundEntity(root.name.clone())
        } else {
            declared_entity_role(param.ty.as_ref(), ctx)
        };
        insert(&mut params, &param.name, role);
    }

    bind_nested_lambdas(&lambda.body, ctx, &mut params);
    params
}

/// Binds a comprehension's range variable plus any nested lambda
/// parameters in the clause bodies.
pub fn bind_query(query: &QueryExpr, root: &EntityClass, ctx: &UsageContext) -> ParameterMap {
    let mut params = ParameterMap::new();
    insert(
        &mut params,
        &query.range_var,
        ParameterRole::QueryableFacade(root.name.clone()),
    );
    for clause in &query.body {
        bind_nested_lambdas(clause, ctx, &mut params);
    }
    params
}

fn bind_nested_lambdas(expr: &Expr, ctx: &UsageContext, params: &mut ParameterMap) {
    expr.walk(&mut |node| {
        if let Expr::Lambda(lambda) = node {
            for param in &lambda.params {
                let role = declared_entity_role(param.ty.as_ref(), ctx);
                insert(params, &param.name, role);
            }
        }
    });
}

fn declared_entity_role(
    ty: Option<&reef_syntax::TypeName>,
    ctx: &UsageContext,
) -> ParameterRole {
    match ty.and_then(|ty| ctx.entity(ty.simple_name())) {
        Some(entity) => ParameterRole::BoundEntity(entity.name.clone()),
        None => ParameterRole::Unknown,
    }
}

fn insert(params: &mut ParameterMap, name: &str, role: ParameterRole) {
    // The outermost binding wins; nested lambdas do not rebind a name.
    params.entry(name.to_string()).or_insert(ContextualParameter {
        name: name.to_string(),
        role,
    });
}
