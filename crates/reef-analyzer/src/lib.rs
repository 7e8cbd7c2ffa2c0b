//! LINQ to Entities query analysis for reef.
//!
//! This crate is the analysis engine. Given C# sources it:
//!
//! - discovers query context classes and the entity model they expose
//! - finds analysis triggers (lambdas in query-operator argument position,
//!   predicate locals typed `Expression<Func<T, bool>>`, query
//!   comprehensions, and read-only entity property declarations)
//! - resolves the root entity type of each query chain with a confidence
//!   level
//! - classifies every node of the query body against the capability
//!   registry and the entity catalog
//!
//! The returned diagnostics flag constructs the remote query translation
//! layer cannot convert: read-only or unmapped properties in predicates,
//! unrecognized method calls, navigation collections queried through
//! delegates, interpolated strings, and entity construction inside
//! queries.

mod applicability;
mod classify;
pub mod codes;
mod model;
mod params;
mod root;
mod semantics;

pub use applicability::is_ef_applicable;
pub use classify::Classifier;
pub use model::{
    ContextInfo, EntityClass, PropertyFact, QueryableSet, UsageContext, COLLECTION_NAV_SHAPE,
    CONTEXT_MARKER, QUERYABLE_SET_SHAPES, SEQUENCE_SHAPE, UNMAPPED_ATTRIBUTE,
};
pub use params::{bind_lambda, bind_query, ContextualParameter, ParameterMap, ParameterRole};
pub use root::{delegate_entity, resolve_query_root, RootResolution, Scope};
pub use semantics::{derives_from, ClassSymbol, SourceIndex, SymbolResolver};

pub use reef_types::{Confidence, Diagnostic, Severity, Span};

use reef_registry::Registry;
use reef_syntax::{parse_source, Expr, Lambda, MethodDecl, QueryExpr, SourceModel, TypeName};
use tracing::debug;

/// A diagnostic tagged with the index of the source it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDiagnostic {
    pub source: usize,
    pub diagnostic: Diagnostic,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AnalysisResult {
    pub diagnostics: Vec<SourceDiagnostic>,
}

/// Analyzes a set of C# sources for untranslatable query constructs.
///
/// Duplicate diagnostics across overlapping triggers are expected; hosts
/// deduplicate by content and location.
pub fn analyze_sources(sources: &[&str]) -> AnalysisResult {
    let mut result = AnalysisResult::default();

    if !is_ef_applicable(&[], sources) {
        return result;
    }

    let mut models: Vec<Option<SourceModel>> = Vec::with_capacity(sources.len());
    for (idx, src) in sources.iter().enumerate() {
        match parse_source(src) {
            Ok(model) => models.push(Some(model)),
            Err(err) => {
                result.diagnostics.push(SourceDiagnostic {
                    source: idx,
                    diagnostic: Diagnostic::error(
                        codes::PARSE_ERROR,
                        format!("Failed to parse C# source: {err}"),
                        None,
                    ),
                });
                models.push(None);
            }
        }
    }

    let parsed: Vec<(usize, &SourceModel)> = models
        .iter()
        .enumerate()
        .filter_map(|(idx, model)| model.as_ref().map(|m| (idx, m)))
        .collect();
    let index = SourceIndex::build(&parsed);

    for (source, model) in &parsed {
        for class in &model.classes {
            analyze_property_declarations(*source, class, &index, &mut result);
            for method in &class.methods {
                analyze_method(*source, method, &index, &mut result);
            }
        }
    }

    debug!(
        sources = sources.len(),
        diagnostics = result.diagnostics.len(),
        "analysis complete"
    );
    result
}

/// Declaration-site notices for computed (read-only) entity properties.
fn analyze_property_declarations(
    source: usize,
    class: &reef_syntax::ClassDecl,
    index: &SourceIndex,
    result: &mut AnalysisResult,
) {
    for prop in &class.properties {
        if prop.is_static || !prop.is_read_only() {
            continue;
        }
        // The catalog is rebuilt per trigger; a declaration is a trigger.
        let Some(ctx) = UsageContext::build(index) else {
            return;
        };
        if ctx.entity(&class.name).is_none() {
            continue;
        }
        result.diagnostics.push(SourceDiagnostic {
            source,
            diagnostic: Diagnostic::info(
                codes::COMPUTED_PROPERTY,
                format!(
                    "Read-only property '{}' of entity class '{}' is computed in application code and is not translatable",
                    prop.name, class.name
                ),
                Some(prop.span),
            ),
        });
    }
}

fn analyze_method(
    source: usize,
    method: &MethodDecl,
    index: &SourceIndex,
    result: &mut AnalysisResult,
) {
    let scope = Scope::new(&method.locals);
    let mut out: Vec<Diagnostic> = Vec::new();

    // Predicate locals: Expression<Func<Entity, bool>> f = x => ...;
    for local in &method.locals {
        let Some(ty) = &local.declared_ty else {
            continue;
        };
        let Some(Expr::Lambda(lambda)) = &local.init else {
            continue;
        };
        if ty.simple_name() == "Expression" {
            analyze_predicate_local(ty, lambda, &scope, index, &mut out);
        }
    }

    if let Some(body) = &method.body {
        body.walk(&mut |expr| match expr {
            Expr::Invocation { callee, args, .. } => {
                let Expr::MemberAccess { receiver, name, .. } = callee.as_ref() else {
                    return;
                };
                if !Registry::global().is_query_operator(name) {
                    return;
                }
                for arg in args {
                    if let Expr::Lambda(lambda) = arg {
                        analyze_lambda_trigger(lambda, receiver, &scope, index, &mut out);
                    }
                }
            }
            Expr::Query(query) => {
                analyze_query_trigger(query, &scope, index, &mut out);
            }
            _ => {}
        });
    }

    result
        .diagnostics
        .extend(out.into_iter().map(|diagnostic| SourceDiagnostic {
            source,
            diagnostic,
        }));
}

/// A lambda passed to a query operator: resolve the operator's receiver to
/// a root entity, then classify the lambda body.
fn analyze_lambda_trigger(
    lambda: &Lambda,
    receiver: &Expr,
    scope: &Scope<'_>,
    index: &SourceIndex,
    out: &mut Vec<Diagnostic>,
) {
    let Some(ctx) = UsageContext::build(index) else {
        return;
    };
    let Some(resolution) = resolve_query_root(receiver, scope, &ctx, index) else {
        return;
    };
    let Some(entity) = ctx.entity(&resolution.entity) else {
        return;
    };

    let params = bind_lambda(lambda, entity, &ctx);
    let classifier = Classifier {
        root: entity,
        confidence: resolution.confidence,
        ctx: &ctx,
        resolver: index,
        scope,
        params: &params,
    };
    classifier.classify(&lambda.body, out);
}

/// A lambda assigned to an `Expression<Func<Entity, bool>>` local is a
/// predicate destined for a query even before any chain uses it.
fn analyze_predicate_local(
    ty: &TypeName,
    lambda: &Lambda,
    scope: &Scope<'_>,
    index: &SourceIndex,
    out: &mut Vec<Diagnostic>,
) {
    let Some(ctx) = UsageContext::build(index) else {
        return;
    };
    let Some(entity_name) = delegate_entity(ty, &ctx) else {
        return;
    };
    let Some(entity) = ctx.entity(entity_name) else {
        return;
    };

    let params = bind_lambda(lambda, entity, &ctx);
    let classifier = Classifier {
        root: entity,
        confidence: Confidence::Definite,
        ctx: &ctx,
        resolver: index,
        scope,
        params: &params,
    };
    classifier.classify(&lambda.body, out);
}

fn analyze_query_trigger(
    query: &QueryExpr,
    scope: &Scope<'_>,
    index: &SourceIndex,
    out: &mut Vec<Diagnostic>,
) {
    let Some(ctx) = UsageContext::build(index) else {
        return;
    };
    let Some(resolution) = resolve_query_root(&query.source, scope, &ctx, index) else {
        return;
    };
    let Some(entity) = ctx.entity(&resolution.entity) else {
        return;
    };

    let params = bind_query(query, entity, &ctx);
    let classifier = Classifier {
        root: entity,
        confidence: resolution.confidence,
        ctx: &ctx,
        resolver: index,
        scope,
        params: &params,
    };
    classifier.classify_all(&query.body, out);
}
