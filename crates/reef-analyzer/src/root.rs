//! Root-type resolution.
//!
//! Given the receiver of a query-operator invocation (or the source of a
//! comprehension's from-clause), determine which entity class the chain is
//! operating over and how confident the analysis is about the chain being
//! backed by a genuine context queryable set.
//!
//! Resolution is a pure function of the expression, the scope, and the
//! catalog. Re-resolving the same chain within one trigger always yields
//! the same answer.

use std::collections::HashMap;

use reef_registry::Registry;
use reef_syntax::{Expr, LocalDecl, TypeName};
use reef_types::Confidence;
use tracing::trace;

use crate::model::{queryable_set_entity, sequence_entity, UsageContext};
use crate::semantics::SymbolResolver;

/// Local declarations visible at a trigger, by name. Later declarations of
/// the same name shadow earlier ones.
pub struct Scope<'a> {
    locals: HashMap<&'a str, &'a LocalDecl>,
}

impl<'a> Scope<'a> {
    pub fn new(locals: &'a [LocalDecl]) -> Scope<'a> {
        let mut map = HashMap::new();
        for local in locals {
            map.insert(local.name.as_str(), local);
        }
        Scope { locals: map }
    }

    pub fn local(&self, name: &str) -> Option<&'a LocalDecl> {
        self.locals.get(name).copied()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootResolution {
    pub entity: String,
    pub confidence: Confidence,
}

/// Tracing recursion bound. Chains deeper than this stay unresolved.
const MAX_TRACE_DEPTH: usize = 8;

/// Resolves the entity class a query chain operates over.
///
/// Returns `None` when no case matches; the caller then skips the trigger
/// entirely (no diagnostics either way).
pub fn resolve_query_root(
    receiver: &Expr,
    scope: &Scope<'_>,
    ctx: &UsageContext,
    resolver: &dyn SymbolResolver,
) -> Option<RootResolution> {
    let resolution = match receiver {
        // context.Things
        Expr::MemberAccess {
            receiver: inner,
            name,
            ..
        } => context_set_access(inner, name, scope, ctx).map(|entity| RootResolution {
            entity: entity.to_string(),
            confidence: Confidence::Definite,
        }),

        Expr::Identifier { name, .. } => {
            let local = scope.local(name)?;
            resolve_local_root(local, scope, ctx, resolver)
        }

        _ => None,
    };

    if let Some(resolution) = &resolution {
        trace!(
            entity = %resolution.entity,
            confidence = ?resolution.confidence,
            "query root resolved"
        );
    }
    resolution
}

fn resolve_local_root(
    local: &LocalDecl,
    scope: &Scope<'_>,
    ctx: &UsageContext,
    resolver: &dyn SymbolResolver,
) -> Option<RootResolution> {
    match &local.declared_ty {
        Some(ty) => {
            if let Some(entity) = queryable_set_entity(ty) {
                let entity = ctx.entity(entity)?;
                return Some(RootResolution {
                    entity: entity.name.clone(),
                    confidence: Confidence::Definite,
                });
            }
            let entity = sequence_entity(ty)?;
            let entity = ctx.entity(entity)?.name.clone();
            // A sequence-typed local is Potential unless its declaring
            // assignment can be traced back to a genuine context access for
            // the same entity.
            let confidence = match local
                .init
                .as_ref()
                .and_then(|init| trace_expr(init, scope, ctx, resolver, 0))
            {
                Some((traced, Confidence::Definite)) if traced == entity => Confidence::Definite,
                _ => Confidence::Potential,
            };
            Some(RootResolution { entity, confidence })
        }
        // `var` declarations have nothing but the initializer to go on.
        None => {
            let (entity, confidence) =
                trace_expr(local.init.as_ref()?, scope, ctx, resolver, 0)?;
            Some(RootResolution { entity, confidence })
        }
    }
}

/// `expr.prop` where `expr` is a context instance and `prop` one of its
/// queryable sets.
fn context_set_access<'c>(
    receiver: &Expr,
    property: &str,
    scope: &Scope<'_>,
    ctx: &'c UsageContext,
) -> Option<&'c str> {
    let context_name = context_instance_class(receiver, scope, ctx)?;
    ctx.context(context_name)?.set_entity(property)
}

/// The context class an expression evaluates to, when that can be shown
/// from local declarations alone.
fn context_instance_class<'c>(
    expr: &Expr,
    scope: &Scope<'_>,
    ctx: &'c UsageContext,
) -> Option<&'c str> {
    let class_of_type = |ty: &TypeName| {
        let name = ty.simple_name();
        ctx.is_context(name)
            .then(|| ctx.context(name).map(|c| c.name.as_str()))
            .flatten()
    };

    match expr {
        Expr::Identifier { name, .. } => {
            let local = scope.local(name)?;
            if let Some(ty) = &local.declared_ty {
                return class_of_type(ty);
            }
            match &local.init {
                Some(Expr::ObjectCreation { ty, .. }) => class_of_type(ty),
                _ => None,
            }
        }
        Expr::ObjectCreation { ty, .. } => class_of_type(ty),
        _ => None,
    }
}

/// Traces an expression to the entity it yields, with the confidence the
/// trail supports.
fn trace_expr(
    expr: &Expr,
    scope: &Scope<'_>,
    ctx: &UsageContext,
    resolver: &dyn SymbolResolver,
    depth: usize,
) -> Option<(String, Confidence)> {
    if depth > MAX_TRACE_DEPTH {
        return None;
    }
    match expr {
        Expr::MemberAccess { receiver, name, .. } => {
            let entity = context_set_access(receiver, name, scope, ctx)?;
            Some((entity.to_string(), Confidence::Definite))
        }
        Expr::Identifier { name, .. } => {
            let local = scope.local(name)?;
            trace_local(local, scope, ctx, resolver, depth + 1)
        }
        Expr::Invocation { callee, .. } => match callee.as_ref() {
            Expr::Identifier { name, .. } => {
                trace_method_returns(name, ctx, resolver, depth + 1)
            }
            Expr::MemberAccess { receiver, name, .. }
                if Registry::global().is_query_operator(name) || name == "AsQueryable" =>
            {
                trace_expr(receiver, scope, ctx, resolver, depth + 1)
            }
            _ => None,
        },
        _ => None,
    }
}

fn trace_local(
    local: &LocalDecl,
    scope: &Scope<'_>,
    ctx: &UsageContext,
    resolver: &dyn SymbolResolver,
    depth: usize,
) -> Option<(String, Confidence)> {
    if let Some(entity) = local
        .declared_ty
        .as_ref()
        .and_then(queryable_set_entity)
        .and_then(|e| ctx.entity(e))
    {
        return Some((entity.name.clone(), Confidence::Definite));
    }
    trace_expr(local.init.as_ref()?, scope, ctx, resolver, depth)
}

/// Inspects every return path of the (single) method with the given name.
/// Definite requires every path to resolve to the same entity through a
/// genuine context access; one unresolved or mismatched path keeps the
/// whole abstraction Potential.
fn trace_method_returns(
    name: &str,
    ctx: &UsageContext,
    resolver: &dyn SymbolResolver,
    depth: usize,
) -> Option<(String, Confidence)> {
    let methods = resolver.methods_named(name);
    let [method] = methods.as_slice() else {
        // Zero methods means an unknown callee; several mean an overload
        // set this resolver cannot pick from. Both stay unresolved.
        return None;
    };
    if method.returns.is_empty() {
        return None;
    }

    let method_scope = Scope::new(&method.locals);
    let mut entity: Option<String> = None;
    let mut all_definite = true;

    for ret in &method.returns {
        match trace_expr(ret, &method_scope, ctx, resolver, depth) {
            Some((traced, confidence)) => {
                match &entity {
                    Some(seen) if *seen != traced => all_definite = false,
                    Some(_) => {}
                    None => entity = Some(traced),
                }
                if confidence == Confidence::Potential {
                    all_definite = false;
                }
            }
            None => all_definite = false,
        }
    }

    let entity = entity?;
    let confidence = if all_definite {
        Confidence::Definite
    } else {
        Confidence::Potential
    };
    Some((entity, confidence))
}

/// The entity a delegate-shaped type is declared over:
/// `Func<Entity, bool>` or `Expression<Func<Entity, bool>>`.
pub fn delegate_entity<'c>(ty: &TypeName, ctx: &'c UsageContext) -> Option<&'c str> {
    let func = if ty.simple_name() == "Expression" {
        ty.single_arg()?
    } else {
        ty
    };
    if func.simple_name() != "Func" || func.args.len() != 2 {
        return None;
    }
    if !matches!(func.args[1].simple_name(), "bool" | "Boolean") {
        return None;
    }
    ctx.entity(func.args[0].simple_name()).map(|e| e.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UsageContext;
    use crate::semantics::SourceIndex;
    use reef_syntax::{parse_source, SourceModel};

    struct Fixture {
        models: Vec<SourceModel>,
    }

    impl Fixture {
        fn new(sources: &[&str]) -> Fixture {
            Fixture {
                models: sources
                    .iter()
                    .map(|s| parse_source(s).expect("parse"))
                    .collect(),
            }
        }

        fn index(&self) -> SourceIndex {
            let pairs: Vec<(usize, &SourceModel)> = self
                .models
                .iter()
                .enumerate()
                .map(|(i, m)| (i, m))
                .collect();
            SourceIndex::build(&pairs)
        }

        /// Resolves the receiver of the first `Where` call in `method`.
        fn resolve_where_receiver(&self, index: &SourceIndex, method: &str) -> Option<RootResolution> {
            let ctx = UsageContext::build(index)?;
            for model in &self.models {
                for class in &model.classes {
                    for m in &class.methods {
                        if m.name != method {
                            continue;
                        }
                        let scope = Scope::new(&m.locals);
                        let mut receiver = None;
                        if let Some(body) = &m.body {
                            body.walk(&mut |expr| {
                                if let Expr::Invocation { callee, .. } = expr {
                                    if let Expr::MemberAccess { receiver: r, name, .. } =
                                        callee.as_ref()
                                    {
                                        if name == "Where" && receiver.is_none() {
                                            receiver = Some(r.as_ref().clone());
                                        }
                                    }
                                }
                            });
                        }
                        let receiver = receiver?;
                        return resolve_query_root(&receiver, &scope, &ctx, index);
                    }
                }
            }
            None
        }
    }

    const MODEL: &str = r#"
        using System.Data.Entity;
        using System.Linq;

        public class Thing
        {
            public int Id { get; set; }
            public string Foo { get; set; }
        }

        public class AppContext : DbContext
        {
            public DbSet<Thing> Things { get; set; }
        }
    "#;

    #[test]
    fn context_set_access_is_definite() {
        let fixture = Fixture::new(&[
            MODEL,
            r#"
            public class Program
            {
                public void Run()
                {
                    var context = new AppContext();
                    var items = context.Things.Where(t => t.Foo == "x");
                }
            }
        "#,
        ]);
        let index = fixture.index();
        let resolution = fixture.resolve_where_receiver(&index, "Run").expect("root");
        assert_eq!(resolution.entity, "Thing");
        assert_eq!(resolution.confidence, Confidence::Definite);
    }

    #[test]
    fn set_typed_local_is_definite() {
        let fixture = Fixture::new(&[
            MODEL,
            r#"
            public class Program
            {
                public void Run()
                {
                    var context = new AppContext();
                    DbSet<Thing> things = context.Things;
                    var items = things.Where(t => t.Foo == "x");
                }
            }
        "#,
        ]);
        let index = fixture.index();
        let resolution = fixture.resolve_where_receiver(&index, "Run").expect("root");
        assert_eq!(resolution.entity, "Thing");
        assert_eq!(resolution.confidence, Confidence::Definite);
    }

    #[test]
    fn traced_single_return_upgrades_to_definite() {
        let fixture = Fixture::new(&[
            MODEL,
            r#"
            public class Program
            {
                public IQueryable<Thing> GetThings()
                {
                    var context = new AppContext();
                    return context.Things;
                }

                public void Run()
                {
                    IQueryable<Thing> query = GetThings();
                    var items = query.Where(t => t.Foo == "x");
                }
            }
        "#,
        ]);
        let index = fixture.index();
        let resolution = fixture.resolve_where_receiver(&index, "Run").expect("root");
        assert_eq!(resolution.entity, "Thing");
        assert_eq!(resolution.confidence, Confidence::Definite);
    }

    #[test]
    fn leaking_return_path_stays_potential() {
        let fixture = Fixture::new(&[
            MODEL,
            r#"
            public class Program
            {
                public IQueryable<Thing> GetThings(bool flag)
                {
                    var context = new AppContext();
                    if (flag)
                    {
                        return context.Things;
                    }
                    return MakeFallback();
                }

                public void Run()
                {
                    IQueryable<Thing> query = GetThings(true);
                    var items = query.Where(t => t.Foo == "x");
                }
            }
        "#,
        ]);
        let index = fixture.index();
        let resolution = fixture.resolve_where_receiver(&index, "Run").expect("root");
        assert_eq!(resolution.entity, "Thing");
        assert_eq!(resolution.confidence, Confidence::Potential);
    }

    #[test]
    fn unknown_receiver_fails_resolution() {
        let fixture = Fixture::new(&[
            MODEL,
            r#"
            public class Program
            {
                public void Run(IQueryable<Thing> query)
                {
                    var items = mystery.Where(t => t.Foo == "x");
                }
            }
        "#,
        ]);
        let index = fixture.index();
        assert!(fixture.resolve_where_receiver(&index, "Run").is_none());
    }

    #[test]
    fn resolution_is_idempotent() {
        let fixture = Fixture::new(&[
            MODEL,
            r#"
            public class Program
            {
                public IQueryable<Thing> GetThings()
                {
                    var context = new AppContext();
                    return context.Things;
                }

                public void Run()
                {
                    IQueryable<Thing> query = GetThings();
                    var items = query.Where(t => t.Foo == "x");
                }
            }
        "#,
        ]);
        let index = fixture.index();
        let first = fixture.resolve_where_receiver(&index, "Run");
        let second = fixture.resolve_where_receiver(&index, "Run");
        assert_eq!(first, second);
    }

    #[test]
    fn delegate_shapes_resolve_their_entity() {
        let fixture = Fixture::new(&[MODEL]);
        let index = fixture.index();
        let ctx = UsageContext::build(&index).expect("catalog");

        let func = reef_syntax::TypeName::parse("Func<Thing, bool>").unwrap();
        assert_eq!(delegate_entity(&func, &ctx), Some("Thing"));

        let wrapped = reef_syntax::TypeName::parse("Expression<Func<Thing, bool>>").unwrap();
        assert_eq!(delegate_entity(&wrapped, &ctx), Some("Thing"));

        let not_bool = reef_syntax::TypeName::parse("Func<Thing, int>").unwrap();
        assert_eq!(delegate_entity(&not_bool, &ctx), None);

        let unknown = reef_syntax::TypeName::parse("Func<Widget, bool>").unwrap();
        assert_eq!(delegate_entity(&unknown, &ctx), None);
    }
}
