//! Entity model catalog and context discovery.
//!
//! `UsageContext` is the per-trigger view of the model: the context classes
//! visible at the trigger, the queryable sets they expose, and derived
//! property facts for every reachable entity class. It is rebuilt for every
//! trigger and never cached.

use std::collections::BTreeMap;

use reef_syntax::TypeName;
use tracing::debug;

use crate::semantics::{derives_from, SymbolResolver};

/// Simple name of the query context capability every context derives from.
pub const CONTEXT_MARKER: &str = "DbContext";

/// Shapes a queryable-set property can have.
pub const QUERYABLE_SET_SHAPES: &[&str] = &["DbSet", "IDbSet"];

/// The generic sequence shape a traced local may carry.
pub const SEQUENCE_SHAPE: &str = "IQueryable";

/// The one recognized collection navigation shape.
pub const COLLECTION_NAV_SHAPE: &str = "ICollection";

/// Marker attribute excluding a property from the persisted model.
pub const UNMAPPED_ATTRIBUTE: &str = "NotMapped";

/// Derived facts about one entity property. Immutable after catalog build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyFact {
    pub is_read_only: bool,
    pub is_unmapped: bool,
    pub is_collection_navigation: bool,
    pub declared_ty: Option<TypeName>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityClass {
    pub name: String,
    pub properties: BTreeMap<String, PropertyFact>,
}

impl EntityClass {
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn is_read_only(&self, name: &str) -> bool {
        self.properties
            .get(name)
            .is_some_and(|p| p.is_read_only)
    }

    pub fn is_unmapped(&self, name: &str) -> bool {
        self.properties.get(name).is_some_and(|p| p.is_unmapped)
    }

    pub fn is_collection_navigation(&self, name: &str) -> bool {
        self.properties
            .get(name)
            .is_some_and(|p| p.is_collection_navigation)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryableSet {
    pub property: String,
    pub entity: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextInfo {
    pub name: String,
    pub sets: Vec<QueryableSet>,
}

impl ContextInfo {
    pub fn set_entity(&self, property: &str) -> Option<&str> {
        self.sets
            .iter()
            .find(|s| s.property == property)
            .map(|s| s.entity.as_str())
    }
}

pub struct UsageContext {
    contexts: Vec<ContextInfo>,
    entities: BTreeMap<String, EntityClass>,
    property_owners: BTreeMap<String, Vec<String>>,
}

impl UsageContext {
    /// Discovers context classes and their entity model from the resolver.
    /// Returns `None` when no context or no entity class is visible, which
    /// is the short-circuit that keeps analysis cheap outside the ORM's
    /// usage surface.
    pub fn build(resolver: &dyn SymbolResolver) -> Option<UsageContext> {
        let mut contexts = Vec::new();
        let mut entity_names: Vec<String> = Vec::new();

        for name in resolver.class_names() {
            if !derives_from(resolver, name, CONTEXT_MARKER) {
                continue;
            }
            let Some(class) = resolver.class(name) else {
                continue;
            };

            let mut sets = Vec::new();
            for (_, prop) in &class.properties {
                if prop.is_static {
                    continue;
                }
                let Some(entity) = prop.ty.as_ref().and_then(queryable_set_entity) else {
                    continue;
                };
                let entity = entity.to_string();
                if !entity_names.contains(&entity) {
                    entity_names.push(entity.clone());
                }
                sets.push(QueryableSet {
                    property: prop.name.clone(),
                    entity,
                });
            }

            // A context exposing no queryable set contributes nothing.
            if !sets.is_empty() {
                contexts.push(ContextInfo {
                    name: name.to_string(),
                    sets,
                });
            }
        }

        if contexts.is_empty() {
            return None;
        }

        let mut entities = BTreeMap::new();
        let mut property_owners: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entity_name in &entity_names {
            // A set can point at a type with no visible declaration; such
            // entities simply contribute no facts.
            let Some(class) = resolver.class(entity_name) else {
                continue;
            };
            let mut properties = BTreeMap::new();
            for (_, prop) in &class.properties {
                if prop.is_static {
                    continue;
                }
                properties.insert(
                    prop.name.clone(),
                    PropertyFact {
                        is_read_only: prop.is_read_only(),
                        is_unmapped: prop
                            .attributes
                            .iter()
                            .any(|a| is_unmapped_attribute(a)),
                        is_collection_navigation: prop.is_virtual
                            && prop
                                .ty
                                .as_ref()
                                .is_some_and(is_collection_navigation_shape),
                        declared_ty: prop.ty.clone(),
                    },
                );
                property_owners
                    .entry(prop.name.clone())
                    .or_default()
                    .push(entity_name.clone());
            }
            entities.insert(
                entity_name.clone(),
                EntityClass {
                    name: entity_name.clone(),
                    properties,
                },
            );
        }

        if entities.is_empty() {
            return None;
        }

        debug!(
            contexts = contexts.len(),
            entities = entities.len(),
            "entity model catalog built"
        );

        Some(UsageContext {
            contexts,
            entities,
            property_owners,
        })
    }

    pub fn contexts(&self) -> &[ContextInfo] {
        &self.contexts
    }

    pub fn is_context(&self, name: &str) -> bool {
        self.contexts.iter().any(|c| c.name == name)
    }

    pub fn context(&self, name: &str) -> Option<&ContextInfo> {
        self.contexts.iter().find(|c| c.name == name)
    }

    pub fn entity(&self, name: &str) -> Option<&EntityClass> {
        self.entities.get(name)
    }

    /// The entity classes declaring a property of the given name.
    pub fn property_owners(&self, name: &str) -> &[String] {
        self.property_owners
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// `DbSet<T>` / `IDbSet<T>` yields `T`'s simple name.
pub fn queryable_set_entity(ty: &TypeName) -> Option<&str> {
    if !QUERYABLE_SET_SHAPES.contains(&ty.simple_name()) {
        return None;
    }
    ty.single_arg().map(|arg| arg.simple_name())
}

/// `IQueryable<T>` yields `T`'s simple name.
pub fn sequence_entity(ty: &TypeName) -> Option<&str> {
    if ty.simple_name() != SEQUENCE_SHAPE {
        return None;
    }
    ty.single_arg().map(|arg| arg.simple_name())
}

fn is_collection_navigation_shape(ty: &TypeName) -> bool {
    // Exactly one recognized shape. Other relationship collection shapes
    // are a known narrowing.
    ty.simple_name() == COLLECTION_NAV_SHAPE && ty.args.len() == 1
}

fn is_unmapped_attribute(name: &str) -> bool {
    name.strip_suffix("Attribute").unwrap_or(name) == UNMAPPED_ATTRIBUTE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantics::SourceIndex;
    use reef_syntax::{parse_source, SourceModel};

    fn build_context(sources: &[&str]) -> Option<(Vec<SourceModel>, UsageContext)> {
        let models: Vec<SourceModel> = sources
            .iter()
            .map(|s| parse_source(s).expect("parse"))
            .collect();
        let pairs: Vec<(usize, &SourceModel)> =
            models.iter().enumerate().map(|(i, m)| (i, m)).collect();
        let index = SourceIndex::build(&pairs);
        let ctx = UsageContext::build(&index)?;
        Some((models, ctx))
    }

    const MODEL: &str = r#"
        using System.Collections.Generic;
        using System.Data.Entity;
        using System.ComponentModel.DataAnnotations.Schema;

        public class Sprocket
        {
            public int Id { get; set; }
        }

        public class Thing
        {
            public int Id { get; set; }
            public string Foo { get; set; }
            public string FooBar { get { return this.Foo; } }
            [NotMapped]
            public string Display { get; set; }
            public virtual ICollection<Sprocket> Sprockets { get; set; }
            public ICollection<Sprocket> Plain { get; set; }
        }

        public class AppContext : DbContext
        {
            public DbSet<Thing> Things { get; set; }
            public DbSet<Sprocket> Sprockets { get; set; }
        }
    "#;

    #[test]
    fn discovers_contexts_sets_and_entities() {
        let (_m, ctx) = build_context(&[MODEL]).expect("catalog");
        let app = ctx.context("AppContext").expect("context discovered");
        assert_eq!(app.set_entity("Things"), Some("Thing"));
        assert_eq!(app.set_entity("Sprockets"), Some("Sprocket"));
        assert!(ctx.entity("Thing").is_some());
        assert!(ctx.entity("Sprocket").is_some());
    }

    #[test]
    fn property_facts_are_derived() {
        let (_m, ctx) = build_context(&[MODEL]).expect("catalog");
        let thing = ctx.entity("Thing").unwrap();

        assert!(!thing.is_read_only("Foo"));
        assert!(thing.is_read_only("FooBar"));
        assert!(thing.is_unmapped("Display"));
        assert!(!thing.is_unmapped("Foo"));
        assert!(thing.is_collection_navigation("Sprockets"));
        // Not virtual, so not a navigation property.
        assert!(!thing.is_collection_navigation("Plain"));
    }

    #[test]
    fn property_owners_span_entities_only() {
        let (_m, ctx) = build_context(&[MODEL]).expect("catalog");
        assert_eq!(ctx.property_owners("Id"), &["Thing", "Sprocket"]);
        assert_eq!(ctx.property_owners("Sprockets"), &["Thing"]);
        assert!(ctx.property_owners("Missing").is_empty());
    }

    #[test]
    fn no_context_short_circuits() {
        assert!(build_context(&["public class Plain { }"]).is_none());
    }

    #[test]
    fn context_without_sets_contributes_nothing() {
        let src = r#"
            public class EmptyContext : DbContext
            {
                public int Counter { get; set; }
            }
        "#;
        assert!(build_context(&[src]).is_none());
    }
}
