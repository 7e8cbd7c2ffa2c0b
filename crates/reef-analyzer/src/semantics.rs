//! The semantic resolution seam.
//!
//! `SymbolResolver` is the narrow interface the analysis engine consumes;
//! `SourceIndex` is the implementation backed by parsed source models.
//! Every lookup is total: anything that cannot be resolved yields `None` or
//! an empty collection, never an error. Degrading to "unknown" here is the
//! contract that lets the engine keep analyzing sibling nodes.

use std::collections::{BTreeMap, HashSet};

use reef_syntax::{ClassDecl, MethodDecl, PropertyDecl, SourceModel};

/// One class, with partial declarations merged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassSymbol {
    pub name: String,
    /// Simple names of every base type and interface across all partial
    /// declarations.
    pub bases: Vec<String>,
    /// `(source index, declaration)` pairs. Later declarations of the same
    /// property name shadow earlier ones.
    pub properties: Vec<(usize, PropertyDecl)>,
    pub methods: Vec<(usize, MethodDecl)>,
}

impl ClassSymbol {
    pub fn property(&self, name: &str) -> Option<&PropertyDecl> {
        self.properties
            .iter()
            .rev()
            .map(|(_, p)| p)
            .find(|p| p.name == name)
    }
}

pub trait SymbolResolver {
    fn class(&self, name: &str) -> Option<&ClassSymbol>;

    /// All known class names, in a deterministic order.
    fn class_names(&self) -> Vec<&str>;

    /// Every method declaration with the given name, across all classes.
    fn methods_named(&self, name: &str) -> Vec<&MethodDecl>;
}

/// Bound on base-chain hops. Class hierarchies cannot cycle in the host
/// language, but unresolved or hand-built inputs can.
const MAX_BASE_CHAIN: usize = 32;

/// Whether `class_name` ultimately derives from a type whose simple name is
/// `marker`, walking the base chain iteratively with a seen set.
pub fn derives_from(resolver: &dyn SymbolResolver, class_name: &str, marker: &str) -> bool {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut frontier: Vec<&str> = match resolver.class(class_name) {
        Some(class) => class.bases.iter().map(String::as_str).collect(),
        None => return false,
    };

    let mut hops = 0usize;
    while let Some(base) = frontier.pop() {
        if base == marker {
            return true;
        }
        hops += 1;
        if hops > MAX_BASE_CHAIN || !seen.insert(base) {
            continue;
        }
        if let Some(class) = resolver.class(base) {
            frontier.extend(class.bases.iter().map(String::as_str));
        }
    }
    false
}

/// Symbol index over a set of parsed sources.
#[derive(Debug, Default)]
pub struct SourceIndex {
    classes: BTreeMap<String, ClassSymbol>,
}

impl SourceIndex {
    pub fn build(models: &[(usize, &SourceModel)]) -> SourceIndex {
        let mut classes: BTreeMap<String, ClassSymbol> = BTreeMap::new();
        for (source, model) in models {
            for class in &model.classes {
                merge_class(&mut classes, *source, class);
            }
        }
        SourceIndex { classes }
    }
}

fn merge_class(classes: &mut BTreeMap<String, ClassSymbol>, source: usize, decl: &ClassDecl) {
    let entry = classes
        .entry(decl.name.clone())
        .or_insert_with(|| ClassSymbol {
            name: decl.name.clone(),
            bases: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
        });

    for base in &decl.bases {
        let simple = base.simple_name().to_string();
        if !entry.bases.contains(&simple) {
            entry.bases.push(simple);
        }
    }
    for prop in &decl.properties {
        entry.properties.push((source, prop.clone()));
    }
    for method in &decl.methods {
        entry.methods.push((source, method.clone()));
    }
}

impl SymbolResolver for SourceIndex {
    fn class(&self, name: &str) -> Option<&ClassSymbol> {
        self.classes.get(name)
    }

    fn class_names(&self) -> Vec<&str> {
        self.classes.keys().map(String::as_str).collect()
    }

    fn methods_named(&self, name: &str) -> Vec<&MethodDecl> {
        self.classes
            .values()
            .flat_map(|c| c.methods.iter().map(|(_, m)| m))
            .filter(|m| m.name == name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reef_syntax::parse_source;

    fn index_of(sources: &[&str]) -> (Vec<SourceModel>, SourceIndex) {
        let models: Vec<SourceModel> = sources
            .iter()
            .map(|s| parse_source(s).expect("parse"))
            .collect();
        let pairs: Vec<(usize, &SourceModel)> =
            models.iter().enumerate().map(|(i, m)| (i, m)).collect();
        let index = SourceIndex::build(&pairs);
        (models, index)
    }

    #[test]
    fn partial_declarations_merge_into_one_symbol() {
        let (_models, index) = index_of(&[
            "public partial class Thing { public int Id { get; set; } }",
            "public partial class Thing : EntityBase { public string Name { get; set; } }",
        ]);

        let thing = index.class("Thing").expect("Thing indexed");
        assert!(thing.property("Id").is_some());
        assert!(thing.property("Name").is_some());
        assert_eq!(thing.bases, vec!["EntityBase".to_string()]);
    }

    #[test]
    fn derives_from_walks_multi_hop_chains() {
        let (_models, index) = index_of(&[r#"
            public class BaseContext : DbContext { }
            public class AppContext : BaseContext { }
            public class Unrelated { }
        "#]);

        assert!(derives_from(&index, "AppContext", "DbContext"));
        assert!(derives_from(&index, "BaseContext", "DbContext"));
        assert!(!derives_from(&index, "Unrelated", "DbContext"));
        assert!(!derives_from(&index, "Missing", "DbContext"));
    }

    #[test]
    fn derives_from_survives_cyclic_inputs() {
        // Not legal C#, but the walk must stay bounded anyway.
        let (_models, index) = index_of(&[r#"
            public class A : B { }
            public class B : A { }
        "#]);
        assert!(!derives_from(&index, "A", "DbContext"));
    }

    #[test]
    fn methods_named_spans_all_classes() {
        let (_models, index) = index_of(&[r#"
            public class Repo {
                public int Load() { return 1; }
            }
            public class Other {
                public int Load() { return 2; }
            }
        "#]);
        assert_eq!(index.methods_named("Load").len(), 2);
        assert!(index.methods_named("Missing").is_empty());
    }
}
