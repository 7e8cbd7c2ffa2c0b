use reef_types::Span;
use tree_sitter::{Node, Parser};

use crate::ast::{Expr, Lambda, LocalDecl, Param, QueryExpr};
use crate::types::TypeName;
use crate::ParseError;

/// Everything extracted from one source file.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SourceModel {
    pub classes: Vec<ClassDecl>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: String,
    pub span: Span,
    pub name_span: Span,
    pub is_partial: bool,
    pub bases: Vec<TypeName>,
    pub properties: Vec<PropertyDecl>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDecl {
    pub name: String,
    pub span: Span,
    pub name_span: Span,
    pub ty: Option<TypeName>,
    pub attributes: Vec<String>,
    pub is_virtual: bool,
    pub is_static: bool,
    pub has_setter: bool,
    pub is_expression_bodied: bool,
}

impl PropertyDecl {
    /// A property with no set/init accessor is computed in application code
    /// and has no backing column.
    pub fn is_read_only(&self) -> bool {
        self.is_expression_bodied || !self.has_setter
    }
}

/// A method (or constructor) summary: enough for declaring-assignment and
/// return-path tracing, plus the fully lowered body for trigger discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    pub span: Span,
    pub is_static: bool,
    pub attributes: Vec<String>,
    pub return_ty: Option<TypeName>,
    /// Local declarations of the method body itself. Bodies of nested
    /// lambdas and local functions are excluded so tracing sees the same
    /// scope the enclosing method does.
    pub locals: Vec<LocalDecl>,
    /// Expressions of the method's own `return` statements, same exclusion.
    pub returns: Vec<Expr>,
    pub body: Option<Expr>,
}

/// Parses one C# source file into a `SourceModel`.
pub fn parse_source(source: &str) -> Result<SourceModel, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(tree_sitter_c_sharp::language())
        .map_err(|_| ParseError::Language)?;
    let tree = parser.parse(source, None).ok_or(ParseError::Tree)?;

    let mut classes = Vec::new();
    visit_nodes(tree.root_node(), &mut |node| {
        if node.kind() == "class_declaration" {
            if let Some(class) = parse_class(node, source) {
                classes.push(class);
            }
        }
    });

    Ok(SourceModel { classes })
}

fn parse_class(node: Node<'_>, source: &str) -> Option<ClassDecl> {
    let name_node = node
        .child_by_field_name("name")
        .or_else(|| find_named_child(node, "identifier"))?;
    let name = node_text(source, name_node).to_string();

    let modifiers = modifier_texts(node, source);
    let is_partial = modifiers.iter().any(|m| m == "partial");

    let bases = node
        .child_by_field_name("bases")
        .or_else(|| find_named_child(node, "base_list"))
        .map(|bases| {
            named_children(bases)
                .into_iter()
                .filter(|n| is_type_kind(n.kind()))
                .filter_map(|n| TypeName::parse(node_text(source, n)))
                .collect()
        })
        .unwrap_or_default();

    let body = node
        .child_by_field_name("body")
        .or_else(|| find_named_child(node, "declaration_list"))?;

    let mut properties = Vec::new();
    let mut methods = Vec::new();
    for child in named_children(body) {
        match child.kind() {
            "property_declaration" => {
                if let Some(prop) = parse_property(child, source) {
                    properties.push(prop);
                }
            }
            "method_declaration" | "constructor_declaration" => {
                if let Some(method) = parse_method(child, source) {
                    methods.push(method);
                }
            }
            _ => {}
        }
    }

    Some(ClassDecl {
        name,
        span: span_of(node),
        name_span: span_of(name_node),
        is_partial,
        bases,
        properties,
        methods,
    })
}

fn parse_property(node: Node<'_>, source: &str) -> Option<PropertyDecl> {
    let name_node = node
        .child_by_field_name("name")
        .or_else(|| last_named_child_of_kind(node, "identifier"))?;
    let name = node_text(source, name_node).to_string();

    let modifiers = modifier_texts(node, source);
    let is_virtual = modifiers.iter().any(|m| m == "virtual" || m == "override");
    let is_static = modifiers.iter().any(|m| m == "static");

    let ty = node
        .child_by_field_name("type")
        .or_else(|| first_type_child(node, name_node))
        .and_then(|n| TypeName::parse(node_text(source, n)));

    let mut has_setter = false;
    if let Some(accessors) = find_named_child(node, "accessor_list") {
        for accessor in named_children(accessors) {
            if accessor.kind() != "accessor_declaration" {
                continue;
            }
            if accessor_keyword(accessor, &["set", "init"]) {
                has_setter = true;
            }
        }
    }
    let is_expression_bodied = find_named_child(node, "arrow_expression_clause").is_some();

    Some(PropertyDecl {
        name,
        span: span_of(node),
        name_span: span_of(name_node),
        ty,
        attributes: attribute_names(node, source),
        is_virtual,
        is_static,
        has_setter,
        is_expression_bodied,
    })
}

fn parse_method(node: Node<'_>, source: &str) -> Option<MethodDecl> {
    let name_node = node
        .child_by_field_name("name")
        .or_else(|| find_named_child(node, "identifier"))?;
    let name = node_text(source, name_node).to_string();

    let modifiers = modifier_texts(node, source);
    let is_static = modifiers.iter().any(|m| m == "static");

    let return_ty = node
        .child_by_field_name("returns")
        .or_else(|| node.child_by_field_name("type"))
        .or_else(|| first_type_child(node, name_node))
        .and_then(|n| TypeName::parse(node_text(source, n)));

    let body_node = node
        .child_by_field_name("body")
        .or_else(|| find_named_child(node, "block"))
        .or_else(|| find_named_child(node, "arrow_expression_clause"));

    let mut locals = Vec::new();
    let mut returns = Vec::new();
    if let Some(body) = body_node {
        visit_own_scope(body, &mut |stmt| match stmt.kind() {
            "local_declaration_statement" => {
                locals.extend(parse_local_declaration(stmt, source));
            }
            "return_statement" => {
                if let Some(expr) = named_children(stmt).into_iter().last() {
                    returns.push(lower_expr(expr, source));
                }
            }
            _ => {}
        });
    }

    Some(MethodDecl {
        name,
        span: span_of(node),
        is_static,
        attributes: attribute_names(node, source),
        return_ty,
        locals,
        returns,
        body: body_node.map(|b| lower_expr(b, source)),
    })
}

fn parse_local_declaration(stmt: Node<'_>, source: &str) -> Vec<LocalDecl> {
    let decl = find_named_child(stmt, "variable_declaration").unwrap_or(stmt);

    let declared_ty = decl
        .child_by_field_name("type")
        .or_else(|| {
            named_children(decl)
                .into_iter()
                .find(|n| is_type_kind(n.kind()))
        })
        .and_then(|n| TypeName::parse(node_text(source, n)))
        .filter(|ty| !ty.is_inferred());

    let mut out = Vec::new();
    for declarator in named_children(decl) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let name_node = declarator
            .child_by_field_name("name")
            .or_else(|| find_named_child(declarator, "identifier"));
        let Some(name_node) = name_node else {
            continue;
        };

        let init = find_named_child(declarator, "equals_value_clause")
            .and_then(|eq| named_children(eq).into_iter().last())
            .or_else(|| {
                // Some grammar revisions inline the initializer into the
                // declarator instead of wrapping it.
                named_children(declarator)
                    .into_iter()
                    .filter(|n| n.id() != name_node.id())
                    .last()
            })
            .map(|n| lower_expr(n, source));

        out.push(LocalDecl {
            name: node_text(source, name_node).to_string(),
            declared_ty: declared_ty.clone(),
            init,
            span: span_of(declarator),
        });
    }
    out
}

/// Lowers any expression or statement node into the IR.
fn lower_expr(node: Node<'_>, source: &str) -> Expr {
    let span = span_of(node);
    match node.kind() {
        "identifier" => Expr::Identifier {
            name: node_text(source, node).to_string(),
            span,
        },
        "member_access_expression" => {
            let receiver = node
                .child_by_field_name("expression")
                .or_else(|| named_children(node).into_iter().next());
            let name_node = node
                .child_by_field_name("name")
                .or_else(|| named_children(node).into_iter().last());
            match (receiver, name_node) {
                (Some(receiver), Some(name_node)) => Expr::MemberAccess {
                    receiver: Box::new(lower_expr(receiver, source)),
                    name: member_name_text(name_node, source),
                    name_span: span_of(name_node),
                    span,
                },
                _ => lower_other(node, source),
            }
        }
        "invocation_expression" => {
            let callee = node
                .child_by_field_name("function")
                .or_else(|| named_children(node).into_iter().next());
            let Some(callee) = callee else {
                return lower_other(node, source);
            };
            let args = node
                .child_by_field_name("arguments")
                .or_else(|| find_named_child(node, "argument_list"))
                .map(|list| {
                    named_children(list)
                        .into_iter()
                        .map(|arg| lower_argument(arg, source))
                        .collect()
                })
                .unwrap_or_default();
            Expr::Invocation {
                callee: Box::new(lower_expr(callee, source)),
                args,
                span,
            }
        }
        "lambda_expression" => lower_lambda(node, source),
        "interpolated_string_expression" => {
            let mut children = Vec::new();
            for child in named_children(node) {
                if child.kind() == "interpolation" {
                    if let Some(expr) = named_children(child).into_iter().next() {
                        children.push(lower_expr(expr, source));
                    }
                }
            }
            Expr::InterpolatedString { children, span }
        }
        "object_creation_expression" => {
            let ty_node = node.child_by_field_name("type").or_else(|| {
                named_children(node)
                    .into_iter()
                    .find(|n| is_type_kind(n.kind()))
            });
            let ty = ty_node.and_then(|n| TypeName::parse(node_text(source, n)));
            let (Some(ty_node), Some(ty)) = (ty_node, ty) else {
                return lower_other(node, source);
            };
            let args = node
                .child_by_field_name("arguments")
                .or_else(|| find_named_child(node, "argument_list"))
                .map(|list| {
                    named_children(list)
                        .into_iter()
                        .map(|arg| lower_argument(arg, source))
                        .collect()
                })
                .unwrap_or_default();
            let initializer = find_named_child(node, "initializer_expression")
                .map(|init| {
                    named_children(init)
                        .into_iter()
                        .map(|n| lower_expr(n, source))
                        .collect()
                })
                .unwrap_or_default();
            Expr::ObjectCreation {
                ty,
                ty_span: span_of(ty_node),
                args,
                initializer,
                span,
            }
        }
        "query_expression" => lower_query(node, source),
        "parenthesized_expression" | "cast_expression" | "expression_statement" => {
            match named_children(node)
                .into_iter()
                .filter(|n| !is_type_kind(n.kind()))
                .last()
            {
                Some(inner) => lower_expr(inner, source),
                None => lower_other(node, source),
            }
        }
        _ => lower_other(node, source),
    }
}

fn lower_other(node: Node<'_>, source: &str) -> Expr {
    Expr::Other {
        children: named_children(node)
            .into_iter()
            .map(|n| lower_expr(n, source))
            .collect(),
        span: span_of(node),
    }
}

fn lower_argument(node: Node<'_>, source: &str) -> Expr {
    if node.kind() != "argument" {
        return lower_expr(node, source);
    }
    match named_children(node).into_iter().last() {
        Some(inner) => lower_expr(inner, source),
        None => Expr::Other {
            children: Vec::new(),
            span: span_of(node),
        },
    }
}

fn lower_lambda(node: Node<'_>, source: &str) -> Expr {
    // Parameters sit before the `=>` token, the body after it. Partition by
    // byte position so a bare-identifier parameter is never confused with a
    // bare-identifier body.
    let arrow_start = all_children(node)
        .into_iter()
        .find(|n| n.kind() == "=>")
        .map(|n| n.start_byte());

    let mut params = Vec::new();
    let mut body_node = None;
    for child in named_children(node) {
        let before_arrow = match arrow_start {
            Some(arrow) => child.start_byte() < arrow,
            None => false,
        };
        if before_arrow {
            match child.kind() {
                "parameter_list" => {
                    for p in named_children(child) {
                        if p.kind() == "parameter" {
                            if let Some(param) = parse_param(p, source) {
                                params.push(param);
                            }
                        }
                    }
                }
                "identifier" => params.push(Param {
                    name: node_text(source, child).to_string(),
                    ty: None,
                    span: span_of(child),
                }),
                _ => {}
            }
        } else {
            body_node = Some(child);
        }
    }

    let body = match body_node {
        Some(body) => lower_expr(body, source),
        None => Expr::Other {
            children: Vec::new(),
            span: span_of(node),
        },
    };

    Expr::Lambda(Lambda {
        params,
        body: Box::new(body),
        span: span_of(node),
    })
}

fn parse_param(node: Node<'_>, source: &str) -> Option<Param> {
    let name_node = node
        .child_by_field_name("name")
        .or_else(|| last_named_child_of_kind(node, "identifier"))?;
    let ty = node
        .child_by_field_name("type")
        .or_else(|| first_type_child(node, name_node))
        .and_then(|n| TypeName::parse(node_text(source, n)));
    Some(Param {
        name: node_text(source, name_node).to_string(),
        ty,
        span: span_of(name_node),
    })
}

fn lower_query(node: Node<'_>, source: &str) -> Expr {
    let span = span_of(node);
    let Some(from) = find_named_child(node, "from_clause") else {
        return lower_other(node, source);
    };

    let from_children = named_children(from);
    let source_node = from
        .child_by_field_name("expression")
        .or_else(|| from_children.last().copied());
    let range_node = from.child_by_field_name("name").or_else(|| {
        // `from [Type] x in expr`: the range variable is the identifier
        // immediately preceding the source expression.
        let source_id = source_node.map(|n| n.id());
        from_children
            .iter()
            .filter(|n| Some(n.id()) != source_id && n.kind() == "identifier")
            .last()
            .copied()
    });
    let (Some(source_node), Some(range_node)) = (source_node, range_node) else {
        return lower_other(node, source);
    };

    let body = named_children(node)
        .into_iter()
        .filter(|n| n.id() != from.id())
        .map(|n| lower_expr(n, source))
        .collect();

    Expr::Query(Box::new(QueryExpr {
        range_var: node_text(source, range_node).to_string(),
        range_var_span: span_of(range_node),
        source: Box::new(lower_expr(source_node, source)),
        body,
        span,
    }))
}

// --- node helpers -----------------------------------------------------------

fn span_of(node: Node<'_>) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

fn node_text<'a>(source: &'a str, node: Node<'_>) -> &'a str {
    source.get(node.byte_range()).unwrap_or_default()
}

fn visit_nodes<'a, F: FnMut(Node<'a>)>(node: Node<'a>, f: &mut F) {
    f(node);
    if node.child_count() == 0 {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit_nodes(child, f);
    }
}

/// Walks a method body without descending into nested function scopes, so
/// locals and returns belong to the method itself.
fn visit_own_scope<'a, F: FnMut(Node<'a>)>(node: Node<'a>, f: &mut F) {
    f(node);
    if matches!(
        node.kind(),
        "lambda_expression" | "anonymous_method_expression" | "local_function_statement"
    ) {
        return;
    }
    if node.child_count() == 0 {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(
            child.kind(),
            "lambda_expression" | "anonymous_method_expression" | "local_function_statement"
        ) {
            continue;
        }
        visit_own_scope(child, f);
    }
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

fn all_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn find_named_child<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    named_children(node).into_iter().find(|n| n.kind() == kind)
}

fn last_named_child_of_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    named_children(node)
        .into_iter()
        .filter(|n| n.kind() == kind)
        .last()
}

fn first_type_child<'a>(node: Node<'a>, name_node: Node<'a>) -> Option<Node<'a>> {
    named_children(node)
        .into_iter()
        .filter(|n| n.id() != name_node.id())
        .filter(|n| n.start_byte() < name_node.start_byte())
        .find(|n| is_type_kind(n.kind()))
}

fn is_type_kind(kind: &str) -> bool {
    matches!(
        kind,
        "identifier"
            | "qualified_name"
            | "generic_name"
            | "predefined_type"
            | "nullable_type"
            | "array_type"
            | "implicit_type"
    )
}

fn modifier_texts(node: Node<'_>, source: &str) -> Vec<String> {
    named_children(node)
        .into_iter()
        .filter(|n| n.kind() == "modifier")
        .map(|n| node_text(source, n).to_string())
        .collect()
}

/// True when an accessor declaration carries one of the given keywords as a
/// direct token (body text is never inspected).
fn accessor_keyword(accessor: Node<'_>, keywords: &[&str]) -> bool {
    all_children(accessor)
        .into_iter()
        .any(|n| keywords.contains(&n.kind()))
}

fn attribute_names(node: Node<'_>, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    for list in named_children(node) {
        if list.kind() != "attribute_list" {
            continue;
        }
        for attr in named_children(list) {
            if attr.kind() != "attribute" {
                continue;
            }
            let text = node_text(source, attr);
            let name = text.split('(').next().unwrap_or(text).trim();
            let name = name.rsplit('.').next().unwrap_or(name).trim();
            if !name.is_empty() {
                out.push(name.to_string());
            }
        }
    }
    out
}

fn member_name_text(name_node: Node<'_>, source: &str) -> String {
    if name_node.kind() == "generic_name" {
        if let Some(ident) = find_named_child(name_node, "identifier") {
            return node_text(source, ident).to_string();
        }
    }
    node_text(source, name_node).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MODEL: &str = r#"
        using System.Collections.Generic;
        using System.Data.Entity;

        public class Thing
        {
            public int Id { get; set; }
            public string Foo { get; set; }
            public string Bar { get; set; }
            public string FooBar { get { return this.Foo + " " + this.Bar; } }
            public string FooBarExpr => this.Foo + " " + this.Bar;
            public virtual ICollection<Sprocket> Sprockets { get; set; }
        }

        public class AppContext : DbContext
        {
            public DbSet<Thing> Things { get; set; }
        }
    "#;

    #[test]
    fn extracts_classes_and_properties() {
        let model = parse_source(MODEL).expect("parse");
        let names: Vec<_> = model.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Thing", "AppContext"]);

        let thing = &model.classes[0];
        let foo = thing.properties.iter().find(|p| p.name == "Foo").unwrap();
        assert!(foo.has_setter);
        assert!(!foo.is_read_only());

        let foobar = thing.properties.iter().find(|p| p.name == "FooBar").unwrap();
        assert!(!foobar.has_setter);
        assert!(foobar.is_read_only());

        let arrow = thing
            .properties
            .iter()
            .find(|p| p.name == "FooBarExpr")
            .unwrap();
        assert!(arrow.is_expression_bodied);
        assert!(arrow.is_read_only());

        let sprockets = thing
            .properties
            .iter()
            .find(|p| p.name == "Sprockets")
            .unwrap();
        assert!(sprockets.is_virtual);
        let ty = sprockets.ty.as_ref().unwrap();
        assert_eq!(ty.simple_name(), "ICollection");
        assert_eq!(ty.single_arg().unwrap().simple_name(), "Sprocket");
    }

    #[test]
    fn context_base_and_set_shape_are_visible() {
        let model = parse_source(MODEL).expect("parse");
        let ctx = &model.classes[1];
        assert_eq!(ctx.bases.len(), 1);
        assert_eq!(ctx.bases[0].simple_name(), "DbContext");

        let things = ctx.properties.iter().find(|p| p.name == "Things").unwrap();
        let ty = things.ty.as_ref().unwrap();
        assert_eq!(ty.simple_name(), "DbSet");
        assert_eq!(ty.single_arg().unwrap().simple_name(), "Thing");
    }

    #[test]
    fn attribute_names_are_unqualified() {
        let src = r#"
            public class Widget
            {
                [NotMapped]
                public string Display { get; set; }
                [System.ComponentModel.DataAnnotations.Schema.NotMapped]
                public string Other { get; set; }
            }
        "#;
        let model = parse_source(src).expect("parse");
        let widget = &model.classes[0];
        for name in ["Display", "Other"] {
            let prop = widget.properties.iter().find(|p| p.name == name).unwrap();
            assert_eq!(prop.attributes, vec!["NotMapped".to_string()], "{name}");
        }
    }

    #[test]
    fn method_locals_and_returns_are_collected() {
        let src = r#"
            public class Repo
            {
                public IQueryable<Thing> GetThings()
                {
                    var context = new AppContext();
                    IQueryable<Thing> query = context.Things;
                    return query;
                }
            }
        "#;
        let model = parse_source(src).expect("parse");
        let method = &model.classes[0].methods[0];
        assert_eq!(method.name, "GetThings");
        assert_eq!(method.return_ty.as_ref().unwrap().simple_name(), "IQueryable");

        let names: Vec<_> = method.locals.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["context", "query"]);

        assert!(method.locals[0].declared_ty.is_none(), "var infers");
        assert!(matches!(
            method.locals[0].init,
            Some(Expr::ObjectCreation { .. })
        ));
        assert_eq!(
            method.locals[1].declared_ty.as_ref().unwrap().simple_name(),
            "IQueryable"
        );

        assert_eq!(method.returns.len(), 1);
        assert_eq!(method.returns[0].as_identifier(), Some("query"));
    }

    #[test]
    fn operator_call_with_lambda_argument_lowers_shape() {
        let src = r#"
            public class C
            {
                public void M()
                {
                    var items = context.Things.Where(t => t.FooBar == "x");
                }
            }
        "#;
        let model = parse_source(src).expect("parse");
        let body = model.classes[0].methods[0].body.as_ref().unwrap();

        let mut found = false;
        body.walk(&mut |expr| {
            if let Expr::Invocation { callee, args, .. } = expr {
                if let Expr::MemberAccess { receiver, name, .. } = callee.as_ref() {
                    if name == "Where" {
                        assert!(matches!(args.as_slice(), [Expr::Lambda(_)]));
                        if let Expr::MemberAccess { receiver, name, .. } = receiver.as_ref() {
                            assert_eq!(name, "Things");
                            assert_eq!(receiver.as_identifier(), Some("context"));
                            found = true;
                        }
                    }
                }
            }
        });
        assert!(found, "Where invocation not lowered as expected");
    }

    #[test]
    fn lambda_params_are_separated_from_body() {
        let src = r#"
            public class C
            {
                public void M()
                {
                    var f = context.Things.Select(t => t);
                }
            }
        "#;
        let model = parse_source(src).expect("parse");
        let body = model.classes[0].methods[0].body.as_ref().unwrap();

        let mut seen = None;
        body.walk(&mut |expr| {
            if let Expr::Lambda(lambda) = expr {
                seen = Some(lambda.clone());
            }
        });
        let lambda = seen.expect("lambda lowered");
        assert_eq!(lambda.params.len(), 1);
        assert_eq!(lambda.params[0].name, "t");
        assert_eq!(lambda.body.as_identifier(), Some("t"));
    }

    #[test]
    fn interpolated_strings_survive_lowering() {
        let src = r#"
            public class C
            {
                public void M()
                {
                    var items = context.Things.Where(t => t.Foo == $"{t.Bar} x");
                }
            }
        "#;
        let model = parse_source(src).expect("parse");
        let body = model.classes[0].methods[0].body.as_ref().unwrap();

        let mut count = 0;
        body.walk(&mut |expr| {
            if matches!(expr, Expr::InterpolatedString { .. }) {
                count += 1;
            }
        });
        assert_eq!(count, 1);
    }

    #[test]
    fn query_expression_lowers_range_var_and_source() {
        let src = r#"
            public class C
            {
                public void M()
                {
                    var items = from t in context.Things where t.Foo == "x" select t;
                }
            }
        "#;
        let model = parse_source(src).expect("parse");
        let body = model.classes[0].methods[0].body.as_ref().unwrap();

        let mut query = None;
        body.walk(&mut |expr| {
            if let Expr::Query(q) = expr {
                query = Some(q.clone());
            }
        });
        let query = query.expect("query lowered");
        assert_eq!(query.range_var, "t");
        assert!(matches!(*query.source, Expr::MemberAccess { .. }));
        assert!(!query.body.is_empty());
    }

    #[test]
    fn partial_modifier_is_detected() {
        let src = r#"
            public partial class Thing
            {
                public int Id { get; set; }
            }
        "#;
        let model = parse_source(src).expect("parse");
        assert!(model.classes[0].is_partial);
    }
}
