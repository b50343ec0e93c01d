//! Declaration front end over the tree-sitter TypeScript grammar.
//!
//! Top-level `interface`, `type` and `enum` declarations (bare, exported or
//! `declare`d) are lowered into [`Declaration`]s; every other statement is
//! ignored. A declaration whose subtree holds a syntax error, or whose types
//! nest deeper than [`MAX_NESTING`], is reported as a [`Diagnostic`] and
//! skipped.
use std::fmt;

use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_core::Node;
use ast_grep_language::{LanguageExt, SupportLang};

// ————————————————————————————————————————————————————————————————————————————
// SYNTAX
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug, PartialEq)]
pub enum TypeExpr {
    /// `string`, `number`, `boolean`, `any`, `null`, `this`, ...
    Keyword(String),
    StrLit(String),
    /// Normalized numeric text (`0x10` → `16`).
    NumLit(String),
    BoolLit(bool),
    Ref { name: String, args: Vec<TypeExpr> },
    Array(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
    Intersection(Vec<TypeExpr>),
    Object(Vec<PropertySig>),
    Tuple(Vec<TypeExpr>),
    Function { params: Vec<Param>, ret: Box<TypeExpr> },
    /// Anything structurally irrelevant (`keyof T`, mapped, conditional,
    /// template literal types), kept as display text.
    Opaque(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertySig {
    pub name: String,
    pub optional: bool,
    pub ty: TypeExpr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub optional: bool,
    pub rest: bool,
    pub ty: Option<TypeExpr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AliasDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub ty: TypeExpr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub extends: Vec<TypeExpr>,
    pub members: Vec<PropertySig>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<EnumMember>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumMember {
    pub name: String,
    /// Literal initializer, if one was written.
    pub value: Option<String>,
}

/// A named declaration, tagged by kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Declaration {
    Alias(AliasDecl),
    Interface(InterfaceDecl),
    Enum(EnumDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Alias(x) => &x.name,
            Declaration::Interface(x) => &x.name,
            Declaration::Enum(x) => &x.name,
        }
    }
    pub fn type_params(&self) -> &[String] {
        match self {
            Declaration::Alias(x) => &x.type_params,
            Declaration::Interface(x) => &x.type_params,
            Declaration::Enum(_) => &[],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub line: u32,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Deepest type-expression nesting lowered before a declaration is rejected.
pub const MAX_NESTING: usize = 64;

// ————————————————————————————————————————————————————————————————————————————
// DISPLAY
// ————————————————————————————————————————————————————————————————————————————

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Keyword(k) => f.write_str(k),
            TypeExpr::StrLit(s) => write!(f, "{s:?}"),
            TypeExpr::NumLit(n) => f.write_str(n),
            TypeExpr::BoolLit(b) => write!(f, "{b}"),
            TypeExpr::Ref { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    write_joined(f, args, ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeExpr::Array(elem) => match **elem {
                TypeExpr::Union(_) | TypeExpr::Intersection(_) | TypeExpr::Function { .. } => {
                    write!(f, "({elem})[]")
                }
                _ => write!(f, "{elem}[]"),
            },
            TypeExpr::Union(arms) => write_joined(f, arms, " | "),
            TypeExpr::Intersection(arms) => write_joined(f, arms, " & "),
            TypeExpr::Object(props) => {
                if props.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for p in props {
                    let q = if p.optional { "?" } else { "" };
                    write!(f, "{}{q}: {}; ", p.name, p.ty)?;
                }
                f.write_str("}")
            }
            TypeExpr::Tuple(elems) => {
                f.write_str("[")?;
                write_joined(f, elems, ", ")?;
                f.write_str("]")
            }
            TypeExpr::Function { params, ret } => {
                f.write_str("(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if p.rest {
                        f.write_str("...")?;
                    }
                    f.write_str(&p.name)?;
                    if p.optional {
                        f.write_str("?")?;
                    }
                    match &p.ty {
                        Some(ty) => write!(f, ": {ty}")?,
                        None => f.write_str(": any")?,
                    }
                }
                write!(f, ") => {ret}")
            }
            TypeExpr::Opaque(text) => f.write_str(text),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[TypeExpr], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Canonical text for a numeric literal, the way it would print at runtime.
pub fn normalize_number(raw: &str) -> String {
    let cleaned = raw.replace('_', "");
    let lower = cleaned.to_ascii_lowercase();
    let radix = |prefix: &str, radix: u32| {
        lower
            .strip_prefix(prefix)
            .and_then(|digits| i64::from_str_radix(digits, radix).ok())
    };
    if let Some(n) = radix("0x", 16).or_else(|| radix("0o", 8)).or_else(|| radix("0b", 2)) {
        return n.to_string();
    }
    let lower = lower.trim_end_matches('n');
    match lower.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 => (v as i64).to_string(),
        Ok(v) => v.to_string(),
        Err(_) => cleaned,
    }
}


// ————————————————————————————————————————————————————————————————————————————
// FRONT END
// ————————————————————————————————————————————————————————————————————————————

type TsNode<'r> = Node<'r, StrDoc<SupportLang>>;
type Lowered<T> = Result<T, Diagnostic>;

/// Grammar for a file path; `.tsx` gets the JSX-aware dialect.
pub fn language_for(path: &std::path::Path) -> SupportLang {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("tsx") => SupportLang::Tsx,
        _ => SupportLang::TypeScript,
    }
}

/// Lower every top-level declaration of a file.
pub fn parse_declarations(src: &str, lang: SupportLang) -> (Vec<Declaration>, Vec<Diagnostic>) {
    let grep = lang.ast_grep(src);
    let root = grep.root();
    let mut decls = Vec::new();
    let mut diagnostics = Vec::new();
    for stmt in named(&root) {
        if stmt.kind().as_ref() == "ERROR" {
            diagnostics.push(diagnostic(&stmt, "unparseable statement"));
            continue;
        }
        for node in declaration_nodes(&stmt) {
            match declaration(&node) {
                Ok(Some(decl)) => decls.push(decl),
                Ok(None) => {}
                Err(diag) => diagnostics.push(diag),
            }
        }
    }
    (decls, diagnostics)
}

/// Declarations held by one statement, looking through `export` and `declare`.
fn declaration_nodes<'r>(stmt: &TsNode<'r>) -> Vec<TsNode<'r>> {
    match stmt.kind().as_ref() {
        "interface_declaration" | "type_alias_declaration" | "enum_declaration" => vec![stmt.clone()],
        "export_statement" | "ambient_declaration" => {
            named(stmt).iter().flat_map(|child| declaration_nodes(child)).collect()
        }
        _ => Vec::new(),
    }
}

fn declaration(node: &TsNode<'_>) -> Lowered<Option<Declaration>> {
    if let Some(bad) = first_syntax_error(node) {
        let name = node.field("name").map_or_else(|| "?".to_string(), |n| n.text().to_string());
        return Err(diagnostic(&bad, format!("syntax error in declaration of `{name}`")));
    }
    let decl = match node.kind().as_ref() {
        "interface_declaration" => Declaration::Interface(interface(node)?),
        "type_alias_declaration" => Declaration::Alias(alias(node)?),
        "enum_declaration" => Declaration::Enum(enumeration(node)?),
        _ => return Ok(None),
    };
    Ok(Some(decl))
}

// —— helpers ——

fn named<'r>(node: &TsNode<'r>) -> Vec<TsNode<'r>> {
    node.children()
        .filter(|child| child.is_named() && child.kind().as_ref() != "comment")
        .collect()
}

fn first_named<'r>(node: &TsNode<'r>) -> Lowered<TsNode<'r>> {
    named(node)
        .into_iter()
        .next()
        .ok_or_else(|| diagnostic(node, format!("empty `{}`", node.kind())))
}

fn has_token(node: &TsNode<'_>, token: &str) -> bool {
    node.children().any(|child| !child.is_named() && child.kind().as_ref() == token)
}

fn diagnostic(node: &TsNode<'_>, message: impl Into<String>) -> Diagnostic {
    Diagnostic { line: node.start_pos().line() as u32 + 1, message: message.into() }
}

/// An `ERROR` node or a zero-width (missing) named node anywhere below `node`.
fn first_syntax_error<'r>(node: &TsNode<'r>) -> Option<TsNode<'r>> {
    let mut stack = vec![node.clone()];
    while let Some(current) = stack.pop() {
        if current.kind().as_ref() == "ERROR" || (current.is_named() && current.range().is_empty()) {
            return Some(current);
        }
        let mut children: Vec<_> = current.children().collect();
        children.reverse();
        stack.extend(children);
    }
    None
}

fn field_text(node: &TsNode<'_>, field: &str) -> Lowered<String> {
    node.field(field)
        .map(|n| n.text().to_string())
        .ok_or_else(|| diagnostic(node, format!("`{}` without a {field}", node.kind())))
}

fn type_params(node: &TsNode<'_>) -> Vec<String> {
    node.field("type_parameters")
        .map(|params| {
            named(&params)
                .iter()
                .filter_map(|param| param.field("name").map(|n| n.text().to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Unquote a string literal, resolving escapes.
fn unquote(raw: &str) -> String {
    let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or("");
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some(kind @ ('u' | 'x')) => {
                let hex: String = if kind == 'x' {
                    chars.by_ref().take(2).collect()
                } else if chars.clone().next() == Some('{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                if let Some(ch) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    out.push(ch);
                }
            }
            // line continuation
            Some('\n') => {}
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Property or enum key; `None` for computed keys other than string literals.
fn property_key(node: &TsNode<'_>) -> Option<String> {
    match node.kind().as_ref() {
        "string" => Some(unquote(&node.text())),
        "number" => Some(normalize_number(&node.text())),
        "computed_property_name" => {
            let inner = named(node).into_iter().next()?;
            (inner.kind().as_ref() == "string").then(|| unquote(&inner.text()))
        }
        _ => Some(node.text().to_string()),
    }
}

fn signed_number(node: &TsNode<'_>) -> Option<String> {
    let sign = node.field("operator").map(|op| op.text().to_string())?;
    let argument = node.field("argument").filter(|arg| arg.kind().as_ref() == "number")?;
    let digits = normalize_number(&argument.text());
    match sign.as_str() {
        "-" => Some(format!("-{digits}")),
        "+" => Some(digits),
        _ => None,
    }
}

// —— declarations ——

fn interface(node: &TsNode<'_>) -> Lowered<InterfaceDecl> {
    let name = field_text(node, "name")?;
    let type_params = type_params(node);
    let mut extends = Vec::new();
    for clause in named(node).iter().filter(|c| c.kind().as_ref() == "extends_type_clause") {
        for ty in named(clause) {
            extends.push(lower(&ty, 0)?);
        }
    }
    let body = node.field("body").or_else(|| {
        named(node)
            .into_iter()
            .find(|c| matches!(c.kind().as_ref(), "interface_body" | "object_type"))
    });
    let members = match body {
        Some(body) => members(&body, 0)?,
        None => Vec::new(),
    };
    Ok(InterfaceDecl { name, type_params, extends, members })
}

fn alias(node: &TsNode<'_>) -> Lowered<AliasDecl> {
    let name = field_text(node, "name")?;
    let type_params = type_params(node);
    let value = node
        .field("value")
        .ok_or_else(|| diagnostic(node, format!("type alias `{name}` without a value")))?;
    let ty = lower(&value, 0)?;
    Ok(AliasDecl { name, type_params, ty })
}

fn enumeration(node: &TsNode<'_>) -> Lowered<EnumDecl> {
    let name = field_text(node, "name")?;
    let mut members = Vec::new();
    let Some(body) = node.field("body") else {
        return Ok(EnumDecl { name, members });
    };
    for member in named(&body) {
        let (key, value) = if member.kind().as_ref() == "enum_assignment" {
            let key = member.field("name").and_then(|k| property_key(&k));
            // computed initializers are not evaluated
            let value = member.field("value").and_then(|v| match v.kind().as_ref() {
                "string" => Some(unquote(&v.text())),
                "number" => Some(normalize_number(&v.text())),
                "unary_expression" => signed_number(&v),
                _ => None,
            });
            (key, value)
        } else {
            (property_key(&member), None)
        };
        match key {
            Some(key) => members.push(EnumMember { name: key, value }),
            None => return Err(diagnostic(&member, format!("unsupported member in enum `{name}`"))),
        }
    }
    Ok(EnumDecl { name, members })
}

/// Named members of an interface body or object type, first declaration wins.
/// Index, call and construct signatures carry no name and are dropped.
fn members(body: &TsNode<'_>, depth: usize) -> Lowered<Vec<PropertySig>> {
    let mut out: Vec<PropertySig> = Vec::new();
    for member in named(body) {
        let sig = match member.kind().as_ref() {
            "property_signature" => property(&member, depth)?,
            "method_signature" => method(&member, depth)?,
            _ => None,
        };
        if let Some(sig) = sig
            && !out.iter().any(|p| p.name == sig.name)
        {
            out.push(sig);
        }
    }
    Ok(out)
}

fn property(member: &TsNode<'_>, depth: usize) -> Lowered<Option<PropertySig>> {
    let Some(name) = member.field("name").and_then(|n| property_key(&n)) else {
        return Ok(None);
    };
    let ty = match member.field("type") {
        Some(annotation) => annotated(&annotation, depth)?,
        None => TypeExpr::Keyword("any".into()),
    };
    Ok(Some(PropertySig { name, optional: has_token(member, "?"), ty }))
}

/// Methods become function-typed properties; a `get` accessor is the property
/// itself and a `set` accessor adds nothing.
fn method(member: &TsNode<'_>, depth: usize) -> Lowered<Option<PropertySig>> {
    if has_token(member, "set") {
        return Ok(None);
    }
    let Some(name) = member.field("name").and_then(|n| property_key(&n)) else {
        return Ok(None);
    };
    let optional = has_token(member, "?");
    let ty = if has_token(member, "get") {
        match member.field("return_type") {
            Some(ret) => return_type(&ret, depth)?,
            None => TypeExpr::Keyword("any".into()),
        }
    } else {
        function(member, depth)?
    };
    Ok(Some(PropertySig { name, optional, ty }))
}

// —— type expressions ——

fn annotated(node: &TsNode<'_>, depth: usize) -> Lowered<TypeExpr> {
    if node.kind().as_ref() == "type_annotation" {
        lower(&first_named(node)?, depth)
    } else {
        lower(node, depth)
    }
}

fn return_type(node: &TsNode<'_>, depth: usize) -> Lowered<TypeExpr> {
    match node.kind().as_ref() {
        // `x is T`
        "type_predicate" | "type_predicate_annotation" => Ok(TypeExpr::Keyword("boolean".into())),
        "asserts" | "asserts_annotation" => Ok(TypeExpr::Keyword("void".into())),
        _ => annotated(node, depth),
    }
}

fn function(node: &TsNode<'_>, depth: usize) -> Lowered<TypeExpr> {
    let mut params = Vec::new();
    if let Some(list) = node.field("parameters") {
        for param in named(&list) {
            let optional = match param.kind().as_ref() {
                "required_parameter" => false,
                "optional_parameter" => true,
                _ => continue,
            };
            let Some(pattern) = param.field("pattern") else {
                continue;
            };
            let rest = pattern.kind().as_ref() == "rest_pattern";
            let name = pattern.text().trim_start_matches("...").to_string();
            let ty = match param.field("type") {
                Some(annotation) => Some(annotated(&annotation, depth)?),
                None => None,
            };
            params.push(Param { name, optional, rest, ty });
        }
    }
    let ret = match node.field("return_type") {
        Some(ret) => return_type(&ret, depth)?,
        None => TypeExpr::Keyword("any".into()),
    };
    Ok(TypeExpr::Function { params, ret: Box::new(ret) })
}

/// Operands of a chain of same-kind binary type nodes, left to right.
fn chain_operands<'r>(node: &TsNode<'r>, kind: &str) -> Vec<TsNode<'r>> {
    let mut operands = Vec::new();
    let mut stack = vec![node.clone()];
    while let Some(current) = stack.pop() {
        if current.kind().as_ref() == kind {
            let mut children = named(&current);
            children.reverse();
            stack.extend(children);
        } else {
            operands.push(current);
        }
    }
    operands
}

fn lower_chain(node: &TsNode<'_>, kind: &str, depth: usize) -> Lowered<Vec<TypeExpr>> {
    let mut arms = Vec::new();
    for operand in chain_operands(node, kind) {
        match lower(&operand, depth)? {
            TypeExpr::Union(inner) if kind == "union_type" => arms.extend(inner),
            other => arms.push(other),
        }
    }
    Ok(arms)
}

/// `{ [K in keyof T]: ... }`
fn is_mapped(node: &TsNode<'_>) -> bool {
    named(node).iter().any(|member| {
        member.kind().as_ref() == "index_signature"
            && named(member).iter().any(|c| c.kind().as_ref() == "mapped_type_clause")
    })
}

fn literal(node: &TsNode<'_>) -> TypeExpr {
    match node.kind().as_ref() {
        "string" => TypeExpr::StrLit(unquote(&node.text())),
        "number" => TypeExpr::NumLit(normalize_number(&node.text())),
        "unary_expression" => match signed_number(node) {
            Some(n) => TypeExpr::NumLit(n),
            None => TypeExpr::Opaque(node.text().to_string()),
        },
        "true" => TypeExpr::BoolLit(true),
        "false" => TypeExpr::BoolLit(false),
        "null" | "undefined" => TypeExpr::Keyword(node.text().to_string()),
        _ => TypeExpr::Opaque(node.text().to_string()),
    }
}

fn lower(node: &TsNode<'_>, depth: usize) -> Lowered<TypeExpr> {
    if depth > MAX_NESTING {
        return Err(diagnostic(node, format!("type nested deeper than {MAX_NESTING} levels")));
    }
    let inner = depth + 1;
    let ty = match node.kind().as_ref() {
        "predefined_type" => TypeExpr::Keyword(node.text().to_string()),
        "this_type" => TypeExpr::Keyword("this".into()),
        "type_identifier" | "nested_type_identifier" | "identifier" => {
            TypeExpr::Ref { name: node.text().to_string(), args: Vec::new() }
        }
        "generic_type" => {
            let name = field_text(node, "name")?;
            let mut args = Vec::new();
            if let Some(list) = node.field("type_arguments") {
                for arg in named(&list) {
                    args.push(lower(&arg, inner)?);
                }
            }
            TypeExpr::Ref { name, args }
        }
        "literal_type" => literal(&first_named(node)?),
        "array_type" => TypeExpr::Array(Box::new(lower(&first_named(node)?, inner)?)),
        // `readonly T[]` is the array itself
        "parenthesized_type" | "readonly_type" => lower(&first_named(node)?, inner)?,
        kind @ ("union_type" | "intersection_type") => {
            let mut arms = lower_chain(node, kind, inner)?;
            match (arms.len(), kind) {
                (1, _) => arms.remove(0),
                (_, "union_type") => TypeExpr::Union(arms),
                _ => TypeExpr::Intersection(arms),
            }
        }
        "object_type" if is_mapped(node) => TypeExpr::Opaque(node.text().to_string()),
        "object_type" => TypeExpr::Object(members(node, inner)?),
        "tuple_type" => {
            let mut elems = Vec::new();
            for elem in named(node) {
                let ty = match elem.kind().as_ref() {
                    "tuple_parameter" | "optional_tuple_parameter" => match elem.field("type") {
                        Some(annotation) => annotated(&annotation, inner)?,
                        None => TypeExpr::Keyword("any".into()),
                    },
                    "optional_type" | "rest_type" => lower(&first_named(&elem)?, inner)?,
                    _ => lower(&elem, inner)?,
                };
                elems.push(ty);
            }
            TypeExpr::Tuple(elems)
        }
        "function_type" | "constructor_type" => function(node, inner)?,
        // keyof, typeof, indexed access, conditional, template literal, infer, ...
        _ => TypeExpr::Opaque(node.text().to_string()),
    };
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> (Vec<Declaration>, Vec<Diagnostic>) {
        parse_declarations(src, SupportLang::TypeScript)
    }
    fn alias_type(src: &str) -> TypeExpr {
        let (decls, diags) = parse(src);
        assert!(diags.is_empty(), "{src}: {diags:?}");
        match decls.into_iter().next() {
            Some(Declaration::Alias(alias)) => alias.ty,
            other => panic!("{src}: expected alias, got {other:?}"),
        }
    }
    fn r(name: &str) -> TypeExpr {
        TypeExpr::Ref { name: name.into(), args: vec![] }
    }
    fn kw(k: &str) -> TypeExpr {
        TypeExpr::Keyword(k.into())
    }

    #[test]
    fn interface_with_optional_and_arrays() {
        let (decls, diags) = parse(
            "export interface User {\n  id: string;\n  readonly email: string,\n  tags?: string[];\n  // friends of the user\n  friends: Array<User>\n}",
        );
        assert!(diags.is_empty(), "{diags:?}");
        let Declaration::Interface(user) = &decls[0] else { panic!("expected interface") };
        assert_eq!(user.name, "User");
        let names: Vec<_> = user.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["id", "email", "tags", "friends"]);
        assert!(user.members[2].optional);
        assert!(!user.members[0].optional);
        assert_eq!(user.members[2].ty, TypeExpr::Array(Box::new(kw("string"))));
        assert_eq!(user.members[3].ty, TypeExpr::Ref { name: "Array".into(), args: vec![r("User")] });
    }

    #[test]
    fn enum_members_and_initializers() {
        let (decls, _) = parse(
            "export const enum Status { PENDING = 'pending', ACTIVE = \"act\\u0069ve\", Code = 0x10, Neg = -2, Bare, Calc = 1 << 2 }",
        );
        let Declaration::Enum(status) = &decls[0] else { panic!("expected enum") };
        let values: Vec<_> = status.members.iter().map(|m| m.value.clone()).collect();
        assert_eq!(
            values,
            [Some("pending".into()), Some("active".into()), Some("16".into()), Some("-2".into()), None, None]
        );
        assert_eq!(status.members[4].name, "Bare");
    }

    #[test]
    fn alias_unions_and_literals() {
        let ty = alias_type("type Role = | 'admin' | 'user' | 3 | null;");
        assert_eq!(
            ty,
            TypeExpr::Union(vec![
                TypeExpr::StrLit("admin".into()),
                TypeExpr::StrLit("user".into()),
                TypeExpr::NumLit("3".into()),
                kw("null"),
            ])
        );
        assert_eq!(ty.to_string(), r#""admin" | "user" | 3 | null"#);
    }

    #[test]
    fn long_unions_stay_flat() {
        let arms: Vec<String> = (0..500).map(|i| format!("'v{i}'")).collect();
        let TypeExpr::Union(lowered) = alias_type(&format!("type Many = {};", arms.join(" | "))) else {
            panic!("expected union");
        };
        assert_eq!(lowered.len(), 500);
    }

    #[test]
    fn only_top_level_declarations_are_taken() {
        let src = r#"
            import { x } from './x';
            const limit = 3;
            function helper(a: number): string { interface Hidden { a: string } return `${a}`; }
            class Service { kind = 'x'; }
            declare interface Ambient { z: number }
            export type Point = { x: number; y: number };
        "#;
        let (decls, diags) = parse(src);
        assert!(diags.is_empty(), "{diags:?}");
        let names: Vec<_> = decls.iter().map(Declaration::name).collect();
        assert_eq!(names, ["Ambient", "Point"]);
    }

    #[test]
    fn broken_declaration_is_reported_and_skipped() {
        let (decls, diags) = parse("interface Broken { a: ; }\ninterface Ok { b: number }");
        assert!(!diags.is_empty());
        assert_eq!(diags[0].line, 1);
        let names: Vec<_> = decls.iter().map(Declaration::name).collect();
        assert_eq!(names, ["Ok"]);
    }

    #[test]
    fn deep_nesting_is_rejected_without_overflow() {
        let src = format!(
            "type Deep = {}string{};\ninterface Ok {{ x: string }}",
            "(".repeat(20_000),
            ")".repeat(20_000)
        );
        let (decls, diags) = parse(&src);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("nested deeper"), "{}", diags[0]);
        let names: Vec<_> = decls.iter().map(Declaration::name).collect();
        assert_eq!(names, ["Ok"]);

        let shallow = format!("type Fine = {}string{};", "(".repeat(10), ")".repeat(10));
        assert_eq!(alias_type(&shallow), kw("string"));
    }

    #[test]
    fn methods_functions_and_generics() {
        let (decls, diags) = parse(
            "interface Api<T extends object = {}> extends Base<T>, Other {\n  get(id: string): Promise<T>;\n  on: (event: string, ...rest: any[]) => void;\n  [key: string]: unknown;\n  (call: number): void;\n}",
        );
        assert!(diags.is_empty(), "{diags:?}");
        let Declaration::Interface(api) = &decls[0] else { panic!("expected interface") };
        assert_eq!(api.type_params, ["T"]);
        assert_eq!(api.extends.len(), 2);
        assert_eq!(api.members.len(), 2);
        assert_eq!(api.members[0].ty.to_string(), "(id: string) => Promise<T>");
        assert_eq!(api.members[1].ty.to_string(), "(event: string, ...rest: any[]) => void");
    }

    #[test]
    fn opaque_forms_lower() {
        for src in [
            "keyof User",
            "User['id']",
            "{ [K in keyof T]?: T[K] }",
            "T extends string ? 'a' : 'b'",
            "`prefix-${string}`",
        ] {
            let ty = alias_type(&format!("type T = {src};"));
            assert!(matches!(ty, TypeExpr::Opaque(_)), "{src}: {ty:?}");
        }
        assert_eq!(
            alias_type("type T = [id: string, count?: number];"),
            TypeExpr::Tuple(vec![kw("string"), kw("number")])
        );
        assert_eq!(alias_type("type T = (string | number)[];").to_string(), "(string | number)[]");
        assert_eq!(alias_type("type T = readonly string[];"), TypeExpr::Array(Box::new(kw("string"))));
    }

    #[test]
    fn tsx_files_use_the_tsx_grammar() {
        assert_eq!(language_for(std::path::Path::new("a/b.tsx")), SupportLang::Tsx);
        assert_eq!(language_for(std::path::Path::new("a/b.ts")), SupportLang::TypeScript);
        let (decls, diags) = parse_declarations(
            "export interface Props { title: string }\nexport const View = (p: Props) => <div>{p.title}</div>;",
            SupportLang::Tsx,
        );
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(decls[0].name(), "Props");
    }

    #[test]
    fn numbers_normalize() {
        assert_eq!(normalize_number("1_000"), "1000");
        assert_eq!(normalize_number("0b101"), "5");
        assert_eq!(normalize_number("2.50"), "2.5");
        assert_eq!(normalize_number("1e3"), "1000");
    }

    #[test]
    fn strings_unquote() {
        assert_eq!(unquote(r#"'it\'s'"#), "it's");
        assert_eq!(unquote(r#""a\tb\u{1F600}""#), "a\tb\u{1F600}");
        assert_eq!(unquote("''"), "");
    }
}
