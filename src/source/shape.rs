//! Member enumeration over parsed declarations.
//!
//! This is the small slice of a type checker the resolver needs: follow
//! aliases, collect own and inherited members, unwrap one array level, spot
//! literal unions, and name the declaration a member type refers to.
use super::parser::{Declaration, InterfaceDecl, PropertySig, TypeExpr};
use super::{MemberShape, SourceError, SourceFile, Symbol, TsSource, TypeShape};

/// Bound on alias chains and `extends` nesting.
pub const MAX_DEPTH: usize = 32;

pub struct Checker<'a> {
    source: &'a TsSource,
}

/// Lexical context: the file a type expression was written in, plus the
/// type parameters in scope (which never resolve to declarations).
#[derive(Clone, Copy)]
struct Scope<'a> {
    file: &'a SourceFile,
    type_params: &'a [String],
}

impl<'a> Checker<'a> {
    pub fn new(source: &'a TsSource) -> Self {
        Checker { source }
    }

    pub fn shape_of(&self, file: &'a SourceFile, decl: &'a Declaration) -> Result<TypeShape, SourceError> {
        let scope = Scope { file, type_params: decl.type_params() };
        match decl {
            Declaration::Enum(e) => Err(SourceError::NotStructural(e.name.clone())),
            Declaration::Interface(iface) => Ok(TypeShape {
                is_array: false,
                literal: None,
                members: self.member_shapes(&self.interface_members(scope, iface, 0)?, 0)?,
            }),
            Declaration::Alias(alias) => {
                let (scope, target) = self.deref(scope, &alias.ty, 0)?;
                let (scope, is_array, elem) = match self.array_element(target) {
                    Some(elem) => {
                        let (scope, elem) = self.deref(scope, elem, 0)?;
                        (scope, true, elem)
                    }
                    None => (scope, false, target),
                };
                let literal = match elem {
                    TypeExpr::StrLit(s) | TypeExpr::NumLit(s) => Some(s.clone()),
                    _ => None,
                };
                if literal.is_some() {
                    return Ok(TypeShape { is_array, literal, members: Vec::new() });
                }
                let members = self.members_of(scope, elem, 0)?;
                Ok(TypeShape { is_array, literal: None, members: self.member_shapes(&members, 0)? })
            }
        }
    }

    // —— name resolution ——

    fn lookup(&self, scope: Scope<'a>, name: &str) -> Option<(&'a SourceFile, &'a Declaration)> {
        if scope.type_params.iter().any(|p| p == name) {
            return None;
        }
        self.source.lookup(name, &scope.file.path)
    }

    /// Follow alias references until reaching something that is not an alias.
    fn deref(
        &self,
        scope: Scope<'a>,
        ty: &'a TypeExpr,
        depth: usize,
    ) -> Result<(Scope<'a>, &'a TypeExpr), SourceError> {
        let TypeExpr::Ref { name, .. } = ty else {
            return Ok((scope, ty));
        };
        match self.lookup(scope, name) {
            Some((file, decl @ Declaration::Alias(alias))) => {
                if depth >= MAX_DEPTH {
                    return Err(SourceError::TooDeep { name: name.clone(), limit: MAX_DEPTH });
                }
                let scope = Scope { file, type_params: decl.type_params() };
                self.deref(scope, &alias.ty, depth + 1)
            }
            _ => Ok((scope, ty)),
        }
    }

    /// Element type if `ty` is written as an array (`T[]`, `Array<T>`, `ReadonlyArray<T>`).
    fn array_element(&self, ty: &'a TypeExpr) -> Option<&'a TypeExpr> {
        match ty {
            TypeExpr::Array(elem) => Some(&**elem),
            TypeExpr::Ref { name, args } if args.len() == 1 && (name == "Array" || name == "ReadonlyArray") => {
                args.first()
            }
            _ => None,
        }
    }

    // —— members ——

    fn interface_members(
        &self,
        scope: Scope<'a>,
        iface: &'a InterfaceDecl,
        depth: usize,
    ) -> Result<Vec<(Scope<'a>, &'a PropertySig)>, SourceError> {
        if depth >= MAX_DEPTH {
            return Err(SourceError::TooDeep { name: iface.name.clone(), limit: MAX_DEPTH });
        }
        let mut out: Vec<(Scope<'a>, &'a PropertySig)> = iface.members.iter().map(|m| (scope, m)).collect();
        for base in &iface.extends {
            for inherited in self.members_of(scope, base, depth + 1)? {
                if !out.iter().any(|(_, m)| m.name == inherited.1.name) {
                    out.push(inherited);
                }
            }
        }
        Ok(out)
    }

    /// Structural members of an arbitrary type expression.
    fn members_of(
        &self,
        scope: Scope<'a>,
        ty: &'a TypeExpr,
        depth: usize,
    ) -> Result<Vec<(Scope<'a>, &'a PropertySig)>, SourceError> {
        if depth >= MAX_DEPTH {
            return Err(SourceError::TooDeep { name: ty.to_string(), limit: MAX_DEPTH });
        }
        let (scope, ty) = self.deref(scope, ty, depth)?;
        match ty {
            TypeExpr::Object(props) => Ok(props.iter().map(|p| (scope, p)).collect()),
            TypeExpr::Ref { name, .. } => match self.lookup(scope, name) {
                Some((file, decl @ Declaration::Interface(iface))) => {
                    let scope = Scope { file, type_params: decl.type_params() };
                    self.interface_members(scope, iface, depth + 1)
                }
                _ => Ok(Vec::new()),
            },
            TypeExpr::Intersection(parts) => {
                let mut out: Vec<(Scope<'a>, &'a PropertySig)> = Vec::new();
                for part in parts {
                    for member in self.members_of(scope, part, depth + 1)? {
                        if !out.iter().any(|(_, m)| m.name == member.1.name) {
                            out.push(member);
                        }
                    }
                }
                Ok(out)
            }
            TypeExpr::Union(arms) => {
                // only members common to every arm
                let mut per_arm = Vec::with_capacity(arms.len());
                for arm in arms {
                    per_arm.push(self.members_of(scope, arm, depth + 1)?);
                }
                let mut iter = per_arm.into_iter();
                let first = iter.next().unwrap_or_default();
                let rest: Vec<_> = iter.collect();
                Ok(first
                    .into_iter()
                    .filter(|(_, m)| rest.iter().all(|arm| arm.iter().any(|(_, o)| o.name == m.name)))
                    .collect())
            }
            _ => Ok(Vec::new()),
        }
    }

    fn member_shapes(
        &self,
        members: &[(Scope<'a>, &'a PropertySig)],
        depth: usize,
    ) -> Result<Vec<MemberShape>, SourceError> {
        members
            .iter()
            .map(|(scope, prop)| self.member_shape(*scope, *prop, depth))
            .collect()
    }

    fn member_shape(&self, scope: Scope<'a>, prop: &'a PropertySig, depth: usize) -> Result<MemberShape, SourceError> {
        // array-ness looks through aliases (`type Tags = string[]`)
        let (elem_scope, elem, is_array) = match self.array_element(&prop.ty) {
            Some(elem) => (scope, elem, true),
            None => {
                let (target_scope, target) = self.deref(scope, &prop.ty, depth)?;
                match self.array_element(target) {
                    Some(elem) => (target_scope, elem, true),
                    None => (scope, &prop.ty, false),
                }
            }
        };
        let (shown_scope, shown) = self.display_form(elem_scope, elem, depth)?;
        Ok(MemberShape {
            name: prop.name.clone(),
            optional: prop.optional,
            is_array,
            display: shown.to_string(),
            literals: self.literal_union(elem_scope, elem, depth)?,
            symbol: self.symbol_of(shown_scope, shown),
        })
    }

    /// Aliases of primitives, literals and arrays print as their target; aliases
    /// of object-like types and unions keep their own name.
    fn display_form(
        &self,
        scope: Scope<'a>,
        ty: &'a TypeExpr,
        depth: usize,
    ) -> Result<(Scope<'a>, &'a TypeExpr), SourceError> {
        let TypeExpr::Ref { name, .. } = ty else {
            return Ok((scope, ty));
        };
        let Some((file, decl @ Declaration::Alias(alias))) = self.lookup(scope, name) else {
            return Ok((scope, ty));
        };
        if depth >= MAX_DEPTH {
            return Err(SourceError::TooDeep { name: name.clone(), limit: MAX_DEPTH });
        }
        let target_scope = Scope { file, type_params: decl.type_params() };
        match &alias.ty {
            TypeExpr::Keyword(_)
            | TypeExpr::StrLit(_)
            | TypeExpr::NumLit(_)
            | TypeExpr::BoolLit(_)
            | TypeExpr::Array(_)
            | TypeExpr::Ref { .. } => self.display_form(target_scope, &alias.ty, depth + 1),
            _ => Ok((scope, ty)),
        }
    }

    /// Literal set when `ty` is a union made only of string/number literals
    /// (through aliases and enum references).
    fn literal_union(&self, scope: Scope<'a>, ty: &'a TypeExpr, depth: usize) -> Result<Option<Vec<String>>, SourceError> {
        let (scope, ty) = self.deref(scope, ty, depth)?;
        match ty {
            TypeExpr::Union(_) => {
                let mut out = Vec::new();
                Ok(self.collect_literals(scope, ty, depth, &mut out)?.then_some(out))
            }
            TypeExpr::Ref { name, .. } => match self.lookup(scope, name) {
                Some((_, Declaration::Enum(e))) if !e.members.is_empty() => Ok(Some(enum_values(e))),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    fn collect_literals(
        &self,
        scope: Scope<'a>,
        ty: &'a TypeExpr,
        depth: usize,
        out: &mut Vec<String>,
    ) -> Result<bool, SourceError> {
        if depth >= MAX_DEPTH {
            return Err(SourceError::TooDeep { name: ty.to_string(), limit: MAX_DEPTH });
        }
        let (scope, ty) = self.deref(scope, ty, depth)?;
        match ty {
            TypeExpr::StrLit(s) | TypeExpr::NumLit(s) => {
                if !out.contains(s) {
                    out.push(s.clone());
                }
                Ok(true)
            }
            TypeExpr::Union(arms) => {
                for arm in arms {
                    if !self.collect_literals(scope, arm, depth + 1, out)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            TypeExpr::Ref { name, .. } => match self.lookup(scope, name) {
                Some((_, Declaration::Enum(e))) => {
                    for value in enum_values(e) {
                        if !out.contains(&value) {
                            out.push(value);
                        }
                    }
                    Ok(true)
                }
                _ => Ok(false),
            },
            _ => Ok(false),
        }
    }

    /// The declaration a member type names, if any.
    fn symbol_of(&self, scope: Scope<'a>, ty: &TypeExpr) -> Option<Symbol> {
        let TypeExpr::Ref { name, .. } = ty else {
            return None;
        };
        let (file, decl) = self.lookup(scope, name)?;
        let nameable = match decl {
            Declaration::Interface(_) | Declaration::Enum(_) => true,
            Declaration::Alias(alias) => self.is_object_like(file, &alias.ty, 0),
        };
        nameable.then(|| Symbol { name: name.clone(), file: file.path.clone() })
    }

    fn is_object_like(&self, file: &SourceFile, ty: &TypeExpr, depth: usize) -> bool {
        if depth >= MAX_DEPTH {
            return false;
        }
        match ty {
            TypeExpr::Object(_) | TypeExpr::Intersection(_) => true,
            TypeExpr::Ref { name, .. } => match self.source.lookup(name, &file.path) {
                Some((_, Declaration::Interface(_))) => true,
                Some((target, Declaration::Alias(alias))) => self.is_object_like(target, &alias.ty, depth + 1),
                _ => false,
            },
            _ => false,
        }
    }
}

/// Each member's literal value if declared, else its own name.
pub fn enum_values(e: &super::EnumDecl) -> Vec<String> {
    e.members
        .iter()
        .map(|m| m.value.clone().unwrap_or_else(|| m.name.clone()))
        .collect()
}
