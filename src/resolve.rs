//! Named declaration → finite [`Schema`] graph.
//!
//! One [`Resolver`] per namespace owns everything mutable: the schema cache,
//! the discovery memo, and the declaration source. The active-path set that
//! cuts cycles lives on the call stack of a single `resolve` call.
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::cache::{CacheKey, SchemaCache};
use crate::schema::{Schema, TypeProperty};
use crate::source::shape::enum_values;
use crate::source::{Declaration, DeclarationSource, SourceError, SourceFile};

/// Names that are always opaque leaves, never nested.
const PRIMITIVES: &[&str] = &[
    "String", "Number", "Boolean", "Date", "Object", "Array", "Function", "RegExp", "Error",
];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Type \"{name}\" not found{}", .file.as_ref().map(|f| format!(" in {f}")).unwrap_or_default())]
    TypeNotFound { name: String, file: Option<String> },
    #[error("failed to resolve \"{type_name}\": {source}")]
    Resolution { type_name: String, source: SourceError },
}

/// A resolved schema plus the active-path names it was cut against.
struct Resolved {
    schema: Arc<Schema>,
    cuts: HashSet<String>,
}

pub struct Resolver<S> {
    namespace: String,
    source: S,
    cache: SchemaCache,
    discovered: HashMap<String, Vec<Arc<SourceFile>>>,
}

/// Split a trailing `[]` off a requested type name.
pub fn strip_array_suffix(type_name: &str) -> (&str, bool) {
    match type_name.strip_suffix("[]") {
        Some(base) => (base, true),
        None => (type_name, false),
    }
}

/// Whether a referenced name may be expanded into a nested schema.
pub fn is_nestable(name: &str) -> bool {
    !name.is_empty()
        && !PRIMITIVES.contains(&name)
        && !name.contains(['<', '|', '&'])
        && !name.contains("[]")
}

impl<S: DeclarationSource> Resolver<S> {
    pub fn new(namespace: impl Into<String>, source: S) -> Self {
        Resolver {
            namespace: namespace.into(),
            source,
            cache: SchemaCache::new(),
            discovered: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut SchemaCache {
        &mut self.cache
    }

    /// Forget every schema and discovery result (hot reload).
    pub fn reset(&mut self) {
        self.cache.reset();
        self.discovered.clear();
    }

    /// Replace the declaration source and reset; used after the files changed.
    pub fn reload(&mut self, source: S) {
        self.source = source;
        self.reset();
    }

    /// Resolve `type_name` (optionally `[]`-suffixed), looking only in
    /// `file_hint` when given.
    pub fn resolve(&mut self, type_name: &str, file_hint: Option<&str>) -> Result<Arc<Schema>, ResolveError> {
        let mut active = HashSet::new();
        self.resolve_on_path(type_name, file_hint, &mut active)
            .map(|resolved| resolved.schema)
    }

    /// The file that declares `type_name`: the hint itself, or the first
    /// discovered file with a matching declaration.
    pub fn declaring_file(&mut self, type_name: &str, file_hint: Option<&str>) -> Option<PathBuf> {
        let (base, _) = strip_array_suffix(type_name);
        let files = self.discover(file_hint).ok()?;
        files
            .iter()
            .find(|f| f.find(base).is_some())
            .map(|f| f.path.clone())
    }

    fn discover(&mut self, file_hint: Option<&str>) -> Result<Vec<Arc<SourceFile>>, SourceError> {
        let key = format!("{}:{}", self.namespace, file_hint.unwrap_or("all"));
        if let Some(files) = self.discovered.get(&key) {
            return Ok(files.clone());
        }
        let files = self.source.discover(file_hint)?;
        debug!(key = %key, files = files.len(), "discovered declaration files");
        self.discovered.insert(key, files.clone());
        Ok(files)
    }

    fn resolve_on_path(
        &mut self,
        type_name: &str,
        file_hint: Option<&str>,
        active: &mut HashSet<String>,
    ) -> Result<Resolved, ResolveError> {
        let key = CacheKey::new(&self.namespace, file_hint, type_name);
        if let Some(schema) = self.cache.get(&key) {
            // a cached graph that re-enters the active path would nest a type in itself
            if !schema.nested_names().iter().any(|name| active.contains(*name)) {
                debug!(key = %key, "schema cache hit");
                return Ok(Resolved { schema: schema.clone(), cuts: HashSet::new() });
            }
        }

        let (base, is_array) = strip_array_suffix(type_name);
        let not_found = || ResolveError::TypeNotFound {
            name: base.to_string(),
            file: file_hint.map(str::to_string),
        };
        let files = match self.discover(file_hint) {
            Ok(files) => files,
            Err(SourceError::FileNotFound(_)) => return Err(not_found()),
            Err(source) => return Err(ResolveError::Resolution { type_name: base.to_string(), source }),
        };
        let Some((file, decl)) = files
            .iter()
            .find_map(|file| file.find(base).map(|decl| (file, decl)))
        else {
            return Err(not_found());
        };

        let inserted = active.insert(base.to_string());
        let result = self.build(file, decl, base, is_array, active);
        if inserted {
            active.remove(base);
        }
        let mut resolved = result?;
        resolved.cuts.remove(base);

        if resolved.cuts.is_empty() {
            debug!(key = %key, "schema cached");
            resolved.schema = self.cache.insert(key, resolved.schema);
        }
        Ok(resolved)
    }

    fn build(
        &mut self,
        file: &SourceFile,
        decl: &Declaration,
        name: &str,
        is_array: bool,
        active: &mut HashSet<String>,
    ) -> Result<Resolved, ResolveError> {
        if let Declaration::Enum(e) = decl {
            return Ok(Resolved {
                schema: Arc::new(Schema::enumeration(name, enum_values(e), is_array)),
                cuts: HashSet::new(),
            });
        }

        let shape = self
            .source
            .shape_of(file, decl)
            .map_err(|source| ResolveError::Resolution { type_name: name.to_string(), source })?;
        let is_array = is_array || shape.is_array;
        if let Some(literal) = shape.literal {
            return Ok(Resolved {
                schema: Arc::new(Schema::enumeration(name, vec![literal], is_array)),
                cuts: HashSet::new(),
            });
        }

        let mut cuts = HashSet::new();
        let mut properties = IndexMap::with_capacity(shape.members.len());
        for member in shape.members {
            let mut prop = TypeProperty::leaf(member.display)
                .optional(member.optional)
                .array(member.is_array)
                .literals(member.literals);

            if let Some(symbol) = member.symbol.filter(|s| is_nestable(&s.name)) {
                if active.contains(&symbol.name) {
                    cuts.insert(symbol.name);
                } else {
                    let hint = symbol.file.to_string_lossy().into_owned();
                    match self.resolve_on_path(&symbol.name, Some(&hint), active) {
                        Ok(nested) => {
                            cuts.extend(nested.cuts);
                            prop = prop.nested(nested.schema);
                        }
                        Err(ResolveError::TypeNotFound { name, .. }) => {
                            debug!(property = %member.name, missing = %name, "left as opaque leaf");
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
            properties.insert(member.name, prop);
        }

        Ok(Resolved {
            schema: Arc::new(Schema::object(name, properties, is_array)),
            cuts,
        })
    }
}
