//! Declaration sources.
//!
//! The resolver never looks at source text itself. It asks a
//! [`DeclarationSource`] for the files visible to a namespace and for the
//! structural shape of a declaration. [`TsSource`] is the shipped
//! implementation: already-loaded TypeScript text, parsed once up front.
pub mod parser;
pub mod shape;

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

pub use parser::{
    AliasDecl, Declaration, Diagnostic, EnumDecl, EnumMember, InterfaceDecl, PropertySig, TypeExpr,
};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    #[error("file not found in namespace: {0}")]
    FileNotFound(String),
    #[error("`{0}` is an enum and has no structural members")]
    NotStructural(String),
    #[error("type `{name}` does not terminate (alias or extends chain deeper than {limit})")]
    TooDeep { name: String, limit: usize },
}

/// One parsed file of declarations.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub declarations: Vec<Declaration>,
}

impl SourceFile {
    pub fn type_alias(&self, name: &str) -> Option<&AliasDecl> {
        self.declarations.iter().find_map(|d| match d {
            Declaration::Alias(a) if a.name == name => Some(a),
            _ => None,
        })
    }
    pub fn interface(&self, name: &str) -> Option<&InterfaceDecl> {
        self.declarations.iter().find_map(|d| match d {
            Declaration::Interface(i) if i.name == name => Some(i),
            _ => None,
        })
    }
    pub fn enumeration(&self, name: &str) -> Option<&EnumDecl> {
        self.declarations.iter().find_map(|d| match d {
            Declaration::Enum(e) if e.name == name => Some(e),
            _ => None,
        })
    }
    /// Lookup in fixed precedence: type alias, then interface, then enum.
    pub fn find(&self, name: &str) -> Option<&Declaration> {
        let by_kind = |want: fn(&Declaration) -> bool| {
            self.declarations.iter().find(|d| want(d) && d.name() == name)
        };
        by_kind(|d| matches!(d, Declaration::Alias(_)))
            .or_else(|| by_kind(|d| matches!(d, Declaration::Interface(_))))
            .or_else(|| by_kind(|d| matches!(d, Declaration::Enum(_))))
    }
}

/// Where a referenced type is declared.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub name: String,
    pub file: PathBuf,
}

/// Structural view of one member, after one level of array unwrapping.
#[derive(Clone, Debug, PartialEq)]
pub struct MemberShape {
    pub name: String,
    pub optional: bool,
    pub is_array: bool,
    /// Display text of the (unwrapped) member type.
    pub display: String,
    /// Present when the (unwrapped) type is a union of string/number literals.
    pub literals: Option<Vec<String>>,
    /// Present when the (unwrapped) type names a declared alias, interface or enum.
    pub symbol: Option<Symbol>,
}

/// Full semantic shape of an alias or interface.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct TypeShape {
    pub is_array: bool,
    /// Set when the (unwrapped) type is a single string/number literal.
    pub literal: Option<String>,
    /// Own members first, then inherited ones.
    pub members: Vec<MemberShape>,
}

/// Capability the resolver consumes: declaration discovery plus enough
/// semantic analysis to enumerate members.
pub trait DeclarationSource {
    /// Files visible to the namespace: exactly `file_hint`, or all of them.
    fn discover(&self, file_hint: Option<&str>) -> Result<Vec<Arc<SourceFile>>, SourceError>;

    /// Structural shape of an alias or interface declared in `file`.
    fn shape_of(&self, file: &SourceFile, decl: &Declaration) -> Result<TypeShape, SourceError>;
}

impl<S: DeclarationSource + ?Sized> DeclarationSource for Arc<S> {
    fn discover(&self, file_hint: Option<&str>) -> Result<Vec<Arc<SourceFile>>, SourceError> {
        (**self).discover(file_hint)
    }
    fn shape_of(&self, file: &SourceFile, decl: &Declaration) -> Result<TypeShape, SourceError> {
        (**self).shape_of(file, decl)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TYPESCRIPT SOURCE
// ————————————————————————————————————————————————————————————————————————————

/// In-memory TypeScript declarations rooted at a project directory.
#[derive(Clone, Debug, Default)]
pub struct TsSource {
    root: PathBuf,
    files: Vec<Arc<SourceFile>>,
    diagnostics: Vec<(PathBuf, Diagnostic)>,
}

impl TsSource {
    /// Parse every `(path, text)` pair. Paths may be relative to `root` or absolute.
    pub fn from_sources<I, P, T>(root: impl Into<PathBuf>, sources: I) -> Self
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<PathBuf>,
        T: AsRef<str>,
    {
        let root = root.into();
        let mut files = Vec::new();
        let mut diagnostics = Vec::new();
        for (path, text) in sources {
            let path = path.into();
            let (declarations, diags) = parser::parse_declarations(text.as_ref(), parser::language_for(&path));
            for diag in diags {
                tracing::warn!(path = %path.display(), "skipped declaration at {diag}");
                diagnostics.push((path.clone(), diag));
            }
            files.push(Arc::new(SourceFile { path, declarations }));
        }
        TsSource { root, files, diagnostics }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[Arc<SourceFile>] {
        &self.files
    }

    /// Declarations that failed to parse, per file.
    pub fn diagnostics(&self) -> &[(PathBuf, Diagnostic)] {
        &self.diagnostics
    }

    fn same_file(&self, a: &Path, b: &Path) -> bool {
        normalize(&self.root.join(a)) == normalize(&self.root.join(b))
    }

    /// Find a declaration by name, searching `prefer` first and then every file.
    pub(crate) fn lookup(&self, name: &str, prefer: &Path) -> Option<(&SourceFile, &Declaration)> {
        let preferred = self.files.iter().filter(|f| f.path == prefer);
        let rest = self.files.iter().filter(|f| f.path != prefer);
        preferred
            .chain(rest)
            .find_map(|file| file.find(name).map(|decl| (file.as_ref(), decl)))
    }
}

impl DeclarationSource for TsSource {
    fn discover(&self, file_hint: Option<&str>) -> Result<Vec<Arc<SourceFile>>, SourceError> {
        let Some(hint) = file_hint else {
            return Ok(self.files.clone());
        };
        let matched: Vec<_> = self
            .files
            .iter()
            .filter(|f| self.same_file(&f.path, Path::new(hint)))
            .cloned()
            .collect();
        if matched.is_empty() {
            return Err(SourceError::FileNotFound(hint.to_string()));
        }
        Ok(matched)
    }

    fn shape_of(&self, file: &SourceFile, decl: &Declaration) -> Result<TypeShape, SourceError> {
        shape::Checker::new(self).shape_of(file, decl)
    }
}

/// Lexical normalization: drop `.` and fold `..` where possible.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}
