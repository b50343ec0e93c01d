pub mod cache;
pub mod classify;
pub mod cli;
pub mod path_de;
pub mod resolve;
pub mod routes;
pub mod schema;
pub mod source;
pub mod synth;

pub use resolve::{ResolveError, Resolver};
pub use schema::{Schema, TypeProperty};
pub use source::{DeclarationSource, TsSource};
pub use synth::Synthesizer;
