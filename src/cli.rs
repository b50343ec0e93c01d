//! CLI: TypeScript declarations → (schema | mock | routes)
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::resolve::Resolver;
use crate::routes::{type_file_paths, Method, RoutePlan, ServeConfig};
use crate::source::TsSource;
use crate::synth::Synthesizer;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// resolve TypeScript types into schemas and synthesize realistic mock JSON from them
#[derive(Parser, Debug)]
#[command(name = "typeserve", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// resolve a type and print its schema
    Schema(SchemaOut),
    /// resolve a type and print a mock payload
    Mock(MockOut),
    /// resolve every route of a config and print the route table
    Routes(RoutesOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// project root; file hints and relative inputs are taken against it
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// declaration files; literal paths or quoted glob patterns
    /// (defaults to every .ts/.tsx file under the root)
    #[arg(long, short, num_args = 1..)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct TypeSelector {
    /// type name, optionally suffixed with `[]`
    type_name: String,

    /// only look in this file (relative to the root)
    #[arg(long)]
    file: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    selector: TypeSelector,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct MockOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    selector: TypeSelector,

    /// number of root array elements (clamped to 1..=5)
    #[arg(long)]
    count: Option<u32>,

    /// seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct RoutesOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// route config file
    #[arg(long, default_value = "typeserve.json")]
    config: PathBuf,

    /// also render one payload per ready route
    #[arg(long, default_value_t = false)]
    render: bool,

    /// seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// output .json file for rendered payloads (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

const DEFAULT_PATTERNS: &[&str] = &["**/*.ts", "**/*.tsx"];
const SKIPPED_DIRS: &[&str] = &["node_modules", "dist", "build", "target"];

impl InputSettings {
    fn load_source(&self) -> anyhow::Result<TsSource> {
        let source_paths = if self.input.is_empty() {
            let patterns = DEFAULT_PATTERNS
                .iter()
                .map(|p| self.root.join(p).to_string_lossy().into_owned());
            resolve_file_path_patterns(patterns, false)?
                .into_iter()
                .filter(|path| !is_skipped(&self.root, path))
                .collect()
        } else {
            let patterns = self.input.iter().map(|p| {
                if Path::new(p).is_absolute() {
                    p.clone()
                } else {
                    self.root.join(p).to_string_lossy().into_owned()
                }
            });
            resolve_file_path_patterns(patterns, true)?
        };

        let mut sources = Vec::with_capacity(source_paths.len());
        for source_path in source_paths {
            let text = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            let relative = source_path
                .strip_prefix(&self.root)
                .map(Path::to_path_buf)
                .unwrap_or(source_path);
            sources.push((relative, text));
        }
        info!(files = sources.len(), root = %self.root.display(), "loaded declaration files");
        Ok(TsSource::from_sources(&self.root, sources))
    }

    fn resolver(&self) -> anyhow::Result<Resolver<TsSource>> {
        let namespace = self.root.to_string_lossy().into_owned();
        Ok(Resolver::new(namespace, self.load_source()?))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                let mut resolver = target.input_settings.resolver()?;
                let schema = resolver
                    .resolve(&target.selector.type_name, target.selector.file.as_deref())
                    .with_context(|| format!("failed to resolve {}", target.selector.type_name))?;
                let schema_src = serde_json::to_string_pretty(schema.as_ref())?;
                emit(target.out.as_deref(), &schema_src)
            }
            Command::Mock(target) => {
                let mut resolver = target.input_settings.resolver()?;
                let schema = resolver
                    .resolve(&target.selector.type_name, target.selector.file.as_deref())
                    .with_context(|| format!("failed to resolve {}", target.selector.type_name))?;
                let mut synth = synthesizer(target.seed);
                let value = synth.synthesize(&schema, target.count);
                emit(target.out.as_deref(), &serde_json::to_string_pretty(&value)?)
            }
            Command::Routes(target) => {
                let config_path = target.input_settings.root.join(&target.config);
                let bytes = std::fs::read(&config_path)
                    .with_context(|| format!("failed to read config {}", config_path.display()))?;
                let config = ServeConfig::from_json_slice(&bytes)
                    .with_context(|| format!("failed to load config {}", config_path.display()))?;

                let mut resolver = target.input_settings.resolver()?;
                let plan = RoutePlan::prepare(&config, &mut resolver);
                print_route_table(&plan);

                let watched = type_file_paths(&config, &mut resolver);
                for path in &watched {
                    debug!(path = %path.display(), "watching type file");
                }

                if plan.ready().next().is_none() && !plan.routes.is_empty() {
                    bail!("no route could be prepared");
                }
                if target.render {
                    let mut synth = synthesizer(target.seed);
                    let mut payloads = Map::new();
                    for planned in plan.ready() {
                        if let Some(value) = plan.render(planned, &mut synth) {
                            payloads.insert(planned.route.key(), value);
                        }
                    }
                    let payloads = serde_json::to_string_pretty(&Value::Object(payloads))?;
                    emit(target.out.as_deref(), &payloads)?;
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn synthesizer(seed: Option<u64>) -> Synthesizer {
    match seed {
        Some(seed) => Synthesizer::seeded(seed),
        None => Synthesizer::new(),
    }
}

fn emit(out: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))?;
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn print_route_table(plan: &RoutePlan) {
    for planned in &plan.routes {
        let method = colored_method(planned.route.method);
        match &planned.outcome {
            Ok(_) => eprintln!("  {method} {} → {}", planned.full_path, planned.route.type_name),
            Err(error) => eprintln!(
                "  {method} {} → {} {}",
                planned.full_path,
                planned.route.type_name,
                format!("({error})").red(),
            ),
        }
    }
    if !plan.duplicates.is_empty() {
        eprintln!("  {}", format!("{} duplicate route(s) ignored", plan.duplicates.len()).yellow());
    }
}

fn colored_method(method: Method) -> colored::ColoredString {
    let label = format!("{method:<6}");
    match method {
        Method::Get => label.green(),
        Method::Post => label.blue(),
        Method::Put => label.yellow(),
        Method::Delete => label.red(),
    }
}

/// `node_modules`, build output and dot-directories never hold route types.
fn is_skipped(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|component| {
        let name = component.as_os_str().to_string_lossy();
        SKIPPED_DIRS.contains(&name.as_ref()) || (name.starts_with('.') && name.len() > 1 && name != "..")
    })
}

fn resolve_file_path_patterns<I>(patterns: I, require_match: bool) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
                let path = entry?;
                matched_any = true;
                if !out.contains(&path) {
                    out.push(path);
                }
            }
            if require_match && !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            let path = PathBuf::from(pattern);
            if !out.contains(&path) {
                out.push(path);
            }
        }
    }

    Ok(out)
}
