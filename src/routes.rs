//! Route units and batch preparation.
//!
//! A route pairs an HTTP method and path with a type name. Preparing a plan
//! resolves every route up front; a route that fails is recorded and skipped
//! while the rest of the batch carries on.
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::path_de::{from_slice_with_path, from_str_with_path, PathError};
use crate::resolve::{ResolveError, Resolver};
use crate::schema::Schema;
use crate::source::DeclarationSource;
use crate::synth::Synthesizer;

pub const DEFAULT_PORT: u16 = 7002;
pub const DEFAULT_BASE_PATH: &str = "/api";
pub const COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouteError {
    #[error("invalid route config {0}")]
    Config(#[from] PathError),
    #[error("route {method} {path}: count must be between 1 and 5, got {count}")]
    CountOutOfRange { method: Method, path: String, count: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub path: String,
    pub method: Method,
    /// Type name, optionally `[]`-suffixed.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl RouteConfig {
    pub fn validate(&self) -> Result<(), RouteError> {
        match self.count {
            Some(count) if !COUNT_RANGE.contains(&count) => Err(RouteError::CountOutOfRange {
                method: self.method,
                path: self.path.clone(),
                count,
            }),
            _ => Ok(()),
        }
    }

    /// `METHOD:path`; two routes with the same key collide.
    pub fn key(&self) -> String {
        format!("{}:{}", self.method, self.path)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServeConfig {
    pub routes: Vec<RouteConfig>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

/// A route dropped because an earlier one had the same method and path.
#[derive(Clone, Debug, PartialEq)]
pub struct Duplicate {
    pub index: usize,
    pub first_index: usize,
}

impl ServeConfig {
    pub fn from_json(src: &str) -> Result<Self, RouteError> {
        let config: ServeConfig = from_str_with_path(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, RouteError> {
        let config: ServeConfig = from_slice_with_path(bytes)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RouteError> {
        self.routes.iter().try_for_each(RouteConfig::validate)
    }

    /// First occurrence of each `(method, path)` wins.
    pub fn unique_routes(&self) -> (Vec<&RouteConfig>, Vec<Duplicate>) {
        let mut seen: IndexMap<String, usize> = IndexMap::new();
        let mut unique = Vec::new();
        let mut duplicates = Vec::new();
        for (index, route) in self.routes.iter().enumerate() {
            match seen.get(&route.key()) {
                Some(&first_index) => duplicates.push(Duplicate { index, first_index }),
                None => {
                    seen.insert(route.key(), index);
                    unique.push(route);
                }
            }
        }
        (unique, duplicates)
    }
}

#[derive(Debug)]
pub struct PlannedRoute {
    pub route: RouteConfig,
    /// `basePath` + route path.
    pub full_path: String,
    pub outcome: Result<Arc<Schema>, ResolveError>,
}

impl PlannedRoute {
    pub fn schema(&self) -> Option<&Arc<Schema>> {
        self.outcome.as_ref().ok()
    }
}

/// Every unique route of a config, resolved once.
#[derive(Debug)]
pub struct RoutePlan {
    pub base_path: String,
    pub routes: Vec<PlannedRoute>,
    pub duplicates: Vec<Duplicate>,
}

impl RoutePlan {
    pub fn prepare<S: DeclarationSource>(config: &ServeConfig, resolver: &mut Resolver<S>) -> Self {
        let (unique, duplicates) = config.unique_routes();
        for dup in &duplicates {
            let route = &config.routes[dup.index];
            warn!(
                index = dup.index + 1,
                first = dup.first_index + 1,
                "duplicate route {} {} → {} ignored; first occurrence is used",
                route.method,
                route.path,
                route.type_name,
            );
        }

        let routes: Vec<PlannedRoute> = unique
            .into_iter()
            .map(|route| {
                let outcome = resolver.resolve(&route.type_name, route.file.as_deref());
                if let Err(err) = &outcome {
                    warn!("failed to parse type \"{}\" for route {}: {err}", route.type_name, route.path);
                }
                PlannedRoute {
                    route: route.clone(),
                    full_path: format!("{}{}", config.base_path, route.path),
                    outcome,
                }
            })
            .collect();

        let failed = routes.iter().filter(|r| r.outcome.is_err()).count();
        info!(routes = routes.len(), failed, "types parsed");
        RoutePlan { base_path: config.base_path.clone(), routes, duplicates }
    }

    pub fn ready(&self) -> impl Iterator<Item = &PlannedRoute> {
        self.routes.iter().filter(|r| r.outcome.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&RouteConfig, &ResolveError)> {
        self.routes
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|e| (&r.route, e)))
    }

    /// The ready route answering `method` on a full path.
    pub fn find(&self, method: Method, full_path: &str) -> Option<&PlannedRoute> {
        self.ready()
            .find(|r| r.route.method == method && r.full_path == full_path)
    }

    /// Mock payload for a ready route; `None` if it failed to resolve.
    pub fn render<R: Rng>(&self, planned: &PlannedRoute, synth: &mut Synthesizer<R>) -> Option<Value> {
        let schema = planned.schema()?;
        Some(synth.synthesize(schema, planned.route.count))
    }
}

/// Files declaring each route's type, for a watcher to follow.
pub fn type_file_paths<S: DeclarationSource>(config: &ServeConfig, resolver: &mut Resolver<S>) -> IndexSet<PathBuf> {
    config
        .routes
        .iter()
        .filter_map(|route| resolver.declaring_file(&route.type_name, route.file.as_deref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::TsSource;

    const CONFIG: &str = r#"{
        "port": 5005,
        "routes": [
            { "path": "/users", "method": "GET", "type": "User[]", "count": 2 },
            { "path": "/users/:id", "method": "GET", "type": "User" },
            { "path": "/posts", "method": "GET", "type": "Post[]" },
            { "path": "/users", "method": "GET", "type": "Post" },
            { "path": "/status", "method": "PUT", "type": "Status", "file": "types.ts" }
        ]
    }"#;

    fn resolver() -> Resolver<TsSource> {
        Resolver::new(
            "app",
            TsSource::from_sources(
                "/app",
                [(
                    "types.ts",
                    "export interface User { id: string; email: string }\nexport enum Status { On = 'on' }",
                )],
            ),
        )
    }

    #[test]
    fn config_defaults_and_validation() {
        let config = ServeConfig::from_json(CONFIG).unwrap();
        assert_eq!(config.port, 5005);
        assert_eq!(config.base_path, "/api");
        assert_eq!(config.routes[0].count, Some(2));
        assert_eq!(config.routes[4].file.as_deref(), Some("types.ts"));

        let bad = r#"{ "routes": [ { "path": "/x", "method": "GET", "type": "X", "count": 6 } ] }"#;
        assert!(matches!(
            ServeConfig::from_json(bad),
            Err(RouteError::CountOutOfRange { count: 6, .. })
        ));
    }

    #[test]
    fn config_errors_carry_their_path() {
        let bad = r#"{ "routes": [ { "path": "/x", "method": "PATCH", "type": "X" } ] }"#;
        let Err(RouteError::Config(err)) = ServeConfig::from_json(bad) else {
            panic!("expected config error");
        };
        assert_eq!(err.path, "routes[0].method");
    }

    #[test]
    fn duplicates_keep_the_first_route() {
        let config = ServeConfig::from_json(CONFIG).unwrap();
        let (unique, duplicates) = config.unique_routes();
        assert_eq!(unique.len(), 4);
        assert_eq!(duplicates, vec![Duplicate { index: 3, first_index: 0 }]);
        assert_eq!(unique[0].type_name, "User[]");
    }

    #[test]
    fn failed_routes_do_not_stop_the_batch() {
        let config = ServeConfig::from_json(CONFIG).unwrap();
        let mut resolver = resolver();
        let plan = RoutePlan::prepare(&config, &mut resolver);

        assert_eq!(plan.routes.len(), 4);
        let failed: Vec<_> = plan.failed().map(|(route, _)| route.path.as_str()).collect();
        assert_eq!(failed, ["/posts"]);
        assert_eq!(plan.ready().count(), 3);

        let mut synth = Synthesizer::seeded(9);
        let users = plan.find(Method::Get, "/api/users").unwrap();
        let value = plan.render(users, &mut synth).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);

        let status = plan.find(Method::Put, "/api/status").unwrap();
        assert_eq!(plan.render(status, &mut synth).unwrap(), "on");

        assert!(plan.find(Method::Get, "/api/posts").is_none());
    }

    #[test]
    fn watch_paths_follow_route_types() {
        let config = ServeConfig::from_json(CONFIG).unwrap();
        let paths = type_file_paths(&config, &mut resolver());
        assert_eq!(paths.into_iter().collect::<Vec<_>>(), [PathBuf::from("types.ts")]);
    }
}
