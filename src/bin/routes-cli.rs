use std::path::PathBuf;

use async_trait::async_trait;
use axum::http::Method;
use clap::{Parser, Subcommand};

use dispatch_core::config::{load_config, RouteConfig, ServerConfig};
use dispatch_core::message::{Message, Response};
use dispatch_core::pipeline::{Catcher, Error, Handler, Middleware};
use dispatch_core::routing::Router;
use dispatch_core::scope::{Provider, Registry};

#[derive(Parser)]
#[command(name = "routes-cli")]
#[command(about = "Inspect the route tree of a dispatch-core config", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, default_value = "demos/server.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the flattened route listing
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show which route a request resolves to
    Match {
        method: String,
        path: String,
    },
}

/// Stands in for providers the config names but this binary cannot build.
struct Placeholder;

#[async_trait]
impl Handler for Placeholder {
    async fn handle(&self, message: Message) -> Result<Message, Error> {
        Ok(message)
    }
}

#[async_trait]
impl Middleware for Placeholder {}

#[async_trait]
impl Catcher for Placeholder {
    async fn catch(&self, _error: &Error) -> Response {
        Response::new()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let router = Router::from_config(&config.router, &config.routes, registry_for(&config))?;

    match cli.command {
        Commands::List { json } => {
            let routes = router.flatten();
            if json {
                println!("{}", serde_json::to_string_pretty(&routes)?);
            } else {
                for route in routes {
                    println!(
                        "{:<40} {:<30} {}",
                        route.path,
                        route.methods.join(","),
                        route.summary.unwrap_or_default()
                    );
                }
            }
        }
        Commands::Match { method, path } => {
            let method = Method::from_bytes(method.to_uppercase().as_bytes())?;
            let resolved = router.resolve(&method, &path);
            let mut params: Vec<_> = resolved.params.into_iter().collect();
            params.sort();

            let route = &resolved.route;
            let declared = route
                .ancestry()
                .filter(|n| !n.is_phantom())
                .map(|n| n.path().to_string())
                .collect::<Vec<_>>();
            let declared = declared.into_iter().rev().collect::<Vec<_>>().join(" > ");

            println!("route:    {}", if route.is_fallback() { "<fallback>" } else { declared.as_str() });
            println!("handler:  {}", route.handler());
            if let Some(target) = route.redirect_to() {
                println!("redirect: {} ({})", target, route.redirect_as().map_or(301, |s| s.as_u16()));
            }
            for (name, value) in params {
                println!("param:    {} = {}", name, value);
            }
        }
    }

    Ok(())
}

/// Built-ins plus a placeholder for every other name the config uses.
fn registry_for(config: &ServerConfig) -> Registry {
    let mut registry = Registry::with_builtins();

    for name in &config.router.required_middlewares {
        if !registry.contains(name) {
            registry.insert(Provider::middleware(name.clone(), |_| Ok(Placeholder)));
        }
    }
    for name in &config.router.services {
        if !registry.contains(name) {
            registry.insert(Provider::value(name.clone(), ()));
        }
    }

    let mut pending: Vec<&RouteConfig> = config.routes.iter().collect();
    while let Some(route) = pending.pop() {
        for name in &route.services {
            if !registry.contains(name) {
                registry.insert(Provider::value(name.clone(), ()));
            }
        }
        for name in &route.middlewares {
            if !registry.contains(name) {
                registry.insert(Provider::middleware(name.clone(), |_| Ok(Placeholder)));
            }
        }
        if let Some(name) = &route.handler {
            if !registry.contains(name) {
                registry.insert(Provider::handler(name.clone(), |_| Ok(Placeholder)));
            }
        }
        if let Some(name) = &route.catcher {
            if !registry.contains(name) {
                registry.insert(Provider::catcher(name.clone(), |_| Ok(Placeholder)));
            }
        }
        pending.extend(route.children.iter());
    }

    registry
}
