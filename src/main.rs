//! pipeview command line entry point
//!
//! Loads a circuit description, lays it out and prints the geometry as JSON.
//!
//! ```text
//! pipeview <circuit.json> [config.toml] [--expand-all]
//! ```

use anyhow::{bail, Context};
use pipeview::{config::ViewerConfig, graph::CircuitNode, GraphModel, GraphView};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the geometry on stdout stays parseable
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pipeview=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut expand_all = false;
    let mut paths = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--expand-all" => expand_all = true,
            flag if flag.starts_with("--") => bail!("unknown flag '{}'", flag),
            _ => paths.push(arg),
        }
    }

    let Some(circuit_path) = paths.first() else {
        bail!("usage: pipeview <circuit.json> [config.toml] [--expand-all]");
    };

    let config = match paths.get(1) {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::load_user_config(),
    };

    let circuit = CircuitNode::load(circuit_path)
        .with_context(|| format!("Failed to load circuit {}", circuit_path))?;
    let model = GraphModel::build(&circuit);
    tracing::info!(
        "Loaded '{}': {} nodes, {} pipes",
        circuit.name,
        model.node_count(),
        model.pipe_count()
    );

    let (mut view, events) = GraphView::new(model, config.layout);
    if expand_all {
        view.expand_all();
    }
    tracing::debug!("{} view events", events.drain().len());

    let geometry = view.export_geometry();
    println!("{}", serde_json::to_string_pretty(&geometry)?);
    Ok(())
}
