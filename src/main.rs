use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use notegraph::config::GraphConfig;
use notegraph::coordinator::GraphCoordinator;
use notegraph::io::{self, NodePosition};

mod server;

/// Screen margin left around the graph when framing the output
const FIT_PADDING: f32 = 40.0;

/// Force-directed layout for personal knowledge graphs.
#[derive(Parser)]
#[command(name = "notegraph")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the layout to rest and write node positions as JSON
    Layout {
        /// Graph file (.json, .yaml)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file; positions go to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Layout configuration file (.json, .yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run the layout to rest and render the graph as SVG
    Render {
        /// Graph file (.json, .yaml)
        #[arg(short, long)]
        input: PathBuf,

        /// SVG output file
        #[arg(short, long, default_value = "graph.svg")]
        output: PathBuf,

        /// Layout configuration file (.json, .yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Start a preview server that re-renders when the graph file changes
    Serve {
        /// Graph file (.json, .yaml)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for the generated preview
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Layout configuration file (.json, .yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Port to run the server on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load a graph, run it to rest and frame it in the viewport
pub(crate) fn settled_graph(input: &Path, config: Option<&Path>) -> anyhow::Result<GraphCoordinator> {
    let config = match config {
        Some(path) => io::read_config(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => GraphConfig::default(),
    };
    let graph_input =
        io::read_graph(input).with_context(|| format!("reading graph {}", input.display()))?;

    let max_ticks = config.layout.step_cap as usize;
    let mut graph = GraphCoordinator::new(config);
    graph.rebuild(graph_input.nodes, graph_input.edges);
    graph.run_until_settled(max_ticks);
    graph.fit_to_content(FIT_PADDING);
    Ok(graph)
}

fn layout(input: &Path, output: Option<&Path>, config: Option<&Path>) -> anyhow::Result<()> {
    let graph = settled_graph(input, config)?;
    let positions = NodePosition::collect(graph.model());

    match output {
        Some(path) => {
            io::write_layout(path, &positions)?;
            info!(nodes = positions.len(), output = %path.display(), "wrote layout");
        }
        None => println!("{}", serde_json::to_string_pretty(&positions)?),
    }
    Ok(())
}

fn render(input: &Path, output: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let graph = settled_graph(input, config)?;
    io::write_svg(output, &graph.scene())?;
    info!(nodes = graph.model().len(), output = %output.display(), "rendered graph");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Layout {
            input,
            output,
            config,
        } => layout(&input, output.as_deref(), config.as_deref())?,
        Commands::Render {
            input,
            output,
            config,
        } => render(&input, &output, config.as_deref())?,
        Commands::Serve {
            input,
            output,
            config,
            port,
        } => server::serve(&input, config.as_deref(), &output, port).await?,
    }

    Ok(())
}
