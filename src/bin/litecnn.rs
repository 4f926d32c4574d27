use std::path::PathBuf;

use clap::{Parser, Subcommand};
use litecnn::engine::{EngineConfig, InferenceEngine};
use litecnn::http::config::parse_addr;
use litecnn::http::{run_server, ServerConfig};
use litecnn::loader::load_weights_with_header;
use litecnn::logging::init_logging_default;

#[derive(Parser, Debug)]
#[command(name = "litecnn", version)]
#[command(about = "CPU inference for the LiteCNN image classifier", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP classification server
    Serve {
        /// Address to bind (overrides LITECNN_ADDR)
        #[arg(long)]
        addr: Option<String>,
        /// LCNN weight file (overrides LITECNN_WEIGHTS)
        #[arg(long)]
        weights: Option<PathBuf>,
        /// Label JSON file (overrides LITECNN_LABELS)
        #[arg(long)]
        labels: Option<PathBuf>,
        /// Default number of predictions per request
        #[arg(long)]
        top_k: Option<usize>,
        /// Name reported by /health (overrides LITECNN_MODEL_NAME)
        #[arg(long)]
        model_name: Option<String>,
    },
    /// Classify a single image and print the result as JSON
    Predict {
        /// LCNN weight file
        #[arg(long)]
        weights: PathBuf,
        /// Image to classify
        #[arg(long)]
        image: PathBuf,
        /// Label JSON file
        #[arg(long)]
        labels: Option<PathBuf>,
        /// Number of predictions
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// List the parameters stored in a weight file
    Inspect {
        /// LCNN weight file
        #[arg(long)]
        weights: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            addr,
            weights,
            labels,
            top_k,
            model_name,
        } => {
            let mut config = ServerConfig::from_env()?;
            if let Some(addr) = addr {
                config = config.with_addr(parse_addr(&addr)?);
            }
            if let Some(path) = weights {
                config = config.with_weights_path(path);
            }
            if let Some(path) = labels {
                config = config.with_labels_path(path);
            }
            if let Some(k) = top_k {
                config.engine = config.engine.with_top_k(k);
            }
            if let Some(name) = model_name {
                config.engine = config.engine.with_model_name(name);
            }
            run_server(config).await
        }
        Commands::Predict {
            weights,
            image,
            labels,
            top_k,
        } => {
            init_logging_default();
            let bytes = tokio::fs::read(&image).await?;
            let result = tokio::task::spawn_blocking(move || {
                let engine =
                    InferenceEngine::from_paths(&weights, labels.as_deref(), EngineConfig::default())?;
                engine.classify_bytes(&bytes, top_k)
            })
            .await??;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::Inspect { weights } => {
            init_logging_default();
            let (header, store) = load_weights_with_header(&weights)?;
            println!("format version: {}", header.version);
            println!("declared parameters: {}", header.count);

            for name in store.names() {
                if let Some(tensor) = store.tensor(name) {
                    println!("{:<48} {:?}", name, tensor.shape());
                }
            }
            println!(
                "{} tensors, {} values",
                store.len(),
                store.parameter_count()
            );
            Ok(())
        }
    }
}
