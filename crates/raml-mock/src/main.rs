use anyhow::Context;
use clap::{Parser, ValueEnum};
use raml_mock::{load_file, MockConfig, MockServer, MockService, SelectionMode};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Generate an API mock server from a RAML definition.
#[derive(Parser, Debug)]
#[command(name = "raml-mock", version, about)]
struct Args {
    /// Path to the RAML definition
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// Port number to bind the mock service
    #[arg(short, long, required_unless_present = "config")]
    port: Option<u16>,

    /// Enable CORS with the API
    #[arg(long)]
    cors: bool,

    /// Gzip large responses for clients that accept it
    #[arg(long)]
    compression: bool,

    /// Address to bind (default 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// YAML configuration file; flags override its values
    #[arg(short, long, env = "RAML_MOCK_CONFIG")]
    config: Option<PathBuf>,

    /// How to choose between multiple named examples
    #[arg(long, value_enum)]
    selection: Option<SelectionMode>,

    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

impl Args {
    fn mock_config(&self) -> anyhow::Result<MockConfig> {
        let mut config = match &self.config {
            Some(path) => MockConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => MockConfig::default(),
        };

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(selection) = self.selection {
            config.selection = selection;
        }
        config.cors |= self.cors;
        config.compression |= self.compression;

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = args.mock_config()?;

    let document = load_file(&args.file)
        .with_context(|| format!("Failed to load RAML definition {}", args.file.display()))?;
    let service = MockService::from_document(&document, &config)?;
    info!(
        "{} routes ready (cors: {}, compression: {}, selection: {})",
        service.routes().len(),
        config.cors,
        config.compression,
        config.selection.as_str()
    );
    for (method, template) in service.routes().routes() {
        debug!("Route {} {}", method, template);
    }

    let listener = MockServer::bind(&config).await?;
    let port = listener.local_addr()?.port();
    println!("Mock service running at http://{}:{}", config.host, port);

    MockServer::new(service)
        .serve_with_shutdown(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_format);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}
