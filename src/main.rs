use anyhow::Result;
use clap::Parser;
use promptcodegen::app::App;
use promptcodegen::models::Config;
use promptcodegen::server;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "promptcodegen")]
#[command(about = "Serve the PromptCodeGen API")]
struct CliArgs {
    /// Address to bind, overriding HOST.
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to listen on, overriding PORT.
    #[arg(long)]
    port: Option<u16>,

    /// Extra env file loaded before the process environment is read.
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,
}

impl CliArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promptcodegen=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    if let Some(path) = &args.env_file {
        Config::load_env_file(path)?;
        info!("Loaded environment from {}", path.display());
    }

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    args.apply(&mut config);

    info!("Starting promptcodegen ({} environment)", config.app_env);

    let app = match App::new(&config) {
        Ok(app) => Arc::new(app),
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    let addr = SocketAddr::new(config.host, config.port);
    if let Err(e) = server::serve(app, addr).await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_lookup(|key| (key == "GEMINI_API_KEY").then(|| "key".to_string())).unwrap()
    }

    #[test]
    fn test_cli_overrides_host_and_port() {
        let args = CliArgs::parse_from(["promptcodegen", "--host", "127.0.0.1", "--port", "9000"]);
        let mut config = config();

        args.apply(&mut config);

        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_cli_defaults_keep_config() {
        let args = CliArgs::parse_from(["promptcodegen"]);
        let mut config = config();

        args.apply(&mut config);

        assert_eq!(config.port, 8000);
        assert!(args.env_file.is_none());
    }

    #[test]
    fn test_cli_rejects_bad_port() {
        assert!(CliArgs::try_parse_from(["promptcodegen", "--port", "http"]).is_err());
    }
}
