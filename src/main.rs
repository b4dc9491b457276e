use std::{net::SocketAddr, process, sync::Arc};

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use sporlapi::{
    Res,
    config::{self, Config},
    server,
    spotify::ReqwestClient,
    storage::{Cache, JsonFileStore, MemoryCache, RedisCache},
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP service
    Serve(ServeOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Bind address, overrides SERVER_ADDRESS
    #[clap(long)]
    addr: Option<SocketAddr>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(opt) => {
            init_tracing();
            if let Err(e) = serve(opt).await {
                error!(error = %e, "service stopped");
                process::exit(1);
            }
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sporlapi=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

async fn serve(opt: ServeOptions) -> Res<()> {
    config::load_env().await?;
    let mut config = Config::from_env()?;
    if let Some(addr) = opt.addr {
        config.server_addr = addr;
    }

    let cache: Arc<dyn Cache> = match &config.redis_url {
        Some(url) => {
            info!("using Redis for login state");
            Arc::new(RedisCache::connect(url).await?)
        }
        None => {
            warn!("REDIS_URL not set, login state is kept in process memory");
            Arc::new(MemoryCache::new())
        }
    };

    let store = Arc::new(JsonFileStore::new(config.profile_store_path.clone()));
    info!(path = %store.path().display(), "profile store");

    let http = Arc::new(ReqwestClient::new(config.http_timeout)?);
    let state = server::build_state(&config, cache, store, http);

    server::start_api_server(&config, state).await
}
