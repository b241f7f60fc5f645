use anyhow::Result;
use clap::arg;
use clap::command;
use clap::Parser;
use tracing::info;
use wechat_token_hub::auth::jwt::Authenticator;
use wechat_token_hub::cache::credential_store::CredentialStore;
use wechat_token_hub::server;
use wechat_token_hub::server::server::AppState;
use wechat_token_hub::upstream::wechat::WeChatClient;
use wechat_token_hub::utils::config_loader;
use wechat_token_hub::utils::logging;
use wechat_token_hub::utils::logging::LogLevel;
use wechat_token_hub::CredentialResolver;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "wechat-token-hub.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// overrides settings.server.port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Read args, load YAML config
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config, args.port).await?;
    logging::run(&service_config, args.log_level)?;

    // -------------------------------
    // 2. Build store, upstream client and resolver
    // -------------------------------

    let store = CredentialStore::new();
    let client = WeChatClient::new(&service_config.upstream)?;
    let resolver = CredentialResolver::new(store, client);

    // -------------------------------
    // 3. Inbound bearer verification
    // -------------------------------

    let authenticator = Authenticator::new(&service_config.auth);

    // -------------------------------
    // 4. Serve
    // -------------------------------

    info!("Service starting...");
    let state = AppState::new(resolver, authenticator);
    server::server::start(&service_config.settings, state).await
}
