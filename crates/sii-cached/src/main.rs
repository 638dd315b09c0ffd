//! sii-cached — session cache daemon.
//!
//! Connects to Redis, starts the expiration listener, and closes SII
//! sessions on the portal as their cache entries expire. The cache itself
//! is used in-process by whatever embeds `sii-session`; this binary exists
//! to run the listener as a standalone service.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use sii_portal::{PortalConfig, PortalTerminator, TerminationPolicy};
use sii_session::{
    ExpirationListener, RedisConfig, RedisHandle, SessionStore, SessionTerminator, SessionTtl,
};

/// SII session cache daemon.
#[derive(Parser)]
#[command(name = "sii-cached")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Redis host
    #[arg(long, env = "REDIS_HOST", default_value = "127.0.0.1")]
    redis_host: String,

    /// Redis port
    #[arg(long, env = "REDIS_PORT", default_value_t = 6379)]
    redis_port: u16,

    /// Redis database index
    #[arg(long, env = "REDIS_DB", default_value_t = 0)]
    redis_db: u32,

    /// Redis AUTH credential
    #[arg(long, env = "REDIS_PASSWORD")]
    redis_password: Option<String>,

    /// Session TTL in seconds
    #[arg(long, env = "SII_SESSION_TTL_SECS", default_value_t = sii_session::DEFAULT_SESSION_TTL_SECS)]
    session_ttl_secs: u64,

    /// Extra lifetime of the close record beyond the session TTL, in seconds
    #[arg(long, env = "SII_CLOSE_GRACE_SECS", default_value_t = sii_session::DEFAULT_CLOSE_GRACE_SECS)]
    close_grace_secs: u64,

    /// Override the portal's termination endpoint
    #[arg(long, env = "SII_TERMINATE_URL")]
    terminate_url: Option<String>,

    /// Require a 2xx/3xx portal response before counting a close as done
    /// (default is the portal's observed lenient behavior)
    #[arg(long)]
    strict_close: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        "sii_session=debug,sii_portal=debug,sii_cached=debug,info"
    } else {
        "sii_session=info,sii_portal=info,sii_cached=info,warn"
    };
    tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let mut redis_config = RedisConfig::default()
        .with_host(args.redis_host)
        .with_port(args.redis_port)
        .with_db(args.redis_db);
    if let Some(password) = args.redis_password {
        redis_config = redis_config.with_password(password);
    }

    let mut handle = RedisHandle::connect(redis_config).await?;

    let ttl = SessionTtl::default()
        .with_session_secs(args.session_ttl_secs)
        .with_close_grace_secs(args.close_grace_secs);
    let store = SessionStore::new(handle.manager()?, ttl);

    let mut portal_config = PortalConfig::default();
    if let Some(url) = args.terminate_url {
        portal_config = portal_config.with_endpoint(url);
    }
    if args.strict_close {
        portal_config = portal_config.with_policy(TerminationPolicy::Strict);
    }
    let terminator: Arc<dyn SessionTerminator> = Arc::new(PortalTerminator::new(portal_config)?);

    let mut listener = ExpirationListener::new(&handle, store, terminator);
    listener.start().await?;
    info!("watching for session expirations; ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    listener.stop().await?;
    handle.close();
    Ok(())
}
