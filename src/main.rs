use anyhow::{anyhow, Result};
use cachecrab::cache::DynCacheStore;
use cachecrab::error::Error::DNSError;
use cachecrab::{Config, RecordCache, SharedConfig};
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(300);
const PROMOTION_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let mut first_args = std::env::args().take(2);
    let (program_name, config_file) = (
        first_args.next().unwrap_or("cachecrab".to_string()),
        first_args.next(),
    );

    let config = config_init(&program_name, config_file)?;
    let store = config.record_store().await?;
    let cache_store = config.cache_store();
    let dyn_cache_store: DynCacheStore = cache_store.clone();
    let resolver = config.resolver(store.clone(), dyn_cache_store.clone());
    let promoter = resolver.promoter().clone();

    tracing::info!(
        "caching after {} hits for {}s",
        config.min_hits_for_cache,
        config.cache_ttl.as_secs()
    );
    tracing::info!("DNS listening on UDP and TCP {}", &config.dns_bind_addr);
    let dns_server = cachecrab::dns::new(config.clone(), resolver).await?;
    let dns_handle = tokio::spawn(dns_server.block_until_done());

    let api_handle = config.api_bind_addr.map(|api_bind_addr| {
        tracing::info!("API listening on {api_bind_addr}");
        let cache = RecordCache::new(dyn_cache_store, config.cache_ttl);
        tokio::spawn(cachecrab::api::new(
            config.clone(),
            api_bind_addr,
            store.clone(),
            cache,
        ))
    });
    let api_done = async move {
        match api_handle {
            Some(handle) => handle.await,
            None => pending().await,
        }
    };

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = cache_store.purge_expired().await;
            if purged > 0 {
                tracing::debug!("purged {purged} expired cache entries");
            }
        }
    });

    let result: Result<()> = tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("quitting from signal");
            Ok(())
        },
        Ok(dns_res) = dns_handle => {
            dns_res.map_err(|err| DNSError(err).into())
        }
        Ok(api_res) = api_done => {
            api_res.map_err(Into::into)
        }
    };

    // TODO(XXX): drain in-flight DNS requests too. `ServerFuture` has no graceful shutdown in
    //            trust-dns-server 0.22, so the DNS task is dropped with `main`.
    promoter.shutdown();
    if tokio::time::timeout(PROMOTION_DRAIN_TIMEOUT, promoter.wait_idle())
        .await
        .is_err()
    {
        tracing::warn!("abandoning unfinished cache promotions");
    }
    tracing::info!("goodbye");
    result
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cachecrab=info".into()),
        )
        .init();
}

fn config_init(program_name: &str, config_file: Option<String>) -> Result<SharedConfig> {
    match config_file {
        None => Err(anyhow!("usage: {program_name} /path/to/config.json")),
        Some(config_file) => {
            tracing::debug!("loaded config from {config_file}");
            let config = Config::try_from_file(&config_file)?;
            Ok(Arc::new(config))
        }
    }
}
