use crate::api::routes;
use crate::cache::RecordCache;
use crate::config::SharedConfig;
use crate::store::DynRecordStore;
use std::future::Future;
use std::net::SocketAddr;

#[derive(Clone)]
pub(super) struct AppState {
    pub config: SharedConfig,
    pub store: DynRecordStore,
    pub cache: RecordCache,
}

pub fn new(
    config: SharedConfig,
    bind_addr: SocketAddr,
    store: DynRecordStore,
    cache: RecordCache,
) -> impl Future<Output = hyper::Result<()>> {
    axum::Server::bind(&bind_addr).serve(
        routes::new(AppState {
            config,
            store,
            cache,
        })
        .into_make_service(),
    )
}
