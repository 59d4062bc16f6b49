use std::{future::Future, sync::Arc};

use tokio::net::TcpListener;

use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::router::router;
use crate::schedule::Scheduler;
use crate::smartlead::SmartleadClient;
use crate::store::{SqliteStore, Store};

pub async fn serve<F>(config: Config, listener: TcpListener, shutdown: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = match SqliteStore::new(&config.database_url).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(
                error = %e,
                url = %config.database_url,
                "Failed to initialize store"
            );
            return;
        }
    };
    let store: Arc<dyn Store + Send + Sync> = Arc::new(store);

    let client = match SmartleadClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create SmartLead client");
            return;
        }
    };

    let pipeline = Arc::new(Pipeline::new(store.clone(), client, &config));
    let scheduler = Arc::new(Scheduler::new(pipeline.clone(), &config));

    if config.schedule_enabled {
        tokio::spawn(scheduler.clone().run());
    } else {
        tracing::info!("scheduled fetches disabled, only /refresh will trigger runs");
    }

    tracing::info!("listening on {:?}", listener.local_addr().unwrap());
    let app = router(store, pipeline, scheduler, config.enable_metrics);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .unwrap()
}
