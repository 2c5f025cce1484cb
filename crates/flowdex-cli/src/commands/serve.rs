use std::sync::Arc;
use tracing::warn;

use flowdex_catalog::{CatalogRegistry, CatalogService};

pub(super) async fn cmd_serve(
    mut config: flowdex_config::FlowdexConfig,
    listen: Option<String>,
    warm: bool,
) -> flowdex_core::Result<()> {
    if let Some(listen) = listen {
        config.server.listen = listen;
    }

    println!("📚 Flowdex v{}", env!("CARGO_PKG_VERSION"));
    println!("   Listen: http://{}", config.server.listen);

    let registry = CatalogRegistry::from_config(&config)?;
    if registry.is_empty() {
        warn!("no catalogs enabled, the API will only serve /health and /metrics");
    }

    for service in registry.list() {
        if warm {
            let svc: Arc<CatalogService> = Arc::clone(service);
            let snapshot = tokio::task::spawn_blocking(move || svc.snapshot())
                .await
                .map_err(|e| flowdex_core::FlowdexError::Other(e.into()))?;
            println!(
                "   Catalog: {} ({}): {} workflows, {} skipped",
                service.name(),
                service.kind(),
                snapshot.items.len(),
                snapshot.skipped.len()
            );
        } else {
            println!("   Catalog: {} ({})", service.name(), service.kind());
        }
    }
    println!();

    flowdex_server::start_server(config.server, registry).await
}
