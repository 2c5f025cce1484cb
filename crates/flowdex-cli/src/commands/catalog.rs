use flowdex_catalog::{CatalogRegistry, CatalogService, ListParams, ListQuery};
use flowdex_config::FlowdexConfig;
use flowdex_core::FlowdexError;
use std::sync::Arc;

fn selected<'a>(
    registry: &'a CatalogRegistry,
    name: Option<&str>,
) -> flowdex_core::Result<Vec<&'a Arc<CatalogService>>> {
    match name {
        Some(name) => Ok(vec![registry.require(name)?]),
        None => Ok(registry.list()),
    }
}

pub(super) fn cmd_scan(config: &FlowdexConfig, catalog: Option<&str>, json: bool) -> flowdex_core::Result<()> {
    let registry = CatalogRegistry::from_config(config)?;
    let services = selected(&registry, catalog)?;
    if services.is_empty() {
        return Err(FlowdexError::Config("no catalogs enabled".into()));
    }

    let mut reports = Vec::new();
    for service in services {
        let snapshot = service.refresh();
        let counts = service.category_counts();

        if json {
            let counts: serde_json::Map<String, serde_json::Value> =
                counts.into_iter().map(|(id, n)| (id, n.into())).collect();
            reports.push(serde_json::json!({
                "catalog": service.name(),
                "kind": service.kind(),
                "scanned": snapshot.scanned,
                "total": snapshot.items.len(),
                "counts": counts,
                "skipped": snapshot.skipped,
            }));
            continue;
        }

        println!("📂 {} ({})", service.name(), service.kind());
        println!("   Scanned: {}", snapshot.scanned);
        println!("   Workflows: {}", snapshot.items.len());
        for (category, n) in counts.iter().filter(|(_, n)| *n > 0) {
            println!("     {:<16} {}", category, n);
        }
        if snapshot.skipped.is_empty() {
            println!("   Skipped: 0");
        } else {
            println!("   Skipped: {}", snapshot.skipped.len());
            for file in &snapshot.skipped {
                println!("     ⚠️  {} ({})", file.filename, file.reason);
            }
        }
        println!();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}

pub(super) fn cmd_list(
    config: &FlowdexConfig,
    catalog: &str,
    params: &ListParams,
    json: bool,
) -> flowdex_core::Result<()> {
    let query = ListQuery::from_params(params)?;
    let registry = CatalogRegistry::from_config(config)?;
    let service = registry.require(catalog)?;
    let page = service.list(&query);

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.items.is_empty() {
        println!("No workflows matched.");
    }
    for item in &page.items {
        println!("{:>6}  [{}] {}", item.id, item.category, item.name);
        println!("        {}", item.filename);
    }
    println!();
    println!(
        "Page {}/{} · {} total · {} per page",
        page.page,
        page.page_count.max(1),
        page.total,
        page.page_size
    );
    Ok(())
}
