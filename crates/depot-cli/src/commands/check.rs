//! `depot check`: validate configuration and list the catalog table

use std::collections::HashMap;

use depot_core::error::DepotResult;
use depot_resolver::CatalogTable;

use super::CommandContext;

pub async fn execute(ctx: &CommandContext) -> DepotResult<()> {
    let (config, source) = ctx.load_config(HashMap::new()).await?;
    let table = CatalogTable::from_config(&config.catalogs)?;

    ctx.output.success(&format!("Configuration is valid ({})", source.path()));
    ctx.output.detail(&format!("host:        {}", config.host));
    ctx.output.detail(&format!("listen:      {}", config.listen));
    ctx.output.detail(&format!("cache root:  {}", config.cache_root));
    ctx.output.detail(&format!("max fetches: {}", config.max_concurrent_fetches));

    if table.is_empty() {
        ctx.output.warn("No catalogs configured; every catalog request will be rejected");
        return Ok(());
    }

    ctx.output.info(&format!("{} catalogs:", table.len()));
    for line in describe_table(&table) {
        ctx.output.info(&line);
    }
    for descriptor in table.descriptors() {
        if descriptor.credential.is_none() || descriptor.uri_template.is_none() {
            ctx.output.warn(&format!(
                "Catalog '{}' is incomplete and will be rejected with 403",
                descriptor.matcher
            ));
        }
    }

    Ok(())
}

/// One line per descriptor, in resolution order
pub fn describe_table(table: &CatalogTable) -> Vec<String> {
    table
        .descriptors()
        .iter()
        .map(|descriptor| {
            let kind = if descriptor.matcher.is_pattern() { "pattern" } else { "literal" };
            format!(
                "  {} ({}) -> {}",
                descriptor.matcher,
                kind,
                descriptor.uri_template.as_deref().unwrap_or("<no uri>")
            )
        })
        .collect()
}
