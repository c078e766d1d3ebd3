//! `depot resolve`: show where a catalog name would be fetched from

use std::collections::HashMap;

use depot_core::error::{DepotError, DepotResult};
use depot_resolver::CatalogTable;

use super::CommandContext;

pub async fn execute(name: &str, ctx: &CommandContext) -> DepotResult<()> {
    let (config, _) = ctx.load_config(HashMap::new()).await?;
    let table = CatalogTable::from_config(&config.catalogs)?;

    let resolved = table.resolve(name).ok_or_else(|| DepotError::CatalogNotFound {
        name: name.to_string(),
    })?;

    ctx.output.success(&format!("'{}' matches '{}'", name, resolved.key));
    match &resolved.uri {
        Some(uri) => ctx.output.info(uri),
        None => ctx.output.warn("No uri configured"),
    }
    if resolved.credential.is_none() {
        ctx.output.warn("No x-pio.catalog-key configured; requests will be rejected");
    }

    Ok(())
}
