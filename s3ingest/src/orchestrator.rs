//! The top-level transfer: fetch, load, and fall back to the catalog.

use crate::catalog::{CatalogRegistrar, CatalogTableDefinition, Registration};
use crate::common::*;
use crate::config::ConnectionConfig;
use crate::fetcher::ObjectFetcher;
use crate::loader::{LoadOutcome, RelationalLoader};

/// How a transfer finished.
#[derive(Debug)]
pub(crate) enum TransferOutcome {
    /// The dataset was written to the relational database.
    LoadedIntoDatabase { rows: u64 },
    /// The relational load failed with `load_error`, so the data was
    /// registered in the catalog instead.
    RegisteredInCatalog {
        registration: Registration,
        load_error: Error,
    },
}

/// Fetch our CSV object and load it into the database. If the load fails,
/// register the object's location in the catalog instead.
///
/// Fetch errors and catalog errors are returned. Load errors are not, because
/// they select the fallback.
#[instrument(level = "debug", skip_all)]
pub(crate) async fn run_transfer(
    config: &ConnectionConfig,
    fetcher: &dyn ObjectFetcher,
    loader: &dyn RelationalLoader,
    registrar: &CatalogRegistrar,
) -> Result<TransferOutcome> {
    let dataset = fetcher
        .fetch(&config.s3_bucket, &config.csv_key)
        .await
        .context("could not fetch CSV data")?;
    debug!(
        "fetched {} rows with {} columns",
        dataset.rows().len(),
        dataset.columns().len(),
    );

    match loader.load(&dataset).await {
        LoadOutcome::Loaded { rows } => Ok(TransferOutcome::LoadedIntoDatabase { rows }),
        LoadOutcome::Failed(load_error) => {
            info!("falling back to catalog registration");
            let table = CatalogTableDefinition::delimited_text(
                &config.glue_table,
                &config.glue_s3_location,
            );
            let registration = registrar.register(&config.glue_database, &table).await?;
            Ok(TransferOutcome::RegisteredInCatalog {
                registration,
                load_error,
            })
        }
    }
}
