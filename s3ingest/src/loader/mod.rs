//! Loading datasets into a relational database.

use crate::common::*;
use crate::dataset::TabularDataset;
use crate::status::Status;

pub(crate) mod postgres;

/// The result of a relational load.
#[derive(Debug)]
pub(crate) enum LoadOutcome {
    /// The table now holds exactly `rows` rows from our dataset.
    Loaded { rows: u64 },
    /// The load failed. The table may be unchanged, but nothing was added.
    Failed(Error),
}

/// A relational database which can hold our dataset.
#[async_trait]
pub(crate) trait RelationalLoader: Send + Sync {
    /// Replace the destination table with `dataset`, returning the number of
    /// rows written.
    async fn replace_table(&self, dataset: &TabularDataset) -> Result<u64>;

    /// Like [`RelationalLoader::replace_table`], but never fails. Errors are
    /// logged, reported on stdout and returned in [`LoadOutcome::Failed`].
    async fn load(&self, dataset: &TabularDataset) -> LoadOutcome {
        match self.replace_table(dataset).await {
            Ok(rows) => {
                Status::Success
                    .print(format!("Upload to database successful ({} rows)", rows));
                LoadOutcome::Loaded { rows }
            }
            Err(err) => {
                error!("database load failed: {:?}", err);
                Status::Failure.print(format!("Upload to database failed: {:#}", err));
                LoadOutcome::Failed(err)
            }
        }
    }
}
