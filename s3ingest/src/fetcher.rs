//! Fetching CSV objects from object storage.

use crate::clouds::aws::{s3, AwsCli};
use crate::common::*;
use crate::dataset::TabularDataset;

/// Something which can fetch a CSV object and parse it.
#[async_trait]
pub(crate) trait ObjectFetcher: Send + Sync {
    /// Fetch the object `key` in `bucket` and parse it as CSV with a header.
    async fn fetch(&self, bucket: &str, key: &str) -> Result<TabularDataset>;
}

/// Fetches objects from S3 using `aws s3 cp`.
pub(crate) struct S3Fetcher {
    cli: AwsCli,
}

impl S3Fetcher {
    pub(crate) fn new(cli: AwsCli) -> Self {
        S3Fetcher { cli }
    }
}

#[async_trait]
impl ObjectFetcher for S3Fetcher {
    #[instrument(level = "debug", name = "s3::fetch", skip(self))]
    async fn fetch(&self, bucket: &str, key: &str) -> Result<TabularDataset> {
        let path = s3::object_path(bucket, key)?;
        let data = s3::download_object(&self.cli, &path).await?;
        TabularDataset::from_csv_reader(&data[..])
            .with_context(|| format!("could not parse {} as CSV", path))
    }
}
