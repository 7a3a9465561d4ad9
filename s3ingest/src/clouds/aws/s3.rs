//! Reading objects from S3.

use super::AwsCli;
use crate::common::*;

/// Build the `s3://bucket/key` path the `aws` tool expects. The key is passed
/// through as-is, without URL encoding.
pub(crate) fn object_path(bucket: &str, key: &str) -> Result<String> {
    if bucket.is_empty() || bucket.contains('/') {
        return Err(format_err!("invalid S3 bucket name {:?}", bucket));
    }
    let key = key.trim_start_matches('/');
    if key.is_empty() {
        return Err(format_err!("S3 object key must not be empty"));
    }
    Ok(format!("s3://{}/{}", bucket, key))
}

/// Download the object at `path` into memory using `aws s3 cp`.
#[instrument(level = "debug", skip(cli))]
pub(crate) async fn download_object(cli: &AwsCli, path: &str) -> Result<Vec<u8>> {
    let data = cli
        .run("s3", &["cp", path, "-"])
        .await
        .with_context(|| format!("could not download {}", path))?;
    debug!("downloaded {} bytes", data.len());
    Ok(data)
}

#[test]
fn object_paths_are_built_from_bucket_and_key() {
    assert_eq!(
        object_path("bucket", "dir/data.csv").unwrap(),
        "s3://bucket/dir/data.csv",
    );
    assert_eq!(
        object_path("bucket", "/with space.csv").unwrap(),
        "s3://bucket/with space.csv",
    );
    assert!(object_path("", "data.csv").is_err());
    assert!(object_path("a/b", "data.csv").is_err());
    assert!(object_path("bucket", "").is_err());
}
