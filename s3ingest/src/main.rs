//! Load a CSV file from S3 into PostgreSQL, or register it with AWS Glue as an
//! external table if the database load fails.

#![warn(rust_2018_idioms, unused_extern_crates, clippy::all)]

use clap::Parser;

use crate::catalog::CatalogRegistrar;
use crate::clouds::aws::{glue::GlueCatalog, AwsCli};
use crate::common::*;
use crate::config::{ConnectionConfig, DatabaseUrl, TableName};
use crate::fetcher::S3Fetcher;
use crate::loader::postgres::PostgresLoader;
use crate::logging::LogFormat;
use crate::orchestrator::{run_transfer, TransferOutcome};

mod catalog;
mod clouds;
mod config;
mod dataset;
mod fetcher;
mod loader;
mod logging;
mod orchestrator;
mod status;
mod tls;

/// Definitions included by all the files in this crate.
#[allow(unused_imports)]
pub(crate) mod common {
    pub(crate) use anyhow::{format_err, Context as _, Error, Result};
    pub(crate) use async_trait::async_trait;
    pub(crate) use tracing::{
        debug, debug_span, error, info, instrument, trace, warn, Instrument,
    };
    pub(crate) use url::Url;
}

/// Command-line options. Every option may also be supplied through the
/// environment.
#[derive(Parser)]
#[command(
    name = "s3ingest",
    version,
    about = "Load a CSV file from S3 into PostgreSQL, falling back to an AWS Glue table.",
    after_help = r#"EXAMPLE:
    S3_BUCKET=bucket CSV_KEY=path/data.csv RDS_HOST=db.example.com ... s3ingest
"#
)]
struct Opt {
    /// The S3 bucket containing the CSV file.
    #[arg(long, env = "S3_BUCKET")]
    s3_bucket: String,

    /// The key of the CSV file within the bucket.
    #[arg(long, env = "CSV_KEY")]
    csv_key: String,

    /// The PostgreSQL host.
    #[arg(long, env = "RDS_HOST")]
    rds_host: String,

    /// The PostgreSQL port.
    #[arg(long, env = "RDS_PORT", default_value_t = 5432)]
    rds_port: u16,

    /// The PostgreSQL user.
    #[arg(long, env = "RDS_USER")]
    rds_user: String,

    /// The PostgreSQL password.
    #[arg(long, env = "RDS_PASS", hide_env_values = true)]
    rds_pass: String,

    /// The PostgreSQL database.
    #[arg(long, env = "RDS_DB")]
    rds_db: String,

    /// The table to replace, optionally as `schema.table`.
    #[arg(long, env = "RDS_TABLE")]
    rds_table: String,

    /// The Glue database to use if the PostgreSQL load fails.
    #[arg(long, env = "GLUE_DB")]
    glue_db: String,

    /// The Glue table to register if the PostgreSQL load fails.
    #[arg(long, env = "GLUE_TABLE")]
    glue_table: String,

    /// The `s3://` location the Glue table should point at.
    #[arg(long, env = "GLUE_S3_LOCATION")]
    glue_s3_location: String,

    /// The `aws` command-line tool to run.
    #[arg(long, env = "AWS_CLI", default_value = "aws")]
    aws_cli: String,

    /// How to format diagnostic logs on stderr.
    #[arg(long, env = "S3INGEST_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

impl Opt {
    /// Build our run configuration.
    fn to_config(&self) -> Result<ConnectionConfig> {
        let database_url = DatabaseUrl::from_parts(
            &self.rds_host,
            self.rds_port,
            &self.rds_user,
            &self.rds_pass,
            &self.rds_db,
        )?;
        Ok(ConnectionConfig {
            s3_bucket: self.s3_bucket.clone(),
            csv_key: self.csv_key.clone(),
            database_url,
            table_name: self.rds_table.parse::<TableName>()?,
            glue_database: self.glue_db.clone(),
            glue_table: self.glue_table.clone(),
            glue_s3_location: self.glue_s3_location.clone(),
            aws_cli: self.aws_cli.clone(),
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let opt = Opt::parse();
    opt.log_format.install()?;
    let config = opt.to_config()?;
    debug!("configuration: {:?}", config);

    let cli = AwsCli::new(config.aws_cli.clone());
    let fetcher = S3Fetcher::new(cli.clone());
    let loader =
        PostgresLoader::new(config.database_url.clone(), config.table_name.clone());
    let registrar = CatalogRegistrar::new(Box::new(GlueCatalog::new(cli)));

    let outcome = run_transfer(&config, &fetcher, &loader, &registrar)
        .instrument(debug_span!("s3ingest", version = env!("CARGO_PKG_VERSION")))
        .await?;
    match outcome {
        TransferOutcome::LoadedIntoDatabase { rows } => {
            info!("loaded {} rows into {}", rows, config.table_name);
        }
        TransferOutcome::RegisteredInCatalog {
            registration,
            load_error,
        } => {
            warn!(
                "registered {}.{} in catalog (database {}, table {}) after load error: {:#}",
                config.glue_database,
                config.glue_table,
                registration.database,
                registration.table,
                load_error,
            );
        }
    }
    Ok(())
}

#[test]
fn cli_definition_is_valid() {
    use clap::CommandFactory;
    Opt::command().debug_assert();
}
