//! Replacing PostgreSQL tables.

use std::str::FromStr;

use bytes::Bytes;
use futures::{pin_mut, SinkExt};
use itertools::Itertools;
use tokio_postgres::{Client, Config};

use super::RelationalLoader;
use crate::common::*;
use crate::config::{DatabaseUrl, Ident, TableName};
use crate::dataset::TabularDataset;
use crate::tls::rustls_client_config;

/// Connect to the database, using TLS if the server supports it.
#[instrument(level = "trace")]
pub(crate) async fn connect(url: &DatabaseUrl) -> Result<Client> {
    let config = Config::from_str(url.with_password().as_str())
        .context("could not configure PostgreSQL connection")?;
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(rustls_client_config()?);
    let (client, connection) = config
        .connect(tls)
        .await
        .with_context(|| format!("could not connect to PostgreSQL at {}", url))?;

    // The docs say we need to run this connection object in the background.
    tokio::spawn(
        async move {
            if let Err(err) = connection.await {
                error!("error on PostgreSQL connection: {}", err);
            }
        }
        .instrument(debug_span!("postgres connection")),
    );
    Ok(client)
}

/// `DROP TABLE IF EXISTS` SQL for `table_name`.
fn drop_table_sql(table_name: &TableName) -> String {
    format!("DROP TABLE IF EXISTS {}", table_name.quoted())
}

/// `CREATE TABLE` SQL with one `TEXT` column per dataset column.
fn create_table_sql(table_name: &TableName, columns: &[String]) -> String {
    format!(
        "CREATE TABLE {} ({})",
        table_name.quoted(),
        columns
            .iter()
            .map(|c| format!("{} TEXT", Ident(c)))
            .join(", "),
    )
}

/// `COPY FROM STDIN` SQL for CSV data with a header row.
fn copy_from_stdin_sql(table_name: &TableName, columns: &[String]) -> String {
    format!(
        "COPY {} ({}) FROM STDIN WITH CSV HEADER",
        table_name.quoted(),
        columns.iter().map(|c| Ident(c)).join(", "),
    )
}

/// Loads datasets into a single PostgreSQL table, replacing whatever was there.
pub(crate) struct PostgresLoader {
    url: DatabaseUrl,
    table_name: TableName,
}

impl PostgresLoader {
    pub(crate) fn new(url: DatabaseUrl, table_name: TableName) -> Self {
        PostgresLoader { url, table_name }
    }
}

#[async_trait]
impl RelationalLoader for PostgresLoader {
    #[instrument(
        level = "debug",
        name = "postgres::replace_table",
        skip_all,
        fields(table = %self.table_name)
    )]
    async fn replace_table(&self, dataset: &TabularDataset) -> Result<u64> {
        let columns = dataset.columns();
        if columns.is_empty() {
            return Err(format_err!("cannot create a table with no columns"));
        }
        let data = Bytes::from(dataset.to_csv()?);

        let mut client = connect(&self.url).await?;

        // Everything happens in one transaction, so a failed load leaves any
        // existing table alone.
        let tx = client
            .transaction()
            .await
            .context("could not begin PostgreSQL transaction")?;

        debug!("deleting destination table if exists");
        tx.execute(drop_table_sql(&self.table_name).as_str(), &[])
            .await
            .with_context(|| format!("error deleting existing {}", self.table_name))?;

        debug!("creating destination table");
        tx.execute(create_table_sql(&self.table_name, columns).as_str(), &[])
            .await
            .with_context(|| format!("error creating table {}", self.table_name))?;

        debug!("copying {} bytes of CSV into table", data.len());
        let copy_sql = copy_from_stdin_sql(&self.table_name, columns);
        let sink = tx
            .copy_in::<_, Bytes>(copy_sql.as_str())
            .await
            .with_context(|| format!("error starting copy into {}", self.table_name))?;
        pin_mut!(sink);
        sink.send(data)
            .await
            .with_context(|| format!("error copying data into {}", self.table_name))?;
        let rows = sink
            .finish()
            .await
            .with_context(|| format!("error copying data into {}", self.table_name))?;

        tx.commit()
            .await
            .with_context(|| format!("error committing {}", self.table_name))?;
        Ok(rows)
    }
}
