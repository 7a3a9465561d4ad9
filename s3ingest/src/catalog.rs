//! Registering external tables in a metadata catalog.

use std::fmt;

use crate::common::*;
use crate::status::Status;

/// How many placeholder columns our fallback tables declare.
///
/// The column list does not depend on the data, so readers of a fallback table
/// see `col1`..`col20` no matter how many columns the CSV file really has.
pub(crate) const GENERIC_COLUMN_COUNT: usize = 20;

/// The catalog type of every placeholder column.
pub(crate) const GENERIC_COLUMN_TYPE: &str = "string";

/// Hadoop input format for plain delimited text.
pub(crate) const TEXT_INPUT_FORMAT: &str = "org.apache.hadoop.mapred.TextInputFormat";

/// Hadoop output format for plain delimited text.
pub(crate) const TEXT_OUTPUT_FORMAT: &str =
    "org.apache.hadoop.hive.ql.io.HiveIgnoreKeyTextOutputFormat";

/// Hive SerDe for delimited text.
pub(crate) const DELIMITED_TEXT_SERDE: &str =
    "org.apache.hadoop.hive.serde2.lazy.LazySimpleSerDe";

/// The table type for tables whose data lives outside the catalog.
pub(crate) const EXTERNAL_TABLE: &str = "EXTERNAL_TABLE";

/// A column in a catalog table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct CatalogColumn {
    pub(crate) name: String,
    pub(crate) data_type: String,
}

/// An external table definition pointing at delimited text in object storage.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct CatalogTableDefinition {
    pub(crate) name: String,
    pub(crate) columns: Vec<CatalogColumn>,
    pub(crate) location: String,
    pub(crate) input_format: &'static str,
    pub(crate) output_format: &'static str,
    pub(crate) serialization_library: &'static str,
    pub(crate) delimiter: char,
    pub(crate) table_type: &'static str,
}

impl CatalogTableDefinition {
    /// Describe comma-delimited text at `location`, using
    /// [`GENERIC_COLUMN_COUNT`] placeholder string columns.
    pub(crate) fn delimited_text(name: &str, location: &str) -> Self {
        let columns = (1..=GENERIC_COLUMN_COUNT)
            .map(|i| CatalogColumn {
                name: format!("col{}", i),
                data_type: GENERIC_COLUMN_TYPE.to_owned(),
            })
            .collect();
        CatalogTableDefinition {
            name: name.to_owned(),
            columns,
            location: location.to_owned(),
            input_format: TEXT_INPUT_FORMAT,
            output_format: TEXT_OUTPUT_FORMAT,
            serialization_library: DELIMITED_TEXT_SERDE,
            delimiter: ',',
            table_type: EXTERNAL_TABLE,
        }
    }
}

/// The result of asking a catalog to create something.
#[derive(Debug)]
pub(crate) enum CreateOutcome {
    /// We created it.
    Created,
    /// It was already there, which is fine.
    AlreadyPresent,
    /// Anything else went wrong.
    Failed(Error),
}

/// Whether a catalog object was created or already existed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Presence {
    Created,
    AlreadyPresent,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presence::Created => write!(f, "created"),
            Presence::AlreadyPresent => write!(f, "already present"),
        }
    }
}

impl CreateOutcome {
    /// Treat [`CreateOutcome::AlreadyPresent`] as success, and return any
    /// other failure as an error.
    fn into_presence(self) -> Result<Presence> {
        match self {
            CreateOutcome::Created => Ok(Presence::Created),
            CreateOutcome::AlreadyPresent => Ok(Presence::AlreadyPresent),
            CreateOutcome::Failed(err) => Err(err),
        }
    }
}

/// A metadata catalog that can record databases and external tables.
///
/// Implementations must report "already exists" as
/// [`CreateOutcome::AlreadyPresent`], however their service signals it.
#[async_trait]
pub(crate) trait Catalog: Send + Sync {
    /// Create a database named `name`.
    async fn create_database(&self, name: &str) -> CreateOutcome;

    /// Create `table` inside `database`.
    async fn create_table(
        &self,
        database: &str,
        table: &CatalogTableDefinition,
    ) -> CreateOutcome;
}

/// What [`CatalogRegistrar::register`] did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Registration {
    pub(crate) database: Presence,
    pub(crate) table: Presence,
}

/// Makes sure an external table is registered, creating it and its database
/// only if needed.
pub(crate) struct CatalogRegistrar {
    catalog: Box<dyn Catalog>,
}

impl CatalogRegistrar {
    pub(crate) fn new(catalog: Box<dyn Catalog>) -> Self {
        CatalogRegistrar { catalog }
    }

    /// Ensure that `database` exists and contains `table`.
    #[instrument(level = "debug", skip(self, table), fields(table = %table.name))]
    pub(crate) async fn register(
        &self,
        database: &str,
        table: &CatalogTableDefinition,
    ) -> Result<Registration> {
        let database_presence = self
            .catalog
            .create_database(database)
            .await
            .into_presence()
            .with_context(|| format!("could not create catalog database {}", database))?;
        debug!("catalog database {}: {}", database, database_presence);

        let table_presence = self
            .catalog
            .create_table(database, table)
            .await
            .into_presence()
            .with_context(|| {
                format!("could not create catalog table {}.{}", database, table.name)
            })?;
        match table_presence {
            Presence::Created => {
                Status::Success.print("Fallback: catalog table registered")
            }
            Presence::AlreadyPresent => {
                Status::Info.print("Catalog table already exists")
            }
        }

        Ok(Registration {
            database: database_presence,
            table: table_presence,
        })
    }
}
