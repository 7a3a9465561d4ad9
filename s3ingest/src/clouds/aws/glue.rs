//! AWS Glue as a metadata catalog.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{is_already_exists, AwsCli};
use crate::catalog::{Catalog, CatalogTableDefinition, CreateOutcome};
use crate::common::*;

/// A `DatabaseInput` structure for `aws glue create-database`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DatabaseInput<'a> {
    name: &'a str,
}

/// A `TableInput` structure for `aws glue create-table`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TableInput<'a> {
    name: &'a str,
    storage_descriptor: StorageDescriptor<'a>,
    table_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StorageDescriptor<'a> {
    columns: Vec<Column<'a>>,
    location: &'a str,
    input_format: &'a str,
    output_format: &'a str,
    serde_info: SerDeInfo<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Column<'a> {
    name: &'a str,
    #[serde(rename = "Type")]
    data_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SerDeInfo<'a> {
    serialization_library: &'a str,
    parameters: BTreeMap<&'static str, String>,
}

impl<'a> From<&'a CatalogTableDefinition> for TableInput<'a> {
    fn from(table: &'a CatalogTableDefinition) -> Self {
        let mut parameters = BTreeMap::new();
        parameters.insert("field.delim", table.delimiter.to_string());
        TableInput {
            name: &table.name,
            storage_descriptor: StorageDescriptor {
                columns: table
                    .columns
                    .iter()
                    .map(|c| Column {
                        name: &c.name,
                        data_type: &c.data_type,
                    })
                    .collect(),
                location: &table.location,
                input_format: table.input_format,
                output_format: table.output_format,
                serde_info: SerDeInfo {
                    serialization_library: table.serialization_library,
                    parameters,
                },
            },
            table_type: table.table_type,
        }
    }
}

/// Convert the result of an `aws glue create-*` command.
fn create_outcome(result: Result<Vec<u8>>) -> CreateOutcome {
    match result {
        Ok(_) => CreateOutcome::Created,
        Err(err) if is_already_exists(&err) => CreateOutcome::AlreadyPresent,
        Err(err) => CreateOutcome::Failed(err),
    }
}

/// The Glue Data Catalog, accessed through `aws glue`.
pub(crate) struct GlueCatalog {
    cli: AwsCli,
}

impl GlueCatalog {
    pub(crate) fn new(cli: AwsCli) -> Self {
        GlueCatalog { cli }
    }
}

#[async_trait]
impl Catalog for GlueCatalog {
    #[instrument(level = "debug", name = "glue::create_database", skip(self))]
    async fn create_database(&self, name: &str) -> CreateOutcome {
        let input = match serde_json::to_string(&DatabaseInput { name }) {
            Ok(input) => input,
            Err(err) => return CreateOutcome::Failed(err.into()),
        };
        create_outcome(
            self.cli
                .run("glue", &["create-database", "--database-input", &input])
                .await,
        )
    }

    #[instrument(
        level = "debug",
        name = "glue::create_table",
        skip(self, table),
        fields(table = %table.name)
    )]
    async fn create_table(
        &self,
        database: &str,
        table: &CatalogTableDefinition,
    ) -> CreateOutcome {
        let input = match serde_json::to_string(&TableInput::from(table)) {
            Ok(input) => input,
            Err(err) => return CreateOutcome::Failed(err.into()),
        };
        create_outcome(
            self.cli
                .run(
                    "glue",
                    &[
                        "create-table",
                        "--database-name",
                        database,
                        "--table-input",
                        &input,
                    ],
                )
                .await,
        )
    }
}
