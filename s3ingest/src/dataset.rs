//! In-memory tables parsed from CSV.

use std::{collections::HashSet, io::Read};

use crate::common::*;

/// A table of untyped string cells, with named columns.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct TabularDataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TabularDataset {
    /// Create a dataset, checking that every row is as wide as the header.
    ///
    /// Column names are normalized with [`normalize_column_names`], so every
    /// column has a unique, non-empty name.
    pub(crate) fn new<C, R>(columns: Vec<C>, rows: Vec<Vec<R>>) -> Result<Self>
    where
        C: Into<String>,
        R: Into<String>,
    {
        let columns =
            normalize_column_names(columns.into_iter().map(Into::into).collect());
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect::<Vec<String>>())
            .collect::<Vec<_>>();
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(format_err!(
                    "row {} has {} cells, but there are {} columns",
                    idx + 1,
                    row.len(),
                    columns.len(),
                ));
            }
        }
        Ok(TabularDataset { columns, rows })
    }

    /// Parse CSV data with a header row.
    ///
    /// Rows shorter than the header are padded with empty cells, which load
    /// as NULL. Rows longer than the header are an error.
    pub(crate) fn from_csv_reader<R: Read>(rdr: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(rdr);
        let columns = rdr
            .headers()
            .context("cannot read CSV header")?
            .iter()
            .map(|h| h.to_owned())
            .collect::<Vec<_>>();
        if columns.is_empty() {
            return Err(format_err!("CSV data has no header row"));
        }

        let mut rows = vec![];
        for (idx, record) in rdr.records().enumerate() {
            let record =
                record.with_context(|| format!("cannot parse CSV row {}", idx + 1))?;
            if record.len() > columns.len() {
                return Err(format_err!(
                    "CSV row {} has {} cells, but there are only {} columns",
                    idx + 1,
                    record.len(),
                    columns.len(),
                ));
            }
            let mut row = record.iter().map(|cell| cell.to_owned()).collect::<Vec<_>>();
            row.resize(columns.len(), String::new());
            rows.push(row);
        }
        trace!("parsed {} CSV rows with {} columns", rows.len(), columns.len());
        TabularDataset::new(columns, rows)
    }

    /// Our column names, in order.
    pub(crate) fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Our rows, in order.
    pub(crate) fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Serialize this dataset as CSV, including a header row.
    pub(crate) fn to_csv(&self) -> Result<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(&self.columns)
            .context("cannot write CSV header")?;
        for row in &self.rows {
            wtr.write_record(row).context("cannot write CSV row")?;
        }
        wtr.into_inner()
            .map_err(|err| format_err!("cannot flush CSV data: {}", err.error()))
    }
}

/// Give every column a usable SQL name.
///
/// A blank name at position `i` becomes `Unnamed: i`. A repeated name gets a
/// numeric suffix (`name.1`, `name.2`, ...) that does not clash with any other
/// column. The first occurrence of a name is never renamed.
fn normalize_column_names(columns: Vec<String>) -> Vec<String> {
    let named = columns
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            if name.trim().is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                name
            }
        })
        .collect::<Vec<_>>();

    let originals = named.iter().cloned().collect::<HashSet<_>>();
    let mut used = HashSet::new();
    let mut normalized = Vec::with_capacity(named.len());
    for name in named {
        let name = if used.contains(&name) {
            let mut n = 1;
            loop {
                let candidate = format!("{}.{}", name, n);
                if !used.contains(&candidate) && !originals.contains(&candidate) {
                    break candidate;
                }
                n += 1;
            }
        } else {
            name
        };
        used.insert(name.clone());
        normalized.push(name);
    }
    normalized
}
