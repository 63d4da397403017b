//! Delimited-text loading into an untyped, column-named table.

use std::{io::Read, path::Path};

use anyhow::Context as _;

use crate::foundation::error::{RaceError, RaceResult};

/// Rows of string fields under a header. Every row has exactly `headers.len()` fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<csv::StringRecord>) -> RaceResult<Self> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != headers.len())
        {
            return Err(RaceError::data(format!(
                "row {} has {} fields, header has {}",
                i + 1,
                row.len(),
                headers.len()
            )));
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[csv::StringRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> RaceResult<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| RaceError::data(format!("missing required column '{name}'")))
    }

    /// Keep only the rows for which `keep` returns true, preserving order.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&csv::StringRecord) -> bool) {
        self.rows.retain(|r| keep(r));
    }

    /// Remove the named columns. Names not present are ignored.
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) {
        let keep: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !names.iter().any(|n| n.as_ref() == h.as_str()))
            .map(|(i, _)| i)
            .collect();

        if keep.len() == self.headers.len() {
            return;
        }

        self.headers = keep.iter().map(|&i| self.headers[i].clone()).collect();
        for row in &mut self.rows {
            *row = keep.iter().map(|&i| &row[i]).collect();
        }
    }
}

pub fn load_csv(path: &Path, delimiter: u8) -> RaceResult<Table> {
    let f = std::fs::File::open(path)
        .with_context(|| format!("open input table '{}'", path.display()))?;
    let table =
        read_csv(f, delimiter).with_context(|| format!("read input table '{}'", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.headers().len(),
        "loaded input table"
    );
    Ok(table)
}

pub fn read_csv<R: Read>(reader: R, delimiter: u8) -> RaceResult<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .context("read header row")?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect::<Vec<_>>();

    let rows = rdr
        .into_records()
        .collect::<Result<Vec<_>, _>>()
        .context("parse data rows")?;

    Table::new(headers, rows)
}
