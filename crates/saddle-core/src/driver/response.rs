use crate::stmt::RowSet;
use crate::{Error, Result};

#[derive(Debug)]
pub struct Response {
    pub rows: ResponseRows,
}

#[derive(Debug)]
pub enum ResponseRows {
    /// Number of rows impacted by the operation
    Count(u64),

    /// Operation result, as materialized rows
    Rows(RowSet),
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self {
            rows: ResponseRows::Count(count),
        }
    }

    pub fn row_set(rows: RowSet) -> Self {
        Self {
            rows: ResponseRows::Rows(rows),
        }
    }
}

impl ResponseRows {
    pub fn is_count(&self) -> bool {
        matches!(self, Self::Count(_))
    }

    pub fn is_rows(&self) -> bool {
        matches!(self, Self::Rows(_))
    }

    pub fn into_count(self) -> Result<u64> {
        match self {
            Self::Count(count) => Ok(count),
            Self::Rows(rows) => Err(Error::invalid_result(format!(
                "expected an affected-row count, got {} result rows",
                rows.len()
            ))),
        }
    }

    pub fn into_rows(self) -> Result<RowSet> {
        match self {
            Self::Rows(rows) => Ok(rows),
            Self::Count(count) => Err(Error::invalid_result(format!(
                "expected result rows, got an affected-row count of {count}"
            ))),
        }
    }
}
