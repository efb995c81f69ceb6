use std::path::PathBuf;

use thiserror::Error;

/// Errors from reading a sales CSV file.
///
/// Every variant names the file it came from, since one bad file aborts a
/// run over many.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be opened, read, or parsed as CSV.
    #[error("reading {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The header row lacks a required column.
    #[error("reading {path}: missing required column {column:?}")]
    MissingColumn { path: PathBuf, column: &'static str },

    /// A cell is blank and there is no earlier value to carry forward.
    #[error("reading {path}, line {line}: no value for column {column:?}")]
    MissingValue {
        path: PathBuf,
        line: u64,
        column: &'static str,
    },

    /// The order timestamp is not in any recognised format.
    #[error("reading {path}, line {line}: invalid order timestamp {value:?}")]
    InvalidTimestamp {
        path: PathBuf,
        line: u64,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_message_names_file_and_column() {
        let err = LoadError::MissingColumn {
            path: PathBuf::from("sales_01.csv"),
            column: "商品ID",
        };
        assert_eq!(
            err.to_string(),
            "reading sales_01.csv: missing required column \"商品ID\""
        );
    }

    #[test]
    fn invalid_timestamp_message_names_line_and_value() {
        let err = LoadError::InvalidTimestamp {
            path: PathBuf::from("sales_01.csv"),
            line: 3,
            value: "yesterday".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("\"yesterday\""));
    }
}
