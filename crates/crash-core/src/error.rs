use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the crash-stats pipeline.
#[derive(Error, Debug)]
pub enum CrashError {
    /// A file could not be opened, read or written.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive container itself is unreadable.
    #[error("Failed to open archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// A year partition does not contain the expected dataset file.
    #[error("Partition {partition} has no entry {entry}")]
    MissingPartition { partition: String, entry: String },

    /// Entry bytes are not valid Windows-1250 text.
    #[error("Failed to decode {entry}: byte 0x{byte:02X} at offset {offset} is not Windows-1250")]
    Decode {
        entry: String,
        offset: usize,
        byte: u8,
    },

    /// A partition file decoded fine but holds no HTML table.
    #[error("No table found in {entry}")]
    NoTable { entry: String },

    /// A column required by a pipeline stage is absent.
    #[error("Required column missing: {column}")]
    MissingColumn { column: String },

    /// A date did not match the strict `DD.MM.YYYY` format.
    #[error("Malformed date {value:?} in record {id}")]
    MalformedDate { id: String, value: String },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON document could not be produced or parsed.
    #[error("Failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the crash-stats crates.
pub type Result<T> = std::result::Result<T, CrashError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = CrashError::FileRead {
            path: PathBuf::from("/data/data_23_24.zip"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/data_23_24.zip"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_missing_partition() {
        let err = CrashError::MissingPartition {
            partition: "2024".to_string(),
            entry: "2024/Inehody.xls".to_string(),
        };
        assert_eq!(err.to_string(), "Partition 2024 has no entry 2024/Inehody.xls");
    }

    #[test]
    fn test_error_display_decode() {
        let err = CrashError::Decode {
            entry: "2023/Inasledky.xls".to_string(),
            offset: 17,
            byte: 0x81,
        };
        assert_eq!(
            err.to_string(),
            "Failed to decode 2023/Inasledky.xls: byte 0x81 at offset 17 is not Windows-1250"
        );
    }

    #[test]
    fn test_error_display_no_table() {
        let err = CrashError::NoTable {
            entry: "2023/Inehody.xls".to_string(),
        };
        assert_eq!(err.to_string(), "No table found in 2023/Inehody.xls");
    }

    #[test]
    fn test_error_display_missing_column() {
        let err = CrashError::MissingColumn {
            column: "p4a".to_string(),
        };
        assert_eq!(err.to_string(), "Required column missing: p4a");
    }

    #[test]
    fn test_error_display_malformed_date() {
        let err = CrashError::MalformedDate {
            id: "A1".to_string(),
            value: "2023-13-01".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed date \"2023-13-01\" in record A1");
    }

    #[test]
    fn test_error_display_config() {
        let err = CrashError::Config("empty dataset token".to_string());
        assert_eq!(err.to_string(), "Configuration error: empty dataset token");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CrashError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: CrashError = json_err.into();
        assert!(err.to_string().contains("Failed to process JSON"));
    }
}
