//! Record loading: reads station, order and topology files into core types.
//!
//! Every record file is line-oriented. Blank lines are skipped; any other
//! line that fails to parse aborts the whole file, so a batch is either
//! loaded completely or not at all. Also provides format detection
//! (RON/JSON/TOML) and deserialization for configuration files.

use assembly_core::id::ItemIdAllocator;
use assembly_core::item::InventoryItem;
use assembly_core::order::Order;
use assembly_core::pipeline::Link;
use assembly_core::record::{RecordError, Tokenizer};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A file could not be opened or read.
    #[error("unable to open {file}: {source}")]
    Io {
        file: PathBuf,
        source: std::io::Error,
    },

    /// One record of a record file is malformed.
    #[error("{file}:{line}: {source}")]
    Record {
        file: PathBuf,
        line: usize,
        source: RecordError,
    },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The delimiter cannot separate fields within a single line.
    #[error("invalid delimiter {delimiter:?}")]
    InvalidDelimiter { delimiter: char },
}

// ===========================================================================
// Delimiters
// ===========================================================================

/// Build a tokenizer, rejecting delimiters that would split records rather
/// than fields.
pub fn tokenizer_for(delimiter: char) -> Result<Tokenizer, DataLoadError> {
    if matches!(delimiter, '\n' | '\r') {
        return Err(DataLoadError::InvalidDelimiter { delimiter });
    }
    Ok(Tokenizer::new(delimiter))
}

// ===========================================================================
// Record files
// ===========================================================================

/// Parse every non-blank line of `text`. The first failure aborts the batch
/// and reports the 1-based line number.
fn parse_records<T>(
    text: &str,
    origin: &Path,
    mut parse: impl FnMut(&str) -> Result<T, RecordError>,
) -> Result<Vec<T>, DataLoadError> {
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = parse(line).map_err(|source| DataLoadError::Record {
            file: origin.to_path_buf(),
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

fn read(path: &Path) -> Result<String, DataLoadError> {
    std::fs::read_to_string(path).map_err(|source| DataLoadError::Io {
        file: path.to_path_buf(),
        source,
    })
}

/// Parse station records (`name, serial, quantity, description`).
///
/// Ids are drawn from `ids` only if the whole batch parses.
pub fn parse_stations(
    text: &str,
    origin: &Path,
    tokenizer: &Tokenizer,
    ids: &mut ItemIdAllocator,
) -> Result<Vec<InventoryItem>, DataLoadError> {
    let mut scratch = ids.clone();
    let items = parse_records(text, origin, |record| {
        InventoryItem::from_record(scratch.next_id(), record, tokenizer)
    })?;
    *ids = scratch;
    Ok(items)
}

/// Parse order records (`customer, product, item...`).
pub fn parse_orders(
    text: &str,
    origin: &Path,
    tokenizer: &Tokenizer,
) -> Result<Vec<Order>, DataLoadError> {
    parse_records(text, origin, |record| Order::from_record(record, tokenizer))
}

/// Parse topology records (`station[, next station]`).
pub fn parse_topology(
    text: &str,
    origin: &Path,
    tokenizer: &Tokenizer,
) -> Result<Vec<Link>, DataLoadError> {
    parse_records(text, origin, |record| Link::from_record(record, tokenizer))
}

pub fn load_stations(
    path: &Path,
    tokenizer: &Tokenizer,
    ids: &mut ItemIdAllocator,
) -> Result<Vec<InventoryItem>, DataLoadError> {
    let items = parse_stations(&read(path)?, path, tokenizer, ids)?;
    tracing::info!(file = %path.display(), count = items.len(), "loaded stations");
    Ok(items)
}

pub fn load_orders(path: &Path, tokenizer: &Tokenizer) -> Result<Vec<Order>, DataLoadError> {
    let orders = parse_orders(&read(path)?, path, tokenizer)?;
    tracing::info!(file = %path.display(), count = orders.len(), "loaded orders");
    Ok(orders)
}

pub fn load_topology(path: &Path, tokenizer: &Tokenizer) -> Result<Vec<Link>, DataLoadError> {
    let links = parse_topology(&read(path)?, path, tokenizer)?;
    tracing::info!(file = %path.display(), count = links.len(), "loaded topology");
    Ok(links)
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = read(path)?;

    let parse_error = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assembly_core::id::ItemId;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "assembly_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    fn origin() -> &'static Path {
        Path::new("inline.txt")
    }

    // -----------------------------------------------------------------------
    // Record parsing
    // -----------------------------------------------------------------------

    #[test]
    fn stations_get_sequential_ids_across_batches() {
        let mut ids = ItemIdAllocator::new();
        let first = parse_stations(
            "Desk,100000,5,Office desk\nChair,200000,5,Office chair\n",
            origin(),
            &Tokenizer::new(','),
            &mut ids,
        )
        .unwrap();
        let second =
            parse_stations("Lamp|300000|5|Desk lamp", origin(), &Tokenizer::new('|'), &mut ids)
                .unwrap();

        let got: Vec<_> = first.iter().chain(&second).map(|i| (i.id(), i.name())).collect();
        assert_eq!(
            got,
            vec![(ItemId(1), "Desk"), (ItemId(2), "Chair"), (ItemId(3), "Lamp")]
        );
    }

    #[test]
    fn failed_batch_consumes_no_ids() {
        let mut ids = ItemIdAllocator::new();
        let err = parse_stations(
            "Desk,100000,5,Office desk\nChair,lots,5,Office chair",
            origin(),
            &Tokenizer::new(','),
            &mut ids,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            DataLoadError::Record {
                line: 2,
                source: RecordError::InvalidNumber { field: "serial", .. },
                ..
            }
        ));
        assert_eq!(ids.allocated(), 0);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let orders = parse_orders(
            "\nAnn|Office|Desk\n   \nBob|Office|Chair|Lamp\n",
            origin(),
            &Tokenizer::new('|'),
        )
        .unwrap();
        let names: Vec<_> = orders.iter().map(Order::customer).collect();
        assert_eq!(names, vec!["Ann", "Bob"]);
    }

    #[test]
    fn order_without_items_reports_its_line() {
        let err = parse_orders("Ann|Office|Desk\nBob|Office", origin(), &Tokenizer::new('|'))
            .unwrap_err();
        assert_eq!(err.to_string(), "inline.txt:2: order record lists no items");
    }

    #[test]
    fn crlf_records_parse() {
        let links = parse_topology("Desk|Chair\r\nChair\r\n", origin(), &Tokenizer::new('|'))
            .unwrap();
        assert_eq!(links, vec![Link::new("Desk", Some("Chair")), Link::new("Chair", None)]);
    }

    #[test]
    fn newline_delimiter_is_rejected() {
        assert!(matches!(
            tokenizer_for('\n'),
            Err(DataLoadError::InvalidDelimiter { delimiter: '\n' })
        ));
        assert_eq!(tokenizer_for(';').unwrap().delimiter(), ';');
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    #[test]
    fn loads_record_files_from_disk() {
        let dir = make_test_dir("records");
        fs::write(dir.join("stations.txt"), "Desk,1,2,Desk\n").unwrap();
        fs::write(dir.join("orders.txt"), "Ann|Office|Desk\n").unwrap();
        fs::write(dir.join("line.txt"), "Desk\n").unwrap();

        let mut ids = ItemIdAllocator::new();
        let items = load_stations(&dir.join("stations.txt"), &Tokenizer::new(','), &mut ids).unwrap();
        let orders = load_orders(&dir.join("orders.txt"), &Tokenizer::new('|')).unwrap();
        let links = load_topology(&dir.join("line.txt"), &Tokenizer::new('|')).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(orders.len(), 1);
        assert_eq!(links, vec![Link::new("Desk", None)]);
        cleanup(&dir);
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = make_test_dir("missing");
        let path = dir.join("nope.txt");
        let err = load_orders(&path, &Tokenizer::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::Io { ref file, .. } if file == &path));
        assert!(err.to_string().starts_with("unable to open"));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // detect_format / deserialize_file
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("line.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("line.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("line.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        let result = detect_format(Path::new("line.yaml"));
        assert!(matches!(result, Err(DataLoadError::UnsupportedFormat { .. })));
        assert!(detect_format(Path::new("line")).is_err());
    }

    #[test]
    fn deserialize_file_reports_parse_errors() {
        let dir = make_test_dir("bad_json");
        let path = dir.join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let result: Result<serde_json::Value, _> = deserialize_file(&path);
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));
        cleanup(&dir);
    }
}
