//! Loot export handling: keep the guild's rows, then read the cutoff back from the first kept row.
//!
//! The export is `;`-delimited with a header row. Values are kept as strings end to end, so the
//! formatted file repeats every kept value exactly as it appeared in the export.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, Terminator, WriterBuilder};
use tracing::debug;

use crate::config::{MergeConfig, CUTOFF_FORMAT};
use crate::error::MergeError;
use crate::paths::OutputLayout;
use crate::timestamp::parse_exact;

/// Rows of a delimited file in file order; every row has exactly `headers.len()` values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LootTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl LootTable {
    /// Index of the named column, if present.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Value of `column` in row `row`.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column(column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }

    /// Rows whose `column` equals `value` exactly, header kept, order kept.
    pub fn filter_eq(&self, column: &str, value: &str) -> Result<LootTable, MergeError> {
        let idx = self
            .column(column)
            .ok_or_else(|| MergeError::MissingColumn(column.to_string()))?;
        let rows = self
            .rows
            .iter()
            .filter(|r| r.get(idx).map(String::as_str) == Some(value))
            .cloned()
            .collect();
        Ok(LootTable {
            headers: self.headers.clone(),
            rows,
        })
    }
}

/// Reads a delimited file with a header row. Blank lines are skipped; short rows are padded with
/// empty values and rows wider than the header are rejected.
pub fn read_table(path: &Path, delimiter: u8) -> Result<LootTable, MergeError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|e| MergeError::csv(path, e))?;
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| MergeError::csv(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() {
        return Err(MergeError::NoColumns(path.to_path_buf()));
    }
    let width = headers.len();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| MergeError::csv(path, e))?;
        if record.len() > width {
            return Err(MergeError::RowWidth {
                path: path.to_path_buf(),
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: width,
                found: record.len(),
            });
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(width, String::new());
        rows.push(row);
    }
    Ok(LootTable { headers, rows })
}

/// Writes header and rows, overwriting `path`.
pub fn write_table(table: &LootTable, path: &Path, delimiter: u8) -> Result<(), MergeError> {
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(|e| MergeError::csv(path, e))?;
    wtr.write_record(&table.headers)
        .map_err(|e| MergeError::csv(path, e))?;
    for row in &table.rows {
        wtr.write_record(row).map_err(|e| MergeError::csv(path, e))?;
    }
    wtr.flush().map_err(|e| MergeError::io(path, e))?;
    Ok(())
}

/// Keeps the guild's rows of `input` and writes them to `layout.formatted`, creating
/// `layout.dir` first. Returns the written path.
pub fn process_loot_file(
    input: &Path,
    layout: &OutputLayout,
    config: &MergeConfig,
) -> Result<PathBuf, MergeError> {
    let table = read_table(input, config.delimiter)?;
    let kept = table.filter_eq(&config.guild_column, &config.guild)?;
    debug!(
        input = %input.display(),
        rows = table.rows.len(),
        kept = kept.rows.len(),
        "filtered loot export"
    );
    fs::create_dir_all(&layout.dir).map_err(|e| MergeError::io(&layout.dir, e))?;
    write_table(&kept, &layout.formatted, config.delimiter)?;
    Ok(layout.formatted.clone())
}

/// Replaces a fractional-seconds tail with `Z`: `...12:00:00.123456Z` -> `...12:00:00Z`.
pub fn normalize_cutoff(raw: &str) -> Cow<'_, str> {
    match raw.split_once('.') {
        Some((head, _)) => Cow::Owned(format!("{}Z", head)),
        None => Cow::Borrowed(raw),
    }
}

/// Normalizes and parses a `timestamp_utc` value with [`CUTOFF_FORMAT`].
pub fn normalize_and_parse(raw: &str) -> Option<NaiveDateTime> {
    parse_exact(&normalize_cutoff(raw), CUTOFF_FORMAT)
}

/// Cutoff instant from the first data row of the formatted file.
pub fn read_cutoff(formatted: &Path, config: &MergeConfig) -> Result<NaiveDateTime, MergeError> {
    let table = read_table(formatted, config.delimiter)?;
    if table.rows.is_empty() {
        return Err(MergeError::EmptyTable(formatted.to_path_buf()));
    }
    let raw = table
        .get(0, &config.timestamp_column)
        .ok_or_else(|| MergeError::MissingColumn(config.timestamp_column.clone()))?;
    normalize_and_parse(raw).ok_or_else(|| MergeError::Timestamp {
        value: normalize_cutoff(raw).into_owned(),
        format: CUTOFF_FORMAT,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const EXPORT: &str = "\
timestamp_utc;looted_by__name;looted_by__guild;item_id;quantity
2024-05-01T10:00:00.500000Z;Alice;Other Guild;T4_BAG;1
2024-05-01T12:00:00.123456Z;Bob;Smurfing Monkeys;T5_CAPE;2
2024-05-01T12:30:00Z;Carol;smurfing monkeys;T6_MAIN_SWORD;1
2024-05-01T13:00:00Z;Dave;Smurfing Monkeys;T4_POTION;10
";

    fn layout_in(dir: &Path, name: &str) -> OutputLayout {
        OutputLayout::for_input(dir, Path::new(name), &MergeConfig::default())
    }

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_read_table_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("loot.csv");
        fs::write(&input, EXPORT).unwrap();
        let table = read_table(&input, b';').unwrap();
        assert_eq!(table.headers.len(), 5);
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.get(1, "looted_by__name"), Some("Bob"));
    }

    #[test]
    fn test_read_table_pads_short_rows() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("short.csv");
        fs::write(&input, "a;b;c\n1;2\n").unwrap();
        let table = read_table(&input, b';').unwrap();
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
    }

    #[test]
    fn test_read_table_rejects_wide_rows() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("wide.csv");
        fs::write(&input, "a;b\n1;2;3\n").unwrap();
        let err = read_table(&input, b';').unwrap_err();
        assert!(matches!(err, MergeError::RowWidth { expected: 2, found: 3, .. }));
    }

    #[test]
    fn test_read_table_empty_file_has_no_columns() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.csv");
        fs::write(&input, "").unwrap();
        assert!(matches!(read_table(&input, b';'), Err(MergeError::NoColumns(_))));
    }

    #[test]
    fn test_read_table_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_table(&dir.path().join("nope.csv"), b';').unwrap_err();
        assert!(matches!(err, MergeError::Csv { .. }));
    }

    #[test]
    fn test_filter_eq_exact_match_in_order() {
        let table = LootTable {
            headers: vec!["g".into(), "n".into()],
            rows: vec![
                vec!["Smurfing Monkeys".into(), "1".into()],
                vec!["Smurfing Monkeys ".into(), "2".into()],
                vec!["x".into(), "3".into()],
                vec!["Smurfing Monkeys".into(), "4".into()],
            ],
        };
        let kept = table.filter_eq("g", "Smurfing Monkeys").unwrap();
        let names: Vec<&str> = kept.rows.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(names, vec!["1", "4"]);
        assert_eq!(kept.headers, table.headers);
    }

    #[test]
    fn test_filter_eq_missing_column() {
        let table = LootTable {
            headers: vec!["a".into()],
            rows: vec![vec!["1".into()]],
        };
        let err = table.filter_eq("looted_by__guild", "x").unwrap_err();
        assert!(matches!(err, MergeError::MissingColumn(c) if c == "looted_by__guild"));
    }

    #[test]
    fn test_process_loot_file_writes_guild_rows() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("loot.csv");
        fs::write(&input, EXPORT).unwrap();
        let layout = layout_in(dir.path(), "loot.csv");
        let out = process_loot_file(&input, &layout, &MergeConfig::default()).unwrap();
        assert_eq!(out, dir.path().join("loot").join("loot_formatted.txt"));
        let content = fs::read_to_string(&out).unwrap();
        assert_eq!(
            content,
            "timestamp_utc;looted_by__name;looted_by__guild;item_id;quantity\n\
             2024-05-01T12:00:00.123456Z;Bob;Smurfing Monkeys;T5_CAPE;2\n\
             2024-05-01T13:00:00Z;Dave;Smurfing Monkeys;T4_POTION;10\n"
        );
    }

    #[test]
    fn test_process_loot_file_no_matches_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("other.csv");
        fs::write(&input, "timestamp_utc;looted_by__guild\n2024-05-01T12:00:00Z;Nobody\n").unwrap();
        let layout = layout_in(dir.path(), "other.csv");
        let out = process_loot_file(&input, &layout, &MergeConfig::default()).unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), "timestamp_utc;looted_by__guild\n");
    }

    #[test]
    fn test_process_loot_file_missing_column_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.csv");
        fs::write(&input, "timestamp_utc;guild\n2024-05-01T12:00:00Z;Smurfing Monkeys\n").unwrap();
        let layout = layout_in(dir.path(), "bad.csv");
        let err = process_loot_file(&input, &layout, &MergeConfig::default()).unwrap_err();
        assert!(matches!(err, MergeError::MissingColumn(_)));
        assert!(!layout.dir.exists());
    }

    #[test]
    fn test_process_loot_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("loot.csv");
        fs::write(&input, EXPORT).unwrap();
        let layout = layout_in(dir.path(), "loot.csv");
        let config = MergeConfig::default();
        let out = process_loot_file(&input, &layout, &config).unwrap();
        let first = fs::read(&out).unwrap();
        process_loot_file(&input, &layout, &config).unwrap();
        assert_eq!(fs::read(&out).unwrap(), first);
    }

    #[test]
    fn test_process_loot_file_keeps_quoted_values() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("quoted.csv");
        fs::write(
            &input,
            "item;looted_by__guild\n\"Sword; Elder\";Smurfing Monkeys\n",
        )
        .unwrap();
        let layout = layout_in(dir.path(), "quoted.csv");
        let out = process_loot_file(&input, &layout, &MergeConfig::default()).unwrap();
        let table = read_table(&out, b';').unwrap();
        assert_eq!(table.get(0, "item"), Some("Sword; Elder"));
    }

    #[test]
    fn test_normalize_cutoff() {
        assert_eq!(normalize_cutoff("2024-05-01T12:00:00.123456Z"), "2024-05-01T12:00:00Z");
        assert_eq!(normalize_cutoff("2024-05-01T12:00:00Z"), "2024-05-01T12:00:00Z");
        assert_eq!(normalize_cutoff("2024-05-01T12:00:00.5"), "2024-05-01T12:00:00Z");
    }

    #[test]
    fn test_normalize_and_parse_fraction_and_plain_agree() {
        let expected = dt(2024, 5, 1, 12, 0, 0);
        assert_eq!(normalize_and_parse("2024-05-01T12:00:00.123456Z"), Some(expected));
        assert_eq!(normalize_and_parse("2024-05-01T12:00:00Z"), Some(expected));
    }

    #[test]
    fn test_normalize_and_parse_rejects_leading_space() {
        assert_eq!(normalize_and_parse(" 2024-05-01T12:00:00Z"), None);
        assert_eq!(normalize_and_parse(" 2024-05-01T12:00:00.123456Z"), None);
        assert_eq!(normalize_and_parse("2024-05-01T12:00:60Z"), None);
    }

    #[test]
    fn test_read_cutoff_leading_space_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("x_formatted.txt");
        fs::write(&f, "timestamp_utc;looted_by__guild\n 2024-05-01T12:00:00Z;Smurfing Monkeys\n").unwrap();
        let err = read_cutoff(&f, &MergeConfig::default()).unwrap_err();
        assert!(matches!(err, MergeError::Timestamp { .. }));
    }

    #[test]
    fn test_normalize_and_parse_rejects_other_shapes() {
        assert_eq!(normalize_and_parse(""), None);
        assert_eq!(normalize_and_parse("2024-05-01 12:00:00"), None);
        assert_eq!(normalize_and_parse("2024-05-01T12:00:00"), None);
        assert_eq!(normalize_and_parse("2024-05-01T12:00:00+00:00"), None);
        assert_eq!(normalize_and_parse("05/01/2024 12:00:00"), None);
    }

    #[test]
    fn test_read_cutoff_error_names_normalized_value() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("x_formatted.txt");
        fs::write(&f, "timestamp_utc;looted_by__guild\ngarbage.99;Smurfing Monkeys\n").unwrap();
        let err = read_cutoff(&f, &MergeConfig::default()).unwrap_err();
        assert!(matches!(err, MergeError::Timestamp { ref value, .. } if value == "garbageZ"));
    }

    #[test]
    fn test_read_cutoff_from_first_row() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("loot.csv");
        fs::write(&input, EXPORT).unwrap();
        let layout = layout_in(dir.path(), "loot.csv");
        let config = MergeConfig::default();
        let out = process_loot_file(&input, &layout, &config).unwrap();
        assert_eq!(read_cutoff(&out, &config).unwrap(), dt(2024, 5, 1, 12, 0, 0));
    }

    #[test]
    fn test_read_cutoff_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("x_formatted.txt");
        fs::write(&f, "timestamp_utc;looted_by__guild\n").unwrap();
        let err = read_cutoff(&f, &MergeConfig::default()).unwrap_err();
        assert!(matches!(err, MergeError::EmptyTable(_)));
    }

    #[test]
    fn test_read_cutoff_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("missing_formatted.txt");
        assert!(read_cutoff(&f, &MergeConfig::default()).is_err());
    }

    #[test]
    fn test_read_cutoff_missing_timestamp_column() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("x_formatted.txt");
        fs::write(&f, "when;looted_by__guild\n2024-05-01T12:00:00Z;Smurfing Monkeys\n").unwrap();
        let err = read_cutoff(&f, &MergeConfig::default()).unwrap_err();
        assert!(matches!(err, MergeError::MissingColumn(c) if c == "timestamp_utc"));
    }
}
