//! Fixed-width comma separated grid used by the scenario document.
//!
//! Every cell is padded to the longest entry of the whole grid plus one space,
//! cells are joined with `", "`. The padding is cosmetic: records are read
//! back with trimmed fields.

use std::fmt;

use csv::{QuoteStyle, ReaderBuilder, StringRecord, StringRecordsIntoIter, Terminator, Trim, WriterBuilder};

/// Default number of decimals written for floating point cells.
pub const DEFAULT_DECIMALS: usize = 2;

/// Row-major text grid filled cell by cell.
#[derive(Debug, Clone)]
pub struct CsvGrid {
    rows: Vec<Vec<String>>,
    decimals: usize,
    longest_entry: usize,
}

impl CsvGrid {
    pub fn new(decimals: usize) -> Self {
        Self {
            rows: vec![Vec::new()],
            decimals,
            longest_entry: 0,
        }
    }

    /// Appends a text cell to the current row.
    pub fn push_str(&mut self, content: impl Into<String>) {
        let content = content.into();
        self.longest_entry = self.longest_entry.max(content.len());
        if let Some(row) = self.rows.last_mut() {
            row.push(content);
        }
    }

    /// Appends a fixed-point cell. The decimal separator is always `.`.
    pub fn push_float(&mut self, value: f64) {
        let text = format!("{:.*}", self.decimals, value);
        self.push_str(text);
    }

    pub fn push_uint(&mut self, value: u32) {
        self.push_str(value.to_string());
    }

    /// Appends a row of column titles.
    pub fn push_header(&mut self, titles: &[&str]) {
        for title in titles {
            self.push_str(*title);
        }
        self.next_row();
    }

    pub fn next_row(&mut self) {
        self.rows.push(Vec::new());
    }

}

impl fmt::Display for CsvGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.longest_entry + 1;
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        for row in self.rows.iter().filter(|r| !r.is_empty()) {
            // the space after each comma belongs to the following cell
            let cells = row.iter().enumerate().map(|(column, cell)| {
                let padded = format!("{:<width$}", cell, width = width);
                if column == 0 {
                    padded
                } else {
                    format!(" {}", padded)
                }
            });
            writer.write_record(cells).map_err(|_| fmt::Error)?;
        }

        let bytes = writer.into_inner().map_err(|_| fmt::Error)?;
        let text = String::from_utf8(bytes).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

/// Reads `text` as comma separated records, one per line, with trimmed
/// fields. Rows may differ in length and quotes carry no meaning.
pub fn read_records(text: &str) -> StringRecordsIntoIter<&[u8]> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(text.as_bytes())
        .into_records()
}

/// First field of a single line, if it reads as a record.
pub fn first_field(line: &str) -> Option<String> {
    let record: StringRecord = read_records(line).next()?.ok()?;
    record.get(0).map(str::to_string)
}

/// Parses a float field.
pub fn parse_float(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok()
}

/// Parses an unsigned field, accepting integral decimals such as `"2.00"`.
pub fn parse_uint(field: &str) -> Option<u32> {
    let field = field.trim();
    if let Ok(value) = field.parse::<u32>() {
        return Some(value);
    }
    let value = field.parse::<f64>().ok()?;
    if value.fract() == 0.0 && value >= 0.0 && value <= f64::from(u32::MAX) {
        Some(value as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_pads_to_longest_entry() {
        let mut grid = CsvGrid::new(2);
        grid.push_header(&["Longitude", "Offset", "Lanes"]);
        grid.push_float(12.5);
        grid.push_uint(1);
        grid.push_uint(3);
        grid.next_row();

        let text = grid.to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Longitude , Offset    , Lanes     ");
        assert_eq!(lines[1], "12.50     , 1         , 3         ");
    }

    #[test]
    fn test_float_uses_dot_and_decimals() {
        let mut grid = CsvGrid::new(3);
        grid.push_float(-1.23456);
        assert_eq!(grid.to_string().trim(), "-1.235");
    }

    #[test]
    fn test_read_and_parse() {
        let records: Vec<StringRecord> = read_records(" 1.50 ,  2 , x \n\"q\", 4")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 2);

        let fields: Vec<&str> = records[0].iter().collect();
        assert_eq!(fields, vec!["1.50", "2", "x"]);
        assert_eq!(records[0].position().unwrap().line(), 1);
        assert_eq!(records[1].position().unwrap().line(), 2);
        assert_eq!(&records[1][0], "\"q\"");

        assert_eq!(parse_float(fields[0]), Some(1.5));
        assert_eq!(parse_uint(fields[1]), Some(2));
        assert_eq!(parse_uint("2.00"), Some(2));
        assert_eq!(parse_uint("2.5"), None);
        assert_eq!(parse_uint("-1"), None);
        assert_eq!(parse_float(fields[2]), None);
    }

    #[test]
    fn test_first_field() {
        assert_eq!(first_field("  Longitude , Offset").as_deref(), Some("Longitude"));
        assert_eq!(first_field("t").as_deref(), Some("t"));
    }

    #[test]
    fn test_written_grid_reads_back() {
        let mut grid = CsvGrid::new(1);
        grid.push_header(&["t", "x"]);
        grid.push_float(0.5);
        grid.push_float(-3.0);
        grid.next_row();

        let text = grid.to_string();
        let records: Vec<StringRecord> = read_records(&text).collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].iter().collect::<Vec<_>>(), vec!["0.5", "-3.0"]);
    }
}
