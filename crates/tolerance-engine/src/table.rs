//! One-row tabulated summary of a tolerance interval computation.
//!
//! The column headers follow the summary sheets users already keep, so a
//! written table can be appended to or compared with existing files.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

/// A single cell of the summary row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableCell {
    Count(usize),
    Real(f64),
    /// Rendered as `N/A` (coverage factor without specification limits)
    NotApplicable,
}

impl From<Option<f64>> for TableCell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(TableCell::NotApplicable, TableCell::Real)
    }
}

impl fmt::Display for TableCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableCell::Count(n) => write!(f, "{n}"),
            // Always with a decimal point, e.g. `0.0`; never `-0.0`
            TableCell::Real(v) => write!(f, "{:?}", v + 0.0),
            TableCell::NotApplicable => f.write_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    columns: Vec<String>,
    row: Vec<TableCell>,
}

impl SummaryTable {
    pub(crate) fn from_pairs(pairs: Vec<(&str, TableCell)>) -> Self {
        let (columns, row) = pairs
            .into_iter()
            .map(|(name, cell)| (name.to_string(), cell))
            .unzip();
        Self { columns, row }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row(&self) -> &[TableCell] {
        &self.row
    }

    /// Look up a cell by column header.
    pub fn get(&self, column: &str) -> Option<&TableCell> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.row[idx])
    }

    /// Write the header and the single data row as comma-separated text.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        wtr.write_record(self.row.iter().map(|cell| cell.to_string()))?;
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> csv::Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl fmt::Display for SummaryTable {
    /// Aligned two-line text rendering for terminals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<String> = self.row.iter().map(|c| c.to_string()).collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&cells)
            .map(|(h, c)| h.len().max(c.len()))
            .collect();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{h:>w$}"))
            .collect();
        let values: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:>w$}"))
            .collect();

        writeln!(f, "{}", header.join("  "))?;
        write!(f, "{}", values.join("  "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> SummaryTable {
        SummaryTable::from_pairs(vec![
            ("mean", TableCell::Real(10.0)),
            ("sample size", TableCell::Count(25)),
            ("k_res", TableCell::NotApplicable),
        ])
    }

    #[test]
    fn test_lookup_by_column() {
        let table = sample_table();
        assert_eq!(table.columns().len(), 3);
        assert_eq!(table.get("sample size"), Some(&TableCell::Count(25)));
        assert_eq!(table.get("k_res"), Some(&TableCell::NotApplicable));
        assert!(table.get("missing").is_none());
    }

    #[test]
    fn test_csv_output() {
        let csv = sample_table().to_csv_string().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec!["mean,sample size,k_res", "10.0,25,N/A"]);
    }

    #[test]
    fn test_real_cells_keep_decimal_point() {
        assert_eq!(TableCell::Real(0.0).to_string(), "0.0");
        assert_eq!(TableCell::Real(1.0).to_string(), "1.0");
        assert_eq!(TableCell::Real(-0.0).to_string(), "0.0");
        assert_eq!(TableCell::Real(2.549).to_string(), "2.549");
        assert_eq!(TableCell::Count(30).to_string(), "30");
    }

    #[test]
    fn test_option_into_cell() {
        assert_eq!(TableCell::from(Some(2.5)), TableCell::Real(2.5));
        assert_eq!(TableCell::from(None), TableCell::NotApplicable);
    }

    #[test]
    fn test_display_aligns_columns() {
        let text = sample_table().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), lines[1].len());
    }

    #[test]
    fn test_json_cells() {
        let json = serde_json::to_string(&sample_table()).unwrap();
        assert!(json.contains("\"sample size\""));
        let back: SummaryTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample_table());
    }
}
