//! Aligned text tables
//!
//! Renders a 2-D array as whitespace-separated columns: values
//! right-aligned, optional row labels left-aligned in front, optional
//! column-number header. Float columns share one decimal count (at most
//! [`FLOAT_PRECISION`], trailing zeros common to the column trimmed) so the
//! decimal points line up.

use ndarray::ArrayView2;

/// Maximum decimals printed for floats
pub const FLOAT_PRECISION: usize = 6;

/// Spacing between columns
const COLUMN_GAP: &str = "  ";

/// Options for [`render`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Print a header line with 0-based column numbers
    pub header: bool,
    /// Print a row label column
    pub index: bool,
    /// Label of the first row when `index` is set
    pub index_start: usize,
}

impl RenderOptions {
    /// Row labels starting at 1, no header
    pub const ONE_BASED_ROWS: Self = Self {
        header: false,
        index: true,
        index_start: 1,
    };

    /// Values only
    pub const BARE: Self = Self {
        header: false,
        index: false,
        index_start: 0,
    };
}

/// Cell types that can be formatted a whole column at a time
pub trait CellFormat: Copy {
    fn format_column(column: &[Self]) -> Vec<String>;
}

impl CellFormat for f64 {
    fn format_column(column: &[Self]) -> Vec<String> {
        let decimals = column
            .iter()
            .filter(|value| value.is_finite())
            .map(|&value| needed_decimals(value))
            .max()
            .unwrap_or(0)
            .max(1);
        column
            .iter()
            .map(|&value| format_float(value, decimals))
            .collect()
    }
}

impl CellFormat for usize {
    fn format_column(column: &[Self]) -> Vec<String> {
        column.iter().map(|value| value.to_string()).collect()
    }
}

/// Decimals left after trimming trailing zeros at full precision
fn needed_decimals(value: f64) -> usize {
    let text = format!("{:.*}", FLOAT_PRECISION, value);
    text.split_once('.')
        .map(|(_, fraction)| fraction.trim_end_matches('0').len())
        .unwrap_or(0)
}

fn format_float(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{:.*}", decimals, value)
    }
}

/// Render `table` as aligned text, one line per row, without a trailing newline
pub fn render<T: CellFormat>(table: ArrayView2<'_, T>, options: RenderOptions) -> String {
    let (rows, cols) = table.dim();
    if rows == 0 {
        return String::new();
    }

    let mut columns: Vec<Vec<String>> = (0..cols)
        .map(|col| {
            let values = table.column(col).to_vec();
            T::format_column(&values)
        })
        .collect();
    if options.header {
        for (col, cells) in columns.iter_mut().enumerate() {
            cells.insert(0, col.to_string());
        }
    }
    let widths: Vec<usize> = columns
        .iter()
        .map(|cells| cells.iter().map(String::len).max().unwrap_or(0))
        .collect();

    let labels: Option<Vec<String>> = options.index.then(|| {
        let mut labels: Vec<String> = (0..rows)
            .map(|row| (row + options.index_start).to_string())
            .collect();
        if options.header {
            labels.insert(0, String::new());
        }
        labels
    });
    let label_width = labels
        .as_ref()
        .and_then(|labels| labels.iter().map(String::len).max())
        .unwrap_or(0);

    let line_count = rows + usize::from(options.header);
    let mut lines = Vec::with_capacity(line_count);
    for line in 0..line_count {
        let mut cells = Vec::with_capacity(cols + 1);
        if let Some(labels) = &labels {
            cells.push(format!("{:<width$}", labels[line], width = label_width));
        }
        for (cells_in_col, &width) in columns.iter().zip(&widths) {
            cells.push(format!("{:>width$}", cells_in_col[line], width = width));
        }
        lines.push(cells.join(COLUMN_GAP));
    }
    lines.join("\n")
}
