//! MNIST-in-CSV dataset parsing.
//!
//! Format, one sample per line:
//!   `<label>,<pixel0>,<pixel1>,...`
//! - the label is a non-negative integer class index
//! - pixels are greyscale intensities in `[0, 255]`
//! - an optional header line (a non-numeric first cell) is skipped
//! - blank lines are skipped

use std::path::Path;

use crate::data::sample::Sample;
use crate::error::DatasetError;

const PIXEL_RANGE: std::ops::RangeInclusive<f64> = 0.0..=255.0;

/// Reads and parses a dataset file. See `parse_records`.
pub fn load_csv<P: AsRef<Path>>(path: P, n_classes: usize) -> Result<Vec<Sample>, DatasetError> {
    let text = std::fs::read_to_string(path)?;
    parse_records(&text, n_classes)
}

/// Parses dataset text into samples.
///
/// Every label must be below `n_classes` and every row must carry as many
/// pixels as the first one. Errors report the 1-based line number.
pub fn parse_records(text: &str, n_classes: usize) -> Result<Vec<Sample>, DatasetError> {
    let mut samples: Vec<Sample> = Vec::new();
    let mut seen_content = false;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        // Header detection only applies to the first non-blank line.
        if !seen_content {
            seen_content = true;
            if is_header(line) {
                continue;
            }
        }

        let sample = parse_line(line, line_no, n_classes)?;
        if let Some(first) = samples.first() {
            if sample.pixels.len() != first.pixels.len() {
                return Err(row_error(
                    line_no,
                    format!(
                        "pixel count {} does not match first row's {}",
                        sample.pixels.len(),
                        first.pixels.len()
                    ),
                ));
            }
        }
        samples.push(sample);
    }

    if samples.is_empty() {
        return Err(DatasetError::Empty);
    }
    Ok(samples)
}

fn parse_line(line: &str, line_no: usize, n_classes: usize) -> Result<Sample, DatasetError> {
    let mut cells = line.split(',').map(str::trim);

    let label_cell = cells.next().unwrap_or("");
    let label: usize = label_cell.parse().map_err(|_| {
        row_error(line_no, format!("label '{}' is not a non-negative integer", label_cell))
    })?;
    if label >= n_classes {
        return Err(row_error(line_no, format!("label {} >= n_classes {}", label, n_classes)));
    }

    let pixels = cells
        .map(|cell| {
            let value: f64 = cell
                .parse()
                .map_err(|_| row_error(line_no, format!("'{}' is not a valid number", cell)))?;
            if !PIXEL_RANGE.contains(&value) {
                return Err(row_error(line_no, format!("pixel {} outside 0..=255", value)));
            }
            Ok(value)
        })
        .collect::<Result<Vec<f64>, DatasetError>>()?;

    if pixels.is_empty() {
        return Err(row_error(line_no, "row has a label but no pixels".into()));
    }
    Ok(Sample::new(label, pixels))
}

/// Returns `true` if the row looks like a header: its label cell is not a
/// number. Data rows with a bad pixel fall through to `parse_line` and fail.
fn is_header(line: &str) -> bool {
    let label = line.split(',').next().unwrap_or("").trim();
    !label.is_empty() && label.parse::<f64>().is_err()
}

fn row_error(line: usize, reason: String) -> DatasetError {
    DatasetError::Row { line, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_skips_header_and_blanks() {
        let text = "label,p0,p1,p2\n3,0,128,255\n\n7, 10, 20, 30\n";
        let samples = parse_records(text, 10).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], Sample::new(3, vec![0.0, 128.0, 255.0]));
        assert_eq!(samples[1].label, 7);
        assert!(samples[1].inputs().iter().all(|&v| (0.01..=1.0).contains(&v)));
    }

    #[test]
    fn rejects_label_out_of_range() {
        match parse_records("12,0,0\n", 10) {
            Err(DatasetError::Row { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_pixel_with_line_number() {
        match parse_records("1,0,0\n2,0,x\n", 10) {
            Err(DatasetError::Row { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("'x'"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(parse_records("1,0,256\n", 10), Err(DatasetError::Row { .. })));
    }

    #[test]
    fn rejects_bad_pixel_on_first_row() {
        match parse_records("5,0,abc\n3,1,2\n", 10) {
            Err(DatasetError::Row { line, reason }) => {
                assert_eq!(line, 1);
                assert!(reason.contains("'abc'"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn blank_lines_before_header_keep_line_numbers() {
        match parse_records("\nlabel,p0\n1,0\n2,x\n", 10) {
            Err(DatasetError::Row { line, .. }) => assert_eq!(line, 4),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn rejects_ragged_rows() {
        assert!(matches!(
            parse_records("1,0,0,0\n2,0,0\n", 10),
            Err(DatasetError::Row { line: 2, .. })
        ));
    }

    #[test]
    fn header_only_is_empty() {
        assert!(matches!(parse_records("label,a,b\n\n", 10), Err(DatasetError::Empty)));
    }
}
