//! Problem files in the libsvm format
//!
//! One instance per line:
//! `label index:value index:value ...`
//!
//! Example:
//! +1 1:0.5 3:1.2 7:0.8
//! 3 2:0.3 5:2.1
//!
//! Feature indices are 1-based and strictly increasing. Index 0 is only meaningful for
//! precomputed-kernel rows, where it carries the row id. Labels are kept as written.

use crate::core::{Problem, Result, SVMError, SparseVector};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read a problem from any buffered reader
///
/// Empty lines and lines starting with `#` are skipped.
pub fn read_problem<R: BufRead>(reader: R) -> Result<Problem> {
    let mut problem = Problem::default();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (x, y) = parse_line(line).map_err(|message| SVMError::ParseError {
            line: line_num + 1,
            message,
        })?;
        problem.push(x, y);
    }

    Ok(problem)
}

/// Read a problem file
pub fn load_problem<P: AsRef<Path>>(path: P) -> Result<Problem> {
    let file = File::open(path)?;
    read_problem(BufReader::new(file))
}

/// Parse one non-empty line into a vector and its label
fn parse_line(line: &str) -> std::result::Result<(SparseVector, f64), String> {
    let mut parts = line.split_whitespace();

    let label_str = parts.next().ok_or("missing label")?;
    let label = label_str
        .parse::<f64>()
        .map_err(|_| format!("invalid label: {label_str}"))?;

    let mut indices: Vec<usize> = Vec::new();
    let mut values = Vec::new();

    for feature in parts {
        let (index, value) = feature
            .split_once(':')
            .ok_or_else(|| format!("invalid feature format: {feature}"))?;

        let index = index
            .parse::<usize>()
            .map_err(|_| format!("invalid feature index: {index}"))?;
        let value = value
            .parse::<f64>()
            .map_err(|_| format!("invalid feature value: {value}"))?;

        if let Some(&prev) = indices.last() {
            if index <= prev {
                return Err(format!(
                    "feature indices must be ascending: {index} follows {prev}"
                ));
            }
        }

        indices.push(index);
        values.push(value);
    }

    Ok((SparseVector { indices, values }, label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_line_basic() {
        let (x, y) = parse_line("+1 1:0.5 3:1.2").unwrap();

        assert_eq!(y, 1.0);
        assert_eq!(x.indices, vec![1, 3]);
        assert_eq!(x.values, vec![0.5, 1.2]);
    }

    #[test]
    fn test_labels_kept_as_written() {
        let (_, y) = parse_line("3 1:1.0").unwrap();
        assert_eq!(y, 3.0);

        let (_, y) = parse_line("-0.25 1:1.0").unwrap();
        assert_eq!(y, -0.25);

        let (x, _) = parse_line("2").unwrap();
        assert!(x.is_empty());
    }

    #[test]
    fn test_parse_line_invalid_format() {
        assert!(parse_line("+1 1").is_err());
        assert!(parse_line("+1 abc:1.0").is_err());
        assert!(parse_line("+1 1:abc").is_err());
        assert!(parse_line("x 1:1").is_err());
        assert!(parse_line("+1 3:1 2:1").is_err());
        assert!(parse_line("+1 2:1 2:1").is_err());
    }

    #[test]
    fn test_precomputed_row_id() {
        let (x, _) = parse_line("1 0:4 1:0.5 2:0.25").unwrap();
        assert_eq!(x.indices, vec![0, 1, 2]);
        assert_eq!(x.values[0], 4.0);
    }

    #[test]
    fn test_read_problem_skips_blank_and_comments() {
        let data = "# Comment line\n+1 1:0.5\n\n# Another comment\n-1 2:0.3\n";
        let problem = read_problem(Cursor::new(data)).unwrap();

        assert_eq!(problem.len(), 2);
        assert_eq!(problem.y, vec![1.0, -1.0]);
        assert_eq!(problem.max_index(), 2);
    }

    #[test]
    fn test_read_problem_reports_line() {
        let data = "+1 1:0.5\n\n-1 2:oops\n";
        match read_problem(Cursor::new(data)) {
            Err(SVMError::ParseError { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("oops"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_large_dimension_handling() {
        let data = "+1 1:1.0 1000:2.0 5000:3.0\n-1 2:1.0 500:2.0\n";
        let problem = read_problem(Cursor::new(data)).unwrap();

        assert_eq!(problem.max_index(), 5000);
        assert_eq!(problem.x[0].indices, vec![1, 1000, 5000]);
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(temp_file, "+1 1:0.5 3:1.2").expect("Failed to write");
        writeln!(temp_file, "2 2:0.3 5:2.1").expect("Failed to write");
        temp_file.flush().expect("Failed to flush");

        let problem = load_problem(temp_file.path()).unwrap();
        assert_eq!(problem.len(), 2);
        assert_eq!(problem.y, vec![1.0, 2.0]);
    }

    #[test]
    fn test_from_file_io_error() {
        let result = load_problem("/non/existent/file.libsvm");
        assert!(matches!(result.unwrap_err(), SVMError::IoError(_)));
    }
}
