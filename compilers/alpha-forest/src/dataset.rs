//! Tabular training data: column 0 is the integer transformation label, the
//! remaining columns are numeric features.

use std::fs;
use std::path::Path;

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, space0},
    combinator::{all_consuming, map},
    multi::separated_list1,
    number::complete::double,
    sequence::{delimited, preceded, terminated},
    IResult,
};

use crate::DatasetError;

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    label_name: String,
    feature_names: Vec<String>,
    labels: Vec<i32>,
    rows: Vec<Vec<f32>>,
}

impl Dataset {
    pub fn new(
        label_name: impl Into<String>,
        feature_names: Vec<String>,
        labels: Vec<i32>,
        rows: Vec<Vec<f32>>,
    ) -> Result<Self, DatasetError> {
        if rows.is_empty() {
            return Err(DatasetError::Empty);
        }
        if labels.len() != rows.len() {
            return Err(DatasetError::Ragged {
                line: 0,
                expected: rows.len(),
                found: labels.len(),
            });
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != feature_names.len() {
                return Err(DatasetError::Ragged {
                    line: i + 1,
                    expected: feature_names.len(),
                    found: row.len(),
                });
            }
            check_finite(row, i + 1)?;
        }
        Ok(Self {
            label_name: label_name.into(),
            feature_names,
            labels,
            rows,
        })
    }

    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let text = fs::read_to_string(path)?;
        Self::from_csv(&text)
    }

    /// Parses a comma separated table with a header row.
    pub fn from_csv(text: &str) -> Result<Self, DatasetError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
            .filter(|(_, l)| !l.trim().is_empty());

        let (header_line, header) = lines.next().ok_or(DatasetError::MissingHeader)?;
        let mut columns = parse_header(header).map_err(|message| DatasetError::Syntax {
            line: header_line,
            message,
        })?;
        let label_name = columns.remove(0);

        let mut labels = Vec::new();
        let mut rows = Vec::new();
        for (line, text) in lines {
            let mut values =
                parse_row(text).map_err(|message| DatasetError::Syntax { line, message })?;
            if values.len() != columns.len() + 1 {
                return Err(DatasetError::Ragged {
                    line,
                    expected: columns.len() + 1,
                    found: values.len(),
                });
            }
            let label = values.remove(0);
            if label.fract() != 0.0 || label < i32::MIN as f64 || label > i32::MAX as f64 {
                return Err(DatasetError::NonIntegerLabel { line, value: label });
            }
            let row: Vec<f32> = values.into_iter().map(|v| v as f32).collect();
            check_finite(&row, line)?;
            labels.push(label as i32);
            rows.push(row);
        }

        Self::new(label_name, columns, labels, rows)
    }

    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Split thresholds are midpoints between cell values, so every cell must be
/// finite once narrowed to `f32`. Columns count from the label column.
fn check_finite(row: &[f32], line: usize) -> Result<(), DatasetError> {
    match row.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(DatasetError::NonFinite { line, column: i + 1 }),
        None => Ok(()),
    }
}

fn column_name(input: &str) -> IResult<&str, String> {
    preceded(
        space0,
        terminated(
            alt((
                map(delimited(char('"'), take_while(|c: char| c != '"'), char('"')), str::to_string),
                map(take_while1(|c: char| c != ',' && c != '"'), |s: &str| {
                    s.trim().to_string()
                }),
            )),
            space0,
        ),
    )(input)
}

fn cell(input: &str) -> IResult<&str, f64> {
    delimited(space0, double, space0)(input)
}

fn parse_header(line: &str) -> Result<Vec<String>, String> {
    all_consuming(separated_list1(char(','), column_name))(line)
        .map(|(_, columns)| columns)
        .map_err(|e| format!("malformed header: {}", e))
}

fn parse_row(line: &str) -> Result<Vec<f64>, String> {
    all_consuming(separated_list1(char(','), cell))(line)
        .map(|(_, values)| values)
        .map_err(|e| format!("malformed row: {}", e))
}
