//! Section boundary detection for raw tabular input.
//!
//! Patient exports mark the start of each block (demographics, vitals,
//! labs, ...) with a row holding a single all-uppercase label like
//! `PATIENT DEMOGRAPHICS`. Detection is behind a trait so the convention
//! can be swapped or hardened without touching the encoder.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// One or more uppercase ASCII words separated by whitespace.
    static ref SECTION_LABEL: Regex = Regex::new(r"^[A-Z]+(?:\s+[A-Z]+)*$").unwrap();
}

/// Decides whether a raw row marks the start of a new section.
pub trait SectionBoundary: Send + Sync {
    /// Returns true if `row` is a section marker rather than data.
    fn is_boundary(&self, row: &[String]) -> bool;
}

/// Default convention: a row whose only non-blank cell is an
/// all-uppercase label.
///
/// Trailing blank cells are tolerated because spreadsheet exports pad
/// every row to the widest section.
#[derive(Debug, Clone, Copy, Default)]
pub struct UppercaseBoundary;

impl UppercaseBoundary {
    pub fn new() -> Self {
        Self
    }
}

impl SectionBoundary for UppercaseBoundary {
    fn is_boundary(&self, row: &[String]) -> bool {
        let mut non_blank = row.iter().map(|c| c.trim()).filter(|c| !c.is_empty());

        match (non_blank.next(), non_blank.next()) {
            (Some(label), None) => SECTION_LABEL.is_match(label),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_single_uppercase_cell_is_boundary() {
        let boundary = UppercaseBoundary::new();
        assert!(boundary.is_boundary(&row(&["PATIENT DEMOGRAPHICS"])));
        assert!(boundary.is_boundary(&row(&["VITAL SIGNS"])));
        assert!(boundary.is_boundary(&row(&["LABS"])));
    }

    #[test]
    fn test_padded_boundary_row() {
        let boundary = UppercaseBoundary::new();
        // Spreadsheet exports pad rows with empty trailing cells
        assert!(boundary.is_boundary(&row(&["VITAL SIGNS", "", ""])));
        assert!(boundary.is_boundary(&row(&["", "VITAL SIGNS", ""])));
    }

    #[test]
    fn test_mixed_case_is_not_boundary() {
        let boundary = UppercaseBoundary::new();
        assert!(!boundary.is_boundary(&row(&["Vital Signs"])));
        assert!(!boundary.is_boundary(&row(&["patient demographics"])));
    }

    #[test]
    fn test_data_rows_are_not_boundaries() {
        let boundary = UppercaseBoundary::new();
        assert!(!boundary.is_boundary(&row(&["2024-01-01", "120/80", "72"])));
        assert!(!boundary.is_boundary(&row(&["Date", "BP", "HR"])));
        // Two non-blank cells, even if both uppercase
        assert!(!boundary.is_boundary(&row(&["VITAL", "SIGNS"])));
    }

    #[test]
    fn test_digits_and_punctuation_are_not_labels() {
        let boundary = UppercaseBoundary::new();
        assert!(!boundary.is_boundary(&row(&["VISIT 2"])));
        assert!(!boundary.is_boundary(&row(&["VITAL-SIGNS"])));
    }

    #[test]
    fn test_empty_row_is_not_boundary() {
        let boundary = UppercaseBoundary::new();
        assert!(!boundary.is_boundary(&row(&[])));
        assert!(!boundary.is_boundary(&row(&["", "", ""])));
    }
}
