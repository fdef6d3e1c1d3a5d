//! Sectioned patient record model.
//!
//! A patient export is a flat sequence of rows mixing section markers,
//! column headers, and data. `SectionedRecord::from_rows` folds that into
//! named sections, each with its own headers and width-normalized rows.

use crate::boundary::SectionBoundary;

/// One named block of tabular data (e.g. `VITAL_SIGNS`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section name with spaces replaced by underscores.
    pub name: String,

    /// Column headers, captured from the first non-empty row after the
    /// section marker.
    pub headers: Vec<String>,

    /// Data rows. Invariant: every row has exactly `headers.len()` cells.
    pub rows: Vec<Vec<String>>,
}

impl Section {
    fn new(label: &str) -> Self {
        Self {
            name: label.trim().replace(' ', "_"),
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// An ordered sequence of sections. Row and column order is significant
/// and preserved; repeated panels keep their chronological meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionedRecord {
    pub sections: Vec<Section>,
}

impl SectionedRecord {
    /// Fold raw rows into sections.
    ///
    /// Best-effort by design: any textual input produces a record, at
    /// worst an empty one. Rows seen before the first section marker have
    /// no section to belong to and are dropped. Blank rows never start or
    /// advance a section.
    ///
    /// Data rows are normalized to header width: short rows are padded
    /// with empty cells, long rows are truncated. Cells are trimmed of
    /// surrounding whitespace.
    pub fn from_rows(rows: &[Vec<String>], boundary: &dyn SectionBoundary) -> Self {
        let mut sections: Vec<Section> = Vec::new();

        for row in rows {
            if is_blank(row) {
                continue;
            }

            if boundary.is_boundary(row) {
                let label = row
                    .iter()
                    .map(|c| c.trim())
                    .find(|c| !c.is_empty())
                    .unwrap_or("");
                sections.push(Section::new(label));
                continue;
            }

            let Some(section) = sections.last_mut() else {
                // Data before any section marker is unattributable.
                continue;
            };

            let cells: Vec<String> = row.iter().map(|c| c.trim().to_string()).collect();

            if section.headers.is_empty() {
                section.headers = cells;
            } else {
                section.rows.push(fit_to_width(cells, section.headers.len()));
            }
        }

        Self { sections }
    }
}

/// Pad with empty cells or truncate so `cells.len() == width`.
fn fit_to_width(mut cells: Vec<String>, width: usize) -> Vec<String> {
    cells.truncate(width);
    cells.resize(width, String::new());
    cells
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}
