//! Compact notation for sectioned records.
//!
//! The encoder turns a [`SectionedRecord`] into a token-efficient text
//! block, one stanza per section:
//!
//! ```text
//! VITAL_SIGNS[2]{Date,BP,HR}:
//!   2024-01-01,120/80,72
//!   2024-02-01,118/76,70
//!
//! ```
//!
//! The stanza header carries the section name, row count, and headers;
//! each data row is one indented comma-joined line; a blank line closes
//! every stanza so downstream parsers see consistent separation.
//!
//! Encoding is lossless for section order, header order, and row content.
//! Cells containing the `,` delimiter are out of contract and are passed
//! through unescaped.
//!
//! [`decode`] is the symmetric line-based parser, used by tests and by
//! tooling that needs to inspect what the oracle was shown.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::record::{Section, SectionedRecord};

const INDENT: &str = "  ";

lazy_static! {
    /// `SECTION_NAME[row_count]{comma,joined,headers}:`
    static ref STANZA_HEADER: Regex =
        Regex::new(r"^(?P<name>[^\[\]{}]+)\[(?P<count>\d+)\]\{(?P<headers>.*)\}:$").unwrap();
}

/// Encode a sectioned record into compact notation.
///
/// Sections missing headers or holding zero rows contribute no stanza;
/// everything else is emitted in input order. This function never fails:
/// an empty record encodes to an empty string.
pub fn encode(record: &SectionedRecord) -> String {
    let mut out = String::new();

    for section in &record.sections {
        if section.headers.is_empty() || section.rows.is_empty() {
            continue;
        }

        out.push_str(&section.name);
        out.push('[');
        out.push_str(&section.rows.len().to_string());
        out.push_str("]{");
        out.push_str(&section.headers.join(","));
        out.push_str("}:\n");

        for row in &section.rows {
            out.push_str(INDENT);
            out.push_str(&row.join(","));
            out.push('\n');
        }

        out.push('\n');
    }

    out
}

/// Errors from [`decode`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("line {line_no} is not a stanza header: '{line}'")]
    MalformedHeader { line_no: usize, line: String },

    #[error("line {line_no}: data row appears outside any stanza")]
    RowOutsideStanza { line_no: usize },

    #[error("stanza '{section}' declares {declared} rows but contains {actual}")]
    RowCountMismatch {
        section: String,
        declared: usize,
        actual: usize,
    },
}

/// Parse compact notation back into a [`SectionedRecord`].
///
/// Symmetric with [`encode`]: for any record the encoder accepts,
/// `decode(&encode(r))` recovers the same section names, header lists,
/// and row contents in the same order.
pub fn decode(input: &str) -> Result<SectionedRecord, DecodeError> {
    let mut sections: Vec<Section> = Vec::new();
    let mut open: Option<(Section, usize)> = None;

    for (i, line) in input.lines().enumerate() {
        let line_no = i + 1;

        // Indent is checked before blankness: a row of all-empty cells
        // encodes to an indent-only line, which is not a separator.
        if let Some(values) = line.strip_prefix(INDENT) {
            let Some((section, _)) = open.as_mut() else {
                return Err(DecodeError::RowOutsideStanza { line_no });
            };
            section
                .rows
                .push(values.split(',').map(String::from).collect());
            continue;
        }

        if line.trim().is_empty() {
            if let Some(closed) = open.take() {
                sections.push(close_stanza(closed)?);
            }
            continue;
        }

        let Some(caps) = STANZA_HEADER.captures(line) else {
            return Err(DecodeError::MalformedHeader {
                line_no,
                line: line.to_string(),
            });
        };

        // A new header implicitly closes an unterminated stanza.
        if let Some(closed) = open.take() {
            sections.push(close_stanza(closed)?);
        }

        let declared: usize = caps["count"].parse().unwrap_or(0);
        open = Some((
            Section {
                name: caps["name"].to_string(),
                headers: caps["headers"].split(',').map(String::from).collect(),
                rows: Vec::new(),
            },
            declared,
        ));
    }

    if let Some(closed) = open.take() {
        sections.push(close_stanza(closed)?);
    }

    Ok(SectionedRecord { sections })
}

fn close_stanza((section, declared): (Section, usize)) -> Result<Section, DecodeError> {
    if section.rows.len() != declared {
        return Err(DecodeError::RowCountMismatch {
            section: section.name,
            declared,
            actual: section.rows.len(),
        });
    }
    Ok(section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::UppercaseBoundary;
    use proptest::prelude::*;

    fn section(name: &str, headers: &[&str], rows: &[&[&str]]) -> Section {
        Section {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_encode_single_section() {
        let record = SectionedRecord {
            sections: vec![section(
                "VITAL_SIGNS",
                &["Date", "BP", "HR"],
                &[&["2024-01-01", "120/80", "72"]],
            )],
        };

        assert_eq!(
            encode(&record),
            "VITAL_SIGNS[1]{Date,BP,HR}:\n  2024-01-01,120/80,72\n\n"
        );
    }

    #[test]
    fn test_short_row_scenario_from_raw_input() {
        // One section, headers [Date, BP, HR], one row short by a cell:
        // the emitted row carries a trailing empty cell.
        let raw: Vec<Vec<String>> = vec![
            vec!["VITAL SIGNS".into()],
            vec!["Date".into(), "BP".into(), "HR".into()],
            vec!["2024-01-01".into(), "120/80".into()],
        ];
        let record = SectionedRecord::from_rows(&raw, &UppercaseBoundary::new());

        assert_eq!(
            encode(&record),
            "VITAL_SIGNS[1]{Date,BP,HR}:\n  2024-01-01,120/80,\n\n"
        );
    }

    #[test]
    fn test_sections_without_rows_emit_nothing() {
        let record = SectionedRecord {
            sections: vec![
                section("MEDICATIONS", &["Drug", "Dose"], &[]),
                section("LABS", &["Test"], &[&["HbA1c"]]),
            ],
        };

        assert_eq!(encode(&record), "LABS[1]{Test}:\n  HbA1c\n\n");
    }

    #[test]
    fn test_empty_record_encodes_to_empty_string() {
        assert_eq!(encode(&SectionedRecord::default()), "");
    }

    #[test]
    fn test_decode_recovers_record() {
        let record = SectionedRecord {
            sections: vec![
                section("DEMOGRAPHICS", &["Age", "Sex"], &[&["54", "F"]]),
                section(
                    "VITAL_SIGNS",
                    &["Date", "BP"],
                    &[&["2024-01-01", "120/80"], &["2024-02-01", "118/76"]],
                ),
            ],
        };

        let decoded = decode(&encode(&record)).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_decode_rejects_row_count_mismatch() {
        let input = "LABS[3]{Test}:\n  HbA1c\n\n";
        assert!(matches!(
            decode(input),
            Err(DecodeError::RowCountMismatch { declared: 3, actual: 1, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_orphan_row() {
        let input = "  HbA1c,6.1\n";
        assert!(matches!(
            decode(input),
            Err(DecodeError::RowOutsideStanza { line_no: 1 })
        ));
    }

    #[test]
    fn test_decode_rejects_malformed_header() {
        let input = "not a stanza header\n";
        assert!(matches!(
            decode(input),
            Err(DecodeError::MalformedHeader { line_no: 1, .. })
        ));
    }

    // Strategies stay inside the encoding contract: no delimiter or
    // structural characters inside cells, which the format declares out
    // of scope.
    fn cell() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 ./-]{0,12}"
    }

    fn section_strategy() -> impl Strategy<Value = Section> {
        ("[A-Z][A-Z_]{0,10}", 1usize..5).prop_flat_map(|(name, width)| {
            (
                Just(name),
                proptest::collection::vec(cell(), width..=width),
                proptest::collection::vec(
                    proptest::collection::vec(cell(), width..=width),
                    1..6,
                ),
            )
                .prop_map(|(name, headers, rows)| Section { name, headers, rows })
        })
    }

    proptest! {
        #[test]
        fn prop_round_trip(sections in proptest::collection::vec(section_strategy(), 0..4)) {
            let record = SectionedRecord { sections };
            let decoded = decode(&encode(&record)).unwrap();
            prop_assert_eq!(decoded, record);
        }

        #[test]
        fn prop_encode_is_idempotent(sections in proptest::collection::vec(section_strategy(), 0..4)) {
            let record = SectionedRecord { sections };
            prop_assert_eq!(encode(&record), encode(&record));
        }

        #[test]
        fn prop_rows_fit_header_width(
            width in 1usize..6,
            row_len in 0usize..9,
        ) {
            // Build raw input with one section whose data row has an
            // arbitrary length; ingestion must pad or truncate to the
            // header width exactly.
            let headers: Vec<String> = (0..width).map(|i| format!("H{i}")).collect();
            let data: Vec<String> = (0..row_len).map(|i| format!("v{i}")).collect();
            let raw = vec![vec!["SECTION".to_string()], headers, data.clone()];

            let record = SectionedRecord::from_rows(&raw, &UppercaseBoundary::new());
            let section = &record.sections[0];

            if data.is_empty() {
                // An empty row is blank and never advances a section.
                prop_assert!(section.rows.is_empty());
            } else {
                prop_assert_eq!(section.rows[0].len(), width);
                for (i, cell) in section.rows[0].iter().enumerate() {
                    if i < row_len {
                        prop_assert_eq!(cell, &format!("v{i}"));
                    } else {
                        prop_assert_eq!(cell, "");
                    }
                }
            }
        }
    }
}
