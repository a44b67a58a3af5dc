//! Field normalization for raw spreadsheet cells.
//!
//! Source workbooks mix cell types freely: an accession number may arrive as
//! the integer 115011, the float artifact 115011.0, or the text "115011"; a
//! year column holds both 2012.0 and annotated values like "[2012]". These
//! functions coerce every variant into a canonical `Option<String>` so the
//! classifier compares like with like. None of them can fail: unparsable text
//! is passed through verbatim so downstream integer parsing rejects it
//! explicitly instead of silently.

use serde::{Deserialize, Serialize};

/// A raw spreadsheet cell as delivered by the ingestion boundary.
///
/// Modeled as an explicit tagged union rather than a dynamic value so the
/// normalization branches below are exhaustive. JSON `null` or an absent
/// field deserializes to `Empty`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Text(String),
    #[default]
    Empty,
}

/// Normalize a free-text cell: trim, blank becomes None.
pub fn normalize_text(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Empty => None,
        CellValue::Integer(i) => Some(i.to_string()),
        CellValue::Float(f) => Some(f.to_string()),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    }
}

/// Normalize an accession-number cell.
///
/// Whole-number values (including float artifacts like 115011.0 and numeric
/// text) collapse to their integer textual form. Anything else is returned as
/// trimmed text unchanged; the classifier decides whether to reject it.
pub fn normalize_accession(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Empty => None,
        CellValue::Integer(i) => Some(i.to_string()),
        CellValue::Float(f) => {
            if f.fract() == 0.0 {
                Some((*f as i64).to_string())
            } else {
                Some(f.to_string())
            }
        }
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Ok(i) = trimmed.parse::<i64>() {
                return Some(i.to_string());
            }
            // Numeric artifact in text form, e.g. "115011.0"
            if let Ok(f) = trimmed.parse::<f64>() {
                if f.fract() == 0.0 {
                    return Some((f as i64).to_string());
                }
            }
            Some(trimmed.to_string())
        }
    }
}

/// Normalize a cell that may hold either a number or annotated text.
///
/// Whole-number floats lose the trailing `.0` (2012.0 -> "2012") while
/// genuine fractions survive (2012.5 -> "2012.5"). Text is only trimmed:
/// bracketed or annotated values like "[2012]" must not be eaten by a
/// destructive float coercion.
pub fn normalize_numeric_or_text(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Empty => None,
        CellValue::Integer(i) => Some(i.to_string()),
        CellValue::Float(f) => {
            if f.fract() == 0.0 {
                Some((*f as i64).to_string())
            } else {
                Some(f.to_string())
            }
        }
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cells_normalize_to_none() {
        assert_eq!(normalize_text(&CellValue::Empty), None);
        assert_eq!(normalize_accession(&CellValue::Empty), None);
        assert_eq!(normalize_numeric_or_text(&CellValue::Empty), None);
    }

    #[test]
    fn text_is_trimmed() {
        let cell = CellValue::Text("  A History of Libraries  ".to_string());
        assert_eq!(
            normalize_text(&cell).as_deref(),
            Some("A History of Libraries")
        );
    }

    #[test]
    fn blank_text_normalizes_to_none() {
        let cell = CellValue::Text("   ".to_string());
        assert_eq!(normalize_text(&cell), None);
        assert_eq!(normalize_numeric_or_text(&cell), None);
    }

    #[test]
    fn accession_float_artifact_collapses_to_integer() {
        assert_eq!(
            normalize_accession(&CellValue::Float(115011.0)).as_deref(),
            Some("115011")
        );
        assert_eq!(
            normalize_accession(&CellValue::Text("115011.0".to_string())).as_deref(),
            Some("115011")
        );
    }

    #[test]
    fn accession_unparsable_text_passes_through_verbatim() {
        let cell = CellValue::Text("A-123".to_string());
        assert_eq!(normalize_accession(&cell).as_deref(), Some("A-123"));
    }

    #[test]
    fn numeric_or_text_whole_float_loses_fractional_zero() {
        assert_eq!(
            normalize_numeric_or_text(&CellValue::Float(2012.0)).as_deref(),
            Some("2012")
        );
    }

    #[test]
    fn numeric_or_text_keeps_genuine_fraction() {
        assert_eq!(
            normalize_numeric_or_text(&CellValue::Float(2012.5)).as_deref(),
            Some("2012.5")
        );
    }

    #[test]
    fn numeric_or_text_preserves_annotated_text() {
        let cell = CellValue::Text("[2012]".to_string());
        assert_eq!(normalize_numeric_or_text(&cell).as_deref(), Some("[2012]"));
    }

    #[test]
    fn cell_value_deserializes_from_mixed_json() {
        let row: Vec<CellValue> =
            serde_json::from_str(r#"[115011, 2012.5, "text", null]"#).unwrap();
        assert_eq!(row[0], CellValue::Integer(115011));
        assert_eq!(row[1], CellValue::Float(2012.5));
        assert_eq!(row[2], CellValue::Text("text".to_string()));
        assert_eq!(row[3], CellValue::Empty);
    }
}
