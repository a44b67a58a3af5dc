//! Display-name derivation from raw author strings.
//!
//! Source rows store authors as "surname,given name[,qualifiers...]" but the
//! display catalog wants "given name surname [qualifiers]". When a row carries
//! no explicit display-name cell, the importer derives one here.

/// Derive a display name from a raw author string.
///
/// Both the ASCII comma and the full-width variant count as separators.
/// Returns None when no derivation is possible: no comma at all, or fewer
/// than two non-empty segments after splitting.
///
/// "Papadopoulos,Maria,Dr" -> "Maria Papadopoulos Dr"
pub fn derive_display_name(author: &str) -> Option<String> {
    if !author.contains(',') && !author.contains('，') {
        return None;
    }

    let normalized = author.replace('，', ",");
    let parts: Vec<&str> = normalized
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.len() < 2 {
        return None;
    }

    let surname = parts[0];
    let given = parts[1];
    let mut result = format!("{} {}", given, surname);
    if parts.len() > 2 {
        result.push(' ');
        result.push_str(&parts[2..].join(" "));
    }

    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surname_and_given_name_are_swapped() {
        assert_eq!(
            derive_display_name("Papadopoulos,Maria").as_deref(),
            Some("Maria Papadopoulos")
        );
    }

    #[test]
    fn extra_qualifiers_are_appended() {
        assert_eq!(
            derive_display_name("Papadopoulos,Maria,Dr").as_deref(),
            Some("Maria Papadopoulos Dr")
        );
    }

    #[test]
    fn full_width_commas_are_separators() {
        assert_eq!(
            derive_display_name("Papadopoulos，Maria，Dr").as_deref(),
            Some("Maria Papadopoulos Dr")
        );
    }

    #[test]
    fn no_comma_yields_none() {
        assert_eq!(derive_display_name("Papadopoulos"), None);
    }

    #[test]
    fn single_segment_yields_none() {
        // A trailing comma splits into one non-empty segment only.
        assert_eq!(derive_display_name("Papadopoulos,"), None);
        assert_eq!(derive_display_name(",,"), None);
    }

    #[test]
    fn segments_are_trimmed() {
        assert_eq!(
            derive_display_name(" Papadopoulos , Maria ").as_deref(),
            Some("Maria Papadopoulos")
        );
    }
}
