// src/extract/place.rs

//! Place inference from institution names and raw meta text.

use crate::models::UNSPECIFIED;

use super::Extractor;

impl Extractor {
    /// Infer a place name, trying the institution name first (most
    /// reliable), then the institution together with the full meta
    /// text.
    pub fn infer_place(&self, meta_text: &str, institution: &str) -> String {
        let combined = format!("{institution} {meta_text}");
        for text in [institution, combined.as_str()] {
            if let Some(place) = self.scan_place_candidates(text) {
                return place;
            }
        }
        UNSPECIFIED.to_string()
    }

    /// Scan the text for the first plausible place name.
    ///
    /// Archive and library names anywhere in the text are tried first
    /// (their geographic part is the most reliable signal); after
    /// that, a capitalized phrase only counts as a place when it
    /// follows a locative preposition.
    fn scan_place_candidates(&self, text: &str) -> Option<String> {
        for candidate in self.candidate_phrase.find_iter(text) {
            let name = candidate.as_str().trim();
            let lower = name.to_lowercase();
            if lower.contains("archiv") || lower.contains("bibliothek") {
                if let Some(place) = self.place_from_archive_name(name) {
                    return Some(place);
                }
            }
        }

        for caps in self.locative_phrase.captures_iter(text) {
            let name = caps[1].trim();
            let lower = name.to_lowercase();

            if char_count(name) <= 2 || self.archive_words.contains(lower.as_str()) {
                continue;
            }
            // Archive references contain digits ("D 10/251")
            if name.chars().any(|c| c.is_ascii_digit()) {
                continue;
            }
            // Isolated letter ("F Rep", "D 10")
            if self.isolated_letter.is_match(name) {
                continue;
            }
            // Abbreviation shapes ("BArch", "NRW", "APlGr")
            if is_abbreviation(name) {
                continue;
            }
            if self.multi_dots.is_match(name) {
                continue;
            }

            // Administrative prefixes ("Landkreises Barnim" → "Barnim")
            let cleaned = self.admin_prefix.replace(name, "");
            let cleaned = cleaned.trim();
            if char_count(cleaned) <= 2 {
                continue;
            }

            return Some(cleaned.to_string());
        }
        None
    }

    /// Extract the geographic part of an archive or library name
    /// ("Stadtarchiv Tübingen" → "Tübingen"), falling back to the
    /// Länder-adjective table ("Bayerisches Hauptstaatsarchiv" →
    /// "Bayern").
    fn place_from_archive_name(&self, name: &str) -> Option<String> {
        let stripped = self.archive_strip.replace(name, "");
        let stripped = self.genitive_prefix.replace(stripped.trim(), "").to_string();
        let stripped = self.trailing_junk.replace(stripped.trim(), "");
        let stripped = stripped.trim();

        if char_count(stripped) > 2
            && stripped.chars().next().is_some_and(char::is_uppercase)
            && !self.archive_words.contains(stripped.to_lowercase().as_str())
        {
            return Some(stripped.to_string());
        }

        for (pattern, land) in &self.adjektiv_land {
            if pattern.is_match(name) {
                return Some((*land).to_string());
            }
        }

        None
    }
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// Short token whose second character is uppercase ("NRW", "BArch").
fn is_abbreviation(name: &str) -> bool {
    let chars: Vec<char> = name.chars().collect();
    (2..=8).contains(&chars.len()) && chars[1].is_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new().unwrap()
    }

    #[test]
    fn strips_archive_prefix_from_institution() {
        let e = extractor();
        assert_eq!(e.infer_place("", "Stadtarchiv Tübingen"), "Tübingen");
        assert_eq!(e.infer_place("", "Kreisarchiv des Landkreises Barnim"), "Barnim");
    }

    #[test]
    fn laender_adjective_maps_to_state_name() {
        let e = extractor();
        assert_eq!(e.infer_place("", "Bayerisches Hauptstaatsarchiv"), "Bayern");
        assert_eq!(e.infer_place("", "Sächsisches Staatsarchiv"), "Sachsen");
    }

    #[test]
    fn archive_word_alone_is_not_a_place() {
        let e = extractor();
        assert_eq!(e.infer_place("", "Stadtarchiv"), UNSPECIFIED);
        assert_eq!(e.infer_place("", "Bibliothek"), UNSPECIFIED);
    }

    #[test]
    fn rejects_abbreviations_and_references() {
        let e = extractor();
        assert_eq!(e.infer_place("NRW", ""), UNSPECIFIED);
        assert_eq!(e.infer_place("BArch B 106", ""), UNSPECIFIED);
        assert_eq!(e.infer_place("F Rep 290", ""), UNSPECIFIED);
    }

    #[test]
    fn falls_back_to_meta_text_when_institution_fails() {
        let e = extractor();
        assert_eq!(
            e.infer_place("Protest in Wackersdorf gegen die WAA", ""),
            "Wackersdorf"
        );
    }

    #[test]
    fn plain_place_name_from_meta() {
        let e = extractor();
        assert_eq!(
            e.infer_place("1977, Stadtarchiv Tübingen, D 10/251", "Stadtarchiv Tübingen"),
            "Tübingen"
        );
    }

    #[test]
    fn unspecified_when_no_candidate_survives() {
        let e = extractor();
        assert_eq!(e.infer_place("", ""), UNSPECIFIED);
        assert_eq!(e.infer_place("o. J., 3 Blatt", ""), UNSPECIFIED);
    }
}
