// src/extract/date.rs

//! Period inference from raw meta text.

use crate::models::{UNDATED, UNSPECIFIED};

use super::Extractor;

/// Source phrases that mean "explicitly undated".
const UNDATED_MARKERS: [&str; 3] = ["ohne datum", "undatiert", "s.d."];

impl Extractor {
    /// Infer a period category from free text.
    ///
    /// Recognized shapes, in priority order: a year range
    /// ("1977-1980"), a full date ("01.02.1975"), a single year
    /// (1900-2029), an explicit undated marker. Anything else is
    /// unspecified.
    pub fn infer_date(&self, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return UNSPECIFIED.to_string();
        }

        if let Some(caps) = self.year_range.captures(text) {
            return format!("{}-{}", &caps[1], &caps[2]);
        }

        if let Some(caps) = self.full_date.captures(text) {
            return caps[1].to_string();
        }

        if let Some(caps) = self.single_year.captures(text) {
            return caps[1].to_string();
        }

        let lower = text.to_lowercase();
        if UNDATED_MARKERS.iter().any(|marker| lower.contains(marker)) {
            return UNDATED.to_string();
        }

        UNSPECIFIED.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new().unwrap()
    }

    #[test]
    fn year_range_with_dash_variants() {
        let e = extractor();
        assert_eq!(e.infer_date("1977-1980, Stadtarchiv"), "1977-1980");
        assert_eq!(e.infer_date("1961 – 1972"), "1961-1972");
    }

    #[test]
    fn full_date() {
        assert_eq!(extractor().infer_date("12.03.1975, Kreisarchiv"), "12.03.1975");
    }

    #[test]
    fn single_year() {
        let e = extractor();
        assert_eq!(e.infer_date("um 1968 entstanden"), "1968");
        assert_eq!(e.infer_date("2019"), "2019");
    }

    #[test]
    fn undated_markers() {
        let e = extractor();
        assert_eq!(e.infer_date("ohne Datum"), UNDATED);
        assert_eq!(e.infer_date("undatiert"), UNDATED);
        assert_eq!(e.infer_date("s.d."), UNDATED);
    }

    #[test]
    fn unspecified_for_empty_or_unrecognized() {
        let e = extractor();
        assert_eq!(e.infer_date(""), UNSPECIFIED);
        assert_eq!(e.infer_date("   "), UNSPECIFIED);
        assert_eq!(e.infer_date("Sammlung Flugblätter"), UNSPECIFIED);
    }

    #[test]
    fn range_wins_over_single_year() {
        assert_eq!(extractor().infer_date("Bestand 1955-1960"), "1955-1960");
    }
}
