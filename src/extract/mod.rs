// src/extract/mod.rs

//! Record extraction heuristics.
//!
//! Pattern-matching collaborators of the crawl engine: turn one list
//! item fragment into a candidate record, and infer period, place, and
//! institution from raw text. Returning "no data" is a normal outcome,
//! not an error.

mod date;
mod institution;
mod place;

use std::collections::HashSet;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Record;
use crate::utils::resolve_url;

/// Archive-sector words that are never place names on their own.
const ARCHIVE_WORDS: [&str; 13] = [
    "stadtarchiv",
    "kreisarchiv",
    "landesarchiv",
    "hauptstaatsarchiv",
    "bundesarchiv",
    "archiv",
    "sammlung",
    "bibliothek",
    "bürgerinitiativen",
    "staatsarchiv",
    "universitätsarchiv",
    "bezirksarchiv",
    "gemeindearchiv",
];

/// Länder adjective stems mapped to the state name.
const ADJEKTIV_LAND: [(&str, &str); 13] = [
    (r"[Bb]ayer", "Bayern"),
    (r"[Ss]ächs", "Sachsen"),
    (r"[Bb]randenburg", "Brandenburg"),
    (r"[Hh]ess", "Hessen"),
    (r"[Tt]hüring", "Thüringen"),
    (r"[Nn]iedersächs", "Niedersachsen"),
    (r"[Mm]ecklenb", "Mecklenburg-Vorpommern"),
    (r"[Ww]estfäl", "Nordrhein-Westfalen"),
    (r"[Ss]aarländ", "Saarland"),
    (r"[Ss]chlwig|[Ss]chleswig", "Schleswig-Holstein"),
    (r"[Hh]amburg", "Hamburg"),
    (r"[Bb]remer", "Bremen"),
    (r"[Bb]erliner", "Berlin"),
];

/// Compiled extraction patterns.
///
/// Built once per run; all inference methods are pure functions of
/// their text arguments.
pub struct Extractor {
    item_link: Selector,

    // Date shapes
    year_range: Regex,
    full_date: Regex,
    single_year: Regex,

    // Institution patterns
    leading_institution: Regex,
    institution_keyword: Regex,
    institution_patterns: Vec<Regex>,

    // Place patterns
    candidate_phrase: Regex,
    locative_phrase: Regex,
    archive_strip: Regex,
    genitive_prefix: Regex,
    trailing_junk: Regex,
    admin_prefix: Regex,
    isolated_letter: Regex,
    multi_dots: Regex,
    adjektiv_land: Vec<(Regex, &'static str)>,
    archive_words: HashSet<&'static str>,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        let adjektiv_land = ADJEKTIV_LAND
            .iter()
            .map(|(pattern, land)| Ok((Regex::new(pattern)?, *land)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            item_link: parse_selector("a[href*='/item/']")?,

            year_range: Regex::new(r"(\d{4})\s*[-–]\s*(\d{4})")?,
            full_date: Regex::new(r"(\d{2}\.\d{2}\.\d{4})")?,
            single_year: Regex::new(r"\b(19\d{2}|20[0-2]\d)\b")?,

            leading_institution: Regex::new(r"^\s*[\d\-–\s\.]+,\s*([^,]+(?:,[^,]+)?)")?,
            institution_keyword: Regex::new(r"(?i)(?:archiv|bibliothek|museum|institut|sammlung)")?,
            institution_patterns: vec![
                Regex::new(r"(?i)((?:Stadt|Landes|Bundes|Kreis|Universitäts)[a-zäöüß]*archiv[^,\n]*)")?,
                Regex::new(r"(?i)(Archiv\s+(?:der|des|für|im)[^,\n]+)")?,
                Regex::new(
                    r"(?i)([A-ZÄÖÜ][a-zäöüß]+(?:stadt|Stadt)\s+[A-ZÄÖÜ][a-zäöüß]+\s+[^,\n]*[Aa]rchiv[^,\n]*)",
                )?,
            ],

            // Capitalized phrases, allowing genitive connectives so
            // "Kreisarchiv des Landkreises Barnim" stays one candidate
            candidate_phrase: Regex::new(
                r"[A-ZÄÖÜ][A-Za-zÄÖÜäöüß-]*(?:\s+(?:des|der)\s+[A-ZÄÖÜ][A-Za-zÄÖÜäöüß-]*|\s+[A-ZÄÖÜ][A-Za-zÄÖÜäöüß-]*)*",
            )?,
            // Capitalized phrase following a locative preposition
            locative_phrase: Regex::new(
                r"\b(?:i[nm]|aus|bei)\s+([A-ZÄÖÜ][A-Za-zÄÖÜäöüß-]*(?:\s+[A-ZÄÖÜ][A-Za-zÄÖÜäöüß-]*)*)",
            )?,
            // Optional adjective, a compound archive word, then optional
            // genitive/district prefixes before the place name
            archive_strip: Regex::new(
                r"^(?:[A-ZÄÖÜ][a-zäöüß]+(?:s|es|isches?|ische|er|ern)\s+)?[A-Za-zäöüÄÖÜß]*[Aa]rchiv\w*\s*(?:des\s+)?(?:Landkreises?\s+|Kreises?\s+)?",
            )?,
            genitive_prefix: Regex::new(r"^(?:des|der)\s+")?,
            trailing_junk: Regex::new(r"(?s)\s*[\(\[\.]{1,}.*")?,
            admin_prefix: Regex::new(r"^(?:Landkreises?|Kreises?)\s+")?,
            isolated_letter: Regex::new(r"^[A-ZÄÖÜ][\s\-]")?,
            multi_dots: Regex::new(r"\.{2,}")?,
            adjektiv_land,
            archive_words: ARCHIVE_WORDS.iter().copied().collect(),
        })
    }

    /// Extract a candidate record from one list item fragment.
    ///
    /// A record needs a detail-page link with non-empty text; anything
    /// less is "no record", reported by the caller as a parse failure.
    pub fn extract_fragment(&self, fragment_html: &str, base_url: &Url) -> Option<Record> {
        let fragment = Html::parse_fragment(fragment_html);
        let link = fragment.select(&self.item_link).next()?;

        let title = normalize_whitespace(&link.text().collect::<Vec<_>>().join(" "));
        if title.is_empty() {
            return None;
        }

        let href = link.value().attr("href")?;
        let url = resolve_url(base_url, href);

        // Everything in the fragment except the title is the meta text
        // (period, institution, archive reference)
        let full_text = normalize_whitespace(
            &fragment.root_element().text().collect::<Vec<_>>().join(" "),
        );
        let meta_text = full_text.replacen(&title, "", 1).trim().to_string();

        let period = self.infer_date(&meta_text);
        let institution = self.infer_institution(&meta_text);
        let place = self.infer_place(&meta_text, &institution);

        Some(Record {
            title,
            period,
            place,
            institution,
            url,
        })
    }
}

/// Collapse all whitespace runs to single spaces and trim.
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UNSPECIFIED, UNDATED};

    fn base() -> Url {
        Url::parse("https://www.archivportal-d.de").unwrap()
    }

    #[test]
    fn extracts_record_from_list_fragment() {
        let extractor = Extractor::new().unwrap();
        let fragment = r#"<li>
            <a href="/item/ABC123XYZ?lang=en">Bürgerinitiative Umweltschutz Tübingen</a>
            <span>1977-1980, Stadtarchiv Tübingen, D 10/251</span>
        </li>"#;

        let record = extractor.extract_fragment(fragment, &base()).unwrap();
        assert_eq!(record.title, "Bürgerinitiative Umweltschutz Tübingen");
        assert_eq!(record.period, "1977-1980");
        assert_eq!(record.institution, "Stadtarchiv Tübingen, D 10/251");
        assert_eq!(record.place, "Tübingen");
        assert_eq!(
            record.url,
            "https://www.archivportal-d.de/item/ABC123XYZ?lang=en"
        );
    }

    #[test]
    fn fragment_without_item_link_is_no_record() {
        let extractor = Extractor::new().unwrap();
        let fragment = r#"<li><a href="/about">About this portal</a></li>"#;
        assert!(extractor.extract_fragment(fragment, &base()).is_none());
    }

    #[test]
    fn fragment_with_empty_link_text_is_no_record() {
        let extractor = Extractor::new().unwrap();
        let fragment = r#"<li><a href="/item/ABC123"><img src="x.png"></a></li>"#;
        assert!(extractor.extract_fragment(fragment, &base()).is_none());
    }

    #[test]
    fn missing_meta_text_yields_markers() {
        let extractor = Extractor::new().unwrap();
        let fragment = r#"<div><a href="/item/Q7Z4">Initiative ohne Metadaten</a></div>"#;

        let record = extractor.extract_fragment(fragment, &base()).unwrap();
        assert_eq!(record.period, UNSPECIFIED);
        assert_eq!(record.place, UNSPECIFIED);
        assert_eq!(record.institution, "");
    }

    #[test]
    fn undated_marker_from_meta_text() {
        let extractor = Extractor::new().unwrap();
        let fragment = r#"<li>
            <a href="/item/UNDATED01">Flugblattsammlung</a>
            <span>undatiert, Stadtarchiv Mannheim</span>
        </li>"#;

        let record = extractor.extract_fragment(fragment, &base()).unwrap();
        assert_eq!(record.period, UNDATED);
    }
}
