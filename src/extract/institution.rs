// src/extract/institution.rs

//! Institution inference from raw meta text.

use super::Extractor;

impl Extractor {
    /// Extract the holding institution from meta text, which usually
    /// reads "period, institution, archive reference".
    ///
    /// The segment after the leading date is taken when it looks like
    /// an institution; otherwise known archive-name patterns are tried
    /// anywhere in the text. Empty string means "none found".
    pub fn infer_institution(&self, text: &str) -> String {
        if let Some(caps) = self.leading_institution.captures(text) {
            let institution = caps[1].trim().to_string();
            if self.institution_keyword.is_match(&institution) {
                return institution;
            }
        }

        for pattern in &self.institution_patterns {
            if let Some(caps) = pattern.captures(text) {
                return caps[1].trim().to_string();
            }
        }

        String::new()
    }
}
