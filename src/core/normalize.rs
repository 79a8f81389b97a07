use crate::domain::model::NormalizedAddress;
use regex::Regex;

/// Reduces raw address and zone text to the canonical form the geocode
/// service expects: alphanumerics, spaces, and the word `and`.
///
/// Pure and deterministic; the same input always yields the same output.
pub struct AddressNormalizer {
    space_replace_matcher: Regex,
}

impl Default for AddressNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressNormalizer {
    pub fn new() -> Self {
        // Fractions between whitespace, slashes, trailing "#..." unit
        // designators, percent signs, period-space, and question marks all
        // become a single space.
        let space_replace_matcher =
            Regex::new(r"(\s\d/\d\s)|/|(\s#.*)|%|(\.\s)|\?").expect("static pattern");
        Self {
            space_replace_matcher,
        }
    }

    pub fn normalize(&self, id: &str, raw_address: &str, raw_zone: &str) -> NormalizedAddress {
        let address = self.format_address(raw_address);
        let zone = self.format_zone(raw_zone);
        let valid = is_valid(id, &address, &zone);

        NormalizedAddress {
            id: id.to_string(),
            address,
            zone,
            valid,
        }
    }

    fn format_address(&self, raw: &str) -> String {
        let substituted = self.space_replace_matcher.replace_all(raw, " ");

        let mut formatted = String::with_capacity(substituted.len());
        for c in substituted.chars() {
            match u32::from(c) {
                // Control characters and punctuation blocks; everything the
                // service's URL path cannot carry safely.
                0..=30 | 33..=36 | 39..=46 | 58..=63 | 91..=95 | 123..=254 => formatted.push(' '),
                38 => formatted.push_str("and"),
                _ => formatted.push(c),
            }
        }

        formatted
    }

    fn format_zone(&self, raw: &str) -> String {
        let formatted = self
            .space_replace_matcher
            .replace_all(raw, " ")
            .trim()
            .to_string();

        // Utah ZIP prefix heuristic: "84097 Orem" style inputs keep only the
        // ZIP code.
        if formatted.starts_with('8') {
            formatted.chars().take(5).collect()
        } else {
            formatted
        }
    }
}

/// Major format problems that make a record not worth sending to the API.
/// The literal "None" guards against null propagation from upstream exports.
fn is_valid(id: &str, address: &str, zone: &str) -> bool {
    if address.replace(' ', "").is_empty() || zone.replace(' ', "").is_empty() {
        return false;
    }
    if id.trim().is_empty() || address == "None" || zone == "None" {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_deterministic() {
        let normalizer = AddressNormalizer::new();
        let first = normalizer.normalize("1", "123 N 1/2 MAIN ST.", "84097 Orem");
        let second = normalizer.normalize("1", "123 N 1/2 MAIN ST.", "84097 Orem");
        assert_eq!(first, second);
    }

    #[test]
    fn strips_fraction_and_slash() {
        let normalizer = AddressNormalizer::new();
        let result = normalizer.normalize("1", "123 N 1/2 MAIN ST", "84097");
        assert!(!result.address.contains('/'));
        assert_eq!(result.zone, "84097");
        assert!(result.valid);
    }

    #[test]
    fn replaces_ampersand_with_and() {
        let normalizer = AddressNormalizer::new();
        let result = normalizer.normalize("1", "100 E 100 S & 200 W", "UT");
        assert!(result.address.contains("and"));
        assert!(!result.address.contains('&'));
    }

    #[test]
    fn strips_unit_designator() {
        let normalizer = AddressNormalizer::new();
        let result = normalizer.normalize("1", "350 S STATE ST #210", "84111");
        assert!(!result.address.contains('#'));
        assert!(!result.address.contains("210"));
    }

    #[test]
    fn sweeps_punctuation_to_spaces() {
        let normalizer = AddressNormalizer::new();
        let result = normalizer.normalize("1", "100 \"main\" <st>;", "84111");
        for c in ['"', '<', '>', ';'] {
            assert!(!result.address.contains(c), "left {:?} behind", c);
        }
    }

    #[test]
    fn zone_zip_city_input_truncates_to_zip() {
        let normalizer = AddressNormalizer::new();
        let result = normalizer.normalize("1", "123 MAIN ST", "  84601 Provo ");
        assert_eq!(result.zone, "84601");
    }

    #[test]
    fn city_zone_is_kept_whole() {
        let normalizer = AddressNormalizer::new();
        let result = normalizer.normalize("1", "123 MAIN ST", "SALT LAKE CITY");
        assert_eq!(result.zone, "SALT LAKE CITY");
    }

    #[test]
    fn empty_fields_are_invalid() {
        let normalizer = AddressNormalizer::new();
        assert!(!normalizer.normalize("1", "", "84097").valid);
        assert!(!normalizer.normalize("1", "123 MAIN ST", "   ").valid);
        assert!(!normalizer.normalize("", "123 MAIN ST", "84097").valid);
    }

    #[test]
    fn literal_none_is_invalid() {
        let normalizer = AddressNormalizer::new();
        assert!(!normalizer.normalize("1", "None", "84097").valid);
        assert!(!normalizer.normalize("1", "123 MAIN ST", "None").valid);
    }

    #[test]
    fn punctuation_only_address_is_invalid() {
        let normalizer = AddressNormalizer::new();
        assert!(!normalizer.normalize("1", "???", "84097").valid);
    }
}
