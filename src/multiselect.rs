//! Grouped-multiselect value codec
//!
//! Certain module column types store multiple selections in one string:
//! comma-joined `value:variant` tokens where the variant is `personal` or
//! `business`. Tokens are split on the *last* colon so option values may
//! themselves contain colons. Tokens without a recognized variant suffix are
//! not part of the tagged format; they are carried through verbatim as
//! ungrouped values.

use serde::{Deserialize, Serialize};

use crate::module::ModuleOption;

const VARIANT_PERSONAL: &str = "personal";
const VARIANT_BUSINESS: &str = "business";

/// Selection variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Personal,
    Business,
}

impl Variant {
    fn suffix(&self) -> &'static str {
        match self {
            Variant::Personal => VARIANT_PERSONAL,
            Variant::Business => VARIANT_BUSINESS,
        }
    }
}

/// Grouped selections, the encode-side input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedValues {
    #[serde(default)]
    pub personal: Vec<String>,
    #[serde(default)]
    pub business: Vec<String>,
}

impl GroupedValues {
    pub fn new(personal: Vec<String>, business: Vec<String>) -> Self {
        Self { personal, business }
    }
}

/// Decoded multiselect value. `ungrouped` carries untagged tokens verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedMultiselect {
    #[serde(default)]
    pub personal: Vec<String>,
    #[serde(default)]
    pub business: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ungrouped: Vec<String>,
}

impl DecodedMultiselect {
    /// Re-encode, emitting tagged tokens first and ungrouped tokens last,
    /// each verbatim. `decode(x.encode()) == x` for any decoded value.
    pub fn encode(&self) -> String {
        let mut tokens: Vec<String> = Vec::new();
        for v in &self.personal {
            tokens.push(format!("{}:{}", v, VARIANT_PERSONAL));
        }
        for v in &self.business {
            tokens.push(format!("{}:{}", v, VARIANT_BUSINESS));
        }
        tokens.extend(self.ungrouped.iter().cloned());
        tokens.join(",")
    }

    /// Every stored value, variant suffixes stripped
    pub fn values(&self) -> Vec<&str> {
        self.personal
            .iter()
            .chain(self.business.iter())
            .chain(self.ungrouped.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.personal.is_empty() && self.business.is_empty() && self.ungrouped.is_empty()
    }
}

/// Encode grouped selections: each personal value becomes `value:personal`,
/// each business value `value:business`, comma-joined personal-first.
/// The emitted order is not semantically meaningful; decode treats the
/// token list as a set.
pub fn encode(grouped: &GroupedValues) -> String {
    DecodedMultiselect {
        personal: grouped.personal.clone(),
        business: grouped.business.clone(),
        ungrouped: Vec::new(),
    }
    .encode()
}

/// Decode a stored multiselect string. Splits on commas, then each token on
/// its last colon; empty tokens are dropped, unrecognized variant suffixes
/// leave the whole token in `ungrouped`.
pub fn decode(s: &str) -> DecodedMultiselect {
    let mut decoded = DecodedMultiselect::default();

    for token in s.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        match token.rsplit_once(':') {
            Some((value, VARIANT_PERSONAL)) => decoded.personal.push(value.to_string()),
            Some((value, VARIANT_BUSINESS)) => decoded.business.push(value.to_string()),
            _ => decoded.ungrouped.push(token.to_string()),
        }
    }

    decoded
}

/// Expand module options into selectable variant options.
///
/// The `raw.business` indicator drives expansion: `Some(true)` yields one
/// business option, `Some(false)` one personal option, and `None` yields two
/// synthetic options from the one source option, each independently
/// selectable.
pub fn expand_options(options: &[ModuleOption]) -> Vec<VariantOption> {
    let mut expanded = Vec::new();

    for option in options {
        let variants: &[Variant] = match option.raw.business {
            Some(true) => &[Variant::Business],
            Some(false) => &[Variant::Personal],
            None => &[Variant::Personal, Variant::Business],
        };

        for variant in variants {
            expanded.push(VariantOption {
                value: format!("{}:{}", option.value, variant.suffix()),
                label: option.label.clone(),
                variant: *variant,
            });
        }
    }

    expanded
}

/// One selectable, variant-tagged option presented to the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantOption {
    /// Suffixed option value, e.g. `"acme:business"`
    pub value: String,
    pub label: String,
    pub variant: Variant,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleOption;

    #[test]
    fn test_encode_personal_then_business() {
        let grouped = GroupedValues::new(
            vec!["home".to_string()],
            vec!["office".to_string(), "warehouse".to_string()],
        );
        assert_eq!(
            encode(&grouped),
            "home:personal,office:business,warehouse:business"
        );
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode(&GroupedValues::default()), "");
    }

    #[test]
    fn test_decode_basic() {
        let decoded = decode("home:personal,office:business");
        assert_eq!(decoded.personal, vec!["home"]);
        assert_eq!(decoded.business, vec!["office"]);
        assert!(decoded.ungrouped.is_empty());
    }

    #[test]
    fn test_decode_splits_on_last_colon() {
        let decoded = decode("a:b:personal");
        assert_eq!(decoded.personal, vec!["a:b"]);
    }

    #[test]
    fn test_decode_untagged_tokens_pass_through() {
        let decoded = decode("plain,urn:x,home:personal");
        assert_eq!(decoded.personal, vec!["home"]);
        assert_eq!(decoded.ungrouped, vec!["plain", "urn:x"]);
    }

    #[test]
    fn test_decode_skips_empty_tokens() {
        let decoded = decode("home:personal,,  ,office:business");
        assert_eq!(decoded.personal, vec!["home"]);
        assert_eq!(decoded.business, vec!["office"]);
        assert!(decoded.ungrouped.is_empty());
    }

    #[test]
    fn test_decode_empty_string() {
        assert!(decode("").is_empty());
    }

    #[test]
    fn test_round_trip_law() {
        // decode(encode(decode(v))) == decode(v), mixed inputs included
        for input in [
            "home:personal,office:business",
            "a:b:personal,c:business",
            "plain,urn:x,home:personal",
            "office:business,home:personal",
            "",
        ] {
            let once = decode(input);
            let twice = decode(&once.encode());
            assert_eq!(once, twice, "round-trip failed for {:?}", input);
        }
    }

    #[test]
    fn test_values_strips_suffixes() {
        let decoded = decode("home:personal,office:business,loose");
        assert_eq!(decoded.values(), vec!["home", "office", "loose"]);
    }

    // =========================================================================
    // Option Expansion Tests
    // =========================================================================

    #[test]
    fn test_expand_business_only() {
        let options = vec![ModuleOption::new("acme", "Acme Corp").business(Some(true))];
        let expanded = expand_options(&options);
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].value, "acme:business");
        assert_eq!(expanded[0].variant, Variant::Business);
    }

    #[test]
    fn test_expand_personal_only() {
        let options = vec![ModuleOption::new("jane", "Jane").business(Some(false))];
        let expanded = expand_options(&options);
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].value, "jane:personal");
    }

    #[test]
    fn test_expand_null_indicator_yields_both_variants() {
        let options = vec![ModuleOption::new("dual", "Dual")];
        let expanded = expand_options(&options);
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0].value, "dual:personal");
        assert_eq!(expanded[1].value, "dual:business");
        assert_eq!(expanded[0].label, expanded[1].label);
    }

    #[test]
    fn test_expanded_options_decode_into_their_groups() {
        let options = vec![
            ModuleOption::new("a", "A").business(Some(true)),
            ModuleOption::new("b", "B"),
        ];
        let joined = expand_options(&options)
            .into_iter()
            .map(|o| o.value)
            .collect::<Vec<_>>()
            .join(",");
        let decoded = decode(&joined);
        assert_eq!(decoded.business, vec!["a", "b"]);
        assert_eq!(decoded.personal, vec!["b"]);
    }
}
