//! Module registry seam
//!
//! Plugin-provided column types (`module_id:column_type_id`) carry an option
//! list served by an external module loader. The engine consumes it as an
//! opaque capability: an unavailable registry or unknown type degrades to
//! free-text validation, never a hard failure.

use serde::{Deserialize, Serialize};

/// Raw option metadata passed through from the module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleOptionRaw {
    /// Business indicator tri-state: `Some(true)` business-only,
    /// `Some(false)` personal-only, `None` needs both variants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business: Option<bool>,
}

/// One selectable option of a module column type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleOption {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub raw: ModuleOptionRaw,
}

impl ModuleOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            raw: ModuleOptionRaw::default(),
        }
    }

    /// Set the business indicator
    pub fn business(mut self, business: Option<bool>) -> Self {
        self.raw.business = business;
        self
    }
}

/// Option-list capability supplied by the module loader
pub trait ModuleRegistry: Send + Sync {
    /// Options for a module column type, or `None` when the module or type
    /// is unavailable.
    fn options(&self, module_id: &str, column_type_id: &str) -> Option<Vec<ModuleOption>>;
}

/// In-memory registry for embedded use and tests
#[derive(Debug, Clone, Default)]
pub struct StaticModuleRegistry {
    entries: Vec<(String, String, Vec<ModuleOption>)>,
}

impl StaticModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the option list for one module column type
    pub fn with_options(
        mut self,
        module_id: impl Into<String>,
        column_type_id: impl Into<String>,
        options: Vec<ModuleOption>,
    ) -> Self {
        self.entries
            .push((module_id.into(), column_type_id.into(), options));
        self
    }
}

impl ModuleRegistry for StaticModuleRegistry {
    fn options(&self, module_id: &str, column_type_id: &str) -> Option<Vec<ModuleOption>> {
        self.entries
            .iter()
            .find(|(m, t, _)| m == module_id && t == column_type_id)
            .map(|(_, _, options)| options.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_registry_lookup() {
        let registry = StaticModuleRegistry::new().with_options(
            "crm",
            "lead_source",
            vec![ModuleOption::new("web", "Web"), ModuleOption::new("ref", "Referral")],
        );

        let options = registry.options("crm", "lead_source").unwrap();
        assert_eq!(options.len(), 2);
        assert!(registry.options("crm", "missing").is_none());
        assert!(registry.options("other", "lead_source").is_none());
    }

    #[test]
    fn test_option_business_tri_state() {
        let option = ModuleOption::new("acme", "Acme Corp").business(Some(true));
        assert_eq!(option.raw.business, Some(true));

        let json = serde_json::to_string(&ModuleOption::new("x", "X")).unwrap();
        assert!(!json.contains("business"));

        let parsed: ModuleOption =
            serde_json::from_str(r#"{"value":"x","label":"X","raw":{"business":false}}"#).unwrap();
        assert_eq!(parsed.raw.business, Some(false));
    }
}
