//! Table access policy seam
//!
//! The engine never authenticates. An upstream layer supplies a caller
//! identity and this policy answers per-table access checks; the store only
//! consumes the verdict. Denied access is reported to callers as
//! `TableNotFound` so table existence never leaks.

/// Access-check capability supplied by the surrounding auth layer
pub trait TableAccess: Send + Sync {
    /// Whether `identity` may operate on `table_id`
    fn has_table_access(&self, table_id: &str, identity: &str) -> bool;
}

/// Policy that grants every identity access to every table.
///
/// The default for embedded use, where the caller has already scoped the
/// connection to one tenant.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl TableAccess for AllowAll {
    fn has_table_access(&self, _table_id: &str, _identity: &str) -> bool {
        true
    }
}

/// Policy backed by an explicit grant list, mirroring token-scoped access
/// where a token either carries a table-id list or is unrestricted.
#[derive(Debug, Clone, Default)]
pub struct GrantList {
    grants: Vec<(String, String)>,
}

impl GrantList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `identity` access to `table_id`
    pub fn grant(mut self, table_id: impl Into<String>, identity: impl Into<String>) -> Self {
        self.grants.push((table_id.into(), identity.into()));
        self
    }
}

impl TableAccess for GrantList {
    fn has_table_access(&self, table_id: &str, identity: &str) -> bool {
        self.grants
            .iter()
            .any(|(t, i)| t == table_id && i == identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        assert!(AllowAll.has_table_access("any", "anyone"));
    }

    #[test]
    fn test_grant_list() {
        let policy = GrantList::new().grant("tbl-1", "alice");
        assert!(policy.has_table_access("tbl-1", "alice"));
        assert!(!policy.has_table_access("tbl-1", "bob"));
        assert!(!policy.has_table_access("tbl-2", "alice"));
    }
}
