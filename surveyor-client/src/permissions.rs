//! Process-wide IAM permission accumulation and predefined-role validation.
//!
//! The startup sequence registers each adapter's permissions explicitly
//! after construction; the accumulated set feeds the deployment story
//! (what a service account must be granted to run every adapter).
use std::{
    collections::{BTreeSet, HashMap},
    sync::{Mutex, OnceLock, PoisonError},
};

static REGISTERED: OnceLock<Mutex<BTreeSet<String>>> = OnceLock::new();

fn registered_set() -> &'static Mutex<BTreeSet<String>> {
    REGISTERED.get_or_init(Mutex::default)
}

/// Record permissions an adapter requires.
pub fn register<I, S>(permissions: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut set = registered_set()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    set.extend(permissions.into_iter().map(Into::into));
}

/// Every permission registered so far, sorted.
pub fn registered() -> Vec<String> {
    registered_set()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .cloned()
        .collect()
}

/// Provider table of predefined roles and the permissions they grant.
///
/// Providers that publish one require every adapter's permissions to appear
/// under its declared role, so a deployment granting the roles is known to
/// cover the whole inventory.
#[derive(Debug, Default)]
pub struct RoleTable {
    roles: HashMap<String, BTreeSet<String>>,
}

impl RoleTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role and the permissions it grants.
    #[must_use]
    pub fn role<I, S>(mut self, name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.insert(
            name.into(),
            permissions.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// The permissions granted by `role`, if registered.
    pub fn permissions(&self, role: &str) -> Option<&BTreeSet<String>> {
        self.roles.get(role)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn registration_accumulates_and_dedupes() {
        register(["test.resources.get", "test.resources.list"]);
        register(["test.resources.get"]);
        let all = registered();
        assert_eq!(
            all.iter()
                .filter(|p| p.as_str() == "test.resources.get")
                .count(),
            1
        );
        assert!(all.contains(&"test.resources.list".to_string()));
    }

    #[test]
    fn role_table_lookup() {
        let table = RoleTable::new().role("roles/compute.viewer", ["compute.addresses.get"]);
        assert!(table
            .permissions("roles/compute.viewer")
            .is_some_and(|p| p.contains("compute.addresses.get")));
        assert!(table.permissions("roles/unknown").is_none());
    }
}
