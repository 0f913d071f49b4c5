/// Access requirement attached to a protected page
///
/// Registered once at route definition time and evaluated against the
/// signed-in account's granted permissions and roles:
/// - `permissions`: the account must hold ALL of them
/// - `roles`: the account must hold AT LEAST ONE of them
/// - an empty list imposes no constraint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRequirement {
    pub permissions: Vec<String>,
    pub roles: Vec<String>,
}

impl AccessRequirement {
    pub fn new(
        permissions: impl IntoIterator<Item = impl Into<String>>,
        roles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Evaluate this requirement against a set of granted permissions
    /// and roles. Pure; callers are responsible for checking that a
    /// session exists at all before asking about its grants.
    pub fn satisfied_by(&self, granted_permissions: &[String], granted_roles: &[String]) -> bool {
        if !self.permissions.is_empty() {
            let has_all = self
                .permissions
                .iter()
                .all(|p| granted_permissions.contains(p));
            if !has_all {
                return false;
            }
        }

        if !self.roles.is_empty() {
            let has_any = self.roles.iter().any(|r| granted_roles.contains(r));
            if !has_any {
                return false;
            }
        }

        true
    }
}
