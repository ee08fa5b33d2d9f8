use anyhow::{Result, anyhow};
use std::collections::BTreeMap;

pub const DEFAULT_ROLE: &str = "shell-bash";

const BUILTIN_ROLES: [(&str, &str); 3] = [
    (
        "shell-bash",
        "You are an assistant that helps people write shell commands for linux for bash.",
    ),
    (
        "kubectl",
        "You are an assistant that helps people write kubectl commands for interacting with Kubernetes.",
    ),
    (
        "powershell",
        "You are an assistant that helps people write powershell commands.",
    ),
];

/// Immutable mapping from role name to the system prompt sent with a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTable {
    prompts: BTreeMap<String, String>,
}

impl Default for RoleTable {
    fn default() -> Self {
        Self::from_pairs(BUILTIN_ROLES)
    }
}

impl RoleTable {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prompts: pairs
                .into_iter()
                .map(|(name, prompt)| (name.into(), prompt.into()))
                .collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.prompts.keys().map(String::as_str)
    }

    /// Looks up the prompt for `requested`, falling back to [`DEFAULT_ROLE`].
    pub fn system_prompt(&self, requested: Option<&str>) -> Result<&str> {
        let name = requested.unwrap_or(DEFAULT_ROLE);
        self.prompts.get(name).map(String::as_str).ok_or_else(|| {
            anyhow!(
                "Unknown query type '{}'. The query type should be one of: {}.",
                name,
                self.names().collect::<Vec<_>>().join(", ")
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_ROLE, RoleTable};

    #[test]
    fn default_table_contains_builtin_roles() {
        let roles = RoleTable::default();
        let names: Vec<&str> = roles.names().collect();
        assert_eq!(names, vec!["kubectl", "powershell", "shell-bash"]);
    }

    #[test]
    fn missing_role_falls_back_to_shell_bash() {
        let roles = RoleTable::default();
        let prompt = roles.system_prompt(None).expect("default role should exist");
        assert_eq!(
            prompt,
            roles
                .system_prompt(Some(DEFAULT_ROLE))
                .expect("shell-bash should exist")
        );
        assert!(prompt.contains("bash"));
    }

    #[test]
    fn kubectl_role_mentions_kubernetes() {
        let roles = RoleTable::default();
        let prompt = roles
            .system_prompt(Some("kubectl"))
            .expect("kubectl should exist");
        assert!(prompt.contains("Kubernetes"));
    }

    #[test]
    fn unknown_role_lists_valid_names() {
        let err = RoleTable::default()
            .system_prompt(Some("nonexistent"))
            .expect_err("unknown role should fail");
        let msg = format!("{err:#}");
        assert!(msg.contains("nonexistent"), "unexpected message: {msg}");
        assert!(
            msg.contains("kubectl, powershell, shell-bash"),
            "unexpected message: {msg}"
        );
    }

    #[test]
    fn custom_tables_replace_builtin_roles() {
        let roles = RoleTable::from_pairs([("sql", "You write SQL.")]);
        assert_eq!(
            roles.system_prompt(Some("sql")).expect("sql should exist"),
            "You write SQL."
        );
        assert!(roles.system_prompt(None).is_err());
    }
}
