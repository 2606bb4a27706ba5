//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use sqadapter::{Adapter, AdapterConfig, Result};
use sqadapter_model::{Model, PolicyModel};
use sqadapter_store::MemoryDatabase;

/// The classic RBAC policy: two users, one role, four permissions.
pub const RBAC_POLICY: &[&str] = &[
    "p, alice, data1, read",
    "p, bob, data2, write",
    "p, data2_admin, data2, read",
    "p, data2_admin, data2, write",
    "g, alice, data2_admin",
];

/// A model holding [`RBAC_POLICY`].
pub fn rbac_model() -> Model {
    model_from_lines(RBAC_POLICY)
}

/// A model holding the given policy lines.
///
/// # Panics
///
/// Panics if a line is refused by the model.
pub fn model_from_lines(lines: &[&str]) -> Model {
    let mut model = Model::new();
    for line in lines {
        model
            .load_policy_line(line)
            .unwrap_or_else(|e| panic!("fixture line {line:?} rejected: {e}"));
    }
    model
}

/// Sorted `ptype, v0, ...` lines of every rule in the model.
pub fn policy_lines(model: &Model) -> Vec<String> {
    let mut lines: Vec<String> = ["p", "g"]
        .into_iter()
        .flat_map(|sec| model.policies(sec))
        .flat_map(|(ptype, rules)| {
            rules
                .into_iter()
                .map(move |rule| format!("{}, {}", ptype, rule.join(", ")))
        })
        .collect();
    lines.sort();
    lines
}

/// An adapter over a fresh in-memory database.
pub struct TestFixture {
    pub adapter: Adapter<MemoryDatabase>,
}

impl TestFixture {
    /// Create a fixture with the default configuration.
    pub async fn new() -> Result<Self> {
        Self::with_config(AdapterConfig::default()).await
    }

    /// Create a fixture with a custom configuration.
    pub async fn with_config(config: AdapterConfig) -> Result<Self> {
        Ok(Self {
            adapter: Adapter::new(MemoryDatabase::new(), config).await?,
        })
    }

    /// Create a fixture whose index already holds [`RBAC_POLICY`].
    pub async fn rbac() -> Result<Self> {
        let fixture = Self::new().await?;
        fixture.adapter.save_policy(&rbac_model()).await?;
        Ok(fixture)
    }

    /// Load the stored rules into a fresh model.
    pub async fn reload(&self) -> Result<Model> {
        let mut model = Model::new();
        self.adapter.load_policy(&mut model).await?;
        Ok(model)
    }

    /// Sorted policy lines of the stored rules.
    pub async fn stored_lines(&self) -> Result<Vec<String>> {
        Ok(policy_lines(&self.reload().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rbac_model() {
        let model = rbac_model();
        assert_eq!(model.rule_count(), 5);
        assert_eq!(policy_lines(&model)[0], "g, alice, data2_admin");
    }

    #[tokio::test]
    async fn test_rbac_fixture_round_trips() {
        let fixture = TestFixture::rbac().await.unwrap();
        let mut expected: Vec<String> = RBAC_POLICY.iter().map(|l| l.to_string()).collect();
        expected.sort();
        assert_eq!(fixture.stored_lines().await.unwrap(), expected);
    }
}
