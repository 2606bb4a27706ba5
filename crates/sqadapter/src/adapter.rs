//! The Adapter: policy persistence over a segment index.
//!
//! The adapter keeps no rule state of its own. Every operation encodes or
//! decodes rules on the way through and issues store calls one at a time,
//! in program order.

use sqadapter_core::{
    build_filter, default_index_definition, encode, rule_id, IndexDefinition, Record,
};
use sqadapter_model::{PolicyModel, SECTION_POLICY, SECTION_ROLE};
use sqadapter_store::{Database, SegmentIndex, SegmentIndexExt, StoreError};

use crate::config::AdapterConfig;
use crate::error::Result;

/// Persists policy rules in one index of a segment database.
pub struct Adapter<D: Database> {
    /// The segment database.
    db: D,
    /// The resolved policy index.
    index: D::Index,
    /// Configuration.
    config: AdapterConfig,
}

impl<D: Database> Adapter<D> {
    /// Create an adapter, resolving the configured index or creating it with
    /// the policy rule schema.
    ///
    /// An existing index must carry exactly that schema.
    pub async fn new(db: D, config: AdapterConfig) -> Result<Self> {
        let expected = default_index_definition(config.index_name.as_str());

        let index = match db.index_by_name(&config.index_name).await? {
            Some(index) => {
                if index.definition() != &expected {
                    return Err(StoreError::SchemaMismatch(format!(
                        "index {} exists with a schema other than the policy rule schema",
                        config.index_name
                    ))
                    .into());
                }
                tracing::debug!(index = %config.index_name, "using existing policy index");
                index
            }
            None => {
                let index = db.create_index(&expected).await?;
                tracing::info!(index = %config.index_name, "created policy index");
                index
            }
        };

        Ok(Self { db, index, config })
    }

    /// Create an adapter with the default configuration.
    pub async fn with_defaults(db: D) -> Result<Self> {
        Self::new(db, AdapterConfig::default()).await
    }

    /// The configuration this adapter was built with.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Name of the policy index.
    pub fn index_name(&self) -> &str {
        &self.config.index_name
    }

    /// Definition of the policy index.
    pub fn index_definition(&self) -> &IndexDefinition {
        self.index.definition()
    }

    /// The policy index handle.
    pub fn index(&self) -> &D::Index {
        &self.index
    }

    /// The underlying database.
    pub fn database(&self) -> &D {
        &self.db
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Whole-policy Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Load every stored rule into `model`.
    ///
    /// Stops at the first scan, decode or model error. Lines already fed to
    /// the model stay there.
    pub async fn load_policy<M: PolicyModel>(&self, model: &mut M) -> Result<()> {
        let mut loaded = 0usize;

        for segment in self.index.segments().await? {
            let record = Record::try_from(&segment?)?;
            model.load_policy_line(&record.policy_line(self.config.line_format))?;
            loaded += 1;
        }

        tracing::debug!(index = %self.config.index_name, loaded, "loaded policy");
        Ok(())
    }

    /// Replace the stored rules with every `p` and `g` rule of `model`.
    ///
    /// Not atomic: the index is truncated first, so a failed insert leaves
    /// only the rules written before the failure.
    pub async fn save_policy<M: PolicyModel>(&self, model: &M) -> Result<()> {
        let records: Vec<Record> = [SECTION_POLICY, SECTION_ROLE]
            .into_iter()
            .flat_map(|sec| model.policies(sec))
            .flat_map(|(ptype, rules)| {
                rules
                    .into_iter()
                    .map(move |rule| encode(&ptype, &rule))
            })
            .collect();

        self.index.truncate().await?;

        for (written, record) in records.iter().enumerate() {
            if let Err(e) = self.index.insert_segment(&record.to_segment()).await {
                tracing::warn!(
                    index = %self.config.index_name,
                    written,
                    total = records.len(),
                    error = %e,
                    "save failed after truncate, index holds a partial rule set"
                );
                return Err(e.into());
            }
        }

        tracing::debug!(index = %self.config.index_name, saved = records.len(), "saved policy");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Incremental Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Store one rule. Storing a rule twice overwrites the same record.
    pub async fn add_policy<S: AsRef<str>>(&self, sec: &str, ptype: &str, rule: &[S]) -> Result<()> {
        let record = encode(ptype, rule);
        self.index.insert_segment(&record.to_segment()).await?;

        tracing::debug!(sec, ptype, id = %record.id, "added policy");
        Ok(())
    }

    /// Delete one rule. Deleting a rule that is not stored is not an error.
    pub async fn remove_policy<S: AsRef<str>>(
        &self,
        sec: &str,
        ptype: &str,
        rule: &[S],
    ) -> Result<()> {
        let id = rule_id(ptype, rule);
        let removed = self.index.delete_segment(id.as_str()).await?;

        tracing::debug!(sec, ptype, id = %id, removed, "removed policy");
        Ok(())
    }

    /// Delete every rule of `ptype` whose values starting at `field_index`
    /// equal `field_values`. Empty values match anything.
    ///
    /// The run must end at or before `v5`, otherwise an invalid-argument
    /// error is returned before the store is touched. Matching keys are
    /// collected before the first delete; a failing delete stops the loop
    /// and earlier deletions stay.
    pub async fn remove_filtered_policy<S: AsRef<str>>(
        &self,
        sec: &str,
        ptype: &str,
        field_index: usize,
        field_values: &[S],
    ) -> Result<()> {
        let filter = build_filter(ptype, field_index, field_values)?;
        let keys = self.index.lookup_keys(&filter.to_lookup()).await?;

        for key in &keys {
            self.index.delete_segment(key).await?;
        }

        tracing::debug!(sec, ptype, field_index, removed = keys.len(), "removed filtered policy");
        Ok(())
    }
}
