//! End-to-end adapter behavior against both database backends.
//!
//! Every scenario runs once on the in-memory database and once on a SQLite
//! file, and the SQLite runs reopen the file to check persistence.

use anyhow::Result;
use proptest::prelude::*;
use sqadapter::core::{default_index_definition, encode};
use sqadapter::store::{Database, MemoryDatabase, SegmentIndex, SegmentIndexExt, SqliteDatabase};
use sqadapter::{rule_id, Adapter, AdapterConfig, LineFormat, Model, RuleId};
use sqadapter_testkit::generators::{rule, rule_set};
use sqadapter_testkit::{model_from_lines, policy_lines, rbac_model, TestFixture};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn sorted_rules(model: &Model, sec: &str, ptype: &str) -> Vec<Vec<String>> {
    let mut rules = model.get_policy(sec, ptype).to_vec();
    rules.sort();
    rules
}

async fn reload<D: Database>(adapter: &Adapter<D>) -> Result<Model> {
    let mut model = Model::new();
    adapter.load_policy(&mut model).await?;
    Ok(model)
}

fn rules(values: &[&[&str]]) -> Vec<Vec<String>> {
    values
        .iter()
        .map(|rule| rule.iter().map(|v| v.to_string()).collect())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared scenarios
// ─────────────────────────────────────────────────────────────────────────────

async fn save_and_load<D: Database>(adapter: &Adapter<D>) -> Result<()> {
    let model = rbac_model();
    adapter.save_policy(&model).await?;

    let loaded = reload(adapter).await?;
    assert_eq!(policy_lines(&loaded), policy_lines(&model));
    Ok(())
}

async fn add_and_remove<D: Database>(adapter: &Adapter<D>) -> Result<()> {
    adapter.save_policy(&Model::new()).await?;

    adapter.add_policy("p", "p", &["alice", "data1", "read"]).await?;
    adapter.add_policy("p", "p", &["alice", "data1", "read"]).await?;
    adapter.add_policy("g", "g", &["alice", "data2_admin"]).await?;
    assert_eq!(adapter.index().count().await?, 2);

    adapter.remove_policy("p", "p", &["alice", "data1", "read"]).await?;
    adapter.remove_policy("p", "p", &["alice", "data1", "read"]).await?;
    adapter.remove_policy("p", "p", &["nobody", "nothing", "never"]).await?;

    let loaded = reload(adapter).await?;
    assert!(loaded.get_policy("p", "p").is_empty());
    assert_eq!(loaded.get_policy("g", "g"), rules(&[&["alice", "data2_admin"]]));
    Ok(())
}

async fn remove_filtered<D: Database>(adapter: &Adapter<D>) -> Result<()> {
    adapter.save_policy(&rbac_model()).await?;

    adapter.remove_filtered_policy("p", "p", 1, &["data2"]).await?;
    let loaded = reload(adapter).await?;
    assert_eq!(loaded.get_policy("p", "p"), rules(&[&["alice", "data1", "read"]]));
    assert_eq!(loaded.get_policy("g", "g").len(), 1);

    // Out of range leaves the store untouched
    let err = adapter
        .remove_filtered_policy("p", "p", 4, &["a", "b", "c"])
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument());
    assert_eq!(adapter.index().count().await?, 2);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory backend
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn memory_save_and_load() -> Result<()> {
    init_tracing();
    let fixture = TestFixture::new().await?;
    save_and_load(&fixture.adapter).await
}

#[tokio::test]
async fn memory_add_and_remove() -> Result<()> {
    let fixture = TestFixture::new().await?;
    add_and_remove(&fixture.adapter).await
}

#[tokio::test]
async fn memory_remove_filtered() -> Result<()> {
    let fixture = TestFixture::new().await?;
    remove_filtered(&fixture.adapter).await
}

#[tokio::test]
async fn memory_remove_filtered_by_subject_and_action() -> Result<()> {
    let fixture = TestFixture::new().await?;
    let model = model_from_lines(&[
        "p, alice, data1, read",
        "p, alice, data2, read",
        "p, alice, data2, write",
        "p, bob, data1, read",
    ]);
    fixture.adapter.save_policy(&model).await?;

    fixture
        .adapter
        .remove_filtered_policy("p", "p", 0, &["alice", "", "read"])
        .await?;
    assert_eq!(
        fixture.stored_lines().await?,
        ["p, alice, data2, write", "p, bob, data1, read"]
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite backend
// ─────────────────────────────────────────────────────────────────────────────

fn sqlite_file() -> Result<(TempDir, std::path::PathBuf)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("rules.db");
    Ok((dir, path))
}

#[tokio::test]
async fn sqlite_save_and_load() -> Result<()> {
    init_tracing();
    let (_dir, path) = sqlite_file()?;
    let adapter = Adapter::with_defaults(SqliteDatabase::open(&path)?).await?;
    save_and_load(&adapter).await
}

#[tokio::test]
async fn sqlite_add_and_remove() -> Result<()> {
    let (_dir, path) = sqlite_file()?;
    let adapter = Adapter::with_defaults(SqliteDatabase::open(&path)?).await?;
    add_and_remove(&adapter).await
}

#[tokio::test]
async fn sqlite_remove_filtered() -> Result<()> {
    let (_dir, path) = sqlite_file()?;
    let adapter = Adapter::with_defaults(SqliteDatabase::open(&path)?).await?;
    remove_filtered(&adapter).await
}

#[tokio::test]
async fn sqlite_rules_survive_reopen() -> Result<()> {
    let (_dir, path) = sqlite_file()?;
    {
        let adapter = Adapter::with_defaults(SqliteDatabase::open(&path)?).await?;
        adapter.save_policy(&rbac_model()).await?;
    }

    let adapter = Adapter::with_defaults(SqliteDatabase::open(&path)?).await?;
    let loaded = reload(&adapter).await?;
    assert_eq!(loaded.rule_count(), 5);
    assert!(loaded.has_policy("p", "p", &rules(&[&["bob", "data2", "write"]])[0]));
    Ok(())
}

#[tokio::test]
async fn sqlite_custom_index_name() -> Result<()> {
    let (_dir, path) = sqlite_file()?;
    let db = SqliteDatabase::open(&path)?;
    let config = AdapterConfig::default().with_index_name("tenant_a_rules");
    let adapter = Adapter::new(db, config).await?;
    adapter.add_policy("p", "p", &["alice", "data1", "read"]).await?;

    assert_eq!(adapter.index_name(), "tenant_a_rules");
    assert!(adapter.database().index_by_name("casbin_rule").await?.is_none());

    let index = adapter
        .database()
        .index_by_name("tenant_a_rules")
        .await?
        .expect("index created on bootstrap");
    assert_eq!(index.count().await?, 1);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Record layout
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stored_record_layout() -> Result<()> {
    let adapter = Adapter::with_defaults(MemoryDatabase::new()).await?;
    adapter.add_policy("p", "p", &["alice", "data1", "read"]).await?;

    let segments = adapter.index().all_segments().await?;
    assert_eq!(segments.len(), 1);
    let record = sqadapter::Record::try_from(&segments[0])?;

    let id = RuleId::from_hex(&record.id)?;
    assert_eq!(id, rule_id("p", &["alice", "data1", "read"]));
    assert_eq!(record.ptype, "p");
    assert_eq!(record.values, ["alice", "data1", "read", "", "", ""]);
    Ok(())
}

#[tokio::test]
async fn preexisting_index_is_reused() -> Result<()> {
    let db = MemoryDatabase::new();
    let index = db.create_index(&default_index_definition("casbin_rule")).await?;
    index
        .insert_segment(&encode("g", &["bob", "data2_admin"]).to_segment())
        .await?;

    let adapter = Adapter::with_defaults(db).await?;
    let loaded = reload(&adapter).await?;
    assert_eq!(loaded.get_policy("g", "g"), rules(&[&["bob", "data2_admin"]]));
    Ok(())
}

#[tokio::test]
async fn trim_trailing_keeps_interior_empty_values() -> Result<()> {
    let config = AdapterConfig::default().with_line_format(LineFormat::TrimTrailingEmpty);
    let adapter = Adapter::new(MemoryDatabase::new(), config).await?;
    adapter.add_policy("p", "p", &["alice", "", "read", "", ""]).await?;

    let loaded = reload(&adapter).await?;
    assert_eq!(loaded.get_policy("p", "p"), rules(&[&["alice", "", "read"]]));
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn add_then_remove_restores_count(existing in prop::collection::vec(rule(), 0..8), target in rule()) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let adapter = Adapter::with_defaults(MemoryDatabase::new()).await.unwrap();
            for values in &existing {
                adapter.add_policy("p", "p", values).await.unwrap();
            }
            let before = adapter.index().count().await.unwrap();
            let was_present = existing.contains(&target);

            adapter.add_policy("p", "p", &target).await.unwrap();
            adapter.remove_policy("p", "p", &target).await.unwrap();

            let after = adapter.index().count().await.unwrap();
            let expected = if was_present { before - 1 } else { before };
            prop_assert_eq!(after, expected);
            Ok(())
        })?;
    }

    #[test]
    fn saved_rules_load_back(stored in rule_set(10)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let mut model = Model::new();
            for values in &stored {
                model.add_policy("p", "p", values.clone()).unwrap();
            }

            let adapter = Adapter::with_defaults(MemoryDatabase::new()).await.unwrap();
            adapter.save_policy(&model).await.unwrap();
            let loaded = reload(&adapter).await.unwrap();

            let expected: Vec<Vec<String>> = stored.into_iter().collect();
            prop_assert_eq!(sorted_rules(&loaded, "p", "p"), expected);
            Ok(())
        })?;
    }
}
