use tempfile::tempdir;

use super::helpers::config;
use crate::Engine;

#[test]
fn merge_triggers_once_fanout_exceeded() {
    let dir = tempdir().unwrap();
    let table = Engine::open(&config(dir.path(), 1, 2)).unwrap();

    // Each insert is its own memtable (capacity 1), so each flushes to its
    // own level0 component. Fanout 2 means the third flush must trigger a
    // merge down into level1, leaving level0 empty.
    table.insert("a", "1").unwrap();
    table.insert("b", "2").unwrap();
    table.insert("c", "3").unwrap();

    assert_eq!(table.level_sizes(), vec![0, 1]);
}

#[test]
fn merge_preserves_get_results() {
    let dir = tempdir().unwrap();
    let table = Engine::open(&config(dir.path(), 1, 2)).unwrap();

    table.insert("a", "1").unwrap();
    table.insert("b", "2").unwrap();
    table.insert("c", "3").unwrap();

    assert_eq!(table.get("a").unwrap(), Some("1".to_string()));
    assert_eq!(table.get("b").unwrap(), Some("2".to_string()));
    assert_eq!(table.get("c").unwrap(), Some("3".to_string()));
}

#[test]
fn merge_keeps_newest_value_on_duplicate_key() {
    let dir = tempdir().unwrap();
    let table = Engine::open(&config(dir.path(), 1, 2)).unwrap();

    table.insert("k", "v1").unwrap();
    table.insert("k", "v2").unwrap();
    table.insert("k", "v3").unwrap();

    assert_eq!(table.level_sizes(), vec![0, 1]);
    assert_eq!(table.get("k").unwrap(), Some("v3".to_string()));
}

#[test]
fn merge_unlinks_input_component_files() {
    let dir = tempdir().unwrap();
    let table = Engine::open(&config(dir.path(), 1, 2)).unwrap();

    table.insert("a", "1").unwrap();
    table.insert("b", "2").unwrap();
    table.insert("c", "3").unwrap();

    let level0_dat_files: usize = std::fs::read_dir(dir.path().join("level0"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|x| x == "dat").unwrap_or(false))
        .count();
    assert_eq!(level0_dat_files, 0, "merged inputs must be unlinked from level0");
}

#[test]
fn merge_preserves_tombstones_across_levels() {
    let dir = tempdir().unwrap();
    let table = Engine::open(&config(dir.path(), 1, 2)).unwrap();

    table.insert("k", "v").unwrap();
    table.delete("k").unwrap();
    table.insert("filler", "x").unwrap();

    assert_eq!(table.level_sizes(), vec![0, 1]);
    assert_eq!(table.get("k").unwrap(), None);
}

#[test]
fn merge_cascades_through_multiple_levels() {
    let dir = tempdir().unwrap();
    // R=1 means every level overflows after a single extra component,
    // forcing the merge to cascade level0 -> level1 -> level2.
    let table = Engine::open(&config(dir.path(), 1, 1)).unwrap();

    for (k, v) in [("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")] {
        table.insert(k, v).unwrap();
    }

    for (k, v) in [("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")] {
        assert_eq!(table.get(k).unwrap(), Some(v.to_string()));
    }
    assert!(table.level_sizes().iter().all(|&n| n <= 1));
}
