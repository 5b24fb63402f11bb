use config::TableConfig;

/// Builds a config rooted at `dir` with the given memtable capacity `L` and
/// level fanout `R`.
pub fn config(dir: &std::path::Path, memtable_capacity: usize, fanout: usize) -> TableConfig {
    TableConfig::new(dir)
        .with_memtable_capacity(memtable_capacity)
        .with_fanout(fanout)
}

/// Counts `comp_*.dat` files directly under `dir` (one level's directory).
pub fn count_components(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().map(|ext| ext == "dat").unwrap_or(false))
                .count()
        })
        .unwrap_or(0)
}
