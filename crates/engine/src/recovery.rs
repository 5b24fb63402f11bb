//! Directory-driven startup.
//!
//! There is no manifest: the directory layout itself is the source of
//! truth. For each `level<N>` directory found under the table root, every
//! `comp_<id>.dat` file is opened as a disk component and the level's
//! components are ordered newest (highest `id`) first. Levels stop being
//! probed at the first gap — `level0` and `level2` existing without
//! `level1` leaves `level1` (and everything above) empty, matching "levels
//! above the highest populated one start empty".

use std::path::Path;
use std::sync::Arc;

use sstable::DiskComponent;
use tracing::{error, info};

use crate::{Error, Level, Result};

/// Loads every populated `level<N>` directory under `directory`, in order,
/// stopping at the first index with no directory on disk.
pub(crate) fn load_levels(directory: &Path) -> Result<Vec<Arc<Level>>> {
    let mut levels = Vec::new();
    let mut index = 0;
    loop {
        let dir = directory.join(format!("level{index}"));
        if !dir.is_dir() {
            break;
        }
        let components = load_components(&dir)?;
        info!(level = index, components = components.len(), "recovered level");
        levels.push(Arc::new(Level::new(index, dir, components)));
        index += 1;
    }
    Ok(levels)
}

/// Opens every `comp_<id>.dat` in `dir`, newest (highest `id`) first.
///
/// A component that fails to parse is fatal for the whole table: the
/// engine refuses to open rather than silently skip a corrupt file.
fn load_components(dir: &Path) -> Result<Vec<Arc<DiskComponent>>> {
    let mut found: Vec<(u64, std::path::PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if let Some(id) = component_id(&path) {
            found.push((id, path));
        }
    }

    // Newest (highest id) first.
    found.sort_by(|a, b| b.0.cmp(&a.0));

    found
        .into_iter()
        .map(|(_, path)| {
            DiskComponent::open(&path)
                .map(Arc::new)
                .map_err(|e| {
                    error!(path = %path.display(), error = %e, "failed to open component");
                    Error::component(&path, e)
                })
        })
        .collect()
}

/// Parses the numeric `id` out of a `comp_<id>.dat` filename, or `None` if
/// the entry doesn't match that pattern (e.g. a stray file left in the
/// level directory).
fn component_id(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    name.strip_prefix("comp_")?.strip_suffix(".dat")?.parse().ok()
}
