//! One-shot database upgrade: bulk-load every entity from the existing
//! on-disk tree, delete that tree, and re-save everything through the
//! current save path. Keys an old release wrote but the current schema no
//! longer declares are dropped; keys the old release lacked come back with
//! defaults. Purely a consumer of the store's `save`.

use std::path::Path;

use log::info;

use crate::db::error::StorageError;
use crate::db::store::FlatFileDb;
use crate::universe::{load_universe, save_universe, Universe};

/// Per-type counters for an upgrade run.
#[derive(Debug, Default, Clone)]
pub struct MigrationReport {
    pub worlds: usize,
    pub residents: usize,
    pub towns: usize,
    pub nations: usize,
    pub town_blocks: usize,
}

impl MigrationReport {
    pub fn total(&self) -> usize {
        self.worlds + self.residents + self.towns + self.nations + self.town_blocks
    }

    fn from_universe(universe: &Universe) -> Self {
        Self {
            worlds: universe.world_count(),
            residents: universe.resident_count(),
            towns: universe.town_count(),
            nations: universe.nation_count(),
            town_blocks: universe.town_block_count(),
        }
    }
}

/// Rewrite the whole data tree at `root` in the current record layout.
pub async fn upgrade(root: &Path) -> Result<MigrationReport, StorageError> {
    info!("beginning upgrade: loading database from {}", root.display());
    let mut db = FlatFileDb::new(root);
    let universe = load_universe(&mut db).await?;
    let report = MigrationReport::from_universe(&universe);
    info!(
        "loaded {} entities; clearing old records",
        report.total()
    );

    if root.exists() {
        tokio::fs::remove_dir_all(root).await?;
    }

    // Fresh store so the directory scheme is recomputed from scratch.
    let mut db = FlatFileDb::new(root);
    let written = save_universe(&mut db, &universe).await?;
    info!("database upgrade complete: {} records rewritten", written);
    Ok(report)
}
