//! In-memory registry of every loaded entity, keyed by type and identifier,
//! plus the startup pipeline that fills it from the flat-file database.

pub mod types;

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::db::error::StorageError;
use crate::db::schema::{Indexed, ReferenceIndex, Saveable};
use crate::db::store::FlatFileDb;

pub use types::{
    GameWorld, Nation, PlotType, Resident, SpawnPos, Town, TownBlock, NATION, RESIDENT, TOWN,
    TOWN_BLOCK, WORLD,
};

/// Raised by a registration callback when the identifier is already taken.
/// Bulk loading logs these and continues; they never abort a batch.
#[derive(Debug, Error)]
#[error("{kind} {id} is already registered")]
pub struct AlreadyRegistered {
    pub kind: &'static str,
    pub id: Uuid,
}

/// The global type → identifier → entity indices.
#[derive(Default)]
pub struct Universe {
    residents: HashMap<Uuid, Resident>,
    towns: HashMap<Uuid, Town>,
    nations: HashMap<Uuid, Nation>,
    worlds: HashMap<Uuid, GameWorld>,
    town_blocks: HashMap<Uuid, TownBlock>,
}

macro_rules! universe_index {
    ($entity:ty, $field:ident, $kind:expr, $add:ident, $get:ident, $get_mut:ident, $iter:ident) => {
        impl Universe {
            pub fn $add(&mut self, entity: $entity) -> Result<(), AlreadyRegistered> {
                let id = entity.id();
                if self.$field.contains_key(&id) {
                    return Err(AlreadyRegistered { kind: $kind, id });
                }
                self.$field.insert(id, entity);
                Ok(())
            }

            pub fn $get(&self, id: Uuid) -> Option<&$entity> {
                self.$field.get(&id)
            }

            pub fn $get_mut(&mut self, id: Uuid) -> Option<&mut $entity> {
                self.$field.get_mut(&id)
            }

            pub fn $iter(&self) -> impl Iterator<Item = &$entity> {
                self.$field.values()
            }
        }

        impl Indexed<Universe> for $entity {
            fn lookup_mut(registry: &mut Universe, id: Uuid) -> Option<&mut Self> {
                registry.$field.get_mut(&id)
            }
        }
    };
}

universe_index!(Resident, residents, RESIDENT, add_resident, resident, resident_mut, residents);
universe_index!(Town, towns, TOWN, add_town, town, town_mut, towns);
universe_index!(Nation, nations, NATION, add_nation, nation, nation_mut, nations);
universe_index!(GameWorld, worlds, WORLD, add_world, world, world_mut, worlds);
universe_index!(
    TownBlock,
    town_blocks,
    TOWN_BLOCK,
    add_town_block,
    town_block,
    town_block_mut,
    town_blocks
);

impl Universe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resident_count(&self) -> usize {
        self.residents.len()
    }

    pub fn town_count(&self) -> usize {
        self.towns.len()
    }

    pub fn nation_count(&self) -> usize {
        self.nations.len()
    }

    pub fn world_count(&self) -> usize {
        self.worlds.len()
    }

    pub fn town_block_count(&self) -> usize {
        self.town_blocks.len()
    }

    pub fn entity_count(&self) -> usize {
        self.resident_count()
            + self.town_count()
            + self.nation_count()
            + self.world_count()
            + self.town_block_count()
    }
}

impl ReferenceIndex for Universe {
    fn contains(&self, type_name: &str, id: Uuid) -> bool {
        match type_name {
            RESIDENT => self.residents.contains_key(&id),
            TOWN => self.towns.contains_key(&id),
            NATION => self.nations.contains_key(&id),
            WORLD => self.worlds.contains_key(&id),
            TOWN_BLOCK => self.town_blocks.contains_key(&id),
            _ => false,
        }
    }
}

/// Load every entity type from the database, then resolve deferred
/// cross-type references. This is the one place `complete_load` runs; the
/// returned universe is fully linked.
pub async fn load_universe(db: &mut FlatFileDb<Universe>) -> Result<Universe, StorageError> {
    let mut universe = Universe::new();
    db.load_all(|w| universe.add_world(w)).await?;
    db.load_all(|r| universe.add_resident(r)).await?;
    db.load_all(|t| universe.add_town(t)).await?;
    db.load_all(|n| universe.add_nation(n)).await?;
    db.load_all(|b| universe.add_town_block(b)).await?;
    db.complete_load(&mut universe);
    Ok(universe)
}

/// Write every registered entity back through the save path. Returns the
/// number of records written.
pub async fn save_universe(
    db: &mut FlatFileDb<Universe>,
    universe: &Universe,
) -> Result<usize, StorageError> {
    let mut written = 0usize;
    for world in universe.worlds() {
        db.save(world).await?;
        written += 1;
    }
    for resident in universe.residents() {
        db.save(resident).await?;
        written += 1;
    }
    for town in universe.towns() {
        db.save(town).await?;
        written += 1;
    }
    for nation in universe.nations() {
        db.save(nation).await?;
        written += 1;
    }
    for block in universe.town_blocks() {
        db.save(block).await?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_is_reported() {
        let mut universe = Universe::new();
        let resident = Resident::new("Alice");
        let dup = resident.clone();
        universe.add_resident(resident).expect("first add");
        let err = universe.add_resident(dup).expect_err("duplicate");
        assert_eq!(err.kind, RESIDENT);
    }

    #[test]
    fn reference_index_distinguishes_types() {
        let mut universe = Universe::new();
        let town = Town::new("Hillcrest");
        let id = town.uuid;
        universe.add_town(town).expect("add");
        assert!(universe.contains(TOWN, id));
        assert!(!universe.contains(RESIDENT, id));
        assert!(!universe.contains("unknown", id));
    }
}
