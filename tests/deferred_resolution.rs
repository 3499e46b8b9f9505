//! Two-phase load behavior: cross-type references stay parked until
//! `complete_load`, dangling references are dropped, and draining the
//! registry twice is harmless.

use tempfile::TempDir;
use townstead::db::FlatFileDb;
use townstead::universe::{GameWorld, Nation, Resident, Town, Universe};

#[tokio::test]
async fn cross_type_references_resolve_only_after_complete_load() {
    let dir = TempDir::new().expect("tempdir");
    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());

    let mut town = Town::new("Hillcrest");
    let town_id = town.uuid;
    let mut alice = Resident::new("Alice");
    alice.town = Some(town_id);
    let alice_id = alice.uuid;
    town.mayor = Some(alice_id);
    town.residents = vec![alice_id];

    db.save(&alice).await.expect("save alice");
    db.save(&town).await.expect("save town");

    // Residents load before towns here, so alice's town reference cannot be
    // checked yet; it stays parked.
    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());
    let mut universe = Universe::new();
    db.load_all(|r: Resident| universe.add_resident(r))
        .await
        .expect("load residents");
    assert_eq!(universe.resident(alice_id).expect("alice").town, None);
    assert!(db.pending_deferred() > 0);

    db.load_all(|t: Town| universe.add_town(t))
        .await
        .expect("load towns");
    assert_eq!(universe.town(town_id).expect("town").mayor, None);

    db.complete_load(&mut universe);
    assert_eq!(db.pending_deferred(), 0);
    assert_eq!(
        universe.resident(alice_id).expect("alice").town,
        Some(town_id)
    );
    let town = universe.town(town_id).expect("town");
    assert_eq!(town.mayor, Some(alice_id));
    assert_eq!(town.residents, vec![alice_id]);
}

#[tokio::test]
async fn dangling_references_are_dropped() {
    let dir = TempDir::new().expect("tempdir");
    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());

    // The referenced town is never saved, so the reference can never be
    // satisfied.
    let mut alice = Resident::new("Alice");
    alice.town = Some(uuid::Uuid::new_v4());
    let alice_id = alice.uuid;
    db.save(&alice).await.expect("save");

    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());
    let mut universe = Universe::new();
    db.load_all(|r: Resident| universe.add_resident(r))
        .await
        .expect("load residents");
    db.complete_load(&mut universe);

    assert_eq!(universe.resident(alice_id).expect("alice").town, None);
}

#[tokio::test]
async fn a_list_with_one_dangling_element_is_skipped_whole() {
    let dir = TempDir::new().expect("tempdir");
    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());

    let town = Town::new("Hillcrest");
    let town_id = town.uuid;
    let mut nation = Nation::new("Arcadia");
    nation.towns = vec![town_id, uuid::Uuid::new_v4()];
    let nation_id = nation.uuid;

    db.save(&town).await.expect("save town");
    db.save(&nation).await.expect("save nation");

    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());
    let mut universe = Universe::new();
    db.load_all(|t: Town| universe.add_town(t))
        .await
        .expect("load towns");
    db.load_all(|n: Nation| universe.add_nation(n))
        .await
        .expect("load nations");
    db.complete_load(&mut universe);

    assert!(universe.nation(nation_id).expect("nation").towns.is_empty());
}

#[tokio::test]
async fn complete_load_twice_is_a_no_op() {
    let dir = TempDir::new().expect("tempdir");
    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());

    let world = GameWorld::new("overworld");
    let world_id = world.uuid;
    let mut town = Town::new("Hillcrest");
    town.world = Some(world_id);
    let town_id = town.uuid;
    db.save(&world).await.expect("save world");
    db.save(&town).await.expect("save town");

    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());
    let mut universe = Universe::new();
    db.load_all(|w: GameWorld| universe.add_world(w))
        .await
        .expect("load worlds");
    db.load_all(|t: Town| universe.add_town(t))
        .await
        .expect("load towns");

    db.complete_load(&mut universe);
    assert_eq!(universe.town(town_id).expect("town").world, Some(world_id));

    db.complete_load(&mut universe);
    assert_eq!(db.pending_deferred(), 0);
    assert_eq!(universe.town(town_id).expect("town").world, Some(world_id));
}
