//! End-to-end persistence tests: save entities, reload the whole tree, and
//! verify the round trip through `complete_load`.

use tempfile::TempDir;
use townstead::db::FlatFileDb;
use townstead::universe::{
    load_universe, save_universe, GameWorld, Nation, PlotType, Resident, SpawnPos, Town, TownBlock,
    Universe,
};

fn sample_universe() -> Universe {
    let mut universe = Universe::new();

    let world = GameWorld::new("overworld");
    let world_id = world.uuid;

    let mut alice = Resident::new("Alice");
    alice.title = "Lady".to_string();
    alice.registered = 1_693_526_400;
    alice.last_online = 1_693_612_800;
    let alice_id = alice.uuid;

    let mut bob = Resident::new("Bob");
    bob.jailed = true;
    let bob_id = bob.uuid;
    alice.friends = vec![bob_id];

    let mut town = Town::new("Hillcrest");
    town.board = "Welcome to Hillcrest".to_string();
    town.taxes = 12.5;
    town.plot_price = 100.0;
    town.open = true;
    town.bonus_blocks = 16;
    town.spawn = Some(SpawnPos {
        world: "overworld".to_string(),
        x: 12.5,
        y: 64.0,
        z: -30.0,
    });
    town.mayor = Some(alice_id);
    town.residents = vec![alice_id, bob_id];
    town.world = Some(world_id);
    let town_id = town.uuid;
    alice.town = Some(town_id);
    bob.town = Some(town_id);

    let mut nation = Nation::new("Arcadia");
    nation.taxes = 5.0;
    nation.neutral = true;
    nation.capital = Some(town_id);
    nation.towns = vec![town_id];
    town.nation = Some(nation.uuid);

    let mut block = TownBlock::new(4, -7);
    block.plot_type = PlotType::Embassy;
    block.price = 250.0;
    block.world = Some(world_id);
    block.town = Some(town_id);
    block.resident = Some(alice_id);

    universe.add_world(world).expect("world");
    universe.add_resident(alice).expect("alice");
    universe.add_resident(bob).expect("bob");
    universe.add_town(town).expect("town");
    universe.add_nation(nation).expect("nation");
    universe.add_town_block(block).expect("block");
    universe
}

#[tokio::test]
async fn full_universe_round_trips_through_disk() {
    let dir = TempDir::new().expect("tempdir");
    let original = sample_universe();

    let mut db = FlatFileDb::new(dir.path());
    let written = save_universe(&mut db, &original).await.expect("save");
    assert_eq!(written, original.entity_count());

    let mut db = FlatFileDb::new(dir.path());
    let loaded = load_universe(&mut db).await.expect("load");
    assert_eq!(loaded.entity_count(), original.entity_count());

    for resident in original.residents() {
        let back = loaded.resident(resident.uuid).expect("resident survives");
        assert_eq!(back, resident);
    }
    for town in original.towns() {
        assert_eq!(loaded.town(town.uuid).expect("town survives"), town);
    }
    for nation in original.nations() {
        assert_eq!(loaded.nation(nation.uuid).expect("nation survives"), nation);
    }
    for world in original.worlds() {
        assert_eq!(loaded.world(world.uuid).expect("world survives"), world);
    }
    for block in original.town_blocks() {
        assert_eq!(
            loaded.town_block(block.uuid).expect("block survives"),
            block
        );
    }
}

#[tokio::test]
async fn record_files_use_identifier_names_and_property_lines() {
    let dir = TempDir::new().expect("tempdir");
    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());

    let mut resident = Resident::new("Alice");
    resident.registered = 42;
    db.save(&resident).await.expect("save");

    let path = dir
        .path()
        .join("residents")
        .join(format!("{}.txt", resident.uuid));
    let text = std::fs::read_to_string(&path).expect("record file exists");
    assert!(text.lines().any(|line| line == "name=Alice"));
    assert!(text.lines().any(|line| line == "registered=42"));
    // Session-only state never hits disk.
    assert!(!text.contains("online="));
}

#[tokio::test]
async fn computed_fields_are_written_but_never_read_back() {
    let dir = TempDir::new().expect("tempdir");
    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());

    let mut town = Town::new("Hillcrest");
    town.residents = vec![uuid::Uuid::new_v4(), uuid::Uuid::new_v4()];
    db.save(&town).await.expect("save");

    let path = dir.path().join("towns").join(format!("{}.txt", town.uuid));
    let text = std::fs::read_to_string(&path).expect("record file");
    assert!(text.lines().any(|line| line == "residentCount=2"));

    // Tampering with the derived value has no effect on a reload.
    let tampered = text.replace("residentCount=2", "residentCount=999");
    std::fs::write(&path, tampered).expect("rewrite");
    let loaded: Town = db.load(&path).await.expect("load");
    assert_eq!(loaded.name, "Hillcrest");
}

#[tokio::test]
async fn unknown_keys_are_ignored_and_missing_keys_keep_defaults() {
    let dir = TempDir::new().expect("tempdir");
    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());

    let world = GameWorld::new("overworld");
    db.save(&world).await.expect("save");

    let path = dir.path().join("worlds").join(format!("{}.txt", world.uuid));
    let mut text = std::fs::read_to_string(&path).expect("record file");
    text.push_str("legacyKey=whatever\n");
    // Drop the claimable line entirely; the default is true.
    let text: String = text
        .lines()
        .filter(|line| !line.starts_with("claimable="))
        .map(|line| format!("{}\n", line))
        .collect();
    std::fs::write(&path, text).expect("rewrite");

    let loaded: GameWorld = db.load(&path).await.expect("load");
    assert_eq!(loaded.name, "overworld");
    assert!(loaded.claimable);
}

#[tokio::test]
async fn malformed_values_keep_defaults() {
    let dir = TempDir::new().expect("tempdir");
    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());

    let mut resident = Resident::new("Alice");
    resident.registered = 42;
    db.save(&resident).await.expect("save");

    let path = dir
        .path()
        .join("residents")
        .join(format!("{}.txt", resident.uuid));
    let text = std::fs::read_to_string(&path).expect("record file");
    let text = text.replace("registered=42", "registered=not-a-number");
    std::fs::write(&path, text).expect("rewrite");

    let loaded: Resident = db.load(&path).await.expect("load");
    assert_eq!(loaded.name, "Alice");
    assert_eq!(loaded.registered, 0);
}

#[tokio::test]
async fn one_corrupt_file_does_not_abort_the_batch() {
    let dir = TempDir::new().expect("tempdir");
    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());

    for name in ["Alice", "Bob", "Carol"] {
        db.save(&Resident::new(name)).await.expect("save");
    }
    // Invalid UTF-8 makes the record unreadable.
    std::fs::write(
        dir.path()
            .join("residents")
            .join(format!("{}.txt", uuid::Uuid::new_v4())),
        [0xff, 0xfe, 0xfd],
    )
    .expect("write corrupt file");

    let mut universe = Universe::new();
    let registered = db
        .load_all(|r: Resident| universe.add_resident(r))
        .await
        .expect("load_all");
    assert_eq!(registered, 3);
    assert_eq!(universe.resident_count(), 3);
}

#[tokio::test]
async fn delete_returns_false_for_missing_records() {
    let dir = TempDir::new().expect("tempdir");
    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());

    let resident = Resident::new("Alice");
    assert!(!db.delete(&resident).await.expect("missing delete"));

    db.save(&resident).await.expect("save");
    assert!(db.delete(&resident).await.expect("real delete"));
    assert!(!db.delete(&resident).await.expect("second delete"));
}

#[tokio::test]
async fn non_record_files_are_skipped_during_bulk_load() {
    let dir = TempDir::new().expect("tempdir");
    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());

    db.save(&Resident::new("Alice")).await.expect("save");
    std::fs::write(dir.path().join("residents").join("README.md"), "notes")
        .expect("stray file");

    let mut universe = Universe::new();
    let registered = db
        .load_all(|r: Resident| universe.add_resident(r))
        .await
        .expect("load_all");
    assert_eq!(registered, 1);
}

#[tokio::test]
async fn storage_path_colliding_with_a_file_is_a_configuration_error() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("residents"), "not a directory").expect("collide");

    let mut db: FlatFileDb<Universe> = FlatFileDb::new(dir.path());
    let err = db
        .save(&Resident::new("Alice"))
        .await
        .expect_err("collision must fail");
    assert!(err.to_string().contains("not a directory"));
}
