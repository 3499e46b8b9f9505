//! Domain entities and their static persistence schemas.
//!
//! Every entity declares its attribute table once, in declaration order.
//! Cross-type references are stored as uuids and marked deferred: they are
//! only applied after every entity type has finished its initial load pass,
//! with a presence check against the registry standing in for the dangling
//! references the old in-place mutation scheme allowed.

use uuid::Uuid;

use crate::db::codec::{FieldAdapter, FieldKind, FieldValue};
use crate::db::error::StorageError;
use crate::db::schema::{ComputedDef, EntitySchema, FieldDef, ReferenceIndex, Saveable};
use crate::economy::Account;

pub const RESIDENT: &str = "resident";
pub const TOWN: &str = "town";
pub const NATION: &str = "nation";
pub const WORLD: &str = "world";
pub const TOWN_BLOCK: &str = "townblock";

// ---------- reference checks ----------

fn resident_ref(index: &dyn ReferenceIndex, value: &FieldValue) -> bool {
    value.as_uuid().is_some_and(|id| index.contains(RESIDENT, id))
}

fn resident_list_ref(index: &dyn ReferenceIndex, value: &FieldValue) -> bool {
    value
        .as_uuid_list()
        .is_some_and(|ids| ids.iter().all(|id| index.contains(RESIDENT, *id)))
}

fn town_ref(index: &dyn ReferenceIndex, value: &FieldValue) -> bool {
    value.as_uuid().is_some_and(|id| index.contains(TOWN, id))
}

fn town_list_ref(index: &dyn ReferenceIndex, value: &FieldValue) -> bool {
    value
        .as_uuid_list()
        .is_some_and(|ids| ids.iter().all(|id| index.contains(TOWN, *id)))
}

fn nation_ref(index: &dyn ReferenceIndex, value: &FieldValue) -> bool {
    value.as_uuid().is_some_and(|id| index.contains(NATION, id))
}

fn world_ref(index: &dyn ReferenceIndex, value: &FieldValue) -> bool {
    value.as_uuid().is_some_and(|id| index.contains(WORLD, id))
}

// ---------- shared getter/setter helpers ----------

fn uuid_list_value(ids: &[Uuid]) -> Option<FieldValue> {
    if ids.is_empty() {
        None
    } else {
        Some(FieldValue::List(
            ids.iter().copied().map(FieldValue::Uuid).collect(),
        ))
    }
}

// ---------- Resident ----------

/// A player known to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Resident {
    pub uuid: Uuid,
    pub name: String,
    pub title: String,
    pub surname: String,
    /// Epoch seconds of first registration.
    pub registered: i64,
    /// Epoch seconds of last login.
    pub last_online: i64,
    pub jailed: bool,
    pub town: Option<Uuid>,
    pub friends: Vec<Uuid>,
    /// Session state, never persisted.
    pub online: bool,
}

impl Resident {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            ..Self::blank()
        }
    }
}

static RESIDENT_FIELDS: &[FieldDef<Resident>] = &[
    FieldDef::new(
        "uuid",
        FieldKind::Uuid,
        |r: &Resident| Some(FieldValue::Uuid(r.uuid)),
        |r, v| {
            if let Some(id) = v.as_uuid() {
                r.uuid = id;
            }
        },
    ),
    FieldDef::new(
        "name",
        FieldKind::Text,
        |r: &Resident| Some(FieldValue::Text(r.name.clone())),
        |r, v| {
            if let Some(s) = v.as_text() {
                r.name = s.to_string();
            }
        },
    ),
    FieldDef::new(
        "title",
        FieldKind::Text,
        |r: &Resident| Some(FieldValue::Text(r.title.clone())),
        |r, v| {
            if let Some(s) = v.as_text() {
                r.title = s.to_string();
            }
        },
    ),
    FieldDef::new(
        "surname",
        FieldKind::Text,
        |r: &Resident| Some(FieldValue::Text(r.surname.clone())),
        |r, v| {
            if let Some(s) = v.as_text() {
                r.surname = s.to_string();
            }
        },
    ),
    FieldDef::new(
        "registered",
        FieldKind::Int,
        |r: &Resident| Some(FieldValue::Int(r.registered)),
        |r, v| {
            if let Some(i) = v.as_int() {
                r.registered = i;
            }
        },
    ),
    FieldDef::new(
        "lastOnline",
        FieldKind::Int,
        |r: &Resident| Some(FieldValue::Int(r.last_online)),
        |r, v| {
            if let Some(i) = v.as_int() {
                r.last_online = i;
            }
        },
    ),
    FieldDef::new(
        "jailed",
        FieldKind::Bool,
        |r: &Resident| Some(FieldValue::Bool(r.jailed)),
        |r, v| {
            if let Some(b) = v.as_bool() {
                r.jailed = b;
            }
        },
    ),
    FieldDef::new(
        "town",
        FieldKind::Uuid,
        |r: &Resident| r.town.map(FieldValue::Uuid),
        |r, v| {
            if let Some(id) = v.as_uuid() {
                r.town = Some(id);
            }
        },
    )
    .deferred(town_ref),
    FieldDef::new(
        "friends",
        FieldKind::List(&FieldKind::Uuid),
        |r: &Resident| uuid_list_value(&r.friends),
        |r, v| {
            if let Some(ids) = v.as_uuid_list() {
                r.friends = ids;
            }
        },
    )
    .deferred(resident_list_ref),
    FieldDef::new(
        "online",
        FieldKind::Bool,
        |_: &Resident| None,
        |_, _| {},
    )
    .transient(),
];

pub static RESIDENT_SCHEMA: EntitySchema<Resident> = EntitySchema {
    type_name: RESIDENT,
    directory: "residents",
    fields: RESIDENT_FIELDS,
    computed: &[],
};

impl Saveable for Resident {
    fn schema() -> &'static EntitySchema<Self> {
        &RESIDENT_SCHEMA
    }

    fn blank() -> Self {
        Self {
            uuid: Uuid::nil(),
            name: String::new(),
            title: String::new(),
            surname: String::new(),
            registered: 0,
            last_online: 0,
            jailed: false,
            town: None,
            friends: Vec::new(),
            online: false,
        }
    }

    fn id(&self) -> Uuid {
        self.uuid
    }
}

impl Account for Resident {
    fn account_name(&self) -> String {
        self.name.clone()
    }
}

// ---------- SpawnPos ----------

/// A spawn point inside a named world, marshalled as `world,x,y,z`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPos {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SpawnPos {
    fn to_value(&self) -> FieldValue {
        FieldValue::List(vec![
            FieldValue::Text(self.world.clone()),
            FieldValue::Float(self.x),
            FieldValue::Float(self.y),
            FieldValue::Float(self.z),
        ])
    }

    fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::List(items) if items.len() == 4 => Some(Self {
                world: items[0].as_text()?.to_string(),
                x: items[1].as_float()?,
                y: items[2].as_float()?,
                z: items[3].as_float()?,
            }),
            _ => None,
        }
    }
}

/// Adapter marshalling [`SpawnPos`] values into a single stored token.
pub struct SpawnPosAdapter;

impl FieldAdapter for SpawnPosAdapter {
    fn name(&self) -> &'static str {
        "spawn position"
    }

    fn to_token(&self, value: &FieldValue) -> Result<String, StorageError> {
        let pos = SpawnPos::from_value(value).ok_or_else(|| {
            StorageError::Config(format!("cannot encode {:?} as a spawn position", value))
        })?;
        Ok(format!("{},{},{},{}", pos.world, pos.x, pos.y, pos.z))
    }

    fn from_token(&self, token: &str) -> Option<FieldValue> {
        let parts: Vec<&str> = token.split(',').collect();
        if parts.len() != 4 || parts[0].trim().is_empty() {
            return None;
        }
        let pos = SpawnPos {
            world: parts[0].trim().to_string(),
            x: parts[1].trim().parse().ok()?,
            y: parts[2].trim().parse().ok()?,
            z: parts[3].trim().parse().ok()?,
        };
        Some(pos.to_value())
    }
}

const SPAWN_KIND: FieldKind = FieldKind::Adapted(&SpawnPosAdapter);

// ---------- Town ----------

/// A settlement owned by residents, optionally part of a nation.
#[derive(Debug, Clone, PartialEq)]
pub struct Town {
    pub uuid: Uuid,
    pub name: String,
    pub board: String,
    pub taxes: f64,
    pub plot_price: f64,
    pub open: bool,
    pub public: bool,
    pub bonus_blocks: i64,
    pub spawn: Option<SpawnPos>,
    pub mayor: Option<Uuid>,
    pub residents: Vec<Uuid>,
    pub nation: Option<Uuid>,
    pub world: Option<Uuid>,
}

impl Town {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            ..Self::blank()
        }
    }
}

static TOWN_FIELDS: &[FieldDef<Town>] = &[
    FieldDef::new(
        "uuid",
        FieldKind::Uuid,
        |t: &Town| Some(FieldValue::Uuid(t.uuid)),
        |t, v| {
            if let Some(id) = v.as_uuid() {
                t.uuid = id;
            }
        },
    ),
    FieldDef::new(
        "name",
        FieldKind::Text,
        |t: &Town| Some(FieldValue::Text(t.name.clone())),
        |t, v| {
            if let Some(s) = v.as_text() {
                t.name = s.to_string();
            }
        },
    ),
    FieldDef::new(
        "board",
        FieldKind::Text,
        |t: &Town| Some(FieldValue::Text(t.board.clone())),
        |t, v| {
            if let Some(s) = v.as_text() {
                t.board = s.to_string();
            }
        },
    ),
    FieldDef::new(
        "taxes",
        FieldKind::Float,
        |t: &Town| Some(FieldValue::Float(t.taxes)),
        |t, v| {
            if let Some(x) = v.as_float() {
                t.taxes = x;
            }
        },
    ),
    FieldDef::new(
        "plotPrice",
        FieldKind::Float,
        |t: &Town| Some(FieldValue::Float(t.plot_price)),
        |t, v| {
            if let Some(x) = v.as_float() {
                t.plot_price = x;
            }
        },
    ),
    FieldDef::new(
        "open",
        FieldKind::Bool,
        |t: &Town| Some(FieldValue::Bool(t.open)),
        |t, v| {
            if let Some(b) = v.as_bool() {
                t.open = b;
            }
        },
    ),
    FieldDef::new(
        "public",
        FieldKind::Bool,
        |t: &Town| Some(FieldValue::Bool(t.public)),
        |t, v| {
            if let Some(b) = v.as_bool() {
                t.public = b;
            }
        },
    ),
    FieldDef::new(
        "bonusBlocks",
        FieldKind::Int,
        |t: &Town| Some(FieldValue::Int(t.bonus_blocks)),
        |t, v| {
            if let Some(i) = v.as_int() {
                t.bonus_blocks = i;
            }
        },
    ),
    FieldDef::new(
        "spawn",
        SPAWN_KIND,
        |t: &Town| t.spawn.as_ref().map(SpawnPos::to_value),
        |t, v| {
            if let Some(pos) = SpawnPos::from_value(&v) {
                t.spawn = Some(pos);
            }
        },
    ),
    FieldDef::new(
        "mayor",
        FieldKind::Uuid,
        |t: &Town| t.mayor.map(FieldValue::Uuid),
        |t, v| {
            if let Some(id) = v.as_uuid() {
                t.mayor = Some(id);
            }
        },
    )
    .deferred(resident_ref),
    FieldDef::new(
        "residents",
        FieldKind::List(&FieldKind::Uuid),
        |t: &Town| uuid_list_value(&t.residents),
        |t, v| {
            if let Some(ids) = v.as_uuid_list() {
                t.residents = ids;
            }
        },
    )
    .deferred(resident_list_ref),
    FieldDef::new(
        "nation",
        FieldKind::Uuid,
        |t: &Town| t.nation.map(FieldValue::Uuid),
        |t, v| {
            if let Some(id) = v.as_uuid() {
                t.nation = Some(id);
            }
        },
    )
    .deferred(nation_ref),
    FieldDef::new(
        "world",
        FieldKind::Uuid,
        |t: &Town| t.world.map(FieldValue::Uuid),
        |t, v| {
            if let Some(id) = v.as_uuid() {
                t.world = Some(id);
            }
        },
    )
    .deferred(world_ref),
];

static TOWN_COMPUTED: &[ComputedDef<Town>] = &[ComputedDef {
    name: "residentCount",
    kind: FieldKind::Int,
    get: |t: &Town| Some(FieldValue::Int(t.residents.len() as i64)),
}];

pub static TOWN_SCHEMA: EntitySchema<Town> = EntitySchema {
    type_name: TOWN,
    directory: "towns",
    fields: TOWN_FIELDS,
    computed: TOWN_COMPUTED,
};

impl Saveable for Town {
    fn schema() -> &'static EntitySchema<Self> {
        &TOWN_SCHEMA
    }

    fn blank() -> Self {
        Self {
            uuid: Uuid::nil(),
            name: String::new(),
            board: String::new(),
            taxes: 0.0,
            plot_price: 0.0,
            open: false,
            public: false,
            bonus_blocks: 0,
            spawn: None,
            mayor: None,
            residents: Vec::new(),
            nation: None,
            world: None,
        }
    }

    fn id(&self) -> Uuid {
        self.uuid
    }
}

impl Account for Town {
    fn account_name(&self) -> String {
        format!("town-{}", self.name)
    }

    fn account_world(&self) -> Option<String> {
        self.spawn.as_ref().map(|s| s.world.clone())
    }
}

// ---------- Nation ----------

/// An alliance of towns with a capital.
#[derive(Debug, Clone, PartialEq)]
pub struct Nation {
    pub uuid: Uuid,
    pub name: String,
    pub taxes: f64,
    pub neutral: bool,
    pub capital: Option<Uuid>,
    pub towns: Vec<Uuid>,
}

impl Nation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            ..Self::blank()
        }
    }
}

static NATION_FIELDS: &[FieldDef<Nation>] = &[
    FieldDef::new(
        "uuid",
        FieldKind::Uuid,
        |n: &Nation| Some(FieldValue::Uuid(n.uuid)),
        |n, v| {
            if let Some(id) = v.as_uuid() {
                n.uuid = id;
            }
        },
    ),
    FieldDef::new(
        "name",
        FieldKind::Text,
        |n: &Nation| Some(FieldValue::Text(n.name.clone())),
        |n, v| {
            if let Some(s) = v.as_text() {
                n.name = s.to_string();
            }
        },
    ),
    FieldDef::new(
        "taxes",
        FieldKind::Float,
        |n: &Nation| Some(FieldValue::Float(n.taxes)),
        |n, v| {
            if let Some(x) = v.as_float() {
                n.taxes = x;
            }
        },
    ),
    FieldDef::new(
        "neutral",
        FieldKind::Bool,
        |n: &Nation| Some(FieldValue::Bool(n.neutral)),
        |n, v| {
            if let Some(b) = v.as_bool() {
                n.neutral = b;
            }
        },
    ),
    FieldDef::new(
        "capital",
        FieldKind::Uuid,
        |n: &Nation| n.capital.map(FieldValue::Uuid),
        |n, v| {
            if let Some(id) = v.as_uuid() {
                n.capital = Some(id);
            }
        },
    )
    .deferred(town_ref),
    FieldDef::new(
        "towns",
        FieldKind::List(&FieldKind::Uuid),
        |n: &Nation| uuid_list_value(&n.towns),
        |n, v| {
            if let Some(ids) = v.as_uuid_list() {
                n.towns = ids;
            }
        },
    )
    .deferred(town_list_ref),
];

pub static NATION_SCHEMA: EntitySchema<Nation> = EntitySchema {
    type_name: NATION,
    directory: "nations",
    fields: NATION_FIELDS,
    computed: &[],
};

impl Saveable for Nation {
    fn schema() -> &'static EntitySchema<Self> {
        &NATION_SCHEMA
    }

    fn blank() -> Self {
        Self {
            uuid: Uuid::nil(),
            name: String::new(),
            taxes: 0.0,
            neutral: false,
            capital: None,
            towns: Vec::new(),
        }
    }

    fn id(&self) -> Uuid {
        self.uuid
    }
}

impl Account for Nation {
    fn account_name(&self) -> String {
        format!("nation-{}", self.name)
    }
}

// ---------- GameWorld ----------

/// A server world that towns may claim land in.
#[derive(Debug, Clone, PartialEq)]
pub struct GameWorld {
    pub uuid: Uuid,
    pub name: String,
    pub pvp: bool,
    pub claimable: bool,
    /// Whether town mechanics apply in this world at all.
    pub towns_enabled: bool,
}

impl GameWorld {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            ..Self::blank()
        }
    }
}

static WORLD_FIELDS: &[FieldDef<GameWorld>] = &[
    FieldDef::new(
        "uuid",
        FieldKind::Uuid,
        |w: &GameWorld| Some(FieldValue::Uuid(w.uuid)),
        |w, v| {
            if let Some(id) = v.as_uuid() {
                w.uuid = id;
            }
        },
    ),
    FieldDef::new(
        "name",
        FieldKind::Text,
        |w: &GameWorld| Some(FieldValue::Text(w.name.clone())),
        |w, v| {
            if let Some(s) = v.as_text() {
                w.name = s.to_string();
            }
        },
    ),
    FieldDef::new(
        "pvp",
        FieldKind::Bool,
        |w: &GameWorld| Some(FieldValue::Bool(w.pvp)),
        |w, v| {
            if let Some(b) = v.as_bool() {
                w.pvp = b;
            }
        },
    ),
    FieldDef::new(
        "claimable",
        FieldKind::Bool,
        |w: &GameWorld| Some(FieldValue::Bool(w.claimable)),
        |w, v| {
            if let Some(b) = v.as_bool() {
                w.claimable = b;
            }
        },
    ),
    FieldDef::new(
        "townsEnabled",
        FieldKind::Bool,
        |w: &GameWorld| Some(FieldValue::Bool(w.towns_enabled)),
        |w, v| {
            if let Some(b) = v.as_bool() {
                w.towns_enabled = b;
            }
        },
    ),
];

pub static WORLD_SCHEMA: EntitySchema<GameWorld> = EntitySchema {
    type_name: WORLD,
    directory: "worlds",
    fields: WORLD_FIELDS,
    computed: &[],
};

impl Saveable for GameWorld {
    fn schema() -> &'static EntitySchema<Self> {
        &WORLD_SCHEMA
    }

    fn blank() -> Self {
        Self {
            uuid: Uuid::nil(),
            name: String::new(),
            pvp: false,
            claimable: true,
            towns_enabled: true,
        }
    }

    fn id(&self) -> Uuid {
        self.uuid
    }
}

// ---------- TownBlock ----------

/// Plot designation of a claimed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlotType {
    #[default]
    Residential,
    Commercial,
    Arena,
    Embassy,
    Wilds,
    Jail,
}

pub const PLOT_TYPE_NAMES: &[&str] = &[
    "residential",
    "commercial",
    "arena",
    "embassy",
    "wilds",
    "jail",
];

impl PlotType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::Commercial => "commercial",
            Self::Arena => "arena",
            Self::Embassy => "embassy",
            Self::Wilds => "wilds",
            Self::Jail => "jail",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "residential" => Some(Self::Residential),
            "commercial" => Some(Self::Commercial),
            "arena" => Some(Self::Arena),
            "embassy" => Some(Self::Embassy),
            "wilds" => Some(Self::Wilds),
            "jail" => Some(Self::Jail),
            _ => None,
        }
    }
}

/// One claimed chunk of land inside a world.
#[derive(Debug, Clone, PartialEq)]
pub struct TownBlock {
    pub uuid: Uuid,
    pub x: i64,
    pub z: i64,
    pub plot_type: PlotType,
    pub price: f64,
    pub world: Option<Uuid>,
    pub town: Option<Uuid>,
    pub resident: Option<Uuid>,
}

impl TownBlock {
    pub fn new(x: i64, z: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            x,
            z,
            ..Self::blank()
        }
    }
}

static TOWN_BLOCK_FIELDS: &[FieldDef<TownBlock>] = &[
    FieldDef::new(
        "uuid",
        FieldKind::Uuid,
        |b: &TownBlock| Some(FieldValue::Uuid(b.uuid)),
        |b, v| {
            if let Some(id) = v.as_uuid() {
                b.uuid = id;
            }
        },
    ),
    FieldDef::new(
        "x",
        FieldKind::Int,
        |b: &TownBlock| Some(FieldValue::Int(b.x)),
        |b, v| {
            if let Some(i) = v.as_int() {
                b.x = i;
            }
        },
    ),
    FieldDef::new(
        "z",
        FieldKind::Int,
        |b: &TownBlock| Some(FieldValue::Int(b.z)),
        |b, v| {
            if let Some(i) = v.as_int() {
                b.z = i;
            }
        },
    ),
    FieldDef::new(
        "plotType",
        FieldKind::Enum(PLOT_TYPE_NAMES),
        |b: &TownBlock| Some(FieldValue::Text(b.plot_type.as_str().to_string())),
        |b, v| {
            if let Some(pt) = v.as_text().and_then(PlotType::from_name) {
                b.plot_type = pt;
            }
        },
    ),
    FieldDef::new(
        "price",
        FieldKind::Float,
        |b: &TownBlock| Some(FieldValue::Float(b.price)),
        |b, v| {
            if let Some(x) = v.as_float() {
                b.price = x;
            }
        },
    ),
    FieldDef::new(
        "world",
        FieldKind::Uuid,
        |b: &TownBlock| b.world.map(FieldValue::Uuid),
        |b, v| {
            if let Some(id) = v.as_uuid() {
                b.world = Some(id);
            }
        },
    )
    .deferred(world_ref),
    FieldDef::new(
        "town",
        FieldKind::Uuid,
        |b: &TownBlock| b.town.map(FieldValue::Uuid),
        |b, v| {
            if let Some(id) = v.as_uuid() {
                b.town = Some(id);
            }
        },
    )
    .deferred(town_ref),
    FieldDef::new(
        "resident",
        FieldKind::Uuid,
        |b: &TownBlock| b.resident.map(FieldValue::Uuid),
        |b, v| {
            if let Some(id) = v.as_uuid() {
                b.resident = Some(id);
            }
        },
    )
    .deferred(resident_ref),
];

pub static TOWN_BLOCK_SCHEMA: EntitySchema<TownBlock> = EntitySchema {
    type_name: TOWN_BLOCK,
    directory: "townblocks",
    fields: TOWN_BLOCK_FIELDS,
    computed: &[],
};

impl Saveable for TownBlock {
    fn schema() -> &'static EntitySchema<Self> {
        &TOWN_BLOCK_SCHEMA
    }

    fn blank() -> Self {
        Self {
            uuid: Uuid::nil(),
            x: 0,
            z: 0,
            plot_type: PlotType::default(),
            price: 0.0,
            world: None,
            town: None,
            resident: None,
        }
    }

    fn id(&self) -> Uuid {
        self.uuid
    }
}
