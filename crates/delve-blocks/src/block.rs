use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type BlockId = u16;
pub type BlockState = u16;

/// One voxel: a block id plus a small state word (fluid level, orientation, ...).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Block {
    pub id: BlockId,
    pub state: BlockState,
}

impl Block {
    pub const AIR: Block = Block::new(0);
    pub const STONE: Block = Block::new(1);
    pub const GRASS: Block = Block::new(2);
    pub const DIRT: Block = Block::new(3);
    pub const BEDROCK: Block = Block::new(7);
    pub const FLOWING_WATER: Block = Block::new(8);
    pub const WATER: Block = Block::new(9);
    pub const FLOWING_LAVA: Block = Block::new(10);
    pub const LAVA: Block = Block::new(11);
    pub const SAND: Block = Block::new(12);
    pub const GRAVEL: Block = Block::new(13);
    pub const SANDSTONE: Block = Block::new(24);
    pub const MYCELIUM: Block = Block::new(110);

    #[inline]
    pub const fn new(id: BlockId) -> Self {
        Self { id, state: 0 }
    }

    #[inline]
    pub const fn with_state(id: BlockId, state: BlockState) -> Self {
        Self { id, state }
    }

    #[inline]
    pub const fn is_air(self) -> bool {
        self.id == Self::AIR.id
    }

    /// Still water only; flowing water does not count.
    #[inline]
    pub const fn is_still_water(self) -> bool {
        self.id == Self::WATER.id
    }

    #[inline]
    pub const fn is_fluid(self) -> bool {
        matches!(self.id, 8..=11)
    }

    /// Name from the built-in catalogue, if the id is known.
    pub fn name(self) -> Option<&'static str> {
        NAMED
            .iter()
            .find(|(_, b)| b.id == self.id)
            .map(|(n, _)| *n)
    }

    /// Looks up a catalogue name, accepting an optional `name:state` suffix.
    pub fn from_name(name: &str) -> Option<Block> {
        let (base, state) = match name.split_once(':') {
            Some((base, state)) => (base, state.parse().ok()?),
            None => (name, 0),
        };
        NAMED
            .iter()
            .find(|(n, _)| *n == base)
            .map(|(_, b)| Block::with_state(b.id, state))
    }
}

const NAMED: &[(&str, Block)] = &[
    ("air", Block::AIR),
    ("stone", Block::STONE),
    ("grass", Block::GRASS),
    ("dirt", Block::DIRT),
    ("bedrock", Block::BEDROCK),
    ("flowing_water", Block::FLOWING_WATER),
    ("water", Block::WATER),
    ("flowing_lava", Block::FLOWING_LAVA),
    ("lava", Block::LAVA),
    ("sand", Block::SAND),
    ("gravel", Block::GRAVEL),
    ("sandstone", Block::SANDSTONE),
    ("mycelium", Block::MYCELIUM),
];

// Config files refer to blocks by name; numeric ids are accepted too.
impl Serialize for Block {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match (self.name(), self.state) {
            (Some(n), 0) => s.serialize_str(n),
            (Some(n), st) => s.serialize_str(&format!("{n}:{st}")),
            (None, _) => s.serialize_u16(self.id),
        }
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Id(u16),
            Name(String),
        }
        match Repr::deserialize(d)? {
            Repr::Id(id) => Ok(Block::new(id)),
            Repr::Name(n) => Block::from_name(&n)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown block '{n}'"))),
        }
    }
}
