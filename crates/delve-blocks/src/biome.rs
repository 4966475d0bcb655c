use serde::{Deserialize, Serialize};

use crate::Block;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiomeKind {
    Plains,
    Forest,
    Desert,
    Beach,
    Ocean,
    Mountains,
    Swamp,
    MushroomIsland,
    MushroomIslandShore,
    Other(u16),
}

/// Biome as seen by the carver: its kind plus the surface and filler blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Biome {
    pub kind: BiomeKind,
    pub top: Block,
    pub filler: Block,
}

impl Biome {
    pub const PLAINS: Biome = Biome::new(BiomeKind::Plains, Block::GRASS, Block::DIRT);
    pub const DESERT: Biome = Biome::new(BiomeKind::Desert, Block::SAND, Block::SANDSTONE);
    pub const BEACH: Biome = Biome::new(BiomeKind::Beach, Block::SAND, Block::SAND);
    pub const OCEAN: Biome = Biome::new(BiomeKind::Ocean, Block::GRAVEL, Block::GRAVEL);
    pub const MUSHROOM_ISLAND: Biome =
        Biome::new(BiomeKind::MushroomIsland, Block::MYCELIUM, Block::DIRT);

    pub const fn new(kind: BiomeKind, top: Block, filler: Block) -> Self {
        Self { kind, top, filler }
    }

    /// Surface and filler blocks the carver treats as this biome's own. A few
    /// cosmetic biomes are carved as if they were grass over dirt.
    pub fn carve_surface(&self) -> (Block, Block) {
        match self.kind {
            BiomeKind::Beach
            | BiomeKind::Desert
            | BiomeKind::MushroomIsland
            | BiomeKind::MushroomIslandShore => (Block::GRASS, Block::DIRT),
            _ => (self.top, self.filler),
        }
    }
}

impl Default for Biome {
    fn default() -> Self {
        Self::PLAINS
    }
}
