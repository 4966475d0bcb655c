use delve_blocks::Block;

pub const PALETTE_CAPACITY: usize = 256;

/// Outcome of adding a block to a [`Palette`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaletteInsert {
    Existing(u8),
    Added(u8),
    /// The palette already holds [`PALETTE_CAPACITY`] distinct blocks.
    Full,
}

#[derive(Clone, Debug, Default)]
pub struct Palette {
    entries: Vec<Block>,
}

impl Palette {
    pub fn with_first(block: Block) -> Self {
        Self {
            entries: vec![block],
        }
    }

    #[inline]
    pub fn get(&self, index: u8) -> Block {
        self.entries[index as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, block: Block) -> PaletteInsert {
        if let Some(i) = self.entries.iter().position(|b| *b == block) {
            return PaletteInsert::Existing(i as u8);
        }
        if self.entries.len() >= PALETTE_CAPACITY {
            return PaletteInsert::Full;
        }
        self.entries.push(block);
        PaletteInsert::Added((self.entries.len() - 1) as u8)
    }
}
