use delve_blocks::Biome;

/// Biome lookup by world block position.
pub trait BiomeSource {
    fn biome_at(&self, x: i32, y: i32, z: i32) -> Biome;
}

impl BiomeSource for Biome {
    #[inline]
    fn biome_at(&self, _x: i32, _y: i32, _z: i32) -> Biome {
        *self
    }
}

/// Adapts a closure into a [`BiomeSource`].
pub struct BiomeFn<F>(pub F);

impl<F: Fn(i32, i32, i32) -> Biome> BiomeSource for BiomeFn<F> {
    #[inline]
    fn biome_at(&self, x: i32, y: i32, z: i32) -> Biome {
        (self.0)(x, y, z)
    }
}
