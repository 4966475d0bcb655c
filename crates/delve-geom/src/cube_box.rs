use crate::CubeCoord;

/// Inclusive axis-aligned box in cube coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CubeBox {
    pub min: CubeCoord,
    pub max: CubeCoord,
}

impl CubeBox {
    /// Box spanning the two corners in any order.
    #[inline]
    pub fn new(a: CubeCoord, b: CubeCoord) -> Self {
        Self {
            min: CubeCoord::new(a.cx.min(b.cx), a.cy.min(b.cy), a.cz.min(b.cz)),
            max: CubeCoord::new(a.cx.max(b.cx), a.cy.max(b.cy), a.cz.max(b.cz)),
        }
    }

    #[inline]
    pub const fn point(c: CubeCoord) -> Self {
        Self { min: c, max: c }
    }

    #[inline]
    pub fn contains(&self, c: CubeCoord) -> bool {
        c.cx >= self.min.cx
            && c.cx <= self.max.cx
            && c.cy >= self.min.cy
            && c.cy <= self.max.cy
            && c.cz >= self.min.cz
            && c.cz <= self.max.cz
    }

    #[inline]
    pub fn intersects(&self, other: &CubeBox) -> bool {
        self.min.cx <= other.max.cx
            && self.max.cx >= other.min.cx
            && self.min.cy <= other.max.cy
            && self.max.cy >= other.min.cy
            && self.min.cz <= other.max.cz
            && self.max.cz >= other.min.cz
    }

    /// Grows the box to cover `c`. Never shrinks.
    #[inline]
    pub fn include(&mut self, c: CubeCoord) {
        self.min.cx = self.min.cx.min(c.cx);
        self.min.cy = self.min.cy.min(c.cy);
        self.min.cz = self.min.cz.min(c.cz);
        self.max.cx = self.max.cx.max(c.cx);
        self.max.cy = self.max.cy.max(c.cy);
        self.max.cz = self.max.cz.max(c.cz);
    }

    #[inline]
    pub fn union(&mut self, other: &CubeBox) {
        self.include(other.min);
        self.include(other.max);
    }

    #[inline]
    pub fn volume(&self) -> u64 {
        let ex = (i64::from(self.max.cx) - i64::from(self.min.cx) + 1) as u64;
        let ey = (i64::from(self.max.cy) - i64::from(self.min.cy) + 1) as u64;
        let ez = (i64::from(self.max.cz) - i64::from(self.min.cz) + 1) as u64;
        ex * ey * ez
    }
}
