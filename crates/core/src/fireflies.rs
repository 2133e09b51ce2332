//! Firefly particle field.
//!
//! Positions and scales are generated once at startup from a uniform
//! distribution over the diorama bounds and never mutated afterwards; the
//! vertex stage animates the particles from a time uniform.

use glam::Vec3;

use crate::random::SeededRandom;

/// Extent of the field: X spread, height above the ground plane, Z spread.
pub const FIELD_SIZE: Vec3 = Vec3::new(5.0, 1.5, 3.75);

/// CPU-side particle buffers, ready for GPU upload.
///
/// For `count` particles the position buffer holds exactly `3 * count`
/// floats (interleaved xyz) and the scale buffer exactly `count`.
#[derive(Debug, Clone)]
pub struct FireflyField {
    positions: Vec<f32>,
    scales: Vec<f32>,
}

impl FireflyField {
    /// Generate a field of `count` particles.
    ///
    /// X and Z are centered on the origin, Y sits in `[0, FIELD_SIZE.y)`.
    /// A count of zero yields empty buffers.
    pub fn generate(count: usize, seed: u32) -> Self {
        let mut rng = SeededRandom::new(seed);
        let mut positions = Vec::with_capacity(count * 3);
        let mut scales = Vec::with_capacity(count);

        for _ in 0..count {
            positions.push((rng.next() - 0.5) * FIELD_SIZE.x);
            positions.push(rng.next() * FIELD_SIZE.y);
            positions.push((rng.next() - 0.5) * FIELD_SIZE.z);
            scales.push(rng.next());
        }

        Self { positions, scales }
    }

    pub fn count(&self) -> usize {
        self.scales.len()
    }

    /// Interleaved xyz positions.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Per-particle size multipliers in [0, 1).
    pub fn scales(&self) -> &[f32] {
        &self.scales
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_lengths() {
        let field = FireflyField::generate(30, 1);
        assert_eq!(field.positions().len(), 90);
        assert_eq!(field.scales().len(), 30);
        assert_eq!(field.count(), 30);
    }

    #[test]
    fn positions_within_bounds() {
        let field = FireflyField::generate(500, 9);
        for xyz in field.positions().chunks(3) {
            assert!(xyz[0] >= -FIELD_SIZE.x / 2.0 && xyz[0] < FIELD_SIZE.x / 2.0);
            assert!(xyz[1] >= 0.0 && xyz[1] < FIELD_SIZE.y);
            assert!(xyz[2] >= -FIELD_SIZE.z / 2.0 && xyz[2] < FIELD_SIZE.z / 2.0);
        }
    }

    #[test]
    fn scales_within_unit_range() {
        let field = FireflyField::generate(500, 9);
        for &s in field.scales() {
            assert!((0.0..1.0).contains(&s));
        }
    }

    #[test]
    fn empty_field() {
        let field = FireflyField::generate(0, 1);
        assert!(field.positions().is_empty());
        assert!(field.scales().is_empty());
    }

    #[test]
    fn same_seed_same_field() {
        let a = FireflyField::generate(30, 123);
        let b = FireflyField::generate(30, 123);
        assert_eq!(a.positions(), b.positions());
        assert_eq!(a.scales(), b.scales());
    }
}
