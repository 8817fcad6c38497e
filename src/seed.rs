//! Seed geometry and state texture layout.
//!
//! Particles are born on the vertices of a UV sphere. Each vertex becomes one
//! texel of a square state texture; the texture side is the smallest integer
//! whose square holds every vertex, and the texels past the particle count are
//! inert.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SwarmError;

/// Most particles a swarm can hold: a full 8192 x 8192 state texture.
pub const MAX_PARTICLES: u32 = 8192 * 8192;

/// Vertex count of a UV sphere, after the minimum segment clamp.
///
/// Fails when the sphere would need more than [`MAX_PARTICLES`] texels.
pub fn sphere_vertex_count(width_segments: u32, height_segments: u32) -> Result<u32, SwarmError> {
    let columns = width_segments.max(3).checked_add(1);
    let rows = height_segments.max(2).checked_add(1);
    columns
        .zip(rows)
        .and_then(|(columns, rows)| columns.checked_mul(rows))
        .filter(|&count| count <= MAX_PARTICLES)
        .ok_or_else(|| {
            SwarmError::configuration(format!(
                "a {width_segments} x {height_segments} sphere exceeds {MAX_PARTICLES} particles"
            ))
        })
}

/// UV sphere vertices in row-major order from the north pole.
///
/// Produces `(width_segments + 1) * (height_segments + 1)` vertices. Seams and
/// poles are duplicated, matching the usual sphere mesh layout.
pub fn sphere_vertices(
    radius: f32,
    width_segments: u32,
    height_segments: u32,
) -> Result<Vec<Vec3>, SwarmError> {
    let count = sphere_vertex_count(width_segments, height_segments)?;
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let mut vertices = Vec::with_capacity(count as usize);

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let theta = v * std::f32::consts::PI;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * std::f32::consts::TAU;
            vertices.push(Vec3::new(
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            ));
        }
    }
    Ok(vertices)
}

/// Smallest `s` with `s * s >= count`.
pub fn texture_size_for(count: u32) -> u32 {
    let mut size = (count as f64).sqrt().ceil() as u32;
    while (size as u64) * (size as u64) < count as u64 {
        size += 1;
    }
    while size > 1 && ((size - 1) as u64) * ((size - 1) as u64) >= count as u64 {
        size -= 1;
    }
    size
}

/// Particle count and state texture side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    particle_count: u32,
    texture_size: u32,
}

impl FieldLayout {
    /// Layout with an explicit texture side.
    pub fn new(particle_count: u32, texture_size: u32) -> Result<Self, SwarmError> {
        if particle_count == 0 {
            return Err(SwarmError::configuration("particle count must be positive"));
        }
        if texture_size == 0 {
            return Err(SwarmError::configuration("texture size must be positive"));
        }
        if (texture_size as u64) * (texture_size as u64) < particle_count as u64 {
            return Err(SwarmError::configuration(format!(
                "texture size {texture_size} holds {} texels, need {particle_count}",
                texture_size as u64 * texture_size as u64
            )));
        }
        Ok(Self {
            particle_count,
            texture_size,
        })
    }

    /// Tightest layout for `particle_count` particles.
    pub fn for_count(particle_count: u32) -> Result<Self, SwarmError> {
        Self::new(particle_count, texture_size_for(particle_count))
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    pub fn texture_size(&self) -> u32 {
        self.texture_size
    }

    /// Texels in the state texture, inert ones included.
    pub fn texel_count(&self) -> u32 {
        self.texture_size * self.texture_size
    }

    /// Texel coordinate of particle `index`.
    pub fn texel(&self, index: u32) -> (u32, u32) {
        (index % self.texture_size, index / self.texture_size)
    }

    pub fn is_live(&self, index: u32) -> bool {
        index < self.particle_count
    }
}

/// CPU-side initial contents of the simulation field.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedData {
    pub layout: FieldLayout,
    /// `(x, y, z, life)` per texel. Inert texels are zero.
    pub texels: Vec<[f32; 4]>,
    /// Per-instance random size seed in `[0, 1)`.
    pub size_seeds: Vec<f32>,
}

impl SeedData {
    /// Lay `positions` out on a texture of side `texture_size` with random
    /// initial lifetimes.
    pub fn new(
        positions: &[Vec3],
        texture_size: u32,
        rng: &mut impl Rng,
    ) -> Result<Self, SwarmError> {
        let count = u32::try_from(positions.len())
            .map_err(|_| SwarmError::configuration("too many seed positions"))?;
        let layout = FieldLayout::new(count, texture_size)?;

        let mut texels = vec![[0.0; 4]; layout.texel_count() as usize];
        for (texel, position) in texels.iter_mut().zip(positions) {
            *texel = [position.x, position.y, position.z, rng.gen::<f32>()];
        }
        let size_seeds = (0..layout.texel_count()).map(|_| rng.gen::<f32>()).collect();

        Ok(Self {
            layout,
            texels,
            size_seeds,
        })
    }

    /// Tightest layout for `positions`.
    pub fn tight(positions: &[Vec3], rng: &mut impl Rng) -> Result<Self, SwarmError> {
        let count = u32::try_from(positions.len())
            .map_err(|_| SwarmError::configuration("too many seed positions"))?;
        Self::new(positions, texture_size_for(count.max(1)), rng)
    }

    /// Seed position of particle `index`.
    pub fn position(&self, index: u32) -> Vec3 {
        let [x, y, z, _] = self.texels[index as usize];
        Vec3::new(x, y, z)
    }
}

/// Deterministic generator when `seed` is set, entropy otherwise.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_vertex_count() {
        assert_eq!(sphere_vertices(3.0, 256, 256).unwrap().len(), 66_049);
        assert_eq!(sphere_vertices(3.0, 128, 128).unwrap().len(), 16_641);
        assert_eq!(sphere_vertex_count(0, 0).unwrap(), 12);
    }

    #[test]
    fn test_oversized_sphere_is_rejected_before_allocating() {
        assert!(matches!(
            sphere_vertices(3.0, 65535, 65535),
            Err(SwarmError::Configuration(_))
        ));
        assert!(matches!(
            sphere_vertex_count(u32::MAX, 2),
            Err(SwarmError::Configuration(_))
        ));
        assert!(matches!(
            sphere_vertex_count(8192, 8192),
            Err(SwarmError::Configuration(_))
        ));
        assert_eq!(sphere_vertex_count(8191, 8191).unwrap(), MAX_PARTICLES);
    }

    #[test]
    fn test_sphere_vertices_on_radius() {
        let vertices = sphere_vertices(3.0, 16, 16).unwrap();
        for v in &vertices {
            assert!((v.length() - 3.0).abs() < 1e-4);
        }
        // Starts at the north pole.
        assert!((vertices[0] - Vec3::new(0.0, 3.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_texture_size_is_ceil_sqrt() {
        assert_eq!(texture_size_for(1), 1);
        assert_eq!(texture_size_for(10), 4);
        assert_eq!(texture_size_for(16), 4);
        assert_eq!(texture_size_for(17), 5);
        assert_eq!(texture_size_for(256), 16);
        assert_eq!(texture_size_for(66_049), 257);
        for n in 1..2000 {
            let s = texture_size_for(n);
            assert!(s * s >= n);
            assert!((s - 1) * (s - 1) < n);
        }
    }

    #[test]
    fn test_layout_rejects_bad_sizes() {
        assert!(matches!(
            FieldLayout::new(10, 0),
            Err(SwarmError::Configuration(_))
        ));
        assert!(matches!(
            FieldLayout::new(10, 3),
            Err(SwarmError::Configuration(_))
        ));
        assert!(matches!(
            FieldLayout::new(0, 4),
            Err(SwarmError::Configuration(_))
        ));
        assert!(FieldLayout::new(10, 4).is_ok());
    }

    #[test]
    fn test_seed_data_pads_inert_texels() {
        let positions: Vec<Vec3> = (0..10).map(|i| Vec3::splat(i as f32)).collect();
        let mut rng = seeded_rng(Some(7));
        let seed = SeedData::tight(&positions, &mut rng).unwrap();

        assert_eq!(seed.layout.texture_size(), 4);
        assert_eq!(seed.texels.len(), 16);
        assert_eq!(seed.size_seeds.len(), 16);
        assert_eq!(seed.position(3), Vec3::splat(3.0));
        for texel in &seed.texels[..10] {
            assert!((0.0..1.0).contains(&texel[3]));
        }
        for texel in &seed.texels[10..] {
            assert_eq!(*texel, [0.0; 4]);
        }
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let positions = sphere_vertices(1.0, 4, 4).unwrap();
        let a = SeedData::tight(&positions, &mut seeded_rng(Some(1))).unwrap();
        let b = SeedData::tight(&positions, &mut seeded_rng(Some(1))).unwrap();
        assert_eq!(a, b);
    }
}
