//! CPU mirror of the swarm shader kernels.
//!
//! The functions here compute exactly what the WGSL in `src/shaders/` computes
//! for one texel or one particle. They are used to check invariants without a
//! GPU (inert texels, zero-dt idempotence, respawn-to-seed, excess texels
//! drawing at zero size) and by the criterion benches.

use glam::{Vec2, Vec3, Vec3Swizzles, Vec4, Vec4Swizzles};

use crate::uniforms::{MaterialUniforms, SimulationUniforms, REFERENCE_FPS};

/// Distance below which a particle is considered on the attractor.
pub const ATTRACTOR_EPSILON: f32 = 1e-5;

/// Curl finite-difference step.
pub const CURL_EPSILON: f32 = 0.1;

/// Hash a u32 to a pseudo-random u32.
#[inline]
pub fn hash(n: u32) -> u32 {
    let mut x = n;
    x ^= x >> 17;
    x = x.wrapping_mul(0xed5a_d4bb);
    x ^= x >> 11;
    x = x.wrapping_mul(0xac4c_1b51);
    x ^= x >> 15;
    x = x.wrapping_mul(0x3184_8bab);
    x ^= x >> 14;
    x
}

#[inline]
pub fn hash2(x: u32, y: u32) -> u32 {
    hash(x.wrapping_add(hash(y)))
}

/// Uniform float in `[0, 1)`.
#[inline]
pub fn rand(seed: u32) -> f32 {
    (hash(seed) >> 8) as f32 / 16_777_216.0
}

#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn mod289_3(x: Vec3) -> Vec3 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn mod289_4(x: Vec4) -> Vec4 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute4(x: Vec4) -> Vec4 {
    mod289_4(((x * 34.0) + 1.0) * x)
}

fn taylor_inv_sqrt4(r: Vec4) -> Vec4 {
    Vec4::splat(1.792_842_9) - 0.853_734_7 * r
}

/// GLSL `step`: 0 where `x < edge`, else 1.
fn step3(edge: Vec3, x: Vec3) -> Vec3 {
    Vec3::select(x.cmplt(edge), Vec3::ZERO, Vec3::ONE)
}

fn step4(edge: Vec4, x: Vec4) -> Vec4 {
    Vec4::select(x.cmplt(edge), Vec4::ZERO, Vec4::ONE)
}

/// 3D simplex noise in `[-1, 1]`.
pub fn noise3(v: Vec3) -> f32 {
    let c = Vec2::new(1.0 / 6.0, 1.0 / 3.0);

    let mut i = (v + v.dot(Vec3::splat(c.y))).floor();
    let x0 = v - i + i.dot(Vec3::splat(c.x));

    let g = step3(x0.yzx(), x0);
    let l = Vec3::ONE - g;
    let i1 = g.min(l.zxy());
    let i2 = g.max(l.zxy());

    let x1 = x0 - i1 + c.x;
    let x2 = x0 - i2 + c.y;
    let x3 = x0 - 0.5;

    i = mod289_3(i);
    let p = permute4(
        permute4(
            permute4(Vec4::splat(i.z) + Vec4::new(0.0, i1.z, i2.z, 1.0))
                + i.y
                + Vec4::new(0.0, i1.y, i2.y, 1.0),
        ) + i.x
            + Vec4::new(0.0, i1.x, i2.x, 1.0),
    );

    let n = 0.142_857_15_f32;
    let ns = Vec3::new(2.0 * n, 0.5 * n - 1.0, n);

    let j = p - 49.0 * (p * ns.z * ns.z).floor();

    let x_ = (j * ns.z).floor();
    let y_ = (j - 7.0 * x_).floor();

    let x = x_ * ns.x + Vec4::splat(ns.y);
    let y = y_ * ns.x + Vec4::splat(ns.y);
    let h = Vec4::ONE - x.abs() - y.abs();

    let b0 = Vec4::new(x.x, x.y, y.x, y.y);
    let b1 = Vec4::new(x.z, x.w, y.z, y.w);

    let s0 = b0.floor() * 2.0 + 1.0;
    let s1 = b1.floor() * 2.0 + 1.0;
    let sh = -step4(h, Vec4::ZERO);

    let a0 = b0.xzyw() + s0.xzyw() * sh.xxyy();
    let a1 = b1.xzyw() + s1.xzyw() * sh.zzww();

    let mut p0 = Vec3::new(a0.x, a0.y, h.x);
    let mut p1 = Vec3::new(a0.z, a0.w, h.y);
    let mut p2 = Vec3::new(a1.x, a1.y, h.z);
    let mut p3 = Vec3::new(a1.z, a1.w, h.w);

    let norm = taylor_inv_sqrt4(Vec4::new(p0.dot(p0), p1.dot(p1), p2.dot(p2), p3.dot(p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    let mut m =
        (Vec4::splat(0.6) - Vec4::new(x0.dot(x0), x1.dot(x1), x2.dot(x2), x3.dot(x3))).max(Vec4::ZERO);
    m = m * m;
    42.0 * (m * m).dot(Vec4::new(p0.dot(x0), p1.dot(x1), p2.dot(x2), p3.dot(x3)))
}

fn curl_potential(p: Vec3) -> Vec3 {
    Vec3::new(
        noise3(p),
        noise3(p + Vec3::new(31.416, -47.853, 12.793)),
        noise3(p + Vec3::new(-233.145, -113.408, -185.31)),
    )
}

/// Curl of the simplex potential at `p`.
pub fn curl_noise(p: Vec3) -> Vec3 {
    let dx = Vec3::new(CURL_EPSILON, 0.0, 0.0);
    let dy = Vec3::new(0.0, CURL_EPSILON, 0.0);
    let dz = Vec3::new(0.0, 0.0, CURL_EPSILON);

    let px0 = curl_potential(p - dx);
    let px1 = curl_potential(p + dx);
    let py0 = curl_potential(p - dy);
    let py1 = curl_potential(p + dy);
    let pz0 = curl_potential(p - dz);
    let pz1 = curl_potential(p + dz);

    let x = (py1.z - py0.z) - (pz1.y - pz0.y);
    let y = (pz1.x - pz0.x) - (px1.z - px0.z);
    let z = (px1.y - px0.y) - (py1.x - py0.x);
    Vec3::new(x, y, z) / (2.0 * CURL_EPSILON)
}

/// Radius of the attraction shell at the uniforms' time.
pub fn breathing_radius(u: &SimulationUniforms) -> f32 {
    u.radius * (1.0 + (u.time * u.breathing_rate).sin() * u.breathing_depth)
}

/// Advance one texel of the state texture.
///
/// `previous` is `(x, y, z, life)`, `seed` is the texel's seed position. Texels
/// at or beyond `particle_count` are returned unchanged.
pub fn step_texel(previous: Vec4, seed: Vec4, index: u32, u: &SimulationUniforms) -> Vec4 {
    if index >= u.particle_count {
        return previous;
    }

    let dt = u.delta_time;
    let life = previous.w - u.die_speed * dt;
    if life < 0.0 {
        return seed.xyz().extend(rand(hash2(index, u.frame)));
    }

    let position = previous.xyz();
    let frames = dt * REFERENCE_FPS;

    let to_target = u.follow_position() - position;
    let distance = to_target.length();
    let mut displacement = Vec3::ZERO;
    if distance > ATTRACTOR_EPSILON {
        // Capped so a long frame never carries a particle past the shell.
        let pull = (u.attraction * u.speed * frames).min(1.0);
        displacement += to_target / distance * (distance - breathing_radius(u)) * pull;
    }

    let noise_position = position * u.curl_size + Vec3::splat(u.time * u.curl_time_scale);
    displacement += curl_noise(noise_position) * u.curl_strength * u.speed * frames;

    (position + displacement).extend(life)
}

/// Step a whole CPU-side state array, texel by texel.
pub fn step_field(state: &[Vec4], seeds: &[Vec4], u: &SimulationUniforms) -> Vec<Vec4> {
    state
        .iter()
        .zip(seeds)
        .enumerate()
        .map(|(index, (previous, seed))| step_texel(*previous, *seed, index as u32, u))
        .collect()
}

/// Point size in physical pixels for a particle whose clip-space `w` is `clip_w`.
pub fn point_size_px(size_seed: f32, index: u32, u: &MaterialUniforms, clip_w: f32) -> f32 {
    if index >= u.particle_count || clip_w <= 0.0 {
        return 0.0;
    }
    u.point_size
        * u.size_numerator
        * smoothstep(u.size_start, u.size_end, size_seed)
        * (u.resolution[1] / 1000.0)
        / clip_w
}

/// Shadow-space UV offset of jitter sample `sample` for particle `index`.
pub fn jitter_offset(index: u32, sample: u32, spread: f32) -> Vec2 {
    if spread <= 0.0 {
        return Vec2::ZERO;
    }
    let jitter = Vec2::new(
        rand(hash2(index, sample * 2)),
        rand(hash2(index, sample * 2 + 1)),
    ) * 2.0
        - 1.0;
    jitter / spread
}

/// Brightness factor from a set of depth samples around the particle.
///
/// A sample occludes when `depth - bias > sampled`. The factor is
/// `1 - occluded_fraction * reduction`; no samples means no shadow.
pub fn shadow_factor(depth: f32, samples: &[f32], bias: f32, reduction: f32) -> f32 {
    if samples.is_empty() {
        return 1.0;
    }
    let occluded = samples.iter().filter(|s| depth - bias > **s).count();
    1.0 - (occluded as f32 / samples.len() as f32) * reduction
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniforms(count: u32) -> SimulationUniforms {
        SimulationUniforms {
            follow_position: [0.0, 0.0, 0.0, 1.0],
            time: 1.3,
            delta_time: 1.0 / 60.0,
            speed: 0.04,
            die_speed: 1.22,
            attraction: 11.35,
            radius: 0.58,
            curl_size: 0.38,
            curl_strength: 1.0,
            curl_time_scale: 0.59,
            breathing_rate: 0.49,
            breathing_depth: 0.17,
            particle_count: count,
            texture_size: 4,
            frame: 7,
            _padding: [0; 2],
        }
    }

    #[test]
    fn test_rand_range() {
        for seed in 0..10_000 {
            let r = rand(seed);
            assert!((0.0..1.0).contains(&r));
        }
        assert_eq!(rand(u32::MAX >> 1), rand(u32::MAX >> 1));
    }

    #[test]
    fn test_noise_bounded_and_continuous() {
        let mut p = Vec3::new(0.1, 0.2, 0.3);
        let mut last = noise3(p);
        for _ in 0..500 {
            p += Vec3::splat(0.01);
            let n = noise3(p);
            assert!(n.abs() <= 1.0);
            assert!((n - last).abs() < 0.2);
            last = n;
        }
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut u = uniforms(4);
        u.delta_time = 0.0;
        let seed = Vec4::new(3.0, 0.0, 0.0, 0.5);
        let previous = Vec4::new(1.0, 2.0, -0.5, 0.25);
        for _ in 0..10 {
            assert_eq!(step_texel(previous, seed, 0, &u), previous);
        }
        // A particle sitting exactly on the attractor stays finite.
        let centered = Vec4::new(0.0, 0.0, 0.0, 0.25);
        assert_eq!(step_texel(centered, seed, 1, &u), centered);
    }

    #[test]
    fn test_respawn_resets_to_seed() {
        let mut u = uniforms(4);
        u.delta_time = 0.5;
        u.die_speed = 1.0;
        let seed = Vec4::new(3.0, 0.0, 0.0, 0.9);
        let previous = Vec4::new(1.0, 2.0, -0.5, 0.25);
        let next = step_texel(previous, seed, 2, &u);
        assert_eq!(next.xyz(), seed.xyz());
        assert!((0.0..1.0).contains(&next.w));
    }

    #[test]
    fn test_live_particle_decays_and_moves() {
        let u = uniforms(4);
        let previous = Vec4::new(2.0, 0.0, 0.0, 0.9);
        let next = step_texel(previous, Vec4::ZERO, 0, &u);
        assert!((next.w - (0.9 - 1.22 / 60.0)).abs() < 1e-6);
        assert_ne!(next.xyz(), previous.xyz());
        // Pulled inward toward the shell.
        assert!(next.xyz().length() < 2.0);
    }

    #[test]
    fn test_inert_texels_untouched() {
        let mut u = uniforms(2);
        u.delta_time = 1.0;
        let previous = Vec4::new(5.0, 5.0, 5.0, -3.0);
        assert_eq!(step_texel(previous, Vec4::ZERO, 2, &u), previous);
        assert_eq!(step_texel(previous, Vec4::ZERO, 3, &u), previous);
    }

    #[test]
    fn test_excess_texels_have_zero_size() {
        let mut u = MaterialUniforms::default();
        u.particle_count = 10;
        u.point_size = 1.03;
        u.size_numerator = 41.0;
        u.size_start = 0.06;
        u.size_end = 0.5;
        u.resolution = [1920.0, 1080.0];

        assert!(point_size_px(0.9, 9, &u, 5.0) > 0.0);
        for index in 10..16 {
            assert_eq!(point_size_px(0.9, index, &u, 5.0), 0.0);
        }
        // Below the smoothstep start the particle also vanishes.
        assert_eq!(point_size_px(0.01, 0, &u, 5.0), 0.0);
    }

    #[test]
    fn test_shadow_factor() {
        assert_eq!(shadow_factor(0.5, &[], 0.002, 0.53), 1.0);
        assert_eq!(shadow_factor(0.5, &[1.0, 1.0], 0.002, 0.53), 1.0);
        let half = shadow_factor(0.5, &[0.1, 1.0], 0.002, 0.5);
        assert!((half - 0.75).abs() < 1e-6);
        // Bias keeps a particle from shadowing itself.
        assert_eq!(shadow_factor(0.5, &[0.499], 0.002, 1.0), 1.0);
    }

    #[test]
    fn test_jitter_radius() {
        for sample in 0..8 {
            let offset = jitter_offset(17, sample, 512.0);
            assert!(offset.x.abs() <= 1.0 / 512.0);
            assert!(offset.y.abs() <= 1.0 / 512.0);
        }
        assert_eq!(jitter_offset(17, 0, 0.0), Vec2::ZERO);
    }
}
