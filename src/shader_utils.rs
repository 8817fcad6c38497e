//! WGSL snippets shared by the swarm shaders.
//!
//! # Available Functions
//!
//! ## Random & Hash
//! - `hash(n: u32) -> u32` - Hash a u32 to pseudo-random u32
//! - `hash2(p: vec2<u32>) -> u32` - Hash a 2D coordinate to pseudo-random u32
//! - `rand(seed: u32) -> f32` - Random float in [0, 1), never 1.0
//!
//! ## Noise
//! - `noise3(p: vec3<f32>) -> f32` - 3D simplex noise in [-1, 1]
//! - `curl_noise(p: vec3<f32>) -> vec3<f32>` - Divergence-free field built
//!   from three offset simplex potentials
//!
//! [`crate::kernel`] mirrors each of these on the CPU; keep the two in step.

/// WGSL code for random/hash functions.
pub const RANDOM_WGSL: &str = r#"
fn hash(n: u32) -> u32 {
    var x = n;
    x = x ^ (x >> 17u);
    x = x * 0xed5ad4bbu;
    x = x ^ (x >> 11u);
    x = x * 0xac4c1b51u;
    x = x ^ (x >> 15u);
    x = x * 0x31848babu;
    x = x ^ (x >> 14u);
    return x;
}

fn hash2(p: vec2<u32>) -> u32 {
    return hash(p.x + hash(p.y));
}

// 24 bits of the hash, exact in f32, strictly below 1.0
fn rand(seed: u32) -> f32 {
    return f32(hash(seed) >> 8u) / 16777216.0;
}
"#;

/// WGSL code for simplex noise.
pub const NOISE_WGSL: &str = r#"
fn mod289_3(x: vec3<f32>) -> vec3<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_4(x: vec4<f32>) -> vec4<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn permute4(x: vec4<f32>) -> vec4<f32> {
    return mod289_4(((x * 34.0) + 1.0) * x);
}

fn taylor_inv_sqrt4(r: vec4<f32>) -> vec4<f32> {
    return 1.79284291400159 - 0.85373472095314 * r;
}

fn noise3(v: vec3<f32>) -> f32 {
    let C = vec2<f32>(1.0 / 6.0, 1.0 / 3.0);
    let D = vec4<f32>(0.0, 0.5, 1.0, 2.0);

    var i = floor(v + dot(v, vec3(C.y)));
    let x0 = v - i + dot(i, vec3(C.x));

    let g = step(x0.yzx, x0.xyz);
    let l = 1.0 - g;
    let i1 = min(g.xyz, l.zxy);
    let i2 = max(g.xyz, l.zxy);

    let x1 = x0 - i1 + C.x;
    let x2 = x0 - i2 + C.y;
    let x3 = x0 - D.yyy;

    i = mod289_3(i);
    let p = permute4(permute4(permute4(
        i.z + vec4<f32>(0.0, i1.z, i2.z, 1.0))
      + i.y + vec4<f32>(0.0, i1.y, i2.y, 1.0))
      + i.x + vec4<f32>(0.0, i1.x, i2.x, 1.0));

    let n_ = 0.142857142857;
    let ns = n_ * D.wyz - D.xzx;

    let j = p - 49.0 * floor(p * ns.z * ns.z);

    let x_ = floor(j * ns.z);
    let y_ = floor(j - 7.0 * x_);

    let x = x_ * ns.x + ns.yyyy;
    let y = y_ * ns.x + ns.yyyy;
    let h = 1.0 - abs(x) - abs(y);

    let b0 = vec4<f32>(x.xy, y.xy);
    let b1 = vec4<f32>(x.zw, y.zw);

    let s0 = floor(b0) * 2.0 + 1.0;
    let s1 = floor(b1) * 2.0 + 1.0;
    let sh = -step(h, vec4<f32>(0.0));

    let a0 = b0.xzyw + s0.xzyw * sh.xxyy;
    let a1 = b1.xzyw + s1.xzyw * sh.zzww;

    var p0 = vec3<f32>(a0.xy, h.x);
    var p1 = vec3<f32>(a0.zw, h.y);
    var p2 = vec3<f32>(a1.xy, h.z);
    var p3 = vec3<f32>(a1.zw, h.w);

    let norm = taylor_inv_sqrt4(vec4<f32>(dot(p0, p0), dot(p1, p1), dot(p2, p2), dot(p3, p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    var m = max(0.6 - vec4<f32>(dot(x0, x0), dot(x1, x1), dot(x2, x2), dot(x3, x3)), vec4<f32>(0.0));
    m = m * m;
    return 42.0 * dot(m * m, vec4<f32>(dot(p0, x0), dot(p1, x1), dot(p2, x2), dot(p3, x3)));
}
"#;

/// WGSL code for the curl of a simplex potential. Requires [`NOISE_WGSL`].
pub const CURL_WGSL: &str = r#"
const CURL_EPSILON: f32 = 0.1;

fn curl_potential(p: vec3<f32>) -> vec3<f32> {
    return vec3<f32>(
        noise3(p),
        noise3(p + vec3<f32>(31.416, -47.853, 12.793)),
        noise3(p + vec3<f32>(-233.145, -113.408, -185.31))
    );
}

fn curl_noise(p: vec3<f32>) -> vec3<f32> {
    let dx = vec3<f32>(CURL_EPSILON, 0.0, 0.0);
    let dy = vec3<f32>(0.0, CURL_EPSILON, 0.0);
    let dz = vec3<f32>(0.0, 0.0, CURL_EPSILON);

    let px0 = curl_potential(p - dx);
    let px1 = curl_potential(p + dx);
    let py0 = curl_potential(p - dy);
    let py1 = curl_potential(p + dy);
    let pz0 = curl_potential(p - dz);
    let pz1 = curl_potential(p + dz);

    let x = (py1.z - py0.z) - (pz1.y - pz0.y);
    let y = (pz1.x - pz0.x) - (px1.z - px0.z);
    let z = (px1.y - px0.y) - (py1.x - py0.x);
    return vec3<f32>(x, y, z) / (2.0 * CURL_EPSILON);
}
"#;

/// Hash, noise and curl combined, in dependency order.
pub fn all_utils_wgsl() -> String {
    format!(
        "// Shared utility functions\n{}\n{}\n{}\n",
        RANDOM_WGSL, NOISE_WGSL, CURL_WGSL
    )
}
