use crate::rng::Lcg;

#[inline]
fn smootherstep(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Gradient from the low 4 bits of `hash`: the 12 cube-edge directions, with
/// four of them repeated to fill 16 slots.
#[inline]
fn grad(hash: u8, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

/// Seeded gradient noise field (Perlin-style). Owns its permutation table, so
/// independent fields can coexist and each is built once per seed.
#[derive(Clone)]
pub struct NoiseField {
    perm: [u8; 512],
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        let mut rng = Lcg::new(seed);
        let mut base = [0u8; 256];
        for (i, v) in base.iter_mut().enumerate() {
            *v = i as u8;
        }
        for i in (1..256).rev() {
            let j = rng.index_inclusive(i);
            base.swap(i, j);
        }

        // Doubled so corner lookups never wrap.
        let mut perm = [0u8; 512];
        for (i, v) in perm.iter_mut().enumerate() {
            *v = base[i & 255];
        }
        Self { perm }
    }

    #[inline]
    fn p(&self, i: usize) -> usize {
        self.perm[i] as usize
    }

    /// 2D noise on the z = 0 plane.
    #[inline]
    pub fn noise(&self, x: f64, y: f64) -> f64 {
        self.noise3(x, y, 0.0)
    }

    /// Classic gradient noise with trilinear blending of the eight cell corners.
    pub fn noise3(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xf, yf, zf) = (x.floor(), y.floor(), z.floor());
        let xi = (xf as i64 & 255) as usize;
        let yi = (yf as i64 & 255) as usize;
        let zi = (zf as i64 & 255) as usize;
        let (x, y, z) = (x - xf, y - yf, z - zf);
        let (u, v, w) = (smootherstep(x), smootherstep(y), smootherstep(z));

        let a = self.p(xi) + yi;
        let aa = self.p(a) + zi;
        let ab = self.p(a + 1) + zi;
        let b = self.p(xi + 1) + yi;
        let ba = self.p(b) + zi;
        let bb = self.p(b + 1) + zi;

        let near = lerp(
            lerp(
                grad(self.perm[aa], x, y, z),
                grad(self.perm[ba], x - 1.0, y, z),
                u,
            ),
            lerp(
                grad(self.perm[ab], x, y - 1.0, z),
                grad(self.perm[bb], x - 1.0, y - 1.0, z),
                u,
            ),
            v,
        );
        let far = lerp(
            lerp(
                grad(self.perm[aa + 1], x, y, z - 1.0),
                grad(self.perm[ba + 1], x - 1.0, y, z - 1.0),
                u,
            ),
            lerp(
                grad(self.perm[ab + 1], x, y - 1.0, z - 1.0),
                grad(self.perm[bb + 1], x - 1.0, y - 1.0, z - 1.0),
                u,
            ),
            v,
        );
        lerp(near, far, w)
    }

    /// Multi-octave noise. Frequency doubles and amplitude is multiplied by
    /// `persistence` each octave; the sum is divided by the total amplitude.
    pub fn fractal_noise(&self, x: f64, y: f64, octaves: u32, persistence: f64, scale: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = scale;
        let mut amplitude = 1.0;
        let mut max_value = 0.0;
        for _ in 0..octaves {
            total += self.noise(x * frequency, y * frequency) * amplitude;
            max_value += amplitude;
            amplitude *= persistence;
            frequency *= 2.0;
        }
        if max_value > 0.0 { total / max_value } else { 0.0 }
    }
}
