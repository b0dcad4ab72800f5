use pageconfig::MAX_GRID;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Floats per cell: x displacement, y displacement, and a copy of x.
pub const FIELD_CHANNELS: usize = 3;
/// Inclusive lower bound of generated displacement values.
pub const DISPLACEMENT_MIN: f32 = -125.0;
/// Exclusive upper bound of generated displacement values.
pub const DISPLACEMENT_MAX: f32 = 125.0;

/// Square grid of per-cell displacement values sampled by the shader.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementField {
    size: usize,
    data: Vec<f32>,
}

impl DisplacementField {
    /// Wraps raw cell data. Returns `None` unless `data` holds exactly
    /// `size * size` cells.
    pub fn from_raw(size: usize, data: Vec<f32>) -> Option<Self> {
        let expected = size
            .checked_mul(size)
            .and_then(|cells| cells.checked_mul(FIELD_CHANNELS))?;
        if size == 0 || data.len() != expected {
            return None;
        }
        Some(Self { size, data })
    }

    /// Side length of the grid.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell_count(&self) -> usize {
        self.size * self.size
    }

    pub fn cell(&self, index: usize) -> Option<[f32; FIELD_CHANNELS]> {
        let start = index.checked_mul(FIELD_CHANNELS)?;
        let cell = self.data.get(start..start + FIELD_CHANNELS)?;
        Some([cell[0], cell[1], cell[2]])
    }

    pub fn cells(&self) -> impl Iterator<Item = [f32; FIELD_CHANNELS]> + '_ {
        self.data
            .chunks_exact(FIELD_CHANNELS)
            .map(|cell| [cell[0], cell[1], cell[2]])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Multiplies the x and y channels of every cell by `factor`.
    ///
    /// Applied once per tick this is exponential decay: after `k` ticks a
    /// value equals `initial * factor^k`. There is no floor, so values only
    /// approach zero. The third channel keeps its generated value.
    pub fn decay(&mut self, factor: f32) {
        for cell in self.data.chunks_exact_mut(FIELD_CHANNELS) {
            cell[0] *= factor;
            cell[1] *= factor;
        }
    }

    /// Expands the cells to RGBA for upload, with alpha fixed at one.
    pub fn to_rgba(&self) -> Vec<f32> {
        let mut rgba = Vec::with_capacity(self.cell_count() * 4);
        for cell in self.data.chunks_exact(FIELD_CHANNELS) {
            rgba.extend_from_slice(&[cell[0], cell[1], cell[2], 1.0]);
        }
        rgba
    }
}

/// Produces fresh displacement fields from a seedable random source.
#[derive(Debug, Clone)]
pub struct FieldGenerator {
    rng: StdRng,
}

impl FieldGenerator {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map(Self::seeded).unwrap_or_else(Self::from_entropy)
    }

    /// Draws a `size` x `size` field. Each cell gets two independent values
    /// in `[DISPLACEMENT_MIN, DISPLACEMENT_MAX)`, stored as `(r, r', r)`.
    /// The size is clamped to `1..=MAX_GRID`.
    pub fn generate(&mut self, size: usize) -> DisplacementField {
        let size = size.clamp(1, MAX_GRID);
        let cells = size * size;
        let mut data = Vec::with_capacity(cells * FIELD_CHANNELS);
        for _ in 0..cells {
            let r = self.rng.gen_range(DISPLACEMENT_MIN..DISPLACEMENT_MAX);
            let r_prime = self.rng.gen_range(DISPLACEMENT_MIN..DISPLACEMENT_MAX);
            data.extend_from_slice(&[r, r_prime, r]);
        }
        DisplacementField { size, data }
    }
}
