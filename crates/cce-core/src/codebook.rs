//! Hyperdimensional codebook and bipolar vector algebra.
//!
//! Every concept is a bipolar vector in {-1, +1}^D. With D in the thousands,
//! independently generated vectors are nearly orthogonal, which gives:
//!
//! - **bind** (element-wise product): a vector orthogonal to both inputs,
//!   self-inverse, used for role/filler pairs
//! - **bundle** (element-wise majority): a superposition similar to every input
//! - **permute** (cyclic rotation): position encoding for sequences
//!
//! Vectors are derived from a SHA-256 hash of the normalized symbol XORed with
//! the base seed, so the same symbol yields the same vector across runs.
//! Every source of randomness in this crate is a seeded [`ChaCha8Rng`]
//! obtained from [`Codebook::scoped_rng`] or from explicit configuration.
//!
//! # Example
//!
//! ```
//! use cce_core::codebook::Codebook;
//!
//! let codebook = Codebook::new(10_000, 42).unwrap();
//! let a = codebook.encode("Mut");
//! let b = codebook.encode("Kraft");
//!
//! let bound = Codebook::bind(&a, &b);
//! let recovered = Codebook::bind(&bound, &b);
//! assert!(Codebook::similarity(&recovered, &a) > 0.99);
//! ```

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

use crate::config::CodebookConfig;
use crate::error::{CceError, CceResult};

/// A hyperdimensional vector.
///
/// Vectors handed out by the codebook are bipolar. Nucleus centers reuse the
/// same representation but hold running means, so they are real-valued.
pub type Hypervector = Vec<f32>;

/// Salt mixed into scoped generator seeds so a scope name never reproduces
/// the stream of an identically spelled symbol.
const SCOPE_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Signal share of a decomposed particle.
const DECOMPOSE_SIGNAL: f32 = 0.7;
/// Noise share of a decomposed particle.
const DECOMPOSE_NOISE: f32 = 0.3;

/// Symbol cache preserving insertion order for deterministic scans.
#[derive(Default)]
struct SymbolCache {
    order: Vec<String>,
    vectors: HashMap<String, Hypervector>,
}

/// Deterministic symbol-to-vector mapping plus the vector algebra.
///
/// The cache sits behind a lock so encoding works through `&self`, which lets
/// the plasma builder and the knowledge graph share one codebook.
pub struct Codebook {
    dim: usize,
    seed: u64,
    cache: RwLock<SymbolCache>,
}

impl Codebook {
    /// Create a codebook.
    ///
    /// # Errors
    ///
    /// Returns `CceError::ValidationError` if `dim == 0`.
    pub fn new(dim: usize, seed: u64) -> CceResult<Self> {
        if dim == 0 {
            return Err(CceError::validation(
                "codebook.dimension",
                "must be greater than 0",
            ));
        }
        Ok(Self {
            dim,
            seed,
            cache: RwLock::new(SymbolCache::default()),
        })
    }

    /// Create a codebook from its config section.
    pub fn from_config(config: &CodebookConfig) -> CceResult<Self> {
        config.validate()?;
        Self::new(config.dimension, config.seed)
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Check that `v` has this codebook's dimension.
    pub fn check_dim(&self, v: &[f32]) -> CceResult<()> {
        if v.len() != self.dim {
            return Err(CceError::DimensionMismatch {
                expected: self.dim,
                actual: v.len(),
            });
        }
        Ok(())
    }

    /// Normalize a symbol into its cache key (trimmed, lowercase).
    pub fn normalize(symbol: &str) -> String {
        symbol.trim().to_lowercase()
    }

    /// 64-bit seed: first 8 bytes of SHA-256(text), little endian, XOR base seed.
    fn symbol_seed(&self, text: &str) -> u64 {
        let digest = Sha256::digest(text.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(head) ^ self.seed
    }

    /// A generator scoped to one named operation.
    ///
    /// Two calls with the same scope return generators producing the same
    /// stream, which keeps every caller reproducible without global state.
    pub fn scoped_rng(&self, scope: &str) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.symbol_seed(scope) ^ SCOPE_SALT)
    }

    /// Draw a uniform bipolar vector of length `dim`.
    pub fn random_bipolar<R: Rng>(dim: usize, rng: &mut R) -> Hypervector {
        (0..dim)
            .map(|_| if rng.gen::<bool>() { 1.0 } else { -1.0 })
            .collect()
    }

    /// Replace every entry by its sign; exact zeros draw a uniform ±1 from `rng`.
    pub fn binarize<R: Rng>(v: &mut [f32], rng: &mut R) {
        for x in v.iter_mut() {
            *x = if *x > 0.0 {
                1.0
            } else if *x < 0.0 {
                -1.0
            } else if rng.gen::<bool>() {
                1.0
            } else {
                -1.0
            };
        }
    }

    /// Weighted blend of signal vectors plus bipolar noise, re-binarized.
    ///
    /// Computes `sign(Σ wᵢ·vᵢ + noise_weight·n)` where `n` is a fresh uniform
    /// bipolar vector drawn from `rng`.
    pub fn blend_with_noise<R: Rng>(
        &self,
        components: &[(f32, &[f32])],
        noise_weight: f32,
        rng: &mut R,
    ) -> Hypervector {
        let mut mixed = vec![0.0f32; self.dim];
        for (weight, vector) in components {
            for (acc, x) in mixed.iter_mut().zip(vector.iter()) {
                *acc += weight * x;
            }
        }
        let noise = Self::random_bipolar(self.dim, rng);
        for (acc, n) in mixed.iter_mut().zip(noise.iter()) {
            *acc += noise_weight * n;
        }
        Self::binarize(&mut mixed, rng);
        mixed
    }

    /// Encode a symbol as a bipolar vector.
    ///
    /// The first call generates and caches the vector; later calls return a
    /// copy of the cached one. Callers may mutate the copy freely.
    pub fn encode(&self, symbol: &str) -> Hypervector {
        let key = Self::normalize(symbol);
        if let Some(v) = self.cache.read().vectors.get(&key) {
            return v.clone();
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.symbol_seed(&key));
        let vector = Self::random_bipolar(self.dim, &mut rng);

        let mut cache = self.cache.write();
        if !cache.vectors.contains_key(&key) {
            cache.order.push(key.clone());
            cache.vectors.insert(key, vector.clone());
        }
        vector
    }

    /// Role-filler binding via element-wise multiplication.
    pub fn bind(a: &[f32], b: &[f32]) -> Hypervector {
        debug_assert_eq!(a.len(), b.len());
        a.iter().zip(b.iter()).map(|(x, y)| x * y).collect()
    }

    /// Superposition via element-wise sum and sign.
    ///
    /// Dimensions whose sum is exactly zero are resolved by a generator scoped
    /// to bundling, so the same inputs always bundle to the same vector.
    pub fn bundle<V: AsRef<[f32]>>(&self, vectors: &[V]) -> Hypervector {
        let mut sum = vec![0.0f32; self.dim];
        for v in vectors {
            for (acc, x) in sum.iter_mut().zip(v.as_ref().iter()) {
                *acc += x;
            }
        }
        let mut ties = self.scoped_rng("bundle");
        Self::binarize(&mut sum, &mut ties);
        sum
    }

    /// Cosine similarity. Zero-norm inputs score 0.0.
    pub fn similarity(a: &[f32], b: &[f32]) -> f32 {
        let mut dot = 0.0f64;
        let mut na = 0.0f64;
        let mut nb = 0.0f64;
        for (x, y) in a.iter().zip(b.iter()) {
            let (x, y) = (*x as f64, *y as f64);
            dot += x * y;
            na += x * x;
            nb += y * y;
        }
        if na == 0.0 || nb == 0.0 {
            return 0.0;
        }
        (dot / (na.sqrt() * nb.sqrt())) as f32
    }

    /// Cyclic rotation by `shift` positions (positive shifts move right).
    pub fn permute(v: &[f32], shift: isize) -> Hypervector {
        let mut out = v.to_vec();
        if out.is_empty() {
            return out;
        }
        let k = shift.rem_euclid(out.len() as isize) as usize;
        out.rotate_right(k);
        out
    }

    /// Break a symbol into `n` sub-particles.
    ///
    /// Each particle is `sign(0.7·base + 0.3·noise)`. The noise stream is
    /// seeded from the symbol, so decomposition is reproducible per symbol.
    pub fn decompose(&self, symbol: &str, n: usize) -> Vec<Hypervector> {
        let key = Self::normalize(symbol);
        let base = self.encode(&key);
        let mut rng = self.scoped_rng(&format!("decompose/{}", key));
        (0..n)
            .map(|_| self.blend_with_noise(&[(DECOMPOSE_SIGNAL, base.as_slice())], DECOMPOSE_NOISE, &mut rng))
            .collect()
    }

    /// Encode a phrase with each word permuted by its position, then bundled.
    ///
    /// Returns `None` for a phrase without words.
    pub fn encode_phrase(&self, phrase: &str) -> Option<Hypervector> {
        let positioned: Vec<Hypervector> = phrase
            .split_whitespace()
            .enumerate()
            .map(|(i, word)| Self::permute(&self.encode(word), i as isize))
            .collect();
        if positioned.is_empty() {
            return None;
        }
        Some(self.bundle(&positioned))
    }

    /// Nearest known symbol to `v`. `None` when nothing has been encoded.
    pub fn cleanup(&self, v: &[f32]) -> Option<(String, f32)> {
        let cache = self.cache.read();
        let mut best: Option<(&String, f32)> = None;
        for symbol in &cache.order {
            let sim = Self::similarity(v, &cache.vectors[symbol]);
            if best.map_or(true, |(_, s)| sim > s) {
                best = Some((symbol, sim));
            }
        }
        best.map(|(s, sim)| (s.clone(), sim))
    }

    /// The `k` nearest known symbols, most similar first.
    pub fn cleanup_top_k(&self, v: &[f32], k: usize) -> Vec<(String, f32)> {
        let cache = self.cache.read();
        let mut scored: Vec<(String, f32)> = cache
            .order
            .iter()
            .map(|symbol| (symbol.clone(), Self::similarity(v, &cache.vectors[symbol])))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        scored
    }

    /// Known symbols in first-encoded order.
    pub fn known_symbols(&self) -> Vec<String> {
        self.cache.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.cache.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Codebook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codebook")
            .field("dim", &self.dim)
            .field("seed", &self.seed)
            .field("symbols", &self.len())
            .finish()
    }
}
