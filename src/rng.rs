use rand::{Rng, SeedableRng};

/// Derive an independent stream seed for a worker from a base seed.
/// SplitMix64-style mixing so adjacent worker indices land far apart.
#[inline]
pub fn worker_seed(base_seed: u64, worker_index: u64) -> u64 {
    let mut z = base_seed ^ worker_index.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Fresh base seed from the platform entropy source.
pub fn entropy_seed() -> u64 {
    rand::thread_rng().gen::<u64>()
}

/// Seedable generator used throughout the engine.
pub type EngineRng = rand::rngs::SmallRng;

pub fn engine_rng(seed: u64) -> EngineRng {
    EngineRng::seed_from_u64(seed)
}
