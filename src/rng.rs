//! ==============================================================================================
//! ====================================== RNG Service ============================================
//! ==============================================================================================
//!
//! A master generator is seeded once from the caller-supplied seed (or from
//! OS entropy when absent) and used exactly once to derive `Nthread`
//! independent child seeds. Each worker then owns a private Mersenne-Twister
//! stream for the rest of the run. This pins results to `(seed, Nthread)`,
//! never to thread scheduling.

use rand::{Rng, RngCore, SeedableRng};

const NN: usize = 312;
const MM: usize = 156;
const MATRIX_A: u64 = 0xB502_6F5A_A966_19E9;
const UM: u64 = 0xFFFF_FFFF_8000_0000; // upper 33 bits
const LM: u64 = 0x7FFF_FFFF; // lower 31 bits

/// MT19937-64, the 64-bit Mersenne Twister variant, implemented directly
/// rather than pulled in from a third-party crate: the generator is a small,
/// fully-specified algorithm (Matsumoto & Nishimura), and pinning our own
/// implementation avoids coupling this crate's `RngCore`/`RngCore` trait
/// generation to whichever `rand_core` major version an external MT crate
/// happens to track.
#[derive(Clone)]
struct Mt19937Core {
    mt: [u64; NN],
    mti: usize,
}

impl Mt19937Core {
    fn new(seed: u64) -> Self {
        let mut mt = [0u64; NN];
        mt[0] = seed;
        for i in 1..NN {
            mt[i] = 6_364_136_223_846_793_005u64
                .wrapping_mul(mt[i - 1] ^ (mt[i - 1] >> 62))
                .wrapping_add(i as u64);
        }
        Self { mt, mti: NN }
    }

    fn next_u64(&mut self) -> u64 {
        if self.mti >= NN {
            self.twist();
        }
        let mut x = self.mt[self.mti];
        self.mti += 1;

        x ^= (x >> 29) & 0x5555_5555_5555_5555;
        x ^= (x << 17) & 0x71D6_7FFF_EDA6_0000;
        x ^= (x << 37) & 0xFFF7_EEE0_0000_0000;
        x ^= x >> 43;
        x
    }

    fn twist(&mut self) {
        const MAG01: [u64; 2] = [0, MATRIX_A];
        for i in 0..NN - MM {
            let x = (self.mt[i] & UM) | (self.mt[i + 1] & LM);
            self.mt[i] = self.mt[i + MM] ^ (x >> 1) ^ MAG01[(x & 1) as usize];
        }
        for i in NN - MM..NN - 1 {
            let x = (self.mt[i] & UM) | (self.mt[i + 1] & LM);
            self.mt[i] = self.mt[i + MM - NN] ^ (x >> 1) ^ MAG01[(x & 1) as usize];
        }
        let x = (self.mt[NN - 1] & UM) | (self.mt[0] & LM);
        self.mt[NN - 1] = self.mt[MM - 1] ^ (x >> 1) ^ MAG01[(x & 1) as usize];
        self.mti = 0;
    }
}

/// Per-worker Mersenne-Twister stream. Never shared across threads.
pub struct WorkerRng(Mt19937Core);

impl WorkerRng {
    #[inline]
    fn from_seed(seed: u64) -> Self {
        Self(Mt19937Core::new(seed))
    }

    /// Open-interval `(0, 1]` draw for the SSA waiting-time sample (open at
    /// zero so `-ln(U1)` is finite).
    #[inline]
    pub fn open01(&mut self) -> f64 {
        loop {
            let u = self.0.next_u64();
            // 53 significant bits, then flip to land in (0, 1] instead of [0, 1).
            let v = (u >> 11) as f64 * (1.0 / (1u64 << 53) as f64);
            let v = 1.0 - v;
            if v > 0.0 {
                return v;
            }
        }
    }

    /// Half-open `[0, 1)` draw, used for the categorical transition draw.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        let u = self.0.next_u64();
        (u >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    #[inline]
    pub fn gen_range_u64(&mut self, hi: u64) -> u64 {
        self.random_range(0..hi)
    }
}

impl RngCore for WorkerRng {
    fn next_u32(&mut self) -> u32 {
        (self.0.next_u64() >> 32) as u32
    }
    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }
    fn fill_bytes(&mut self, dst: &mut [u8]) {
        let mut chunks = dst.chunks_exact_mut(8);
        for chunk in &mut chunks {
            chunk.copy_from_slice(&self.0.next_u64().to_le_bytes());
        }
        let rem = chunks.into_remainder();
        if !rem.is_empty() {
            let bytes = self.0.next_u64().to_le_bytes();
            rem.copy_from_slice(&bytes[..rem.len()]);
        }
    }
}

/// Derives one independent [`WorkerRng`] per worker from a single master seed.
pub struct RngService {
    workers: Vec<WorkerRng>,
}

impl RngService {
    /// `seed`: caller-supplied master seed, or `None` to seed from OS entropy.
    pub fn new(seed: Option<u64>, nthread: usize) -> Self {
        let mut master = match seed {
            Some(s) => rand::rngs::SmallRng::seed_from_u64(s),
            None => rand::rngs::SmallRng::from_os_rng(),
        };
        let workers = (0..nthread)
            .map(|_| WorkerRng::from_seed(master.next_u64()))
            .collect();
        Self { workers }
    }

    #[inline]
    pub fn worker_mut(&mut self, i: usize) -> &mut WorkerRng {
        &mut self.workers[i]
    }

    /// All worker streams, for splitting one-per-task across a `rayon::scope`.
    #[inline]
    pub fn workers_mut(&mut self) -> &mut [WorkerRng] {
        &mut self.workers
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_thread_count_is_deterministic() {
        let mut a = RngService::new(Some(42), 4);
        let mut b = RngService::new(Some(42), 4);
        for i in 0..4 {
            let av: Vec<f64> = (0..5).map(|_| a.worker_mut(i).unit()).collect();
            let bv: Vec<f64> = (0..5).map(|_| b.worker_mut(i).unit()).collect();
            assert_eq!(av, bv);
        }
    }

    #[test]
    fn worker_index_not_thread_count_determines_its_stream() {
        // RngService draws one child seed per worker, in order, from the
        // master stream. Worker 0's seed is therefore the master's first
        // draw regardless of Nthread, so its output sequence is identical
        // whether the service has 1 worker or 4.
        let mut one = RngService::new(Some(42), 1);
        let mut four = RngService::new(Some(42), 4);
        let seq_one: Vec<f64> = (0..10).map(|_| one.worker_mut(0).unit()).collect();
        let seq_four: Vec<f64> = (0..10).map(|_| four.worker_mut(0).unit()).collect();
        assert_eq!(
            seq_one, seq_four,
            "worker 0's stream must not depend on Nthread"
        );

        // Within the same service, distinct workers get distinct child
        // seeds, so their streams diverge.
        let seq_four_worker1: Vec<f64> = (0..10).map(|_| four.worker_mut(1).unit()).collect();
        assert_ne!(
            seq_four_worker1, seq_four,
            "distinct workers must get independent streams"
        );
    }

    #[test]
    fn open01_never_returns_zero() {
        let mut svc = RngService::new(Some(7), 1);
        for _ in 0..10_000 {
            let v = svc.worker_mut(0).open01();
            assert!(v > 0.0 && v <= 1.0);
        }
    }

    #[test]
    fn mt19937_64_same_seed_reproduces_full_period_output() {
        let mut a = Mt19937Core::new(5489);
        let mut b = Mt19937Core::new(5489);
        let seq_a: Vec<u64> = (0..1000).map(|_| a.next_u64()).collect();
        let seq_b: Vec<u64> = (0..1000).map(|_| b.next_u64()).collect();
        assert_eq!(seq_a, seq_b);
        // outputs should not be trivially constant or obviously degenerate
        assert!(seq_a.iter().collect::<std::collections::HashSet<_>>().len() > 900);
    }

    #[test]
    fn mt19937_64_twist_boundary_is_consistent_across_seeds() {
        // Draw past the first NN=312 outputs (forcing at least one twist)
        // for two different seeds; the streams must differ throughout.
        let mut a = Mt19937Core::new(1);
        let mut b = Mt19937Core::new(2);
        let mut any_diff = false;
        for _ in 0..(NN + 10) {
            if a.next_u64() != b.next_u64() {
                any_diff = true;
            }
        }
        assert!(any_diff);
    }
}
