#![doc = include_str!("../README.md")]
#![deny(missing_debug_implementations, missing_docs)]
#![forbid(unsafe_code)]

// How the skip counts work.
//
// A Bernoulli trial with probability `P` fails with probability `1-P`. Because
// trials are independent, the chance that the next `n` trials all fail is
// `(1-P)^n`. So rather than rolling a die for every event, we roll once to
// decide how many of the upcoming events fail in a row (the "skip count"),
// count those down cheaply, accept the event after them, and roll again.
//
// Picture every possible future laid out on the unit interval, ordered so that
// futures with longer runs of failures sit further right:
//
// ```
// skip >= 0:  |=========================================== (1-P)^0 ==|
// skip >= 1:  |            =============================== (1-P)^1 ==|
// skip >= 2:  |                      ===================== (1-P)^2 ==|
// skip >= 3:  |                            x   =========== (1-P)^3 ==|
// ```
//
// Measured from the right-hand end, the band "skip count is at least `k`" has
// length `(1-P)^k`. A uniform point `x` drawn from `[0, 1)` therefore lands in
// the band for `k` exactly when `x < (1-P)^k`, and the skip count it selects is
// the largest such `k`:
//
//     k = floor(ln(x) / ln(1-P))
//
// which is the geometric distribution of failure runs. The point marked `x`
// above selects a skip count of 2.
//
// Two consequences fall out of independence. First, a batch of `n` trials only
// needs to know whether the run of failures ends inside the batch, which is a
// comparison against the skip count. Second, throwing the current skip count
// away and drawing a fresh one at any moment leaves the distribution of
// future outcomes unchanged, so `multi_trial` may re-derive as soon as the
// batch reaches an acceptance.
//
// Floating point: for `0 < P < 1`, `ln(1-P)` lies in `[-37, 0]`. It is `0.0`
// only when `1-P` rounds to exactly `1.0`, in which case the cached reciprocal
// is `-inf` and every draw maps to `+inf`, which clamps to the "never"
// sentinel. Below `2^-53` a probability cannot be told apart from zero in
// practice anyway. A draw of exactly `0.0` gives `ln(0) = -inf` and also clamps.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};

mod error;

pub use crate::error::{Error, Result};

/// Seed used for the default random source when the system clock reads
/// earlier than the UNIX epoch.
const FALLBACK_SEED: u64 = 0x5eed_b3a0_11c0_ffee;

/// Constant-time Bernoulli sampling: each event is sampled independently with
/// the same probability, but a random number is only drawn when an event is
/// accepted.
///
/// The sampler owns its random source `R`. To share one source among several
/// samplers, hand each of them a `&mut R`, which implements [`Rng`] as well.
///
/// A sampler is not synchronized. Give each thread its own instance, or wrap a
/// shared one in a `Mutex`.
///
/// # Example
///
/// ```
/// use fast_bernoulli_sampler::BernoulliSampler;
///
/// // Sample events with probability 1/20.
/// let mut sampler = BernoulliSampler::new(0.05)?;
///
/// let mut on_my_event = || {
///     if sampler.trial() {
///         // Record the sample...
///     }
/// };
/// on_my_event();
/// # Ok::<(), fast_bernoulli_sampler::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct BernoulliSampler<R = StdRng> {
    /// Likelihood that any single trial returns `true`, in `[0.0, 1.0]`.
    probability: f64,

    /// `1 / ln(1 - probability)`. Only read when `0 < probability < 1`, where
    /// it is negative (possibly `-inf`).
    inv_ln_not_probability: f64,

    rng: R,

    /// Number of upcoming trials that return `false` before the next `true`.
    skip_count: u32,
}

impl BernoulliSampler<StdRng> {
    /// Construct a sampler with its own random source, seeded from the
    /// current system time.
    ///
    /// Every call creates a fresh generator; no global generator is involved.
    /// To share a generator between samplers, use
    /// [`with_rng`][BernoulliSampler::with_rng].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProbability`] unless
    /// `0.0 <= probability <= 1.0`.
    ///
    /// # Example
    ///
    /// ```
    /// use fast_bernoulli_sampler::BernoulliSampler;
    ///
    /// let one_in_a_hundred = BernoulliSampler::new(0.01)?;
    /// assert_eq!(one_in_a_hundred.probability(), 0.01);
    ///
    /// assert!(BernoulliSampler::new(1.5).is_err());
    /// # Ok::<(), fast_bernoulli_sampler::Error>(())
    /// ```
    pub fn new(probability: f64) -> Result<Self> {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(FALLBACK_SEED);
        Self::with_seed(probability, seed)
    }

    /// Construct a sampler whose random source is seeded with `seed`, so the
    /// sequence of outcomes is reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use fast_bernoulli_sampler::BernoulliSampler;
    ///
    /// let a: Vec<bool> = BernoulliSampler::with_seed(0.3, 7)?.take(100).collect();
    /// let b: Vec<bool> = BernoulliSampler::with_seed(0.3, 7)?.take(100).collect();
    /// assert_eq!(a, b);
    /// # Ok::<(), fast_bernoulli_sampler::Error>(())
    /// ```
    pub fn with_seed(probability: f64, seed: u64) -> Result<Self> {
        Self::with_rng(probability, StdRng::seed_from_u64(seed))
    }
}

impl<R> BernoulliSampler<R>
where
    R: Rng,
{
    /// Construct a sampler drawing from the given random source.
    ///
    /// Unless `probability` is exactly `0.0` or `1.0`, this draws one value
    /// from `rng` to choose the initial skip count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProbability`] when `probability` is NaN or
    /// outside `0.0..=1.0`.
    ///
    /// # Example
    ///
    /// ```
    /// use fast_bernoulli_sampler::BernoulliSampler;
    ///
    /// // Two samplers sharing the thread-local generator.
    /// let mut rng = rand::thread_rng();
    /// let mut allocations = BernoulliSampler::with_rng(0.001, &mut rng)?;
    /// allocations.trial();
    /// drop(allocations);
    ///
    /// let mut calls = BernoulliSampler::with_rng(0.05, &mut rng)?;
    /// calls.trial();
    /// # Ok::<(), fast_bernoulli_sampler::Error>(())
    /// ```
    pub fn with_rng(probability: f64, rng: R) -> Result<Self> {
        // Written so that NaN fails the check.
        if !(0.0..=1.0).contains(&probability) {
            return Err(Error::InvalidProbability(probability));
        }

        let inv_ln_not_probability = if 0.0 < probability && probability < 1.0 {
            let ln_not_probability = (1.0 - probability).ln();
            if ln_not_probability == 0.0 {
                // `ln` returns `+0.0` here; its reciprocal must stay negative.
                f64::NEG_INFINITY
            } else {
                1.0 / ln_not_probability
            }
        } else {
            0.0
        };

        let mut sampler = BernoulliSampler {
            probability,
            inv_ln_not_probability,
            rng,
            skip_count: 0,
        };
        sampler.reset_skip_count();

        tracing::debug!(
            probability,
            skip_count = sampler.skip_count,
            "constructed bernoulli sampler"
        );
        Ok(sampler)
    }

    fn reset_skip_count(&mut self) {
        if self.probability == 0.0 {
            // Never sample.
            self.skip_count = u32::MAX;
        } else if self.probability == 1.0 {
            // Sample everything.
            self.skip_count = 0;
        } else {
            let x: f64 = self.rng.gen();
            let skip_count = (x.ln() * self.inv_ln_not_probability).floor();
            // Compare in `f64` before casting: `u32::MAX` is exactly
            // representable, and anything at or above it (including `+inf`)
            // becomes the sentinel.
            self.skip_count = if skip_count < u32::MAX as f64 {
                skip_count as u32
            } else {
                tracing::trace!(
                    probability = self.probability,
                    skip_count,
                    "clamping skip count to u32::MAX"
                );
                u32::MAX
            };
        }
    }

    /// Perform a Bernoulli trial: returns `true` with the configured
    /// probability.
    ///
    /// While the skip count is positive this only decrements it. A random
    /// number is drawn only when the trial accepts, so the lower the
    /// probability, the cheaper the average call.
    ///
    /// # Example
    ///
    /// ```
    /// use fast_bernoulli_sampler::BernoulliSampler;
    ///
    /// let mut sampler = BernoulliSampler::with_seed(0.1, 42)?;
    ///
    /// // `skip_count` events are rejected, then the next one is accepted.
    /// for _ in 0..sampler.skip_count() {
    ///     assert!(!sampler.trial());
    /// }
    /// assert!(sampler.trial());
    /// # Ok::<(), fast_bernoulli_sampler::Error>(())
    /// ```
    pub fn trial(&mut self) -> bool {
        if self.skip_count > 0 {
            self.skip_count -= 1;
            return false;
        }

        self.reset_skip_count();
        self.probability != 0.0
    }

    /// Perform `n` Bernoulli trials at once, returning whether any of them
    /// accepted. Runs in constant time.
    ///
    /// Use this when events carry a weight: to sample allocations as if every
    /// byte were trialed separately, call `multi_trial(size)` per allocation.
    /// The results then need to be reported together with `n`, since heavier
    /// events are proportionally more likely to be sampled.
    ///
    /// A batch no longer than the current skip count is rejected outright; a
    /// batch of exactly `skip_count()` events leaves the skip count at zero,
    /// so the event after it is accepted, just as with `trial`. A batch that
    /// reaches past the skip count accepts and starts a fresh skip count,
    /// which by independence does not bias later trials. `multi_trial(0)`
    /// never accepts and leaves the sampler untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use fast_bernoulli_sampler::BernoulliSampler;
    ///
    /// let mut bytes = BernoulliSampler::new(1.0 / 4096.0)?;
    ///
    /// for size in [16, 4096, 1 << 20] {
    ///     if bytes.multi_trial(size) {
    ///         record_allocation_sample(size);
    ///     }
    /// }
    /// # fn record_allocation_sample(_: u32) {}
    /// # Ok::<(), fast_bernoulli_sampler::Error>(())
    /// ```
    pub fn multi_trial(&mut self, n: u32) -> bool {
        if n <= self.skip_count {
            self.skip_count -= n;
            return false;
        }

        self.reset_skip_count();
        self.probability != 0.0
    }

    /// The probability with which events are sampled, exactly as passed at
    /// construction.
    #[inline]
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// How many upcoming events will be rejected before the next one is
    /// sampled.
    ///
    /// When `self.probability() == 0.0` this returns `u32::MAX`, which is
    /// inaccurate: logically the skip count is infinite.
    #[inline]
    pub fn skip_count(&self) -> u32 {
        self.skip_count
    }

    /// Mutable access to the underlying random source.
    ///
    /// Drawing from it does not disturb the current skip count.
    #[inline]
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Consume the sampler and return its random source.
    pub fn into_rng(self) -> R {
        self.rng
    }
}

/// An endless stream of trial outcomes; each `next` is one [`trial`].
///
/// [`trial`]: BernoulliSampler::trial
impl<R> Iterator for BernoulliSampler<R>
where
    R: Rng,
{
    type Item = bool;

    #[inline]
    fn next(&mut self) -> Option<bool> {
        Some(self.trial())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}
