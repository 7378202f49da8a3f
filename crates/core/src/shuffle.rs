use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Source of randomness for ordering a quiz.
///
/// `Random` draws from the thread RNG; `Seeded` produces the same permutation
/// for the same input every time, which keeps tests and replays deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Shuffler {
    #[default]
    Random,
    Seeded(u64),
}

impl Shuffler {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::Seeded(seed)
    }

    /// Returns a uniformly shuffled copy of `items` (Fisher-Yates).
    #[must_use]
    pub fn shuffle<T>(&self, mut items: Vec<T>) -> Vec<T> {
        match self {
            Self::Random => items.shuffle(&mut rand::rng()),
            Self::Seeded(seed) => items.shuffle(&mut StdRng::seed_from_u64(*seed)),
        }
        items
    }
}
