use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded RNG derived from an action's identity.
///
/// Nothing about the generator is stored in `GameState`: every draw is
/// recomputed from `(match_id, turn_number, action_id, stream)`, so replaying
/// the action log reproduces every shuffle and flip.
#[derive(Debug, Clone)]
pub struct MatchRng {
    rng: ChaCha8Rng,
}

impl MatchRng {
    pub fn for_action(match_id: &str, turn_number: u32, action_id: &str, stream: u32) -> Self {
        MatchRng {
            rng: ChaCha8Rng::seed_from_u64(action_seed(match_id, turn_number, action_id, stream)),
        }
    }

    /// Flip a coin. Returns true for heads, false for tails.
    pub fn coin_flip(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        // Fisher-Yates shuffle
        let len = slice.len();
        for i in (1..len).rev() {
            let j = self.rng.gen_range(0..=i);
            slice.swap(i, j);
        }
    }
}

/// Flip `index` of the sequence identified by an action.
pub fn flip_coin(match_id: &str, turn_number: u32, action_id: &str, index: u32) -> bool {
    MatchRng::for_action(match_id, turn_number, action_id, index).coin_flip()
}

/// FNV-1a over the seed components, with separators so that
/// ("ab", "c") and ("a", "bc") differ.
fn action_seed(match_id: &str, turn_number: u32, action_id: &str, stream: u32) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    let mut feed = |bytes: &[u8]| {
        for &b in bytes {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(PRIME);
        }
        hash ^= 0xff;
        hash = hash.wrapping_mul(PRIME);
    };
    feed(match_id.as_bytes());
    feed(&turn_number.to_le_bytes());
    feed(action_id.as_bytes());
    feed(&stream.to_le_bytes());
    hash
}
