//! Optional difficulty levels: they shape the agent's secret and how well it guesses.

use std::{fmt, str::FromStr};

use rand::Rng;
use thiserror::Error;

use crate::state::digits::{DigitsError, MAX_DIGIT_COUNT, generate_unique_digits};

/// Difficulty an agent game is played at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    /// Easy secrets (a run of consecutive digits) and a careless agent.
    Easy,
    /// Uniform secrets and an agent that rarely slips.
    Normal,
    /// Secrets leaning on odd digits.
    Hard,
    /// Secrets leaning on primes and an agent that never slips.
    Expert,
}

/// Raised when parsing an unknown difficulty name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty `{0}` (expected easy, normal, hard or expert)")]
pub struct UnknownDifficulty(pub String);

const PRIMES: [u8; 4] = [2, 3, 5, 7];

impl Difficulty {
    /// Every level, easiest first.
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }

    /// Probability that the agent throws away its knowledge and guesses at random.
    pub fn blunder_rate(self) -> f64 {
        match self {
            Difficulty::Easy => 0.3,
            Difficulty::Normal => 0.1,
            Difficulty::Hard => 0.05,
            Difficulty::Expert => 0.0,
        }
    }

    /// Draw a secret of `count` unique digits shaped by the level.
    pub fn secret<R>(self, count: usize, rng: &mut R) -> Result<Vec<u8>, DigitsError>
    where
        R: Rng + ?Sized,
    {
        if count == 0 || count > MAX_DIGIT_COUNT {
            return Err(DigitsError::CountOutOfRange(count));
        }

        let digits = match self {
            Difficulty::Easy => {
                let start = rng.random_range(0..=(MAX_DIGIT_COUNT - count)) as u8;
                (start..start + count as u8).collect()
            }
            Difficulty::Normal => generate_unique_digits(count, rng)?,
            Difficulty::Hard => leaning_draw(count, rng, |d| d % 2 == 1, 0.6),
            Difficulty::Expert => leaning_draw(count, rng, |d| PRIMES.contains(&d), 0.7),
        };
        Ok(digits)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownDifficulty(value.to_string()))
    }
}

/// Draw unique digits favouring those matching `favoured` with probability `odds`.
///
/// The leading digit of a hard secret is always odd. The leading digit of an
/// expert secret is never prime, so the favoured digits fill the tail.
fn leaning_draw<R, F>(count: usize, rng: &mut R, favoured: F, odds: f64) -> Vec<u8>
where
    R: Rng + ?Sized,
    F: Fn(u8) -> bool,
{
    let mut pool: Vec<u8> = (0..MAX_DIGIT_COUNT as u8).collect();
    let mut digits = Vec::with_capacity(count);

    let lead_is_favoured = favoured(1);
    digits.push(take_from(&mut pool, rng, |d| favoured(d) == lead_is_favoured, 1.0));
    while digits.len() < count {
        digits.push(take_from(&mut pool, rng, &favoured, odds));
    }
    digits
}

/// Remove and return a digit from `pool`, picking from the favoured part with
/// probability `odds` and from the rest otherwise. An empty side defers to the other.
fn take_from<R, F>(pool: &mut Vec<u8>, rng: &mut R, favoured: F, odds: f64) -> u8
where
    R: Rng + ?Sized,
    F: Fn(u8) -> bool,
{
    let (preferred, others): (Vec<usize>, Vec<usize>) =
        (0..pool.len()).partition(|&idx| favoured(pool[idx]));
    let side = match (preferred.is_empty(), others.is_empty()) {
        (false, true) => &preferred,
        (true, false) => &others,
        _ if rng.random_bool(odds) => &preferred,
        _ => &others,
    };
    let idx = side[rng.random_range(0..side.len())];
    pool.swap_remove(idx)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::state::digits::has_duplicates;

    #[test]
    fn names_round_trip_case_insensitively() {
        for level in Difficulty::ALL {
            assert_eq!(level.as_str().parse::<Difficulty>(), Ok(level));
        }
        assert_eq!("HARD".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("nightmare".parse::<Difficulty>().is_err());
    }

    #[test]
    fn blunder_rate_drops_with_difficulty() {
        let rates: Vec<f64> = Difficulty::ALL.iter().map(|d| d.blunder_rate()).collect();
        assert!(rates.windows(2).all(|pair| pair[0] > pair[1]));
        assert_eq!(Difficulty::Expert.blunder_rate(), 0.0);
    }

    #[test]
    fn every_level_draws_unique_digits_of_any_length() {
        let mut rng = StdRng::seed_from_u64(21);
        for level in Difficulty::ALL {
            for count in 1..=MAX_DIGIT_COUNT {
                let secret = level.secret(count, &mut rng).unwrap();
                assert_eq!(secret.len(), count, "{level} with {count} digits");
                assert!(!has_duplicates(&secret), "{level} drew {secret:?}");
                assert!(secret.iter().all(|d| *d <= 9));
            }
        }
    }

    #[test]
    fn easy_secrets_are_consecutive_runs() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let secret = Difficulty::Easy.secret(4, &mut rng).unwrap();
            assert!(secret.windows(2).all(|pair| pair[1] == pair[0] + 1), "{secret:?}");
        }
    }

    #[test]
    fn hard_secrets_lead_with_an_odd_digit() {
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..50 {
            let secret = Difficulty::Hard.secret(3, &mut rng).unwrap();
            assert_eq!(secret[0] % 2, 1, "{secret:?}");
        }
    }

    #[test]
    fn expert_secrets_lead_with_a_non_prime() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..50 {
            let secret = Difficulty::Expert.secret(3, &mut rng).unwrap();
            assert!(!PRIMES.contains(&secret[0]), "{secret:?}");
        }
    }

    #[test]
    fn impossible_lengths_are_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            Difficulty::Hard.secret(0, &mut rng),
            Err(DigitsError::CountOutOfRange(0))
        );
        assert_eq!(
            Difficulty::Easy.secret(11, &mut rng),
            Err(DigitsError::CountOutOfRange(11))
        );
    }
}
