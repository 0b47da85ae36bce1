//! Secret generation and strike/ball scoring shared by games and the scripted agent.

use rand::Rng;
use thiserror::Error;

/// Largest secret that can be built from unique decimal digits.
pub const MAX_DIGIT_COUNT: usize = 10;

/// Errors raised when asking for an impossible digit sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DigitsError {
    /// Requested length is zero or exceeds the number of distinct digits.
    #[error("digit count must be between 1 and {MAX_DIGIT_COUNT} (got {0})")]
    CountOutOfRange(usize),
}

/// Strike/ball feedback for one guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    /// Digits present at the same position in the secret.
    pub strikes: usize,
    /// Digits present in the secret at another position.
    pub balls: usize,
}

/// Draw `count` pairwise-distinct digits in `0..=9`, in draw order.
///
/// Digits are sampled uniformly and redrawn when already taken, so every
/// ordering of every subset is equally likely.
pub fn generate_unique_digits<R>(count: usize, rng: &mut R) -> Result<Vec<u8>, DigitsError>
where
    R: Rng + ?Sized,
{
    if count == 0 || count > MAX_DIGIT_COUNT {
        return Err(DigitsError::CountOutOfRange(count));
    }

    let mut digits = Vec::with_capacity(count);
    while digits.len() < count {
        let digit = rng.random_range(0..10u8);
        if !digits.contains(&digit) {
            digits.push(digit);
        }
    }
    Ok(digits)
}

/// Score `guess` against `secret`. Both slices must have the same length.
pub fn evaluate(secret: &[u8], guess: &[u8]) -> Score {
    debug_assert_eq!(secret.len(), guess.len());

    guess
        .iter()
        .zip(secret)
        .fold(Score::default(), |mut score, (digit, expected)| {
            if digit == expected {
                score.strikes += 1;
            } else if secret.contains(digit) {
                score.balls += 1;
            }
            score
        })
}

/// True when at least one digit appears twice.
pub fn has_duplicates(digits: &[u8]) -> bool {
    digits
        .iter()
        .enumerate()
        .any(|(idx, digit)| digits[idx + 1..].contains(digit))
}

/// First value outside `0..=9`, if any.
pub fn first_invalid_digit(digits: &[u8]) -> Option<u8> {
    digits.iter().copied().find(|digit| *digit > 9)
}
