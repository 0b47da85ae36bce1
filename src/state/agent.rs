//! Scripted opponent used in agent games.

use rand::Rng;

use crate::state::{
    difficulty::Difficulty,
    digits::{self, DigitsError, MAX_DIGIT_COUNT, Score, generate_unique_digits},
    state_machine::{AGENT_ID, GameEvent, GuessRecord},
};

/// Longest secret for which the agent enumerates every consistent candidate.
pub const CANDIDATE_SEARCH_MAX_DIGITS: usize = 5;

/// Scripted guesser.
///
/// Without a difficulty every guess is a fresh random draw and prior feedback
/// is ignored. With one, the agent keeps only the candidates consistent with
/// the feedback to its own earlier guesses and picks one of them, except when
/// it blunders (see [`Difficulty::blunder_rate`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Agent {
    difficulty: Option<Difficulty>,
}

impl Agent {
    /// Agent playing at `difficulty`, or the plain random agent for `None`.
    pub fn new(difficulty: Option<Difficulty>) -> Self {
        Self { difficulty }
    }

    /// Produce a guess of `digit_count` unique digits given the game history so far.
    pub fn guess<R>(
        &self,
        digit_count: usize,
        history: &[GuessRecord],
        rng: &mut R,
    ) -> Result<Vec<u8>, DigitsError>
    where
        R: Rng + ?Sized,
    {
        let Some(difficulty) = self.difficulty else {
            return generate_unique_digits(digit_count, rng);
        };
        if digit_count > CANDIDATE_SEARCH_MAX_DIGITS || rng.random_bool(difficulty.blunder_rate()) {
            return generate_unique_digits(digit_count, rng);
        }

        let feedback: Vec<(&[u8], Score)> = history
            .iter()
            .filter(|record| record.player == AGENT_ID)
            .map(|record| (record.guess.as_slice(), record.score))
            .collect();
        let candidates = consistent_candidates(digit_count, &feedback);
        if candidates.is_empty() {
            return generate_unique_digits(digit_count, rng);
        }
        Ok(candidates[rng.random_range(0..candidates.len())].clone())
    }

    /// Build the guess event submitted on the agent's behalf.
    pub fn guess_event<R>(
        &self,
        digit_count: usize,
        history: &[GuessRecord],
        rng: &mut R,
    ) -> Result<GameEvent, DigitsError>
    where
        R: Rng + ?Sized,
    {
        Ok(GameEvent::Guess {
            player: AGENT_ID.to_string(),
            guess: self.guess(digit_count, history, rng)?,
        })
    }
}

/// Every sequence of `digit_count` unique digits that would have produced `feedback`.
pub fn consistent_candidates(digit_count: usize, feedback: &[(&[u8], Score)]) -> Vec<Vec<u8>> {
    let mut found = Vec::new();
    if digit_count == 0 || digit_count > MAX_DIGIT_COUNT {
        return found;
    }

    let mut prefix = Vec::with_capacity(digit_count);
    extend_candidates(digit_count, feedback, &mut prefix, &mut found);
    found
}

fn extend_candidates(
    digit_count: usize,
    feedback: &[(&[u8], Score)],
    prefix: &mut Vec<u8>,
    found: &mut Vec<Vec<u8>>,
) {
    if prefix.len() == digit_count {
        let consistent = feedback
            .iter()
            .all(|(guess, score)| digits::evaluate(prefix, guess) == *score);
        if consistent {
            found.push(prefix.clone());
        }
        return;
    }

    for digit in 0..MAX_DIGIT_COUNT as u8 {
        if prefix.contains(&digit) {
            continue;
        }
        prefix.push(digit);
        extend_candidates(digit_count, feedback, prefix, found);
        prefix.pop();
    }
}
