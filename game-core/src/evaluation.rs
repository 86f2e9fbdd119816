use crate::EvaluationError;
use game_types::{Feedback, FeedbackCode};
use std::collections::HashMap;

pub struct GuessEvaluator;

impl GuessEvaluator {
    /// Compare `guess` against `secret`, one code per character position.
    ///
    /// Exact matches are locked in first and consume their letter from the
    /// secret's letter pool; only then are the remaining positions checked
    /// for presence. A letter is never credited more times than it occurs in
    /// the secret.
    pub fn evaluate(secret: &str, guess: &str) -> Result<Feedback, EvaluationError> {
        let secret_chars: Vec<char> = secret.chars().collect();
        let guess_chars: Vec<char> = guess.chars().collect();

        if secret_chars.len() != guess_chars.len() {
            return Err(EvaluationError::LengthMismatch {
                secret: secret_chars.len(),
                guess: guess_chars.len(),
            });
        }

        // Count frequency of each letter in the secret
        let mut remaining: HashMap<char, usize> = HashMap::new();
        for &ch in &secret_chars {
            *remaining.entry(ch).or_insert(0) += 1;
        }

        let mut codes = vec![FeedbackCode::Absent; guess_chars.len()];

        // First pass: correct positions
        for (i, (&g, &s)) in guess_chars.iter().zip(&secret_chars).enumerate() {
            if g == s {
                codes[i] = FeedbackCode::Correct;
                if let Some(count) = remaining.get_mut(&g) {
                    *count -= 1;
                }
            }
        }

        // Second pass: present elsewhere, limited by what is left in the pool
        for (i, &g) in guess_chars.iter().enumerate() {
            if codes[i] == FeedbackCode::Correct {
                continue;
            }
            if let Some(count) = remaining.get_mut(&g) {
                if *count > 0 {
                    codes[i] = FeedbackCode::Present;
                    *count -= 1;
                }
            }
        }

        Ok(codes)
    }

    pub fn is_solved(feedback: &[FeedbackCode]) -> bool {
        !feedback.is_empty() && feedback.iter().all(|code| *code == FeedbackCode::Correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FeedbackCode::{Absent as A, Correct as C, Present as P};

    fn eval(secret: &str, guess: &str) -> Feedback {
        GuessEvaluator::evaluate(secret, guess).unwrap()
    }

    #[test]
    fn test_exact_match_is_all_correct() {
        for word in ["apple", "hello", "crane", "geese"] {
            let feedback = eval(word, word);
            assert!(GuessEvaluator::is_solved(&feedback), "{word}");
        }
    }

    #[test]
    fn test_partial_match() {
        // secret: h e l l o
        // guess:  w o r l d
        assert_eq!(eval("hello", "world"), vec![A, P, A, C, A]);
    }

    #[test]
    fn test_repeated_guess_letter_limited_by_secret() {
        // Only one 'l' in "apple"; it is at position 3, so the one at
        // position 3 of the guess is correct and nothing else is credited.
        assert_eq!(eval("apple", "lllll"), vec![A, A, A, C, A]);

        // Two 'p's in "apple", both exact.
        assert_eq!(eval("apple", "ppppp"), vec![A, C, C, A, A]);
    }

    #[test]
    fn test_present_credited_once() {
        // One 'l' in "apple", guessed in the wrong spot first.
        assert_eq!(eval("apple", "lxxxx"), vec![P, A, A, A, A]);
        assert_eq!(eval("apple", "llxxx"), vec![P, A, A, A, A]);
    }

    #[test]
    fn test_exact_match_takes_priority_over_earlier_present() {
        // secret: a b b e y, guess: b b x x x
        // position 1 is exact, so the 'b' at position 0 may still use the
        // second 'b' of the secret.
        assert_eq!(eval("abbey", "bbxxx"), vec![P, C, A, A, A]);

        // secret: h e l l o, guess: l l a m a
        assert_eq!(eval("hello", "llama"), vec![P, P, A, A, A]);

        // secret has one 'e'; the exact 'e' must win over the earlier one
        assert_eq!(eval("crane", "eerie"), vec![A, A, P, A, C]);
    }

    #[test]
    fn test_credits_never_exceed_letter_count() {
        let secret = "geese";
        for guess in ["eeeee", "egggg", "sssse", "eesss"] {
            let feedback = eval(secret, guess);
            for letter in guess.chars() {
                let credited = guess
                    .chars()
                    .zip(&feedback)
                    .filter(|(ch, code)| *ch == letter && **code != FeedbackCode::Absent)
                    .count();
                let available = secret.chars().filter(|ch| *ch == letter).count();
                assert!(credited <= available, "{guess}: {letter}");
            }
        }
    }

    #[test]
    fn test_multibyte_letters() {
        assert_eq!(eval("füße", "füße"), vec![C, C, C, C]);
        assert_eq!(eval("épée", "ééxx"), vec![C, P, A, A]);
    }

    #[test]
    fn test_length_mismatch() {
        let result = GuessEvaluator::evaluate("hello", "hi");
        assert_eq!(
            result,
            Err(EvaluationError::LengthMismatch {
                secret: 5,
                guess: 2
            })
        );
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(eval("crane", "slate"), eval("crane", "slate"));
        assert_eq!(eval("crane", "slate"), vec![A, A, C, A, C]);
    }
}
