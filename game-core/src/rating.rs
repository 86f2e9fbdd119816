use crate::RatingConfig;

pub struct RatingEngine;

impl RatingEngine {
    /// Probability of beating the fixed base rating.
    pub fn expected_score(current_rating: i32, config: &RatingConfig) -> f64 {
        let exponent = f64::from(config.base_rating - current_rating) / 400.0;
        1.0 / (1.0 + 10f64.powf(exponent))
    }

    /// Elo update against the base rating, with a flat bonus for wins.
    /// Ratings never drop below zero.
    pub fn update_rating(current_rating: i32, won: bool, config: &RatingConfig) -> i32 {
        let expected = Self::expected_score(current_rating, config);
        let (actual, k) = if won {
            (1.0, config.k_win)
        } else {
            (0.0, config.k_loss)
        };

        let mut rating = (f64::from(current_rating) + k * (actual - expected)).round() as i32;
        if won {
            rating += config.win_bonus;
        }
        rating.max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RatingConfig {
        RatingConfig {
            base_rating: 1200,
            k_win: 20.0,
            k_loss: 20.0,
            win_bonus: 5,
        }
    }

    #[test]
    fn test_win_at_base_rating() {
        // expected 0.5, delta 10, bonus 5
        assert_eq!(RatingEngine::update_rating(1200, true, &config()), 1215);
    }

    #[test]
    fn test_loss_at_base_rating() {
        assert_eq!(RatingEngine::update_rating(1200, false, &config()), 1190);
    }

    #[test]
    fn test_expected_score_symmetry() {
        let config = config();
        let above = RatingEngine::expected_score(1600, &config);
        let below = RatingEngine::expected_score(800, &config);
        assert!((above - 10.0 / 11.0).abs() < 1e-9);
        assert!((above + below - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_asymmetric_k_factors() {
        let config = RatingConfig {
            base_rating: 1000,
            k_win: 10.0,
            k_loss: 40.0,
            win_bonus: 0,
        };
        assert_eq!(RatingEngine::update_rating(1000, true, &config), 1005);
        assert_eq!(RatingEngine::update_rating(1000, false, &config), 980);
    }

    #[test]
    fn test_strong_player_gains_little() {
        let config = config();
        let gained = RatingEngine::update_rating(2000, true, &config) - 2000;
        let lost = 2000 - RatingEngine::update_rating(2000, false, &config);
        assert!(gained < 10);
        assert!(lost > 15);
    }

    #[test]
    fn test_rating_floored_at_zero() {
        let config = RatingConfig {
            base_rating: 0,
            k_win: 20.0,
            k_loss: 50.0,
            win_bonus: 5,
        };
        assert_eq!(RatingEngine::update_rating(10, false, &config), 0);
        assert_eq!(RatingEngine::update_rating(0, false, &config), 0);
    }
}
