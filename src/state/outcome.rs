//! Decides whether a shot beats the goalkeeper.

use rand::Rng;

use crate::state::choice::Choice;

/// Result of confronting a shot choice with a save choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    /// Keeper guessed both direction and height.
    Saved,
    /// Keeper guessed the direction but not the height; a coin flip decided.
    Probabilistic { goal: bool },
    /// Keeper dived the wrong way.
    Goal,
}

impl ShotOutcome {
    pub fn is_goal(self) -> bool {
        match self {
            ShotOutcome::Saved => false,
            ShotOutcome::Probabilistic { goal } => goal,
            ShotOutcome::Goal => true,
        }
    }
}

/// Resolve a shot against a save. The random source is only consulted when the
/// keeper picked the right direction at the wrong height, and only once.
pub fn resolve<R: Rng + ?Sized>(shot: Choice, save: Choice, rng: &mut R) -> ShotOutcome {
    if shot.direction != save.direction {
        return ShotOutcome::Goal;
    }
    if shot.height == save.height {
        return ShotOutcome::Saved;
    }
    ShotOutcome::Probabilistic {
        goal: rng.random_bool(0.5),
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn exact_guess_is_always_saved() {
        let mut rng = StdRng::seed_from_u64(7);
        for choice in Choice::all() {
            assert_eq!(resolve(choice, choice, &mut rng), ShotOutcome::Saved);
        }
    }

    #[test]
    fn wrong_direction_is_always_a_goal() {
        let mut rng = StdRng::seed_from_u64(7);
        for shot in Choice::all() {
            for save in Choice::all() {
                if shot.direction != save.direction {
                    let outcome = resolve(shot, save, &mut rng);
                    assert_eq!(outcome, ShotOutcome::Goal);
                    assert!(outcome.is_goal());
                }
            }
        }
    }

    #[test]
    fn right_direction_wrong_height_is_a_fair_coin() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let shot: Choice = "Left-High".parse().unwrap();
        let save: Choice = "Left-Low".parse().unwrap();

        let trials = 20_000;
        let mut goals = 0;
        for _ in 0..trials {
            match resolve(shot, save, &mut rng) {
                ShotOutcome::Probabilistic { goal } => {
                    if goal {
                        goals += 1;
                    }
                }
                other => panic!("expected probabilistic outcome, got {other:?}"),
            }
        }

        let ratio = goals as f64 / trials as f64;
        assert!((0.47..=0.53).contains(&ratio), "goal ratio {ratio}");
    }
}
