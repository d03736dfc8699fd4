//! Default ranking signals for newly created alternatives
//!
//! Health and vote scores are placeholders until a computed ranking metric
//! exists. The executor only talks to [`ScoreSynthesizer`], so a real metric
//! can replace the random one without touching the rest of the pipeline.

use altdir_common::config::ScoringConfig;
use altdir_common::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;

/// Exclusive upper bound for synthesized vote scores
pub const VOTE_SCORE_CEILING: i64 = 50;

/// Scores the curator put in the batch, if any
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuppliedScores {
    pub health_score: Option<i64>,
    pub vote_score: Option<i64>,
}

/// Scores written on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scores {
    pub health_score: i64,
    pub vote_score: i64,
}

/// Produces initial scores for a record being created
///
/// Supplied values must be passed through unchanged.
pub trait ScoreSynthesizer: Send {
    fn synthesize(&mut self, supplied: SuppliedScores) -> Scores;
}

/// Uniform random placeholder scores
pub struct RandomScoreSynthesizer {
    rng: StdRng,
    health_range: RangeInclusive<i64>,
}

impl RandomScoreSynthesizer {
    /// Entropy-seeded synthesizer over the configured health range
    pub fn new(scoring: &ScoringConfig) -> Result<Self> {
        scoring.validate()?;
        Ok(Self {
            rng: StdRng::from_entropy(),
            health_range: scoring.health_min..=scoring.health_max,
        })
    }

    /// Reproducible synthesizer, for replaying a run
    pub fn seeded(scoring: &ScoringConfig, seed: u64) -> Result<Self> {
        scoring.validate()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            health_range: scoring.health_min..=scoring.health_max,
        })
    }
}

impl ScoreSynthesizer for RandomScoreSynthesizer {
    fn synthesize(&mut self, supplied: SuppliedScores) -> Scores {
        let health_score = match supplied.health_score {
            Some(score) => score,
            None => self.rng.gen_range(self.health_range.clone()),
        };
        let vote_score = match supplied.vote_score {
            Some(score) => score,
            None => self.rng.gen_range(0..VOTE_SCORE_CEILING),
        };

        Scores {
            health_score,
            vote_score,
        }
    }
}

/// Fixed scores, for callers that want deterministic output
#[derive(Debug, Clone, Copy)]
pub struct FixedScoreSynthesizer {
    pub health_score: i64,
    pub vote_score: i64,
}

impl ScoreSynthesizer for FixedScoreSynthesizer {
    fn synthesize(&mut self, supplied: SuppliedScores) -> Scores {
        Scores {
            health_score: supplied.health_score.unwrap_or(self.health_score),
            vote_score: supplied.vote_score.unwrap_or(self.vote_score),
        }
    }
}
