mod award;
mod criterion;
mod participant;
mod reward;
mod team;

pub use award::{AwardVote, SpecialAward};
pub use criterion::{CriterionScore, EvaluationCriterion, WEIGHT_TOLERANCE, weights_balanced};
pub use participant::{Participant, Role};
pub use reward::{RewardGrant, RewardPolicy};
pub use team::Team;
