// Leverage: how much more the model likes a team than the crowd does,
// weighted by how much the model likes it at all.
//   leverage[r] = (model[r] - crowd[r]) * model[r]
// Inputs are on the percentage scale so the result is in percent squared.
// It is only ever used to rank teams, never as a probability.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ingest::Team;

/// Probability columns R2..R7: the chance a team wins through that round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Round {
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

impl Round {
    pub const ALL: [Round; 6] = [Round::R2, Round::R3, Round::R4, Round::R5, Round::R6, Round::R7];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name used by both sources
    pub fn column(self) -> &'static str {
        match self {
            Round::R2 => "R2",
            Round::R3 => "R3",
            Round::R4 => "R4",
            Round::R5 => "R5",
            Round::R6 => "R6",
            Round::R7 => "R7",
        }
    }

    /// The game a team has to win to clear this column, e.g. R2 is the round of 64.
    pub fn game(self) -> &'static str {
        match self {
            Round::R2 => "R64",
            Round::R3 => "R32",
            Round::R4 => "S16",
            Round::R5 => "E8",
            Round::R6 => "F4",
            Round::R7 => "NCG",
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_Lev", self.game())
    }
}

/// One value per round, indexed by `Round::index`.
pub type RoundValues = [f64; 6];

pub fn leverage(model_pct: f64, crowd_pct: f64) -> f64 {
    (model_pct - crowd_pct) * model_pct
}

/// Per-team leverage for every round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeverageRecord {
    pub name: String,
    pub seed: u8,
    pub region: String,
    pub leverage: RoundValues,
}

impl LeverageRecord {
    pub fn from_team(team: &Team) -> LeverageRecord {
        let mut values = [0.0; 6];
        for round in Round::ALL {
            values[round.index()] = leverage(team.model(round), team.crowd(round));
        }
        LeverageRecord {
            name: team.name.clone(),
            seed: team.seed,
            region: team.region.clone(),
            leverage: values,
        }
    }

    #[inline]
    pub fn get(&self, round: Round) -> f64 {
        self.leverage[round.index()]
    }
}

pub fn calculate(teams: &[Team]) -> Vec<LeverageRecord> {
    teams.iter().map(LeverageRecord::from_team).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(model: RoundValues, crowd: RoundValues) -> Team {
        Team::new("Houston".to_string(), 1, "Midwest".to_string(), crowd, model)
    }

    #[test]
    fn test_formula() {
        assert_eq!(leverage(40.0, 25.0), 600.0);
        assert_eq!(leverage(10.0, 30.0), -200.0);
        assert_eq!(leverage(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_record_columns() {
        let t = team(
            [95.0, 70.0, 50.0, 30.0, 20.0, 12.0],
            [98.0, 80.0, 40.0, 20.0, 10.0, 5.0],
        );
        let record = LeverageRecord::from_team(&t);
        assert_eq!(record.name, "Houston");
        assert_eq!(record.seed, 1);
        assert_eq!(record.get(Round::R2), (95.0 - 98.0) * 95.0);
        assert_eq!(record.get(Round::R4), 500.0);
        assert_eq!(record.get(Round::R7), 84.0);
    }

    #[test]
    fn test_unreachable_rounds_are_zero() {
        let t = team([60.0, 20.0, 0.0, 0.0, 0.0, 0.0], [55.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let record = LeverageRecord::from_team(&t);
        for round in [Round::R4, Round::R5, Round::R6, Round::R7] {
            assert_eq!(record.get(round), 0.0);
        }
        assert_eq!(record.get(Round::R3), 400.0);
    }

    #[test]
    fn test_recompute_is_identical() {
        let t = team([81.5, 52.25, 33.0, 17.5, 9.0, 4.5], [90.0, 60.0, 20.0, 11.0, 3.0, 1.0]);
        let first = LeverageRecord::from_team(&t);
        for _ in 0..5 {
            assert_eq!(LeverageRecord::from_team(&t), first);
        }
        assert_eq!(calculate(&[t.clone(), t]), vec![first.clone(), first]);
    }

    #[test]
    fn test_round_labels() {
        assert_eq!(Round::R2.column(), "R2");
        assert_eq!(Round::R7.to_string(), "NCG_Lev");
        assert_eq!(Round::R4.to_string(), "S16_Lev");
        assert_eq!(Round::R6.index(), 4);
    }
}
