// Round-by-round bracket selection driven by leverage.
// Picks run from the champion outwards. Each phase sorts what is left of the pool by
// its own leverage column, walks it once taking every candidate the bracket still has
// room for, and hands the remainder to the next phase. Room is judged only from seed
// and region (see topology.rs), there is no bracket tree.
//
// A phase that runs out of eligible candidates stops short and is reported in
// BracketPicks::issues. Predicates only ever get stricter as members are added, so a
// single pass takes the same teams a rescan-from-the-top loop would.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

use crate::error::{SelectionIssue, UnmappedSeed};
use crate::leverage::{LeverageRecord, Round};
use crate::topology::{self, Granularity, RegionHalves, SeedSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Champion,
    Finals,
    FinalFour,
    EliteEight,
    SweetSixteen,
    RoundOf32,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Champion,
        Phase::Finals,
        Phase::FinalFour,
        Phase::EliteEight,
        Phase::SweetSixteen,
        Phase::RoundOf32,
    ];

    /// Teams in the set once the phase is complete
    pub fn target(self) -> usize {
        match self {
            Phase::Champion => 1,
            Phase::Finals => 2,
            Phase::FinalFour => 4,
            Phase::EliteEight => 8,
            Phase::SweetSixteen => 16,
            Phase::RoundOf32 => 32,
        }
    }

    /// Leverage column the pool is ranked by: the game a team must win to enter this set.
    pub fn ranking_round(self) -> Round {
        match self {
            Phase::Champion => Round::R7,
            Phase::Finals => Round::R6,
            Phase::FinalFour => Round::R5,
            Phase::EliteEight => Round::R4,
            Phase::SweetSixteen => Round::R3,
            Phase::RoundOf32 => Round::R2,
        }
    }

    /// Per-region cap, and the seed group that may not repeat within a region.
    fn regional_rule(self) -> Option<(usize, Option<Granularity>)> {
        match self {
            Phase::FinalFour => Some((1, None)),
            Phase::EliteEight => Some((2, Some(Granularity::Half8))),
            Phase::SweetSixteen => Some((4, Some(Granularity::Pod4))),
            Phase::RoundOf32 => Some((8, Some(Granularity::Round64Pair))),
            Phase::Champion | Phase::Finals => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Champion => "Champion",
            Phase::Finals => "Finals",
            Phase::FinalFour => "Final Four",
            Phase::EliteEight => "Elite Eight",
            Phase::SweetSixteen => "Sweet Sixteen",
            Phase::RoundOf32 => "Round of 32",
        };
        f.write_str(name)
    }
}

/// The six nested sets produced by one run, plus everything that went short.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BracketPicks {
    pub champion: Option<String>,
    pub finalist: Option<String>,
    pub finals: BTreeSet<String>,
    pub final_four: BTreeSet<String>,
    pub elite_eight: BTreeSet<String>,
    pub sweet_sixteen: BTreeSet<String>,
    pub round_of_32: BTreeSet<String>,
    pub issues: Vec<SelectionIssue>,
}

impl BracketPicks {
    /// Team names picked to reach the set `phase` builds
    pub fn set(&self, phase: Phase) -> BTreeSet<String> {
        match phase {
            Phase::Champion => self.champion.iter().cloned().collect(),
            Phase::Finals => self.finals.clone(),
            Phase::FinalFour => self.final_four.clone(),
            Phase::EliteEight => self.elite_eight.clone(),
            Phase::SweetSixteen => self.sweet_sixteen.clone(),
            Phase::RoundOf32 => self.round_of_32.clone(),
        }
    }

    /// (phase, target, filled) for every phase that came up short
    pub fn underfilled(&self) -> Vec<(Phase, usize, usize)> {
        self.issues
            .iter()
            .filter_map(|issue| match issue {
                SelectionIssue::Underfilled {
                    phase,
                    target,
                    filled,
                } => Some((*phase, *target, *filled)),
                _ => None,
            })
            .collect()
    }

    /// Every set at full size, finalist included
    pub fn is_complete(&self) -> bool {
        self.finalist.is_some() && self.underfilled().is_empty()
    }
}

/// Highest leverage first; equal leverage falls back to team name, A before Z.
/// NaN ranks last so the order stays total.
fn rank_order(round: Round) -> impl Fn(&&LeverageRecord, &&LeverageRecord) -> Ordering {
    move |a, b| {
        let (x, y) = (a.get(round), b.get(round));
        y.partial_cmp(&x)
            .unwrap_or_else(|| x.is_nan().cmp(&y.is_nan()))
            .then_with(|| a.name.cmp(&b.name))
    }
}

pub struct BracketSelector<'a> {
    halves: &'a RegionHalves,
    /// Teams not yet committed to any set
    pool: Vec<&'a LeverageRecord>,
    issues: Vec<SelectionIssue>,
    /// Teams already reported for an unmapped seed
    unmapped: HashSet<&'a str>,
}

impl<'a> BracketSelector<'a> {
    pub fn new(records: &'a [LeverageRecord], halves: &'a RegionHalves) -> Self {
        BracketSelector {
            halves,
            pool: records.iter().collect(),
            issues: Vec::new(),
            unmapped: HashSet::new(),
        }
    }

    /// Run all six phases in order.
    pub fn run(mut self) -> BracketPicks {
        let champion = self.pick_champion();
        let finalist = match champion {
            Some(champion) => self.pick_finalist(champion),
            None => {
                self.underfilled(Phase::Finals, 0);
                None
            }
        };

        let mut members: Vec<&'a LeverageRecord> = champion.into_iter().chain(finalist).collect();
        let finals = names(&members);

        self.fill_regional(Phase::FinalFour, &mut members);
        let final_four = names(&members);
        self.fill_regional(Phase::EliteEight, &mut members);
        let elite_eight = names(&members);
        self.fill_regional(Phase::SweetSixteen, &mut members);
        let sweet_sixteen = names(&members);
        self.fill_regional(Phase::RoundOf32, &mut members);
        let round_of_32 = names(&members);

        BracketPicks {
            champion: champion.map(|t| t.name.clone()),
            finalist: finalist.map(|t| t.name.clone()),
            finals,
            final_four,
            elite_eight,
            sweet_sixteen,
            round_of_32,
            issues: self.issues,
        }
    }

    /// Take the whole pool, sorted for `phase`. The caller puts back what it does not use.
    fn ranked(&mut self, phase: Phase) -> Vec<&'a LeverageRecord> {
        let mut pool = std::mem::take(&mut self.pool);
        pool.sort_by(rank_order(phase.ranking_round()));
        pool
    }

    fn pick_champion(&mut self) -> Option<&'a LeverageRecord> {
        let mut ranked = self.ranked(Phase::Champion).into_iter();
        let champion = ranked.next();
        self.pool = ranked.collect();

        match champion {
            Some(team) => debug!("Champion: {} ({:.1})", team.name, team.get(Round::R7)),
            None => self.underfilled(Phase::Champion, 0),
        }
        champion
    }

    /// Best F4 leverage among teams on the other side of the bracket from the champion.
    fn pick_finalist(&mut self, champion: &LeverageRecord) -> Option<&'a LeverageRecord> {
        let ranked = self.ranked(Phase::Finals);
        let position = ranked
            .iter()
            .position(|t| self.halves.are_opposed(&champion.region, &t.region));
        self.pool = ranked;

        match position {
            Some(i) => {
                let finalist = self.pool.remove(i);
                debug!("Finalist: {} ({:.1})", finalist.name, finalist.get(Round::R6));
                Some(finalist)
            }
            None => {
                let issue = SelectionIssue::NoFinalist {
                    champion: champion.name.clone(),
                };
                warn!("{}", issue);
                self.issues.push(issue);
                self.underfilled(Phase::Finals, 1);
                None
            }
        }
    }

    /// Grow `members` towards the phase target under its per-region rule.
    fn fill_regional(&mut self, phase: Phase, members: &mut Vec<&'a LeverageRecord>) {
        let (cap, granularity) = match phase.regional_rule() {
            Some(rule) => rule,
            None => return,
        };
        let target = phase.target();

        let mut per_region: HashMap<&'a str, usize> = HashMap::new();
        let mut occupied: HashSet<(&'a str, SeedSlot)> = HashSet::new();
        for &member in members.iter() {
            *per_region.entry(member.region.as_str()).or_default() += 1;
            if let Some(granularity) = granularity {
                match topology::slot(member.seed, granularity) {
                    Ok(slot) => {
                        occupied.insert((member.region.as_str(), slot));
                    }
                    Err(e) => self.unmapped(phase, member, e),
                }
            }
        }

        let ranked = self.ranked(phase);
        let mut rest = Vec::with_capacity(ranked.len());
        for candidate in ranked {
            if members.len() >= target {
                rest.push(candidate);
                continue;
            }
            let region = candidate.region.as_str();
            if per_region.get(region).copied().unwrap_or(0) >= cap {
                rest.push(candidate);
                continue;
            }
            if let Some(granularity) = granularity {
                let slot = match topology::slot(candidate.seed, granularity) {
                    Ok(slot) => slot,
                    Err(e) => {
                        self.unmapped(phase, candidate, e);
                        rest.push(candidate);
                        continue;
                    }
                };
                if !occupied.insert((region, slot)) {
                    rest.push(candidate);
                    continue;
                }
            }
            *per_region.entry(region).or_default() += 1;
            members.push(candidate);
        }
        self.pool = rest;

        if members.len() < target {
            self.underfilled(phase, members.len());
        } else {
            debug!("{} complete with {} teams", phase, members.len());
        }
    }

    /// Reported once per team, against the first phase that needed its slot.
    fn unmapped(&mut self, phase: Phase, team: &'a LeverageRecord, error: UnmappedSeed) {
        if !self.unmapped.insert(team.name.as_str()) {
            return;
        }
        let issue = SelectionIssue::UnmappedSeed {
            phase,
            team: team.name.clone(),
            seed: error.0,
        };
        warn!("{}", issue);
        self.issues.push(issue);
    }

    fn underfilled(&mut self, phase: Phase, filled: usize) {
        let issue = SelectionIssue::Underfilled {
            phase,
            target: phase.target(),
            filled,
        };
        warn!("{}", issue);
        self.issues.push(issue);
    }
}

fn names(members: &[&LeverageRecord]) -> BTreeSet<String> {
    members.iter().map(|t| t.name.clone()).collect()
}

/// Pick a full bracket from leverage records.
pub fn select(records: &[LeverageRecord], halves: &RegionHalves) -> BracketPicks {
    BracketSelector::new(records, halves).run()
}
