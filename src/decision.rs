//! How a family turns its members' preferences into one choice.
//!
//! Every rule produces a tally (the voting weight behind each option) and
//! [`decide`] picks the option with the largest tally. Ties go to the option
//! with the lowest index, so the outcome only depends on the order in which
//! options are offered.

use super::*;

/// Aggregates individual preferences into per-option voting weights.
pub trait DecisionRule {
    fn tally(&self, family: &Family, options: &[Bundle]) -> Vec<Share>;
}

/// The option a family picked, with the tally that decided it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    pub index: usize,
    pub tally: Vec<Share>,
}

impl Choice {
    /// The voting weight behind the winning option.
    pub fn winning_votes(&self) -> Share {
        self.tally[self.index]
    }
}

/// Lets `family` choose among `options` using `rule`. Returns `None` only for
/// an empty menu.
pub fn decide<R: DecisionRule + ?Sized>(rule: &R, family: &Family, options: &[Bundle]) -> Option<Choice> {
    let tally = rule.tally(family, options);
    debug_assert_eq!(tally.len(), options.len(), "One tally entry per option.");
    let mut best: Option<usize> = None;
    for (i, votes) in tally.iter().enumerate() {
        if best.is_none_or(|b| *votes > tally[b]) {
            best = Some(i);
        }
    }
    best.map(|index| Choice { index, tally })
}

/// The option `member` values most, the lowest index among equals.
pub(crate) fn favourite(family: &Family, member: usize, options: &[Bundle]) -> Option<usize> {
    let mut best: Option<(usize, Weight)> = None;
    for (i, &option) in options.iter().enumerate() {
        let v = family.utility_of(member, option);
        if best.is_none_or(|(_, bv)| v > bv) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// Every agent votes for the option it values most.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Plurality;

impl DecisionRule for Plurality {
    fn tally(&self, family: &Family, options: &[Bundle]) -> Vec<Share> {
        let mut votes = vec![Share::from_integer(0); options.len()];
        for member in family.members() {
            if let Some(best) = favourite(family, member, options) {
                votes[best] += Share::from_integer(family.cardinality(member));
            }
        }
        votes
    }
}

/// Every member supports each option containing an item it desires, with
/// a member-specific weight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightedApproval {
    weights: Vec<Share>,
}

impl WeightedApproval {
    /// `weights[m]` is the weight of one agent of member entry `m`.
    pub fn new(weights: Vec<Share>) -> Self {
        WeightedApproval { weights }
    }

    pub fn weights(&self) -> &[Share] {
        &self.weights
    }
}

impl DecisionRule for WeightedApproval {
    fn tally(&self, family: &Family, options: &[Bundle]) -> Vec<Share> {
        debug_assert_eq!(self.weights.len(), family.member_count(), "One weight per member.");
        let mut votes = vec![Share::from_integer(0); options.len()];
        for member in family.members() {
            let desired = family.desired_items(member);
            let weight = self.weights[member] * Share::from_integer(family.cardinality(member));
            for (i, option) in options.iter().enumerate() {
                if !option.intersection(desired).is_empty() {
                    votes[i] += weight;
                }
            }
        }
        votes
    }
}

/// Index of "accept" in an [`Acceptance`] menu.
pub const ACCEPT: usize = 0;

/// A yes/no vote over the menu `[accept, pass]`. Members vote to accept when
/// the predicate holds for them; a tie accepts.
pub struct Acceptance<F: Fn(usize) -> bool> {
    accepts: F,
}

impl<F: Fn(usize) -> bool> Acceptance<F> {
    pub fn new(accepts: F) -> Self {
        Acceptance { accepts }
    }
}

impl<F: Fn(usize) -> bool> DecisionRule for Acceptance<F> {
    fn tally(&self, family: &Family, options: &[Bundle]) -> Vec<Share> {
        debug_assert_eq!(options.len(), 2, "The menu is [accept, pass].");
        let yes = family.count_members_with(|m| (self.accepts)(m));
        let no = family.member_weight() - yes;
        vec![Share::from_integer(yes), Share::from_integer(no)]
    }
}
