//! Allocation protocols.
//!
//! A protocol turns an [`Instance`] into an [`Allocation`], logging every
//! decision it takes in an [`AuditTrail`]. [`Protocol::run`] wraps the
//! procedure with the checks shared by all protocols.

use std::fmt;
use std::str::FromStr;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, trace};

use super::*;

mod enhanced;
mod exhaustive;
mod line;
mod plurality;
mod rwav;
mod two_thirds;

pub use enhanced::{Adjustment, EnhancedRwav, enhance};
pub use exhaustive::Exhaustive;
pub use line::Line;
pub use plurality::{PluralityRounds, ef2_assignment, envy_free_assignment};
pub use rwav::{BalanceTable, Rwav};
pub use two_thirds::TwoThirds;

/// One step taken by a protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// The random draws of a seeded run.
    Seeded { order: Vec<Item>, first_family: FamilyId },
    /// `family` took `item`, backed by `votes`.
    Pick {
        turn: usize,
        family: FamilyId,
        item: Item,
        votes: Share,
    },
    /// `family` wanted an item already claimed in the same round and voted again.
    Conflict { round: usize, family: FamilyId, wanted: Item },
    /// A family's acceptance vote on the left segment `[0, position)`.
    Cut {
        position: usize,
        family: FamilyId,
        accepted: bool,
        votes_for: Share,
        votes_against: Share,
    },
    /// `family` leaves with `bundle`.
    Take { family: FamilyId, bundle: Bundle },
    /// A threshold shortcut allocation replaced the base run.
    Shortcut { family: FamilyId, item: Item, supporters: u64 },
    Adjusted(Adjustment),
    /// `item` moved because `poor` receiving members outnumber `hurt` giving ones.
    Move {
        item: Item,
        from: FamilyId,
        to: FamilyId,
        poor: u64,
        hurt: u64,
    },
    /// Best allocation found after looking at `evaluated` assignments.
    Optimum { evaluated: usize, ratio: Share },
}

/// Ordered log of the decisions of one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuditTrail {
    decisions: Vec<Decision>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, decision: Decision) {
        trace!(?decision);
        self.decisions.push(decision);
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

/// Result of a protocol run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub allocation: Allocation,
    pub ratio: Share,
    pub audit: AuditTrail,
}

pub trait Protocol {
    fn kind(&self) -> ProtocolKind;

    /// Whether the protocol handles `family_count` families.
    fn supports(&self, family_count: usize) -> bool {
        family_count >= 2
    }

    /// Whether renaming items or reordering families never changes the
    /// guarantee ratio. The search runs other protocols on every relabeling
    /// of an instance.
    fn is_symmetric(&self) -> bool {
        false
    }

    /// The procedure itself. `rng` is `Some` for seeded runs; deterministic
    /// protocols ignore it.
    fn allocate(&self, instance: &Instance, rng: Option<&mut StdRng>, audit: &mut AuditTrail) -> Allocation;

    /// Runs the protocol, checks that the result is a partition of the items
    /// and computes its guarantee ratio. The same seed always gives the same
    /// outcome.
    fn run(&self, instance: &Instance, seed: Option<u64>) -> Result<Outcome, FairError> {
        let count = instance.family_count();
        if !self.supports(count) {
            return Err(FairError::UnsupportedFamilyCount {
                protocol: self.kind(),
                count,
            });
        }
        let mut rng = seed.map(StdRng::seed_from_u64);
        let mut audit = AuditTrail::new();
        let allocation = self.allocate(instance, rng.as_mut(), &mut audit);
        if allocation.family_count() != count || !allocation.is_partition(instance.item_count()) {
            return Err(FairError::PartitionInvariantViolation {
                protocol: self.kind(),
                instance: Box::new(instance.clone()),
                allocation,
            });
        }
        let ratio = guarantee_ratio(instance, &allocation);
        debug!(protocol = %self.kind(), ?seed, %ratio, bundles = ?allocation.bundles, "run finished");
        Ok(Outcome {
            allocation,
            ratio,
            audit,
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProtocolKind {
    Rwav,
    EnhancedRwav,
    Line,
    Plurality,
    TwoThirds,
    Exhaustive,
}

impl ProtocolKind {
    pub const ALL: [ProtocolKind; 6] = [
        ProtocolKind::Rwav,
        ProtocolKind::EnhancedRwav,
        ProtocolKind::Line,
        ProtocolKind::Plurality,
        ProtocolKind::TwoThirds,
        ProtocolKind::Exhaustive,
    ];

    /// The protocol with its default configuration.
    pub fn protocol(&self) -> Box<dyn Protocol> {
        match self {
            ProtocolKind::Rwav => Box::new(Rwav),
            ProtocolKind::EnhancedRwav => Box::new(EnhancedRwav::default()),
            ProtocolKind::Line => Box::new(Line::new()),
            ProtocolKind::Plurality => Box::new(PluralityRounds),
            ProtocolKind::TwoThirds => Box::new(TwoThirds),
            ProtocolKind::Exhaustive => Box::new(Exhaustive),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ProtocolKind::Rwav => "rwav",
            ProtocolKind::EnhancedRwav => "enhanced-rwav",
            ProtocolKind::Line => "line",
            ProtocolKind::Plurality => "plurality",
            ProtocolKind::TwoThirds => "two-thirds",
            ProtocolKind::Exhaustive => "exhaustive",
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProtocolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProtocolKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = ProtocolKind::ALL.iter().map(|k| k.name()).collect();
                format!("unknown protocol `{}`, expected one of: {}", s, names.join(", "))
            })
    }
}

/// One singleton bundle per item, in the given order.
pub(crate) fn singletons(items: &[Item]) -> Vec<Bundle> {
    items.iter().map(|&item| Bundle::from_items([item])).collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use std::sync::LazyLock;

    /// Items w, x, y, z are 0, 1, 2, 3.
    pub(crate) fn rwav_families() -> Vec<FamilySpec> {
        vec![
            FamilySpec::new(
                "Group 1",
                Criterion::OneOfBestC(2),
                vec![
                    AgentSpec::approval(&[0, 1], 1),
                    AgentSpec::approval(&[1, 2], 2),
                    AgentSpec::approval(&[2, 3], 3),
                    AgentSpec::approval(&[3, 0], 4),
                ],
            ),
            FamilySpec::new(
                "Group 2",
                Criterion::OneOfBestC(2),
                vec![AgentSpec::approval(&[0, 3], 2), AgentSpec::approval(&[3, 2], 3)],
            ),
        ]
    }

    pub(crate) static RWAV_INSTANCE: LazyLock<Instance> =
        LazyLock::new(|| Instance::new(4, rwav_families()).unwrap());

    /// Two families with opposite rankings of two items.
    pub(crate) static BOUNDARY: LazyLock<Instance> = LazyLock::new(|| {
        let family = |name: &str, ranking: [Item; 2]| {
            FamilySpec::new(
                name,
                Criterion::Proportional,
                vec![AgentSpec::single(Valuation::Ordinal(ranking.to_vec())); 2],
            )
        };
        Instance::new(2, vec![family("A", [0, 1]), family("B", [1, 0])]).unwrap()
    });

    pub(crate) fn bundles(lists: &[&[Item]]) -> Vec<Bundle> {
        lists.iter().map(|l| Bundle::from_items(l.iter().copied())).collect()
    }
}
