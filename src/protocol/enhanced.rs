use super::*;

/// A local change to an allocation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Adjustment {
    Transfer { item: Item, from: FamilyId, to: FamilyId },
    /// `first` and `second` trade owners.
    Swap {
        first: Item,
        first_owner: FamilyId,
        second: Item,
        second_owner: FamilyId,
    },
}

impl Adjustment {
    fn apply(&self, allocation: &Allocation) -> Allocation {
        let mut next = allocation.clone();
        match *self {
            Adjustment::Transfer { item, to, .. } => next.give(item, to),
            Adjustment::Swap {
                first,
                first_owner,
                second,
                second_owner,
            } => {
                next.give(first, second_owner);
                next.give(second, first_owner);
            }
        }
        next
    }
}

/// Candidate adjustments, transfers first (by item, then receiving family)
/// and then swaps of items with different owners (by item pair).
fn candidates(allocation: &Allocation, item_count: usize) -> Vec<Adjustment> {
    let owners: Vec<Option<FamilyId>> = (0..item_count).map(|item| allocation.owner(item)).collect();
    let mut result = Vec::new();
    for (item, owner) in owners.iter().enumerate() {
        let Some(from) = *owner else { continue };
        for to in 0..allocation.family_count() {
            if to != from {
                result.push(Adjustment::Transfer { item, from, to });
            }
        }
    }
    for first in 0..item_count {
        for second in first + 1..item_count {
            if let (Some(first_owner), Some(second_owner)) = (owners[first], owners[second]) {
                if first_owner != second_owner {
                    result.push(Adjustment::Swap {
                        first,
                        first_owner,
                        second,
                        second_owner,
                    });
                }
            }
        }
    }
    result
}

/// Improves `start` with local moves until none helps.
///
/// A move is applied when it lowers no family's realized utility and strictly
/// raises the minimum; the first such candidate wins. The result is a fixed
/// point, so enhancing it again changes nothing.
pub fn enhance(instance: &Instance, start: Allocation) -> (Allocation, Vec<Adjustment>) {
    let mut current = start;
    let mut utilities = allocation::realized_utilities(instance, &current);
    let mut adjustments = Vec::new();
    loop {
        let floor = utilities.iter().min().copied();
        let found = candidates(&current, instance.item_count()).into_iter().find_map(|adjustment| {
            let next = adjustment.apply(&current);
            let next_utilities = allocation::realized_utilities(instance, &next);
            let improves = next_utilities.iter().zip(&utilities).all(|(n, c)| n >= c)
                && next_utilities.iter().min().copied() > floor;
            improves.then_some((adjustment, next, next_utilities))
        });
        match found {
            Some((adjustment, next, next_utilities)) => {
                adjustments.push(adjustment);
                current = next;
                utilities = next_utilities;
            }
            None => return (current, adjustments),
        }
    }
}

/// RWAV followed by a threshold shortcut check and an adjustment pass.
///
/// For two families, if at least `threshold` of a family's members desire
/// one item, giving the family that item alone and the other family the rest
/// is considered; it replaces the RWAV allocation when it is at least as
/// fair. The result never has a lower guarantee ratio than RWAV with the same
/// seed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnhancedRwav {
    pub threshold: Share,
}

impl Default for EnhancedRwav {
    fn default() -> Self {
        EnhancedRwav {
            threshold: Share::new(3, 5),
        }
    }
}

impl EnhancedRwav {
    pub fn with_threshold(threshold: Share) -> Self {
        EnhancedRwav { threshold }
    }

    /// The first (item, family) pair, items in index order, where the
    /// family's support for the item reaches the threshold.
    fn shortcut(&self, instance: &Instance) -> Option<(Allocation, Decision)> {
        if instance.family_count() != 2 {
            return None;
        }
        for item in instance.items() {
            for family in instance.family_ids() {
                let fam = instance.family(family);
                let supporters = fam.count_members_with(|m| fam.values[(m, item)] > 0);
                if Share::from_integer(supporters) >= self.threshold * Share::from_integer(fam.member_weight()) {
                    let single = Bundle::from_items([item]);
                    let mut allocation = Allocation::empty(2);
                    allocation.bundles[family] = single;
                    allocation.bundles[1 - family] = instance.all_items().difference(single);
                    return Some((
                        allocation,
                        Decision::Shortcut {
                            family,
                            item,
                            supporters,
                        },
                    ));
                }
            }
        }
        None
    }
}

impl Protocol for EnhancedRwav {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::EnhancedRwav
    }

    fn allocate(&self, instance: &Instance, rng: Option<&mut StdRng>, audit: &mut AuditTrail) -> Allocation {
        let mut chosen = Rwav.allocate(instance, rng, audit);
        if let Some((candidate, decision)) = self.shortcut(instance) {
            if guarantee_ratio(instance, &candidate) >= guarantee_ratio(instance, &chosen) {
                audit.push(decision);
                chosen = candidate;
            }
        }
        let (adjusted, adjustments) = enhance(instance, chosen);
        for adjustment in adjustments {
            audit.push(Decision::Adjusted(adjustment));
        }
        adjusted
    }
}
