use std::collections::HashMap;

use rand::Rng;
use rand::seq::SliceRandom;

use super::*;

/// Memoized balance function of the weighted approval vote.
///
/// `B(r, s)` is the guaranteed probability that a member still needing `s`
/// desired items, with `r` desired items left on the table, ends up
/// satisfied. A member's voting weight is the loss `B(r, s) - B(r - 1, s)` it
/// suffers if one of its remaining desired items goes to another family.
#[derive(Clone, Debug, Default)]
pub struct BalanceTable {
    memo: HashMap<(i64, i64), Share>,
}

impl BalanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&mut self, r: i64, s: i64) -> Share {
        if s <= 0 {
            return Share::from_integer(1);
        }
        if s > r {
            return Share::from_integer(0);
        }
        if let Some(&b) = self.memo.get(&(r, s)) {
            return b;
        }
        let shared = (self.balance(r - 1, s) + self.balance(r - 1, s - 1)) / 2;
        let taken = self.balance(r - 2, s - 1);
        let b = std::cmp::min(shared, taken);
        self.memo.insert((r, s), b);
        b
    }

    /// Never negative: `B` does not decrease in `r`.
    pub fn weight(&mut self, r: i64, s: i64) -> Share {
        self.balance(r, s) - self.balance(r - 1, s)
    }
}

/// Round-robin with weighted approval voting.
///
/// Families take turns; on its turn a family picks one remaining item by a
/// [`WeightedApproval`] vote whose weights favour members that are close to
/// losing their share.
#[derive(Copy, Clone, Debug, Default)]
pub struct Rwav;

/// Voting weights of `family`'s members on a turn where the family holds
/// `owned` and `remaining` is still on the table.
pub(crate) fn approval_rule(
    instance: &Instance,
    family: FamilyId,
    owned: Bundle,
    remaining: Bundle,
    table: &mut BalanceTable,
) -> WeightedApproval {
    let fam = instance.family(family);
    let k = instance.family_count();
    let weights = fam
        .members()
        .map(|m| {
            let desired = fam.desired_items(m);
            let r = desired.intersection(remaining).len() as i64;
            let s = fam.criterion.target_count(desired.len(), k) as i64 - desired.intersection(owned).len() as i64;
            table.weight(r, s)
        })
        .collect();
    WeightedApproval::new(weights)
}

impl Protocol for Rwav {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Rwav
    }

    fn allocate(&self, instance: &Instance, rng: Option<&mut StdRng>, audit: &mut AuditTrail) -> Allocation {
        let k = instance.family_count();
        let mut remaining: Vec<Item> = instance.items().collect();
        let mut family = 0;
        if let Some(rng) = rng {
            remaining.shuffle(rng);
            family = rng.gen_range(0..k);
            audit.push(Decision::Seeded {
                order: remaining.clone(),
                first_family: family,
            });
        }

        let mut allocation = Allocation::empty(k);
        let mut table = BalanceTable::new();
        let mut turn = 0;
        while !remaining.is_empty() {
            let on_table = Bundle::from_items(remaining.iter().copied());
            let rule = approval_rule(instance, family, allocation.bundle(family), on_table, &mut table);
            let Some(choice) = decide(&rule, instance.family(family), &singletons(&remaining)) else {
                break;
            };
            let item = remaining.remove(choice.index);
            allocation.give(item, family);
            audit.push(Decision::Pick {
                turn,
                family,
                item,
                votes: choice.winning_votes(),
            });
            turn += 1;
            family = (family + 1) % k;
        }
        allocation
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    #[test]
    fn test_balance() {
        let mut table = BalanceTable::new();
        assert_eq!(table.balance(0, 0), Share::from_integer(1));
        assert_eq!(table.balance(1, 1), Share::new(1, 2));
        assert_eq!(table.balance(1, 0), Share::from_integer(1));
        assert_eq!(table.balance(0, 1), Share::from_integer(0));
        assert_eq!(table.balance(3, 2), Share::new(3, 8));
        assert_eq!(table.balance(0, -2), Share::from_integer(1));
        assert_eq!(table.balance(-1, 1), Share::from_integer(0));
    }

    #[test]
    fn test_weight() {
        let mut table = BalanceTable::new();
        assert_eq!(table.weight(4, 0), Share::from_integer(0));
        assert_eq!(table.weight(0, 2), Share::from_integer(0));
        assert_eq!(table.weight(1, 1), Share::new(1, 2));
        assert_eq!(table.weight(4, 2), Share::new(1, 4));
        assert_eq!(table.weight(4, 3), Share::from_integer(0));
        assert_eq!(table.weight(4, -2), Share::from_integer(0));
        assert_eq!(table.weight(3, 2), Share::new(3, 8));
    }

    #[test]
    fn test_weights_never_negative() {
        let mut table = BalanceTable::new();
        for r in 0..=MAX_ITEMS as i64 {
            for s in -1..=r + 1 {
                assert!(table.balance(r, s) >= table.balance(r - 1, s), "B({}, {})", r, s);
            }
        }
    }

    #[test]
    fn test_approval_rule() {
        // Items w, x, y, z are 0, 1, 2, 3. Group 1 owns nothing, w is gone.
        let remaining = Bundle::from_items([1, 2, 3]);
        let rule = approval_rule(&RWAV_INSTANCE, 0, Bundle::new(), remaining, &mut BalanceTable::new());
        assert_eq!(
            rule.weights(),
            [Share::new(1, 2), Share::new(1, 4), Share::new(1, 4), Share::new(1, 2)]
        );
        // Members holding one desired item need nothing more.
        let rule = approval_rule(&RWAV_INSTANCE, 0, Bundle::from_items([1]), remaining, &mut BalanceTable::new());
        assert_eq!(rule.weights()[0], Share::from_integer(0));
        assert_eq!(rule.weights()[1], Share::from_integer(0));
    }

    #[test]
    fn test_choose_good() {
        // w is gone. The member desiring {x, y} weighs 1/4, the one desiring
        // {z, w} has a single chance left and weighs 1/2.
        let instance = Instance::new(
            4,
            vec![
                FamilySpec::new(
                    "Group",
                    Criterion::OneOfBestC(2),
                    vec![AgentSpec::approval(&[1, 2], 1), AgentSpec::approval(&[3, 0], 1)],
                ),
                FamilySpec::new("Other", Criterion::OneOfBestC(2), vec![AgentSpec::approval(&[1, 2], 1)]),
            ],
        )
        .unwrap();
        let remaining = [1, 2, 3];
        let rule = approval_rule(&instance, 0, Bundle::new(), Bundle::from_items(remaining), &mut BalanceTable::new());
        let choice = decide(&rule, instance.family(0), &singletons(&remaining)).unwrap();
        assert_eq!(remaining[choice.index], 3);
        assert_eq!(choice.winning_votes(), Share::new(1, 2));
    }

    #[test]
    fn test_rwav_groups_example() {
        let outcome = Rwav.run(&RWAV_INSTANCE, None).unwrap();
        assert_eq!(outcome.allocation.bundles, bundles(&[&[1, 3], &[0, 2]]));
        assert_eq!(outcome.ratio, Share::from_integer(1));
        let picks: Vec<(FamilyId, Item)> = outcome
            .audit
            .iter()
            .filter_map(|d| match d {
                Decision::Pick { family, item, .. } => Some((*family, *item)),
                _ => None,
            })
            .collect();
        assert_eq!(picks, [(0, 3), (1, 2), (0, 1), (1, 0)]);
    }

    #[test]
    fn test_rwav_seeded() {
        let outcome = Rwav.run(&RWAV_INSTANCE, Some(3)).unwrap();
        assert!(outcome.allocation.is_partition(4));
        match &outcome.audit.decisions()[0] {
            Decision::Seeded { order, first_family } => {
                let mut sorted = order.clone();
                sorted.sort();
                assert_eq!(sorted, [0, 1, 2, 3]);
                assert!(*first_family < 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(outcome.audit.len(), 5);
    }
}
