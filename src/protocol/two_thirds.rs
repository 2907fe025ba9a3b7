use super::*;

/// Iterative exchange between two families.
///
/// Family 1 starts with every item. An item changes hands when more members
/// of the receiving family are poor (they desire it and value their bundle
/// at 0) than members of the giving family would be hurt (they desire it and
/// value their bundle at exactly 1). Each round first moves items from
/// family 0 to family 1, then from family 1 to family 0, until a round
/// changes nothing or `2 * total members` rounds have passed.
#[derive(Copy, Clone, Debug, Default)]
pub struct TwoThirds;

impl Protocol for TwoThirds {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::TwoThirds
    }

    fn supports(&self, family_count: usize) -> bool {
        family_count == 2
    }

    fn allocate(&self, instance: &Instance, _rng: Option<&mut StdRng>, audit: &mut AuditTrail) -> Allocation {
        let mut allocation = Allocation::new(vec![Bundle::new(), instance.all_items()]);
        let rounds: u64 = 2 * instance.families().iter().map(Family::member_weight).sum::<u64>();
        for _ in 0..rounds {
            let mut changed = false;
            for (from, to) in [(0, 1), (1, 0)] {
                let giver = instance.family(from);
                let taker = instance.family(to);
                let items: Vec<Item> = allocation.bundle(from).iter().collect();
                for item in items {
                    let poor = taker.count_members_with(|m| {
                        taker.values[(m, item)] > 0 && taker.utility_of(m, allocation.bundle(to)) == 0
                    });
                    let hurt = giver.count_members_with(|m| {
                        giver.values[(m, item)] > 0 && giver.utility_of(m, allocation.bundle(from)) == 1
                    });
                    if poor > hurt {
                        allocation.give(item, to);
                        audit.push(Decision::Move {
                            item,
                            from,
                            to,
                            poor,
                            hurt,
                        });
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        allocation
    }
}
