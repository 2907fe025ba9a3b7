use super::*;

/// Cut-and-choose along a line of items.
///
/// The left segment grows one item at a time. At every cut the remaining
/// families vote, in order, on taking it; the first family where at least
/// half of the members accept leaves with it. With `f` families left, a
/// member accepts when the left segment, counted `f - 1` times, is worth at
/// least what remains on the right once its `f - 1` best items are removed.
/// For two families that is envy-freeness up to one item. The last family
/// takes whatever is left.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Line {
    order: Option<Vec<Item>>,
}

impl Line {
    /// Items in index order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Items in the given order. Out-of-range and repeated entries are
    /// skipped, and items not listed follow in index order.
    pub fn with_order(order: Vec<Item>) -> Self {
        Line { order: Some(order) }
    }

    fn line(&self, item_count: usize) -> Vec<Item> {
        let mut placed = Bundle::new();
        let mut line = Vec::with_capacity(item_count);
        let listed = self.order.iter().flatten().copied();
        for item in listed.chain(0..item_count) {
            if item < item_count && !placed.contains(item) {
                placed.insert(item);
                line.push(item);
            }
        }
        line
    }
}

fn accepts(family: &Family, member: usize, left: Bundle, right: Bundle, others: usize) -> bool {
    let values = family.valuation(member);
    criterion::value(&values, left) * others as Weight >= criterion::value_except_best(&values, right, others)
}

impl Protocol for Line {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Line
    }

    fn allocate(&self, instance: &Instance, _rng: Option<&mut StdRng>, audit: &mut AuditTrail) -> Allocation {
        let line = self.line(instance.item_count());
        let mut segment = line.as_slice();
        let mut waiting: Vec<FamilyId> = instance.family_ids().collect();
        let mut allocation = Allocation::empty(instance.family_count());
        while waiting.len() > 1 {
            let others = waiting.len() - 1;
            let mut taken = None;
            'cuts: for position in 1..=segment.len() {
                let left = Bundle::from_items(segment[..position].iter().copied());
                let right = Bundle::from_items(segment[position..].iter().copied());
                for &family in &waiting {
                    let fam = instance.family(family);
                    let rule = Acceptance::new(|m| accepts(fam, m, left, right, others));
                    let Some(choice) = decide(&rule, fam, &[left, Bundle::new()]) else {
                        continue;
                    };
                    let accepted = choice.index == decision::ACCEPT;
                    audit.push(Decision::Cut {
                        position,
                        family,
                        accepted,
                        votes_for: choice.tally[0],
                        votes_against: choice.tally[1],
                    });
                    if accepted {
                        taken = Some((family, position));
                        break 'cuts;
                    }
                }
            }
            // An empty segment goes to the first family waiting.
            let (family, position) = taken.unwrap_or((waiting[0], segment.len()));
            let bundle = Bundle::from_items(segment[..position].iter().copied());
            allocation.bundles[family] = bundle;
            audit.push(Decision::Take { family, bundle });
            waiting.retain(|&f| f != family);
            segment = &segment[position..];
        }
        if let Some(&last) = waiting.first() {
            let bundle = Bundle::from_items(segment.iter().copied());
            allocation.bundles[last] = bundle;
            audit.push(Decision::Take { family: last, bundle });
        }
        allocation
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    #[test]
    fn test_line_groups_example() {
        let outcome = Line::new().run(&RWAV_INSTANCE, None).unwrap();
        assert_eq!(outcome.allocation.bundles, bundles(&[&[0], &[1, 2, 3]]));
        assert_eq!(outcome.ratio, Share::new(1, 2));
        assert_eq!(
            outcome.audit.decisions()[0],
            Decision::Cut {
                position: 1,
                family: 0,
                accepted: true,
                votes_for: Share::from_integer(5),
                votes_against: Share::from_integer(5),
            }
        );
    }

    #[test]
    fn test_line_with_order() {
        let mut families = rwav_families();
        families.reverse();
        let instance = Instance::new(4, families).unwrap();
        let outcome = Line::with_order(vec![1, 0, 2, 3]).run(&instance, None).unwrap();
        assert_eq!(outcome.allocation.bundles, bundles(&[&[2, 3], &[0, 1]]));
    }

    #[test]
    fn test_line_order_is_completed() {
        assert_eq!(Line::with_order(vec![3, 9, 1, 3]).line(4), [3, 1, 0, 2]);
        assert_eq!(Line::new().line(3), [0, 1, 2]);
    }

    #[test]
    fn test_line_ignores_seed() {
        let p = Line::new();
        assert_eq!(p.run(&RWAV_INSTANCE, Some(1)).unwrap(), p.run(&RWAV_INSTANCE, None).unwrap());
    }

    #[test]
    fn test_line_three_families() {
        let mut families = rwav_families();
        families.push(families[1].clone());
        let instance = Instance::new(4, families).unwrap();
        let outcome = Line::new().run(&instance, None).unwrap();
        assert!(outcome.allocation.is_partition(4));
        let takes = outcome.audit.iter().filter(|d| matches!(d, Decision::Take { .. })).count();
        assert_eq!(takes, 3);
    }
}
