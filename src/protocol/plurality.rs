use super::*;

/// Rounds of simultaneous plurality votes.
///
/// In every round each family votes for its favourite remaining item. Claims
/// are settled in precedence order, which starts at family `round % k` and
/// rotates, so no family is always first. A family whose item was already
/// claimed in the same round votes again among the unclaimed items.
#[derive(Copy, Clone, Debug, Default)]
pub struct PluralityRounds;

impl Protocol for PluralityRounds {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Plurality
    }

    fn allocate(&self, instance: &Instance, _rng: Option<&mut StdRng>, audit: &mut AuditTrail) -> Allocation {
        let k = instance.family_count();
        let mut remaining: Vec<Item> = instance.items().collect();
        let mut allocation = Allocation::empty(k);
        let mut round = 0;
        while !remaining.is_empty() {
            let menu = singletons(&remaining);
            let votes: Vec<Option<Choice>> = instance
                .families()
                .iter()
                .map(|fam| decide(&Plurality, fam, &menu))
                .collect();
            let mut claimed = Bundle::new();
            for offset in 0..k {
                let family = (round + offset) % k;
                let open: Vec<Item> = remaining.iter().copied().filter(|&i| !claimed.contains(i)).collect();
                let Some(choice) = &votes[family] else { continue };
                if open.is_empty() {
                    break;
                }
                let wanted = remaining[choice.index];
                let (item, backing) = if claimed.contains(wanted) {
                    audit.push(Decision::Conflict { round, family, wanted });
                    match decide(&Plurality, instance.family(family), &singletons(&open)) {
                        Some(again) => (open[again.index], again.winning_votes()),
                        None => continue,
                    }
                } else {
                    (wanted, choice.winning_votes())
                };
                claimed.insert(item);
                allocation.give(item, family);
                audit.push(Decision::Pick {
                    turn: round,
                    family,
                    item,
                    votes: backing,
                });
            }
            remaining.retain(|&i| !claimed.contains(i));
            round += 1;
        }
        allocation
    }
}

/// Gives each family the block of `partition` its plurality vote picks.
/// `None` when two families pick the same block.
pub fn envy_free_assignment(instance: &Instance, partition: &[Bundle]) -> Option<Allocation> {
    let mut allocation = Allocation::empty(instance.family_count());
    let mut picked = vec![false; partition.len()];
    for (family, fam) in instance.families().iter().enumerate() {
        let choice = decide(&Plurality, fam, partition)?;
        if picked[choice.index] {
            return None;
        }
        picked[choice.index] = true;
        allocation.bundles[family] = partition[choice.index];
    }
    Some(allocation)
}

/// Like [`envy_free_assignment`] with one partial partition per family:
/// family `i` votes on `vertices[i]`, the picked indices must be distinct,
/// and each family receives the union of its index across all vertices.
pub fn ef2_assignment(instance: &Instance, vertices: &[Vec<Bundle>]) -> Option<Allocation> {
    debug_assert_eq!(vertices.len(), instance.family_count(), "One vertex per family.");
    let mut picks = Vec::with_capacity(vertices.len());
    for (fam, vertex) in instance.families().iter().zip(vertices) {
        let index = decide(&Plurality, fam, vertex)?.index;
        if picks.contains(&index) {
            return None;
        }
        picks.push(index);
    }
    let bundles = picks
        .iter()
        .map(|&index| {
            vertices
                .iter()
                .filter_map(|vertex| vertex.get(index))
                .fold(Bundle::new(), |acc, &block| acc.union(block))
        })
        .collect();
    Some(Allocation::new(bundles))
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    // Items w, x, y, z are 0, 1, 2, 3.
    fn family(name: &str, members: &[&[Item]]) -> FamilySpec {
        FamilySpec::new(
            name,
            Criterion::OneOfBestC(2),
            members.iter().map(|items| AgentSpec::approval(items, 1)).collect(),
        )
    }

    #[test]
    fn test_rounds_groups_example() {
        let outcome = PluralityRounds.run(&RWAV_INSTANCE, None).unwrap();
        assert_eq!(outcome.allocation.bundles, bundles(&[&[0, 1], &[2, 3]]));
        assert_eq!(outcome.ratio, Share::new(7, 10));
        // Both families want z in the second round and family 1 goes first.
        assert!(outcome.audit.iter().any(|d| *d
            == Decision::Conflict {
                round: 1,
                family: 0,
                wanted: 3
            }));
    }

    #[test]
    fn test_rounds_three_families() {
        let families = vec![
            family("A", &[&[0, 1]]),
            family("B", &[&[0, 2]]),
            family("C", &[&[0, 3]]),
        ];
        let instance = Instance::new(4, families).unwrap();
        let outcome = PluralityRounds.run(&instance, None).unwrap();
        // All want w; A has precedence, B and C vote again. B goes first in
        // the second round.
        assert_eq!(outcome.allocation.bundles, bundles(&[&[0], &[1, 2], &[3]]));
        assert_eq!(
            outcome.audit.iter().filter(|d| matches!(d, Decision::Conflict { .. })).count(),
            2
        );
    }

    #[test]
    fn test_envy_free_assignment() {
        let f1 = family("Family 1", &[&[0, 1], &[0, 1, 2], &[2, 3]]);
        let f2 = family("Family 2", &[&[0, 1], &[1, 2, 3], &[2, 3]]);
        let partition = bundles(&[&[0, 1], &[2, 3]]);

        let instance = Instance::new(4, vec![f1.clone(), f2.clone()]).unwrap();
        let allocation = envy_free_assignment(&instance, &partition).unwrap();
        assert_eq!(allocation.bundles, bundles(&[&[0, 1], &[2, 3]]));

        let instance = Instance::new(4, vec![f2, f1.clone()]).unwrap();
        let allocation = envy_free_assignment(&instance, &partition).unwrap();
        assert_eq!(allocation.bundles, bundles(&[&[2, 3], &[0, 1]]));

        let instance = Instance::new(4, vec![f1.clone(), f1]).unwrap();
        assert_eq!(envy_free_assignment(&instance, &partition), None);
    }

    #[test]
    fn test_ef2_assignment() {
        let f1 = family("Family 1", &[&[0, 1], &[0, 2, 3], &[2, 3]]);
        let f2 = family("Family 2", &[&[0, 1], &[1, 2], &[2, 3]]);
        let partition1 = bundles(&[&[0], &[2, 3]]);
        let partition2 = bundles(&[&[0, 1], &[3]]);

        let instance = Instance::new(4, vec![f1.clone(), f2]).unwrap();
        let allocation = ef2_assignment(&instance, &[partition1.clone(), partition2]).unwrap();
        assert_eq!(allocation.bundles, bundles(&[&[2, 3], &[0, 1]]));

        let instance = Instance::new(4, vec![f1.clone(), f1]).unwrap();
        assert_eq!(ef2_assignment(&instance, &[partition1.clone(), partition1]), None);
    }
}
