use super::*;

/// The best allocation there is: every assignment of items to families is
/// evaluated and the first one with the highest guarantee ratio wins.
#[derive(Copy, Clone, Debug, Default)]
pub struct Exhaustive;

impl Protocol for Exhaustive {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Exhaustive
    }

    /// The maximum over all assignments does not depend on labels.
    fn is_symmetric(&self) -> bool {
        true
    }

    fn allocate(&self, instance: &Instance, _rng: Option<&mut StdRng>, audit: &mut AuditTrail) -> Allocation {
        let k = instance.family_count();
        let full = Share::from_integer(1);
        let mut assignments = Assignments::new(instance.item_count(), k);
        let mut best: Option<(Share, Allocation)> = None;
        let mut evaluated = 0;
        while let Some(owners) = assignments.next_lending() {
            evaluated += 1;
            let allocation = Allocation::from_owners(owners, k);
            let ratio = guarantee_ratio(instance, &allocation);
            if best.as_ref().is_none_or(|(r, _)| ratio > *r) {
                best = Some((ratio, allocation));
                if ratio == full {
                    break;
                }
            }
        }
        match best {
            Some((ratio, allocation)) => {
                audit.push(Decision::Optimum { evaluated, ratio });
                allocation
            }
            None => Allocation::empty(k),
        }
    }
}
