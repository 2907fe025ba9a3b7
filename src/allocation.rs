use std::fmt;

use super::*;

/// A set of items, stored as a bit set.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bundle(u32);

impl Bundle {
    pub fn new() -> Self {
        Bundle(0)
    }

    /// The bundle `{0, .., item_count - 1}`.
    pub fn full(item_count: usize) -> Self {
        debug_assert!(item_count <= MAX_ITEMS, "Too many items.");
        if item_count == MAX_ITEMS { Bundle(u32::MAX) } else { Bundle((1u32 << item_count) - 1) }
    }

    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut bundle = Bundle::new();
        for item in items {
            bundle.insert(item);
        }
        bundle
    }

    pub fn from_bits(bits: u32) -> Self {
        Bundle(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn insert(&mut self, item: Item) {
        debug_assert!(item < MAX_ITEMS, "Item number out of range.");
        self.0 |= 1 << item;
    }

    pub fn remove(&mut self, item: Item) {
        debug_assert!(item < MAX_ITEMS, "Item number out of range.");
        self.0 &= !(1 << item);
    }

    pub fn contains(&self, item: Item) -> bool {
        item < MAX_ITEMS && self.0 & (1 << item) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn union(&self, other: Bundle) -> Bundle {
        Bundle(self.0 | other.0)
    }

    pub fn intersection(&self, other: Bundle) -> Bundle {
        Bundle(self.0 & other.0)
    }

    pub fn difference(&self, other: Bundle) -> Bundle {
        Bundle(self.0 & !other.0)
    }

    /// Items in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = Item> + use<> {
        let bits = self.0;
        (0..MAX_ITEMS).filter(move |&i| bits & (1 << i) != 0)
    }
}

impl fmt::Debug for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Item> for Bundle {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        Bundle::from_items(iter)
    }
}

/// One bundle per family, in family order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Allocation {
    pub bundles: Vec<Bundle>,
}

impl Allocation {
    pub fn new(bundles: Vec<Bundle>) -> Self {
        Allocation { bundles }
    }

    /// Every family gets an empty bundle.
    pub fn empty(family_count: usize) -> Self {
        Self::new(vec![Bundle::new(); family_count])
    }

    /// Builds the allocation where item `i` goes to family `owners[i]`.
    pub fn from_owners(owners: &[FamilyId], family_count: usize) -> Self {
        let mut allocation = Self::empty(family_count);
        for (item, &family) in owners.iter().enumerate() {
            debug_assert!(family < family_count, "Family number out of range.");
            allocation.bundles[family].insert(item);
        }
        allocation
    }

    pub fn family_count(&self) -> usize {
        self.bundles.len()
    }

    pub fn bundle(&self, family: FamilyId) -> Bundle {
        self.bundles[family]
    }

    /// The family holding `item`, if any.
    pub fn owner(&self, item: Item) -> Option<FamilyId> {
        self.bundles.iter().position(|b| b.contains(item))
    }

    /// Moves `item` into `family`'s bundle, taking it from whoever holds it.
    pub fn give(&mut self, item: Item, family: FamilyId) {
        for bundle in self.bundles.iter_mut() {
            bundle.remove(item);
        }
        self.bundles[family].insert(item);
    }

    /// Whether the bundles are pairwise disjoint and cover exactly the items
    /// `0..item_count`.
    pub fn is_partition(&self, item_count: usize) -> bool {
        let mut seen = Bundle::new();
        for bundle in &self.bundles {
            if !seen.intersection(*bundle).is_empty() {
                return false;
            }
            seen = seen.union(*bundle);
        }
        item_count <= MAX_ITEMS && seen == Bundle::full(item_count)
    }

    pub fn to_list(&self) -> Vec<Vec<Item>> {
        self.bundles.iter().map(|b| b.iter().collect()).collect()
    }
}

/// Whether `member` of `family` is satisfied with its family's bundle.
pub(crate) fn is_member_satisfied(instance: &Instance, allocation: &Allocation, family: FamilyId, member: usize) -> bool {
    instance
        .family(family)
        .is_satisfied(member, allocation.bundle(family), &allocation.bundles)
}

/// The fraction of `family`'s agents (counted with cardinality) that are
/// satisfied with the bundle the family receives.
pub fn realized_utility(instance: &Instance, allocation: &Allocation, family: FamilyId) -> Share {
    debug_assert_eq!(
        allocation.family_count(),
        instance.family_count(),
        "The allocation must have one bundle per family."
    );
    let fam = instance.family(family);
    let happy = fam.count_members_with(|m| is_member_satisfied(instance, allocation, family, m));
    Share::new(happy, fam.member_weight())
}

/// Realized utility of every family.
pub(crate) fn realized_utilities(instance: &Instance, allocation: &Allocation) -> Vec<Share> {
    instance
        .family_ids()
        .map(|f| realized_utility(instance, allocation, f))
        .collect()
}

/// The minimum realized utility over all families.
pub fn guarantee_ratio(instance: &Instance, allocation: &Allocation) -> Share {
    realized_utilities(instance, allocation)
        .into_iter()
        .min()
        .unwrap_or_else(|| Share::from_integer(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::LazyLock;

    // Items w, x, y, z are 0, 1, 2, 3.
    static INSTANCE1: LazyLock<Instance> = LazyLock::new(|| {
        Instance::new(
            4,
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
            ],
        )
        .unwrap()
    });

    #[test]
    fn test_bundle() {
        let mut b = Bundle::from_items([1, 3]);
        assert_eq!(b.len(), 2);
        assert!(b.contains(3));
        assert!(!b.contains(0));
        b.insert(0);
        b.remove(3);
        assert_eq!(b.iter().collect::<Vec<_>>(), [0, 1]);
        assert_eq!(Bundle::full(3), Bundle::from_items([0, 1, 2]));
        assert_eq!(Bundle::full(MAX_ITEMS).len(), MAX_ITEMS);
        assert!(Bundle::new().is_empty());
        assert_eq!(format!("{:?}", b), "{0, 1}");
    }

    #[test]
    fn test_is_partition() {
        assert!(Allocation::new(vec![Bundle::from_items([0, 2]), Bundle::from_items([1])]).is_partition(3));
        assert!(!Allocation::new(vec![Bundle::from_items([0, 2]), Bundle::from_items([1])]).is_partition(4));
        assert!(!Allocation::new(vec![Bundle::from_items([0, 1]), Bundle::from_items([1, 2])]).is_partition(3));
        assert!(!Allocation::new(vec![Bundle::from_items([0, 3]), Bundle::from_items([1, 2])]).is_partition(3));
        assert!(Allocation::from_owners(&[1, 0, 1], 2).is_partition(3));
    }

    #[test]
    fn test_give_and_owner() {
        let mut alloc = Allocation::from_owners(&[0, 0, 1], 2);
        assert_eq!(alloc.owner(1), Some(0));
        alloc.give(1, 1);
        assert_eq!(alloc.owner(1), Some(1));
        assert_eq!(alloc.to_list(), vec![vec![0], vec![1, 2]]);
        assert_eq!(alloc.owner(5), None);
    }

    #[test]
    fn test_realized_utility() {
        let alloc = Allocation::new(vec![Bundle::from_items([1, 3]), Bundle::from_items([0, 2])]);
        assert_eq!(realized_utility(&INSTANCE1, &alloc, 0), Share::from_integer(1));
        assert_eq!(realized_utility(&INSTANCE1, &alloc, 1), Share::from_integer(1));
        assert_eq!(guarantee_ratio(&INSTANCE1, &alloc), Share::from_integer(1));

        let alloc = Allocation::new(vec![Bundle::from_items([0]), Bundle::from_items([1, 2, 3])]);
        assert_eq!(realized_utility(&INSTANCE1, &alloc, 0), Share::new(1, 2));
        assert_eq!(realized_utility(&INSTANCE1, &alloc, 1), Share::from_integer(1));
        assert_eq!(guarantee_ratio(&INSTANCE1, &alloc), Share::new(1, 2));
    }
}
