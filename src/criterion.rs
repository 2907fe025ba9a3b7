use std::fmt;
use std::str::FromStr;

use super::*;

/// When a single family member considers the family's bundle fair.
///
/// Shares are computed from the member's own valuation row and the number
/// of families `k`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Criterion {
    /// At least `1/k` of the member's total value.
    Proportional,
    /// At least `1/k` of the total value once the member's best `c` items
    /// are removed.
    ProportionalExcept(usize),
    /// At least the value of the member's `c`-th best item. For a binary
    /// member desiring at least `c` items this means one desired item.
    OneOfBestC(usize),
    /// At least the 1-of-`c` maximin share.
    MaximinShare(usize),
    /// No other bundle is worth more once its best `c` items are removed.
    EnvyFreeExcept(usize),
    /// No other bundle is worth more once any single item is removed (EFx).
    EnvyFreeExceptAny,
}

use Criterion::*;

impl Criterion {
    /// The member's share, or `None` for the envy-based criteria.
    pub fn share(&self, values: &[Weight], family_count: usize) -> Option<Share> {
        debug_assert!(family_count > 0, "There must be at least one family.");
        let k = family_count as u64;
        match *self {
            Proportional => Some(Share::new(values.iter().sum(), k)),
            ProportionalExcept(c) => {
                let all = Bundle::full(values.len());
                Some(Share::new(value_except_best(values, all, c), k))
            }
            OneOfBestC(c) => {
                if c == 0 {
                    return Some(Share::from_integer(0));
                }
                let mut sorted = values.to_vec();
                sorted.sort_unstable_by(|a, b| b.cmp(a));
                Some(Share::from_integer(sorted.get(c - 1).copied().unwrap_or(0)))
            }
            MaximinShare(c) => Some(Share::from_integer(maximin_share(values, c))),
            EnvyFreeExcept(_) | EnvyFreeExceptAny => None,
        }
    }

    /// Whether a member with valuation `values` is satisfied with `own`,
    /// given the bundles of all families (including `own`).
    pub fn is_satisfied(&self, values: &[Weight], own: Bundle, bundles: &[Bundle], family_count: usize) -> bool {
        self.is_satisfied_with(self.share(values, family_count), values, own, bundles)
    }

    /// [`Criterion::is_satisfied`] with the member's share already computed.
    pub(crate) fn is_satisfied_with(&self, share: Option<Share>, values: &[Weight], own: Bundle, bundles: &[Bundle]) -> bool {
        let own_value = value(values, own);
        match *self {
            EnvyFreeExcept(c) => bundles.iter().all(|&other| own_value >= value_except_best(values, other, c)),
            EnvyFreeExceptAny => bundles.iter().all(|&other| own_value >= value_except_worst(values, other)),
            _ => share.is_none_or(|share| Share::from_integer(own_value) >= share),
        }
    }

    /// How many desired items a binary member needs, when it desires
    /// `desired` items in total.
    pub fn target_count(&self, desired: usize, family_count: usize) -> usize {
        let k = family_count.max(1);
        match *self {
            Proportional => desired.div_ceil(k),
            ProportionalExcept(c) | EnvyFreeExcept(c) => desired.saturating_sub(c).div_ceil(k),
            EnvyFreeExceptAny => desired.saturating_sub(1).div_ceil(k),
            OneOfBestC(c) => usize::from(desired >= c && c > 0),
            MaximinShare(c) => {
                if c == 0 {
                    0
                } else {
                    desired / c
                }
            }
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proportional => write!(f, "proportional"),
            ProportionalExcept(c) => write!(f, "proportional-except-{}", c),
            OneOfBestC(c) => write!(f, "1-of-best-{}", c),
            MaximinShare(c) => write!(f, "1-of-{}-maximin-share", c),
            EnvyFreeExcept(c) => write!(f, "envy-free-except-{}", c),
            EnvyFreeExceptAny => write!(f, "envy-free-except-any"),
        }
    }
}

impl FromStr for Criterion {
    type Err = String;

    /// Parses the names printed by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number = |digits: &str| digits.parse::<usize>().map_err(|_| format!("invalid criterion `{}`", s));
        if s == "proportional" {
            Ok(Proportional)
        } else if let Some(c) = s.strip_prefix("proportional-except-") {
            Ok(ProportionalExcept(number(c)?))
        } else if let Some(c) = s.strip_prefix("1-of-best-") {
            Ok(OneOfBestC(number(c)?))
        } else if let Some(c) = s.strip_prefix("1-of-").and_then(|rest| rest.strip_suffix("-maximin-share")) {
            Ok(MaximinShare(number(c)?))
        } else if s == "envy-free-except-any" {
            Ok(EnvyFreeExceptAny)
        } else if let Some(c) = s.strip_prefix("envy-free-except-") {
            Ok(EnvyFreeExcept(number(c)?))
        } else {
            Err(format!("invalid criterion `{}`", s))
        }
    }
}

pub(crate) fn value(values: &[Weight], bundle: Bundle) -> Weight {
    bundle.iter().map(|item| values[item]).sum()
}

/// Value of `bundle` after removing its `c` most valuable items.
pub(crate) fn value_except_best(values: &[Weight], bundle: Bundle, c: usize) -> Weight {
    let mut sorted = bundle.iter().map(|item| values[item]).collect::<Vec<_>>();
    if sorted.len() <= c {
        return 0;
    }
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted[c..].iter().sum()
}

/// Value of `bundle` after removing its least valuable item; 0 for bundles
/// of at most one item.
pub(crate) fn value_except_worst(values: &[Weight], bundle: Bundle) -> Weight {
    match bundle.iter().map(|item| values[item]).min() {
        Some(worst) if bundle.len() > 1 => value(values, bundle) - worst,
        _ => 0,
    }
}

/// The 1-of-`c` maximin share: the best worst-bundle value over all
/// partitions of the items into `c` bundles.
pub(crate) fn maximin_share(values: &[Weight], c: usize) -> Weight {
    let mut partitions = SetPartitions::new(values.len(), c);
    let mut best = 0;
    while let Some(blocks) = partitions.next_lending() {
        let worst = partition::block_sums(values, blocks, c).into_iter().min().unwrap_or(0);
        best = best.max(worst);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDITIVE: [Weight; 4] = [0, 1, 2, 4];
    const BINARY: [Weight; 4] = [1, 1, 1, 0];

    #[test]
    fn test_value_except_best() {
        let values = [1, 2, 4];
        let all = Bundle::full(3);
        assert_eq!(value_except_best(&values, all, 1), 3);
        assert_eq!(value_except_best(&values, all, 2), 1);
        assert_eq!(value_except_best(&values, Bundle::from_items([0, 1]), 1), 1);
        assert_eq!(value_except_best(&values, Bundle::from_items([0, 1]), 2), 0);
        assert_eq!(value_except_best(&values, Bundle::from_items([0]), 1), 0);
        assert_eq!(value_except_best(&values, Bundle::new(), 1), 0);
    }

    #[test]
    fn test_maximin_share() {
        assert_eq!(maximin_share(&ADDITIVE, 4), 0);
        assert_eq!(maximin_share(&ADDITIVE, 3), 1);
        assert_eq!(maximin_share(&ADDITIVE, 2), 3);
        assert_eq!(maximin_share(&ADDITIVE, 5), 0);
        assert_eq!(maximin_share(&BINARY, 2), 1);
    }

    #[test]
    fn test_shares() {
        assert_eq!(Proportional.share(&ADDITIVE, 3), Some(Share::new(7, 3)));
        assert_eq!(ProportionalExcept(1).share(&ADDITIVE, 3), Some(Share::new(1, 1)));
        assert_eq!(OneOfBestC(2).share(&ADDITIVE, 2), Some(Share::from_integer(2)));
        assert_eq!(OneOfBestC(4).share(&BINARY, 2), Some(Share::from_integer(0)));
        assert_eq!(MaximinShare(2).share(&ADDITIVE, 2), Some(Share::from_integer(3)));
        assert_eq!(EnvyFreeExcept(1).share(&ADDITIVE, 2), None);
    }

    #[test]
    fn test_is_satisfied() {
        let y = Bundle::from_items([2]);
        let bundles = [y, Bundle::from_items([0]), Bundle::from_items([1]), Bundle::from_items([3])];
        assert!(Proportional.is_satisfied(&ADDITIVE, y, &bundles, 4));
        assert!(!Proportional.is_satisfied(&ADDITIVE, y, &bundles, 3));
        assert!(ProportionalExcept(2).is_satisfied(&ADDITIVE, y, &bundles, 3));
        assert!(!EnvyFreeExcept(0).is_satisfied(&ADDITIVE, y, &bundles, 4));

        let x = Bundle::from_items([1]);
        let yz = Bundle::from_items([2, 3]);
        assert!(EnvyFreeExcept(1).is_satisfied(&ADDITIVE, y, &[y, Bundle::from_items([1, 3])], 2));
        assert!(!EnvyFreeExcept(1).is_satisfied(&ADDITIVE, x, &[x, yz], 2));
    }

    #[test]
    fn test_envy_free_except_any() {
        let yz = Bundle::from_items([2, 3]);
        let xyz = Bundle::from_items([1, 2, 3]);
        assert_eq!(value_except_worst(&ADDITIVE, yz), 4);
        assert_eq!(value_except_worst(&ADDITIVE, xyz), 6);
        assert_eq!(value_except_worst(&ADDITIVE, Bundle::from_items([3])), 0);
        assert_eq!(value_except_worst(&ADDITIVE, Bundle::new()), 0);

        // {z} against {x, y}: removing x leaves 2 <= 4.
        let z = Bundle::from_items([3]);
        let xy = Bundle::from_items([1, 2]);
        assert!(EnvyFreeExceptAny.is_satisfied(&ADDITIVE, z, &[xy, z], 2));
        // {y} against {w, x, z}: removing w (worth 0) leaves 5 > 2, while EF1 holds.
        let y = Bundle::from_items([2]);
        let wxz = Bundle::from_items([0, 1, 3]);
        assert!(!EnvyFreeExceptAny.is_satisfied(&ADDITIVE, y, &[y, wxz], 2));
        assert!(EnvyFreeExcept(1).is_satisfied(&ADDITIVE, y, &[y, wxz], 2));
        assert_eq!(EnvyFreeExceptAny.share(&ADDITIVE, 2), None);
    }

    #[test]
    fn test_target_count() {
        assert_eq!(OneOfBestC(2).target_count(2, 2), 1);
        assert_eq!(OneOfBestC(2).target_count(1, 2), 0);
        assert_eq!(OneOfBestC(3).target_count(5, 3), 1);
        assert_eq!(MaximinShare(3).target_count(9, 3), 3);
        assert_eq!(MaximinShare(3).target_count(2, 3), 0);
        assert_eq!(Proportional.target_count(5, 2), 3);
        assert_eq!(ProportionalExcept(1).target_count(5, 2), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(OneOfBestC(2).to_string(), "1-of-best-2");
        assert_eq!(MaximinShare(3).to_string(), "1-of-3-maximin-share");
    }

    #[test]
    fn test_parse() {
        let all = [
            Proportional,
            ProportionalExcept(1),
            OneOfBestC(3),
            MaximinShare(2),
            EnvyFreeExcept(1),
            EnvyFreeExceptAny,
        ];
        for criterion in all {
            assert_eq!(criterion.to_string().parse::<Criterion>(), Ok(criterion));
        }
        assert!("1-of-best-".parse::<Criterion>().is_err());
        assert!("fair".parse::<Criterion>().is_err());
    }
}
