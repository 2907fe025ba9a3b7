use std::cmp::max;

use super::*;

/// Enumerates the partitions of `0..len` into exactly `size` non-empty blocks.
///
/// Partitions are produced as restricted growth strings: `blocks[i]` is the
/// block of element `i`, and the first element of every block is smaller than
/// the first element of the next one. Element `0` is always in block `0`.
#[derive(Clone, Debug)]
pub struct SetPartitions {
    blocks: Vec<usize>,
    /// `used[i]` is the number of blocks opened by elements `0..i`.
    used: Vec<usize>,
    size: usize,
    first_unvalid: usize,
    exhausted: bool,
}

impl SetPartitions {
    pub fn new(len: usize, size: usize) -> Self {
        SetPartitions {
            blocks: vec![0; len],
            used: vec![0; len + 1],
            size,
            first_unvalid: 0,
            exhausted: len == 0 || size == 0 || size > len,
        }
    }

    fn advance(&mut self) -> bool {
        let len = self.blocks.len();
        let mut el = std::cmp::min(self.first_unvalid, len - 1);
        loop {
            if el == len {
                return true;
            }
            let potential = self.used[el] + (len - el);
            let bot = if potential > self.size { 0 } else { self.used[el] };
            let top = if self.used[el] < self.size { self.used[el] } else { self.used[el] - 1 };
            let block = if el < self.first_unvalid {
                max(self.blocks[el] + 1, bot)
            } else {
                self.first_unvalid += 1;
                bot
            };
            if block <= top {
                self.blocks[el] = block;
                self.used[el + 1] = max(self.used[el], block + 1);
                el += 1;
            } else {
                self.first_unvalid = el;
                if el == 0 {
                    return false;
                }
                el -= 1;
            }
        }
    }

    /// Advances to the next partition and lends it out.
    pub fn next_lending(&mut self) -> Option<&[usize]> {
        if self.exhausted {
            return None;
        }
        if self.advance() {
            Some(&self.blocks)
        } else {
            self.exhausted = true;
            None
        }
    }
}

impl Iterator for SetPartitions {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_lending().map(|blocks| blocks.to_vec())
    }
}

/// Enumerates every assignment of `item_count` items to `family_count`
/// families in lexicographic order, the last item changing fastest.
#[derive(Clone, Debug)]
pub struct Assignments {
    owners: Vec<FamilyId>,
    family_count: usize,
    started: bool,
    exhausted: bool,
}

impl Assignments {
    pub fn new(item_count: usize, family_count: usize) -> Self {
        Assignments {
            owners: vec![0; item_count],
            family_count,
            started: false,
            exhausted: family_count == 0,
        }
    }

    pub fn next_lending(&mut self) -> Option<&[FamilyId]> {
        if self.exhausted {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(&self.owners);
        }
        for pos in (0..self.owners.len()).rev() {
            if self.owners[pos] + 1 < self.family_count {
                self.owners[pos] += 1;
                return Some(&self.owners);
            }
            self.owners[pos] = 0;
        }
        self.exhausted = true;
        None
    }
}

impl Iterator for Assignments {
    type Item = Vec<FamilyId>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_lending().map(|owners| owners.to_vec())
    }
}

/// Enumerates the permutations of `0..len` in lexicographic order, starting
/// with the identity. Each one is produced in place from the previous one.
#[derive(Clone, Debug)]
pub struct Permutations {
    current: Vec<usize>,
    started: bool,
    exhausted: bool,
}

impl Permutations {
    pub fn new(len: usize) -> Self {
        Permutations {
            current: (0..len).collect(),
            started: false,
            exhausted: false,
        }
    }

    pub fn next_lending(&mut self) -> Option<&[usize]> {
        if self.exhausted {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(&self.current);
        }
        let len = self.current.len();
        let Some(i) = (1..len).rev().find(|&i| self.current[i - 1] < self.current[i]) else {
            self.exhausted = true;
            return None;
        };
        let pivot = i - 1;
        let j = (i..len).rev().find(|&j| self.current[j] > self.current[pivot]).unwrap_or(i);
        self.current.swap(pivot, j);
        self.current[i..].reverse();
        Some(&self.current)
    }
}

impl Iterator for Permutations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_lending().map(|perm| perm.to_vec())
    }
}

/// Sums of `values` over each block of a partition with `size` blocks.
pub(crate) fn block_sums(values: &[Weight], blocks: &[usize], size: usize) -> Vec<Weight> {
    let mut sums = vec![0; size];
    for (&v, &b) in values.iter().zip(blocks) {
        sums[b] += v;
    }
    sums
}
