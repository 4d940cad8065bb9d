use crate::types::Rank;

/// One rank's position in a binomial spanning tree.
///
/// Ranks are renumbered relative to the root (`rel = (rank - root) mod size`).
/// The parent of `rel` clears its lowest set bit; the children of `rel` are
/// `rel + 2^k` for every `2^k` below that bit. Children are listed with the
/// largest subtree first, so a broadcast starts the longest path first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastTree {
    pub parent: Option<Rank>,
    pub children: Vec<Rank>,
}

impl BroadcastTree {
    pub fn compute(size: u32, rank: Rank, root: Rank) -> Self {
        let size = u64::from(size);
        let root = u64::from(root);
        let rel = (u64::from(rank) + size - root) % size;
        let to_rank = |r: u64| ((r + root) % size) as Rank;

        let parent = (rel != 0).then(|| to_rank(rel & (rel - 1)));

        let span = if rel == 0 {
            size.next_power_of_two()
        } else {
            rel & rel.wrapping_neg()
        };
        let mut children = Vec::new();
        let mut step = span >> 1;
        while step > 0 {
            if rel + step < size {
                children.push(to_rank(rel + step));
            }
            step >>= 1;
        }

        Self { parent, children }
    }
}
