/// Identifies a run by its position in the merger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Winner {
    pub idx: u32,
}

/// This is a wrapper around the indices of the implicit array tree.
///
/// A tree over `n` runs has `n - 1` internal nodes stored at `0..n-1`,
/// followed by the leaves at `n-1..2n-1`. With that layout every internal node
/// has exactly two children, whatever the number of runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    pub idx: usize,
}

impl TreeNode {
    pub fn root() -> Self {
        Self { idx: 0 }
    }
    pub fn left(self) -> Self {
        Self {
            idx: self.idx * 2 + 1,
        }
    }
    pub fn right(self) -> Self {
        Self {
            idx: self.idx * 2 + 2,
        }
    }
    pub fn parent(self) -> Self {
        Self {
            idx: self.idx.saturating_sub(1) / 2,
        }
    }
    pub fn is_root(&self) -> bool {
        self.idx == 0
    }

    /// the leaf node holding the given run.
    pub fn leaf(run: Winner, num_runs: usize) -> Self {
        Self {
            idx: num_runs - 1 + run.idx as usize,
        }
    }

    /// the run held by this node, if it is a leaf
    pub fn as_leaf(self, num_runs: usize) -> Option<Winner> {
        let idx = self.idx.checked_sub(num_runs - 1)?;
        Some(Winner { idx: idx as u32 })
    }
}
