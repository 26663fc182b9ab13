mod tree;

use std::{cmp::Ordering, iter::FusedIterator, marker::PhantomData};

use crate::{orderer::Orderer, run::Run};

use self::tree::{TreeNode, Winner};

/// A k-way merge over sorted runs, implemented as a loser tree.
///
/// Every internal node remembers the run that lost the match played there,
/// so advancing the winning run only requires replaying the matches on the path
/// from its leaf to the root: one comparison per level, `O(log R)` per element.
///
/// Ties are resolved in favour of the run with the lower index.
///
/// invariants:
/// the winner must always point to the run whose
/// head is the smallest element.
pub struct LazyMerger<T, R, O> {
    loser_indices: Vec<u32>,
    runs: Vec<R>,
    orderer: O,
    phantom: PhantomData<T>,
    winner: Winner,
    remaining_runs: usize,
}

fn compare_winners<T>(
    runs: &[impl Run<T>],
    orderer: &impl Orderer<T>,
    left: Winner,
    right: Winner,
) -> Ordering {
    let by_index = left.idx.cmp(&right.idx);
    match (runs[left.idx as usize].peek(), runs[right.idx as usize].peek()) {
        (Some(l), Some(r)) => orderer.compare(l, r).then(by_index),
        // exhausted runs lose against everything
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => by_index,
    }
}

/// Plays the initial tournament bottom up, recording the loser at every internal node.
/// Returns the overall winner.
fn build_tree(
    loser_indices: &mut Vec<u32>,
    num_runs: usize,
    mut compare: impl FnMut(Winner, Winner) -> Ordering,
) -> Winner {
    let num_internal_nodes = num_runs.saturating_sub(1);
    loser_indices.clear();
    loser_indices.resize(num_internal_nodes, 0);
    if num_internal_nodes == 0 {
        return Winner { idx: 0 };
    }

    let mut winners = vec![Winner { idx: 0 }; num_internal_nodes];
    for idx in (0..num_internal_nodes).rev() {
        let node = TreeNode { idx };
        let [left, right] = [node.left(), node.right()].map(|child| {
            // a leaf competes with its own run, an internal node with the winner below it
            match child.as_leaf(num_runs) {
                Some(leaf) => leaf,
                None => winners[child.idx],
            }
        });
        let (winner, loser) = if compare(left, right).is_le() {
            (left, right)
        } else {
            (right, left)
        };
        loser_indices[idx] = loser.idx;
        winners[idx] = winner;
    }
    winners[TreeNode::root().idx]
}

impl<T, R, O> LazyMerger<T, R, O>
where
    R: Run<T>,
    O: Orderer<T>,
{
    /// Constructs a new merger over the given runs.
    /// The runs must already be sorted according to the orderer.
    pub fn new(runs: Vec<R>, orderer: O) -> Self {
        let mut result = Self {
            loser_indices: Vec::new(),
            remaining_runs: runs.len(),
            runs,
            orderer,
            winner: Winner { idx: 0 },
            phantom: PhantomData,
        };

        result.winner = result.rebuild_tree();

        result
    }

    /// the number of runs that still have elements
    pub fn active_runs(&self) -> usize {
        self.remaining_runs
    }

    /// advances the internal state
    /// Once this method returns None, it will never yield any elements again.
    pub fn next(&mut self) -> Option<T> {
        if self.runs.len() <= 1 {
            let value = self.runs.first_mut()?.next();
            if value.is_none() {
                // drop the exhausted run
                self.runs.clear();
                self.remaining_runs = 0;
            }
            return value;
        }

        let winning_run = &mut self.runs[self.winner.idx as usize];
        // the winner only runs dry if all runs did.
        let winning_value = winning_run.next()?;
        let run_exhausted = winning_run.peek().is_none();

        self.winner = if run_exhausted {
            self.remove_winner(self.winner)
        } else {
            self.replay_matches(self.winner)
        };

        Some(winning_value)
    }

    /// drops exhausted runs and plays the tournament from scratch.
    /// returns the new winner.
    fn rebuild_tree(&mut self) -> Winner {
        self.runs.retain(|r| r.peek().is_some());
        self.remaining_runs = self.runs.len();
        tracing::debug!(runs = self.runs.len(), "building merge tree");

        let runs = &self.runs;
        let orderer = &self.orderer;
        build_tree(&mut self.loser_indices, runs.len(), |left, right| {
            compare_winners(runs, orderer, left, right)
        })
    }

    /// replay the matches from the previous winner back up to the root.
    /// this must be applied to the tree after the winner was modified.
    fn replay_matches(&mut self, previous_winner: Winner) -> Winner {
        let mut winner = previous_winner;
        let mut current_node = TreeNode::leaf(previous_winner, self.runs.len());
        while !current_node.is_root() {
            current_node = current_node.parent();
            let challenger = Winner {
                idx: self.loser_indices[current_node.idx],
            };
            if compare_winners(&self.runs, &self.orderer, challenger, winner).is_lt() {
                // the challenger won, it moves on and the previous winner stays here
                self.loser_indices[current_node.idx] = winner.idx;
                winner = challenger;
            }
        }
        winner
    }

    /// Removes the exhausted winner.
    /// The tree is only rebuilt once half of its runs are exhausted,
    /// until then an exhausted run simply loses every match it is part of.
    fn remove_winner(&mut self, previous_winner: Winner) -> Winner {
        self.remaining_runs -= 1;
        if self.remaining_runs <= self.runs.len() / 2 {
            self.rebuild_tree()
        } else {
            self.replay_matches(previous_winner)
        }
    }
}

impl<T, R, O> Iterator for LazyMerger<T, R, O>
where
    R: Run<T>,
    O: Orderer<T>,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.runs.iter().map(|r| r.size_hint()).fold(
            (0, Some(0)),
            |(lower, upper), (run_lower, run_upper)| {
                (
                    lower.saturating_add(run_lower),
                    upper.zip(run_upper).and_then(|(a, b)| a.checked_add(b)),
                )
            },
        )
    }
}

impl<T, R, O> FusedIterator for LazyMerger<T, R, O>
where
    R: Run<T>,
    O: Orderer<T>,
{
}

#[cfg(test)]
mod test {

    use crate::{
        orderer::{FuncOrderer, OrdOrderer, Orderer},
        run::PeekedRun,
    };

    use super::{build_tree, LazyMerger, Winner};

    fn merge<T: Ord + Clone>(runs: &[Vec<T>]) -> Vec<T> {
        let peeked = runs
            .iter()
            .cloned()
            .map(|run| PeekedRun::new(run.into_iter()))
            .collect();
        LazyMerger::new(peeked, OrdOrderer::new()).collect()
    }

    fn run_merge_test(runs: Vec<Vec<u32>>) {
        let result = merge(&runs);

        let mut expected: Vec<_> = runs.iter().flatten().cloned().collect();
        expected.sort();

        if expected != result {
            for run in &runs {
                println!("run: {run:?}");
            }
        }
        assert_eq!(expected, result);
    }

    #[test]
    fn test_merge_runs() {
        let run_1 = vec![1, 3, 5, 7];
        let run_4 = vec![0, 2, 4, 6];
        let run_3 = vec![8, 10, 12, 14];
        let run_2 = vec![9, 11, 13, 15];

        run_merge_test(vec![run_1, run_2, run_3, run_4]);
    }

    #[test]
    fn test_merge_unbalanced() {
        run_merge_test(vec![vec![1, 4], vec![2, 3], vec![5, 6, 7]]);
    }

    #[test]
    fn test_merge_with_empty_runs() {
        run_merge_test(vec![vec![], vec![3], vec![], vec![1, 2]]);
        run_merge_test(vec![vec![], vec![]]);
        run_merge_test(vec![]);
    }

    #[test]
    fn test_merge_scenario() {
        run_merge_test(vec![vec![5, 8], vec![1, 4], vec![2, 3]]);
    }

    #[test]
    fn test_ties_go_to_lower_run() {
        let runs = vec![
            vec![(1, 'a'), (2, 'a')],
            vec![(1, 'b'), (2, 'b')],
            vec![(0, 'c'), (1, 'c')],
        ];
        let peeked = runs
            .into_iter()
            .map(|run| PeekedRun::new(run.into_iter()))
            .collect();
        let by_number = FuncOrderer::new(|a: &(u8, char), b: &(u8, char)| a.0.cmp(&b.0));
        let merged: Vec<_> = LazyMerger::new(peeked, by_number).collect();
        assert_eq!(
            vec![(0, 'c'), (1, 'a'), (1, 'b'), (1, 'c'), (2, 'a'), (2, 'b')],
            merged
        );
    }

    #[test]
    fn test_size_hint_and_active_runs() {
        let peeked = vec![vec![1, 2], vec![3]]
            .into_iter()
            .map(|run| PeekedRun::new(run.into_iter()))
            .collect();
        let mut merger = LazyMerger::new(peeked, OrdOrderer::new());
        assert_eq!((3, Some(3)), merger.size_hint());
        assert_eq!(2, merger.active_runs());
        assert_eq!(Some(1), merger.next());
        assert_eq!(Some(2), merger.next());
        assert_eq!(1, merger.active_runs());
        assert_eq!(Some(3), merger.next());
        assert_eq!(None, merger.next());
        assert_eq!(None, merger.next());
        assert_eq!(0, merger.active_runs());
        assert_eq!((0, Some(0)), merger.size_hint());
    }

    fn assert_winner(heads: &[i64]) {
        let orderer = OrdOrderer::new();
        let min_value = *heads.iter().min().unwrap();
        let mut tree = Vec::new();
        let winner = build_tree(&mut tree, heads.len(), |a: Winner, b: Winner| {
            orderer
                .compare(&heads[a.idx as usize], &heads[b.idx as usize])
                .then(a.idx.cmp(&b.idx))
        });
        assert_eq!(min_value, heads[winner.idx as usize]);
        // the first minimum wins
        assert_eq!(
            heads.iter().position(|h| *h == min_value),
            Some(winner.idx as usize)
        );
        assert_eq!(heads.len() - 1, tree.len());
        for loser in tree {
            assert!(min_value <= heads[loser as usize]);
        }
    }

    #[test]
    fn test_construct_tree() {
        for r in 1..64 {
            assert_winner(&vec![0; r]);
            let mut heads = (0..r as i64).collect::<Vec<_>>();
            assert_winner(&heads);
            let mut reversed = heads.clone();
            reversed.reverse();
            assert_winner(&reversed);
            reversed.append(&mut heads);
            assert_winner(&reversed);
        }
    }

    #[cfg(not(miri))]
    // the only reason this is disabled on miri is that it would run too slowly
    mod random {
        use std::sync::{Arc, Mutex};

        use rand::{rngs::ThreadRng, Rng};

        use super::run_merge_test;

        fn generate_run(rng: &mut ThreadRng, len: usize) -> Vec<u32> {
            // a narrow value range provokes plenty of ties
            let mut run: Vec<u32> = (0..len).map(|_| rng.gen_range(0..64)).collect();
            run.sort();
            run
        }

        #[test]
        fn test_merge_runs_random() {
            let params = (1..100).flat_map(move |runs| {
                (0..20).flat_map(move |items| (1..5).map(move |_| (runs, items)))
            });

            let params = Arc::new(Mutex::new(params));

            let threads: Vec<_> = (0..num_cpus::get())
                .map(|_| {
                    let params = params.clone();
                    std::thread::spawn(move || {
                        let mut rng = rand::thread_rng();
                        loop {
                            let next = params.lock().unwrap().next();
                            if let Some((num_runs, max_items)) = next {
                                let runs: Vec<_> = core::iter::repeat_with(|| {
                                    let len = rng.gen_range(0..=max_items);
                                    generate_run(&mut rng, len)
                                })
                                .take(num_runs)
                                .collect();
                                run_merge_test(runs);
                            } else {
                                break;
                            }
                        }
                    })
                })
                .collect();

            threads.into_iter().for_each(|t| t.join().unwrap());
        }
    }
}
