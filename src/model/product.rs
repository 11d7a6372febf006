// Mixed-radix enumeration of "one choice per family"
//
// Given family sizes (k0, k1, ...), yields every index tuple with
// i0 < k0, i1 < k1, ... in lexicographic order. The last position is the
// lowest-order digit: it advances first and carries towards position 0.
// Enumeration ends when position 0 overflows.

use std::iter::FusedIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fresh,
    Running,
    Done,
}

/// Restartable, finite iterator over mixed-radix index tuples
#[derive(Debug, Clone)]
pub struct MixedRadix {
    radices: Vec<usize>,
    current: Vec<usize>,
    state: State,
}

impl MixedRadix {
    pub fn new(radices: Vec<usize>) -> Self {
        Self {
            current: vec![0; radices.len()],
            radices,
            state: State::Fresh,
        }
    }

    /// Total number of tuples (one for an empty radix list, zero if any radix is zero)
    pub fn total(&self) -> u128 {
        self.radices.iter().map(|&r| r as u128).product()
    }

    /// Start over from the all-zeros tuple
    pub fn reset(&mut self) {
        self.current.iter_mut().for_each(|d| *d = 0);
        self.state = State::Fresh;
    }

    fn advance(&mut self) -> bool {
        for position in (0..self.radices.len()).rev() {
            self.current[position] += 1;
            if self.current[position] < self.radices[position] {
                return true;
            }
            self.current[position] = 0;
        }
        false
    }
}

impl Iterator for MixedRadix {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        match self.state {
            State::Fresh => {
                if self.radices.contains(&0) {
                    self.state = State::Done;
                    return None;
                }
                self.state = State::Running;
                Some(self.current.clone())
            }
            State::Running => {
                if self.advance() {
                    Some(self.current.clone())
                } else {
                    self.state = State::Done;
                    None
                }
            }
            State::Done => None,
        }
    }
}

impl FusedIterator for MixedRadix {}
