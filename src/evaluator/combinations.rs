use crate::cards::CLAIM_SIZE;

/// Iterator over all C(n, 3) index triples in lexicographic order.
pub struct Triples {
    n: usize,
    indices: [usize; CLAIM_SIZE],
    done: bool,
}

impl Triples {
    pub fn new(n: usize) -> Self {
        Self { n, indices: [0, 1, 2], done: n < CLAIM_SIZE }
    }
}

impl Iterator for Triples {
    type Item = [usize; CLAIM_SIZE];

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.indices;

        // Find rightmost index that can be incremented
        let mut i = CLAIM_SIZE - 1;
        loop {
            if self.indices[i] < self.n - (CLAIM_SIZE - i) {
                self.indices[i] += 1;
                // Reset all indices to the right
                for j in (i + 1)..CLAIM_SIZE {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                break;
            }

            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_choose_three_yields_ten_unique_triples() {
        let all: Vec<_> = Triples::new(5).collect();
        assert_eq!(all.len(), 10);
        assert_eq!(all[0], [0, 1, 2]);
        assert_eq!(all[9], [2, 3, 4]);
        for t in &all {
            assert!(t[0] < t[1] && t[1] < t[2]);
        }
    }

    #[test]
    fn fewer_than_three_yields_nothing() {
        assert_eq!(Triples::new(0).count(), 0);
        assert_eq!(Triples::new(2).count(), 0);
        assert_eq!(Triples::new(3).count(), 1);
    }

    #[test]
    fn twelve_choose_three() {
        assert_eq!(Triples::new(12).count(), 220);
    }
}
