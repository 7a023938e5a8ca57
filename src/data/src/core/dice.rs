// Copyright © greedhall 2024-present
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The number of dice a player holds at the start of a turn.
pub const DICE_PER_TURN: u8 = 5;

/// One face of a six-sided die, in 1..=6.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Face(u8);

impl Face {
    pub const ONE: Face = Face(1);
    pub const FIVE: Face = Face(5);

    /// Creates a face, returning `None` for values outside 1..=6.
    pub fn new(value: u8) -> Option<Self> {
        (1..=6).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// All six faces in ascending order.
    pub fn all() -> impl Iterator<Item = Face> {
        (1..=6).map(Face)
    }
}

impl TryFrom<u8> for Face {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Face::new(value).ok_or_else(|| format!("invalid die face {value}"))
    }
}

impl From<Face> for u8 {
    fn from(value: Face) -> Self {
        value.0
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Count of dice showing each face, indexed by face value.
///
/// Working with counts instead of ordered dice makes every multiset question
/// (sub-bag, difference, n-of-a-kind, straights) a per-face comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaceCounts([u8; 6]);

impl FaceCounts {
    pub fn count(&self, face: Face) -> u8 {
        self.0[(face.value() - 1) as usize]
    }

    pub fn total(&self) -> u8 {
        self.0.iter().sum()
    }

    /// Number of distinct faces present.
    pub fn distinct(&self) -> u8 {
        self.0.iter().filter(|&&c| c > 0).count() as u8
    }

    /// Highest face with at least `n` copies, if any.
    pub fn highest_with_at_least(&self, n: u8) -> Option<Face> {
        Face::all().filter(|&f| self.count(f) >= n).max()
    }

    /// True if every face in `low..=high` appears at least once.
    pub fn contains_run(&self, low: u8, high: u8) -> bool {
        (low..=high).all(|v| self.0[(v - 1) as usize] >= 1)
    }

    /// True if `other` can be removed from this bag face-by-face.
    pub fn contains(&self, other: &FaceCounts) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a >= b)
    }
}

/// A bag of 1–5 die faces. Order is preserved for display and for
/// index-based selection, but all scoring treats the hand as a multiset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand(Vec<Face>);

impl Hand {
    pub fn new(faces: Vec<Face>) -> Self {
        Self(faces)
    }

    /// Builds a hand from raw values, returning `None` if any is not a valid
    /// face.
    pub fn try_from_values(values: &[u8]) -> Option<Self> {
        values.iter().map(|&v| Face::new(v)).collect::<Option<Vec<_>>>().map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn faces(&self) -> &[Face] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Face> + '_ {
        self.0.iter().copied()
    }

    pub fn push(&mut self, face: Face) {
        self.0.push(face);
    }

    pub fn extend(&mut self, other: &Hand) {
        self.0.extend_from_slice(&other.0);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn counts(&self) -> FaceCounts {
        let mut counts = [0u8; 6];
        for face in &self.0 {
            counts[(face.value() - 1) as usize] += 1;
        }
        FaceCounts(counts)
    }

    /// True if `other` is a sub-bag of this hand.
    pub fn contains_sub_bag(&self, other: &Hand) -> bool {
        self.counts().contains(&other.counts())
    }

    /// Multiset difference: this hand with one copy of each die in `other`
    /// removed. Callers must ensure `other` is a sub-bag.
    pub fn minus(&self, other: &Hand) -> Hand {
        let mut remaining = other.counts();
        let mut result = Vec::with_capacity(self.0.len());
        for &face in &self.0 {
            if remaining.count(face) > 0 {
                remaining.0[(face.value() - 1) as usize] -= 1;
            } else {
                result.push(face);
            }
        }
        Hand(result)
    }

    /// A copy of this hand with faces in ascending order.
    pub fn sorted(&self) -> Hand {
        let mut faces = self.0.clone();
        faces.sort();
        Hand(faces)
    }
}

impl FromIterator<Face> for Hand {
    fn from_iter<T: IntoIterator<Item = Face>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for face in &self.0 {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{face}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(values: &[u8]) -> Hand {
        Hand::try_from_values(values).unwrap()
    }

    #[test]
    fn rejects_invalid_faces() {
        assert!(Face::new(0).is_none());
        assert!(Face::new(7).is_none());
        assert!(Hand::try_from_values(&[1, 2, 9]).is_none());
    }

    #[test]
    fn sub_bag_and_difference() {
        let roll = hand(&[1, 1, 5, 3, 3]);
        let keep = hand(&[1, 5]);
        assert!(roll.contains_sub_bag(&keep));
        assert!(!roll.contains_sub_bag(&hand(&[1, 1, 1])));
        assert_eq!(roll.minus(&keep), hand(&[1, 3, 3]));
    }

    #[test]
    fn counts_and_runs() {
        let counts = hand(&[2, 3, 4, 5, 5]).counts();
        assert_eq!(counts.count(Face::FIVE), 2);
        assert!(counts.contains_run(2, 5));
        assert!(!counts.contains_run(1, 4));
        assert_eq!(counts.highest_with_at_least(2), Some(Face::FIVE));
    }
}
