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

use std::collections::BTreeSet;

use data::core::dice::{Face, Hand};
use utils::outcome::{KeepError, Outcome};
use utils::{fail, verify};

use crate::scoring::evaluate::{evaluate, ScoreResult};

/// Four- and five-long runs a straight keep can build toward.
const STRAIGHT_WINDOWS: [(u8, u8); 5] = [(1, 4), (2, 5), (3, 6), (1, 5), (2, 6)];

/// Validates a candidate keep against the current roll.
///
/// A legal keep is a nonempty sub-bag of the roll in which every die
/// contributes to the score. Returns the keep's evaluation so callers do
/// not score it twice.
pub fn validate_keep(roll: &Hand, keep: &Hand) -> Outcome<ScoreResult> {
    verify!(!keep.is_empty(), KeepError::Empty);
    verify!(roll.contains_sub_bag(keep), KeepError::NotInRoll);
    let result = evaluate(keep);
    if result.points == 0 || !result.remaining.is_empty() {
        fail!(KeepError::NotScoring);
    }
    Ok(result)
}

/// Indices of the roll a client may toggle next, given its current
/// selection.
///
/// Selected indices are always toggleable (to deselect). An unselected
/// index is offered when adding it either strictly improves the selection's
/// score with no dead dice, or keeps the selection a coherent prefix of a
/// shape still completable from this roll (a straight being assembled one
/// die at a time, an n-of-a-kind of a face the roll holds three of, or a
/// run of loose 1s and 5s).
pub fn selectable_indices(roll: &Hand, selected: &[usize]) -> BTreeSet<usize> {
    let faces = roll.faces();
    let selected: BTreeSet<usize> = selected.iter().copied().filter(|&i| i < faces.len()).collect();
    let mut result = selected.clone();

    if selected.is_empty() {
        for (index, &face) in faces.iter().enumerate() {
            if starts_scoring_shape(roll, face) {
                result.insert(index);
            }
        }
        return result;
    }

    let selection: Hand = selected.iter().map(|&i| faces[i]).collect();
    let current = evaluate(&selection);
    for (index, &face) in faces.iter().enumerate() {
        if selected.contains(&index) {
            continue;
        }
        let mut candidate = selection.clone();
        candidate.push(face);
        let evaluated = evaluate(&candidate);
        let improves = evaluated.remaining.is_empty() && evaluated.points > current.points;
        if improves || is_shape_prefix(roll, &candidate) {
            result.insert(index);
        }
    }
    result
}

/// True if this die participates in at least one scoring shape of the roll.
fn starts_scoring_shape(roll: &Hand, face: Face) -> bool {
    if face == Face::ONE || face == Face::FIVE {
        return true;
    }
    let counts = roll.counts();
    if counts.count(face) >= 3 {
        return true;
    }
    STRAIGHT_WINDOWS.iter().any(|&(low, high)| {
        counts.contains_run(low, high) && (low..=high).contains(&face.value())
    })
}

/// True if the selection could still grow into a shape the roll can
/// complete.
fn is_shape_prefix(roll: &Hand, selection: &Hand) -> bool {
    // Loose 1s and 5s always score one by one.
    if selection.iter().all(|f| f == Face::ONE || f == Face::FIVE) {
        return true;
    }

    let counts = roll.counts();
    let selection_counts = selection.counts();

    // Building an n-of-a-kind of a face the roll holds at least three of.
    if selection_counts.distinct() == 1 {
        if let Some(face) = selection.iter().next() {
            if counts.count(face) >= 3 {
                return true;
            }
        }
    }

    // Building a straight: each value at most once, all inside a window the
    // roll fully contains.
    let distinct_selection = selection_counts.distinct() as usize == selection.len();
    distinct_selection
        && STRAIGHT_WINDOWS.iter().any(|&(low, high)| {
            counts.contains_run(low, high)
                && selection.iter().all(|f| (low..=high).contains(&f.value()))
        })
}

#[cfg(test)]
mod tests {
    use utils::outcome::GameError;

    use super::*;

    fn hand(values: &[u8]) -> Hand {
        Hand::try_from_values(values).unwrap()
    }

    #[test]
    fn keep_must_be_nonempty_subset_and_fully_scoring() {
        let roll = hand(&[1, 1, 5, 3, 3]);
        assert_eq!(
            validate_keep(&roll, &Hand::default()),
            Err(GameError::InvalidKeep(KeepError::Empty))
        );
        assert_eq!(
            validate_keep(&roll, &hand(&[1, 1, 1])),
            Err(GameError::InvalidKeep(KeepError::NotInRoll))
        );
        assert_eq!(
            validate_keep(&roll, &hand(&[1, 3])),
            Err(GameError::InvalidKeep(KeepError::NotScoring))
        );
        let result = validate_keep(&roll, &hand(&[1, 1, 5])).unwrap();
        assert_eq!(result.points, 250);
        assert!(result.remaining.is_empty());
    }

    #[test]
    fn every_validated_keep_has_no_remainder() {
        let roll = hand(&[1, 1, 1, 5, 5]);
        let result = validate_keep(&roll, &roll).unwrap();
        assert_eq!(result.points, 400);
        assert!(result.remaining.is_empty());
    }

    #[test]
    fn empty_selection_offers_only_scoring_dice() {
        let roll = hand(&[1, 2, 2, 5, 6]);
        let selectable = selectable_indices(&roll, &[]);
        // Only the 1 (index 0) and the 5 (index 3) participate in shapes.
        assert_eq!(selectable, BTreeSet::from([0, 3]));
    }

    #[test]
    fn empty_selection_offers_triples_and_straights() {
        let roll = hand(&[2, 2, 2, 3, 6]);
        assert_eq!(selectable_indices(&roll, &[]), BTreeSet::from([0, 1, 2]));

        let straight = hand(&[2, 3, 4, 5, 2]);
        // All straight members plus the 5 itself; the duplicate 2 is also a
        // straight member by face.
        assert_eq!(selectable_indices(&straight, &[]), BTreeSet::from([0, 1, 2, 3, 4]));
    }

    #[test]
    fn selected_indices_stay_toggleable() {
        let roll = hand(&[1, 2, 2, 5, 6]);
        let selectable = selectable_indices(&roll, &[0]);
        assert!(selectable.contains(&0));
        assert!(selectable.contains(&3));
        assert!(!selectable.contains(&4));
    }

    #[test]
    fn partial_triple_is_a_coherent_prefix() {
        let roll = hand(&[2, 2, 2, 3, 6]);
        // One 2 selected: the other 2s remain selectable toward the triple,
        // even though two 2s alone score nothing.
        let selectable = selectable_indices(&roll, &[0]);
        assert!(selectable.contains(&1));
        assert!(selectable.contains(&2));
        assert!(!selectable.contains(&3));
        assert!(!selectable.contains(&4));
    }

    #[test]
    fn straight_prefix_builds_one_die_at_a_time() {
        let roll = hand(&[2, 3, 4, 5, 6]);
        let selectable = selectable_indices(&roll, &[0, 1]);
        // 2-3 selected: 4, 5, 6 all extend a straight; no duplicates exist.
        assert_eq!(selectable, BTreeSet::from([0, 1, 2, 3, 4]));
    }

    #[test]
    fn dead_face_never_joins_a_loose_selection() {
        let roll = hand(&[1, 5, 6, 6, 3]);
        let selectable = selectable_indices(&roll, &[0, 1]);
        assert_eq!(selectable, BTreeSet::from([0, 1]));
    }
}
