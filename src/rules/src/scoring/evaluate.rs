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

use data::core::dice::{Face, FaceCounts, Hand};
use data::core::numerics::Points;

/// One line of a score explanation. The breakdown always sums to the
/// evaluation's total and is deterministic for a given hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakdownItem {
    pub description: String,
    pub points: Points,
    pub faces: Vec<Face>,
}

/// Result of evaluating a hand: the points earned, exactly which dice earn
/// them, and which dice are dead.
///
/// `consumed` and `remaining` partition the input hand as multisets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResult {
    pub points: Points,
    pub consumed: Hand,
    pub remaining: Hand,
    pub breakdown: Vec<BreakdownItem>,
}

impl ScoreResult {
    /// A hand with no scoring shape. Applied to a fresh roll this is a
    /// bust.
    fn none(hand: &Hand) -> Self {
        Self {
            points: 0,
            consumed: Hand::default(),
            remaining: hand.clone(),
            breakdown: Vec::new(),
        }
    }

    pub fn is_bust(&self) -> bool {
        self.points == 0
    }
}

/// Evaluates a hand against the scoring table.
///
/// Exactly one scoring shape is recognized per evaluation, in fixed
/// precedence order: five of a kind, large straight, four of a kind, small
/// straight, three of a kind, then loose 1s and 5s. Where a shape admits
/// more than one face, the highest qualifying face wins. After four of a
/// kind, a small straight, or a triple, loose 1s and 5s also score; other
/// leftover dice go to `remaining`.
pub fn evaluate(hand: &Hand) -> ScoreResult {
    let counts = hand.counts();
    five_of_a_kind(hand, &counts)
        .or_else(|| large_straight(hand, &counts))
        .or_else(|| four_of_a_kind(hand, &counts))
        .or_else(|| small_straight(hand, &counts))
        .or_else(|| three_of_a_kind(hand, &counts))
        .unwrap_or_else(|| singles(hand))
}

fn five_of_a_kind(hand: &Hand, counts: &FaceCounts) -> Option<ScoreResult> {
    if hand.len() != 5 {
        return None;
    }
    let face = counts.highest_with_at_least(5)?;
    // Five 1s outscore the 1000-per-pip rule.
    let points = if face == Face::ONE { 5000 } else { 1000 * face.value() as Points };
    let consumed = hand.clone();
    Some(ScoreResult {
        points,
        breakdown: vec![BreakdownItem {
            description: format!("five {face}s"),
            points,
            faces: consumed.faces().to_vec(),
        }],
        consumed,
        remaining: Hand::default(),
    })
}

fn large_straight(hand: &Hand, counts: &FaceCounts) -> Option<ScoreResult> {
    if hand.len() != 5 {
        return None;
    }
    if !counts.contains_run(1, 5) && !counts.contains_run(2, 6) {
        return None;
    }
    let consumed = hand.sorted();
    Some(ScoreResult {
        points: 1500,
        breakdown: vec![BreakdownItem {
            description: "large straight".to_string(),
            points: 1500,
            faces: consumed.faces().to_vec(),
        }],
        consumed,
        remaining: Hand::default(),
    })
}

fn four_of_a_kind(hand: &Hand, counts: &FaceCounts) -> Option<ScoreResult> {
    let face = counts.highest_with_at_least(4)?;
    let points = 200 * face.value() as Points;
    let consumed: Hand = std::iter::repeat(face).take(4).collect();
    let item = BreakdownItem {
        description: format!("four {face}s"),
        points,
        faces: consumed.faces().to_vec(),
    };
    Some(with_residual_singles(hand, consumed, points, item))
}

/// A run of four consecutive faces. Only recognized when every die outside
/// the run is a loose 1 or 5: a dead die voids the straight and the hand
/// falls through to the later shapes.
fn small_straight(hand: &Hand, counts: &FaceCounts) -> Option<ScoreResult> {
    let (low, high) = [(3u8, 6u8), (2, 5), (1, 4)]
        .into_iter()
        .find(|&(low, high)| counts.contains_run(low, high))?;
    let consumed: Hand = (low..=high).filter_map(Face::new).collect();
    let rest = hand.minus(&consumed);
    if rest.iter().any(|f| f != Face::ONE && f != Face::FIVE) {
        return None;
    }
    let item = BreakdownItem {
        description: "small straight".to_string(),
        points: 750,
        faces: consumed.faces().to_vec(),
    };
    Some(with_residual_singles(hand, consumed, 750, item))
}

fn three_of_a_kind(hand: &Hand, counts: &FaceCounts) -> Option<ScoreResult> {
    let face = counts.highest_with_at_least(3)?;
    let points = if face == Face::ONE { 300 } else { 100 * face.value() as Points };
    let consumed: Hand = std::iter::repeat(face).take(3).collect();
    let item = BreakdownItem {
        description: format!("three {face}s"),
        points,
        faces: consumed.faces().to_vec(),
    };
    Some(with_residual_singles(hand, consumed, points, item))
}

fn singles(hand: &Hand) -> ScoreResult {
    let result = with_residual_singles(hand, Hand::default(), 0, BreakdownItem {
        description: String::new(),
        points: 0,
        faces: Vec::new(),
    });
    if result.points == 0 {
        ScoreResult::none(hand)
    } else {
        result
    }
}

/// Extends a shape with the loose 1s and 5s left over after consuming it.
fn with_residual_singles(
    hand: &Hand,
    mut consumed: Hand,
    mut points: Points,
    shape_item: BreakdownItem,
) -> ScoreResult {
    let mut breakdown = Vec::new();
    if shape_item.points > 0 {
        breakdown.push(shape_item);
    }

    let rest = hand.minus(&consumed);
    let mut remaining = Hand::default();
    let mut ones = 0u32;
    let mut fives = 0u32;
    for face in rest.iter() {
        if face == Face::ONE {
            ones += 1;
            consumed.push(face);
        } else if face == Face::FIVE {
            fives += 1;
            consumed.push(face);
        } else {
            remaining.push(face);
        }
    }

    if ones > 0 {
        points += 100 * ones;
        breakdown.push(BreakdownItem {
            description: if ones == 1 {
                "single 1".to_string()
            } else {
                format!("{ones} single 1s")
            },
            points: 100 * ones,
            faces: std::iter::repeat(Face::ONE).take(ones as usize).collect(),
        });
    }
    if fives > 0 {
        points += 50 * fives;
        breakdown.push(BreakdownItem {
            description: if fives == 1 {
                "single 5".to_string()
            } else {
                format!("{fives} single 5s")
            },
            points: 50 * fives,
            faces: std::iter::repeat(Face::FIVE).take(fives as usize).collect(),
        });
    }

    ScoreResult { points, consumed, remaining, breakdown }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(values: &[u8]) -> Hand {
        Hand::try_from_values(values).unwrap()
    }

    fn points(values: &[u8]) -> Points {
        evaluate(&hand(values)).points
    }

    #[test]
    fn five_of_a_kind_scores_per_pip_with_special_ones() {
        assert_eq!(points(&[1, 1, 1, 1, 1]), 5000);
        assert_eq!(points(&[6, 6, 6, 6, 6]), 6000);
        assert_eq!(points(&[2, 2, 2, 2, 2]), 2000);
    }

    #[test]
    fn straights() {
        assert_eq!(points(&[1, 2, 3, 4, 5]), 1500);
        assert_eq!(points(&[2, 3, 4, 5, 6]), 1500);
        assert_eq!(points(&[2, 3, 4, 5]), 750);
        // A loose 1 rides along with a 3-4-5-6 run.
        assert_eq!(points(&[1, 3, 4, 5, 6]), 850);
        // A dead die voids the straight; only the single 1 scores.
        assert_eq!(points(&[1, 2, 3, 4, 6]), 100);
    }

    #[test]
    fn triples_and_quads() {
        let result = evaluate(&hand(&[3, 3, 3, 2, 4]));
        assert_eq!(result.points, 300);
        assert_eq!(result.remaining.sorted(), hand(&[2, 4]));
        assert_eq!(points(&[4, 4, 4, 4]), 800);
        assert_eq!(points(&[1, 1, 1, 5]), 350);
        assert_eq!(evaluate(&hand(&[1, 1, 1, 5])).remaining, Hand::default());
    }

    #[test]
    fn loose_singles_and_busts() {
        assert_eq!(points(&[1, 5]), 150);
        assert_eq!(points(&[5, 5]), 100);
        assert_eq!(points(&[2, 2, 3, 4, 6]), 0);
        assert_eq!(points(&[2, 3, 4]), 0);
        assert_eq!(points(&[6]), 0);
    }

    #[test]
    fn hot_dice_keep_scores_everything() {
        let result = evaluate(&hand(&[1, 1, 1, 5, 5]));
        assert_eq!(result.points, 400);
        assert_eq!(result.remaining, Hand::default());
        assert_eq!(result.consumed.len(), 5);
    }

    #[test]
    fn breakdown_sums_to_points() {
        for values in [
            vec![1u8, 1, 1, 5, 5],
            vec![3, 3, 3, 1, 5],
            vec![1, 3, 4, 5, 6],
            vec![4, 4, 4, 4, 1],
            vec![1, 2, 3, 4, 5],
        ] {
            let result = evaluate(&hand(&values));
            let total: Points = result.breakdown.iter().map(|item| item.points).sum();
            assert_eq!(total, result.points, "breakdown mismatch for {values:?}");
        }
    }
}
