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

use data::core::dice::Hand;
use proptest::prelude::*;
use rules::scoring::evaluate::evaluate;
use rules::scoring::selection::validate_keep;

fn hand(values: &[u8]) -> Hand {
    Hand::try_from_values(values).unwrap()
}

#[test]
fn scoring_table() {
    assert_eq!(evaluate(&hand(&[1, 1, 1, 1, 1])).points, 5000);
    assert_eq!(evaluate(&hand(&[6, 6, 6, 6, 6])).points, 6000);
    assert_eq!(evaluate(&hand(&[1, 2, 3, 4, 5])).points, 1500);
    assert_eq!(evaluate(&hand(&[2, 3, 4, 5, 6])).points, 1500);
    assert_eq!(evaluate(&hand(&[1, 2, 3, 4, 6])).points, 100);
    assert_eq!(evaluate(&hand(&[3, 3, 3, 2, 4])).points, 300);
    assert_eq!(evaluate(&hand(&[3, 3, 3, 2, 4])).remaining.sorted(), hand(&[2, 4]));
    assert_eq!(evaluate(&hand(&[1, 1, 1, 5])).points, 350);
    assert!(evaluate(&hand(&[1, 1, 1, 5])).remaining.is_empty());
    assert_eq!(evaluate(&hand(&[4, 4, 4, 4])).points, 800);
    assert_eq!(evaluate(&hand(&[2, 3, 4, 5])).points, 750);
}

#[test]
fn hands_without_scoring_shapes_bust() {
    for values in [
        vec![2u8, 2, 3, 4, 6],
        vec![2, 3, 4, 6, 6],
        vec![2, 2, 4, 4, 6],
        vec![3, 4, 6],
        vec![2],
    ] {
        let result = evaluate(&hand(&values));
        assert_eq!(result.points, 0, "{values:?} should bust");
        assert!(result.consumed.is_empty());
    }
}

#[test]
fn consumed_and_remaining_partition_the_hand() {
    for values in [
        vec![1u8, 2, 3, 4, 6],
        vec![3, 3, 3, 2, 4],
        vec![4, 4, 4, 4, 2],
        vec![1, 3, 4, 5, 6],
        vec![5, 5, 2, 6, 6],
    ] {
        let input = hand(&values);
        let result = evaluate(&input);
        let mut rebuilt = result.consumed.clone();
        rebuilt.extend(&result.remaining);
        assert_eq!(rebuilt.sorted(), input.sorted(), "partition broken for {values:?}");
    }
}

proptest! {
    /// Evaluating a hand's consumed subset reproduces the score exactly and
    /// leaves nothing over.
    #[test]
    fn consumed_subset_is_idempotent(values in prop::collection::vec(1u8..=6, 1..=5)) {
        let input = Hand::try_from_values(&values).unwrap();
        let first = evaluate(&input);
        let second = evaluate(&first.consumed);
        prop_assert_eq!(second.points, first.points);
        prop_assert!(second.remaining.is_empty());
    }

    /// Any nonempty consumed subset is accepted as a keep of its own roll.
    #[test]
    fn consumed_subset_is_a_legal_keep(values in prop::collection::vec(1u8..=6, 1..=5)) {
        let roll = Hand::try_from_values(&values).unwrap();
        let result = evaluate(&roll);
        if !result.consumed.is_empty() {
            let validated = validate_keep(&roll, &result.consumed);
            prop_assert!(validated.is_ok());
            let validated = validated.unwrap();
            prop_assert_eq!(validated.points, result.points);
            prop_assert!(validated.remaining.is_empty());
        }
    }

    /// The breakdown always sums to the total.
    #[test]
    fn breakdown_sums_to_total(values in prop::collection::vec(1u8..=6, 1..=5)) {
        let result = evaluate(&Hand::try_from_values(&values).unwrap());
        let sum: u32 = result.breakdown.iter().map(|item| item.points).sum();
        prop_assert_eq!(sum, result.points);
    }

    /// Evaluation never invents or loses dice.
    #[test]
    fn evaluation_preserves_the_bag(values in prop::collection::vec(1u8..=6, 1..=5)) {
        let input = Hand::try_from_values(&values).unwrap();
        let result = evaluate(&input);
        let mut rebuilt = result.consumed.clone();
        rebuilt.extend(&result.remaining);
        prop_assert_eq!(rebuilt.sorted(), input.sorted());
    }
}
