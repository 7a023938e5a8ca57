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
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Confusable-free alphabet for room codes: no 0/O, 1/I/L.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Length of a room code.
pub const CODE_LENGTH: usize = 6;

/// How many fresh codes the lobby draws before giving up with
/// `CodeSpaceExhausted`.
pub const MAX_CODE_ATTEMPTS: usize = 10;

/// The short human-shareable key used to join a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Draws one candidate code uniformly from the code alphabet.
    ///
    /// Uniqueness is the lobby's concern: it retries against the store up to
    /// [MAX_CODE_ATTEMPTS] times.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let code = (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RoomCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        if normalized.len() != CODE_LENGTH
            || !normalized.bytes().all(|b| CODE_ALPHABET.contains(&b))
        {
            return Err(format!("invalid room code {s:?}"));
        }
        Ok(Self(normalized))
    }
}

impl TryFrom<String> for RoomCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoomCode> for String {
    fn from(value: RoomCode) -> Self {
        value.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    use super::*;

    #[test]
    fn generated_codes_use_the_alphabet() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(7);
        for _ in 0..100 {
            let code = RoomCode::generate(&mut rng);
            assert_eq!(code.as_str().len(), CODE_LENGTH);
            assert!(code.as_str().bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn parsing_normalizes_case_and_rejects_confusables() {
        assert_eq!("abcdef".parse::<RoomCode>().unwrap().as_str(), "ABCDEF");
        assert!("ABC0EF".parse::<RoomCode>().is_err());
        assert!("ABCDE".parse::<RoomCode>().is_err());
        assert!("ABCDEL".parse::<RoomCode>().is_err());
    }
}
