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

/// Score points. All scoring values in this game are multiples of 50.
pub type Points = u32;

/// Milliseconds since the Unix epoch, as reported by the server clock.
///
/// The server clock is authoritative; clients receive it in timer broadcasts
/// and compute their own offset.
pub type UnixMillis = u64;
