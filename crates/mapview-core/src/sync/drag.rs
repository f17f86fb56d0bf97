// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::{DateTime, Utc};

use crate::geo::Coordinate;

/// Exclusive edit window for one waypoint during a pointer drag.
///
/// While a session exists, remote updates for `index` are dropped. Remote
/// updates for every other index still apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub index: usize,
    /// Where the waypoint was when the gesture started.
    pub original: Coordinate,
    /// Latest pointer position.
    pub current: Coordinate,
    pub started_at: DateTime<Utc>,
}

impl DragSession {
    #[must_use]
    pub fn new(index: usize, original: Coordinate) -> Self {
        Self {
            index,
            original,
            current: original,
            started_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn covers(&self, index: usize) -> bool {
        self.index == index
    }

    #[must_use]
    pub fn has_moved(&self) -> bool {
        self.current != self.original
    }
}
