//
// Copyright 2025-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use super::types::GameEvent;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared queue of game events, drained once per tick
pub struct EventBus {
    event_queue: Arc<RwLock<Vec<GameEvent>>>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            event_queue: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Publish an event to the queue
    pub fn publish(&self, event: GameEvent) {
        tracing::trace!("Queued {}", event.name());
        let mut queue = self
            .event_queue
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        queue.push(event);
    }

    /// Drain all queued events in publication order
    ///
    /// Events published while the caller handles the batch are queued for
    /// the next call.
    pub fn process_events(&self) -> Vec<GameEvent> {
        let mut queue = self
            .event_queue
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        queue.drain(..).collect()
    }

    /// Clear all queued events without processing
    pub fn clear(&self) {
        let mut queue = self
            .event_queue
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        queue.clear();
    }

    /// Get the number of queued events
    pub fn queue_len(&self) -> usize {
        let queue = self
            .event_queue
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        queue.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            event_queue: Arc::clone(&self.event_queue),
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("queued", &self.queue_len())
            .finish_non_exhaustive()
    }
}
