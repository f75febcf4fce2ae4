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

//! Presentation binding
//!
//! Widgets never read engine state on their own. Controller-bound widgets
//! are told when their controller possesses a pawn and subscribe to that
//! pawn's attributes.

use crate::ecs::components::Controller;
use crate::ecs::events::GameEvent;
use crate::ecs::{EcsEntity, GameWorld};
use crate::gameplay::{AttributeSet, HEALTH, SubscriptionId};
use std::sync::{Arc, Mutex, PoisonError};

/// Health ratio below which the readout is drawn as critical
pub const CRITICAL_HEALTH_RATIO: f64 = 0.2;

pub trait Widget: Send {
    fn name(&self) -> &str;

    fn on_add_to_viewport(&mut self) {}

    /// Release anything the widget holds in the world
    fn on_remove(&mut self, _world: &mut GameWorld) {}
}

/// Widget that follows whatever its controller possesses
pub trait ControllerWidget: Widget {
    fn on_possessed(&mut self, world: &mut GameWorld, pawn: EcsEntity);
}

enum Slot {
    Plain(Box<dyn Widget>),
    Bound {
        controller: EcsEntity,
        widget: Box<dyn ControllerWidget>,
    },
}

impl Slot {
    fn name(&self) -> &str {
        match self {
            Slot::Plain(widget) => widget.name(),
            Slot::Bound { widget, .. } => widget.name(),
        }
    }
}

/// Hosts the widgets of one local player
#[derive(Default)]
pub struct HudManager {
    slots: Vec<Slot>,
}

impl HudManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_widget(&mut self, mut widget: Box<dyn Widget>) {
        widget.on_add_to_viewport();
        tracing::debug!("Added widget {}", widget.name());
        self.slots.push(Slot::Plain(widget));
    }

    /// Add a widget bound to `controller`, binding it at once if the
    /// controller already possesses a pawn
    pub fn add_controller_widget(
        &mut self,
        world: &mut GameWorld,
        controller: EcsEntity,
        mut widget: Box<dyn ControllerWidget>,
    ) {
        widget.on_add_to_viewport();
        let possessed = world
            .get::<&Controller>(controller)
            .ok()
            .and_then(|c| c.possessed());
        if let Some(pawn) = possessed {
            widget.on_possessed(world, pawn);
        }
        tracing::debug!("Added widget {} for controller {:?}", widget.name(), controller);
        self.slots.push(Slot::Bound { controller, widget });
    }

    pub fn remove_widget(&mut self, world: &mut GameWorld, name: &str) -> bool {
        let Some(index) = self.slots.iter().position(|slot| slot.name() == name) else {
            return false;
        };
        match self.slots.remove(index) {
            Slot::Plain(mut widget) => widget.on_remove(world),
            Slot::Bound { mut widget, .. } => widget.on_remove(world),
        }
        true
    }

    /// Forward engine events to interested widgets
    pub fn dispatch(&mut self, world: &mut GameWorld, event: &GameEvent) {
        if let GameEvent::Possessed { controller, pawn } = event {
            for slot in &mut self.slots {
                if let Slot::Bound {
                    controller: bound,
                    widget,
                } = slot
                {
                    if *bound == *controller {
                        widget.on_possessed(world, *pawn);
                    }
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl std::fmt::Debug for HudManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(Slot::name))
            .finish()
    }
}

/// Values shown by a [`HealthBar`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HealthReadout {
    pub current: f64,
    pub base: f64,
}

impl HealthReadout {
    pub fn label(&self) -> String {
        format!("{:.0} / {:.0}", self.current, self.base)
    }

    pub fn ratio(&self) -> f64 {
        if self.base > 0.0 {
            self.current / self.base
        } else {
            0.0
        }
    }

    pub fn is_critical(&self) -> bool {
        self.ratio() < CRITICAL_HEALTH_RATIO
    }
}

/// Shows the possessed pawn's health
#[derive(Debug, Default)]
pub struct HealthBar {
    readout: Arc<Mutex<HealthReadout>>,
    binding: Option<(EcsEntity, SubscriptionId)>,
}

impl HealthBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn readout(&self) -> HealthReadout {
        *self.readout.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Shared handle for displays that render the readout elsewhere
    pub fn readout_handle(&self) -> Arc<Mutex<HealthReadout>> {
        Arc::clone(&self.readout)
    }

    pub fn bound_pawn(&self) -> Option<EcsEntity> {
        self.binding.map(|(pawn, _)| pawn)
    }

    fn unbind(&mut self, world: &mut GameWorld) {
        if let Some((pawn, subscription)) = self.binding.take() {
            if let Ok(mut attributes) = world.get::<&mut AttributeSet>(pawn) {
                attributes.unsubscribe(HEALTH, subscription);
            }
        }
    }
}

impl Widget for HealthBar {
    fn name(&self) -> &str {
        "HealthBar"
    }

    fn on_remove(&mut self, world: &mut GameWorld) {
        self.unbind(world);
    }
}

impl ControllerWidget for HealthBar {
    fn on_possessed(&mut self, world: &mut GameWorld, pawn: EcsEntity) {
        self.unbind(world);

        let Ok(mut attributes) = world.get::<&mut AttributeSet>(pawn) else {
            tracing::warn!("Possessed pawn {:?} has no attributes", pawn);
            return;
        };
        let Ok(health) = attributes.get(HEALTH) else {
            return;
        };
        *self.readout.lock().unwrap_or_else(PoisonError::into_inner) = HealthReadout {
            current: health.current(),
            base: health.base(),
        };

        let readout = Arc::clone(&self.readout);
        if let Ok(subscription) = attributes.subscribe(HEALTH, move |change| {
            *readout.lock().unwrap_or_else(PoisonError::into_inner) = HealthReadout {
                current: change.current,
                base: change.base,
            };
        }) {
            self.binding = Some((pawn, subscription));
        }
    }
}
