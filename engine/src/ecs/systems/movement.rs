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

use crate::ecs::components::{Authority, DragInput, DragState, Position};
use crate::ecs::{EcsEntity, GameWorld};
use crate::gameplay::{AttributeSet, FOLLOW_SPEED};
use pitlane_common::{ParticipantId, Vec2};

/// Moves locally owned pawns towards their drag target
#[derive(Debug, Clone, Copy)]
pub struct MovementSystem {
    local: ParticipantId,
}

impl MovementSystem {
    pub fn new(local: ParticipantId) -> Self {
        Self { local }
    }

    /// Feed pointer input to a pawn's drag state
    pub fn drag(&self, world: &mut GameWorld, pawn: EcsEntity, input: DragInput) -> bool {
        let position = match world.get::<&Position>(pawn) {
            Ok(position) => position.0,
            Err(_) => return false,
        };
        match world.get::<&mut DragState>(pawn) {
            Ok(mut drag) => {
                drag.apply(position, input);
                true
            }
            Err(_) => false,
        }
    }

    /// Step every dragged pawn this participant has authority over
    ///
    /// Returns the entities that moved with their new positions.
    pub fn update(&self, world: &mut GameWorld, delta: f64) -> Vec<(EcsEntity, Vec2)> {
        let mut moved = Vec::new();
        for (entity, authority, drag, position, attributes) in world.query_mut::<(
            hecs::Entity,
            &Authority,
            &DragState,
            &mut Position,
            &AttributeSet,
        )>() {
            if !authority.is(self.local) {
                continue;
            }
            let Some(target) = drag.target() else {
                continue;
            };
            let speed = attributes.try_current(FOLLOW_SPEED).unwrap_or_default();
            position.0 = position.0.lerp(target, delta * speed);
            tracing::trace!("Pawn {:?} moved to {:?}", entity, position.0);
            moved.push((entity, position.0));
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::HEALTH;

    fn spawn(world: &mut GameWorld, authority: ParticipantId, speed: f64) -> EcsEntity {
        world.spawn((
            Authority(authority),
            DragState::new(),
            Position(Vec2::ZERO),
            AttributeSet::with_defaults([(FOLLOW_SPEED, speed), (HEALTH, 100.0)]),
        ))
    }

    #[test]
    fn test_dragged_pawn_follows_pointer() {
        let system = MovementSystem::new(ParticipantId::SERVER);
        let mut world = GameWorld::new();
        let pawn = spawn(&mut world, ParticipantId::SERVER, 4.0);

        assert!(system.drag(&mut world, pawn, DragInput::Press(Vec2::ZERO)));
        assert!(system.drag(&mut world, pawn, DragInput::Move(Vec2::new(10.0, 0.0))));

        // Half way at a weight of 0.125 * 4
        let moved = system.update(&mut world, 0.125);
        assert_eq!(moved, vec![(pawn, Vec2::new(5.0, 0.0))]);
        assert_eq!(world.get::<&Position>(pawn).unwrap().0, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_released_pawn_stays() {
        let system = MovementSystem::new(ParticipantId::SERVER);
        let mut world = GameWorld::new();
        let pawn = spawn(&mut world, ParticipantId::SERVER, 10.0);

        system.drag(&mut world, pawn, DragInput::Press(Vec2::ZERO));
        system.drag(&mut world, pawn, DragInput::Move(Vec2::new(10.0, 0.0)));
        system.drag(&mut world, pawn, DragInput::Release);

        assert!(system.update(&mut world, 0.05).is_empty());
        assert_eq!(world.get::<&Position>(pawn).unwrap().0, Vec2::ZERO);
    }

    #[test]
    fn test_remote_pawns_are_not_moved() {
        let system = MovementSystem::new(ParticipantId::SERVER);
        let mut world = GameWorld::new();
        let pawn = spawn(&mut world, ParticipantId::new(2), 10.0);

        system.drag(&mut world, pawn, DragInput::Press(Vec2::ZERO));
        system.drag(&mut world, pawn, DragInput::Move(Vec2::new(10.0, 0.0)));

        assert!(system.update(&mut world, 0.05).is_empty());
    }

    #[test]
    fn test_drag_on_missing_entity() {
        let system = MovementSystem::new(ParticipantId::SERVER);
        let mut world = GameWorld::new();
        let entity = world.spawn(());
        assert!(!system.drag(&mut world, entity, DragInput::Release));
    }
}
