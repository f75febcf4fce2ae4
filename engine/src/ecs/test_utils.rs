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

use crate::ecs::components::PawnTemplate;
use crate::ecs::context::WorldContext;
use crate::ecs::events::EventBus;
use crate::ecs::systems::bind;
use crate::ecs::EcsEntity;
use crate::scene::HeadlessScene;
use pitlane_common::{EntityPath, ParticipantId, Vec2};

pub fn headless_context() -> WorldContext {
    WorldContext::new(Box::new(HeadlessScene::new()), PawnTemplate::default())
}

pub fn spawn_controller(context: &mut WorldContext, participant: ParticipantId) -> EcsEntity {
    context
        .spawn_controller(EntityPath::controller(participant), participant)
        .unwrap()
}

pub fn spawn_pawn(context: &mut WorldContext, participant: ParticipantId) -> EcsEntity {
    context
        .spawn_pawn(EntityPath::pawn(participant), participant, Vec2::ZERO)
        .unwrap()
}

/// Spawn a controller and pawn for `participant` and bind them
pub fn spawn_possessed(
    context: &mut WorldContext,
    participant: ParticipantId,
) -> (EcsEntity, EcsEntity) {
    let controller = spawn_controller(context, participant);
    let pawn = spawn_pawn(context, participant);
    bind(context.world_mut(), &EventBus::new(), controller, pawn).unwrap();
    (controller, pawn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Controller;

    #[test]
    fn test_spawn_possessed() {
        let mut context = headless_context();
        let (controller, pawn) = spawn_possessed(&mut context, ParticipantId::new(4));

        assert!(
            context
                .world()
                .get::<&Controller>(controller)
                .unwrap()
                .is_possessing(pawn)
        );
        assert_eq!(context.len(), 2);
    }
}
