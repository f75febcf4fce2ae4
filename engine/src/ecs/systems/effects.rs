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

use crate::ecs::components::{ActiveEffects, TimedEffect};
use crate::ecs::events::{EventBus, GameEvent};
use crate::ecs::{EcsEntity, GameWorld};
use crate::gameplay::{
    AttributeSet, DurationType, EffectApplication, EffectError, GameplayEffect, SourceId,
};

/// Applies effects to entities and expires duration effects
pub struct EffectSystem {
    event_bus: EventBus,
}

impl EffectSystem {
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }

    /// Apply `effect` to `entity`'s attribute set on behalf of `source`
    pub fn apply(
        &self,
        world: &mut GameWorld,
        entity: EcsEntity,
        effect: &GameplayEffect,
        source: SourceId,
    ) -> Result<EffectApplication, EffectError> {
        effect.validate()?;
        let application = {
            let mut attributes = world
                .get::<&mut AttributeSet>(entity)
                .map_err(|_| EffectError::NoAttributeSet)?;
            match effect.duration_type() {
                DurationType::Duration => attributes.attach_modifiers(effect, source),
                _ => attributes.apply_effect(effect, source)?,
            }
        };

        if effect.duration_type() == DurationType::Duration {
            let timer = TimedEffect {
                source,
                remaining: effect.duration(),
                application: application.clone(),
            };
            let added = match world.get::<&mut ActiveEffects>(entity) {
                Ok(mut active) => {
                    active.add(timer.clone());
                    true
                }
                Err(_) => false,
            };
            if !added {
                let mut active = ActiveEffects::new();
                active.add(timer);
                if let Err(e) = world.insert_one(entity, active) {
                    tracing::warn!("Failed to track timers on {:?}: {}", entity, e);
                }
            }
            tracing::debug!(
                "Effect {} on {:?} expires in {}s",
                source,
                entity,
                effect.duration()
            );
        }

        if !application.skipped.is_empty() {
            tracing::debug!(
                "Effect {} skipped unregistered attributes {:?}",
                source,
                application.skipped
            );
        }

        self.event_bus.publish(GameEvent::EffectApplied {
            pawn: entity,
            source,
            duration_type: effect.duration_type(),
        });
        Ok(application)
    }

    /// Advance duration timers, removing the modifiers of expired effects
    pub fn update(&self, world: &mut GameWorld, delta: f64) -> usize {
        let mut expired_count = 0;
        for (entity, active, attributes) in
            world.query_mut::<(hecs::Entity, &mut ActiveEffects, &mut AttributeSet)>()
        {
            for expired in active.tick(delta) {
                attributes.remove_application(&expired.application);
                tracing::debug!("Effect {} on {:?} expired", expired.source, entity);
                self.event_bus.publish(GameEvent::EffectExpired {
                    pawn: entity,
                    source: expired.source,
                });
                expired_count += 1;
            }
        }
        expired_count
    }

    /// Remove every modifier and timer `source` placed on `entity`
    pub fn remove_source(
        &self,
        world: &mut GameWorld,
        entity: EcsEntity,
        source: SourceId,
    ) -> usize {
        if let Ok(mut active) = world.get::<&mut ActiveEffects>(entity) {
            active.remove_source(source);
        }
        match world.get::<&mut AttributeSet>(entity) {
            Ok(mut attributes) => attributes.remove_modifiers_by_source(source),
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::{FOLLOW_SPEED, HEALTH, ModifierOp};

    fn pawn(world: &mut GameWorld) -> EcsEntity {
        world.spawn((
            AttributeSet::with_defaults([(HEALTH, 100.0), (FOLLOW_SPEED, 10.0)]),
            ActiveEffects::new(),
        ))
    }

    fn current(world: &GameWorld, entity: EcsEntity, name: &str) -> f64 {
        world.get::<&AttributeSet>(entity).unwrap().current(name)
    }

    #[test]
    fn test_duration_effect_expires() {
        let bus = EventBus::new();
        let system = EffectSystem::new(bus.clone());
        let mut world = GameWorld::new();
        let entity = pawn(&mut world);
        let slow = GameplayEffect::timed(1.0)
            .unwrap()
            .with(FOLLOW_SPEED, 0.5, ModifierOp::Multiply);
        let source = SourceId::new();

        system.apply(&mut world, entity, &slow, source).unwrap();
        assert_eq!(current(&world, entity, FOLLOW_SPEED), 5.0);

        assert_eq!(system.update(&mut world, 0.6), 0);
        assert_eq!(current(&world, entity, FOLLOW_SPEED), 5.0);

        assert_eq!(system.update(&mut world, 0.6), 1);
        assert_eq!(current(&world, entity, FOLLOW_SPEED), 10.0);
        assert!(world.get::<&ActiveEffects>(entity).unwrap().is_empty());

        assert_eq!(
            bus.process_events(),
            vec![
                GameEvent::EffectApplied {
                    pawn: entity,
                    source,
                    duration_type: DurationType::Duration,
                },
                GameEvent::EffectExpired {
                    pawn: entity,
                    source
                },
            ]
        );
    }

    #[test]
    fn test_overlapping_durations_from_one_source() {
        let system = EffectSystem::new(EventBus::new());
        let mut world = GameWorld::new();
        let entity = pawn(&mut world);
        let source = SourceId::new();

        let short = GameplayEffect::timed(1.0)
            .unwrap()
            .with(HEALTH, 10.0, ModifierOp::Add);
        let long = GameplayEffect::timed(2.0)
            .unwrap()
            .with(HEALTH, 20.0, ModifierOp::Add);
        system.apply(&mut world, entity, &short, source).unwrap();
        system.apply(&mut world, entity, &long, source).unwrap();
        assert_eq!(current(&world, entity, HEALTH), 130.0);

        system.update(&mut world, 1.5);
        assert_eq!(current(&world, entity, HEALTH), 120.0);
        system.update(&mut world, 1.0);
        assert_eq!(current(&world, entity, HEALTH), 100.0);
    }

    #[test]
    fn test_instant_and_infinite_pass_through() {
        let system = EffectSystem::new(EventBus::new());
        let mut world = GameWorld::new();
        let entity = pawn(&mut world);
        let source = SourceId::new();

        let damage = GameplayEffect::instant().with(HEALTH, -30.0, ModifierOp::Add);
        system.apply(&mut world, entity, &damage, source).unwrap();
        let halve = GameplayEffect::infinite().with(HEALTH, 0.5, ModifierOp::Multiply);
        system.apply(&mut world, entity, &halve, source).unwrap();
        assert_eq!(current(&world, entity, HEALTH), 35.0);

        system.update(&mut world, 100.0);
        assert_eq!(current(&world, entity, HEALTH), 35.0);

        assert_eq!(system.remove_source(&mut world, entity, source), 1);
        assert_eq!(current(&world, entity, HEALTH), 70.0);
    }

    #[test]
    fn test_remove_source_cancels_timer() {
        let system = EffectSystem::new(EventBus::new());
        let mut world = GameWorld::new();
        let entity = pawn(&mut world);
        let source = SourceId::new();
        let buff = GameplayEffect::timed(5.0)
            .unwrap()
            .with(HEALTH, 10.0, ModifierOp::Add);

        system.apply(&mut world, entity, &buff, source).unwrap();
        system.remove_source(&mut world, entity, source);

        assert_eq!(current(&world, entity, HEALTH), 100.0);
        assert!(world.get::<&ActiveEffects>(entity).unwrap().is_empty());
        assert_eq!(system.update(&mut world, 10.0), 0);
    }

    #[test]
    fn test_missing_attribute_set() {
        let system = EffectSystem::new(EventBus::new());
        let mut world = GameWorld::new();
        let entity = world.spawn(());
        assert_eq!(
            system.apply(&mut world, entity, &GameplayEffect::instant(), SourceId::new()),
            Err(EffectError::NoAttributeSet)
        );
    }

    #[test]
    fn test_timer_component_added_on_demand() {
        let system = EffectSystem::new(EventBus::new());
        let mut world = GameWorld::new();
        let entity = world.spawn((AttributeSet::with_defaults([(HEALTH, 100.0)]),));
        let buff = GameplayEffect::timed(1.0)
            .unwrap()
            .with(HEALTH, 10.0, ModifierOp::Add);

        system.apply(&mut world, entity, &buff, SourceId::new()).unwrap();
        assert_eq!(world.get::<&ActiveEffects>(entity).unwrap().len(), 1);
        system.update(&mut world, 1.0);
        assert_eq!(current(&world, entity, HEALTH), 100.0);
    }
}
