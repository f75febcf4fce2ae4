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

//! Attribute and effect integration tests

use pitlane_engine::ecs::GameWorld;
use pitlane_engine::ecs::components::{ActiveEffects, PawnTemplate};
use pitlane_engine::ecs::events::{EventBus, GameEvent};
use pitlane_engine::ecs::systems::EffectSystem;
use pitlane_engine::gameplay::*;
use std::sync::{Arc, Mutex};

fn recorder(set: &mut AttributeSet, name: &str) -> Arc<Mutex<Vec<AttributeChange>>> {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    set.subscribe(name, move |change| sink.lock().unwrap().push(*change))
        .unwrap();
    changes
}

#[test]
fn test_damage_then_weaken_then_recover() {
    let mut set = AttributeSet::with_defaults([(HEALTH, 100.0), (MAX_HEALTH, 100.0)]);
    let changes = recorder(&mut set, HEALTH);
    let hit = SourceId::new();
    let weakness = SourceId::new();

    let damage = GameplayEffect::instant().with(HEALTH, -30.0, ModifierOp::Add);
    set.apply_effect(&damage, hit).unwrap();
    assert_eq!(set.current(HEALTH), 70.0);

    let halve = GameplayEffect::infinite().with(HEALTH, 0.5, ModifierOp::Multiply);
    set.apply_effect(&halve, weakness).unwrap();
    assert_eq!(set.current(HEALTH), 35.0);
    assert_eq!(set.get(HEALTH).unwrap().base(), 70.0);

    assert_eq!(set.remove_modifiers_by_source(weakness), 1);
    assert_eq!(set.current(HEALTH), 70.0);

    // Instant effects leave nothing behind to remove
    assert_eq!(set.remove_modifiers_by_source(hit), 0);

    let currents: Vec<f64> = changes.lock().unwrap().iter().map(|c| c.current).collect();
    assert_eq!(currents, vec![70.0, 35.0, 70.0]);
    assert_eq!(set.current(MAX_HEALTH), 100.0);
}

#[test]
fn test_override_masks_other_modifiers_until_removed() {
    let mut set = PawnTemplate::default().build_attributes();
    let boost = SourceId::new();
    let freeze = SourceId::new();

    set.apply_effect(
        &GameplayEffect::infinite()
            .with(FOLLOW_SPEED, 5.0, ModifierOp::Add)
            .with(FOLLOW_SPEED, 2.0, ModifierOp::Multiply),
        boost,
    )
    .unwrap();
    assert_eq!(set.current(FOLLOW_SPEED), 30.0);

    set.apply_effect(
        &GameplayEffect::infinite().with(FOLLOW_SPEED, 0.0, ModifierOp::Override),
        freeze,
    )
    .unwrap();
    assert_eq!(set.current(FOLLOW_SPEED), 0.0);

    set.remove_modifiers_by_source(freeze);
    assert_eq!(set.current(FOLLOW_SPEED), 30.0);
}

#[test]
fn test_timed_effect_expires_through_effect_system() {
    let mut world = GameWorld::new();
    let event_bus = EventBus::new();
    let system = EffectSystem::new(event_bus.clone());
    let pawn = world.spawn((PawnTemplate::default().build_attributes(), ActiveEffects::default()));
    let source = SourceId::new();

    let slow = GameplayEffect::timed(1.0)
        .unwrap()
        .with(FOLLOW_SPEED, 0.5, ModifierOp::Multiply);
    system.apply(&mut world, pawn, &slow, source).unwrap();
    assert_eq!(world.get::<&AttributeSet>(pawn).unwrap().current(FOLLOW_SPEED), 5.0);

    assert_eq!(system.update(&mut world, 0.5), 0);
    assert_eq!(world.get::<&AttributeSet>(pawn).unwrap().current(FOLLOW_SPEED), 5.0);

    assert_eq!(system.update(&mut world, 0.5), 1);
    assert_eq!(world.get::<&AttributeSet>(pawn).unwrap().current(FOLLOW_SPEED), 10.0);
    assert!(!world.get::<&ActiveEffects>(pawn).unwrap().has_source(source));

    let events = event_bus.process_events();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        events[0],
        GameEvent::EffectApplied {
            duration_type: DurationType::Duration,
            ..
        }
    ));
    assert_eq!(events[1], GameEvent::EffectExpired { pawn, source });
}

#[test]
fn test_effect_on_entity_without_attributes() {
    let mut world = GameWorld::new();
    let system = EffectSystem::new(EventBus::new());
    let entity = world.spawn((ActiveEffects::default(),));

    let damage = GameplayEffect::instant().with(HEALTH, -10.0, ModifierOp::Add);
    assert_eq!(
        system.apply(&mut world, entity, &damage, SourceId::new()),
        Err(EffectError::NoAttributeSet)
    );
}
