// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn apply(fleet: &Fleet, state: &FleetState, events: &[FleetEvent]) -> FleetState {
    events.iter().fold(state.clone(), |s, e| fleet.advance(&s, e).unwrap())
}

fn initialized() -> (Fleet, FleetState) {
    let fleet = Fleet::default();
    let state = fleet.new_state(EntityId::random());
    let events = fleet
        .tell(&state, FleetCommand::Init { name: "main".into() })
        .unwrap();
    let state = apply(&fleet, &state, &events);
    (fleet, state)
}

#[test]
fn init_is_idempotent() {
    let (fleet, state) = initialized();
    let events = fleet
        .tell(&state, FleetCommand::Init { name: "main".into() })
        .unwrap();
    assert!(events.is_empty());
}

#[test]
fn init_with_other_name_conflicts() {
    let (fleet, state) = initialized();
    let err = fleet
        .tell(&state, FleetCommand::Init { name: "other".into() })
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(Conflict::Init(_))));
}

#[test]
fn registry_requires_initialized_main() {
    let fleet = Fleet::default();
    let state = fleet.new_state(EntityId::random());
    let err = fleet
        .tell(&state, FleetCommand::InitRegistry { name: "fooReg".into() })
        .unwrap_err();
    assert_eq!(err, DomainError::Uninitialized);
}

#[test]
fn registry_accept_then_confirm() {
    let (fleet, state) = initialized();
    let events = fleet
        .tell(&state, FleetCommand::InitRegistry { name: "fooReg".into() })
        .unwrap();
    assert_eq!(
        events,
        vec![FleetEvent::RegistryAccepted {
            name: "fooReg".into()
        }]
    );
    let state = apply(&fleet, &state, &events);
    assert_eq!(state.pending_registries().count(), 1);

    let events = fleet
        .tell(&state, FleetCommand::ConfirmRegistry { name: "fooReg".into() })
        .unwrap();
    let state = apply(&fleet, &state, &events);
    assert_eq!(state.pending_registries().count(), 0);
    assert_eq!(state.confirmed_registries().count(), 1);

    let again = fleet
        .tell(&state, FleetCommand::ConfirmRegistry { name: "fooReg".into() })
        .unwrap();
    assert!(again.is_empty());
}

#[test]
fn confirm_unknown_registry_conflicts() {
    let (fleet, state) = initialized();
    let err = fleet
        .tell(&state, FleetCommand::ConfirmRegistry { name: "nope".into() })
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Conflict(Conflict::UnknownRegistry(_))
    ));
}

#[test]
fn unix_domain_id_is_derived() {
    let (fleet, state) = initialized();
    let events = fleet
        .tell(&state, FleetCommand::CreateUnixDomain { name: "EXO".into() })
        .unwrap();
    let expected = Namer::default().unix_domain_id("EXO");
    assert!(matches!(
        &events[0],
        FleetEvent::UnixDomainCreated { domain_id, .. } if *domain_id == expected
    ));
}

#[test]
fn advance_does_not_touch_input_state() {
    let (fleet, state) = initialized();
    let before = state.clone();
    let _ = fleet
        .advance(
            &state,
            &FleetEvent::RegistryAccepted {
                name: "fooReg".into(),
            },
        )
        .unwrap();
    assert_eq!(state, before);
    assert!(state.registries.is_empty());
}

#[test]
fn confirm_of_unknown_registry_is_invalid_event() {
    let (fleet, state) = initialized();
    let err = fleet
        .advance(
            &state,
            &FleetEvent::RegistryConfirmed {
                name: "nope".into(),
            },
        )
        .unwrap_err();
    assert_eq!(err.event, "main:registry_confirmed");
}
