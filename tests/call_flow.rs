#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::{sync::Arc, thread, time::Instant};

use common::{EngineScript, GatedMediaSource, Harness, TrackGate, WAIT};
use rustycall::{
    call::{CallError, CallState, CallStatus, CallUpdate, NegotiationPhase},
    ice::CandidateRecord,
    log::LogLevel,
    media::MediaAccessError,
    peer::{PeerConnectionState, PeerEvent},
    signaling::SignalingMessage,
};

fn answer(sdp: &str) -> SignalingMessage {
    SignalingMessage::answer(sdp)
}

fn cand(line: &str) -> SignalingMessage {
    SignalingMessage::candidate(CandidateRecord::new(line))
}

fn position(journal: &[String], entry: &str) -> usize {
    journal
        .iter()
        .position(|l| l == entry)
        .unwrap_or_else(|| panic!("{entry:?} missing from {journal:?}"))
}

fn to_awaiting_answer(h: &mut Harness) {
    h.machine.start_call().unwrap();
    assert!(
        h.machine
            .run_until(WAIT, |m| m.state() == CallState::AwaitingAnswer),
        "stuck in {}",
        h.machine.state()
    );
}

fn to_connected(h: &mut Harness) {
    to_awaiting_answer(h);
    h.signaling.inject(answer("A1"));
    assert!(h.machine.run_until(WAIT, |m| m.remote_description().is_some()));
    h.engine
        .emit(PeerEvent::ConnectionStateChanged(PeerConnectionState::Connected));
    assert!(h.machine.run_until(WAIT, |m| m.status() == CallStatus::Connected));
}

#[test]
fn offer_is_sent_after_local_description() {
    let mut h = Harness::ready();
    to_awaiting_answer(&mut h);

    assert_eq!(h.offers(), vec!["O1".to_owned()]);
    assert_eq!(h.machine.local_description().map(|d| d.sdp.as_str()), Some("O1"));
    assert_eq!(h.machine.status(), CallStatus::Connecting);

    let journal = h.engine.journal();
    assert_eq!(
        journal,
        vec!["add_track audio", "add_track video", "create_offer", "set_local O1"]
    );
}

#[test]
fn candidates_racing_the_answer_are_applied_after_it_in_order() {
    let mut h = Harness::ready();
    to_awaiting_answer(&mut h);

    h.signaling.inject(answer("A1"));
    h.signaling.inject(cand("c1"));
    h.signaling.inject(cand("c2"));

    assert!(h.wait_journal(|j| j.iter().any(|l| l == "add_candidate c2")));
    let j = h.engine.journal();
    assert!(position(&j, "set_remote A1") < position(&j, "add_candidate c1"));
    assert!(position(&j, "add_candidate c1") < position(&j, "add_candidate c2"));

    h.engine
        .emit(PeerEvent::ConnectionStateChanged(PeerConnectionState::Connected));
    assert!(h.machine.run_until(WAIT, |m| m.status() == CallStatus::Connected));
    assert_eq!(h.machine.error(), None);
}

#[test]
fn candidates_before_the_answer_wait_for_it() {
    let mut h = Harness::new(GatedMediaSource::gated(), EngineScript::default());
    h.machine.start_call().unwrap();
    assert_eq!(h.machine.state(), CallState::AcquiringMedia);

    h.signaling.inject(cand("early"));
    h.machine.poll();
    h.media.open();
    assert!(h.machine.run_until(WAIT, |m| m.state() == CallState::AwaitingAnswer));
    h.signaling.inject(cand("middle"));
    h.machine.poll();
    assert!(!h.engine.journal().iter().any(|l| l.starts_with("add_candidate")));

    h.signaling.inject(answer("A1"));
    h.signaling.inject(cand("late"));
    assert!(h.wait_journal(|j| j.iter().any(|l| l == "add_candidate late")));

    let j = h.engine.journal();
    let applied: Vec<&str> = j
        .iter()
        .filter_map(|l| l.strip_prefix("add_candidate "))
        .collect();
    assert_eq!(applied, vec!["early", "middle", "late"]);
    assert!(position(&j, "set_remote A1") < position(&j, "add_candidate early"));
}

#[test]
fn local_candidates_wait_for_the_local_description() {
    let script = EngineScript {
        candidates_during_offer: vec![CandidateRecord::new("l1"), CandidateRecord::new("l2")],
        ..EngineScript::default()
    };
    let mut h = Harness::new(GatedMediaSource::immediate(), script);
    to_awaiting_answer(&mut h);

    let kinds: Vec<&str> = h.signaling.sent().iter().map(SignalingMessage::kind).collect();
    assert_eq!(kinds, vec!["offer", "candidate", "candidate"]);
    assert_eq!(
        h.signaling.sent()[1..],
        [
            SignalingMessage::candidate(CandidateRecord::new("l1")),
            SignalingMessage::candidate(CandidateRecord::new("l2")),
        ]
    );

    h.engine
        .emit(PeerEvent::IceCandidate(CandidateRecord::new("l3")));
    let signaling = h.signaling.clone();
    assert!(h.machine.run_until(WAIT, |_| signaling.sent().len() == 4));
    assert_eq!(
        h.signaling.sent().last(),
        Some(&SignalingMessage::candidate(CandidateRecord::new("l3")))
    );
}

#[test]
fn second_start_is_rejected_without_side_effects() {
    let mut h = Harness::new(GatedMediaSource::gated(), EngineScript::default());
    h.machine.start_call().unwrap();
    let generation = h.machine.generation();

    let err = h.machine.start_call().unwrap_err();
    assert!(matches!(err, CallError::AlreadyInCall));
    assert!(!err.is_fatal());
    assert_eq!(h.machine.state(), CallState::AcquiringMedia);
    assert_eq!(h.machine.generation(), generation);
    assert_eq!(h.signaling.subscriber_count(), 1);
    assert_eq!(h.machine.error(), None);

    h.media.open();
    to_awaiting_answer_from_started(&mut h);
    assert!(matches!(h.machine.start_call(), Err(CallError::AlreadyInCall)));
    assert_eq!(h.offers().len(), 1);
}

fn to_awaiting_answer_from_started(h: &mut Harness) {
    assert!(h.machine.run_until(WAIT, |m| m.state() == CallState::AwaitingAnswer));
}

#[test]
fn media_failure_reports_and_creates_no_engine() {
    let mut h = Harness::new(
        GatedMediaSource::failing(MediaAccessError::PermissionDenied("camera".into())),
        EngineScript::default(),
    );
    let updates = h.machine.subscribe();
    h.machine.start_call().unwrap();

    assert!(h.machine.run_until(WAIT, |m| m.status() == CallStatus::Failed));
    assert_eq!(h.machine.state(), CallState::Idle);
    assert!(matches!(
        h.machine.last_error(),
        Some(CallError::MediaAccess(MediaAccessError::PermissionDenied(_)))
    ));
    assert!(h.machine.error().is_some_and(|e| e.contains("camera")));
    assert_eq!(h.engine.created(), 0);
    assert_eq!(h.signaling.subscriber_count(), 0);
    assert!(h.log.contains(LogLevel::Error, "Could not access camera or microphone"));

    assert!(updates.try_iter().any(|u| matches!(u, CallUpdate::Error(_))));

    // Ending from Idle clears the reported error.
    h.machine.end_call();
    assert_eq!(h.machine.status(), CallStatus::Idle);
    assert_eq!(h.machine.error(), None);
}

#[test]
fn ending_before_media_resolves_releases_late_stream() {
    let mut h = Harness::new(GatedMediaSource::gated(), EngineScript::default());
    h.machine.start_call().unwrap();
    h.machine.end_call();
    assert_eq!(h.machine.state(), CallState::Idle);
    assert_eq!(h.signaling.subscriber_count(), 0);

    h.media.open();
    let media = h.media.clone();
    assert!(
        h.machine
            .run_until(WAIT, |_| media.handed_out().len() == 1 && media.all_released())
    );
    assert_eq!(h.machine.state(), CallState::Idle);
    assert_eq!(h.engine.created(), 0);
    assert!(h.machine.local_stream().is_none());
}

#[test]
fn end_call_is_idempotent_from_every_reachable_state() {
    // Idle
    let mut h = Harness::ready();
    h.machine.end_call();
    h.machine.end_call();
    assert_eq!(h.machine.state(), CallState::Idle);

    // AcquiringMedia
    let mut h = Harness::new(GatedMediaSource::gated(), EngineScript::default());
    h.machine.start_call().unwrap();
    h.machine.end_call();
    h.machine.end_call();
    assert_eq!(h.machine.state(), CallState::Idle);

    // AwaitingAnswer and Connected
    for connect in [false, true] {
        let mut h = Harness::ready();
        if connect {
            to_connected(&mut h);
        } else {
            to_awaiting_answer(&mut h);
        }
        h.machine.end_call();
        h.machine.end_call();

        assert_eq!(h.machine.state(), CallState::Idle);
        assert_eq!(h.machine.status(), CallStatus::Idle);
        assert!(h.media.all_released());
        assert_eq!(h.signaling.subscriber_count(), 0);
        assert!(h.wait_journal(|j| j.iter().any(|l| l == "close")));
        thread::sleep(std::time::Duration::from_millis(20));
        let closes = h.engine.journal().iter().filter(|l| *l == "close").count();
        assert_eq!(closes, 1);
    }
}

#[test]
fn end_call_while_offering_cancels_queued_engine_work() {
    let gate = TrackGate::new();
    let mut h = Harness::new(
        GatedMediaSource::immediate(),
        EngineScript {
            hold_add_track: Some(Arc::clone(&gate)),
            ..EngineScript::default()
        },
    );
    h.machine.start_call().unwrap();
    assert!(h.machine.run_until(WAIT, |m| {
        m.state() == CallState::Negotiating(NegotiationPhase::Offering)
    }));
    assert!(gate.wait_entered(WAIT));

    h.machine.end_call();
    h.machine.end_call();
    assert_eq!(h.machine.state(), CallState::Idle);
    assert!(h.media.all_released());
    assert_eq!(h.signaling.subscriber_count(), 0);

    gate.open();
    assert!(h.wait_journal(|j| j.iter().any(|l| l == "close")));
    thread::sleep(std::time::Duration::from_millis(20));
    h.machine.poll();

    // The track already inside the engine finishes; the rest is dropped.
    assert_eq!(h.engine.journal(), vec!["add_track audio", "close"]);
    assert!(h.offers().is_empty());
    assert_eq!(h.machine.state(), CallState::Idle);
    assert_eq!(h.machine.error(), None);
}

#[test]
fn transport_failure_tears_down() {
    let mut h = Harness::ready();
    to_awaiting_answer(&mut h);
    h.engine
        .emit(PeerEvent::ConnectionStateChanged(PeerConnectionState::Failed));

    assert!(h.machine.run_until(WAIT, |m| m.status() == CallStatus::Failed));
    assert!(matches!(h.machine.last_error(), Some(CallError::IceNegotiationFailure)));
    assert_eq!(h.machine.error(), Some("Connection to the other peer failed"));
    assert!(h.media.all_released());
    assert!(h.wait_journal(|j| j.iter().any(|l| l == "close")));
}

#[test]
fn offer_send_failure_is_fatal() {
    let mut h = Harness::ready();
    h.signaling.set_reject_sends(true);
    h.machine.start_call().unwrap();

    assert!(h.machine.run_until(WAIT, |m| m.status() == CallStatus::Failed));
    assert!(matches!(h.machine.last_error(), Some(CallError::SignalingSend(_))));
    assert!(h.media.all_released());
    assert_eq!(h.signaling.subscriber_count(), 0);
}

#[test]
fn engine_failures_map_to_their_phase() {
    let script = EngineScript {
        fail_create_offer: true,
        ..EngineScript::default()
    };
    let mut h = Harness::new(GatedMediaSource::immediate(), script);
    h.machine.start_call().unwrap();
    assert!(h.machine.run_until(WAIT, |m| m.status() == CallStatus::Failed));
    assert!(matches!(h.machine.last_error(), Some(CallError::OfferCreation(_))));
    assert!(h.offers().is_empty());

    let script = EngineScript {
        fail_remote_description: true,
        ..EngineScript::default()
    };
    let mut h = Harness::new(GatedMediaSource::immediate(), script);
    to_awaiting_answer(&mut h);
    h.signaling.inject(answer("A1"));
    assert!(h.machine.run_until(WAIT, |m| m.status() == CallStatus::Failed));
    assert!(matches!(h.machine.last_error(), Some(CallError::DescriptionApply(_))));
    assert!(h.media.all_released());

    let script = EngineScript {
        fail_add_track: true,
        ..EngineScript::default()
    };
    let mut h = Harness::new(GatedMediaSource::immediate(), script);
    h.machine.start_call().unwrap();
    assert!(h.machine.run_until(WAIT, |m| m.status() == CallStatus::Failed));
    assert!(matches!(h.machine.last_error(), Some(CallError::TrackAttach(_))));
    assert!(
        h.machine
            .error()
            .is_some_and(|e| e.starts_with("Could not attach local media"))
    );
    assert!(h.offers().is_empty());
    assert!(h.media.all_released());
}

#[test]
fn rejected_candidate_is_not_fatal() {
    let script = EngineScript {
        reject_candidate: Some("bad".into()),
        ..EngineScript::default()
    };
    let mut h = Harness::new(GatedMediaSource::immediate(), script);
    to_awaiting_answer(&mut h);
    h.signaling.inject(answer("A1"));
    h.signaling.inject(cand("bad"));
    h.signaling.inject(cand("good"));

    assert!(h.wait_journal(|j| j.iter().any(|l| l == "add_candidate good")));
    let log = h.log.clone();
    assert!(
        h.machine
            .run_until(WAIT, |_| log.contains(LogLevel::Warn, "Ignored a remote candidate"))
    );
    assert_eq!(h.machine.state(), CallState::AwaitingAnswer);
    assert_eq!(h.machine.error(), None);
}

#[test]
fn answers_outside_awaiting_answer_are_ignored() {
    let mut h = Harness::new(GatedMediaSource::gated(), EngineScript::default());
    h.machine.start_call().unwrap();
    h.signaling.inject(answer("too-early"));
    h.machine.poll();
    h.media.open();
    to_awaiting_answer_from_started(&mut h);
    assert!(h.machine.remote_description().is_none());

    h.signaling.inject(answer("A1"));
    h.signaling.inject(answer("A2"));
    assert!(h.machine.run_until(WAIT, |m| m.remote_description().is_some()));
    h.signaling.inject(answer("A3"));
    h.machine.poll();

    let remotes: Vec<String> = h
        .engine
        .journal()
        .into_iter()
        .filter(|l| l.starts_with("set_remote"))
        .collect();
    assert_eq!(remotes, vec!["set_remote A1".to_owned()]);
    assert!(h.log.contains(LogLevel::Warn, "ignoring answer"));
}

#[test]
fn completions_from_an_ended_session_are_discarded() {
    let mut h = Harness::ready();
    to_awaiting_answer(&mut h);
    h.machine.end_call();

    h.engine
        .emit(PeerEvent::ConnectionStateChanged(PeerConnectionState::Connected));
    h.engine
        .emit(PeerEvent::IceCandidate(CandidateRecord::new("stale")));
    h.machine.poll();

    assert_eq!(h.machine.state(), CallState::Idle);
    assert_eq!(h.machine.status(), CallStatus::Idle);
    assert!(!h.signaling.sent().iter().any(|m| matches!(
        m,
        SignalingMessage::Candidate { candidate } if candidate.candidate == "stale"
    )));

    // A new session is unaffected by the old one.
    to_awaiting_answer(&mut h);
    assert_eq!(h.offers().len(), 2);
    assert_eq!(h.engine.created(), 2);
}

#[test]
fn observers_see_each_step_and_streams() {
    let mut h = Harness::ready();
    let updates = h.machine.subscribe();
    to_connected(&mut h);
    h.engine.emit(PeerEvent::Track(rustycall::media::MediaStream::new(
        Vec::new(),
    )));
    assert!(h.machine.run_until(WAIT, |m| m.remote_stream().is_some()));

    let mut states = Vec::new();
    let mut saw_local = false;
    let mut saw_remote = false;
    for u in updates.try_iter() {
        match u {
            CallUpdate::StateChanged { state, .. } => states.push(state),
            CallUpdate::LocalStream(Some(_)) => saw_local = true,
            CallUpdate::RemoteStream(Some(_)) => saw_remote = true,
            _ => {}
        }
    }
    assert_eq!(
        states,
        vec![
            CallState::AcquiringMedia,
            CallState::Negotiating(NegotiationPhase::Offering),
            CallState::Negotiating(NegotiationPhase::SettingLocalDescription),
            CallState::AwaitingAnswer,
            CallState::Connected,
        ]
    );
    assert!(saw_local && saw_remote);
}

#[test]
fn dropping_the_machine_ends_the_call() {
    let mut h = Harness::ready();
    to_awaiting_answer(&mut h);
    let Harness {
        machine,
        media,
        engine,
        signaling,
        ..
    } = h;
    drop(machine);

    assert!(media.all_released());
    assert_eq!(signaling.subscriber_count(), 0);
    let deadline = Instant::now() + WAIT;
    while !engine.journal().iter().any(|l| l == "close") {
        assert!(Instant::now() < deadline, "engine never closed");
        thread::sleep(std::time::Duration::from_millis(5));
    }
}
