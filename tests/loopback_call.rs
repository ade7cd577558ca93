#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    io::{BufRead, BufReader},
    net::{SocketAddr, TcpListener},
    sync::Arc,
    time::Duration,
};

use rustycall::{
    call::{CallDependencies, CallState, CallStatus, SessionStateMachine},
    client::build_call_machine,
    config::{CallConfig, Config},
    ice::CandidateLine,
    log::{LogSink, NoopLogSink},
    media::{MediaConstraints, SyntheticMediaSource, TrackKind},
    peer::{LoopbackPeerFactory, PeerConfig},
    signaling::{LoopbackSignalingChannel, SignalingChannel, SignalingMessage},
};

const WAIT: Duration = Duration::from_secs(5);

fn loopback_remote_candidate() -> rustycall::ice::CandidateRecord {
    let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
    CandidateLine::host(addr, 1).to_record("0", 0)
}

#[test]
fn loopback_engine_and_mock_answerer_connect() {
    let logger: Arc<dyn LogSink> = Arc::new(NoopLogSink);
    let signaling: Arc<dyn SignalingChannel> = Arc::new(
        LoopbackSignalingChannel::new(Duration::from_millis(10), Arc::clone(&logger))
            .with_answer_sdp("v=0\r\ns=remote\r\n")
            .with_remote_candidates(vec![loopback_remote_candidate()]),
    );
    let mut machine = SessionStateMachine::new(
        CallDependencies {
            media_source: Arc::new(SyntheticMediaSource),
            peers: Arc::new(LoopbackPeerFactory::new(Arc::clone(&logger))),
            signaling,
            logger,
        },
        PeerConfig::default(),
        MediaConstraints::audio_video(),
    );

    machine.start_call().unwrap();
    assert!(
        machine.run_until(WAIT, |m| m.status() == CallStatus::Connected),
        "ended in {} ({:?})",
        machine.state(),
        machine.error()
    );

    let remote = machine.remote_stream().expect("remote stream");
    assert!(remote.has_kind(TrackKind::Audio) && remote.has_kind(TrackKind::Video));
    let local = machine.local_stream().cloned().expect("local stream");
    assert!(local.is_active());
    assert!(
        machine
            .local_description()
            .is_some_and(|d| d.sdp.contains("m=video"))
    );

    machine.end_call();
    assert_eq!(machine.state(), CallState::Idle);
    assert!(!local.is_active());
}

#[test]
fn default_client_wiring_completes_a_call() {
    let cfg = CallConfig::from_config(&Config::parse(
        "[Signaling]\nmode = loopback\nanswer_delay_ms = 5\n",
    ));
    let mut machine = build_call_machine(&cfg, Arc::new(NoopLogSink)).unwrap();
    machine.start_call().unwrap();
    assert!(machine.run_until(WAIT, |m| m.status() == CallStatus::Connected));
}

#[test]
fn offer_travels_over_tcp_signaling() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let remote = std::thread::spawn(move || {
        let (sock, _) = listener.accept().unwrap();
        let mut line = String::new();
        BufReader::new(sock).read_line(&mut line).unwrap();
        SignalingMessage::from_json(line.trim()).unwrap()
    });

    let cfg = CallConfig::from_config(&Config::parse(&format!(
        "[Signaling]\nmode = tcp\naddress = {addr}\n"
    )));
    let mut machine = build_call_machine(&cfg, Arc::new(NoopLogSink)).unwrap();
    machine.start_call().unwrap();
    assert!(machine.run_until(WAIT, |m| m.state() == CallState::AwaitingAnswer));

    let first = remote.join().unwrap();
    assert_eq!(first.kind(), "offer");
    machine.end_call();
}
