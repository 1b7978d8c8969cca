//! Transport request queue and completion token tests

mod helpers;

use helpers::*;
use rondo::prelude::*;

#[test]
fn test_start_request_completes_after_playback_starts() {
    let (engine, _driver) = mock_engine();
    let token = engine.transport_change(TransportRequest::Start);
    assert_eq!(token, engine.transport_token() + 1);

    engine.tick();
    assert_eq!(engine.status(), TransportStatus::Starting);
    assert!(!engine.is_transport_sync_complete(token));

    engine.tick();
    assert_eq!(engine.status(), TransportStatus::Playing);
    assert!(engine.is_transport_sync_complete(token));
}

#[test]
fn test_start_request_while_recording_punches_out_and_completes() {
    let host = std::sync::Arc::new(rondo::ArmedInstruments::new("/tmp/takes"));
    host.arm(MIDI_INSTRUMENT_BASE);
    let (engine, driver) = mock_engine_with_host(host);
    assert!(engine.record(ms(0), sizes(500), TransportStatus::StartingToRecord));
    engine.tick();
    assert_eq!(engine.status(), TransportStatus::Recording);
    driver.take_calls();

    let token = engine.transport_change(TransportRequest::Start);
    assert!(!engine.is_transport_sync_complete(token));
    engine.tick();
    assert_eq!(engine.status(), TransportStatus::Playing);
    assert!(engine.is_transport_sync_complete(token));
    assert!(driver.take_calls().contains(&rondo::driver::DriverCall::PunchOut));
}

#[test]
fn test_stop_request() {
    let (engine, _driver) = mock_engine();
    start_playing(&engine, ms(0), 500);

    let token = engine.transport_change(TransportRequest::Stop);
    engine.tick();
    assert_eq!(engine.status(), TransportStatus::Stopped);
    assert!(engine.is_transport_sync_complete(token));
}

#[test]
fn test_no_change_is_already_complete() {
    let (engine, _driver) = mock_engine();
    let token = engine.transport_change(TransportRequest::NoChange);
    assert!(engine.is_transport_sync_complete(token));
    engine.tick();
    assert_eq!(engine.status(), TransportStatus::Stopped);
}

#[test]
fn test_jump_request_completes() {
    let (engine, _driver) = mock_engine();
    start_playing(&engine, ms(0), 500);

    let token = engine.transport_jump(TransportRequest::Jump, ms(7000));
    engine.tick();
    assert_eq!(engine.song_position(), ms(7000));
    assert_eq!(engine.status(), TransportStatus::Playing);
    assert!(engine.is_transport_sync_complete(token));
}

#[test]
fn test_start_at_time() {
    let (engine, _driver) = mock_engine();
    let token = engine.transport_jump(TransportRequest::StartAtTime, ms(3000));

    engine.tick();
    assert_eq!(engine.status(), TransportStatus::Starting);
    assert_eq!(engine.song_position(), ms(3000));
    assert!(!engine.is_transport_sync_complete(token));

    engine.tick();
    assert_eq!(engine.status(), TransportStatus::Playing);
    assert!(engine.is_transport_sync_complete(token));
}

#[test]
fn test_stop_at_time() {
    let (engine, _driver) = mock_engine();
    start_playing(&engine, ms(0), 500);

    let token = engine.transport_jump(TransportRequest::StopAtTime, ms(1500));
    engine.tick();
    assert_eq!(engine.status(), TransportStatus::Stopped);
    assert_eq!(engine.song_position(), ms(1500));
    assert!(engine.is_transport_sync_complete(token));
}

#[test]
fn test_requests_applied_in_order() {
    let (engine, _driver) = mock_engine();
    engine.transport_jump(TransportRequest::Jump, ms(2000));
    engine.transport_change(TransportRequest::Start);
    assert_eq!(engine.transport_sync().pending_requests(), 2);

    engine.tick();
    assert_eq!(engine.transport_sync().pending_requests(), 0);
    assert_eq!(engine.status(), TransportStatus::Starting);
    assert_eq!(engine.song_position(), ms(2000));
}

#[test]
fn test_driver_can_request_transport_changes() {
    let (engine, driver) = mock_engine();
    let transport = driver.external_transport().unwrap();

    let token = transport.transport_change(TransportRequest::Start);
    engine.tick();
    engine.tick();
    assert_eq!(engine.status(), TransportStatus::Playing);
    assert!(transport.is_transport_sync_complete(token));
}

#[test]
fn test_next_transport_request_polls_fifo() {
    let (engine, _driver) = mock_engine();
    engine.transport_change(TransportRequest::Stop);
    engine.transport_jump(TransportRequest::Jump, ms(10));

    assert_eq!(
        engine.next_transport_request(),
        Some((TransportRequest::Stop, RealTime::ZERO))
    );
    assert_eq!(
        engine.next_transport_request(),
        Some((TransportRequest::Jump, ms(10)))
    );
    assert_eq!(engine.next_transport_request(), None);
}
