//! Ad-hoc event relay and MIDI thru routing tests

mod helpers;

use helpers::*;
use rondo::core::CONTROL_DEVICE;
use rondo::driver::DriverCall;
use rondo::prelude::*;

#[test]
fn test_outbound_events_emitted_one_by_one_in_order() {
    let (engine, driver) = mock_engine();
    engine.process_mapped_event(note(2000, 0, 10, 60));
    engine.process_mapped_event(note(2000, 0, 10, 64));
    assert_eq!(engine.relay().outbound_len(), 2);

    engine.tick();
    let calls = driver.take_calls();
    let now = events_now(&calls);
    assert_eq!(now.len(), 2);
    assert_eq!(now[0][0].data1, 60);
    assert_eq!(now[1][0].data1, 64);
    assert_eq!(calls.last(), Some(&DriverCall::ProcessPending));
    assert_eq!(engine.relay().outbound_len(), 0);
}

#[test]
fn test_inbound_queued_and_thru_routed_to_selected_track() {
    let (engine, driver) = mock_engine();
    engine.routing().set_track_instrument(4, 2010);
    engine.routing().set_selected_track(4);
    engine
        .routing()
        .set_thru_filter(MidiFilter::from(MappedEventType::MidiController));

    driver.push_incoming(note(2000, 0, 0, 62).recorded_from(3, 1));
    driver.push_incoming(MappedEvent::controller(2000, 7, 90, ms(1)).recorded_from(3, 1));
    driver.push_incoming(note(2000, 2, 0, 70).recorded_from(CONTROL_DEVICE, 0));
    engine.tick();

    // the inbound queue sees everything, unfiltered
    assert_eq!(engine.pull_asynchronous_midi_queue().len(), 3);
    assert!(engine.pull_asynchronous_midi_queue().is_empty());

    let echoed = events_now(&driver.take_calls());
    assert_eq!(echoed.len(), 1);
    let pitches: Vec<(u8, u32)> = echoed[0].iter().map(|e| (e.data1, e.instrument)).collect();
    assert_eq!(pitches, vec![(62, 2010)]);
}

#[test]
fn test_routing_disabled_skips_thru() {
    let (engine, driver) = mock_engine();
    engine.routing().set_routing_enabled(false);
    driver.push_incoming(note(2000, 0, 0, 62));
    engine.tick();

    assert_eq!(engine.pull_asynchronous_midi_queue().len(), 1);
    assert!(events_now(&driver.take_calls()).is_empty());
}

#[test]
fn test_relay_while_playing() {
    let (engine, driver) = mock_engine();
    start_playing(&engine, ms(0), 500);
    driver.take_calls();

    engine.process_mapped_event(note(2000, 0, 10, 48));
    driver.push_incoming(note(2000, 0, 0, 50));
    engine.tick();

    let now = events_now(&driver.take_calls());
    assert_eq!(now.len(), 2);
    assert_eq!(now[0][0].data1, 48);
    assert_eq!(now[1][0].data1, 50);
    assert_eq!(engine.pull_asynchronous_midi_queue().len(), 1);
}
