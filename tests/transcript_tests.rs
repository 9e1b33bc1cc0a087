// Unit tests for transcript aggregation and turn segmentation

use voxlink::transcript::{Channel, TranscriptAggregator, TranscriptTurn};

#[test]
fn test_deltas_concatenate_in_arrival_order() {
    let mut aggregator = TranscriptAggregator::new();
    aggregator.on_delta(Channel::Caller, "He");
    aggregator.on_delta(Channel::Caller, "llo");

    assert_eq!(aggregator.pending(Channel::Caller), "Hello");
    assert_eq!(aggregator.pending(Channel::Agent), "");
}

#[test]
fn test_turn_boundary_emits_trimmed_turn() {
    let mut aggregator = TranscriptAggregator::new();
    aggregator.on_delta(Channel::Caller, "He");
    aggregator.on_delta(Channel::Caller, "llo");

    let turns = aggregator.on_turn_boundary();
    assert_eq!(
        turns,
        vec![TranscriptTurn {
            channel: Channel::Caller,
            text: "Hello".to_string()
        }]
    );
}

#[test]
fn test_caller_turn_precedes_agent_turn() {
    let mut aggregator = TranscriptAggregator::new();
    aggregator.on_delta(Channel::Agent, "Hi there.");
    aggregator.on_delta(Channel::Caller, "Hello?");

    let turns = aggregator.on_turn_boundary();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].channel, Channel::Caller);
    assert_eq!(turns[1].channel, Channel::Agent);
}

#[test]
fn test_boundary_without_deltas_emits_nothing() {
    let mut aggregator = TranscriptAggregator::new();
    assert!(aggregator.on_turn_boundary().is_empty());
    assert!(aggregator.turns().is_empty());
}

#[test]
fn test_whitespace_only_buffer_emits_no_turn() {
    let mut aggregator = TranscriptAggregator::new();
    aggregator.on_delta(Channel::Agent, "   \n");
    assert!(aggregator.on_turn_boundary().is_empty());
}

#[test]
fn test_boundary_clears_buffers() {
    let mut aggregator = TranscriptAggregator::new();
    aggregator.on_delta(Channel::Caller, "first turn");
    aggregator.on_turn_boundary();

    assert_eq!(aggregator.pending(Channel::Caller), "");

    aggregator.on_delta(Channel::Caller, "second turn");
    let turns = aggregator.on_turn_boundary();
    assert_eq!(turns[0].text, "second turn");
}

#[test]
fn test_log_is_append_only_across_turns() {
    let mut aggregator = TranscriptAggregator::new();

    aggregator.on_delta(Channel::Caller, "What time is it?");
    aggregator.on_delta(Channel::Agent, "It is noon.");
    aggregator.on_turn_boundary();

    aggregator.on_delta(Channel::Agent, "Anything else?");
    aggregator.on_turn_boundary();

    let log = aggregator.turns();
    assert_eq!(log.len(), 3);
    assert_eq!(log[0].channel, Channel::Caller);
    assert_eq!(log[0].text, "What time is it?");
    assert_eq!(log[1].channel, Channel::Agent);
    assert_eq!(log[2].text, "Anything else?");
}
