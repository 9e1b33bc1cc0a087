// Unit tests for the PCM wire codec
//
// These verify the float <-> 16-bit PCM conversion, the base64 transport
// layer, and the malformed-payload failure mode.

use voxlink::audio::codec::{
    decode_from_wire, decode_wire_payload, encode_for_wire, RawAudioFrame, WIRE_MIME_TYPE,
};
use voxlink::SessionError;

#[test]
fn test_round_trip_within_quantization_error() {
    let samples = vec![0.0, 0.5, -0.25, 0.999, -1.0, 0.125, -0.625];
    let frame = RawAudioFrame {
        samples: samples.clone(),
        sample_rate: 16000,
        channels: 1,
    };

    let packet = encode_for_wire(&frame);
    assert_eq!(packet.mime_type, WIRE_MIME_TYPE);

    let bytes = decode_wire_payload(&packet.data).unwrap();
    let decoded = decode_from_wire(&bytes, 16000, 1).unwrap();

    assert_eq!(decoded.samples.len(), samples.len());
    for (original, recovered) in samples.iter().zip(decoded.samples.iter()) {
        // 16-bit PCM quantizes to steps of 1/32768.
        assert!(
            (original - recovered).abs() <= 1.0 / 32768.0,
            "sample {} decoded as {}",
            original,
            recovered
        );
    }
}

#[test]
fn test_encoded_bytes_are_little_endian_i16() {
    let frame = RawAudioFrame {
        samples: vec![0.5],
        sample_rate: 16000,
        channels: 1,
    };

    let packet = encode_for_wire(&frame);
    let bytes = decode_wire_payload(&packet.data).unwrap();

    // 0.5 * 32768 = 16384 = 0x4000, little-endian.
    assert_eq!(bytes, vec![0x00, 0x40]);
}

#[test]
fn test_decode_rejects_odd_byte_length() {
    let err = decode_from_wire(&[0u8; 5], 24000, 1).unwrap_err();
    assert!(matches!(err, SessionError::Format(_)));
}

#[test]
fn test_decode_rejects_length_not_multiple_of_channel_stride() {
    // 6 bytes is 3 samples; a 2-channel frame needs a multiple of 4 bytes.
    let err = decode_from_wire(&[0u8; 6], 24000, 2).unwrap_err();
    assert!(matches!(err, SessionError::Format(_)));
}

#[test]
fn test_decode_rejects_invalid_base64() {
    let err = decode_wire_payload("not valid base64!!").unwrap_err();
    assert!(matches!(err, SessionError::Format(_)));
}

#[test]
fn test_decode_empty_payload_is_empty_frame() {
    let decoded = decode_from_wire(&[], 24000, 1).unwrap();
    assert!(decoded.samples.is_empty());
    assert_eq!(decoded.duration_secs(), 0.0);
}

#[test]
fn test_frame_duration_at_capture_cadence() {
    // One capture block: 4096 samples at 16kHz = 256ms.
    let frame = RawAudioFrame {
        samples: vec![0.0; 4096],
        sample_rate: 16000,
        channels: 1,
    };
    assert!((frame.duration_secs() - 0.256).abs() < 1e-9);
}
