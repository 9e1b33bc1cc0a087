pub mod capture;
pub mod codec;
pub mod cpal_capture;
pub mod cpal_output;
pub mod playback;

pub use capture::{CaptureBackend, CaptureConfig};
pub use codec::{
    decode_from_wire, decode_wire_payload, encode_for_wire, RawAudioFrame, WireAudioPacket,
    WIRE_MIME_TYPE,
};
pub use cpal_capture::CpalCaptureBackend;
pub use cpal_output::{CpalOutputFactory, CpalOutputSink};
pub use playback::{OutputSink, OutputSinkFactory, PlaybackScheduler, PlaybackSegment, SourceId};
