// Copyright (c) 2024 Mike Tsao

//! The wavetable [Synthesizer] and the parts it is made of.

pub use channel::Channel;
pub use synthesizer::Synthesizer;
pub use voice::{Voice, VoiceState};
pub use voice_store::{IsVoice, VoiceStore};

mod channel;
mod synthesizer;
mod voice;
mod voice_store;

#[cfg(test)]
pub(crate) use synthesizer::tests::test_synthesizer;
