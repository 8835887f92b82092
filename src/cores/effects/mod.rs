// Copyright (c) 2024 Mike Tsao

//! The send effects that every voice feeds: a stereo [Chorus] and a
//! Freeverb-style [Reverb], combined into an [EffectsBus].

pub use {
    bus::EffectsBus,
    chorus::{Chorus, ChorusBuilder},
    reverb::{Reverb, ReverbBuilder},
};

mod bus;
mod chorus;
mod delay;
mod reverb;
