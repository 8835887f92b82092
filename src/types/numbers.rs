// Copyright (c) 2024 Mike Tsao

//! Numeric aliases shared by the render path.

/// A single channel of audio as it flows through voices, effects, and the
/// caller's output buffers.
pub type SampleType = f32;

/// Used for values that need more headroom than audio samples, such as
/// elapsed time or LFO phase.
pub type ParameterType = f64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision() {
        assert_eq!(core::mem::size_of::<SampleType>(), 4);
        assert_eq!(core::mem::size_of::<ParameterType>(), 8);
    }
}
