// Copyright (c) 2024 Mike Tsao

use super::{Generator, GeneratorTable, GeneratorType, LoopMode, PatchError, SampleHeader};
use crate::util::math::{cents_to_hertz, timecents_to_seconds};
use strum::IntoEnumIterator;

/// An instrument zone after its global zone has been folded in. Values are
/// absolute.
#[derive(Clone, Debug, PartialEq)]
pub struct InstrumentRegion {
    sample_id: usize,
    generators: GeneratorTable,
}
impl InstrumentRegion {
    /// Resolves one zone. Defaults come first, then the instrument's global
    /// zone, then the zone itself.
    pub fn new_with(
        instrument_name: &str,
        global: &[Generator],
        local: &[Generator],
        sample_count: usize,
    ) -> Result<Self, PatchError> {
        let mut generators = GeneratorTable::default();
        generators.set(GeneratorType::InitialFilterCutoffFrequency, 13500);
        for g in [
            GeneratorType::DelayModulationLfo,
            GeneratorType::DelayVibratoLfo,
            GeneratorType::DelayModulationEnvelope,
            GeneratorType::AttackModulationEnvelope,
            GeneratorType::HoldModulationEnvelope,
            GeneratorType::DecayModulationEnvelope,
            GeneratorType::ReleaseModulationEnvelope,
            GeneratorType::DelayVolumeEnvelope,
            GeneratorType::AttackVolumeEnvelope,
            GeneratorType::HoldVolumeEnvelope,
            GeneratorType::DecayVolumeEnvelope,
            GeneratorType::ReleaseVolumeEnvelope,
        ] {
            generators.set(g, -12000);
        }
        generators.set(GeneratorType::KeyRange, 0x7F00);
        generators.set(GeneratorType::VelocityRange, 0x7F00);
        generators.set(GeneratorType::KeyNumber, -1);
        generators.set(GeneratorType::Velocity, -1);
        generators.set(GeneratorType::ScaleTuning, 100);
        generators.set(GeneratorType::OverridingRootKey, -1);

        generators.apply_all(global);
        generators.apply_all(local);

        let id = generators[GeneratorType::SampleId];
        if id < 0 || id as usize >= sample_count {
            return Err(PatchError::InvalidSampleId {
                instrument: instrument_name.to_string(),
                id: id as i32,
            });
        }
        Ok(Self {
            sample_id: id as usize,
            generators,
        })
    }

    /// Index into the bank's sample headers.
    pub fn sample_id(&self) -> usize {
        self.sample_id
    }

    #[allow(missing_docs)]
    pub fn generators(&self) -> &GeneratorTable {
        &self.generators
    }

    /// Whether a note falls within this region's key and velocity ranges.
    pub fn contains(&self, key: u8, velocity: u8) -> bool {
        contains(&self.generators, key, velocity)
    }
}

/// A preset zone after its global zone has been folded in. Values are offsets
/// that get added to the instrument's.
#[derive(Clone, Debug, PartialEq)]
pub struct PresetRegion {
    instrument_id: usize,
    generators: GeneratorTable,
}
impl PresetRegion {
    /// Resolves one zone against the preset's global zone.
    pub fn new_with(
        preset_name: &str,
        global: &[Generator],
        local: &[Generator],
        instrument_count: usize,
    ) -> Result<Self, PatchError> {
        let mut generators = GeneratorTable::default();
        generators.set(GeneratorType::KeyRange, 0x7F00);
        generators.set(GeneratorType::VelocityRange, 0x7F00);

        generators.apply_all(global);
        generators.apply_all(local);

        let id = generators[GeneratorType::Instrument];
        if id < 0 || id as usize >= instrument_count {
            return Err(PatchError::InvalidInstrumentId {
                preset: preset_name.to_string(),
                id: id as i32,
            });
        }
        Ok(Self {
            instrument_id: id as usize,
            generators,
        })
    }

    /// Index into the bank's instruments.
    pub fn instrument_id(&self) -> usize {
        self.instrument_id
    }

    #[allow(missing_docs)]
    pub fn generators(&self) -> &GeneratorTable {
        &self.generators
    }

    /// Whether a note falls within this region's key and velocity ranges.
    pub fn contains(&self, key: u8, velocity: u8) -> bool {
        contains(&self.generators, key, velocity)
    }
}

fn contains(generators: &GeneratorTable, key: u8, velocity: u8) -> bool {
    let key_ok = generators.range_start(GeneratorType::KeyRange) <= key
        && key <= generators.range_end(GeneratorType::KeyRange);
    let velocity_ok = generators.range_start(GeneratorType::VelocityRange) <= velocity
        && velocity <= generators.range_end(GeneratorType::VelocityRange);
    key_ok && velocity_ok
}

/// The parameters a voice plays with: a preset region layered over an
/// instrument region, plus the numbers it needs from the sample header.
///
/// Every slot is the sum of the preset's and the instrument's value, except
/// the ones that describe the sample itself (see
/// [GeneratorType::is_instrument_only()]), which come from the instrument.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectiveRegion {
    values: [i32; GeneratorType::SLOT_COUNT],
    sample_start: i32,
    sample_end: i32,
    sample_start_loop: i32,
    sample_end_loop: i32,
    sample_rate: i32,
    original_pitch: u8,
    pitch_correction: i8,
}
#[allow(missing_docs)]
impl EffectiveRegion {
    /// Combines the two tables. This is a pure function of its inputs.
    pub fn combine(
        preset: &PresetRegion,
        instrument: &InstrumentRegion,
        sample: &SampleHeader,
    ) -> Self {
        let mut values = [0; GeneratorType::SLOT_COUNT];
        for g in GeneratorType::iter() {
            let i = instrument.generators()[g] as i32;
            values[g as usize] = if g.is_instrument_only() {
                i
            } else {
                preset.generators()[g] as i32 + i
            };
        }
        Self {
            values,
            sample_start: sample.start,
            sample_end: sample.end,
            sample_start_loop: sample.start_loop,
            sample_end_loop: sample.end_loop,
            sample_rate: sample.sample_rate,
            original_pitch: sample.original_pitch,
            pitch_correction: sample.pitch_correction,
        }
    }

    /// The raw combined value of one slot.
    pub fn value(&self, generator_type: GeneratorType) -> i32 {
        self.values[generator_type as usize]
    }

    fn tenths(&self, generator_type: GeneratorType) -> f32 {
        0.1 * self.value(generator_type) as f32
    }

    fn seconds(&self, generator_type: GeneratorType) -> f32 {
        timecents_to_seconds(self.value(generator_type) as f32)
    }

    fn hertz(&self, generator_type: GeneratorType) -> f32 {
        cents_to_hertz(self.value(generator_type) as f32)
    }

    pub fn sample_start(&self) -> i32 {
        self.sample_start
            + 32768 * self.value(GeneratorType::StartAddressCoarseOffset)
            + self.value(GeneratorType::StartAddressOffset)
    }

    pub fn sample_end(&self) -> i32 {
        self.sample_end
            + 32768 * self.value(GeneratorType::EndAddressCoarseOffset)
            + self.value(GeneratorType::EndAddressOffset)
    }

    pub fn sample_start_loop(&self) -> i32 {
        self.sample_start_loop
            + 32768 * self.value(GeneratorType::StartLoopAddressCoarseOffset)
            + self.value(GeneratorType::StartLoopAddressOffset)
    }

    pub fn sample_end_loop(&self) -> i32 {
        self.sample_end_loop
            + 32768 * self.value(GeneratorType::EndLoopAddressCoarseOffset)
            + self.value(GeneratorType::EndLoopAddressOffset)
    }

    /// The native rate of the sample, in Hertz.
    pub fn sample_rate(&self) -> i32 {
        self.sample_rate
    }

    pub fn loop_mode(&self) -> LoopMode {
        LoopMode::from(self.value(GeneratorType::SampleModes))
    }

    /// The key at which the sample plays unshifted. An overriding root key
    /// wins over the sample header's original pitch.
    pub fn root_key(&self) -> i32 {
        match self.value(GeneratorType::OverridingRootKey) {
            -1 => self.original_pitch as i32,
            key => key,
        }
    }

    /// Semitones.
    pub fn coarse_tune(&self) -> i32 {
        self.value(GeneratorType::CoarseTune)
    }

    /// Cents, including the sample header's pitch correction.
    pub fn fine_tune(&self) -> i32 {
        self.value(GeneratorType::FineTune) + self.pitch_correction as i32
    }

    /// Cents per key. 100 is normal keyboard tracking.
    pub fn scale_tuning(&self) -> i32 {
        self.value(GeneratorType::ScaleTuning)
    }

    pub fn exclusive_class(&self) -> i32 {
        self.value(GeneratorType::ExclusiveClass)
    }

    pub fn modulation_lfo_to_pitch(&self) -> i32 {
        self.value(GeneratorType::ModulationLfoToPitch)
    }

    pub fn vibrato_lfo_to_pitch(&self) -> i32 {
        self.value(GeneratorType::VibratoLfoToPitch)
    }

    pub fn modulation_envelope_to_pitch(&self) -> i32 {
        self.value(GeneratorType::ModulationEnvelopeToPitch)
    }

    /// Hertz.
    pub fn initial_filter_cutoff_frequency(&self) -> f32 {
        self.hertz(GeneratorType::InitialFilterCutoffFrequency)
    }

    /// Decibels of resonance.
    pub fn initial_filter_q(&self) -> f32 {
        self.tenths(GeneratorType::InitialFilterQ)
    }

    pub fn modulation_lfo_to_filter_cutoff_frequency(&self) -> i32 {
        self.value(GeneratorType::ModulationLfoToFilterCutoffFrequency)
    }

    pub fn modulation_envelope_to_filter_cutoff_frequency(&self) -> i32 {
        self.value(GeneratorType::ModulationEnvelopeToFilterCutoffFrequency)
    }

    /// Decibels.
    pub fn modulation_lfo_to_volume(&self) -> f32 {
        self.tenths(GeneratorType::ModulationLfoToVolume)
    }

    /// Percent.
    pub fn chorus_effects_send(&self) -> f32 {
        self.tenths(GeneratorType::ChorusEffectsSend)
    }

    /// Percent.
    pub fn reverb_effects_send(&self) -> f32 {
        self.tenths(GeneratorType::ReverbEffectsSend)
    }

    /// -50 is hard left, +50 hard right.
    pub fn pan(&self) -> f32 {
        self.tenths(GeneratorType::Pan)
    }

    pub fn delay_modulation_lfo(&self) -> f32 {
        self.seconds(GeneratorType::DelayModulationLfo)
    }

    pub fn frequency_modulation_lfo(&self) -> f32 {
        self.hertz(GeneratorType::FrequencyModulationLfo)
    }

    pub fn delay_vibrato_lfo(&self) -> f32 {
        self.seconds(GeneratorType::DelayVibratoLfo)
    }

    pub fn frequency_vibrato_lfo(&self) -> f32 {
        self.hertz(GeneratorType::FrequencyVibratoLfo)
    }

    pub fn delay_modulation_envelope(&self) -> f32 {
        self.seconds(GeneratorType::DelayModulationEnvelope)
    }

    pub fn attack_modulation_envelope(&self) -> f32 {
        self.seconds(GeneratorType::AttackModulationEnvelope)
    }

    pub fn hold_modulation_envelope(&self) -> f32 {
        self.seconds(GeneratorType::HoldModulationEnvelope)
    }

    pub fn decay_modulation_envelope(&self) -> f32 {
        self.seconds(GeneratorType::DecayModulationEnvelope)
    }

    /// Percent of full scale that the level falls by.
    pub fn sustain_modulation_envelope(&self) -> f32 {
        self.tenths(GeneratorType::SustainModulationEnvelope)
    }

    pub fn release_modulation_envelope(&self) -> f32 {
        self.seconds(GeneratorType::ReleaseModulationEnvelope)
    }

    pub fn key_number_to_modulation_envelope_hold(&self) -> i32 {
        self.value(GeneratorType::KeyNumberToModulationEnvelopeHold)
    }

    pub fn key_number_to_modulation_envelope_decay(&self) -> i32 {
        self.value(GeneratorType::KeyNumberToModulationEnvelopeDecay)
    }

    pub fn delay_volume_envelope(&self) -> f32 {
        self.seconds(GeneratorType::DelayVolumeEnvelope)
    }

    pub fn attack_volume_envelope(&self) -> f32 {
        self.seconds(GeneratorType::AttackVolumeEnvelope)
    }

    pub fn hold_volume_envelope(&self) -> f32 {
        self.seconds(GeneratorType::HoldVolumeEnvelope)
    }

    pub fn decay_volume_envelope(&self) -> f32 {
        self.seconds(GeneratorType::DecayVolumeEnvelope)
    }

    /// Decibels of attenuation.
    pub fn sustain_volume_envelope(&self) -> f32 {
        self.tenths(GeneratorType::SustainVolumeEnvelope)
    }

    pub fn release_volume_envelope(&self) -> f32 {
        self.seconds(GeneratorType::ReleaseVolumeEnvelope)
    }

    pub fn key_number_to_volume_envelope_hold(&self) -> i32 {
        self.value(GeneratorType::KeyNumberToVolumeEnvelopeHold)
    }

    pub fn key_number_to_volume_envelope_decay(&self) -> i32 {
        self.value(GeneratorType::KeyNumberToVolumeEnvelopeDecay)
    }

    /// Decibels.
    pub fn initial_attenuation(&self) -> f32 {
        self.tenths(GeneratorType::InitialAttenuation)
    }
}
