// Copyright (c) 2024 Mike Tsao

/// Sets the high seven bits of a 14-bit controller register.
fn with_msb(register: i16, value: u8) -> i16 {
    ((register as i32 & 0x7F) | ((value as i32 & 0x7F) << 7)) as i16
}

/// Sets the low seven bits of a 14-bit controller register.
fn with_lsb(register: i16, value: u8) -> i16 {
    ((register as i32 & 0xFF80) | (value as i32 & 0x7F)) as i16
}

/// The controller state of one MIDI channel. Every voice playing on the
/// channel reads it once per block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Channel {
    is_percussion: bool,

    bank_number: i32,
    patch_number: i32,

    modulation: i16,
    volume: i16,
    pan: i16,
    expression: i16,
    hold_pedal: bool,

    reverb_send: u8,
    chorus_send: u8,

    rpn: i16,
    pitch_bend_range: i16,
    coarse_tune: i16,
    fine_tune: i16,

    pitch_bend: f32,
}
impl Channel {
    /// Registered parameter numbers that data entry understands.
    const RPN_PITCH_BEND_RANGE: i16 = 0;
    const RPN_FINE_TUNE: i16 = 1;
    const RPN_COARSE_TUNE: i16 = 2;

    /// A channel in its power-on state. The percussion channel selects the
    /// drum bank (128).
    pub fn new_with(is_percussion: bool) -> Self {
        let mut r = Self {
            is_percussion,
            ..Default::default()
        };
        r.reset();
        r
    }

    /// Returns every controller, including bank and patch, to power-on values.
    pub fn reset(&mut self) {
        self.bank_number = if self.is_percussion { 128 } else { 0 };
        self.patch_number = 0;

        self.modulation = 0;
        self.volume = 100 << 7;
        self.pan = 64 << 7;
        self.expression = 127 << 7;
        self.hold_pedal = false;

        self.reverb_send = 40;
        self.chorus_send = 0;

        self.rpn = -1;
        self.pitch_bend_range = 2 << 7;
        self.coarse_tune = 0;
        self.fine_tune = 8192;

        self.pitch_bend = 0.0;
    }

    /// Resets only the performance controllers: modulation, expression, hold
    /// pedal, RPN selection, and pitch bend. Patch, bank, volume, pan, and
    /// tuning are kept.
    pub fn reset_all_controllers(&mut self) {
        self.modulation = 0;
        self.expression = 127 << 7;
        self.hold_pedal = false;
        self.rpn = -1;
        self.pitch_bend = 0.0;
    }

    pub(crate) fn set_bank(&mut self, value: u8) {
        self.bank_number = value as i32;
        if self.is_percussion {
            self.bank_number += 128;
        }
    }

    pub(crate) fn set_patch(&mut self, value: u8) {
        self.patch_number = value as i32;
    }

    pub(crate) fn set_modulation_coarse(&mut self, value: u8) {
        self.modulation = with_msb(self.modulation, value);
    }

    pub(crate) fn set_modulation_fine(&mut self, value: u8) {
        self.modulation = with_lsb(self.modulation, value);
    }

    pub(crate) fn set_volume_coarse(&mut self, value: u8) {
        self.volume = with_msb(self.volume, value);
    }

    pub(crate) fn set_volume_fine(&mut self, value: u8) {
        self.volume = with_lsb(self.volume, value);
    }

    pub(crate) fn set_pan_coarse(&mut self, value: u8) {
        self.pan = with_msb(self.pan, value);
    }

    pub(crate) fn set_pan_fine(&mut self, value: u8) {
        self.pan = with_lsb(self.pan, value);
    }

    pub(crate) fn set_expression_coarse(&mut self, value: u8) {
        self.expression = with_msb(self.expression, value);
    }

    pub(crate) fn set_expression_fine(&mut self, value: u8) {
        self.expression = with_lsb(self.expression, value);
    }

    pub(crate) fn set_hold_pedal(&mut self, value: u8) {
        self.hold_pedal = value >= 64;
    }

    pub(crate) fn set_reverb_send(&mut self, value: u8) {
        self.reverb_send = value;
    }

    pub(crate) fn set_chorus_send(&mut self, value: u8) {
        self.chorus_send = value;
    }

    pub(crate) fn set_rpn_coarse(&mut self, value: u8) {
        self.rpn = with_msb(self.rpn, value);
    }

    pub(crate) fn set_rpn_fine(&mut self, value: u8) {
        self.rpn = with_lsb(self.rpn, value);
    }

    pub(crate) fn data_entry_coarse(&mut self, value: u8) {
        match self.rpn {
            Self::RPN_PITCH_BEND_RANGE => {
                self.pitch_bend_range = with_msb(self.pitch_bend_range, value)
            }
            Self::RPN_FINE_TUNE => self.fine_tune = with_msb(self.fine_tune, value),
            Self::RPN_COARSE_TUNE => self.coarse_tune = value as i16 - 64,
            _ => {}
        }
    }

    pub(crate) fn data_entry_fine(&mut self, value: u8) {
        match self.rpn {
            Self::RPN_PITCH_BEND_RANGE => {
                self.pitch_bend_range = with_lsb(self.pitch_bend_range, value)
            }
            Self::RPN_FINE_TUNE => self.fine_tune = with_lsb(self.fine_tune, value),
            _ => {}
        }
    }

    /// Takes the two seven-bit halves of a pitch-bend message.
    pub(crate) fn set_pitch_bend(&mut self, lsb: u8, msb: u8) {
        let value = (lsb as i32 & 0x7F) | ((msb as i32 & 0x7F) << 7);
        self.pitch_bend = (value - 8192) as f32 / 8192.0;
    }
}
#[allow(missing_docs)]
impl Channel {
    pub fn is_percussion(&self) -> bool {
        self.is_percussion
    }

    pub fn bank_number(&self) -> i32 {
        self.bank_number
    }

    pub fn patch_number(&self) -> i32 {
        self.patch_number
    }

    /// The key a preset is looked up by.
    pub fn preset_id(&self) -> i32 {
        (self.bank_number << 16) | self.patch_number
    }

    /// Vibrato depth in cents, 0..=50.
    pub fn modulation(&self) -> f32 {
        50.0 / 16383.0 * self.modulation as f32
    }

    /// 0..=1.
    pub fn volume(&self) -> f32 {
        self.volume as f32 / 16383.0
    }

    /// -50 (left) ..= +50 (right).
    pub fn pan(&self) -> f32 {
        100.0 / 16383.0 * self.pan as f32 - 50.0
    }

    /// 0..=1.
    pub fn expression(&self) -> f32 {
        self.expression as f32 / 16383.0
    }

    pub fn hold_pedal(&self) -> bool {
        self.hold_pedal
    }

    /// 0..=1.
    pub fn reverb_send(&self) -> f32 {
        self.reverb_send as f32 / 127.0
    }

    /// 0..=1.
    pub fn chorus_send(&self) -> f32 {
        self.chorus_send as f32 / 127.0
    }

    /// Semitones. The coarse byte counts semitones and the fine byte cents.
    pub fn pitch_bend_range(&self) -> f32 {
        (self.pitch_bend_range >> 7) as f32 + 0.01 * (self.pitch_bend_range & 0x7F) as f32
    }

    /// Channel tuning in semitones.
    pub fn tune(&self) -> f32 {
        self.coarse_tune as f32 + (self.fine_tune as f32 - 8192.0) / 8192.0
    }

    /// The current bend in semitones.
    pub fn pitch_bend(&self) -> f32 {
        self.pitch_bend_range() * self.pitch_bend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn power_on_state() {
        let c = Channel::new_with(false);
        assert_eq!(c.bank_number(), 0);
        assert_eq!(c.patch_number(), 0);
        assert!(approx_eq!(f32, c.volume(), 100.0 * 128.0 / 16383.0));
        assert!(approx_eq!(f32, c.pan(), 0.003, epsilon = 0.01));
        assert!(approx_eq!(f32, c.expression(), 127.0 * 128.0 / 16383.0));
        assert_eq!(c.modulation(), 0.0);
        assert!(!c.hold_pedal());
        assert!(approx_eq!(f32, c.reverb_send(), 40.0 / 127.0));
        assert_eq!(c.chorus_send(), 0.0);
        assert_eq!(c.pitch_bend_range(), 2.0);
        assert_eq!(c.tune(), 0.0);
        assert_eq!(c.pitch_bend(), 0.0);

        let drums = Channel::new_with(true);
        assert_eq!(drums.bank_number(), 128);
        assert_eq!(drums.preset_id(), 128 << 16);
    }

    #[test]
    fn percussion_bank_is_offset() {
        let mut c = Channel::new_with(true);
        c.set_bank(1);
        assert_eq!(c.bank_number(), 129);

        let mut c = Channel::new_with(false);
        c.set_bank(1);
        c.set_patch(5);
        assert_eq!(c.preset_id(), (1 << 16) | 5);
    }

    #[test]
    fn fourteen_bit_registers() {
        let mut c = Channel::new_with(false);
        c.set_volume_coarse(127);
        c.set_volume_fine(127);
        assert_eq!(c.volume(), 1.0);
        c.set_volume_coarse(0);
        assert!(approx_eq!(f32, c.volume(), 127.0 / 16383.0));

        c.set_pan_coarse(0);
        c.set_pan_fine(0);
        assert_eq!(c.pan(), -50.0);
    }

    #[test]
    fn rpn_data_entry() {
        let mut c = Channel::new_with(false);

        // No RPN selected; data entry does nothing.
        c.data_entry_coarse(12);
        assert_eq!(c.pitch_bend_range(), 2.0);

        c.set_rpn_coarse(0);
        c.set_rpn_fine(0);
        c.data_entry_coarse(12);
        c.data_entry_fine(50);
        assert!(approx_eq!(f32, c.pitch_bend_range(), 12.5));

        c.set_rpn_fine(2);
        c.data_entry_coarse(64 + 3);
        assert_eq!(c.tune(), 3.0);

        c.set_rpn_fine(1);
        c.data_entry_coarse(96);
        c.data_entry_fine(0);
        assert!(approx_eq!(f32, c.tune(), 3.5));
    }

    #[test]
    fn pitch_bend_scales_with_range() {
        let mut c = Channel::new_with(false);
        c.set_pitch_bend(0, 64);
        assert_eq!(c.pitch_bend(), 0.0);
        c.set_pitch_bend(0, 0);
        assert_eq!(c.pitch_bend(), -2.0);
        c.set_pitch_bend(0, 96);
        assert_eq!(c.pitch_bend(), 1.0);
    }

    #[test]
    fn reset_all_controllers_keeps_patch_and_tuning() {
        let mut c = Channel::new_with(false);
        c.set_patch(10);
        c.set_volume_coarse(50);
        c.set_rpn_coarse(0);
        c.set_rpn_fine(2);
        c.data_entry_coarse(60);
        c.set_modulation_coarse(100);
        c.set_expression_coarse(10);
        c.set_hold_pedal(127);
        c.set_pitch_bend(0, 0);

        c.reset_all_controllers();
        assert_eq!(c.patch_number(), 10);
        assert_eq!(c.tune(), -4.0);
        assert!(approx_eq!(f32, c.volume(), 50.0 * 128.0 / 16383.0));
        assert_eq!(c.modulation(), 0.0);
        assert!(!c.hold_pedal());
        assert_eq!(c.pitch_bend(), 0.0);

        // The RPN selection is cleared too.
        c.data_entry_coarse(70);
        assert_eq!(c.tune(), -4.0);

        c.reset();
        assert_eq!(c, Channel::new_with(false));
    }
}
