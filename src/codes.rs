//! Event types and the per-type code ranges the kernel reports bitmaps for.

use std::fmt;

use evdev::{
    AbsoluteAxisCode, KeyCode, LedCode, MiscCode, RelativeAxisCode, SoundCode, SwitchCode,
    SynchronizationCode,
};

/// Highest event type value (`EV_MAX`).
pub const EV_MAX: u16 = 0x1f;

/// Highest absolute axis (`ABS_MAX`); `EVIOCGABS` cannot address anything above it.
pub const ABS_MAX: u16 = 0x3f;

/// Hard ceiling for any per-type maximum; `KEY_MAX` is the largest range the kernel has.
pub const CODE_CEILING: u16 = 0x2ff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventType {
    Synchronization,
    Key,
    Relative,
    Absolute,
    Misc,
    Switch,
    Led,
    Sound,
    Repeat,
    ForceFeedback,
    Power,
    ForceFeedbackStatus,
}

impl EventType {
    pub const ALL: [EventType; 12] = [
        EventType::Synchronization,
        EventType::Key,
        EventType::Relative,
        EventType::Absolute,
        EventType::Misc,
        EventType::Switch,
        EventType::Led,
        EventType::Sound,
        EventType::Repeat,
        EventType::ForceFeedback,
        EventType::Power,
        EventType::ForceFeedbackStatus,
    ];

    pub const fn raw(self) -> u16 {
        match self {
            EventType::Synchronization => 0x00,
            EventType::Key => 0x01,
            EventType::Relative => 0x02,
            EventType::Absolute => 0x03,
            EventType::Misc => 0x04,
            EventType::Switch => 0x05,
            EventType::Led => 0x11,
            EventType::Sound => 0x12,
            EventType::Repeat => 0x14,
            EventType::ForceFeedback => 0x15,
            EventType::Power => 0x16,
            EventType::ForceFeedbackStatus => 0x17,
        }
    }

    pub fn from_raw(raw: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.raw() == raw)
    }

    /// Kernel constant name, e.g. `EV_KEY`.
    pub const fn name(self) -> &'static str {
        match self {
            EventType::Synchronization => "EV_SYN",
            EventType::Key => "EV_KEY",
            EventType::Relative => "EV_REL",
            EventType::Absolute => "EV_ABS",
            EventType::Misc => "EV_MSC",
            EventType::Switch => "EV_SW",
            EventType::Led => "EV_LED",
            EventType::Sound => "EV_SND",
            EventType::Repeat => "EV_REP",
            EventType::ForceFeedback => "EV_FF",
            EventType::Power => "EV_PWR",
            EventType::ForceFeedbackStatus => "EV_FF_STATUS",
        }
    }

    /// Short name used in configuration files, e.g. `KEY`.
    pub fn short_name(self) -> &'static str {
        &self.name()[3..]
    }

    pub fn from_short_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.short_name().eq_ignore_ascii_case(name))
    }

    /// Whether `EVIOCGBIT` answers with a code bitmap for this type.
    /// SYN would return the event-type bitmap again; REP, PWR and FF_STATUS are rejected.
    pub const fn has_code_bitmap(self) -> bool {
        !matches!(
            self,
            EventType::Synchronization
                | EventType::Repeat
                | EventType::Power
                | EventType::ForceFeedbackStatus
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maximum code value per event type, used to size code bitmaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLimits {
    key: u16,
    relative: u16,
    absolute: u16,
    misc: u16,
    switch: u16,
    led: u16,
    sound: u16,
    force_feedback: u16,
}

impl Default for CodeLimits {
    fn default() -> Self {
        // input-event-codes.h
        Self {
            key: 0x2ff,
            relative: 0x0f,
            absolute: ABS_MAX,
            misc: 0x07,
            switch: 0x11,
            led: 0x0f,
            sound: 0x07,
            force_feedback: 0x7f,
        }
    }
}

impl CodeLimits {
    pub fn max_code(&self, ty: EventType) -> Option<u16> {
        match ty {
            EventType::Key => Some(self.key),
            EventType::Relative => Some(self.relative),
            EventType::Absolute => Some(self.absolute),
            EventType::Misc => Some(self.misc),
            EventType::Switch => Some(self.switch),
            EventType::Led => Some(self.led),
            EventType::Sound => Some(self.sound),
            EventType::ForceFeedback => Some(self.force_feedback),
            EventType::Synchronization
            | EventType::Repeat
            | EventType::Power
            | EventType::ForceFeedbackStatus => None,
        }
    }

    /// Overrides the maximum for `ty`. Returns `false` if the type has no code bitmap.
    pub fn set_max_code(&mut self, ty: EventType, max: u16) -> bool {
        let slot = match ty {
            EventType::Key => &mut self.key,
            EventType::Relative => &mut self.relative,
            EventType::Absolute => &mut self.absolute,
            EventType::Misc => &mut self.misc,
            EventType::Switch => &mut self.switch,
            EventType::Led => &mut self.led,
            EventType::Sound => &mut self.sound,
            EventType::ForceFeedback => &mut self.force_feedback,
            _ => return false,
        };
        *slot = max;
        true
    }
}

/// Symbolic name of `code` within `ty`, or its decimal value if unnamed.
pub fn code_name(ty: EventType, code: u16) -> String {
    let name = match ty {
        EventType::Synchronization => format!("{:?}", SynchronizationCode(code)),
        EventType::Key => format!("{:?}", KeyCode::new(code)),
        EventType::Relative => format!("{:?}", RelativeAxisCode(code)),
        EventType::Absolute => format!("{:?}", AbsoluteAxisCode(code)),
        EventType::Misc => format!("{:?}", MiscCode(code)),
        EventType::Switch => format!("{:?}", SwitchCode(code)),
        EventType::Led => format!("{:?}", LedCode(code)),
        EventType::Sound => format!("{:?}", SoundCode(code)),
        _ => return code.to_string(),
    };
    if name.starts_with("unknown") {
        code.to_string()
    } else {
        name
    }
}
