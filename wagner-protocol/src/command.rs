//! Payload interpretation
//!
//! A payload is split on [`FIELD_DELIMITER`] and its numeric fields are
//! turned into a [`SteeringDirective`]:
//!
//! | variant  | payload          | direction        | directive |
//! |----------|------------------|------------------|-----------|
//! | basic    | `CR#<code>`      | `code / 2 - 101` | -         |
//! | extended | `CR#<code>#<v>`  | `code / 2 - 101` | `20 - v`  |
//! | joypad   | `<v>#<code>`     | `code / 2 - 101` | `20 - v`  |
//!
//! The tagged variants open with the "current direction" tag. The phone
//! joypad sends the untagged form: even codes 202..=212 pick catalog codes
//! 0..=5 and the value row 19/20/21 becomes directive 1/0/-1, so
//! `<21#204>` walks forward in reverse. The drive scheduler only gives
//! meaning to a negative directive.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Field separator inside a payload
pub const FIELD_DELIMITER: char = '#';

/// Tag opening every steering payload
pub const CURRENT_DIRECTION_TAG: &str = "CR";

/// Protocol variant spoken on the link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProtocolVariant {
    /// Tag and direction code only
    #[default]
    Basic,
    /// Tag, direction code and a directive value
    Extended,
    /// Untagged directive value followed by the direction code
    Joypad,
}

impl ProtocolVariant {
    /// Frame length for this variant (start marker + payload)
    pub const fn frame_len(self) -> usize {
        match self {
            ProtocolVariant::Basic => 7,
            ProtocolVariant::Extended => 9,
            ProtocolVariant::Joypad => 7,
        }
    }

    /// Number of `#`-separated fields in a payload
    pub const fn field_count(self) -> usize {
        match self {
            ProtocolVariant::Basic | ProtocolVariant::Joypad => 2,
            ProtocolVariant::Extended => 3,
        }
    }
}

/// Latest decoded steering command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SteeringDirective {
    /// Direction id, used as a maneuver code by the scheduler
    pub direction: i32,
    /// Secondary directive id (extended and joypad variants)
    pub directive: Option<i32>,
}

impl SteeringDirective {
    /// Convert a raw direction code into a direction id
    pub const fn direction_from_code(code: i32) -> i32 {
        code / 2 - 101
    }

    /// Convert a raw directive value into a directive id
    pub fn directive_from_value(value: i32) -> Option<i32> {
        20i32.checked_sub(value)
    }

    /// Whether the directive asks for the profile to be driven in reverse
    pub fn is_reverse(&self) -> bool {
        matches!(self.directive, Some(d) if d < 0)
    }
}

/// Stateless payload parser for one protocol variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandInterpreter {
    variant: ProtocolVariant,
}

impl CommandInterpreter {
    /// Create an interpreter for the given variant
    pub const fn new(variant: ProtocolVariant) -> Self {
        Self { variant }
    }

    /// Protocol variant this interpreter expects
    pub fn variant(&self) -> ProtocolVariant {
        self.variant
    }

    /// Parse a payload
    ///
    /// Returns `None` for anything malformed: wrong field count, wrong tag,
    /// non-numeric fields or values whose transform overflows.
    pub fn interpret(&self, payload: &str) -> Option<SteeringDirective> {
        let mut fields = payload.split(FIELD_DELIMITER);

        let (code, directive) = match self.variant {
            ProtocolVariant::Basic => {
                expect_tag(fields.next()?)?;
                (parse_number(fields.next()?)?, None)
            }
            ProtocolVariant::Extended => {
                expect_tag(fields.next()?)?;
                let code = parse_number(fields.next()?)?;
                let value = parse_number(fields.next()?)?;
                (code, Some(SteeringDirective::directive_from_value(value)?))
            }
            ProtocolVariant::Joypad => {
                let value = parse_number(fields.next()?)?;
                let code = parse_number(fields.next()?)?;
                (code, Some(SteeringDirective::directive_from_value(value)?))
            }
        };

        if fields.next().is_some() {
            return None;
        }

        Some(SteeringDirective {
            direction: SteeringDirective::direction_from_code(code),
            directive,
        })
    }
}

fn expect_tag(field: &str) -> Option<()> {
    (field == CURRENT_DIRECTION_TAG).then_some(())
}

fn parse_number(field: &str) -> Option<i32> {
    field.trim().parse().ok()
}
