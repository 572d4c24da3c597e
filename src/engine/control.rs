//! Logical control identifiers and their canonical text form.
//!
//! Internally every control is a tagged [`LogicalControlId`]; the legacy
//! string form (`"3"` for button 3, `"1-"` for the negative half of axis 1)
//! only exists at the storage and matching boundary.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Deflection direction of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    /// Direction of a raw axis value. Zero counts as positive.
    pub fn of(value: f32) -> Self {
        if value >= 0.0 {
            Sign::Plus
        } else {
            Sign::Minus
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Sign::Plus => Sign::Minus,
            Sign::Minus => Sign::Plus,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sign::Plus => write!(f, "+"),
            Sign::Minus => write!(f, "-"),
        }
    }
}

/// Identifies one logical control of a gamepad: a physical button by index,
/// or one sign of an analog axis acting as a virtual button.
///
/// The two signs of an axis are distinct controls, so one axis contributes
/// two independent entries to the control state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalControlId {
    Button(usize),
    AxisDirection(usize, Sign),
}

impl fmt::Display for LogicalControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalControlId::Button(index) => write!(f, "{}", index),
            LogicalControlId::AxisDirection(index, sign) => write!(f, "{}{}", index, sign),
        }
    }
}

/// Failure to parse a canonical control string.
#[derive(Debug, Error, PartialEq)]
#[error("Invalid control identifier: {0:?}")]
pub struct ParseControlError(pub String);

impl FromStr for LogicalControlId {
    type Err = ParseControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digits, sign) = match s.as_bytes().last() {
            Some(b'+') => (&s[..s.len() - 1], Some(Sign::Plus)),
            Some(b'-') => (&s[..s.len() - 1], Some(Sign::Minus)),
            _ => (s, None),
        };

        let index: usize = digits
            .parse()
            .map_err(|_| ParseControlError(s.to_string()))?;

        Ok(match sign {
            Some(sign) => LogicalControlId::AxisDirection(index, sign),
            None => LogicalControlId::Button(index),
        })
    }
}
