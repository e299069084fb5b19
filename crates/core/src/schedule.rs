//! Schedule entry vocabulary shared by the repository layer and tests.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Which weeks of the academic calendar a timeslot applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekParity {
    Odd,
    Even,
    #[default]
    Both,
}

impl WeekParity {
    /// Column value stored in `schedule_entries.parity`.
    pub fn as_str(self) -> &'static str {
        match self {
            WeekParity::Odd => "odd",
            WeekParity::Even => "even",
            WeekParity::Both => "both",
        }
    }

    /// Parse a stored column value, rejecting unknown strings.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "odd" => Ok(WeekParity::Odd),
            "even" => Ok(WeekParity::Even),
            "both" => Ok(WeekParity::Both),
            other => Err(CoreError::Validation(format!(
                "unknown week parity '{other}'"
            ))),
        }
    }
}
