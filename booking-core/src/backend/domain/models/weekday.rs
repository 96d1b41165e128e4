//! Domain model for a weekday key.
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::backend::domain::errors::ValidationError;

/// Day of week as the backend numbers it: 0 = Sunday, 1 = Monday, ..., 6 = Saturday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct WeekdayKey(u8);

impl WeekdayKey {
    pub const SUNDAY: WeekdayKey = WeekdayKey(0);
    pub const MONDAY: WeekdayKey = WeekdayKey(1);
    pub const TUESDAY: WeekdayKey = WeekdayKey(2);
    pub const WEDNESDAY: WeekdayKey = WeekdayKey(3);
    pub const THURSDAY: WeekdayKey = WeekdayKey(4);
    pub const FRIDAY: WeekdayKey = WeekdayKey(5);
    pub const SATURDAY: WeekdayKey = WeekdayKey(6);

    /// All keys in numeric order (Sunday first)
    pub const ALL: [WeekdayKey; 7] = [
        Self::SUNDAY,
        Self::MONDAY,
        Self::TUESDAY,
        Self::WEDNESDAY,
        Self::THURSDAY,
        Self::FRIDAY,
        Self::SATURDAY,
    ];

    pub fn new(value: u8) -> Option<Self> {
        Self::is_valid(value).then_some(Self(value))
    }

    /// Validate a raw day of week value
    pub fn is_valid(value: u8) -> bool {
        value <= 6
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.weekday().num_days_from_sunday() as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Position inside a Monday-starting week; Sunday is the last day (6)
    pub fn days_from_monday(self) -> u32 {
        if self.0 == 0 {
            6
        } else {
            self.0 as u32 - 1
        }
    }

    /// Order used for weekday chips and columns: Monday through Sunday
    pub fn display_order() -> [WeekdayKey; 7] {
        [
            Self::MONDAY,
            Self::TUESDAY,
            Self::WEDNESDAY,
            Self::THURSDAY,
            Self::FRIDAY,
            Self::SATURDAY,
            Self::SUNDAY,
        ]
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            0 => "Sunday",
            1 => "Monday",
            2 => "Tuesday",
            3 => "Wednesday",
            4 => "Thursday",
            5 => "Friday",
            _ => "Saturday",
        }
    }

    pub fn short_name(self) -> &'static str {
        &self.name()[..3]
    }
}

impl TryFrom<u8> for WeekdayKey {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ValidationError::InvalidWeekday(value as i64))
    }
}

impl TryFrom<i64> for WeekdayKey {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(ValidationError::InvalidWeekday(value))
    }
}

impl From<WeekdayKey> for u8 {
    fn from(key: WeekdayKey) -> Self {
        key.0
    }
}

impl fmt::Display for WeekdayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
