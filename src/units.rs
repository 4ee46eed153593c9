use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static DECADE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*decades?").unwrap());
static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(year|month|week|day|hour|minute)s?(?:\s*ago)?").unwrap()
});
static SIZE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(GB|MB|KB)s?").unwrap());

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
}

impl DateUnit {
    fn name(self) -> &'static str {
        match self {
            DateUnit::Year => "year",
            DateUnit::Month => "month",
            DateUnit::Week => "week",
            DateUnit::Day => "day",
            DateUnit::Hour => "hour",
            DateUnit::Minute => "minute",
        }
    }
}

impl FromStr for DateUnit {
    type Err = ParseUnitErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = s.trim().to_ascii_lowercase();
        match unit.strip_suffix('s').unwrap_or(&unit) {
            "year" => Ok(DateUnit::Year),
            "month" => Ok(DateUnit::Month),
            "week" => Ok(DateUnit::Week),
            "day" => Ok(DateUnit::Day),
            "hour" => Ok(DateUnit::Hour),
            "minute" => Ok(DateUnit::Minute),
            _ => Err(ParseUnitErr::Date(s.into())),
        }
    }
}

/// An "N units ago" upload or comment date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RelativeDate {
    pub value: u32,
    pub unit: DateUnit,
}

impl FromStr for RelativeDate {
    type Err = ParseUnitErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "2 decades ago" shows up on very old uploads.
        if let Some(captures) = DECADE_PATTERN.captures(s) {
            let value: u32 = captures[1]
                .parse()
                .map_err(|_| ParseUnitErr::Date(s.into()))?;
            return Ok(RelativeDate {
                value: value
                    .checked_mul(10)
                    .ok_or_else(|| ParseUnitErr::Date(s.into()))?,
                unit: DateUnit::Year,
            });
        }

        let captures = DATE_PATTERN
            .captures(s)
            .ok_or_else(|| ParseUnitErr::Date(s.into()))?;
        Ok(RelativeDate {
            value: captures[1]
                .parse()
                .map_err(|_| ParseUnitErr::Date(s.into()))?,
            unit: captures[2].parse()?,
        })
    }
}

impl fmt::Display for RelativeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.value == 1 { "" } else { "s" };
        write!(f, "{} {}{plural} ago", self.value, self.unit.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum SizeUnit {
    GB,
    MB,
    KB,
}

impl FromStr for SizeUnit {
    type Err = ParseUnitErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = s.trim().to_ascii_uppercase();
        match unit.strip_suffix('S').unwrap_or(&unit) {
            "GB" => Ok(SizeUnit::GB),
            "MB" => Ok(SizeUnit::MB),
            "KB" => Ok(SizeUnit::KB),
            _ => Err(ParseUnitErr::Size(s.into())),
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeUnit::GB => f.write_str("GB"),
            SizeUnit::MB => f.write_str("MB"),
            SizeUnit::KB => f.write_str("KB"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Size {
    pub value: f64,
    pub unit: SizeUnit,
}

impl FromStr for Size {
    type Err = ParseUnitErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = SIZE_PATTERN
            .captures(s)
            .ok_or_else(|| ParseUnitErr::Size(s.into()))?;
        Ok(Size {
            value: captures[1]
                .parse()
                .map_err(|_| ParseUnitErr::Size(s.into()))?,
            unit: captures[2].parse()?,
        })
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.value, self.unit)
    }
}

#[derive(Clone, Debug, Error)]
pub enum ParseUnitErr {
    #[error("unable to parse relative date: {0}")]
    Date(String),
    #[error("unable to parse size: {0}")]
    Size(String),
}
