//! Design request model
//!
//! A `DesignRequest` is the snapshot of the housing parameters chosen by the
//! user for one generation cycle. Raw input is clamped into range before a
//! request exists, so every `DesignRequest` is valid by construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Allowed room count
pub const ROOMS_RANGE: (u8, u8) = (1, 10);
/// Allowed bathroom count
pub const BATHROOMS_RANGE: (u8, u8) = (1, 5);
/// Allowed budget in USD
pub const BUDGET_RANGE: (u32, u32) = (10_000, 100_000);

/// Architectural style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Style {
    Modern,
    Minimalist,
    Rustic,
    Industrial,
}

impl Style {
    /// Display name, also used verbatim in prompts
    pub fn name(&self) -> &'static str {
        match self {
            Style::Modern => "Modern",
            Style::Minimalist => "Minimalist",
            Style::Rustic => "Rustic",
            Style::Industrial => "Industrial",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown style name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown style: {0}")]
pub struct UnknownStyle(pub String);

impl FromStr for Style {
    type Err = UnknownStyle;

    /// Parse from string. Accepts the Spanish labels of the original form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "modern" | "moderno" => Ok(Style::Modern),
            "minimalist" | "minimalista" => Ok(Style::Minimalist),
            "rustic" | "rústico" | "rustico" => Ok(Style::Rustic),
            "industrial" => Ok(Style::Industrial),
            _ => Err(UnknownStyle(s.to_string())),
        }
    }
}

impl TryFrom<String> for Style {
    type Error = UnknownStyle;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Style> for String {
    fn from(style: Style) -> Self {
        style.name().to_string()
    }
}

/// Validated housing parameters for one generation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DesignRequest {
    rooms: u8,
    bathrooms: u8,
    style: Style,
    budget: u32,
}

impl DesignRequest {
    /// Build a request from raw input, clamping each number to its range
    pub fn clamped(rooms: i64, bathrooms: i64, style: Style, budget: i64) -> Self {
        Self {
            rooms: clamp_to(rooms, ROOMS_RANGE.0.into(), ROOMS_RANGE.1.into()) as u8,
            bathrooms: clamp_to(bathrooms, BATHROOMS_RANGE.0.into(), BATHROOMS_RANGE.1.into())
                as u8,
            style,
            budget: clamp_to(budget, BUDGET_RANGE.0.into(), BUDGET_RANGE.1.into()) as u32,
        }
    }

    pub fn rooms(&self) -> u8 {
        self.rooms
    }

    pub fn bathrooms(&self) -> u8 {
        self.bathrooms
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }
}

impl Default for DesignRequest {
    /// The form's initial values
    fn default() -> Self {
        Self {
            rooms: 3,
            bathrooms: 2,
            style: Style::Modern,
            budget: 50_000,
        }
    }
}

fn clamp_to(value: i64, min: i64, max: i64) -> i64 {
    value.clamp(min, max)
}

/// Raw form input, before clamping
///
/// Missing fields fall back to the form defaults. Numbers outside `i64` or
/// written as floats are accepted and saturated, so they clamp like any
/// other out-of-range value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DesignForm {
    #[serde(default, deserialize_with = "saturating_int")]
    pub rooms: Option<i64>,
    #[serde(default, deserialize_with = "saturating_int")]
    pub bathrooms: Option<i64>,
    pub style: Option<Style>,
    #[serde(default, deserialize_with = "saturating_int")]
    pub budget: Option<i64>,
}

fn saturating_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(number.map(|n| {
        if let Some(v) = n.as_i64() {
            v
        } else if n.as_u64().is_some() {
            i64::MAX
        } else {
            // `as` saturates at the i64 bounds
            n.as_f64().map_or(0, |f| f.round() as i64)
        }
    }))
}

impl DesignForm {
    /// Snapshot the form into a validated request
    pub fn snapshot(&self) -> DesignRequest {
        let defaults = DesignRequest::default();
        DesignRequest::clamped(
            self.rooms.unwrap_or(defaults.rooms.into()),
            self.bathrooms.unwrap_or(defaults.bathrooms.into()),
            self.style.unwrap_or(defaults.style),
            self.budget.unwrap_or(defaults.budget.into()),
        )
    }
}
