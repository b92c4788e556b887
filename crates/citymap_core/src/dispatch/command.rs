//! Command and callback parsing.
//!
//! # Invariants
//! - A missing argument parses to `None`; it is never an error.
//! - Arguments are trimmed; inner whitespace is preserved (`New York`).
//! - Unknown commands and plain text parse to `None`.

use once_cell::sync::Lazy;
use regex::Regex;

pub const DELETE_CITY_PREFIX: &str = "del_city_";
pub const SET_COLOR_PREFIX: &str = "set_color_";

static COMMAND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^/([A-Za-z_]+)(?:@[A-Za-z0-9_]+)?(?:\s+(.*))?$").expect("valid command regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    ShowCity(Option<String>),
    RememberCity(Option<String>),
    ShowMyCities,
    DeleteMyCity,
    SetMarkerColor,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        let captures = COMMAND_RE.captures(text.trim())?;
        let name = captures.get(1)?.as_str().to_ascii_lowercase();
        let argument = captures
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|value| !value.is_empty());

        match name.as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "show_city" => Some(Self::ShowCity(argument)),
            "remember_city" => Some(Self::RememberCity(argument)),
            "show_my_cities" => Some(Self::ShowMyCities),
            "delete_my_city" => Some(Self::DeleteMyCity),
            "set_marker_color" => Some(Self::SetMarkerColor),
            _ => None,
        }
    }

    /// Command name without the leading slash, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::ShowCity(_) => "show_city",
            Self::RememberCity(_) => "remember_city",
            Self::ShowMyCities => "show_my_cities",
            Self::DeleteMyCity => "delete_my_city",
            Self::SetMarkerColor => "set_marker_color",
        }
    }
}

/// Payload attached to a selection-list button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    DeleteCity(String),
    /// Raw color code; validated against the palette by the handler.
    SetColor(String),
}

impl Callback {
    pub fn parse(data: &str) -> Option<Self> {
        if let Some(city) = data.strip_prefix(DELETE_CITY_PREFIX) {
            return Some(Self::DeleteCity(city.to_string()));
        }
        data.strip_prefix(SET_COLOR_PREFIX)
            .map(|code| Self::SetColor(code.to_string()))
    }

    pub fn to_data(&self) -> String {
        match self {
            Self::DeleteCity(city) => format!("{DELETE_CITY_PREFIX}{city}"),
            Self::SetColor(code) => format!("{SET_COLOR_PREFIX}{code}"),
        }
    }
}
