use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    Immediate,
    TempOverride,
    DailySchedule,
    Off,
}

impl OperationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::TempOverride => "temp_override",
            Self::DailySchedule => "daily_schedule",
            Self::Off => "off",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "immediate" => Some(Self::Immediate),
            "temp_override" => Some(Self::TempOverride),
            "daily_schedule" => Some(Self::DailySchedule),
            "off" => Some(Self::Off),
            _ => None,
        }
    }

    pub fn for_user_mode(user_mode: &str) -> Self {
        if user_mode == "smart" {
            Self::TempOverride
        } else {
            Self::Immediate
        }
    }

    pub fn is_display_writable(self) -> bool {
        matches!(self, Self::Immediate | Self::TempOverride)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum SeasonMode {
    #[default]
    Heating,
    Cooling,
}

impl SeasonMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heating => "heating",
            Self::Cooling => "cooling",
        }
    }

    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("cooling") {
            Self::Cooling
        } else {
            Self::Heating
        }
    }
}

impl From<String> for SeasonMode {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<SeasonMode> for &'static str {
    fn from(mode: SeasonMode) -> Self {
        mode.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Reading", into = "String")]
pub struct Celsius(f32);

#[derive(Deserialize)]
#[serde(untagged)]
enum Reading {
    Number(f64),
    Text(String),
}

impl Celsius {
    pub fn new(value: f32) -> Self {
        Self(value)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn whole_degrees(self) -> i32 {
        self.0.trunc() as i32
    }

    pub fn one_decimal(self) -> String {
        format!("{:.1}", self.0)
    }

    pub fn parse(text: &str) -> Option<Self> {
        text.trim()
            .parse::<f32>()
            .ok()
            .filter(|value| value.is_finite())
            .map(Self)
    }
}

impl From<i32> for Celsius {
    fn from(degrees: i32) -> Self {
        Self(degrees as f32)
    }
}

impl TryFrom<Reading> for Celsius {
    type Error = String;

    fn try_from(reading: Reading) -> Result<Self, Self::Error> {
        match reading {
            Reading::Number(value) if value.is_finite() => Ok(Self(value as f32)),
            Reading::Number(value) => Err(format!("temperature {value} is not finite")),
            Reading::Text(text) => {
                Self::parse(&text).ok_or_else(|| format!("invalid temperature `{text}`"))
            }
        }
    }
}

impl From<Celsius> for String {
    fn from(temp: Celsius) -> Self {
        temp.to_string()
    }
}

impl fmt::Display for Celsius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.0}", self.0)
        } else {
            write!(f, "{:.1}", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "FlagRepr", into = "u8")]
pub struct Flag(bool);

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Flag {
    pub fn new(on: bool) -> Self {
        Self(on)
    }

    pub fn is_on(self) -> bool {
        self.0
    }
}

impl TryFrom<FlagRepr> for Flag {
    type Error = String;

    fn try_from(repr: FlagRepr) -> Result<Self, Self::Error> {
        match repr {
            FlagRepr::Bool(on) => Ok(Self(on)),
            FlagRepr::Number(value) => Ok(Self(value != 0.0)),
            FlagRepr::Text(text) => match text.trim() {
                "" | "0" => Ok(Self(false)),
                "1" => Ok(Self(true)),
                other => Err(format!("invalid actuator state `{other}`")),
            },
        }
    }
}

impl From<Flag> for u8 {
    fn from(flag: Flag) -> Self {
        u8::from(flag.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
