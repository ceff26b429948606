use crate::{
    config::ControlVisibility,
    live::LiveState,
    types::{Celsius, Flag, SeasonMode},
    weather::WeatherReport,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempReadout {
    pub integer: String,
    pub fraction: String,
}

impl Default for TempReadout {
    fn default() -> Self {
        Self {
            integer: "00".to_string(),
            fraction: "0".to_string(),
        }
    }
}

impl TempReadout {
    pub fn current(temp: Celsius) -> Self {
        let text = temp.one_decimal();
        match text.split_once('.') {
            Some((integer, fraction)) => Self {
                integer: integer.to_string(),
                fraction: fraction.to_string(),
            },
            None => Self {
                integer: text,
                fraction: "0".to_string(),
            },
        }
    }

    pub fn target(temp: Celsius) -> Self {
        Self {
            integer: temp.whole_degrees().to_string(),
            fraction: "0".to_string(),
        }
    }

    pub fn fraction_label(&self) -> String {
        format!("{}°", self.fraction)
    }

    pub fn value(&self) -> Celsius {
        Celsius::parse(&format!("{}.{}", self.integer, self.fraction))
            .unwrap_or_else(|| Celsius::from(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indicator {
    #[default]
    Hidden,
    Off,
    On,
}

impl Indicator {
    pub fn new(visible: bool, state: Flag) -> Self {
        match (visible, state.is_on()) {
            (false, _) => Self::Hidden,
            (true, true) => Self::On,
            (true, false) => Self::Off,
        }
    }

    fn glyph(self) -> &'static str {
        match self {
            Self::Hidden => " ",
            Self::Off => "o",
            Self::On => "*",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonIcon {
    Winter,
    Summer,
}

impl SeasonIcon {
    pub fn for_mode(mode: SeasonMode) -> Self {
        match mode {
            SeasonMode::Cooling => Self::Summer,
            SeasonMode::Heating => Self::Winter,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Winter => "winter",
            Self::Summer => "summer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherView {
    pub icon_url: String,
    pub exterior_c: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayModel {
    pub current: TempReadout,
    pub target: TempReadout,
    pub target_editing: bool,
    pub control1: Indicator,
    pub control2: Indicator,
    pub season: Option<SeasonIcon>,
    pub weather: Option<WeatherView>,
    pub clock: String,
}

impl Default for DisplayModel {
    fn default() -> Self {
        Self {
            current: TempReadout::default(),
            target: TempReadout::default(),
            target_editing: false,
            control1: Indicator::Hidden,
            control2: Indicator::Hidden,
            season: None,
            weather: None,
            clock: "00:00".to_string(),
        }
    }
}

impl DisplayModel {
    pub fn apply_live_state(&mut self, live: &LiveState, controls: ControlVisibility) -> bool {
        let before = self.clone();

        self.current = TempReadout::current(live.tempc);
        self.target = TempReadout::target(live.tempt);
        self.control1 = Indicator::new(controls.control1, live.state1);
        self.control2 = Indicator::new(controls.control2, live.state2);
        self.season = Some(SeasonIcon::for_mode(live.mode));

        *self != before
    }

    pub fn apply_weather(&mut self, report: &WeatherReport, icon_base_url: &str) -> bool {
        let view = WeatherView {
            icon_url: report.icon_url(icon_base_url),
            exterior_c: report.exterior_temp_c,
        };
        let changed = self.weather.as_ref() != Some(&view);
        self.weather = Some(view);
        changed
    }

    pub fn set_clock(&mut self, hour: u32, minute: u32) -> bool {
        let clock = format!("{hour:02}:{minute:02}");
        let changed = self.clock != clock;
        self.clock = clock;
        changed
    }

    pub fn show_candidate(&mut self, candidate: Celsius) {
        self.target = TempReadout::target(candidate);
        self.target_editing = true;
    }

    pub fn finish_editing(&mut self) -> bool {
        std::mem::replace(&mut self.target_editing, false)
    }

    pub fn render_line(&self) -> String {
        let mut line = format!(
            "{} | now {}.{} | set {}{}.{}",
            self.clock,
            self.current.integer,
            self.current.fraction_label(),
            if self.target_editing { ">" } else { "" },
            self.target.integer,
            self.target.fraction_label(),
        );

        line.push_str(&format!(
            " | [{}][{}]",
            self.control1.glyph(),
            self.control2.glyph()
        ));
        if let Some(season) = self.season {
            line.push_str(&format!(" | {}", season.label()));
        }
        if let Some(weather) = &self.weather {
            line.push_str(&format!(" | out {}°", weather.exterior_c));
        }
        line
    }
}
