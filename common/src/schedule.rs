use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, TimeZone, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::Celsius;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    pub fn from_chrono(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }

    fn matches(self, label: &str) -> bool {
        label.trim().eq_ignore_ascii_case(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSlot {
    pub start: String,
    pub stop: String,
    pub temp: Celsius,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaySchedule {
    pub weekday: String,
    #[serde(default)]
    pub times_of_operation: Vec<TimeSlot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DailySchedule(pub Vec<DaySchedule>);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveSlot {
    pub temp: Celsius,
    pub start_epoch: i64,
    pub stop_epoch: i64,
}

impl ActiveSlot {
    pub fn contains(&self, epoch: i64) -> bool {
        (self.start_epoch..self.stop_epoch).contains(&epoch)
    }
}

impl TimeSlot {
    fn bounds_on(&self, now: DateTime<FixedOffset>) -> Option<(i64, i64)> {
        let start = parse_clock(&self.start, 0)?;
        let stop = parse_clock(&self.stop, 59)?;
        let offset = now.offset();
        let date = now.date_naive();

        let start = offset
            .from_local_datetime(&date.and_time(start))
            .single()?;
        let stop = offset.from_local_datetime(&date.and_time(stop)).single()?;
        Some((start.timestamp(), stop.timestamp()))
    }
}

impl DailySchedule {
    // Overlapping slots: the last listed one wins.
    pub fn active_slot(&self, now: DateTime<FixedOffset>) -> Option<ActiveSlot> {
        let today = DayOfWeek::from_chrono(now.weekday());
        let now_epoch = now.timestamp();

        self.0
            .iter()
            .filter(|day| today.matches(&day.weekday))
            .flat_map(|day| day.times_of_operation.iter())
            .filter_map(|slot| {
                let (start_epoch, stop_epoch) = slot.bounds_on(now)?;
                Some(ActiveSlot {
                    temp: slot.temp,
                    start_epoch,
                    stop_epoch,
                })
            })
            .filter(|slot| slot.contains(now_epoch))
            .last()
    }
}

fn parse_clock(value: &str, second: u32) -> Option<NaiveTime> {
    let (hour, minute) = value.trim().split_once(':')?;
    NaiveTime::from_hms_opt(
        hour.trim().parse().ok()?,
        minute.trim().parse().ok()?,
        second,
    )
}
