//! Calendar-day keys in the fixed civil zone (America/Los_Angeles).
//!
//! Only the instant -> date conversion knows about the zone. Shifting a key by
//! N days is plain calendar arithmetic on the date and ignores DST entirely;
//! stored rows depend on that, so keep the two steps separate.

use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use time::{
    format_description::FormatItem,
    macros::{format_description, offset},
    Date, Duration, OffsetDateTime, Time, UtcOffset,
};
use time_tz::{timezones, Offset, TimeZone};

const DAY_KEY_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Pacific standard time, UTC-8.
const PST: UtcOffset = offset!(-8);
/// Pacific daylight time, UTC-7.
const PDT: UtcOffset = offset!(-7);

/// `YYYY-MM-DD` civil date in America/Los_Angeles.
///
/// Ordering is chronological, which matches the lexicographic order of the
/// rendered strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(Date);

impl DayKey {
    /// Civil date of `instant` in the fixed zone.
    pub fn of(instant: OffsetDateTime) -> Self {
        DayKey(instant.to_offset(pacific_offset(instant)).date())
    }

    pub fn date(self) -> Date {
        self.0
    }

    /// Adds `delta_days` (may be negative) in the naive calendar. Saturates at
    /// the representable date range.
    pub fn shift(self, delta_days: i64) -> Self {
        let shifted = delta_days
            .checked_mul(86_400)
            .and_then(|secs| self.0.checked_add(Duration::seconds(secs)))
            .unwrap_or(if delta_days < 0 { Date::MIN } else { Date::MAX });
        DayKey(shifted)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid day key {0:?}, expected YYYY-MM-DD")]
pub struct InvalidDayKey(pub String);

impl FromStr for DayKey {
    type Err = InvalidDayKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 10 {
            return Err(InvalidDayKey(s.to_string()));
        }
        Date::parse(s, DAY_KEY_FORMAT)
            .map(DayKey)
            .map_err(|_| InvalidDayKey(s.to_string()))
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Source of "now" for request handling. Injected so tests can pin the day.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    fn today(&self) -> DayKey {
        DayKey::of(self.now())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// UTC offset of America/Los_Angeles at `instant`, from the bundled tz
/// database (so historical rule changes are honoured).
pub fn pacific_offset(instant: OffsetDateTime) -> UtcOffset {
    timezones::db::america::LOS_ANGELES
        .get_offset_utc(&instant)
        .to_utc()
}

/// Time left until the next civil midnight in the fixed zone.
pub fn duration_until_next_day(now: OffsetDateTime) -> Duration {
    let next = DayKey::of(now).shift(1).date();
    // Midnight never falls inside a transition (those happen at 02:00), so
    // exactly one offset is self-consistent.
    let midnight = [PDT, PST]
        .into_iter()
        .map(|offset| next.with_time(Time::MIDNIGHT).assume_offset(offset))
        .find(|candidate| pacific_offset(*candidate) == candidate.offset())
        .unwrap_or_else(|| next.with_time(Time::MIDNIGHT).assume_offset(PST));
    midnight - now
}
