use chrono::{DateTime, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Deserializer, Serialize, de};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Local hour separating the morning bucket from the afternoon bucket.
pub const PERIOD_BOUNDARY_HOUR: u32 = 9;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TimePeriod {
    Morning,
    Afternoon,
}

/// Accepts any casing ("morning", "MORNING"), same as `FromStr`.
impl<'de> Deserialize<'de> for TimePeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .parse()
            .map_err(|_| de::Error::unknown_variant(&raw, &["morning", "afternoon"]))
    }
}

impl TimePeriod {
    /// Buckets a wall-clock time. The time must already be in the school's
    /// local zone; nothing here converts it.
    pub fn classify(time: NaiveTime) -> Self {
        if time.hour() < PERIOD_BOUNDARY_HOUR {
            TimePeriod::Morning
        } else {
            TimePeriod::Afternoon
        }
    }

    /// Period of a zoned timestamp, read off its local wall clock.
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self::classify(now.time())
    }

    pub fn contains(self, time: NaiveTime) -> bool {
        Self::classify(time) == self
    }
}
