use std::fmt;

use time::{
    format_description::well_known::Rfc3339, macros::offset, Duration, OffsetDateTime, Time,
    UtcOffset,
};

/// Japan Standard Time. Fixed offset, no daylight saving.
pub const JST: UtcOffset = offset!(+9);

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl Window {
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start <= instant && instant < self.end
    }

    /// RFC 3339 rendering of both bounds, in UTC and in `local`.
    pub fn describe(&self, local: UtcOffset) -> Result<WindowLabels, time::error::Format> {
        Ok(WindowLabels {
            start_utc: self.start.format(&Rfc3339)?,
            end_utc: self.end.format(&Rfc3339)?,
            start_local: self.start.to_offset(local).format(&Rfc3339)?,
            end_local: self.end.to_offset(local).format(&Rfc3339)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowLabels {
    pub start_utc: String,
    pub end_utc: String,
    pub start_local: String,
    pub end_local: String,
}

impl fmt::Display for WindowLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {} [start, end)", self.start_utc, self.end_utc)
    }
}

/// Yesterday in JST as a UTC window.
pub fn yesterday_window(now: OffsetDateTime) -> Window {
    yesterday_window_at(now, JST)
}

/// The calendar day before the one `now` falls on at `offset`.
///
/// The offset is applied as plain arithmetic; this is only correct for zones
/// without daylight saving.
pub fn yesterday_window_at(now: OffsetDateTime, offset: UtcOffset) -> Window {
    let local_today_start = now.to_offset(offset).replace_time(Time::MIDNIGHT);
    let local_yesterday_start = local_today_start - Duration::days(1);
    Window {
        start: local_yesterday_start.to_offset(UtcOffset::UTC),
        end: local_today_start.to_offset(UtcOffset::UTC),
    }
}
