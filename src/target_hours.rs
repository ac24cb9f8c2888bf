use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use crate::models::forecast::Sample;

/// The fixed, ordered set of hours of day that both sources are aligned to.
///
/// Hour 0 stands for the midnight closing the day, so a grid of `[9, 12, 15, 18, 21, 0]`
/// runs chronologically from tomorrow morning until the following midnight.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetHours {
    hours: Vec<u32>,
}

impl TargetHours {
    /// Returns a new TargetHours, hours outside 0-23 are dropped
    ///
    /// # Arguments
    ///
    /// * 'hours' - hours of day in display order
    pub fn new(hours: &[u32]) -> TargetHours {
        TargetHours { hours: hours.iter().copied().filter(|h| *h < 24).collect() }
    }

    pub fn hours(&self) -> &[u32] {
        &self.hours
    }

    /// Tick label for an hour, midnight is shown as `00`
    pub fn label(hour: u32) -> String {
        if hour == 0 {
            "00".to_string()
        } else {
            hour.to_string()
        }
    }
}

/// One point on the target grid for a specific day
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Slot {
    pub hour: u32,
    pub time: DateTime<Tz>,
}

/// The target grid materialized for one calendar day in one time zone
#[derive(Clone, Debug)]
pub struct TargetDay {
    pub date: NaiveDate,
    pub tz: Tz,
    slots: Vec<Slot>,
}

impl TargetDay {
    /// Returns the target grid for tomorrow as seen from the given time zone
    ///
    /// # Arguments
    ///
    /// * 'hours' - the target hours
    /// * 'tz' - the time zone all hour comparisons are made in
    pub fn tomorrow(hours: &TargetHours, tz: Tz) -> TargetDay {
        let today = Utc::now().with_timezone(&tz).date_naive();
        let date = today.succ_opt().unwrap_or(today);

        TargetDay::for_date(hours, date, tz)
    }

    /// Returns the target grid for the given date. Slots that don't exist in local time
    /// (daylight saving gaps) are left out.
    ///
    /// # Arguments
    ///
    /// * 'hours' - the target hours
    /// * 'date' - the calendar day
    /// * 'tz' - the time zone the hours are expressed in
    pub fn for_date(hours: &TargetHours, date: NaiveDate, tz: Tz) -> TargetDay {
        let mut slots = hours.hours()
            .iter()
            .filter_map(|&hour| {
                let day = if hour == 0 { date + TimeDelta::days(1) } else { date };
                let naive = day.and_hms_opt(hour, 0, 0)?;
                let time = tz.from_local_datetime(&naive).earliest()?;
                Some(Slot { hour, time })
            })
            .collect::<Vec<Slot>>();
        slots.sort_by(|a, b| a.time.cmp(&b.time));

        TargetDay { date, tz, slots }
    }

    /// Slots in chronological order
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Returns the slot at exactly the given time, if any
    pub fn slot_at(&self, time: DateTime<Tz>) -> Option<&Slot> {
        self.slots.iter().find(|s| s.time == time)
    }
}

/// Returns a sample at the given time by linear, time weighted, interpolation between the two
/// nearest points. If the time is outside the range of the points, the nearest point's values
/// are used.
///
/// # Arguments
///
/// * 'points' - samples sorted by time
/// * 'time' - the time to produce a sample for
pub fn interpolate_at(points: &[Sample], time: DateTime<Tz>) -> Option<Sample> {
    let first = points.first()?;
    let last = points.last()?;

    if time <= first.time {
        return Some(Sample::new(time, first.temp, first.rain));
    }
    if time >= last.time {
        return Some(Sample::new(time, last.temp, last.rain));
    }

    points.windows(2)
        .find(|w| w[0].time <= time && time <= w[1].time)
        .map(|w| {
            let (before, after) = (&w[0], &w[1]);
            let span = (after.time - before.time).num_seconds() as f64;
            if span <= 0.0 {
                return Sample::new(time, before.temp, before.rain);
            }
            let f = (time - before.time).num_seconds() as f64 / span;

            Sample::new(
                time,
                before.temp + (after.temp - before.temp) * f,
                before.rain + (after.rain - before.rain) * f)
        })
}
