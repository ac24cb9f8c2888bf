use chrono::{DateTime, Local, NaiveDate, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use crate::aggregation::Consensus;
use crate::analysis::AlignmentTag;

/// One forecast value for one source at one target hour
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub time: DateTime<Tz>,
    pub temp: f64,
    pub rain: f64,
}

impl Sample {
    /// Returns a new sample, rain probability is clamped to be non-negative
    ///
    /// # Arguments
    ///
    /// * 'time' - the time the sample is valid for
    /// * 'temp' - temperature in °C
    /// * 'rain' - rain probability in percent
    pub fn new(time: DateTime<Tz>, temp: f64, rain: f64) -> Sample {
        Sample { time, temp, rain: rain.max(0.0) }
    }

    /// Hour of day in the sample's own time zone
    pub fn hour(&self) -> u32 {
        self.time.hour()
    }
}

/// The per-city document handed over between pipeline invocations
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ForecastDocument {
    pub city: String,
    pub date: NaiveDate,
    pub generated_at: DateTime<Local>,
    pub summary: String,
    #[serde(flatten)]
    pub consensus: Consensus,
    pub uncertain: bool,
    pub chart_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentTag>,
}
