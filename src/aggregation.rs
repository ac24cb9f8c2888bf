use serde::{Deserialize, Serialize};
use crate::models::forecast::Sample;
use crate::target_hours::interpolate_at;

/// Consensus statistics over two sources' samples for one city and day
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Consensus {
    pub avg_temp: f64,
    pub avg_rain: f64,
    pub high_temp: f64,
    pub low_temp: f64,
    /// Absolute difference between the sources' mean temperatures
    pub temp_range: f64,
    /// Absolute difference between the sources' mean rain probabilities
    pub rain_range: f64,
}

impl Consensus {
    /// Computes consensus numbers from two sample series. Averages are averages of the
    /// per-source means, so both sources weigh the same regardless of sample count.
    ///
    /// Returns None if either series is empty.
    ///
    /// # Arguments
    ///
    /// * 'a' - samples from the first source
    /// * 'b' - samples from the second source
    pub fn from_series(a: &[Sample], b: &[Sample]) -> Option<Consensus> {
        let temp_a = mean(a.iter().map(|s| s.temp))?;
        let temp_b = mean(b.iter().map(|s| s.temp))?;
        let rain_a = mean(a.iter().map(|s| s.rain))?;
        let rain_b = mean(b.iter().map(|s| s.rain))?;

        let (low_temp, high_temp) = a.iter().chain(b.iter())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(mn, mx), s| (mn.min(s.temp), mx.max(s.temp)));

        Some(Consensus {
            avg_temp: (temp_a + temp_b) / 2.0,
            avg_rain: (rain_a + rain_b) / 2.0,
            high_temp,
            low_temp,
            temp_range: (temp_a - temp_b).abs(),
            rain_range: (rain_a - rain_b).abs(),
        })
    }

    /// True if the sources disagree more than allowed, strictly greater than comparison
    ///
    /// # Arguments
    ///
    /// * 'max_temp_range' - allowed difference in mean temperature (°C)
    /// * 'max_rain_range' - allowed difference in mean rain probability (percentage points)
    pub fn is_uncertain(&self, max_temp_range: f64, max_rain_range: f64) -> bool {
        self.temp_range > max_temp_range || self.rain_range > max_rain_range
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { None } else { Some(sum / count as f64) }
}

/// Makes sure both series agree on the midnight sample.
///
/// If only one series has a sample at hour 0 its values are copied into the other series,
/// if none has it, hour 0 is dropped from both. Both series are returned sorted by time.
///
/// # Arguments
///
/// * 'a' - samples from the first source
/// * 'b' - samples from the second source
pub fn reconcile_midnight(mut a: Vec<Sample>, mut b: Vec<Sample>) -> (Vec<Sample>, Vec<Sample>) {
    let a_midnight = a.iter().find(|s| s.hour() == 0).copied();
    let b_midnight = b.iter().find(|s| s.hour() == 0).copied();

    match (a_midnight, b_midnight) {
        (None, Some(m)) => a.push(m),
        (Some(m), None) => b.push(m),
        (None, None) => {
            a.retain(|s| s.hour() != 0);
            b.retain(|s| s.hour() != 0);
        }
        (Some(_), Some(_)) => {}
    }

    a.sort_by(|x, y| x.time.cmp(&y.time));
    b.sort_by(|x, y| x.time.cmp(&y.time));

    (a, b)
}

/// Fills hours that one series has and the other lacks, by interpolating within the series
/// that lacks them. Both series end up covering the same times.
///
/// # Arguments
///
/// * 'a' - samples from the first source, sorted by time
/// * 'b' - samples from the second source, sorted by time
pub fn fill_missing_hours(a: Vec<Sample>, b: Vec<Sample>) -> (Vec<Sample>, Vec<Sample>) {
    let filled_a = fill_from(&a, &b);
    let filled_b = fill_from(&b, &a);

    (filled_a, filled_b)
}

fn fill_from(series: &[Sample], other: &[Sample]) -> Vec<Sample> {
    let mut result = series.to_vec();
    for s in other {
        if !series.iter().any(|x| x.time == s.time) {
            if let Some(filled) = interpolate_at(series, s.time) {
                result.push(filled);
            }
        }
    }
    result.sort_by(|x, y| x.time.cmp(&y.time));

    result
}

/// Reconciles midnight and fills missing hours so both series are aligned on the same times
///
/// # Arguments
///
/// * 'a' - samples from the first source
/// * 'b' - samples from the second source
pub fn align(a: Vec<Sample>, b: Vec<Sample>) -> (Vec<Sample>, Vec<Sample>) {
    let (a, b) = reconcile_midnight(a, b);
    fill_missing_hours(a, b)
}

/// Returns the per-time average of two aligned series, only for times present in both
///
/// # Arguments
///
/// * 'a' - samples from the first source
/// * 'b' - samples from the second source
pub fn average_line(a: &[Sample], b: &[Sample]) -> Vec<Sample> {
    a.iter()
        .filter_map(|x| {
            b.iter()
                .find(|y| y.time == x.time)
                .map(|y| Sample::new(x.time, (x.temp + y.temp) / 2.0, (x.rain + y.rain) / 2.0))
        })
        .collect()
}

/// Maps average rain probability to a condition emoji
///
/// # Arguments
///
/// * 'avg_rain' - average rain probability in percent
pub fn condition_emoji(avg_rain: f64) -> &'static str {
    if avg_rain > 30.0 {
        "🌧️"
    } else if avg_rain > 5.0 {
        "☁️"
    } else {
        "☀️"
    }
}

/// Formats the short, human-readable summary for a city
///
/// # Arguments
///
/// * 'city' - name of the city
/// * 'consensus' - the consensus numbers
/// * 'uncertain' - whether to flag the forecast as uncertain
pub fn create_summary(city: &str, consensus: &Consensus, uncertain: bool) -> String {
    let mut summary = format!(
        "{}: {} Avg {:.1}°C ({:.0}°C range), {:.0}% rain ({:.0}% range)\nHigh {:.0}°C / Low {:.0}°C",
        city, condition_emoji(consensus.avg_rain),
        consensus.avg_temp, consensus.temp_range,
        consensus.avg_rain, consensus.rain_range,
        consensus.high_temp, consensus.low_temp);

    if uncertain {
        summary += "\n⚠️ Forecast uncertain";
    }

    summary
}

/// Message sent when a city has no usable data from one of the sources
pub fn unavailable_message(city: &str) -> String {
    format!("{}: Weather data unavailable.", city)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::Europe::Paris;
    use crate::target_hours::{TargetDay, TargetHours};

    fn series(hours: &[u32], values: &[(f64, f64)]) -> Vec<Sample> {
        let day = TargetDay::for_date(
            &TargetHours::new(hours), NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(), Paris);
        day.slots().iter().zip(values).map(|(s, (t, r))| Sample::new(s.time, *t, *r)).collect()
    }

    fn source_a() -> Vec<Sample> {
        series(&[9, 12, 15, 18, 21],
               &[(10.0, 10.0), (14.0, 5.0), (16.0, 0.0), (13.0, 20.0), (9.0, 40.0)])
    }

    fn source_b() -> Vec<Sample> {
        series(&[9, 12, 15, 18, 21],
               &[(11.0, 15.0), (13.0, 0.0), (17.0, 5.0), (12.0, 15.0), (10.0, 45.0)])
    }

    #[test]
    fn consensus_of_end_to_end_scenario() {
        let c = Consensus::from_series(&source_a(), &source_b()).unwrap();

        let mean_a: f64 = (10.0 + 14.0 + 16.0 + 13.0 + 9.0) / 5.0;
        let mean_b: f64 = (11.0 + 13.0 + 17.0 + 12.0 + 10.0) / 5.0;
        assert!((c.avg_temp - (mean_a + mean_b) / 2.0).abs() < 1e-9);
        let rain_a: f64 = (10.0 + 5.0 + 0.0 + 20.0 + 40.0) / 5.0;
        let rain_b: f64 = (15.0 + 0.0 + 5.0 + 15.0 + 45.0) / 5.0;
        assert!((c.avg_rain - (rain_a + rain_b) / 2.0).abs() < 1e-9);
        assert_eq!(c.high_temp, 17.0);
        assert_eq!(c.low_temp, 9.0);
        assert!((c.temp_range - (mean_a - mean_b).abs()).abs() < 1e-9);
        assert!(!c.is_uncertain(3.0, 20.0));
    }

    #[test]
    fn average_is_mean_of_means_not_pooled() {
        let a = series(&[9, 12], &[(10.0, 0.0), (20.0, 0.0)]);
        let b = series(&[9], &[(30.0, 0.0)]);
        let c = Consensus::from_series(&a, &b).unwrap();

        // pooled would be 20.0
        assert_eq!(c.avg_temp, 22.5);
    }

    #[test]
    fn reordering_samples_does_not_change_average() {
        let mut a = source_a();
        let b = source_b();
        let before = Consensus::from_series(&a, &b).unwrap();
        a.reverse();
        a.swap(0, 2);
        let after = Consensus::from_series(&a, &b).unwrap();

        assert!((before.avg_temp - after.avg_temp).abs() < 1e-9);
        assert!((before.avg_rain - after.avg_rain).abs() < 1e-9);
    }

    #[test]
    fn ranges_are_never_negative() {
        let c1 = Consensus::from_series(&source_a(), &source_b()).unwrap();
        let c2 = Consensus::from_series(&source_b(), &source_a()).unwrap();

        assert!(c1.temp_range >= 0.0 && c1.rain_range >= 0.0);
        assert_eq!(c1.temp_range, c2.temp_range);
        assert_eq!(c1.rain_range, c2.rain_range);
    }

    #[test]
    fn empty_series_gives_no_consensus() {
        assert!(Consensus::from_series(&[], &source_b()).is_none());
        assert!(Consensus::from_series(&source_a(), &[]).is_none());
    }

    #[test]
    fn uncertainty_is_strictly_greater_than() {
        let mut c = Consensus::from_series(&source_a(), &source_b()).unwrap();

        c.temp_range = 3.0;
        c.rain_range = 20.0;
        assert!(!c.is_uncertain(3.0, 20.0));

        c.temp_range = 3.01;
        assert!(c.is_uncertain(3.0, 20.0));

        c.temp_range = 0.0;
        c.rain_range = 20.5;
        assert!(c.is_uncertain(3.0, 20.0));
    }

    #[test]
    fn midnight_is_copied_from_the_source_that_has_it() {
        let a = series(&[9, 12, 15, 18, 21], &[(10.0, 0.0), (12.0, 0.0), (14.0, 0.0), (12.0, 0.0), (10.0, 0.0)]);
        let b = series(&[9, 12, 15, 18, 21, 0],
                       &[(11.0, 0.0), (13.0, 0.0), (15.0, 0.0), (13.0, 0.0), (11.0, 0.0), (7.5, 35.0)]);

        let (a, b) = reconcile_midnight(a, b);

        assert_eq!(a.len(), b.len());
        let a_mid = a.iter().find(|s| s.hour() == 0).unwrap();
        let b_mid = b.iter().find(|s| s.hour() == 0).unwrap();
        assert_eq!(a_mid, b_mid);
        assert_eq!((a_mid.temp, a_mid.rain), (7.5, 35.0));
        assert_eq!(a.last().unwrap().hour(), 0);
    }

    #[test]
    fn midnight_copy_works_both_ways() {
        let a = series(&[21, 0], &[(10.0, 0.0), (6.0, 10.0)]);
        let b = series(&[21], &[(11.0, 0.0)]);

        let (a, b) = reconcile_midnight(a, b);

        assert_eq!(b.len(), 2);
        assert_eq!(b[1].temp, 6.0);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn missing_hours_are_interpolated() {
        let a = source_a();
        let b = series(&[9, 15, 18, 21], &[(11.0, 10.0), (17.0, 20.0), (12.0, 15.0), (10.0, 45.0)]);

        let (a, b) = align(a, b);

        assert_eq!(a.len(), 5);
        assert_eq!(b.len(), 5);
        let noon = b.iter().find(|s| s.hour() == 12).unwrap();
        assert!((noon.temp - 14.0).abs() < 1e-9);
        assert!((noon.rain - 15.0).abs() < 1e-9);
    }

    #[test]
    fn average_line_pairs_equal_times() {
        let avg = average_line(&source_a(), &source_b());

        assert_eq!(avg.len(), 5);
        assert_eq!(avg[0].temp, 10.5);
        assert_eq!(avg[2].hour(), 15);
        assert_eq!(avg[2].temp, 16.5);
    }

    #[test]
    fn summary_format() {
        let c = Consensus {
            avg_temp: 14.34, avg_rain: 12.0, high_temp: 17.2, low_temp: 8.6,
            temp_range: 1.2, rain_range: 5.0,
        };

        let summary = create_summary("Paris", &c, false);
        assert_eq!(summary, "Paris: ☁️ Avg 14.3°C (1°C range), 12% rain (5% range)\nHigh 17°C / Low 9°C");

        let summary = create_summary("Paris", &c, true);
        assert!(summary.ends_with("\n⚠️ Forecast uncertain"));
    }

    #[test]
    fn condition_thresholds() {
        assert_eq!(condition_emoji(31.0), "🌧️");
        assert_eq!(condition_emoji(30.0), "☁️");
        assert_eq!(condition_emoji(5.0), "☀️");
    }

    #[test]
    fn sample_rain_is_clamped() {
        let t = Paris.with_ymd_and_hms(2025, 6, 14, 9, 0, 0).unwrap();
        assert_eq!(Sample::new(t, 10.0, -3.0).rain, 0.0);
    }
}
