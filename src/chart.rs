use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use log::{info, warn};
use plotters::prelude::*;
use plotters::style::register_font;
use crate::aggregation::average_line;
use crate::config::ChartParameters;
use crate::errors::ChartError;
use crate::models::forecast::Sample;
use crate::target_hours::TargetHours;

const SIZE: (u32, u32) = (1000, 500);
const ORANGE: RGBColor = RGBColor(255, 165, 0);

const FONT_CANDIDATES: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
];
const BOLD_FONT_CANDIDATES: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
];

static FONTS: OnceLock<bool> = OnceLock::new();

/// Path of the comparison chart for a city
///
/// # Arguments
///
/// * 'chart_dir' - directory charts are written to
/// * 'city' - name of the city
pub fn chart_path(chart_dir: &str, city: &str) -> PathBuf {
    Path::new(chart_dir).join(format!("{}_comparison.png", city.to_lowercase()))
}

/// Renders the two sources and their average for one city and returns the written file.
///
/// Temperatures go on the left axis, rain probabilities on a right axis fixed to 0-100.
/// The averaged temperature is annotated at the given hours. When no font can be loaded
/// the series are drawn without any text.
///
/// # Arguments
///
/// * 'city' - name of the city, used for the caption and file name
/// * 'a' - aligned samples from the first source
/// * 'b' - aligned samples from the second source
/// * 'annotate_hours' - hours where the average temperature is written out
/// * 'params' - font configuration
/// * 'chart_dir' - directory to write to, created if missing
pub fn plot_comparison(
    city: &str,
    a: &[Sample],
    b: &[Sample],
    annotate_hours: &[u32],
    params: &ChartParameters,
    chart_dir: &str,
) -> Result<PathBuf, ChartError> {
    if a.is_empty() || a.len() != b.len() {
        return Err(ChartError(format!("series for {} are not aligned ({} vs {})", city, a.len(), b.len())));
    }

    fs::create_dir_all(chart_dir)?;
    let path = chart_path(chart_dir, city);
    let with_text = fonts_ready(params);

    render(&path, city, a, b, annotate_hours, with_text)?;
    info!("chart for {} written to {}", city, path.display());

    Ok(path)
}

/// Tick labels for the x axis, one per sample, midnight shown as `00`
pub fn tick_labels(series: &[Sample]) -> Vec<String> {
    series.iter().map(|s| TargetHours::label(s.hour())).collect()
}

/// Positions and values of the averaged temperature annotations
///
/// # Arguments
///
/// * 'avg' - the averaged series
/// * 'annotate_hours' - hours to annotate
pub fn annotations(avg: &[Sample], annotate_hours: &[u32]) -> Vec<(usize, f64)> {
    avg.iter()
        .enumerate()
        .filter(|(_, s)| annotate_hours.contains(&s.hour()))
        .map(|(i, s)| (i, s.temp))
        .collect()
}

fn render(
    path: &Path,
    city: &str,
    a: &[Sample],
    b: &[Sample],
    annotate_hours: &[u32],
    with_text: bool,
) -> Result<(), ChartError> {
    let n = a.len() as i32;
    let avg = average_line(a, b);
    let labels = tick_labels(a);

    let (low, high) = a.iter().chain(b.iter())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| (lo.min(s.temp), hi.max(s.temp)));

    let root = BitMapBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(&root);
    builder.margin(15);
    if with_text {
        builder
            .caption(format!("{} Tomorrow – Temp & Rain", city), ("sans-serif", 24))
            .x_label_area_size(40)
            .y_label_area_size(50)
            .right_y_label_area_size(50);
    }

    let mut chart = builder
        .build_cartesian_2d((0..n).into_segmented(), (low - 2.0)..(high + 2.0))?
        .set_secondary_coord((0..n).into_segmented(), 0.0..100.0);

    if with_text {
        chart.configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len())
            .x_label_formatter(&|v: &SegmentValue<i32>| match v {
                SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                    labels.get(*i as usize).cloned().unwrap_or_default()
                },
                SegmentValue::Last => String::new(),
            })
            .x_desc("Hour")
            .y_desc("Temperature (°C)")
            .axis_desc_style(("sans-serif", 16).into_font().color(&RED))
            .draw()?;

        chart.configure_secondary_axes()
            .y_desc("Rain Probability (%)")
            .draw()?;
    }

    chart.draw_series(LineSeries::new(points(a, |s| s.temp), RED.stroke_width(2)).point_size(3))?
        .label("Temp OpenWeather")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
    chart.draw_series(LineSeries::new(points(b, |s| s.temp), ORANGE.stroke_width(2)).point_size(3))?
        .label("Temp WeatherAPI")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ORANGE));
    chart.draw_series(LineSeries::new(points(&avg, |s| s.temp), BLACK.stroke_width(1)).point_size(3))?
        .label("Avg Temp")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

    chart.draw_secondary_series(LineSeries::new(points(a, |s| s.rain), CYAN.stroke_width(1)).point_size(2))?
        .label("Rain% OpenWeather")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], CYAN));
    chart.draw_secondary_series(LineSeries::new(points(b, |s| s.rain), BLUE.stroke_width(1)).point_size(2))?
        .label("Rain% WeatherAPI")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    if with_text {
        let bold = FontDesc::new(FontFamily::SansSerif, 16.0, FontStyle::Bold);
        chart.draw_series(
            annotations(&avg, annotate_hours)
                .into_iter()
                .map(|(i, temp)| {
                    EmptyElement::at((SegmentValue::CenterOf(i as i32), temp))
                        + Text::new(format!("{:.1}°C", temp), (-20, -25), bold.clone())
                }))?;

        chart.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;

    Ok(())
}

fn points(series: &[Sample], value: fn(&Sample) -> f64) -> Vec<(SegmentValue<i32>, f64)> {
    series.iter()
        .enumerate()
        .map(|(i, s)| (SegmentValue::CenterOf(i as i32), value(s)))
        .collect()
}

/// Registers fonts for chart text once per process, returns false if none could be loaded
fn fonts_ready(params: &ChartParameters) -> bool {
    *FONTS.get_or_init(|| {
        let Some(regular) = load_font(params.font_path.as_deref(), &FONT_CANDIDATES) else {
            warn!("no usable font found, charts are drawn without text");
            return false;
        };
        let bold = load_font(params.bold_font_path.as_deref(), &BOLD_FONT_CANDIDATES).unwrap_or(regular);

        let registered = register_font("sans-serif", FontStyle::Normal, regular).is_ok()
            && register_font("sans-serif", FontStyle::Bold, bold).is_ok();
        if !registered {
            warn!("font could not be registered, charts are drawn without text");
        }

        registered
    })
}

/// Reads the configured font, or the first readable candidate. Font data lives for the
/// rest of the process.
fn load_font(configured: Option<&str>, candidates: &[&str]) -> Option<&'static [u8]> {
    configured.into_iter()
        .chain(candidates.iter().copied())
        .find_map(|p| fs::read(p).ok())
        .map(|bytes| -> &'static [u8] { Box::leak(bytes.into_boxed_slice()) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Paris;

    fn series(temps: &[f64], rains: &[f64]) -> Vec<Sample> {
        [9, 12, 15, 18, 21].iter()
            .zip(temps.iter().zip(rains.iter()))
            .map(|(h, (t, r))| Sample::new(Paris.with_ymd_and_hms(2025, 6, 14, *h, 0, 0).unwrap(), *t, *r))
            .collect()
    }

    #[test]
    fn renders_one_chart_per_city() {
        let dir = tempfile::tempdir().unwrap();
        let chart_dir = dir.path().to_str().unwrap();
        let a = series(&[14.0, 18.0, 21.0, 20.0, 17.0], &[0.0, 10.0, 20.0, 40.0, 5.0]);
        let b = series(&[15.0, 19.0, 22.0, 20.5, 16.0], &[5.0, 10.0, 30.0, 50.0, 0.0]);

        let path = plot_comparison("Paris", &a, &b, &[15, 21], &ChartParameters::default(), chart_dir).unwrap();

        assert_eq!(path, dir.path().join("paris_comparison.png"));
        let files = fs::read_dir(dir.path()).unwrap().collect::<Vec<_>>();
        assert_eq!(files.len(), 1);
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn existing_chart_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let chart_dir = dir.path().to_str().unwrap();
        let path = chart_path(chart_dir, "Brussels");
        fs::write(&path, b"old").unwrap();

        let a = series(&[10.0, 12.0, 14.0, 13.0, 11.0], &[60.0, 70.0, 80.0, 50.0, 20.0]);
        let b = series(&[11.0, 12.5, 13.0, 12.0, 10.0], &[55.0, 65.0, 90.0, 60.0, 30.0]);
        plot_comparison("Brussels", &a, &b, &[15, 21], &ChartParameters::default(), chart_dir).unwrap();

        assert_ne!(fs::read(&path).unwrap(), b"old".to_vec());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn average_is_annotated_at_requested_hours() {
        let a = series(&[14.0, 18.0, 21.0, 20.0, 17.0], &[0.0; 5]);
        let b = series(&[15.0, 19.0, 22.0, 21.0, 16.0], &[0.0; 5]);

        let marks = annotations(&average_line(&a, &b), &[15, 21]);
        assert_eq!(marks, vec![(2, 21.5), (4, 16.5)]);
        assert_eq!(format!("{:.1}°C", marks[0].1), "21.5°C");
    }

    #[test]
    fn midnight_tick_is_labelled_00() {
        let mut a = series(&[14.0, 18.0, 21.0, 20.0, 17.0], &[0.0; 5]);
        a.push(Sample::new(Paris.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap(), 12.0, 0.0));

        assert_eq!(tick_labels(&a), vec!["9", "12", "15", "18", "21", "00"]);
    }

    #[test]
    fn unaligned_series_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let a = series(&[14.0, 18.0], &[0.0, 10.0]);

        let result = plot_comparison("Paris", &a, &[], &[15], &ChartParameters::default(), dir.path().to_str().unwrap());
        assert!(result.is_err());
    }
}
