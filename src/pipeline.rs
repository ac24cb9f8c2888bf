use std::path::{Path, PathBuf};
use chrono::{Local, NaiveDate};
use log::{error, info, warn};
use crate::aggregation::{align, create_summary, unavailable_message, Consensus};
use crate::analysis::{analyze, default_rules, enrich, AlignmentRule, Completion};
use crate::chart::plot_comparison;
use crate::config::{City, Config};
use crate::manager_scraper::CrossCheck;
use crate::models::forecast::{ForecastDocument, Sample};
use crate::persistence::{load_document_for, remove_document, save_document};
use crate::target_hours::{TargetDay, TargetHours};

/// A weather API delivering samples on the target grid
pub trait ForecastSource {
    fn name(&self) -> &str;
    fn fetch(&self, city: &City, day: &TargetDay) -> anyhow::Result<Vec<Sample>>;
}

/// Push channel for the per-city message
pub trait Notifier {
    fn notify(&self, message: &str, image: Option<&Path>) -> anyhow::Result<()>;
}

/// Cross-checker and completion backend used for the narrative analysis
pub struct Analyzer<'a> {
    pub cross_checker: &'a dyn CrossCheck,
    pub llm: &'a dyn Completion,
}

/// Result of the numeric stage for one city
#[derive(Debug)]
pub enum CityOutcome {
    Unavailable,
    Forecast(ForecastDocument),
}

/// Full run: fetch, aggregate, render, persist, optionally analyze, and notify, city by city
pub struct Pipeline<'a> {
    config: &'a Config,
    source_a: &'a dyn ForecastSource,
    source_b: &'a dyn ForecastSource,
    notifier: &'a dyn Notifier,
    analyzer: Option<Analyzer<'a>>,
}

impl<'a> Pipeline<'a> {
    /// Returns a new Pipeline
    ///
    /// # Arguments
    ///
    /// * 'config' - configuration
    /// * 'source_a' - the coarse, interpolated, source
    /// * 'source_b' - the hourly source
    /// * 'notifier' - where messages are pushed
    /// * 'analyzer' - narrative analysis, None to skip it
    pub fn new(
        config: &'a Config,
        source_a: &'a dyn ForecastSource,
        source_b: &'a dyn ForecastSource,
        notifier: &'a dyn Notifier,
        analyzer: Option<Analyzer<'a>>,
    ) -> Pipeline<'a> {
        Pipeline { config, source_a, source_b, notifier, analyzer }
    }

    /// Runs all configured cities for tomorrow
    pub fn run(&self) {
        self.run_for_day(&target_day(self.config));
    }

    /// Runs all configured cities for the given day, a failing city is logged and skipped
    ///
    /// # Arguments
    ///
    /// * 'day' - the target grid
    pub fn run_for_day(&self, day: &TargetDay) {
        info!("forecasting {} for {} cities", day.date, self.config.cities.len());
        for city in &self.config.cities {
            if let Err(e) = self.run_city(city, day) {
                error!("{}: {:#}", city.name, e);
            }
        }
    }

    /// Runs every stage for one city
    ///
    /// # Arguments
    ///
    /// * 'city' - the city
    /// * 'day' - the target grid
    pub fn run_city(&self, city: &City, day: &TargetDay) -> anyhow::Result<()> {
        match self.forecast_city(city, day)? {
            CityOutcome::Unavailable => {
                match remove_document(&self.config.files.docs_dir, &city.name) {
                    Ok(true) => info!("{}: earlier forecast document removed", city.name),
                    Ok(false) => (),
                    Err(e) => error!("{}: {}", city.name, e),
                }
                self.notifier.notify(&unavailable_message(&city.name), None)?;
            },
            CityOutcome::Forecast(mut doc) => {
                if let Some(analyzer) = &self.analyzer {
                    match analyze_city(self.config, analyzer, city, &mut doc) {
                        Ok(()) => {
                            if let Err(e) = save_document(&self.config.files.docs_dir, &doc) {
                                error!("{}: enriched document not saved: {}", city.name, e);
                            }
                        },
                        Err(e) => error!("{}: analysis skipped: {:#}", city.name, e),
                    }
                }
                notify_document(self.notifier, &doc)?;
            },
        }

        Ok(())
    }

    /// Fetches both sources, aligns and aggregates them, renders the chart and saves the
    /// document. If either source gives nothing the city is unavailable and nothing is
    /// rendered or saved, any earlier document is removed by the caller.
    ///
    /// # Arguments
    ///
    /// * 'city' - the city
    /// * 'day' - the target grid
    pub fn forecast_city(&self, city: &City, day: &TargetDay) -> anyhow::Result<CityOutcome> {
        let a = fetch_or_empty(self.source_a, city, day);
        if a.is_empty() {
            warn!("{}: no data from {}", city.name, self.source_a.name());
            return Ok(CityOutcome::Unavailable);
        }
        let b = fetch_or_empty(self.source_b, city, day);
        if b.is_empty() {
            warn!("{}: no data from {}", city.name, self.source_b.name());
            return Ok(CityOutcome::Unavailable);
        }

        let (a, b) = align(a, b);
        let Some(consensus) = Consensus::from_series(&a, &b) else {
            return Ok(CityOutcome::Unavailable);
        };

        let params = &self.config.forecast;
        let uncertain = consensus.is_uncertain(params.uncertain_temp_range, params.uncertain_rain_range);
        let summary = create_summary(&city.name, &consensus, uncertain);

        let chart_path = match plot_comparison(
            &city.name, &a, &b, &params.annotate_hours, &self.config.chart, &self.config.files.chart_dir) {
            Ok(path) => Some(path.display().to_string()),
            Err(e) => {
                error!("{}: {}", city.name, e);
                None
            }
        };

        let doc = ForecastDocument {
            city: city.name.clone(),
            date: day.date,
            generated_at: Local::now(),
            summary,
            consensus,
            uncertain,
            chart_path,
            comment: None,
            alignment: None,
        };
        save_document(&self.config.files.docs_dir, &doc)?;
        info!("{}: avg {:.1}°C, {:.0}% rain{}",
            city.name, consensus.avg_temp, consensus.avg_rain, if uncertain { ", uncertain" } else { "" });

        Ok(CityOutcome::Forecast(doc))
    }
}

/// Target grid for tomorrow in the configured time zone
///
/// # Arguments
///
/// * 'config' - configuration
pub fn target_day(config: &Config) -> TargetDay {
    let hours = TargetHours::new(&config.forecast.target_hours);
    TargetDay::tomorrow(&hours, config.forecast.timezone)
}

/// Separate analyzer run: enriches every city's saved document with a narrative and an
/// alignment tag. A failing city, or one whose document is for another date, is logged and
/// left untouched.
///
/// # Arguments
///
/// * 'config' - configuration
/// * 'date' - forecast date the documents must carry
/// * 'analyzer' - cross-checker and completion backend
pub fn run_analysis_stage(config: &Config, date: NaiveDate, analyzer: &Analyzer) {
    for city in &config.cities {
        let result = load_document_for(&config.files.docs_dir, &city.name, date)
            .map_err(anyhow::Error::from)
            .and_then(|mut doc| {
                analyze_city(config, analyzer, city, &mut doc)?;
                save_document(&config.files.docs_dir, &doc)?;
                Ok(())
            });

        match result {
            Ok(()) => info!("{}: forecast document enriched", city.name),
            Err(e) => error!("{}: {:#}", city.name, e),
        }
    }
}

/// Separate notifier run: pushes every city's saved document. Documents for another date
/// are not sent.
///
/// # Arguments
///
/// * 'config' - configuration
/// * 'date' - forecast date the documents must carry
/// * 'notifier' - where messages are pushed
pub fn run_notify_stage(config: &Config, date: NaiveDate, notifier: &dyn Notifier) {
    for city in &config.cities {
        let result = load_document_for(&config.files.docs_dir, &city.name, date)
            .map_err(anyhow::Error::from)
            .and_then(|doc| notify_document(notifier, &doc));

        if let Err(e) = result {
            error!("{}: {:#}", city.name, e);
        }
    }
}

/// Cross-checks the city and adds the narrative analysis to its document
fn analyze_city(config: &Config, analyzer: &Analyzer, city: &City, doc: &mut ForecastDocument) -> anyhow::Result<()> {
    let external = analyzer.cross_checker.cross_check(city);
    let default;
    let rules: &[AlignmentRule] = match &config.analysis.rules {
        Some(rules) => rules,
        None => {
            default = default_rules();
            &default
        }
    };

    let analysis = analyze(analyzer.llm, doc, &external, rules)?;
    enrich(doc, analysis);

    Ok(())
}

/// Message text for a document: the summary, then the narrative and alignment when present
///
/// # Arguments
///
/// * 'doc' - the forecast document
pub fn compose_message(doc: &ForecastDocument) -> String {
    let mut message = doc.summary.clone();

    if let Some(comment) = &doc.comment {
        message.push_str("\n\n");
        message.push_str(comment);
    }
    if let Some(alignment) = &doc.alignment {
        message.push('\n');
        message.push_str(alignment.headline());
    }

    message
}

/// Pushes a document's message with its chart, when the chart file is there
fn notify_document(notifier: &dyn Notifier, doc: &ForecastDocument) -> anyhow::Result<()> {
    let chart = doc.chart_path.as_ref()
        .map(PathBuf::from)
        .filter(|p| p.exists());
    if doc.chart_path.is_some() && chart.is_none() {
        warn!("{}: chart missing, sending without attachment", doc.city);
    }

    notifier.notify(&compose_message(doc), chart.as_deref())
}

fn fetch_or_empty(source: &dyn ForecastSource, city: &City, day: &TargetDay) -> Vec<Sample> {
    match source.fetch(city, day) {
        Ok(samples) => samples,
        Err(e) => {
            error!("{}: {} fetch failed: {:#}", city.name, source.name(), e);
            Vec::new()
        }
    }
}
