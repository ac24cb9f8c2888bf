use std::fmt;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use crate::manager_scraper::ExternalForecast;
use crate::models::forecast::ForecastDocument;

/// How well the sources agree, as read from the narrative analysis
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentTag {
    Full,
    Partial,
    Divergent,
    Unknown,
}

impl AlignmentTag {
    /// One line shown in notifications
    pub fn headline(&self) -> &'static str {
        match self {
            AlignmentTag::Full => "✅ Sources agree",
            AlignmentTag::Partial => "⚠️ Partial agreement",
            AlignmentTag::Divergent => "❌ Sources diverge",
            AlignmentTag::Unknown => "❔ Alignment unknown",
        }
    }
}

impl fmt::Display for AlignmentTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tag = match self {
            AlignmentTag::Full => "full",
            AlignmentTag::Partial => "partial",
            AlignmentTag::Divergent => "divergent",
            AlignmentTag::Unknown => "unknown",
        };
        write!(f, "{}", tag)
    }
}

/// A tag and the cues that select it, matched case-insensitively
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct AlignmentRule {
    pub tag: AlignmentTag,
    pub cues: Vec<String>,
}

impl AlignmentRule {
    fn new(tag: AlignmentTag, cues: &[&str]) -> AlignmentRule {
        AlignmentRule { tag, cues: cues.iter().map(|c| c.to_string()).collect() }
    }
}

/// Built in rule table, checked in order: divergent, partial, full
pub fn default_rules() -> Vec<AlignmentRule> {
    vec![
        AlignmentRule::new(AlignmentTag::Divergent,
            &["❌", "diverge", "significant discrepanc", "disagree", "conflict", "inconsistent",
              "not consistent", "misaligned", "not aligned", "do not agree", "don't agree", "confidence: low"]),
        AlignmentRule::new(AlignmentTag::Partial,
            &["⚠️", "partial", "minor discrepanc", "some discrepanc", "slight", "confidence: medium"]),
        AlignmentRule::new(AlignmentTag::Full,
            &["✅", "agree", "consistent", "aligned", "confidence: high"]),
    ]
}

/// Returns the tag of the first rule with a cue found in the text, Unknown if none
///
/// # Arguments
///
/// * 'text' - the narrative to classify
/// * 'rules' - ordered rule table
pub fn classify(text: &str, rules: &[AlignmentRule]) -> AlignmentTag {
    let text = text.to_lowercase();

    rules.iter()
        .find(|r| r.cues.iter().any(|c| !c.is_empty() && text.contains(&c.to_lowercase())))
        .map(|r| r.tag)
        .unwrap_or(AlignmentTag::Unknown)
}

/// Text completion backend
pub trait Completion {
    fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Builds the analyst prompt for one city
///
/// # Arguments
///
/// * 'doc' - the aggregated forecast document
/// * 'external' - texts from the cross-check sites, may be empty
pub fn build_prompt(doc: &ForecastDocument, external: &[ExternalForecast]) -> String {
    let numbers = serde_json::json!({
        "date": doc.date,
        "summary": doc.summary,
        "avg_temp": doc.consensus.avg_temp,
        "avg_rain": doc.consensus.avg_rain,
        "high_temp": doc.consensus.high_temp,
        "low_temp": doc.consensus.low_temp,
        "temp_range": doc.consensus.temp_range,
        "rain_range": doc.consensus.rain_range,
        "uncertain": doc.uncertain,
    });

    let mut prompt = format!(
        "You are a weather analyst. Compare forecasts from two APIs for {} and generate a short summary.\n\n\
        Here is the forecast data for tomorrow:\n\n{:#}\n",
        doc.city, numbers);

    if !external.is_empty() {
        prompt.push_str("\nHere is forecast text taken from external websites:\n");
        for e in external {
            if e.source.is_empty() {
                prompt.push_str(&format!("\n{}\n", e.text));
            } else {
                prompt.push_str(&format!("\n[{}]\n{}\n", e.source, e.text));
            }
        }
    }

    prompt.push_str(
        "\nProvide:\n\
        - Overall summary of agreement/disagreement\n\
        - Rain/temperature conflict alerts if any\n\
        - Confidence level (High/Medium/Low)\n\n\
        Format:\n\n\
        🧠 AI Summary: <one short paragraph>\n\
        Confidence: <High/Medium/Low>\n\n\
        Keep it under 5 lines. Don't repeat the city name. Start directly with the summary.\n");

    prompt
}

/// Narrative and tag produced for one city
#[derive(Clone, Debug, PartialEq)]
pub struct Analysis {
    pub comment: String,
    pub alignment: AlignmentTag,
}

/// Runs the completion for a city's document and classifies the answer
///
/// # Arguments
///
/// * 'llm' - the completion backend
/// * 'doc' - the aggregated forecast document
/// * 'external' - texts from the cross-check sites
/// * 'rules' - ordered classifier rules
pub fn analyze(llm: &dyn Completion, doc: &ForecastDocument, external: &[ExternalForecast], rules: &[AlignmentRule]) -> anyhow::Result<Analysis> {
    let prompt = build_prompt(doc, external);
    let comment = llm.complete(&prompt)?;
    let alignment = classify(&comment, rules);

    if alignment == AlignmentTag::Unknown {
        warn!("{}: no alignment cue in analysis", doc.city);
    } else {
        info!("{}: sources classified as {}", doc.city, alignment);
    }

    Ok(Analysis { comment, alignment })
}

/// Applies an analysis to a document, replacing earlier enrichment
pub fn enrich(doc: &mut ForecastDocument, analysis: Analysis) {
    doc.comment = Some(analysis.comment);
    doc.alignment = Some(analysis.alignment);
}
