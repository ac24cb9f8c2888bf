use std::time::Duration;
use log::{info, warn};
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use crate::config::{City, Site, MAX_SITES};

/// Max number of characters kept from an extracted block
pub const MAX_TEXT_CHARS: usize = 1000;
pub const NOT_COVERED: &str = "Not covered by any external site";

/// Forecast text taken from one external site, or a placeholder when that failed
#[derive(Clone, Debug, PartialEq)]
pub struct ExternalForecast {
    pub source: String,
    pub text: String,
}

/// Source of third-party forecast text used to cross-check the APIs
pub trait CrossCheck {
    fn cross_check(&self, city: &City) -> Vec<ExternalForecast>;
}

/// Fetches configured forecast sites and extracts a text block from each
pub struct Scraper {
    client: Client,
}

impl Scraper {
    pub fn new() -> Result<Scraper, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("weather-notify/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Scraper { client })
    }

    /// Returns the forecast text of one site, or the site's placeholder on any failure
    ///
    /// # Arguments
    ///
    /// * 'site' - the site to fetch
    fn scrape_site(&self, site: &Site) -> ExternalForecast {
        let text = match self.fetch_html(&site.url) {
            Ok(html) => extract_block(&html, &site.selector),
            Err(e) => {
                warn!("fetching {} failed: {}", site.name, e);
                None
            }
        };

        ExternalForecast {
            source: site.name.clone(),
            text: text.unwrap_or_else(|| failure_text(&site.name)),
        }
    }

    fn fetch_html(&self, url: &str) -> Result<String, String> {
        let res = self.client
            .get(url)
            .send()
            .map_err(|e| format!("get request error: {}", e))?;

        if !res.status().is_success() {
            return Err(format!("http error: {}", res.status()));
        }

        res.text().map_err(|e| e.to_string())
    }
}

impl CrossCheck for Scraper {
    fn cross_check(&self, city: &City) -> Vec<ExternalForecast> {
        if city.sites.is_empty() {
            return vec![ExternalForecast { source: String::new(), text: NOT_COVERED.to_string() }];
        }

        city.sites.iter()
            .take(MAX_SITES)
            .map(|site| {
                let forecast = self.scrape_site(site);
                info!("{}: {} chars from {}", city.name, forecast.text.chars().count(), site.name);
                forecast
            })
            .collect()
    }
}

/// Placeholder used when a site gave nothing usable
pub fn failure_text(site: &str) -> String {
    format!("Could not extract data from {}", site)
}

/// Returns the text of the first element matching the selector, with whitespace collapsed
/// and cut to [`MAX_TEXT_CHARS`]. None if the selector is invalid, nothing matches or the
/// match holds no text.
///
/// # Arguments
///
/// * 'html' - the page
/// * 'selector' - a CSS selector
pub fn extract_block(html: &str, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let document = Html::parse_document(html);

    let text = document
        .select(&selector)
        .next()?
        .text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<&str>>()
        .join(" ");

    if text.is_empty() {
        None
    } else {
        Some(truncate_chars(&text, MAX_TEXT_CHARS))
    }
}

/// Cuts a string to at most `max` characters, never inside a character
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="forecast">
            <h2>Tomorrow</h2>
            <p>Sunny   spells,
               18°C</p>
          </div>
          <table><tr><td>Mon</td><td>12°</td></tr></table>
          <div class="forecast">second</div>
        </body></html>"#;

    #[test]
    fn first_match_with_collapsed_whitespace() {
        assert_eq!(extract_block(PAGE, "div.forecast").unwrap(), "Tomorrow Sunny spells, 18°C");
        assert_eq!(extract_block(PAGE, "table").unwrap(), "Mon 12°");
    }

    #[test]
    fn no_match_or_bad_selector() {
        assert!(extract_block(PAGE, "section.none").is_none());
        assert!(extract_block(PAGE, "div[[").is_none());
        assert!(extract_block("<div class=\"forecast\">   </div>", "div.forecast").is_none());
    }

    #[test]
    fn long_blocks_are_truncated() {
        let html = format!("<table><tr><td>{}</td></tr></table>", "é".repeat(1500));
        let text = extract_block(&html, "table").unwrap();

        assert_eq!(text.chars().count(), MAX_TEXT_CHARS);
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn city_without_sites_is_not_covered() {
        let scraper = Scraper::new().unwrap();
        let city = City { name: "Paris".to_string(), lat: 48.85, long: 2.35, sites: Vec::new() };

        let result = scraper.cross_check(&city);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, NOT_COVERED);
    }

    #[test]
    fn failure_placeholder_names_the_site() {
        assert_eq!(failure_text("YR.no"), "Could not extract data from YR.no");
    }
}
