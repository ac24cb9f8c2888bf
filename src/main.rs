use std::process::ExitCode;
use log::{error, info};
use weather_notify::config::{ApiKeys, Config};
use weather_notify::errors::InitError;
use weather_notify::initialization::{analysis_backends, init, notifier, weather_sources};
use weather_notify::pipeline::{Analyzer, Pipeline};

fn main() -> ExitCode {
    let (config, keys) = match init() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&config, &keys) {
        Ok(()) => {
            info!("run completed");
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config, keys: &ApiKeys) -> Result<(), InitError> {
    let (openweather, weatherapi) = weather_sources(keys)?;
    let pushover = notifier(config, keys)?;

    let backends = if config.analysis.enabled {
        Some(analysis_backends(config, keys)?)
    } else {
        None
    };
    let analyzer = backends.as_ref()
        .map(|(scraper, openai)| Analyzer { cross_checker: scraper, llm: openai });

    Pipeline::new(config, &openweather, &weatherapi, &pushover, analyzer).run();

    Ok(())
}
