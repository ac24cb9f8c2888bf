use std::process::ExitCode;
use log::error;
use weather_notify::initialization::{analysis_backends, init};
use weather_notify::pipeline::{run_analysis_stage, target_day, Analyzer};

fn main() -> ExitCode {
    let (config, keys) = match init() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let (scraper, openai) = match analysis_backends(&config, &keys) {
        Ok(b) => b,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    run_analysis_stage(&config, target_day(&config).date, &Analyzer { cross_checker: &scraper, llm: &openai });

    ExitCode::SUCCESS
}
