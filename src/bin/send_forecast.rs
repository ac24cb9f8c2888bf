use std::process::ExitCode;
use log::error;
use weather_notify::initialization::{init, notifier};
use weather_notify::pipeline::{run_notify_stage, target_day};

fn main() -> ExitCode {
    let (config, keys) = match init() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match notifier(&config, &keys) {
        Ok(pushover) => {
            run_notify_stage(&config, target_day(&config).date, &pushover);
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
