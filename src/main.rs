use std::process::ExitCode;

use strange_attractor::{AttractorVariant, EngineConfig, SelectionError};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = EngineConfig::new();
    if let Some(name) = std::env::args().nth(1) {
        match AttractorVariant::from_name(&name) {
            Some(variant) => config = config.with_variant(variant),
            None => {
                let known: Vec<&str> = AttractorVariant::ALL.iter().map(|v| v.name()).collect();
                log::error!("{} (known: {})", SelectionError::UnknownName(name), known.join(", "));
                return ExitCode::FAILURE;
            }
        }
    }

    if let Err(e) = strange_attractor::run(config) {
        log::error!("{}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
