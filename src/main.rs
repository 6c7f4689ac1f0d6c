use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use env_logger::Builder;
use log::{error, info, LevelFilter};

use crate::kodi_repo_error::KodiRepoError;
use crate::model::Config;
use crate::processing::fetch::GitFetcher;
use crate::processing::repository::create_repository;
use crate::utils::{config_reader, file_utils, ENV_LOG_LEVEL};

mod kodi_repo_error;
mod model;
mod processing;
mod utils;

#[derive(Parser)]
#[command(name = "kodi-repo")]
#[command(version)]
#[command(about = "Create a Kodi add-on repository from git sources", long_about = None)]
struct Args {
    /// Path to create the repository in
    #[arg(short = 't', long = "target")]
    target: Option<String>,

    /// Repository URL then colon then path within the repository
    #[arg(short = 'a', long = "addon")]
    addon: Vec<String>,

    /// The config file
    #[arg(short = 'c', long = "config")]
    config_file: Option<String>,

    /// Log level, e.g. `debug` or `info,kodi_repo::processing=trace`
    #[arg(short = 'l', long = "log-level")]
    log_level: Option<String>,
}

fn main() {
    let args = Args::parse();

    let config_file = args.config_file.as_ref().map(PathBuf::from).or_else(file_utils::get_default_config_file_path);
    let cfg_result = config_file.as_deref().map_or_else(|| Ok(Config::default()), config_reader::read_config);

    let config_log_level = cfg_result.as_ref().ok().and_then(|cfg| cfg.get_log_level().map(String::from));
    init_logger(args.log_level.as_deref(), config_log_level.as_deref());
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    if let Some(build_time) = option_env!("VERGEN_BUILD_TIMESTAMP") {
        info!("Build time: {build_time}");
    }
    if let Some(path) = &config_file {
        info!("Config file: {}", path.display());
    }

    let result = cfg_result.and_then(|mut cfg| {
        cfg.apply_args(args.target.as_deref(), &args.addon)?;
        run(&cfg)
    });
    if let Err(err) = result {
        exit!("{err}");
    }
}

fn run(cfg: &Config) -> Result<(), KodiRepoError> {
    let target_dir = cfg.get_target_dir()?;
    let sources = cfg.get_sources()?;
    info!("Creating repository with {} addons in {}", sources.len(), target_dir.display());
    let fetcher = GitFetcher::new(&cfg.git);
    let summary = create_repository(&fetcher, sources, target_dir)?;
    for addon in &summary.addons {
        info!("  {addon}");
    }
    info!("Repository written to {}", summary.target_dir.display());
    Ok(())
}

fn init_logger(user_log_level: Option<&str>, config_log_level: Option<&str>) {
    let env_log_level = std::env::var(ENV_LOG_LEVEL).ok();

    let mut log_builder = Builder::from_default_env();
    log_builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {:<5} {}",
            buf.timestamp_millis(),
            record.level(),
            record.args()
        )
    });

    // command line > environment > config file > info
    let log_level = user_log_level
        .map(String::from)
        .or(env_log_level)
        .or_else(|| config_log_level.map(String::from))
        .unwrap_or_else(|| "info".to_string());

    if log_level.contains('=') {
        for pair in log_level.split(',').filter(|s| s.contains('=')) {
            let mut kv_iter = pair.split('=').map(str::trim);
            if let (Some(module), Some(level)) = (kv_iter.next(), kv_iter.next()) {
                log_builder.filter_module(module, get_log_level(level));
            }
        }
        // a bare level in the list is the default for everything else
        let default_level = log_level.split(',').map(str::trim).find(|s| !s.contains('=')).unwrap_or("info");
        log_builder.filter_level(get_log_level(default_level));
    } else {
        log_builder.filter_level(get_log_level(&log_level));
    }
    if log_builder.try_init().is_err() {
        error!("Logger already initialized");
    }
}

fn get_log_level(log_level: &str) -> LevelFilter {
    match log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}
