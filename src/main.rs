#[macro_use]
extern crate diesel;

use std::env;
use std::process;

use clap::Parser;
use dotenv::dotenv;
use log::error;

use crate::args::CliArgs;
use crate::config::Config;
use crate::data::import::run;
use crate::data::import::source::HttpSource;
use crate::progress::ConsoleProgress;

mod args;
mod config;
mod data;
mod db;
mod progress;
mod utils;

fn main() {
    dotenv().ok();
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args = CliArgs::parse();
    let config = Config::from_env(args.regions);

    let result = HttpSource::new(&config.source_url_template)
        .and_then(|source| run(&config, &source, &mut ConsoleProgress::new()));

    if let Err(err) = result {
        error!("{}", err);
        process::exit(1);
    }
}
