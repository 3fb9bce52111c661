extern crate clap;
extern crate env_logger;

use clap::Parser;
use parallel_floyd::cli::Cli;

pub fn main() {
    env_logger::init();
    if let Err(err) = Cli::parse().run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
