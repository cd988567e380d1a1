//! This crate contains the source code for the binary of the A* search viewer.

#![expect(
    clippy::cargo_common_metadata,
    reason = "Temporary allow during development."
)]
#![expect(
    unused_crate_dependencies,
    reason = "The dependencies are used in the library crate."
)]

use astar_viewer::{file_loader, headless, init_logging, App, Args, Config};
use clap::Parser as _;
use color_eyre::{
    eyre::{OptionExt as _, Result},
    install,
};

fn main() -> Result<()> {
    install()?;

    let config = Config::from_args(Args::parse())?;
    init_logging(&config)?;
    let maps = file_loader::load_maps(&config)?;

    if config.headless {
        let map = maps.first().ok_or_eyre("no map to search")?;
        println!("{}", headless::run(&config, map)?);
        return Ok(());
    }

    let mut terminal = ratatui::init();
    let result = App::new(config, maps).and_then(|mut app| app.run(&mut terminal));
    ratatui::restore();

    result
}
