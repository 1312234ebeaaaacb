use anyhow::Context;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, SimpleLogger, TermLogger, TerminalMode};
use std::env;
use std::sync::mpsc;
use std::time::Instant;

mod buttons;
mod chunk;
mod clock;
mod config;
mod device;
mod engine;
mod grid;
mod grid_state;
mod launchpad;
mod lights;
mod loop_state;
mod midi_connection;
mod midi_time;
mod mode;
mod modes;
mod observ;
mod selection;

use clock::Clock;
use config::Config;
use engine::TriggerEngine;
use launchpad::{LaunchpadMessage, LaunchpadParams, LoopGridLaunchpad};

const DEFAULT_CONFIG_PATH: &str = "loop-grid.json";

fn init_logging (level: &str) {
    let level = level.parse().unwrap_or(LevelFilter::Info);
    let log_config = ConfigBuilder::new().build();
    if TermLogger::init(level, log_config.clone(), TerminalMode::Mixed, ColorChoice::Auto).is_err() {
        let _ = SimpleLogger::init(level, log_config);
    }
}

fn main() -> anyhow::Result<()> {
    let config_path = env::args().nth(1).unwrap_or_else(|| String::from(DEFAULT_CONFIG_PATH));
    let config = Config::read_or_create(&config_path)
        .with_context(|| format!("could not load config from {}", config_path))?;
    init_logging(&config.log_level);

    log::info!("MIDI outputs: {:?}", midi_connection::get_outputs()?);
    log::info!("MIDI inputs: {:?}", midi_connection::get_inputs()?);

    let (tx, rx) = mpsc::channel();

    let switch_tx = tx.clone();
    let surface_output = midi_connection::get_shared_output(&config.launchpad_port_name, move || {
        let _ = switch_tx.send(LaunchpadMessage::Switch);
    });

    let trigger_output = midi_connection::get_shared_output(&config.trigger_output.name, || ());
    let engine = TriggerEngine::new(trigger_output, config.trigger_output.channel, &config.chunks);

    let (clock, _clock_input) = Clock::follow(&config.clock_input_port_name);
    let schedule_tx = tx.clone();
    let listener = clock.add_listener(move |range| {
        let _ = schedule_tx.send(LaunchpadMessage::Schedule(range));
    });

    let mut launchpad = LoopGridLaunchpad::new(engine, surface_output, LaunchpadParams::from_config(&config));
    launchpad.add_release(move || {
        clock.remove_listener(listener);
    });
    launchpad.add_grid_state_listener(|state| {
        match serde_json::to_string(state) {
            Ok(json) => log::trace!("grid state {}", json),
            Err(err) => log::warn!("could not serialize grid state: {}", err)
        }
    });

    let input_tx = tx.clone();
    let _surface_input = midi_connection::get_input(&config.launchpad_port_name, move |_stamp, message| {
        let _ = input_tx.send(LaunchpadMessage::Input(message.to_vec()));
    });

    let ports_tx = tx.clone();
    let _port_watch = midi_connection::watch_outputs(move |ports| {
        let _ = ports_tx.send(LaunchpadMessage::PortChoices(ports));
    });

    let shutdown_tx = tx.clone();
    ctrlc::set_handler(move || {
        log::info!("interrupted, shutting down");
        let _ = shutdown_tx.send(LaunchpadMessage::Shutdown);
    }).context("could not install interrupt handler")?;

    drop(tx);

    for message in rx {
        launchpad.handle(message, Instant::now());
        if launchpad.is_disposed() {
            break
        }
    }

    launchpad.dispose();
    Ok(())
}
