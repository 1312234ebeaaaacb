use serde::{Deserialize, Serialize};
use serde_json::to_writer_pretty;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use crate::chunk::Chunk;
use crate::grid::{Coords, Shape};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse: {0}")]
    Json(#[from] serde_json::Error)
}

impl Config {
    pub fn read<P: AsRef<Path>> (filepath: P) -> Result<Self, ConfigError> {
        let file = File::open(filepath)?;
        let reader = BufReader::new(file);

        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }

    pub fn write<P: AsRef<Path>> (&self, filepath: P) -> Result<(), ConfigError> {
        to_writer_pretty(&File::create(filepath)?, self)?;
        Ok(())
    }

    /// Reads the file, or writes out the defaults if there is none yet.
    pub fn read_or_create<P: AsRef<Path>> (filepath: P) -> Result<Self, ConfigError> {
        if filepath.as_ref().exists() {
            Config::read(filepath)
        } else {
            let config = Config::default();
            config.write(filepath)?;
            Ok(config)
        }
    }
}

impl Default for Config {
    fn default () -> Self {
        Config {
            launchpad_port_name: String::from("Launchpad Mini"),
            clock_input_port_name: String::from("UM-ONE"),
            trigger_output: MidiPortConfig {
                name: String::from("UM-ONE"),
                channel: 10
            },
            chunks: vec![
                Chunk {
                    id: String::from("drums"),
                    coords: Coords::new(0, 0),
                    shape: Shape::new(2, 8),
                    trigger_ids: vec![36, 38, 42, 46, 39, 45, 48, 50]
                },
                Chunk {
                    id: String::from("keys"),
                    coords: Coords::new(4, 0),
                    shape: Shape::new(4, 8),
                    trigger_ids: (48..80).collect()
                }
            ],
            no_repeat: vec![],
            repeat_lengths: [1, 2, 3, 4, 6, 8, 12, 16],
            default_repeat_length: 2,
            flash_duration_ms: 100,
            log_level: String::from("info")
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub launchpad_port_name: String,
    pub clock_input_port_name: String,
    pub trigger_output: MidiPortConfig,
    pub chunks: Vec<Chunk>,
    pub no_repeat: Vec<usize>,
    pub repeat_lengths: [u32; 8],
    pub default_repeat_length: u32,
    pub flash_duration_ms: u64,
    pub log_level: String
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MidiPortConfig {
    pub name: String,
    pub channel: u8
}
