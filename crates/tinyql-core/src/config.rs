use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one `<table>.csv` file per table.
    pub data_dir: PathBuf,
    /// Maximum number of rows per record batch read from storage.
    pub batch_size: usize,
    pub csv_delimiter: u8,
    pub csv_has_header: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("./data"),
            batch_size: 1024,
            csv_delimiter: b',',
            csv_has_header: true,
        }
    }
}

impl Config {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Config {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }

        if !self.csv_delimiter.is_ascii()
            || self.csv_delimiter == b'"'
            || self.csv_delimiter == b'\n'
        {
            return Err(format!(
                "csv_delimiter must be a plain ASCII character, got {:#04x}",
                self.csv_delimiter
            ));
        }

        Ok(())
    }
}
