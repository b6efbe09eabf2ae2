use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Defaults for a run, read from the environment (and `.env`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub alpha: f64,                  // 0.05
    pub proportion: f64,             // 0.95
    pub result_dir: Option<PathBuf>, // no files written when unset

    // Saved chart geometry
    pub plot_width_in: f64,  // 11
    pub plot_height_in: f64, // 8
    pub plot_dpi: u32,       // 600
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            alpha: get("TOLERANCE_ALPHA", "0.05")
                .parse()
                .context("TOLERANCE_ALPHA must be a number")?,
            proportion: get("TOLERANCE_PROPORTION", "0.95")
                .parse()
                .context("TOLERANCE_PROPORTION must be a number")?,
            result_dir: lookup("TOLERANCE_RESULT_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            plot_width_in: get("TOLERANCE_PLOT_WIDTH_IN", "11")
                .parse()
                .context("TOLERANCE_PLOT_WIDTH_IN must be a number")?,
            plot_height_in: get("TOLERANCE_PLOT_HEIGHT_IN", "8")
                .parse()
                .context("TOLERANCE_PLOT_HEIGHT_IN must be a number")?,
            plot_dpi: get("TOLERANCE_PLOT_DPI", "600")
                .parse()
                .context("TOLERANCE_PLOT_DPI must be a positive integer")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Same ranges as the interactive form: alpha in [0.01, 0.10] and the
    /// proportion in [0.01, 0.99].
    pub fn validate(&self) -> Result<()> {
        if !(0.01..=0.10).contains(&self.alpha) {
            bail!("TOLERANCE_ALPHA must be between 0.01 and 0.10, got {}", self.alpha);
        }
        if !(0.01..=0.99).contains(&self.proportion) {
            bail!(
                "TOLERANCE_PROPORTION must be between 0.01 and 0.99, got {}",
                self.proportion
            );
        }
        if !(self.plot_width_in > 0.0 && self.plot_height_in > 0.0) {
            bail!(
                "plot size must be positive, got {}x{} inches",
                self.plot_width_in,
                self.plot_height_in
            );
        }
        if self.plot_dpi == 0 {
            bail!("TOLERANCE_PLOT_DPI must be positive");
        }
        Ok(())
    }

    /// Canvas size in pixels.
    pub fn plot_size_px(&self) -> (u32, u32) {
        let dpi = self.plot_dpi as f64;
        (
            (self.plot_width_in * dpi).round() as u32,
            (self.plot_height_in * dpi).round() as u32,
        )
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            proportion: 0.95,
            result_dir: None,
            plot_width_in: 11.0,
            plot_height_in: 8.0,
            plot_dpi: 600,
        }
    }
}
