//! Model — GcLogConfig.

use serde::{Deserialize, Serialize};

use crate::parser::decorator::parse_datestamp;
use crate::pipeline::{Mode, PipelineConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GcLogConfig {
    pub mode: Mode,
    /// `2021-10-27T10:13:37.450-0400`
    pub jvm_start_date: Option<String>,
    /// Files processed at once by the batch runner
    pub workers: usize,
    pub datestamp_origin_first_line: bool,
}

impl Default for GcLogConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Classify,
            jvm_start_date: None,
            workers: 4,
            datestamp_origin_first_line: true,
        }
    }
}

impl GcLogConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be > 0".to_string());
        }
        if let Some(date) = &self.jvm_start_date {
            if parse_datestamp(date).is_none() {
                return Err(format!(
                    "jvm_start_date must look like 2021-10-27T10:13:37.450-0400, got: {}",
                    date
                ));
            }
        }
        Ok(())
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            mode: self.mode,
            jvm_start_date: self.jvm_start_date.clone(),
            datestamp_origin_first_line: self.datestamp_origin_first_line,
        }
    }
}
