/*
Copyright 2017 Takashi Ogura

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{errors::*, graph::*, smoother::SmootherParams};

/// Settings of the grid search
#[derive(Clone, Serialize, Deserialize, Debug, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GridSearchConfig {
    #[serde(default = "default_neighborhood")]
    pub neighborhood: NeighborhoodType,
    /// Allow the search to expand cells with no information
    #[serde(default = "default_allow_unknown")]
    pub allow_unknown: bool,
    /// Cost of one step through free space, scales the heuristic
    #[serde(default = "default_neutral_cost")]
    pub neutral_cost: f32,
}

fn default_neighborhood() -> NeighborhoodType {
    NeighborhoodType::Moore
}

fn default_allow_unknown() -> bool {
    true
}

fn default_neutral_cost() -> f32 {
    50.0
}

impl Default for GridSearchConfig {
    fn default() -> Self {
        Self {
            neighborhood: default_neighborhood(),
            allow_unknown: default_allow_unknown(),
            neutral_cost: default_neutral_cost(),
        }
    }
}

impl GridSearchConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.neutral_cost.is_finite() && self.neutral_cost >= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "neutral_cost must be finite and non-negative but {}",
                self.neutral_cost
            )));
        }
        Ok(())
    }

    /// Neighborhood for a grid of `width` columns
    pub fn neighborhood(&self, width: usize) -> Result<Neighborhood> {
        Neighborhood::new(width, self.neighborhood)
    }
}

/// Configuration of the grid search and the smoother
#[derive(Clone, Serialize, Deserialize, Debug, JsonSchema, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GridPlannerConfig {
    #[serde(default)]
    pub search: GridSearchConfig,
    #[serde(default)]
    pub smoother: SmootherParams,
}

impl GridPlannerConfig {
    /// Load a TOML file
    pub fn try_new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str(
            &std::fs::read_to_string(&path)
                .map_err(|e| Error::NoFile(path.as_ref().to_owned(), e))?,
            &path,
        )
    }

    /// Parse a TOML document, `path` is used for error messages
    pub fn from_str<P: AsRef<Path>>(s: &str, path: P) -> Result<Self> {
        let config: GridPlannerConfig =
            toml::from_str(s).map_err(|e| Error::TomlParseFailure(path.as_ref().to_owned(), e))?;
        config.search.validate()?;
        config.smoother.validate()?;
        Ok(config)
    }
}
