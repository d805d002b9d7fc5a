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

use std::{io, path::PathBuf};

use thiserror::Error;

/// Error for `openrr_grid_planner`
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid argument: {}", .0)]
    InvalidArgument(String),
    #[error("Parameter size mismatch {} != {}", .0, .1)]
    ParameterSizeMismatch(usize, usize),
    #[error("No file {:?} is found ({})", .0, .1)]
    NoFile(PathBuf, #[source] io::Error),
    #[error("Failed to parse {:?} as toml ({})", .0, .1)]
    TomlParseFailure(PathBuf, #[source] toml::de::Error),
}

/// Result for `openrr_grid_planner`
pub type Result<T> = ::std::result::Result<T, Error>;
