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

use std::{fmt, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::*;

use crate::errors::*;

/// Connectivity of the grid search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NeighborhoodType {
    /// 4-connected, orthogonal moves only
    VonNeumann,
    /// 8-connected, orthogonal and diagonal moves
    Moore,
}

impl FromStr for NeighborhoodType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "von_neumann" | "vonneumann" | "4" => Ok(Self::VonNeumann),
            "moore" | "8" => Ok(Self::Moore),
            _ => Err(Error::InvalidArgument(format!(
                "Unknown neighborhood type selected: {s}"
            ))),
        }
    }
}

impl fmt::Display for NeighborhoodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VonNeumann => f.write_str("von_neumann"),
            Self::Moore => f.write_str("moore"),
        }
    }
}

// Diagonals come before the cardinal directions. Expanding a node in open
// space then always ends with the cardinal moves, so when two parents reach a
// cell with the same cost the back pointer is written consistently.
const DIAGONAL_MOVES: [(isize, isize); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];
const CARDINAL_MOVES: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Neighbor offsets of a grid of a given width
///
/// Build one per search session and rebuild it (see [`Neighborhood::configure`])
/// whenever the grid width or the connectivity changes.
#[derive(Debug, Clone)]
pub struct Neighborhood {
    width: usize,
    kind: NeighborhoodType,
    moves: Vec<(isize, isize)>,
}

impl Neighborhood {
    pub fn new(width: usize, kind: NeighborhoodType) -> Result<Self> {
        if width == 0 || isize::try_from(width).is_err() {
            return Err(Error::InvalidArgument(format!(
                "invalid grid width for neighborhood: {width}"
            )));
        }
        let moves = match kind {
            NeighborhoodType::VonNeumann => CARDINAL_MOVES.to_vec(),
            NeighborhoodType::Moore => DIAGONAL_MOVES
                .iter()
                .chain(CARDINAL_MOVES.iter())
                .copied()
                .collect(),
        };
        debug!("initialized {kind} neighborhood for grid width {width}");
        Ok(Self { width, kind, moves })
    }

    /// Rebuild the offsets if `width` or `kind` differ from the current ones
    pub fn configure(&mut self, width: usize, kind: NeighborhoodType) -> Result<()> {
        if self.width != width || self.kind != kind {
            *self = Self::new(width, kind)?;
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn kind(&self) -> NeighborhoodType {
        self.kind
    }

    /// Flat index offsets in expansion order
    pub fn grid_offsets(&self) -> Vec<isize> {
        // `new` checked that the width fits in isize
        let width = self.width as isize;
        self.moves.iter().map(|(dx, dy)| dx + dy * width).collect()
    }

    /// Valid neighbors of the node at `index`, in expansion order
    ///
    /// `validity_checker` receives every in-grid candidate index and returns a
    /// handle to the neighbor if it can be expanded. Candidates that would leave
    /// the grid through a row edge or fall before the first cell are skipped;
    /// indices past the last row are left to `validity_checker` to reject.
    ///
    /// ```
    /// use openrr_grid_planner::{Neighborhood, NeighborhoodType};
    ///
    /// let neighborhood = Neighborhood::new(3, NeighborhoodType::VonNeumann).unwrap();
    /// let neighbors = neighborhood.neighbors(4, |index| Some(index));
    /// assert_eq!(neighbors, vec![3, 5, 1, 7]);
    /// ```
    pub fn neighbors<T, F>(&self, index: usize, mut validity_checker: F) -> Vec<T>
    where
        F: FnMut(usize) -> Option<T>,
    {
        let x = index % self.width;
        let y = index / self.width;
        let mut neighbors = Vec::with_capacity(self.moves.len());
        for &(dx, dy) in &self.moves {
            let (Some(nx), Some(ny)) = (x.checked_add_signed(dx), y.checked_add_signed(dy)) else {
                continue;
            };
            if nx >= self.width {
                continue;
            }
            if let Some(neighbor) = validity_checker(nx + ny * self.width) {
                neighbors.push(neighbor);
            }
        }
        neighbors
    }
}
