// Copyright 2024 The cubeworld Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use cubeworld_core::coordinates::{BlockCoordinate, CubeCoordinate};

use crate::cube::Cube;

pub trait MapgenInterface: Send + Sync {
    /// Generate a cube using this map generator.
    ///
    /// Args:
    ///     coord: The coordinate of the cube to generate.
    ///     cube: The cube to fill.
    ///
    /// Implementations must be deterministic: for a fixed seed and coordinate,
    /// repeated calls (including calls interleaved or concurrent with the
    /// generation of other cubes) produce identical contents. The driver
    /// guarantees that each `Cube` instance is exclusive to one in-flight
    /// generation; implementations take `&self` and may be shared freely
    /// across worker threads.
    ///
    /// Errors indicate an unsatisfied input contract (e.g. a biome lookup
    /// returning a short grid near a world edge); no partial terrain should be
    /// relied upon after a failure.
    fn fill_cube(&self, coord: CubeCoordinate, cube: &mut Cube) -> Result<()>;

    /// Prints debugging information regarding map generation. The definition
    /// of this is up to the implementor, and can include whatever information
    /// is most useful for developing this specific mapgen.
    ///
    /// By default, does nothing.
    fn dump_debug(&self, _pos: BlockCoordinate) {}
}
