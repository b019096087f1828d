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

//! Deterministic terrain synthesis for cube-based voxel worlds.
//!
//! The unit of generation is a 16x16x16 "cube" of blocks. For each cube, the
//! generator samples a coarse 5x3x5 noise lattice, conditions it with smoothed
//! per-column biome height envelopes, scales it to world elevation units,
//! expands it to full voxel resolution by trilinear interpolation, and
//! classifies every voxel as stone, water, or air.
//!
//! Generation for a given (seed, cube coordinate) is a pure function of the
//! configured noise and biome lookups; cubes can be generated concurrently in
//! any order.

pub mod biome;
pub mod config;
pub mod cube;
pub mod mapgen;
pub mod noise;
pub mod terrain;
