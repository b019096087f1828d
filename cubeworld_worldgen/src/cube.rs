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

use cubeworld_core::block_id::special_block_defs::AIR_ID;
use cubeworld_core::block_id::BlockId;
use cubeworld_core::coordinates::{CubeCoordinate, CubeOffset};

/// In-memory representation of a single 16x16x16 terrain cube.
///
/// This type is meant for use by map generators and bulk accesses that would
/// be inefficient when done block-by-block; higher layers are expected to
/// present a unified world interface that abstracts over cube boundaries.
pub struct Cube {
    coord: CubeCoordinate,
    block_ids: Box<[u32; 4096]>,
    dirty: bool,
}

impl Cube {
    /// Creates an all-air cube at the given coordinate.
    pub fn new(coord: CubeCoordinate) -> Self {
        Self {
            coord,
            block_ids: Box::new([AIR_ID.0; 4096]),
            dirty: false,
        }
    }

    pub fn coordinate(&self) -> CubeCoordinate {
        self.coord
    }

    /// Sets the block at the given offset within the cube.
    pub fn set_block(&mut self, offset: CubeOffset, block: BlockId) {
        let old_block = BlockId(self.block_ids[offset.as_index()]);
        self.block_ids[offset.as_index()] = block.into();
        if old_block != block {
            self.dirty = true;
        }
    }

    #[inline]
    pub fn get_block(&self, offset: CubeOffset) -> BlockId {
        BlockId(self.block_ids[offset.as_index()])
    }

    /// Raw id array, indexed by [`CubeOffset::as_index`]. Intended for bulk
    /// consumers (storage, meshing) after generation completes.
    pub fn block_ids(&self) -> &[u32; 4096] {
        &self.block_ids
    }

    /// True if any block differs from what the cube was created with.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
