// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Aggregator wire protocol: frames and batch packing.

pub mod batch;
pub mod frame;

pub use batch::{plan_batch, BatchPacker, PackedBatch};
pub use frame::{flags, Frame, FrameError, ACK, ACK_SIZE, BATCH_HEADER_SIZE, MAX_BATCH_RECORDS};
