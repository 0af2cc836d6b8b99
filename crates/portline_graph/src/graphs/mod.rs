// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preset node registries built on the core engine.

pub mod dataflow;
