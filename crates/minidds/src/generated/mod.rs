// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample types shipped with the crate.

mod hello_world;

pub use hello_world::HelloWorld;
