// SPDX-License-Identifier: Apache-2.0

//! Support code for the `pushjson-demo` binary, split out as a library so
//! the integration tests can drive the same statistics parser the CLI uses.

pub mod stats;
