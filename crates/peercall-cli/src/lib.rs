// Copyright 2026 Peercall Authors
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

//! # Peercall CLI
//!
//! Command-line driver for the peercall RPC system.
//!
//! This crate provides the `peercall` binary: one subcommand per standard
//! procedure (`count`, `getenv`, `setenv`, `feed`, `strlen`, `strcat`,
//! `stat`) plus `serve`, which runs the demo server exporting those
//! procedures.
//!
//! ## Architecture
//!
//! The CLI uses the `argh` crate for argument parsing. Call subcommands
//! open a [`peercall_client::Channel`] to the named server, perform one
//! synchronous call bounded by `--timeout-ms`, print a single
//! human-readable line and exit, non-zero on any failure. `serve` wires
//! the standard handlers into a [`peercall_server::DispatchTable`] and
//! blocks in the server loop.

pub mod serve;
