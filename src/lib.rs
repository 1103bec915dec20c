//! hat-netlist: connectivity declaration and netlist generation for the
//! Autokit HAT.
//!
//! The Autokit HAT sits on a Raspberry Pi header and carries two USB-C
//! receptacles. This library declares its parts and nets and emits the
//! resulting netlist for downstream PCB tooling.
//!
//! # Architecture
//!
//! - **Catalog**: part templates looked up by `(category, name)`
//! - **Design**: parts, pins and nets, joined by an N-ary `connect`
//! - **Netlist**: the immutable snapshot, written as `KiCad`, JSON or CSV
//!
//! Board layout (placement, routing, copper fill) and electrical rule checks
//! are left to the PCB tool that consumes the netlist.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Error types
//! - [`hat`] — The Autokit HAT design
//! - [`netlist`] — Catalog, design model and netlist output

pub mod config;
pub mod error;
pub mod hat;
pub mod netlist;
