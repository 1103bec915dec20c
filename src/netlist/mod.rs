//! Connectivity model and netlist generation.
//!
//! This module provides everything needed to describe a board's wiring:
//!
//! - [`catalog`]: part templates, looked up by `(category, name)`
//! - [`design`]: parts, pins and nets, and the `connect` operation
//! - [`output`]: the generated [`Netlist`] and its serialisations
//!
//! # Lifecycle
//!
//! A design is built in one forward pass: declare parts, declare nets,
//! connect pins, then call [`Design::generate_netlist`]. The netlist is a
//! snapshot; later changes to the design do not affect it.

pub mod catalog;
pub mod design;
pub mod error;
pub mod output;

pub use catalog::{Catalog, PartTemplate, PinTemplate, PinType};
pub use design::{Design, Net, NetId, Part, PartId, Pin};
pub use error::{NetlistError, NetlistResult};
pub use output::{Component, NetEntry, Netlist, Node, OutputFormat};
