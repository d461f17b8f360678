//! Built-in device catalogs.
//!
//! Each module defines one catalog: the prompt shapes, identification
//! patterns, and operational commands for a family of devices. Catalogs
//! are registered at startup in the order listed here.

pub mod arista_eos;
pub mod cisco_asa;
pub mod cisco_ios;
pub mod cisco_nxos;
