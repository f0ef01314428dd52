//! Inbound adapters (driving side).
//!
//! Translate HTTP requests and import files into calls on the domain's
//! driving ports.

pub mod http;
pub mod import_file;
