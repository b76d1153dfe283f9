//! Query descriptors and their wire form
//!
//! A [`QueryDescriptor`] describes one logical backend query plus the
//! caller-chosen operation id that routes its result back to a display
//! target. Descriptors are sent either as a direct request or as one entry
//! of a batch POST.

pub mod descriptor;
pub mod path;

pub use descriptor::{BatchQuery, BatchRequest, Method, ParamValue, QueryDescriptor};
pub use path::{api_path, join_url};
