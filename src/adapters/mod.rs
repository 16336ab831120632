pub mod golang;
pub mod logging;
pub mod nodejs;
pub mod python;
pub mod ruby;
pub mod rust;
pub mod security;

pub use golang::{GoAdapter, GoDebugSession};
pub use logging::DebugAdapterLogger;
pub use nodejs::{NodeJsAdapter, NodeJsDebugSession};
pub use python::PythonAdapter;
pub use ruby::RubyAdapter;
pub use rust::{CargoTargetType, RustAdapter, RustProjectType};
