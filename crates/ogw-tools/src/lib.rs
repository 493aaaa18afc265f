//! Tool Registry and Dispatcher (spec.md §3/§4.7, component C4): the
//! immutable-after-startup catalogue of tool descriptors and the eight-step
//! dispatch pipeline that turns a `tools/call` invocation into a response.

pub mod catalog;
pub mod descriptor;
pub mod dispatcher;
pub mod fuzzy;
pub mod params;
pub mod registry;

pub use catalog::{default_catalog, CatalogDeps};
pub use descriptor::{
    Category, ParameterSpec, ParameterType, Safety, ToolContext, ToolDescriptor, ToolDescriptorJson, ToolHandler,
};
pub use dispatcher::Dispatcher;
pub use params::{validate_and_coerce, ParamError};
pub use registry::Registry;
