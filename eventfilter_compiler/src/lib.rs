// Internal modules
pub mod assembly;
pub mod attribute_path;
pub mod config;
pub mod literal;
#[macro_use]
pub mod logging;
pub mod matcher;
pub mod operands;
pub mod pipeline;
pub mod reference_resolution;
pub mod syntax;
pub mod types;
pub mod utils;

// Re-export key types for library consumers
pub use assembly::{EventFilter, FilterElement, FilterOperand};
pub use attribute_path::{AttributePathParser, DefaultAttributePathParser};
pub use config::runtime::CompilerPreferences;
pub use literal::{DefaultValueParser, ValueParser};
pub use operands::OperatorKind;
pub use pipeline::{
    compile_event_filter, compile_event_filter_with, compile_file, read_source, CompileError,
    CompileResult, CompileStats, ErrorKind,
};
pub use types::{AttributeOperand, BuiltinType, Variant};
