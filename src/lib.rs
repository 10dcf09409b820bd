pub mod codegen;
pub mod config;
pub mod convert;
pub mod dag;
pub mod error;
pub mod hcl;
pub mod lowering;
pub mod schema;

pub use convert::{
    convert, convert_project, ConvertOptions, ConvertResult, ConvertStats, ProjectConfig,
    ProjectConversion, CODE_MARKER,
};
pub use error::{ConvertError, Diagnostic, Severity};
pub use lowering::Language;
