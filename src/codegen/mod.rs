pub mod ast;
pub mod emit;
pub mod expr;
pub mod imports;
pub mod scope;
