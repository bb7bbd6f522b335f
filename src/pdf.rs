pub mod assembler;
pub mod fonts;
pub mod marks;
pub mod text;
