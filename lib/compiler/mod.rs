mod code;
mod compiler;

pub use code::{Chunk, Opcode};
pub use compiler::compile;
