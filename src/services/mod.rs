pub mod access;
pub mod errors;
pub mod file;
pub mod storage;

pub use access::*;
pub use errors::*;
pub use file::*;
pub use storage::*;
