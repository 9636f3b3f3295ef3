//! File I/O for documents: charset detection, chunked loading into offloaded lines, staged
//! saving with in-place rewrite, the advisory file lock, a lazy index for huge files, and the
//! resident-memory probe.

mod detect;
mod huge;
mod load;
mod memory;
mod save;
mod source;
mod split;

pub use detect::{DetectOptions, Detected, detect_encoding};
pub use huge::{HugeTextFile, LineFetch};
pub use load::{LoadError, LoadOptions, LoadedText, load};
pub use memory::{process_memory_policy, resident_memory_bytes};
pub use save::{SaveError, SaveOptions, SaveReport, is_file_modified, save};
pub use source::{FileSource, LockError};
pub use split::{CodeUnit, LineScanner, RawLine, split_all};
