//! Store Module
//!
//! In-memory key-value table holding the live cache contents.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Many concurrent readers, one writer at a time
//! - Track size and entry count
//! - Glob-pattern key listing
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in RwLock:
//! - Ordered keys let `keys("job:*")` range-scan just the `job:` prefix
//! - Simple and correct first, optimize later
//!
//! The Store itself knows nothing about durability; the Engine pairs every
//! mutation with a WAL append.

mod glob;
mod table;

pub use glob::GlobPattern;
pub use table::Store;
