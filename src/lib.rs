pub mod datatypes;
pub mod debug;
pub mod editor;
pub mod io;
pub mod utils;

// 重新导出主要结构
pub use datatypes::ElementWidth;
pub use debug::HexDumper;
pub use editor::{BlobEditor, ChangeSummary, EditEngine, SaveReport};
pub use io::{BackingBlob, FileBlob, MemoryBlob};
pub use utils::{create_backup, EditError};

// 常量定义
pub const DEFAULT_EDIT_STACK_LIMIT: usize = 100;
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
