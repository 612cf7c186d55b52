/// IO 抽象层模块
///
/// 编辑引擎只通过 `BackingBlob` trait 访问原始数据，
/// 不关心数据来自内存还是磁盘文件。
///
/// # 架构设计
///
/// - **traits**: 定义 BackingBlob trait 接口
/// - **memory_blob**: 基于内存的实现（测试、小数据）
/// - **file_blob**: 基于内存映射文件的实现
///
/// # 使用示例
///
/// ```rust,ignore
/// use sparse_edit::io::{BackingBlob, FileBlob};
///
/// let blob = FileBlob::open(Path::new("firmware.bin"), ElementWidth::W8)?;
/// let header = blob.read_original(0, 16)?;
/// ```
pub mod traits;
pub mod memory_blob;
pub mod file_blob;

// === 导出 trait 定义 ===
pub use traits::BackingBlob;

// === 导出默认实现 ===
pub use memory_blob::MemoryBlob;
pub use file_blob::FileBlob;
