/// 编辑器层模块
///
/// 该模块提供稀疏的元素级编辑接口，支持撤销和分段提交。
/// 遵循"修改-保存分离"原则，所有修改操作仅在内存中进行，需要显式调用保存。
///
/// # 架构设计
///
/// - **engine**: 稀疏编辑引擎，维护互不相交的修改区段
/// - **history**: 有界撤销栈
/// - **blob_editor**: 数据块编辑器，绑定一个数据块和一个引擎
///
/// # 使用示例
///
/// ```rust,ignore
/// use sparse_edit::{BlobEditor, ElementWidth};
/// use sparse_edit::io::FileBlob;
///
/// // 打开 + 编辑 + 保存工作流
/// let blob = FileBlob::open(Path::new("firmware.bin"), ElementWidth::W8)?;
/// let mut editor = BlobEditor::new(blob);
///
/// editor.change_bytes(0x100, &[0x90, 0x90])?;
/// println!("{}", editor);
///
/// editor.save()?;
/// ```
pub mod blob_editor;
pub mod engine;
pub mod history;

// === 导出公共接口 ===
pub use blob_editor::BlobEditor;
pub use engine::{ChangeSummary, EditEngine, RunSummary, SaveReport};
pub use history::{EditHistory, UndoEntry};
