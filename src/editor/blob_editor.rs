/// 数据块编辑器模块
///
/// 将一个数据块与一个编辑引擎绑定，提供有状态的编辑接口。
/// 遵循"修改-保存分离"原则，所有修改操作仅在内存中进行。

use crate::io::BackingBlob;
use crate::utils::EditError;
use super::engine::{ChangeSummary, EditEngine, SaveReport};

/// 数据块编辑器 - 管理数据块的修改状态
///
/// # 核心特性
/// - **Stateful**: 维护修改状态，支持多次修改后统一保存
/// - **可撤销**: 每次修改都记录撤销信息
/// - **隔离性**: 多个编辑器实例互不影响
///
/// # 使用示例
///
/// ```rust,ignore
/// use sparse_edit::{BlobEditor, ElementWidth};
/// use sparse_edit::io::FileBlob;
///
/// let blob = FileBlob::open(Path::new("firmware.bin"), ElementWidth::W8)?;
/// let mut editor = BlobEditor::new(blob);
///
/// editor.change_bytes(0x10, &[0xDE, 0xAD])?;
/// println!("已修改 {} 处", editor.engine().run_count());
///
/// let report = editor.save()?;
/// ```
pub struct BlobEditor<B: BackingBlob> {
    /// 底层数据块
    blob: B,
    /// 编辑引擎
    engine: EditEngine,
}

impl<B: BackingBlob> BlobEditor<B> {
    /// 创建新的编辑器（默认撤销栈上限）
    pub fn new(blob: B) -> Self {
        let engine = EditEngine::for_blob(&blob);
        Self { blob, engine }
    }

    /// 指定撤销栈上限创建
    pub fn with_stack_limit(blob: B, stack_limit: usize) -> Self {
        let engine = EditEngine::with_stack_limit(blob.width(), blob.len(), stack_limit);
        Self { blob, engine }
    }

    /// 修改元素（仅修改内存状态，记录撤销信息）
    pub fn change_bytes(&mut self, pos: usize, values: &[u64]) -> Result<(), EditError> {
        self.engine.change_bytes(&self.blob, pos, values, true)
    }

    /// 撤销最后一次修改
    ///
    /// # 返回
    /// 受影响的起始位置，供调用方刷新显示；无可撤销操作时返回 0
    pub fn undo(&mut self) -> usize {
        self.engine.undo()
    }

    /// 检查是否可以撤销
    pub fn has_undo(&self) -> bool {
        self.engine.has_undo()
    }

    /// 位置上的有效值
    pub fn value(&self, pos: usize) -> Result<u64, EditError> {
        self.engine.byte_value(&self.blob, pos)
    }

    /// 范围内的有效值
    pub fn values(&self, offset: usize, len: usize) -> Result<Vec<u64>, EditError> {
        self.engine.bytes_values(&self.blob, offset, len)
    }

    /// 读取显示窗口：超出数据块末尾的部分被截掉
    pub fn view(&self, offset: usize, len: usize) -> Result<Vec<u64>, EditError> {
        if offset > self.blob.len() {
            return Err(EditError::OutOfRange { pos: offset, len: self.blob.len() });
        }
        let len = len.min(self.blob.len() - offset);

        let mut window = self.blob.read_original(offset, len)?;
        self.engine.apply_changes(&mut window, offset, None);
        Ok(window)
    }

    /// 位置是否被修改
    pub fn is_changed(&self, pos: usize) -> bool {
        self.engine.is_changed(pos)
    }

    /// 检查是否有未保存的修改
    pub fn has_changes(&self) -> bool {
        self.engine.has_changes()
    }

    /// 丢弃所有修改和撤销历史（数据块保持不变）
    pub fn revert(&mut self) {
        self.engine.clear();
    }

    /// 保存到数据块（需要显式调用）
    ///
    /// 逐段写入，失败时保留未写入的区段，见 `EditEngine::commit_all`
    pub fn save(&mut self) -> Result<SaveReport, EditError> {
        self.engine.commit_all(&mut self.blob)
    }

    /// 获取底层数据块的不可变引用
    pub fn blob(&self) -> &B {
        &self.blob
    }

    /// 获取底层数据块的可变引用
    ///
    /// # 警告
    /// 直接写入数据块不会通知引擎，已记录的撤销信息可能与新数据不一致
    pub fn blob_mut(&mut self) -> &mut B {
        &mut self.blob
    }

    /// 获取编辑引擎的引用
    pub fn engine(&self) -> &EditEngine {
        &self.engine
    }

    /// 取回数据块
    pub fn into_blob(self) -> B {
        self.blob
    }

    /// 状态摘要
    pub fn summary(&self) -> ChangeSummary {
        self.engine.summary()
    }
}

impl<B: BackingBlob> std::fmt::Display for BlobEditor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "数据块: {} 个元素 ({}), 修改状态: {}, 区段数: {}, 可撤销: {}",
            self.blob.len(),
            self.blob.width(),
            if self.has_changes() { "已修改" } else { "未修改" },
            self.engine.run_count(),
            self.engine.undo_depth()
        )
    }
}
