/// 撤销历史模块
///
/// 记录每次修改前的有效值，支持按时间倒序撤销。
/// 历史深度有上限，超出时静默丢弃最早的记录。

use std::collections::VecDeque;

/// 撤销记录
///
/// 保存一次修改发生前 `position` 处的有效值
/// （原始数据叠加此前所有修改之后的值）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    /// 修改的起始位置
    pub position: usize,
    /// 修改前的有效值
    pub previous_values: Vec<u64>,
}

impl UndoEntry {
    pub fn new(position: usize, previous_values: Vec<u64>) -> Self {
        Self { position, previous_values }
    }
}

/// 有界撤销栈
///
/// # 实现细节
/// - 使用 VecDeque 存储，尾部为最新记录
/// - 压栈超出 `limit` 时从头部丢弃最旧记录
/// - `limit` 为 0 时不保留任何历史
#[derive(Debug, Clone)]
pub struct EditHistory {
    entries: VecDeque<UndoEntry>,
    limit: usize,
    /// 因超出上限而被丢弃的记录数
    dropped: usize,
}

impl EditHistory {
    /// 创建新的撤销栈
    ///
    /// # 参数
    /// * `limit` - 最多保留的记录数
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(1024)),
            limit,
            dropped: 0,
        }
    }

    /// 压入一条记录，必要时丢弃最旧的记录
    pub fn push(&mut self, entry: UndoEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
            self.dropped += 1;
        }
    }

    /// 弹出最新的记录
    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop_back()
    }

    /// 当前可撤销的记录数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 累计丢弃的记录数
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// 按从旧到新的顺序遍历
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &UndoEntry> {
        self.entries.iter()
    }

    /// 清空所有记录
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dropped = 0;
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(crate::DEFAULT_EDIT_STACK_LIMIT)
    }
}

impl std::fmt::Display for UndoEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:08X}] {} 个元素", self.position, self.previous_values.len())
    }
}
