/// 稀疏编辑引擎
///
/// 以"修改区段"（run）的形式记录对只读数据块的修改，不改写底层数据。
/// 所有区段互不重叠且互不相邻，重叠或相接的写入在保存前即被合并。

use std::collections::BTreeMap;
use serde::Serialize;
use crate::datatypes::ElementWidth;
use crate::io::BackingBlob;
use crate::utils::{check_range, EditError};
use super::history::{EditHistory, UndoEntry};

/// 稀疏编辑引擎
///
/// # 核心特性
/// - **稀疏**: 只保存被修改的区段，查询代价与区段数相关，与数据大小无关
/// - **可撤销**: 每次修改前记录有效值，撤销栈有上限
/// - **不持有数据**: 需要原始数据的操作由调用方传入 `BackingBlob`
///
/// # 使用示例
///
/// ```rust,ignore
/// use sparse_edit::{EditEngine, MemoryBlob, ElementWidth};
///
/// let blob = MemoryBlob::zeroed(ElementWidth::W8, 100);
/// let mut engine = EditEngine::for_blob(&blob);
///
/// engine.change_bytes(&blob, 10, &[1, 2, 3], true)?;
/// assert_eq!(engine.byte_value(&blob, 11)?, 2);
///
/// let pos = engine.undo();
/// assert_eq!(pos, 10);
/// ```
#[derive(Debug, Clone)]
pub struct EditEngine {
    width: ElementWidth,
    blob_len: usize,
    runs: BTreeMap<usize, Vec<u64>>,
    history: EditHistory,
}

/// 单个区段的摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub start: usize,
    pub len: usize,
}

/// 引擎状态摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub width_bits: u32,
    pub blob_len: usize,
    pub run_count: usize,
    pub changed_elements: usize,
    pub undo_depth: usize,
    pub stack_limit: usize,
    /// 因超出撤销栈上限而丢弃的记录数
    pub undo_dropped: usize,
    pub runs: Vec<RunSummary>,
}

/// 提交结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    /// 写入的区段数
    pub runs_written: usize,
    /// 写入的元素数
    pub elements_written: usize,
}

impl EditEngine {
    /// 创建新的编辑引擎
    ///
    /// # 参数
    /// * `width` - 元素位宽
    /// * `blob_len` - 数据块长度（以元素计）
    pub fn new(width: ElementWidth, blob_len: usize) -> Self {
        Self::with_stack_limit(width, blob_len, crate::DEFAULT_EDIT_STACK_LIMIT)
    }

    /// 指定撤销栈上限创建
    pub fn with_stack_limit(width: ElementWidth, blob_len: usize, stack_limit: usize) -> Self {
        Self {
            width,
            blob_len,
            runs: BTreeMap::new(),
            history: EditHistory::new(stack_limit),
        }
    }

    /// 按数据块的位宽和长度创建
    pub fn for_blob<B: BackingBlob + ?Sized>(blob: &B) -> Self {
        Self::new(blob.width(), blob.len())
    }

    pub fn width(&self) -> ElementWidth {
        self.width
    }

    pub fn blob_len(&self) -> usize {
        self.blob_len
    }

    pub fn stack_limit(&self) -> usize {
        self.history.limit()
    }

    /// 修改 `[pos, pos + values.len())` 范围内的元素
    ///
    /// # 参数
    /// * `blob` - 原始数据（记录历史时用于计算修改前的有效值）
    /// * `pos` - 起始位置
    /// * `values` - 新值
    /// * `record_history` - 是否压入撤销栈
    ///
    /// # 返回
    /// 参数违反契约时返回错误，此时引擎状态不变
    pub fn change_bytes<B: BackingBlob + ?Sized>(
        &mut self,
        blob: &B,
        pos: usize,
        values: &[u64],
        record_history: bool,
    ) -> Result<(), EditError> {
        self.width.ensure_same(blob.width())?;
        self.validate(pos, values)?;
        if values.is_empty() {
            return Ok(());
        }

        if record_history {
            let previous = self.bytes_values(blob, pos, values.len())?;
            self.history.push(UndoEntry::new(pos, previous));
        }

        self.merge_run(pos, values);
        Ok(())
    }

    /// 撤销最近一次修改
    ///
    /// # 返回
    /// 被撤销修改的起始位置；撤销栈为空时返回 0 且不做任何修改
    pub fn undo(&mut self) -> usize {
        let entry = match self.history.pop() {
            Some(entry) => entry,
            None => return 0,
        };

        tracing::debug!(position = entry.position, len = entry.previous_values.len(), "undo");
        if !entry.previous_values.is_empty() {
            self.merge_run(entry.position, &entry.previous_values);
        }
        entry.position
    }

    /// 是否可以撤销
    pub fn has_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// 可撤销的次数
    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    /// 撤销历史（只读）
    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// 将修改覆盖到 `target` 上
    ///
    /// `target[0]` 对应位置 `offset`，调用方应事先填入原始数据。
    /// 窗口为 `[offset, offset + min(max_elements, target.len()))`，
    /// 没有修改的位置保持不变。
    pub fn apply_changes(&self, target: &mut [u64], offset: usize, max_elements: Option<usize>) {
        let window = max_elements.map_or(target.len(), |max| max.min(target.len()));
        for (pos, data) in self.changes_from_range(offset, window) {
            let start = pos - offset;
            target[start..start + data.len()].copy_from_slice(&data);
        }
    }

    /// 获取与窗口 `[offset, offset + len)` 相交的修改，裁剪到窗口内
    pub fn changes_from_range(&self, offset: usize, len: usize) -> BTreeMap<usize, Vec<u64>> {
        let mut result = BTreeMap::new();
        if len == 0 {
            return result;
        }
        let end = offset.saturating_add(len);

        let first_key = self
            .covering_run(offset)
            .map(|(start, _)| start)
            .unwrap_or(offset);

        for (&start, data) in self.runs.range(first_key..end) {
            let from = offset.max(start);
            let to = end.min(start + data.len());
            if from < to {
                result.insert(from, data[from - start..to - start].to_vec());
            }
        }
        result
    }

    /// 取出起始位置最小的修改区段
    ///
    /// 用于逐段提交：调用方反复取出并写入数据块，直到返回 None
    pub fn pop_first_change(&mut self) -> Option<(usize, Vec<u64>)> {
        self.runs.pop_first()
    }

    /// 将提交失败的区段放回引擎（合并，不记录历史）
    pub fn requeue_change(&mut self, pos: usize, values: &[u64]) -> Result<(), EditError> {
        self.validate(pos, values)?;
        if !values.is_empty() {
            self.merge_run(pos, values);
        }
        Ok(())
    }

    /// 将全部修改写入数据块并清空区段
    ///
    /// 按起始位置逐段取出并写入。某段写入失败时，该段被放回引擎并返回错误；
    /// 之前已写入的段不会回滚，之后的段仍保留在引擎中，可在排除故障后再次调用。
    pub fn commit_all<B: BackingBlob + ?Sized>(&mut self, blob: &mut B) -> Result<SaveReport, EditError> {
        self.width.ensure_same(blob.width())?;

        let mut report = SaveReport::default();
        while let Some((pos, values)) = self.pop_first_change() {
            if let Err(e) = blob.write(pos, &values) {
                tracing::warn!(position = pos, len = values.len(), error = %e, "commit failed, run requeued");
                self.requeue_change(pos, &values)?;
                return Err(e);
            }
            report.runs_written += 1;
            report.elements_written += values.len();
        }

        tracing::debug!(
            runs = report.runs_written,
            elements = report.elements_written,
            "committed all changes"
        );
        Ok(report)
    }

    /// 位置是否被修改过
    pub fn is_changed(&self, pos: usize) -> bool {
        self.covering_run(pos).is_some()
    }

    /// 位置上的有效值：有修改时取修改值，否则读取原始数据
    pub fn byte_value<B: BackingBlob + ?Sized>(&self, blob: &B, pos: usize) -> Result<u64, EditError> {
        if pos >= self.blob_len {
            return Err(EditError::OutOfRange { pos, len: self.blob_len });
        }

        match self.covering_run(pos) {
            Some((start, data)) => Ok(data[pos - start]),
            None => {
                self.width.ensure_same(blob.width())?;
                let original = blob.read_original(pos, 1)?;
                original
                    .first()
                    .copied()
                    .ok_or(EditError::OutOfRange { pos, len: blob.len() })
            }
        }
    }

    /// 范围内的有效值（原始数据叠加修改）
    pub fn bytes_values<B: BackingBlob + ?Sized>(
        &self,
        blob: &B,
        offset: usize,
        len: usize,
    ) -> Result<Vec<u64>, EditError> {
        check_range(offset, len, self.blob_len)?;
        self.width.ensure_same(blob.width())?;

        let mut values = blob.read_original(offset, len)?;
        self.apply_changes(&mut values, offset, None);
        Ok(values)
    }

    /// 是否存在修改
    pub fn has_changes(&self) -> bool {
        !self.runs.is_empty()
    }

    /// 丢弃全部修改和撤销历史（不触碰数据块）
    pub fn clear(&mut self) {
        self.runs.clear();
        self.history.clear();
    }

    /// 区段数量
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// 按起始位置遍历所有区段
    pub fn runs(&self) -> impl Iterator<Item = (usize, &[u64])> {
        self.runs.iter().map(|(&start, data)| (start, data.as_slice()))
    }

    /// 被修改的元素总数
    pub fn changed_elements(&self) -> usize {
        self.runs.values().map(Vec::len).sum()
    }

    /// 生成状态摘要
    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary {
            width_bits: self.width.bits(),
            blob_len: self.blob_len,
            run_count: self.run_count(),
            changed_elements: self.changed_elements(),
            undo_depth: self.undo_depth(),
            stack_limit: self.stack_limit(),
            undo_dropped: self.history.dropped(),
            runs: self
                .runs()
                .map(|(start, data)| RunSummary { start, len: data.len() })
                .collect(),
        }
    }

    fn validate(&self, pos: usize, values: &[u64]) -> Result<(), EditError> {
        if pos > self.blob_len {
            return Err(EditError::OutOfRange { pos, len: self.blob_len });
        }
        check_range(pos, values.len(), self.blob_len)?;
        self.width.check_values(values)
    }

    /// 包含 `pos` 的区段
    fn covering_run(&self, pos: usize) -> Option<(usize, &Vec<u64>)> {
        let (&start, data) = self.runs.range(..=pos).next_back()?;
        if start + data.len() > pos {
            Some((start, data))
        } else {
            None
        }
    }

    /// 写入一个已校验的非空区段，与重叠或相接的区段合并
    fn merge_run(&mut self, pos: usize, values: &[u64]) {
        let end = pos + values.len();

        // 起点在 pos 之前的区段至多一个能够到达 pos
        let mut touched: Vec<usize> = Vec::new();
        if let Some((&start, data)) = self.runs.range(..pos).next_back() {
            if start + data.len() >= pos {
                touched.push(start);
            }
        }
        touched.extend(self.runs.range(pos..=end).map(|(&start, _)| start));

        let (first, last) = match (touched.first(), touched.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => {
                self.runs.insert(pos, values.to_vec());
                return;
            }
        };

        let new_start = first.min(pos);
        let mut merged = Vec::with_capacity(values.len());
        if let Some(run) = self.runs.get(&first) {
            if first < pos {
                merged.extend_from_slice(&run[..pos - first]);
            }
        }
        merged.extend_from_slice(values);
        if let Some(run) = self.runs.get(&last) {
            if last + run.len() > end {
                merged.extend_from_slice(&run[end - last..]);
            }
        }
        for start in &touched {
            self.runs.remove(start);
        }

        tracing::trace!(
            start = new_start,
            len = merged.len(),
            merged_runs = touched.len(),
            "merged run"
        );
        self.runs.insert(new_start, merged);
    }
}
