/// 内存数据块实现
///
/// 将全部元素保存在 `Vec<u64>` 中，适用于测试和小数据量场景
use super::traits::BackingBlob;
use crate::datatypes::ElementWidth;
use crate::utils::{check_range, EditError};

/// 基于内存的数据块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlob {
    width: ElementWidth,
    data: Vec<u64>,
}

impl MemoryBlob {
    /// 从元素序列创建，所有元素必须能放入 `width`
    pub fn new(width: ElementWidth, data: Vec<u64>) -> Result<Self, EditError> {
        width.check_values(&data)?;
        Ok(Self { width, data })
    }

    /// 创建全零数据块
    pub fn zeroed(width: ElementWidth, len: usize) -> Self {
        Self { width, data: vec![0; len] }
    }

    /// 从字节创建 8 位数据块
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            width: ElementWidth::W8,
            data: bytes.iter().map(|&b| u64::from(b)).collect(),
        }
    }

    /// 全部元素
    pub fn as_slice(&self) -> &[u64] {
        &self.data
    }
}

impl BackingBlob for MemoryBlob {
    fn width(&self) -> ElementWidth {
        self.width
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn read_original(&self, offset: usize, length: usize) -> Result<Vec<u64>, EditError> {
        let end = check_range(offset, length, self.data.len())?;
        Ok(self.data[offset..end].to_vec())
    }

    fn write(&mut self, offset: usize, values: &[u64]) -> Result<(), EditError> {
        let end = check_range(offset, values.len(), self.data.len())?;
        self.width.check_values(values)?;
        self.data[offset..end].copy_from_slice(values);
        Ok(())
    }
}
