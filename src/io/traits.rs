/// IO 抽象层 - trait 定义
///
/// 该模块定义了底层数据块的读写接口，支持依赖注入和测试 mock。

use crate::datatypes::ElementWidth;
use crate::utils::EditError;

/// 底层数据块（被编辑的原始数据）
///
/// # 职责
/// - 提供原始元素值的读取
/// - 接收提交的修改
/// - 不负责追踪修改，修改状态全部由 `EditEngine` 维护
///
/// # 实现示例
/// ```rust,ignore
/// pub struct VecBlob(Vec<u64>);
/// impl BackingBlob for VecBlob {
///     fn width(&self) -> ElementWidth { ElementWidth::W8 }
///     fn len(&self) -> usize { self.0.len() }
///     fn read_original(&self, offset: usize, length: usize) -> Result<Vec<u64>, EditError> {
///         Ok(self.0[offset..offset + length].to_vec())
///     }
///     fn write(&mut self, offset: usize, values: &[u64]) -> Result<(), EditError> {
///         self.0[offset..offset + values.len()].copy_from_slice(values);
///         Ok(())
///     }
/// }
/// ```
pub trait BackingBlob {
    /// 元素位宽
    fn width(&self) -> ElementWidth;

    /// 元素个数
    fn len(&self) -> usize;

    /// 是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 读取 `[offset, offset + length)` 范围内的原始元素
    ///
    /// # 返回
    /// 越界时返回 `RangeOverflow`
    fn read_original(&self, offset: usize, length: usize) -> Result<Vec<u64>, EditError>;

    /// 将元素写入 `offset` 起始的位置
    ///
    /// # 参数
    /// * `offset` - 起始位置（以元素计）
    /// * `values` - 要写入的元素
    fn write(&mut self, offset: usize, values: &[u64]) -> Result<(), EditError>;
}

impl<B: BackingBlob + ?Sized> BackingBlob for &mut B {
    fn width(&self) -> ElementWidth {
        (**self).width()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn read_original(&self, offset: usize, length: usize) -> Result<Vec<u64>, EditError> {
        (**self).read_original(offset, length)
    }

    fn write(&mut self, offset: usize, values: &[u64]) -> Result<(), EditError> {
        (**self).write(offset, values)
    }
}
