/// 文件数据块实现
///
/// 使用内存映射访问磁盘文件，读取原始数据时不会整体加载文件
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use memmap2::{Mmap, MmapMut};
use super::traits::BackingBlob;
use crate::datatypes::{decode_elements, encode_elements, ElementWidth};
use crate::utils::{check_range, EditError};

/// 文件映射方式
enum Mapping {
    /// 只读打开，写入会失败
    ReadOnly(Mmap),
    Writable(MmapMut),
}

impl Mapping {
    fn bytes(&self) -> &[u8] {
        match self {
            Mapping::ReadOnly(mmap) => &mmap[..],
            Mapping::Writable(mmap) => &mmap[..],
        }
    }
}

/// 基于内存映射文件的数据块
///
/// # 实现细节
/// - 元素按小端序存储
/// - 文件末尾不足一个元素的字节不可寻址
/// - 空文件不建立映射，长度为 0
pub struct FileBlob {
    path: PathBuf,
    width: ElementWidth,
    len: usize,
    writable: bool,
    mmap: Option<Mapping>,
    _file: File,
}

impl FileBlob {
    /// 以读写方式打开文件
    ///
    /// # 参数
    /// * `path` - 文件路径
    /// * `width` - 元素位宽
    pub fn open(path: &Path, width: ElementWidth) -> Result<Self, EditError> {
        Self::open_with(path, width, true)
    }

    /// 以只读方式打开文件，之后的 `write` 均返回 `WriteFailed`
    pub fn open_read_only(path: &Path, width: ElementWidth) -> Result<Self, EditError> {
        Self::open_with(path, width, false)
    }

    fn open_with(path: &Path, width: ElementWidth, writable: bool) -> Result<Self, EditError> {
        let file = OpenOptions::new().read(true).write(writable).open(path)?;
        let byte_len = usize::try_from(file.metadata()?.len()).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("文件过大，无法映射: {:?}", path),
            )
        })?;

        // 映射期间文件不应被其他进程截断
        let mmap = match (byte_len, writable) {
            (0, _) => None,
            (_, true) => Some(Mapping::Writable(unsafe { MmapMut::map_mut(&file)? })),
            (_, false) => Some(Mapping::ReadOnly(unsafe { Mmap::map(&file)? })),
        };

        tracing::debug!(path = %path.display(), byte_len, %width, writable, "opened file blob");

        Ok(Self {
            path: path.to_path_buf(),
            width,
            len: byte_len / width.byte_len(),
            writable,
            mmap,
            _file: file,
        })
    }

    /// 文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 是否以读写方式打开
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    fn byte_range(&self, offset: usize, count: usize) -> (usize, usize) {
        let size = self.width.byte_len();
        (offset * size, (offset + count) * size)
    }
}

impl BackingBlob for FileBlob {
    fn width(&self) -> ElementWidth {
        self.width
    }

    fn len(&self) -> usize {
        self.len
    }

    fn read_original(&self, offset: usize, length: usize) -> Result<Vec<u64>, EditError> {
        check_range(offset, length, self.len)?;
        let mmap = match &self.mmap {
            Some(mmap) => mmap,
            None => return Ok(Vec::new()),
        };

        let (start, end) = self.byte_range(offset, length);
        Ok(decode_elements(&mmap.bytes()[start..end], self.width, length)?)
    }

    fn write(&mut self, offset: usize, values: &[u64]) -> Result<(), EditError> {
        if !self.writable {
            return Err(EditError::WriteFailed {
                pos: offset,
                reason: "文件以只读方式打开".to_string(),
            });
        }
        check_range(offset, values.len(), self.len)?;
        self.width.check_values(values)?;
        if values.is_empty() {
            return Ok(());
        }

        let (start, end) = self.byte_range(offset, values.len());
        let bytes = encode_elements(values, self.width)?;
        let mmap = match self.mmap.as_mut() {
            Some(Mapping::Writable(mmap)) => mmap,
            _ => {
                return Err(EditError::WriteFailed {
                    pos: offset,
                    reason: "文件未映射".to_string(),
                })
            }
        };

        mmap[start..end].copy_from_slice(&bytes);
        mmap.flush_range(start, end - start)?;
        Ok(())
    }
}

impl std::fmt::Debug for FileBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBlob")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("len", &self.len)
            .field("writable", &self.writable)
            .finish()
    }
}
