use thiserror::Error;
use std::path::{Path, PathBuf};

/// 自定义错误类型
///
/// 前五种为调用方违反契约（越界、溢出、宽度不符），
/// 出现时操作立即中止且不修改任何状态。
#[derive(Error, Debug)]
pub enum EditError {
    #[error("Position {pos} out of range (blob length: {len})")]
    OutOfRange { pos: usize, len: usize },

    #[error("Range [{pos}, {pos}+{count}) exceeds blob length {len}")]
    RangeOverflow { pos: usize, count: usize, len: usize },

    #[error("Value {value:#x} does not fit in a {bits}-bit element")]
    ValueTooWide { value: u64, bits: u32 },

    #[error("Element width mismatch: expected {expected} bits, got {actual} bits")]
    WidthMismatch { expected: u32, actual: u32 },

    #[error("Unsupported element width: {0} bits")]
    UnsupportedWidth(u32),

    #[error("Write failed at position {pos}: {reason}")]
    WriteFailed { pos: usize, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl EditError {
    /// 是否为契约违反类错误（调用方参数错误，而非存储层故障）
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            EditError::OutOfRange { .. }
                | EditError::RangeOverflow { .. }
                | EditError::ValueTooWide { .. }
                | EditError::WidthMismatch { .. }
                | EditError::UnsupportedWidth(_)
        )
    }
}

/// 检查区间 `[pos, pos + count)` 是否落在长度为 `len` 的 blob 内
pub fn check_range(pos: usize, count: usize, len: usize) -> Result<usize, EditError> {
    match pos.checked_add(count) {
        Some(end) if end <= len => Ok(end),
        _ => Err(EditError::RangeOverflow { pos, count, len }),
    }
}

/// 创建文件备份
///
/// 备份文件与原文件同目录，命名为 `<文件名>.<时间戳>.bak`
pub fn create_backup(file_path: &Path) -> Result<PathBuf, EditError> {
    if !file_path.is_file() {
        return Err(EditError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("原文件不存在: {:?}", file_path),
        )));
    }

    let mut backup_name = file_path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    let timestamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
    backup_name.push(format!(".{}.bak", timestamp));

    let backup_path = file_path.with_file_name(backup_name);
    std::fs::copy(file_path, &backup_path)?;

    Ok(backup_path)
}
