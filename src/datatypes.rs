use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Write};
use serde::{Serialize, Deserialize};
use crate::utils::EditError;

/// 元素位宽
///
/// 一个引擎实例在整个生命周期内只使用一种位宽。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementWidth {
    W8,
    W16,
    W32,
    W64,
}

impl ElementWidth {
    /// 从位数创建，仅支持 8/16/32/64
    pub fn from_bits(bits: u32) -> Result<Self, EditError> {
        match bits {
            8 => Ok(ElementWidth::W8),
            16 => Ok(ElementWidth::W16),
            32 => Ok(ElementWidth::W32),
            64 => Ok(ElementWidth::W64),
            other => Err(EditError::UnsupportedWidth(other)),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            ElementWidth::W8 => 8,
            ElementWidth::W16 => 16,
            ElementWidth::W32 => 32,
            ElementWidth::W64 => 64,
        }
    }

    /// 单个元素占用的字节数
    pub fn byte_len(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// 该位宽能表示的最大值
    pub fn max_value(self) -> u64 {
        match self {
            ElementWidth::W64 => u64::MAX,
            w => (1u64 << w.bits()) - 1,
        }
    }

    /// 检查值是否能放入该位宽
    pub fn check_value(self, value: u64) -> Result<(), EditError> {
        if value > self.max_value() {
            return Err(EditError::ValueTooWide { value, bits: self.bits() });
        }
        Ok(())
    }

    /// 检查一组值
    pub fn check_values(self, values: &[u64]) -> Result<(), EditError> {
        values.iter().try_for_each(|&v| self.check_value(v))
    }

    /// 与另一位宽比较，不一致时返回 WidthMismatch
    pub fn ensure_same(self, other: ElementWidth) -> Result<(), EditError> {
        if self != other {
            return Err(EditError::WidthMismatch {
                expected: self.bits(),
                actual: other.bits(),
            });
        }
        Ok(())
    }

    /// 十六进制显示时需要的字符数
    pub fn hex_digits(self) -> usize {
        self.byte_len() * 2
    }
}

impl std::fmt::Display for ElementWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

// 小端元素读取
pub fn read_element(cursor: &mut Cursor<&[u8]>, width: ElementWidth) -> Result<u64, std::io::Error> {
    match width {
        ElementWidth::W8 => cursor.read_u8().map(u64::from),
        ElementWidth::W16 => cursor.read_u16::<LittleEndian>().map(u64::from),
        ElementWidth::W32 => cursor.read_u32::<LittleEndian>().map(u64::from),
        ElementWidth::W64 => cursor.read_u64::<LittleEndian>(),
    }
}

// 小端元素写入，调用前须已检查 value 位宽
pub fn write_element(writer: &mut dyn Write, width: ElementWidth, value: u64) -> Result<(), std::io::Error> {
    match width {
        ElementWidth::W8 => writer.write_u8(value as u8),
        ElementWidth::W16 => writer.write_u16::<LittleEndian>(value as u16),
        ElementWidth::W32 => writer.write_u32::<LittleEndian>(value as u32),
        ElementWidth::W64 => writer.write_u64::<LittleEndian>(value),
    }
}

/// 将字节切片解码为元素序列
pub fn decode_elements(data: &[u8], width: ElementWidth, count: usize) -> Result<Vec<u64>, std::io::Error> {
    let mut cursor = Cursor::new(data);
    (0..count).map(|_| read_element(&mut cursor, width)).collect()
}

/// 将元素序列编码为字节
pub fn encode_elements(values: &[u64], width: ElementWidth) -> Result<Vec<u8>, std::io::Error> {
    let mut buffer = Vec::with_capacity(values.len() * width.byte_len());
    for &value in values {
        write_element(&mut buffer, width, value)?;
    }
    Ok(buffer)
}
