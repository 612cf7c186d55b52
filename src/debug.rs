use std::io::Write;
use crate::editor::BlobEditor;
use crate::io::BackingBlob;
use crate::utils::EditError;

/// 每行显示的元素数
const ELEMENTS_PER_LINE: usize = 16;

/// 编辑状态调试输出
pub struct HexDumper;

impl HexDumper {
    /// 输出 `[offset, offset + len)` 的有效视图
    ///
    /// 被修改的元素以 `*` 标记，例如：
    /// ```text
    /// 00000010: 00 01*02*00 ...
    /// ```
    pub fn dump_view<B: BackingBlob>(
        editor: &BlobEditor<B>,
        offset: usize,
        len: usize,
        output: &mut dyn Write,
    ) -> Result<(), EditError> {
        let values = editor.view(offset, len)?;
        let digits = editor.blob().width().hex_digits();

        for (line_index, line) in values.chunks(ELEMENTS_PER_LINE).enumerate() {
            let line_start = offset + line_index * ELEMENTS_PER_LINE;
            write!(output, "{:08X}:", line_start)?;

            for (i, value) in line.iter().enumerate() {
                let marker = if editor.is_changed(line_start + i) { '*' } else { ' ' };
                write!(output, "{}{:0width$X}", marker, value, width = digits)?;
            }
            writeln!(output)?;
        }

        Ok(())
    }

    /// 输出所有修改区段
    pub fn dump_runs<B: BackingBlob>(editor: &BlobEditor<B>, output: &mut dyn Write) -> Result<(), EditError> {
        let engine = editor.engine();
        writeln!(output, "=== 修改区段 ({}) ===", engine.run_count())?;
        for (start, data) in engine.runs() {
            writeln!(output, "  [{:08X}, {:08X}) {} 个元素", start, start + data.len(), data.len())?;
        }

        writeln!(
            output,
            "=== 撤销栈 ({}/{}, 已丢弃 {}) ===",
            engine.undo_depth(),
            engine.stack_limit(),
            engine.history().dropped()
        )?;
        for entry in engine.history().iter().rev() {
            writeln!(output, "  {}", entry)?;
        }
        Ok(())
    }
}
