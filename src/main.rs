use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use sparse_edit::{create_backup, BackingBlob, BlobEditor, ElementWidth, FileBlob, HexDumper, VERSION};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sparse_edit")]
#[command(about = "对文件进行稀疏的元素级修改，支持撤销和显式提交")]
#[command(version = VERSION)]
struct Cli {
    /// 输入文件路径
    #[arg(short, long)]
    input: PathBuf,

    /// 元素位宽（8/16/32/64）
    #[arg(short, long, default_value_t = 8)]
    width: u32,

    /// 撤销栈上限
    #[arg(long, default_value_t = sparse_edit::DEFAULT_EDIT_STACK_LIMIT)]
    stack_limit: usize,

    /// 修改：POS=V1,V2,...（位置可用 0x 前缀，值为十六进制），可重复
    #[arg(short, long = "set", value_name = "POS=VALUES")]
    sets: Vec<String>,

    /// 应用修改后撤销的次数
    #[arg(long, default_value_t = 0)]
    undo: usize,

    /// 输出有效视图：POS:LEN
    #[arg(long, value_name = "POS:LEN")]
    dump: Option<String>,

    /// 将修改写入文件
    #[arg(long)]
    commit: bool,

    /// 提交前创建备份
    #[arg(long)]
    backup: bool,

    /// 以JSON输出变更摘要
    #[arg(long)]
    json: bool,

    /// 静默模式(仅输出错误)
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    validate_input(&cli)?;

    let width = ElementWidth::from_bits(cli.width)?;
    // 不提交时只读打开，只读文件也可以预览修改
    let blob = if cli.commit {
        FileBlob::open(&cli.input, width)
    } else {
        FileBlob::open_read_only(&cli.input, width)
    }
    .with_context(|| format!("无法打开文件: {:?}", cli.input))?;
    let mut editor = BlobEditor::with_stack_limit(blob, cli.stack_limit);

    apply_sets(&cli, &mut editor)?;
    apply_undo(&cli, &mut editor);

    if let Some(spec) = &cli.dump {
        let (pos, len) = parse_dump(spec)?;
        HexDumper::dump_view(&editor, pos, len, &mut std::io::stdout())?;
    }

    print_summary(&cli, &editor)?;

    if cli.commit {
        handle_commit(&cli, &mut editor)?;
    } else if editor.has_changes() && !cli.quiet {
        println!("未指定 --commit，修改未写入文件");
    }

    Ok(())
}

/// 初始化日志输出（stderr）
fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 验证参数组合
fn validate_input(cli: &Cli) -> anyhow::Result<()> {
    if !cli.input.exists() {
        bail!("输入文件不存在: {:?}", cli.input);
    }

    if cli.backup && !cli.commit {
        bail!("--backup 需要与 --commit 一起使用");
    }

    Ok(())
}

/// 依次应用 --set 指定的修改
fn apply_sets(cli: &Cli, editor: &mut BlobEditor<FileBlob>) -> anyhow::Result<()> {
    for spec in &cli.sets {
        let (pos, values) = parse_set(spec)?;
        if let Err(e) = editor.change_bytes(pos, &values) {
            if e.is_contract_violation() {
                bail!("无效的修改 {} (数据块共 {} 个元素): {}", spec, editor.blob().len(), e);
            }
            return Err(e).with_context(|| format!("修改失败: {}", spec));
        }
        tracing::info!(position = pos, len = values.len(), "applied change");
    }
    Ok(())
}

fn apply_undo(cli: &Cli, editor: &mut BlobEditor<FileBlob>) {
    for _ in 0..cli.undo {
        if !editor.has_undo() {
            tracing::warn!("no more changes to undo");
            break;
        }
        let pos = editor.undo();
        tracing::info!(position = pos, "undone");
    }
}

/// 输出变更摘要
fn print_summary(cli: &Cli, editor: &BlobEditor<FileBlob>) -> anyhow::Result<()> {
    if cli.json {
        let json_output = serde_json::to_string_pretty(&editor.summary())
            .context("序列化摘要失败")?;
        println!("{}", json_output);
    } else if !cli.quiet {
        println!("{}", editor);
        HexDumper::dump_runs(editor, &mut std::io::stdout())?;
    }
    Ok(())
}

/// 处理提交
fn handle_commit(cli: &Cli, editor: &mut BlobEditor<FileBlob>) -> anyhow::Result<()> {
    if !editor.has_changes() {
        if !cli.quiet {
            println!("没有需要提交的修改");
        }
        return Ok(());
    }

    if cli.backup {
        let backup_path = create_backup(&cli.input)?;
        tracing::info!(path = %backup_path.display(), "backup created");
    }

    let report = editor
        .save()
        .with_context(|| format!("写入文件失败: {:?}", cli.input))?;

    if !cli.quiet {
        println!(
            "已提交 {} 个区段，共 {} 个元素",
            report.runs_written, report.elements_written
        );
    }
    Ok(())
}

/// 解析位置：支持十进制和 0x 前缀的十六进制
fn parse_position(text: &str) -> anyhow::Result<usize> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => text.parse::<usize>(),
    };
    parsed.with_context(|| format!("无效的位置: {}", text))
}

/// 解析 POS=V1,V2,...
fn parse_set(spec: &str) -> anyhow::Result<(usize, Vec<u64>)> {
    let (pos, values) = spec
        .split_once('=')
        .with_context(|| format!("修改格式应为 POS=VALUES: {}", spec))?;

    let pos = parse_position(pos)?;
    let values = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            let v = v.strip_prefix("0x").unwrap_or(v);
            u64::from_str_radix(v, 16).with_context(|| format!("无效的十六进制值: {}", v))
        })
        .collect::<anyhow::Result<Vec<u64>>>()?;

    if values.is_empty() {
        bail!("修改没有给出任何值: {}", spec);
    }
    Ok((pos, values))
}

/// 解析 POS:LEN
fn parse_dump(spec: &str) -> anyhow::Result<(usize, usize)> {
    let (pos, len) = spec
        .split_once(':')
        .with_context(|| format!("视图格式应为 POS:LEN: {}", spec))?;
    Ok((parse_position(pos)?, parse_position(len)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("16").unwrap(), 16);
        assert_eq!(parse_position("0x10").unwrap(), 16);
        assert!(parse_position("zz").is_err());
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(parse_set("0x10=de,ad,0xBE").unwrap(), (16, vec![0xDE, 0xAD, 0xBE]));
        assert!(parse_set("10").is_err());
        assert!(parse_set("10=").is_err());
        assert!(parse_set("10=xyz").is_err());
    }

    #[test]
    fn test_parse_dump() {
        assert_eq!(parse_dump("0x20:32").unwrap(), (32, 32));
        assert!(parse_dump("32").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "sparse_edit", "-i", "a.bin", "--set", "0=1", "--set", "4=2,3", "--commit",
        ])
        .unwrap();
        assert_eq!(cli.sets.len(), 2);
        assert!(cli.commit);
        assert_eq!(cli.width, 8);
    }

    #[test]
    fn test_apply_sets_reports_invalid_change() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, [0u8; 4]).unwrap();
        let path_arg = path.to_str().unwrap();

        let blob = FileBlob::open_read_only(&path, ElementWidth::W8).unwrap();
        let mut editor = BlobEditor::new(blob);

        let cli = Cli::try_parse_from(["sparse_edit", "-i", path_arg, "--set", "1=aa"]).unwrap();
        apply_sets(&cli, &mut editor).unwrap();
        assert_eq!(editor.value(1).unwrap(), 0xAA);

        let cli = Cli::try_parse_from(["sparse_edit", "-i", path_arg, "--set", "3=1,2"]).unwrap();
        let err = apply_sets(&cli, &mut editor).unwrap_err();
        assert!(err.to_string().contains("无效的修改 3=1,2"));
        assert!(err.to_string().contains("4 个元素"));
        assert!(!editor.is_changed(3));
    }
}
