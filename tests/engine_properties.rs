//! 编辑引擎行为测试
//!
//! 测试场景：
//! - 任意写入序列后区段互不重叠、互不相邻（proptest 生成写入序列）
//! - 未修改位置读穿到原始数据
//! - 撤销栈上限
//! - 逐段提交能取出全部修改
//! - 文件数据块上的完整编辑流程

use sparse_edit::{BackingBlob, BlobEditor, EditEngine, ElementWidth, FileBlob, MemoryBlob};
use proptest::prelude::*;
use tempfile::TempDir;

fn patterned_blob(len: usize) -> MemoryBlob {
    let bytes: Vec<u8> = (0..len).map(|i| (i * 7 % 251) as u8).collect();
    MemoryBlob::from_bytes(&bytes)
}

fn assert_runs_disjoint(engine: &EditEngine) {
    let runs: Vec<(usize, usize)> = engine.runs().map(|(s, d)| (s, d.len())).collect();
    for (start, len) in &runs {
        assert!(*len > 0, "空区段: {}", start);
    }
    for pair in runs.windows(2) {
        let (a_start, a_len) = pair[0];
        let (b_start, _) = pair[1];
        assert!(
            a_start + a_len < b_start,
            "区段重叠或相邻: [{}, {}) 与 {}",
            a_start,
            a_start + a_len,
            b_start
        );
    }
}

/// 生成一次落在长度为 `blob_len` 的数据块内的写入
fn arb_write(blob_len: usize, max_len: usize) -> impl Strategy<Value = (usize, Vec<u64>)> {
    (0..blob_len).prop_flat_map(move |pos| {
        let room = (blob_len - pos).min(max_len);
        (Just(pos), prop::collection::vec(0..=255u64, 1..=room))
    })
}

proptest! {
    /// 任意写入序列后区段互不相交，有效视图与逐次覆盖的模型一致
    #[test]
    fn prop_writes_keep_runs_disjoint_and_match_model(
        writes in prop::collection::vec(arb_write(256, 6), 1..200)
    ) {
        let blob = patterned_blob(256);
        let mut engine = EditEngine::for_blob(&blob);
        let mut model: Vec<u64> = blob.as_slice().to_vec();

        for (pos, values) in &writes {
            engine.change_bytes(&blob, *pos, values, true).unwrap();
            model[*pos..*pos + values.len()].copy_from_slice(values);
            assert_runs_disjoint(&engine);
        }

        prop_assert_eq!(engine.bytes_values(&blob, 0, 256).unwrap(), model.clone());
        for (pos, expected) in model.iter().enumerate() {
            prop_assert_eq!(engine.byte_value(&blob, pos).unwrap(), *expected);
        }
    }

    /// 逐次撤销依次还原每次写入之前的视图
    #[test]
    fn prop_undo_replays_history_in_reverse(
        writes in prop::collection::vec(arb_write(64, 4), 1..30)
    ) {
        let blob = patterned_blob(64);
        let mut engine = EditEngine::for_blob(&blob);
        let mut snapshots = vec![blob.as_slice().to_vec()];

        for (pos, values) in &writes {
            engine.change_bytes(&blob, *pos, values, true).unwrap();
            snapshots.push(engine.bytes_values(&blob, 0, 64).unwrap());
        }

        snapshots.pop();
        for (pos, _) in writes.iter().rev() {
            let expected = snapshots.pop().unwrap();
            prop_assert_eq!(engine.undo(), *pos);
            prop_assert_eq!(engine.bytes_values(&blob, 0, 64).unwrap(), expected);
            assert_runs_disjoint(&engine);
        }
        prop_assert!(!engine.has_undo());
        prop_assert!(snapshots.is_empty());
    }

    /// 逐段取出按位置顺序返回每个区段恰好一次
    #[test]
    fn prop_drain_yields_every_run_once(
        writes in prop::collection::vec(arb_write(200, 3), 1..40)
    ) {
        let blob = patterned_blob(200);
        let mut engine = EditEngine::for_blob(&blob);
        for (pos, values) in &writes {
            engine.change_bytes(&blob, *pos, values, true).unwrap();
        }

        let expected: Vec<(usize, Vec<u64>)> = engine.runs().map(|(s, d)| (s, d.to_vec())).collect();
        let changed = engine.changed_elements();

        let mut drained = Vec::new();
        while let Some(run) = engine.pop_first_change() {
            drained.push(run);
        }

        prop_assert_eq!(drained.iter().map(|(_, d)| d.len()).sum::<usize>(), changed);
        prop_assert_eq!(drained, expected);
        prop_assert!(!engine.has_changes());
    }
}

#[test]
fn test_read_through_uncovered_positions() {
    let blob = patterned_blob(100);
    let mut engine = EditEngine::for_blob(&blob);
    engine.change_bytes(&blob, 10, &[0xAA; 5], true).unwrap();
    engine.change_bytes(&blob, 50, &[0xBB; 3], true).unwrap();

    for pos in (0..100).filter(|&p| !engine.is_changed(p)) {
        assert_eq!(
            engine.byte_value(&blob, pos).unwrap(),
            blob.read_original(pos, 1).unwrap()[0]
        );
    }
}

#[test]
fn test_merge_example() {
    let blob = MemoryBlob::zeroed(ElementWidth::W8, 100);
    let mut engine = EditEngine::for_blob(&blob);

    engine.change_bytes(&blob, 0, &(0..10).collect::<Vec<u64>>(), true).unwrap();
    engine.change_bytes(&blob, 5, &(100..110).collect::<Vec<u64>>(), true).unwrap();
    engine.change_bytes(&blob, 20, &[1, 2, 3, 4, 5], true).unwrap();

    let runs: Vec<(usize, Vec<u64>)> = engine.runs().map(|(s, d)| (s, d.to_vec())).collect();
    let mut first: Vec<u64> = (0..5).collect();
    first.extend(100..110);
    assert_eq!(runs, vec![(0, first), (20, vec![1, 2, 3, 4, 5])]);
}

#[test]
fn test_single_edit_undo_roundtrip() {
    let blob = patterned_blob(40);
    for pos in [0usize, 13, 36] {
        let mut engine = EditEngine::for_blob(&blob);
        let before = engine.bytes_values(&blob, pos, 4).unwrap();

        engine.change_bytes(&blob, pos, &[1, 2, 3, 4], true).unwrap();
        assert_eq!(engine.undo(), pos);
        assert_eq!(engine.bytes_values(&blob, pos, 4).unwrap(), before);
    }
}

#[test]
fn test_undo_stack_bound() {
    let limit = 5;
    let extra = 3;
    let blob = MemoryBlob::zeroed(ElementWidth::W8, 32);
    let mut engine = EditEngine::with_stack_limit(ElementWidth::W8, 32, limit);

    for i in 0..limit + extra {
        engine.change_bytes(&blob, i * 2, &[1 + i as u64], true).unwrap();
    }
    assert_eq!(engine.undo_depth(), limit);

    for _ in 0..limit {
        assert!(engine.has_undo());
        engine.undo();
    }
    assert!(!engine.has_undo());
    assert_eq!(engine.undo(), 0);

    // 最早的 extra 次修改已无法撤销
    for i in 0..extra {
        assert_eq!(engine.byte_value(&blob, i * 2).unwrap(), 1 + i as u64);
    }
    for i in extra..limit + extra {
        assert_eq!(engine.byte_value(&blob, i * 2).unwrap(), 0);
    }
}

#[test]
fn test_concrete_scenario() {
    let blob = MemoryBlob::zeroed(ElementWidth::W8, 100);
    let mut engine = EditEngine::for_blob(&blob);

    engine.change_bytes(&blob, 10, &[1, 2, 3], true).unwrap();
    assert_eq!(engine.bytes_values(&blob, 10, 3).unwrap(), vec![1, 2, 3]);
    assert_eq!(engine.byte_value(&blob, 9).unwrap(), 0);

    engine.change_bytes(&blob, 12, &[9, 9, 9], true).unwrap();
    let runs: Vec<(usize, Vec<u64>)> = engine.runs().map(|(s, d)| (s, d.to_vec())).collect();
    assert_eq!(runs, vec![(10, vec![1, 2, 9, 9, 9])]);

    assert_eq!(engine.undo(), 12);
    assert_eq!(engine.bytes_values(&blob, 10, 5).unwrap(), vec![1, 2, 3, 0, 0]);

    assert_eq!(engine.undo(), 10);
    assert_eq!(engine.bytes_values(&blob, 10, 5).unwrap(), vec![0; 5]);
    assert!(!engine.has_undo());
}

#[test]
fn test_file_blob_edit_and_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("image.bin");
    std::fs::write(&path, (0u8..64).collect::<Vec<u8>>()).unwrap();

    let blob = FileBlob::open(&path, ElementWidth::W8).unwrap();
    let mut editor = BlobEditor::new(blob);
    editor.change_bytes(4, &[0xFF, 0xFE]).unwrap();
    editor.change_bytes(60, &[0]).unwrap();
    editor.change_bytes(5, &[0xAA]).unwrap();

    // 提交前文件未改变
    assert_eq!(std::fs::read(&path).unwrap()[4], 4);

    let report = editor.save().unwrap();
    assert_eq!(report.runs_written, 2);
    drop(editor);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[3..7], &[3, 0xFF, 0xAA, 6]);
    assert_eq!(bytes[60], 0);
    assert_eq!(bytes[61], 61);
}

#[test]
fn test_file_blob_each_width() {
    let dir = TempDir::new().unwrap();
    for width in [ElementWidth::W8, ElementWidth::W16, ElementWidth::W32, ElementWidth::W64] {
        let path = dir.path().join(format!("w{}.bin", width.bits()));
        std::fs::write(&path, vec![0u8; width.byte_len() * 8]).unwrap();

        let value = width.max_value() - 1;
        {
            let mut editor = BlobEditor::new(FileBlob::open(&path, width).unwrap());
            assert_eq!(editor.blob().len(), 8);
            editor.change_bytes(3, &[value]).unwrap();
            editor.save().unwrap();
        }

        let blob = FileBlob::open(&path, width).unwrap();
        assert_eq!(blob.read_original(2, 3).unwrap(), vec![0, value, 0]);
    }
}

#[test]
fn test_editor_over_borrowed_blob() {
    let mut blob = MemoryBlob::zeroed(ElementWidth::W8, 8);
    {
        let mut editor = BlobEditor::new(&mut blob);
        editor.change_bytes(2, &[5]).unwrap();
        editor.save().unwrap();
    }
    assert_eq!(blob.as_slice()[2], 5);
}
