use desk_companion::memo::{MemoPad, MemoStore};
use tempfile::tempdir;

#[test]
fn missing_file_is_an_empty_memo() {
    let dir = tempdir().unwrap();
    let store = MemoStore::new(dir.path().join("memo.txt"));
    assert_eq!(store.load().unwrap(), "");

    let pad = MemoPad::load(store);
    assert_eq!(pad.text(), "");
    assert!(!pad.is_dirty());
}

#[test]
fn save_creates_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data").join("memo.txt");
    let store = MemoStore::new(path.clone());
    store.save("groceries:\n- coffee\n").unwrap();

    assert_eq!(store.load().unwrap(), "groceries:\n- coffee\n");
    assert!(path.exists());
}

#[test]
fn autosave_only_writes_dirty_buffers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("memo.txt");
    let mut pad = MemoPad::load(MemoStore::new(path.clone()));

    // Clean buffer: nothing written.
    assert!(!pad.autosave().unwrap());
    assert!(!path.exists());

    pad.text_mut().push_str("call the dentist");
    assert!(pad.is_dirty());
    assert!(pad.autosave().unwrap());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "call the dentist");

    // Unchanged since the last save: a second pass is a no-op.
    assert!(!pad.autosave().unwrap());
}

#[test]
fn save_now_always_writes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("memo.txt");
    let mut pad = MemoPad::load(MemoStore::new(path.clone()));
    pad.save_now().unwrap();
    assert!(path.exists());
}

#[test]
fn pad_picks_up_previous_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("memo.txt");
    std::fs::write(&path, "left over from last run").unwrap();

    let pad = MemoPad::load(MemoStore::new(path));
    assert_eq!(pad.text(), "left over from last run");
}
