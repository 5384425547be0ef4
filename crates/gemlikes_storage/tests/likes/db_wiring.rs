#![forbid(unsafe_code)]

use std::fs;

use gemlikes_kernel_contracts::document::DocId;
use gemlikes_kernel_contracts::identity::ClientAddress;
use gemlikes_storage::LedgerStore;
use tempfile::TempDir;

fn store() -> (TempDir, LedgerStore, DocId) {
    let root = tempfile::tempdir().unwrap();
    let content = root.path().join("content");
    fs::create_dir_all(&content).unwrap();
    fs::write(content.join("post.gmi"), "# post").unwrap();
    let store = LedgerStore::new(root.path().join("data"), vec![content]);
    store.bootstrap().unwrap();
    let doc = store.resolve_document("post.gmi").unwrap();
    (root, store, doc)
}

#[test]
fn at_likes_db_01_append_then_has_like() {
    let (_root, store, doc) = store();
    let key = ClientAddress::new("2001:db8::7").unwrap().client_key();

    assert!(!store.has_like(&doc, &key).unwrap());
    assert_eq!(store.count_likes(&doc).unwrap(), 0);

    store.append_like(&doc, &key).unwrap();
    assert!(store.has_like(&doc, &key).unwrap());
    assert_eq!(store.count_likes(&doc).unwrap(), 1);
    assert_eq!(
        fs::read_to_string(store.likes_path(&doc)).unwrap(),
        "2001_db8__7\n"
    );
}

#[test]
fn at_likes_db_02_store_itself_does_not_deduplicate() {
    let (_root, store, doc) = store();
    let key = ClientAddress::new("192.0.2.1").unwrap().client_key();
    store.append_like(&doc, &key).unwrap();
    store.append_like(&doc, &key).unwrap();
    assert_eq!(store.count_likes(&doc).unwrap(), 2);
}

#[test]
fn at_likes_db_03_lock_is_reacquirable_after_drop() {
    let (_root, store, doc) = store();
    let first = store.lock_likes(&doc).unwrap();
    assert!(first.path().ends_with("locks/likes/post.gmi"));
    drop(first);
    let _second = store.lock_likes(&doc).unwrap();
}

#[test]
fn at_likes_db_04_longest_legal_document_name_can_be_locked() {
    let root = tempfile::tempdir().unwrap();
    let content = root.path().join("content");
    fs::create_dir_all(&content).unwrap();
    let name = format!("{}.gmi", "a".repeat(251));
    assert_eq!(name.len(), 255);
    fs::write(content.join(&name), "# long").unwrap();
    let store = LedgerStore::new(root.path().join("data"), vec![content]);
    store.bootstrap().unwrap();
    let doc = store.resolve_document(&name).unwrap();
    let key = ClientAddress::new("10.0.0.1").unwrap().client_key();

    let likes = store.lock_likes(&doc).unwrap();
    store.append_like(&doc, &key).unwrap();
    drop(likes);
    let _comments = store.lock_comments(&doc).unwrap();
    assert_eq!(store.count_likes(&doc).unwrap(), 1);
}
