#![forbid(unsafe_code)]

use std::fs;

use gemlikes_kernel_contracts::identity::ClientAddress;
use gemlikes_storage::LedgerStore;
use tempfile::TempDir;

fn store() -> (TempDir, LedgerStore) {
    let root = tempfile::tempdir().unwrap();
    let content = root.path().join("content");
    fs::create_dir_all(&content).unwrap();
    fs::write(content.join("one.gmi"), "# one").unwrap();
    fs::write(content.join("two.gmi"), "# two").unwrap();
    let store = LedgerStore::new(root.path().join("data"), vec![content]);
    store.bootstrap().unwrap();
    (root, store)
}

#[test]
fn at_session_db_01_take_returns_once_then_nothing() {
    let (_root, store) = store();
    let key = ClientAddress::new("192.0.2.9").unwrap().client_key();
    let doc = store.resolve_document("one.gmi").unwrap();

    assert_eq!(store.take_pending_session(&key).unwrap(), None);
    store.put_pending_session(&key, &doc).unwrap();
    assert!(store.has_pending_session(&key));

    assert_eq!(
        store.take_pending_session(&key).unwrap().as_deref(),
        Some("one.gmi")
    );
    assert!(!store.has_pending_session(&key));
    assert_eq!(store.take_pending_session(&key).unwrap(), None);
}

#[test]
fn at_session_db_02_latest_intent_wins() {
    let (_root, store) = store();
    let key = ClientAddress::new("192.0.2.9").unwrap().client_key();
    let one = store.resolve_document("one.gmi").unwrap();
    let two = store.resolve_document("two.gmi").unwrap();

    store.put_pending_session(&key, &one).unwrap();
    store.put_pending_session(&key, &two).unwrap();
    assert_eq!(
        fs::read_to_string(store.session_path(&key)).unwrap(),
        "two.gmi"
    );
    assert_eq!(
        store.take_pending_session(&key).unwrap().as_deref(),
        Some("two.gmi")
    );
}

#[test]
fn at_session_db_03_take_leaves_no_residue_in_tmp() {
    let (_root, store) = store();
    let key = ClientAddress::new("2001:db8::1").unwrap().client_key();
    let doc = store.resolve_document("one.gmi").unwrap();
    store.put_pending_session(&key, &doc).unwrap();
    store.take_pending_session(&key).unwrap();

    let leftovers: Vec<_> = fs::read_dir(store.data_root().join("tmp"))
        .unwrap()
        .collect();
    assert!(leftovers.is_empty());
}
