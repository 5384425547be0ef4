#![forbid(unsafe_code)]

use std::fs;
use std::path::PathBuf;

use gemlikes_storage::LedgerStore;
use tempfile::TempDir;

struct Fixture {
    _root: TempDir,
    content_a: PathBuf,
    content_b: PathBuf,
    store: LedgerStore,
}

fn fixture() -> Fixture {
    let root = tempfile::tempdir().unwrap();
    let content_a = root.path().join("capsule");
    let content_b = root.path().join("gemlog");
    let data = root.path().join("data");
    for dir in [&content_a, &content_b, &data] {
        fs::create_dir_all(dir).unwrap();
    }
    let store = LedgerStore::new(data, vec![content_a.clone(), content_b.clone()]);
    store.bootstrap().unwrap();
    Fixture {
        _root: root,
        content_a,
        content_b,
        store,
    }
}

#[test]
fn at_ledger_db_01_bootstrap_is_idempotent_and_creates_families() {
    let f = fixture();
    f.store.bootstrap().unwrap();
    for dir in ["likes", "comments", "tmp", "locks"] {
        assert!(f.store.data_root().join(dir).is_dir(), "{dir} missing");
    }
}

#[test]
fn at_ledger_db_02_document_must_exist_in_exactly_one_content_dir() {
    let f = fixture();
    assert!(!f.store.document_exists("post.gmi"));

    fs::write(f.content_a.join("post.gmi"), "# post").unwrap();
    assert!(f.store.document_exists("post.gmi"));

    fs::write(f.content_b.join("post.gmi"), "# duplicate").unwrap();
    assert!(!f.store.document_exists("post.gmi"));
}

#[test]
fn at_ledger_db_03_traversal_is_never_resolved() {
    let f = fixture();
    fs::write(f.content_a.join("post.gmi"), "# post").unwrap();
    fs::create_dir_all(f.content_a.join("sub")).unwrap();
    fs::write(f.content_a.join("sub").join("inner.gmi"), "# inner").unwrap();

    assert!(!f.store.document_exists("sub/inner.gmi"));
    assert!(!f.store.document_exists("../capsule/post.gmi"));
    assert!(!f.store.document_exists("post.gmi?x"));
    assert!(!f.store.document_exists(""));
}

#[test]
fn at_ledger_db_04_paths_stay_under_data_root() {
    let f = fixture();
    fs::write(f.content_a.join("post.gmi"), "# post").unwrap();
    let doc = f.store.resolve_document("post.gmi").unwrap();
    let root = f.store.data_root();
    assert_eq!(f.store.likes_path(&doc), root.join("likes").join("post.gmi"));
    assert_eq!(
        f.store.comment_log_path(&doc),
        root.join("comments").join("post.gmi").join("comments")
    );
    assert_eq!(f.store.salt_path(), root.join("ip_salt"));
}
