#![forbid(unsafe_code)]

use std::fs;

use gemlikes_kernel_contracts::comment::{CommentBody, CommentRecord, Username};
use gemlikes_kernel_contracts::document::DocId;
use gemlikes_kernel_contracts::identity::{ClientAddress, ClientKey, PseudoId};
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

fn key(addr: &str) -> ClientKey {
    ClientAddress::new(addr).unwrap().client_key()
}

fn record(user: &str, body: &str) -> CommentRecord {
    CommentRecord::v1(
        &Username::new(user).unwrap(),
        &PseudoId::new("deadbeef").unwrap(),
        "Mon, 02 Jan 2006 15:04:05 UTC".to_string(),
        &CommentBody::from_submitted(body).unwrap(),
    )
    .unwrap()
}

#[test]
fn at_comments_db_01_claims_are_counted_per_identity() {
    let (_root, store, doc) = store();
    let a = key("192.0.2.1");
    let b = key("192.0.2.2");
    assert_eq!(store.count_username_claims(&doc, &a).unwrap(), 0);

    store.append_username_claim(&doc, &a, "alice").unwrap();
    store.append_username_claim(&doc, &a, "alice").unwrap();
    store.append_username_claim(&doc, &b, "bob").unwrap();

    assert_eq!(store.count_username_claims(&doc, &a).unwrap(), 2);
    assert_eq!(store.count_username_claims(&doc, &b).unwrap(), 1);
}

#[test]
fn at_comments_db_02_uniqueness_scan_skips_self_and_comment_log() {
    let (_root, store, doc) = store();
    let a = key("192.0.2.1");
    let b = key("192.0.2.2");
    assert!(!store.username_claimed_by_other(&doc, &a, "alice").unwrap());

    store.append_username_claim(&doc, &a, "alice").unwrap();
    // The log holds "alice" as a username line too; it must not count as a claim.
    store.append_comment_record(&doc, &record("alice", "hi")).unwrap();

    assert!(!store.username_claimed_by_other(&doc, &a, "alice").unwrap());
    assert!(store.username_claimed_by_other(&doc, &b, "alice").unwrap());
    assert!(!store.username_claimed_by_other(&doc, &b, "carol").unwrap());
}

#[test]
fn at_comments_db_03_record_is_written_as_four_lines() {
    let (_root, store, doc) = store();
    store
        .append_comment_record(&doc, &record("alice", "first\r\nsecond"))
        .unwrap();
    assert_eq!(
        fs::read_to_string(store.comment_log_path(&doc)).unwrap(),
        "alice\ndeadbeef\nMon, 02 Jan 2006 15:04:05 UTC\nfirst second\n"
    );
}

#[test]
fn at_comments_db_04_reverse_scan_is_absent_before_first_comment() {
    let (_root, store, doc) = store();
    assert!(store.scan_comment_log_reverse(&doc).unwrap().is_none());

    store.append_comment_record(&doc, &record("alice", "one")).unwrap();
    store.append_comment_record(&doc, &record("bob", "two")).unwrap();
    let lines: Vec<String> = store
        .scan_comment_log_reverse(&doc)
        .unwrap()
        .unwrap()
        .map(|l| l.unwrap())
        .collect();
    assert_eq!(lines.len(), 8);
    assert_eq!(lines[0], "two");
    assert_eq!(lines[3], "bob");
    assert_eq!(lines[7], "alice");
}
