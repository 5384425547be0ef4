#![forbid(unsafe_code)]

use std::io;

use gemlikes_kernel_contracts::comment::{CommentRecord, COMMENT_RECORD_LINES};
use gemlikes_kernel_contracts::document::DocId;

/// Rebuilds comment records from comment-log lines delivered last line first.
///
/// Blank lines are skipped and not counted. Reading backward, a record arrives
/// as body, timestamp, id, username; the username completes it. A partial
/// group left at the start of the log is never yielded.
#[derive(Debug)]
pub struct CommentFeed<I> {
    lines: I,
    consumed: u64,
    body: String,
    timestamp: String,
    pseudo_id: String,
}

impl<I> CommentFeed<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            consumed: 0,
            body: String::new(),
            timestamp: String::new(),
            pseudo_id: String::new(),
        }
    }

    /// Non-blank lines seen so far.
    pub fn lines_consumed(&self) -> u64 {
        self.consumed
    }

    /// Complete records seen so far.
    pub fn comment_count(&self) -> u64 {
        self.consumed / COMMENT_RECORD_LINES as u64
    }
}

impl<I> Iterator for CommentFeed<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = io::Result<CommentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(err)),
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let slot = self.consumed % COMMENT_RECORD_LINES as u64;
            self.consumed += 1;
            match slot {
                0 => self.body = line.to_string(),
                1 => self.timestamp = line.to_string(),
                2 => self.pseudo_id = line.to_string(),
                _ => {
                    return Some(Ok(CommentRecord {
                        username: line.to_string(),
                        pseudo_id: std::mem::take(&mut self.pseudo_id),
                        timestamp: std::mem::take(&mut self.timestamp),
                        body: std::mem::take(&mut self.body),
                    }));
                }
            }
        }
    }
}

pub fn likes_line(likes: u64) -> String {
    if likes == 1 {
        "1 like. 💖".to_string()
    } else {
        format!("{likes} likes! 💖")
    }
}

pub fn comments_line(comments: u64) -> String {
    if comments == 1 {
        "1 comment 💬".to_string()
    } else {
        format!("{comments} comments 💬")
    }
}

pub fn render_comment(record: &CommentRecord) -> String {
    format!(
        "{} (id: {}) @ {}:\n{}\n\n",
        record.username, record.pseudo_id, record.timestamp, record.body
    )
}

/// Gemtext for a document's view page.
///
/// `link` is the document name already escaped for use in a query string.
/// `comments` is `None` when the document has no comment log yet.
pub fn render_view_page<I>(
    doc: &DocId,
    link: &str,
    likes: u64,
    comments: Option<CommentFeed<I>>,
) -> io::Result<String>
where
    I: Iterator<Item = io::Result<String>>,
{
    let mut page = format!(
        "# {doc}\n\n{}\n=> like?{link} Add yours\n\n",
        likes_line(likes)
    );
    let Some(mut feed) = comments else {
        page.push_str(&format!("=> add-comment?{link} Add a comment 💬\n"));
        return Ok(page);
    };

    let mut rendered = String::new();
    for record in feed.by_ref() {
        rendered.push_str(&render_comment(&record?));
    }
    page.push_str(&format!(
        "{}\n=> add-comment?{link} Add yours\n\n",
        comments_line(feed.comment_count())
    ));
    page.push_str(&rendered);
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines_rev(text: &str) -> std::vec::IntoIter<io::Result<String>> {
        let mut lines: Vec<io::Result<String>> =
            text.lines().map(|l| Ok(l.to_string())).collect();
        lines.reverse();
        lines.into_iter()
    }

    fn record(n: usize) -> CommentRecord {
        CommentRecord {
            username: format!("user{n}"),
            pseudo_id: format!("0000000{n}"),
            timestamp: format!("Mon, 0{n} Jan 2024 00:00:00 UTC"),
            body: format!("comment number {n}"),
        }
    }

    fn log_of(records: &[CommentRecord]) -> String {
        let mut log = String::new();
        for r in records {
            for line in r.log_lines() {
                log.push_str(line);
                log.push('\n');
            }
        }
        log
    }

    #[test]
    fn at_render_01_yields_records_newest_first() {
        let written: Vec<_> = (1..=5).map(record).collect();
        let mut feed = CommentFeed::new(lines_rev(&log_of(&written)));
        let read: Vec<_> = feed.by_ref().map(|r| r.unwrap()).collect();
        let mut expected = written.clone();
        expected.reverse();
        assert_eq!(read, expected);
        assert_eq!(feed.lines_consumed(), 20);
        assert_eq!(feed.comment_count(), 5);
    }

    #[test]
    fn at_render_02_blank_lines_are_ignored() {
        let log = format!("\n{}\n\n", log_of(&[record(1)]).replace('\n', "\n\n"));
        let mut feed = CommentFeed::new(lines_rev(&log));
        assert_eq!(feed.next().unwrap().unwrap(), record(1));
        assert!(feed.next().is_none());
        assert_eq!(feed.comment_count(), 1);
    }

    #[test]
    fn at_render_03_partial_oldest_group_is_dropped() {
        let log = format!("dangling\nhalf\n{}", log_of(&[record(1), record(2)]));
        let mut feed = CommentFeed::new(lines_rev(&log));
        let read: Vec<_> = feed.by_ref().map(|r| r.unwrap()).collect();
        assert_eq!(read, vec![record(2), record(1)]);
        assert_eq!(feed.lines_consumed(), 10);
        assert_eq!(feed.comment_count(), 2);
    }

    #[test]
    fn at_render_04_read_errors_are_surfaced() {
        let lines = vec![
            Ok("body".to_string()),
            Err(io::Error::new(io::ErrorKind::InvalidData, "boom")),
        ];
        let mut feed = CommentFeed::new(lines.into_iter());
        assert!(feed.next().unwrap().is_err());
    }

    #[test]
    fn at_render_05_headings_pluralize() {
        assert_eq!(likes_line(0), "0 likes! 💖");
        assert_eq!(likes_line(1), "1 like. 💖");
        assert_eq!(likes_line(2), "2 likes! 💖");
        assert_eq!(comments_line(1), "1 comment 💬");
        assert_eq!(comments_line(3), "3 comments 💬");
    }

    #[test]
    fn at_render_06_view_page_without_comment_log() {
        let doc = DocId::new("my post.gmi").unwrap();
        let page = render_view_page::<std::vec::IntoIter<io::Result<String>>>(
            &doc,
            "my%20post.gmi",
            1,
            None,
        )
        .unwrap();
        assert_eq!(
            page,
            "# my post.gmi\n\n1 like. 💖\n=> like?my%20post.gmi Add yours\n\n\
             => add-comment?my%20post.gmi Add a comment 💬\n"
        );
    }

    #[test]
    fn at_render_07_view_page_lists_comments_under_count() {
        let doc = DocId::new("post.gmi").unwrap();
        let feed = CommentFeed::new(lines_rev(&log_of(&[record(1), record(2)])));
        let page = render_view_page(&doc, "post.gmi", 3, Some(feed)).unwrap();
        assert_eq!(
            page,
            "# post.gmi\n\n3 likes! 💖\n=> like?post.gmi Add yours\n\n\
             2 comments 💬\n=> add-comment?post.gmi Add yours\n\n\
             user2 (id: 00000002) @ Mon, 02 Jan 2024 00:00:00 UTC:\ncomment number 2\n\n\
             user1 (id: 00000001) @ Mon, 01 Jan 2024 00:00:00 UTC:\ncomment number 1\n\n"
        );
    }

    #[test]
    fn at_render_08_feed_reads_appended_log_file_exactly() {
        use gemlikes_storage::LedgerStore;
        use std::fs;

        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(&content).unwrap();
        fs::write(content.join("post.gmi"), "# post\n").unwrap();
        let store = LedgerStore::new(dir.path().join("data"), vec![content]);
        store.bootstrap().unwrap();
        let doc = store.resolve_document("post.gmi").unwrap();

        let older = CommentRecord {
            username: "alice".to_string(),
            pseudo_id: "12ca17b4".to_string(),
            timestamp: "Tue, 02 Jan 2024 10:00:00 UTC".to_string(),
            body: "first  with spaces, kept".to_string(),
        };
        let newer = CommentRecord {
            username: "bob_ü".to_string(),
            pseudo_id: "9f00a1c3".to_string(),
            timestamp: "Wed, 03 Jan 2024 23:59:59 UTC".to_string(),
            body: "second: 💬".to_string(),
        };
        store.append_comment_record(&doc, &older).unwrap();
        store.append_comment_record(&doc, &newer).unwrap();

        let lines = store.scan_comment_log_reverse(&doc).unwrap().unwrap();
        let mut feed = CommentFeed::new(lines);
        let read: Vec<_> = feed.by_ref().map(|r| r.unwrap()).collect();
        assert_eq!(read, vec![newer, older]);
        assert_eq!(feed.lines_consumed(), 8);
    }
}
