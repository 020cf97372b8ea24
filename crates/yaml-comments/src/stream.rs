//! Streaming dump: the serializer runs on its own thread and hands lines to
//! the comment merger through a bounded queue.
//!
//! `None` on the queue marks the end of the serialized text.

use std::io::{self, Write};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

use serde_yaml::Value;
use tracing::debug;

use crate::dumper::CommentDumper;
use crate::error::{Error, Result};
use crate::key_tree::KeyTree;
use crate::values::is_empty_document;

/// Lines buffered between the serializer and the merger.
pub const DEFAULT_CAPACITY: usize = 64;

/// [`io::Write`] adapter that splits serializer output into lines and sends
/// them down the queue.
struct LineQueue {
    sender: SyncSender<Option<String>>,
    buffer: Vec<u8>,
}

impl LineQueue {
    fn new(sender: SyncSender<Option<String>>) -> Self {
        Self {
            sender,
            buffer: Vec::new(),
        }
    }

    fn send(&self, bytes: Vec<u8>) -> io::Result<()> {
        let line = String::from_utf8(bytes).map_err(io::Error::other)?;
        self.sender
            .send(Some(line))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "comment merger stopped"))
    }

    /// Send any unterminated last line and the end marker.
    fn close(mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            let rest = core::mem::take(&mut self.buffer);
            self.send(rest)?;
        }
        self.sender
            .send(None)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "comment merger stopped"))
    }
}

impl Write for LineQueue {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        while let Some(end) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
            line.pop();
            self.send(line)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Serialize `values` and merge the comments of `tree` into the output as
/// it is produced, writing the result to `out`.
///
/// At most `capacity` lines are held between the two threads.
///
/// # Errors
///
/// Returns the serializer's error, [`Error::Write`] if `out` fails, or
/// [`Error::ProducerPanicked`].
#[tracing::instrument(skip_all, fields(capacity = capacity))]
pub fn dump_to<W: Write>(values: &Value, tree: &KeyTree, capacity: usize, out: W) -> Result<()> {
    let (sender, receiver) = sync_channel::<Option<String>>(capacity.max(1));

    std::thread::scope(|scope| {
        let producer = scope.spawn(move || -> Result<()> {
            let mut queue = LineQueue::new(sender);
            if !is_empty_document(values) {
                serde_yaml::to_writer(&mut queue, values)?;
            }
            queue.close().map_err(Error::Write)
        });

        let consumed = consume(&receiver, tree, out);
        // Unblock the producer if the merger gave up early.
        drop(receiver);
        let produced = producer.join().map_err(|_| Error::ProducerPanicked)?;
        consumed?;
        produced
    })
}

fn consume<W: Write>(receiver: &Receiver<Option<String>>, tree: &KeyTree, mut out: W) -> Result<()> {
    let mut dumper = CommentDumper::new(tree);
    let mut chunk = String::new();
    let mut lines = 0usize;

    dumper.begin(&mut chunk);
    // A closed channel without the end marker means the producer failed;
    // its error is reported by the caller.
    while let Ok(Some(line)) = receiver.recv() {
        dumper.line(&line, &mut chunk);
        out.write_all(chunk.as_bytes()).map_err(Error::Write)?;
        chunk.clear();
        lines += 1;
    }
    dumper.finish(&mut chunk);
    out.write_all(chunk.as_bytes()).map_err(Error::Write)?;
    out.flush().map_err(Error::Write)?;
    debug!(lines, "streamed document");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{dumper, parser};
    use pretty_assertions::assert_eq;

    const TEXT: &str = "# header\n\n# numbers\nlist:\n- 1 # one\n- 2\nname: x # the name\n\n# end\n";

    #[test]
    fn streaming_matches_in_memory_dump() {
        let values: Value = serde_yaml::from_str(TEXT).unwrap();
        let tree = parser::parse(TEXT, '.');
        let expected = dumper::dump(&serde_yaml::to_string(&values).unwrap(), &tree);

        for capacity in [1, 2, DEFAULT_CAPACITY] {
            let mut out = Vec::new();
            dump_to(&values, &tree, capacity, &mut out).unwrap();
            assert_eq!(String::from_utf8(out).unwrap(), expected);
        }
        assert_eq!(expected, TEXT);
    }

    #[test]
    fn empty_document_keeps_comments() {
        let tree = parser::parse("# just a note\n", '.');
        let mut out = Vec::new();
        dump_to(&Value::Null, &tree, 4, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "# just a note\n");
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_errors_stop_both_threads() {
        let values: Value = serde_yaml::from_str("a: 1\nb: 2\nc: 3\n").unwrap();
        let tree = KeyTree::new('.');
        let err = dump_to(&values, &tree, 1, FailingWriter).unwrap_err();
        assert!(matches!(err, Error::Write(_)));
    }
}
