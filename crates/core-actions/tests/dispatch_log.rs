use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::sync::{Arc, Mutex, MutexGuard};

use core_actions::{CommandContext, EditorView, LocalClipboard, UnknownCommand, dispatch};
use core_state::Document;
use tracing::Level;
use tracing::subscriber::with_default;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone)]
struct BufferWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

struct LockedWriter<'a> {
    guard: MutexGuard<'a, Vec<u8>>,
}

impl Write for LockedWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = LockedWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LockedWriter {
            guard: self.inner.lock().expect("log buffer poisoned"),
        }
    }
}

#[test]
fn dispatch_logs_each_command_under_its_target() {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .with_target(true)
        .with_ansi(false)
        .without_time()
        .with_writer(BufferWriter { inner: buf.clone() })
        .finish();

    let unknown = with_default(subscriber, || {
        let doc = Rc::new(RefCell::new(Document::from_text("abc")));
        let mut view = EditorView::new(doc);
        let mut clipboard = LocalClipboard::new();
        let mut ctx = CommandContext::new(&mut clipboard);
        dispatch("CursorDocumentEnd", &mut view, &mut ctx).unwrap();
        dispatch("InsertReturn", &mut view, &mut ctx).unwrap();
        dispatch("NoSuchCommand", &mut view, &mut ctx)
    });

    assert_eq!(unknown, Err(UnknownCommand("NoSuchCommand".into())));
    let out = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
    assert!(out.contains("actions.dispatch"), "log: {out}");
    assert!(out.contains("command=\"CursorDocumentEnd\""), "log: {out}");
    assert!(out.contains("edited=true"), "log: {out}");
    assert!(out.contains("state.edit"), "log: {out}");
    assert!(out.contains("unknown_command"), "log: {out}");
}
