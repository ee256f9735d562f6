//! Shared test helpers

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use crate::logging::{DisplaySink, LogBuffer};

/// In-memory writer whose contents can be inspected after being boxed
#[derive(Clone, Default)]
pub struct SharedWriter(Rc<RefCell<Vec<u8>>>);

impl SharedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Exit hook that unwinds instead of terminating the test runner
pub fn intercept_exit(code: i32) -> ! {
    panic!("process exit requested with code {}", code)
}

/// A log buffer writing to memory, with the exit hook intercepted
pub fn captured_log() -> (LogBuffer, SharedWriter) {
    let writer = SharedWriter::new();
    let log = LogBuffer::with_display(DisplaySink::with_writer(Box::new(writer.clone())))
        .with_exit_hook(intercept_exit);
    (log, writer)
}
