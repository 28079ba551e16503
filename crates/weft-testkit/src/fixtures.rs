//! Test fixtures and helpers.
//!
//! Common setup code for sync and session tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use weft::{Session, SessionConfig};
use weft_core::{Attributes, DocOp, DocumentId, ParticipantId, WaveletId};
use weft_sync::memory::MemoryMux;
use weft_sync::{
    DocumentFlusher, FailureHandler, OperationSink, ResumeHandle, Result as SyncResult,
    WaveletHooks, WaveletObserver,
};
use weft_wavelet::{WaveletError, WaveletOperation, WaveletOperationContext};

/// A session over an in-memory mux, with recording hooks installed.
pub struct TestFixture {
    pub user: ParticipantId,
    pub mux: Rc<MemoryMux>,
    pub session: Session,
    pub observer: Rc<RecordingObserver>,
    pub failures: Rc<RecordingFailureHandler>,
}

impl TestFixture {
    /// Create a fixture whose mux creates channels at once.
    pub fn new(user: &str) -> Self {
        Self::with_mux(user, MemoryMux::new())
    }

    /// Create a fixture whose mux holds channel requests.
    pub fn deferred(user: &str) -> Self {
        Self::with_mux(user, MemoryMux::deferred())
    }

    fn with_mux(user: &str, mux: Rc<MemoryMux>) -> Self {
        let observer = Rc::new(RecordingObserver::default());
        let failures = Rc::new(RecordingFailureHandler::default());
        let observer_hook: Rc<dyn WaveletObserver> = observer.clone();
        let failure_hook: Rc<dyn FailureHandler> = failures.clone();
        let hooks = WaveletHooks {
            observers: vec![observer_hook],
            failure_handler: Some(failure_hook),
            flusher: None,
        };
        let session = Session::new(user.into(), mux.clone(), SessionConfig::default(), hooks);
        Self {
            user: user.into(),
            mux,
            session,
            observer,
            failures,
        }
    }

    /// A context authored by the fixture's user.
    pub fn context(&self) -> WaveletOperationContext {
        WaveletOperationContext::new(self.user.clone())
    }

    /// A document operation authored by the fixture's user.
    pub fn edit(&self, document: &str, op: DocOp) -> WaveletOperation {
        WaveletOperation::document(self.context(), document.into(), op)
    }

    /// Everything sent so far on the channel of `wavelet`.
    pub fn sent(&self, wavelet: &WaveletId) -> Vec<WaveletOperation> {
        self.mux
            .channel(wavelet)
            .map(|channel| channel.sent())
            .unwrap_or_default()
    }
}

/// Create fixtures for users `user0@example.com`, `user1@example.com`, ...
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| TestFixture::new(&format!("user{}@example.com", i)))
        .collect()
}

/// An insertion-only operation creating `<body>text</body>`.
pub fn body(text: &str) -> DocOp {
    DocOp::builder()
        .element_start("body", Attributes::new())
        .characters(text)
        .element_end()
        .build()
}

/// Records applied operations as `before …` and `after …` lines.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub events: RefCell<Vec<String>>,
}

impl RecordingObserver {
    /// Operations seen by `after_apply`, in order.
    pub fn applied(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| e.strip_prefix("after ").map(str::to_string))
            .collect()
    }
}

impl WaveletObserver for RecordingObserver {
    fn before_apply(&self, op: &WaveletOperation) {
        self.events.borrow_mut().push(format!("before {}", op));
    }

    fn after_apply(&self, op: &WaveletOperation) {
        self.events.borrow_mut().push(format!("after {}", op));
    }
}

/// Records failed wavelets and their errors.
#[derive(Debug, Default)]
pub struct RecordingFailureHandler {
    pub failures: RefCell<Vec<(WaveletId, String)>>,
}

impl RecordingFailureHandler {
    pub fn failed(&self) -> Vec<WaveletId> {
        self.failures.borrow().iter().map(|(id, _)| id.clone()).collect()
    }
}

impl FailureHandler for RecordingFailureHandler {
    fn on_failure(&self, wavelet: &WaveletId, error: &WaveletError) {
        self.failures
            .borrow_mut()
            .push((wavelet.clone(), error.to_string()));
    }
}

/// A sink that records what it consumes and can hold reception.
///
/// While held, `flush` keeps the resume handle and reports not ready;
/// [`FlushingSink::release`] resumes every held sucker.
#[derive(Default)]
pub struct FlushingSink {
    pub consumed: RefCell<Vec<WaveletOperation>>,
    held: Cell<bool>,
    waiting: RefCell<Vec<ResumeHandle>>,
}

impl FlushingSink {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn hold(&self) {
        self.held.set(true);
    }

    pub fn release(&self) {
        self.held.set(false);
        let waiting = std::mem::take(&mut *self.waiting.borrow_mut());
        for handle in waiting {
            handle.resume();
        }
    }

    pub fn is_waiting(&self) -> bool {
        !self.waiting.borrow().is_empty()
    }

    fn gate(&self, resume: ResumeHandle) -> bool {
        if self.held.get() {
            self.waiting.borrow_mut().push(resume);
            return false;
        }
        true
    }
}

impl OperationSink for FlushingSink {
    fn consume(&self, op: WaveletOperation) -> SyncResult<()> {
        self.consumed.borrow_mut().push(op);
        Ok(())
    }

    fn flush(&self, _op: &WaveletOperation, resume: ResumeHandle) -> bool {
        self.gate(resume)
    }
}

impl DocumentFlusher for FlushingSink {
    fn flush(&self, _document: &DocumentId, _op: &WaveletOperation, resume: ResumeHandle) -> bool {
        self.gate(resume)
    }
}
