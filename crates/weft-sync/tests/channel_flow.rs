//! End-to-end flows over in-memory channels.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use weft_core::{Attributes, DocOp, DocumentId, ParticipantId, WaveletId};
use weft_sync::memory::{MemoryChannel, MemoryMux};
use weft_sync::{
    CcBasedWavelet, DocumentFlusher, FailureHandler, LiveChannelBinder, OperationalizerRegistry,
    ResumeHandle, WaveletHooks, WaveletObserver, WaveletView,
};
use weft_wavelet::{WaveletConfig, WaveletData, WaveletError, WaveletOperation, WaveletOperationContext};

/// Holds reception while not ready.
#[derive(Default)]
struct Gate {
    closed: Cell<bool>,
    waiting: RefCell<Vec<ResumeHandle>>,
}

impl Gate {
    fn open(&self) {
        self.closed.set(false);
        let waiting = std::mem::take(&mut *self.waiting.borrow_mut());
        for handle in waiting {
            handle.resume();
        }
    }
}

impl DocumentFlusher for Gate {
    fn flush(&self, _document: &DocumentId, _op: &WaveletOperation, resume: ResumeHandle) -> bool {
        if self.closed.get() {
            self.waiting.borrow_mut().push(resume);
            return false;
        }
        true
    }
}

#[derive(Default)]
struct Failures(RefCell<Vec<WaveletId>>);

#[derive(Default)]
struct Applied(Cell<usize>);

impl WaveletObserver for Applied {
    fn after_apply(&self, _op: &WaveletOperation) {
        self.0.set(self.0.get() + 1);
    }
}

impl FailureHandler for Failures {
    fn on_failure(&self, wavelet: &WaveletId, _error: &WaveletError) {
        self.0.borrow_mut().push(wavelet.clone());
    }
}

fn bob(op: DocOp) -> WaveletOperation {
    WaveletOperation::document(
        WaveletOperationContext::new("bob@example.com".into()),
        "b+main".into(),
        op,
    )
}

fn body(text: &str) -> DocOp {
    DocOp::builder()
        .element_start("body", Attributes::new())
        .characters(text)
        .element_end()
        .build()
}

fn xml(wavelet: &CcBasedWavelet) -> Option<String> {
    wavelet.document(&"b+main".into()).map(|d| d.to_xml())
}

#[test]
fn test_concurrent_edits_converge_through_channel() {
    let gate = Rc::new(Gate::default());
    let flusher: Rc<dyn DocumentFlusher> = gate.clone();
    let wavelet = CcBasedWavelet::new(
        WaveletData::new("w+1".into()),
        "alice@example.com".into(),
        WaveletConfig::default(),
        WaveletHooks {
            flusher: Some(flusher),
            ..WaveletHooks::default()
        },
    );
    let channel = MemoryChannel::new();
    channel.set_transform_on_send(true);
    wavelet.bind(channel.clone()).unwrap();
    channel.deliver(bob(body("ab")));
    assert_eq!(xml(&wavelet).as_deref(), Some("<body>ab</body>"));

    // Bob's insert arrives while reception is held.
    gate.closed.set(true);
    let remote = DocOp::builder().retain(3).characters("Y").retain(1).build();
    channel.deliver(bob(remote.clone()));
    assert_eq!(channel.pending(), 1);

    // Alice edits the same state; the channel rebases Bob's queued op.
    let local = DocOp::builder().retain(2).characters("X").retain(2).build();
    wavelet
        .submit_document_op("b+main".into(), local.clone())
        .unwrap();
    assert_eq!(xml(&wavelet).as_deref(), Some("<body>aXb</body>"));

    gate.open();
    assert_eq!(channel.pending(), 0);
    assert_eq!(xml(&wavelet).as_deref(), Some("<body>aXbY</body>"));

    // The server applies Bob first, then Alice transformed.
    let (local2, _) = weft_transform::transform(&local, &remote).unwrap();
    let server = weft_core::Document::from_op(&body("ab"))
        .and_then(|d| d.apply(&remote))
        .and_then(|d| d.apply(&local2))
        .unwrap();
    assert_eq!(server.to_xml(), "<body>aXbY</body>");
    assert_eq!(wavelet.version(), 3);
}

#[test]
fn test_failure_is_isolated_per_wavelet() {
    let failures = Rc::new(Failures::default());
    let handler: Rc<dyn FailureHandler> = failures.clone();
    let applied = Rc::new(Applied::default());
    let observer: Rc<dyn WaveletObserver> = applied.clone();
    let registry = Rc::new(OperationalizerRegistry::new(
        "alice@example.com".into(),
        WaveletConfig::default(),
        WaveletHooks {
            observers: vec![observer],
            failure_handler: Some(handler),
            ..WaveletHooks::default()
        },
    ));
    let mux = MemoryMux::new();
    let binder = LiveChannelBinder::new(Rc::clone(&registry), Rc::new(WaveletView::new()), mux.clone());

    let good = MemoryChannel::new();
    let bad = MemoryChannel::new();
    let a = binder.channel_opened(&"w+a".into(), good.clone()).unwrap();
    let b = binder.channel_opened(&"w+b".into(), bad.clone()).unwrap();

    good.deliver(bob(body("ok")));
    bad.deliver(bob(DocOp::identity(7)));

    assert!(!a.is_failed());
    assert!(b.is_failed());
    assert_eq!(*failures.0.borrow(), vec![WaveletId::from("w+b")]);
    assert_eq!(xml(&a).as_deref(), Some("<body>ok</body>"));
    assert_eq!(applied.0.get(), 1);

    // The healthy wavelet keeps its binding, listener and observers.
    assert!(a.is_bound());
    assert!(good.has_listener());
    assert!(!bad.has_listener());
    good.deliver(bob(DocOp::builder().retain(3).characters("!").retain(1).build()));
    assert_eq!(xml(&a).as_deref(), Some("<body>ok!</body>"));
    assert_eq!(applied.0.get(), 2);

    // The failed wavelet refuses local edits; the healthy one still sends.
    assert!(b.add_participant("carol@example.com".into()).is_err());
    a.add_participant("carol@example.com".into()).unwrap();
    assert_eq!(good.sent().len(), 1);
    assert!(bad.sent().is_empty());
}

#[test]
fn test_local_first_ops_reach_late_channel_in_order() {
    let registry = Rc::new(OperationalizerRegistry::new(
        "alice@example.com".into(),
        WaveletConfig::default(),
        WaveletHooks::default(),
    ));
    let mux = MemoryMux::deferred();
    let binder = LiveChannelBinder::new(Rc::clone(&registry), Rc::new(WaveletView::new()), mux.clone());

    let wavelet = registry.create("w+local".into()).unwrap();
    binder.view().add(Rc::clone(&wavelet));
    wavelet.add_participant("alice@example.com".into()).unwrap();
    wavelet
        .submit_document_op("b+main".into(), body("hi"))
        .unwrap();
    wavelet.add_participant("bob@example.com".into()).unwrap();

    mux.complete_pending();
    let channel = mux.channel(&"w+local".into()).unwrap();
    let sent: Vec<String> = channel.sent().iter().map(|op| op.kind.to_string()).collect();
    assert_eq!(sent.len(), 3);
    assert!(sent[0].starts_with("add"));
    assert!(sent[2].starts_with("add"));
    assert_eq!(
        wavelet.participants(),
        vec![
            ParticipantId::from("alice@example.com"),
            ParticipantId::from("bob@example.com")
        ]
    );
}
