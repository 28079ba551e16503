//! End-to-end scenarios across sessions, transforms and undo.

use std::rc::Rc;

use weft::core::{Attributes, Document};
use weft::sync::memory::{MemoryChannel, MemoryMux};
use weft::transform::transform;
use weft::wavelet::WaveletOperationKind;
use weft::{DocOp, OneStepBuffer, Session, SessionConfig, WaveletHooks, WaveletOperation};

fn session(user: &str, mux: Rc<MemoryMux>) -> Session {
    Session::new(user.into(), mux, SessionConfig::default(), WaveletHooks::default())
}

fn body(text: &str) -> DocOp {
    DocOp::builder()
        .element_start("body", Attributes::new())
        .characters(text)
        .element_end()
        .build()
}

/// Deliver everything `from` has sent since `seen` to `to`.
fn relay(from: &MemoryChannel, to: &MemoryChannel, seen: &mut usize) {
    let sent = from.sent();
    for op in &sent[*seen..] {
        to.deliver(op.clone());
    }
    *seen = sent.len();
}

#[test]
fn test_insert_against_delete_converges() {
    let base = Document::from_op(&body("ab")).unwrap();
    let client = DocOp::builder().retain(2).characters("X").retain(2).build();
    let server = DocOp::builder()
        .retain(2)
        .delete_characters("b")
        .retain(1)
        .build();

    let (client2, server2) = transform(&client, &server).unwrap();
    assert_eq!(
        client2,
        DocOp::builder().retain(2).characters("X").retain(1).build()
    );
    assert_eq!(
        server2,
        DocOp::builder()
            .retain(3)
            .delete_characters("b")
            .retain(1)
            .build()
    );

    let one = base.apply(&client).and_then(|d| d.apply(&server2)).unwrap();
    let two = base.apply(&server).and_then(|d| d.apply(&client2)).unwrap();
    assert_eq!(one.to_xml(), "<body>aX</body>");
    assert_eq!(one, two);
}

#[test]
fn test_replica_follows_author() {
    let alice_mux = MemoryMux::new();
    let alice = session("alice@example.com", alice_mux.clone());
    let bob = session("bob@example.com", MemoryMux::new());

    let wavelet = alice.create_wavelet().unwrap();
    wavelet
        .submit_document_op("b+main".into(), body("hello"))
        .unwrap();
    wavelet.add_participant("bob@example.com".into()).unwrap();

    let outbound = alice_mux.channel(wavelet.id()).unwrap();
    let inbound = MemoryChannel::new();
    let replica = bob.channel_opened(wavelet.id(), inbound.clone()).unwrap();
    let mut seen = 0;
    relay(&outbound, &inbound, &mut seen);

    assert_eq!(seen, 3);
    assert_eq!(replica.participants(), wavelet.participants());
    assert_eq!(
        replica.document(&"b+main".into()),
        wavelet.document(&"b+main".into())
    );
    // Same operations, same hash chain.
    assert_eq!(replica.hashed_version(), wavelet.hashed_version());
    assert_eq!(replica.version(), 3);
}

#[test]
fn test_undo_after_remote_edit() {
    let mux = MemoryMux::new();
    let alice = session("alice@example.com", mux.clone());
    let wavelet = alice.create_wavelet().unwrap();
    wavelet
        .submit_document_op("b+main".into(), body(""))
        .unwrap();

    let mut undo = OneStepBuffer::default();
    let local = WaveletOperation::document(
        weft::wavelet::WaveletOperationContext::new("alice@example.com".into()),
        "b+main".into(),
        DocOp::builder().retain(1).characters("hello").retain(1).build(),
    );
    wavelet.submit(local.clone()).unwrap();
    undo.undoable(&local);

    // Bob inserts at the same place, concurrently with the greeting.
    let remote = WaveletOperation::document(
        weft::wavelet::WaveletOperationContext::new("bob@example.com".into()),
        "b+main".into(),
        DocOp::builder().retain(1).characters("!").retain(1).build(),
    );
    let applied = undo.transform_non_undoable(remote, true).unwrap();
    assert_eq!(applied.len(), 1);
    let channel = mux.channel(wavelet.id()).unwrap();
    channel.deliver(applied[0].clone());
    assert_eq!(
        wavelet.document(&"b+main".into()).map(|d| d.to_xml()).as_deref(),
        Some("<body>hello!</body>")
    );

    for op in undo.revert().unwrap() {
        wavelet.submit(op).unwrap();
    }
    assert!(!undo.has_operations());
    assert_eq!(
        wavelet.document(&"b+main".into()).map(|d| d.to_xml()).as_deref(),
        Some("<body>!</body>")
    );
}

#[test]
fn test_failed_wavelet_is_reported_and_contained() {
    let bob = session("bob@example.com", MemoryMux::new());
    let healthy = MemoryChannel::new();
    let broken = MemoryChannel::new();
    let a = bob.channel_opened(&"w+a".into(), healthy.clone()).unwrap();
    let b = bob.channel_opened(&"w+b".into(), broken.clone()).unwrap();

    broken.deliver(WaveletOperation::document(
        weft::wavelet::WaveletOperationContext::new("eve@example.com".into()),
        "b+main".into(),
        DocOp::builder().delete_characters("x").build(),
    ));
    healthy.deliver(WaveletOperation::document(
        weft::wavelet::WaveletOperationContext::new("alice@example.com".into()),
        "b+main".into(),
        body("fine"),
    ));

    assert_eq!(bob.failed_wavelets(), vec![b.id().clone()]);
    assert!(b.is_failed());
    assert!(!a.is_failed());
    assert!(bob.wavelet(a.id()).is_some());
    assert!(matches!(
        b.submit_document_op("b+main".into(), body("x")),
        Err(weft::sync::SyncError::WaveletFailed(_))
    ));
}

#[test]
fn test_remote_document_ops_are_documents() {
    let mux = MemoryMux::new();
    let alice = session("alice@example.com", mux.clone());
    let wavelet = alice.create_wavelet().unwrap();
    wavelet
        .submit_document_op("b+main".into(), body("hi"))
        .unwrap();
    let sent = mux.channel(wavelet.id()).unwrap().sent();
    assert!(matches!(
        &sent[1].kind,
        WaveletOperationKind::Document { document_id, .. } if document_id.as_str() == "b+main"
    ));
    assert_eq!(sent[1].creator().as_str(), "alice@example.com");
}
