use std::sync::Arc;

use retoma_core::{Kernel, KernelError, MessageId};

use super::common::{dead_letter, node_kernel, publish, DLC};
use crate::restore::RestoreEngine;

#[test]
fn deletes_metadata_content_and_index() {
    let (kernel, _storage, _dir) = node_kernel();
    let id = dead_letter(&kernel, "orders", b"payload");

    let engine = RestoreEngine::new(Arc::clone(&kernel) as Arc<dyn Kernel>);
    engine.delete_batch(&[id], DLC).unwrap();

    assert!(kernel.messages(DLC).unwrap().is_empty());
    assert!(kernel.content(&[id]).unwrap().is_empty());
    assert!(matches!(
        kernel.metadata(id).unwrap_err(),
        KernelError::MessageNotFound(_)
    ));
}

#[test]
fn leaves_ids_outside_the_batch_untouched() {
    let (kernel, _storage, _dir) = node_kernel();
    let doomed = dead_letter(&kernel, "orders", b"a");
    let kept = dead_letter(&kernel, "orders", b"b");

    let engine = RestoreEngine::new(Arc::clone(&kernel) as Arc<dyn Kernel>);
    engine.delete_batch(&[doomed], DLC).unwrap();

    let held: Vec<MessageId> = kernel.messages(DLC).unwrap().iter().map(|m| m.id).collect();
    assert_eq!(held, vec![kept]);
}

#[test]
fn live_messages_are_never_deleted() {
    let (kernel, _storage, _dir) = node_kernel();
    let live = publish(&kernel, "orders", b"still-live");
    let doomed = dead_letter(&kernel, "orders", b"dead");

    // A live identifier in the batch is skipped; only the dead-lettered
    // row goes away
    let engine = RestoreEngine::new(Arc::clone(&kernel) as Arc<dyn Kernel>);
    engine.delete_batch(&[live, doomed], DLC).unwrap();

    assert!(kernel.message("orders", live).unwrap().is_some());
    assert!(kernel.content(&[live]).unwrap().contains_key(&live));
    assert!(kernel.messages(DLC).unwrap().is_empty());
}

#[test]
fn unknown_and_repeated_ids_are_no_ops() {
    let (kernel, _storage, _dir) = node_kernel();
    let id = dead_letter(&kernel, "orders", b"payload");

    let engine = RestoreEngine::new(Arc::clone(&kernel) as Arc<dyn Kernel>);
    engine.delete_batch(&[id], DLC).unwrap();
    engine.delete_batch(&[id], DLC).unwrap();
    engine.delete_batch(&[MessageId(12_345)], DLC).unwrap();
}
