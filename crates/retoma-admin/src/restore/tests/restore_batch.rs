use std::sync::Arc;

use retoma_core::{DestinationKind, Kernel, MessageId};

use super::common::{dead_letter, node_kernel, BlockingKernel, DLC};
use crate::error::RestoreError;
use crate::restore::RestoreEngine;

#[test]
fn restores_whole_batch_to_original_destination() {
    let (kernel, _storage, _dir) = node_kernel();
    let ids: Vec<MessageId> = (0..3)
        .map(|i| dead_letter(&kernel, "orders", format!("m{i}").as_bytes()))
        .collect();

    let engine = RestoreEngine::new(Arc::clone(&kernel) as Arc<dyn Kernel>);
    let restored = engine.restore_batch(&ids, DLC, None).unwrap();
    assert_eq!(restored, 3);

    // Dead-letter store drained, destination repopulated with fresh ids
    assert!(kernel.messages(DLC).unwrap().is_empty());
    let live = kernel.messages("orders").unwrap();
    assert_eq!(live.len(), 3);
    let max_old = ids.iter().max().copied().unwrap();
    for metadata in &live {
        assert!(metadata.id > max_old, "restored messages get brand-new ids");
        assert_eq!(metadata.destination, "orders");
    }

    // Content followed the messages, in batch order
    let live_ids: Vec<MessageId> = live.iter().map(|m| m.id).collect();
    let contents = kernel.content(&live_ids).unwrap();
    for (i, id) in live_ids.iter().enumerate() {
        assert_eq!(contents[id][0].data, format!("m{i}").into_bytes());
    }
}

#[test]
fn flow_control_stops_the_batch_and_keeps_the_remainder() {
    let (inner, _storage, _dir) = node_kernel();
    let ids: Vec<MessageId> = (0..5)
        .map(|i| dead_letter(&inner, "orders", format!("m{i}").as_bytes()))
        .collect();

    let kernel = Arc::new(BlockingKernel::new(Arc::clone(&inner), 2));
    let engine = RestoreEngine::new(kernel as Arc<dyn Kernel>);

    let err = engine.restore_batch(&ids, DLC, None).unwrap_err();
    assert!(matches!(err, RestoreError::Interrupted { restored: 2 }));

    // Exactly the re-admitted prefix left the dead-letter store
    let held: Vec<MessageId> = inner.messages(DLC).unwrap().iter().map(|m| m.id).collect();
    assert_eq!(held, ids[2..]);
    assert_eq!(inner.messages("orders").unwrap().len(), 2);
}

#[test]
fn reroute_updates_destination_routing_and_storage_queue() {
    let (kernel, _storage, _dir) = node_kernel();
    let ids: Vec<MessageId> = (0..2)
        .map(|i| dead_letter(&kernel, "orders", format!("m{i}").as_bytes()))
        .collect();

    let engine = RestoreEngine::new(Arc::clone(&kernel) as Arc<dyn Kernel>);
    assert_eq!(engine.restore_batch(&ids, DLC, Some("replay")).unwrap(), 2);

    assert!(kernel.messages(DLC).unwrap().is_empty());
    assert!(kernel.messages("orders").unwrap().is_empty());

    let expected_queue = kernel.storage_queue("replay", DestinationKind::Queue);
    for metadata in kernel.messages("replay").unwrap() {
        assert_eq!(metadata.destination, "replay");
        assert_eq!(metadata.routing_key, "replay");
        assert_eq!(metadata.exchange, "amq.direct");
        assert_eq!(metadata.storage_queue, expected_queue);
    }
}

#[test]
fn restore_home_keeps_routing_but_recomputes_storage_queue() {
    let (kernel, _storage, _dir) = node_kernel();
    let id = dead_letter(&kernel, "orders", b"payload");
    let original = kernel.metadata(id).unwrap();

    let engine = RestoreEngine::new(Arc::clone(&kernel) as Arc<dyn Kernel>);
    engine.restore_batch(&[id], DLC, None).unwrap();

    let restored = &kernel.messages("orders").unwrap()[0];
    assert_eq!(restored.routing_key, original.routing_key);
    assert_eq!(restored.exchange, original.exchange);
    assert_eq!(
        restored.storage_queue,
        kernel.storage_queue("orders", DestinationKind::Queue)
    );
}

#[test]
fn empty_batch_is_a_successful_no_op() {
    let (kernel, _storage, _dir) = node_kernel();
    let engine = RestoreEngine::new(Arc::clone(&kernel) as Arc<dyn Kernel>);
    assert_eq!(engine.restore_batch(&[], DLC, None).unwrap(), 0);
}

#[test]
fn unknown_id_mid_batch_fails_but_keeps_the_restored_prefix() {
    let (kernel, _storage, _dir) = node_kernel();
    let a = dead_letter(&kernel, "orders", b"a");
    let b = dead_letter(&kernel, "orders", b"b");
    let batch = [a, MessageId(9_999), b];

    let engine = RestoreEngine::new(Arc::clone(&kernel) as Arc<dyn Kernel>);
    let err = engine.restore_batch(&batch, DLC, None).unwrap_err();
    assert!(matches!(err, RestoreError::MessageNotFound(MessageId(9_999))));

    // `a` was restored and deleted; `b` was never reached
    assert_eq!(kernel.messages("orders").unwrap().len(), 1);
    let held: Vec<MessageId> = kernel.messages(DLC).unwrap().iter().map(|m| m.id).collect();
    assert_eq!(held, vec![b]);
}

#[test]
fn missing_content_is_a_hard_failure_and_leaves_the_row() {
    use retoma_core::storage::keys;
    use retoma_core::{Storage, WriteBatchOp};

    let (kernel, storage, _dir) = node_kernel();
    let id = dead_letter(&kernel, "orders", b"payload");

    // Strip the content rows out from under the metadata
    let ops: Vec<WriteBatchOp> = storage
        .list_content(&keys::content_prefix(id))
        .unwrap()
        .into_iter()
        .map(|(key, _)| WriteBatchOp::DeleteContent { key })
        .collect();
    storage.write_batch(ops).unwrap();

    let engine = RestoreEngine::new(Arc::clone(&kernel) as Arc<dyn Kernel>);
    let err = engine.restore_batch(&[id], DLC, None).unwrap_err();
    assert!(matches!(err, RestoreError::MissingContent(found) if found == id));

    // Nothing was admitted, so nothing was deleted
    assert!(kernel.message(DLC, id).unwrap().is_some());
    assert!(kernel.messages("orders").unwrap().is_empty());
}
