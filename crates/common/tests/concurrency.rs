//! Integration tests for concurrent calls and settlement guarantees

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use ::common::contract;
use ::common::prelude::*;
use ::common::value::Outcome;

const CALLS: usize = 16;

#[tokio::test]
async fn test_concurrent_calls_keep_their_own_results() {
    let module = common::setup_module();
    let (identity, recipient) = common::generate_identity(&module).await;

    // launch everything before awaiting anything
    let pending: Vec<(String, Promise)> = (0..CALLS)
        .map(|i| {
            let message = format!("message number {}", i);
            let promise = module.invoke(
                "encrypt",
                vec![
                    HostValue::from(message.as_str()),
                    HostValue::from(vec![recipient.clone()]),
                ],
            );
            (message, promise)
        })
        .collect();

    let mut decrypting = Vec::new();
    for (message, promise) in pending {
        let armored = promise.await.unwrap();
        let promise = module.invoke("decrypt", vec![armored, HostValue::from(identity.as_str())]);
        decrypting.push((message, promise));
    }

    for (message, promise) in decrypting {
        let plaintext = promise.await.unwrap();
        assert_eq!(plaintext.as_str(), Some(message.as_str()));
    }
}

#[test]
fn test_every_call_settles_exactly_once() {
    let module = common::setup_module();
    let settlements = Arc::new(AtomicUsize::new(0));
    let (done_tx, done_rx) = mpsc::channel();

    for i in 0..CALLS {
        // alternate valid and invalid calls
        let args = if i % 2 == 0 {
            vec![]
        } else {
            vec![HostValue::from("unexpected")]
        };
        let resolved = settlements.clone();
        let rejected = settlements.clone();
        let resolve_tx = done_tx.clone();
        let reject_tx = done_tx.clone();
        module.call(
            "generateIdentity",
            args,
            Box::new(Callbacks::new(
                move |_| {
                    resolved.fetch_add(1, Ordering::SeqCst);
                    resolve_tx.send(true).unwrap();
                },
                move |_| {
                    rejected.fetch_add(1, Ordering::SeqCst);
                    reject_tx.send(false).unwrap();
                },
            )),
        );
    }
    drop(done_tx);

    let outcomes: Vec<bool> = (0..CALLS)
        .map(|_| done_rx.recv_timeout(Duration::from_secs(10)).unwrap())
        .collect();
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), CALLS / 2);

    // all callbacks are dropped once their call settles, so the channel closes
    assert!(matches!(
        done_rx.recv_timeout(Duration::from_secs(5)),
        Err(mpsc::RecvTimeoutError::Disconnected)
    ));
    assert_eq!(settlements.load(Ordering::SeqCst), CALLS);
}

#[tokio::test]
async fn test_panicking_handler_still_settles() {
    let mut module = Module::new(BridgeConfig::default());
    module.register("explode", contract::GENERATE_IDENTITY, |_args| {
        panic!("handler blew up");
    });
    module.register("fine", contract::GENERATE_IDENTITY, |_args| {
        Ok(Outcome::Text("still here".to_string()))
    });

    let exploding: Vec<Promise> = (0..CALLS).map(|_| module.invoke("explode", vec![])).collect();
    let fine = module.invoke("fine", vec![]);

    for promise in exploding {
        let err = tokio::time::timeout(Duration::from_secs(5), promise)
            .await
            .expect("a panicking call must not hang")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InternalFault);
        assert_eq!(err.message, "call panicked: handler blew up");
    }
    assert_eq!(fine.await.unwrap().as_str(), Some("still here"));
}
