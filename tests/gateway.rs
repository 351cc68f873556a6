//! End-to-end tests over a real UDP socket

use std::sync::Arc;
use std::time::Duration;

use ccgateway::dispatch::Dispatcher;
use ccgateway::plugins::{EchoPlugin, PluginSections};
use ccgateway::{Identity, Plugin, Registry, Reply};
use futures::future::join_all;
use tokio::sync::mpsc;

mod common;
use common::{DelayPlugin, client, recv_reply, request, start_gateway};

fn plugins() -> Vec<Arc<dyn Plugin>> {
    vec![Arc::new(EchoPlugin::new("echo")), Arc::new(DelayPlugin)]
}

#[tokio::test]
async fn unknown_verb_is_miss() {
    let gateway = start_gateway(plugins(), PluginSections::default()).await;

    assert_eq!(request(gateway.addr, "x verify").await, "miss");

    gateway.stop().await;
}

#[tokio::test]
async fn single_token_is_poor() {
    let gateway = start_gateway(plugins(), PluginSections::default()).await;

    assert_eq!(request(gateway.addr, "x").await, "poor");
    assert_eq!(request(gateway.addr, "echo\n").await, "poor");
    assert_eq!(request(gateway.addr, "").await, "poor");

    gateway.stop().await;
}

#[tokio::test]
async fn echo_replies() {
    let gateway = start_gateway(plugins(), PluginSections::default()).await;

    assert_eq!(request(gateway.addr, "echo ping").await, "good");
    assert_eq!(request(gateway.addr, "echo ping\r\n").await, "good");
    assert_eq!(request(gateway.addr, "echo bad").await, "fail");

    gateway.stop().await;
}

#[tokio::test]
async fn faults_do_not_stop_the_gateway() {
    let gateway = start_gateway(plugins(), PluginSections::default()).await;

    assert_eq!(request(gateway.addr, "echo error node down").await, "fail");
    assert_eq!(request(gateway.addr, "echo panic").await, "fail");
    assert_eq!(request(gateway.addr, "echo ping").await, "good");

    gateway.stop().await;
}

#[tokio::test]
async fn slow_request_does_not_block_fast_one() {
    let gateway = start_gateway(plugins(), PluginSections::default()).await;

    let slow = client().await;
    let fast = client().await;
    slow.send_to(b"delay 400 good", gateway.addr).await.unwrap();
    fast.send_to(b"delay 10 fail fast", gateway.addr).await.unwrap();

    // The fast reply arrives while the slow handler is still sleeping
    let fast_reply = tokio::time::timeout(Duration::from_millis(300), recv_reply(&fast))
        .await
        .expect("fast request was blocked by the slow one");
    assert_eq!(fast_reply, "fail");
    assert_eq!(recv_reply(&slow).await, "good");

    gateway.stop().await;
}

#[tokio::test]
async fn replies_reach_their_own_clients_in_reverse_completion_order() {
    let gateway = start_gateway(plugins(), PluginSections::default()).await;
    let addr = gateway.addr;

    // Earlier submissions sleep longer, so completions arrive reversed
    let count = 24_u64;
    let requests = (0..count).map(|i| {
        let expected = if i % 2 == 0 { "good" } else { "fail" };
        let frame = format!("delay {} {expected} client-{i}", (count - i) * 10);
        async move { (expected, request(addr, &frame).await) }
    });

    for (expected, reply) in join_all(requests).await {
        assert_eq!(reply, expected);
    }

    gateway.stop().await;
}

#[tokio::test]
async fn completions_carry_their_own_identity() {
    let (registry, _) = Registry::load(vec![Arc::new(DelayPlugin) as Arc<dyn Plugin>]);
    let dispatcher = Dispatcher::new(Arc::new(registry), Arc::default());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let count = 32_u16;
    for i in 0..count {
        let identity = Identity::new(([127, 0, 0, 1], 40_000 + i).into());
        // Tag each request with its identity; reverse the completion order
        let frame = format!("delay {} fail {identity}", u64::from(count - i) * 5);
        drop(dispatcher.spawn(identity, frame, tx.clone()));
    }
    drop(tx);

    let mut seen = 0;
    while let Some(completion) = rx.recv().await {
        assert_eq!(completion.reply, Reply::Fail);
        assert_eq!(
            completion.detail.as_deref(),
            Some(completion.identity.to_string().as_str())
        );
        seen += 1;
    }
    assert_eq!(seen, count);
}
