//! Async Children Tests
//!
//! Pending children run as local tasks, so each test drives a `LocalSet`.

use std::cell::Cell;
use std::rc::Rc;

use olova_core::{
    children, html, on_mount, try_render, Child, Component, Node, Props, RenderOptions,
    Renderable,
};
use tokio::sync::oneshot;
use tokio::task::LocalSet;

/// Give spawned local tasks a chance to run.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn async_child_replaces_placeholder() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let root = Node::element("div").unwrap();
            let (tx, rx) = oneshot::channel::<&'static str>();
            let mounted_flag = Rc::new(Cell::new(false));

            let flag = mounted_flag.clone();
            let loaded = Component::new("Loaded", move |_, children| {
                let flag = flag.clone();
                on_mount(move || flag.set(true));
                html("em", Props::new(), children)
            });

            let _mounted = try_render(
                Renderable::component(move || {
                    html(
                        "p",
                        Props::new(),
                        children![
                            "status: ",
                            Child::future(async move {
                                let text = rx.await.unwrap_or("closed");
                                html(&loaded, Props::new(), children![text])
                            }),
                        ],
                    )
                }),
                &root,
                RenderOptions::default(),
            )
            .unwrap();

            assert_eq!(root.to_html(), "<div><p>status: <!--pending--></p></div>");
            assert!(!mounted_flag.get());

            tx.send("loaded").unwrap();
            settle().await;

            assert_eq!(root.to_html(), "<div><p>status: <em>loaded</em></p></div>");
            assert!(mounted_flag.get());
        })
        .await;
}

#[tokio::test]
async fn late_resolution_after_unmount_is_inert() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let root = Node::element("div").unwrap();
            let (tx, rx) = oneshot::channel::<&'static str>();

            let mounted = try_render(
                Renderable::component(move || {
                    html(
                        "p",
                        Props::new(),
                        children![Child::future(async move { rx.await.unwrap_or("closed") })],
                    )
                }),
                &root,
                RenderOptions::default(),
            )
            .unwrap();
            let paragraph = mounted.node();

            mounted.unmount();
            let _ = tx.send("too late");
            settle().await;

            assert_eq!(paragraph.to_html(), "<p><!--pending--></p>");
            assert_eq!(root.child_count(), 0);
        })
        .await;
}
