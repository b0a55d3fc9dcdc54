use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use futures::FutureExt;
use marketplace_provider::prelude::*;
use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::{Instant, sleep};

#[derive(Props, Clone, PartialEq)]
struct ToastHostProps {
    visible: Rc<Cell<usize>>,
    duration_ms: u64,
}

/// Provides the toasts and mounts a child that raises one, then closes it
#[allow(non_snake_case)]
fn ToastHost(props: ToastHostProps) -> Element {
    let toasts = use_notification_provider();
    let mut raising = use_signal(|| true);
    use_hook(move || {
        spawn(async move {
            sleep(Duration::from_millis(20)).await;
            raising.set(false);
        })
    });
    props.visible.set(toasts.list().len());
    rsx! {
        if raising() {
            Raiser { duration_ms: props.duration_ms }
        }
    }
}

#[derive(Props, Clone, PartialEq)]
struct RaiserProps {
    duration_ms: u64,
}

#[allow(non_snake_case)]
fn Raiser(props: RaiserProps) -> Element {
    let toasts = use_notifications();
    let duration_ms = props.duration_ms;
    use_hook(move || {
        spawn(async move {
            toasts.show(NotificationKind::Success, "Saved", "Booking confirmed", duration_ms);
        })
    });
    rsx! {}
}

fn block_on_test(fut: impl Future<Output = ()>) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    tokio::runtime::Runtime::new()
        .expect("tokio runtime")
        .block_on(fut);
}

async fn pump(vdom: &mut VirtualDom, duration: Duration) {
    let deadline = Instant::now() + duration;
    let mut mutations = NoOpMutations;
    while Instant::now() < deadline {
        while vdom.wait_for_work().now_or_never().is_some() {
            vdom.render_immediate(&mut mutations);
        }
        sleep(Duration::from_millis(2)).await;
    }
}

#[test]
fn toast_expires_after_its_raiser_unmounts() {
    block_on_test(async {
        let visible = Rc::new(Cell::new(0));
        let mut vdom = VirtualDom::new_with_props(
            ToastHost,
            ToastHostProps {
                visible: visible.clone(),
                duration_ms: 100,
            },
        );
        vdom.rebuild_in_place();

        pump(&mut vdom, Duration::from_millis(50)).await;
        assert_eq!(visible.get(), 1);

        pump(&mut vdom, Duration::from_millis(120)).await;
        assert_eq!(visible.get(), 0);
    });
}

#[test]
fn zero_duration_toast_stays() {
    block_on_test(async {
        let visible = Rc::new(Cell::new(0));
        let mut vdom = VirtualDom::new_with_props(
            ToastHost,
            ToastHostProps {
                visible: visible.clone(),
                duration_ms: 0,
            },
        );
        vdom.rebuild_in_place();

        pump(&mut vdom, Duration::from_millis(150)).await;
        assert_eq!(visible.get(), 1);
    });
}
