//! Replace the producer of a running pipeline without losing or reordering
//! values.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{buffer, consumer, pipeline, producer, seen, slow_pipeline, snapshot, wait_for};
use rf_core::PortId;
use rf_graph::Graph;
use rf_update::{DrainOrder, Element, Linearization, UpdateResult, apply_update};

/// Notes the buffer's size whenever the buffer itself is handed out.
struct BufferSizeAtVisit<L> {
    inner: L,
    sizes: Arc<Mutex<Vec<usize>>>,
}

impl<L: Linearization<u32>> Linearization<u32> for BufferSizeAtVisit<L> {
    fn next_element(&mut self, live: &Graph<u32>) -> UpdateResult<Option<Element>> {
        let next = self.inner.next_element(live)?;
        if next == Some(Element::component(buffer())) {
            let size = live.component(&buffer()).map_or(usize::MAX, |c| c.size());
            self.sizes.lock().unwrap().push(size);
        }
        Ok(next)
    }
}

fn drain_order() -> DrainOrder<u32> {
    DrainOrder::new()
        .poll_interval(Duration::from_millis(5))
        .component(producer("1"))
        .port("a")
        .wait_until_within(
            "buffer drained",
            |g| g.component(&buffer()).is_none_or(|c| c.size() == 0),
            Duration::from_secs(5),
        )
        .component(buffer())
        .port("b")
        .component(consumer())
}

#[test]
fn producer_swap_keeps_buffer_and_consumer() {
    let received = seen();
    let mut live = pipeline("1", vec![1, 2, 3], Arc::clone(&received));
    live.start().expect("start v1");
    assert!(
        wait_for(Duration::from_secs(5), || snapshot(&received) == [1, 2, 3]),
        "v1 values never arrived: {:?}",
        snapshot(&received)
    );

    let buffer_before = Arc::clone(live.component(&buffer()).unwrap());
    let consumer_before = Arc::clone(live.component(&consumer()).unwrap());
    let port_a = Arc::clone(live.port(&PortId::from("a")).unwrap());

    let candidate = pipeline("2", vec![100, 101, 102], seen());
    let report = apply_update(&mut live, candidate, drain_order()).expect("update pass");

    assert_eq!(report.components_retired, vec![producer("1")]);
    assert_eq!(report.components_created, vec![producer("2")]);
    assert!(report.components_started.contains(&producer("2")));
    assert_eq!(report.ports_rewired, vec![PortId::from("a")]);
    assert_eq!(
        report.visited,
        vec![
            Element::component(producer("1")),
            Element::port("a"),
            Element::component(buffer()),
            Element::port("b"),
            Element::component(consumer()),
        ]
    );

    assert!(Arc::ptr_eq(live.component(&buffer()).unwrap(), &buffer_before));
    assert!(Arc::ptr_eq(live.component(&consumer()).unwrap(), &consumer_before));
    assert!(consumer_before.is_running());
    let p2 = live.component(&producer("2")).expect("v2 producer installed");
    assert!(Arc::ptr_eq(&p2.ports()[0], &port_a));

    assert!(
        wait_for(Duration::from_secs(5), || snapshot(&received).len() == 6),
        "v2 values never arrived: {:?}",
        snapshot(&received)
    );
    assert_eq!(snapshot(&received), vec![1, 2, 3, 100, 101, 102]);

    live.shutdown();
    assert!(live.components().all(|c| !c.is_running() && c.worker_finished()));
}

#[test]
fn second_pass_after_a_swap() {
    let received = seen();
    let mut live = pipeline("1", vec![1], Arc::clone(&received));
    live.start().expect("start v1");
    assert!(wait_for(Duration::from_secs(5), || snapshot(&received) == [1]));

    apply_update(&mut live, pipeline("2", vec![2], seen()), drain_order()).expect("v1 -> v2");
    assert!(wait_for(Duration::from_secs(5), || snapshot(&received) == [1, 2]));

    let order = DrainOrder::new()
        .poll_interval(Duration::from_millis(5))
        .component(producer("2"))
        .port("a")
        .wait_until("buffer drained", |g| {
            g.component(&buffer()).is_none_or(|c| c.size() == 0)
        })
        .component(buffer())
        .port("b")
        .component(consumer());
    let report =
        apply_update(&mut live, pipeline("3", vec![3], seen()), order).expect("v2 -> v3");
    assert_eq!(report.components_retired, vec![producer("2")]);
    assert!(wait_for(Duration::from_secs(5), || snapshot(&received) == [1, 2, 3]));

    live.shutdown();
}

#[test]
fn buffer_is_only_visited_once_drained() {
    let received = seen();
    let delay = Duration::from_millis(30);
    let mut live = slow_pipeline("1", (0..8).collect(), Arc::clone(&received), delay);
    live.start().expect("start v1");
    let buffer_comp = Arc::clone(live.component(&buffer()).unwrap());
    assert!(
        wait_for(Duration::from_secs(5), || buffer_comp.size() >= 5),
        "buffer never filled up"
    );
    let old_producer = Arc::clone(live.component(&producer("1")).unwrap());

    let polled = Arc::new(Mutex::new(Vec::new()));
    let polls = Arc::clone(&polled);
    let order = DrainOrder::new()
        .poll_interval(Duration::from_millis(5))
        .component(producer("1"))
        .port("a")
        .wait_until_within(
            "buffer drained",
            move |g| {
                let size = g.component(&buffer()).map_or(0, |c| c.size());
                polls.lock().unwrap().push(size);
                size == 0
            },
            Duration::from_secs(5),
        )
        .component(buffer())
        .port("b")
        .component(consumer());
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let order = BufferSizeAtVisit {
        inner: order,
        sizes: Arc::clone(&sizes),
    };

    let candidate = slow_pipeline("2", vec![100, 101, 102], seen(), delay);
    apply_update(&mut live, candidate, order).expect("update pass");

    let polled = polled.lock().unwrap().clone();
    assert!(polled[0] > 0, "the wait never saw a backlog: {polled:?}");
    assert_eq!(polled.last(), Some(&0));
    assert_eq!(*sizes.lock().unwrap(), vec![0]);
    assert!(Arc::ptr_eq(live.component(&buffer()).unwrap(), &buffer_comp));

    // retired workers are not joined by the pass, but still exit
    assert!(wait_for(Duration::from_secs(2), || old_producer.worker_finished()));
    assert!(!old_producer.is_running());

    let mut expected: Vec<u32> = (0..8).collect();
    expected.extend([100, 101, 102]);
    assert!(
        wait_for(Duration::from_secs(5), || snapshot(&received) == expected),
        "values lost or reordered: {:?}",
        snapshot(&received)
    );

    live.shutdown();
}
