#[macro_use]
extern crate riker_testkit;

use std::collections::HashSet;
use std::time::Duration;

use canopy::actors::*;

use riker_testkit::probe::channel::{probe, ChannelProbe};
use riker_testkit::probe::{Probe, ProbeReceive};

#[derive(Clone, Debug)]
pub struct EventProbe(ChannelProbe<(), String>);

#[derive(Clone, Debug)]
enum WorkerMsg {
    Report(EventProbe),
}

struct Worker;

impl Worker {
    fn actor() -> Worker {
        Worker
    }
}

impl Actor for Worker {
    type Msg = WorkerMsg;

    fn recv(&mut self, _ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        let WorkerMsg::Report(p) = msg;
        // the worker thread is the queue: actors sharing a queue
        // report the same thread
        p.0.event(format!("{:?}", std::thread::current().id()));
    }
}

// With a pool of two queues, any number of actors runs on at most two
// worker threads, so at least two of three actors share one.
#[test]
fn dispatcher_pool_shares_queues() {
    let sys = SystemBuilder::new()
        .name("pooled")
        .dispatcher(PoolDispatcher::new(2))
        .create()
        .unwrap();

    let mut threads = HashSet::new();
    for i in 0..3 {
        let actor = sys.actor_of(Props::new(Worker::actor), &format!("worker-{}", i));

        let (p, listen) = probe::<String>();
        actor.tell(WorkerMsg::Report(EventProbe(p)), None);
        threads.insert(listen.recv());
    }

    assert!(!threads.is_empty());
    assert!(threads.len() <= 2);
}

struct Nested {
    depth: u32,
}

impl Nested {
    fn actor(depth: u32) -> Nested {
        Nested { depth }
    }
}

impl Actor for Nested {
    type Msg = ();

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        if self.depth < 5 {
            let props = Props::new_args(Nested::actor, self.depth + 1);
            ctx.actor_of(props, &format!("nested-{}", self.depth + 1));
        }
    }

    fn recv(&mut self, _: &Context<Self::Msg>, _: Self::Msg, _: Sender) {}
}

// The stop cascade never blocks a queue waiting for another cell, so
// a whole tree multiplexed onto a single queue still shuts down.
#[test]
fn dispatcher_single_queue_shutdown() {
    let sys = SystemBuilder::new()
        .name("single-queue")
        .dispatcher(PoolDispatcher::new(1))
        .create()
        .unwrap();

    sys.actor_of(Props::new_args(Nested::actor, 1), "nested-1");

    sys.shutdown();
    sys.wait_for(Duration::from_secs(10)).unwrap();
}

#[derive(Clone, Debug)]
struct CountProbe(ChannelProbe<(), ()>);

#[derive(Clone, Debug)]
enum CountMsg {
    Probe(CountProbe),
    Add,
}

struct Counter {
    probe: Option<CountProbe>,
    count: u32,
}

impl Counter {
    fn actor() -> Counter {
        Counter {
            probe: None,
            count: 0,
        }
    }
}

impl Actor for Counter {
    type Msg = CountMsg;

    fn recv(&mut self, _ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        match msg {
            CountMsg::Probe(p) => self.probe = Some(p),
            CountMsg::Add => {
                self.count += 1;
                if self.count == 1_000 {
                    self.probe.as_ref().unwrap().0.event(());
                }
            }
        }
    }
}

// Sharing one queue between several busy actors keeps per-actor
// delivery intact: every message still arrives, one at a time.
#[test]
fn dispatcher_pool_serial_delivery() {
    let sys = SystemBuilder::new()
        .name("pool-serial")
        .dispatcher(PoolDispatcher::new(2))
        .create()
        .unwrap();

    let mut listens = Vec::new();
    for i in 0..4 {
        let actor = sys.actor_of(Props::new(Counter::actor), &format!("counter-{}", i));

        let (p, listen) = probe();
        actor.tell(CountMsg::Probe(CountProbe(p)), None);
        listens.push(listen);

        for _ in 0..1_000 {
            actor.tell(CountMsg::Add, None);
        }
    }

    for listen in &listens {
        p_assert_eq!(listen, ());
    }
}
