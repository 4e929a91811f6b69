#[macro_use]
extern crate riker_testkit;

use canopy::actors::*;

use riker_testkit::probe::channel::{probe, ChannelProbe};
use riker_testkit::probe::{Probe, ProbeReceive};

#[derive(Clone, Debug)]
pub struct Add;

#[derive(Clone, Debug)]
pub struct TestProbe(ChannelProbe<(), ()>);

#[derive(Clone, Debug)]
enum CounterMsg {
    Probe(TestProbe),
    Add(Add),
}

impl From<TestProbe> for CounterMsg {
    fn from(p: TestProbe) -> CounterMsg {
        CounterMsg::Probe(p)
    }
}

impl From<Add> for CounterMsg {
    fn from(a: Add) -> CounterMsg {
        CounterMsg::Add(a)
    }
}

struct Counter {
    probe: Option<TestProbe>,
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
    type Msg = CounterMsg;

    fn recv(&mut self, _ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        match msg {
            CounterMsg::Probe(p) => self.probe = Some(p),
            CounterMsg::Add(_) => {
                self.count += 1;
                if self.count == 10_000 {
                    self.probe.as_ref().unwrap().0.event(());
                }
            }
        }
    }
}

fn plain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[test]
fn actor_create() {
    let sys = ActorSystem::new().unwrap();

    let props = Props::new(Counter::actor);
    let actor = sys.actor_of(props.clone(), "valid-name");
    assert_eq!(actor.name(), "valid-name");
    assert_eq!(actor.path().to_string(), "/user/valid-name");

    // invalid names are repaired with a generated identifier, never
    // rejected
    for bad in &["/", "*", "/a/b/c", "@", "#", "abc*", ""] {
        let actor = sys.actor_of(props.clone(), bad);
        assert_ne!(actor.name(), *bad);
        assert!(plain_name(actor.name()));
        assert_eq!(actor.path().parent().unwrap().to_string(), "/user");
        assert!(!actor.is_dead());
    }
}

#[test]
fn actor_tell() {
    let sys = ActorSystem::new().unwrap();

    let props = Props::new(Counter::actor);
    let actor = sys.actor_of(props, "me");

    let (probe, listen) = probe();
    actor.tell(TestProbe(probe), None);

    for _ in 0..10_000 {
        actor.tell(Add, None);
    }

    p_assert_eq!(listen, ());
}

#[test]
fn actor_try_tell() {
    let sys = ActorSystem::new().unwrap();

    let props = Props::new(Counter::actor);
    let actor = sys.actor_of(props, "me");
    let actor: BasicActorRef = actor.into();

    let (probe, listen) = probe();
    actor
        .try_tell(CounterMsg::Probe(TestProbe(probe)), None)
        .unwrap();

    assert!(actor.try_tell(CounterMsg::Add(Add), None).is_ok());
    assert!(actor.try_tell("invalid-type".to_string(), None).is_err());

    for _ in 0..10_000 {
        actor.try_tell(CounterMsg::Add(Add), None).unwrap();
    }

    p_assert_eq!(listen, ());
}

#[derive(Clone, Debug)]
enum PingMsg {
    Probe(TestProbe),
    Ball(u32),
}

struct Ping {
    probe: Option<TestProbe>,
    pong: Option<ActorRef<u32>>,
    received: u32,
}

impl Ping {
    fn actor() -> Ping {
        Ping {
            probe: None,
            pong: None,
            received: 0,
        }
    }
}

impl Actor for Ping {
    type Msg = PingMsg;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        let props = Props::new_args(Pong::actor, ctx.myself());
        self.pong = Some(ctx.actor_of(props, "pong"));
    }

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        match msg {
            PingMsg::Probe(p) => {
                self.probe = Some(p);
                self.pong.as_ref().unwrap().tell(1u32, ctx.myself());
            }
            PingMsg::Ball(_) => {
                self.received += 1;
                if self.received == 100 {
                    self.probe.as_ref().unwrap().0.event(());
                } else {
                    self.pong.as_ref().unwrap().tell(1u32, ctx.myself());
                }
            }
        }
    }
}

struct Pong {
    ping: ActorRef<PingMsg>,
    received: u32,
}

impl Pong {
    fn actor(ping: ActorRef<PingMsg>) -> Pong {
        Pong { ping, received: 0 }
    }
}

impl Actor for Pong {
    type Msg = u32;

    fn recv(&mut self, _ctx: &Context<Self::Msg>, _msg: Self::Msg, _sender: Sender) {
        self.received += 1;
        self.ping.tell(PingMsg::Ball(self.received), None);
    }
}

#[test]
fn actor_ping_pong() {
    let sys = ActorSystem::new().unwrap();

    let props = Props::new(Ping::actor);
    let ping = sys.actor_of(props, "ping");

    let (probe, listen) = probe();
    ping.tell(PingMsg::Probe(TestProbe(probe)), None);

    // 100 balls each way, one at a time
    p_assert_eq!(listen, ());

    sys.shutdown();
    sys.wait_for(std::time::Duration::from_secs(10)).unwrap();
}

#[derive(Clone, Debug)]
pub struct EventProbe(ChannelProbe<(), String>);

#[derive(Clone, Debug)]
enum OrderedMsg {
    Probe(EventProbe),
    Work,
}

struct Ordered {
    probe: Option<EventProbe>,
}

impl Ordered {
    fn actor() -> Ordered {
        Ordered { probe: None }
    }

    fn event(&self, evt: &str) {
        self.probe.as_ref().unwrap().0.event(evt.to_string());
    }
}

impl Actor for Ordered {
    type Msg = OrderedMsg;

    fn will_stop(&mut self, _ctx: &Context<Self::Msg>) {
        self.event("will-stop");
    }

    fn post_stop(&mut self) {
        self.event("post-stop");
    }

    fn recv(&mut self, _ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        match msg {
            OrderedMsg::Probe(p) => self.probe = Some(p),
            OrderedMsg::Work => self.event("recv"),
        }
    }
}

// Stopping is cooperative: everything queued ahead of the stop
// command is processed first, then the lifecycle hooks run.
#[test]
fn actor_stop_queues_behind_earlier_messages() {
    let sys = ActorSystem::new().unwrap();

    let props = Props::new(Ordered::actor);
    let actor = sys.actor_of(props, "ordered");

    let (probe, listen) = probe::<String>();
    actor.tell(OrderedMsg::Probe(EventProbe(probe)), None);

    for _ in 0..5 {
        actor.tell(OrderedMsg::Work, None);
    }
    actor.stop();

    for _ in 0..5 {
        p_assert_eq!(listen, "recv".to_string());
    }
    p_assert_eq!(listen, "will-stop".to_string());
    p_assert_eq!(listen, "post-stop".to_string());
}

struct Parent {
    probe: Option<TestProbe>,
}

impl Parent {
    fn actor() -> Parent {
        Parent { probe: None }
    }
}

impl Actor for Parent {
    type Msg = TestProbe;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        ctx.actor_of(Props::new(Child::actor), "child_a");
        ctx.actor_of(Props::new(Child::actor), "child_b");
        ctx.actor_of(Props::new(Child::actor), "child_c");
        ctx.actor_of(Props::new(Child::actor), "child_d");
    }

    fn post_stop(&mut self) {
        // all children have terminated at this point
        self.probe.as_ref().unwrap().0.event(());
    }

    fn recv(&mut self, _ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        self.probe = Some(msg);
        self.probe.as_ref().unwrap().0.event(());
    }
}

struct Child;

impl Child {
    fn actor() -> Child {
        Child
    }
}

impl Actor for Child {
    type Msg = ();

    fn recv(&mut self, _ctx: &Context<Self::Msg>, _msg: Self::Msg, _sender: Sender) {}
}

#[test]
fn actor_stop_reaps_children() {
    let sys = ActorSystem::new().unwrap();

    let props = Props::new(Parent::actor);
    let parent = sys.actor_of(props, "parent");

    let (probe, listen) = probe();
    parent.tell(TestProbe(probe), None);

    // wait for the probe to arrive at the actor before stopping it
    p_assert_eq!(listen, ());

    sys.stop(&parent);

    // post_stop fires only after every child has been reaped
    p_assert_eq!(listen, ());
    assert!(sys.find("/user/parent/child_a").is_none());

    // the user root reaps the parent on its own queue shortly after
    assert!(eventually(|| sys.find("/user/parent").is_none()));
}

fn eventually(cond: impl Fn() -> bool) -> bool {
    for _ in 0..250 {
        if cond() {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    cond()
}
