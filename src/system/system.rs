use std::error::Error;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::time::Duration;

use chrono::prelude::*;
use config::Config;
use log::debug;
use uuid::Uuid;

use crate::{
    actor::{
        resolve, Actor, ActorRef, ActorReference, BasicActorRef, BoxActorProd,
    },
    kernel::{provider, Dispatcher, ThreadDispatcher},
    load_config,
    system::{logger, ActorCmd, SystemError, SystemMsg},
    validate::validate_name,
};

struct ProtoSystem {
    id: Uuid,
    name: String,
    config: Config,
    started_at: DateTime<Utc>,
    debug: bool,
}

/// The actor runtime coordinator.
///
/// The `ActorSystem` owns the root of the supervision tree (`/user`)
/// and the dispatcher that hands execution queues to cells. Create
/// one instance per application; it is cheap to clone and safe to
/// share between threads.
#[derive(Clone)]
pub struct ActorSystem {
    inner: Arc<SystemInner>,
}

struct SystemInner {
    proto: ProtoSystem,
    dispatcher: Arc<dyn Dispatcher>,
    user_root: RwLock<Option<BasicActorRef>>,
    gate: ShutdownGate,
}

impl ActorSystem {
    /// Create a new `ActorSystem` instance with default config and
    /// dispatcher.
    pub fn new() -> Result<ActorSystem, SystemError> {
        SystemBuilder::new().create()
    }

    /// Create a new `ActorSystem` instance with the provided name.
    pub fn with_name(name: &str) -> Result<ActorSystem, SystemError> {
        SystemBuilder::new().name(name).create()
    }

    /// Create a new `ActorSystem` instance bypassing default config
    /// behavior.
    pub fn with_config(name: &str, cfg: Config) -> Result<ActorSystem, SystemError> {
        SystemBuilder::new().name(name).cfg(cfg).create()
    }

    fn create(
        name: &str,
        cfg: Config,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<ActorSystem, SystemError> {
        validate_name(name).map_err(|_| SystemError::InvalidName(name.into()))?;

        logger::init(&cfg);

        let debug = cfg.get_bool("debug").unwrap_or(true);

        let proto = ProtoSystem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            config: cfg,
            started_at: Utc::now(),
            debug,
        };

        let system = ActorSystem {
            inner: Arc::new(SystemInner {
                proto,
                dispatcher,
                user_root: RwLock::new(None),
                gate: ShutdownGate::new(),
            }),
        };

        let user_root = provider::create_user_guardian(&system);
        *system.inner.user_root.write().unwrap() = Some(user_root);

        debug!("actor system [{}] [{}] started", system.id(), name);

        Ok(system)
    }

    /// Returns the system start date
    pub fn start_date(&self) -> &DateTime<Utc> {
        &self.inner.proto.started_at
    }

    /// Returns the number of seconds since the system started
    pub fn uptime(&self) -> u64 {
        (Utc::now() - *self.start_date()).num_seconds() as u64
    }

    /// Returns the UUID assigned to the system
    pub fn id(&self) -> Uuid {
        self.inner.proto.id
    }

    /// Returns the name of the system
    pub fn name(&self) -> String {
        self.inner.proto.name.clone()
    }

    /// Returns the `Config` used by the system
    pub fn config(&self) -> &Config {
        &self.inner.proto.config
    }

    pub fn debug(&self) -> bool {
        self.inner.proto.debug
    }

    /// Returns the user root actor reference (path `/user`)
    pub fn user_root(&self) -> BasicActorRef {
        self.inner
            .user_root
            .read()
            .unwrap()
            .clone()
            .expect("user root not initialized")
    }

    pub(crate) fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.inner.dispatcher
    }

    /// Create an actor under the user root.
    ///
    /// An invalid or already-taken name is replaced with a generated
    /// one (with a warning) rather than reported; the returned
    /// reference is always usable.
    pub fn actor_of<A>(&self, props: BoxActorProd<A>, name: &str) -> ActorRef<A::Msg>
    where
        A: Actor,
    {
        provider::create_actor(self, &self.user_root(), props, name)
    }

    /// Ask the given actor to stop.
    pub fn stop(&self, actor: &impl ActorReference) {
        actor.stop();
    }

    /// Resolves an absolute path to a reference.
    ///
    /// The first segment must be `user`; the `system` and
    /// `deadLetter` roots are reserved and not yet implemented, so
    /// anything else resolves to `None`.
    pub fn find(&self, path: &str) -> Option<BasicActorRef> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let mut segments = path.split_terminator('/');

        match segments.next() {
            Some("user") => resolve(self.user_root(), segments),
            _ => None,
        }
    }

    /// Shutdown the actor system.
    ///
    /// Attempts a graceful shutdown of the system and all actors.
    /// Every actor receives a stop command and executes `post_stop`
    /// once its children have terminated, leaves first.
    ///
    /// Does not block; use `wait` or `wait_for` to await completion.
    pub fn shutdown(&self) {
        self.user_root()
            .sys_tell(SystemMsg::Command(ActorCmd::Stop));
    }

    /// Block the calling thread until shutdown has completed.
    pub fn wait(&self) {
        self.inner.gate.wait();
    }

    /// Block the calling thread until shutdown has completed, or
    /// until `timeout` elapses.
    pub fn wait_for(&self, timeout: Duration) -> Result<(), WaitTimeout> {
        if self.inner.gate.wait_timeout(timeout) {
            Ok(())
        } else {
            Err(WaitTimeout(timeout))
        }
    }

    /// Opened by the user guardian's cell once the whole tree has
    /// stopped.
    pub(crate) fn release_shutdown(&self) {
        self.inner.gate.open();
    }

    pub fn print_tree(&self) {
        fn print_node(node: &BasicActorRef, indent: &str) {
            println!("{}└─ {}", indent, node.name());

            for child in node.children() {
                print_node(&child, &format!("{}   ", indent));
            }
        }

        let root = self.user_root();
        println!("{}", self.name());
        for child in root.children() {
            print_node(&child, "");
        }
    }
}

impl fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ActorSystem[Name: {}, Start Time: {}, Uptime: {} seconds]",
            self.name(),
            self.start_date(),
            self.uptime()
        )
    }
}

/// Builds an `ActorSystem` with overrides for the name, config and
/// dispatcher.
///
/// # Examples
///
/// ```
/// use canopy::actors::*;
///
/// let sys = SystemBuilder::new()
///     .name("my-app")
///     .dispatcher(PoolDispatcher::new(4))
///     .create()
///     .unwrap();
/// ```
pub struct SystemBuilder {
    name: Option<String>,
    cfg: Option<Config>,
    dispatcher: Option<Arc<dyn Dispatcher>>,
}

impl SystemBuilder {
    pub fn new() -> SystemBuilder {
        SystemBuilder {
            name: None,
            cfg: None,
            dispatcher: None,
        }
    }

    pub fn name(self, name: &str) -> SystemBuilder {
        SystemBuilder {
            name: Some(name.to_string()),
            ..self
        }
    }

    pub fn cfg(self, cfg: Config) -> SystemBuilder {
        SystemBuilder {
            cfg: Some(cfg),
            ..self
        }
    }

    pub fn dispatcher(self, dispatcher: impl Dispatcher) -> SystemBuilder {
        SystemBuilder {
            dispatcher: Some(Arc::new(dispatcher)),
            ..self
        }
    }

    pub fn create(self) -> Result<ActorSystem, SystemError> {
        let name = self.name.unwrap_or_else(|| "canopy".to_string());
        let cfg = self.cfg.unwrap_or_else(load_config);
        let dispatcher = self
            .dispatcher
            .unwrap_or_else(|| Arc::new(ThreadDispatcher::new()));

        ActorSystem::create(&name, cfg, dispatcher)
    }
}

impl Default for SystemBuilder {
    fn default() -> Self {
        SystemBuilder::new()
    }
}

/// One-shot latch released when the user guardian terminates.
struct ShutdownGate {
    open: Mutex<bool>,
    released: Condvar,
}

impl ShutdownGate {
    fn new() -> ShutdownGate {
        ShutdownGate {
            open: Mutex::new(false),
            released: Condvar::new(),
        }
    }

    fn open(&self) {
        let mut open = self.open.lock().unwrap();
        *open = true;
        self.released.notify_all();
    }

    fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.released.wait(open).unwrap();
        }
    }

    fn wait_timeout(&self, timeout: Duration) -> bool {
        let open = self.open.lock().unwrap();
        let (open, _) = self
            .released
            .wait_timeout_while(open, timeout, |open| !*open)
            .unwrap();
        *open
    }
}

/// Error type when `wait_for` elapses before the system is down.
pub struct WaitTimeout(pub Duration);

impl Error for WaitTimeout {}

impl fmt::Display for WaitTimeout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "actor system still running after {:?}; shutdown incomplete",
            self.0
        )
    }
}

impl fmt::Debug for WaitTimeout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
