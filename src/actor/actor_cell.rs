use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use log::{debug, trace, warn};

use crate::{
    actor::{
        actor_ref::{ActorRef, ActorReference, BasicActorRef, Sender},
        Actor, ActorError, ActorPath, BoxActorProd, Fault, Strategy,
    },
    kernel::SerialExecutor,
    system::{ActorCmd, ActorSystem, DeadLetter, SystemEvent, SystemMsg},
    AnyMessage, Message,
};

/// The shared, nullable link between references and their cell.
///
/// Every reference to one actor holds the same slot, so nulling it
/// during reaping invalidates all of them at once.
pub(crate) type CellSlot = Arc<RwLock<Option<ActorCell>>>;

/// The runtime record behind an actor: its place in the tree, its
/// children table, its lifecycle state and its execution queue.
#[derive(Clone)]
pub(crate) struct ActorCell {
    inner: Arc<CellInner>,
}

struct CellInner {
    path: ActorPath,
    parent: Option<BasicActorRef>,
    children: Mutex<HashMap<String, BasicActorRef>>,
    terminating: AtomicBool,
    queue: SerialExecutor,
    system: ActorSystem,
    myself: CellSlot,
    handler: RwLock<Option<Arc<dyn MsgHandler>>>,
}

impl ActorCell {
    pub(crate) fn new(
        path: ActorPath,
        parent: Option<BasicActorRef>,
        queue: SerialExecutor,
        system: ActorSystem,
    ) -> ActorCell {
        let myself: CellSlot = Arc::new(RwLock::new(None));

        let cell = ActorCell {
            inner: Arc::new(CellInner {
                path,
                parent,
                children: Mutex::new(HashMap::new()),
                terminating: AtomicBool::new(false),
                queue,
                system,
                myself: myself.clone(),
                handler: RwLock::new(None),
            }),
        };

        *myself.write().unwrap() = Some(cell.clone());
        cell
    }

    pub(crate) fn path(&self) -> &ActorPath {
        &self.inner.path
    }

    pub(crate) fn parent(&self) -> Option<BasicActorRef> {
        self.inner.parent.clone()
    }

    pub(crate) fn system(&self) -> &ActorSystem {
        &self.inner.system
    }

    pub(crate) fn myself(&self) -> BasicActorRef {
        BasicActorRef::new(self.inner.path.clone(), self.inner.myself.clone())
    }

    pub(crate) fn queue(&self) -> &SerialExecutor {
        &self.inner.queue
    }

    pub(crate) fn is_terminating(&self) -> bool {
        self.inner.terminating.load(Ordering::Relaxed)
    }

    fn set_terminating(&self) {
        self.inner.terminating.store(true, Ordering::Relaxed);
    }

    pub(crate) fn lock_children(&self) -> MutexGuard<'_, HashMap<String, BasicActorRef>> {
        self.inner
            .children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn child(&self, name: &str) -> Option<BasicActorRef> {
        self.lock_children().get(name).cloned()
    }

    pub(crate) fn children(&self) -> Vec<BasicActorRef> {
        self.lock_children().values().cloned().collect()
    }

    pub(crate) fn has_children(&self) -> bool {
        !self.lock_children().is_empty()
    }

    fn remove_child(&self, name: &str) -> Option<BasicActorRef> {
        self.lock_children().remove(name)
    }

    pub(crate) fn install_handler(&self, handler: Arc<dyn MsgHandler>) {
        *self.inner.handler.write().unwrap() = Some(handler);
    }

    fn clear_handler(&self) -> Option<Arc<dyn MsgHandler>> {
        self.inner.handler.write().unwrap().take()
    }

    fn release_myself(&self) {
        *self.inner.myself.write().unwrap() = None;
    }

    /// Hands a user message to the cell's queue.
    ///
    /// Fails if the actor has stopped or its message type differs.
    pub(crate) fn send_user_msg(&self, msg: AnyMessage, sender: Sender) -> Result<(), ()> {
        let handler = self.inner.handler.read().unwrap().clone();
        match handler {
            Some(handler) => handler.accept_user(self, msg, sender),
            None => {
                debug!(
                    "{}",
                    DeadLetter::new(
                        format!("{:?}", msg),
                        sender.map(|s| s.path.clone()),
                        self.inner.path.clone(),
                    )
                );
                Err(())
            }
        }
    }

    /// Hands a system message to the cell's queue. System and user
    /// messages share the queue, so a stop command waits its turn
    /// behind messages sent before it.
    pub(crate) fn send_sys_msg(&self, msg: SystemMsg) {
        let handler = self.inner.handler.read().unwrap().clone();
        match handler {
            Some(handler) => handler.accept_sys(self, msg),
            None => debug!(
                "system message {:?} for stopped actor {} dropped",
                msg, self.inner.path
            ),
        }
    }
}

/// The cell's entry point into its typed dock.
///
/// The cell itself is un-typed; everything that needs the concrete
/// actor type goes through this interface.
pub(crate) trait MsgHandler: Send + Sync + 'static {
    fn accept_user(self: Arc<Self>, cell: &ActorCell, msg: AnyMessage, sender: Sender)
        -> Result<(), ()>;

    fn accept_sys(self: Arc<Self>, cell: &ActorCell, msg: SystemMsg);
}

/// Holds the actor instance together with everything needed to run
/// and rebuild it: its producer and its context.
pub(crate) struct Dock<A: Actor> {
    actor: Mutex<Option<A>>,
    props: BoxActorProd<A>,
    ctx: Context<A::Msg>,
}

impl<A: Actor> Dock<A> {
    pub(crate) fn new(actor: A, props: BoxActorProd<A>, ctx: Context<A::Msg>) -> Dock<A> {
        Dock {
            actor: Mutex::new(Some(actor)),
            props,
            ctx,
        }
    }

    fn lock_actor(&self) -> MutexGuard<'_, Option<A>> {
        // a panic that unwound out of a callback may have poisoned
        // the lock; the supervisor decides what happens to the actor,
        // not the mutex
        self.actor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn process_user(&self, cell: &ActorCell, msg: A::Msg, sender: Sender) {
        if cell.is_terminating() || self.lock_actor().is_none() {
            debug!(
                "{}",
                DeadLetter::new(
                    format!("{:?}", msg),
                    sender.map(|s| s.path.clone()),
                    cell.path().clone(),
                )
            );
            return;
        }

        if let Some(actor) = self.lock_actor().as_mut() {
            actor.recv(&self.ctx, msg, sender);
        }
    }

    fn process_sys(&self, cell: &ActorCell, msg: SystemMsg) {
        match msg {
            SystemMsg::ActorInit => self.init(),
            SystemMsg::Command(ActorCmd::Stop) => self.terminate(cell),
            SystemMsg::Command(ActorCmd::Restart) => self.restart(cell),
            SystemMsg::Event(SystemEvent::ActorTerminated(child)) => self.death_watch(cell, child),
            SystemMsg::Failed(fault) => self.handle_failure(cell, fault),
            SystemMsg::DeadLetter(dl) => warn!("{}", dl),
        }
    }

    fn init(&self) {
        if let Some(actor) = self.lock_actor().as_mut() {
            actor.pre_start(&self.ctx);
        }
    }

    /// Begins the stop cascade for this cell.
    ///
    /// With no children the cell finishes immediately; otherwise each
    /// child is asked to stop and the cell stays alive until the last
    /// child reports its termination.
    fn terminate(&self, cell: &ActorCell) {
        if cell.is_terminating() {
            warn!("stop already in progress for {}", cell.path());
            return;
        }
        cell.set_terminating();

        if let Some(actor) = self.lock_actor().as_mut() {
            actor.will_stop(&self.ctx);
        }

        let children = cell.children();
        if children.is_empty() {
            self.finish(cell);
        } else {
            for child in children {
                child.stop();
            }
        }
    }

    /// Completes the stop: notifies upward, runs `post_stop` exactly
    /// once and releases the actor.
    fn finish(&self, cell: &ActorCell) {
        // only the first caller completes the stop; late duplicates
        // (a stale termination notice, say) find the handler gone
        if cell.clear_handler().is_none() {
            return;
        }

        match cell.parent() {
            Some(parent) => {
                parent.sys_tell(SystemMsg::Event(SystemEvent::ActorTerminated(cell.myself())));
                let actor = self.lock_actor().take();
                if let Some(mut actor) = actor {
                    actor.post_stop();
                }
            }
            None => {
                // the user guardian: the whole tree is down
                let actor = self.lock_actor().take();
                if let Some(mut actor) = actor {
                    actor.post_stop();
                }
                cell.release_myself();
                cell.system().release_shutdown();
            }
        }

        trace!("actor {} stopped", cell.path());
    }

    fn death_watch(&self, cell: &ActorCell, child: BasicActorRef) {
        if let Some(actor) = self.lock_actor().as_mut() {
            actor.child_terminated(&self.ctx, &child);
        }

        // removal is idempotent: a stale notification misses the lookup
        if let Some(removed) = cell.remove_child(child.name()) {
            removed.release_cell();
        }

        if cell.is_terminating() && !cell.has_children() {
            self.finish(cell);
        }
    }

    /// Rebuilds the actor in place from its producer and runs
    /// `pre_start` again. Children are left untouched.
    fn restart(&self, cell: &ActorCell) {
        if cell.is_terminating() {
            warn!("restart of {} ignored: stop in progress", cell.path());
            return;
        }

        let mut guard = self.lock_actor();
        if guard.is_some() {
            let mut next = self.props.produce();
            next.pre_start(&self.ctx);
            *guard = Some(next);
            trace!("actor {} restarted", cell.path());
        } else {
            warn!("restart of {} ignored: actor already stopped", cell.path());
        }
    }

    fn handle_failure(&self, cell: &ActorCell, fault: Fault) {
        let strategy = {
            let guard = self.lock_actor();
            guard.as_ref().map(|a| a.supervisor_strategy(&fault.error))
        };

        let strategy = match strategy {
            Some(strategy) => strategy,
            None => {
                warn!(
                    "fault for stopped actor {} dropped: {}",
                    cell.path(),
                    fault.error
                );
                return;
            }
        };

        match fault.actor {
            // fault signalled by this actor itself
            None => match strategy {
                Strategy::Ignore => trace!("{} ignored fault: {}", cell.path(), fault.error),
                Strategy::Stop => self.terminate(cell),
                Strategy::Restart => self.restart(cell),
                Strategy::Escalate => escalate(cell, fault.error),
            },
            // fault escalated by a child: the strategy applies to it
            Some(child) => match strategy {
                Strategy::Ignore => trace!(
                    "{} ignored fault from {}: {}",
                    cell.path(),
                    child.path(),
                    fault.error
                ),
                Strategy::Stop => child.stop(),
                Strategy::Restart => child.sys_tell(SystemMsg::Command(ActorCmd::Restart)),
                Strategy::Escalate => escalate(cell, fault.error),
            },
        }
    }
}

fn escalate(cell: &ActorCell, error: ActorError) {
    match cell.parent() {
        Some(parent) => {
            parent.sys_tell(SystemMsg::Failed(Fault::escalated(cell.myself(), error)))
        }
        None => warn!("fault escalated to the user guardian: {}", error),
    }
}

impl<A: Actor> MsgHandler for Dock<A> {
    fn accept_user(
        self: Arc<Self>,
        cell: &ActorCell,
        mut msg: AnyMessage,
        sender: Sender,
    ) -> Result<(), ()> {
        let msg = msg.take::<A::Msg>().map_err(|_| ())?;

        let queue = cell.queue().clone();
        let cell = cell.clone();
        queue.execute(move || {
            let dock = self;
            if let Err(err) = catch_unwind(AssertUnwindSafe(|| {
                dock.process_user(&cell, msg, sender);
            })) {
                failed_in_callback(&cell, err);
            }
        });

        Ok(())
    }

    fn accept_sys(self: Arc<Self>, cell: &ActorCell, msg: SystemMsg) {
        let queue = cell.queue().clone();
        let cell = cell.clone();
        queue.execute(move || {
            let dock = self;
            if let Err(err) = catch_unwind(AssertUnwindSafe(|| {
                dock.process_sys(&cell, msg);
            })) {
                failed_in_callback(&cell, err);
            }
        });
    }
}

/// A panic unwound out of an actor callback. The panic becomes a
/// fault on the parent, whose supervision strategy decides what
/// happens to this actor.
fn failed_in_callback(cell: &ActorCell, err: Box<dyn Any + Send>) {
    let cause = err
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| err.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "actor panicked".to_string());

    warn!("actor {} panicked: {}", cell.path(), cause);

    if let Some(parent) = cell.parent() {
        parent.sys_tell(SystemMsg::Failed(Fault::escalated(
            cell.myself(),
            ActorError::from_msg(cause),
        )));
    }
}

/// Provides context to an actor during execution.
///
/// `Context` is passed to an actor's functions, such as `recv`.
///
/// Operations performed are in most cases done so from the actor's
/// perspective. For example, creating a child actor using
/// `ctx.actor_of` will create the child under the current actor
/// within the hierarchy.
pub struct Context<Msg: Message> {
    pub myself: ActorRef<Msg>,
    pub system: ActorSystem,
}

impl<Msg: Message> Context<Msg> {
    pub(crate) fn new(myself: ActorRef<Msg>, system: ActorSystem) -> Context<Msg> {
        Context { myself, system }
    }

    /// Returns the `ActorRef` of the current actor.
    pub fn myself(&self) -> ActorRef<Msg> {
        self.myself.clone()
    }

    pub fn system(&self) -> &ActorSystem {
        &self.system
    }

    /// Create a child actor under the current actor.
    ///
    /// An invalid or already-taken name is replaced with a generated
    /// one (with a warning) rather than reported; the returned
    /// reference is always usable.
    pub fn actor_of<A>(&self, props: BoxActorProd<A>, name: &str) -> ActorRef<A::Msg>
    where
        A: Actor,
    {
        crate::kernel::provider::create_actor(&self.system, &self.myself.inner, props, name)
    }

    /// Parent of the current actor, `None` at the user root.
    pub fn parent(&self) -> Option<BasicActorRef> {
        self.myself.inner.parent()
    }

    /// See [`BasicActorRef::find`].
    pub fn find(&self, path: &str) -> Option<BasicActorRef> {
        self.myself.inner.find(path)
    }
}
