use std::sync::Arc;

use log::{trace, warn};

use crate::{
    actor::{
        actor_cell::{ActorCell, Context, Dock},
        actor_ref::ActorReference,
        Actor, ActorPath, ActorRef, BasicActorRef, BoxActorProd, Props, Sender,
    },
    system::{ActorSystem, SystemMsg},
    validate::validate_name,
};

/// Creates an actor cell under `parent` and returns its typed
/// reference.
///
/// Name problems are repaired rather than reported: an invalid or
/// already-taken name is replaced with a generated identifier and a
/// warning. A parent that is stopping or stopped produces a dead
/// reference (everything sent through it is dropped).
pub(crate) fn create_actor<A>(
    sys: &ActorSystem,
    parent: &BasicActorRef,
    props: BoxActorProd<A>,
    name: &str,
) -> ActorRef<A::Msg>
where
    A: Actor,
{
    let name = match validate_name(name) {
        Ok(()) => name.to_string(),
        Err(err) => {
            let substitute = generated_name();
            warn!("{} Substituting generated name {}", err, substitute);
            substitute
        }
    };

    let parent_cell = match parent.cell() {
        Some(cell) => cell,
        None => {
            warn!(
                "cannot create actor {:?} under {}: parent is stopped",
                name,
                parent.path()
            );
            return ActorRef::new(BasicActorRef::dead(parent.path().child(&name)));
        }
    };

    let actor = props.produce();

    // the children table is the name registry: hold its lock from the
    // uniqueness check until the child is inserted
    let mut children = parent_cell.lock_children();

    // checked under the lock so the stop cascade either sees this
    // child in its snapshot or this check sees the stop
    if parent_cell.is_terminating() {
        warn!(
            "cannot create actor {:?} under {}: parent is stopping",
            name,
            parent.path()
        );
        return ActorRef::new(BasicActorRef::dead(parent.path().child(&name)));
    }

    let name = if children.contains_key(&name) {
        let substitute = generated_name();
        warn!(
            "actor name {:?} already in use under {}; substituting {}",
            name,
            parent.path(),
            substitute
        );
        substitute
    } else {
        name
    };

    let path = parent_cell.path().child(&name);
    trace!("creating actor at: {}", path);

    let queue = sys.dispatcher().attach();
    let cell = ActorCell::new(path, Some(parent_cell.myself()), queue, sys.clone());
    let myself = ActorRef::new(cell.myself());

    let dock = Arc::new(Dock::new(
        actor,
        props,
        Context::new(myself.clone(), sys.clone()),
    ));
    cell.install_handler(dock);

    // pre_start must be the first task the cell processes, so the
    // init goes onto the queue before the reference is discoverable
    cell.send_sys_msg(SystemMsg::ActorInit);
    children.insert(name, cell.myself());

    myself
}

fn generated_name() -> String {
    format!("{}", rand::random::<u64>())
}

/// Bootstraps `/user`, the root of the supervision tree.
pub(crate) fn create_user_guardian(sys: &ActorSystem) -> BasicActorRef {
    let queue = sys.dispatcher().attach();
    let cell = ActorCell::new(ActorPath::new("/user"), None, queue, sys.clone());
    let myself: ActorRef<SystemMsg> = ActorRef::new(cell.myself());

    let props = Props::new(Guardian::new);
    let actor = props.produce();

    let dock = Arc::new(Dock::new(actor, props, Context::new(myself, sys.clone())));
    cell.install_handler(dock);
    cell.send_sys_msg(SystemMsg::ActorInit);

    cell.myself()
}

/// The trivial actor at the user root. Faults escalated this far are
/// ignored, which makes the guardian the final stop of any
/// escalation chain.
struct Guardian;

impl Guardian {
    fn new() -> Self {
        Guardian
    }
}

impl Actor for Guardian {
    type Msg = SystemMsg;

    fn recv(&mut self, _: &Context<Self::Msg>, _: Self::Msg, _: Sender) {}

    fn post_stop(&mut self) {
        trace!("user guardian stopped");
    }
}
