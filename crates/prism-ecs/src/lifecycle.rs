//! Component lifecycle.
//!
//! Every component managed by a [`Lifecycle`] owns an entity in the
//! [`World`] and moves through the same states, one step per
//! [`Lifecycle::tick`]:
//!
//! ```text
//! None -> Enable -> Awake -> Initialize -> Update
//!                                            |  (disabled or destroyed)
//!                                            v
//!                    Enable <- (re-enabled) Disable -> (destroyed) Finalize
//! ```
//!
//! A finalized component is dropped and its entity despawned in the same
//! tick.

use prism_core::{FrameTime, ObjectId};
use tracing::{debug, trace};

use crate::entity::Entity;
use crate::world::World;

/// Where a component is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComponentState {
    #[default]
    None,
    Enable,
    Awake,
    Initialize,
    Update,
    Disable,
    Finalize,
}

/// What a hook can reach while it runs.
pub struct Context<'a> {
    pub world: &'a mut World,
    /// The entity owned by this component.
    pub entity: Entity,
    pub parent: Option<Entity>,
    pub time: &'a FrameTime,
}

/// Behaviour of a lifecycle-managed component. Every hook defaults to doing
/// nothing.
pub trait Behaviour: Send + Sync + 'static {
    fn on_enable(&mut self, _ctx: &mut Context<'_>) {}

    fn awake(&mut self, _ctx: &mut Context<'_>) {}

    /// Runs once, on the first activation.
    fn initialize(&mut self, _ctx: &mut Context<'_>) {}

    /// Runs once per fixed timestep that elapsed this frame, before `update`.
    fn fixed_update(&mut self, _ctx: &mut Context<'_>) {}

    fn update(&mut self, _ctx: &mut Context<'_>) {}

    fn late_update(&mut self, _ctx: &mut Context<'_>) {}

    fn draw(&mut self, _ctx: &mut Context<'_>) {}

    fn on_disable(&mut self, _ctx: &mut Context<'_>) {}

    fn finalize(&mut self, _ctx: &mut Context<'_>) {}
}

struct Slot {
    id: ObjectId,
    entity: Entity,
    parent: Option<Entity>,
    state: ComponentState,
    enabled: bool,
    initialized: bool,
    destroyed: bool,
    behaviour: Box<dyn Behaviour>,
}

impl Slot {
    /// Advance one state. `fixed_steps` is how many fixed updates are due.
    fn step(&mut self, ctx: &mut Context<'_>, fixed_steps: u32) {
        use ComponentState as S;

        let active = matches!(self.state, S::Enable | S::Awake | S::Initialize | S::Update);
        if active && (!self.enabled || self.destroyed) {
            self.behaviour.on_disable(ctx);
            self.enter(S::Disable);
            return;
        }

        match self.state {
            S::None if self.destroyed => self.enter(S::Finalize),
            S::None if self.enabled => {
                self.behaviour.on_enable(ctx);
                self.enter(S::Enable);
            }
            S::None => {}
            S::Enable if self.initialized => {
                self.enter(S::Update);
                self.frame(ctx, fixed_steps);
            }
            S::Enable => {
                self.behaviour.awake(ctx);
                self.enter(S::Awake);
            }
            S::Awake => {
                self.behaviour.initialize(ctx);
                self.initialized = true;
                self.enter(S::Initialize);
            }
            S::Initialize => {
                self.enter(S::Update);
                self.frame(ctx, fixed_steps);
            }
            S::Update => self.frame(ctx, fixed_steps),
            S::Disable if self.destroyed => {
                if self.initialized {
                    self.behaviour.finalize(ctx);
                }
                self.enter(S::Finalize);
            }
            S::Disable if self.enabled => {
                self.behaviour.on_enable(ctx);
                self.enter(S::Enable);
            }
            S::Disable | S::Finalize => {}
        }
    }

    fn frame(&mut self, ctx: &mut Context<'_>, fixed_steps: u32) {
        for _ in 0..fixed_steps {
            self.behaviour.fixed_update(ctx);
        }
        self.behaviour.update(ctx);
        self.behaviour.late_update(ctx);
    }

    fn enter(&mut self, state: ComponentState) {
        trace!("Component {} ({}): {:?} -> {:?}", self.id, self.entity, self.state, state);
        self.state = state;
    }
}

/// Owns lifecycle-managed components and drives them each frame.
#[derive(Default)]
pub struct Lifecycle {
    slots: Vec<Slot>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a component of type `T` on a new entity.
    pub fn create<T: Behaviour + Default>(
        &mut self,
        world: &mut World,
        enabled: bool,
        parent: Option<Entity>,
    ) -> Entity {
        self.spawn(world, T::default(), enabled, parent)
    }

    /// Manage an already-built component on a new entity.
    pub fn spawn<T: Behaviour>(
        &mut self,
        world: &mut World,
        behaviour: T,
        enabled: bool,
        parent: Option<Entity>,
    ) -> Entity {
        let entity = world.spawn();
        let id = ObjectId::new();
        debug!(
            "Component {} created on {} ({})",
            id,
            entity,
            std::any::type_name::<T>()
        );
        self.slots.push(Slot {
            id,
            entity,
            parent,
            state: ComponentState::None,
            enabled,
            initialized: false,
            destroyed: false,
            behaviour: Box::new(behaviour),
        });
        entity
    }

    fn slot_mut(&mut self, entity: Entity) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|slot| slot.entity == entity)
    }

    fn slot(&self, entity: Entity) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.entity == entity)
    }

    /// Returns `false` if `entity` is not managed here.
    pub fn set_enabled(&mut self, entity: Entity, enabled: bool) -> bool {
        self.slot_mut(entity).map(|slot| slot.enabled = enabled).is_some()
    }

    /// Schedule a component for disable, finalize and despawn.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        self.slot_mut(entity).map(|slot| slot.destroyed = true).is_some()
    }

    pub fn state(&self, entity: Entity) -> Option<ComponentState> {
        self.slot(entity).map(|slot| slot.state)
    }

    pub fn object_id(&self, entity: Entity) -> Option<ObjectId> {
        self.slot(entity).map(|slot| slot.id)
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.slot(entity)?.parent
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Advance every component one step, then remove finalized ones.
    pub fn tick(&mut self, world: &mut World, time: &mut FrameTime) {
        let fixed_steps = time.fixed_steps();
        let time: &FrameTime = time;

        for slot in &mut self.slots {
            let mut ctx = Context {
                world: &mut *world,
                entity: slot.entity,
                parent: slot.parent,
                time,
            };
            slot.step(&mut ctx, fixed_steps);
        }

        self.slots.retain(|slot| {
            if slot.state != ComponentState::Finalize {
                return true;
            }
            world.despawn(slot.entity);
            debug!("Component {} finalized, {} despawned", slot.id, slot.entity);
            false
        });
    }

    /// Run `draw` on every updating component.
    pub fn draw(&mut self, world: &mut World, time: &FrameTime) {
        for slot in &mut self.slots {
            if slot.state != ComponentState::Update || !slot.enabled {
                continue;
            }
            let mut ctx = Context {
                world: &mut *world,
                entity: slot.entity,
                parent: slot.parent,
                time,
            };
            slot.behaviour.draw(&mut ctx);
        }
    }
}
