use std::cell::RefCell;
use std::rc::Rc;

use cadence::prelude::*;

type Log = Rc<RefCell<Vec<&'static str>>>;

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

struct Player {
    core: EntityCore,
    log: Log,
}

impl Player {
    fn new(log: Log) -> Self {
        Player {
            core: EntityCore::new(),
            log,
        }
    }
}

declare_entity!(Player => core);

impl GameObject for Player {
    fn on_init(&mut self) {
        self.log.borrow_mut().push("player.init");
    }

    fn on_destroy(&mut self) {
        self.log.borrow_mut().push("player.destroy");
    }

    fn update(&mut self, _: &UpdateContext) {
        self.log.borrow_mut().push("player.update");
    }

    fn late_update(&mut self, _: &UpdateContext) {
        self.log.borrow_mut().push("player.late");
    }

    fn draw(&mut self, _: &mut dyn Renderer) {
        self.log.borrow_mut().push("player.draw");
    }
}

struct Health {
    core: ComponentCore,
    log: Log,
    hp: i32,
}

impl Health {
    fn new(log: Log, hp: i32) -> Self {
        Health {
            core: ComponentCore::new(),
            log,
            hp,
        }
    }
}

declare_component!(Health => core);

impl GameObject for Health {
    fn on_init(&mut self) {
        self.log.borrow_mut().push("health.init");
    }

    fn on_destroy(&mut self) {
        self.log.borrow_mut().push("health.destroy");
    }

    fn update(&mut self, _: &UpdateContext) {
        self.log.borrow_mut().push("health.update");
    }

    fn late_update(&mut self, _: &UpdateContext) {
        self.log.borrow_mut().push("health.late");
    }

    fn draw(&mut self, _: &mut dyn Renderer) {
        self.log.borrow_mut().push("health.draw");
    }
}

struct Buff {
    core: ComponentCore,
    strength: u32,
}

impl Buff {
    fn new(strength: u32) -> Self {
        Buff {
            core: ComponentCore::new(),
            strength,
        }
    }
}

declare_component!(Buff => core);
impl GameObject for Buff {}

struct SpeedBuff {
    core: ComponentCore,
}

impl SpeedBuff {
    fn new() -> Self {
        SpeedBuff {
            core: ComponentCore::new(),
        }
    }
}

declare_component!(SpeedBuff => core, [Buff]);
impl GameObject for SpeedBuff {}

fn frame<'a>(registry: &'a Registry) -> UpdateContext<'a> {
    UpdateContext {
        dt: 0.016,
        unscaled_dt: 0.016,
        registry,
    }
}

#[test]
fn passes_visit_entities_and_components_in_fixed_order() {
    let registry = Registry::new();
    let log = new_log();

    let player = registry.add_entity(Player::new(log.clone()));
    player
        .borrow()
        .entity_core()
        .add_component(Health::new(log.clone(), 100));

    registry.update(&frame(&registry));
    registry.late_update(&frame(&registry));

    let mut renderer = HeadlessRenderer::new();
    registry.draw(&mut renderer);

    assert_eq!(
        *log.borrow(),
        vec![
            "player.init",
            "health.init",
            // update and late_update visit entities first.
            "player.update",
            "health.update",
            "player.late",
            "health.late",
            // draw reverses the order.
            "health.draw",
            "player.draw",
        ]
    );
}

#[test]
fn marking_an_entity_cascades_to_its_components() {
    let registry = Registry::new();
    let log = new_log();

    let player = registry.add_entity(Player::new(log.clone()));
    let health = player
        .borrow()
        .entity_core()
        .add_component(Health::new(log.clone(), 100));
    player
        .borrow()
        .entity_core()
        .add_component(Buff::new(3));

    player.mark();
    assert!(player.is_marked());
    assert!(health.is_marked());

    // Nothing is destroyed until the sweep.
    assert_eq!(registry.entities().len(), 1);
    assert_eq!(registry.components().len(), 2);
    assert_eq!(health.borrow().hp, 100);

    registry.destroy_marked();

    assert!(player.is_destroyed());
    assert!(health.is_destroyed());
    assert!(registry.entities().is_empty());
    assert!(registry.components().is_empty());

    // Components are torn down before their entity.
    assert_eq!(*log.borrow(), vec!["player.init", "health.init", "health.destroy", "player.destroy"]);

    // The flag was consumed; a second sweep does nothing.
    registry.destroy_marked();
    assert!(registry.entities().is_empty());
}

#[test]
fn destroying_a_component_leaves_the_entity_alone() {
    let registry = Registry::new();
    let log = new_log();

    let player = registry.add_entity(Player::new(log.clone()));
    let health = player
        .borrow()
        .entity_core()
        .add_component(Health::new(log.clone(), 100));

    health.mark();
    registry.destroy_marked();

    assert!(health.is_destroyed());
    assert!(!player.is_marked());

    // Both ownership slots were released.
    assert!(registry.components().is_empty());
    assert!(player.borrow().entity_core().get_component::<Health>().is_none());
    assert_eq!(registry.entities().len(), 1);
}

#[test]
fn component_queries_see_declared_descendants() {
    let registry = Registry::new();
    let log = new_log();

    let player = registry.add_entity(Player::new(log));
    let speed = player.borrow().entity_core().add_component(SpeedBuff::new());

    // No Buff instance yet; the any-query falls through to the descendant.
    {
        let core = player.borrow();
        let core = core.entity_core();
        assert!(core.get_component::<Buff>().is_none());
        let any = core.get_any_component::<Buff>().unwrap();
        assert!(any.is::<SpeedBuff>());
    }

    let buff = player.borrow().entity_core().add_component(Buff::new(3));

    {
        let core = player.borrow();
        let core = core.entity_core();

        // Exact queries never cross type boundaries.
        assert!(core.get_component::<Buff>().unwrap().ptr_eq(&buff));
        assert!(core.get_component::<SpeedBuff>().unwrap().ptr_eq(&speed));
        assert_eq!(core.get_components::<Buff>().len(), 1);

        // Any-queries prefer the exact bucket, then descendants.
        let first = core.get_any_component::<Buff>().unwrap();
        assert!(first.is::<Buff>());
        assert_eq!(first.downcast::<Buff>().unwrap().borrow().strength, 3);

        let all = core.get_any_components::<Buff>();
        assert_eq!(all.len(), 2);
        assert!(all[0].is::<Buff>());
        assert!(all[1].is::<SpeedBuff>());
    }

    // The global component index answers the same queries across entities.
    assert_eq!(registry.components().get_all_any::<Buff>().len(), 2);
    assert_eq!(registry.components().get_all_exact::<Buff>().len(), 1);
}

#[test]
fn components_reach_their_entity_and_siblings() {
    let registry = Registry::new();
    let log = new_log();

    let player = registry.add_entity(Player::new(log.clone()));
    let health = player
        .borrow()
        .entity_core()
        .add_component(Health::new(log, 100));
    player.borrow().entity_core().add_component(Buff::new(1));

    let health = health.borrow();
    let core = health.component_core();

    assert!(core.entity().is::<Player>());
    assert!(core.get_component::<Buff>().is_some());
    assert!(core.get_component::<Health>().is_some());
    assert_eq!(core.get_any_components::<Buff>().len(), 1);
}

#[test]
#[should_panic(expected = "queued for destruction")]
fn attaching_to_a_dying_entity_is_refused() {
    let registry = Registry::new();
    let player = registry.add_entity(Player::new(new_log()));

    player.mark();
    player.borrow().entity_core().add_component(Buff::new(1));
}

#[test]
#[should_panic(expected = "can only be attached to a registered entity")]
fn attaching_through_an_unregistered_entity_is_refused() {
    let loose = Player::new(new_log());
    loose.entity_core().add_component(Buff::new(1));
}

#[test]
#[should_panic(expected = "not attached to an entity")]
fn detached_components_can_not_query_siblings() {
    let loose = Buff::new(1);
    loose.component_core().get_component::<Health>();
}
