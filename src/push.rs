//! Push and collision resolution.
//!
//! [`attempt_push`] moves one entity one cell and settles every consequence of
//! that step before returning: collisions, damage, self-destruction, and
//! chains of pushable entities shoved along in the same direction.
//!
//! Chains are walked with an explicit work list rather than recursion, so a
//! long line of pushables costs heap, not stack. Links are visited front to
//! back while surveying and unwound back to front: each pushed link advances
//! only if its own blocker vacated the cell ahead.
//!
//! Occupancy is read from [`Motion::cell`]. An entity committed to a move
//! therefore blocks its destination immediately, and stops blocking the cell
//! it left.

use std::mem;

use bevy::prelude::*;
use log::{debug, warn};

use crate::components::{CollisionPolicy, Impassable, Projectile, Pushable};
use crate::damage::{DamageEvent, DamageInbox, DestroyCause, EntityDestroyed};
use crate::grid::{Direction, GridPosition, Motion, MotionCause};

/// A single-step displacement waiting for [`resolve_pushes_system`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushRequest {
    /// Entity to move.
    pub entity: Entity,
    /// Direction of the step.
    pub direction: Direction,
    /// Skip the request unless the entity is [`Pushable`].
    pub require_pushable: bool,
}

impl PushRequest {
    /// A step the entity takes under its own power.
    #[must_use]
    pub const fn step(entity: Entity, direction: Direction) -> Self {
        Self {
            entity,
            direction,
            require_pushable: false,
        }
    }

    /// An external shove that only affects [`Pushable`] entities.
    #[must_use]
    pub const fn shove(entity: Entity, direction: Direction) -> Self {
        Self {
            entity,
            direction,
            require_pushable: true,
        }
    }
}

/// Pending push requests, drained once per tick in submission order.
#[derive(Resource, Default, Debug)]
pub struct PushQueue {
    requests: Vec<PushRequest>,
}

impl PushQueue {
    /// Queues a request.
    pub fn push(&mut self, request: PushRequest) {
        self.requests.push(request);
    }

    /// Removes every queued request.
    pub fn take(&mut self) -> Vec<PushRequest> {
        mem::take(&mut self.requests)
    }

    /// Number of queued requests.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// What happened to the entity a push was attempted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Nothing happened: the entity is gone, in flight, or not pushable.
    Ignored,
    /// Committed to a move into `to`.
    Moved {
        /// Destination cell.
        to: GridPosition,
    },
    /// Ran into `collidee` and stayed on its cell.
    Stopped {
        /// First impassable occupant of the blocked cell.
        collidee: Entity,
    },
    /// Despawned, either off the board or by its collision policy.
    Destroyed,
}

/// What the surveyed cell holds.
enum Occupancy {
    /// No entity at all; the cell is off the board.
    OffBoard,
    /// Occupied only by passable entities.
    Passable,
    /// Holds at least one impassable entity; the first found.
    Blocked(Entity),
}

/// A pushed entity waiting to learn whether its blocker made room.
struct Link {
    entity: Entity,
    from: GridPosition,
    to: GridPosition,
    collidee: Entity,
}

/// Attempts to move `entity` one cell in `direction`.
///
/// Returns a no-op [`PushOutcome::Ignored`] when `require_pushable` is set
/// and the entity is not [`Pushable`], or when it is missing or not settled.
///
/// The candidate cell decides the outcome:
/// - no occupant: the cell is off the board and the entity is despawned;
/// - an impassable occupant: the first one found receives a [`DamageEvent`]
///   carrying the mover's projectile damage (zero without a projectile), then
///   the mover's [`CollisionPolicy`] applies, `Stop` by default;
/// - only passable occupants: the entity commits to the move.
///
/// Under `StopAndPush` the mover stays put and the collidee is shoved on in
/// the same direction. A shoved collidee that is itself blocked shoves its
/// own blocker first and then follows into the freed cell, so a line of
/// pushables shifts together. The chain ends at an empty cell, a board edge,
/// or a collidee that cannot be pushed, in which case no link moves. A link
/// carrying a `DestroySelf` profile is despawned when it is blocked, ending
/// the chain there; the links behind it then follow into the freed cell.
pub fn attempt_push(
    world: &mut World,
    entity: Entity,
    direction: Direction,
    require_pushable: bool,
) -> PushOutcome {
    let mut links: Vec<Link> = Vec::new();
    let mut initiator_outcome = None;
    let mut current = entity;
    let mut require = require_pushable;

    let tail = loop {
        if require && world.get::<Pushable>(current).is_none() {
            break PushOutcome::Ignored;
        }
        let Some(from) = world.get::<Motion>(current).and_then(Motion::settled) else {
            break PushOutcome::Ignored;
        };
        let to = from.step(direction);

        let collidee = match survey(world, to, current) {
            Occupancy::OffBoard => {
                destroy(world, current, from, DestroyCause::OffBoard);
                break PushOutcome::Destroyed;
            }
            Occupancy::Passable => {
                let cause = motion_cause(world, current, require);
                commit(world, current, from, to, cause);
                break PushOutcome::Moved { to };
            }
            Occupancy::Blocked(collidee) => collidee,
        };

        let profile = world.get::<Projectile>(current).copied();
        world.resource_mut::<DamageInbox>().push(DamageEvent {
            target: collidee,
            source: current,
            amount: profile.map_or(0, |p| p.damage),
        });

        let policy = profile.map_or(CollisionPolicy::Stop, |p| p.on_collision);
        let is_initiator = current == entity && initiator_outcome.is_none();
        if !is_initiator {
            if policy == CollisionPolicy::DestroySelf {
                destroy(world, current, from, DestroyCause::SelfDestruct);
                break PushOutcome::Destroyed;
            }
            strip(world, current);
            links.push(Link {
                entity: current,
                from,
                to,
                collidee,
            });
            current = collidee;
            require = true;
            continue;
        }

        match policy {
            CollisionPolicy::Stop => {
                strip(world, current);
                break PushOutcome::Stopped { collidee };
            }
            CollisionPolicy::DestroySelf => {
                destroy(world, current, from, DestroyCause::SelfDestruct);
                break PushOutcome::Destroyed;
            }
            CollisionPolicy::StopAndPush => {
                strip(world, current);
                initiator_outcome = Some(PushOutcome::Stopped { collidee });
                current = collidee;
                require = true;
            }
        }
    };

    debug!("push chain from {entity:?} {direction:?}: tail {tail:?}, {} links", links.len());

    let mut first_link = tail;
    for link in links.into_iter().rev() {
        first_link = follow(world, link);
    }

    initiator_outcome.unwrap_or(first_link)
}

/// Advances a pushed link into the cell ahead if its blocker made room.
fn follow(world: &mut World, link: Link) -> PushOutcome {
    match survey(world, link.to, link.entity) {
        Occupancy::Passable => {
            commit(world, link.entity, link.from, link.to, MotionCause::Pushed);
            PushOutcome::Moved { to: link.to }
        }
        Occupancy::OffBoard => {
            destroy(world, link.entity, link.from, DestroyCause::OffBoard);
            PushOutcome::Destroyed
        }
        Occupancy::Blocked(_) => PushOutcome::Stopped {
            collidee: link.collidee,
        },
    }
}

/// Classifies `cell`, ignoring `mover` itself.
///
/// The first impassable occupant in query order wins; the order is stable
/// for a given world layout.
fn survey(world: &mut World, cell: GridPosition, mover: Entity) -> Occupancy {
    let mut occupants = world.query::<(Entity, &Motion, Has<Impassable>)>();
    let mut occupied = false;
    for (other, motion, impassable) in occupants.iter(world) {
        if other == mover || motion.cell() != cell {
            continue;
        }
        if impassable {
            return Occupancy::Blocked(other);
        }
        occupied = true;
    }
    if occupied {
        Occupancy::Passable
    } else {
        Occupancy::OffBoard
    }
}

fn motion_cause(world: &World, entity: Entity, pushed: bool) -> MotionCause {
    if world.get::<Projectile>(entity).is_some() {
        MotionCause::Projectile
    } else if pushed {
        MotionCause::Pushed
    } else {
        MotionCause::Walk
    }
}

fn commit(
    world: &mut World,
    entity: Entity,
    from: GridPosition,
    to: GridPosition,
    cause: MotionCause,
) {
    if let Some(mut motion) = world.get_mut::<Motion>(entity) {
        *motion = Motion::InFlight { from, to, cause };
    }
}

/// Drops the projectile profile; the entity becomes an ordinary occupant.
fn strip(world: &mut World, entity: Entity) {
    if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
        entity_mut.remove::<Projectile>();
    }
}

fn destroy(world: &mut World, entity: Entity, cell: GridPosition, cause: DestroyCause) {
    if !world.despawn(entity) {
        warn!("{entity:?} vanished before it could be destroyed ({cause:?})");
        return;
    }
    debug!("{entity:?} destroyed at {cell} ({cause:?})");
    world.write_message(EntityDestroyed {
        entity,
        cell: Some(cell),
        cause,
    });
}

/// Drains the [`PushQueue`] and resolves each request in order.
///
/// Runs exclusively so that every request observes the commits made by the
/// ones before it.
pub fn resolve_pushes_system(world: &mut World) {
    let requests = world.resource_mut::<PushQueue>().take();
    for request in requests {
        let outcome = attempt_push(
            world,
            request.entity,
            request.direction,
            request.require_pushable,
        );
        debug!("{:?} {:?}: {outcome:?}", request.entity, request.direction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Ground, StepRate};
    use rstest::{fixture, rstest};

    /// A `size` × `size` board of ground sentinels in a bare world.
    #[fixture]
    fn board() -> World {
        let mut world = World::new();
        world.init_resource::<DamageInbox>();
        world.init_resource::<Messages<EntityDestroyed>>();
        for x in 0..8 {
            for y in 0..8 {
                world.spawn((Ground, Motion::Settled(GridPosition::new(x, y))));
            }
        }
        world
    }

    fn block(world: &mut World, x: i32, y: i32) -> Entity {
        world
            .spawn((Impassable, Pushable, Motion::Settled(GridPosition::new(x, y))))
            .id()
    }

    fn wall(world: &mut World, x: i32, y: i32) -> Entity {
        world
            .spawn((Impassable, Motion::Settled(GridPosition::new(x, y))))
            .id()
    }

    fn projectile(world: &mut World, x: i32, y: i32, on_collision: CollisionPolicy) -> Entity {
        world
            .spawn((
                Motion::Settled(GridPosition::new(x, y)),
                Projectile {
                    damage: 2,
                    step_rate: StepRate::Immediate,
                    direction: Direction::South,
                    on_collision,
                },
            ))
            .id()
    }

    fn destination(world: &World, entity: Entity) -> Option<GridPosition> {
        world.get::<Motion>(entity).map(Motion::cell)
    }

    #[rstest]
    fn step_onto_ground_commits(mut board: World) {
        let unit = block(&mut board, 2, 2);
        let outcome = attempt_push(&mut board, unit, Direction::East, false);
        assert_eq!(
            outcome,
            PushOutcome::Moved {
                to: GridPosition::new(3, 2)
            }
        );
        assert_eq!(
            board.get::<Motion>(unit),
            Some(&Motion::InFlight {
                from: GridPosition::new(2, 2),
                to: GridPosition::new(3, 2),
                cause: MotionCause::Walk,
            })
        );
    }

    #[rstest]
    fn stepping_off_the_board_destroys(mut board: World) {
        let shot = projectile(&mut board, 0, 7, CollisionPolicy::Stop);
        let outcome = attempt_push(&mut board, shot, Direction::South, false);
        assert_eq!(outcome, PushOutcome::Destroyed);
        assert!(board.get_entity(shot).is_err());
        let destroyed: Vec<_> = board
            .resource_mut::<Messages<EntityDestroyed>>()
            .drain()
            .collect();
        assert_eq!(destroyed.len(), 1);
        assert_eq!(destroyed[0].cause, DestroyCause::OffBoard);
    }

    #[rstest]
    fn stop_policy_keeps_mover_and_strips_profile(mut board: World) {
        let shot = projectile(&mut board, 3, 2, CollisionPolicy::Stop);
        let target = wall(&mut board, 3, 3);
        let outcome = attempt_push(&mut board, shot, Direction::South, false);
        assert_eq!(outcome, PushOutcome::Stopped { collidee: target });
        assert_eq!(
            board.get::<Motion>(shot),
            Some(&Motion::Settled(GridPosition::new(3, 2)))
        );
        assert!(board.get::<Projectile>(shot).is_none());
        assert_eq!(
            board.resource::<DamageInbox>().events(),
            &[DamageEvent {
                target,
                source: shot,
                amount: 2
            }]
        );
    }

    #[rstest]
    fn destroy_self_still_delivers_one_hit(mut board: World) {
        let shot = projectile(&mut board, 3, 2, CollisionPolicy::DestroySelf);
        let target = block(&mut board, 3, 3);
        let outcome = attempt_push(&mut board, shot, Direction::South, false);
        assert_eq!(outcome, PushOutcome::Destroyed);
        assert!(board.get_entity(shot).is_err());
        assert_eq!(board.resource::<DamageInbox>().events().len(), 1);
        assert_eq!(destination(&board, target), Some(GridPosition::new(3, 3)));
    }

    #[rstest]
    fn walking_into_a_pushable_stops_without_pushing(mut board: World) {
        let unit = block(&mut board, 1, 1);
        let crate_ = block(&mut board, 2, 1);
        let outcome = attempt_push(&mut board, unit, Direction::East, false);
        assert_eq!(outcome, PushOutcome::Stopped { collidee: crate_ });
        assert_eq!(destination(&board, crate_), Some(GridPosition::new(2, 1)));
    }

    #[rstest]
    fn shove_requires_pushable(mut board: World) {
        let pillar = wall(&mut board, 4, 4);
        let outcome = attempt_push(&mut board, pillar, Direction::North, true);
        assert_eq!(outcome, PushOutcome::Ignored);
        assert_eq!(
            board.get::<Motion>(pillar),
            Some(&Motion::Settled(GridPosition::new(4, 4)))
        );
    }

    #[rstest]
    fn in_flight_entities_are_ignored(mut board: World) {
        let unit = block(&mut board, 1, 1);
        attempt_push(&mut board, unit, Direction::South, false);
        let outcome = attempt_push(&mut board, unit, Direction::South, false);
        assert_eq!(outcome, PushOutcome::Ignored);
    }

    #[rstest]
    fn in_flight_entity_blocks_its_destination(mut board: World) {
        let first = block(&mut board, 1, 1);
        let second = block(&mut board, 3, 2);
        attempt_push(&mut board, first, Direction::South, false);
        let outcome = attempt_push(&mut board, second, Direction::West, false);
        assert_eq!(outcome, PushOutcome::Moved { to: GridPosition::new(2, 2) });
        let third = block(&mut board, 0, 2);
        let blocked = attempt_push(&mut board, third, Direction::East, false);
        assert_eq!(blocked, PushOutcome::Stopped { collidee: first });
    }

    #[rstest]
    fn chain_shifts_every_link(mut board: World) {
        let shot = projectile(&mut board, 3, 0, CollisionPolicy::StopAndPush);
        let links = [block(&mut board, 3, 1), block(&mut board, 3, 2), block(&mut board, 3, 3)];
        let outcome = attempt_push(&mut board, shot, Direction::South, false);
        assert_eq!(outcome, PushOutcome::Stopped { collidee: links[0] });
        assert_eq!(destination(&board, shot), Some(GridPosition::new(3, 0)));
        for (offset, link) in (2..).zip(links) {
            assert_eq!(destination(&board, link), Some(GridPosition::new(3, offset)));
            assert!(matches!(
                board.get::<Motion>(link),
                Some(Motion::InFlight {
                    cause: MotionCause::Pushed,
                    ..
                })
            ));
        }
    }

    #[rstest]
    fn chain_against_a_wall_moves_nothing(mut board: World) {
        let shot = projectile(&mut board, 3, 0, CollisionPolicy::StopAndPush);
        let first = block(&mut board, 3, 1);
        let second = block(&mut board, 3, 2);
        wall(&mut board, 3, 3);
        attempt_push(&mut board, shot, Direction::South, false);
        assert_eq!(
            board.get::<Motion>(first),
            Some(&Motion::Settled(GridPosition::new(3, 1)))
        );
        assert_eq!(
            board.get::<Motion>(second),
            Some(&Motion::Settled(GridPosition::new(3, 2)))
        );
        // Projectile into first, first into second, second into the wall.
        assert_eq!(board.resource::<DamageInbox>().events().len(), 3);
    }

    #[rstest]
    fn chain_over_the_edge_drops_the_last_link(mut board: World) {
        let shot = projectile(&mut board, 3, 4, CollisionPolicy::StopAndPush);
        let first = block(&mut board, 3, 5);
        let second = block(&mut board, 3, 6);
        let last = block(&mut board, 3, 7);
        attempt_push(&mut board, shot, Direction::South, false);
        assert!(board.get_entity(last).is_err());
        assert_eq!(destination(&board, first), Some(GridPosition::new(3, 6)));
        assert_eq!(destination(&board, second), Some(GridPosition::new(3, 7)));
    }

    #[rstest]
    fn fragile_link_breaks_against_a_wall(mut board: World) {
        let shot = projectile(&mut board, 0, 0, CollisionPolicy::StopAndPush);
        let boulder = board
            .spawn((
                Impassable,
                Pushable,
                Motion::Settled(GridPosition::new(0, 1)),
                Projectile {
                    damage: 0,
                    step_rate: StepRate::PerTurnAction,
                    direction: Direction::South,
                    on_collision: CollisionPolicy::DestroySelf,
                },
            ))
            .id();
        let target = wall(&mut board, 0, 2);

        let outcome = attempt_push(&mut board, shot, Direction::South, false);
        assert_eq!(outcome, PushOutcome::Stopped { collidee: boulder });
        assert!(board.get_entity(boulder).is_err());
        assert_eq!(
            board.get::<Motion>(target),
            Some(&Motion::Settled(GridPosition::new(0, 2)))
        );
        let destroyed: Vec<_> = board
            .resource_mut::<Messages<EntityDestroyed>>()
            .drain()
            .collect();
        assert_eq!(destroyed.len(), 1);
        assert_eq!(destroyed[0].entity, boulder);
        assert_eq!(destroyed[0].cause, DestroyCause::SelfDestruct);
        // Shot into boulder, boulder into wall.
        assert_eq!(board.resource::<DamageInbox>().events().len(), 2);
    }

    #[rstest]
    fn chain_follows_into_a_broken_link(mut board: World) {
        let shot = projectile(&mut board, 3, 0, CollisionPolicy::StopAndPush);
        let first = block(&mut board, 3, 1);
        let fragile = projectile(&mut board, 3, 2, CollisionPolicy::DestroySelf);
        board.entity_mut(fragile).insert((Impassable, Pushable));
        wall(&mut board, 3, 3);

        attempt_push(&mut board, shot, Direction::South, false);
        assert!(board.get_entity(fragile).is_err());
        assert_eq!(destination(&board, first), Some(GridPosition::new(3, 2)));
        assert_eq!(destination(&board, shot), Some(GridPosition::new(3, 0)));
    }

    #[rstest]
    fn long_chain_resolves_without_recursion() {
        let mut world = World::new();
        world.init_resource::<DamageInbox>();
        world.init_resource::<Messages<EntityDestroyed>>();
        let length = 2_000;
        for x in 0..=length + 1 {
            world.spawn((Ground, Motion::Settled(GridPosition::new(x, 0))));
        }
        let shot = projectile(&mut world, 0, 0, CollisionPolicy::StopAndPush);
        let blocks: Vec<_> = (1..=length).map(|x| block(&mut world, x, 0)).collect();
        attempt_push(&mut world, shot, Direction::East, false);
        for (x, entity) in (2..).zip(blocks) {
            assert_eq!(destination(&world, entity), Some(GridPosition::new(x, 0)));
        }
    }

    #[rstest]
    fn eight_by_eight_scenario(mut board: World) {
        let unit = block(&mut board, 3, 3);
        let shot = projectile(&mut board, 3, 2, CollisionPolicy::StopAndPush);
        attempt_push(&mut board, shot, Direction::South, false);
        assert_eq!(destination(&board, unit), Some(GridPosition::new(3, 4)));
        assert_eq!(
            board.get::<Motion>(shot),
            Some(&Motion::Settled(GridPosition::new(3, 2)))
        );
        assert!(board.get::<Projectile>(shot).is_none());
    }

    #[rstest]
    fn queue_resolves_in_submission_order(mut board: World) {
        board.init_resource::<PushQueue>();
        let a = block(&mut board, 1, 1);
        let b = block(&mut board, 3, 1);
        {
            let mut queue = board.resource_mut::<PushQueue>();
            queue.push(PushRequest::step(a, Direction::East));
            queue.push(PushRequest::step(b, Direction::West));
        }
        resolve_pushes_system(&mut board);
        assert!(board.resource::<PushQueue>().is_empty());
        assert_eq!(destination(&board, a), Some(GridPosition::new(2, 1)));
        // b now sees a committed to (2, 1) and stops.
        assert_eq!(
            board.get::<Motion>(b),
            Some(&Motion::Settled(GridPosition::new(3, 1)))
        );
    }
}
