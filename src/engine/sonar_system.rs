use crate::player::PlayerState;
use crate::types::{Bearing, CueKind, Direction, SonarCue};
use crate::world::{Exit, WorldGraph};

/// Derives one cue per direction around the player's room, swept clockwise
/// starting at the facing direction. Pure read: classification only, no
/// audio and no mutation.
pub fn sweep(world: &WorldGraph, player: &PlayerState) -> Vec<SonarCue> {
    const BEARINGS: [Bearing; 4] = [Bearing::Ahead, Bearing::Right, Bearing::Behind, Bearing::Left];

    let mut cues = Vec::with_capacity(4);
    let mut direction = player.facing();
    for bearing in BEARINGS {
        cues.push(probe(world, player, direction, bearing));
        direction = direction.right();
    }
    cues
}

fn probe(
    world: &WorldGraph,
    player: &PlayerState,
    direction: Direction,
    bearing: Bearing,
) -> SonarCue {
    let room = player.room();
    let target = match world.exit(room, direction) {
        None => {
            return cue(direction, bearing, CueKind::Wall, None, None);
        }
        Some(Exit::Open(target)) => target.clone(),
        Some(Exit::Locked(lock_id)) => {
            let Some(lock) = world.lock(lock_id) else {
                return cue(direction, bearing, CueKind::Wall, None, None);
            };
            if !player.is_passage_unlocked(lock_id) {
                return cue(
                    direction,
                    bearing,
                    CueKind::Locked,
                    Some(lock.requires.clone()),
                    None,
                );
            }
            lock.target.clone()
        }
    };

    match world.uncollected_item_at(&target) {
        Some(item) => cue(
            direction,
            bearing,
            CueKind::ItemAhead,
            None,
            Some(item.sound.clone()),
        ),
        None => cue(direction, bearing, CueKind::Open, None, None),
    }
}

fn cue(
    direction: Direction,
    bearing: Bearing,
    kind: CueKind,
    required_item: Option<String>,
    item_sound: Option<String>,
) -> SonarCue {
    SonarCue {
        direction,
        bearing,
        kind,
        required_item,
        item_sound,
    }
}
