// Wire protocol DTOs and the domain events they translate into.
// Everything on the socket is a JSON message tagged {"type": ..., "data": ...}.

use crate::state::{
    Chunk, DropSnapshot, EnemySnapshot, HitEffect, PlayerSnapshot, ResourceSnapshot, Vec2,
    WorldMap, WorldUpdate,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Events a connection feeds into the world task. Movement input is queued
/// for the next tick by the world task; everything else applies on drain.
#[derive(Debug)]
pub enum GameEvent {
    Join {
        player_id: u64,
    },
    Leave {
        player_id: u64,
    },
    SetName {
        player_id: u64,
        name: String,
    },
    Input {
        player_id: u64,
        dir: Vec2,
    },
    Facing {
        player_id: u64,
        dir: Vec2,
    },
    Action {
        player_id: u64,
        dir: Vec2,
    },
    Harvest {
        player_id: u64,
        target_id: u64,
    },
    SaveMap {
        player_id: u64,
        chunks: HashMap<String, Chunk>,
        /// Save outcome travels back to the requesting connection only.
        reply: oneshot::Sender<Result<(), String>>,
    },
}

// ---------------------------------------------------------------------------
// Client -> server

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    // Set the display name after connecting.
    PlayerJoin(JoinPayload),
    // Raw movement direction, queued for the next tick.
    PlayerInput(DirectionDto),
    // Immediate facing update, no movement.
    PlayerFacingDirection(DirectionDto),
    // Swing-style action resolved by hit-point targeting.
    PlayerAction(ActionPayload),
    // Explicit harvest/collect by target id (drop or resource).
    HarvestResource(HarvestPayload),
    // Persist the authored map; the result comes back on this connection.
    SaveMap(SaveMapPayload),
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinPayload {
    pub name: String,
}

/// Raw client-supplied vector. Components are never trusted: non-finite
/// values collapse to zero before reaching the simulation.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DirectionDto {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl From<DirectionDto> for Vec2 {
    fn from(d: DirectionDto) -> Self {
        Vec2::new(finite_or_zero(d.x), finite_or_zero(d.y))
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Attack,
    Interact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionPayload {
    /// Attack and interact resolve identically today; the split is kept on
    /// the wire for clients that animate them differently.
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub direction: DirectionDto,
    /// Held item; reserved for weapon/tool multipliers.
    #[serde(default)]
    pub item: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HarvestPayload {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveMapPayload {
    pub chunks: HashMap<String, Chunk>,
}

// ---------------------------------------------------------------------------
// Server -> client

/// Messages the server sends to connected clients over the WebSocket.
/// `State` borrows from the broadcast snapshot so per-recipient filtering
/// never clones the world.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage<'a> {
    // Assigned identity for the connection.
    #[serde(rename_all = "camelCase")]
    Identity { player_id: u64 },
    // Snapshot of the world for a given tick, filtered for the recipient.
    State(StateDto<'a>),
    // Transient visual cue for a successful combat or gather hit.
    HitEffect(HitEffectDto),
    // Outcome of a saveMap request, sent only to the requester.
    MapSaveResult(MapSaveResultDto),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDto<'a> {
    pub tick: u64,
    pub players: Vec<PlayerDto<'a>>,
    pub enemies: Vec<EnemyDto>,
    pub world: &'a WorldMap,
    pub resources: Vec<ResourceDto>,
    pub enemy_drops: Vec<DropDto>,
}

impl<'a> StateDto<'a> {
    /// Builds the per-recipient view of a world snapshot: identical for all
    /// players except that enemy drops honor their ownership windows.
    pub fn for_viewer(update: &'a WorldUpdate, viewer_id: u64) -> Self {
        Self {
            tick: update.tick,
            players: update.players.iter().map(PlayerDto::from).collect(),
            enemies: update.enemies.iter().map(EnemyDto::from).collect(),
            world: &update.world,
            resources: update.resources.iter().map(ResourceDto::from).collect(),
            enemy_drops: update
                .enemy_drops
                .iter()
                .filter(|d| d.is_visible_to(viewer_id, update.now_ms))
                .map(DropDto::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Vec2Dto {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for Vec2Dto {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto<'a> {
    pub id: u64,
    pub name: &'a str,
    pub x: f32,
    pub y: f32,
    pub is_alive: bool,
    pub hp: f32,
    pub hp_max: f32,
    pub damage: f32,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub inventory: &'a HashMap<String, u32>,
    pub facing_direction: Vec2Dto,
}

impl<'a> From<&'a PlayerSnapshot> for PlayerDto<'a> {
    fn from(p: &'a PlayerSnapshot) -> Self {
        Self {
            id: p.id,
            name: &p.name,
            x: p.x,
            y: p.y,
            is_alive: p.alive,
            hp: p.hp,
            hp_max: p.hp_max,
            damage: p.damage,
            level: p.level,
            xp: p.xp,
            xp_to_next_level: p.xp_to_next_level,
            inventory: &p.inventory,
            facing_direction: p.facing.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyDto {
    pub id: u64,
    #[serde(rename = "type")]
    pub species: &'static str,
    pub x: f32,
    pub y: f32,
    pub hp: f32,
    pub hp_max: f32,
    pub size: f32,
    pub state: &'static str,
}

impl From<&EnemySnapshot> for EnemyDto {
    fn from(e: &EnemySnapshot) -> Self {
        Self {
            id: e.id,
            species: e.species.as_str(),
            x: e.x,
            y: e.y,
            hp: e.hp,
            hp_max: e.hp_max,
            size: e.size,
            state: e.state.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDto {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub x: f32,
    pub y: f32,
    pub quantity: u32,
    pub max_quantity: u32,
    pub is_deplete: bool,
    pub respawn_progress: f32,
    pub is_solid: bool,
    pub size: f32,
}

impl From<&ResourceSnapshot> for ResourceDto {
    fn from(r: &ResourceSnapshot) -> Self {
        Self {
            id: r.id,
            kind: r.kind.as_str(),
            x: r.x,
            y: r.y,
            quantity: r.quantity,
            max_quantity: r.max_quantity,
            is_deplete: r.depleted,
            respawn_progress: r.respawn_progress,
            is_solid: r.solid,
            size: r.size,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropDto {
    pub id: u64,
    #[serde(rename = "type")]
    pub item: &'static str,
    pub x: f32,
    pub y: f32,
    pub quantity: u32,
    pub xp_reward: u32,
}

impl From<&DropSnapshot> for DropDto {
    fn from(d: &DropSnapshot) -> Self {
        Self {
            id: d.id,
            item: d.item,
            x: d.x,
            y: d.y,
            quantity: d.quantity,
            xp_reward: d.xp_reward,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HitEffectDto {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl From<HitEffect> for HitEffectDto {
    fn from(e: HitEffect) -> Self {
        Self {
            x: e.x,
            y: e.y,
            kind: e.kind.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MapSaveResultDto {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::HitEffectKind;

    #[test]
    fn client_events_parse_by_name() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"playerInput","data":{"x":1.5,"y":-0.5}}"#)
                .expect("playerInput should parse");
        match msg {
            ClientMessage::PlayerInput(dir) => {
                assert_eq!(dir.x, 1.5);
                assert_eq!(dir.y, -0.5);
            }
            other => panic!("unexpected message: {other:?}"),
        }

        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"playerAction","data":{"type":"attack","direction":{"x":0.0,"y":1.0},"item":null}}"#,
        )
        .expect("playerAction should parse");
        match msg {
            ClientMessage::PlayerAction(action) => {
                assert_eq!(action.kind, ActionKind::Attack);
                assert_eq!(action.direction.y, 1.0);
            }
            other => panic!("unexpected message: {other:?}"),
        }

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"harvestResource","data":{"id":77}}"#)
                .expect("harvestResource should parse");
        match msg {
            ClientMessage::HarvestResource(payload) => assert_eq!(payload.id, 77),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn missing_direction_components_default_to_zero() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"playerInput","data":{}}"#)
            .expect("empty input should parse");
        let ClientMessage::PlayerInput(dir) = msg else {
            panic!("expected playerInput");
        };
        let v: Vec2 = dir.into();
        assert_eq!(v, Vec2::ZERO);
    }

    #[test]
    fn server_messages_serialize_with_wire_names() {
        let msg = ServerMessage::Identity { player_id: 42 };
        let json = serde_json::to_string(&msg).expect("serialize identity");
        assert_eq!(json, r#"{"type":"identity","data":{"playerId":42}}"#);

        let effect = HitEffect {
            x: 1.0,
            y: 2.0,
            kind: HitEffectKind::Gather,
        };
        let json =
            serde_json::to_string(&ServerMessage::HitEffect(effect.into())).expect("serialize");
        assert!(json.contains(r#""type":"hitEffect""#));
        assert!(json.contains(r#""type":"gather""#));
    }
}
