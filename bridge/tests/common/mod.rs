//! Shared test helpers for integration tests.
//!
//! Provides a scripted game host whose entity natives allocate ids the way
//! the server does, plus a builder for script heaps used in public call
//! frames.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use sampbridge::{Bridge, BridgeConfig};
use sampbridge_hostapi::{MemHost, NativeFrame};
use sampbridge_primitives::{
    types::{bytes_to_cells, cell_to_float},
    Cell, CELL_SIZE,
};

/// Text label invalid id as returned by the server.
pub const INVALID_3DTEXT_ID: Cell = 0xFFFF;

// ── Host-side state ──

/// Host id table: the lowest free id is handed out first.
#[derive(Debug, Default)]
pub struct IdTable {
    live: Vec<i32>,
    capacity: i32,
}

impl IdTable {
    pub fn with_capacity(capacity: i32) -> Self {
        Self {
            live: Vec::new(),
            capacity,
        }
    }

    pub fn allocate(&mut self) -> Option<i32> {
        let id = (0..self.capacity).find(|id| !self.live.contains(id))?;
        self.live.push(id);
        Some(id)
    }

    pub fn free(&mut self, id: i32) -> bool {
        let before = self.live.len();
        self.live.retain(|&l| l != id);
        self.live.len() < before
    }

    pub fn is_live(&self, id: i32) -> bool {
        self.live.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }
}

/// What the server knows about one text label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelState {
    pub text: String,
    pub color: Cell,
    pub position: (f32, f32, f32),
    pub draw_distance: f32,
    pub virtual_world: i32,
    pub test_los: bool,
    pub attached_player: Option<i32>,
    pub attached_vehicle: Option<i32>,
}

/// Server state touched by the scripted natives.
#[derive(Debug)]
pub struct World {
    pub label_ids: IdTable,
    pub labels: BTreeMap<i32, LabelState>,
    pub pickup_ids: IdTable,
    pub static_pickups: usize,
    pub rcon: Vec<String>,
}

impl Default for World {
    fn default() -> Self {
        Self {
            label_ids: IdTable::with_capacity(1024),
            labels: BTreeMap::new(),
            pickup_ids: IdTable::with_capacity(4096),
            static_pickups: 0,
            rcon: Vec::new(),
        }
    }
}

pub type SharedWorld = Rc<RefCell<World>>;

fn text(frame: &NativeFrame, index: usize) -> String {
    String::from_utf8_lossy(&frame.string_bytes(index).unwrap_or_default()).into_owned()
}

fn int(frame: &NativeFrame, index: usize) -> Cell {
    frame.cell(index).unwrap_or(0)
}

fn float(frame: &NativeFrame, index: usize) -> f32 {
    cell_to_float(int(frame, index))
}

fn flag(ok: bool) -> Cell {
    ok as Cell
}

// ── Scripted host ──

/// A host exporting the natives used across the integration tests.
pub fn game_host() -> (MemHost, SharedWorld) {
    let world: SharedWorld = Rc::new(RefCell::new(World::default()));
    let mut host = MemHost::new();

    host.register("IsPlayerConnected", |frame| flag(int(frame, 0) == 0));

    let w = Rc::clone(&world);
    host.register("SendRconCommand", move |frame| {
        w.borrow_mut().rcon.push(text(frame, 0));
        1
    });

    host.register("GetNetworkStats", |frame| {
        let len = int(frame, 1);
        frame.write_string(
            0,
            b"Server Ticks: 201\nMessages in Send buffer: 0\nMessages sent: 1000\n",
        );
        len
    });

    let w = Rc::clone(&world);
    host.register("Create3DTextLabel", move |frame| {
        let mut world = w.borrow_mut();
        let Some(id) = world.label_ids.allocate() else {
            return INVALID_3DTEXT_ID;
        };
        let state = LabelState {
            text: text(frame, 0),
            color: int(frame, 1),
            position: (float(frame, 2), float(frame, 3), float(frame, 4)),
            draw_distance: float(frame, 5),
            virtual_world: int(frame, 6),
            test_los: int(frame, 7) != 0,
            attached_player: None,
            attached_vehicle: None,
        };
        world.labels.insert(id, state);
        id
    });

    let w = Rc::clone(&world);
    host.register("Delete3DTextLabel", move |frame| {
        let mut world = w.borrow_mut();
        let id = int(frame, 0);
        world.labels.remove(&id);
        flag(world.label_ids.free(id))
    });

    let w = Rc::clone(&world);
    host.register("Update3DTextLabelText", move |frame| {
        let mut world = w.borrow_mut();
        match world.labels.get_mut(&int(frame, 0)) {
            Some(label) => {
                label.color = int(frame, 1);
                label.text = text(frame, 2);
                1
            }
            None => 0,
        }
    });

    let w = Rc::clone(&world);
    host.register("Attach3DTextLabelToPlayer", move |frame| {
        let mut world = w.borrow_mut();
        match world.labels.get_mut(&int(frame, 0)) {
            Some(label) => {
                label.attached_player = Some(int(frame, 1));
                1
            }
            None => 0,
        }
    });

    let w = Rc::clone(&world);
    host.register("Attach3DTextLabelToVehicle", move |frame| {
        let mut world = w.borrow_mut();
        match world.labels.get_mut(&int(frame, 0)) {
            Some(label) => {
                label.attached_vehicle = Some(int(frame, 1));
                1
            }
            None => 0,
        }
    });

    let w = Rc::clone(&world);
    host.register("CreatePickup", move |_| w.borrow_mut().pickup_ids.allocate().unwrap_or(-1));

    let w = Rc::clone(&world);
    host.register("DestroyPickup", move |frame| {
        flag(w.borrow_mut().pickup_ids.free(int(frame, 0)))
    });

    let w = Rc::clone(&world);
    host.register("AddStaticPickup", move |_| {
        w.borrow_mut().static_pickups += 1;
        1
    });

    (host, world)
}

/// A bridge over [`game_host`] with the default configuration.
pub fn game_bridge() -> (Bridge<MemHost>, SharedWorld) {
    game_bridge_with(BridgeConfig::default())
}

pub fn game_bridge_with(config: BridgeConfig) -> (Bridge<MemHost>, SharedWorld) {
    let (host, world) = game_host();
    (Bridge::new(host, config), world)
}

// ── Script heap ──

/// Builds the script heap a public call frame points into.
#[derive(Debug, Default)]
pub struct Heap {
    cells: Vec<Cell>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an unpacked string and return its byte address.
    pub fn push_str(&mut self, bytes: &[u8]) -> Cell {
        self.push_cells(&bytes_to_cells(bytes))
    }

    /// Store raw cells and return their byte address.
    pub fn push_cells(&mut self, cells: &[Cell]) -> Cell {
        let address = (self.cells.len() * CELL_SIZE) as Cell;
        self.cells.extend_from_slice(cells);
        address
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

/// A fresh path in the temp directory for this process.
pub fn temp_path(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("sampbridge-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_file(&path);
    path
}
