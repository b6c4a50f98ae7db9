//! Pickups.

use sampbridge_hostapi::NativeHost;
use sampbridge_primitives::{types::cell_to_bool, Value};

use super::{position_args, NativeSignature, Vector3};
use crate::error::BridgeError;
use crate::natives::BridgeNatives;
use crate::pool::{Identified, IdentifiedPool};

/// Id the host returns when it cannot create a pickup.
pub const INVALID_PICKUP_ID: i32 = -1;

const ADD_STATIC: NativeSignature = NativeSignature::new("AddStaticPickup", "iifffi", "ddfffd");
const CREATE: NativeSignature = NativeSignature::new("CreatePickup", "iifffi", "ddfffd");
const DESTROY: NativeSignature = NativeSignature::new("DestroyPickup", "i", "d");

/// Host natives for pickups.
pub trait PickupNatives {
    /// Static pickups have no id and live until the game mode ends.
    fn add_static_pickup(
        &mut self,
        model: i32,
        kind: i32,
        position: Vector3,
        virtual_world: i32,
    ) -> Result<bool, BridgeError>;

    fn create_pickup(
        &mut self,
        model: i32,
        kind: i32,
        position: Vector3,
        virtual_world: i32,
    ) -> Result<i32, BridgeError>;

    fn destroy_pickup(&mut self, id: i32) -> Result<bool, BridgeError>;
}

fn pickup_args(model: i32, kind: i32, position: Vector3, virtual_world: i32) -> [Value; 6] {
    let [x, y, z] = position_args(position);
    [
        Value::Int(model),
        Value::Int(kind),
        x,
        y,
        z,
        Value::Int(virtual_world),
    ]
}

impl<H: NativeHost> PickupNatives for BridgeNatives<H> {
    fn add_static_pickup(
        &mut self,
        model: i32,
        kind: i32,
        position: Vector3,
        virtual_world: i32,
    ) -> Result<bool, BridgeError> {
        let mut args = pickup_args(model, kind, position, virtual_world);
        ADD_STATIC.call(self, &mut args).map(cell_to_bool)
    }

    fn create_pickup(
        &mut self,
        model: i32,
        kind: i32,
        position: Vector3,
        virtual_world: i32,
    ) -> Result<i32, BridgeError> {
        let mut args = pickup_args(model, kind, position, virtual_world);
        CREATE.call(self, &mut args)
    }

    fn destroy_pickup(&mut self, id: i32) -> Result<bool, BridgeError> {
        DESTROY.call(self, &mut [Value::Int(id)]).map(cell_to_bool)
    }
}

/// A live pickup.
#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    id: i32,
    model: i32,
    kind: i32,
    position: Vector3,
    virtual_world: i32,
}

impl Identified for Pickup {
    fn id(&self) -> i32 {
        self.id
    }
}

impl Pickup {
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn model(&self) -> i32 {
        self.model
    }

    /// Pickup type, which decides how it respawns and what triggers it.
    pub fn kind(&self) -> i32 {
        self.kind
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn virtual_world(&self) -> i32 {
        self.virtual_world
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pickups {
    pool: IdentifiedPool<Pickup>,
}

impl Pickups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self) -> &IdentifiedPool<Pickup> {
        &self.pool
    }

    pub fn get(&self, id: i32) -> Result<&Pickup, BridgeError> {
        self.pool.get(id)
    }

    pub fn create<N: PickupNatives + ?Sized>(
        &mut self,
        natives: &mut N,
        model: i32,
        kind: i32,
        position: Vector3,
        virtual_world: i32,
    ) -> Result<i32, BridgeError> {
        let id = natives.create_pickup(model, kind, position, virtual_world)?;
        if id == INVALID_PICKUP_ID {
            return Err(BridgeError::HostRejected { native: CREATE.name });
        }
        self.pool.register(Pickup {
            id,
            model,
            kind,
            position,
            virtual_world,
        })?;
        Ok(id)
    }

    /// Add a static pickup. It is not pooled, since the host gives no id.
    pub fn add_static<N: PickupNatives + ?Sized>(
        &mut self,
        natives: &mut N,
        model: i32,
        kind: i32,
        position: Vector3,
        virtual_world: i32,
    ) -> Result<(), BridgeError> {
        if !natives.add_static_pickup(model, kind, position, virtual_world)? {
            return Err(BridgeError::HostRejected {
                native: ADD_STATIC.name,
            });
        }
        Ok(())
    }

    pub fn dispose<N: PickupNatives + ?Sized>(
        &mut self,
        natives: &mut N,
        id: i32,
    ) -> Result<Pickup, BridgeError> {
        self.pool.get(id)?;
        if !natives.destroy_pickup(id)? {
            log::warn!("host had no pickup {id} to destroy");
        }
        self.pool.release(id)
    }
}
