//! Pooled host entities.
//!
//! Each entity kind talks to the host through a native trait
//! (`TextLabelNatives`, `PickupNatives`) implemented by `BridgeNatives`, and
//! keeps its live instances in an `IdentifiedPool`.

pub mod pickup;
pub mod text_label;

pub use pickup::{Pickup, PickupNatives, Pickups, INVALID_PICKUP_ID};
pub use text_label::{TextLabel, TextLabelNatives, TextLabelParams, TextLabels, INVALID_TEXT_LABEL_ID};

use sampbridge_hostapi::NativeHost;
use sampbridge_primitives::Value;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::natives::BridgeNatives;

/// A world position or offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// An `0xRRGGBBAA` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xFFFF_FFFF);

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(u32::from_be_bytes([r, g, b, a]))
    }

    /// The color as a host cell.
    pub fn to_cell(self) -> i32 {
        self.0 as i32
    }
}

/// Name and formats of one host native.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NativeSignature {
    pub name: &'static str,
    pub native_format: &'static str,
    pub args_format: &'static str,
}

impl NativeSignature {
    pub(crate) const fn new(
        name: &'static str,
        native_format: &'static str,
        args_format: &'static str,
    ) -> Self {
        Self {
            name,
            native_format,
            args_format,
        }
    }

    pub(crate) fn call<H: NativeHost>(
        &self,
        natives: &mut BridgeNatives<H>,
        args: &mut [Value],
    ) -> Result<i32, BridgeError> {
        natives.call(self.name, self.native_format, self.args_format, args)
    }
}

fn position_args(v: Vector3) -> [Value; 3] {
    [Value::Float(v.x), Value::Float(v.y), Value::Float(v.z)]
}
