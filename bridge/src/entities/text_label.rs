//! 3D text labels.
//!
//! Text and color update in place. Position, draw distance, virtual world and
//! line-of-sight testing are fixed when the host creates a label, so changing
//! any of them deletes the label and creates a new one: the label's id
//! changes.

use sampbridge_hostapi::NativeHost;
use sampbridge_primitives::{types::cell_to_bool, Value};

use super::{position_args, Color, NativeSignature, Vector3};
use crate::error::BridgeError;
use crate::natives::BridgeNatives;
use crate::pool::{Identified, IdentifiedPool};

/// Id the host returns when it cannot create a label.
pub const INVALID_TEXT_LABEL_ID: i32 = 0xFFFF;

const CREATE: NativeSignature = NativeSignature::new("Create3DTextLabel", "siffffib", "sdffffdb");
const DELETE: NativeSignature = NativeSignature::new("Delete3DTextLabel", "i", "d");
const UPDATE_TEXT: NativeSignature = NativeSignature::new("Update3DTextLabelText", "iis", "dds");
const ATTACH_TO_PLAYER: NativeSignature =
    NativeSignature::new("Attach3DTextLabelToPlayer", "iifff", "ddfff");
const ATTACH_TO_VEHICLE: NativeSignature =
    NativeSignature::new("Attach3DTextLabelToVehicle", "iifff", "ddfff");

/// Host natives for 3D text labels.
pub trait TextLabelNatives {
    fn create_3d_text_label(
        &mut self,
        text: &str,
        color: Color,
        position: Vector3,
        draw_distance: f32,
        virtual_world: i32,
        test_los: bool,
    ) -> Result<i32, BridgeError>;

    fn delete_3d_text_label(&mut self, id: i32) -> Result<bool, BridgeError>;

    fn update_3d_text_label_text(&mut self, id: i32, color: Color, text: &str) -> Result<bool, BridgeError>;

    fn attach_3d_text_label_to_player(
        &mut self,
        id: i32,
        player_id: i32,
        offset: Vector3,
    ) -> Result<bool, BridgeError>;

    fn attach_3d_text_label_to_vehicle(
        &mut self,
        id: i32,
        vehicle_id: i32,
        offset: Vector3,
    ) -> Result<bool, BridgeError>;
}

impl<H: NativeHost> TextLabelNatives for BridgeNatives<H> {
    fn create_3d_text_label(
        &mut self,
        text: &str,
        color: Color,
        position: Vector3,
        draw_distance: f32,
        virtual_world: i32,
        test_los: bool,
    ) -> Result<i32, BridgeError> {
        let [x, y, z] = position_args(position);
        let mut args = [
            Value::from(text),
            Value::Int(color.to_cell()),
            x,
            y,
            z,
            Value::Float(draw_distance),
            Value::Int(virtual_world),
            Value::Bool(test_los),
        ];
        CREATE.call(self, &mut args)
    }

    fn delete_3d_text_label(&mut self, id: i32) -> Result<bool, BridgeError> {
        DELETE.call(self, &mut [Value::Int(id)]).map(cell_to_bool)
    }

    fn update_3d_text_label_text(&mut self, id: i32, color: Color, text: &str) -> Result<bool, BridgeError> {
        let mut args = [Value::Int(id), Value::Int(color.to_cell()), Value::from(text)];
        UPDATE_TEXT.call(self, &mut args).map(cell_to_bool)
    }

    fn attach_3d_text_label_to_player(
        &mut self,
        id: i32,
        player_id: i32,
        offset: Vector3,
    ) -> Result<bool, BridgeError> {
        let [x, y, z] = position_args(offset);
        let mut args = [Value::Int(id), Value::Int(player_id), x, y, z];
        ATTACH_TO_PLAYER.call(self, &mut args).map(cell_to_bool)
    }

    fn attach_3d_text_label_to_vehicle(
        &mut self,
        id: i32,
        vehicle_id: i32,
        offset: Vector3,
    ) -> Result<bool, BridgeError> {
        let [x, y, z] = position_args(offset);
        let mut args = [Value::Int(id), Value::Int(vehicle_id), x, y, z];
        ATTACH_TO_VEHICLE.call(self, &mut args).map(cell_to_bool)
    }
}

/// Creation parameters of a label.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabelParams {
    pub text: String,
    pub color: Color,
    pub position: Vector3,
    pub draw_distance: f32,
    /// `-1` shows the label in every world.
    pub virtual_world: i32,
    pub test_los: bool,
}

impl TextLabelParams {
    pub fn new(text: &str, color: Color, position: Vector3, draw_distance: f32) -> Self {
        Self {
            text: text.to_string(),
            color,
            position,
            draw_distance,
            virtual_world: -1,
            test_los: true,
        }
    }

    pub fn virtual_world(mut self, virtual_world: i32) -> Self {
        self.virtual_world = virtual_world;
        self
    }

    pub fn test_los(mut self, test_los: bool) -> Self {
        self.test_los = test_los;
        self
    }
}

/// A live label.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    id: i32,
    params: TextLabelParams,
}

impl Identified for TextLabel {
    fn id(&self) -> i32 {
        self.id
    }
}

impl TextLabel {
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn params(&self) -> &TextLabelParams {
        &self.params
    }

    pub fn text(&self) -> &str {
        &self.params.text
    }

    pub fn color(&self) -> Color {
        self.params.color
    }

    pub fn position(&self) -> Vector3 {
        self.params.position
    }

    pub fn draw_distance(&self) -> f32 {
        self.params.draw_distance
    }

    pub fn virtual_world(&self) -> i32 {
        self.params.virtual_world
    }

    pub fn test_los(&self) -> bool {
        self.params.test_los
    }
}

fn spawn<N: TextLabelNatives + ?Sized>(natives: &mut N, p: &TextLabelParams) -> Result<i32, BridgeError> {
    let id = natives.create_3d_text_label(
        &p.text,
        p.color,
        p.position,
        p.draw_distance,
        p.virtual_world,
        p.test_los,
    )?;
    if id == INVALID_TEXT_LABEL_ID {
        return Err(BridgeError::HostRejected {
            native: CREATE.name,
        });
    }
    Ok(id)
}

/// The pool of live labels.
#[derive(Debug, Clone, Default)]
pub struct TextLabels {
    pool: IdentifiedPool<TextLabel>,
}

impl TextLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self) -> &IdentifiedPool<TextLabel> {
        &self.pool
    }

    pub fn get(&self, id: i32) -> Result<&TextLabel, BridgeError> {
        self.pool.get(id)
    }

    /// Create a label on the host and register it.
    pub fn create<N: TextLabelNatives + ?Sized>(
        &mut self,
        natives: &mut N,
        params: TextLabelParams,
    ) -> Result<i32, BridgeError> {
        let id = spawn(natives, &params)?;
        self.pool.register(TextLabel { id, params })?;
        Ok(id)
    }

    pub fn set_text<N: TextLabelNatives + ?Sized>(
        &mut self,
        natives: &mut N,
        id: i32,
        text: &str,
    ) -> Result<(), BridgeError> {
        let label = self.pool.get_mut(id)?;
        natives.update_3d_text_label_text(id, label.params.color, text)?;
        label.params.text = text.to_string();
        Ok(())
    }

    pub fn set_color<N: TextLabelNatives + ?Sized>(
        &mut self,
        natives: &mut N,
        id: i32,
        color: Color,
    ) -> Result<(), BridgeError> {
        let label = self.pool.get_mut(id)?;
        natives.update_3d_text_label_text(id, color, &label.params.text)?;
        label.params.color = color;
        Ok(())
    }

    /// Move the label. Returns its new id.
    pub fn set_position<N: TextLabelNatives + ?Sized>(
        &mut self,
        natives: &mut N,
        id: i32,
        position: Vector3,
    ) -> Result<i32, BridgeError> {
        self.recreate(natives, id, |p| p.position = position)
    }

    /// Returns the new id.
    pub fn set_draw_distance<N: TextLabelNatives + ?Sized>(
        &mut self,
        natives: &mut N,
        id: i32,
        draw_distance: f32,
    ) -> Result<i32, BridgeError> {
        self.recreate(natives, id, |p| p.draw_distance = draw_distance)
    }

    /// Returns the new id.
    pub fn set_virtual_world<N: TextLabelNatives + ?Sized>(
        &mut self,
        natives: &mut N,
        id: i32,
        virtual_world: i32,
    ) -> Result<i32, BridgeError> {
        self.recreate(natives, id, |p| p.virtual_world = virtual_world)
    }

    /// Returns the new id.
    pub fn set_test_los<N: TextLabelNatives + ?Sized>(
        &mut self,
        natives: &mut N,
        id: i32,
        test_los: bool,
    ) -> Result<i32, BridgeError> {
        self.recreate(natives, id, |p| p.test_los = test_los)
    }

    pub fn attach_to_player<N: TextLabelNatives + ?Sized>(
        &mut self,
        natives: &mut N,
        id: i32,
        player_id: i32,
        offset: Vector3,
    ) -> Result<bool, BridgeError> {
        self.pool.get(id)?;
        natives.attach_3d_text_label_to_player(id, player_id, offset)
    }

    pub fn attach_to_vehicle<N: TextLabelNatives + ?Sized>(
        &mut self,
        natives: &mut N,
        id: i32,
        vehicle_id: i32,
        offset: Vector3,
    ) -> Result<bool, BridgeError> {
        self.pool.get(id)?;
        natives.attach_3d_text_label_to_vehicle(id, vehicle_id, offset)
    }

    /// Delete the label on the host and release its id.
    pub fn dispose<N: TextLabelNatives + ?Sized>(
        &mut self,
        natives: &mut N,
        id: i32,
    ) -> Result<TextLabel, BridgeError> {
        self.pool.get(id)?;
        if !natives.delete_3d_text_label(id)? {
            log::warn!("host had no text label {id} to delete");
        }
        self.pool.release(id)
    }

    fn recreate<N, F>(&mut self, natives: &mut N, id: i32, update: F) -> Result<i32, BridgeError>
    where
        N: TextLabelNatives + ?Sized,
        F: FnOnce(&mut TextLabelParams),
    {
        self.pool.recreate(
            id,
            natives,
            |natives, label| {
                natives.delete_3d_text_label(label.id)?;
                Ok(())
            },
            |natives, label| {
                update(&mut label.params);
                label.id = spawn(natives, &label.params)?;
                Ok(())
            },
        )
    }
}
