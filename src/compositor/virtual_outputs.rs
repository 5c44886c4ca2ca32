//! In-memory compositor outputs
//!
//! Headless implementation of [`OutputControl`] that keeps output state in
//! memory and records every call. Used by the replay binary and tests.

use std::collections::BTreeMap;
use tracing::{debug, trace};

use super::output::{OutputControl, OutputError, OutputHandle};
use crate::multimon::types::{Point, Size};

/// State of one virtual output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualOutput {
    /// Head name the output was created for
    pub name: String,
    /// Enabled flag
    pub enabled: bool,
    /// Integer output scale
    pub scale: u32,
    /// Native mode in client pixels
    pub mode: Size,
    /// Physical size in millimeters
    pub physical_size: Size,
    /// Position in local space
    pub position: Point,
}

impl VirtualOutput {
    /// Size in local space (mode divided by scale)
    pub fn logical_size(&self) -> Size {
        let scale = self.scale.max(1);
        Size::new(self.mode.width / scale, self.mode.height / scale)
    }
}

/// One recorded output call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputCall {
    /// `create_output`
    Create(OutputHandle),
    /// `enable`
    Enable(OutputHandle),
    /// `disable`
    Disable(OutputHandle),
    /// `set_scale`
    SetScale(OutputHandle, u32),
    /// `set_mode`
    SetMode(OutputHandle, u32, u32),
    /// `set_physical_size`
    SetPhysicalSize(OutputHandle, u32, u32),
    /// `move_output`
    Move(OutputHandle, i32, i32),
    /// `destroy_output`
    Destroy(OutputHandle),
}

/// Headless output set
#[derive(Debug, Default)]
pub struct VirtualOutputs {
    outputs: BTreeMap<OutputHandle, VirtualOutput>,
    next_id: u64,
    calls: Vec<OutputCall>,
}

impl VirtualOutputs {
    /// Create an empty output set
    pub fn new() -> Self {
        Self::default()
    }

    /// Output state by handle
    pub fn output(&self, handle: OutputHandle) -> Option<&VirtualOutput> {
        self.outputs.get(&handle)
    }

    /// All live outputs
    pub fn iter(&self) -> impl Iterator<Item = (OutputHandle, &VirtualOutput)> {
        self.outputs.iter().map(|(handle, output)| (*handle, output))
    }

    /// Number of live outputs
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// True when no outputs exist
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Calls recorded so far
    pub fn calls(&self) -> &[OutputCall] {
        &self.calls
    }

    /// Take and clear the recorded calls
    pub fn take_calls(&mut self) -> Vec<OutputCall> {
        std::mem::take(&mut self.calls)
    }

    fn get_mut(&mut self, handle: OutputHandle) -> Result<&mut VirtualOutput, OutputError> {
        self.outputs
            .get_mut(&handle)
            .ok_or(OutputError::UnknownOutput(handle))
    }
}

impl OutputControl for VirtualOutputs {
    fn create_output(&mut self, name: &str) -> Result<OutputHandle, OutputError> {
        self.next_id += 1;
        let handle = OutputHandle(self.next_id);
        self.outputs.insert(
            handle,
            VirtualOutput {
                name: name.to_string(),
                enabled: false,
                scale: 1,
                mode: Size::default(),
                physical_size: Size::default(),
                position: Point::default(),
            },
        );
        self.calls.push(OutputCall::Create(handle));
        debug!("Created {} for head {}", handle, name);
        Ok(handle)
    }

    fn enable(&mut self, output: OutputHandle) -> Result<(), OutputError> {
        self.get_mut(output)?.enabled = true;
        self.calls.push(OutputCall::Enable(output));
        trace!("Enabled {}", output);
        Ok(())
    }

    fn disable(&mut self, output: OutputHandle) -> Result<(), OutputError> {
        self.get_mut(output)?.enabled = false;
        self.calls.push(OutputCall::Disable(output));
        trace!("Disabled {}", output);
        Ok(())
    }

    fn set_scale(&mut self, output: OutputHandle, scale: u32) -> Result<(), OutputError> {
        let state = self.get_mut(output)?;
        if state.enabled {
            return Err(OutputError::Rejected {
                output,
                operation: "set_scale",
                reason: "output is enabled".to_string(),
            });
        }
        if scale == 0 {
            return Err(OutputError::Rejected {
                output,
                operation: "set_scale",
                reason: "scale must be at least 1".to_string(),
            });
        }
        state.scale = scale;
        self.calls.push(OutputCall::SetScale(output, scale));
        Ok(())
    }

    fn set_mode(&mut self, output: OutputHandle, width: u32, height: u32) -> Result<(), OutputError> {
        self.get_mut(output)?.mode = Size::new(width, height);
        self.calls.push(OutputCall::SetMode(output, width, height));
        Ok(())
    }

    fn set_physical_size(
        &mut self,
        output: OutputHandle,
        width_mm: u32,
        height_mm: u32,
    ) -> Result<(), OutputError> {
        self.get_mut(output)?.physical_size = Size::new(width_mm, height_mm);
        self.calls
            .push(OutputCall::SetPhysicalSize(output, width_mm, height_mm));
        Ok(())
    }

    fn move_output(&mut self, output: OutputHandle, x: i32, y: i32) -> Result<(), OutputError> {
        self.get_mut(output)?.position = Point::new(x, y);
        self.calls.push(OutputCall::Move(output, x, y));
        Ok(())
    }

    fn destroy_output(&mut self, output: OutputHandle) -> Result<(), OutputError> {
        self.outputs
            .remove(&output)
            .ok_or(OutputError::UnknownOutput(output))?;
        self.calls.push(OutputCall::Destroy(output));
        debug!("Destroyed {}", output);
        Ok(())
    }
}
