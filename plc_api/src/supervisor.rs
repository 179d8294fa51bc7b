//! Operator access to the process image.
//!
//! Each write goes through one memory-model call, so it takes a single bank
//! lock; toggles read and write under that same lock. Every accepted write
//! publishes a `state` event.

use std::sync::Arc;
use std::time::Duration;

use plc_common::image::{Bank, ProcessImage};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::action::{ActionRequest, ActionResponse, ActionType, value_as_bit, value_as_int};
use crate::error::SupervisorError;
use crate::push::{PUSH_CHANNEL_CAPACITY, PushEvent};
use crate::view::PlcStateView;

/// Supervisory facade over a shared image.
#[derive(Debug)]
pub struct Supervisor {
    image: Arc<ProcessImage>,
    scan_period: Duration,
    window: usize,
    events: broadcast::Sender<PushEvent>,
}

impl Supervisor {
    /// `window` is the number of leading addresses exposed per bank.
    pub fn new(image: Arc<ProcessImage>, scan_period: Duration, window: usize) -> Self {
        let (events, _) = broadcast::channel(PUSH_CHANNEL_CAPACITY);
        Self {
            image,
            scan_period,
            window,
            events,
        }
    }

    /// New push subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.events.subscribe()
    }

    /// Consistent view of the image.
    pub fn get_state(&self) -> PlcStateView {
        PlcStateView::from_snapshot(&self.image.snapshot(), self.window, self.scan_period)
    }

    /// Broadcast the current state; returns the number of receivers.
    pub fn publish_state(&self) -> usize {
        self.events
            .send(PushEvent::State(self.get_state()))
            .unwrap_or(0)
    }

    /// Force a discrete input.
    pub fn set_binary_input(&self, address: usize, value: bool) -> Result<(), SupervisorError> {
        self.image.write_bit(Bank::BinaryInputs, address, value)?;
        info!("Operator set DI{address} = {value}");
        self.publish_state();
        Ok(())
    }

    /// Write a holding register; the value is clamped to 0..=65535.
    pub fn set_integer_output(&self, address: usize, value: i64) -> Result<u16, SupervisorError> {
        let stored = self.image.write_word(Bank::IntegerOutputs, address, value)?;
        info!("Operator set HR{address} = {stored} (requested {value})");
        self.publish_state();
        Ok(stored)
    }

    /// Invert a discrete input; returns the new value.
    pub fn toggle_binary_input(&self, address: usize) -> Result<bool, SupervisorError> {
        let value = self.image.toggle_bit(Bank::BinaryInputs, address)?;
        info!("Operator toggled DI{address} -> {value}");
        self.publish_state();
        Ok(value)
    }

    /// Dispatch an action payload.
    pub fn apply(&self, request: &ActionRequest) -> Result<ActionResponse, SupervisorError> {
        let action = ActionType::parse(&request.action_type)?;
        let address = usize::try_from(request.address)
            .map_err(|_| SupervisorError::InvalidAddress(request.address))?;
        debug!("Applying {action:?} at {address}");

        let message = match action {
            ActionType::SetInput => {
                let value = value_as_bit(action, request.value.as_ref())?;
                self.set_binary_input(address, value)?;
                format!("DI{address} set to {value}")
            }
            ActionType::SetRegister => {
                let value = value_as_int(action, request.value.as_ref())?;
                let stored = self.set_integer_output(address, value)?;
                format!("HR{address} set to {stored}")
            }
            ActionType::ToggleInput => {
                let value = self.toggle_binary_input(address)?;
                format!("DI{address} toggled to {value}")
            }
        };
        Ok(ActionResponse::ok(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plc_common::image::MemoryError;
    use serde_json::json;

    fn supervisor() -> Supervisor {
        Supervisor::new(Arc::new(ProcessImage::default()), Duration::from_millis(100), 8)
    }

    #[test]
    fn set_integer_output_clamps() {
        let s = supervisor();
        assert_eq!(s.set_integer_output(4, 70_000), Ok(65_535));
        assert_eq!(s.set_integer_output(4, -5), Ok(0));
    }

    #[test]
    fn out_of_range_is_reported() {
        let s = supervisor();
        assert!(matches!(
            s.set_binary_input(64, true),
            Err(SupervisorError::Memory(MemoryError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn toggle_flips() {
        let s = supervisor();
        assert_eq!(s.toggle_binary_input(1), Ok(true));
        assert_eq!(s.toggle_binary_input(1), Ok(false));
    }

    #[test]
    fn accepted_write_publishes_state() {
        let s = supervisor();
        let mut rx = s.subscribe();
        s.set_binary_input(0, true).unwrap();
        match rx.try_recv().unwrap() {
            PushEvent::State(view) => assert!(view.discrete_inputs[0]),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn rejected_write_publishes_nothing() {
        let s = supervisor();
        let mut rx = s.subscribe();
        let _ = s.set_integer_output(99, 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn apply_dispatches() {
        let s = supervisor();
        let resp = s
            .apply(&ActionRequest::new(ActionType::SetRegister, 4, Some(json!(850))))
            .unwrap();
        assert!(resp.success);
        assert_eq!(s.get_state().holding_registers[4], 850);

        assert!(matches!(
            s.apply(&ActionRequest::new(ActionType::SetInput, -1, Some(json!(true)))),
            Err(SupervisorError::InvalidAddress(-1))
        ));
    }
}
