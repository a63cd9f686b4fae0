//! Mock pin listing for testing

use std::sync::Mutex;
use wrapsync_core::error::StoreError;
use wrapsync_core::{PinIndex, Result, WrapperPin};

/// In-memory [`PinIndex`] serving a fixed list of pins
#[derive(Default)]
pub struct MockPinIndex {
    pins: Mutex<Vec<WrapperPin>>,
    fail: Mutex<bool>,
}

impl MockPinIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pin to the listing
    pub fn with_pin(self, name: &str, cid: &str) -> Self {
        self.pins.lock().unwrap().push(WrapperPin {
            name: name.to_string(),
            cid: cid.to_string(),
        });
        self
    }

    /// Make every listing request fail
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait::async_trait]
impl PinIndex for MockPinIndex {
    async fn list_pins(&self) -> Result<Vec<WrapperPin>> {
        if *self.fail.lock().unwrap() {
            return Err(StoreError::http(502, "mock gateway: bad gateway").into());
        }
        Ok(self.pins.lock().unwrap().clone())
    }
}
