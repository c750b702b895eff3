//! Application metadata from the host.

use serde_json::{Value, json};

use crate::bridge::Bridge;
use crate::error::Result;
use crate::protocol::Operation;

use super::call;

/// Application-level queries.
#[derive(Debug, Clone)]
pub struct AppService {
    bridge: Bridge,
}

impl AppService {
    /// Creates an app service over `bridge`.
    #[inline]
    #[must_use]
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    /// Returns the bootstrap data (`INIT_APP`).
    pub async fn get_init_data(&self) -> Result<Value> {
        call(&self.bridge, Operation::InitApp, json!({})).await
    }

    /// Returns application metadata (`GET_APP_INFO`).
    pub async fn get_app_info(&self) -> Result<Value> {
        call(&self.bridge, Operation::GetAppInfo, json!({})).await
    }
}
