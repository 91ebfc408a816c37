use serde::Serialize;

use crate::domain::value_objects::{BridgeId, BridgeState, ColorSpace, Direction};

/// Snapshot of one bridge, as shown in listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeSummary {
    pub id: BridgeId,
    pub bridge_name: String,
    pub direction: Direction,
    pub source_name: String,
    pub color_space: ColorSpace,
    pub state: BridgeState,
}
