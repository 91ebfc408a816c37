use crate::domain::errors::{DomainError, Result};
use crate::domain::value_objects::{ColorSpace, Direction, NetworkAddress, TransportKind};

/// Longest endpoint name accepted by either transport
pub const MAX_NAME_LEN: usize = 255;

/// Configuration of a single bridge: where frames come from, where they go
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    source_name: String,
    bridge_name: String,
    direction: Direction,
    color_space: ColorSpace,
}

impl BridgeConfig {
    pub fn new(
        source_name: String,
        bridge_name: String,
        direction: Direction,
        color_space: ColorSpace,
    ) -> Result<Self> {
        Self::validate_endpoint(&source_name, direction.source_kind())
            .map_err(DomainError::InvalidSourceName)?;
        Self::validate_endpoint(&bridge_name, direction.sink_kind())
            .map_err(DomainError::InvalidBridgeName)?;

        Ok(Self {
            source_name,
            bridge_name,
            direction,
            color_space,
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn bridge_name(&self) -> &str {
        &self.bridge_name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    fn validate_endpoint(name: &str, kind: TransportKind) -> std::result::Result<(), String> {
        if name.is_empty() {
            return Err("name cannot be empty".to_string());
        }
        if name.len() > MAX_NAME_LEN {
            return Err(format!("{} exceeds {} bytes", name, MAX_NAME_LEN));
        }

        match kind {
            TransportKind::SharedMemory => {
                if name.contains(['/', '\\', '\0']) || name == "." || name == ".." {
                    return Err(format!("{} is not a valid shared-memory name", name));
                }
            }
            TransportKind::Network => {
                name.parse::<NetworkAddress>().map_err(|e| e.to_string())?;
            }
        }
        Ok(())
    }
}
