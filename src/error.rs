//! Error types for swarmlight.
//!
//! Initialization problems are fatal and surface to the caller, allocation
//! failures are recoverable and degrade a single feature, and parameter-domain
//! violations never become errors at all (they are clamped by [`crate::params`]).

use thiserror::Error;

/// Errors that can occur while bringing up the GPU.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a Vulkan/Metal/DX12/WebGPU capable device is required")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// A shader or pipeline was rejected by the backend.
    #[error("failed to create {label}: {message}")]
    Pipeline {
        label: &'static str,
        message: String,
    },
    /// Failed to map a buffer for reading.
    #[error("failed to map GPU buffer: {0}")]
    BufferMapping(String),
}

/// Errors raised while reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file from disk.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML for [`crate::SwarmConfig`].
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level error for every fallible swarmlight operation.
#[derive(Debug, Error)]
pub enum SwarmError {
    /// Invalid initialization input. No partial state is retained.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// An operation ran before the component it needs was set up.
    #[error("{0} used before initialization")]
    NotInitialized(&'static str),
    /// A GPU target or texture could not be allocated.
    #[error("failed to allocate {resource}: {message}")]
    ResourceAllocation {
        resource: &'static str,
        message: String,
    },
    /// GPU bring-up failed.
    #[error(transparent)]
    Gpu(#[from] GpuError),
    /// Config file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The window or event loop could not be created.
    #[error("windowing error: {0}")]
    Window(String),
}

impl SwarmError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        SwarmError::Configuration(message.into())
    }

    /// Whether the frame loop can carry on by degrading a feature.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SwarmError::ResourceAllocation { .. })
    }
}

impl From<winit::error::EventLoopError> for SwarmError {
    fn from(e: winit::error::EventLoopError) -> Self {
        SwarmError::Window(e.to_string())
    }
}

impl From<winit::error::OsError> for SwarmError {
    fn from(e: winit::error::OsError) -> Self {
        SwarmError::Window(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_errors_are_recoverable() {
        let err = SwarmError::ResourceAllocation {
            resource: "shadow depth target",
            message: "out of memory".into(),
        };
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("shadow depth target"));
    }

    #[test]
    fn test_configuration_errors_are_fatal() {
        let err = SwarmError::configuration("texture size must be positive");
        assert!(!err.is_recoverable());
        assert!(!SwarmError::NotInitialized("simulation field").is_recoverable());
    }
}
