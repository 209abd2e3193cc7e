//! Shader module compilation and caching.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;
use wgpu::{ShaderModuleDescriptor, ShaderSource};

use crate::background::BACKGROUND_SHADER_SOURCE;
use crate::mesh_pipeline::MESH_SHADER_SOURCE;

/// Error types for shader loading operations.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader '{name}' failed to compile: {message}")]
    CompilationFailed { name: String, message: String },

    #[error("shader '{name}' not found in library")]
    NotLoaded { name: String },
}

/// Name of the mesh shader in the library.
pub const MESH_SHADER: &str = "mesh";
/// Name of the background shader in the library.
pub const BACKGROUND_SHADER: &str = "background";

/// Registry of compiled shader modules, keyed by name.
#[derive(Default)]
pub struct ShaderLibrary {
    modules: HashMap<String, Arc<wgpu::ShaderModule>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// A library with the mesh and background shaders compiled.
    pub fn with_builtins(device: &wgpu::Device) -> Result<Self, ShaderError> {
        let mut library = Self::new();
        library.load_from_source(device, MESH_SHADER, MESH_SHADER_SOURCE)?;
        library.load_from_source(device, BACKGROUND_SHADER, BACKGROUND_SHADER_SOURCE)?;
        Ok(library)
    }

    /// Compile a WGSL source string. Compiler warnings are logged; errors reported
    /// through the compilation info fail the load.
    pub fn load_from_source(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        source: &str,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        debug!("Compiling shader '{name}'");

        let module = device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });

        let compilation = pollster::block_on(module.get_compilation_info());
        let mut errors = Vec::new();
        for message in &compilation.messages {
            match message.message_type {
                wgpu::CompilationMessageType::Error => errors.push(message.message.clone()),
                wgpu::CompilationMessageType::Warning => {
                    warn!("Shader '{name}': {}", message.message)
                }
                wgpu::CompilationMessageType::Info => debug!("Shader '{name}': {}", message.message),
            }
        }
        if !errors.is_empty() {
            return Err(ShaderError::CompilationFailed {
                name: name.to_string(),
                message: errors.join("; "),
            });
        }

        let module = Arc::new(module);
        if self
            .modules
            .insert(name.to_string(), Arc::clone(&module))
            .is_some()
        {
            info!("Replaced shader '{name}'");
        } else {
            info!("Loaded shader '{name}'");
        }
        Ok(module)
    }

    /// Get a previously loaded shader by name.
    pub fn get(&self, name: &str) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| ShaderError::NotLoaded {
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
