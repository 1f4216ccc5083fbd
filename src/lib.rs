/// Operating system module; window creation, message pump and input state.
pub mod os;

/// Graphics module; the shared d3d12 device, descriptor, upload and frame pacing layer.
#[cfg(target_os = "windows")]
pub mod gfx;

/// Orbit camera and projection matrix helpers.
pub mod camera;

/// Procedural geometry for the samples.
pub mod primitives;

/// Image reading/writing support for (png, jpg, bmp, tga, dds).
pub mod image;

/// Use bitmask for flags
#[macro_use]
extern crate bitflags;

use serde::{Deserialize, Serialize};

/// Generic error for modules to return with a message describing the failing call.
pub struct Error {
    pub msg: String,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.msg)
    }
}

// conversion for windows-rs win32 errors
#[cfg(target_os = "windows")]
impl From<windows::core::Error> for Error {
    fn from(err: windows::core::Error) -> Error {
        Error {
            msg: err.message().to_string(),
        }
    }
}

// std errors
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error {
            msg: err.to_string(),
        }
    }
}

impl From<ddsfile::Error> for Error {
    fn from(err: ddsfile::Error) -> Error {
        Error {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error {
            msg: err.to_string(),
        }
    }
}

/// Launch settings shared by all samples, overridable from `config.user.json`
/// in the crate root. Missing file means defaults.
#[derive(Serialize, Deserialize, Clone)]
pub struct SampleConfig {
    /// window rect {pos_x, pos_y, width, height}
    pub window_rect: os::Rect<i32>,
    /// optional substring matched against gpu adapter names, None takes the primary adapter
    pub adapter_name: Option<String>,
    /// present sync interval, 0 disables vsync
    pub vsync: u32,
    /// number of buffers in the swap chain (2 for double buffered, 3 for triple etc)
    pub num_buffers: u32,
    /// size of the device heap for shader resources (textures, buffers, etc)
    pub shader_heap_size: usize,
    /// size of the device heap for render targets
    pub render_target_heap_size: usize,
    /// size of the device heap for depth stencil targets
    pub depth_stencil_heap_size: usize,
}

impl Default for SampleConfig {
    fn default() -> Self {
        SampleConfig {
            window_rect: os::Rect {
                x: 100,
                y: 100,
                width: 1280,
                height: 720,
            },
            adapter_name: None,
            vsync: 1,
            num_buffers: 2,
            shader_heap_size: 64,
            render_target_heap_size: 32,
            depth_stencil_heap_size: 16,
        }
    }
}

impl SampleConfig {
    /// Reads the user config if one exists, otherwise returns defaults.
    pub fn load() -> SampleConfig {
        let config_path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config.user.json");
        if config_path.exists() {
            if let Ok(data) = std::fs::read(&config_path) {
                match serde_json::from_slice(&data) {
                    Ok(config) => return config,
                    Err(e) => println!("dx12_samples:: malformed config.user.json: {}", e),
                }
            }
        }
        SampleConfig::default()
    }
}

/// Returns an absolute path for an asset inside the crate `data` directory.
pub fn get_data_path(asset: &str) -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join(asset);
    String::from(path.to_str().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SampleConfig::default();
        assert_eq!(config.num_buffers, 2);
        assert_eq!(config.window_rect.width, 1280);
        assert!(config.adapter_name.is_none());
    }

    #[test]
    fn config_round_trip() {
        let mut config = SampleConfig::default();
        config.adapter_name = Some(String::from("NVIDIA"));
        config.vsync = 0;
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SampleConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.adapter_name.as_deref(), Some("NVIDIA"));
        assert_eq!(parsed.vsync, 0);
        assert_eq!(parsed.window_rect.x, config.window_rect.x);
    }

    #[test]
    fn data_path_contains_asset() {
        let path = get_data_path("shaders/default.hlsl");
        assert!(path.ends_with("default.hlsl"));
        assert!(path.contains("data"));
    }
}
