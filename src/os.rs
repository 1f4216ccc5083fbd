use serde::{Deserialize, Serialize};

/// Implements this interface for the windows win32 platform
#[cfg(target_os = "windows")]
pub mod win32;

/// Generic rect with position and size.
#[derive(Copy, Clone, Serialize, Deserialize)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

/// Generic 2d point.
#[derive(Copy, Clone)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

bitflags! {
    /// Window style flags, forwarded to the native window on creation.
    pub struct WindowStyleFlags: u32 {
        const NONE = 0;
        const VISIBLE = 1 << 0;
        const NO_RESIZE = 1 << 1;
    }
}

/// Information to create an application instance (window class).
pub struct AppInfo {
    /// name of the app, also used as the window class name
    pub name: String,
    /// signify if the app is DPI aware or not
    pub dpi_aware: bool,
}

/// Information to create a window.
pub struct WindowInfo {
    pub title: String,
    pub rect: Rect<i32>,
    pub style: WindowStyleFlags,
}

impl Default for WindowInfo {
    fn default() -> Self {
        WindowInfo {
            title: String::from("dx12-samples"),
            rect: Rect {
                x: 100,
                y: 100,
                width: 1280,
                height: 720,
            },
            style: WindowStyleFlags::VISIBLE,
        }
    }
}

/// Mouse buttons tracked by the message pump.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum MouseButton {
    Left = 0,
    Right = 1,
    Middle = 2,
}

/// Keys the samples poll for; mapped onto virtual key codes by the platform layer.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum Key {
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    W,
    S,
    Minus,
    Equals,
    Escape,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_info_defaults() {
        let info = WindowInfo::default();
        assert_eq!(info.rect.width, 1280);
        assert_eq!(info.rect.height, 720);
        assert!(info.style.contains(WindowStyleFlags::VISIBLE));
    }

    #[test]
    fn style_flags_compose() {
        let style = WindowStyleFlags::VISIBLE | WindowStyleFlags::NO_RESIZE;
        assert!(style.contains(WindowStyleFlags::NO_RESIZE));
        assert!(!WindowStyleFlags::NONE.contains(WindowStyleFlags::VISIBLE));
    }
}
