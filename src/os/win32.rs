use windows::{
    core::*, Win32::Foundation::*, Win32::Graphics::Gdi::ValidateRect,
    Win32::System::LibraryLoader::*, Win32::UI::Controls::*, Win32::UI::HiDpi::*,
    Win32::UI::Input::KeyboardAndMouse::*, Win32::UI::WindowsAndMessaging::*,
};

use super::{Key, MouseButton, Point, Rect, WindowStyleFlags};

/// Owns the registered window class and the message pump; input state gathered
/// by the wndproc is polled through this.
pub struct App {
    window_class: String,
    hinstance: HINSTANCE,
}

pub struct Window {
    info: super::WindowInfo,
    client: Rect<i32>,
    hwnd: HWND,
}

struct ProcData {
    mouse_hwnd: HWND,
    mouse_tracked: bool,
    mouse_pos: Point<i32>,
    mouse_delta: Point<i32>,
    mouse_down: [bool; 5],
    mouse_wheel: f32,
    key_down: [bool; 256],
    key_press: [bool; 256],
}

static mut PROC_DATA: ProcData = ProcData {
    mouse_hwnd: HWND(std::ptr::null_mut()),
    mouse_tracked: false,
    mouse_pos: Point { x: 0, y: 0 },
    mouse_delta: Point { x: 0, y: 0 },
    mouse_down: [false; 5],
    mouse_wheel: 0.0,
    key_down: [false; 256],
    key_press: [false; 256],
};

fn vk_for_key(key: Key) -> usize {
    match key {
        Key::Num1 => 0x31,
        Key::Num2 => 0x32,
        Key::Num3 => 0x33,
        Key::Num4 => 0x34,
        Key::Num5 => 0x35,
        Key::W => 0x57,
        Key::S => 0x53,
        Key::Minus => VK_OEM_MINUS.0 as usize,
        Key::Equals => VK_OEM_PLUS.0 as usize,
        Key::Escape => VK_ESCAPE.0 as usize,
    }
}

impl App {
    pub fn create(info: super::AppInfo) -> Self {
        unsafe {
            if info.dpi_aware {
                let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
            }

            let window_class = info.name + "\0";
            let instance = GetModuleHandleA(None).expect("dx12_samples::os::win32: GetModuleHandleA failed");

            let wc = WNDCLASSA {
                hCursor: LoadCursorW(None, IDC_ARROW).unwrap(),
                hInstance: instance.into(),
                lpszClassName: PCSTR(window_class.as_ptr()),
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(wndproc),
                ..Default::default()
            };

            if RegisterClassA(&wc) == 0 {
                panic!("dx12_samples::os::win32: class already registered!");
            }

            App {
                window_class,
                hinstance: instance.into(),
            }
        }
    }

    pub fn create_window(&self, info: super::WindowInfo) -> Window {
        unsafe {
            let mut style = WS_OVERLAPPEDWINDOW;
            if info.style.contains(WindowStyleFlags::NO_RESIZE) {
                style &= !WS_SIZEBOX;
            }
            if info.style.contains(WindowStyleFlags::VISIBLE) {
                style |= WS_VISIBLE;
            }

            // adjust so the client area matches the requested rect
            let mut adjusted = RECT {
                left: 0,
                top: 0,
                right: info.rect.width,
                bottom: info.rect.height,
            };
            let _ = AdjustWindowRect(&mut adjusted, style, false);

            let title = info.title.clone() + "\0";
            let hwnd = CreateWindowExA(
                WINDOW_EX_STYLE::default(),
                PCSTR(self.window_class.as_ptr()),
                PCSTR(title.as_ptr()),
                style,
                info.rect.x,
                info.rect.y,
                adjusted.right - adjusted.left,
                adjusted.bottom - adjusted.top,
                None,
                None,
                Some(self.hinstance),
                None,
            )
            .expect("dx12_samples::os::win32: CreateWindowExA failed");

            let client = Rect {
                x: 0,
                y: 0,
                width: info.rect.width,
                height: info.rect.height,
            };
            Window { info, client, hwnd }
        }
    }

    /// Pumps pending messages, returns false once the app should quit.
    /// Per frame input state (deltas, wheel, key presses) resets on entry.
    pub fn run(&self) -> bool {
        unsafe {
            PROC_DATA.mouse_delta = Point { x: 0, y: 0 };
            PROC_DATA.mouse_wheel = 0.0;
            for i in 0..256 {
                PROC_DATA.key_press[i] = false;
            }

            let mut msg = MSG::default();
            let mut quit = false;
            loop {
                if PeekMessageA(&mut msg, None, 0, 0, PM_REMOVE).into() {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageA(&msg);
                    if msg.message == WM_QUIT {
                        quit = true;
                        break;
                    }
                } else {
                    break;
                }
            }
            !quit
        }
    }

    pub fn is_mouse_down(&self, button: MouseButton) -> bool {
        unsafe { PROC_DATA.mouse_down[button as usize] }
    }

    pub fn get_mouse_pos(&self) -> Point<i32> {
        unsafe { PROC_DATA.mouse_pos }
    }

    /// Mouse movement accumulated since the last `run` call.
    pub fn get_mouse_delta(&self) -> Point<i32> {
        unsafe { PROC_DATA.mouse_delta }
    }

    pub fn get_mouse_wheel(&self) -> f32 {
        unsafe { PROC_DATA.mouse_wheel }
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        unsafe { PROC_DATA.key_down[vk_for_key(key)] }
    }

    /// True only on the frame the key transitioned to down.
    pub fn is_key_pressed(&self, key: Key) -> bool {
        unsafe { PROC_DATA.key_press[vk_for_key(key)] }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        unsafe {
            let _ = UnregisterClassA(PCSTR(self.window_class.as_ptr()), Some(self.hinstance));
        }
    }
}

impl Window {
    pub fn get_native_handle(&self) -> HWND {
        self.hwnd
    }

    /// Refreshes the cached window and client rects from the OS.
    pub fn update(&mut self) {
        unsafe {
            let mut win_rect = RECT::default();
            let _ = GetWindowRect(self.hwnd, &mut win_rect);
            self.info.rect.x = win_rect.left;
            self.info.rect.y = win_rect.top;
            self.info.rect.width = win_rect.right - win_rect.left;
            self.info.rect.height = win_rect.bottom - win_rect.top;

            let mut client_rect = RECT::default();
            let _ = GetClientRect(self.hwnd, &mut client_rect);
            self.client.width = client_rect.right - client_rect.left;
            self.client.height = client_rect.bottom - client_rect.top;
        }
    }

    pub fn get_rect(&self) -> Rect<i32> {
        self.info.rect
    }

    /// Client area rect with a zero origin, the drawable size for swap chains and viewports.
    pub fn get_viewport_rect(&self) -> Rect<i32> {
        self.client
    }

    pub fn get_size(&self) -> (i32, i32) {
        (self.client.width, self.client.height)
    }

    pub fn set_title(&self, title: &str) {
        unsafe {
            let title = String::from(title) + "\0";
            let _ = SetWindowTextA(self.hwnd, PCSTR(title.as_ptr()));
        }
    }

    pub fn close(&mut self) {
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

fn set_capture(window: HWND) {
    unsafe {
        let mut any_down = false;
        for i in 0..5 {
            any_down |= PROC_DATA.mouse_down[i];
        }
        if !any_down && GetCapture() == HWND::default() {
            SetCapture(window);
        }
    }
}

fn release_capture(window: HWND) {
    unsafe {
        let mut any_down = false;
        for i in 0..5 {
            any_down |= PROC_DATA.mouse_down[i];
        }
        if !any_down && GetCapture() == window {
            let _ = ReleaseCapture();
        }
    }
}

extern "system" fn wndproc(window: HWND, message: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe {
        match message {
            WM_MOUSEMOVE => {
                PROC_DATA.mouse_hwnd = window;
                if !PROC_DATA.mouse_tracked {
                    // TrackMouseEvent is required in order to receive WM_MOUSELEAVE
                    let _ = TrackMouseEvent(&mut TRACKMOUSEEVENT {
                        cbSize: std::mem::size_of::<TRACKMOUSEEVENT>() as u32,
                        dwFlags: TME_LEAVE,
                        hwndTrack: window,
                        dwHoverTime: 0,
                    });
                    PROC_DATA.mouse_tracked = true;
                }
                let x = (lparam.0 & 0xffff) as i16 as i32;
                let y = ((lparam.0 >> 16) & 0xffff) as i16 as i32;
                PROC_DATA.mouse_delta.x += x - PROC_DATA.mouse_pos.x;
                PROC_DATA.mouse_delta.y += y - PROC_DATA.mouse_pos.y;
                PROC_DATA.mouse_pos = Point { x, y };
                LRESULT(0)
            }
            WM_MOUSELEAVE => {
                PROC_DATA.mouse_hwnd = HWND::default();
                PROC_DATA.mouse_tracked = false;
                LRESULT(0)
            }
            WM_LBUTTONDOWN | WM_LBUTTONDBLCLK => {
                set_capture(window);
                PROC_DATA.mouse_down[0] = true;
                LRESULT(0)
            }
            WM_RBUTTONDOWN | WM_RBUTTONDBLCLK => {
                set_capture(window);
                PROC_DATA.mouse_down[1] = true;
                LRESULT(0)
            }
            WM_MBUTTONDOWN | WM_MBUTTONDBLCLK => {
                set_capture(window);
                PROC_DATA.mouse_down[2] = true;
                LRESULT(0)
            }
            WM_LBUTTONUP => {
                PROC_DATA.mouse_down[0] = false;
                release_capture(window);
                LRESULT(0)
            }
            WM_RBUTTONUP => {
                PROC_DATA.mouse_down[1] = false;
                release_capture(window);
                LRESULT(0)
            }
            WM_MBUTTONUP => {
                PROC_DATA.mouse_down[2] = false;
                release_capture(window);
                LRESULT(0)
            }
            WM_MOUSEWHEEL => {
                let delta = ((wparam.0 >> 16) & 0xffff) as i16;
                PROC_DATA.mouse_wheel += delta as f32 / WHEEL_DELTA as f32;
                LRESULT(0)
            }
            WM_KEYDOWN | WM_SYSKEYDOWN => {
                let vk = wparam.0 & 0xff;
                // bit 30 of lparam is the previous key state, skip auto-repeat
                if lparam.0 & (1 << 30) == 0 {
                    PROC_DATA.key_press[vk] = true;
                }
                PROC_DATA.key_down[vk] = true;
                LRESULT(0)
            }
            WM_KEYUP | WM_SYSKEYUP => {
                let vk = wparam.0 & 0xff;
                PROC_DATA.key_down[vk] = false;
                LRESULT(0)
            }
            WM_PAINT => {
                let _ = ValidateRect(Some(window), None);
                LRESULT(0)
            }
            WM_DESTROY => {
                PostQuitMessage(0);
                LRESULT(0)
            }
            _ => DefWindowProcA(window, message, wparam, lparam),
        }
    }
}
