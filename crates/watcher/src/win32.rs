//! Win32 endpoint binding
//!
//! Implements the endpoint traits over a hidden top-level window. The
//! window exists purely to receive `WM_DEVICECHANGE`; the window procedure
//! is a thin adapter that bounds the broadcast payload and hands it to the
//! [`Dispatcher`], then always falls through to `DefWindowProcW`.
//!
//! Everything here is thread-affine: the window, its message queue, and the
//! notification subscription belong to the thread that called
//! [`Win32System::create_endpoint`], and `pump_one`/`release` must run on
//! that same thread.

use crate::dispatch::{Dispatch, Dispatcher};
use crate::endpoint::{ClassClaim, EndpointSystem, MessageEndpoint, PumpTick, claim_class};
use crate::error::{Error, Result};
use std::time::Duration;
use windows_sys::Win32::Foundation::{
    GetLastError, HWND, LPARAM, LRESULT, WAIT_FAILED, WAIT_TIMEOUT, WPARAM,
};
use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
use windows_sys::Win32::UI::WindowsAndMessaging::{
    CW_USEDEFAULT, CreateWindowExW, DEVICE_NOTIFY_ALL_INTERFACE_CLASSES,
    DEVICE_NOTIFY_WINDOW_HANDLE, DefWindowProcW, DestroyWindow, DispatchMessageW, GWLP_USERDATA,
    GetWindowLongPtrW, HDEVNOTIFY, MSG, MsgWaitForMultipleObjects, PM_REMOVE, PeekMessageW,
    QS_ALLINPUT, RegisterClassExW, RegisterDeviceNotificationW, SW_HIDE, SetWindowLongPtrW,
    ShowWindow, TranslateMessage, UnregisterClassW, UnregisterDeviceNotification, UpdateWindow,
    WM_QUIT, WNDCLASSEXW, WS_MINIMIZE, WS_OVERLAPPEDWINDOW,
};
use wire::{InterfaceFilter, WM_DEVICECHANGE};

/// The live Win32 message system.
pub struct Win32System;

/// Hidden-window endpoint. One per registration; pinned to its thread.
pub struct Win32Endpoint {
    hwnd: HWND,
    class_name: Vec<u16>,
    hinstance: windows_sys::Win32::Foundation::HINSTANCE,
    // Owned box, reclaimed in release(); the window procedure borrows it
    // through GWLP_USERDATA while the window lives.
    dispatcher: *mut Dispatcher,
    notification: HDEVNOTIFY,
    _claim: ClassClaim,
    released: bool,
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn last_error(what: &str) -> String {
    // SAFETY: no preconditions.
    let code = unsafe { GetLastError() };
    format!("{what} (os error {code})")
}

/// Window procedure adapter.
///
/// Invoked synchronously by the OS for every message delivered to the
/// window. For device-change messages the `lparam` points at a broadcast
/// structure whose first u32 declares its readable extent; that extent
/// bounds the slice handed to the dispatcher, which re-validates every
/// field against it.
unsafe extern "system" fn wndproc(
    hwnd: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    // SAFETY: the user-data slot either holds the dispatcher installed by
    // create_endpoint or is still zero (messages sent during
    // CreateWindowExW arrive before installation).
    let dispatcher = unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *const Dispatcher;
    if !dispatcher.is_null() {
        let payload = if message == WM_DEVICECHANGE && lparam != 0 {
            // SAFETY: for WM_DEVICECHANGE the OS hands a DEV_BROADCAST_HDR
            // valid for the duration of this call; its leading u32 is the
            // number of readable bytes.
            let declared = unsafe { std::ptr::read_unaligned(lparam as *const u32) } as usize;
            Some(unsafe { std::slice::from_raw_parts(lparam as *const u8, declared) })
        } else {
            None
        };
        // SAFETY: the dispatcher outlives the window (reclaimed only after
        // DestroyWindow in release()).
        match unsafe { &*dispatcher }.dispatch(message, wparam, payload) {
            Dispatch::Default => {}
        }
    }
    // SAFETY: plain forward of the original message.
    unsafe { DefWindowProcW(hwnd, message, wparam, lparam) }
}

impl EndpointSystem for Win32System {
    type Endpoint = Win32Endpoint;

    fn create_endpoint(&self, class_name: &str, dispatcher: Dispatcher) -> Result<Win32Endpoint> {
        let claim = claim_class(class_name)?;
        let class_name_w = wide(class_name);
        let window_name_w = wide("usb-arrival");

        // SAFETY: null module handle names the current executable.
        let hinstance = unsafe { GetModuleHandleW(std::ptr::null()) };

        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: 0,
            lpfnWndProc: Some(wndproc),
            cbClsExtra: 0,
            cbWndExtra: 0,
            hInstance: hinstance,
            hIcon: std::ptr::null_mut(),
            hCursor: std::ptr::null_mut(),
            hbrBackground: std::ptr::null_mut(),
            lpszMenuName: std::ptr::null(),
            lpszClassName: class_name_w.as_ptr(),
            hIconSm: std::ptr::null_mut(),
        };
        // SAFETY: wc is fully initialized and class_name_w outlives the call.
        if unsafe { RegisterClassExW(&wc) } == 0 {
            return Err(Error::CreateEndpoint(last_error(
                "RegisterClassExW failed",
            )));
        }

        // SAFETY: the class was registered above; string pointers outlive
        // the call.
        let hwnd = unsafe {
            CreateWindowExW(
                0,
                class_name_w.as_ptr(),
                window_name_w.as_ptr(),
                WS_MINIMIZE | WS_OVERLAPPEDWINDOW,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                100,
                100,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                hinstance,
                std::ptr::null(),
            )
        };
        if hwnd.is_null() {
            // SAFETY: class registered by us and no window uses it.
            unsafe { UnregisterClassW(class_name_w.as_ptr(), hinstance) };
            return Err(Error::CreateEndpoint(last_error("CreateWindowExW failed")));
        }

        let dispatcher = Box::into_raw(Box::new(dispatcher));
        // SAFETY: hwnd is ours; installing the dispatcher before any
        // pumping starts.
        unsafe {
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, dispatcher as isize);
            ShowWindow(hwnd, SW_HIDE);
            UpdateWindow(hwnd);
        }

        Ok(Win32Endpoint {
            hwnd,
            class_name: class_name_w,
            hinstance,
            dispatcher,
            notification: std::ptr::null_mut(),
            _claim: claim,
            released: false,
        })
    }

    fn register_device_notifications(
        &self,
        endpoint: &mut Win32Endpoint,
        filter: &InterfaceFilter,
    ) -> Result<()> {
        let image = filter.encode();
        // SAFETY: the image is a valid DEV_BROADCAST_DEVICEINTERFACE_W; the
        // OS copies it during the call, so the stack buffer suffices.
        let notification = unsafe {
            RegisterDeviceNotificationW(
                endpoint.hwnd,
                image.as_ptr().cast(),
                DEVICE_NOTIFY_WINDOW_HANDLE | DEVICE_NOTIFY_ALL_INTERFACE_CLASSES,
            )
        };
        if notification.is_null() {
            return Err(Error::Subscribe(last_error(
                "RegisterDeviceNotificationW failed",
            )));
        }
        endpoint.notification = notification;
        Ok(())
    }
}

impl MessageEndpoint for Win32Endpoint {
    fn pump_one(&mut self, timeout: Duration) -> Result<PumpTick> {
        let mut msg: MSG = unsafe { std::mem::zeroed() };
        // Drain before waiting: MsgWaitForMultipleObjects only wakes for
        // input that arrived after the queue was last examined, and this
        // method examines the queue every tick. A message queued behind the
        // one just dispatched would otherwise sit until unrelated new input
        // arrived.
        // SAFETY: msg is writable; null hwnd retrieves thread messages too,
        // so a posted WM_QUIT is observed.
        if unsafe { PeekMessageW(&mut msg, std::ptr::null_mut(), 0, 0, PM_REMOVE) } == 0 {
            // SAFETY: zero handles, wait only on the message queue.
            let wait = unsafe {
                MsgWaitForMultipleObjects(
                    0,
                    std::ptr::null(),
                    0,
                    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX),
                    QS_ALLINPUT,
                )
            };
            if wait == WAIT_FAILED {
                return Err(Error::Pump(last_error(
                    "MsgWaitForMultipleObjects failed",
                )));
            }
            if wait == WAIT_TIMEOUT {
                return Ok(PumpTick::Idle);
            }
            // SAFETY: as above.
            if unsafe { PeekMessageW(&mut msg, std::ptr::null_mut(), 0, 0, PM_REMOVE) } == 0 {
                return Ok(PumpTick::Idle);
            }
        }
        if msg.message == WM_QUIT {
            return Ok(PumpTick::Closed);
        }
        // SAFETY: msg was filled by PeekMessageW; DispatchMessageW routes it
        // into wndproc on this same thread.
        unsafe {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        Ok(PumpTick::Dispatched)
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        // SAFETY: all handles were created on this thread and are released
        // in reverse order of acquisition; the dispatcher box is reclaimed
        // only after the window (and thus the wndproc borrow) is gone.
        unsafe {
            if !self.notification.is_null() {
                UnregisterDeviceNotification(self.notification);
                self.notification = std::ptr::null_mut();
            }
            SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, 0);
            DestroyWindow(self.hwnd);
            UnregisterClassW(self.class_name.as_ptr(), self.hinstance);
            drop(Box::from_raw(self.dispatcher));
        }
    }
}

impl Drop for Win32Endpoint {
    fn drop(&mut self) {
        self.release();
    }
}
