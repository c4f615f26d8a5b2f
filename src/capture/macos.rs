// capture/macos.rs - macOS Window Capture Implementation
//
// Captures a single window by id with CGWindowListCreateImage. The call is
// synchronous and thread-safe; the scheduler runs it on a blocking worker and hands
// the pixels back to the controller's thread.

use super::{CaptureFrame, SourceWindow, WindowCapturer};
use crate::error::CaptureError;
use core_graphics::geometry::{CGPoint, CGRect, CGSize};
use core_graphics::image::CGImage;
use foreign_types_shared::ForeignType;
use log::info;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    static CGRectNull: CGRect;

    fn CGPreflightScreenCaptureAccess() -> bool;
    fn CGWindowListCreateImage(
        screenBounds: CGRect,
        listOption: u32,
        windowID: u32,
        imageOption: u32,
    ) -> *mut core_graphics::sys::CGImage;
}

// CGWindowListOption values
#[allow(non_upper_case_globals)]
const kCGWindowListOptionIncludingWindow: u32 = 1 << 3;

// CGWindowImageOption values
#[allow(non_upper_case_globals)]
const kCGWindowImageBoundsIgnoreFraming: u32 = 1 << 0;
#[allow(non_upper_case_globals)]
const kCGWindowImageShouldBeOpaque: u32 = 1 << 1;

/// macOS window capturer using CoreGraphics
pub struct MacOSWindowCapturer {
    has_permission: bool,
}

impl MacOSWindowCapturer {
    pub fn new() -> anyhow::Result<Self> {
        let has_permission = unsafe { CGPreflightScreenCaptureAccess() };
        if has_permission {
            info!("Screen Recording permission granted, using CGWindowListCreateImage");
        } else {
            // Not fatal: every tick reports CaptureUnavailable until permission is granted
            // and the process restarts.
            log::warn!(
                "Screen Recording permission is not granted. Enable it in System Settings > Privacy & Security > Screen Recording, then restart."
            );
        }
        Ok(Self { has_permission })
    }
}

impl WindowCapturer for MacOSWindowCapturer {
    fn capture(&self, window: &SourceWindow) -> Result<CaptureFrame, CaptureError> {
        if !self.has_permission {
            return Err(CaptureError::unavailable(
                "Screen Recording permission is not granted",
            ));
        }

        capture_window_rgba(window.id)
    }

    fn name(&self) -> &'static str {
        "CGWindowListCreateImage"
    }
}

fn capture_window_rgba(window_id: u32) -> Result<CaptureFrame, CaptureError> {
    let image_ptr = unsafe {
        CGWindowListCreateImage(
            CGRectNull,
            kCGWindowListOptionIncludingWindow,
            window_id,
            kCGWindowImageBoundsIgnoreFraming | kCGWindowImageShouldBeOpaque,
        )
    };

    if image_ptr.is_null() {
        return Err(CaptureError::unavailable(format!(
            "CGWindowListCreateImage returned NULL for window {}",
            window_id
        )));
    }

    // Take ownership of the image (create rule)
    let image: CGImage = unsafe { CGImage::from_ptr(image_ptr) };

    let width = image.width();
    let height = image.height();
    if width == 0 || height == 0 {
        // Minimized or transiently off-screen windows produce empty images
        return Err(CaptureError::unavailable(format!(
            "window {} produced an empty image",
            window_id
        )));
    }

    let bytes_per_row = width * 4;
    let mut pixel_data = vec![0u8; bytes_per_row * height];
    let color_space = core_graphics::color_space::CGColorSpace::create_device_rgb();
    let context = core_graphics::context::CGContext::create_bitmap_context(
        Some(pixel_data.as_mut_ptr() as *mut _),
        width,
        height,
        8,
        bytes_per_row,
        &color_space,
        core_graphics::base::kCGImageAlphaPremultipliedLast,
    );

    context.draw_image(
        CGRect {
            origin: CGPoint { x: 0.0, y: 0.0 },
            size: CGSize {
                width: width as f64,
                height: height as f64,
            },
        },
        &image,
    );
    drop(context);

    Ok(CaptureFrame::from_rgba(
        window_id,
        width as u32,
        height as u32,
        pixel_data,
    ))
}
