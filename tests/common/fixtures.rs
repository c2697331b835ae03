#![allow(dead_code)]

use screen_tagging::aggregate::aggregator::ImageInput;
use screen_tagging::tagging::event_model::{Event, EventType};

/// Image whose bytes are the text `MockOcr::Echo` will "recognize".
pub fn text_image(filename: &str, text: &str) -> ImageInput {
    ImageInput::new(filename, text.as_bytes().to_vec())
}

pub fn event(element: &str, event_type: EventType) -> Event {
    Event {
        element: element.into(),
        event_type,
        trigger: format!("Detected text '{}'", element.to_lowercase()),
        description: format!("Auto-detected by keyword '{}' in OCR text", element.to_lowercase()),
    }
}

pub fn elements(events: &[Event]) -> Vec<&str> {
    events.iter().map(|e| e.element.as_str()).collect()
}

/// Solid-color RGB PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200u8, 120, 40]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Unique path under the system temp dir for files a test writes.
pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("screen-tagging-{}-{}", std::process::id(), name))
}
