use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

use image::imageops::FilterType;
use image::ImageFormat;

use crate::source::error::SourceError;

// ============================================================================
// OcrEngine trait — image bytes in, lowercase text out
// ============================================================================

pub trait OcrEngine {
    fn recognize(&self, image: &[u8]) -> Result<String, SourceError>;

    fn name(&self) -> &str;
}

// ============================================================================
// Tesseract subprocess
// ============================================================================

/// Runs the `tesseract` binary as `tesseract stdin stdout -l <lang>` on the
/// output of `prepare_for_ocr`.
pub struct TesseractOcr {
    pub program: String,
    pub language: String,
}

impl TesseractOcr {
    pub fn new(program: &str, language: &str) -> Self {
        Self {
            program: program.to_string(),
            language: language.to_string(),
        }
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &[u8]) -> Result<String, SourceError> {
        let prepared = prepare_for_ocr(image)?;

        let mut child = Command::new(&self.program)
            .arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SourceError::OcrSpawn {
                program: self.program.clone(),
                source: e,
            })?;

        // Dropping stdin closes the pipe so tesseract sees EOF.
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&prepared).map_err(|e| SourceError::OcrInput {
                program: self.program.clone(),
                source: e,
            })?;
        }

        let output = child.wait_with_output().map_err(|e| SourceError::OcrInput {
            program: self.program.clone(),
            source: e,
        })?;

        if !output.status.success() {
            return Err(SourceError::OcrFailed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_lowercase())
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Upscale factor applied to screenshots before OCR.
pub const OCR_UPSCALE: f64 = 1.5;

/// Decode an image, convert it to 8-bit grayscale, enlarge it by
/// `OCR_UPSCALE` and re-encode it as PNG for tesseract.
pub fn prepare_for_ocr(bytes: &[u8]) -> Result<Vec<u8>, SourceError> {
    if bytes.is_empty() {
        return Err(SourceError::UnreadableImage("image is empty".into()));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| SourceError::UnreadableImage(e.to_string()))?;
    let gray = decoded.grayscale();

    let width = ((gray.width() as f64 * OCR_UPSCALE) as u32).max(1);
    let height = ((gray.height() as f64 * OCR_UPSCALE) as u32).max(1);
    let enlarged = gray.resize_exact(width, height, FilterType::CatmullRom);

    let mut out = Cursor::new(Vec::new());
    enlarged
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| SourceError::UnreadableImage(e.to_string()))?;
    Ok(out.into_inner())
}

// ============================================================================
// Mock OCR (for testing without tesseract)
// ============================================================================

pub enum MockOcr {
    /// Treat the image bytes themselves as the recognized text.
    Echo,
    /// Return the same text for every image.
    Fixed(String),
    /// Fail every image with the given message.
    Failing(String),
}

impl OcrEngine for MockOcr {
    fn recognize(&self, image: &[u8]) -> Result<String, SourceError> {
        match self {
            MockOcr::Echo => Ok(String::from_utf8_lossy(image).to_lowercase()),
            MockOcr::Fixed(text) => Ok(text.to_lowercase()),
            MockOcr::Failing(msg) => Err(SourceError::UnreadableImage(msg.clone())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
