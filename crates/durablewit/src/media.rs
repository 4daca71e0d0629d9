//! Image format detection from file content
//!
//! The format decides the object key suffix and the `Content-Type` the object
//! is served with. It is read from the leading bytes of the file, never from
//! the cached filename, because gifwit's cache names are not reliable.

/// Number of leading bytes a sniffer gets to look at.
pub const SNIFF_LEN: usize = 16;

/// Content type used when nothing matches.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Gif,
    Png,
    Jpeg,
    Webp,
    Bmp,
}

impl ImageFormat {
    /// Short tag used as the object key suffix
    pub fn tag(self) -> &'static str {
        match self {
            ImageFormat::Gif => "gif",
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
            ImageFormat::Bmp => "bmp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Gif => "image/gif",
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Bmp => "image/bmp",
        }
    }

    /// Match the magic number at the start of `head`
    pub fn from_magic(head: &[u8]) -> Option<Self> {
        if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if head.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageFormat::Png)
        } else if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if head.len() >= 12 && &head[..4] == b"RIFF" && &head[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else if head.starts_with(b"BM") && head.len() >= 14 {
            Some(ImageFormat::Bmp)
        } else {
            None
        }
    }
}

/// Detects an image format from a file's leading bytes
pub trait FormatSniffer: Send + Sync {
    fn detect(&self, head: &[u8]) -> Option<ImageFormat>;
}

/// Magic-number sniffer for the formats gifwit can cache
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicSniffer;

impl FormatSniffer for MagicSniffer {
    fn detect(&self, head: &[u8]) -> Option<ImageFormat> {
        ImageFormat::from_magic(head)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_gif_variants() {
        assert_eq!(MagicSniffer.detect(b"GIF89a\x01\x00\x01\x00"), Some(ImageFormat::Gif));
        assert_eq!(MagicSniffer.detect(b"GIF87a\x01\x00\x01\x00"), Some(ImageFormat::Gif));
    }

    #[test]
    fn test_detects_png_and_jpeg() {
        let png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";
        assert_eq!(MagicSniffer.detect(png), Some(ImageFormat::Png));

        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
        assert_eq!(MagicSniffer.detect(&jpeg), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_detects_webp() {
        let webp = b"RIFF\x24\x00\x00\x00WEBPVP8 ";
        assert_eq!(MagicSniffer.detect(webp), Some(ImageFormat::Webp));

        // RIFF container that is not WebP
        assert_eq!(MagicSniffer.detect(b"RIFF\x24\x00\x00\x00WAVEfmt "), None);
    }

    #[test]
    fn test_unknown_and_short_input() {
        assert_eq!(MagicSniffer.detect(b"plain text, not an image"), None);
        assert_eq!(MagicSniffer.detect(b""), None);
        assert_eq!(MagicSniffer.detect(b"GIF8"), None);
        assert_eq!(MagicSniffer.detect(b"BM"), None);
    }

    #[test]
    fn test_tags_and_mime_types() {
        assert_eq!(ImageFormat::Gif.tag(), "gif");
        assert_eq!(ImageFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageFormat::Webp.mime_type(), "image/webp");
    }
}
