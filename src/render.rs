//! Slide rendering for HTML and the terminal.
//!
//! Captions are markdown.  They are rendered to HTML with raw HTML escaped and
//! script-bearing links neutralized, so a caption can never inject markup into
//! the slideshow page.

use std::io::{self, Stdout, Write};
use std::path::Path;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

use crate::aggregator::SlideSink;
use crate::types::Slide;
use crate::{Error, Result};

/// ANSI escape code for bold text (used for slide headers).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for image details).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for cyan text (used for status lines).
const ANSI_CYAN: &str = "\x1b[36m";

///////////////////////////////////////////// HTML /////////////////////////////////////////////

/// Render a markdown caption to an HTML fragment.
pub fn render_caption(markdown: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_url(&dest_url) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_url(&dest_url) => Event::Start(Tag::Image {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        other => other,
    });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn is_safe_url(url: &str) -> bool {
    let lowered = url.trim_start().to_ascii_lowercase();
    !(lowered.starts_with("javascript:")
        || lowered.starts_with("vbscript:")
        || lowered.starts_with("data:"))
}

/// Escape text for use inside a double-quoted attribute or element body.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing to a String cannot fail.
    let _ = pulldown_cmark_escape::escape_html(&mut out, text);
    out
}

/// Render one slide: the image, then the caption.
pub fn render_slide(slide: &Slide) -> String {
    format!(
        "<div class=\"slide\"><img src=\"{}\" alt=\"\"><div class=\"caption\">{}</div></div>",
        escape_html(&slide.image.data_uri()),
        render_caption(&slide.caption),
    )
}

const DOCUMENT_STYLE: &str = "
body { font-family: system-ui, sans-serif; margin: 0; padding: 2rem; background: #fafafa; }
h1 { font-size: 1.25rem; font-weight: 500; }
#slideshow { display: flex; gap: 1.5rem; overflow-x: auto; scroll-snap-type: x mandatory; padding-bottom: 1rem; }
#slideshow[hidden] { display: none; }
.slide { flex: 0 0 min(80vw, 420px); scroll-snap-align: center; background: white; border-radius: 12px; box-shadow: 0 1px 4px rgba(0,0,0,.15); padding: 1rem; }
.slide img { width: 100%; height: auto; display: block; }
.caption { font-size: 1.1rem; line-height: 1.5; }
";

/// The slideshow container.
///
/// Starts empty and hidden.  Appending a slide makes it visible; clearing it
/// hides it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slideshow {
    fragments: Vec<String>,
    hidden: bool,
}

impl Slideshow {
    /// An empty, hidden slideshow.
    pub fn new() -> Self {
        Self {
            fragments: Vec::new(),
            hidden: true,
        }
    }

    /// Render a slide and append it to the end of the deck.
    pub fn append(&mut self, slide: &Slide) {
        self.fragments.push(render_slide(slide));
        self.hidden = false;
    }

    /// Remove every slide and hide the container.
    pub fn clear(&mut self) {
        self.fragments.clear();
        self.hidden = true;
    }

    /// Whether the container is hidden.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Number of slides in the deck.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// True if the deck holds no slides.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// The rendered slide fragments, in order.
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// A standalone HTML page showing the deck.
    pub fn to_html_document(&self, title: &str) -> String {
        let mut doc = String::new();
        doc.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        doc.push_str(&format!("<title>{}</title>\n", escape_html(title)));
        doc.push_str(&format!("<style>{DOCUMENT_STYLE}</style>\n</head>\n<body>\n"));
        doc.push_str(&format!("<h1>{}</h1>\n", escape_html(title)));
        if self.hidden {
            doc.push_str("<div id=\"slideshow\" hidden>\n");
        } else {
            doc.push_str("<div id=\"slideshow\">\n");
        }
        for fragment in &self.fragments {
            doc.push_str(fragment);
            doc.push('\n');
        }
        doc.push_str("</div>\n</body>\n</html>\n");
        doc
    }

    /// Write the deck as an HTML page, creating parent directories as needed.
    pub fn write_to<P: AsRef<Path>>(&self, path: P, title: &str) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| Error::io("failed to create slideshow directory", err))?;
        }
        std::fs::write(path, self.to_html_document(title))
            .map_err(|err| Error::io(format!("failed to write {}", path.display()), err))
    }
}

impl Default for Slideshow {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideSink for Slideshow {
    fn accept(&mut self, slide: Slide) {
        self.append(&slide);
    }
}

/////////////////////////////////////////// Terminal ///////////////////////////////////////////

/// Trait for rendering generation progress to the user.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Silent capture in tests
pub trait Renderer: Send {
    /// Called when a generation starts.
    fn start_generation(&mut self, topic: &str) {
        _ = topic;
    }

    /// Print a slide as soon as it is paired.  `index` counts from 1.
    fn print_slide(&mut self, index: usize, slide: &Slide);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when a generation settles, successfully or not.
    fn finish_generation(&mut self, slides: usize) {
        _ = slides;
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn start_generation(&mut self, topic: &str) {
        let line = self.styled(ANSI_CYAN, &format!("Generating slides for: {topic}"));
        println!("{line}");
        self.flush();
    }

    fn print_slide(&mut self, index: usize, slide: &Slide) {
        let header = self.styled(ANSI_BOLD, &format!("[slide {index}]"));
        let detail = self.styled(
            ANSI_DIM,
            &format!(
                "({}, {} bytes)",
                slide.image.mime_type,
                slide.image.bytes.len()
            ),
        );
        println!("\n{header} {detail}");
        let caption = slide.caption.trim();
        if !caption.is_empty() {
            println!("{caption}");
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        let line = self.styled(ANSI_RED, &format!("Error: {error}"));
        eprintln!("\n{line}");
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
        self.flush();
    }

    fn finish_generation(&mut self, slides: usize) {
        let noun = if slides == 1 { "slide" } else { "slides" };
        let line = self.styled(ANSI_DIM, &format!("{slides} {noun}"));
        println!("\n{line}");
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SlideImage;

    fn slide(caption: &str) -> Slide {
        Slide::new(caption, SlideImage::new("image/png", b"Hello World".to_vec()))
    }

    #[test]
    fn caption_renders_markdown() {
        let html = render_caption("Cats are **fluffy**.\n\n- naps\n- purrs\n");
        assert!(html.contains("<strong>fluffy</strong>"));
        assert!(html.contains("<li>naps</li>"));
        assert!(html.contains("<ul>"));
    }

    #[test]
    fn caption_escapes_raw_html() {
        let html = render_caption("hi <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn caption_neutralizes_script_links() {
        let html = render_caption("[click](javascript:alert(1)) and [ok](https://example.com)");
        assert!(!html.contains("javascript:"));
        assert!(html.contains("href=\"#\""));
        assert!(html.contains("href=\"https://example.com\""));
    }

    #[test]
    fn escape_html_covers_attribute_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn slide_puts_image_before_caption() {
        let html = render_slide(&slide("*hello*"));
        let img = html.find("<img src=\"data:image/png;base64,SGVsbG8gV29ybGQ=\"").unwrap();
        let caption = html.find("<em>hello</em>").unwrap();
        assert!(img < caption);
    }

    #[test]
    fn slideshow_visibility_follows_content() {
        assert_eq!(Slideshow::default(), Slideshow::new());
        assert!(Slideshow::default().is_hidden());

        let mut deck = Slideshow::new();
        assert!(deck.is_hidden());
        assert!(deck.is_empty());

        deck.append(&slide("one"));
        deck.accept(slide("two"));
        assert!(!deck.is_hidden());
        assert_eq!(deck.len(), 2);
        assert!(deck.fragments()[1].contains("two"));

        deck.clear();
        assert!(deck.is_hidden());
        assert!(deck.is_empty());
    }

    #[test]
    fn document_wraps_fragments() {
        let mut deck = Slideshow::new();
        let doc = deck.to_html_document("Tides & <moons>");
        assert!(doc.contains("<title>Tides &amp; &lt;moons&gt;</title>"));
        assert!(doc.contains("<div id=\"slideshow\" hidden>"));

        deck.append(&slide("one"));
        let doc = deck.to_html_document("Tides");
        assert!(doc.contains("<div id=\"slideshow\">"));
        assert!(doc.contains("<div class=\"slide\">"));
    }

    #[test]
    fn write_to_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decks").join("tides.html");
        let mut deck = Slideshow::new();
        deck.append(&slide("one"));
        deck.write_to(&path, "Tides").unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
        assert_eq!(renderer.styled(ANSI_RED, "x"), "x");
        let renderer = PlainTextRenderer::new();
        assert_eq!(renderer.styled(ANSI_RED, "x"), "\x1b[31mx\x1b[0m");
    }
}
