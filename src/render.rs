// ABOUTME: Markdown to Canvas rich-content translation
// ABOUTME: Applies optional style header/footer, expands emoji, and collects local images

use crate::html::{self, is_remote_src};
use crate::model::RemoteFile;
use crate::Result;
use pulldown_cmark::{Options, Parser};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Token in style header/footer markdown replaced by the style directory.
pub const STYLE_PLACEHOLDER: &str = "$PATHTOMD2CANVASSTYLEFILE";

/// A local image referenced by a rendered body.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub local_path: PathBuf,
    /// Set once the image has been published.
    pub remote: Option<RemoteFile>,
}

/// Rendered body plus its local images, keyed by the `src` string as it
/// appears in `html`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub html: String,
    pub images: BTreeMap<String, ImageRef>,
}

pub fn render(source: &Path, style: Option<&Path>) -> Result<Rendered> {
    let body = fs::read_to_string(source)?;
    let root = source.parent().unwrap_or_else(|| Path::new(""));

    let html = match style {
        Some(style_dir) => {
            let markdown = apply_style_markdown(&body, style_dir)?;
            let translated = markdown_to_html(&markdown, root)?;
            apply_style_html(&translated, style_dir)?
        }
        None => markdown_to_html(&body, root)?,
    };

    let images = collect_local_images(&html)?;
    tracing::debug!(source = %source.display(), images = images.len(), "rendered document");

    Ok(Rendered { html, images })
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

/// Wrap markdown with the style's `header.md` / `footer.md`.
fn apply_style_markdown(body: &str, style_dir: &Path) -> Result<String> {
    let header = fs::read_to_string(style_dir.join("header.md"))?;
    let footer = fs::read_to_string(style_dir.join("footer.md"))?;

    let style_path = absolutize(style_dir)?;
    let contents = format!("{}\n{}\n{}", header, body, footer);
    Ok(contents.replace(STYLE_PLACEHOLDER, &style_path.to_string_lossy()))
}

/// Wrap translated html with the style's `header.html` / `footer.html`.
fn apply_style_html(translated: &str, style_dir: &Path) -> Result<String> {
    let header = fs::read_to_string(style_dir.join("header.html"))?;
    let footer = fs::read_to_string(style_dir.join("footer.html"))?;
    Ok(format!("{}\n{}\n{}", header, translated, footer))
}

fn shortcode_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":([A-Za-z0-9_+\-]+):").unwrap())
}

/// Emoji whose CLDR name matches `code` with spaces written as underscores,
/// e.g. `thumbs_up`.
fn emoji_by_cldr_name(code: &str) -> Option<&'static emojis::Emoji> {
    emojis::iter().find(|emoji| emoji.name().replace(' ', "_").eq_ignore_ascii_case(code))
}

/// Expand `:shortcode:` emoji, by GitHub shortcode or CLDR name; unknown
/// codes are left alone.
pub fn emojize(text: &str) -> String {
    shortcode_re()
        .replace_all(text, |caps: &Captures| {
            match emojis::get_by_shortcode(&caps[1]).or_else(|| emoji_by_cldr_name(&caps[1])) {
                Some(emoji) => emoji.as_str().to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Convert markdown to html, pointing relative image sources at `root`.
pub fn markdown_to_html(markdown: &str, root: &Path) -> Result<String> {
    let emojified = emojize(markdown);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(&emojified, options);
    let mut out = String::with_capacity(emojified.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut out, parser);

    html::rewrite_images(&out, |tag| {
        let src = match tag.src() {
            Some(src) if !is_remote_src(src) => src.to_string(),
            _ => return Ok(false),
        };
        // markdown image urls come out percent-encoded
        let decoded = urlencoding::decode(&src)
            .map(|s| s.into_owned())
            .unwrap_or(src);
        tag.set("src", root.join(decoded).to_string_lossy());
        Ok(true)
    })
}

/// Map every local image `src` in `html` to the file it names.
pub fn collect_local_images(html: &str) -> Result<BTreeMap<String, ImageRef>> {
    let mut images = BTreeMap::new();
    for src in html::local_image_sources(html) {
        let local_path = absolutize(Path::new(&src))?;
        images.insert(
            src,
            ImageRef {
                local_path,
                remote: None,
            },
        );
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    #[test]
    fn test_heading() {
        let html = markdown_to_html("# Hello", Path::new("")).unwrap();
        assert!(html.contains("<h1>Hello</h1>"));
    }

    #[test]
    fn test_emojize() {
        assert_eq!(emojize("great :smile:"), "great 😄");
        assert_eq!(emojize("at 10:30:00 :not_an_emoji_code:"), "at 10:30:00 :not_an_emoji_code:");
    }

    #[test]
    fn test_emojize_cldr_names() {
        assert_eq!(emojize(":thumbs_up: :+1:"), "👍 👍");
        assert_eq!(emojize(":Thumbs_Up:"), "👍");
    }

    #[test]
    fn test_tables_and_code_and_raw_html() {
        let md = "| a | b |\n|---|---|\n| 1 | 2 |\n\n```rust\nfn main() {}\n```\n\n<div class=\"note\">raw</div>\n";
        let html = markdown_to_html(md, Path::new("")).unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("language-rust"));
        assert!(html.contains("<div class=\"note\">raw</div>"));
    }

    #[test]
    fn test_relative_images_joined_with_root() {
        let md = "![cat](pics/cat.png)\n\n![web](https://example.com/w.png)\n\n<img src=\"raw.png\">\n";
        let html = markdown_to_html(md, Path::new("/course/week1")).unwrap();
        let sources = html::image_sources(&html);
        assert_eq!(
            sources,
            vec![
                "/course/week1/pics/cat.png",
                "https://example.com/w.png",
                "/course/week1/raw.png"
            ]
        );
    }

    #[test]
    fn test_percent_encoded_image_names_decoded() {
        let html = markdown_to_html("![x](my%20pic.png)", Path::new("/c")).unwrap();
        assert_eq!(html::image_sources(&html), vec!["/c/my pic.png"]);
    }

    #[test]
    fn test_render_collects_images() {
        let temp = TempDir::new().unwrap();
        temp.child("page").create_dir_all().unwrap();
        temp.child("page/source.md")
            .write_str("# Hi\n\n![a](a.png)\n![a again](a.png)\n![b](https://x/b.png)\n")
            .unwrap();

        let rendered = render(&temp.path().join("page/source.md"), None).unwrap();
        assert_eq!(rendered.images.len(), 1);
        let (key, image) = rendered.images.iter().next().unwrap();
        assert_eq!(image.local_path, temp.path().join("page/a.png"));
        assert_eq!(key, &temp.path().join("page/a.png").to_string_lossy().to_string());
        assert!(image.remote.is_none());
    }

    #[test]
    fn test_render_skips_commented_images() {
        let temp = TempDir::new().unwrap();
        temp.child("p").create_dir_all().unwrap();
        temp.child("p/source.md")
            .write_str("# Hi\n\n<!-- <img src=\"old.png\"> -->\n")
            .unwrap();

        let rendered = render(&temp.path().join("p/source.md"), None).unwrap();
        assert!(rendered.images.is_empty());
        assert!(rendered.html.contains("<!-- <img src=\"old.png\"> -->"));
    }

    #[test]
    fn test_render_with_style() {
        let temp = TempDir::new().unwrap();
        temp.child("style").create_dir_all().unwrap();
        temp.child("page").create_dir_all().unwrap();
        temp.child("style/header.md")
            .write_str("![logo]($PATHTOMD2CANVASSTYLEFILE/logo.png)")
            .unwrap();
        temp.child("style/footer.md").write_str("*footer*").unwrap();
        temp.child("style/header.html").write_str("<div class=\"wrap\">").unwrap();
        temp.child("style/footer.html").write_str("</div>").unwrap();
        temp.child("page/source.md").write_str("Body text").unwrap();

        let rendered = render(
            &temp.path().join("page/source.md"),
            Some(&temp.path().join("style")),
        )
        .unwrap();

        assert!(rendered.html.starts_with("<div class=\"wrap\">\n"));
        assert!(rendered.html.trim_end().ends_with("</div>"));
        assert!(rendered.html.contains("Body text"));
        assert!(rendered.html.contains("<em>footer</em>"));
        let logo = temp.path().join("style/logo.png");
        assert!(rendered.images.values().any(|i| i.local_path == logo));
    }

    #[test]
    fn test_render_missing_style_file() {
        let temp = TempDir::new().unwrap();
        temp.child("page").create_dir_all().unwrap();
        temp.child("style").create_dir_all().unwrap();
        temp.child("page/source.md").write_str("x").unwrap();

        let result = render(
            &temp.path().join("page/source.md"),
            Some(&temp.path().join("style")),
        );
        assert!(matches!(result, Err(crate::Error::Filesystem(_))));
    }
}
