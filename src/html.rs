// ABOUTME: Scans and rewrites <img> tags in rendered page bodies
// ABOUTME: Attribute values are entity-decoded on read and re-escaped on write

use crate::Result;
use regex::Regex;
use std::sync::OnceLock;

/// `<img>` tags, where quoted values may contain `>`, or whole comments.
fn img_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<!--.*?-->|<img\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).unwrap()
    })
}

/// `<img>` tags outside comments, in document order.
fn img_tags(html: &str) -> impl Iterator<Item = regex::Match<'_>> {
    img_tag_re()
        .find_iter(html)
        .filter(|m| !m.as_str().starts_with("<!--"))
}

fn attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#,
        )
        .unwrap()
    })
}

/// True for sources that point at the web rather than the local disk.
pub fn is_remote_src(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

/// A parsed `<img>` tag, attributes in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ImgTag {
    pub attrs: Vec<(String, Option<String>)>,
}

impl ImgTag {
    fn parse(tag: &str) -> Self {
        let inner = tag
            .get(4..tag.len().saturating_sub(1))
            .unwrap_or_default()
            .trim_end_matches('/');

        let attrs = attr_re()
            .captures_iter(inner)
            .map(|caps| {
                let name = caps[1].to_ascii_lowercase();
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .or_else(|| caps.get(4))
                    .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned());
                (name, value)
            })
            .collect();

        ImgTag { attrs }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn src(&self) -> Option<&str> {
        self.get("src")
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = Some(value.into());
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::from("<img");
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            if let Some(v) = value {
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(v));
                out.push('"');
            }
        }
        out.push_str(" />");
        out
    }
}

/// Sources of every `<img>` in `html`, in document order.
pub fn image_sources(html: &str) -> Vec<String> {
    img_tags(html)
        .filter_map(|m| ImgTag::parse(m.as_str()).src().map(str::to_string))
        .collect()
}

/// Sources of the images that still live on the local disk.
pub fn local_image_sources(html: &str) -> Vec<String> {
    image_sources(html)
        .into_iter()
        .filter(|src| !is_remote_src(src))
        .collect()
}

/// Rewrite `<img>` tags in place.
///
/// `edit` returns `Ok(true)` when it changed the tag; untouched tags keep
/// their original bytes.
pub fn rewrite_images<F>(html: &str, mut edit: F) -> Result<String>
where
    F: FnMut(&mut ImgTag) -> Result<bool>,
{
    let mut out = String::with_capacity(html.len());
    let mut last = 0;

    for m in img_tags(html) {
        out.push_str(&html[last..m.start()]);
        let mut tag = ImgTag::parse(m.as_str());
        if edit(&mut tag)? {
            out.push_str(&tag.to_html());
        } else {
            out.push_str(m.as_str());
        }
        last = m.end();
    }
    out.push_str(&html[last..]);

    Ok(out)
}
