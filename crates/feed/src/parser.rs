use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::FeedError;
use crate::models::{RawFeed, RawItem};

/// Parse an RSS 2.0 document from raw XML bytes.
///
/// Items without a title and without a description are skipped.
pub fn parse_feed(xml: &[u8]) -> Result<RawFeed, FeedError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut feed = RawFeed::default();
    let mut buf = Vec::new();

    // Open element names from the root down to the current element.
    let mut path: Vec<String> = Vec::new();
    let mut current_item: Option<ItemBuilder> = None;
    let mut saw_channel = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = element_name(&e);
                match name.as_str() {
                    "channel" => saw_channel = true,
                    "item" => current_item = Some(ItemBuilder::default()),
                    _ => {
                        if let Some(ref mut item) = current_item {
                            item.media(&name, &e);
                        }
                    }
                }
                path.push(name);
            }
            Ok(Event::Empty(e)) => {
                if let Some(ref mut item) = current_item {
                    item.media(&element_name(&e), &e);
                }
            }
            Ok(Event::End(_)) => {
                if let Some(name) = path.pop() {
                    if name == "item" {
                        if let Some(item) = current_item.take().and_then(ItemBuilder::build) {
                            feed.items.push(item);
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                // Undeclared HTML entities are kept verbatim.
                let text = match e.unescape() {
                    Ok(text) => text.into_owned(),
                    Err(_) => String::from_utf8_lossy(&e).into_owned(),
                };
                handle_text(&path, &mut feed, current_item.as_mut(), &text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                handle_text(&path, &mut feed, current_item.as_mut(), text.trim());
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FeedError::Parse(format!("XML parse error: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    if !saw_channel {
        return Err(FeedError::Parse("Document has no <channel> element".into()));
    }
    Ok(feed)
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key.as_bytes())
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn handle_text(path: &[String], feed: &mut RawFeed, item: Option<&mut ItemBuilder>, text: &str) {
    if text.is_empty() {
        return;
    }
    let Some(element) = path.last() else {
        return;
    };

    match item {
        Some(item) => match element.as_str() {
            "title" => item.title.push_str(text),
            "description" => item.description.push_str(text),
            "link" => item.link.push_str(text),
            _ => {}
        },
        // Only the channel's own <title>, not the one inside <image>.
        None if element == "title" && path.len() >= 2 && path[path.len() - 2] == "channel" => {
            feed.title.push_str(text);
        }
        None => {}
    }
}

#[derive(Default)]
struct ItemBuilder {
    title: String,
    description: String,
    link: String,
    media_content: Option<String>,
    media_thumbnail: Option<String>,
    enclosure: Option<String>,
}

impl ItemBuilder {
    /// Record image candidates carried as attributes.
    fn media(&mut self, name: &str, e: &BytesStart<'_>) {
        match name {
            "media:content" if self.media_content.is_none() => {
                let is_image = attribute(e, "medium").map_or(true, |m| m == "image")
                    && attribute(e, "type").map_or(true, |t| t.starts_with("image/"));
                if is_image {
                    self.media_content = attribute(e, "url");
                }
            }
            "media:thumbnail" if self.media_thumbnail.is_none() => {
                self.media_thumbnail = attribute(e, "url");
            }
            "enclosure" if self.enclosure.is_none() => {
                if attribute(e, "type").is_some_and(|t| t.starts_with("image/")) {
                    self.enclosure = attribute(e, "url");
                }
            }
            _ => {}
        }
    }

    fn build(self) -> Option<RawItem> {
        let title = self.title.trim().to_string();
        let summary_text = strip_tags(&self.description);
        if title.is_empty() && summary_text.is_empty() {
            return None;
        }
        let link = Some(self.link.trim().to_string()).filter(|l| !l.is_empty());
        Some(RawItem {
            title,
            summary_text,
            image_url: self
                .media_content
                .or(self.media_thumbnail)
                .or(self.enclosure),
            link,
        })
    }
}

/// Drop inline markup some feeds put in `<description>`.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
