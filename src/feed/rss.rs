//! RSS 2.0 reading and writing.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use scenegrab_common::RawAnnouncement;
use std::io::Cursor;

#[derive(Default)]
struct ItemBuilder {
    title: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
}

impl ItemBuilder {
    fn build(self, now: DateTime<Utc>) -> Option<RawAnnouncement> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        let link = self.link.filter(|l| !l.trim().is_empty())?;
        let published = self
            .pub_date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or(now);

        Some(RawAnnouncement::new(title.trim(), link.trim(), published))
    }
}

/// Parse the `<item>` entries of an RSS 2.0 document.
///
/// Items without a title or link are dropped. A missing or unparsable
/// `pubDate` is treated as `now`.
pub fn parse_rss(xml: &str, now: DateTime<Utc>) -> Result<Vec<RawAnnouncement>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut buf = Vec::new();
    let mut current_item: Option<ItemBuilder> = None;
    let mut current_element: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "item" {
                    current_item = Some(ItemBuilder::default());
                } else {
                    current_element = Some(name);
                }
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"item" {
                    if let Some(item) = current_item.take().and_then(|b| b.build(now)) {
                        items.push(item);
                    }
                }
                current_element = None;
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                set_field(&mut current_item, current_element.as_deref(), text);
            }
            Ok(Event::CData(ref e)) => {
                let text = String::from_utf8_lossy(e).to_string();
                set_field(&mut current_item, current_element.as_deref(), text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Malformed feed at byte {}", reader.buffer_position())
                })
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(items)
}

fn set_field(item: &mut Option<ItemBuilder>, element: Option<&str>, text: String) {
    let (Some(item), Some(element)) = (item.as_mut(), element) else {
        return;
    };
    if text.is_empty() {
        return;
    }
    match element {
        "title" => item.title = Some(text),
        "link" => item.link = Some(text),
        "pubDate" => item.pub_date = Some(text),
        _ => {}
    }
}

/// Channel metadata for a generated feed.
pub struct Channel<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub description: &'a str,
}

/// Serialize announcements as an RSS 2.0 document.
pub fn write_rss(channel: &Channel<'_>, items: &[RawAnnouncement], now: DateTime<Utc>) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("rss").with_attributes([("version", "2.0")])))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    write_text_element(&mut writer, "title", channel.title)?;
    write_text_element(&mut writer, "link", channel.link)?;
    write_text_element(&mut writer, "description", channel.description)?;
    write_text_element(&mut writer, "lastBuildDate", &now.to_rfc2822())?;

    for item in items {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        write_text_element(&mut writer, "title", &item.title)?;
        write_text_element(&mut writer, "link", &item.link)?;
        write_text_element(&mut writer, "guid", &item.link)?;
        write_text_element(&mut writer, "pubDate", &item.published.to_rfc2822())?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    String::from_utf8(writer.into_inner().into_inner()).context("Generated feed is not UTF-8")
}

fn write_text_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
