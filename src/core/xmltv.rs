use crate::core::clock::ScheduleClock;
use crate::domain::model::{Channel, ScheduleEntry, SchedulePayload};
use crate::utils::error::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct GuideChannel {
    pub id: String,
    pub display_name: String,
    pub icon: Option<String>,
}

impl From<&Channel> for GuideChannel {
    fn from(channel: &Channel) -> Self {
        Self {
            id: channel.id.clone(),
            display_name: channel.name.clone(),
            icon: channel.logo.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Programme {
    pub channel: String,
    pub start: String,
    pub stop: String,
    pub title: String,
    pub desc: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
    /// `lang` attribute for title, desc and category.
    pub lang: Option<String>,
}

impl Programme {
    pub fn from_entry(
        channel_id: &str,
        entry: &ScheduleEntry,
        clock: &ScheduleClock,
        poster_base: &str,
    ) -> Self {
        Self {
            channel: channel_id.to_string(),
            start: clock.format(entry.start),
            stop: clock.format(entry.end),
            title: entry.title.clone(),
            desc: Some(entry.description.clone()),
            category: entry.category.clone(),
            icon: entry
                .poster
                .as_ref()
                .map(|poster| format!("{}{}", poster_base, poster)),
            lang: None,
        }
    }
}

/// An XMLTV `<tv>` document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub generator: Option<String>,
    pub channels: Vec<GuideChannel>,
    pub programmes: Vec<Programme>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Entries without usable timestamps.
    pub dropped_entries: usize,
    /// Payloads for channels that are not in the playlist.
    pub unknown_channels: usize,
}

/// Channels in playlist order, then programmes grouped by playlist order and
/// day offset. Entry order inside one payload is kept as the API returned it.
pub fn build_document(
    channels: &[Channel],
    mut payloads: Vec<SchedulePayload>,
    clock: &ScheduleClock,
    poster_base: &str,
) -> (Document, BuildStats) {
    let positions: HashMap<&str, usize> = channels
        .iter()
        .enumerate()
        .map(|(idx, channel)| (channel.id.as_str(), idx))
        .collect();

    let mut stats = BuildStats::default();
    payloads.retain(|payload| {
        let known = positions.contains_key(payload.channel_id.as_str());
        if !known {
            stats.unknown_channels += 1;
        }
        known
    });
    payloads.sort_by_key(|payload| {
        let position = positions
            .get(payload.channel_id.as_str())
            .copied()
            .unwrap_or(usize::MAX);
        (position, payload.offset)
    });

    let mut programmes = Vec::new();
    for payload in &payloads {
        for raw in &payload.entries {
            match ScheduleEntry::from_json(raw) {
                Some(entry) => programmes.push(Programme::from_entry(
                    &payload.channel_id,
                    &entry,
                    clock,
                    poster_base,
                )),
                None => {
                    stats.dropped_entries += 1;
                    tracing::debug!(
                        "Dropping entry without valid timestamps for {} offset={}",
                        payload.channel_id,
                        payload.offset
                    );
                }
            }
        }
    }

    let document = Document {
        generator: None,
        channels: channels.iter().map(GuideChannel::from).collect(),
        programmes,
    };
    (document, stats)
}

impl Document {
    pub fn to_xml(&self, pretty: bool) -> Result<Vec<u8>> {
        let mut writer = if pretty {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("tv");
        if let Some(generator) = &self.generator {
            root.push_attribute(("generator-info-name", generator.as_str()));
        }
        writer.write_event(Event::Start(root))?;

        for channel in &self.channels {
            write_channel(&mut writer, channel)?;
        }
        for programme in &self.programmes {
            write_programme(&mut writer, programme)?;
        }

        writer.write_event(Event::End(BytesEnd::new("tv")))?;

        let mut xml = writer.into_inner();
        xml.push(b'\n');
        Ok(xml)
    }
}

fn write_channel(writer: &mut Writer<Vec<u8>>, channel: &GuideChannel) -> Result<()> {
    writer.write_event(Event::Start(
        BytesStart::new("channel").with_attributes([("id", channel.id.as_str())]),
    ))?;
    writer
        .create_element("display-name")
        .write_text_content(BytesText::new(&channel.display_name))?;
    if let Some(icon) = &channel.icon {
        writer
            .create_element("icon")
            .with_attribute(("src", icon.as_str()))
            .write_empty()?;
    }
    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    Ok(())
}

fn write_programme(writer: &mut Writer<Vec<u8>>, programme: &Programme) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("programme").with_attributes([
        ("start", programme.start.as_str()),
        ("stop", programme.stop.as_str()),
        ("channel", programme.channel.as_str()),
    ])))?;

    let lang = programme.lang.as_deref();
    write_text(writer, "title", &programme.title, lang)?;
    if let Some(desc) = &programme.desc {
        write_text(writer, "desc", desc, lang)?;
    }
    if let Some(category) = &programme.category {
        write_text(writer, "category", category, lang)?;
    }
    if let Some(icon) = &programme.icon {
        writer
            .create_element("icon")
            .with_attribute(("src", icon.as_str()))
            .write_empty()?;
    }

    writer.write_event(Event::End(BytesEnd::new("programme")))?;
    Ok(())
}

fn write_text(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
    lang: Option<&str>,
) -> Result<()> {
    let mut start = BytesStart::new(name);
    if let Some(lang) = lang {
        start.push_attribute(("lang", lang));
    }
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
