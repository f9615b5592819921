//! WordprocessingML part model
//!
//! A part keeps its full XML event stream so it can be written back
//! untouched, plus an index into that stream describing the structure the
//! substitution engine needs: paragraphs, their runs and the `w:t` elements
//! carrying each run's text, tables, and section header/footer references.

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One `w:t` element inside a run
#[derive(Debug, Clone)]
struct TextSlot {
    /// Index of the `w:t` start (or empty) event
    element: usize,
    /// Indices of the text events inside the element
    events: Vec<usize>,
    /// Unescaped text content
    text: String,
}

/// A `w:r` element
#[derive(Debug, Clone, Default)]
pub(crate) struct Run {
    slots: Vec<TextSlot>,
}

impl Run {
    pub(crate) fn text(&self) -> String {
        self.slots.iter().map(|slot| slot.text.as_str()).collect()
    }
}

/// A `w:p` element
#[derive(Debug, Clone, Default)]
pub(crate) struct Paragraph {
    pub(crate) runs: Vec<Run>,
}

impl Paragraph {
    pub(crate) fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TableCell {
    pub(crate) paragraphs: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TableRow {
    pub(crate) cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Table {
    pub(crate) rows: Vec<TableRow>,
}

/// Paragraphs and tables that are direct children of the part's container
/// (`w:body`, `w:hdr` or `w:ftr`)
#[derive(Debug, Clone, Default)]
pub(crate) struct Content {
    pub(crate) paragraphs: Vec<usize>,
    pub(crate) tables: Vec<Table>,
}

impl Content {
    /// Paragraph indices in traversal order: top-level paragraphs, then
    /// every table row-major with each cell's paragraphs.
    pub(crate) fn paragraph_order(&self) -> Vec<usize> {
        let mut order = self.paragraphs.clone();
        for table in &self.tables {
            for row in &table.rows {
                for cell in &row.cells {
                    order.extend_from_slice(&cell.paragraphs);
                }
            }
        }
        order
    }
}

/// Header or footer reference inside a `w:sectPr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PartReference {
    /// `default`, `first` or `even`
    pub(crate) kind: String,
    pub(crate) rel_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SectionReferences {
    pub(crate) headers: Vec<PartReference>,
    pub(crate) footers: Vec<PartReference>,
}

/// Role of an open element while indexing
#[derive(Debug, Clone, Copy)]
enum Frame {
    DocumentRoot,
    Container,
    Paragraph(usize),
    ParagraphProperties,
    Run(usize, usize),
    Text(usize, usize, usize),
    Table(usize),
    Row(usize, usize),
    Cell(usize, usize, usize),
    Section(usize),
    Other,
}

/// A parsed XML part
#[derive(Debug, Clone)]
pub(crate) struct XmlPart {
    pub(crate) name: String,
    events: Vec<Event<'static>>,
    pub(crate) paragraphs: Vec<Paragraph>,
    pub(crate) content: Content,
    pub(crate) sections: Vec<SectionReferences>,
    modified: bool,
}

impl XmlPart {
    pub(crate) fn parse(name: &str, bytes: &[u8]) -> Result<Self, quick_xml::Error> {
        let xml = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(false);

        let mut part = XmlPart {
            name: name.to_string(),
            events: Vec::new(),
            paragraphs: Vec::new(),
            content: Content::default(),
            sections: Vec::new(),
            modified: false,
        };
        let mut stack: Vec<Frame> = Vec::new();
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf)?.into_owned();
            let index = part.events.len();

            match &event {
                Event::Start(start) => {
                    let frame = part.open(stack.last().copied(), start, index)?;
                    stack.push(frame);
                }
                Event::Empty(start) => {
                    part.open(stack.last().copied(), start, index)?;
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(text) => {
                    if let Some(Frame::Text(p, r, s)) = stack.last().copied() {
                        let decoded = text.unescape()?;
                        let slot = &mut part.paragraphs[p].runs[r].slots[s];
                        slot.events.push(index);
                        slot.text.push_str(&decoded);
                    }
                }
                Event::Eof => break,
                _ => {}
            }

            part.events.push(event);
            buf.clear();
        }

        Ok(part)
    }

    /// Register an element opening at `index` and return its role.
    fn open(
        &mut self,
        parent: Option<Frame>,
        start: &BytesStart<'_>,
        index: usize,
    ) -> Result<Frame, quick_xml::Error> {
        let name = start.name();
        let name = name.as_ref();

        let frame = match (parent, name) {
            (None, b"w:document") => Frame::DocumentRoot,
            (None, b"w:hdr" | b"w:ftr") => Frame::Container,
            (Some(Frame::DocumentRoot), b"w:body") => Frame::Container,

            (Some(Frame::Container), b"w:p") => {
                let p = self.new_paragraph();
                self.content.paragraphs.push(p);
                Frame::Paragraph(p)
            }
            (Some(Frame::Container), b"w:tbl") => {
                self.content.tables.push(Table::default());
                Frame::Table(self.content.tables.len() - 1)
            }
            (Some(Frame::Container | Frame::ParagraphProperties), b"w:sectPr") => {
                self.sections.push(SectionReferences::default());
                Frame::Section(self.sections.len() - 1)
            }

            (Some(Frame::Paragraph(_)), b"w:pPr") => Frame::ParagraphProperties,
            (Some(Frame::Paragraph(p)), b"w:r") => {
                let runs = &mut self.paragraphs[p].runs;
                runs.push(Run::default());
                Frame::Run(p, runs.len() - 1)
            }
            (Some(Frame::Run(p, r)), b"w:t") => {
                let slots = &mut self.paragraphs[p].runs[r].slots;
                slots.push(TextSlot {
                    element: index,
                    events: Vec::new(),
                    text: String::new(),
                });
                Frame::Text(p, r, slots.len() - 1)
            }

            (Some(Frame::Table(t)), b"w:tr") => {
                let rows = &mut self.content.tables[t].rows;
                rows.push(TableRow::default());
                Frame::Row(t, rows.len() - 1)
            }
            (Some(Frame::Row(t, r)), b"w:tc") => {
                let cells = &mut self.content.tables[t].rows[r].cells;
                cells.push(TableCell::default());
                Frame::Cell(t, r, cells.len() - 1)
            }
            (Some(Frame::Cell(t, r, c)), b"w:p") => {
                let p = self.new_paragraph();
                self.content.tables[t].rows[r].cells[c].paragraphs.push(p);
                Frame::Paragraph(p)
            }

            (Some(Frame::Section(s)), b"w:headerReference" | b"w:footerReference") => {
                if let Some(reference) = part_reference(start)? {
                    let section = &mut self.sections[s];
                    if name == b"w:headerReference" {
                        section.headers.push(reference);
                    } else {
                        section.footers.push(reference);
                    }
                }
                Frame::Other
            }

            _ => Frame::Other,
        };

        Ok(frame)
    }

    fn new_paragraph(&mut self) -> usize {
        self.paragraphs.push(Paragraph::default());
        self.paragraphs.len() - 1
    }

    pub(crate) fn is_modified(&self) -> bool {
        self.modified
    }

    /// Replace the text of one run.
    ///
    /// The whole text goes into the first `w:t` that carries text; the
    /// run's other text elements are emptied. Run properties are untouched.
    /// Returns `false` when the run has no text-bearing element to write to.
    pub(crate) fn set_run_text(&mut self, paragraph: usize, run: usize, text: &str) -> bool {
        let slots = &self.paragraphs[paragraph].runs[run].slots;
        let Some(target) = slots.iter().position(|slot| !slot.events.is_empty()) else {
            return false;
        };

        let mut writes = Vec::new();
        for (i, slot) in slots.iter().enumerate() {
            for (j, &event) in slot.events.iter().enumerate() {
                let content = if i == target && j == 0 { text } else { "" };
                writes.push((event, content));
            }
        }
        let element = slots[target].element;

        for (event, content) in writes {
            self.events[event] = Event::Text(BytesText::new(content).into_owned());
        }
        if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
            preserve_space(&mut self.events[element]);
        }

        for (i, slot) in self.paragraphs[paragraph].runs[run].slots.iter_mut().enumerate() {
            slot.text = if i == target { text.to_string() } else { String::new() };
        }
        self.modified = true;
        true
    }

    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>, quick_xml::Error> {
        let mut writer = Writer::new(Vec::with_capacity(self.events.len() * 16));
        for event in &self.events {
            writer.write_event(event)?;
        }
        Ok(writer.into_inner())
    }
}

fn part_reference(start: &BytesStart<'_>) -> Result<Option<PartReference>, quick_xml::Error> {
    let Some(rel_id) = attribute(start, b"r:id")? else {
        return Ok(None);
    };
    let kind = attribute(start, b"w:type")?.unwrap_or_else(|| "default".to_string());
    Ok(Some(PartReference { kind, rel_id }))
}

pub(crate) fn attribute(
    start: &BytesStart<'_>,
    key: &[u8],
) -> Result<Option<String>, quick_xml::Error> {
    match start.try_get_attribute(key)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

/// Mark a `w:t` start element with `xml:space="preserve"`.
fn preserve_space(event: &mut Event<'static>) {
    if let Event::Start(start) = event {
        let has_space = start
            .attributes()
            .flatten()
            .any(|attr| attr.key.as_ref() == b"xml:space");
        if !has_space {
            start.push_attribute(("xml:space", "preserve"));
        }
    }
}
