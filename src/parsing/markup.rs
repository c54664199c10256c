// Tolerant markup recovery for generated structured responses
//
// Models are asked to answer inside a quasi-XML envelope, but what comes back
// is routinely missing its root element, truncated, or full of raw `<` and `&`
// inside prose. Recovery runs through three named tiers before giving up.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;
use thiserror::Error;

/// Name of the enclosing element used by both response schemas and by the
/// wrapping tiers.
pub const ROOT_TAG: &str = "root";

/// Tags whose bodies are free-form prose and must never be parsed as markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProseTag {
    Description,
    Planning,
    Algorithm,
    Code,
    Explanation,
    Confidence,
}

impl ProseTag {
    pub const ALL: [ProseTag; 6] = [
        ProseTag::Description,
        ProseTag::Planning,
        ProseTag::Algorithm,
        ProseTag::Code,
        ProseTag::Explanation,
        ProseTag::Confidence,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProseTag::Description => "description",
            ProseTag::Planning => "planning",
            ProseTag::Algorithm => "algorithm",
            ProseTag::Code => "code",
            ProseTag::Explanation => "explanation",
            ProseTag::Confidence => "confidence",
        }
    }
}

/// Recovery strategy applied to the raw text before handing it to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryTier {
    /// Parse the text exactly as received.
    Direct,
    /// Wrap the text in `<root>` ... `</root>`. Elements still open when the
    /// input ends are closed by the envelope.
    Enclosed,
    /// Prepend `<root>` only, for responses that already end with `</root>`
    /// but lost their opening tag.
    OpenOnly,
}

impl RecoveryTier {
    pub const ORDER: [RecoveryTier; 3] = [
        RecoveryTier::Direct,
        RecoveryTier::Enclosed,
        RecoveryTier::OpenOnly,
    ];

    fn prepare(self, text: &str) -> String {
        match self {
            RecoveryTier::Direct => text.to_string(),
            RecoveryTier::Enclosed => format!("<{ROOT_TAG}>\n{text}\n</{ROOT_TAG}>"),
            RecoveryTier::OpenOnly => format!("<{ROOT_TAG}>\n{text}"),
        }
    }

    fn closes_open_elements_at_eof(self) -> bool {
        !matches!(self, RecoveryTier::Direct)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MarkupError {
    #[error("malformed markup near byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("closing tag </{0}> does not match the open element")]
    UnmatchedClose(String),

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("content found outside the document element")]
    StrayContent,

    #[error("no document element found")]
    Empty,

    #[error("all recovery tiers failed (last: {0})")]
    Unrecoverable(Box<MarkupError>),
}

/// A parsed element value: bare text, a nested group, or the ordered values of
/// a tag that repeated among its siblings.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupValue {
    Text(String),
    Group(MarkupGroup),
    List(Vec<MarkupValue>),
}

impl MarkupValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MarkupValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&MarkupGroup> {
        match self {
            MarkupValue::Group(group) => Some(group),
            _ => None,
        }
    }

    /// View this value as a sequence. A single value becomes a one-element
    /// slice so callers never branch on cardinality.
    pub fn as_slice(&self) -> &[MarkupValue] {
        match self {
            MarkupValue::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }
}

/// Children of one element keyed by tag name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkupGroup {
    fields: BTreeMap<String, MarkupValue>,
}

impl MarkupGroup {
    pub fn get(&self, tag: &str) -> Option<&MarkupValue> {
        self.fields.get(tag)
    }

    /// Every value recorded under `tag`, in document order.
    pub fn all(&self, tag: &str) -> &[MarkupValue] {
        self.fields.get(tag).map(MarkupValue::as_slice).unwrap_or(&[])
    }

    /// Text of the first `tag` child, if that child is plain text.
    pub fn text(&self, tag: &str) -> Option<&str> {
        self.all(tag).first().and_then(MarkupValue::as_text)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.fields.contains_key(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    fn insert(&mut self, tag: String, value: MarkupValue) {
        match self.fields.remove(&tag) {
            None => {
                self.fields.insert(tag, value);
            }
            Some(MarkupValue::List(mut items)) => {
                items.push(value);
                self.fields.insert(tag, MarkupValue::List(items));
            }
            Some(previous) => {
                self.fields.insert(tag, MarkupValue::List(vec![previous, value]));
            }
        }
    }
}

/// Rewrite every prose tag so its body is a CDATA payload. Tags that already
/// carry a CDATA section are left alone.
pub fn protect_prose(text: &str) -> String {
    let mut out = text.to_string();
    for tag in ProseTag::ALL {
        let name = tag.name();
        let open = format!("<{name}>");
        let close = format!("</{name}>");
        let open_cdata = format!("<{name}><![CDATA[");
        let close_cdata = format!("]]></{name}>");

        if out.contains(&open_cdata) && out.contains(&close_cdata) {
            continue;
        }
        out = out.replace(&open, &open_cdata).replace(&close, &close_cdata);
    }
    out.trim().to_string()
}

/// Parse a structured response into a tag tree, trying each recovery tier in
/// turn. The returned group holds the children of the document element.
pub fn parse_markup(text: &str) -> Result<MarkupGroup, MarkupError> {
    let cleaned = text.replace("```xml", "").replace("```", "");
    let prepared = protect_prose(&cleaned);

    let mut last_error = MarkupError::Empty;
    for tier in RecoveryTier::ORDER {
        match parse_with_tier(&prepared, tier) {
            Ok(group) => {
                if tier != RecoveryTier::Direct {
                    tracing::debug!("Recovered structured response using {:?} tier", tier);
                }
                return Ok(unwrap_nested_root(group));
            }
            Err(e) => {
                tracing::debug!("Markup tier {:?} failed: {}", tier, e);
                last_error = e;
            }
        }
    }

    Err(MarkupError::Unrecoverable(Box::new(last_error)))
}

/// Parse with a single recovery tier.
pub fn parse_with_tier(text: &str, tier: RecoveryTier) -> Result<MarkupGroup, MarkupError> {
    let source = tier.prepare(text);
    TreeBuilder::new(tier).build(&source)
}

/// A wrapping tier around a response that already had its own `<root>`
/// yields `root -> root -> ...`; collapse that to the inner document.
fn unwrap_nested_root(mut group: MarkupGroup) -> MarkupGroup {
    while group.len() == 1 {
        match group.fields.remove(ROOT_TAG) {
            Some(MarkupValue::Group(inner)) => group = inner,
            Some(other) => {
                group.fields.insert(ROOT_TAG.to_string(), other);
                break;
            }
            None => break,
        }
    }
    group
}

struct Frame {
    name: String,
    text: String,
    children: MarkupGroup,
    has_children: bool,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            children: MarkupGroup::default(),
            has_children: false,
        }
    }

    fn into_value(self) -> (String, MarkupValue) {
        let value = if self.has_children {
            MarkupValue::Group(self.children)
        } else {
            MarkupValue::Text(self.text.trim().to_string())
        };
        (self.name, value)
    }
}

struct TreeBuilder {
    tier: RecoveryTier,
    stack: Vec<Frame>,
    document: Option<MarkupGroup>,
}

impl TreeBuilder {
    fn new(tier: RecoveryTier) -> Self {
        Self {
            tier,
            stack: Vec::new(),
            document: None,
        }
    }

    fn build(mut self, source: &str) -> Result<MarkupGroup, MarkupError> {
        let mut reader = Reader::from_str(source);
        reader.config_mut().check_end_names = false;

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(MarkupError::Syntax {
                        position: reader.buffer_position() as u64,
                        message: e.to_string(),
                    })
                }
            };

            match event {
                Event::Start(start) => {
                    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    self.open(name)?;
                }
                Event::Empty(empty) => {
                    let name = String::from_utf8_lossy(empty.name().as_ref()).into_owned();
                    self.open(name.clone())?;
                    self.close(&name)?;
                }
                Event::End(end) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                    self.close(&name)?;
                }
                Event::Text(text) => {
                    let unescaped = match text.unescape() {
                        Ok(unescaped) => unescaped.into_owned(),
                        Err(e) => {
                            return Err(MarkupError::Syntax {
                                position: reader.buffer_position() as u64,
                                message: e.to_string(),
                            })
                        }
                    };
                    self.append_text(&unescaped)?;
                }
                Event::CData(cdata) => {
                    let bytes: &[u8] = &cdata;
                    let text = String::from_utf8_lossy(bytes).into_owned();
                    self.append_text(&text)?;
                }
                Event::Eof => break,
                // comments, declarations, processing instructions
                _ => {}
            }
        }

        if !self.stack.is_empty() {
            if !self.tier.closes_open_elements_at_eof() {
                let innermost = self.stack.last().map(|f| f.name.clone()).unwrap_or_default();
                return Err(MarkupError::Unclosed(innermost));
            }
            while let Some(name) = self.stack.last().map(|f| f.name.clone()) {
                self.close(&name)?;
            }
        }

        self.document.ok_or(MarkupError::Empty)
    }

    fn open(&mut self, name: String) -> Result<(), MarkupError> {
        if self.stack.is_empty() && self.document.is_some() {
            return Err(MarkupError::StrayContent);
        }
        self.stack.push(Frame::new(name));
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<(), MarkupError> {
        match self.stack.last() {
            Some(top) if top.name == name => {}
            _ => return Err(MarkupError::UnmatchedClose(name.to_string())),
        }

        let frame = self
            .stack
            .pop()
            .ok_or_else(|| MarkupError::UnmatchedClose(name.to_string()))?;

        match self.stack.last_mut() {
            Some(parent) => {
                let (tag, value) = frame.into_value();
                parent.children.insert(tag, value);
                parent.has_children = true;
            }
            None => self.document = Some(frame.children),
        }
        Ok(())
    }

    fn append_text(&mut self, text: &str) -> Result<(), MarkupError> {
        match self.stack.last_mut() {
            Some(frame) => {
                frame.text.push_str(text);
                Ok(())
            }
            None if text.trim().is_empty() => Ok(()),
            None => Err(MarkupError::StrayContent),
        }
    }
}
