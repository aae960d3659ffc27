//! Streaming node pruner over a pull-based XML event source.
//!
//! The pruner turns quick-xml's flat token stream into a sequence of
//! `(event, element)` pairs for the element names it is asked about. An
//! element yielded at its end tag carries its complete subtree, and
//! ownership of that subtree moves to the consumer: the pruner detaches it
//! from its parent, together with every preceding sibling that was already
//! consumed, before reading on. Content outside a yielded element is never
//! retained, so peak memory is bounded by the nesting depth plus the largest
//! yielded subtree rather than by the document size.
//!
//! The detach is a side effect on the pruner's own transient tree: an
//! ancestor yielded later no longer contains the children that were handed
//! out before it.

use std::collections::VecDeque;
use std::io::BufRead;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::PiXmlError;

/// Kind of node event yielded by the [`Pruner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEvent {
    /// Start tag read; the element has its attributes but no content yet
    Start,
    /// End tag read; the element carries its complete subtree
    End,
}

/// An owned XML element with its (possibly pruned) subtree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Local name, namespace prefix stripped
    pub name: String,
    /// Attributes in document order, keys as local names
    pub attributes: Vec<(String, String)>,
    /// Concatenated, unescaped text content
    pub text: String,
    /// Child elements still attached
    pub children: Vec<Element>,
}

impl Element {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Value of attribute `name`
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child named `name`
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children named `name`
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first child named `name`, `None` when absent
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim())
    }

    /// True when the element has neither text nor children
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.children.is_empty()
    }
}

/// One item produced by the [`Pruner`]
#[derive(Debug, Clone, PartialEq)]
pub struct PrunedNode {
    /// Start or end of the element
    pub event: NodeEvent,
    /// The element itself
    pub element: Element,
    /// Nesting depth; the document root has depth 0
    pub depth: usize,
}

/// Frame of an element whose end tag has not been read yet
#[derive(Debug)]
struct OpenElement {
    element: Element,
    /// Whether content is kept: the element or an ancestor will be yielded
    capturing: bool,
}

/// Pull-based iterator of pruned XML nodes.
///
/// Yields only the element names passed to [`Pruner::new`] (all elements
/// when the list is empty), at their end tags by default. Items appear in
/// exactly the order of the underlying token stream.
pub struct Pruner<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    stack: Vec<OpenElement>,
    tags: Vec<String>,
    yield_start: bool,
    yield_end: bool,
    queue: VecDeque<PrunedNode>,
    finished: bool,
}

impl<R: BufRead> Pruner<R> {
    /// Create a pruner yielding the end of every element named in `tags`
    pub fn new(reader: R, tags: &[&str]) -> Self {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);

        Self {
            reader: xml_reader,
            buf: Vec::new(),
            stack: Vec::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            yield_start: false,
            yield_end: true,
            queue: VecDeque::new(),
            finished: false,
        }
    }

    /// Choose which node events are yielded
    pub fn with_events(mut self, start: bool, end: bool) -> Self {
        self.yield_start = start;
        self.yield_end = end;
        self
    }

    /// Current nesting depth (number of open elements)
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Byte position in the underlying source
    pub fn byte_position(&self) -> u64 {
        self.reader.buffer_position()
    }

    fn matches(&self, name: &str) -> bool {
        self.tags.is_empty() || self.tags.iter().any(|t| t == name)
    }

    /// Read tokens until at least one node is queued or the document ends
    fn fill(&mut self) -> Result<(), PiXmlError> {
        let mut buf = std::mem::take(&mut self.buf);
        let result = self.fill_from(&mut buf);
        self.buf = buf;
        result
    }

    fn fill_from(&mut self, buf: &mut Vec<u8>) -> Result<(), PiXmlError> {
        while self.queue.is_empty() && !self.finished {
            buf.clear();
            match self.reader.read_event_into(buf)? {
                Event::Start(ref e) => {
                    let element = element_from_start(e)?;
                    self.open(element);
                }
                Event::Empty(ref e) => {
                    let element = element_from_start(e)?;
                    self.open(element);
                    self.close()?;
                }
                Event::End(_) => {
                    self.close()?;
                }
                Event::Text(ref t) => {
                    let raw = std::str::from_utf8(t)?;
                    let text = unescape(raw)?;
                    self.append_text(&text);
                }
                Event::CData(ref t) => {
                    let text = std::str::from_utf8(t)?;
                    self.append_text(text);
                }
                Event::Eof => {
                    self.finished = true;
                    if let Some(open) = self.stack.last() {
                        return Err(PiXmlError::InvalidStructure(format!(
                            "document ended inside <{}> at byte {}",
                            open.element.name,
                            self.reader.buffer_position()
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn open(&mut self, element: Element) {
        let depth = self.stack.len();
        let matches = self.matches(&element.name);
        let parent_capturing = self.stack.last().map_or(false, |p| p.capturing);

        if self.yield_start && matches {
            self.queue.push_back(PrunedNode {
                event: NodeEvent::Start,
                element: Element {
                    name: element.name.clone(),
                    attributes: element.attributes.clone(),
                    ..Default::default()
                },
                depth,
            });
        }

        self.stack.push(OpenElement {
            element,
            capturing: (self.yield_end && matches) || parent_capturing,
        });
    }

    fn close(&mut self) -> Result<(), PiXmlError> {
        let closed = self.stack.pop().ok_or_else(|| {
            PiXmlError::InvalidStructure("end tag without matching start tag".to_string())
        })?;
        let depth = self.stack.len();

        if self.yield_end && self.matches(&closed.element.name) {
            // The consumer takes the subtree; preceding siblings are done too.
            if let Some(parent) = self.stack.last_mut() {
                parent.element.children.clear();
            }
            self.queue.push_back(PrunedNode {
                event: NodeEvent::End,
                element: closed.element,
                depth,
            });
        } else if let Some(parent) = self.stack.last_mut() {
            if parent.capturing {
                parent.element.children.push(closed.element);
            }
        }
        Ok(())
    }

    fn append_text(&mut self, text: &str) {
        if let Some(top) = self.stack.last_mut() {
            if top.capturing {
                top.element.text.push_str(text);
            }
        }
    }

    /// Read the next node
    pub fn next_node(&mut self) -> Result<Option<PrunedNode>, PiXmlError> {
        self.fill()?;
        Ok(self.queue.pop_front())
    }
}

impl<R: BufRead> Iterator for Pruner<R> {
    type Item = Result<PrunedNode, PiXmlError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_node() {
            Ok(Some(node)) => Some(Ok(node)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                self.queue.clear();
                self.stack.clear();
                Some(Err(e))
            }
        }
    }
}

/// Build an element (name and attributes) from a start tag
fn element_from_start(e: &BytesStart) -> Result<Element, PiXmlError> {
    let name = std::str::from_utf8(e.local_name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| PiXmlError::XmlError(quick_xml::Error::from(e)))?;
        let key = attr.key;
        // Namespace declarations are not content
        if key.as_ref() == b"xmlns" || key.as_ref().starts_with(b"xmlns:") {
            continue;
        }
        let key = std::str::from_utf8(key.local_name().as_ref())?.to_string();
        let raw = std::str::from_utf8(&attr.value)?;
        let value = unescape(raw)?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        ..Default::default()
    })
}
