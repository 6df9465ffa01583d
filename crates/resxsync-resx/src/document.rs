use quick_xml::escape::{partial_escape, unescape};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use resxsync_core::{ResxError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const ROOT_ELEMENT: &str = "root";
const DATA_ELEMENT: &str = "data";
const NAME_ATTRIBUTE: &str = "name";
const VALUE_ELEMENT: &str = "value";
const SPACE_ATTRIBUTE: &str = "xml:space";

const SKELETON: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root>
  <resheader name="resmimetype">
    <value>text/microsoft-resx</value>
  </resheader>
  <resheader name="version">
    <value>2.0</value>
  </resheader>
  <resheader name="reader">
    <value>System.Resources.ResXResourceReader, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089</value>
  </resheader>
  <resheader name="writer">
    <value>System.Resources.ResXResourceWriter, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089</value>
  </resheader>
</root>
"#;

/// One string resource: `<data name="key"><value>value</value></data>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Element(Element),
    /// Character data as written in the file, entities still escaped.
    Text(String),
    CData(String),
    Comment(String),
    /// Declaration, processing instruction or doctype, kept as read.
    Markup(Event<'static>),
}

#[derive(Debug, Clone, PartialEq)]
struct Element {
    name: String,
    /// Unescaped attribute values, for lookups only.
    attrs: Vec<(String, String)>,
    /// The start tag as read. Elements created here have none.
    start: Option<BytesStart<'static>>,
    self_closing: bool,
    children: Vec<Node>,
}

impl Element {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            start: None,
            self_closing: false,
            children: Vec::new(),
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|n| match n {
            Node::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|n| match n {
            Node::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                // entities were checked at parse time
                Node::Text(raw) => match unescape(raw) {
                    Ok(t) => out.push_str(&t),
                    Err(_) => out.push_str(raw),
                },
                Node::CData(t) => out.push_str(t),
                _ => {}
            }
        }
        out
    }

    fn set_text(&mut self, value: &str) {
        self.children.clear();
        if !value.is_empty() {
            self.children.push(Node::Text(partial_escape(value).into_owned()));
        }
    }

    fn is_named_data(&self) -> bool {
        self.name == DATA_ELEMENT && self.attr(NAME_ATTRIBUTE).is_some()
    }

    /// `<data>` elements that hold plain strings. Typed payloads (bitmaps,
    /// serialized objects) carry `type`/`mimetype` and are never translated.
    fn is_string_data(&self) -> bool {
        if !self.is_named_data() {
            return false;
        }
        if self.attr("mimetype").is_some() {
            return false;
        }
        match self.attr("type") {
            None => true,
            Some(t) => t.starts_with("System.String"),
        }
    }
}

/// In-memory ResX document. Everything outside the string values is kept
/// byte for byte so saving does not disturb schema blocks, resheaders,
/// comments or the escaping style of untouched entries.
#[derive(Debug, Clone)]
pub struct ResourceDocument {
    path: PathBuf,
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
}

#[derive(Default)]
struct Tree {
    stack: Vec<Element>,
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
}

impl Tree {
    fn attach(&mut self, node: Node) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return;
        }
        match node {
            Node::Element(el) if self.root.is_none() => self.root = Some(el),
            Node::Element(_) => {}
            other if self.root.is_none() => self.prolog.push(other),
            other => self.epilog.push(other),
        }
    }

    fn attach_text(&mut self, raw: String) {
        let last = match self.stack.last_mut() {
            Some(parent) => parent.children.last_mut(),
            None if self.root.is_none() => self.prolog.last_mut(),
            None => self.epilog.last_mut(),
        };
        match last {
            Some(Node::Text(prev)) => prev.push_str(&raw),
            _ => self.attach(Node::Text(raw)),
        }
    }
}

impl ResourceDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ResxError::NotFound {
                    path: path.to_path_buf(),
                }
                .into())
            }
            Err(e) => return Err(e.into()),
        };
        let doc = Self::parse(&text, path)?;
        tracing::debug!(event = "resx_loaded", path = %path.display(), entries = doc.entries().len());
        Ok(doc)
    }

    /// Empty resource file with the standard resheaders.
    pub fn skeleton(path: &Path) -> std::result::Result<Self, ResxError> {
        Self::parse(SKELETON, path)
    }

    pub fn parse(text: &str, path: &Path) -> std::result::Result<Self, ResxError> {
        let xml_err = |message: String| ResxError::Xml {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = Reader::from_str(text.trim_start_matches('\u{feff}'));
        reader.config_mut().trim_text(false);

        let mut tree = Tree::default();
        loop {
            match reader.read_event().map_err(|e| xml_err(e.to_string()))? {
                Event::Start(e) => {
                    let el = element_from(e.into_owned(), false).map_err(xml_err)?;
                    tree.stack.push(el);
                }
                Event::Empty(e) => {
                    let el = element_from(e.into_owned(), true).map_err(xml_err)?;
                    tree.attach(Node::Element(el));
                }
                Event::End(_) => {
                    if let Some(el) = tree.stack.pop() {
                        tree.attach(Node::Element(el));
                    }
                }
                Event::Text(t) => {
                    t.unescape().map_err(|e| xml_err(e.to_string()))?;
                    tree.attach_text(String::from_utf8_lossy(&t).into_owned());
                }
                Event::CData(c) => {
                    let s = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    tree.attach(Node::CData(s));
                }
                Event::Comment(c) => {
                    let s = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    tree.attach(Node::Comment(s));
                }
                Event::Eof => break,
                other => tree.attach(Node::Markup(other.into_owned())),
            }
        }

        if let Some(open) = tree.stack.last() {
            return Err(xml_err(format!("unexpected end of document inside <{}>", open.name)));
        }
        let root = match tree.root {
            Some(r) if r.name == ROOT_ELEMENT => r,
            _ => {
                return Err(ResxError::MissingRoot {
                    path: path.to_path_buf(),
                })
            }
        };

        let mut seen = HashSet::new();
        for el in root.children.iter().filter_map(as_named_data) {
            let key = el.attr(NAME_ATTRIBUTE).unwrap_or_default();
            if !seen.insert(key.to_lowercase()) {
                return Err(ResxError::DuplicateKey {
                    path: path.to_path_buf(),
                    key: key.to_string(),
                });
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            prolog: tree.prolog,
            root,
            epilog: tree.epilog,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// String entries in document order.
    pub fn entries(&self) -> Vec<ResourceEntry> {
        self.root
            .children
            .iter()
            .filter_map(as_string_data)
            .map(|el| ResourceEntry {
                key: el.attr(NAME_ATTRIBUTE).unwrap_or_default().to_string(),
                value: el.child(VALUE_ELEMENT).map(Element::text).unwrap_or_default(),
            })
            .collect()
    }

    /// Entries whose value equals `text`, ignoring case and surrounding whitespace.
    pub fn find_by_value(&self, text: &str) -> Vec<ResourceEntry> {
        let needle = text.trim().to_lowercase();
        self.entries()
            .into_iter()
            .filter(|e| e.value.trim().to_lowercase() == needle)
            .collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// `key` names a typed `<data>` payload. Such names can never be written
    /// as strings, and no second entry may take them.
    pub fn is_typed_key(&self, key: &str) -> bool {
        matches!(self.slot(key), Some((_, false)))
    }

    pub fn value_of(&self, key: &str) -> Option<String> {
        let idx = self.position(key)?;
        match &self.root.children[idx] {
            Node::Element(el) => Some(el.child(VALUE_ELEMENT).map(Element::text).unwrap_or_default()),
            _ => None,
        }
    }

    /// Current value for `key`, creating an empty entry first when absent.
    /// Returns the value and whether an entry was created. A name held by a
    /// typed payload reads as empty and nothing is created.
    pub fn get_or_insert(&mut self, key: &str) -> (String, bool) {
        match self.slot(key) {
            Some((_, true)) => (self.value_of(key).unwrap_or_default(), false),
            Some((_, false)) => {
                tracing::warn!(event = "resx_typed_key", path = %self.path.display(), key = key);
                (String::new(), false)
            }
            None => {
                self.append(key);
                (String::new(), true)
            }
        }
    }

    /// Set `key` to `value`. A non-empty existing value is kept unless
    /// `overwrite`, and typed payloads are never replaced. Returns whether
    /// the document changed.
    pub fn set(&mut self, key: &str, value: &str, overwrite: bool) -> bool {
        let idx = match self.slot(key) {
            Some((i, true)) => i,
            Some((_, false)) => {
                tracing::warn!(event = "resx_typed_key", path = %self.path.display(), key = key);
                return false;
            }
            None => self.append(key),
        };
        let Node::Element(data) = &mut self.root.children[idx] else {
            return false;
        };
        let current = data.child(VALUE_ELEMENT).map(Element::text).unwrap_or_default();
        if !current.is_empty() && !overwrite {
            return false;
        }
        if current == value {
            return false;
        }
        match data.child_mut(VALUE_ELEMENT) {
            Some(v) => v.set_text(value),
            None => {
                let mut v = Element::new(VALUE_ELEMENT);
                v.set_text(value);
                data.children.push(Node::Element(v));
            }
        }
        true
    }

    pub fn render(&self) -> std::result::Result<Vec<u8>, ResxError> {
        let mut w = Writer::new(Vec::new());
        let mut out = || -> std::result::Result<(), String> {
            let declared = self
                .prolog
                .iter()
                .any(|n| matches!(n, Node::Markup(Event::Decl(_))));
            if !declared {
                emit(&mut w, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
                emit(&mut w, Event::Text(BytesText::from_escaped("\n")))?;
            }
            for node in &self.prolog {
                write_node(&mut w, node)?;
            }
            write_element(&mut w, &self.root)?;
            for node in &self.epilog {
                write_node(&mut w, node)?;
            }
            Ok(())
        };
        out().map_err(|message| ResxError::Xml {
            path: self.path.clone(),
            message,
        })?;
        Ok(w.into_inner())
    }

    /// Index of the `<data>` element named `key` (case-insensitive) and
    /// whether it holds a string.
    fn slot(&self, key: &str) -> Option<(usize, bool)> {
        let key = key.to_lowercase();
        self.root.children.iter().enumerate().find_map(|(i, n)| match n {
            Node::Element(el)
                if el.is_named_data()
                    && el.attr(NAME_ATTRIBUTE).unwrap_or_default().to_lowercase() == key =>
            {
                Some((i, el.is_string_data()))
            }
            _ => None,
        })
    }

    fn position(&self, key: &str) -> Option<usize> {
        match self.slot(key) {
            Some((i, true)) => Some(i),
            _ => None,
        }
    }

    /// Append an empty `<data>` entry before the closing `</root>`, keeping
    /// the two-space indentation of the surrounding entries.
    fn append(&mut self, key: &str) -> usize {
        let data = Element {
            attrs: vec![
                (NAME_ATTRIBUTE.to_string(), key.to_string()),
                (SPACE_ATTRIBUTE.to_string(), "preserve".to_string()),
            ],
            children: vec![
                Node::Text("\n    ".to_string()),
                Node::Element(Element::new(VALUE_ELEMENT)),
                Node::Text("\n  ".to_string()),
            ],
            ..Element::new(DATA_ELEMENT)
        };
        let children = &mut self.root.children;
        let trailing_ws = matches!(children.last(), Some(Node::Text(t)) if t.trim().is_empty());
        let at = if trailing_ws {
            children.len() - 1
        } else {
            children.len()
        };
        children.insert(at, Node::Text("\n  ".to_string()));
        children.insert(at + 1, Node::Element(data));
        if !trailing_ws {
            children.push(Node::Text("\n".to_string()));
        }
        at + 1
    }
}

fn as_named_data(node: &Node) -> Option<&Element> {
    match node {
        Node::Element(el) if el.is_named_data() => Some(el),
        _ => None,
    }
}

fn as_string_data(node: &Node) -> Option<&Element> {
    match node {
        Node::Element(el) if el.is_string_data() => Some(el),
        _ => None,
    }
}

fn element_from(start: BytesStart<'static>, self_closing: bool) -> std::result::Result<Element, String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        name,
        attrs,
        start: Some(start),
        self_closing,
        children: Vec::new(),
    })
}

fn emit(w: &mut Writer<Vec<u8>>, event: Event) -> std::result::Result<(), String> {
    w.write_event(event).map_err(|e| e.to_string())
}

fn write_node(w: &mut Writer<Vec<u8>>, node: &Node) -> std::result::Result<(), String> {
    match node {
        Node::Element(el) => write_element(w, el),
        Node::Text(raw) => emit(w, Event::Text(BytesText::from_escaped(raw.as_str()))),
        Node::CData(t) => emit(w, Event::CData(BytesCData::new(t.as_str()))),
        Node::Comment(t) => emit(w, Event::Comment(BytesText::from_escaped(t.as_str()))),
        Node::Markup(ev) => emit(w, ev.clone()),
    }
}

fn write_element(w: &mut Writer<Vec<u8>>, el: &Element) -> std::result::Result<(), String> {
    let start = match &el.start {
        Some(raw) => raw.borrow(),
        None => {
            let mut s = BytesStart::new(el.name.as_str());
            for (k, v) in &el.attrs {
                s.push_attribute((k.as_str(), v.as_str()));
            }
            s
        }
    };
    if el.children.is_empty() && (el.self_closing || el.start.is_none()) {
        return emit(w, Event::Empty(start));
    }
    emit(w, Event::Start(start))?;
    for child in &el.children {
        write_node(w, child)?;
    }
    emit(w, Event::End(BytesEnd::new(el.name.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ENGLISH, TARGET};

    fn english() -> ResourceDocument {
        ResourceDocument::parse(ENGLISH, Path::new("en.resx")).expect("valid resx")
    }

    #[test]
    fn single_value_is_found_once() {
        let found = english().find_by_value("Only a single value should be found.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "Single");
    }

    #[test]
    fn value_lookup_ignores_case_and_padding_in_document_order() {
        let found = english().find_by_value("  multiple KEYS matching. ");
        let keys: Vec<_> = found.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["MultiA", "MultiB", "MultiC"]);
    }

    #[test]
    fn missing_value_yields_empty_list() {
        assert!(english().find_by_value("Nothing like this {0}").is_empty());
    }

    #[test]
    fn typed_payloads_are_not_string_entries() {
        let doc = english();
        assert_eq!(doc.entries().len(), 5);
        assert!(!doc.contains_key("Logo"));
        assert!(doc.find_by_value("iVBORw0KGgo=").is_empty());
    }

    #[test]
    fn entities_are_unescaped_and_re_escaped() {
        let doc = english();
        assert_eq!(doc.value_of("greeting").as_deref(), Some("Hello {0} & welcome"));
        let text = String::from_utf8(doc.render().unwrap()).unwrap();
        assert!(text.contains("Hello {0} &amp; welcome"));
    }

    #[test]
    fn get_or_insert_creates_exactly_one_entry() {
        let mut doc = ResourceDocument::parse(TARGET, Path::new("es.resx")).unwrap();
        assert_eq!(doc.get_or_insert("NewKey"), (String::new(), true));
        assert_eq!(doc.get_or_insert("newkey"), (String::new(), false));
        assert_eq!(doc.entries().len(), 2);
        assert!(doc.set("NEWKEY", "Nuevo", false));
        assert_eq!(doc.value_of("NewKey").as_deref(), Some("Nuevo"));
    }

    #[test]
    fn set_respects_overwrite_flag() {
        let mut doc = ResourceDocument::parse(TARGET, Path::new("es.resx")).unwrap();
        assert!(!doc.set("Greeting", "Buenos días {0}", false));
        assert_eq!(doc.value_of("Greeting").as_deref(), Some("Hola {0}"));
        assert!(doc.set("Greeting", "Buenos días {0}", true));
        assert_eq!(doc.value_of("Greeting").as_deref(), Some("Buenos días {0}"));
    }

    #[test]
    fn new_entries_preserve_whitespace_and_indentation() {
        let mut doc = ResourceDocument::parse(TARGET, Path::new("es.resx")).unwrap();
        doc.set("Farewell", "Adiós", false);
        let text = String::from_utf8(doc.render().unwrap()).unwrap();
        assert!(text.contains(
            "  <data name=\"Farewell\" xml:space=\"preserve\">\n    <value>Adiós</value>\n  </data>\n</root>"
        ));
    }

    #[test]
    fn unrelated_content_survives_render() {
        let doc = english();
        let text = String::from_utf8(doc.render().unwrap()).unwrap();
        assert!(text.contains("<!-- Generated resources -->"));
        assert!(text.contains("<resheader name=\"version\">\n    <value>2.0</value>\n  </resheader>"));
        assert!(text.contains("<comment>padded on purpose</comment>"));
        assert!(text.contains("mimetype=\"application/x-microsoft.net.object.bytearray.base64\""));
        let reparsed = ResourceDocument::parse(&text, Path::new("en.resx")).unwrap();
        assert_eq!(reparsed.entries(), doc.entries());
    }

    #[test]
    fn load_then_render_is_byte_identical() {
        assert_eq!(String::from_utf8(english().render().unwrap()).unwrap(), ENGLISH);

        let quoted = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<root>\n  \
<resheader name='reader'><value>It's \"quoted\"</value></resheader>\n  \
<data name=\"Apostrophe\" xml:space=\"preserve\"><value>Don't</value></data>\n  \
<data name=\"Entities\"><value>a &quot;b&quot; &apos;c&apos; &#169;</value></data>\n  \
<data name=\"Empty\"><value></value></data>\n  \
<data name=\"Closed\"><value /></data>\n</root>";
        let doc = ResourceDocument::parse(quoted, Path::new("q.resx")).unwrap();
        assert_eq!(doc.value_of("Entities").as_deref(), Some("a \"b\" 'c' ©"));
        assert_eq!(String::from_utf8(doc.render().unwrap()).unwrap(), quoted);
    }

    #[test]
    fn editing_one_entry_leaves_the_others_untouched() {
        let src = "<?xml version=\"1.0\"?>\n<root>\n  \
<data name=\"A\"><value>Don't &quot;touch&quot;</value></data>\n  \
<data name=\"B\"><value>old</value></data>\n</root>\n";
        let mut doc = ResourceDocument::parse(src, Path::new("e.resx")).unwrap();
        assert!(doc.set("B", "It's <new> & \"fresh\"", true));
        let text = String::from_utf8(doc.render().unwrap()).unwrap();
        assert_eq!(
            text,
            src.replace("<value>old</value>", "<value>It's &lt;new&gt; &amp; \"fresh\"</value>")
        );
        let reparsed = ResourceDocument::parse(&text, Path::new("e.resx")).unwrap();
        assert_eq!(reparsed.value_of("B").as_deref(), Some("It's <new> & \"fresh\""));
    }

    #[test]
    fn prolog_markup_is_kept() {
        let src = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<?xml-stylesheet type=\"text/xsl\" href=\"resx.xsl\"?>\n\
<!DOCTYPE root>\n<root>\n</root>\n<!-- end -->\n";
        let doc = ResourceDocument::parse(src, Path::new("p.resx")).unwrap();
        assert_eq!(String::from_utf8(doc.render().unwrap()).unwrap(), src);
    }

    #[test]
    fn typed_payload_names_are_never_taken_twice() {
        let mut doc = english();
        assert!(doc.is_typed_key("logo"));
        assert!(!doc.set("Logo", "Texto", true));
        assert_eq!(doc.get_or_insert("LOGO"), (String::new(), false));
        let text = String::from_utf8(doc.render().unwrap()).unwrap();
        assert_eq!(text.matches("name=\"Logo\"").count(), 1);
        assert_eq!(text, ENGLISH);
    }

    #[test]
    fn string_entry_shadowing_a_typed_payload_is_a_duplicate() {
        let xml = r#"<root><data name="Icon" mimetype="application/x-microsoft.net.object.bytearray.base64"><value>AA==</value></data><data name="icon"><value>x</value></data></root>"#;
        let err = ResourceDocument::parse(xml, Path::new("dup.resx")).unwrap_err();
        assert!(matches!(err, ResxError::DuplicateKey { ref key, .. } if key == "icon"));
    }

    #[test]
    fn missing_root_is_a_configuration_error() {
        let err = ResourceDocument::parse("<resources><data name=\"a\"/></resources>", Path::new("x.resx"))
            .unwrap_err();
        assert!(matches!(err, ResxError::MissingRoot { .. }));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let xml = r#"<root><data name="A"><value>1</value></data><data name="a"><value>2</value></data></root>"#;
        let err = ResourceDocument::parse(xml, Path::new("dup.resx")).unwrap_err();
        assert!(matches!(err, ResxError::DuplicateKey { ref key, .. } if key == "a"));
    }

    #[test]
    fn skeleton_is_an_empty_resource_file() {
        let mut doc = ResourceDocument::skeleton(Path::new("new.resx")).unwrap();
        assert!(doc.entries().is_empty());
        doc.set("First", "Primero", false);
        let text = String::from_utf8(doc.render().unwrap()).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(text.contains("text/microsoft-resx"));
        assert!(text.contains("<data name=\"First\""));
    }
}
