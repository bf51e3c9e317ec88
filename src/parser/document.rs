// ==========================================
// 期刊文章导入 - 文档加载器
// ==========================================
// 职责: 解析 XML 为只读节点树（含 DOCTYPE 身份），并提供路径查询原语
// 工具: encoding_rs 按声明解码 → roxmltree 解析 → 节点数组（节点 ID 即文档顺序）
//       DOCTYPE 公共/系统标识由 quick-xml 读取
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::parser::xpath::{Value, XPath};
use encoding_rs::{Encoding, UTF_8};
use quick_xml::events::Event;
use quick_xml::Reader;
use roxmltree::{NodeType, ParsingOptions};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// 节点 ID（在节点数组中的下标，天然满足文档顺序）
pub type NodeId = usize;

// ==========================================
// DocTypeIdentity - 文档类型身份
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTypeIdentity {
    pub name: String,
    pub public_id: String,
    pub system_id: String,
}

impl DocTypeIdentity {
    pub fn new(name: &str, public_id: &str, system_id: &str) -> Self {
        Self {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        }
    }

    /// 解析 `<!DOCTYPE ...>` 的内容部分（不含 `<!DOCTYPE` 前缀）
    ///
    /// # 示例
    /// `article PUBLIC "-//NLM//DTD ..." "http://..."`
    pub fn parse_declaration(raw: &str) -> Option<Self> {
        // 去掉内部子集 [...]
        let head = raw.split('[').next().unwrap_or_default().trim();
        let mut rest = head;
        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let name = rest[..name_end].to_string();
        if name.is_empty() {
            return None;
        }
        rest = rest[name_end..].trim_start();

        let mut quoted = Vec::new();
        let keyword_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let keyword = rest[..keyword_end].to_ascii_uppercase();
        let mut tail = rest[keyword_end..].trim_start();
        while let Some(quote) = tail.chars().next().filter(|c| *c == '"' || *c == '\'') {
            let body = &tail[1..];
            let end = body.find(quote)?;
            quoted.push(body[..end].to_string());
            tail = body[end + 1..].trim_start();
        }

        let (public_id, system_id) = match (keyword.as_str(), quoted.as_slice()) {
            ("PUBLIC", [public, system, ..]) => (public.clone(), system.clone()),
            ("PUBLIC", [public]) => (public.clone(), String::new()),
            ("SYSTEM", [system, ..]) => (String::new(), system.clone()),
            _ => (String::new(), String::new()),
        };

        Some(Self {
            name,
            public_id,
            system_id,
        })
    }
}

// ==========================================
// 节点
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(String),
    Attribute { name: String, value: String },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<NodeId>,
}

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

// ==========================================
// Document - 只读节点树
// ==========================================
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    doc_type: Option<DocTypeIdentity>,
}

/// 外部 DTD 中声明的常见 HTML 实体（外部 DTD 不加载）
fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "nbsp" => Some('\u{a0}'),
        "ndash" => Some('\u{2013}'),
        "mdash" => Some('\u{2014}'),
        "hellip" => Some('\u{2026}'),
        "lsquo" => Some('\u{2018}'),
        "rsquo" => Some('\u{2019}'),
        "ldquo" => Some('\u{201c}'),
        "rdquo" => Some('\u{201d}'),
        "laquo" => Some('\u{ab}'),
        "raquo" => Some('\u{bb}'),
        "copy" => Some('\u{a9}'),
        "reg" => Some('\u{ae}'),
        "deg" => Some('\u{b0}'),
        "plusmn" => Some('\u{b1}'),
        "times" => Some('\u{d7}'),
        "middot" => Some('\u{b7}'),
        "thinsp" => Some('\u{2009}'),
        _ => None,
    }
}

/// 将表中的命名实体改写为字符引用（CDATA 段原样保留）
fn expand_entities(xml: &str) -> Cow<'_, str> {
    if !xml.contains('&') {
        return Cow::Borrowed(xml);
    }

    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(pos) = rest.find(['&', '<']) {
        let (head, tail) = rest.split_at(pos);
        out.push_str(head);

        if tail.starts_with("<![CDATA[") {
            let end = tail.find("]]>").map(|i| i + 3).unwrap_or(tail.len());
            out.push_str(&tail[..end]);
            rest = &tail[end..];
            continue;
        }
        if tail.starts_with('<') {
            out.push('<');
            rest = &tail[1..];
            continue;
        }

        let entity = tail[1..]
            .char_indices()
            .take(12)
            .find(|(_, c)| *c == ';')
            .and_then(|(end, _)| resolve_entity(&tail[1..1 + end]).map(|c| (end, c)));
        match entity {
            Some((end, c)) => {
                out.push_str(&format!("&#{};", u32::from(c)));
                rest = &tail[end + 2..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// 读取 DOCTYPE 声明（roxmltree 不保留公共/系统标识）
fn read_doc_type(xml: &str) -> Option<DocTypeIdentity> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::DocType(e)) => {
                return std::str::from_utf8(&e)
                    .ok()
                    .and_then(DocTypeIdentity::parse_declaration)
            }
            Ok(Event::Start(_)) | Ok(Event::Empty(_)) | Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// 元素/属性的限定名（带前缀时为 `prefix:local`）
fn qualified_name(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    let prefix = match namespace {
        Some(XML_NAMESPACE) => Some("xml"),
        Some(uri) => node.lookup_prefix(uri),
        None => None,
    };
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
        _ => local.to_string(),
    }
}

impl Document {
    pub const DOCUMENT_NODE: NodeId = 0;

    /// 解析 XML 文本
    ///
    /// # 返回
    /// - Err(XmlParse): 非良构 XML（含未闭合元素、无根元素、未知实体）
    pub fn parse(xml: &str, source: &str) -> ImportResult<Self> {
        let xml = expand_entities(xml);

        let mut options = ParsingOptions::default();
        options.allow_dtd = true;
        let tree = roxmltree::Document::parse_with_options(&xml, options).map_err(|e| {
            ImportError::XmlParse {
                path: source.to_string(),
                message: e.to_string(),
            }
        })?;

        let mut doc = Document {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                attributes: Vec::new(),
            }],
            doc_type: read_doc_type(&xml),
        };
        doc.append_element(tree.root_element(), Self::DOCUMENT_NODE);
        Ok(doc)
    }

    /// 按文档顺序复制元素子树（属性紧随所属元素）
    fn append_element(&mut self, node: roxmltree::Node<'_, '_>, parent: NodeId) {
        let tag = node.tag_name();
        let name = qualified_name(node, tag.namespace(), tag.name());
        let element = self.push_node(NodeKind::Element(name), parent);
        self.nodes[parent].children.push(element);

        for attr in node.attributes() {
            let kind = NodeKind::Attribute {
                name: qualified_name(node, attr.namespace(), attr.name()),
                value: attr.value().to_string(),
            };
            let attr_id = self.push_node(kind, element);
            self.nodes[element].attributes.push(attr_id);
        }

        for child in node.children() {
            match child.node_type() {
                NodeType::Element => self.append_element(child, element),
                NodeType::Text => self.append_text(element, child.text().unwrap_or_default()),
                _ => {}
            }
        }
    }

    fn push_node(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            attributes: Vec::new(),
        });
        self.nodes.len() - 1
    }

    /// 追加文本（相邻文本节点合并）
    fn append_text(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(&last) = self.nodes[parent].children.last() {
            if let NodeKind::Text(existing) = &mut self.nodes[last].kind {
                existing.push_str(text);
                return;
            }
        }
        let id = self.push_node(NodeKind::Text(text.to_string()), parent);
        self.nodes[parent].children.push(id);
    }

    // ===== 访问器 =====

    pub fn doc_type(&self) -> Option<&DocTypeIdentity> {
        self.doc_type.as_ref()
    }

    pub fn root_element(&self) -> Option<NodeId> {
        self.nodes[Self::DOCUMENT_NODE]
            .children
            .iter()
            .copied()
            .find(|id| matches!(self.nodes[*id].kind, NodeKind::Element(_)))
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].attributes
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id].kind, NodeKind::Element(_))
    }

    /// 节点名称（元素/属性的限定名；其他节点为空串）
    pub fn name(&self, id: NodeId) -> &str {
        match &self.nodes[id].kind {
            NodeKind::Element(name) => name,
            NodeKind::Attribute { name, .. } => name,
            _ => "",
        }
    }

    /// 读取元素属性值
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id].attributes.iter().find_map(|attr| match &self.nodes[*attr].kind {
            NodeKind::Attribute { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// XPath 字符串值：元素为全部后代文本拼接，属性为属性值
    pub fn string_value(&self, id: NodeId) -> String {
        match &self.nodes[id].kind {
            NodeKind::Attribute { value, .. } => value.clone(),
            NodeKind::Text(text) => text.clone(),
            NodeKind::Document | NodeKind::Element(_) => {
                let mut out = String::new();
                self.collect_text(id, &mut out);
                out
            }
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for child in &self.nodes[id].children {
            match &self.nodes[*child].kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Element(_) => self.collect_text(*child, out),
                _ => {}
            }
        }
    }

    /// 全部后代（不含自身，文档顺序，不含属性）
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(next) = pending.pop() {
            out.push(next);
            pending.extend(self.nodes[next].children.iter().rev().copied());
        }
        out
    }
}

/// XML 声明中的 encoding 标签
fn declared_encoding(raw: &[u8]) -> Option<String> {
    let mut reader = Reader::from_reader(raw);
    loop {
        match reader.read_event() {
            Ok(Event::Decl(decl)) => {
                return decl
                    .encoding()
                    .and_then(|label| label.ok())
                    .map(|label| String::from_utf8_lossy(&label).trim().to_string());
            }
            Ok(Event::Comment(_)) | Ok(Event::PI(_)) => {}
            Ok(Event::Text(ref text)) if text.iter().all(u8::is_ascii_whitespace) => {}
            _ => return None,
        }
    }
}

/// 解码元数据文件：BOM 优先，其次 XML 声明，默认 UTF-8
///
/// # 返回
/// - Err(XmlParse): 未知编码，或内容不符合所用编码
pub fn decode_xml(raw: &[u8], source: &str) -> ImportResult<String> {
    let parse_error = |message: String| ImportError::XmlParse {
        path: source.to_string(),
        message,
    };

    let encoding = match Encoding::for_bom(raw) {
        Some((encoding, _)) => encoding,
        None => match declared_encoding(raw) {
            Some(label) => Encoding::for_label(label.as_bytes())
                .ok_or_else(|| parse_error(format!("不支持的编码: {}", label)))?,
            None => UTF_8,
        },
    };

    let (text, used, had_errors) = encoding.decode(raw);
    if had_errors {
        return Err(parse_error(format!("内容不符合 {} 编码", used.name())));
    }
    Ok(text.into_owned())
}

/// 去除标记标签（等价于 strip_tags 的简化实现）
pub fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

// ==========================================
// DocumentContext - 单次解析的文档上下文
// ==========================================
// 生命周期: 一次解析器执行；默认上下文节点为根元素
#[derive(Debug, Clone)]
pub struct DocumentContext {
    path: PathBuf,
    document: Document,
    root: NodeId,
}

impl DocumentContext {
    /// 读取并解析元数据文件
    pub fn load(path: &Path) -> ImportResult<Self> {
        let raw = std::fs::read(path).map_err(|e| ImportError::file_read(path, e))?;
        let text = decode_xml(&raw, &path.display().to_string())?;
        Self::parse_str(&text, path)
    }

    /// 从 XML 文本构造（path 仅用于定位同目录资源与错误信息）
    pub fn parse_str(xml: &str, path: &Path) -> ImportResult<Self> {
        let document = Document::parse(xml, &path.display().to_string())?;
        let root = document.root_element().unwrap_or(Document::DOCUMENT_NODE);
        Ok(Self {
            path: path.to_path_buf(),
            document,
            root,
        })
    }

    /// 校验文档类型身份（系统标识、公共标识、根元素名必须全部一致）
    ///
    /// # 返回
    /// - Err(InvalidDocType): 不在可接受列表中（调度器据此尝试下一个解析器）
    pub fn validate_doc_type(&self, accepted: &[DocTypeIdentity]) -> ImportResult<()> {
        match self.document.doc_type() {
            Some(found) if accepted.iter().any(|id| id == found) => Ok(()),
            Some(found) => Err(ImportError::InvalidDocType(format!(
                "{} \"{}\" \"{}\"",
                found.name, found.public_id, found.system_id
            ))),
            None => Err(ImportError::InvalidDocType("缺少 DOCTYPE 声明".to_string())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// 求值路径表达式，返回原始结果
    pub fn evaluate(&self, expr: &str, context: Option<NodeId>) -> ImportResult<Value> {
        let xpath = XPath::compile(expr)?;
        Ok(xpath.evaluate(&self.document, context.unwrap_or(self.root)))
    }

    /// 选择节点集（非节点集结果视为空）
    pub fn select(&self, expr: &str, context: Option<NodeId>) -> ImportResult<Vec<NodeId>> {
        match self.evaluate(expr, context)? {
            Value::Nodes(nodes) => Ok(nodes),
            _ => Ok(Vec::new()),
        }
    }

    /// 选择第一个节点
    pub fn select_first(&self, expr: &str, context: Option<NodeId>) -> ImportResult<Option<NodeId>> {
        Ok(self.select(expr, context)?.into_iter().next())
    }

    /// 以字符串求值，去除标签并修剪空白
    pub fn select_text(&self, expr: &str, context: Option<NodeId>) -> ImportResult<String> {
        let value = self.evaluate(expr, context)?;
        let text = value.to_xpath_string(&self.document);
        Ok(strip_tags(text.trim()))
    }

    /// 以数值求值（count(...) 等）
    pub fn select_number(&self, expr: &str, context: Option<NodeId>) -> ImportResult<f64> {
        Ok(self.evaluate(expr, context)?.to_number(&self.document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JATS_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE article PUBLIC "-//NLM//DTD Journal Archiving with OASIS Tables v3.0 20080202//EN" "http://dtd.nlm.nih.gov/archiving/3.0/archive-oasis-article3.dtd">"#;

    #[test]
    fn test_parse_doctype_public() {
        let id = DocTypeIdentity::parse_declaration(
            r#"Publisher PUBLIC "-//Springer-Verlag//DTD A++ V2.4//EN" "http://devel.springer.de/A++/V2.4/DTD/A++V2.4.dtd""#,
        )
        .unwrap();
        assert_eq!(id.name, "Publisher");
        assert_eq!(id.public_id, "-//Springer-Verlag//DTD A++ V2.4//EN");
        assert_eq!(id.system_id, "http://devel.springer.de/A++/V2.4/DTD/A++V2.4.dtd");
    }

    #[test]
    fn test_parse_doctype_system_with_subset() {
        let id = DocTypeIdentity::parse_declaration(r#"article SYSTEM "local.dtd" [ <!ENTITY x "y"> ]"#)
            .unwrap();
        assert_eq!(id.name, "article");
        assert_eq!(id.public_id, "");
        assert_eq!(id.system_id, "local.dtd");
    }

    #[test]
    fn test_document_tree_and_text() {
        let xml = format!(
            "{}<article xml:lang=\"en\"><front><title>A &amp; B&nbsp;C</title><p><![CDATA[<b>x</b>y]]></p></front></article>",
            JATS_HEAD
        );
        let ctx = DocumentContext::parse_str(&xml, Path::new("a.xml")).unwrap();
        let doc = ctx.document();
        let root = ctx.root();
        assert_eq!(doc.name(root), "article");
        assert_eq!(doc.attribute(root, "xml:lang"), Some("en"));
        assert_eq!(doc.doc_type().unwrap().name, "article");

        let title = ctx.select_first("front/title", None).unwrap().unwrap();
        assert_eq!(doc.string_value(title), "A & B\u{a0}C");
        assert_eq!(ctx.select_text("front/p", None).unwrap(), "xy");
    }

    #[test]
    fn test_malformed_xml_rejected() {
        let err = DocumentContext::parse_str("<a><b></a>", Path::new("bad.xml")).unwrap_err();
        assert!(matches!(err, ImportError::XmlParse { .. }));

        let err = DocumentContext::parse_str("<a>", Path::new("open.xml")).unwrap_err();
        assert!(matches!(err, ImportError::XmlParse { .. }));

        let err = DocumentContext::parse_str("   ", Path::new("empty.xml")).unwrap_err();
        assert!(matches!(err, ImportError::XmlParse { .. }));
    }

    #[test]
    fn test_validate_doc_type() {
        let xml = format!("{}<article/>", JATS_HEAD);
        let ctx = DocumentContext::parse_str(&xml, Path::new("a.xml")).unwrap();
        let accepted = DocTypeIdentity::new(
            "article",
            "-//NLM//DTD Journal Archiving with OASIS Tables v3.0 20080202//EN",
            "http://dtd.nlm.nih.gov/archiving/3.0/archive-oasis-article3.dtd",
        );
        assert!(ctx.validate_doc_type(&[accepted.clone()]).is_ok());

        let other = DocTypeIdentity::new("Publisher", "x", "y");
        assert!(matches!(
            ctx.validate_doc_type(&[other]),
            Err(ImportError::InvalidDocType(_))
        ));

        let bare = DocumentContext::parse_str("<article/>", Path::new("b.xml")).unwrap();
        assert!(matches!(
            bare.validate_doc_type(&[accepted]),
            Err(ImportError::InvalidDocType(_))
        ));
    }

    #[test]
    fn test_namespaced_names_keep_prefix() {
        let xml = r#"<article xmlns:xlink="http://www.w3.org/1999/xlink"><license xlink:href="https://example.org/l"/></article>"#;
        let ctx = DocumentContext::parse_str(xml, Path::new("ns.xml")).unwrap();
        assert_eq!(
            ctx.select_text("license/@xlink:href", None).unwrap(),
            "https://example.org/l"
        );
    }

    #[test]
    fn test_entities_in_cdata_untouched() {
        let xml = "<a><b>x&ndash;y</b><c><![CDATA[&nbsp;]]></c></a>";
        let ctx = DocumentContext::parse_str(xml, Path::new("e.xml")).unwrap();
        assert_eq!(ctx.select_text("b", None).unwrap(), "x\u{2013}y");
        assert_eq!(ctx.select_text("c", None).unwrap(), "&nbsp;");
    }

    #[test]
    fn test_decode_declared_latin1() {
        let mut raw = br#"<?xml version="1.0" encoding="ISO-8859-1"?><t>Caf"#.to_vec();
        raw.push(0xE9);
        raw.extend_from_slice(b"</t>");

        let text = decode_xml(&raw, "latin1.xml").unwrap();
        let ctx = DocumentContext::parse_str(&text, Path::new("latin1.xml")).unwrap();
        assert_eq!(ctx.select_text(".", None).unwrap(), "Caf\u{e9}");
    }

    #[test]
    fn test_decode_rejects_invalid_utf8_and_unknown_label() {
        let err = decode_xml(b"<t>Caf\xE9</t>", "bad.xml").unwrap_err();
        assert!(matches!(err, ImportError::XmlParse { .. }));

        let err = decode_xml(br#"<?xml version="1.0" encoding="x-klingon"?><t/>"#, "k.xml").unwrap_err();
        assert!(matches!(err, ImportError::XmlParse { .. }));
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("a <b>bold</b> c"), "a bold c");
        assert_eq!(strip_tags("x > y"), "x > y");
    }
}
