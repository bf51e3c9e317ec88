// ==========================================
// 期刊文章导入 - 路径查询引擎（XPath 子集）
// ==========================================
// 支持:
// - 绝对/相对路径、`//`、`.`、`..`、`*`、`@attr`、`text()`、`node()`
// - 轴: child / descendant / descendant-or-self / self / parent / attribute
// - 谓词（布尔或位置）、并集 `|`、比较、and/or
// - 函数: count string normalize-space not name local-name concat contains
//         starts-with position last true false boolean number
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::parser::document::{Document, NodeId, NodeKind};

// ==========================================
// 求值结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nodes(Vec<NodeId>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl Value {
    /// 字符串转换（节点集取第一个节点的字符串值）
    pub fn to_xpath_string(&self, doc: &Document) -> String {
        match self {
            Value::Nodes(nodes) => nodes
                .first()
                .map(|id| doc.string_value(*id))
                .unwrap_or_default(),
            Value::String(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Boolean(b) => b.to_string(),
        }
    }

    pub fn to_number(&self, doc: &Document) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            _ => parse_number(&self.to_xpath_string(doc)),
        }
    }

    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Nodes(nodes) => !nodes.is_empty(),
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Boolean(b) => *b,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn parse_number(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

// ==========================================
// 词法
// ==========================================
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    Dot,
    DotDot,
    At,
    Star,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Pipe,
    DoubleColon,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Name(String),
    Literal(String),
    Number(f64),
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '/' if next == Some('/') => {
                tokens.push(Token::DoubleSlash);
                i += 2;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '.' if next == Some('.') => {
                tokens.push(Token::DotDot);
                i += 2;
            }
            '.' if next.map_or(false, |n| n.is_ascii_digit()) => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let raw: String = chars[start..i].iter().collect();
                tokens.push(Token::Number(parse_number(&raw)));
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '@' => {
                tokens.push(Token::At);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            ':' if next == Some(':') => {
                tokens.push(Token::DoubleColon);
                i += 2;
            }
            '=' => {
                tokens.push(Token::Eq);
                i += 1;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::NotEq);
                i += 2;
            }
            '<' if next == Some('=') => {
                tokens.push(Token::Le);
                i += 2;
            }
            '<' => {
                tokens.push(Token::Lt);
                i += 1;
            }
            '>' if next == Some('=') => {
                tokens.push(Token::Ge);
                i += 2;
            }
            '>' => {
                tokens.push(Token::Gt);
                i += 1;
            }
            '"' | '\'' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|ch| *ch == c)
                    .ok_or_else(|| "字符串字面量未闭合".to_string())?;
                tokens.push(Token::Literal(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            _ if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let raw: String = chars[start..i].iter().collect();
                tokens.push(Token::Number(parse_number(&raw)));
            }
            _ if is_name_start(c) => {
                let start = i;
                while i < chars.len() && is_name_char(chars[i]) {
                    // `a::b` 中的冒号属于轴分隔符
                    if chars[i] == ':' && chars.get(i + 1) == Some(&':') {
                        break;
                    }
                    i += 1;
                }
                tokens.push(Token::Name(chars[start..i].iter().collect()));
            }
            _ => return Err(format!("无法识别的字符 '{}'", c)),
        }
    }

    Ok(tokens)
}

// ==========================================
// 语法树
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfAxis,
    Parent,
    Attribute,
}

#[derive(Debug, Clone, PartialEq)]
enum NodeTest {
    Name(String),
    Any,
    Text,
    Node,
}

#[derive(Debug, Clone)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Union(Box<Expr>, Box<Expr>),
    /// 路径：absolute=true 时从文档节点开始；start 为过滤表达式起点
    Path {
        absolute: bool,
        start: Option<Box<Expr>>,
        steps: Vec<Step>,
    },
    Filter(Box<Expr>, Vec<Expr>),
    Literal(String),
    Number(f64),
    Function(String, Vec<Expr>),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), String> {
        match self.next() {
            Some(ref t) if *t == expected => Ok(()),
            other => Err(format!("期望 {:?}，实际 {:?}", expected, other)),
        }
    }

    fn is_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Name(n)) if n == word)
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and()?;
        while self.is_keyword("or") {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_equality()?;
        while self.is_keyword("and") {
            self.pos += 1;
            let right = self.parse_equality()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CompareOp::Eq,
                Some(Token::NotEq) => CompareOp::NotEq,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_relational()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_union()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::Le) => CompareOp::Le,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::Ge) => CompareOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_union()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_union(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_path()?;
        while matches!(self.peek(), Some(Token::Pipe)) {
            self.pos += 1;
            let right = self.parse_path()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// 当前位置是否为函数调用（名称 + 左括号，且不是节点类型测试）
    fn at_function_call(&self) -> bool {
        match (self.peek(), self.peek_at(1)) {
            (Some(Token::Name(name)), Some(Token::LParen)) => name != "text" && name != "node",
            _ => false,
        }
    }

    fn parse_path(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                let steps = if self.at_step_start() {
                    self.parse_relative_steps()?
                } else {
                    Vec::new()
                };
                Ok(Expr::Path {
                    absolute: true,
                    start: None,
                    steps,
                })
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                let mut steps = vec![descendant_or_self_step()];
                steps.extend(self.parse_relative_steps()?);
                Ok(Expr::Path {
                    absolute: true,
                    start: None,
                    steps,
                })
            }
            Some(Token::Literal(_)) | Some(Token::Number(_)) | Some(Token::LParen) => {
                self.parse_filter_path()
            }
            _ if self.at_function_call() => self.parse_filter_path(),
            _ => Ok(Expr::Path {
                absolute: false,
                start: None,
                steps: self.parse_relative_steps()?,
            }),
        }
    }

    fn parse_filter_path(&mut self) -> Result<Expr, String> {
        let primary = self.parse_primary()?;
        let mut predicates = Vec::new();
        while matches!(self.peek(), Some(Token::LBracket)) {
            predicates.push(self.parse_predicate()?);
        }
        let filtered = if predicates.is_empty() {
            primary
        } else {
            Expr::Filter(Box::new(primary), predicates)
        };

        let mut steps = Vec::new();
        match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                steps = self.parse_relative_steps()?;
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                steps.push(descendant_or_self_step());
                steps.extend(self.parse_relative_steps()?);
            }
            _ => {}
        }

        if steps.is_empty() {
            Ok(filtered)
        } else {
            Ok(Expr::Path {
                absolute: false,
                start: Some(Box::new(filtered)),
                steps,
            })
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Literal(s)) => Ok(Expr::Literal(s)),
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Name(name)) => {
                self.expect(Token::LParen)?;
                let mut args = Vec::new();
                if !matches!(self.peek(), Some(Token::RParen)) {
                    args.push(self.parse_or()?);
                    while matches!(self.peek(), Some(Token::Comma)) {
                        self.pos += 1;
                        args.push(self.parse_or()?);
                    }
                }
                self.expect(Token::RParen)?;
                Ok(Expr::Function(name, args))
            }
            other => Err(format!("意外的记号 {:?}", other)),
        }
    }

    fn at_step_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Name(_)) | Some(Token::Star) | Some(Token::At) | Some(Token::Dot) | Some(Token::DotDot)
        )
    }

    fn parse_relative_steps(&mut self) -> Result<Vec<Step>, String> {
        let mut steps = vec![self.parse_step()?];
        loop {
            match self.peek() {
                Some(Token::Slash) => {
                    self.pos += 1;
                    steps.push(self.parse_step()?);
                }
                Some(Token::DoubleSlash) => {
                    self.pos += 1;
                    steps.push(descendant_or_self_step());
                    steps.push(self.parse_step()?);
                }
                _ => break,
            }
        }
        Ok(steps)
    }

    fn parse_step(&mut self) -> Result<Step, String> {
        match self.peek() {
            Some(Token::Dot) => {
                self.pos += 1;
                return Ok(Step {
                    axis: Axis::SelfAxis,
                    test: NodeTest::Node,
                    predicates: Vec::new(),
                });
            }
            Some(Token::DotDot) => {
                self.pos += 1;
                return Ok(Step {
                    axis: Axis::Parent,
                    test: NodeTest::Node,
                    predicates: Vec::new(),
                });
            }
            _ => {}
        }

        let mut axis = Axis::Child;
        if matches!(self.peek(), Some(Token::At)) {
            self.pos += 1;
            axis = Axis::Attribute;
        } else if let (Some(Token::Name(name)), Some(Token::DoubleColon)) = (self.peek(), self.peek_at(1)) {
            axis = match name.as_str() {
                "child" => Axis::Child,
                "descendant" => Axis::Descendant,
                "descendant-or-self" => Axis::DescendantOrSelf,
                "self" => Axis::SelfAxis,
                "parent" => Axis::Parent,
                "attribute" => Axis::Attribute,
                other => return Err(format!("不支持的轴 {}", other)),
            };
            self.pos += 2;
        }

        let test = match self.next() {
            Some(Token::Star) => NodeTest::Any,
            Some(Token::Name(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) && (name == "text" || name == "node") {
                    self.pos += 1;
                    self.expect(Token::RParen)?;
                    if name == "text" {
                        NodeTest::Text
                    } else {
                        NodeTest::Node
                    }
                } else {
                    NodeTest::Name(name)
                }
            }
            other => return Err(format!("期望节点测试，实际 {:?}", other)),
        };

        let mut predicates = Vec::new();
        while matches!(self.peek(), Some(Token::LBracket)) {
            predicates.push(self.parse_predicate()?);
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_predicate(&mut self) -> Result<Expr, String> {
        self.expect(Token::LBracket)?;
        let expr = self.parse_or()?;
        self.expect(Token::RBracket)?;
        Ok(expr)
    }
}

fn descendant_or_self_step() -> Step {
    Step {
        axis: Axis::DescendantOrSelf,
        test: NodeTest::Node,
        predicates: Vec::new(),
    }
}

// ==========================================
// 求值
// ==========================================
#[derive(Debug, Clone, Copy)]
struct EvalContext {
    node: NodeId,
    position: usize,
    size: usize,
}

/// 编译后的路径表达式
#[derive(Debug, Clone)]
pub struct XPath {
    expr: Expr,
}

impl XPath {
    /// 编译表达式
    pub fn compile(source: &str) -> ImportResult<Self> {
        let to_error = |message: String| ImportError::PathExpression {
            expr: source.to_string(),
            message,
        };
        let tokens = tokenize(source).map_err(to_error)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or().map_err(to_error)?;
        if parser.pos < parser.tokens.len() {
            return Err(to_error(format!("多余的记号 {:?}", parser.peek())));
        }
        Ok(Self { expr })
    }

    /// 以 context 为上下文节点求值
    pub fn evaluate(&self, doc: &Document, context: NodeId) -> Value {
        let ctx = EvalContext {
            node: context,
            position: 1,
            size: 1,
        };
        eval(&self.expr, doc, ctx)
    }
}

fn eval(expr: &Expr, doc: &Document, ctx: EvalContext) -> Value {
    match expr {
        Expr::Literal(s) => Value::String(s.clone()),
        Expr::Number(n) => Value::Number(*n),
        Expr::Or(a, b) => Value::Boolean(eval(a, doc, ctx).to_boolean() || eval(b, doc, ctx).to_boolean()),
        Expr::And(a, b) => Value::Boolean(eval(a, doc, ctx).to_boolean() && eval(b, doc, ctx).to_boolean()),
        Expr::Compare(op, a, b) => {
            Value::Boolean(compare(*op, &eval(a, doc, ctx), &eval(b, doc, ctx), doc))
        }
        Expr::Union(a, b) => {
            let mut nodes = as_nodes(eval(a, doc, ctx));
            nodes.extend(as_nodes(eval(b, doc, ctx)));
            Value::Nodes(normalize(nodes))
        }
        Expr::Filter(primary, predicates) => {
            let nodes = as_nodes(eval(primary, doc, ctx));
            Value::Nodes(apply_predicates(nodes, predicates, doc))
        }
        Expr::Path {
            absolute,
            start,
            steps,
        } => {
            let mut current = if *absolute {
                vec![Document::DOCUMENT_NODE]
            } else if let Some(start) = start {
                as_nodes(eval(start, doc, ctx))
            } else {
                vec![ctx.node]
            };
            for step in steps {
                let mut next = Vec::new();
                for node in &current {
                    let candidates = axis_nodes(doc, *node, step.axis)
                        .into_iter()
                        .filter(|id| matches_test(doc, *id, step.axis, &step.test))
                        .collect::<Vec<_>>();
                    next.extend(apply_predicates(candidates, &step.predicates, doc));
                }
                current = normalize(next);
            }
            Value::Nodes(current)
        }
        Expr::Function(name, args) => call_function(name, args, doc, ctx),
    }
}

fn as_nodes(value: Value) -> Vec<NodeId> {
    match value {
        Value::Nodes(nodes) => nodes,
        _ => Vec::new(),
    }
}

/// 文档顺序 + 去重（节点 ID 即文档顺序）
fn normalize(mut nodes: Vec<NodeId>) -> Vec<NodeId> {
    nodes.sort_unstable();
    nodes.dedup();
    nodes
}

fn apply_predicates(mut nodes: Vec<NodeId>, predicates: &[Expr], doc: &Document) -> Vec<NodeId> {
    for predicate in predicates {
        let size = nodes.len();
        nodes = nodes
            .into_iter()
            .enumerate()
            .filter(|(index, node)| {
                let ctx = EvalContext {
                    node: *node,
                    position: index + 1,
                    size,
                };
                match eval(predicate, doc, ctx) {
                    Value::Number(n) => n == (index + 1) as f64,
                    other => other.to_boolean(),
                }
            })
            .map(|(_, node)| node)
            .collect();
    }
    nodes
}

fn axis_nodes(doc: &Document, node: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => doc.children(node).to_vec(),
        Axis::Descendant => doc.descendants(node),
        Axis::DescendantOrSelf => {
            let mut out = vec![node];
            out.extend(doc.descendants(node));
            out
        }
        Axis::SelfAxis => vec![node],
        Axis::Parent => doc.parent(node).into_iter().collect(),
        Axis::Attribute => doc.attributes(node).to_vec(),
    }
}

fn matches_test(doc: &Document, node: NodeId, axis: Axis, test: &NodeTest) -> bool {
    let kind = doc.kind(node);
    match test {
        NodeTest::Node => true,
        NodeTest::Text => matches!(kind, NodeKind::Text(_)),
        NodeTest::Any => match axis {
            Axis::Attribute => matches!(kind, NodeKind::Attribute { .. }),
            _ => matches!(kind, NodeKind::Element(_)),
        },
        NodeTest::Name(name) => match (axis, kind) {
            (Axis::Attribute, NodeKind::Attribute { name: n, .. }) => n == name,
            (Axis::Attribute, _) => false,
            (_, NodeKind::Element(n)) => n == name,
            _ => false,
        },
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value, doc: &Document) -> bool {
    match (left, right) {
        (Value::Nodes(a), Value::Nodes(b)) => a.iter().any(|x| {
            let xs = doc.string_value(*x);
            b.iter()
                .any(|y| compare_atomic(op, &Value::String(xs.clone()), &Value::String(doc.string_value(*y)), doc))
        }),
        (Value::Nodes(nodes), other) => nodes
            .iter()
            .any(|n| compare_atomic(op, &node_as(other, doc.string_value(*n)), other, doc)),
        (other, Value::Nodes(nodes)) => nodes
            .iter()
            .any(|n| compare_atomic(op, other, &node_as(other, doc.string_value(*n)), doc)),
        _ => compare_atomic(op, left, right, doc),
    }
}

/// 节点与原子值比较时，节点按对方类型转换
fn node_as(other: &Value, string_value: String) -> Value {
    match other {
        Value::Number(_) => Value::Number(parse_number(&string_value)),
        Value::Boolean(_) => Value::Boolean(!string_value.is_empty()),
        _ => Value::String(string_value),
    }
}

fn compare_atomic(op: CompareOp, left: &Value, right: &Value, doc: &Document) -> bool {
    match op {
        CompareOp::Eq | CompareOp::NotEq => {
            let equal = match (left, right) {
                (Value::Boolean(_), _) | (_, Value::Boolean(_)) => left.to_boolean() == right.to_boolean(),
                (Value::Number(_), _) | (_, Value::Number(_)) => left.to_number(doc) == right.to_number(doc),
                _ => left.to_xpath_string(doc) == right.to_xpath_string(doc),
            };
            if op == CompareOp::Eq {
                equal
            } else {
                !equal
            }
        }
        _ => {
            let (a, b) = (left.to_number(doc), right.to_number(doc));
            match op {
                CompareOp::Lt => a < b,
                CompareOp::Le => a <= b,
                CompareOp::Gt => a > b,
                _ => a >= b,
            }
        }
    }
}

fn call_function(name: &str, args: &[Expr], doc: &Document, ctx: EvalContext) -> Value {
    let arg = |i: usize| args.get(i).map(|a| eval(a, doc, ctx));
    let string_arg = |i: usize| match arg(i) {
        Some(v) => v.to_xpath_string(doc),
        None => doc.string_value(ctx.node),
    };

    match name {
        "count" => Value::Number(arg(0).map(|v| as_nodes(v).len()).unwrap_or(0) as f64),
        "string" => Value::String(string_arg(0)),
        "normalize-space" => Value::String(string_arg(0).split_whitespace().collect::<Vec<_>>().join(" ")),
        "not" => Value::Boolean(!arg(0).map(|v| v.to_boolean()).unwrap_or(false)),
        "boolean" => Value::Boolean(arg(0).map(|v| v.to_boolean()).unwrap_or(false)),
        "number" => Value::Number(match arg(0) {
            Some(v) => v.to_number(doc),
            None => parse_number(&doc.string_value(ctx.node)),
        }),
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        "position" => Value::Number(ctx.position as f64),
        "last" => Value::Number(ctx.size as f64),
        "name" | "local-name" => {
            let node = match arg(0) {
                Some(v) => as_nodes(v).first().copied(),
                None => Some(ctx.node),
            };
            let full = node.map(|n| doc.name(n).to_string()).unwrap_or_default();
            if name == "local-name" {
                Value::String(full.rsplit(':').next().unwrap_or_default().to_string())
            } else {
                Value::String(full)
            }
        }
        "concat" => Value::String(
            (0..args.len())
                .map(|i| arg(i).map(|v| v.to_xpath_string(doc)).unwrap_or_default())
                .collect(),
        ),
        "contains" => Value::Boolean(string_arg(0).contains(&string_arg(1))),
        "starts-with" => Value::Boolean(string_arg(0).starts_with(&string_arg(1))),
        // 未知函数按空节点集处理
        _ => Value::Nodes(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<article>
  <front>
    <article-meta>
      <article-id pub-id-type="doi">10.1000/xyz</article-id>
      <article-id pub-id-type="publisher-id">abc-1</article-id>
      <pub-date pub-type="collection"><year>2019</year></pub-date>
      <pub-date pub-type="epub"><year>2018</year><month>5</month></pub-date>
      <aff id="a1"><institution>Univ A</institution></aff>
    </article-meta>
  </front>
  <back><ref-list><ref>R1</ref><ref>R2</ref></ref-list></back>
</article>"#;

    fn eval_str(expr: &str) -> (Document, Value) {
        let doc = Document::parse(XML, "test.xml").unwrap();
        let root = doc.root_element().unwrap();
        let value = XPath::compile(expr).unwrap().evaluate(&doc, root);
        (doc, value)
    }

    fn text(expr: &str) -> String {
        let (doc, value) = eval_str(expr);
        value.to_xpath_string(&doc)
    }

    #[test]
    fn test_relative_and_absolute_paths() {
        assert_eq!(text("front/article-meta/article-id"), "10.1000/xyz");
        assert_eq!(text("/article/back/ref-list/ref[2]"), "R2");
        assert_eq!(text("//institution"), "Univ A");
        assert_eq!(text("front/article-meta/aff/@id"), "a1");
    }

    #[test]
    fn test_attribute_predicates() {
        assert_eq!(
            text("front/article-meta/article-id[@pub-id-type='publisher-id']"),
            "abc-1"
        );
        assert_eq!(
            text("front/article-meta/pub-date[@pub-type!='collection']/year"),
            "2018"
        );
        assert_eq!(text("front/article-meta/aff[@id=\"a1\"]//institution"), "Univ A");
    }

    #[test]
    fn test_count_and_comparison() {
        let (doc, value) = eval_str("count(back/ref-list/ref)");
        assert_eq!(value.to_number(&doc), 2.0);
        let (_, value) = eval_str("count(front/article-meta/pub-date[@pub-type='print']) > 0");
        assert_eq!(value, Value::Boolean(false));
        let (_, value) = eval_str("count(//ref) > 1 and not(//missing)");
        assert_eq!(value, Value::Boolean(true));
    }

    #[test]
    fn test_union_in_document_order() {
        let (doc, value) = eval_str("back/ref-list/ref | front/article-meta/aff");
        let nodes = as_nodes(value);
        assert_eq!(nodes.len(), 3);
        assert_eq!(doc.name(nodes[0]), "aff");
        assert_eq!(doc.string_value(nodes[2]), "R2");
    }

    #[test]
    fn test_string_functions_and_self() {
        assert_eq!(text("string(front/article-meta/article-id/@pub-id-type)"), "doi");
        assert_eq!(text("name(.)"), "article");
        assert_eq!(text("normalize-space(front/article-meta/aff)"), "Univ A");
        assert_eq!(text("concat('a', 'b', 1)"), "ab1");
    }

    #[test]
    fn test_text_node_and_parent() {
        assert_eq!(text("back/ref-list/ref[1]/text()"), "R1");
        assert_eq!(text("name(back/ref-list/..)"), "back");
    }

    #[test]
    fn test_syntax_error_reported() {
        assert!(matches!(
            XPath::compile("front/[").unwrap_err(),
            ImportError::PathExpression { .. }
        ));
        assert!(XPath::compile("a[@b='c").is_err());
    }
}
