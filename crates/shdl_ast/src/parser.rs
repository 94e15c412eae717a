//! Recursive-descent parser for SHDL source text.
//!
//! Consumes the token stream produced by [`crate::lexer`] and builds an
//! [`Module`] AST per the grammar in the specification. Errors are reported
//! to the diagnostic sink and recovered to the next statement boundary so a
//! single pass can report more than one problem.

use crate::ast::*;
use crate::token::{Token, TokenKind};
use shdl_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Stage};
use shdl_source::{FileId, Span};

/// Parses a complete `.shdl` source file into a [`Module`].
///
/// `module_name` is the filename-derived name assigned to the returned
/// module (the specification derives module identity from the file on the
/// search path, not from a header inside the file).
pub fn parse_module(
    source: &str,
    file: FileId,
    module_name: &str,
    tokens: Vec<Token>,
    sink: &DiagnosticSink,
) -> Module {
    let mut parser = Parser {
        tokens,
        pos: 0,
        source,
        file,
        sink,
    };
    parser.parse_module(module_name)
}

struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'src str,
    #[allow(dead_code)]
    file: FileId,
    sink: &'src DiagnosticSink,
}

impl<'src> Parser<'src> {
    fn current(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    fn current_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn current_text(&self) -> &'src str {
        let span = self.current_span();
        &self.source[span.start as usize..span.end as usize]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    fn at_eof(&self) -> bool {
        self.current() == TokenKind::Eof
    }

    fn prev_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            self.current_span()
        }
    }

    fn advance(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, number: u8, msg: impl Into<String>, span: Span) {
        self.sink
            .emit(Diagnostic::error(DiagnosticCode::error(Stage::Parse, number), msg, span));
    }

    fn expected(&self, what: &str) {
        self.error(
            8,
            format!("expected {what}, found {:?}", self.current()),
            self.current_span(),
        );
    }

    fn expect(&mut self, kind: TokenKind, what: &str) {
        if !self.eat(kind) {
            self.expected(what);
        }
    }

    /// Expects `->`, emitting code P01 (missing `->`) on failure.
    fn expect_arrow(&mut self) {
        if !self.eat(TokenKind::Arrow) {
            self.error(1, "missing '->'", self.current_span());
        }
    }

    /// Expects `;`, emitting code P02 (missing `;`) on failure.
    fn expect_semicolon(&mut self) {
        if !self.eat(TokenKind::Semicolon) {
            self.error(2, "missing ';'", self.current_span());
        }
    }

    fn expect_ident(&mut self) -> String {
        if self.at(TokenKind::Ident) {
            let text = self.current_text().to_string();
            self.advance();
            text
        } else {
            self.error(4, "expected an identifier", self.current_span());
            String::new()
        }
    }

    fn expect_int(&mut self) -> i64 {
        if self.at(TokenKind::Int) {
            let text = self.current_text();
            let value = parse_int_literal(text);
            self.advance();
            value
        } else {
            self.expected("an integer literal");
            0
        }
    }

    /// Skips tokens until the next `;`, matching `}`, or EOF — recovery to
    /// the next statement boundary.
    fn recover_to_statement_boundary(&mut self) {
        let mut depth: i32 = 0;
        loop {
            match self.current() {
                TokenKind::Eof => return,
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::LeftBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RightBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.advance();
                }
                _ => self.advance(),
            }
        }
    }

    // === Top level ===

    fn parse_module(&mut self, module_name: &str) -> Module {
        let mut imports = Vec::new();
        let mut components = Vec::new();

        while self.at(TokenKind::Use) {
            imports.push(self.parse_import());
        }

        while !self.at_eof() {
            if self.at(TokenKind::Component) {
                components.push(self.parse_component());
            } else {
                self.error(
                    8,
                    format!("expected 'component', found {:?}", self.current()),
                    self.current_span(),
                );
                self.recover_to_statement_boundary();
            }
        }

        Module {
            name: module_name.to_string(),
            imports,
            components,
        }
    }

    fn parse_import(&mut self) -> Import {
        let start = self.current_span();
        self.expect(TokenKind::Use, "'use'");
        let module = self.expect_ident();
        self.expect(TokenKind::DoubleColon, "'::'");
        self.expect(TokenKind::LeftBrace, "'{'");

        let mut names = Vec::new();
        if !self.at(TokenKind::RightBrace) {
            names.push(self.expect_ident());
            while self.eat(TokenKind::Comma) {
                names.push(self.expect_ident());
            }
        }
        if !self.eat(TokenKind::RightBrace) {
            self.error(3, "unbalanced brackets in import list", self.current_span());
        }
        self.expect_semicolon();

        Import {
            module,
            names,
            span: start.merge(self.prev_span()),
        }
    }

    fn parse_component(&mut self) -> ComponentDef {
        let start = self.current_span();
        self.expect(TokenKind::Component, "'component'");
        let name = self.expect_ident();

        self.expect(TokenKind::LeftParen, "'('");
        let inputs = self.parse_port_list();
        if !self.eat(TokenKind::RightParen) {
            self.error(3, "unbalanced parentheses in input port list", self.current_span());
        }

        self.expect_arrow();

        self.expect(TokenKind::LeftParen, "'('");
        let outputs = self.parse_port_list();
        if !self.eat(TokenKind::RightParen) {
            self.error(3, "unbalanced parentheses in output port list", self.current_span());
        }

        self.expect(TokenKind::LeftBrace, "'{'");
        let mut items = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at_eof() {
            items.push(self.parse_item());
        }
        if !self.eat(TokenKind::RightBrace) {
            self.error(3, "unbalanced braces in component body", self.current_span());
        }

        ComponentDef {
            name,
            inputs,
            outputs,
            items,
            span: start.merge(self.prev_span()),
        }
    }

    fn parse_port_list(&mut self) -> Vec<Port> {
        let mut ports = Vec::new();
        if self.at(TokenKind::RightParen) {
            return ports;
        }
        ports.push(self.parse_port());
        while self.eat(TokenKind::Comma) {
            ports.push(self.parse_port());
        }
        ports
    }

    fn parse_port(&mut self) -> Port {
        let start = self.current_span();
        let name = self.expect_ident();
        let mut width: u32 = 1;
        if self.eat(TokenKind::LeftBracket) {
            let span = self.current_span();
            let value = self.expect_int();
            if value <= 0 {
                self.error(6, "port width must be positive", span);
            } else {
                width = value as u32;
            }
            if !self.eat(TokenKind::RightBracket) {
                self.error(3, "unbalanced brackets in port width", self.current_span());
            }
        }
        Port {
            name,
            width,
            span: start.merge(self.prev_span()),
        }
    }

    /// Parses one component-body item: an instance declaration, a named
    /// constant, a generator, or a connect block.
    fn parse_item(&mut self) -> Item {
        match self.current() {
            TokenKind::Connect => Item::ConnectBlock(self.parse_connect_block()),
            TokenKind::GreaterThan => Item::Generator(self.parse_generator()),
            TokenKind::Ident => self.parse_decl_or_constant(),
            _ => {
                self.expected("an instance declaration, constant, generator, or connect block");
                self.recover_to_statement_boundary();
                // Produce a syntactically valid (empty) placeholder so callers
                // never have to special-case a parse failure mid-body.
                Item::ConnectBlock(ConnectBlock {
                    items: Vec::new(),
                    span: self.prev_span(),
                })
            }
        }
    }

    fn parse_decl_or_constant(&mut self) -> Item {
        let start = self.current_span();
        let name_text = self.expect_ident();
        let name = TemplatedIdent::plain(name_text, start);

        if self.eat(TokenKind::Colon) {
            let type_name = self.expect_ident();
            self.expect_semicolon();
            return Item::Instance(InstanceDecl {
                name,
                type_name,
                span: start.merge(self.prev_span()),
            });
        }

        let mut width = None;
        if self.eat(TokenKind::LeftBracket) {
            let span = self.current_span();
            let value = self.expect_int();
            if value <= 0 {
                self.error(6, "constant width must be positive", span);
            } else {
                width = Some(value as u32);
            }
            if !self.eat(TokenKind::RightBracket) {
                self.error(3, "unbalanced brackets in constant width", self.current_span());
            }
        }

        if self.eat(TokenKind::Equals) {
            let span = self.current_span();
            let raw = self.expect_int();
            if raw < 0 {
                self.error(8, "constant value must be non-negative", span);
            }
            self.expect_semicolon();
            return Item::Constant(Constant {
                name,
                width,
                value: raw.max(0) as u64,
                span: start.merge(self.prev_span()),
            });
        }

        self.error(
            5,
            "expected ':' (instance declaration) or '=' (constant)",
            self.current_span(),
        );
        self.recover_to_statement_boundary();
        Item::Instance(InstanceDecl {
            name,
            type_name: String::new(),
            span: start.merge(self.prev_span()),
        })
    }

    // === Connect blocks and generators ===

    fn parse_connect_block(&mut self) -> ConnectBlock {
        let start = self.current_span();
        self.expect(TokenKind::Connect, "'connect'");
        self.expect(TokenKind::LeftBrace, "'{'");

        let mut items = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at_eof() {
            if self.at(TokenKind::GreaterThan) {
                items.push(ConnectItem::Generator(self.parse_generator()));
            } else {
                items.push(ConnectItem::Connection(self.parse_connection()));
            }
        }
        if !self.eat(TokenKind::RightBrace) {
            self.error(3, "unbalanced braces in connect block", self.current_span());
        }

        ConnectBlock {
            items,
            span: start.merge(self.prev_span()),
        }
    }

    fn parse_connection(&mut self) -> Connection {
        let start = self.current_span();
        let src = self.parse_signal_ref();
        self.expect_arrow();
        let dst = self.parse_signal_ref();
        self.expect_semicolon();
        Connection {
            src,
            dst,
            span: start.merge(self.prev_span()),
        }
    }

    fn parse_generator(&mut self) -> Generator {
        let start = self.current_span();
        self.expect(TokenKind::GreaterThan, "'>'");
        let var = self.expect_ident();

        self.expect(TokenKind::LeftBracket, "'['");
        let mut ranges = vec![self.parse_range()];
        while self.eat(TokenKind::Comma) {
            ranges.push(self.parse_range());
        }
        if !self.eat(TokenKind::RightBracket) {
            self.error(3, "unbalanced brackets in generator range", self.current_span());
        }

        self.expect(TokenKind::LeftBrace, "'{'");
        let mut body = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at_eof() {
            body.push(self.parse_gen_body_item());
        }
        if !self.eat(TokenKind::RightBrace) {
            self.error(3, "unbalanced braces in generator body", self.current_span());
        }

        Generator {
            var,
            ranges,
            body,
            span: start.merge(self.prev_span()),
        }
    }

    fn parse_gen_body_item(&mut self) -> GenBodyItem {
        if self.at(TokenKind::GreaterThan) {
            return GenBodyItem::Generator(self.parse_generator());
        }
        // Disambiguate `name: Type;` (instance) from `signal -> signal;`
        // (connection) by looking two tokens ahead for a colon immediately
        // after a bare identifier with no index/member.
        if self.at(TokenKind::Ident)
            && self.pos + 1 < self.tokens.len()
            && self.tokens[self.pos + 1].kind == TokenKind::Colon
        {
            let start = self.current_span();
            let name_text = self.expect_ident();
            self.advance(); // ':'
            let type_name = self.expect_ident();
            self.expect_semicolon();
            return GenBodyItem::Instance(InstanceDecl {
                name: TemplatedIdent::plain(name_text, start),
                type_name,
                span: start.merge(self.prev_span()),
            });
        }
        GenBodyItem::Connection(self.parse_connection())
    }

    fn parse_range(&mut self) -> RangeSpec {
        let start = self.current_span();
        if self.eat(TokenKind::Colon) {
            let span = self.current_span();
            let b = self.expect_int();
            if b <= 0 {
                self.error(7, "generator range must be positive", span);
            }
            return RangeSpec::OpenLower(b, start.merge(self.prev_span()));
        }

        let a_span = self.current_span();
        let a = self.expect_int();
        if self.eat(TokenKind::Colon) {
            if self.at(TokenKind::RightBracket) || self.at(TokenKind::Comma) {
                return RangeSpec::OpenUpper(a, start.merge(self.prev_span()));
            }
            let b = self.expect_int();
            return RangeSpec::Closed(a, b, start.merge(self.prev_span()));
        }
        if a <= 0 {
            self.error(7, "generator range must be positive", a_span);
        }
        RangeSpec::Single(a, start.merge(self.prev_span()))
    }

    // === Signal references and expressions ===

    fn parse_templated_ident(&mut self) -> TemplatedIdent {
        let start = self.current_span();
        let base = self.expect_ident();
        // `name{expr}` requires the brace to immediately follow the
        // identifier with no intervening source text.
        if self.at(TokenKind::LeftBrace) && self.current_span().start == start.end {
            self.advance();
            let subst = self.parse_expr();
            if !self.eat(TokenKind::RightBrace) {
                self.error(3, "unbalanced braces in templated identifier", self.current_span());
            }
            return TemplatedIdent {
                base,
                subst: Some(subst),
                span: start.merge(self.prev_span()),
            };
        }
        TemplatedIdent::plain(base, start)
    }

    fn parse_signal_ref(&mut self) -> SignalRef {
        let start = self.current_span();
        let base = self.parse_templated_ident();

        let member = if self.eat(TokenKind::Dot) {
            Some(self.parse_templated_ident())
        } else {
            None
        };

        let index = if self.eat(TokenKind::LeftBracket) {
            let spec = self.parse_index_spec();
            if !self.eat(TokenKind::RightBracket) {
                self.error(3, "unbalanced brackets in signal index", self.current_span());
            }
            Some(spec)
        } else {
            None
        };

        SignalRef {
            base,
            member,
            index,
            span: start.merge(self.prev_span()),
        }
    }

    fn parse_index_spec(&mut self) -> IndexSpec {
        if self.eat(TokenKind::Colon) {
            return IndexSpec::SliceTo(self.parse_expr());
        }
        let first = self.parse_expr();
        if self.eat(TokenKind::Colon) {
            if self.at(TokenKind::RightBracket) {
                return IndexSpec::SliceFrom(first);
            }
            let second = self.parse_expr();
            return IndexSpec::SliceRange(first, second);
        }
        IndexSpec::Bit(first)
    }

    fn parse_expr(&mut self) -> Expr {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> Expr {
        let mut left = self.parse_term();
        loop {
            if self.eat(TokenKind::Plus) {
                let right = self.parse_term();
                let span = left.span().merge(right.span());
                left = Expr::Add(Box::new(left), Box::new(right), span);
            } else if self.eat(TokenKind::Minus) {
                let right = self.parse_term();
                let span = left.span().merge(right.span());
                left = Expr::Sub(Box::new(left), Box::new(right), span);
            } else {
                break;
            }
        }
        left
    }

    fn parse_term(&mut self) -> Expr {
        let mut left = self.parse_factor();
        while self.eat(TokenKind::Star) {
            let right = self.parse_factor();
            let span = left.span().merge(right.span());
            left = Expr::Mul(Box::new(left), Box::new(right), span);
        }
        left
    }

    fn parse_factor(&mut self) -> Expr {
        let span = self.current_span();
        match self.current() {
            TokenKind::Int => {
                let value = self.expect_int();
                Expr::Int(value, span)
            }
            TokenKind::Ident => {
                let name = self.expect_ident();
                Expr::Var(name, span)
            }
            TokenKind::LeftBrace => {
                self.advance();
                let inner = self.parse_expr();
                if !self.eat(TokenKind::RightBrace) {
                    self.error(3, "unbalanced braces in expression", self.current_span());
                }
                inner
            }
            _ => {
                self.expected("an expression");
                Expr::Int(0, span)
            }
        }
    }
}

/// Parses an integer literal token's text (decimal, `0x…`, or `0b…`) into
/// its value.
fn parse_int_literal(text: &str) -> i64 {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).unwrap_or(0)
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).unwrap_or(0)
    } else {
        text.parse().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use shdl_source::FileId;

    fn parse(source: &str) -> (Module, bool) {
        let sink = DiagnosticSink::new();
        let tokens = lex(source, FileId::from_raw(0), &sink);
        let module = parse_module(source, FileId::from_raw(0), "test", tokens, &sink);
        (module, sink.has_errors())
    }

    #[test]
    fn parse_half_adder() {
        let src = r#"
            component HalfAdder(A, B) -> (Sum, Cout) {
                g1: XOR;
                g2: AND;
                connect {
                    A -> g1.A;
                    B -> g1.B;
                    g1.O -> Sum;
                    A -> g2.A;
                    B -> g2.B;
                    g2.O -> Cout;
                }
            }
        "#;
        let (module, has_errors) = parse(src);
        assert!(!has_errors);
        assert_eq!(module.components.len(), 1);
        let comp = &module.components[0];
        assert_eq!(comp.name, "HalfAdder");
        assert_eq!(comp.inputs.len(), 2);
        assert_eq!(comp.outputs.len(), 2);
        assert_eq!(comp.connect_blocks().count(), 1);
    }

    #[test]
    fn parse_use_import() {
        let (module, has_errors) = parse("use gates::{HalfAdder, FullAdder};\n");
        assert!(!has_errors);
        assert_eq!(module.imports.len(), 1);
        assert_eq!(module.imports[0].module, "gates");
        assert_eq!(module.imports[0].names, vec!["HalfAdder", "FullAdder"]);
    }

    #[test]
    fn parse_constant_with_width() {
        let src = r#"
            component C() -> (Out[4]) {
                K[4] = 5;
                connect {
                    K -> Out;
                }
            }
        "#;
        let (module, has_errors) = parse(src);
        assert!(!has_errors);
        let comp = &module.components[0];
        let Item::Constant(c) = &comp.items[0] else {
            panic!("expected constant item");
        };
        assert_eq!(c.width, Some(4));
        assert_eq!(c.value, 5);
    }

    #[test]
    fn parse_generator_with_template_ident() {
        let src = r#"
            component Bus(In[4]) -> (Out[4]) {
                > i [4] {
                    b{i}: NOT;
                }
                connect {
                    > i [4] {
                        In[i] -> b{i}.A;
                        b{i}.O -> Out[i];
                    }
                }
            }
        "#;
        let (module, has_errors) = parse(src);
        assert!(!has_errors);
        let comp = &module.components[0];
        let Item::Generator(gen) = &comp.items[0] else {
            panic!("expected generator item");
        };
        assert_eq!(gen.var, "i");
        assert_eq!(gen.body.len(), 1);
        let GenBodyItem::Instance(inst) = &gen.body[0] else {
            panic!("expected instance in generator body");
        };
        assert!(!inst.name.is_plain());
    }

    #[test]
    fn parse_bit_slice_expanders() {
        let src = r#"
            component Wide(In[8]) -> (Out[8]) {
                connect {
                    In[:4] -> Out[:4];
                    In[4:] -> Out[4:];
                }
            }
        "#;
        let (module, has_errors) = parse(src);
        assert!(!has_errors);
        let comp = &module.components[0];
        let connect_blocks: Vec<_> = comp.connect_blocks().collect();
        assert_eq!(connect_blocks[0].items.len(), 2);
    }

    #[test]
    fn parse_arithmetic_index_expr() {
        let src = r#"
            component C(In[8]) -> (Out[8]) {
                > i [4] {
                    In[i * 2] -> Out[i * 2];
                }
            }
        "#;
        let (module, has_errors) = parse(src);
        assert!(!has_errors);
        assert_eq!(module.components.len(), 1);
    }

    #[test]
    fn missing_arrow_reported() {
        let src = r#"
            component C(A) -> (B) {
                connect {
                    A B;
                }
            }
        "#;
        let (_module, has_errors) = parse(src);
        assert!(has_errors);
    }

    #[test]
    fn non_positive_port_width_reported() {
        let src = "component C(A[0]) -> (B) { connect { A -> B; } }";
        let (_module, has_errors) = parse(src);
        assert!(has_errors);
    }

    #[test]
    fn unbalanced_brackets_reported() {
        let src = "component C(A[2) -> (B) { connect { A -> B; } }";
        let (_module, has_errors) = parse(src);
        assert!(has_errors);
    }

    #[test]
    fn hex_and_binary_constant_values() {
        let src = r#"
            component C() -> (Out[8]) {
                K1 = 0xFF;
                K2 = 0b1010;
                connect {
                    K1 -> Out;
                }
            }
        "#;
        let (module, has_errors) = parse(src);
        assert!(!has_errors);
        let comp = &module.components[0];
        let Item::Constant(c1) = &comp.items[0] else {
            panic!()
        };
        assert_eq!(c1.value, 0xFF);
        let Item::Constant(c2) = &comp.items[1] else {
            panic!()
        };
        assert_eq!(c2.value, 0b1010);
    }
}
