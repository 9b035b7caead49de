//! Recursive-descent parser.
//!
//! Consumes the scanner's token vector and produces a list of statements
//! plus an error flag. On a grammar violation the offending declaration is
//! abandoned and the parser synchronizes to the next statement boundary, so
//! a single pass reports every syntax error it can reach.

use std::rc::Rc;

use log::{debug, info};

use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::stmt::{ControlKind, FunctionDecl, Stmt};
use crate::token::{Token, TokenType};

/// Functions and calls are capped at this many parameters/arguments.
const MAX_ARITY: usize = 8;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    next_id: ExprId,
    had_error: bool,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::with_first_id(tokens, 0)
    }

    /// Expression ids key the resolver's annotations, so they must stay
    /// unique across every parse fed to one interpreter. A REPL continues
    /// numbering from where the previous line stopped.
    pub fn with_first_id(tokens: Vec<Token>, first_id: ExprId) -> Self {
        info!(
            "Initializing Parser with {} token(s), ids from {}",
            tokens.len(),
            first_id
        );

        Parser {
            tokens,
            current: 0,
            next_id: first_id,
            had_error: false,
        }
    }

    /// The first id not handed out yet.
    pub fn next_free_id(&self) -> ExprId {
        self.next_id
    }

    /// Parse the whole token stream. Returns the statements that parsed
    /// cleanly and whether any error was reported along the way.
    pub fn parse(&mut self) -> (Vec<Stmt>, bool) {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        (statements, self.had_error)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Declarations
    // ─────────────────────────────────────────────────────────────────────

    /// Parse one declaration, recovering to the next statement boundary on
    /// error. `None` means the declaration was abandoned.
    fn declaration(&mut self) -> Option<Stmt> {
        let result: Result<Stmt> = if self.match_tokens(&[TokenType::CLASS]) {
            self.class_declaration()
        } else if self.match_tokens(&[TokenType::FUN]) {
            self.function_declaration()
        } else if self.match_tokens(&[TokenType::VAR]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),

            Err(err) => {
                self.report(err);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name = self.consume(TokenType::IDENTIFIER, "expect class name.")?;

        debug!("Parsing class {}", name.lexeme);

        let superclass: Option<Expr> = if self.match_tokens(&[TokenType::LESS]) {
            let super_name = self.consume(TokenType::IDENTIFIER, "expect superclass name.")?;

            Some(Expr::Variable {
                id: self.next_id(),
                name: super_name,
            })
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "expect '{' before class body.")?;

        let mut statics: Vec<Rc<FunctionDecl>> = Vec::new();
        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();
        let mut getters: Vec<Rc<FunctionDecl>> = Vec::new();
        let mut setters: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(&TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if self.match_tokens(&[TokenType::GET]) {
                getters.push(self.getter_declaration()?);
            } else if self.match_tokens(&[TokenType::SET]) {
                setters.push(self.setter_declaration()?);
            } else if self.match_tokens(&[TokenType::STATIC]) {
                statics.push(self.function("static method")?);
            } else {
                methods.push(self.function("method")?);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "expect '}' after class body.")?;

        Ok(Stmt::Class {
            name,
            superclass,
            statics,
            methods,
            getters,
            setters,
        })
    }

    /// `get IDENT block` — a parameterless member invoked on property reads.
    fn getter_declaration(&mut self) -> Result<Rc<FunctionDecl>> {
        let name = self.consume(TokenType::IDENTIFIER, "expect getter name.")?;

        self.consume(TokenType::LEFT_BRACE, "expect '{' before getter body.")?;

        let body = self.block()?;

        Ok(Rc::new(FunctionDecl {
            name: Some(name),
            params: Vec::new(),
            body,
        }))
    }

    /// `set IDENT ( IDENT ) block` — a one-parameter member invoked on
    /// property writes.
    fn setter_declaration(&mut self) -> Result<Rc<FunctionDecl>> {
        let name = self.consume(TokenType::IDENTIFIER, "expect setter name.")?;

        self.consume(TokenType::LEFT_PAREN, "expect '(' after setter name.")?;
        let param = self.consume(TokenType::IDENTIFIER, "expect setter parameter name.")?;
        self.consume(TokenType::RIGHT_PAREN, "expect ')' after setter parameter.")?;

        self.consume(TokenType::LEFT_BRACE, "expect '{' before setter body.")?;

        let body = self.block()?;

        Ok(Rc::new(FunctionDecl {
            name: Some(name),
            params: vec![param],
            body,
        }))
    }

    fn function_declaration(&mut self) -> Result<Stmt> {
        Ok(Stmt::Function(self.function("function")?))
    }

    /// Shared shape of named functions and methods: name, parameter list,
    /// braced body.
    fn function(&mut self, kind: &str) -> Result<Rc<FunctionDecl>> {
        let name = self.consume(TokenType::IDENTIFIER, format!("expect {} name.", kind))?;

        self.consume(
            TokenType::LEFT_PAREN,
            format!("expect '(' after {} name.", kind),
        )?;

        let params = self.parameters()?;

        self.consume(
            TokenType::LEFT_BRACE,
            format!("expect '{{' before {} body.", kind),
        )?;

        let body = self.block()?;

        Ok(Rc::new(FunctionDecl {
            name: Some(name),
            params,
            body,
        }))
    }

    /// Parse `params? )`. Exceeding the arity cap is reported without
    /// abandoning the declaration.
    fn parameters(&mut self) -> Result<Vec<Token>> {
        let mut params: Vec<Token> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARITY {
                    let token = self.peek().clone();
                    self.report(LoxError::parse(
                        &token,
                        format!("cannot have more than {} parameters.", MAX_ARITY),
                    ));
                }

                params.push(self.consume(TokenType::IDENTIFIER, "expect parameter name.")?);

                if !self.match_tokens(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "expect ')' after parameters.")?;

        Ok(params)
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let mut declarations: Vec<Stmt> = vec![self.name_declaration()?];

        while self.match_tokens(&[TokenType::COMMA]) {
            declarations.push(self.name_declaration()?);
        }

        // Statement terminators are optional.
        self.match_tokens(&[TokenType::SEMICOLON]);

        if declarations.len() == 1 {
            Ok(declarations.remove(0))
        } else {
            Ok(Stmt::VarList(declarations))
        }
    }

    fn name_declaration(&mut self) -> Result<Stmt> {
        let name = self.consume(TokenType::IDENTIFIER, "expect variable name.")?;

        let initializer: Option<Expr> = if self.match_tokens(&[TokenType::EQUAL]) {
            Some(self.expression()?)
        } else {
            None
        };

        Ok(Stmt::Var { name, initializer })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        if self.match_tokens(&[TokenType::LEFT_BRACE]) {
            return Ok(Stmt::Block(self.block()?));
        }

        if self.match_tokens(&[TokenType::IF]) {
            return self.if_statement();
        }

        if self.match_tokens(&[TokenType::WHILE]) {
            return self.while_statement();
        }

        if self.match_tokens(&[TokenType::FOR]) {
            return self.for_statement();
        }

        if self.match_tokens(&[TokenType::PRINT]) {
            return self.print_statement();
        }

        if self.match_tokens(&[TokenType::RETURN]) {
            return self.return_statement();
        }

        if self.match_tokens(&[TokenType::BREAK]) {
            return self.break_statement();
        }

        self.expression_statement()
    }

    /// Body of a `{ … }` block; the opening brace is already consumed.
    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(&TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "expect '}' after block.")?;

        Ok(statements)
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);

        let else_branch: Option<Box<Stmt>> = if self.match_tokens(&[TokenType::ELSE]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "expect ')' after while condition.")?;

        let body = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    /// `for` is rewritten at parse time:
    /// `for (init; cond; step) body` → `{ init; while (cond) { body; step; } }`
    /// with `cond` defaulting to `true` when omitted.
    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "expect '(' after 'for'.")?;

        let initializer: Option<Stmt> = if self.match_tokens(&[TokenType::SEMICOLON]) {
            None
        } else if self.match_tokens(&[TokenType::VAR]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Expr = if self.check(&TokenType::SEMICOLON) {
            Expr::Literal(LiteralValue::Bool(true))
        } else {
            self.expression()?
        };
        self.consume(TokenType::SEMICOLON, "expect ';' after loop condition.")?;

        let increment: Option<Expr> = if self.check(&TokenType::RIGHT_PAREN) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenType::RIGHT_PAREN, "expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(step) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(step)]);
        }

        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(init) = initializer {
            body = Stmt::Block(vec![init, body]);
        }

        Ok(body)
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let expr = self.expression()?;

        self.match_tokens(&[TokenType::SEMICOLON]);

        Ok(Stmt::Print(expr))
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword = self.previous().clone();

        let value: Option<Expr> = if self.check(&TokenType::SEMICOLON)
            || self.check(&TokenType::RIGHT_BRACE)
            || self.is_at_end()
        {
            None
        } else {
            Some(self.expression()?)
        };

        self.match_tokens(&[TokenType::SEMICOLON]);

        Ok(Stmt::Control {
            keyword,
            kind: ControlKind::Return,
            value,
        })
    }

    fn break_statement(&mut self) -> Result<Stmt> {
        let keyword = self.previous().clone();

        self.match_tokens(&[TokenType::SEMICOLON]);

        Ok(Stmt::Control {
            keyword,
            kind: ControlKind::Break,
            value: None,
        })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr = self.expression()?;

        self.match_tokens(&[TokenType::SEMICOLON]);

        Ok(Stmt::Expression(expr))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    pub fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr = self.or()?;

        if self.match_tokens(&[
            TokenType::EQUAL,
            TokenType::PLUS_EQUAL,
            TokenType::MINUS_EQUAL,
            TokenType::STAR_EQUAL,
            TokenType::SLASH_EQUAL,
            TokenType::PERCENT_EQUAL,
        ]) {
            let operator = self.previous().clone();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: self.next_id(),
                    name,
                    operator,
                    value: Box::new(value),
                }),

                // `Set` carries no operator, so compound forms expand here:
                // `a.b += c` becomes `a.b = a.b + c`.
                Expr::Get { object, name } => {
                    let value: Expr = if operator.token_type == TokenType::EQUAL {
                        value
                    } else {
                        let base = base_operator(&operator);

                        Expr::Binary {
                            left: Box::new(Expr::Get {
                                object: object.clone(),
                                name: name.clone(),
                            }),
                            operator: base,
                            right: Box::new(value),
                        }
                    };

                    Ok(Expr::Set {
                        object,
                        name,
                        value: Box::new(value),
                    })
                }

                Expr::Subscript {
                    object,
                    key,
                    bracket,
                } => {
                    if operator.token_type != TokenType::EQUAL {
                        self.report(LoxError::parse(
                            &operator,
                            "compound assignment is not supported on subscripts.",
                        ));
                    }

                    Ok(Expr::SubscriptSet {
                        object,
                        key,
                        bracket,
                        value: Box::new(value),
                    })
                }

                other => {
                    self.report(LoxError::parse(&operator, "invalid assignment target."));

                    Ok(other)
                }
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr> {
        let mut expr = self.and()?;

        while self.match_tokens(&[TokenType::OR]) {
            let operator = self.previous().clone();
            let right = self.and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut expr = self.equality()?;

        while self.match_tokens(&[TokenType::AND]) {
            let operator = self.previous().clone();
            let right = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr = self.comparison()?;

        while self.match_tokens(&[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// Comparison is non-associative: one operator is matched, then the
    /// right side recurses, so `a < b < c` parses as `a < (b < c)`.
    fn comparison(&mut self) -> Result<Expr> {
        let expr = self.addition()?;

        if self.match_tokens(&[
            TokenType::GREATER,
            TokenType::GREATER_EQUAL,
            TokenType::LESS,
            TokenType::LESS_EQUAL,
        ]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;

            return Ok(Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    fn addition(&mut self) -> Result<Expr> {
        let mut expr = self.multiplication()?;

        while self.match_tokens(&[TokenType::PLUS, TokenType::MINUS]) {
            let operator = self.previous().clone();
            let right = self.multiplication()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn multiplication(&mut self) -> Result<Expr> {
        let mut expr = self.unary()?;

        while self.match_tokens(&[TokenType::STAR, TokenType::SLASH, TokenType::PERCENT]) {
            let operator = self.previous().clone();
            let right = self.unary()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.match_tokens(&[TokenType::BANG, TokenType::MINUS]) {
            let operator = self.previous().clone();
            let right = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_tokens(&[TokenType::LEFT_PAREN]) {
                expr = self.finish_call(expr)?;
            } else if self.match_tokens(&[TokenType::DOT]) {
                let name = self.consume(TokenType::IDENTIFIER, "expect property name after '.'.")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else if self.match_tokens(&[TokenType::LEFT_BRACKET]) {
                let key = self.expression()?;
                let bracket =
                    self.consume(TokenType::RIGHT_BRACKET, "expect ']' after subscript.")?;

                expr = Expr::Subscript {
                    object: Box::new(expr),
                    key: Box::new(key),
                    bracket,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    let token = self.peek().clone();
                    self.report(LoxError::parse(
                        &token,
                        format!("cannot have more than {} arguments.", MAX_ARITY),
                    ));
                }

                arguments.push(self.expression()?);

                if !self.match_tokens(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenType::RIGHT_PAREN, "expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.match_tokens(&[TokenType::IDENTIFIER]) {
            return Ok(Expr::Variable {
                id: self.next_id(),
                name: self.previous().clone(),
            });
        }

        if self.match_tokens(&[
            TokenType::INT(0),
            TokenType::FLOAT(0.0),
            TokenType::STRING(String::new()),
        ]) {
            let literal: LiteralValue = match &self.previous().token_type {
                TokenType::INT(n) => LiteralValue::Int(*n),

                TokenType::FLOAT(n) => LiteralValue::Float(*n),

                TokenType::STRING(s) => LiteralValue::String(s.clone()),

                _ => LiteralValue::Nil,
            };

            return Ok(Expr::Literal(literal));
        }

        if self.match_tokens(&[TokenType::TRUE]) {
            return Ok(Expr::Literal(LiteralValue::Bool(true)));
        }

        if self.match_tokens(&[TokenType::FALSE]) {
            return Ok(Expr::Literal(LiteralValue::Bool(false)));
        }

        if self.match_tokens(&[TokenType::NIL]) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if self.match_tokens(&[TokenType::THIS]) {
            return Ok(Expr::This {
                id: self.next_id(),
                keyword: self.previous().clone(),
            });
        }

        if self.match_tokens(&[TokenType::SUPER]) {
            let keyword = self.previous().clone();

            self.consume(TokenType::DOT, "expect '.' after 'super'.")?;
            let method = self.consume(TokenType::IDENTIFIER, "expect superclass method name.")?;

            return Ok(Expr::Super {
                id: self.next_id(),
                keyword,
                method,
            });
        }

        if self.match_tokens(&[TokenType::LEFT_BRACKET]) {
            return self.array_literal();
        }

        if self.match_tokens(&[TokenType::LEFT_PAREN]) {
            // `(` opens either a grouping or a lambda's parameter list;
            // a bounded lookahead for `->` decides which.
            if self.lambda_ahead() {
                return self.lambda();
            }

            let expr = self.expression()?;
            self.consume(TokenType::RIGHT_PAREN, "expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(LoxError::parse(self.peek(), "expect expression."))
    }

    fn array_literal(&mut self) -> Result<Expr> {
        let bracket = self.previous().clone();

        let mut elements: Vec<Expr> = Vec::new();

        if !self.check(&TokenType::RIGHT_BRACKET) {
            loop {
                elements.push(self.expression()?);

                if !self.match_tokens(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        self.consume(
            TokenType::RIGHT_BRACKET,
            "expect ']' after array elements.",
        )?;

        Ok(Expr::Array { bracket, elements })
    }

    /// After a consumed `(`: does `IDENT ("," IDENT)* ")" "->"` (or `") ->"`)
    /// follow? Parameter lists cannot nest, so a linear scan suffices.
    fn lambda_ahead(&self) -> bool {
        let mut i: usize = self.current;

        if self.token_at(i) == Some(&TokenType::RIGHT_PAREN) {
            return self.token_at(i + 1) == Some(&TokenType::ARROW);
        }

        loop {
            if self.token_at(i) != Some(&TokenType::IDENTIFIER) {
                return false;
            }

            i += 1;

            match self.token_at(i) {
                Some(&TokenType::COMMA) => i += 1,

                Some(&TokenType::RIGHT_PAREN) => {
                    return self.token_at(i + 1) == Some(&TokenType::ARROW)
                }

                _ => return false,
            }
        }
    }

    /// `( params? ) -> expr | block`, with the opening paren consumed.
    /// An expression body desugars into a single return statement.
    fn lambda(&mut self) -> Result<Expr> {
        debug!("Parsing lambda at line {}", self.previous().line);

        let params = self.parameters()?;

        let arrow = self.consume(TokenType::ARROW, "expect '->' after lambda parameters.")?;

        let body: Vec<Stmt> = if self.match_tokens(&[TokenType::LEFT_BRACE]) {
            self.block()?
        } else {
            let value = self.expression()?;

            vec![Stmt::Control {
                keyword: arrow,
                kind: ControlKind::Return,
                value: Some(value),
            }]
        };

        Ok(Expr::Lambda(Rc::new(FunctionDecl {
            name: None,
            params,
            body,
        })))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────

    fn next_id(&mut self) -> ExprId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn report(&mut self, err: LoxError) {
        eprintln!("{}", err);
        self.had_error = true;
    }

    fn match_tokens(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }

        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        &self.peek().token_type == token_type
    }

    fn consume<S: Into<String>>(&mut self, token_type: TokenType, message: S) -> Result<Token> {
        if self.check(&token_type) {
            return Ok(self.advance().clone());
        }

        Err(LoxError::parse(self.peek(), message))
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn token_at(&self, index: usize) -> Option<&TokenType> {
        self.tokens.get(index).map(|token| &token.token_type)
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    /// Skip forward to the next likely statement boundary after an error.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::SEMICOLON {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,

                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// The binary operator a compound assignment expands to, for parse-time
/// expansion of property targets.
fn base_operator(operator: &Token) -> Token {
    let (token_type, lexeme) = match operator.token_type {
        TokenType::PLUS_EQUAL => (TokenType::PLUS, "+"),

        TokenType::MINUS_EQUAL => (TokenType::MINUS, "-"),

        TokenType::STAR_EQUAL => (TokenType::STAR, "*"),

        TokenType::SLASH_EQUAL => (TokenType::SLASH, "/"),

        TokenType::PERCENT_EQUAL => (TokenType::PERCENT, "%"),

        _ => (TokenType::EQUAL, "="),
    };

    Token::new(token_type, lexeme.to_string(), operator.line)
}
