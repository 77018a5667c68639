//! Markup tokenizer
//!
//! Converts markup text into a stream of tokens. Lenient about structure
//! (stray `<`, unknown entities) but rejects unterminated constructs.

use smallvec::SmallVec;

use crate::entities::{decode_entity, decode_numeric};
use crate::error::{HtmlError, HtmlResult};

/// Longest character reference we try to decode
const MAX_ENTITY_LEN: usize = 32;

/// A markup token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// DOCTYPE declaration
    Doctype { name: String },
    /// Start tag
    StartTag {
        name: String,
        attributes: SmallVec<[(String, String); 4]>,
        self_closing: bool,
    },
    /// End tag
    EndTag { name: String },
    /// Run of character data, references already decoded
    Text(String),
    /// Comment
    Comment(String),
    /// End of input
    Eof,
}

/// Markup tokenizer
pub struct Tokenizer {
    input: Vec<char>,
    pos: usize,
    /// Set while inside `script`/`style`, whose content is not markup
    raw_text_tag: Option<String>,
}

impl Tokenizer {
    /// Create a new tokenizer for the given input
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            raw_text_tag: None,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> HtmlResult<Token> {
        if let Some(tag) = self.raw_text_tag.take() {
            let text = self.raw_text(&tag);
            if !text.is_empty() {
                return Ok(Token::Text(text));
            }
        }

        let Some(c) = self.current_char() else {
            return Ok(Token::Eof);
        };

        if c != '<' {
            return Ok(Token::Text(self.text()));
        }

        if self.at_str("<!--") {
            self.pos += 4;
            let comment = self.consume_until("-->").ok_or(HtmlError::UnexpectedEof("comment"))?;
            return Ok(Token::Comment(comment));
        }

        match self.peek(1) {
            Some('!') | Some('?') => {
                self.pos += 2;
                let body = self.consume_until(">").ok_or(HtmlError::UnexpectedEof("declaration"))?;
                Ok(declaration(body))
            }
            Some('/') => self.end_tag(),
            Some(c) if c.is_ascii_alphabetic() => self.start_tag(),
            _ => {
                self.pos += 1;
                let mut text = String::from("<");
                text.push_str(&self.text());
                Ok(Token::Text(text))
            }
        }
    }

    /// Peek at the current character without consuming
    fn current_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    /// Check whether the input continues with `s` (case-insensitive)
    fn at_str(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.peek(i).is_some_and(|p| p.eq_ignore_ascii_case(&c)))
    }

    /// Consume up to and including `terminator`, returning what precedes it
    fn consume_until(&mut self, terminator: &str) -> Option<String> {
        let start = self.pos;
        while self.pos < self.input.len() {
            if self.at_str(terminator) {
                let content = self.input[start..self.pos].iter().collect();
                self.pos += terminator.chars().count();
                return Some(content);
            }
            self.pos += 1;
        }
        None
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Character data up to the next `<`
    fn text(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.current_char() {
            match c {
                '<' => break,
                '&' => text.push_str(&self.character_reference()),
                _ => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }
        text
    }

    /// Content of a raw text element up to its end tag
    fn raw_text(&mut self, tag: &str) -> String {
        let end = format!("</{}", tag);
        let start = self.pos;
        while self.pos < self.input.len() && !self.at_str(&end) {
            self.pos += 1;
        }
        self.input[start..self.pos].iter().collect()
    }

    /// Decode a character reference at `&`, or pass the ampersand through
    fn character_reference(&mut self) -> String {
        let body_start = self.pos + 1;
        let mut end = body_start;
        while end < self.input.len() && end - body_start < MAX_ENTITY_LEN {
            let c = self.input[end];
            if c == ';' {
                let body: String = self.input[body_start..end].iter().collect();
                let decoded = if body.starts_with('#') {
                    decode_numeric(&body).map(String::from)
                } else {
                    decode_entity(&body).map(String::from)
                };
                if let Some(decoded) = decoded {
                    self.pos = end + 1;
                    return decoded;
                }
                break;
            }
            if !(c.is_ascii_alphanumeric() || c == '#') {
                break;
            }
            end += 1;
        }
        self.pos += 1;
        String::from("&")
    }

    fn tag_name(&mut self) -> HtmlResult<String> {
        let mut name = String::new();
        while let Some(c) = self.current_char() {
            if c.is_whitespace() || c == '/' || c == '>' {
                break;
            }
            name.push(c.to_ascii_lowercase());
            self.pos += 1;
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ':') {
            return Err(HtmlError::InvalidTagName(name));
        }
        Ok(name)
    }

    fn end_tag(&mut self) -> HtmlResult<Token> {
        self.pos += 2;
        match self.current_char() {
            Some('>') => {
                // `</>` is dropped entirely
                self.pos += 1;
                self.next_token()
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let name = self.tag_name()?;
                self.consume_until(">").ok_or(HtmlError::UnexpectedEof("end tag"))?;
                Ok(Token::EndTag { name })
            }
            _ => {
                let body = self.consume_until(">").ok_or(HtmlError::UnexpectedEof("end tag"))?;
                Ok(Token::Comment(body))
            }
        }
    }

    fn start_tag(&mut self) -> HtmlResult<Token> {
        self.pos += 1;
        let name = self.tag_name()?;
        let mut attributes: SmallVec<[(String, String); 4]> = SmallVec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.current_char() {
                None => return Err(HtmlError::UnexpectedEof("tag")),
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                Some('/') => {
                    self.pos += 1;
                    if self.current_char() == Some('>') {
                        self_closing = true;
                    }
                }
                Some(_) => {
                    let (attr_name, value) = self.attribute()?;
                    // First occurrence wins
                    if !attributes.iter().any(|(existing, _)| *existing == attr_name) {
                        attributes.push((attr_name, value));
                    }
                }
            }
        }

        if matches!(name.as_str(), "script" | "style") && !self_closing {
            self.raw_text_tag = Some(name.clone());
        }

        Ok(Token::StartTag { name, attributes, self_closing })
    }

    fn attribute(&mut self) -> HtmlResult<(String, String)> {
        let mut name = String::new();
        while let Some(c) = self.current_char() {
            if c.is_whitespace() || c == '/' || c == '>' || (c == '=' && !name.is_empty()) {
                break;
            }
            name.push(c.to_ascii_lowercase());
            self.pos += 1;
        }

        self.skip_whitespace();
        if self.current_char() != Some('=') {
            return Ok((name, String::new()));
        }
        self.pos += 1;
        self.skip_whitespace();

        let value = match self.current_char() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut value = String::new();
                loop {
                    match self.current_char() {
                        None => return Err(HtmlError::UnexpectedEof("attribute value")),
                        Some(c) if c == quote => {
                            self.pos += 1;
                            break;
                        }
                        Some('&') => value.push_str(&self.character_reference()),
                        Some(c) => {
                            value.push(c);
                            self.pos += 1;
                        }
                    }
                }
                value
            }
            _ => {
                let mut value = String::new();
                while let Some(c) = self.current_char() {
                    if c.is_whitespace() || c == '>' {
                        break;
                    }
                    if c == '&' {
                        value.push_str(&self.character_reference());
                    } else {
                        value.push(c);
                        self.pos += 1;
                    }
                }
                value
            }
        };

        Ok((name, value))
    }
}

/// Turn the body of a `<!...>` or `<?...>` construct into a token
fn declaration(body: String) -> Token {
    let trimmed = body.trim_start_matches('!');
    if trimmed.get(..7).is_some_and(|p| p.eq_ignore_ascii_case("doctype")) {
        let name = trimmed[7..]
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        Token::Doctype { name }
    } else {
        Token::Comment(body)
    }
}
