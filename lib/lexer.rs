use crate::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    char: Option<char>,
    line: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let char = chars.first().copied();
        Self {
            chars,
            position: 0,
            char,
            line: 1,
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let Some(char) = self.char else {
            return Token::new(TokenKind::Eof, String::new(), self.line);
        };

        let start = self.position;
        let kind = match char {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '-' => TokenKind::Minus,
            '+' => TokenKind::Plus,
            ';' => TokenKind::Semicolon,
            '/' => TokenKind::Slash,
            '*' => TokenKind::Star,
            '!' if self.is_next_char('=') => {
                self.read_char();
                TokenKind::BangEqual
            }
            '!' => TokenKind::Bang,
            '=' if self.is_next_char('=') => {
                self.read_char();
                TokenKind::EqualEqual
            }
            '=' => TokenKind::Equal,
            '<' if self.is_next_char('=') => {
                self.read_char();
                TokenKind::LessEqual
            }
            '<' => TokenKind::Less,
            '>' if self.is_next_char('=') => {
                self.read_char();
                TokenKind::GreaterEqual
            }
            '>' => TokenKind::Greater,
            '"' => return self.string(),
            _ if char.is_ascii_digit() => return self.number(),
            _ if char.is_ascii_alphabetic() || char == '_' => return self.identifier(),
            _ => {
                self.read_char();
                return Token::new(TokenKind::Error, "Unexpected character.".to_string(), self.line);
            }
        };
        self.read_char();

        Token::new(kind, self.lexeme_from(start), self.line)
    }

    fn string(&mut self) -> Token {
        let start = self.position;
        self.read_char();
        while let Some(char) = self.char {
            if char == '"' {
                self.read_char();
                return Token::new(TokenKind::String, self.lexeme_from(start), self.line);
            }
            if char == '\n' {
                self.line += 1;
            }
            self.read_char();
        }
        Token::new(TokenKind::Error, "Unterminated string.".to_string(), self.line)
    }

    fn number(&mut self) -> Token {
        let start = self.position;
        while self.char.is_some_and(|char| char.is_ascii_digit()) {
            self.read_char();
        }
        // A fractional part needs a digit after the dot; a trailing dot is
        // left for the next token.
        if self.char == Some('.') && self.peek_next().is_some_and(|char| char.is_ascii_digit()) {
            self.read_char();
            while self.char.is_some_and(|char| char.is_ascii_digit()) {
                self.read_char();
            }
        }
        Token::new(TokenKind::Number, self.lexeme_from(start), self.line)
    }

    fn identifier(&mut self) -> Token {
        let start = self.position;
        while self
            .char
            .is_some_and(|char| char.is_ascii_alphanumeric() || char == '_')
        {
            self.read_char();
        }
        let lexeme = self.lexeme_from(start);
        let kind = match lexeme.as_str() {
            "and" => TokenKind::And,
            "class" => TokenKind::Class,
            "else" => TokenKind::Else,
            "false" => TokenKind::False,
            "for" => TokenKind::For,
            "fun" => TokenKind::Fun,
            "if" => TokenKind::If,
            "nil" => TokenKind::Nil,
            "or" => TokenKind::Or,
            "print" => TokenKind::Print,
            "return" => TokenKind::Return,
            "super" => TokenKind::Super,
            "this" => TokenKind::This,
            "true" => TokenKind::True,
            "var" => TokenKind::Var,
            "while" => TokenKind::While,
            _ => TokenKind::Identifier,
        };
        Token::new(kind, lexeme, self.line)
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.char {
                Some('\n') => {
                    self.line += 1;
                    self.read_char();
                }
                Some('/') if self.is_next_char('/') => {
                    while self.char.is_some_and(|char| char != '\n') {
                        self.read_char();
                    }
                }
                Some(char) if char.is_whitespace() => self.read_char(),
                _ => break,
            }
        }
    }

    fn read_char(&mut self) {
        self.position += 1;
        self.char = self.chars.get(self.position).copied();
    }

    fn is_next_char(&self, ch: char) -> bool {
        self.peek_next() == Some(ch)
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn lexeme_from(&self, start: usize) -> String {
        self.chars[start..self.position].iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexer() {
        let input = r#"
                    var five = 5;
                    var half = 0.5;
                    // a comment runs to the end of the line
                    !-/*5;
                    5 < 10 >= 5;
                    if (5 <= 10) {
                        print true;
                    } else {
                        print false;
                    }
                    10 == 10;
                    10 != 9;
                    "foobar"
                    "foo bar"
                    nil and true or false;
                    while (x) { x = x - 1; }
                    for (;;) {}
                    "#;

        let mut lexer = Lexer::new(input);

        let mut expected = vec![
            (TokenKind::Var, "var"),
            (TokenKind::Identifier, "five"),
            (TokenKind::Equal, "="),
            (TokenKind::Number, "5"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Var, "var"),
            (TokenKind::Identifier, "half"),
            (TokenKind::Equal, "="),
            (TokenKind::Number, "0.5"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Bang, "!"),
            (TokenKind::Minus, "-"),
            (TokenKind::Slash, "/"),
            (TokenKind::Star, "*"),
            (TokenKind::Number, "5"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Number, "5"),
            (TokenKind::Less, "<"),
            (TokenKind::Number, "10"),
            (TokenKind::GreaterEqual, ">="),
            (TokenKind::Number, "5"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::If, "if"),
            (TokenKind::LeftParen, "("),
            (TokenKind::Number, "5"),
            (TokenKind::LessEqual, "<="),
            (TokenKind::Number, "10"),
            (TokenKind::RightParen, ")"),
            (TokenKind::LeftBrace, "{"),
            (TokenKind::Print, "print"),
            (TokenKind::True, "true"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::RightBrace, "}"),
            (TokenKind::Else, "else"),
            (TokenKind::LeftBrace, "{"),
            (TokenKind::Print, "print"),
            (TokenKind::False, "false"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::RightBrace, "}"),
            (TokenKind::Number, "10"),
            (TokenKind::EqualEqual, "=="),
            (TokenKind::Number, "10"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Number, "10"),
            (TokenKind::BangEqual, "!="),
            (TokenKind::Number, "9"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::String, "\"foobar\""),
            (TokenKind::String, "\"foo bar\""),
            (TokenKind::Nil, "nil"),
            (TokenKind::And, "and"),
            (TokenKind::True, "true"),
            (TokenKind::Or, "or"),
            (TokenKind::False, "false"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::While, "while"),
            (TokenKind::LeftParen, "("),
            (TokenKind::Identifier, "x"),
            (TokenKind::RightParen, ")"),
            (TokenKind::LeftBrace, "{"),
            (TokenKind::Identifier, "x"),
            (TokenKind::Equal, "="),
            (TokenKind::Identifier, "x"),
            (TokenKind::Minus, "-"),
            (TokenKind::Number, "1"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::RightBrace, "}"),
            (TokenKind::For, "for"),
            (TokenKind::LeftParen, "("),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::RightParen, ")"),
            (TokenKind::LeftBrace, "{"),
            (TokenKind::RightBrace, "}"),
        ]
        .into_iter();

        loop {
            let token = lexer.next_token();
            if token.kind == TokenKind::Eof {
                break;
            }
            let (expected_kind, expected_lexeme) = expected.next().unwrap();
            assert_eq!(token.kind, expected_kind);
            assert_eq!(token.lexeme, expected_lexeme);
        }
        assert!(expected.next().is_none());
    }

    #[test]
    fn test_line_numbers() {
        let input = "one\ntwo\n\nfour";
        let mut lexer = Lexer::new(input);

        let expected = vec![("one", 1), ("two", 2), ("four", 4)];
        for (lexeme, line) in expected {
            let token = lexer.next_token();
            assert_eq!(token.lexeme, lexeme);
            assert_eq!(token.line, line);
        }
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_multiline_string_counts_lines() {
        let mut lexer = Lexer::new("\"a\nb\" done");
        let string = lexer.next_token();
        assert_eq!(string.kind, TokenKind::String);
        assert_eq!(string.lexeme, "\"a\nb\"");
        let after = lexer.next_token();
        assert_eq!(after.line, 2);
    }

    #[test]
    fn test_error_tokens() {
        let tests = vec![
            ("@", "Unexpected character."),
            ("\"unterminated", "Unterminated string."),
        ];

        for (input, expected_message) in tests {
            let mut lexer = Lexer::new(input);
            let token = lexer.next_token();
            assert_eq!(token.kind, TokenKind::Error);
            assert_eq!(token.lexeme, expected_message);
        }
    }
}
