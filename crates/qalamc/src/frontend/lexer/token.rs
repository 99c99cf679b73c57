//! Token definitions for the Qalam lexer

use crate::common::Span;
use logos::Logos;

/// Token with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// All token kinds of the language
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f\x{200F}\x{200E}]+")] // Skip whitespace and direction marks
#[logos(skip r"//[^\n]*")]                    // Skip line comments
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")] // Skip block comments
pub enum TokenKind {
    // === Keywords (resolved from identifiers by `TokenKind::keyword`) ===
    // Section and declaration keywords
    Program,
    Const,
    Type,
    Var,
    Procedure,
    List,
    Record,
    Of,
    ByValue,
    ByReference,

    // Statement keywords
    Read,
    Print,
    If,
    Then,
    Else,
    For,
    To,
    Step,
    While,
    Do,
    Repeat,
    Until,

    // Boolean literals
    True,
    False,

    // === Identifiers ===
    #[regex(r"[\x{0621}-\x{064A}a-zA-Z_][\x{0621}-\x{065F}a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // === Literals ===
    #[regex(r"[0-9]+", |lex| lex.slice().to_string())]
    IntLiteral(String),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().to_string())]
    RealLiteral(String),

    #[regex(r#""[^"\n]*""#, |lex| lex.slice().to_string())]
    StringLiteral(String),

    #[regex(r"'[^'\n]'", |lex| lex.slice().to_string())]
    CharLiteral(String),

    // === Operators ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("\\")]
    Backslash,
    #[token("%")]
    Percent,
    #[token("==")]
    EqEq,
    #[token("=!")]
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("!")]
    Bang,
    #[token("=")]
    Eq,

    // === Punctuation ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    #[token("؛")]
    Semi,
    #[token(",")]
    #[token("،")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,

    /// End of file (not produced by logos)
    Eof,
}

impl TokenKind {
    /// Keyword spelled by `word`, including the hamza spelling variants
    ///
    /// Keywords are lexed through the identifier pattern and sorted out
    /// here, so a keyword directly followed by `؛` or `،` is still a keyword.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "برنامج" => TokenKind::Program,
            "ثابت" => TokenKind::Const,
            "نوع" => TokenKind::Type,
            "متغير" => TokenKind::Var,
            "اجراء" | "إجراء" => TokenKind::Procedure,
            "قائمة" => TokenKind::List,
            "سجل" => TokenKind::Record,
            "من" => TokenKind::Of,
            "بالقيمة" => TokenKind::ByValue,
            "بالمرجع" => TokenKind::ByReference,
            "اقرأ" | "اقرا" => TokenKind::Read,
            "اطبع" => TokenKind::Print,
            "اذا" | "إذا" => TokenKind::If,
            "فان" | "فإن" => TokenKind::Then,
            "وإلا" | "والا" => TokenKind::Else,
            "لكل" => TokenKind::For,
            "الى" | "إلى" => TokenKind::To,
            "بخطوة" => TokenKind::Step,
            "طالما" => TokenKind::While,
            "نفذ" => TokenKind::Do,
            "كرر" => TokenKind::Repeat,
            "حتى" => TokenKind::Until,
            "صح" => TokenKind::True,
            "خطأ" => TokenKind::False,
            _ => return None,
        };
        Some(kind)
    }

    /// Operators at the additive level: `+ - ||`
    pub fn is_add_op(&self) -> bool {
        matches!(self, TokenKind::Plus | TokenKind::Minus | TokenKind::PipePipe)
    }

    /// Operators at the multiplicative level: `* / \ % &&`
    pub fn is_mul_op(&self) -> bool {
        matches!(
            self,
            TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Backslash
                | TokenKind::Percent
                | TokenKind::AmpAmp
        )
    }

    /// Tokens that open a definitions section inside a block
    pub fn starts_section(&self) -> bool {
        matches!(
            self,
            TokenKind::Const | TokenKind::Type | TokenKind::Var | TokenKind::Procedure
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Program => write!(f, "'برنامج'"),
            TokenKind::Const => write!(f, "'ثابت'"),
            TokenKind::Type => write!(f, "'نوع'"),
            TokenKind::Var => write!(f, "'متغير'"),
            TokenKind::Procedure => write!(f, "'اجراء'"),
            TokenKind::List => write!(f, "'قائمة'"),
            TokenKind::Record => write!(f, "'سجل'"),
            TokenKind::Of => write!(f, "'من'"),
            TokenKind::ByValue => write!(f, "'بالقيمة'"),
            TokenKind::ByReference => write!(f, "'بالمرجع'"),
            TokenKind::Read => write!(f, "'اقرأ'"),
            TokenKind::Print => write!(f, "'اطبع'"),
            TokenKind::If => write!(f, "'اذا'"),
            TokenKind::Then => write!(f, "'فان'"),
            TokenKind::Else => write!(f, "'وإلا'"),
            TokenKind::For => write!(f, "'لكل'"),
            TokenKind::To => write!(f, "'الى'"),
            TokenKind::Step => write!(f, "'بخطوة'"),
            TokenKind::While => write!(f, "'طالما'"),
            TokenKind::Do => write!(f, "'نفذ'"),
            TokenKind::Repeat => write!(f, "'كرر'"),
            TokenKind::Until => write!(f, "'حتى'"),
            TokenKind::True => write!(f, "'صح'"),
            TokenKind::False => write!(f, "'خطأ'"),
            TokenKind::Identifier(s) => write!(f, "identifier '{}'", s),
            TokenKind::IntLiteral(s) => write!(f, "integer '{}'", s),
            TokenKind::RealLiteral(s) => write!(f, "real '{}'", s),
            TokenKind::StringLiteral(s) => write!(f, "string {}", s),
            TokenKind::CharLiteral(s) => write!(f, "char {}", s),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Backslash => write!(f, "'\\'"),
            TokenKind::Percent => write!(f, "'%'"),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::NotEq => write!(f, "'=!'"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::LtEq => write!(f, "'<='"),
            TokenKind::GtEq => write!(f, "'>='"),
            TokenKind::AmpAmp => write!(f, "'&&'"),
            TokenKind::PipePipe => write!(f, "'||'"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::Semi => write!(f, "'؛'"),
            TokenKind::Comma => write!(f, "'،'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}
