//! CoNLL-U input, the hand-off format of the external dependency parser.
//!
//! Blocks of token lines separated by blank lines; `# text = ...` gives the
//! sentence text. UPOS (falling back to XPOS) is used as the tag and DEPREL
//! as the dependency label. Multiword ranges and empty nodes carry no
//! dependency of their own and are skipped.

use std::fs;
use std::path::Path;

use nom::{
    bytes::complete::take_while,
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res},
    multi::separated_list1,
    IResult,
};
use thiserror::Error;
use tracing::warn;

use crate::sentence::{Sentence, SentenceError, TokenData};

const COLUMNS: usize = 10;

#[derive(Debug, Error)]
pub enum ConllError {
    #[error("failed to read CoNLL-U input: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("sentence starting at line {line}: {source}")]
    Sentence {
        line: usize,
        #[source]
        source: SentenceError,
    },
}

fn field(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c != '\t')(input)
}

fn columns(line: &str) -> IResult<&str, Vec<&str>> {
    all_consuming(separated_list1(char('\t'), field))(line)
}

fn number(input: &str) -> IResult<&str, usize> {
    all_consuming(map_res(digit1, str::parse::<usize>))(input)
}

#[derive(Default)]
struct Block {
    start: usize,
    text: Option<String>,
    tokens: Vec<TokenData>,
}

impl Block {
    fn finish(self) -> Result<Sentence, ConllError> {
        let text = self.text.unwrap_or_else(|| {
            self.tokens
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        });
        Sentence::new(text, self.tokens).map_err(|source| ConllError::Sentence {
            line: self.start,
            source,
        })
    }
}

pub fn read_conll(path: impl AsRef<Path>) -> Result<Vec<Sentence>, ConllError> {
    parse_conll(&fs::read_to_string(path)?)
}

pub fn parse_conll(input: &str) -> Result<Vec<Sentence>, ConllError> {
    let mut sentences = Vec::new();
    let mut block: Option<Block> = None;

    for (i, raw) in input.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim_end_matches('\r');

        if line.trim().is_empty() {
            if let Some(done) = block.take() {
                if !done.tokens.is_empty() {
                    sentences.push(done.finish()?);
                }
            }
            continue;
        }

        let current = block.get_or_insert_with(|| Block {
            start: line_no,
            ..Block::default()
        });

        if let Some(comment) = line.strip_prefix('#') {
            if let Some(text) = comment.trim_start().strip_prefix("text") {
                if let Some(text) = text.trim_start().strip_prefix('=') {
                    current.text = Some(text.trim().to_string());
                }
            }
            continue;
        }

        if let Some(token) = parse_token_line(line, line_no, current.tokens.len())? {
            current.tokens.push(token);
        }
    }

    if let Some(done) = block.take() {
        if !done.tokens.is_empty() {
            sentences.push(done.finish()?);
        }
    }

    Ok(sentences)
}

/// Parses one token line; `None` for lines that carry no token of their own.
fn parse_token_line(line: &str, line_no: usize, seen: usize) -> Result<Option<TokenData>, ConllError> {
    let syntax = |message: String| ConllError::Syntax {
        line: line_no,
        message,
    };

    let (_, cols) = columns(line).map_err(|e| syntax(format!("malformed line: {}", e)))?;
    if cols.len() != COLUMNS {
        return Err(syntax(format!("expected {} columns, found {}", COLUMNS, cols.len())));
    }

    let id = cols[0];
    if id.contains('-') || id.contains('.') {
        warn!(line = line_no, id, "skipping multiword range or empty node");
        return Ok(None);
    }

    let (_, id) = number(id).map_err(|_| syntax(format!("invalid token id {:?}", cols[0])))?;
    if id != seen + 1 {
        return Err(syntax(format!("expected token id {}, found {}", seen + 1, id)));
    }
    let (_, head) = number(cols[6]).map_err(|_| syntax(format!("invalid head {:?}", cols[6])))?;

    let tag = if cols[3] != "_" { cols[3] } else { cols[4] };
    Ok(Some(TokenData {
        text: cols[1].to_string(),
        lemma: cols[2].to_string(),
        tag: tag.to_string(),
        dep: cols[7].to_string(),
        head: head.checked_sub(1),
    }))
}
