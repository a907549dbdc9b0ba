use log::debug;

use crate::coercer::ValueCoercer;
use crate::document::{accumulate, AnnotationDocument, ValueMap};
use crate::error::{Position, Result};
use crate::grammar::GrammarTable;

/// Separator between an annotation key and its value
pub const KEY_SEPARATOR: char = ':';
/// Rest-of-line marker that opens a multi-line value
pub const MULTI_LINE_START: &str = "|-";
/// Line that closes a multi-line value before the next key
pub const MULTI_LINE_END: &str = "-|";

/// One comment line, already stripped of `//` or `/* */` delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
    pub text: String,
    pub position: Position,
}

impl CommentLine {
    pub fn new(text: impl Into<String>, position: Position) -> Self {
        Self {
            text: text.into(),
            position,
        }
    }
}

/// Table-driven parser turning comment blocks into [`AnnotationDocument`]s.
///
/// A `CommentParser` is one parse session: uniqueness constraints hold across
/// every block parsed through the same instance.
///
/// # Example
///
/// ```
/// use openapi_annotations::error::Position;
/// use openapi_annotations::grammar::ROUTE_GRAMMAR;
/// use openapi_annotations::parser::{CommentLine, CommentParser};
///
/// let lines = vec![
///     CommentLine::new("@summary: List users", Position::new("route.go", 1)),
///     CommentLine::new("@router: method=get; path=/users", Position::new("route.go", 2)),
/// ];
/// let mut parser = CommentParser::new(&ROUTE_GRAMMAR);
/// let doc = parser.parse_block(&lines).unwrap();
/// assert_eq!(doc.route_keys().len(), 1);
/// ```
pub struct CommentParser<'g> {
    coercer: ValueCoercer<'g>,
}

/// A multi-line value being collected
struct OpenBlock {
    key: String,
    text: String,
    position: Position,
}

impl<'g> CommentParser<'g> {
    pub fn new(grammar: &'g GrammarTable) -> Self {
        Self {
            coercer: ValueCoercer::new(grammar),
        }
    }

    /// Parses one comment block into a document.
    ///
    /// Lines whose title is not a grammar key are prose and are skipped,
    /// unless a `|-` block is open, in which case they become part of its
    /// value. Values are dispatched in line order and repeated keys
    /// accumulate.
    ///
    /// # Errors
    ///
    /// The first validation error aborts the block.
    pub fn parse_block(&mut self, lines: &[CommentLine]) -> Result<AnnotationDocument> {
        let grammar = self.coercer.grammar();
        let mut entries = ValueMap::new();
        let mut open: Option<OpenBlock> = None;

        for line in lines {
            let (title, rest) = match line.text.split_once(KEY_SEPARATOR) {
                Some((title, rest)) => (title.trim(), rest),
                None => (line.text.trim(), ""),
            };

            if grammar.title(title).is_none() {
                if line.text.trim() == MULTI_LINE_END {
                    if let Some(block) = open.take() {
                        self.flush(&mut entries, block)?;
                    }
                } else if let Some(block) = open.as_mut() {
                    block.text.push_str(line.text.trim_end());
                    block.text.push('\n');
                }
                continue;
            }

            if let Some(block) = open.take() {
                self.flush(&mut entries, block)?;
            }

            let rest = rest.trim();
            if rest == MULTI_LINE_START {
                debug!("Opening multi-line value for {} at {}", title, line.position);
                open = Some(OpenBlock {
                    key: title.to_string(),
                    text: String::new(),
                    position: line.position.clone(),
                });
                continue;
            }

            self.dispatch(&mut entries, title, rest, &line.position)?;
        }

        if let Some(block) = open.take() {
            self.flush(&mut entries, block)?;
        }

        Ok(AnnotationDocument::from_entries(entries))
    }

    /// Parses several blocks in one session, returning a document per block.
    pub fn parse_blocks(&mut self, blocks: &[Vec<CommentLine>]) -> Result<Vec<AnnotationDocument>> {
        blocks.iter().map(|block| self.parse_block(block)).collect()
    }

    fn flush(&mut self, entries: &mut ValueMap, block: OpenBlock) -> Result<()> {
        self.dispatch(entries, &block.key, block.text.trim(), &block.position)
    }

    fn dispatch(&mut self, entries: &mut ValueMap, key: &str, raw: &str, position: &Position) -> Result<()> {
        let Some(entry) = self.coercer.grammar().title(key) else {
            return Ok(());
        };
        let kind = entry.kind;
        debug!("Dispatching {} at {}", key, position);
        let value = self.coercer.coerce(key, raw, position)?;
        accumulate(entries, key, kind, value);
        Ok(())
    }
}
