//! Field path parser
//!
//! This module implements a single-pass scanner for field path strings
//! with position-aware error reporting.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use super::segment::{CollectionStyle, PathSegment};

/// Errors raised while parsing a field path string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedPathError {
    /// The path string was empty or whitespace
    #[error("empty field path")]
    Empty,

    /// A segment had no name at the given position
    #[error("empty segment name at position {position}")]
    EmptySegment { position: usize },

    /// A collection marker was opened but never closed, or closed without
    /// being opened
    #[error("unbalanced collection marker '{marker}' at position {position}")]
    UnbalancedMarker { marker: char, position: usize },

    /// A collection index was present but not a valid number
    #[error("invalid collection index '{text}' at position {position}")]
    InvalidIndex { text: String, position: usize },

    /// A character appeared where a separator or end of input was expected
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedCharacter { found: char, position: usize },
}

/// Field path string parser
pub(crate) struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(input: &'a str) -> Result<Self, MalformedPathError> {
        if input.trim().is_empty() {
            return Err(MalformedPathError::Empty);
        }
        Ok(Self {
            chars: input.chars().peekable(),
            position: 0,
        })
    }

    /// Parse the whole input into an ordered segment list
    pub(crate) fn parse(mut self) -> Result<Vec<PathSegment>, MalformedPathError> {
        // A leading separator is accepted and implied on output.
        if self.peek() == Some('/') {
            self.advance();
        }

        let mut segments = Vec::new();
        loop {
            segments.push(self.parse_segment()?);
            match self.peek() {
                None => break,
                Some('/') => {
                    self.advance();
                }
                Some(found) => {
                    return Err(MalformedPathError::UnexpectedCharacter {
                        found,
                        position: self.position,
                    });
                }
            }
        }
        Ok(segments)
    }

    fn parse_segment(&mut self) -> Result<PathSegment, MalformedPathError> {
        let is_attribute = if self.peek() == Some('@') {
            self.advance();
            true
        } else {
            false
        };

        let name_start = self.position;
        let mut name = String::new();
        let mut marker: Option<char> = None;

        while let Some(ch) = self.peek() {
            match ch {
                '/' => break,
                '[' | '<' | '{' => {
                    marker = Some(ch);
                    break;
                }
                ']' | '>' | '}' => {
                    return Err(MalformedPathError::UnbalancedMarker {
                        marker: ch,
                        position: self.position,
                    });
                }
                _ => {
                    name.push(ch);
                    self.advance();
                }
            }
        }

        if name.is_empty() {
            return Err(MalformedPathError::EmptySegment {
                position: name_start,
            });
        }

        let (collection_style, index) = match marker {
            None => (None, None),
            Some(open) => {
                let marker_position = self.position;
                self.advance();
                let style = match open {
                    '[' => CollectionStyle::Array,
                    '<' => CollectionStyle::GenericList,
                    _ => CollectionStyle::Indexed,
                };

                let digits_start = self.position;
                let mut digits = String::new();
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_digit() {
                        digits.push(ch);
                        self.advance();
                    } else {
                        break;
                    }
                }

                if self.peek() != Some(style.close()) {
                    return Err(MalformedPathError::UnbalancedMarker {
                        marker: open,
                        position: marker_position,
                    });
                }
                self.advance();

                // Anything but a separator after the closing marker is bogus.
                if let Some(found) = self.peek() {
                    if found != '/' {
                        return Err(MalformedPathError::UnexpectedCharacter {
                            found,
                            position: self.position,
                        });
                    }
                }

                let index = if digits.is_empty() {
                    None
                } else {
                    let parsed = digits.parse::<usize>().map_err(|_| {
                        MalformedPathError::InvalidIndex {
                            text: digits.clone(),
                            position: digits_start,
                        }
                    })?;
                    Some(parsed)
                };

                (Some(style), index)
            }
        };

        Ok(PathSegment {
            name,
            collection_style,
            index,
            is_attribute,
        })
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
        }
    }
}
