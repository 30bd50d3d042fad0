//! Delimiter-separated record tokenizing.
//!
//! Every input source (stations, orders, topology) is a sequence of text
//! records whose fields are separated by a single delimiter character. The
//! delimiter is an explicit [`Tokenizer`] value handed to each loader, so two
//! sources with different delimiters can be read side by side.

use std::num::ParseIntError;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while splitting a record into fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error("empty field: delimiter found at position {position}")]
    EmptyField { position: usize },
    #[error("cursor {position} is not a field boundary")]
    InvalidCursor { position: usize },
}

/// Errors raised while building a domain value from a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error("missing {field} field")]
    MissingField { field: &'static str },
    #[error("invalid {field} '{value}': {source}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        source: ParseIntError,
    },
    #[error("unexpected trailing field '{value}'")]
    TrailingField { value: String },
    #[error("order record lists no items")]
    NoItems,
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// One field extracted by [`Tokenizer::next_field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'r> {
    /// Field text with surrounding whitespace removed.
    pub text: &'r str,
    /// Whether the record has further fields after this one.
    pub more: bool,
}

/// Splits records on a single delimiter character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenizer {
    delimiter: char,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(',')
    }
}

impl Tokenizer {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Extract the field starting at `cursor` and advance the cursor past
    /// the following delimiter.
    ///
    /// A cursor at or past the end of the record yields an empty field with
    /// `more == false`. A delimiter directly at the cursor is an
    /// [`TokenizeError::EmptyField`]. A trailing delimiter simply ends the
    /// record.
    ///
    /// # Examples
    ///
    /// ```
    /// use assembly_core::record::Tokenizer;
    ///
    /// let tokenizer = Tokenizer::new('|');
    /// let mut cursor = 0;
    /// let first = tokenizer.next_field("Desk | Chair", &mut cursor).unwrap();
    /// assert_eq!(first.text, "Desk");
    /// assert!(first.more);
    /// let second = tokenizer.next_field("Desk | Chair", &mut cursor).unwrap();
    /// assert_eq!(second.text, "Chair");
    /// assert!(!second.more);
    /// ```
    pub fn next_field<'r>(
        &self,
        record: &'r str,
        cursor: &mut usize,
    ) -> Result<Field<'r>, TokenizeError> {
        if *cursor >= record.len() {
            return Ok(Field {
                text: "",
                more: false,
            });
        }

        let rest = record
            .get(*cursor..)
            .ok_or(TokenizeError::InvalidCursor { position: *cursor })?;

        let (raw, next) = match rest.find(self.delimiter) {
            Some(0) => return Err(TokenizeError::EmptyField { position: *cursor }),
            Some(offset) => (
                &rest[..offset],
                *cursor + offset + self.delimiter.len_utf8(),
            ),
            None => (rest, record.len()),
        };

        *cursor = next;
        Ok(Field {
            text: raw.trim(),
            more: next < record.len(),
        })
    }

    /// Start reading the fields of `record` one at a time.
    pub fn reader<'t, 'r>(&'t self, record: &'r str) -> FieldReader<'t, 'r> {
        FieldReader {
            tokenizer: self,
            record,
            cursor: 0,
            more: !record.is_empty(),
        }
    }

    /// Split a whole record into trimmed fields.
    pub fn split<'r>(&self, record: &'r str) -> Result<Vec<&'r str>, TokenizeError> {
        let mut reader = self.reader(record);
        let mut fields = Vec::new();
        while let Some(field) = reader.next_field()? {
            fields.push(field);
        }
        Ok(fields)
    }
}

// ---------------------------------------------------------------------------
// FieldReader
// ---------------------------------------------------------------------------

/// Sequential, typed access to the fields of one record.
#[derive(Debug)]
pub struct FieldReader<'t, 'r> {
    tokenizer: &'t Tokenizer,
    record: &'r str,
    cursor: usize,
    more: bool,
}

impl<'r> FieldReader<'_, 'r> {
    /// The next field, or `None` once the record is exhausted.
    pub fn next_field(&mut self) -> Result<Option<&'r str>, TokenizeError> {
        if !self.more {
            return Ok(None);
        }
        let field = self.tokenizer.next_field(self.record, &mut self.cursor)?;
        self.more = field.more;
        Ok(Some(field.text))
    }

    /// Whether further fields remain.
    pub fn has_more(&self) -> bool {
        self.more
    }

    /// The next field, which must exist and be non-empty.
    pub fn required(&mut self, field: &'static str) -> Result<&'r str, RecordError> {
        match self.next_field()? {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(RecordError::MissingField { field }),
        }
    }

    /// The next field parsed as an integer.
    pub fn number<T>(&mut self, field: &'static str) -> Result<T, RecordError>
    where
        T: FromStr<Err = ParseIntError>,
    {
        let text = self.required(field)?;
        text.parse().map_err(|source| RecordError::InvalidNumber {
            field,
            value: text.to_string(),
            source,
        })
    }

    /// Fail if any non-empty field is left over.
    pub fn finish(mut self) -> Result<(), RecordError> {
        match self.next_field()? {
            Some(text) if !text.is_empty() => Err(RecordError::TrailingField {
                value: text.to_string(),
            }),
            _ => Ok(()),
        }
    }
}
