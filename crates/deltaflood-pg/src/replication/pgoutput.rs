//! Decoder for the pgoutput logical replication message format.
//!
//! Reference: https://www.postgresql.org/docs/current/protocol-logicalrep-message-formats.html

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{PgError, PgResult};

/// A decoded pgoutput message.
#[derive(Debug, Clone, PartialEq)]
pub enum PgOutputMessage {
    Begin(BeginMessage),
    Commit(CommitMessage),
    Origin(OriginMessage),
    Relation(RelationMessage),
    Type(TypeMessage),
    Insert(InsertMessage),
    Update(UpdateMessage),
    Delete(DeleteMessage),
    Truncate(TruncateMessage),
    Message(LogicalMessage),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BeginMessage {
    /// LSN of the transaction's commit record.
    pub final_lsn: u64,
    /// Commit time, microseconds since 2000-01-01.
    pub timestamp: i64,
    pub xid: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitMessage {
    pub flags: u8,
    pub commit_lsn: u64,
    pub end_lsn: u64,
    pub timestamp: i64,
}

/// Sent when the transaction's changes came from a replication origin.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginMessage {
    pub origin_lsn: u64,
    pub origin_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationMessage {
    pub relation_id: u32,
    /// Empty for `pg_catalog`.
    pub namespace: String,
    pub name: String,
    pub replica_identity: u8,
    pub columns: Vec<RelationColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationColumn {
    /// Bit 0 set when the column is part of the replica identity key.
    pub flags: u8,
    pub name: String,
    pub type_oid: u32,
    pub type_modifier: i32,
}

impl RelationColumn {
    pub fn is_key(&self) -> bool {
        self.flags & 1 != 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeMessage {
    pub type_id: u32,
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertMessage {
    pub relation_id: u32,
    pub new_tuple: Vec<TupleValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateMessage {
    pub relation_id: u32,
    /// Key (`K`) or full old (`O`) tuple, depending on replica identity.
    pub old_tuple: Option<Vec<TupleValue>>,
    pub new_tuple: Vec<TupleValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteMessage {
    pub relation_id: u32,
    pub old_tuple: Vec<TupleValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TruncateMessage {
    pub options: u8,
    pub relation_ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalMessage {
    pub flags: u8,
    pub lsn: u64,
    pub prefix: String,
    pub content: Vec<u8>,
}

/// One column of tuple data.
#[derive(Debug, Clone, PartialEq)]
pub enum TupleValue {
    Null,
    /// An unchanged TOASTed value that was not sent.
    UnchangedToast,
    /// Text output in the server encoding, kept as sent.
    Text(Vec<u8>),
    Binary(Vec<u8>),
}

/// Decode one pgoutput message.
pub fn decode_message(data: &[u8]) -> PgResult<PgOutputMessage> {
    let (&tag, payload) = data
        .split_first()
        .ok_or_else(|| PgError::PgOutput("empty message".into()))?;
    let mut r = MessageReader::new(payload);

    let msg = match tag {
        b'B' => PgOutputMessage::Begin(BeginMessage {
            final_lsn: r.u64()?,
            timestamp: r.i64()?,
            xid: r.u32()?,
        }),
        b'C' => PgOutputMessage::Commit(CommitMessage {
            flags: r.u8()?,
            commit_lsn: r.u64()?,
            end_lsn: r.u64()?,
            timestamp: r.i64()?,
        }),
        b'O' => PgOutputMessage::Origin(OriginMessage {
            origin_lsn: r.u64()?,
            origin_name: r.cstring()?,
        }),
        b'R' => PgOutputMessage::Relation(r.relation()?),
        b'Y' => PgOutputMessage::Type(TypeMessage {
            type_id: r.u32()?,
            namespace: r.cstring()?,
            name: r.cstring()?,
        }),
        b'I' => {
            let relation_id = r.u32()?;
            r.expect_marker(b"N", "insert")?;
            PgOutputMessage::Insert(InsertMessage {
                relation_id,
                new_tuple: r.tuple()?,
            })
        }
        b'U' => {
            let relation_id = r.u32()?;
            let old_tuple = match r.u8()? {
                b'K' | b'O' => {
                    let old = r.tuple()?;
                    r.expect_marker(b"N", "update")?;
                    Some(old)
                }
                b'N' => None,
                other => {
                    return Err(PgError::PgOutput(format!(
                        "unexpected tuple type in update: '{}'",
                        other as char
                    )))
                }
            };
            PgOutputMessage::Update(UpdateMessage {
                relation_id,
                old_tuple,
                new_tuple: r.tuple()?,
            })
        }
        b'D' => {
            let relation_id = r.u32()?;
            r.expect_marker(b"KO", "delete")?;
            PgOutputMessage::Delete(DeleteMessage {
                relation_id,
                old_tuple: r.tuple()?,
            })
        }
        b'T' => {
            let count = r.u32()?;
            let options = r.u8()?;
            let relation_ids = (0..count).map(|_| r.u32()).collect::<PgResult<_>>()?;
            PgOutputMessage::Truncate(TruncateMessage {
                options,
                relation_ids,
            })
        }
        b'M' => {
            let flags = r.u8()?;
            let lsn = r.u64()?;
            let prefix = r.cstring()?;
            let len = r.u32()? as usize;
            PgOutputMessage::Message(LogicalMessage {
                flags,
                lsn,
                prefix,
                content: r.bytes(len)?,
            })
        }
        other => {
            return Err(PgError::PgOutput(format!(
                "unknown message type: {} (0x{:02X})",
                other as char, other
            )))
        }
    };

    Ok(msg)
}

struct MessageReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> MessageReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    fn u8(&mut self) -> PgResult<u8> {
        Ok(self.cursor.read_u8()?)
    }

    fn i16(&mut self) -> PgResult<i16> {
        Ok(self.cursor.read_i16::<BigEndian>()?)
    }

    fn i32(&mut self) -> PgResult<i32> {
        Ok(self.cursor.read_i32::<BigEndian>()?)
    }

    fn u32(&mut self) -> PgResult<u32> {
        Ok(self.cursor.read_u32::<BigEndian>()?)
    }

    fn i64(&mut self) -> PgResult<i64> {
        Ok(self.cursor.read_i64::<BigEndian>()?)
    }

    fn u64(&mut self) -> PgResult<u64> {
        Ok(self.cursor.read_u64::<BigEndian>()?)
    }

    fn remaining(&self) -> usize {
        let data = self.cursor.get_ref();
        data.len().saturating_sub(self.cursor.position() as usize)
    }

    /// Read `len` bytes. The length is checked before allocating.
    fn bytes(&mut self, len: usize) -> PgResult<Vec<u8>> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(PgError::PgOutput(format!(
                "value length {} exceeds the {} bytes left in the message",
                len, remaining
            )));
        }
        let mut buf = vec![0u8; len];
        self.cursor.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a NUL-terminated string.
    fn cstring(&mut self) -> PgResult<String> {
        let mut bytes = Vec::new();
        loop {
            match self.u8()? {
                0 => break,
                b => bytes.push(b),
            }
        }
        String::from_utf8(bytes)
            .map_err(|e| PgError::PgOutput(format!("name is not valid UTF-8: {}", e)))
    }

    fn expect_marker(&mut self, allowed: &[u8], context: &str) -> PgResult<u8> {
        let marker = self.u8()?;
        if allowed.contains(&marker) {
            Ok(marker)
        } else {
            Err(PgError::PgOutput(format!(
                "unexpected tuple type in {}: '{}'",
                context, marker as char
            )))
        }
    }

    fn relation(&mut self) -> PgResult<RelationMessage> {
        let relation_id = self.u32()?;
        let namespace = self.cstring()?;
        let name = self.cstring()?;
        let replica_identity = self.u8()?;
        let count = self.i16()?.max(0) as usize;

        let mut columns = Vec::with_capacity(count);
        for _ in 0..count {
            columns.push(RelationColumn {
                flags: self.u8()?,
                name: self.cstring()?,
                type_oid: self.u32()?,
                type_modifier: self.i32()?,
            });
        }

        Ok(RelationMessage {
            relation_id,
            namespace,
            name,
            replica_identity,
            columns,
        })
    }

    fn tuple(&mut self) -> PgResult<Vec<TupleValue>> {
        let count = self.i16()?.max(0) as usize;
        let mut values = Vec::with_capacity(count);

        for _ in 0..count {
            let value = match self.u8()? {
                b'n' => TupleValue::Null,
                b'u' => TupleValue::UnchangedToast,
                b't' => {
                    let len = self.len_prefix()?;
                    TupleValue::Text(self.bytes(len)?)
                }
                b'b' => {
                    let len = self.len_prefix()?;
                    TupleValue::Binary(self.bytes(len)?)
                }
                other => {
                    return Err(PgError::PgOutput(format!(
                        "unknown column value type: '{}' (0x{:02X})",
                        other as char, other
                    )))
                }
            };
            values.push(value);
        }

        Ok(values)
    }

    fn len_prefix(&mut self) -> PgResult<usize> {
        let len = self.i32()?;
        usize::try_from(len)
            .map_err(|_| PgError::PgOutput(format!("negative value length: {}", len)))
    }
}

#[cfg(test)]
pub(crate) mod test_messages {
    //! Builders for raw pgoutput messages.

    pub fn begin(final_lsn: u64, xid: u32) -> Vec<u8> {
        let mut data = vec![b'B'];
        data.extend_from_slice(&final_lsn.to_be_bytes());
        data.extend_from_slice(&12345678i64.to_be_bytes());
        data.extend_from_slice(&xid.to_be_bytes());
        data
    }

    pub fn commit(commit_lsn: u64, end_lsn: u64) -> Vec<u8> {
        let mut data = vec![b'C', 0];
        data.extend_from_slice(&commit_lsn.to_be_bytes());
        data.extend_from_slice(&end_lsn.to_be_bytes());
        data.extend_from_slice(&12345i64.to_be_bytes());
        data
    }

    pub fn origin(name: &str) -> Vec<u8> {
        let mut data = vec![b'O'];
        data.extend_from_slice(&0x10u64.to_be_bytes());
        data.extend_from_slice(name.as_bytes());
        data.push(0);
        data
    }

    /// A relation whose columns are `(name, type_oid, is_key)`.
    pub fn relation(id: u32, namespace: &str, name: &str, columns: &[(&str, u32, bool)]) -> Vec<u8> {
        let mut data = vec![b'R'];
        data.extend_from_slice(&id.to_be_bytes());
        data.extend_from_slice(namespace.as_bytes());
        data.push(0);
        data.extend_from_slice(name.as_bytes());
        data.push(0);
        data.push(b'd');
        data.extend_from_slice(&(columns.len() as i16).to_be_bytes());
        for (col, type_oid, key) in columns {
            data.push(u8::from(*key));
            data.extend_from_slice(col.as_bytes());
            data.push(0);
            data.extend_from_slice(&type_oid.to_be_bytes());
            data.extend_from_slice(&(-1i32).to_be_bytes());
        }
        data
    }

    /// Tuple data; `None` is null, `Some("\u{0}toast")` marks an unchanged TOAST value.
    pub fn tuple(values: &[Option<&str>]) -> Vec<u8> {
        let mut data = (values.len() as i16).to_be_bytes().to_vec();
        for value in values {
            match value {
                None => data.push(b'n'),
                Some("\u{0}toast") => data.push(b'u'),
                Some(v) => {
                    data.push(b't');
                    data.extend_from_slice(&(v.len() as i32).to_be_bytes());
                    data.extend_from_slice(v.as_bytes());
                }
            }
        }
        data
    }

    pub fn insert(relation_id: u32, values: &[Option<&str>]) -> Vec<u8> {
        let mut data = vec![b'I'];
        data.extend_from_slice(&relation_id.to_be_bytes());
        data.push(b'N');
        data.extend(tuple(values));
        data
    }

    pub fn update(relation_id: u32, old: Option<&[Option<&str>]>, new: &[Option<&str>]) -> Vec<u8> {
        let mut data = vec![b'U'];
        data.extend_from_slice(&relation_id.to_be_bytes());
        if let Some(old) = old {
            data.push(b'O');
            data.extend(tuple(old));
        }
        data.push(b'N');
        data.extend(tuple(new));
        data
    }

    pub fn delete(relation_id: u32, old: &[Option<&str>]) -> Vec<u8> {
        let mut data = vec![b'D'];
        data.extend_from_slice(&relation_id.to_be_bytes());
        data.push(b'K');
        data.extend(tuple(old));
        data
    }
}
