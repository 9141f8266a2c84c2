/// HTTP/1.0 response assembly for the single-segment TCP responder.
///
/// The request is never parsed: any non-empty payload gets the configured
/// body. The whole response (status line, headers, body) must fit in one
/// TCP segment, so the body is cut short when it would not.
use core::fmt::{self, Write};

use crate::storage::ByteStore;

/// Maximum TCP payload this stack emits in one segment.
pub const SEGMENT_CAPACITY: usize = 1460;

pub const INLINE_CAPACITY: usize = 512;
pub const PATH_CAPACITY: usize = 128;

pub const DEFAULT_PATH: &str = "/www/index";
pub const DEFAULT_INLINE_BODY: &str =
    "<html><body><h1>Mezereon</h1><p>Hello.</p></body></html>\n";
pub const NOT_FOUND_BODY: &str = "<html><body><h1>404 Not Found</h1></body></html>\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySource {
    /// The configured inline text.
    Inline,
    /// The file at the configured path in the byte store.
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NotFound,
}

impl Status {
    pub fn status_line(self) -> &'static str {
        match self {
            Status::Ok => "HTTP/1.0 200 OK",
            Status::NotFound => "HTTP/1.0 404 Not Found",
        }
    }
}

/// Text held in a fixed buffer, cut at a char boundary when too long.
#[derive(Clone, Copy)]
struct FixedText<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> FixedText<N> {
    fn new(text: &str) -> Self {
        let mut t = Self { buf: [0u8; N], len: 0 };
        t.set(text);
        t
    }

    fn set(&mut self, text: &str) {
        let mut len = text.len().min(N);
        while !text.is_char_boundary(len) {
            len -= 1;
        }
        self.buf[..len].copy_from_slice(&text.as_bytes()[..len]);
        self.len = len;
    }

    fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }
}

/// Body configuration for the responder.
pub struct HttpResponder {
    source: BodySource,
    inline: FixedText<INLINE_CAPACITY>,
    path: FixedText<PATH_CAPACITY>,
}

impl HttpResponder {
    /// Storage mode, serving `DEFAULT_PATH`, with the default inline text.
    pub fn new() -> Self {
        Self {
            source: BodySource::Storage,
            inline: FixedText::new(DEFAULT_INLINE_BODY),
            path: FixedText::new(DEFAULT_PATH),
        }
    }

    pub fn source(&self) -> BodySource {
        self.source
    }

    pub fn inline_body(&self) -> &str {
        self.inline.as_str()
    }

    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Replace the inline text. Does not change the source.
    pub fn set_inline_body(&mut self, body: &str) {
        self.inline.set(body);
    }

    pub fn use_inline(&mut self) {
        self.source = BodySource::Inline;
    }

    /// Serve the file at `path` from now on.
    pub fn set_path(&mut self, path: &str) {
        self.path.set(path);
        self.source = BodySource::Storage;
    }

    /// Assemble the full response into `out`, returning its status and length.
    pub fn respond(&self, store: &mut dyn ByteStore, out: &mut [u8]) -> (Status, usize) {
        let mut file = [0u8; SEGMENT_CAPACITY];
        let (status, body): (Status, &[u8]) = match self.source {
            BodySource::Inline => (Status::Ok, self.inline.as_str().as_bytes()),
            BodySource::Storage => match store.read(self.path(), &mut file) {
                Some(n) => (Status::Ok, &file[..n]),
                None => {
                    log::debug!("http: {} not found", self.path());
                    (Status::NotFound, NOT_FOUND_BODY.as_bytes())
                }
            },
        };
        (status, assemble(status, body, out))
    }
}

impl Default for HttpResponder {
    fn default() -> Self {
        Self::new()
    }
}

/// `fmt::Write` over a byte slice; fails instead of overflowing.
struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl Write for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.pos + s.len();
        if end > self.buf.len() {
            return Err(fmt::Error);
        }
        self.buf[self.pos..end].copy_from_slice(s.as_bytes());
        self.pos = end;
        Ok(())
    }
}

fn write_head(out: &mut [u8], status: Status, body_len: usize) -> Option<usize> {
    let mut w = SliceWriter { buf: out, pos: 0 };
    write!(
        w,
        "{}\r\nContent-Type: text/html\r\nConnection: close\r\nContent-Length: {}\r\n\r\n",
        status.status_line(),
        body_len
    )
    .ok()?;
    Some(w.pos)
}

/// Write status line, headers and as much of `body` as fits into `out`.
/// `Content-Length` always matches the body bytes actually written.
/// Returns 0 if not even the head fits.
pub fn assemble(status: Status, body: &[u8], out: &mut [u8]) -> usize {
    let mut body_len = body.len();
    loop {
        let head = match write_head(out, status, body_len) {
            Some(n) => n,
            None => return 0,
        };
        let room = out.len() - head;
        if body_len <= room {
            out[head..head + body_len].copy_from_slice(&body[..body_len]);
            return head + body_len;
        }
        // A shorter length never needs more digits, so the second pass fits.
        body_len = room;
    }
}
