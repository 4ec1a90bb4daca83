//! Reads just enough of an incoming data set to route it
//!
//! The payload is buffered in growing windows and parsed for top-level
//! attributes until Pixel Data, end of stream, or the configured limit. The
//! buffered bytes are handed back so they can be replayed ahead of the rest
//! of the live stream; nothing is ever rewound.

use std::io::Cursor;

use dicom_core::header::DataElementHeader;
use dicom_core::DataElement;
use dicom_dictionary_std::tags;
use dicom_encoding::transfer_syntax::{TransferSyntax, TransferSyntaxIndex};
use dicom_object::InMemDicomObject;
use dicom_parser::dataset::{DataSetReader, DataToken};
use dicom_transfer_syntax_registry::TransferSyntaxRegistry;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use crate::error::Result;
use crate::pipeline::StageInput;

/// First window read before attempting a parse
pub const INITIAL_WINDOW: usize = 64 * 1024;

/// Routing attributes plus the bytes consumed to find them
pub struct ScannedPrefix {
    pub attributes: InMemDicomObject,
    pub buffered: Vec<u8>,
}

impl ScannedPrefix {
    /// Replay the buffered bytes ahead of what remains of `rest`.
    pub fn replay(self, rest: StageInput) -> (InMemDicomObject, StageInput) {
        let stream: StageInput = Box::new(Cursor::new(self.buffered).chain(rest));
        (self.attributes, stream)
    }
}

struct Parsed {
    attributes: InMemDicomObject,
    reached_pixel_data: bool,
}

/// Scan at most `limit` bytes of `source` for top-level attributes.
pub async fn scan_attributes<R>(source: &mut R, transfer_syntax: &str, limit: usize) -> Result<ScannedPrefix>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buffered = Vec::new();
    let Some(ts) = TransferSyntaxRegistry.get(transfer_syntax) else {
        warn!(transfer_syntax, "unknown transfer syntax, routing without attributes");
        return Ok(ScannedPrefix {
            attributes: InMemDicomObject::new_empty(),
            buffered,
        });
    };

    let limit = limit.max(1);
    let mut window = INITIAL_WINDOW.min(limit);
    loop {
        let wanted = (window - buffered.len()) as u64;
        (&mut *source).take(wanted).read_to_end(&mut buffered).await?;
        let end_of_stream = buffered.len() < window;

        let parsed = parse_top_level(&buffered, ts);
        if parsed.reached_pixel_data || end_of_stream || window >= limit {
            debug!(
                bytes = buffered.len(),
                pixel_data = parsed.reached_pixel_data,
                "routing prefix scanned"
            );
            return Ok(ScannedPrefix {
                attributes: parsed.attributes,
                buffered,
            });
        }
        window = window.saturating_mul(2).min(limit);
    }
}

/// Collect the top-level primitive attributes that parse cleanly from `bytes`.
/// A truncated final element is simply dropped.
fn parse_top_level(bytes: &[u8], ts: &TransferSyntax) -> Parsed {
    let mut attributes = InMemDicomObject::new_empty();
    let Ok(reader) = DataSetReader::new_with_ts(Cursor::new(bytes), ts) else {
        return Parsed {
            attributes,
            reached_pixel_data: false,
        };
    };

    let mut depth = 0usize;
    let mut pending: Option<DataElementHeader> = None;
    for token in reader {
        let Ok(token) = token else {
            break;
        };
        match token {
            DataToken::ElementHeader(header) if depth == 0 => {
                if header.tag == tags::PIXEL_DATA {
                    return Parsed {
                        attributes,
                        reached_pixel_data: true,
                    };
                }
                pending = Some(header);
            }
            DataToken::PixelSequenceStart if depth == 0 => {
                return Parsed {
                    attributes,
                    reached_pixel_data: true,
                };
            }
            DataToken::PrimitiveValue(value) => {
                if let Some(header) = pending.take() {
                    attributes.put(DataElement::new(header.tag, header.vr, value));
                }
            }
            DataToken::SequenceStart { .. } | DataToken::PixelSequenceStart => {
                pending = None;
                depth += 1;
            }
            DataToken::SequenceEnd => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Parsed {
        attributes,
        reached_pixel_data: false,
    }
}
