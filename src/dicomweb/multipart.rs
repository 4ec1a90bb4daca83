//! Framing for single-part `multipart/related` STOW-RS bodies

/// Content type header value for a body framed with `boundary`
pub fn content_type(boundary: &str) -> String {
    format!(
        "multipart/related; type=application/dicom; boundary={}",
        boundary
    )
}

/// Everything that precedes the payload bytes
pub fn part_header(boundary: &str) -> String {
    format!(
        "--{}\r\nContent-Disposition: form-data; name=\"file\"\r\nContent-Type: application/dicom\r\n\r\n",
        boundary
    )
}

/// Everything that follows the payload bytes
pub fn closing_delimiter(boundary: &str) -> String {
    format!("\r\n--{}--", boundary)
}
